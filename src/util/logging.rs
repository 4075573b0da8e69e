//! Diagnostic logging to stderr.
//!
//! Stdout carries the command report, so the subscriber always writes to
//! stderr. The filter comes from `--log-level` / `CREDADM_LOG` and defaults
//! to `warn`.

use anyhow::{anyhow, Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVE: &str = "warn";

pub fn build_filter(directive: Option<&str>) -> Result<EnvFilter> {
    match directive.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .parse(d)
            .with_context(|| format!("invalid log filter '{}'", d)),
        None => Ok(EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}

pub fn init(directive: Option<&str>) -> Result<()> {
    let filter = build_filter(directive)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("initialize logging: {}", e))
}
