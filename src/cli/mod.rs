//! CLI routing and command dispatch.

use crate::core::audit_log::{self, AuditRecord};
use crate::core::paths::StorePaths;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;

pub mod audit;
pub mod create_credential;
pub mod init;
pub mod list;
pub mod organization;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub paths: StorePaths,
}

impl CliContext {
    /// Append an audit entry. Failures are reported but never fail the
    /// command, which has already committed by this point.
    pub fn audit(&self, record: AuditRecord) {
        if let Err(e) = audit_log::log(&self.paths, record) {
            warn!("audit log failed: {:#}", e);
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "credadm",
    version,
    about = "Create or update package index and container registry credentials"
)]
pub struct Cli {
    /// Store root directory (default: $CREDADM_ROOT, an ancestor holding credadm.toml, or /var/lib/credadm)
    #[arg(long, global = true, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Log filter directive, e.g. "info" or "credadm=debug"
    #[arg(long, global = true, value_name = "FILTER", env = "CREDADM_LOG")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let ctx = CliContext {
            paths: StorePaths::resolve(self.root)?,
        };

        match self.command {
            Commands::Init(args) => init::run(&ctx, args),
            Commands::CreateCredential(args) => create_credential::run(&ctx, args),
            Commands::Organization { command } => organization::run(&ctx, command),
            Commands::List(args) => list::run(&ctx, args),
            Commands::Audit { command } => audit::run(&ctx, command),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the store and seed the managed credential types
    Init(init::InitArgs),
    /// Create or update a galaxy/container registry credential
    CreateCredential(create_credential::CreateCredentialArgs),
    /// Manage organizations
    Organization {
        #[command(subcommand)]
        command: organization::OrganizationCommand,
    },
    /// List credentials
    List(list::ListArgs),
    /// View or verify the audit trail
    Audit {
        #[command(subcommand)]
        command: audit::AuditCommand,
    },
}
