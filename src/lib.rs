//! Credential administration for package indexes and container registries.
//!
//! Creates or updates galaxy and container registry credentials in a
//! platform's credential store, reporting whether anything changed.
//!
//! ## Modules
//! - `cli` — Command-line handlers
//! - `core` — Business logic (schema, upsert, store, audit)
//! - `models` — Persisted data structures
//! - `util` — Filesystem and logging helpers

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod util;
