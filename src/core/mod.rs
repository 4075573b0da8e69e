//! Core business logic modules.

pub mod audit_log;
pub mod error;
pub mod file_lock;
pub mod paths;
pub mod schema;
pub mod store;
pub mod upsert;
