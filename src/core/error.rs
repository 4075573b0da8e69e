//! User-input errors raised by the credential upsert.

use thiserror::Error;

/// Validation and lookup failures. All of them are detected before anything
/// is written to the store.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("'{0}' credential type not found")]
    UnknownCredentialKind(String),

    #[error("Creating '{0}' credential type currently not supported")]
    UnsupportedCredentialKind(String),

    #[error("'{field}' must be provided when creating '{kind}' credential type.")]
    MissingRequiredField { field: &'static str, kind: String },

    #[error("'{0}' organization does not exist.")]
    UnknownOrganization(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
