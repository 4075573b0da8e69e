//! Centralized constants for paths, permissions, and managed records.

/// Default store root directory.
pub const DEFAULT_STORE_ROOT: &str = "/var/lib/credadm";

/// Environment variable overriding the store root.
pub const ROOT_ENV: &str = "CREDADM_ROOT";

/// Store file name under the root.
pub const STORE_FILE_NAME: &str = "credadm.toml";

/// Permission mode for the store root directory.
pub const ROOT_DIR_MODE: u32 = 0o700;

/// Permission mode for the store file (holds secrets).
pub const STORE_FILE_MODE: u32 = 0o600;

/// Permission mode for the audit log.
pub const AUDIT_LOG_MODE: u32 = 0o640;

/// Placeholder shown instead of secret input values.
pub const MASKED_VALUE: &str = "$encrypted$";

/// Credential types managed by the platform, seeded by `init` as `(kind, name)`.
pub const MANAGED_CREDENTIAL_TYPES: &[(&str, &str)] = &[
    ("ssh", "Machine"),
    ("scm", "Source Control"),
    ("vault", "Vault"),
    ("net", "Network"),
    ("cloud", "Amazon Web Services"),
    ("kubernetes", "OpenShift or Kubernetes API Bearer Token"),
    ("registry", "Container Registry"),
    ("galaxy", "Ansible Galaxy/Automation Hub API Token"),
    ("insights", "Insights"),
    ("token", "GitHub Personal Access Token"),
    ("external", "HashiCorp Vault Secret Lookup"),
    ("cryptography", "GPG Public Key"),
];
