//! Per-kind input schemas for the credential kinds this tool can write.

use crate::core::error::CommandError;
use crate::models::credential::{InputValue, Inputs};

/// Raw options for one credential, as supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CredentialOptions {
    pub name: String,
    pub credential_type: String,
    pub description: Option<String>,
    pub organization: Option<String>,
    pub server_url: Option<String>,
    pub auth_server_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub verify_ssl: bool,
}

/// Optional text options a kind can require or map into its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOption {
    Description,
    Organization,
    ServerUrl,
    AuthServerUrl,
    Username,
    Password,
}

impl TextOption {
    /// Name used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextOption::Description => "description",
            TextOption::Organization => "organization",
            TextOption::ServerUrl => "server_url",
            TextOption::AuthServerUrl => "auth_server_url",
            TextOption::Username => "username",
            TextOption::Password => "password",
        }
    }
}

impl CredentialOptions {
    /// Non-empty value of a text option.
    pub fn text(&self, option: TextOption) -> Option<&str> {
        let value = match option {
            TextOption::Description => self.description.as_deref(),
            TextOption::Organization => self.organization.as_deref(),
            TextOption::ServerUrl => self.server_url.as_deref(),
            TextOption::AuthServerUrl => self.auth_server_url.as_deref(),
            TextOption::Username => self.username.as_deref(),
            TextOption::Password => self.password.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Where an input value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Text(TextOption),
    VerifySsl,
}

/// One stored input field and the option feeding it.
#[derive(Debug, Clone, Copy)]
struct InputField {
    key: &'static str,
    source: Source,
}

const GALAXY_REQUIRED: &[TextOption] = &[TextOption::Organization, TextOption::ServerUrl];
const GALAXY_INPUTS: &[InputField] = &[
    InputField { key: "url", source: Source::Text(TextOption::ServerUrl) },
    InputField { key: "auth_url", source: Source::Text(TextOption::AuthServerUrl) },
    InputField { key: "token", source: Source::Text(TextOption::Password) },
];

const REGISTRY_REQUIRED: &[TextOption] = &[TextOption::ServerUrl];
const REGISTRY_INPUTS: &[InputField] = &[
    InputField { key: "host", source: Source::Text(TextOption::ServerUrl) },
    InputField { key: "password", source: Source::Text(TextOption::Password) },
    InputField { key: "username", source: Source::Text(TextOption::Username) },
    InputField { key: "verify_ssl", source: Source::VerifySsl },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Galaxy,
    Registry,
}

impl CredentialKind {
    pub fn parse(kind: &str) -> Result<Self, CommandError> {
        match kind {
            "galaxy" => Ok(CredentialKind::Galaxy),
            "registry" => Ok(CredentialKind::Registry),
            other => Err(CommandError::UnsupportedCredentialKind(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Galaxy => "galaxy",
            CredentialKind::Registry => "registry",
        }
    }

    pub fn required_fields(&self) -> &'static [TextOption] {
        match self {
            CredentialKind::Galaxy => GALAXY_REQUIRED,
            CredentialKind::Registry => REGISTRY_REQUIRED,
        }
    }

    fn input_fields(&self) -> &'static [InputField] {
        match self {
            CredentialKind::Galaxy => GALAXY_INPUTS,
            CredentialKind::Registry => REGISTRY_INPUTS,
        }
    }

    /// Input keys holding secrets.
    pub fn secret_keys(&self) -> &'static [&'static str] {
        match self {
            CredentialKind::Galaxy => &["token"],
            CredentialKind::Registry => &["password"],
        }
    }

    /// Fails on the first required option that is missing or empty.
    pub fn check_required(&self, opts: &CredentialOptions) -> Result<(), CommandError> {
        let missing = self
            .required_fields()
            .iter()
            .copied()
            .find(|option| opts.text(*option).is_none());
        match missing {
            Some(option) => Err(CommandError::MissingRequiredField {
                field: option.as_str(),
                kind: self.as_str().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Candidate inputs for this kind. Fields without a value are dropped
    /// rather than stored empty.
    pub fn build_inputs(&self, opts: &CredentialOptions) -> Inputs {
        let candidate: Vec<(&str, Option<InputValue>)> = self
            .input_fields()
            .iter()
            .map(|field| {
                let value = match field.source {
                    Source::Text(option) => opts.text(option).map(InputValue::from),
                    Source::VerifySsl => Some(InputValue::Bool(opts.verify_ssl)),
                };
                (field.key, value)
            })
            .collect();

        candidate
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .filter(|v| !v.is_empty())
                    .map(|v| (key.to_string(), v))
            })
            .collect()
    }
}

/// Whether `key` is a secret for the given kind string. Unknown kinds treat
/// the usual secret names as secret.
pub fn is_secret_key(kind: &str, key: &str) -> bool {
    match CredentialKind::parse(kind) {
        Ok(k) => k.secret_keys().contains(&key),
        Err(_) => matches!(key, "password" | "token" | "secret" | "ssh_key_data"),
    }
}
