use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind-specific payload stored on a credential, keyed by input field name.
pub type Inputs = BTreeMap<String, InputValue>;

/// A single input value. Registries carry a boolean `verify_ssl`; everything
/// else is text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Bool(bool),
    Text(String),
}

impl InputValue {
    /// Empty text counts as "no value". Booleans always carry a value.
    pub fn is_empty(&self) -> bool {
        match self {
            InputValue::Bool(_) => false,
            InputValue::Text(s) => s.is_empty(),
        }
    }
}

impl From<&str> for InputValue {
    fn from(s: &str) -> Self {
        InputValue::Text(s.to_string())
    }
}

impl From<bool> for InputValue {
    fn from(b: bool) -> Self {
        InputValue::Bool(b)
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Bool(b) => write!(f, "{}", b),
            InputValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Credential {
    pub id: u64,
    pub name: String,
    /// Id of the owning [`CredentialType`](crate::models::store::CredentialType).
    pub credential_type: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Id of the associated organization, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub inputs: Inputs,
}

impl Credential {
    /// The currently persisted value for an input field.
    pub fn input(&self, key: &str) -> Option<&InputValue> {
        self.inputs.get(key)
    }
}
