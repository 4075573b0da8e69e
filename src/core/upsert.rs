//! Create-or-update of a single credential.

use crate::core::error::CommandError;
use crate::core::schema::{CredentialKind, CredentialOptions, TextOption};
use crate::core::store::{CredentialDefaults, CredentialStore};
use crate::models::credential::{Credential, InputValue, Inputs};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Created(Credential),
    Updated {
        credential: Credential,
        changed_keys: Vec<String>,
    },
    Unchanged(Credential),
}

impl UpsertOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, UpsertOutcome::Unchanged(_))
    }

    pub fn credential(&self) -> &Credential {
        match self {
            UpsertOutcome::Created(c) | UpsertOutcome::Unchanged(c) => c,
            UpsertOutcome::Updated { credential, .. } => credential,
        }
    }
}

/// Validate `opts` and create or update the credential they describe.
///
/// Every lookup and validation happens before the first write. On an existing
/// credential only the supplied, differing input values are overwritten;
/// description and organization are left as they are.
pub fn upsert_credential<S>(store: &mut S, opts: &CredentialOptions) -> Result<UpsertOutcome, CommandError>
where
    S: CredentialStore + ?Sized,
{
    let cred_type = store
        .credential_type_by_kind(&opts.credential_type)
        .ok_or_else(|| CommandError::UnknownCredentialKind(opts.credential_type.clone()))?;

    let kind = CredentialKind::parse(&cred_type.kind)?;
    kind.check_required(opts)?;
    let inputs = kind.build_inputs(opts);

    let organization = match opts.text(TextOption::Organization) {
        Some(name) => {
            let org = store
                .organization_by_name(name)
                .ok_or_else(|| CommandError::UnknownOrganization(name.to_string()))?;
            Some(org.id)
        }
        None => None,
    };

    let defaults = CredentialDefaults {
        inputs: inputs.clone(),
        description: opts.text(TextOption::Description).map(str::to_string),
        organization,
    };
    let (mut credential, created) = store.get_or_create_credential(&opts.name, cred_type.id, defaults);

    if created {
        info!(credential = %credential.name, kind = kind.as_str(), id = credential.id, "credential created");
        return Ok(UpsertOutcome::Created(credential));
    }

    let changed_keys = apply_inputs(&mut credential, &inputs);
    if changed_keys.is_empty() {
        debug!(credential = %credential.name, "credential already up to date");
        return Ok(UpsertOutcome::Unchanged(credential));
    }

    store.update_credential(credential.clone())?;
    info!(credential = %credential.name, fields = ?changed_keys, "credential updated");
    Ok(UpsertOutcome::Updated {
        credential,
        changed_keys,
    })
}

/// Overwrite stored inputs that differ from the candidate. Returns the keys
/// that changed.
fn apply_inputs(credential: &mut Credential, candidate: &Inputs) -> Vec<String> {
    let mut changed = Vec::new();
    for (key, value) in candidate {
        let stored = credential.input(key);
        if value.is_empty() && stored.map_or(true, InputValue::is_empty) {
            continue;
        }
        if stored == Some(value) {
            continue;
        }
        credential.inputs.insert(key.clone(), value.clone());
        changed.push(key.clone());
    }
    changed
}
