//! Store persistence and record access.
//!
//! The store is a single TOML file. Every command runs as one transaction:
//! the file is read under an exclusive lock, the command mutates the
//! in-memory copy, and the result is written back atomically only when the
//! command succeeded and the serialized store actually changed.

use crate::constants;
use crate::core::file_lock::FileLock;
use crate::core::paths::StorePaths;
use crate::models::credential::{Credential, Inputs};
use crate::models::store::{CredentialType, Organization, StoreFile};
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Creation-time values for a credential that does not exist yet.
#[derive(Debug, Clone, Default)]
pub struct CredentialDefaults {
    pub inputs: Inputs,
    pub description: Option<String>,
    pub organization: Option<u64>,
}

/// Record access needed by the credential commands.
pub trait CredentialStore {
    fn credential_type_by_kind(&self, kind: &str) -> Option<CredentialType>;

    fn organization_by_name(&self, name: &str) -> Option<Organization>;

    /// Fetch the credential keyed by `(name, credential_type)`, creating it
    /// from `defaults` when absent. The flag is `true` when it was created.
    fn get_or_create_credential(
        &mut self,
        name: &str,
        credential_type: u64,
        defaults: CredentialDefaults,
    ) -> (Credential, bool);

    /// Persist changes to an existing credential.
    fn update_credential(&mut self, credential: Credential) -> Result<()>;
}

impl CredentialStore for StoreFile {
    fn credential_type_by_kind(&self, kind: &str) -> Option<CredentialType> {
        self.credential_types.iter().find(|t| t.kind == kind).cloned()
    }

    fn organization_by_name(&self, name: &str) -> Option<Organization> {
        self.organizations.iter().find(|o| o.name == name).cloned()
    }

    fn get_or_create_credential(
        &mut self,
        name: &str,
        credential_type: u64,
        defaults: CredentialDefaults,
    ) -> (Credential, bool) {
        if let Some(existing) = self
            .credentials
            .iter()
            .find(|c| c.name == name && c.credential_type == credential_type)
        {
            return (existing.clone(), false);
        }

        let now = Utc::now();
        let cred = Credential {
            id: next_id(self.credentials.iter().map(|c| c.id)),
            name: name.to_string(),
            credential_type,
            description: defaults.description,
            organization: defaults.organization,
            created_at: Some(now),
            modified_at: Some(now),
            inputs: defaults.inputs,
        };
        self.credentials.push(cred.clone());
        (cred, true)
    }

    fn update_credential(&mut self, mut credential: Credential) -> Result<()> {
        let slot = self
            .credentials
            .iter_mut()
            .find(|c| c.id == credential.id)
            .ok_or_else(|| anyhow!("credential {} ('{}') not in store", credential.id, credential.name))?;
        credential.modified_at = Some(Utc::now());
        *slot = credential;
        Ok(())
    }
}

impl StoreFile {
    /// Register a credential type unless its kind is already present.
    /// Returns `true` when a record was added.
    pub fn ensure_credential_type(&mut self, kind: &str, name: &str) -> bool {
        if self.credential_types.iter().any(|t| t.kind == kind) {
            return false;
        }
        let id = next_id(self.credential_types.iter().map(|t| t.id));
        self.credential_types.push(CredentialType {
            id,
            kind: kind.to_string(),
            name: name.to_string(),
        });
        true
    }

    /// Register an organization unless one with this name exists.
    /// Returns `true` when a record was added.
    pub fn ensure_organization(&mut self, name: &str) -> bool {
        if self.organizations.iter().any(|o| o.name == name) {
            return false;
        }
        let id = next_id(self.organizations.iter().map(|o| o.id));
        self.organizations.push(Organization {
            id,
            name: name.to_string(),
        });
        true
    }

    pub fn credential_type(&self, id: u64) -> Option<&CredentialType> {
        self.credential_types.iter().find(|t| t.id == id)
    }

    pub fn organization(&self, id: u64) -> Option<&Organization> {
        self.organizations.iter().find(|o| o.id == id)
    }
}

fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().unwrap_or(0) + 1
}

pub fn load(path: &Path) -> Result<StoreFile> {
    if !path.exists() {
        return Ok(StoreFile::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("read store {}", path.display()))?;
    let mut store: StoreFile = toml::from_str(&content)
        .with_context(|| format!("parse store {}", path.display()))?;
    if store.store.version == 0 {
        store.store.version = 1;
    }
    Ok(store)
}

pub fn save(path: &Path, store: &StoreFile) -> Result<()> {
    let content = toml::to_string_pretty(store).context("serialize store")?;
    write_atomic(path, &content)
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(parent).context("create temp store")?;
    tmp.write_all(content.as_bytes()).context("write store")?;
    tmp.flush().context("flush store")?;

    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(constants::STORE_FILE_MODE);
        tmp.as_file()
            .set_permissions(perm)
            .context("set permissions on temp store")?;
    }

    tmp.persist(path)
        .map_err(|err| anyhow!("persist store {}: {}", path.display(), err))?;
    Ok(())
}

/// Run `f` against the store as a single transaction.
///
/// Nothing is written if `f` fails. On success the store is rewritten only
/// when its serialized form differs from what was loaded, so a no-op command
/// leaves the file byte-identical.
pub fn transaction<T, E>(
    paths: &StorePaths,
    f: impl FnOnce(&mut StoreFile) -> std::result::Result<T, E>,
) -> std::result::Result<T, E>
where
    E: From<anyhow::Error>,
{
    if !paths.root.is_dir() {
        return Err(anyhow!(
            "store root {} does not exist (run `credadm init`)",
            paths.root.display()
        )
        .into());
    }
    let _lock = FileLock::exclusive(&paths.store_lock)?;
    debug!(store = %paths, "transaction started");
    let mut store = load(&paths.store_file)?;
    let before = toml::to_string_pretty(&store).context("serialize store")?;

    let value = f(&mut store)?;

    let after = toml::to_string_pretty(&store).context("serialize store")?;
    if before == after {
        debug!(store = %paths, "no changes to persist");
        return Ok(value);
    }
    write_atomic(&paths.store_file, &after)?;
    info!(store = %paths, "store updated");
    Ok(value)
}

/// Read-only snapshot, taken under the store lock.
pub fn snapshot(paths: &StorePaths) -> Result<StoreFile> {
    if !paths.store_file.exists() {
        bail!(
            "no store at {} (run `credadm init`)",
            paths.store_file.display()
        );
    }
    let _lock = FileLock::exclusive(&paths.store_lock)?;
    load(&paths.store_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::credential::InputValue;
    use tempfile::TempDir;

    fn test_paths() -> (TempDir, StorePaths) {
        let dir = TempDir::new().unwrap();
        let paths = StorePaths::from_root(dir.path().to_path_buf());
        (dir, paths)
    }

    fn registry_store() -> StoreFile {
        let mut store = StoreFile::default();
        store.ensure_credential_type("registry", "Container Registry");
        store
    }

    #[test]
    fn test_load_missing_is_empty() {
        let (_dir, paths) = test_paths();
        let store = load(&paths.store_file).unwrap();
        assert_eq!(store, StoreFile::default());
    }

    #[test]
    fn test_save_then_load_keeps_inputs() {
        let (_dir, paths) = test_paths();
        let mut store = registry_store();
        let mut inputs = Inputs::new();
        inputs.insert("host".into(), InputValue::from("https://reg.example"));
        inputs.insert("verify_ssl".into(), InputValue::Bool(false));
        store.get_or_create_credential(
            "foo",
            1,
            CredentialDefaults {
                inputs,
                ..Default::default()
            },
        );
        save(&paths.store_file, &store).unwrap();

        let loaded = load(&paths.store_file).unwrap();
        assert_eq!(loaded, store);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_restricts_permissions() {
        let (_dir, paths) = test_paths();
        save(&paths.store_file, &registry_store()).unwrap();
        let mode = fs::metadata(&paths.store_file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, constants::STORE_FILE_MODE);
    }

    #[test]
    fn test_get_or_create_is_keyed_by_name_and_type() {
        let mut store = registry_store();
        store.ensure_credential_type("galaxy", "Galaxy");

        let (first, created) = store.get_or_create_credential("foo", 1, CredentialDefaults::default());
        assert!(created);
        assert_eq!(first.id, 1);

        let (again, created) = store.get_or_create_credential("foo", 1, CredentialDefaults::default());
        assert!(!created);
        assert_eq!(again.id, 1);

        let (other, created) = store.get_or_create_credential("foo", 2, CredentialDefaults::default());
        assert!(created);
        assert_eq!(other.id, 2);
        assert_eq!(store.credentials.len(), 2);
    }

    #[test]
    fn test_update_unknown_credential_fails() {
        let mut store = registry_store();
        let ghost = Credential {
            id: 42,
            name: "ghost".into(),
            ..Default::default()
        };
        assert!(store.update_credential(ghost).is_err());
    }

    #[test]
    fn test_ensure_organization_is_idempotent() {
        let mut store = StoreFile::default();
        assert!(store.ensure_organization("Default"));
        assert!(!store.ensure_organization("Default"));
        assert!(store.ensure_organization("Engineering"));
        assert_eq!(store.organization_by_name("Engineering").unwrap().id, 2);
    }

    #[test]
    fn test_transaction_requires_root() {
        let dir = TempDir::new().unwrap();
        let paths = StorePaths::from_root(dir.path().join("missing"));
        let result: Result<()> = transaction(&paths, |_| Ok(()));
        assert!(result.unwrap_err().to_string().contains("credadm init"));
    }

    #[test]
    fn test_transaction_persists_changes() {
        let (_dir, paths) = test_paths();
        transaction(&paths, |store| -> Result<()> {
            store.ensure_organization("Default");
            Ok(())
        })
        .unwrap();
        let loaded = load(&paths.store_file).unwrap();
        assert!(loaded.organization_by_name("Default").is_some());
    }

    #[test]
    fn test_transaction_noop_leaves_file_untouched() {
        let (_dir, paths) = test_paths();
        save(&paths.store_file, &registry_store()).unwrap();
        let before = fs::read(&paths.store_file).unwrap();
        transaction(&paths, |store| -> Result<()> {
            store.ensure_credential_type("registry", "Container Registry");
            Ok(())
        })
        .unwrap();
        assert_eq!(fs::read(&paths.store_file).unwrap(), before);
    }

    #[test]
    fn test_transaction_discards_changes_on_error() {
        let (_dir, paths) = test_paths();
        save(&paths.store_file, &registry_store()).unwrap();
        let before = fs::read(&paths.store_file).unwrap();
        let result: Result<()> = transaction(&paths, |store| {
            store.ensure_organization("Default");
            bail!("validation failed")
        });
        assert!(result.is_err());
        assert_eq!(fs::read(&paths.store_file).unwrap(), before);
    }

    #[test]
    fn test_snapshot_requires_store_file() {
        let (_dir, paths) = test_paths();
        assert!(snapshot(&paths).is_err());
        save(&paths.store_file, &registry_store()).unwrap();
        assert_eq!(snapshot(&paths).unwrap().credential_types.len(), 1);
    }
}
