//! Store path resolution and directory layout.

use crate::constants;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct StorePaths {
    pub root: PathBuf,
    pub store_file: PathBuf,
    pub store_lock: PathBuf,
    pub audit_log: PathBuf,
    pub audit_lock: PathBuf,
}

impl StorePaths {
    /// Resolve store paths from CLI arg, env var, or auto-detection.
    pub fn resolve(root_arg: Option<PathBuf>) -> Result<Self> {
        if let Some(root) = root_arg {
            return Ok(Self::from_root(root));
        }
        if let Ok(root) = env::var(constants::ROOT_ENV) {
            if !root.is_empty() {
                return Ok(Self::from_root(PathBuf::from(root)));
            }
        }
        if let Some(found) = find_store_root()? {
            return Ok(Self::from_root(found));
        }
        Ok(Self::from_root(PathBuf::from(constants::DEFAULT_STORE_ROOT)))
    }

    pub fn from_root(root: PathBuf) -> Self {
        let store_file = root.join(constants::STORE_FILE_NAME);
        let store_lock = root.join("credadm.lock");
        let audit_log = root.join("audit.log");
        let audit_lock = root.join("audit.lock");
        Self {
            root,
            store_file,
            store_lock,
            audit_log,
            audit_lock,
        }
    }
}

fn find_store_root() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir().context("resolve current directory")?;
    Ok(cwd
        .ancestors()
        .find(|ancestor| looks_like_root(ancestor))
        .map(Path::to_path_buf))
}

fn looks_like_root(path: &Path) -> bool {
    path.join(constants::STORE_FILE_NAME).is_file()
}

impl std::fmt::Display for StorePaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store@{}", self.root.display())
    }
}
