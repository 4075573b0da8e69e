//! Append-only, hash-chained audit trail of store mutations.
//!
//! Each line is one JSON [`AuditEntry`]. `entry_hash` is the SHA-256 of the
//! entry's canonical JSON without that field, and `prev_hash` links to the
//! previous line, so edits and deletions show up in [`verify_chain`].
//! Input values are never recorded, only the keys that changed.

use crate::constants;
use crate::core::file_lock::FileLock;
use crate::core::paths::StorePaths;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::warn;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub actor: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_hash: Option<String>,
}

/// What happened, before actor/time/hashes are filled in.
#[derive(Debug, Clone, Default)]
pub struct AuditRecord {
    pub action: String,
    pub target: String,
    pub kind: Option<String>,
    pub fields: Vec<String>,
}

impl AuditRecord {
    pub fn new(action: &str, target: &str) -> Self {
        Self {
            action: action.to_string(),
            target: target.to_string(),
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }
}

fn detect_actor() -> String {
    if let Ok(user) = std::env::var("SUDO_USER") {
        if !user.is_empty() {
            return format!("{}(sudo)", user);
        }
    }
    std::env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}

/// Append a record with the auto-detected actor.
pub fn log(paths: &StorePaths, record: AuditRecord) -> Result<()> {
    log_as(paths, record, &detect_actor())
}

pub fn log_as(paths: &StorePaths, record: AuditRecord, actor: &str) -> Result<()> {
    let _lock = FileLock::exclusive(&paths.audit_lock)?;
    let prev_hash = last_entry_hash(&paths.audit_log)?;

    let mut entry = AuditEntry {
        timestamp: Utc::now(),
        action: record.action,
        actor: actor.to_string(),
        target: record.target,
        kind: record.kind,
        fields: record.fields,
        prev_hash,
        entry_hash: None,
    };
    entry.entry_hash = Some(compute_entry_hash(&entry)?);

    let line = serde_json::to_string(&entry).context("serialize audit entry")?;
    append_line(&paths.audit_log, &line)
}

fn compute_entry_hash(entry: &AuditEntry) -> Result<String> {
    let mut value = serde_json::to_value(entry).context("serialize for hash")?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("entry_hash");
    }
    let canonical = serde_json::to_string(&canonicalize_value(&value))
        .context("serialize canonical json")?;
    Ok(format!("{:064x}", Sha256::digest(canonical.as_bytes())))
}

/// Recursively sort object keys so the hash does not depend on field order.
fn canonicalize_value(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for k in keys {
                out.insert(k.clone(), canonicalize_value(&map[k]));
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(canonicalize_value).collect())
        }
        other => other.clone(),
    }
}

fn append_line(audit_path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(audit_path)
        .with_context(|| format!("open audit log {}", audit_path.display()))?;
    writeln!(file, "{}", line).context("write audit entry")?;

    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(constants::AUDIT_LOG_MODE);
        fs::set_permissions(audit_path, perm).context("set audit log permissions")?;
    }

    Ok(())
}

fn last_entry_hash(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let last = match content.lines().rev().find(|l| !l.trim().is_empty()) {
        Some(line) => line,
        None => return Ok(None),
    };
    match serde_json::from_str::<AuditEntry>(last.trim()) {
        Ok(entry) => Ok(entry.entry_hash),
        // damaged tail: chain onto the raw line, verify_chain flags it as malformed
        Err(_) => Ok(Some(raw_line_hash(last))),
    }
}

fn raw_line_hash(line: &str) -> String {
    format!("{:064x}", Sha256::digest(line.as_bytes()))
}

/// Read entries, keeping the last `limit` when given.
pub fn read_log(paths: &StorePaths, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
    if !paths.audit_log.exists() {
        return Ok(Vec::new());
    }

    let file = fs::File::open(&paths.audit_log)
        .with_context(|| format!("open audit log {}", paths.audit_log.display()))?;
    let mut entries = Vec::new();
    let mut malformed = 0usize;

    for line in BufReader::new(file).lines() {
        let line = line.context("read audit log line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditEntry>(trimmed) {
            Ok(entry) => entries.push(entry),
            Err(_) => malformed += 1,
        }
    }

    if malformed > 0 {
        warn!(malformed, "malformed audit entries skipped");
    }

    if let Some(limit) = limit {
        if entries.len() > limit {
            entries = entries.split_off(entries.len() - limit);
        }
    }

    Ok(entries)
}

/// Check the hash chain. Returns (total lines, problems found).
///
/// Works on raw lines so that unparsable entries are reported instead of
/// being skipped.
pub fn verify_chain(paths: &StorePaths) -> Result<(usize, Vec<String>)> {
    if !paths.audit_log.exists() {
        return Ok((0, Vec::new()));
    }
    let content = fs::read_to_string(&paths.audit_log)
        .with_context(|| format!("read audit log {}", paths.audit_log.display()))?;
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();

    let mut errors = Vec::new();
    let mut prev: Option<String> = None;

    for (i, line) in lines.iter().enumerate() {
        let entry = match serde_json::from_str::<AuditEntry>(line.trim()) {
            Ok(entry) => entry,
            Err(_) => {
                errors.push(format!("entry {}: malformed JSON", i + 1));
                prev = Some(raw_line_hash(line));
                continue;
            }
        };

        if i > 0 && entry.prev_hash != prev {
            errors.push(format!(
                "entry {}: prev_hash mismatch (expected {:?}, got {:?})",
                i + 1,
                prev,
                entry.prev_hash
            ));
        }

        match (&entry.entry_hash, compute_entry_hash(&entry)) {
            (Some(stored), Ok(computed)) if *stored != computed => {
                errors.push(format!("entry {}: entry_hash mismatch (tampered?)", i + 1));
            }
            (None, _) => errors.push(format!("entry {}: missing entry_hash", i + 1)),
            (_, Err(e)) => errors.push(format!("entry {}: cannot compute hash: {}", i + 1, e)),
            _ => {}
        }

        prev = entry.entry_hash;
    }

    Ok((lines.len(), errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_paths() -> (TempDir, StorePaths) {
        let dir = TempDir::new().unwrap();
        let paths = StorePaths::from_root(dir.path().to_path_buf());
        (dir, paths)
    }

    #[test]
    fn test_log_and_read() {
        let (_dir, paths) = test_paths();
        let record = AuditRecord::new("credential.update", "foo")
            .kind("registry")
            .fields(vec!["username".into()]);
        log_as(&paths, record, "tester").unwrap();

        let entries = read_log(&paths, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "credential.update");
        assert_eq!(entries[0].actor, "tester");
        assert_eq!(entries[0].kind.as_deref(), Some("registry"));
        assert_eq!(entries[0].fields, vec!["username".to_string()]);
        assert!(entries[0].prev_hash.is_none());
        assert!(entries[0].entry_hash.is_some());
    }

    #[test]
    fn test_entries_are_chained() {
        let (_dir, paths) = test_paths();
        log_as(&paths, AuditRecord::new("init", "store"), "tester").unwrap();
        log_as(&paths, AuditRecord::new("credential.create", "foo"), "tester").unwrap();
        let entries = read_log(&paths, None).unwrap();
        assert_eq!(entries[1].prev_hash, entries[0].entry_hash);
    }

    #[test]
    fn test_read_log_with_limit() {
        let (_dir, paths) = test_paths();
        for i in 0..5 {
            log_as(&paths, AuditRecord::new("organization.create", &format!("org{}", i)), "tester").unwrap();
        }
        let entries = read_log(&paths, Some(2)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].target, "org4");
    }

    #[test]
    fn test_read_log_nonexistent() {
        let (_dir, paths) = test_paths();
        assert!(read_log(&paths, None).unwrap().is_empty());
    }

    #[test]
    fn test_canonical_json_deterministic() {
        let a = canonicalize_value(&serde_json::json!({"b": 1, "a": {"d": 2, "c": 3}}));
        let b = canonicalize_value(&serde_json::json!({"a": {"c": 3, "d": 2}, "b": 1}));
        let s = serde_json::to_string(&a).unwrap();
        assert_eq!(s, serde_json::to_string(&b).unwrap());
        assert_eq!(s, r#"{"a":{"c":3,"d":2},"b":1}"#);
    }

    #[test]
    fn test_verify_chain_ok() {
        let (_dir, paths) = test_paths();
        log_as(&paths, AuditRecord::new("init", "store"), "tester").unwrap();
        log_as(&paths, AuditRecord::new("credential.create", "foo"), "tester").unwrap();
        log_as(&paths, AuditRecord::new("credential.update", "foo"), "tester").unwrap();
        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 3);
        assert!(errors.is_empty(), "errors: {:?}", errors);
    }

    #[test]
    fn test_verify_chain_detects_tamper() {
        let (_dir, paths) = test_paths();
        log_as(&paths, AuditRecord::new("credential.create", "foo"), "tester").unwrap();
        log_as(&paths, AuditRecord::new("credential.update", "foo"), "tester").unwrap();

        let content = fs::read_to_string(&paths.audit_log).unwrap();
        fs::write(&paths.audit_log, content.replace("credential.update", "credential.noop")).unwrap();

        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 2);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_verify_chain_detects_deleted_line() {
        let (_dir, paths) = test_paths();
        for target in ["a", "b", "c"] {
            log_as(&paths, AuditRecord::new("organization.create", target), "tester").unwrap();
        }
        let content = fs::read_to_string(&paths.audit_log).unwrap();
        let kept: Vec<&str> = content.lines().enumerate().filter(|(i, _)| *i != 1).map(|(_, l)| l).collect();
        fs::write(&paths.audit_log, kept.join("\n") + "\n").unwrap();

        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 2);
        assert!(errors.iter().any(|e| e.contains("prev_hash mismatch")));
    }

    #[test]
    fn test_verify_chain_reports_malformed_last_line() {
        let (_dir, paths) = test_paths();
        log_as(&paths, AuditRecord::new("credential.create", "foo"), "tester").unwrap();
        log_as(&paths, AuditRecord::new("credential.update", "foo"), "tester").unwrap();

        let content = fs::read_to_string(&paths.audit_log).unwrap();
        let first = content.lines().next().unwrap();
        fs::write(&paths.audit_log, format!("{}\n{{not json\n", first)).unwrap();

        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 2);
        assert_eq!(errors, vec!["entry 2: malformed JSON".to_string()]);
    }

    #[test]
    fn test_entry_after_malformed_line_still_chains() {
        let (_dir, paths) = test_paths();
        log_as(&paths, AuditRecord::new("init", "store"), "tester").unwrap();
        let mut file = OpenOptions::new().append(true).open(&paths.audit_log).unwrap();
        writeln!(file, "{{not json").unwrap();
        drop(file);
        log_as(&paths, AuditRecord::new("credential.create", "foo"), "tester").unwrap();

        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 3);
        assert_eq!(errors, vec!["entry 2: malformed JSON".to_string()]);
    }
}
