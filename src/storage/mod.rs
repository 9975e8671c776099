//! # Storage Module - Clan Registry Persistence
//!
//! The whole registry is stored as one versioned JSON snapshot per process instance:
//!
//! ```text
//! data/
//! └── clans.json      ← registry snapshot (schema_version 1)
//! ```
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "saved_at": "2026-10-19T12:00:00Z",
//!   "clans": [
//!     {
//!       "name": "Raptors",
//!       "owner": "alice",
//!       "members": { "alice": "Owner", "bob": "Admin" },
//!       "pending_invites": ["carol"]
//!     }
//!   ]
//! }
//! ```
//!
//! Members and invitations are written in sorted order so snapshots diff cleanly.
//!
//! ## Guarantees
//!
//! - A missing, empty or whitespace-only store loads as an empty registry.
//! - Loading is all-or-nothing: any malformed record, unknown schema version or broken
//!   registry invariant fails the whole load with a `CorruptData` error.
//! - Writes hold an exclusive `fs2` lock, go to a temp file in the same directory and
//!   are atomically renamed over the store, so readers never see a half-written file.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use clanhall::storage::ClanStore;
//!
//! fn main() -> Result<(), clanhall::clan::ClanError> {
//!     let store = ClanStore::new("./data/clans.json");
//!     let mut registry = store.load()?;
//!     registry.create_clan("Raptors", "alice")?;
//!     store.save(&registry)?;
//!     Ok(())
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::clan::{Clan, ClanError, Rank, Registry};
use crate::config::StorageConfig;

/// Current on-disk schema version of the registry snapshot.
pub const CLAN_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoredRegistry {
    schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    clans: Vec<StoredClan>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoredClan {
    name: String,
    owner: String,
    members: BTreeMap<String, Rank>,
    #[serde(default)]
    pending_invites: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
struct VersionProbe {
    schema_version: Option<u32>,
}

impl From<&Clan> for StoredClan {
    fn from(clan: &Clan) -> Self {
        StoredClan {
            name: clan.name().to_string(),
            owner: clan.owner().to_string(),
            members: clan.members().iter().map(|(k, v)| (k.clone(), *v)).collect(),
            pending_invites: clan.pending_invites().iter().cloned().collect(),
        }
    }
}

impl TryFrom<StoredClan> for Clan {
    type Error = ClanError;

    fn try_from(stored: StoredClan) -> Result<Self, Self::Error> {
        let members: HashMap<String, Rank> = stored.members.into_iter().collect();
        let pending: HashSet<String> = stored.pending_invites.into_iter().collect();
        Clan::from_parts(stored.name, stored.owner, members, pending)
    }
}

/// Serialize a registry snapshot.
pub fn encode_registry(registry: &Registry) -> Result<Vec<u8>, ClanError> {
    let mut clans: Vec<StoredClan> = registry.clans().map(StoredClan::from).collect();
    clans.sort_by(|a, b| a.name.cmp(&b.name));
    let stored = StoredRegistry {
        schema_version: CLAN_SCHEMA_VERSION,
        saved_at: Some(Utc::now()),
        clans,
    };
    let mut bytes = serde_json::to_vec_pretty(&stored)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Deserialize a registry snapshot. Empty input yields an empty registry.
pub fn decode_registry(bytes: &[u8]) -> Result<Registry, ClanError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ClanError::CorruptData(format!("store is not valid UTF-8: {e}")))?;
    // Guard against leading NULs left by a truncated pre-allocated file
    let text = text.trim_start_matches('\0').trim();
    if text.is_empty() {
        return Ok(Registry::new());
    }

    let probe: VersionProbe = serde_json::from_str(text)?;
    match probe.schema_version {
        Some(CLAN_SCHEMA_VERSION) => {}
        Some(found) => {
            return Err(ClanError::SchemaMismatch { expected: CLAN_SCHEMA_VERSION, found })
        }
        None => return Err(ClanError::CorruptData("missing schema_version".to_string())),
    }

    let stored: StoredRegistry = serde_json::from_str(text)?;
    let clans = stored
        .clans
        .into_iter()
        .map(Clan::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Registry::from_clans(clans)
}

/// File-backed store holding one registry snapshot.
#[derive(Debug, Clone)]
pub struct ClanStore {
    path: PathBuf,
}

impl ClanStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.store_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry. A missing store file is an empty registry.
    pub fn load(&self) -> Result<Registry, ClanError> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                let registry = decode_registry(&bytes)?;
                info!(
                    "Loaded {} clans from {}",
                    registry.len(),
                    self.path.display()
                );
                Ok(registry)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No clan store at {}; starting empty", self.path.display());
                Ok(Registry::new())
            }
            Err(e) => Err(ClanError::Io(e)),
        }
    }

    /// Write a full snapshot of `registry`, replacing the store atomically.
    pub fn save(&self, registry: &Registry) -> Result<(), ClanError> {
        let bytes = encode_registry(registry)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        write_file_locked(&self.path, &bytes)?;
        debug!("Saved {} clans to {}", registry.len(), self.path.display());
        Ok(())
    }
}

/// Write `content` to `path` under an exclusive lock via temp file and atomic rename.
fn write_file_locked(path: &Path, content: &[u8]) -> Result<(), ClanError> {
    // Open (or create) the destination to hold an exclusive lock for the whole write
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    lock_file.lock_exclusive()?;

    let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let base = path.file_name().and_then(|s| s.to_str()).unwrap_or("clans.json");
    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut tmp) => {
                let written = tmp.write_all(content).and_then(|_| tmp.flush()).and_then(|_| tmp.sync_all());
                if let Err(e) = written {
                    let _ = fs::remove_file(&candidate);
                    return Err(ClanError::Io(e));
                }
                break candidate;
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
            }
            Err(e) => return Err(ClanError::Io(e)),
        }
    };

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(ClanError::Io(e));
    }

    // Persist the rename (best-effort)
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }

    drop(lock_file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Registry {
        let mut reg = Registry::new();
        reg.create_clan("Raptors", "alice").unwrap();
        reg.invite_player("alice", "bob").unwrap();
        reg.accept_invite("bob", "Raptors").unwrap();
        reg.change_rank("alice", "bob", Rank::Admin).unwrap();
        reg.invite_player("bob", "carol").unwrap();
        reg.create_clan("Owls", "dave").unwrap();
        reg
    }

    #[test]
    fn snapshot_round_trips() {
        let reg = sample();
        let bytes = encode_registry(&reg).unwrap();
        let loaded = decode_registry(&bytes).unwrap();
        assert_eq!(loaded, reg);
        assert!(loaded.get("Raptors").unwrap().is_invited("carol"));
    }

    #[test]
    fn empty_inputs_load_empty() {
        assert!(decode_registry(b"").unwrap().is_empty());
        assert!(decode_registry(b"  \n").unwrap().is_empty());
        assert!(decode_registry(b"\0\0\0").unwrap().is_empty());
        let empty = encode_registry(&Registry::new()).unwrap();
        assert!(decode_registry(&empty).unwrap().is_empty());
    }

    #[test]
    fn snapshot_is_sorted_and_versioned() {
        let text = String::from_utf8(encode_registry(&sample()).unwrap()).unwrap();
        assert!(text.contains("\"schema_version\": 1"));
        let owls = text.find("\"Owls\"").unwrap();
        let raptors = text.find("\"Raptors\"").unwrap();
        assert!(owls < raptors);
    }

    #[test]
    fn rejects_unknown_schema() {
        let err = decode_registry(br#"{"schema_version": 7, "clans": []}"#).unwrap_err();
        assert!(matches!(err, ClanError::SchemaMismatch { expected: 1, found: 7 }));
        let err = decode_registry(br#"{"clans": []}"#).unwrap_err();
        assert!(matches!(err, ClanError::CorruptData(_)));
    }

    #[test]
    fn rejects_none_rank_and_garbage() {
        let doc = br#"{"schema_version":1,"clans":[{"name":"A","owner":"a","members":{"a":"Owner","b":"None"}}]}"#;
        assert!(matches!(decode_registry(doc), Err(ClanError::CorruptData(_))));
        let doc = br#"{"schema_version":1,"clans":[{"name":"A","owner":"a","members":{"a":"Owner","b":"Captain"}}]}"#;
        assert!(matches!(decode_registry(doc), Err(ClanError::CorruptData(_))));
        assert!(matches!(decode_registry(b"Raptors,alice,alice:Owner"), Err(ClanError::CorruptData(_))));
    }

    #[test]
    fn one_bad_clan_fails_the_whole_load() {
        let doc = br#"{"schema_version":1,"clans":[
            {"name":"Good","owner":"a","members":{"a":"Owner"}},
            {"name":"Bad","owner":"b","members":{"b":"Member"}}
        ]}"#;
        assert!(matches!(decode_registry(doc), Err(ClanError::CorruptData(_))));
    }
}
