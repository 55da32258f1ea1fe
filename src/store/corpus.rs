//! Corpus state: accepted records, identity index, frequency registries.
//!
//! Invariants:
//! - `admit` is the only mutator of the index and registries; the dedup
//!   index can never drift from the exported corpus.
//! - Every accepted record contributes exactly two identity keys, so the
//!   index holds `2 * records.len()` entries at steady state.
//! - The index and registries are always derived by replaying records,
//!   never loaded from a separately-stored copy.

use crate::models::{CredforgeError, PersonaRecord, RawCandidate, Result};
use crate::policy::RejectReason;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info, warn};

/// Password frequency registry with stable first-seen ordering.
///
/// Repeated passwords across different identities are permitted — that
/// reuse is the research signal — unlike identity keys, which are unique.
#[derive(Debug, Clone, Default)]
pub struct FreqRegistry {
    counts: HashMap<String, u64>,
    order: Vec<String>,
}

impl FreqRegistry {
    /// Record one occurrence of a password.
    pub fn record(&mut self, password: &str) {
        match self.counts.entry(password.to_string()) {
            Entry::Occupied(mut e) => *e.get_mut() += 1,
            Entry::Vacant(e) => {
                e.insert(1);
                self.order.push(password.to_string());
            }
        }
    }

    /// Occurrences of a specific password.
    pub fn count(&self, password: &str) -> u64 {
        self.counts.get(password).copied().unwrap_or(0)
    }

    /// Number of distinct passwords observed.
    pub fn distinct(&self) -> usize {
        self.order.len()
    }

    /// Sum of all occurrence counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// The `n` most frequent passwords, ties broken by first-seen order.
    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .order
            .iter()
            .map(|pw| (pw.clone(), self.counts[pw]))
            .collect();
        // stable sort over first-seen order resolves ties deterministically
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }
}

/// Per-reason rejection tallies. Monotonically non-decreasing within a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectionStats {
    pub attempted: u64,
    pub rejected_duplicate: u64,
    pub rejected_pattern: u64,
    pub rejected_complexity: u64,
    pub rejected_blocklist: u64,
}

impl RejectionStats {
    /// Tally a validation rejection under its counter.
    ///
    /// The counter set is fixed; empty passwords count against complexity.
    pub fn tally(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::Empty | RejectReason::Complexity => self.rejected_complexity += 1,
            RejectReason::Pattern => self.rejected_pattern += 1,
            RejectReason::Blocklist => self.rejected_blocklist += 1,
        }
    }
}

/// The accepted-record corpus with its dedup index and reuse registries,
/// owned and persisted as one consistent unit.
#[derive(Debug, Default)]
pub struct CorpusStore {
    records: Vec<PersonaRecord>,
    identity_index: HashSet<String>,
    personal_registry: FreqRegistry,
    work_registry: FreqRegistry,
    stats: RejectionStats,
}

impl CorpusStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the corpus from a prior snapshot, if one exists.
    ///
    /// A missing snapshot starts a fresh corpus. A corrupt or unreadable
    /// snapshot is logged and also starts fresh — resumability must never
    /// block a run from starting.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "No snapshot found, starting fresh");
            return Self::new();
        }

        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable snapshot, starting fresh");
                return Self::new();
            }
        };

        let records: Vec<PersonaRecord> = match serde_json::from_str(&content) {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt snapshot, starting fresh");
                return Self::new();
            }
        };

        let mut store = Self::new();
        for record in records {
            // replay through admit so index and registries are derived,
            // never trusted from disk
            if !store.admit(record) {
                warn!("Snapshot contains a duplicate identity, dropping record");
            }
        }

        info!(accepted = store.accepted(), "Resumed corpus from snapshot");
        store
    }

    /// Whether a candidate would be rejected for identity reasons:
    /// an empty key, a key already in the corpus, or two keys that
    /// collide with each other.
    pub fn is_duplicate(&self, candidate: &RawCandidate) -> bool {
        let email = candidate.personal_email.to_lowercase();
        let lanid = candidate.work_lanid.to_lowercase();

        email.is_empty()
            || lanid.is_empty()
            || email == lanid
            || self.identity_index.contains(&email)
            || self.identity_index.contains(&lanid)
    }

    /// Admit a record into the corpus.
    ///
    /// Re-checks both identity keys so an admission can never break the
    /// two-keys-per-record invariant; returns false without mutating
    /// anything if the record is not admissible.
    pub fn admit(&mut self, record: PersonaRecord) -> bool {
        let email = record.personal_email.to_lowercase();
        let lanid = record.work_lanid.to_lowercase();

        if email.is_empty()
            || lanid.is_empty()
            || email == lanid
            || self.identity_index.contains(&email)
            || self.identity_index.contains(&lanid)
        {
            return false;
        }

        self.identity_index.insert(email);
        self.identity_index.insert(lanid);
        self.personal_registry.record(&record.personal_password);
        self.work_registry.record(&record.work_password);
        self.records.push(record);
        true
    }

    /// Accepted records in insertion order.
    pub fn snapshot(&self) -> &[PersonaRecord] {
        &self.records
    }

    /// Number of accepted records.
    pub fn accepted(&self) -> usize {
        self.records.len()
    }

    /// Number of identity keys in the dedup index.
    pub fn identity_count(&self) -> usize {
        self.identity_index.len()
    }

    pub fn personal_registry(&self) -> &FreqRegistry {
        &self.personal_registry
    }

    pub fn work_registry(&self) -> &FreqRegistry {
        &self.work_registry
    }

    pub fn stats(&self) -> &RejectionStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut RejectionStats {
        &mut self.stats
    }

    /// Persist the corpus snapshot, fully replacing prior content.
    ///
    /// Writes to a temp file in the target directory, keeps a backup of
    /// the previous snapshot, then renames into place so a concurrent
    /// reader never observes a partial write.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = dir {
            fs::create_dir_all(dir).map_err(|e| CredforgeError::io("creating snapshot dir", e))?;
        }

        if path.exists() {
            let backup = path.with_extension("backup.json");
            fs::copy(path, &backup).map_err(|e| CredforgeError::io("backing up snapshot", e))?;
        }

        let temp_path = path.with_extension("tmp.json");
        let file = File::create(&temp_path)
            .map_err(|e| CredforgeError::io("creating temp snapshot", e))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.records)
            .map_err(|e| CredforgeError::Internal(format!("Serializing snapshot: {e}")))?;

        fs::rename(&temp_path, path).map_err(|e| CredforgeError::io("renaming snapshot", e))?;

        debug!(records = self.records.len(), "Snapshot persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn candidate(email: &str, lanid: &str) -> PersonaRecord {
        PersonaRecord {
            name: "Ada Example".to_string(),
            occupation: "Analyst".to_string(),
            personal_email: email.to_string(),
            personal_password: "fluffy99".to_string(),
            work_lanid: lanid.to_string(),
            work_password: "Fluffy99@Work!".to_string(),
            behavior_tag: "reuser".to_string(),
            sector: "Banking".to_string(),
        }
    }

    #[test]
    fn test_admit_duplicate_email_case_insensitive() {
        let mut store = CorpusStore::new();
        assert!(store.admit(candidate("ada@mail.test", "lan001")));
        assert!(!store.admit(candidate("ADA@MAIL.TEST", "lan002")));
        assert_eq!(store.accepted(), 1);
    }

    #[test]
    fn test_admit_rejects_empty_and_colliding_keys() {
        let mut store = CorpusStore::new();
        assert!(!store.admit(candidate("", "lan001")));
        assert!(!store.admit(candidate("ada@mail.test", "")));
        // both keys identical would leave the index one entry short
        assert!(!store.admit(candidate("same@mail.test", "Same@Mail.Test")));
        assert_eq!(store.accepted(), 0);
        assert_eq!(store.identity_count(), 0);
    }

    #[test]
    fn test_index_and_registry_invariants() {
        let mut store = CorpusStore::new();
        let n = 5;
        for i in 0..n {
            let mut record = candidate(&format!("u{i}@mail.test"), &format!("lan{i:03}"));
            record.personal_password = if i < 3 { "fluffy99" } else { "rex2024" }.to_string();
            assert!(store.admit(record));
        }

        assert_eq!(store.identity_count(), 2 * n);
        assert_eq!(store.personal_registry().distinct(), 2);
        assert_eq!(store.personal_registry().total(), n as u64);
        assert_eq!(store.work_registry().total(), n as u64);
        assert_eq!(store.personal_registry().count("fluffy99"), 3);
        assert_eq!(store.personal_registry().count("rex2024"), 2);
    }

    #[test]
    fn test_snapshot_round_trip_fidelity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("personas.json");

        let mut store = CorpusStore::new();
        for i in 0..4 {
            assert!(store.admit(candidate(&format!("u{i}@mail.test"), &format!("lan{i:03}"))));
        }
        store.persist(&path).unwrap();

        let reloaded = CorpusStore::load(&path);
        assert_eq!(reloaded.snapshot(), store.snapshot());
        assert_eq!(reloaded.identity_count(), store.identity_count());
        assert_eq!(
            reloaded.personal_registry().count("fluffy99"),
            store.personal_registry().count("fluffy99")
        );
        assert_eq!(
            reloaded.work_registry().count("Fluffy99@Work!"),
            store.work_registry().count("Fluffy99@Work!")
        );
    }

    #[test]
    fn test_corrupt_snapshot_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("personas.json");
        fs::write(&path, "{ not json ][").unwrap();

        let store = CorpusStore::load(&path);
        assert_eq!(store.accepted(), 0);
    }

    #[test]
    fn test_persist_replaces_prior_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("personas.json");

        let mut store = CorpusStore::new();
        store.admit(candidate("u0@mail.test", "lan000"));
        store.persist(&path).unwrap();
        store.admit(candidate("u1@mail.test", "lan001"));
        store.persist(&path).unwrap();

        let reloaded = CorpusStore::load(&path);
        assert_eq!(reloaded.accepted(), 2);
        // backup holds the previous generation
        assert!(path.with_extension("backup.json").exists());
    }

    #[test]
    fn test_registry_top_ties_by_first_seen() {
        let mut registry = FreqRegistry::default();
        registry.record("beta");
        registry.record("alpha");
        registry.record("beta");
        registry.record("alpha");
        registry.record("gamma");

        let top = registry.top(3);
        assert_eq!(top[0], ("beta".to_string(), 2));
        assert_eq!(top[1], ("alpha".to_string(), 2));
        assert_eq!(top[2], ("gamma".to_string(), 1));
    }
}
