//! Persona record and run-report types for credforge.
//!
//! The corpus flows through two representations: `RawCandidate` (whatever
//! the generative service returned, unvalidated) and `PersonaRecord`
//! (accepted into the durable corpus, sector-tagged, immutable).

use serde::{Deserialize, Serialize};

/// Unvalidated candidate as returned by the generative service.
///
/// Every field defaults to empty: the service omits keys unpredictably,
/// and an absent identity key must surface as a duplicate-style rejection
/// for that candidate rather than a parse failure for the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCandidate {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub occupation: String,

    /// First identity key; unique case-insensitively across the corpus.
    #[serde(default)]
    pub personal_email: String,

    /// Personal "root" password. Character-set checked only.
    #[serde(default)]
    pub personal_password: String,

    /// Second identity key; unique case-insensitively across the corpus.
    #[serde(default)]
    pub work_lanid: String,

    /// Work password. Full complexity policy applies.
    #[serde(default)]
    pub work_password: String,

    #[serde(default)]
    pub behavior_tag: String,
}

impl RawCandidate {
    /// Promote to an accepted record, tagging with the generation sector.
    ///
    /// The sector is assigned by the orchestrator, never by the service.
    pub fn into_record(self, sector: &str) -> PersonaRecord {
        PersonaRecord {
            name: self.name,
            occupation: self.occupation,
            personal_email: self.personal_email,
            personal_password: self.personal_password,
            work_lanid: self.work_lanid,
            work_password: self.work_password,
            behavior_tag: self.behavior_tag,
            sector: sector.to_string(),
        }
    }
}

/// Accepted persona record, part of the durable corpus.
///
/// Created only after deduplication and validation; never mutated or
/// deleted afterwards. Snapshot serialization preserves insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaRecord {
    pub name: String,
    pub occupation: String,
    pub personal_email: String,
    pub personal_password: String,
    pub work_lanid: String,
    pub work_password: String,
    pub behavior_tag: String,
    pub sector: String,
}

/// Final statistics for a completed run, printed by the CLI.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Records in the corpus at exit (>= target).
    pub accepted: usize,

    /// Configured target corpus size.
    pub target: usize,

    /// Candidates examined this run.
    pub attempted: u64,

    /// Rejections by duplicate identity key.
    pub rejected_duplicate: u64,

    /// Rejections by out-of-set characters.
    pub rejected_pattern: u64,

    /// Rejections by length / character-class coverage.
    pub rejected_complexity: u64,

    /// Rejections by blocklist membership.
    pub rejected_blocklist: u64,

    /// Service calls issued (including failed and unparseable attempts).
    pub requests: u64,

    /// Wall-clock runtime in seconds.
    pub runtime_secs: f64,
}
