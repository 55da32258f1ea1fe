//! Corpus store module.
//!
//! Provides:
//! - `CorpusStore`: accepted records, identity index, frequency registries
//! - `FreqRegistry`: password reuse counts with stable first-seen ordering
//! - `RejectionStats`: per-reason rejection tallies

mod corpus;

pub use corpus::*;
