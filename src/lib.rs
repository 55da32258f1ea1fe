//! credforge - synthetic credential-corpus generation via OpenRouter.
//!
//! ## Architecture
//!
//! The pipeline loops generation → validation → dedup → persistence until
//! a target corpus size is reached:
//!
//! - **Generation adapter**: one chat completion per sector batch,
//!   normalizing the service's unstable reply shapes
//! - **Policy validator**: pure whitelist/complexity/blocklist checks
//! - **Corpus store**: accepted records, identity dedup index, and
//!   password-reuse registries, persisted as one unit
//! - **Reporter**: append-only credential CSV plus a per-batch summary
//!
//! The run is resumable: the store reloads its snapshot at startup and the
//! loop continues where it left off. Transport faults are retried with
//! backoff indefinitely; only persistence faults stop a run.

pub mod client;
pub mod models;
pub mod pipeline;
pub mod policy;
pub mod report;
pub mod store;

// Re-exports for convenience
pub use client::{BatchGenerator, BatchReply, CandidateSource, OpenRouterClient};
pub use models::{Config, CredforgeError, PersonaRecord, RawCandidate, Result, RunReport};
pub use pipeline::StudyPipeline;
pub use policy::{PasswordPolicy, RejectReason};
pub use report::Reporter;
pub use store::CorpusStore;
