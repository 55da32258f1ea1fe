//! The generation study pipeline.
//!
//! Control loop: while the corpus is below target, request one sector
//! batch, run every candidate through dedup and the password policy,
//! commit the survivors, persist all three artifacts, report progress.
//! Transport faults and unparseable replies are backed off and retried
//! indefinitely; only persistence faults abort the run.

use crate::client::{BatchReply, CandidateSource};
use crate::models::{Config, RawCandidate, Result, RunReport};
use crate::policy::PasswordPolicy;
use crate::report::Reporter;
use crate::store::CorpusStore;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Batch orchestrator for a credential-generation study.
pub struct StudyPipeline<S: CandidateSource> {
    source: S,
    policy: PasswordPolicy,
    config: Config,
}

impl<S: CandidateSource> StudyPipeline<S> {
    pub fn new(source: S, config: Config) -> Self {
        let policy = PasswordPolicy::new(config.generation.blocklist_enabled);
        Self {
            source,
            policy,
            config,
        }
    }

    /// Sector for the next batch: operator override, or rotation keyed on
    /// the accepted count so a resumed run continues the rotation.
    fn next_sector(&self, accepted: usize, sector_override: Option<&str>) -> String {
        match sector_override {
            Some(s) => s.to_string(),
            None => {
                let sectors = &self.config.generation.sectors;
                sectors[accepted % sectors.len()].clone()
            }
        }
    }

    /// Run every candidate of one batch through dedup and validation,
    /// admitting survivors tagged with the batch sector.
    fn process_batch(&self, store: &mut CorpusStore, candidates: Vec<RawCandidate>, sector: &str) {
        for candidate in candidates {
            store.stats_mut().attempted += 1;

            if store.is_duplicate(&candidate) {
                store.stats_mut().rejected_duplicate += 1;
                continue;
            }

            // personal failures take priority over work failures
            let verdict = self
                .policy
                .validate(&candidate.personal_password, false)
                .and_then(|()| self.policy.validate(&candidate.work_password, true));

            match verdict {
                Ok(()) => {
                    let record = candidate.into_record(sector);
                    if !store.admit(record) {
                        store.stats_mut().rejected_duplicate += 1;
                    }
                }
                Err(reason) => store.stats_mut().tally(reason),
            }
        }
    }

    /// Run until the corpus reaches the configured target.
    pub async fn run(
        &self,
        store: &mut CorpusStore,
        reporter: &Reporter,
        sector_override: Option<&str>,
    ) -> Result<RunReport> {
        let start = Instant::now();
        let target = self.config.generation.target_count;
        let chunk = self.config.generation.chunk_size;
        let backoff = Duration::from_secs(self.config.generation.backoff_secs);
        let mut batch_calls: u64 = 0;

        info!(
            target = target,
            resumed = store.accepted(),
            sector_override = sector_override.unwrap_or("(rotating)"),
            "Starting study pipeline"
        );

        let pb = ProgressBar::new(target as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("##-"),
        );
        pb.set_position(store.accepted() as u64);

        while store.accepted() < target {
            let sector = self.next_sector(store.accepted(), sector_override);
            let want = chunk.min(target - store.accepted());

            batch_calls += 1;
            let reply = match self.source.request_batch(want, &sector).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(sector = %sector, error = %e, "Batch request failed, backing off");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            };

            let candidates = match reply {
                BatchReply::Candidates(candidates) => candidates,
                BatchReply::Unparseable { raw } => {
                    warn!(
                        sector = %sector,
                        bytes = raw.len(),
                        "Unparseable batch reply, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            };

            let accepted_before = store.accepted();
            self.process_batch(store, candidates, &sector);

            // commit: snapshot fully replaced, export appended, summary rewritten
            store.persist(&self.config.output.snapshot_path)?;
            let new_records = &store.snapshot()[accepted_before..];
            reporter.record_batch(new_records, store, target)?;

            let stats = *store.stats();
            pb.set_position(store.accepted() as u64);
            pb.set_message(format!(
                "[{sector}] dupe: {} pattern: {} complexity: {} blocklist: {}",
                stats.rejected_duplicate,
                stats.rejected_pattern,
                stats.rejected_complexity,
                stats.rejected_blocklist
            ));
            info!(
                sector = %sector,
                accepted = store.accepted(),
                target = target,
                batch_new = store.accepted() - accepted_before,
                attempted = stats.attempted,
                "Batch committed"
            );
        }

        pb.finish_with_message("target reached");

        let stats = *store.stats();
        Ok(RunReport {
            accepted: store.accepted(),
            target,
            attempted: stats.attempted,
            rejected_duplicate: stats.rejected_duplicate,
            rejected_pattern: stats.rejected_pattern,
            rejected_complexity: stats.rejected_complexity,
            rejected_blocklist: stats.rejected_blocklist,
            requests: batch_calls,
            runtime_secs: start.elapsed().as_secs_f64(),
        })
    }
}
