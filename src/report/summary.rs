//! Human-readable study summary, fully rewritten each batch.

use crate::models::{CredforgeError, Result};
use crate::store::CorpusStore;
use chrono::Utc;
use std::fmt::Write as _;
use std::path::Path;

/// Render the summary for the store's current state.
pub fn render_summary(store: &CorpusStore, target: usize) -> String {
    let stats = store.stats();
    let mut out = String::new();

    // writing to a String cannot fail
    let _ = writeln!(
        out,
        "=== STUDY SUMMARY | {} ===",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(
        out,
        "Accepted: {} / {} | Attempts: {}",
        store.accepted(),
        target,
        stats.attempted
    );
    let _ = writeln!(
        out,
        "Rejections: ID Dupe: {}, Pattern: {}, Complexity: {}, Blocklist: {}",
        stats.rejected_duplicate,
        stats.rejected_pattern,
        stats.rejected_complexity,
        stats.rejected_blocklist
    );

    let _ = writeln!(out, "\n--- TOP 10 PERSONAL ROOTS ---");
    for (password, count) in store.personal_registry().top(10) {
        let _ = writeln!(out, "{password}: {count}");
    }

    let _ = writeln!(out, "\n--- TOP 10 WORK PASSWORDS ---");
    for (password, count) in store.work_registry().top(10) {
        let _ = writeln!(out, "{password}: {count}");
    }

    out
}

/// Rewrite the summary artifact.
pub fn write_summary(path: &Path, store: &CorpusStore, target: usize) -> Result<()> {
    std::fs::write(path, render_summary(store, target))
        .map_err(|e| CredforgeError::io("writing summary", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PersonaRecord;

    fn record(i: usize, personal_password: &str) -> PersonaRecord {
        PersonaRecord {
            name: format!("Person {i}"),
            occupation: "Clerk".to_string(),
            personal_email: format!("p{i}@mail.test"),
            personal_password: personal_password.to_string(),
            work_lanid: format!("lan{i:03}"),
            work_password: "Sturdy#Work123".to_string(),
            behavior_tag: "reuser".to_string(),
            sector: "Retail".to_string(),
        }
    }

    #[test]
    fn test_summary_contains_counters_and_leaderboards() {
        let mut store = CorpusStore::new();
        store.admit(record(0, "beta"));
        store.admit(record(1, "alpha"));
        store.admit(record(2, "beta"));
        store.stats_mut().attempted = 5;
        store.stats_mut().rejected_duplicate = 2;

        let summary = render_summary(&store, 100);
        assert!(summary.contains("Accepted: 3 / 100 | Attempts: 5"));
        assert!(summary.contains("ID Dupe: 2"));
        assert!(summary.contains("--- TOP 10 PERSONAL ROOTS ---"));
        // most frequent first; tie between counts resolved by first-seen
        let roots_pos = summary.find("beta: 2").unwrap();
        let alpha_pos = summary.find("alpha: 1").unwrap();
        assert!(roots_pos < alpha_pos);
        assert!(summary.contains("Sturdy#Work123: 3"));
    }
}
