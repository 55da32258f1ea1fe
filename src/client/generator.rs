//! Generation client adapter: one service call per sector batch.
//!
//! The generative service's reply shape is not contractually fixed — a
//! bare JSON array, an object wrapping one array value, or either of those
//! inside a Markdown code fence. This adapter normalizes all three and
//! reports anything else as an `Unparseable` reply carrying the offending
//! text, so the orchestrator can tell "retry later" from "give up on this
//! batch" without guessing at exception meanings.

use crate::client::{Message, OpenRouterClient};
use crate::models::{GenerationConfig, RawCandidate, Result};
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of one batch request against the generative service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchReply {
    /// Parsed candidate records, unvalidated.
    Candidates(Vec<RawCandidate>),
    /// The service answered but the content was not a candidate list.
    Unparseable { raw: String },
}

/// A source of candidate batches. Seams the volatile service boundary off
/// from the deterministic validation/dedup loop so tests can script it.
pub trait CandidateSource {
    fn request_batch(
        &self,
        count: usize,
        sector: &str,
    ) -> impl std::future::Future<Output = Result<BatchReply>>;
}

/// Batch generator backed by an OpenRouter chat completion per call.
pub struct BatchGenerator {
    client: Arc<OpenRouterClient>,
    config: GenerationConfig,
}

impl BatchGenerator {
    pub fn new(client: Arc<OpenRouterClient>, config: GenerationConfig) -> Self {
        Self { client, config }
    }

    /// Build the batch instruction.
    ///
    /// Embeds a fresh random seed token so consecutive calls with the same
    /// count and sector do not collapse into near-identical batches.
    fn build_prompt(count: usize, sector: &str) -> String {
        let seed = Uuid::new_v4().simple().to_string();
        format!(
            "Generate {count} unique personas for a study on password habits in the {sector} sector.\n\
             Batch Seed: {} (internal entropy seed).\n\
             RESEARCH FOCUS: credential reuse.\n\
             - Diversity: global mix of names and backgrounds.\n\
             - personal_password: raw human root (hobbies, slang, pet names).\n\
             - work_password: a modification of that root (12+ chars, numbers, symbols).\n\
             Return a JSON list of objects with keys: name, occupation, personal_email, \
             personal_password, work_lanid, work_password, behavior_tag",
            &seed[..8]
        )
    }

    /// Strip a surrounding Markdown code fence, if present.
    fn strip_fences(content: &str) -> &str {
        let trimmed = content.trim();
        // static pattern, compilation cannot fail
        let re = Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").unwrap();
        match re.captures(trimmed) {
            Some(captures) => captures.get(1).map_or(trimmed, |m| m.as_str()),
            None => trimmed,
        }
    }

    /// Normalize raw completion text into a batch reply.
    pub fn parse_batch(content: &str) -> BatchReply {
        let stripped = Self::strip_fences(content);

        let value: serde_json::Value = match serde_json::from_str(stripped) {
            Ok(v) => v,
            Err(_) => {
                return BatchReply::Unparseable {
                    raw: content.to_string(),
                }
            }
        };

        let items = match value {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(map) => {
                // some replies wrap the list in a single-key envelope
                match map.into_iter().find_map(|(_, v)| match v {
                    serde_json::Value::Array(items) => Some(items),
                    _ => None,
                }) {
                    Some(items) => items,
                    None => {
                        return BatchReply::Unparseable {
                            raw: content.to_string(),
                        }
                    }
                }
            }
            _ => {
                return BatchReply::Unparseable {
                    raw: content.to_string(),
                }
            }
        };

        let mut candidates = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<RawCandidate>(item) {
                Ok(candidate) => candidates.push(candidate),
                Err(_) => {
                    return BatchReply::Unparseable {
                        raw: content.to_string(),
                    }
                }
            }
        }

        BatchReply::Candidates(candidates)
    }
}

impl CandidateSource for BatchGenerator {
    async fn request_batch(&self, count: usize, sector: &str) -> Result<BatchReply> {
        let prompt = Self::build_prompt(count, sector);
        let content = self
            .client
            .complete(
                &self.config.model,
                vec![Message::user(prompt)],
                self.config.max_tokens,
                self.config.temperature,
            )
            .await?;

        Ok(Self::parse_batch(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANDIDATE_JSON: &str = r#"{
        "name": "Mina Okafor",
        "occupation": "Teller",
        "personal_email": "mina.o@mail.test",
        "personal_password": "sunnydaze",
        "work_lanid": "mokafor01",
        "work_password": "SunnyDaze#2024",
        "behavior_tag": "root_reuser"
    }"#;

    fn expect_one(reply: BatchReply) -> RawCandidate {
        match reply {
            BatchReply::Candidates(mut c) => {
                assert_eq!(c.len(), 1);
                c.pop().unwrap()
            }
            BatchReply::Unparseable { raw } => panic!("unexpected parse failure: {raw}"),
        }
    }

    #[test]
    fn test_parse_bare_array() {
        let candidate = expect_one(BatchGenerator::parse_batch(&format!("[{CANDIDATE_JSON}]")));
        assert_eq!(candidate.personal_email, "mina.o@mail.test");
        assert_eq!(candidate.work_password, "SunnyDaze#2024");
    }

    #[test]
    fn test_parse_object_wrapped_array() {
        let content = format!(r#"{{"personas": [{CANDIDATE_JSON}]}}"#);
        let candidate = expect_one(BatchGenerator::parse_batch(&content));
        assert_eq!(candidate.work_lanid, "mokafor01");
    }

    #[test]
    fn test_parse_fenced_array() {
        let content = format!("```json\n[{CANDIDATE_JSON}]\n```");
        let candidate = expect_one(BatchGenerator::parse_batch(&content));
        assert_eq!(candidate.name, "Mina Okafor");

        // bare fence without a language tag
        let content = format!("```\n[{CANDIDATE_JSON}]\n```");
        expect_one(BatchGenerator::parse_batch(&content));
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let reply = BatchGenerator::parse_batch(r#"[{"name": "No Creds"}]"#);
        let candidate = expect_one(reply);
        assert_eq!(candidate.name, "No Creds");
        assert!(candidate.personal_email.is_empty());
        assert!(candidate.work_password.is_empty());
    }

    #[test]
    fn test_garbage_is_unparseable_with_raw_text() {
        let reply = BatchGenerator::parse_batch("Sorry, I can't produce that list.");
        assert_eq!(
            reply,
            BatchReply::Unparseable {
                raw: "Sorry, I can't produce that list.".to_string()
            }
        );
    }

    #[test]
    fn test_object_without_array_value_is_unparseable() {
        let reply = BatchGenerator::parse_batch(r#"{"note": "empty today"}"#);
        assert!(matches!(reply, BatchReply::Unparseable { .. }));
    }

    #[test]
    fn test_non_object_element_poisons_batch() {
        let reply = BatchGenerator::parse_batch(r#"[{"name": "ok"}, 42]"#);
        assert!(matches!(reply, BatchReply::Unparseable { .. }));
    }
}
