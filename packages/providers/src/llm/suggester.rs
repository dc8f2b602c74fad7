//! Hypothesis suggestion over chat completions.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::strip_code_fences;
use crate::error::{ProviderError, Result};
use crate::openai::{ChatRequest, Message, OpenAiClient};
use crate::traits::{HypothesisSummary, Suggester, Suggestion, SuggestionSource};

const SYSTEM_PROMPT: &str = "You are an expert analyst helping to test hypotheses against evidence. \
Your task is to identify which hypotheses are relevant to a given text segment.\n\n\
You have a list of EXISTING HYPOTHESES. \
For each existing hypothesis, decide if the segment provides evidence for or against it. \
If the segment suggests important propositions NOT covered by existing hypotheses, propose NEW hypotheses.\n\n\
For 'existing' hypotheses:\n\
- Use the exact provided hypothesis_id.\n\
- Return the current description unless the segment strongly suggests an update is needed (rare).\n\
- Provide a brief analysis_text explaining how the segment relates to this hypothesis.\n\n\
For 'generated' (new) hypotheses:\n\
- Set hypothesis_id to null.\n\
- Create a clear, testable hypothesis statement.\n\
- Write a short description providing context.\n\
- Provide analysis_text explaining what the segment suggests about this hypothesis.\n\n\
Return a JSON object with a 'suggestions' key containing a list of hypothesis objects. \
Respond with raw JSON only: no markdown fences, no commentary.";

#[derive(Debug, Deserialize)]
struct SuggestionResponseRaw {
    suggestions: Vec<SuggestionRaw>,
}

#[derive(Debug, Deserialize)]
struct SuggestionRaw {
    hypothesis_id: Option<Uuid>,
    hypothesis_text: String,
    source: Option<String>,
    description: Option<String>,
    analysis_text: Option<String>,
}

/// [`Suggester`] backed by an OpenAI chat model.
pub struct OpenAiSuggester {
    client: OpenAiClient,
    model: String,
    max_parse_attempts: u32,
}

impl OpenAiSuggester {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            max_parse_attempts: 3,
        }
    }

    fn user_prompt(segment_text: &str, existing: &[HypothesisSummary]) -> String {
        let existing_json =
            serde_json::to_string(existing).unwrap_or_else(|_| "[]".to_string());
        format!(
            "SEGMENT TEXT:\n{segment_text}\n\nEXISTING HYPOTHESES:\n{existing_json}\n\nPlease analyze and return JSON."
        )
    }

    fn retry_prompt(last_response: &str, error: &str) -> String {
        let preview: String = last_response.chars().take(500).collect();
        format!(
            "JSON PARSE FAILED. Your previous response could not be parsed.\n\n\
             ERROR: {error}\n\nYour response was:\n{preview}\n\n\
             Respond again with raw JSON only: an object with a 'suggestions' list. \
             The first character must be {{ and the last character must be }}."
        )
    }

    fn normalize(raw: SuggestionRaw) -> Suggestion {
        // An id means 'existing' regardless of what the model claims, and a
        // missing id can never be existing.
        let source = match (&raw.hypothesis_id, raw.source.as_deref()) {
            (Some(_), _) => SuggestionSource::Existing,
            (None, _) => SuggestionSource::Generated,
        };
        Suggestion {
            hypothesis_id: raw.hypothesis_id,
            hypothesis_text: raw.hypothesis_text,
            description: raw.description,
            analysis_text: raw.analysis_text,
            source,
        }
    }
}

#[async_trait]
impl Suggester for OpenAiSuggester {
    async fn suggest_hypotheses(
        &self,
        segment_text: &str,
        existing: &[HypothesisSummary],
    ) -> Result<Vec<Suggestion>> {
        info!(
            segment_chars = segment_text.len(),
            existing = existing.len(),
            "generating hypothesis suggestions"
        );

        let mut user = Self::user_prompt(segment_text, existing);
        let mut last_error = String::new();

        for attempt in 1..=self.max_parse_attempts {
            let request = ChatRequest {
                model: self.model.clone(),
                messages: vec![Message::system(SYSTEM_PROMPT), Message::user(user.clone())],
                temperature: Some(0.0),
            };
            let response = self.client.chat_completion(request).await?;

            match serde_json::from_str::<SuggestionResponseRaw>(strip_code_fences(&response)) {
                Ok(parsed) => {
                    return Ok(parsed
                        .suggestions
                        .into_iter()
                        .map(Self::normalize)
                        .collect());
                }
                Err(e) => {
                    warn!(attempt, error = %e, "failed to parse suggestion response");
                    last_error = e.to_string();
                    user = Self::retry_prompt(&response, &last_error);
                }
            }
        }

        Err(ProviderError::InvalidResponse(format!(
            "suggestions unparseable after {} attempts: {last_error}",
            self.max_parse_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_forces_existing_source() {
        let raw = SuggestionRaw {
            hypothesis_id: Some(Uuid::new_v4()),
            hypothesis_text: "H".into(),
            source: Some("generated".into()),
            description: None,
            analysis_text: None,
        };
        assert_eq!(
            OpenAiSuggester::normalize(raw).source,
            SuggestionSource::Existing
        );
    }

    #[test]
    fn missing_id_forces_generated_source() {
        let raw = SuggestionRaw {
            hypothesis_id: None,
            hypothesis_text: "H".into(),
            source: Some("existing".into()),
            description: Some("ctx".into()),
            analysis_text: Some("draft".into()),
        };
        let suggestion = OpenAiSuggester::normalize(raw);
        assert_eq!(suggestion.source, SuggestionSource::Generated);
        assert_eq!(suggestion.analysis_text.as_deref(), Some("draft"));
    }

    #[test]
    fn user_prompt_embeds_existing_hypotheses() {
        let existing = vec![HypothesisSummary {
            id: Uuid::nil(),
            hypothesis_text: "AI will commoditize search".into(),
            description: None,
            evidence_count: 3,
        }];
        let prompt = OpenAiSuggester::user_prompt("segment body", &existing);
        assert!(prompt.contains("segment body"));
        assert!(prompt.contains("AI will commoditize search"));
    }
}
