//! Hypothesis-vs-segment analysis over chat completions.

use async_trait::async_trait;
use tracing::info;

use crate::error::{ProviderError, Result};
use crate::openai::{ChatRequest, Message, OpenAiClient};
use crate::traits::{Analysis, Analyzer, Verdict};

const SYSTEM_PROMPT: &str = "You are a rigorous analyst verifying a hypothesis against a specific text segment. \
Your goal is to determine the relationship between the evidence and the hypothesis.\n\n\
Output Guidelines:\n\
- Start with one of these bolded verdicts: **CONFIRMS**, **REFUTES**, **NUANCES**, or **IRRELEVANT**.\n\
- Follow with a concise explanation (2-3 sentences) citing specific parts of the segment.\n\
- Maintain a neutral, objective tone.";

/// Pull the leading bolded verdict out of an analysis response.
///
/// The model is instructed to open with `**CONFIRMS**` (or one of the other
/// three); anything else is an invalid response.
pub fn parse_verdict_response(response: &str) -> Result<Analysis> {
    let trimmed = response.trim();
    let upper = trimmed.to_ascii_uppercase();

    let verdict = [
        ("**CONFIRMS**", Verdict::Confirms),
        ("**REFUTES**", Verdict::Refutes),
        ("**NUANCES**", Verdict::Nuances),
        ("**IRRELEVANT**", Verdict::Irrelevant),
    ]
    .into_iter()
    .find(|(marker, _)| upper.starts_with(marker))
    .map(|(_, verdict)| verdict)
    .ok_or_else(|| {
        ProviderError::InvalidResponse(format!(
            "analysis does not open with a verdict: {}",
            trimmed.chars().take(80).collect::<String>()
        ))
    })?;

    Ok(Analysis {
        verdict,
        analysis_text: trimmed.to_string(),
    })
}

/// [`Analyzer`] backed by an OpenAI chat model.
pub struct OpenAiAnalyzer {
    client: OpenAiClient,
    model: String,
}

impl OpenAiAnalyzer {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn user_prompt(
        segment_text: &str,
        hypothesis_text: &str,
        description: Option<&str>,
        reference_text: Option<&str>,
    ) -> String {
        let mut prompt = format!("HYPOTHESIS: {hypothesis_text}\n");
        if let Some(description) = description {
            prompt.push_str(&format!("CONTEXT: {description}\n"));
        }
        if let Some(reference) = reference_text {
            prompt.push_str(&format!(
                "\nREFERENCE DOCUMENT (full text of the hypothesis's source):\n{reference}\n"
            ));
        }
        prompt.push_str(&format!("\nEVIDENCE (Segment):\n{segment_text}\n\nAnalysis:"));
        prompt
    }
}

#[async_trait]
impl Analyzer for OpenAiAnalyzer {
    async fn analyze(
        &self,
        segment_text: &str,
        hypothesis_text: &str,
        description: Option<&str>,
        reference_text: Option<&str>,
    ) -> Result<Analysis> {
        info!(
            segment_chars = segment_text.len(),
            with_reference = reference_text.is_some(),
            "checking hypothesis against segment"
        );

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(Self::user_prompt(
                    segment_text,
                    hypothesis_text,
                    description,
                    reference_text,
                )),
            ],
            temperature: Some(0.0),
        };

        let response = self.client.chat_completion(request).await?;
        parse_verdict_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_verdict_marker() {
        let analysis = parse_verdict_response("**CONFIRMS** The segment states it.").unwrap();
        assert_eq!(analysis.verdict, Verdict::Confirms);
        assert!(analysis.analysis_text.starts_with("**CONFIRMS**"));

        assert_eq!(
            parse_verdict_response("**refutes** No.").unwrap().verdict,
            Verdict::Refutes
        );
        assert_eq!(
            parse_verdict_response("  **NUANCES** Partly.").unwrap().verdict,
            Verdict::Nuances
        );
        assert_eq!(
            parse_verdict_response("**IRRELEVANT** Off topic.")
                .unwrap()
                .verdict,
            Verdict::Irrelevant
        );
    }

    #[test]
    fn rejects_missing_verdict() {
        assert!(parse_verdict_response("The segment confirms this.").is_err());
    }

    #[test]
    fn prompt_includes_reference_only_when_present() {
        let with_reference =
            OpenAiAnalyzer::user_prompt("seg", "hyp", Some("desc"), Some("ref body"));
        assert!(with_reference.contains("REFERENCE DOCUMENT"));
        assert!(with_reference.contains("ref body"));

        let without = OpenAiAnalyzer::user_prompt("seg", "hyp", None, None);
        assert!(!without.contains("REFERENCE DOCUMENT"));
        assert!(!without.contains("CONTEXT"));
    }
}
