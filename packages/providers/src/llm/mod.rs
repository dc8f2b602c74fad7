//! LLM-backed suggestion and analysis adapters.

mod analyzer;
mod mock;
mod suggester;

pub use analyzer::{parse_verdict_response, OpenAiAnalyzer};
pub use mock::{MockAnalyzer, MockSuggester};
pub use suggester::OpenAiSuggester;

/// Strip markdown code fences that models occasionally wrap JSON in.
pub(crate) fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence.
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim_start().strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::strip_code_fences;

    #[test]
    fn strips_fenced_json() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }
}
