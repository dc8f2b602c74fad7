//! HTTP crawler for hypothesis reference documents.
//!
//! Fetches a URL and extracts plain text. PDF responses go through
//! `pdf-extract`; anything HTML-ish is reduced to text by stripping
//! boilerplate tags.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, Result};
use crate::traits::{Crawler, FetchedText};

/// Fetches reference documents over plain HTTP.
pub struct HttpCrawler {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpCrawler {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpCrawler {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client construction cannot fail with static config"),
            user_agent: "SignalNoiseReference/1.0".to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn extract_pdf_text(bytes: &[u8], url: &str) -> Result<String> {
        let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            warn!(url, error = %e, "PDF text extraction failed");
            ProviderError::InvalidResponse(format!("pdf extraction failed: {e}"))
        })?;
        debug!(url, chars = text.len(), "extracted PDF text");
        Ok(text)
    }

    /// Reduce HTML to readable text.
    ///
    /// Drops script/style/nav/footer/header subtrees, strips the remaining
    /// tags, decodes common entities, and collapses blank lines.
    fn extract_html_text(html: &str) -> String {
        let mut text = html.to_string();

        for tag in ["script", "style", "nav", "footer", "header"] {
            let pattern = regex::Regex::new(&format!(r"(?si)<{tag}[^>]*>.*?</{tag}>")).unwrap();
            text = pattern.replace_all(&text, "").to_string();
        }

        let br_pattern = regex::Regex::new(r"(?i)<br\s*/?>").unwrap();
        text = br_pattern.replace_all(&text, "\n").to_string();
        let block_pattern = regex::Regex::new(r"(?i)</(p|div|h1|h2|h3|h4|li|tr)>").unwrap();
        text = block_pattern.replace_all(&text, "\n").to_string();

        let tag_pattern = regex::Regex::new(r"<[^>]+>").unwrap();
        text = tag_pattern.replace_all(&text, "").to_string();

        text = text
            .replace("&nbsp;", " ")
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'");

        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Crawler for HttpCrawler {
    async fn fetch_text(&self, url: &str) -> Result<FetchedText> {
        info!(url, "fetching reference content");

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                429 => ProviderError::RateLimited(format!("HTTP 429 from {url}")),
                400..=499 => ProviderError::BadRequest(format!("HTTP {status} from {url}")),
                _ => ProviderError::Transient(format!("HTTP {status} from {url}")),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let full_text = if content_type.contains("application/pdf")
            || url.to_ascii_lowercase().ends_with(".pdf")
        {
            let bytes = response.bytes().await?;
            Self::extract_pdf_text(&bytes, url)?
        } else if content_type.contains("text/html") || content_type.contains("text/plain") {
            let body = response.text().await?;
            Self::extract_html_text(&body)
        } else {
            return Err(ProviderError::InvalidResponse(format!(
                "unsupported content type '{content_type}' for {url}"
            )));
        };

        if full_text.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "no text extracted from {url}"
            )));
        }

        let character_count = full_text.chars().count();
        info!(url, chars = character_count, "reference content extracted");
        Ok(FetchedText {
            full_text,
            character_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_extraction_drops_boilerplate() {
        let html = r#"
            <html><head><title>Paper</title><style>.x{color:red}</style></head>
            <body>
              <nav><a href="/">home</a></nav>
              <h1>The Great Unbundling</h1>
              <p>Value chains get&nbsp;rearranged.</p>
              <script>alert('x')</script>
              <footer>copyright</footer>
            </body></html>
        "#;
        let text = HttpCrawler::extract_html_text(html);
        assert!(text.contains("The Great Unbundling"));
        assert!(text.contains("Value chains get rearranged."));
        assert!(!text.contains("alert"));
        assert!(!text.contains("copyright"));
        assert!(!text.contains("home"));
    }

    #[test]
    fn html_extraction_collapses_blank_lines() {
        let text = HttpCrawler::extract_html_text("<p>a</p>\n\n\n<p>b</p>");
        assert_eq!(text, "a\nb");
    }
}
