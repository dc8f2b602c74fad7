use axum::extract::{Extension, Path};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::common::DocumentId;
use crate::domains::documents::data::{
    DocumentContentData, DocumentListData, DocumentMetadataPatch,
};
use crate::domains::documents::models::Document;
use crate::domains::segments::models::Segment;
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::routes::PROVIDER_DEADLINE;

/// `GET /documents`
pub async fn list_documents(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<DocumentListData>>, ApiError> {
    let rows = Document::list_active(&state.db_pool).await?;
    Ok(Json(rows.into_iter().map(DocumentListData::from).collect()))
}

/// `PATCH /documents/{id}/archive`
pub async fn archive_document(
    Extension(state): Extension<AppState>,
    Path(id): Path<DocumentId>,
) -> Result<Json<Value>, ApiError> {
    if !Document::archive(id, &state.db_pool).await? {
        return Err(ApiError::not_found(format!("document {id}")));
    }
    Ok(Json(json!({ "status": "archived", "document_id": id })))
}

/// `GET /documents/{id}/content`
pub async fn get_document_content(
    Extension(state): Extension<AppState>,
    Path(id): Path<DocumentId>,
) -> Result<Json<DocumentContentData>, ApiError> {
    let document = Document::find_by_id_optional(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("document {id}")))?;

    Ok(Json(DocumentContentData {
        document_id: document.id,
        content_text: document.content_text.unwrap_or_default(),
        content_html: document.content_html,
    }))
}

/// Segment summary for `GET /documents/{id}/segments`.
#[derive(Debug, Serialize)]
pub struct DocumentSegmentData {
    pub id: crate::common::SegmentId,
    pub text: String,
    pub segment_status: String,
    pub created_at: DateTime<Utc>,
}

/// `GET /documents/{id}/segments`
pub async fn list_document_segments(
    Extension(state): Extension<AppState>,
    Path(id): Path<DocumentId>,
) -> Result<Json<Vec<DocumentSegmentData>>, ApiError> {
    Document::find_by_id_optional(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("document {id}")))?;

    let segments = Segment::list_for_document(id, &state.db_pool).await?;
    Ok(Json(
        segments
            .into_iter()
            .map(|s| DocumentSegmentData {
                id: s.id,
                text: s.text,
                segment_status: s.segment_status,
                created_at: s.created_at,
            })
            .collect(),
    ))
}

/// `PATCH /documents/{id}`
pub async fn update_document_metadata(
    Extension(state): Extension<AppState>,
    Path(id): Path<DocumentId>,
    Json(patch): Json<DocumentMetadataPatch>,
) -> Result<Json<DocumentListData>, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::validation("no fields to update"));
    }

    let updated = Document::update_metadata(
        id,
        patch.title.as_deref(),
        patch.author.as_deref(),
        patch.published_at,
        patch.source_id,
        &state.db_pool,
    )
    .await?;
    if !updated {
        return Err(ApiError::not_found(format!("document {id}")));
    }

    let listing = Document::listing_by_id(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("document {id}")))?;
    Ok(Json(DocumentListData::from(listing)))
}

/// Body of `POST /documents/ingest-url`.
#[derive(Debug, Deserialize)]
pub struct IngestUrlRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct IngestUrlResponse {
    pub document_id: DocumentId,
    pub status: String,
}

/// `POST /documents/ingest-url`
///
/// One-off ingestion of a page: fetch, extract metadata and readable text,
/// store as a document with no backing source.
pub async fn ingest_document_from_url(
    Extension(state): Extension<AppState>,
    Json(body): Json<IngestUrlRequest>,
) -> Result<Json<IngestUrlResponse>, ApiError> {
    if !body.url.starts_with("http://") && !body.url.starts_with("https://") {
        return Err(ApiError::validation("url must be http(s)"));
    }

    info!(url = %body.url, "ingesting url");

    let page = tokio::time::timeout(PROVIDER_DEADLINE, fetch_page(&body.url))
        .await
        .map_err(|_| ApiError::ProviderTimeout(format!("fetching {} timed out", body.url)))??;

    let document = Document::insert_direct(
        &body.url,
        page.title.as_deref().unwrap_or("Untitled Document"),
        page.author.as_deref(),
        page.published_at,
        &page.content_html,
        &page.content_text,
        &state.db_pool,
    )
    .await?;

    info!(document_id = %document.id, "url ingested");
    Ok(Json(IngestUrlResponse {
        document_id: document.id,
        status: "ok".to_string(),
    }))
}

struct FetchedPage {
    title: Option<String>,
    author: Option<String>,
    published_at: Option<DateTime<Utc>>,
    content_html: String,
    content_text: String,
}

async fn fetch_page(url: &str) -> Result<FetchedPage, ApiError> {
    let client = reqwest::Client::builder()
        .timeout(PROVIDER_DEADLINE)
        .build()
        .map_err(|e| ApiError::Internal(e.into()))?;

    let response = client
        .get(url)
        .header(
            "User-Agent",
            "Mozilla/5.0 (compatible; SignalNoiseIngest/1.0)",
        )
        .send()
        .await
        .map_err(|e| ApiError::Provider(format!("fetch failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Provider(format!("HTTP {status} from {url}")));
    }

    let html = response
        .text()
        .await
        .map_err(|e| ApiError::Provider(format!("body read failed: {e}")))?;

    Ok(parse_page(&html))
}

fn parse_page(html: &str) -> FetchedPage {
    FetchedPage {
        title: extract_meta_content(html, "og:title")
            .or_else(|| extract_tag_text(html, "title"))
            .or_else(|| extract_tag_text(html, "h1")),
        author: extract_meta_name(html, "author")
            .or_else(|| extract_meta_content(html, "article:author")),
        published_at: extract_meta_content(html, "article:published_time")
            .or_else(|| extract_meta_name(html, "date"))
            .and_then(|d| parse_page_date(&d)),
        content_html: extract_main_content(html),
        content_text: html_to_text(&extract_main_content(html)),
    }
}

/// `<meta property="..." content="...">`
fn extract_meta_content(html: &str, property: &str) -> Option<String> {
    let pattern = regex::Regex::new(&format!(
        r#"(?is)<meta[^>]*property\s*=\s*["']{}["'][^>]*content\s*=\s*["']([^"']+)["']"#,
        regex::escape(property)
    ))
    .ok()?;
    pattern
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// `<meta name="..." content="...">`
fn extract_meta_name(html: &str, name: &str) -> Option<String> {
    let pattern = regex::Regex::new(&format!(
        r#"(?is)<meta[^>]*name\s*=\s*["']{}["'][^>]*content\s*=\s*["']([^"']+)["']"#,
        regex::escape(name)
    ))
    .ok()?;
    pattern
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn extract_tag_text(html: &str, tag: &str) -> Option<String> {
    let pattern = regex::Regex::new(&format!(r"(?is)<{tag}[^>]*>(.*?)</{tag}>")).ok()?;
    let inner = pattern.captures(html)?.get(1)?.as_str();
    let text = html_to_text(inner);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Prefer the semantic `<article>`/`<main>` subtree over the whole body.
fn extract_main_content(html: &str) -> String {
    for tag in ["article", "main", "body"] {
        let pattern = regex::Regex::new(&format!(r"(?is)<{tag}[^>]*>(.*?)</{tag}>")).unwrap();
        if let Some(captures) = pattern.captures(html) {
            if let Some(inner) = captures.get(1) {
                return strip_noise(inner.as_str());
            }
        }
    }
    strip_noise(html)
}

fn strip_noise(html: &str) -> String {
    let mut text = html.to_string();
    for tag in ["script", "style", "nav", "footer"] {
        let pattern = regex::Regex::new(&format!(r"(?si)<{tag}[^>]*>.*?</{tag}>")).unwrap();
        text = pattern.replace_all(&text, "").to_string();
    }
    text.trim().to_string()
}

fn html_to_text(html: &str) -> String {
    let br = regex::Regex::new(r"(?i)<br\s*/?>").unwrap();
    let blocks = regex::Regex::new(r"(?i)</(p|div|h1|h2|h3|h4|li|tr)>").unwrap();
    let tags = regex::Regex::new(r"<[^>]+>").unwrap();

    let text = br.replace_all(html, "\n");
    let text = blocks.replace_all(&text, "\n");
    let text = tags.replace_all(&text, "");

    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// ISO 8601 first (meta tags), RFC 2822 as fallback.
fn parse_page_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(&value.replace('Z', "+00:00"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc2822(value)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head>
          <title>Fallback Title</title>
          <meta property="og:title" content="The Real Title">
          <meta name="author" content="Jane Writer">
          <meta property="article:published_time" content="2024-03-01T12:00:00Z">
        </head>
        <body>
          <nav><a href="/">home</a></nav>
          <article>
            <h1>The Real Title</h1>
            <p>First paragraph.</p>
            <script>track()</script>
          </article>
          <footer>footer junk</footer>
        </body></html>
    "#;

    #[test]
    fn prefers_og_title_over_title_tag() {
        let page = parse_page(PAGE);
        assert_eq!(page.title.as_deref(), Some("The Real Title"));
        assert_eq!(page.author.as_deref(), Some("Jane Writer"));
        assert!(page.published_at.is_some());
    }

    #[test]
    fn extracts_article_content_without_noise() {
        let page = parse_page(PAGE);
        assert!(page.content_text.contains("First paragraph."));
        assert!(!page.content_text.contains("track()"));
        assert!(!page.content_text.contains("footer junk"));
        assert!(!page.content_text.contains("home"));
    }

    #[test]
    fn date_parsing_accepts_iso_and_rfc2822() {
        assert!(parse_page_date("2024-03-01T12:00:00Z").is_some());
        assert!(parse_page_date("Tue, 21 Jul 2015 14:00:00 +0000").is_some());
        assert!(parse_page_date("yesterday").is_none());
    }
}
