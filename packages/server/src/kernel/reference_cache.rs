//! Fetch-or-reuse of hypothesis reference documents.
//!
//! The cache holds one row per hypothesis with a TTL derived from the
//! reference type (papers and books rarely change; everything else is
//! refetched weekly). Concurrent callers racing on the same hypothesis
//! serialize on a transaction-scoped advisory lock so only one crawl is
//! issued; the losers read the freshly cached row.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use providers::{with_retry, Crawler};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::domains::hypotheses::models::{Hypothesis, ReferenceCacheEntry, ReferenceType};

/// Reference text handed to a deep analysis.
#[derive(Debug, Clone)]
pub struct CachedReference {
    pub full_text: String,
    pub character_count: i32,
    /// Whether the text came from the cache (false = freshly fetched).
    pub cached: bool,
}

/// Fetch-or-reuse cache over a [`Crawler`].
#[derive(Clone)]
pub struct ReferenceCache {
    pool: PgPool,
    crawler: Arc<dyn Crawler>,
}

impl ReferenceCache {
    pub fn new(pool: PgPool, crawler: Arc<dyn Crawler>) -> Self {
        Self { pool, crawler }
    }

    /// Resolve the reference text for a hypothesis.
    ///
    /// Returns `Ok(None)` when the hypothesis has no reference URL. Fetch
    /// failures propagate so the caller can degrade to a summary-only
    /// analysis; the cache is left unpopulated.
    pub async fn get_reference_text(
        &self,
        hypothesis: &Hypothesis,
    ) -> Result<Option<CachedReference>> {
        let Some(reference_url) = hypothesis.reference_url.clone() else {
            return Ok(None);
        };
        let ttl_days = ReferenceType::from_str(&hypothesis.reference_type)
            .unwrap_or_default()
            .cache_ttl_days();

        let mut tx = self.pool.begin().await?;

        // Transaction-scoped advisory lock keyed by hypothesis id. Held
        // across the crawl so a concurrent caller waits here and then hits
        // the cache instead of fetching again.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(hypothesis.id.to_string())
            .execute(&mut *tx)
            .await
            .context("failed to take reference advisory lock")?;

        if let Some(entry) =
            ReferenceCacheEntry::find_fresh(hypothesis.id, ttl_days, &mut tx).await?
        {
            tx.commit().await?;
            debug!(hypothesis_id = %hypothesis.id, "reference cache hit");
            return Ok(Some(CachedReference {
                full_text: entry.full_text,
                character_count: entry.character_count,
                cached: true,
            }));
        }

        info!(hypothesis_id = %hypothesis.id, url = %reference_url, "reference cache miss, fetching");
        let fetched = with_retry("fetch_reference", || {
            self.crawler.fetch_text(&reference_url)
        })
        .await?;

        let entry = ReferenceCacheEntry::upsert(hypothesis.id, &fetched.full_text, &mut tx).await?;
        tx.commit().await?;

        Ok(Some(CachedReference {
            full_text: entry.full_text,
            character_count: entry.character_count,
            cached: false,
        }))
    }
}
