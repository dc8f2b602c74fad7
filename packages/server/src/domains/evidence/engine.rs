//! The evidence engine: staging, analysis, and transactional commits.
//!
//! The key correctness property: every saved analysis produces exactly one
//! new run row and updates (or creates) exactly one link row in the same
//! transaction, and the link always mirrors the latest run for its pair.

use std::sync::Arc;
use std::time::Duration;

use providers::{with_retry, Analyzer, HypothesisSummary, Suggester, Suggestion, SuggestionSource, Verdict};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use crate::common::{EvidenceLinkId, EvidenceRunId, HypothesisId, SegmentId};
use crate::domains::evidence::models::{
    AuthoredBy, EvidenceEntryRow, EvidenceLink, EvidenceRun, SegmentHypothesisRow,
};
use crate::domains::hypotheses::models::hypothesis::HypothesisPatch;
use crate::domains::hypotheses::models::Hypothesis;
use crate::domains::segments::models::Segment;
use crate::kernel::reference_cache::ReferenceCache;

const COMMIT_RETRY_ATTEMPTS: u32 = 3;

/// Errors surfaced by engine operations, mapped to HTTP statuses at the API
/// layer.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Provider(#[from] providers::ProviderError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// One staged item for `commit_evidence`. A null `hypothesis_id` creates a
/// new hypothesis from the carried text.
#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceItem {
    pub hypothesis_id: Option<HypothesisId>,
    pub hypothesis_text: String,
    pub description: Option<String>,
    pub verdict: Option<Verdict>,
    pub analysis_text: Option<String>,
    #[serde(default)]
    pub authored_by: AuthoredBy,
}

/// Ids written by one committed item.
#[derive(Debug, Clone, Serialize)]
pub struct CommittedEvidence {
    pub hypothesis_id: HypothesisId,
    pub link_id: EvidenceLinkId,
    pub run_id: EvidenceRunId,
}

/// Inputs for a hypothesis check.
#[derive(Debug, Clone)]
pub struct AnalyzeParams {
    pub segment_text: String,
    pub hypothesis_text: String,
    pub description: Option<String>,
    pub reference_url: Option<String>,
    pub include_full_reference: bool,
    pub hypothesis_id: Option<HypothesisId>,
}

/// Whether an analysis saw the full reference document or only the
/// hypothesis summary fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    Summary,
    FullReference,
}

/// Result of a hypothesis check. No state is written.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub verdict: Verdict,
    pub analysis_text: String,
    pub analysis_mode: AnalysisMode,
}

/// Orchestrates suggestion, analysis, and evidence commits.
#[derive(Clone)]
pub struct EvidenceEngine {
    pool: PgPool,
    suggester: Arc<dyn Suggester>,
    analyzer: Arc<dyn Analyzer>,
    reference_cache: ReferenceCache,
}

impl EvidenceEngine {
    pub fn new(
        pool: PgPool,
        suggester: Arc<dyn Suggester>,
        analyzer: Arc<dyn Analyzer>,
        reference_cache: ReferenceCache,
    ) -> Self {
        Self {
            pool,
            suggester,
            analyzer,
            reference_cache,
        }
    }

    /// Suggest hypotheses for a segment. No writes.
    ///
    /// Ordering is stable: suggestions reusing an existing hypothesis come
    /// first, by that hypothesis's evidence count descending; generated
    /// candidates follow in provider order.
    pub async fn suggest(&self, segment_id: SegmentId) -> Result<Vec<Suggestion>, EngineError> {
        let segment = Segment::find_by_id_optional(segment_id, &self.pool)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("segment {segment_id}")))?;

        let hypotheses = Hypothesis::list_for_suggestion(&self.pool).await?;
        let summaries: Vec<HypothesisSummary> = hypotheses
            .iter()
            .map(|(h, count)| HypothesisSummary {
                id: h.id.into_uuid(),
                hypothesis_text: h.hypothesis_text.clone(),
                description: h.description.clone(),
                evidence_count: *count,
            })
            .collect();

        let mut suggestions = with_retry("suggest_hypotheses", || {
            self.suggester.suggest_hypotheses(&segment.text, &summaries)
        })
        .await?;

        order_suggestions(&mut suggestions, &summaries);

        info!(
            segment_id = %segment_id,
            suggestions = suggestions.len(),
            "suggestions generated"
        );
        Ok(suggestions)
    }

    /// Check a hypothesis against segment text. No writes.
    ///
    /// A full-reference analysis is attempted only when the caller asks for
    /// it and the hypothesis is resolvable; a failed reference fetch
    /// degrades to a summary-only analysis instead of failing the call.
    pub async fn analyze(&self, params: AnalyzeParams) -> Result<AnalysisOutcome, EngineError> {
        let reference_text = if params.include_full_reference
            && params.reference_url.is_some()
        {
            match params.hypothesis_id {
                Some(hypothesis_id) => self.resolve_reference(hypothesis_id).await,
                None => None,
            }
        } else {
            None
        };

        let analysis_mode = if reference_text.is_some() {
            AnalysisMode::FullReference
        } else {
            AnalysisMode::Summary
        };

        let analysis = with_retry("check_hypothesis", || {
            self.analyzer.analyze(
                &params.segment_text,
                &params.hypothesis_text,
                params.description.as_deref(),
                reference_text.as_deref(),
            )
        })
        .await?;

        Ok(AnalysisOutcome {
            verdict: analysis.verdict,
            analysis_text: analysis.analysis_text,
            analysis_mode,
        })
    }

    async fn resolve_reference(&self, hypothesis_id: HypothesisId) -> Option<String> {
        let hypothesis = match Hypothesis::find_by_id_optional(hypothesis_id, &self.pool).await {
            Ok(Some(h)) => h,
            Ok(None) => return None,
            Err(e) => {
                warn!(hypothesis_id = %hypothesis_id, error = %e, "hypothesis lookup failed");
                return None;
            }
        };
        match self.reference_cache.get_reference_text(&hypothesis).await {
            Ok(Some(reference)) => Some(reference.full_text),
            Ok(None) => None,
            Err(e) => {
                warn!(
                    hypothesis_id = %hypothesis_id,
                    error = %e,
                    "reference fetch failed, degrading to summary analysis"
                );
                None
            }
        }
    }

    /// Commit staged evidence for a segment: per item, resolve or create the
    /// hypothesis, upsert the link, append a run - all in one REPEATABLE READ
    /// transaction. Serialization conflicts are retried with jitter.
    pub async fn commit_evidence(
        &self,
        segment_id: SegmentId,
        items: &[EvidenceItem],
    ) -> Result<Vec<CommittedEvidence>, EngineError> {
        if items.is_empty() {
            return Err(EngineError::Validation("evidence list cannot be empty".into()));
        }
        for item in items {
            if item.hypothesis_text.trim().is_empty() {
                return Err(EngineError::Validation(
                    "hypothesis_text cannot be empty".into(),
                ));
            }
        }

        Segment::find_by_id_optional(segment_id, &self.pool)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("segment {segment_id}")))?;

        for item in items {
            if let Some(hypothesis_id) = item.hypothesis_id {
                Hypothesis::find_by_id_optional(hypothesis_id, &self.pool)
                    .await?
                    .ok_or_else(|| {
                        EngineError::NotFound(format!("hypothesis {hypothesis_id}"))
                    })?;
            }
        }

        let mut attempt = 1;
        loop {
            match self.try_commit(segment_id, items).await {
                Ok(committed) => {
                    info!(
                        segment_id = %segment_id,
                        items = committed.len(),
                        attempt,
                        "evidence committed"
                    );
                    return Ok(committed);
                }
                Err(e) if is_serialization_failure(&e) && attempt < COMMIT_RETRY_ATTEMPTS => {
                    let jitter_ms = rand::thread_rng().gen_range(20..120) * attempt as u64;
                    warn!(
                        segment_id = %segment_id,
                        attempt,
                        jitter_ms,
                        "commit serialization conflict, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
                    attempt += 1;
                }
                Err(e) => return Err(EngineError::Internal(e)),
            }
        }
    }

    async fn try_commit(
        &self,
        segment_id: SegmentId,
        items: &[EvidenceItem],
    ) -> anyhow::Result<Vec<CommittedEvidence>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let mut committed = Vec::with_capacity(items.len());

        for item in items {
            // Resolve or create the hypothesis; an edit snapshots the
            // pre-image into hypothesis_versions.
            let hypothesis = match item.hypothesis_id {
                None => {
                    Hypothesis::create_in_tx(
                        &item.hypothesis_text,
                        item.description.as_deref(),
                        &mut tx,
                    )
                    .await?
                }
                Some(hypothesis_id) => {
                    let patch = HypothesisPatch {
                        hypothesis_text: Some(item.hypothesis_text.clone()),
                        description: item.description.clone(),
                        ..Default::default()
                    };
                    Hypothesis::update_in_tx(hypothesis_id, &patch, "evidence_commit", &mut tx)
                        .await?
                        .ok_or_else(|| {
                            anyhow::anyhow!("hypothesis {hypothesis_id} vanished mid-commit")
                        })?
                }
            };

            let link = EvidenceLink::upsert_in_tx(
                hypothesis.id,
                segment_id,
                item.verdict,
                item.analysis_text.as_deref(),
                item.authored_by,
                &mut tx,
            )
            .await?;

            // Snapshots are taken after the hypothesis resolution above, so
            // the run records the values now current.
            let run = EvidenceRun::append_in_tx(&link, &hypothesis, &mut tx).await?;

            committed.push(CommittedEvidence {
                hypothesis_id: hypothesis.id,
                link_id: link.id,
                run_id: run.id,
            });
        }

        tx.commit().await?;
        Ok(committed)
    }

    /// One row per link for a hypothesis, with freshness.
    pub async fn list_evidence_for_hypothesis(
        &self,
        hypothesis_id: HypothesisId,
    ) -> Result<Vec<EvidenceEntryRow>, EngineError> {
        Hypothesis::find_by_id_optional(hypothesis_id, &self.pool)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("hypothesis {hypothesis_id}")))?;
        Ok(EvidenceLink::list_for_hypothesis(hypothesis_id, &self.pool).await?)
    }

    /// Current link state for a segment's staging table.
    pub async fn list_hypotheses_for_segment(
        &self,
        segment_id: SegmentId,
    ) -> Result<Vec<SegmentHypothesisRow>, EngineError> {
        Segment::find_by_id_optional(segment_id, &self.pool)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("segment {segment_id}")))?;
        Ok(EvidenceLink::list_for_segment(segment_id, &self.pool).await?)
    }
}

/// Stable suggestion ordering: existing hypotheses first, by evidence count
/// descending; generated candidates after, keeping provider order.
pub fn order_suggestions(suggestions: &mut [Suggestion], summaries: &[HypothesisSummary]) {
    let count_for = |suggestion: &Suggestion| -> i64 {
        suggestion
            .hypothesis_id
            .and_then(|id| {
                summaries
                    .iter()
                    .find(|s| s.id == id)
                    .map(|s| s.evidence_count)
            })
            .unwrap_or(0)
    };
    let rank = |s: &Suggestion| match s.source {
        SuggestionSource::Existing => 0,
        SuggestionSource::Generated => 1,
    };
    suggestions.sort_by(|a, b| {
        rank(a)
            .cmp(&rank(b))
            .then_with(|| count_for(b).cmp(&count_for(a)))
    });
}

/// Whether an error chain bottoms out in a Postgres serialization failure
/// (SQLSTATE 40001) or deadlock (40P01).
pub fn is_serialization_failure(error: &anyhow::Error) -> bool {
    for cause in error.chain() {
        if let Some(sqlx::Error::Database(db_err)) = cause.downcast_ref::<sqlx::Error>() {
            if let Some(code) = db_err.code() {
                if code == "40001" || code == "40P01" {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_serialization_failures() {
        let err = anyhow::anyhow!("plain failure");
        assert!(!is_serialization_failure(&err));

        let err = anyhow::Error::from(sqlx::Error::RowNotFound);
        assert!(!is_serialization_failure(&err));
    }

    #[test]
    fn analysis_mode_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(AnalysisMode::FullReference).unwrap(),
            serde_json::json!("full_reference")
        );
        assert_eq!(
            serde_json::to_value(AnalysisMode::Summary).unwrap(),
            serde_json::json!("summary")
        );
    }

    #[test]
    fn existing_suggestions_sort_before_generated_by_evidence_count() {
        let heavy = uuid::Uuid::new_v4();
        let light = uuid::Uuid::new_v4();
        let summaries = vec![
            HypothesisSummary {
                id: light,
                hypothesis_text: "light".into(),
                description: None,
                evidence_count: 1,
            },
            HypothesisSummary {
                id: heavy,
                hypothesis_text: "heavy".into(),
                description: None,
                evidence_count: 9,
            },
        ];
        let suggestion = |id: Option<uuid::Uuid>, text: &str, source| Suggestion {
            hypothesis_id: id,
            hypothesis_text: text.into(),
            description: None,
            analysis_text: None,
            source,
        };

        let mut suggestions = vec![
            suggestion(None, "new-a", SuggestionSource::Generated),
            suggestion(Some(light), "light", SuggestionSource::Existing),
            suggestion(None, "new-b", SuggestionSource::Generated),
            suggestion(Some(heavy), "heavy", SuggestionSource::Existing),
        ];
        order_suggestions(&mut suggestions, &summaries);

        let texts: Vec<&str> = suggestions.iter().map(|s| s.hypothesis_text.as_str()).collect();
        // Existing first by evidence count desc, then generated in provider order.
        assert_eq!(texts, vec!["heavy", "light", "new-a", "new-b"]);
    }

    #[test]
    fn evidence_item_deserializes_with_defaults() {
        let item: EvidenceItem = serde_json::from_value(serde_json::json!({
            "hypothesis_id": null,
            "hypothesis_text": "H1",
            "description": null,
            "verdict": "confirms",
            "analysis_text": "because X"
        }))
        .unwrap();
        assert!(item.hypothesis_id.is_none());
        assert_eq!(item.verdict, Some(Verdict::Confirms));
        assert_eq!(item.authored_by, AuthoredBy::Human);
    }
}
