//! Queue-draining workers.
//!
//! Both workers share the same cooperative poll-loop shape: claim one job,
//! process it to a terminal state, repeat; sleep when the queue is empty.
//! Cancellation is honored between jobs only - an in-flight job finishes or
//! fails naturally before the loop exits.

pub mod ingestion;
pub mod transcription;

use std::time::Duration;

pub use ingestion::IngestionWorker;
pub use transcription::TranscriptionWorker;

/// Shared worker settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sleep between polls when no job is available.
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl WorkerConfig {
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

/// Bound an error to a one-line summary suitable for a status column.
pub(crate) fn error_summary(error: &dyn std::fmt::Display) -> String {
    let text = error.to_string().replace('\n', " ");
    crate::common::truncate_chars(&text, 500)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_summary_is_single_line_and_bounded() {
        let error = anyhow::anyhow!("line one\nline two");
        let summary = error_summary(&error);
        assert!(!summary.contains('\n'));

        let long = anyhow::anyhow!("{}", "x".repeat(2000));
        assert_eq!(error_summary(&long).chars().count(), 500);
    }
}
