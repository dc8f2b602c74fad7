//! Durable at-least-once job queues over the two request tables.
//!
//! Both queues share the same shape: `enqueue` inserts a waiting row,
//! `claim_next` atomically flips the oldest waiting row to `in_progress`
//! using `FOR UPDATE SKIP LOCKED` (so concurrent workers never double-claim),
//! and `complete`/`fail` are terminal. Failed jobs are not retried
//! automatically; an operator resets the status.

pub mod ingestion;
pub mod transcription;

pub use ingestion::IngestionRequest;
pub use transcription::{NewTranscriptionRequest, TranscriptionRequest};

/// Result of an enqueue that may hit the pending-uniqueness guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueResult<Id> {
    /// A new job row was inserted.
    Created(Id),
    /// A queued job already existed for this key; no row was inserted.
    AlreadyQueued(Id),
}

impl<Id: Copy> EnqueueResult<Id> {
    /// The job id regardless of whether it was created or already queued.
    pub fn job_id(&self) -> Id {
        match self {
            EnqueueResult::Created(id) | EnqueueResult::AlreadyQueued(id) => *id,
        }
    }

    /// Whether this enqueue inserted a new row.
    pub fn is_created(&self) -> bool {
        matches!(self, EnqueueResult::Created(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_result_helpers() {
        let created: EnqueueResult<u32> = EnqueueResult::Created(7);
        assert!(created.is_created());
        assert_eq!(created.job_id(), 7);

        let duplicate: EnqueueResult<u32> = EnqueueResult::AlreadyQueued(7);
        assert!(!duplicate.is_created());
        assert_eq!(duplicate.job_id(), 7);
    }
}
