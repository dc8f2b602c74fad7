//! Process kernel: job queues, workers, reference cache, and the service
//! host that supervises poll loops.

pub mod queue;
pub mod reference_cache;
pub mod service_host;
pub mod workers;

pub use queue::{EnqueueResult, IngestionRequest, TranscriptionRequest};
pub use reference_cache::{CachedReference, ReferenceCache};
pub use service_host::{Service, ServiceHost};
pub use workers::{IngestionWorker, TranscriptionWorker, WorkerConfig};
