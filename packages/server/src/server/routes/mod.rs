//! Route handlers, one module per resource.
//!
//! Handlers stay thin: validate input, make a single call into the engine or
//! a model, convert to a DTO. Adapter calls never run inside a database
//! transaction held by a handler.

pub mod analysis;
pub mod documents;
pub mod health;
pub mod hypotheses;
pub mod jobs;
pub mod questions;
pub mod segments;
pub mod sources;

use std::time::Duration;

/// Default deadline for handlers that call external providers.
pub(crate) const PROVIDER_DEADLINE: Duration = Duration::from_secs(15);

/// Extended deadline for hypothesis checks (deep analyses read whole
/// reference documents).
pub(crate) const ANALYZE_DEADLINE: Duration = Duration::from_secs(120);
