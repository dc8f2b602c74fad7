//! Signal/Noise workbench core.
//!
//! A research workbench that ingests long-form opinion content, lets an
//! analyst carve atomic segments, and evaluates those segments against
//! standing hypotheses with LLM support. The crate hosts three processes:
//! the HTTP control plane (`server`), the ingestion worker, and the
//! transcription worker, all sharing the same Postgres schema.
//!
//! # Modules
//!
//! - [`common`] - typed IDs and small shared helpers
//! - [`domains`] - the relational model and the evidence engine
//! - [`kernel`] - job queues, workers, reference cache, service host
//! - [`server`] - axum router, handlers, error mapping

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::Config;
