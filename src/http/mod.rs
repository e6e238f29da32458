//! HTTP API
//!
//! Axum-based REST surface for configuration CRUD and ingestion triggering.
//! Authentication is upstream: callers arrive with an `x-user-id` header
//! injected by the auth layer in front of this service.

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use routes::create_router;
pub use server::HttpServer;

use std::sync::Arc;

use crate::ingest::IngestContext;
use crate::jobs::JobRunner;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<IngestContext>,
    pub runner: Arc<JobRunner>,
}
