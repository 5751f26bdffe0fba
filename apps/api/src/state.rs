use std::sync::Arc;

use crate::config::Config;
use crate::generation::service::GenerationService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pipeline plus the shared cache; the cache lock serializes generation.
    pub service: Arc<GenerationService>,
}
