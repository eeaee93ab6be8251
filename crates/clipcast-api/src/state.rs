//! Shared application state.

use std::sync::Arc;

use clipcast_pipeline::{IngestGateway, PipelineCoordinator};
use clipcast_publish::SchedulingService;
use clipcast_store::Store;

use crate::config::ApiConfig;

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn Store>,
    pub gateway: Arc<IngestGateway>,
    pub scheduler: Arc<SchedulingService>,
    pub coordinator: Arc<PipelineCoordinator>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn Store>,
        gateway: Arc<IngestGateway>,
        scheduler: Arc<SchedulingService>,
        coordinator: Arc<PipelineCoordinator>,
    ) -> Self {
        Self {
            config,
            store,
            gateway,
            scheduler,
            coordinator,
        }
    }
}
