use std::sync::Arc;

use cta_pipeline_core::{
    Config, PipelineOrchestrator, SanitizedConfig, TrainLocationFetcher, TrainLocationProcessor,
};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<PipelineOrchestrator>,
    train_fetcher: Option<Arc<TrainLocationFetcher>>,
    train_processor: Option<Arc<TrainLocationProcessor>>,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Arc<PipelineOrchestrator>,
        train_fetcher: Option<Arc<TrainLocationFetcher>>,
        train_processor: Option<Arc<TrainLocationProcessor>>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            train_fetcher,
            train_processor,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> &Arc<PipelineOrchestrator> {
        &self.orchestrator
    }

    /// `None` when train location ingestion is disabled.
    pub fn train_fetcher(&self) -> Option<&Arc<TrainLocationFetcher>> {
        self.train_fetcher.as_ref()
    }

    /// `None` when train location ingestion is disabled.
    pub fn train_processor(&self) -> Option<&Arc<TrainLocationProcessor>> {
        self.train_processor.as_ref()
    }
}
