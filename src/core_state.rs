//! Shared application state.
//!
//! `CoreState` is built once at startup, wrapped in `Arc`, and handed to
//! every request through `ApiContext`. The external collaborators sit
//! behind traits so tests swap in mocks.

use std::sync::Arc;

use thiserror::Error;

use crate::config::AppConfig;
use crate::pipeline::analysis::DetectorConfig;
use crate::pipeline::report::{
    GeminiClient, HttpModelClient, ModalityInference, ReportError, ReportGenerator,
    ReportPipeline, UnconfiguredGenerator,
};
use crate::store::ResultStore;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Cannot build {client} client: {source}")]
    ClientInit {
        client: &'static str,
        source: ReportError,
    },
}

pub struct CoreState {
    pub config: AppConfig,
    pub store: ResultStore,
    inference: Arc<dyn ModalityInference>,
    generator: Arc<dyn ReportGenerator>,
}

impl CoreState {
    /// Production wiring: HTTP model service + Gemini (or a failing stand-in without a key).
    ///
    /// Builds blocking HTTP clients, so call it outside any async runtime.
    pub fn from_config(config: AppConfig) -> Result<Self, CoreError> {
        let inference = HttpModelClient::new(&config.model_service_url, config.llm_timeout)
            .map_err(|source| CoreError::ClientInit {
                client: "inference",
                source,
            })?;

        let generator: Arc<dyn ReportGenerator> = match &config.gemini_api_key {
            Some(key) => Arc::new(
                GeminiClient::new(
                    &config.gemini_base_url,
                    &config.gemini_model,
                    key,
                    config.llm_timeout,
                )
                .map_err(|source| CoreError::ClientInit {
                    client: "generator",
                    source,
                })?,
            ),
            None => {
                tracing::warn!("GEMINI_API_KEY not set; report generation will fail");
                Arc::new(UnconfiguredGenerator)
            }
        };

        Ok(Self::with_clients(config, Arc::new(inference), generator))
    }

    /// Explicit wiring, used by tests and embedders.
    pub fn with_clients(
        config: AppConfig,
        inference: Arc<dyn ModalityInference>,
        generator: Arc<dyn ReportGenerator>,
    ) -> Self {
        let store = ResultStore::new(config.result_ttl);
        Self {
            config,
            store,
            inference,
            generator,
        }
    }

    pub fn detectors(&self) -> &DetectorConfig {
        &self.config.detectors
    }

    pub fn generator(&self) -> &dyn ReportGenerator {
        self.generator.as_ref()
    }

    pub fn report_pipeline(&self) -> ReportPipeline<'_> {
        ReportPipeline::new(
            self.inference.as_ref(),
            self.generator.as_ref(),
            self.config.top_k,
        )
    }
}
