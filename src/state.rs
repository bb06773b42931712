//! Application State
//!
//! Holds the injected collaborators (document store, text generator) and the
//! active configuration, and builds the components from them on demand.

use std::sync::Arc;
use tokio::sync::RwLock;

use ghostwriter_core::DocumentStore;
use ghostwriter_llm::TextGenerator;

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::services::article::ArticleDrafter;
use crate::services::interview::InterviewMachine;
use crate::services::knowledge::KnowledgeContextAssembler;
use crate::storage::ConfigService;
use crate::utils::error::{AppError, AppResult};

/// Application state shared by the command functions
pub struct AppState {
    /// Knowledge fragment storage
    store: Arc<dyn DocumentStore>,
    /// Text generator used by every prompt-driven component
    generator: Arc<dyn TextGenerator>,
    /// Active configuration snapshot
    config: Arc<RwLock<AppConfig>>,
    /// Persists configuration changes when present
    config_service: Option<Arc<RwLock<ConfigService>>>,
}

impl AppState {
    /// Create state with an in-memory configuration
    pub fn new(
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn TextGenerator>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            generator,
            config: Arc::new(RwLock::new(config)),
            config_service: None,
        }
    }

    /// Create state backed by a config file
    pub fn with_config_service(
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn TextGenerator>,
        service: ConfigService,
    ) -> Self {
        let config = service.get_config_clone();
        Self {
            store,
            generator,
            config: Arc::new(RwLock::new(config)),
            config_service: Some(Arc::new(RwLock::new(service))),
        }
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    /// Get the current configuration
    pub async fn get_config(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Apply a partial settings update.
    ///
    /// Invalid updates are rejected and leave the configuration unchanged.
    pub async fn update_config(&self, update: SettingsUpdate) -> AppResult<AppConfig> {
        let updated = match &self.config_service {
            Some(service) => service.write().await.update_config(update)?,
            None => {
                let mut candidate = self.get_config().await;
                candidate.apply_update(update);
                candidate.validate().map_err(AppError::validation)?;
                candidate
            }
        };
        *self.config.write().await = updated.clone();
        Ok(updated)
    }

    /// Knowledge context assembler for the current configuration
    pub async fn assembler(&self) -> Arc<KnowledgeContextAssembler> {
        let config = self.config.read().await;
        Arc::new(KnowledgeContextAssembler::with_settings(
            self.store.clone(),
            &config.knowledge,
        ))
    }

    /// Interview progress machine for the current configuration
    pub async fn interview_machine(&self) -> InterviewMachine {
        let assembler = self.assembler().await;
        let config = self.config.read().await;
        InterviewMachine::new(self.generator.clone(), assembler, &config)
    }

    /// Article drafter for the current configuration
    pub async fn article_drafter(&self) -> ArticleDrafter {
        let assembler = self.assembler().await;
        let config = self.config.read().await;
        ArticleDrafter::new(self.generator.clone(), assembler, &config)
    }
}
