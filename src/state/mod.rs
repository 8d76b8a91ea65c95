use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::{read_api_key, AppConfig, AppPaths, ConfigService};
use crate::llm::{LlmService, OpenAiProvider};
use crate::pipeline::ResearchPipeline;
use crate::rag::{SqliteVectorIndex, VectorIndex};

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub config: ConfigService,
    pub settings: AppConfig,
    pub llm: LlmService,
    pub index: Arc<dyn VectorIndex>,
    pub pipeline: Arc<ResearchPipeline>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// 1. Loads `config.yml` over the defaults
    /// 2. Reads the API credential from the configured environment variable
    /// 3. Opens the vector index
    /// 4. Builds both orchestration strategies
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_app_config()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let api_key = read_api_key(&settings.llm.api_key_env)
            .map_err(|e| InitializationError::MissingCredential(e.into()))?;
        let provider = Arc::new(OpenAiProvider::new(settings.llm.base_url.clone(), api_key));
        let llm = LlmService::new(provider, &settings.llm);

        let index_path = settings
            .retrieval
            .index_path
            .clone()
            .unwrap_or_else(|| paths.index_path.clone());
        let sqlite = SqliteVectorIndex::open(&index_path, llm.clone())
            .await
            .map_err(|e| InitializationError::Index(e.into()))?;
        let db_path = sqlite.db_path().display().to_string();
        let index: Arc<dyn VectorIndex> = Arc::new(sqlite);

        match index.count().await {
            Ok(0) => tracing::warn!(path = %db_path, "Vector index is empty"),
            Ok(count) => tracing::info!(path = %db_path, count, "Vector index opened"),
            Err(e) => tracing::warn!("Failed to count indexed documents: {}", e),
        }

        Self::assemble(config, settings, llm, index)
    }

    /// Builds state around an already-open model and index.
    pub fn assemble(
        config: ConfigService,
        settings: AppConfig,
        llm: LlmService,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Arc<Self>, InitializationError> {
        let pipeline = Arc::new(
            ResearchPipeline::new(index.clone(), llm.clone(), &settings)
                .map_err(|e| InitializationError::Graph(e.into()))?,
        );

        Ok(Arc::new(AppState {
            config,
            settings,
            llm,
            index,
            pipeline,
            started_at: Utc::now(),
        }))
    }
}
