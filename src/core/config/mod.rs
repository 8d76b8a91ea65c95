pub mod defaults;
pub mod paths;
pub mod service;
pub mod types;
pub mod validation;

pub use paths::AppPaths;
pub use service::{read_api_key, ConfigService};
pub use types::{AgentConfig, AppConfig, GraphConfig, LlmConfig, RetrievalConfig, ServerConfig};
