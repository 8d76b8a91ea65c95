use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Missing LLM credential: {0}")]
    MissingCredential(#[source] anyhow::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to open vector index: {0}")]
    Index(#[source] anyhow::Error),

    #[error("Failed to build research graph: {0}")]
    Graph(#[source] anyhow::Error),
}
