use engine_config::settings::SettingsError;
use engine_runtime::error::{ActorError, ScrollError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read the pages file: {0}")]
    PagesRead(#[from] std::io::Error),

    #[error("Failed to parse the pages file as a JSON array of pages: {0}")]
    PagesParse(#[from] serde_json::Error),

    #[error("Invalid scroll settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scroll actor error: {0}")]
    Actor(#[from] ActorError),

    #[error("Scroll failed: {0}")]
    Scroll(#[from] ScrollError),

    #[error("Failed to write output: {0}")]
    Output(std::io::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
