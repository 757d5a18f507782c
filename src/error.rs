//! Error types for voxloop

use thiserror::Error;

/// Result type alias for voxloop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in voxloop
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Chat completion error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Collaborator call exceeded its time budget
    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, std::time::Duration),

    /// Collaborator returned nothing usable
    #[error("{0} returned an empty result")]
    EmptyResult(&'static str),

    /// Config file could not be read
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Config file is not valid TOML
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
