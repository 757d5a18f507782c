//! Capabilities for the external services a turn depends on
//!
//! Each trait is a single request/response call. Concrete HTTP clients live
//! in [`crate::voice`] and [`crate::llm`]; tests substitute in-process fakes.

mod timeout;

pub use timeout::Timed;

use async_trait::async_trait;

use crate::Result;
use crate::history::ChatMessage;

/// Speech-to-text service
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio bytes to text
    ///
    /// # Errors
    ///
    /// Returns error if the service call fails
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Chat completion service
#[async_trait]
pub trait Responder: Send + Sync {
    /// Produce the assistant reply for an ordered message list
    ///
    /// # Errors
    ///
    /// Returns error if the service call fails
    async fn respond(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Speech synthesis service
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text to audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if the service call fails
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
