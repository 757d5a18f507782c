//! Per-call time budget for collaborators

use std::time::Duration;

use async_trait::async_trait;

use super::{Responder, Synthesizer, Transcriber};
use crate::history::ChatMessage;
use crate::{Error, Result};

/// Bounds every call on the wrapped collaborator with a timeout
///
/// The call is attempted once; expiry surfaces as [`Error::Timeout`].
pub struct Timed<T> {
    inner: T,
    limit: Duration,
}

impl<T> Timed<T> {
    /// Wrap `inner` with a per-call limit
    #[must_use]
    pub const fn new(inner: T, limit: Duration) -> Self {
        Self { inner, limit }
    }

    /// Configured limit
    #[must_use]
    pub const fn limit(&self) -> Duration {
        self.limit
    }
}

#[async_trait]
impl<T: Transcriber> Transcriber for Timed<T> {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        tokio::time::timeout(self.limit, self.inner.transcribe(audio))
            .await
            .map_err(|_| Error::Timeout(self.inner.name(), self.limit))?
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[async_trait]
impl<T: Responder> Responder for Timed<T> {
    async fn respond(&self, messages: &[ChatMessage]) -> Result<String> {
        tokio::time::timeout(self.limit, self.inner.respond(messages))
            .await
            .map_err(|_| Error::Timeout(self.inner.name(), self.limit))?
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[async_trait]
impl<T: Synthesizer> Synthesizer for Timed<T> {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        tokio::time::timeout(self.limit, self.inner.synthesize(text))
            .await
            .map_err(|_| Error::Timeout(self.inner.name(), self.limit))?
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slow(Duration);

    #[async_trait]
    impl Synthesizer for Slow {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
            tokio::time::sleep(self.0).await;
            Ok(vec![1, 2, 3])
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn passes_through_fast_calls() {
        let timed = Timed::new(Slow(Duration::from_millis(1)), Duration::from_secs(5));
        assert_eq!(timed.synthesize("hi").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(timed.name(), "slow");
    }

    #[tokio::test]
    async fn expires_slow_calls() {
        let timed = Timed::new(Slow(Duration::from_secs(5)), Duration::from_millis(20));
        let err = timed.synthesize("hi").await.unwrap_err();
        assert!(matches!(err, Error::Timeout("slow", _)), "got {err}");
    }
}
