//! One voice round trip: transcribe, respond, synthesize
//!
//! Stages run strictly in order and the first failure ends the turn. The
//! history is written exactly once per turn, right after a successful
//! completion and before synthesis. A synthesis failure therefore still
//! leaves the exchange in the history.

use std::sync::Arc;

use tracing::Instrument;

use crate::config::Config;
use crate::history::{ChatMessage, ConversationBuffer};
use crate::llm::ChatCompletion;
use crate::providers::{Responder, Synthesizer, Timed, Transcriber};
use crate::voice::{SpeechToText, TextToSpeech};
use crate::Error;

/// Default system prompt prepended to every completion request
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful voice assistant. Keep responses concise and natural.";

/// Failure of a single turn, tagged with the stage that failed
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// Speech-to-text failed or produced no text
    #[error("transcription failed: {0}")]
    Transcription(#[source] Error),

    /// Chat completion failed or produced no text
    #[error("completion failed: {0}")]
    Completion(#[source] Error),

    /// Speech synthesis failed or produced no audio
    #[error("synthesis failed: {0}")]
    Synthesis(#[source] Error),
}

impl TurnError {
    /// Stable machine-readable code for API responses
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Transcription(_) => "transcription_failed",
            Self::Completion(_) => "completion_failed",
            Self::Synthesis(_) => "synthesis_failed",
        }
    }
}

/// Result of a successful turn
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub transcript: String,
    pub response_text: String,
    /// Synthesized speech (MP3)
    pub audio: Vec<u8>,
    /// History after this turn's exchange was recorded
    pub history: Vec<ChatMessage>,
}

/// Drives turns against shared conversation memory
pub struct TurnPipeline {
    transcriber: Arc<dyn Transcriber>,
    responder: Arc<dyn Responder>,
    synthesizer: Arc<dyn Synthesizer>,
    history: Arc<ConversationBuffer>,
    system_prompt: String,
}

impl TurnPipeline {
    /// Create a pipeline with the default system prompt
    #[must_use]
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        responder: Arc<dyn Responder>,
        synthesizer: Arc<dyn Synthesizer>,
        history: Arc<ConversationBuffer>,
    ) -> Self {
        Self {
            transcriber,
            responder,
            synthesizer,
            history,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Wire the HTTP collaborators selected by `config`
    ///
    /// Each collaborator is wrapped in [`Timed`] when a request timeout is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns error if a required API key is missing
    pub fn from_config(config: &Config, history: Arc<ConversationBuffer>) -> crate::Result<Self> {
        let missing = |what: &str| Error::Config(format!("no API key configured for {what}"));
        let limit = config.server.request_timeout;

        let stt_key = config.stt_key().cloned().ok_or_else(|| missing("STT"))?;
        let stt = SpeechToText::new(
            config.voice.stt_provider,
            stt_key,
            config.voice.stt_model.clone(),
        )?;

        let llm_key = config
            .api_keys
            .openai
            .clone()
            .ok_or_else(|| missing("chat completion"))?;
        let llm = ChatCompletion::new(llm_key, config.llm.model.clone())?
            .base_url(config.llm.base_url.as_str())
            .max_tokens(config.llm.max_tokens);

        let tts_key = config.tts_key().cloned().ok_or_else(|| missing("TTS"))?;
        let tts = TextToSpeech::new(
            config.voice.tts_provider,
            tts_key,
            config.voice.tts_voice.clone(),
            config.voice.tts_model.clone(),
        )?
        .speed(config.voice.tts_speed);

        let transcriber: Arc<dyn Transcriber> = match limit {
            Some(limit) => Arc::new(Timed::new(stt, limit)),
            None => Arc::new(stt),
        };
        let responder: Arc<dyn Responder> = match limit {
            Some(limit) => Arc::new(Timed::new(llm, limit)),
            None => Arc::new(llm),
        };
        let synthesizer: Arc<dyn Synthesizer> = match limit {
            Some(limit) => Arc::new(Timed::new(tts, limit)),
            None => Arc::new(tts),
        };

        Ok(Self::new(transcriber, responder, synthesizer, history)
            .system_prompt(config.llm.system_prompt.as_str()))
    }

    /// Replace the system prompt
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Shared conversation memory
    #[must_use]
    pub const fn history(&self) -> &Arc<ConversationBuffer> {
        &self.history
    }

    /// Speech-to-text collaborator
    #[must_use]
    pub fn transcriber(&self) -> &dyn Transcriber {
        self.transcriber.as_ref()
    }

    /// Speech synthesis collaborator
    #[must_use]
    pub fn synthesizer(&self) -> &dyn Synthesizer {
        self.synthesizer.as_ref()
    }

    /// Completion input for `transcript` given the history before this turn
    fn build_messages(&self, history: Vec<ChatMessage>, transcript: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.as_str()));
        messages.extend(history);
        messages.push(ChatMessage::user(transcript));
        messages
    }

    /// Run one round trip from uploaded audio to synthesized reply
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that fails. Transcription and
    /// completion failures leave the history untouched; a synthesis failure
    /// happens after the exchange has been recorded.
    pub async fn handle_turn(&self, audio: &[u8]) -> Result<TurnOutput, TurnError> {
        let turn_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("turn", %turn_id);
        self.run_turn(audio).instrument(span).await
    }

    async fn run_turn(&self, audio: &[u8]) -> Result<TurnOutput, TurnError> {
        tracing::debug!(audio_bytes = audio.len(), "turn started");

        // Transcribe
        let transcript = self
            .transcriber
            .transcribe(audio)
            .await
            .and_then(|text| non_empty(text, self.transcriber.name()))
            .map_err(|e| {
                tracing::warn!(provider = self.transcriber.name(), error = %e, "transcription failed");
                TurnError::Transcription(e)
            })?;
        tracing::info!(transcript = %transcript, "transcribed");

        // Respond
        let messages = self.build_messages(self.history.snapshot().await, &transcript);
        let response_text = self
            .responder
            .respond(&messages)
            .await
            .and_then(|text| non_empty(text, self.responder.name()))
            .map_err(|e| {
                tracing::warn!(provider = self.responder.name(), error = %e, "completion failed");
                TurnError::Completion(e)
            })?;
        tracing::info!(chars = response_text.len(), "response received");

        self.history
            .append_exchange(transcript.as_str(), response_text.as_str())
            .await;

        // Synthesize
        let audio = self
            .synthesizer
            .synthesize(&response_text)
            .await
            .and_then(|bytes| {
                if bytes.is_empty() {
                    Err(Error::EmptyResult(self.synthesizer.name()))
                } else {
                    Ok(bytes)
                }
            })
            .map_err(|e| {
                tracing::warn!(provider = self.synthesizer.name(), error = %e, "synthesis failed");
                TurnError::Synthesis(e)
            })?;

        let history = self.history.snapshot().await;
        tracing::info!(
            audio_bytes = audio.len(),
            history_len = history.len(),
            "turn complete"
        );

        Ok(TurnOutput {
            transcript,
            response_text,
            audio,
            history,
        })
    }
}

/// Reject an empty result; anything else passes through untouched
fn non_empty(text: String, provider: &'static str) -> crate::Result<String> {
    if text.is_empty() {
        Err(Error::EmptyResult(provider))
    } else {
        Ok(text)
    }
}
