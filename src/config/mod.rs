//! Configuration management for voxloop
//!
//! Values are layered env > TOML file > default.

pub mod file;

use std::time::Duration;

use secrecy::SecretString;

use crate::history::MAX_MESSAGES;
use crate::pipeline::DEFAULT_SYSTEM_PROMPT;
use crate::voice::{SttProvider, TtsProvider};
use crate::{Error, Result};

/// Default upload limit (Whisper accepts files up to 25 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// voxloop configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Chat model configuration
    pub llm: LlmConfig,

    /// Speech configuration
    pub voice: VoiceConfig,

    /// Number of history messages retained across turns
    pub max_messages: usize,

    /// API keys
    pub api_keys: ApiKeys,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body in bytes
    pub max_upload_bytes: usize,
    /// Per-call limit for external services; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
}

/// Chat model configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub max_tokens: Option<u32>,
    pub system_prompt: String,
}

/// Speech configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub stt_provider: SttProvider,
    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,
    pub tts_provider: TtsProvider,
    /// TTS model (e.g. "tts-1", "`eleven_monolingual_v1`")
    pub tts_model: String,
    /// Voice name (`OpenAI`) or voice id (`ElevenLabs`)
    pub tts_voice: String,
    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper, chat, TTS)
    pub openai: Option<SecretString>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<SecretString>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<SecretString>,
}

impl Config {
    /// Load configuration from the process environment and config file
    ///
    /// # Errors
    ///
    /// Returns error if the config file can't be read or parsed, or a value is malformed
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file()?;
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a provider name or numeric value is malformed
    pub fn from_sources(
        fc: file::VoxloopConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .map(SecretString::from),
            deepgram: env("DEEPGRAM_API_KEY")
                .or(fc.api_keys.deepgram)
                .map(SecretString::from),
            elevenlabs: env("ELEVENLABS_API_KEY")
                .or(fc.api_keys.elevenlabs)
                .map(SecretString::from),
        };

        let port = match (env("VOXLOOP_PORT"), env("PORT")) {
            (Some(raw), _) => Some(parse_env("VOXLOOP_PORT", &raw)?),
            (None, Some(raw)) => Some(parse_env("PORT", &raw)?),
            (None, None) => fc.server.port,
        };

        let timeout_secs = match env("VOXLOOP_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Some(parse_env::<u64>("VOXLOOP_REQUEST_TIMEOUT_SECS", &raw)?),
            None => fc.server.request_timeout_secs,
        };

        let server = ServerConfig {
            host: env("VOXLOOP_HOST")
                .or(fc.server.host)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: port.unwrap_or(8000),
            max_upload_bytes: fc.server.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            request_timeout: timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        };

        let llm = LlmConfig {
            model: env("VOXLOOP_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| crate::llm::DEFAULT_MODEL.to_string()),
            base_url: env("VOXLOOP_LLM_BASE_URL")
                .or(fc.llm.base_url)
                .unwrap_or_else(|| crate::llm::DEFAULT_BASE_URL.to_string()),
            max_tokens: fc.llm.max_tokens,
            system_prompt: env("VOXLOOP_SYSTEM_PROMPT")
                .or(fc.llm.system_prompt)
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        };

        let stt_provider: SttProvider = env("VOXLOOP_STT_PROVIDER")
            .or(fc.voice.stt_provider)
            .map_or(Ok(SttProvider::Whisper), |s| s.parse())?;
        let tts_provider: TtsProvider = env("VOXLOOP_TTS_PROVIDER")
            .or(fc.voice.tts_provider)
            .map_or(Ok(TtsProvider::OpenAI), |s| s.parse())?;

        let voice = VoiceConfig {
            stt_provider,
            stt_model: env("VOXLOOP_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| default_stt_model(stt_provider).to_string()),
            tts_provider,
            tts_model: env("VOXLOOP_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| default_tts_model(tts_provider).to_string()),
            tts_voice: env("VOXLOOP_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or_else(|| "alloy".to_string()),
            tts_speed: fc.voice.tts_speed.unwrap_or(1.0),
        };

        let max_messages = match env("VOXLOOP_MAX_MESSAGES") {
            Some(raw) => parse_env("VOXLOOP_MAX_MESSAGES", &raw)?,
            None => fc.history.max_messages.unwrap_or(MAX_MESSAGES),
        };

        Ok(Self {
            server,
            llm,
            voice,
            max_messages,
            api_keys,
        })
    }

    /// Check that every selected provider has a credential
    ///
    /// # Errors
    ///
    /// Returns error naming the first missing key
    pub fn validate(&self) -> Result<()> {
        // Chat completion always goes through the OpenAI-compatible endpoint
        if self.api_keys.openai.is_none() {
            return Err(Error::Config("OPENAI_API_KEY is not set".to_string()));
        }
        if self.voice.stt_provider == SttProvider::Deepgram && self.api_keys.deepgram.is_none() {
            return Err(Error::Config(
                "DEEPGRAM_API_KEY is required for the Deepgram STT provider".to_string(),
            ));
        }
        if self.voice.tts_provider == TtsProvider::ElevenLabs && self.api_keys.elevenlabs.is_none()
        {
            return Err(Error::Config(
                "ELEVENLABS_API_KEY is required for the ElevenLabs TTS provider".to_string(),
            ));
        }
        if !(0.25..=4.0).contains(&self.voice.tts_speed) {
            return Err(Error::Config(format!(
                "tts_speed must be between 0.25 and 4.0, got {}",
                self.voice.tts_speed
            )));
        }
        Ok(())
    }

    /// Key for the configured STT provider
    #[must_use]
    pub fn stt_key(&self) -> Option<&SecretString> {
        match self.voice.stt_provider {
            SttProvider::Whisper => self.api_keys.openai.as_ref(),
            SttProvider::Deepgram => self.api_keys.deepgram.as_ref(),
        }
    }

    /// Key for the configured TTS provider
    #[must_use]
    pub fn tts_key(&self) -> Option<&SecretString> {
        match self.voice.tts_provider {
            TtsProvider::OpenAI => self.api_keys.openai.as_ref(),
            TtsProvider::ElevenLabs => self.api_keys.elevenlabs.as_ref(),
        }
    }
}

const fn default_stt_model(provider: SttProvider) -> &'static str {
    match provider {
        SttProvider::Whisper => "whisper-1",
        SttProvider::Deepgram => "nova-2",
    }
}

const fn default_tts_model(provider: TtsProvider) -> &'static str {
    match provider {
        TtsProvider::OpenAI => "tts-1",
        TtsProvider::ElevenLabs => "eleven_monolingual_v1",
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid value for {key}: {raw:?}")))
}
