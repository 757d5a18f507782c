//! Text-to-speech (TTS) clients

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::providers::Synthesizer;
use crate::{Error, Result};

/// TTS provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtsProvider {
    OpenAI,
    ElevenLabs,
}

impl std::str::FromStr for TtsProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "elevenlabs" => Ok(Self::ElevenLabs),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
const ELEVENLABS_SPEECH_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

impl TtsProvider {
    const fn vendor(self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::ElevenLabs => "ElevenLabs",
        }
    }
}

#[derive(serde::Serialize)]
struct OpenAiSpeech<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
}

#[derive(serde::Serialize)]
struct ElevenLabsSpeech<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    voice: String,
    speed: f32,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a client for `provider`
    ///
    /// `voice` is an `OpenAI` voice name or an `ElevenLabs` voice id.
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(
        provider: TtsProvider,
        api_key: SecretString,
        voice: String,
        model: String,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(format!(
                "{} API key required for TTS",
                provider.vendor()
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            speed: 1.0,
            model,
            provider,
        })
    }

    /// Playback speed; ignored by `ElevenLabs`
    #[must_use]
    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Active backend
    #[must_use]
    pub const fn provider(&self) -> TtsProvider {
        self.provider
    }

    /// Synthesize `text` into MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the provider rejects it
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        tracing::debug!(chars = text.len(), provider = ?self.provider, "starting synthesis");

        let key = self.api_key.expose_secret();
        let request = match self.provider {
            TtsProvider::OpenAI => self
                .client
                .post(OPENAI_SPEECH_URL)
                .bearer_auth(key)
                .json(&OpenAiSpeech {
                    model: &self.model,
                    input: text,
                    voice: &self.voice,
                    speed: self.speed,
                }),
            TtsProvider::ElevenLabs => self
                .client
                .post(format!("{ELEVENLABS_SPEECH_URL}/{}", self.voice))
                .header("xi-api-key", key)
                .json(&ElevenLabsSpeech {
                    text,
                    model_id: &self.model,
                }),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, provider = ?self.provider, "TTS request rejected");
            return Err(Error::Tts(format!(
                "{} TTS error {status}: {body}",
                self.provider.vendor()
            )));
        }

        let audio = response.bytes().await?.to_vec();
        tracing::info!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio)
    }
}

#[async_trait]
impl Synthesizer for TextToSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        Self::synthesize(self, text).await
    }

    fn name(&self) -> &'static str {
        match self.provider {
            TtsProvider::OpenAI => "openai-tts",
            TtsProvider::ElevenLabs => "elevenlabs",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        let empty = || SecretString::from(String::new());
        let err = TextToSpeech::new(TtsProvider::OpenAI, empty(), "alloy".into(), "tts-1".into())
            .err()
            .unwrap();
        assert!(err.to_string().contains("OpenAI"));

        let err = TextToSpeech::new(TtsProvider::ElevenLabs, empty(), "v".into(), "m".into())
            .err()
            .unwrap();
        assert!(err.to_string().contains("ElevenLabs"));
    }

    #[test]
    fn openai_keeps_selected_model() {
        let key = SecretString::from("sk-test".to_string());
        let tts = TextToSpeech::new(TtsProvider::OpenAI, key, "alloy".into(), "tts-1-hd".into())
            .unwrap()
            .speed(1.5);
        assert_eq!(tts.model, "tts-1-hd");
        assert!((tts.speed - 1.5).abs() < f32::EPSILON);
        assert_eq!(tts.provider(), TtsProvider::OpenAI);
        assert_eq!(Synthesizer::name(&tts), "openai-tts");
    }

    #[test]
    fn parses_provider_names() {
        assert_eq!("openai".parse::<TtsProvider>().unwrap(), TtsProvider::OpenAI);
        assert_eq!("ElevenLabs".parse::<TtsProvider>().unwrap(), TtsProvider::ElevenLabs);
        assert!("polly".parse::<TtsProvider>().is_err());
    }
}
