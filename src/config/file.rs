//! TOML configuration file loading
//!
//! Supports `~/.config/voxloop/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct VoxloopConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Chat model configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Speech configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Conversation memory configuration
    #[serde(default)]
    pub history: HistoryFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: Option<usize>,
    /// Per-call time budget for external services, in seconds
    pub request_timeout_secs: Option<u64>,
}

/// Chat model configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-4-turbo-preview")
    pub model: Option<String>,
    /// OpenAI-compatible API base URL
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
}

/// Speech configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// "whisper" or "deepgram"
    pub stt_provider: Option<String>,
    pub stt_model: Option<String>,
    /// "openai" or "elevenlabs"
    pub tts_provider: Option<String>,
    pub tts_model: Option<String>,
    pub tts_voice: Option<String>,
    pub tts_speed: Option<f32>,
}

/// Conversation memory configuration
#[derive(Debug, Default, Deserialize)]
pub struct HistoryFileConfig {
    pub max_messages: Option<usize>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `VoxloopConfigFile::default()` if the file doesn't exist.
///
/// # Errors
///
/// Returns error if the file exists but can't be read or parsed
pub fn load_config_file() -> Result<VoxloopConfigFile> {
    config_file_path().map_or_else(|| Ok(VoxloopConfigFile::default()), |path| load_from(&path))
}

/// Load a config file from an explicit path, falling back to defaults when absent
///
/// # Errors
///
/// Returns error if the file exists but can't be read or parsed
pub fn load_from(path: &Path) -> Result<VoxloopConfigFile> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file");
        return Ok(VoxloopConfigFile::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/voxloop/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voxloop").join("config.toml"))
}
