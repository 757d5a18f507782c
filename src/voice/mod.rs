//! Speech services
//!
//! HTTP clients for transcription and synthesis. Both implement the
//! capability traits in [`crate::providers`].

mod stt;
mod tts;

pub use stt::{SpeechToText, SttProvider};
pub use tts::{TextToSpeech, TtsProvider};
