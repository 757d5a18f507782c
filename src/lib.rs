//! voxloop - voice assistant round trips over HTTP
//!
//! Each request carries a recording through three external services and
//! returns the spoken reply:
//!
//! ```text
//!  audio ──► Transcriber ──► Responder ──► Synthesizer ──► audio
//!                               ▲   │
//!                     snapshot  │   │ append exchange
//!                               │   ▼
//!                        ConversationBuffer (shared, bounded)
//! ```
//!
//! All requests share one conversation. The buffer keeps the most recent
//! `max_messages` messages and is only written after a successful completion.

pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod pipeline;
pub mod providers;
pub mod voice;

pub use api::{ApiServer, ApiServerBuilder, ApiState};
pub use config::Config;
pub use error::{Error, Result};
pub use history::{ChatMessage, ConversationBuffer, MAX_MESSAGES, Role};
pub use pipeline::{TurnError, TurnOutput, TurnPipeline};
pub use providers::{Responder, Synthesizer, Timed, Transcriber};
