//! Voice endpoints: the full round trip plus standalone STT and TTS

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::history::ChatMessage;
use crate::pipeline::TurnError;

/// Multipart field carrying the uploaded recording
pub const UPLOAD_FIELD: &str = "audio_file";

/// Build the round-trip router
pub fn turn_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/process-voice", post(process_voice))
        .with_state(state)
}

/// Build the standalone STT/TTS router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/transcribe", post(transcribe))
        .route("/synthesize", post(synthesize))
        .with_state(state)
}

/// Round-trip response
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub transcript: String,
    pub response_text: String,
    /// Base64-encoded MP3
    pub audio: String,
    pub history: Vec<ChatMessage>,
}

/// Run one voice turn on an uploaded recording
async fn process_voice(
    State(state): State<Arc<ApiState>>,
    multipart: Multipart,
) -> Result<Json<TurnResponse>, VoiceError> {
    let audio = read_upload(multipart).await?;
    if audio.is_empty() {
        return Err(VoiceError::BadRequest("Empty audio data".to_string()));
    }

    let output = state.pipeline.handle_turn(&audio).await?;

    Ok(Json(TurnResponse {
        transcript: output.transcript,
        response_text: output.response_text,
        audio: base64::engine::general_purpose::STANDARD.encode(&output.audio),
        history: output.history,
    }))
}

/// Pull the recording out of a multipart body
///
/// Prefers the `audio_file` field and otherwise takes the first file field.
async fn read_upload(mut multipart: Multipart) -> Result<Bytes, VoiceError> {
    let mut fallback = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload_error)?
    {
        let named = field.name() == Some(UPLOAD_FIELD);
        let is_file = field.file_name().is_some();
        if !named && (!is_file || fallback.is_some()) {
            continue;
        }

        let data = field.bytes().await.map_err(upload_error)?;

        if named {
            return Ok(data);
        }
        fallback = Some(data);
    }

    fallback.ok_or_else(|| VoiceError::BadRequest("no audio file provided".to_string()))
}

/// Classify a multipart failure, keeping the body-limit case distinct
fn upload_error(e: MultipartError) -> VoiceError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        VoiceError::PayloadTooLarge(e.body_text())
    } else {
        VoiceError::BadRequest(format!("multipart error: {}", e.body_text()))
    }
}

/// Transcription response
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub text: String,
}

/// Transcribe a raw audio body without touching the conversation
async fn transcribe(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<TranscribeResponse>, VoiceError> {
    if body.is_empty() {
        return Err(VoiceError::BadRequest("Empty audio data".to_string()));
    }

    let text = state
        .pipeline
        .transcriber()
        .transcribe(&body)
        .await
        .map_err(|e| VoiceError::TranscriptionFailed(e.to_string()))?;

    Ok(Json(TranscribeResponse { text }))
}

/// Synthesis request
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: String,
}

/// Synthesize text to speech
///
/// Returns audio in MP3 format
async fn synthesize(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SynthesizeRequest>,
) -> Result<Response, VoiceError> {
    if request.text.trim().is_empty() {
        return Err(VoiceError::BadRequest("Empty text".to_string()));
    }

    let audio = state
        .pipeline
        .synthesizer()
        .synthesize(&request.text)
        .await
        .map_err(|e| VoiceError::SynthesisFailed(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        audio,
    )
        .into_response())
}

/// Voice API errors
#[derive(Debug)]
pub enum VoiceError {
    BadRequest(String),
    PayloadTooLarge(String),
    Turn(TurnError),
    TranscriptionFailed(String),
    SynthesisFailed(String),
}

impl From<TurnError> for VoiceError {
    fn from(e: TurnError) -> Self {
        Self::Turn(e)
    }
}

impl IntoResponse for VoiceError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg)
            }
            Self::Turn(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.code(), e.to_string()),
            Self::TranscriptionFailed(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "transcription_failed", msg)
            }
            Self::SynthesisFailed(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "synthesis_failed", msg)
            }
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}
