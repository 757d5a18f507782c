//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use voxloop::{
    ApiServerBuilder, ChatMessage, ConversationBuffer, Error, Responder, Result, Synthesizer,
    Transcriber, TurnPipeline,
};

/// In-process stand-in for all three external services
///
/// Transcripts and replies are served from queues so each turn can see
/// distinct text. An exhausted queue behaves like an upstream failure.
#[derive(Default)]
pub struct FakeServices {
    transcripts: Mutex<VecDeque<Option<String>>>,
    replies: Mutex<VecDeque<Option<String>>>,
    pub fail_synthesis: Mutex<bool>,
    pub completion_inputs: Mutex<Vec<Vec<ChatMessage>>>,
    pub synthesized: Mutex<Vec<String>>,
}

impl FakeServices {
    /// Queue one successful transcript/reply pair
    pub fn push_turn(&self, transcript: &str, reply: &str) {
        self.push_transcript(Some(transcript));
        self.push_reply(Some(reply));
    }

    /// Queue a transcript; `None` makes the call fail
    pub fn push_transcript(&self, transcript: Option<&str>) {
        self.transcripts
            .lock()
            .unwrap()
            .push_back(transcript.map(String::from));
    }

    /// Queue a reply; `None` makes the call fail
    pub fn push_reply(&self, reply: Option<&str>) {
        self.replies.lock().unwrap().push_back(reply.map(String::from));
    }

    pub fn set_fail_synthesis(&self, fail: bool) {
        *self.fail_synthesis.lock().unwrap() = fail;
    }
}

#[async_trait]
impl Transcriber for FakeServices {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        self.transcripts
            .lock()
            .unwrap()
            .pop_front()
            .flatten()
            .ok_or_else(|| Error::Stt("fake transcription failure".to_string()))
    }

    fn name(&self) -> &'static str {
        "fake-stt"
    }
}

#[async_trait]
impl Responder for FakeServices {
    async fn respond(&self, messages: &[ChatMessage]) -> Result<String> {
        self.completion_inputs.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .flatten()
            .ok_or_else(|| Error::Llm("fake completion failure".to_string()))
    }

    fn name(&self) -> &'static str {
        "fake-llm"
    }
}

#[async_trait]
impl Synthesizer for FakeServices {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if *self.fail_synthesis.lock().unwrap() {
            return Err(Error::Tts("fake synthesis failure".to_string()));
        }
        self.synthesized.lock().unwrap().push(text.to_string());
        Ok(format!("mp3:{text}").into_bytes())
    }

    fn name(&self) -> &'static str {
        "fake-tts"
    }
}

/// Build a pipeline whose three stages are served by `services`
pub fn fake_pipeline(
    services: &Arc<FakeServices>,
    history: &Arc<ConversationBuffer>,
) -> TurnPipeline {
    TurnPipeline::new(
        services.clone(),
        services.clone(),
        services.clone(),
        history.clone(),
    )
}

/// Build a test API router over fake services
pub fn build_test_router(
    services: &Arc<FakeServices>,
    history: &Arc<ConversationBuffer>,
) -> axum::Router {
    ApiServerBuilder::new(fake_pipeline(services, history))
        .build()
        .router()
}

/// Build a test API router that rejects bodies over `limit` bytes
pub fn build_limited_router(
    services: &Arc<FakeServices>,
    history: &Arc<ConversationBuffer>,
    limit: usize,
) -> axum::Router {
    ApiServerBuilder::new(fake_pipeline(services, history))
        .max_upload_bytes(limit)
        .build()
        .router()
}

pub const BOUNDARY: &str = "voxloop-test-boundary";

/// Encode a single-file multipart body
pub fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: audio/wav\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}
