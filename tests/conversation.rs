//! Multi-turn conversation behaviour through the turn pipeline

use std::sync::Arc;

use voxloop::{ChatMessage, ConversationBuffer, MAX_MESSAGES, TurnError};

mod common;
use common::{FakeServices, fake_pipeline};

#[tokio::test]
async fn eleven_turns_evict_the_first_exchange() {
    let services = Arc::new(FakeServices::default());
    let history = Arc::new(ConversationBuffer::default());
    let pipeline = fake_pipeline(&services, &history);

    for i in 1..=11 {
        services.push_turn(&format!("user_{i}"), &format!("assistant_{i}"));
        let out = pipeline.handle_turn(b"RIFF").await.unwrap();
        assert!(out.history.len() <= MAX_MESSAGES);
    }

    let snapshot = history.snapshot().await;
    assert_eq!(snapshot.len(), 20);
    assert_eq!(snapshot[0], ChatMessage::user("user_2"));
    assert_eq!(snapshot[1], ChatMessage::assistant("assistant_2"));
    assert_eq!(snapshot[19], ChatMessage::assistant("assistant_11"));
}

#[tokio::test]
async fn each_completion_sees_prior_history() {
    let services = Arc::new(FakeServices::default());
    let history = Arc::new(ConversationBuffer::default());
    let pipeline = fake_pipeline(&services, &history).system_prompt("sys");

    services.push_turn("first", "one");
    services.push_turn("second", "two");
    pipeline.handle_turn(b"RIFF").await.unwrap();
    pipeline.handle_turn(b"RIFF").await.unwrap();

    let inputs = services.completion_inputs.lock().unwrap();
    assert_eq!(
        inputs[0],
        vec![ChatMessage::system("sys"), ChatMessage::user("first")]
    );
    assert_eq!(
        inputs[1],
        vec![
            ChatMessage::system("sys"),
            ChatMessage::user("first"),
            ChatMessage::assistant("one"),
            ChatMessage::user("second"),
        ]
    );
}

#[tokio::test]
async fn failed_turns_do_not_leak_into_context() {
    let services = Arc::new(FakeServices::default());
    let history = Arc::new(ConversationBuffer::default());
    let pipeline = fake_pipeline(&services, &history);

    // Completion fails: the transcript is never recorded
    services.push_transcript(Some("lost"));
    services.push_reply(None);
    let err = pipeline.handle_turn(b"RIFF").await.unwrap_err();
    assert!(matches!(err, TurnError::Completion(_)));

    services.push_turn("kept", "reply");
    pipeline.handle_turn(b"RIFF").await.unwrap();

    let inputs = services.completion_inputs.lock().unwrap();
    assert_eq!(inputs[1].len(), 2);
    assert_eq!(inputs[1][1], ChatMessage::user("kept"));
}

#[tokio::test]
async fn synthesis_failure_is_remembered_by_next_turn() {
    let services = Arc::new(FakeServices::default());
    let history = Arc::new(ConversationBuffer::default());
    let pipeline = fake_pipeline(&services, &history);

    services.push_turn("hi", "Hello!");
    services.set_fail_synthesis(true);
    let err = pipeline.handle_turn(b"RIFF").await.unwrap_err();
    assert!(matches!(err, TurnError::Synthesis(_)));

    services.set_fail_synthesis(false);
    services.push_turn("again", "Hi again.");
    let out = pipeline.handle_turn(b"RIFF").await.unwrap();

    assert_eq!(
        out.history,
        vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("Hello!"),
            ChatMessage::user("again"),
            ChatMessage::assistant("Hi again."),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_turns_share_one_history() {
    let services = Arc::new(FakeServices::default());
    let history = Arc::new(ConversationBuffer::default());
    let pipeline = Arc::new(fake_pipeline(&services, &history));

    for i in 0..5 {
        services.push_turn(&format!("u{i}"), &format!("a{i}"));
    }

    let mut handles = Vec::new();
    for _ in 0..5 {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            pipeline.handle_turn(b"RIFF").await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snapshot = history.snapshot().await;
    assert_eq!(snapshot.len(), 10);
    for pair in snapshot.chunks(2) {
        assert_eq!(pair[0].role, voxloop::Role::User);
        assert_eq!(pair[1].role, voxloop::Role::Assistant);
    }
}
