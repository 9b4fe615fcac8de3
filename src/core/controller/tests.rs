use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use super::*;
use crate::core::chat_stream::TransportError;
use crate::core::message::Role;
use crate::utils::test_utils::{text_chunks, ScriptedReply, ScriptedTransport};

async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("test step timed out")
}

fn turns(controller: &ChatController<ScriptedTransport>) -> Vec<(Role, String)> {
    controller
        .conversation()
        .iter()
        .map(|turn| (turn.role, turn.content.clone()))
        .collect()
}

fn pair(user: &str, assistant: &str) -> Vec<(Role, String)> {
    vec![
        (Role::User, user.to_string()),
        (Role::Assistant, assistant.to_string()),
    ]
}

#[tokio::test]
async fn empty_credential_is_rejected_without_io() {
    let controller = ChatController::new(ScriptedTransport::streaming(&["unused"]));

    let result = controller.submit("hello", "").await;

    assert!(matches!(result, Err(ChatError::MissingCredential)));
    assert_eq!(controller.transport().call_count(), 0);
    assert!(controller.conversation().is_empty());
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn streamed_chunks_build_the_assistant_turn() {
    let controller = ChatController::new(ScriptedTransport::streaming(&["He", "llo"]));

    let outcome = controller.submit("hi", "k").await.expect("accepted");

    assert_eq!(
        outcome.summary(),
        Some(StreamSummary {
            chunks: 2,
            bytes: 5,
            decode_failures: 0,
        })
    );
    assert_eq!(turns(&controller), pair("hi", "Hello"));
    assert!(!controller.conversation().is_streaming());
    assert!(!controller.is_loading());
    assert_eq!(
        controller.transport().requests(),
        vec![ChatRequest::new("hi", "k")]
    );
}

#[tokio::test]
async fn server_error_appends_fixed_error_turn() {
    let controller = ChatController::new(ScriptedTransport::failing(TransportError::Status {
        status: 500,
    }));

    let outcome = controller.submit("hi", "k").await.expect("accepted");

    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(ChatError::TransportFailure(TransportError::Status {
            status: 500
        }))
    ));
    assert_eq!(turns(&controller), pair("hi", TRANSPORT_ERROR_MESSAGE));
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn missing_body_is_reported_like_a_transport_failure() {
    let controller = ChatController::new(ScriptedTransport::failing(
        TransportError::BodyUnavailable { status: 204 },
    ));

    let outcome = controller.submit("hi", "k").await.expect("accepted");

    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(ChatError::StreamUnavailable)
    ));
    assert_eq!(turns(&controller), pair("hi", TRANSPORT_ERROR_MESSAGE));
}

#[tokio::test]
async fn empty_stream_leaves_empty_assistant_turn() {
    let controller = ChatController::new(ScriptedTransport::streaming(&[]));

    let outcome = controller.submit("hi", "k").await.expect("accepted");

    assert!(outcome.is_completed());
    assert_eq!(turns(&controller), pair("hi", ""));
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn reply_equals_concatenation_of_chunks_in_arrival_order() {
    let text = "Diffie–Hellman → shared secret 🔒 over an insecure channel";
    for size in [1, 2, 3, 4, 9] {
        let chunks: Vec<_> = text
            .as_bytes()
            .chunks(size)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        let controller =
            ChatController::new(ScriptedTransport::new([ScriptedReply::Stream(chunks)]));

        controller.submit("dh?", "k").await.expect("accepted");

        assert_eq!(turns(&controller), pair("dh?", text), "chunk size {size}");
    }
}

#[tokio::test]
async fn undecodable_chunk_is_skipped() {
    let chunks = vec![
        Ok(Bytes::from_static(b"ok ")),
        Ok(Bytes::from_static(&[0xff, 0xfe])),
        Ok(Bytes::from_static(b"fine")),
    ];
    let controller = ChatController::new(ScriptedTransport::new([ScriptedReply::Stream(chunks)]));

    let outcome = controller.submit("hi", "k").await.expect("accepted");

    assert!(outcome.is_completed());
    assert_eq!(outcome.summary().map(|s| s.decode_failures), Some(1));
    assert_eq!(turns(&controller), pair("hi", "ok fine"));
}

#[tokio::test]
async fn interrupted_stream_replaces_placeholder_with_error() {
    let mut chunks = text_chunks(&["partial "]);
    chunks.push(Err(TransportError::Network {
        message: "connection reset".to_string(),
    }));
    chunks.extend(text_chunks(&["never seen"]));
    let controller = ChatController::new(ScriptedTransport::new([ScriptedReply::Stream(chunks)]));

    let outcome = controller.submit("hi", "k").await.expect("accepted");

    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(ChatError::TransportFailure(TransportError::Network { .. }))
    ));
    assert_eq!(turns(&controller), pair("hi", TRANSPORT_ERROR_MESSAGE));
    assert!(!controller.conversation().is_streaming());
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn conversation_growth_per_submission_kind() {
    let controller = ChatController::new(ScriptedTransport::new([
        ScriptedReply::Stream(text_chunks(&["one"])),
        ScriptedReply::Fail(TransportError::Status { status: 502 }),
        ScriptedReply::Stream(text_chunks(&["three"])),
    ]));

    controller.submit("a", "k").await.expect("accepted");
    assert_eq!(controller.conversation().len(), 2);

    assert!(controller.submit("b", "").await.is_err());
    assert_eq!(controller.conversation().len(), 2);

    controller.submit("c", "k").await.expect("accepted");
    assert_eq!(controller.conversation().len(), 4);

    controller.submit("d", "k").await.expect("accepted");
    let snapshot = controller.conversation();
    assert_eq!(snapshot.len(), 6);
    assert_eq!(
        snapshot.last().map(|turn| turn.content.as_str()),
        Some("three")
    );
    assert_eq!(snapshot.get(3).map(|t| t.content.as_str()), Some(TRANSPORT_ERROR_MESSAGE));
}

#[tokio::test]
async fn placeholder_is_visible_before_any_content() {
    let (transport, tx) = ScriptedTransport::live();
    let controller = Arc::new(ChatController::new(transport));
    let mut conversation = controller.subscribe();
    let mut loading = controller.loading();

    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit("hi", "k").await })
    };

    within(conversation.wait_for(|c| c.is_streaming()))
        .await
        .expect("store alive");
    assert_eq!(turns(&controller), pair("hi", ""));
    within(loading.wait_for(|loading| *loading))
        .await
        .expect("loading alive");

    tx.send(Ok(Bytes::from_static(b"He"))).expect("send");
    within(conversation.wait_for(|c| c.last().is_some_and(|t| t.content == "He")))
        .await
        .expect("store alive");
    tx.send(Ok(Bytes::from_static(b"llo"))).expect("send");
    drop(tx);

    let outcome = within(task).await.expect("join").expect("accepted");
    assert!(outcome.is_completed());
    assert_eq!(turns(&controller), pair("hi", "Hello"));
    assert!(!*loading.borrow_and_update());
}

#[tokio::test]
async fn second_submit_while_streaming_is_rejected() {
    let (transport, tx) = ScriptedTransport::live();
    let controller = Arc::new(ChatController::new(transport));
    let mut conversation = controller.subscribe();

    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit("first", "k").await })
    };
    within(conversation.wait_for(|c| c.is_streaming()))
        .await
        .expect("store alive");

    let second = controller.submit("second", "k").await;
    assert!(matches!(second, Err(ChatError::Busy)));
    assert_eq!(controller.transport().call_count(), 1);
    assert_eq!(turns(&controller), pair("first", ""));

    tx.send(Ok(Bytes::from_static(b"done"))).expect("send");
    drop(tx);
    within(task).await.expect("join").expect("accepted");
    assert_eq!(turns(&controller), pair("first", "done"));
}

#[tokio::test]
async fn cancel_keeps_partial_text_and_releases_the_stream() {
    let (transport, tx) = ScriptedTransport::live();
    let controller = Arc::new(ChatController::new(transport));
    let mut conversation = controller.subscribe();

    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit("hi", "k").await })
    };
    within(conversation.wait_for(|c| c.is_streaming()))
        .await
        .expect("store alive");
    tx.send(Ok(Bytes::from_static(b"par"))).expect("send");
    within(conversation.wait_for(|c| c.last().is_some_and(|t| t.content == "par")))
        .await
        .expect("store alive");

    assert!(controller.cancel());
    let outcome = within(task).await.expect("join").expect("accepted");

    assert!(matches!(outcome, SubmitOutcome::Cancelled(_)));
    within(tx.closed()).await;
    assert_eq!(turns(&controller), pair("hi", "par"));
    assert!(!controller.conversation().is_streaming());
    assert!(!controller.is_loading());
    assert!(!controller.cancel());
}

#[tokio::test]
async fn dropping_the_submission_resets_state() {
    let (transport, tx) = ScriptedTransport::live();
    let controller = Arc::new(ChatController::new(transport));
    let mut conversation = controller.subscribe();

    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit("hi", "k").await })
    };
    within(conversation.wait_for(|c| c.is_streaming()))
        .await
        .expect("store alive");

    task.abort();
    assert!(within(task).await.is_err());

    within(tx.closed()).await;
    assert!(!controller.is_loading());
    assert!(!controller.conversation().is_streaming());
    assert!(!controller.cancel());
}

#[tokio::test]
async fn loading_flag_is_reset_after_every_outcome() {
    let controller = ChatController::new(ScriptedTransport::new([
        ScriptedReply::Stream(text_chunks(&["ok"])),
        ScriptedReply::Fail(TransportError::Network {
            message: "refused".to_string(),
        }),
    ]));
    let mut loading = controller.loading();

    controller.submit("a", "k").await.expect("accepted");
    assert!(loading.has_changed().expect("alive"));
    assert!(!*loading.borrow_and_update());

    controller.submit("b", "k").await.expect("accepted");
    assert!(!*loading.borrow_and_update());

    controller.submit("c", "").await.expect_err("rejected");
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn uncontinued_character_drops_only_the_carried_byte() {
    let chunks = vec![
        Ok(Bytes::from_static(b"a\xe2")),
        Ok(Bytes::from_static(b"(valid)")),
    ];
    let controller = ChatController::new(ScriptedTransport::new([ScriptedReply::Stream(chunks)]));

    let outcome = controller.submit("hi", "k").await.expect("accepted");

    assert!(outcome.is_completed());
    assert_eq!(outcome.summary().map(|s| s.decode_failures), Some(1));
    assert_eq!(turns(&controller), pair("hi", "a(valid)"));
}

#[tokio::test]
async fn rejected_submit_on_shared_store_leaves_other_reply_streaming() {
    let (transport, tx) = ScriptedTransport::live();
    let first = Arc::new(ChatController::new(transport));
    let second = ChatController::with_store(
        ScriptedTransport::streaming(&["unused"]),
        first.store().clone(),
    );
    let mut conversation = first.subscribe();

    let task = {
        let first = Arc::clone(&first);
        tokio::spawn(async move { first.submit("first", "k").await })
    };
    within(conversation.wait_for(|c| c.is_streaming()))
        .await
        .expect("store alive");

    let rejected = second.submit("second", "k").await;
    assert!(matches!(rejected, Err(ChatError::Busy)));
    assert_eq!(second.transport().call_count(), 0);
    assert!(!second.is_loading());
    assert!(first.conversation().is_streaming());

    tx.send(Ok(Bytes::from_static(b"Hello"))).expect("send");
    drop(tx);
    let outcome = within(task).await.expect("join").expect("accepted");

    assert!(outcome.is_completed());
    assert_eq!(turns(&first), pair("first", "Hello"));
    assert!(!first.conversation().is_streaming());
}

#[tokio::test]
async fn cancel_before_the_backend_answers_keeps_only_the_user_turn() {
    let controller = Arc::new(ChatController::new(ScriptedTransport::new([
        ScriptedReply::Hang,
    ])));
    let mut loading = controller.loading();

    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit("hi", "k").await })
    };
    within(loading.wait_for(|loading| *loading))
        .await
        .expect("loading alive");

    assert!(controller.cancel());
    let outcome = within(task).await.expect("join").expect("accepted");

    assert!(matches!(outcome, SubmitOutcome::Cancelled(summary) if summary == StreamSummary::default()));
    assert_eq!(turns(&controller), vec![(Role::User, "hi".to_string())]);
    assert!(!controller.conversation().is_streaming());
    assert!(!controller.is_loading());
    assert!(!controller.cancel());
}
