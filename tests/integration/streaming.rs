use crate::doubles::{data, status, ScriptedConnector};
use futures::StreamExt;
use runagent::config::UserConfig;
use runagent::normalize::StreamState;
use runagent::telemetry::{InMemoryObserver, ObservedEvent, StreamEnd};
use runagent::{args, codes, kw, kws, ErrorKind, RunAgentClient, RunAgentClientBuilder, RunInput};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn remote(tag: &str, connector: Arc<ScriptedConnector>) -> RunAgentClientBuilder {
    RunAgentClient::builder("agent-1", tag)
        .env(HashMap::new())
        .user_config(UserConfig::default())
        .base_url("https://api.example.com")
        .api_key("secret")
        .stream_connector(connector)
}

#[tokio::test]
async fn test_stream_yields_chunks_then_end() {
    let connector = ScriptedConnector::new(vec![
        status("stream_started"),
        data(json!("a")),
        data(json!("b")),
        status("stream_completed"),
    ]);
    let client = remote("generic_stream", connector.clone()).build().unwrap();

    let mut stream = client.run_stream(RunInput::new().kw("m", 1)).await.unwrap();
    let mut chunks = Vec::new();
    while let Some(chunk) = stream.next().await.unwrap() {
        chunks.push(chunk);
    }

    assert_eq!(chunks, vec![json!("a"), json!("b")]);
    assert_eq!(stream.state(), StreamState::TerminatedOk);
    assert_eq!(stream.next().await.unwrap(), None);
    assert_eq!(connector.log.closes(), 1);
}

#[tokio::test]
async fn test_stream_handshake_and_credentials() {
    let connector = ScriptedConnector::new(vec![status("stream_completed")]);
    let client = remote("chat_stream", connector.clone())
        .async_execution(true)
        .build()
        .unwrap();

    let mut stream = client
        .run_stream(RunInput::new().arg("hi").kw("m", 3))
        .await
        .unwrap();
    assert_eq!(stream.next().await.unwrap(), None);

    let url = connector.last_url().unwrap();
    assert!(url.starts_with("wss://api.example.com/api/v1/agents/agent-1/run-stream"));
    assert!(url.ends_with("?token=secret"));
    assert_eq!(connector.header("authorization").as_deref(), Some("Bearer secret"));
    assert!(connector.header("user-agent").unwrap().starts_with("runagent-rust/"));

    let handshake = connector.log.handshake();
    assert_eq!(handshake["entrypoint_tag"], "chat_stream");
    assert_eq!(handshake["input_args"], json!(["hi"]));
    assert_eq!(handshake["input_kwargs"], json!({"m": 3}));
    assert_eq!(handshake["timeout_seconds"], 600);
    assert!(handshake.get("async_execution").is_none());
}

#[tokio::test]
async fn test_stream_from_payload_tokens() {
    let connector = ScriptedConnector::new(vec![data(json!("ok")), status("stream_completed")]);
    let client = remote("generic_stream", connector.clone()).build().unwrap();

    let mut stream = client
        .run_stream_tokens([
            args(["a", "b"]),
            kws([("m", 1)]),
            kws([("m", 2)]),
            kw("role", "user"),
        ])
        .await
        .unwrap();
    assert_eq!(stream.next().await.unwrap(), Some(json!("ok")));
    assert_eq!(stream.next().await.unwrap(), None);

    let handshake = connector.log.handshake();
    assert_eq!(handshake["input_args"], json!(["a", "b"]));
    assert_eq!(handshake["input_kwargs"], json!({"m": 2, "role": "user"}));
}

#[tokio::test]
async fn test_stream_tokens_reject_bare_array_before_connect() {
    let connector = ScriptedConnector::new(Vec::new());
    let client = remote("generic_stream", connector.clone()).build().unwrap();

    let err = client
        .run_stream_tokens([runagent::ArgToken::from(json!([1, 2]))])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.code(), Some(codes::INVALID_ARGUMENTS));
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn test_local_stream_has_no_token() {
    let connector = ScriptedConnector::new(vec![status("stream_completed")]);
    let client = RunAgentClient::builder("agent-1", "generic_stream")
        .env(HashMap::new())
        .user_config(UserConfig::default())
        .local(true)
        .host("127.0.0.1")
        .port(8450)
        .api_key("ignored")
        .stream_connector(connector.clone())
        .build()
        .unwrap();

    let mut stream = client
        .run_stream(RunInput::new().timeout_seconds(30))
        .await
        .unwrap();
    stream.next().await.unwrap();

    assert_eq!(
        connector.last_url().as_deref(),
        Some("ws://127.0.0.1:8450/api/v1/agents/agent-1/run-stream")
    );
    assert!(connector.header("authorization").is_none());
    assert_eq!(connector.log.handshake()["timeout_seconds"], 30);
}

#[tokio::test]
async fn test_stream_failed_stops_reading() {
    let connector = ScriptedConnector::new(vec![
        status("stream_started"),
        data(json!("a")),
        status("stream_failed"),
        data(json!("never")),
    ]);
    let client = remote("generic_stream", connector.clone()).build().unwrap();

    let mut stream = client.run_stream(RunInput::new()).await.unwrap();
    assert_eq!(stream.next().await.unwrap(), Some(json!("a")));

    let err = stream.next().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Server);
    assert_eq!(err.code(), Some(codes::STREAM_FAILED));
    assert_eq!(stream.state(), StreamState::TerminatedError);

    assert_eq!(stream.next().await.unwrap(), None);
    assert_eq!(connector.log.remaining(), 1);
    assert_eq!(connector.log.closes(), 1);
}

#[tokio::test]
async fn test_error_frame_is_classified() {
    let connector = ScriptedConnector::new(vec![json!({
        "type": "error",
        "error": {"type": "PERMISSION_ERROR", "message": "not allowed"}
    })
    .to_string()]);
    let client = remote("generic_stream", connector.clone()).build().unwrap();

    let mut stream = client.run_stream(RunInput::new()).await.unwrap();
    let err = stream.next().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Permission);
    assert_eq!(err.message, "not allowed");
    assert_eq!(connector.log.closes(), 1);
}

#[tokio::test]
async fn test_premature_close_is_connection_error() {
    let connector = ScriptedConnector::new(vec![data(json!("a"))]);
    let client = remote("generic_stream", connector.clone()).build().unwrap();

    let mut stream = client.run_stream(RunInput::new()).await.unwrap();
    assert_eq!(stream.next().await.unwrap(), Some(json!("a")));
    let err = stream.next().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Connection);
    assert_eq!(err.code(), Some(codes::STREAM_CLOSED));
    assert_eq!(connector.log.closes(), 1);
}

#[tokio::test]
async fn test_cancel_before_read() {
    let connector = ScriptedConnector::new(vec![data(json!("a")), data(json!("b"))]);
    let client = remote("generic_stream", connector.clone()).build().unwrap();
    let cancel = CancellationToken::new();

    let mut stream = client
        .run_stream_with_cancel(RunInput::new(), &cancel)
        .await
        .unwrap();
    assert_eq!(stream.next().await.unwrap(), Some(json!("a")));

    cancel.cancel();
    let err = stream.next().await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(connector.log.reads(), 1);
    assert_eq!(connector.log.closes(), 1);
    assert_eq!(stream.next().await.unwrap(), None);
}

#[tokio::test]
async fn test_cancel_during_blocked_read() {
    let connector = ScriptedConnector::hanging(vec![status("stream_started")]);
    let client = remote("generic_stream", connector.clone()).build().unwrap();
    let cancel = CancellationToken::new();

    let mut stream = client
        .run_stream_with_cancel(RunInput::new(), &cancel)
        .await
        .unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("cancellation interrupts the read")
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(connector.log.closes(), 1);
}

#[tokio::test]
async fn test_explicit_close_is_idempotent() {
    let connector = ScriptedConnector::hanging(vec![data(json!("a"))]);
    let client = remote("generic_stream", connector.clone()).build().unwrap();

    let mut stream = client.run_stream(RunInput::new()).await.unwrap();
    assert_eq!(stream.next().await.unwrap(), Some(json!("a")));
    stream.close().await;
    stream.close().await;

    assert_eq!(connector.log.closes(), 1);
    assert_eq!(stream.next().await.unwrap(), None);
}

#[tokio::test]
async fn test_into_stream_adapter() {
    let connector = ScriptedConnector::new(vec![
        data(json!("{\"n\":1}")),
        data(json!({"n": 2})),
        status("stream_completed"),
    ]);
    let client = remote("generic_stream", connector.clone()).build().unwrap();

    let stream = client.run_stream(RunInput::new()).await.unwrap();
    let items: Vec<_> = stream.into_stream().collect().await;

    let values: Vec<_> = items.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(values, vec![json!({"n": 1}), json!({"n": 2})]);
}

#[tokio::test]
async fn test_into_stream_ends_after_error() {
    let connector = ScriptedConnector::new(vec![
        data(json!("a")),
        status("error"),
        data(json!("b")),
    ]);
    let client = remote("generic_stream", connector).build().unwrap();

    let stream = client.run_stream(RunInput::new()).await.unwrap();
    let items: Vec<_> = stream.into_stream().collect().await;

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(items[1].is_err());
}

#[tokio::test]
async fn test_connect_failure() {
    let connector = ScriptedConnector::refusing();
    let client = remote("generic_stream", connector.clone()).build().unwrap();

    let err = client.run_stream(RunInput::new()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Connection);
    assert_eq!(connector.connects(), 1);
}

#[tokio::test]
async fn test_handshake_write_failure_closes_connection() {
    let connector = ScriptedConnector::failing_write();
    let client = remote("generic_stream", connector.clone()).build().unwrap();

    let err = client.run_stream(RunInput::new()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Connection);
    assert_eq!(connector.log.closes(), 1);
}

#[tokio::test]
async fn test_observer_sees_frames_and_end() {
    let connector = ScriptedConnector::new(vec![data(json!("a")), status("stream_completed")]);
    let observer = Arc::new(InMemoryObserver::new());
    let client = remote("generic_stream", connector)
        .observer(observer.clone())
        .build()
        .unwrap();

    let mut stream = client.run_stream(RunInput::new()).await.unwrap();
    while stream.next().await.unwrap().is_some() {}

    let events = observer.events();
    let frames = events
        .iter()
        .filter(|e| matches!(e, ObservedEvent::Frame(_)))
        .count();
    assert_eq!(frames, 2);
    assert_eq!(
        events.last(),
        Some(&ObservedEvent::StreamEnd(StreamEnd::Completed))
    );
}
