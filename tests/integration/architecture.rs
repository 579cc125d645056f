use crate::mock_server::MockServerFixture;
use runagent::{codes, ErrorKind};

const ARCHITECTURE: &str = r#"{
    "success": true,
    "data": {
        "agent_id": "agent-1",
        "entrypoints": [
            {"tag": "generic", "file": "main.py", "module": "run"},
            {"tag": "generic_stream", "file": "main.py", "module": "run_stream"}
        ]
    },
    "message": "Architecture retrieved",
    "error": null
}"#;

#[tokio::test]
async fn test_get_architecture() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_architecture("agent-1", 200, ARCHITECTURE).await;

    let client = fixture.remote_client("agent-1", "generic");
    let arch = client.get_architecture().await.unwrap();

    assert_eq!(arch.agent_id.as_deref(), Some("agent-1"));
    assert_eq!(arch.tags(), vec!["generic", "generic_stream"]);
    assert_eq!(arch.entrypoints[1].module.as_deref(), Some("run_stream"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_validate_entrypoint() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_architecture("agent-1", 200, ARCHITECTURE).await;

    let client = fixture.remote_client("agent-1", "generic");
    assert!(client.validate_entrypoint().await.is_ok());

    let client = fixture.remote_client("agent-1", "missing_tag");
    let err = client.validate_entrypoint().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.code(), Some(codes::ENTRYPOINT_NOT_FOUND));
    assert!(err.suggestion().unwrap().contains("generic_stream"));
}

#[tokio::test]
async fn test_empty_architecture() {
    let fixture = MockServerFixture::new().await;
    fixture
        .mock_architecture("agent-1", 200, r#"{"entrypoints":[]}"#)
        .await;

    let client = fixture.remote_client("agent-1", "generic");
    let err = client.get_architecture().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.code(), Some(codes::ARCHITECTURE_MISSING));
}

#[tokio::test]
async fn test_architecture_not_found() {
    let fixture = MockServerFixture::new().await;
    fixture
        .mock_architecture("agent-1", 404, r#"{"detail":"Agent not found"}"#)
        .await;

    let client = fixture.remote_client("agent-1", "generic");
    let err = client.get_architecture().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Server);
    assert_eq!(err.http_status, Some(404));
}
