//! Drives `RemoteSource` against a one-shot HTTP stub on localhost.

use reactor_core::error::DashboardError;
use reactor_core::models::{ModelType, ReactionConditions};
use reactor_runtime::prediction::{OutputSchema, PredictionSource, RemoteSource};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve exactly one request with `status` and `body`, handing the parsed
/// request body back through the returned channel.
async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let request_body = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let head = &text[..split];
                let length: usize = head
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                let body = &text[split + 4..];
                if body.len() >= length {
                    break body.to_string();
                }
            }
            if n == 0 {
                break String::new();
            }
        };
        let _ = tx.send(serde_json::from_str(&request_body).unwrap_or(Value::Null));

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    (format!("http://{addr}/predict"), rx)
}

#[tokio::test]
async fn test_remote_source_success_flat_response() {
    let (url, request) = serve_once(
        "200 OK",
        r#"{"m_output":[12000.0,24000.0,36000.0,45000.0,21000.0],"x_output":[0.87],"model_type":"pcinn"}"#,
    )
    .await;
    let source = RemoteSource::new(url, Some(ModelType::Pcinn), OutputSchema::default());

    let outputs = source.predict(&ReactionConditions::default()).await.unwrap();
    assert_eq!(outputs.get("mn"), Some(12000.0));
    assert_eq!(outputs.get("mv"), Some(21000.0));
    assert_eq!(outputs.confidence, 0.87);

    let sent = request.await.unwrap();
    assert_eq!(sent["M"], 0.2);
    assert_eq!(sent["S"], 1.0);
    assert_eq!(sent["I"], 0.5);
    assert_eq!(sent["temp"], 300.0);
    assert_eq!(sent["time"], 60.0);
    assert_eq!(sent["Reaction"], 3.0);
    assert_eq!(sent["model_type"], "pcinn");
}

#[tokio::test]
async fn test_remote_source_nested_outputs() {
    let (url, _request) = serve_once(
        "200 OK",
        r#"{"success":true,"outputs":{"m_output":[1.0,2.0,3.0,4.0,5.0],"x_output":[0.75]},"message":"Prediction successful"}"#,
    )
    .await;
    let source = RemoteSource::new(url, None, OutputSchema::default());
    let outputs = source.predict(&ReactionConditions::default()).await.unwrap();
    assert_eq!(outputs.get("mz"), Some(3.0));
    assert_eq!(outputs.confidence, 0.75);
}

#[tokio::test]
async fn test_remote_source_non_success_status() {
    let (url, _request) = serve_once("503 Service Unavailable", r#"{"detail":"down"}"#).await;
    let source = RemoteSource::new(url, None, OutputSchema::default());
    let err = source.predict(&ReactionConditions::default()).await.unwrap_err();
    match err {
        DashboardError::Backend { status, message } => {
            assert_eq!(status, Some(503));
            assert_eq!(message, "Service Unavailable");
        }
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_remote_source_short_response_is_malformed() {
    let (url, _request) = serve_once("200 OK", r#"{"m_output":[1.0],"x_output":[0.9]}"#).await;
    let source = RemoteSource::new(url, None, OutputSchema::default());
    let err = source.predict(&ReactionConditions::default()).await.unwrap_err();
    assert!(err.to_string().contains("malformed response"));
}

#[tokio::test]
async fn test_remote_source_unreachable() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = RemoteSource::new(format!("http://{addr}/predict"), None, OutputSchema::default());
    let err = source.predict(&ReactionConditions::default()).await.unwrap_err();
    assert!(matches!(err, DashboardError::Backend { status: None, .. }));
}
