//! HTTP-level tests for the Core proxy against a mocked upstream.

use std::time::Duration;

use futures::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use goftar_bridge::{CoreConfig, CoreProxy, QueryStream};
use goftar_core::{Error, FileAttachment, QueryChunk, QueryRequest, RemoteConversations};

fn request() -> QueryRequest {
    QueryRequest {
        text: "ساعات کاری پشتیبانی چیست؟".to_string(),
        language: "fa".to_string(),
        conversation_id: None,
        attachments: vec![],
        stream: false,
    }
}

fn proxy_for(server: &MockServer) -> CoreProxy {
    CoreProxy::new(CoreConfig::new(server.uri())).unwrap()
}

async fn collect(mut stream: QueryStream) -> Vec<Result<QueryChunk, Error>> {
    let mut out = Vec::new();
    while let Some(item) = stream.next().await {
        out.push(item);
    }
    out
}

#[tokio::test]
async fn buffered_query_happy_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .and(bearer_token("tok"))
        .and(body_partial_json(serde_json::json!({ "language": "fa" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "answer": "از ۹ تا ۱۷",
            "sources": ["kb:7"],
            "conversation_id": "c-1",
            "message_id": "m-1",
            "tokens_used": 12,
            "processing_time_ms": 450,
            "cached": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = proxy_for(&server).send(&request(), "tok").await.unwrap();

    assert_eq!(result.answer, "از ۹ تا ۱۷");
    assert_eq!(result.conversation_id, "c-1");
    assert_eq!(result.sources, vec!["kb:7".to_string()]);
}

#[tokio::test]
async fn buffered_query_maps_upstream_errors_with_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = proxy_for(&server).send(&request(), "tok").await.unwrap_err();

    match err {
        Error::Upstream { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
            assert!(Error::Upstream { status, body }.is_retryable());
        }
        other => panic!("expected Upstream, got {:?}", other),
    }
}

#[tokio::test]
async fn buffered_query_4xx_is_not_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad language"))
        .mount(&server)
        .await;

    let err = proxy_for(&server).send(&request(), "tok").await.unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn buffered_query_times_out_without_partial_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(10))
                .set_body_string("never seen"),
        )
        .mount(&server)
        .await;

    let mut config = CoreConfig::new(server.uri());
    config.query_timeout_secs = 1;
    let proxy = CoreProxy::new(config).unwrap();

    let err = proxy.send(&request(), "tok").await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn buffered_query_times_out_when_body_stalls_after_headers() {
    // Wiremock delays whole responses; a stalled body needs a raw socket
    // that sends headers promising more bytes than ever arrive.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let _ = socket
            .write_all(
                b"HTTP/1.1 200 OK\r\n\
                  content-type: application/json\r\n\
                  content-length: 4096\r\n\r\n\
                  {\"answer\":\"",
            )
            .await;
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let mut config = CoreConfig::new(format!("http://{}", addr));
    config.query_timeout_secs = 1;
    let proxy = CoreProxy::new(config).unwrap();

    let err = proxy.send(&request(), "tok").await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn six_attachments_rejected_before_any_network_call() {
    let server = MockServer::start().await;

    // No mock mounted: a network call would 404 and surface as Upstream.
    let mut req = request();
    req.attachments = (0..6)
        .map(|i| FileAttachment {
            filename: format!("f{}.txt", i),
            object_key: format!("staging/o/{}-k/f{}.txt", i, i),
            content_type: "text/plain".to_string(),
            size_bytes: 10,
        })
        .collect();

    let err = proxy_for(&server).send(&req, "tok").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn streamed_query_yields_start_deltas_end_in_order() {
    let server = MockServer::start().await;

    let body = "data: {\"delta\":\"A\"}\n\n\
                data: {\"delta\":\"B\"}\n\n\
                data: {\"delta\":\"C\"}\n\n\
                data: [DONE]\n\n";
    Mock::given(method("POST"))
        .and(path("/query/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let stream = proxy_for(&server)
        .send_stream(&request(), "tok")
        .await
        .unwrap();
    let items = collect(stream).await;

    let chunks: Vec<QueryChunk> = items.into_iter().map(|i| i.unwrap()).collect();
    assert_eq!(
        chunks,
        vec![
            QueryChunk::Start,
            QueryChunk::Delta("A".to_string()),
            QueryChunk::Delta("B".to_string()),
            QueryChunk::Delta("C".to_string()),
            QueryChunk::End,
        ]
    );
}

#[tokio::test]
async fn dropped_stream_surfaces_interruption_after_delivered_chunks() {
    let server = MockServer::start().await;

    // Body ends without the [DONE] sentinel.
    let body = "data: {\"delta\":\"A\"}\n\ndata: {\"delta\":\"B\"}\n\n";
    Mock::given(method("POST"))
        .and(path("/query/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let stream = proxy_for(&server)
        .send_stream(&request(), "tok")
        .await
        .unwrap();
    let items = collect(stream).await;

    assert_eq!(items.len(), 4);
    assert_eq!(*items[0].as_ref().unwrap(), QueryChunk::Start);
    assert_eq!(*items[1].as_ref().unwrap(), QueryChunk::Delta("A".to_string()));
    assert_eq!(*items[2].as_ref().unwrap(), QueryChunk::Delta("B".to_string()));
    assert!(matches!(items[3], Err(Error::StreamInterrupted(_))));
}

#[tokio::test]
async fn dropping_stream_closes_upstream_connection_promptly() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (closed_tx, closed_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        // One delta, then silence. No content-length: the body runs until
        // the connection closes.
        let _ = socket
            .write_all(
                b"HTTP/1.1 200 OK\r\n\
                  content-type: text/event-stream\r\n\r\n\
                  data: {\"delta\":\"A\"}\n\n",
            )
            .await;
        loop {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
        let _ = closed_tx.send(());
    });

    let proxy = CoreProxy::new(CoreConfig::new(format!("http://{}", addr))).unwrap();
    let mut stream = proxy.send_stream(&request(), "tok").await.unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap(), QueryChunk::Start);
    assert_eq!(
        stream.next().await.unwrap().unwrap(),
        QueryChunk::Delta("A".to_string())
    );
    drop(stream);

    // Well under the 60s idle timeout: the reader must notice the caller
    // going away, not wait out the timer.
    tokio::time::timeout(Duration::from_secs(5), closed_rx)
        .await
        .expect("upstream connection still open after the stream was dropped")
        .unwrap();
}

#[tokio::test]
async fn streamed_query_upstream_error_fails_before_start() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query/stream"))
        .respond_with(ResponseTemplate::new(500).set_body_string("stream broken"))
        .mount(&server)
        .await;

    let err = proxy_for(&server)
        .send_stream(&request(), "tok")
        .await
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, Error::Upstream { status: 500, .. }));
}

#[tokio::test]
async fn delete_conversation_treats_404_as_success() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/conversations/c-gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let proxy = proxy_for(&server);
    assert!(proxy.delete_conversation("c-gone", "tok").await.is_ok());
}

#[tokio::test]
async fn delete_conversation_propagates_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/conversations/c-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let proxy = proxy_for(&server);
    let err = proxy.delete_conversation("c-1", "tok").await.unwrap_err();
    assert!(matches!(err, Error::Upstream { status: 500, .. }));
}
