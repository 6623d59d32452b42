use arbor_services::filesystem::{FileSystemAccessor, MemoryAccessor};
use arbor_services::query::{QueryError, QueryForwarder, QueryRequest, NO_MATCH, UNAVAILABLE_MESSAGE};
use arbor_services::settings::AssistantSettings;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve one HTTP response and hand back the raw request it answered.
async fn serve_once(status: &'static str, body: &'static str) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local test server");
    let addr = listener.local_addr().expect("local addr");

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept connection");
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        request
    });

    (addr, server)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = socket.read(&mut buf).await.expect("read request");
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&raw);
        if let Some(split) = text.find("\r\n\r\n") {
            let content_length = text[..split]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if raw.len() >= split + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

fn request_body(raw: &str) -> serde_json::Value {
    let (_, body) = raw.split_once("\r\n\r\n").expect("request has a body");
    serde_json::from_str(body).expect("request body is JSON")
}

fn forwarder(base_url: String, accessor: Arc<dyn FileSystemAccessor>) -> QueryForwarder {
    let settings = AssistantSettings {
        base_url: Some(base_url),
        timeout_secs: Some(5),
        ..AssistantSettings::default()
    };
    QueryForwarder::new(&settings, accessor)
}

fn memory() -> Arc<MemoryAccessor> {
    Arc::new(MemoryAccessor::with_sample_tree())
}

#[tokio::test]
async fn test_generate_posts_prompt() {
    let (addr, server) = serve_once("200 OK", r#"{"ollama_response":"Hello there"}"#).await;
    let forwarder = forwarder(format!("http://{}/", addr), memory());

    let message = forwarder.generate("hi").await.unwrap();
    assert_eq!(message.content, "Hello there");
    assert!(!message.failed);

    let raw = server.await.expect("server task completes");
    assert!(raw.starts_with("POST /ai-assistant "));
    assert_eq!(
        request_body(&raw),
        serde_json::json!({"action": "generate", "params": {"prompt": "hi"}})
    );
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let (addr, server) = serve_once(
        "500 Internal Server Error",
        r#"{"error":"model not loaded","message":"retry later"}"#,
    )
    .await;
    let forwarder = forwarder(format!("http://{}", addr), memory());

    let err = forwarder.generate("hi").await.unwrap_err();
    assert_eq!(err.kind(), "ServiceUnavailable");
    assert!(err.to_string().contains("model not loaded"));
    assert_eq!(err.to_message().content, UNAVAILABLE_MESSAGE);
    server.await.expect("server task completes");
}

#[tokio::test]
async fn test_unreachable_service_renders_inline() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let forwarder = forwarder(format!("http://{}", addr), memory());

    let message = forwarder
        .ask(&QueryRequest::Generate {
            prompt: "hi".to_string(),
        })
        .await;
    assert!(message.failed);
    assert_eq!(message.content, UNAVAILABLE_MESSAGE);
}

#[tokio::test]
async fn test_summarize_requires_existing_absolute_path() {
    let fs = memory();
    let forwarder = forwarder("http://127.0.0.1:9".to_string(), fs.clone());

    let err = forwarder.summarize(Path::new("notes.txt")).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidPath(_)));

    let missing = fs.home_dir().join("missing.pdf");
    let err = forwarder.summarize(&missing).await.unwrap_err();
    assert!(matches!(err, QueryError::NotFound(ref p) if *p == missing));
}

#[cfg(unix)]
#[tokio::test]
async fn test_summarize_sends_lengths() {
    let (addr, server) = serve_once("200 OK", r#"{"summary":"Short version."}"#).await;
    let fs = memory();
    let forwarder = forwarder(format!("http://{}", addr), fs.clone());
    let report = PathBuf::from("/home/user/Documents/report.pdf");

    let message = forwarder.summarize(&report).await.unwrap();
    assert_eq!(message.content, "Short version.");

    let raw = server.await.expect("server task completes");
    assert!(raw.starts_with("POST /summarize-document "));
    assert_eq!(
        request_body(&raw),
        serde_json::json!({
            "filepath": "/home/user/Documents/report.pdf",
            "max_length": 500,
            "overlap": 100
        })
    );
}

#[tokio::test]
async fn test_search_without_match() {
    let (addr, server) = serve_once(
        "200 OK",
        r#"{"faiss_top_files":[],"ollama_response":"","top_match":{"file_path":"","confidence":"","context":""}}"#,
    )
    .await;
    let forwarder = forwarder(format!("http://{}", addr), memory());

    let message = forwarder.search("quarterly budget", None).await.unwrap();
    assert_eq!(message.content, NO_MATCH);
    assert!(!message.failed);

    let raw = server.await.expect("server task completes");
    assert_eq!(request_body(&raw), serde_json::json!({"query": "quarterly budget"}));
}

#[tokio::test]
async fn test_search_reports_best_match() {
    let (addr, server) = serve_once(
        "200 OK",
        r#"{"faiss_top_files":["/srv/budget.xlsx"],"top_match":{"file_path":"/srv/budget.xlsx","confidence":0.92,"context":"Q3 totals"}}"#,
    )
    .await;
    let forwarder = forwarder(format!("http://{}", addr), memory());

    let message = forwarder
        .search("budget", Some(Path::new("/srv")))
        .await
        .unwrap();
    assert_eq!(message.content, "Best match: /srv/budget.xlsx (confidence 0.92)\nQ3 totals");

    let raw = server.await.expect("server task completes");
    assert!(raw.starts_with("POST /search-files "));
    assert_eq!(request_body(&raw)["start_dir"], "/srv");
}

#[tokio::test]
async fn test_empty_input_is_rejected_locally() {
    let forwarder = forwarder("http://127.0.0.1:9".to_string(), memory());

    let err = forwarder.generate("   ").await.unwrap_err();
    assert_eq!(err.kind(), "BadRequest");
    let err = forwarder.search("", None).await.unwrap_err();
    assert!(matches!(err, QueryError::EmptyInput("query")));
}

#[tokio::test]
async fn test_malformed_reply_is_decode_error() {
    let (addr, server) = serve_once("200 OK", "not json").await;
    let forwarder = forwarder(format!("http://{}", addr), memory());

    let err = forwarder.generate("hi").await.unwrap_err();
    assert!(matches!(err, QueryError::Decode(_)));
    server.await.expect("server task completes");
}
