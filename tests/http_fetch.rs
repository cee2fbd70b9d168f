//! End-to-end tests of the HTTP transport and fetcher
//!
//! Runs the real `reqwest` transport against a local TCP server that replays
//! canned HTTP responses, one per connection.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fenix_news::cache::CacheStore;
use fenix_news::data::{HttpTransport, NewsTransport, TokioPause};
use fenix_news::{NewsConfig, NewsFetcher, NewsOrigin};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Builds a raw HTTP/1.1 response with a JSON body
fn http_response(status_line: &str, extra_headers: &[(&str, &str)], body: &str) -> String {
    let headers: String = extra_headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}\r\n"))
        .collect();
    format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n{headers}Connection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Serves `responses` in order and records each request line
async fn serve(responses: Vec<String>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    tokio::spawn(async move {
        for response in responses {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.expect("read");
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let request = String::from_utf8_lossy(&buf).to_string();
            let request_line = request.lines().next().unwrap_or_default().to_string();
            recorded.lock().unwrap().push(request_line);
            socket.write_all(response.as_bytes()).await.expect("write");
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{addr}/api/v1/posts/"), requests)
}

/// HTTP transport that ignores any proxy settings of the test environment
fn local_transport(base_url: &str) -> HttpTransport {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("client should build");
    HttpTransport::with_client(client, base_url)
}

fn test_config(base_url: &str, tokens: &[&str], temp_dir: &TempDir) -> NewsConfig {
    NewsConfig::default()
        .with_base_url(base_url)
        .with_tokens(tokens.iter().copied())
        .with_cache_path(temp_dir.path().join("news.json"))
}

fn local_fetcher(config: &NewsConfig) -> NewsFetcher<HttpTransport, TokioPause> {
    NewsFetcher::with_parts(
        config.tokens.clone(),
        CacheStore::new(config.cache_path.clone()),
        local_transport(&config.base_url),
        TokioPause,
    )
}

#[tokio::test]
async fn test_transport_sends_query_and_reads_retry_after() {
    let (base_url, requests) = serve(vec![http_response(
        "429 Too Many Requests",
        &[("Retry-After", "2")],
        "{}",
    )])
    .await;
    let transport = local_transport(&base_url);

    let response = transport.get_posts("abc", 5).await.expect("request should complete");

    assert_eq!(response.status, 429);
    assert_eq!(response.retry_after, Some(2.0));
    let requests = requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec!["GET /api/v1/posts/?auth_token=abc&kind=news&public=true&limit=5 HTTP/1.1"]
    );
}

#[tokio::test]
async fn test_fetcher_rotates_past_rejected_token_and_caches_payload() {
    let body = r#"{"count": 2, "results": [{"title": "A"}, {"title": "B"}]}"#;
    let (base_url, requests) = serve(vec![
        http_response("401 Unauthorized", &[], r#"{"detail": "invalid token"}"#),
        http_response("200 OK", &[], body),
    ])
    .await;
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&base_url, &["badtoken", "goodtoken"], &temp_dir);
    let fetcher = local_fetcher(&config);

    let outcome = fetcher
        .fetch_news_detailed(3, Duration::from_millis(10), 20)
        .await;

    assert_eq!(outcome.origin, NewsOrigin::Live { token_index: 1 });
    assert_eq!(
        Value::Array(outcome.items.into_iter().map(Value::Object).collect()),
        json!([{"title": "A"}, {"title": "B"}])
    );

    let cached: Value =
        serde_json::from_str(&std::fs::read_to_string(config.cache_path).unwrap()).unwrap();
    assert_eq!(cached, serde_json::from_str::<Value>(body).unwrap());

    let requests = requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].contains("auth_token=badtoken"));
    assert!(requests[1].contains("auth_token=goodtoken"));
}

#[tokio::test]
async fn test_rate_limited_token_is_retried_before_next_token() {
    let (base_url, requests) = serve(vec![
        http_response("429 Too Many Requests", &[("Retry-After", "0")], "{}"),
        http_response("200 OK", &[], r#"{"results": [{"title": "after wait"}]}"#),
    ])
    .await;
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&base_url, &["t1", "t2"], &temp_dir);
    let fetcher = local_fetcher(&config);

    let started = std::time::Instant::now();
    let outcome = fetcher
        .fetch_news_detailed(3, Duration::from_millis(10), 20)
        .await;

    assert!(started.elapsed() >= Duration::from_secs(1), "Retry-After 0 still waits 1s");
    assert_eq!(outcome.origin, NewsOrigin::Live { token_index: 0 });
    assert_eq!(outcome.items[0]["title"], json!("after wait"));
    let requests = requests.lock().unwrap().clone();
    assert!(requests.iter().all(|line| line.contains("auth_token=t1")));
}

#[tokio::test]
async fn test_unreachable_server_falls_back_to_cache() {
    // Bind then drop to get a port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&format!("http://{addr}/"), &["t1"], &temp_dir);
    std::fs::write(&config.cache_path, r#"{"results": [{"title": "stale"}]}"#).unwrap();
    let fetcher = local_fetcher(&config);

    let items = fetcher.fetch_news(1, Duration::from_millis(10), 20).await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], json!("stale"));
}
