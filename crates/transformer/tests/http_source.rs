//! HTTP origin reads against a local server.

mod common;

use common::{jpeg, png};
use gfr_image_transformer::{
    DimensionResolver, Dimensions, HttpImageSource, ImageSource, TransformerConfig, TransformerError,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
struct Seen {
    path: String,
    range: Option<String>,
    request_id: Option<String>,
    user_agent: Option<String>,
}

type Log = Arc<Mutex<Vec<Seen>>>;

struct Origin {
    addr: SocketAddr,
    log: Log,
}

impl Origin {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let log = Log::default();

        let server_log = log.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(handle(stream, server_log.clone()));
            }
        });

        Self { addr, log }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    fn seen(&self) -> Vec<Seen> {
        self.log.lock().unwrap().clone()
    }
}

fn header(head: &str, name: &str) -> Option<String> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim().to_string())
    })
}

async fn handle(mut stream: TcpStream, log: Log) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buf).to_string();
    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    let range = header(&head, "range");
    log.lock().unwrap().push(Seen {
        path: path.clone(),
        range: range.clone(),
        request_id: header(&head, "x-request-id"),
        user_agent: header(&head, "user-agent"),
    });

    let (status, body, honours_range) = match path.as_str() {
        "/photo.jpg" => ("200 OK", jpeg(1920, 1080, 200), true),
        "/exif-heavy.jpg" => ("200 OK", jpeg(4032, 3024, 5000), true),
        "/no-range.png" => ("200 OK", png(800, 600), false),
        "/slow.png" => {
            tokio::time::sleep(Duration::from_millis(500)).await;
            ("200 OK", png(1, 1), false)
        }
        "/server-error.png" => ("503 Service Unavailable", Vec::new(), false),
        _ => ("404 Not Found", Vec::new(), false),
    };

    let end = range
        .as_deref()
        .and_then(|r| r.strip_prefix("bytes=0-"))
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|_| honours_range && !body.is_empty());

    let response = match end {
        Some(end) => {
            let end = end.min(body.len() - 1);
            let mut out = format!(
                "HTTP/1.1 206 Partial Content\r\nContent-Range: bytes 0-{end}/{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len(),
                end + 1
            )
            .into_bytes();
            out.extend_from_slice(&body[..=end]);
            out
        }
        None => {
            let mut out = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .into_bytes();
            out.extend_from_slice(&body);
            out
        }
    };

    let _ = stream.write_all(&response).await;
    let _ = stream.shutdown().await;
}

fn source() -> HttpImageSource {
    HttpImageSource::new(&TransformerConfig::default()).unwrap()
}

#[tokio::test]
async fn test_ranged_read_is_partial() {
    let origin = Origin::start().await;

    let fetched = source().fetch(&origin.url("/photo.jpg"), Some(64)).await.unwrap();

    assert!(fetched.partial);
    assert_eq!(fetched.data.len(), 64);

    let seen = origin.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "/photo.jpg");
    assert_eq!(seen[0].range.as_deref(), Some("bytes=0-63"));
    assert!(seen[0].request_id.is_some());
    assert!(seen[0].user_agent.as_deref().unwrap().starts_with("gfr-image-transformer/"));
}

#[tokio::test]
async fn test_server_ignoring_range_returns_complete_body() {
    let origin = Origin::start().await;

    let fetched = source().fetch(&origin.url("/no-range.png"), Some(16)).await.unwrap();

    assert!(!fetched.partial);
    assert_eq!(fetched.data, png(800, 600));
}

#[tokio::test]
async fn test_full_read_sends_no_range() {
    let origin = Origin::start().await;

    let fetched = source().fetch(&origin.url("/photo.jpg"), None).await.unwrap();

    assert!(!fetched.partial);
    assert_eq!(fetched.data, jpeg(1920, 1080, 200));
    assert_eq!(origin.seen()[0].range, None);
}

#[tokio::test]
async fn test_not_found_is_http_status() {
    let origin = Origin::start().await;

    let err = source().fetch(&origin.url("/missing.png"), Some(64)).await.unwrap_err();

    assert!(matches!(err, TransformerError::HttpStatus { status: 404, .. }));
    assert!(err.is_fetch_error());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let origin = Origin::start().await;

    let err = source().fetch(&origin.url("/server-error.png"), None).await.unwrap_err();

    assert!(matches!(err, TransformerError::HttpStatus { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_slow_origin_times_out() {
    let origin = Origin::start().await;
    let config = TransformerConfig::default().with_fetch_timeout(Duration::from_millis(100));
    let source = HttpImageSource::new(&config).unwrap();

    let err = source.fetch(&origin.url("/slow.png"), None).await.unwrap_err();

    assert!(matches!(err, TransformerError::Timeout { .. }), "got {err:?}");
    assert!(err.is_fetch_error());
}

#[tokio::test]
async fn test_connection_refused_is_fetch_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let err = source().fetch(&format!("http://{addr}/a.png"), None).await.unwrap_err();

    assert!(matches!(err, TransformerError::Fetch { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_resolver_small_header_needs_one_request() {
    let origin = Origin::start().await;
    let resolver = DimensionResolver::for_url(origin.url("/photo.jpg"), source(), 1024);

    let dimensions = resolver.dimensions().await.unwrap();

    assert_eq!(dimensions, Dimensions { width: 1920, height: 1080 });
    assert_eq!(origin.seen().len(), 1);
}

#[tokio::test]
async fn test_resolver_falls_back_to_full_body_over_http() {
    let origin = Origin::start().await;
    let resolver = DimensionResolver::for_url(origin.url("/exif-heavy.jpg"), source(), 1024);

    let dimensions = resolver.dimensions().await.unwrap();
    assert_eq!(dimensions, Dimensions { width: 4032, height: 3024 });

    let seen = origin.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].range.as_deref(), Some("bytes=0-1023"));
    assert_eq!(seen[1].range, None);

    // Cached: no third request
    resolver.dimensions().await.unwrap();
    assert_eq!(origin.seen().len(), 2);
}
