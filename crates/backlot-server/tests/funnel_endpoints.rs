use backlot_funnel::{Funnel, FunnelConfig};
use backlot_server::{build_router, AppState};
use backlot_store::{LeadStore, MemoryStore};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct Fixture {
    addr: SocketAddr,
    store: Arc<MemoryStore>,
    _state: TempDir,
    _session: TempDir,
}

async fn serve_fixture() -> Fixture {
    let state = TempDir::new().expect("state dir");
    let session = TempDir::new().expect("session dir");
    let config = FunnelConfig {
        store_url: None,
        store_anon_key: None,
        maps_api_key: None,
        state_dir: PathBuf::from(state.path()),
        session_dir: PathBuf::from(session.path()),
    };
    let store = Arc::new(MemoryStore::new());
    let funnel = Arc::new(Funnel::new(
        config,
        Arc::clone(&store) as Arc<dyn LeadStore>,
    ));
    let app = build_router(AppState::new(funnel));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    Fixture {
        addr,
        store,
        _state: state,
        _session: session,
    }
}

async fn send_raw(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> (u16, Value) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(body) = body {
        request.push_str(&format!(
            "Content-Type: application/json\r\nContent-Length: {}\r\n",
            body.len()
        ));
    }
    request.push_str("\r\n");
    if let Some(body) = body {
        request.push_str(body);
    }
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.expect("read response");
    let text = String::from_utf8_lossy(&raw).to_string();
    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status code");
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.trim())
        .filter(|b| !b.is_empty())
        .map(|b| serde_json::from_str(b).expect("json body"))
        .unwrap_or(Value::Null);
    (status, body)
}

const BOSTON_FORM: &str = r#"{
    "street": "123 Main St",
    "city": "Boston",
    "state": "MA",
    "zip_code": "02108",
    "first_name": "Jane",
    "last_name": "Doe",
    "email": "jane@example.com"
}"#;

const FRESNO_FORM: &str = r#"{
    "street": "9 Elm St",
    "city": "Fresno",
    "state": "CA",
    "zip_code": "93701",
    "first_name": "Jane",
    "last_name": "Doe",
    "email": "jane@example.com"
}"#;

#[tokio::test]
async fn submit_then_resolve_roundtrips_the_address() {
    let fx = serve_fixture().await;

    let (status, receipt) = send_raw(fx.addr, "POST", "/api/leads", Some(BOSTON_FORM)).await;
    assert_eq!(status, 201);
    assert_eq!(
        receipt["address"].as_str(),
        Some("123 Main St, Boston, MA 02108")
    );
    assert_eq!(receipt["service_available"].as_bool(), Some(true));
    let id = receipt["lead_id"].as_str().expect("lead id").to_string();

    let (status, body) = send_raw(fx.addr, "GET", &format!("/api/analysis?id={id}"), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["state"].as_str(), Some("available"));
    assert_eq!(body["source"].as_str(), Some("server"));
    assert_eq!(
        body["record"]["address"].as_str(),
        Some("123 Main St, Boston, MA 02108")
    );
}

#[tokio::test]
async fn out_of_region_submission_resolves_as_unavailable() {
    let fx = serve_fixture().await;

    let (status, receipt) = send_raw(fx.addr, "POST", "/api/leads", Some(FRESNO_FORM)).await;
    assert_eq!(status, 201);
    assert_eq!(receipt["service_available"].as_bool(), Some(false));
    let id = receipt["lead_id"].as_str().expect("lead id").to_string();

    let (status, body) = send_raw(fx.addr, "GET", &format!("/api/analysis?id={id}"), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["state"].as_str(), Some("unavailable"));
    assert_eq!(body["record"]["service_available"].as_bool(), Some(false));
}

#[tokio::test]
async fn validation_failure_is_a_field_naming_bad_request() {
    let fx = serve_fixture().await;
    let bad = BOSTON_FORM.replace("jane@example.com", "not-an-email");

    let (status, body) = send_raw(fx.addr, "POST", "/api/leads", Some(&bad)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"].as_str(), Some("validation_error"));
    assert!(body["error"]["message"]
        .as_str()
        .expect("message")
        .contains("email"));
    assert_eq!(fx.store.insert_calls.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn missing_id_with_no_mirror_is_a_terminal_not_found() {
    let fx = serve_fixture().await;
    let (status, body) = send_raw(fx.addr, "GET", "/api/analysis", None).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"].as_str(), Some("no_submission_id"));
    assert!(!body["error"]["message"]
        .as_str()
        .expect("message")
        .is_empty());
}

#[tokio::test]
async fn malformed_id_falls_back_to_the_mirror_render() {
    let fx = serve_fixture().await;
    let (_, _) = send_raw(fx.addr, "POST", "/api/leads", Some(BOSTON_FORM)).await;
    fx.store.fail_fetch.store(true, Ordering::Relaxed);

    let (status, body) = send_raw(fx.addr, "GET", "/api/analysis?id=undefined", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["source"].as_str(), Some("mirror"));
    assert_eq!(body["record"]["lot_size"].as_str(), Some("Not available"));
}

#[tokio::test]
async fn skip_loading_serves_the_mirror_preview_without_touching_the_store() {
    let fx = serve_fixture().await;
    let (_, receipt) = send_raw(fx.addr, "POST", "/api/leads", Some(BOSTON_FORM)).await;
    let id = receipt["lead_id"].as_str().expect("lead id").to_string();
    let fetches_before = fx.store.fetch_calls.load(Ordering::Relaxed);

    let (status, body) = send_raw(
        fx.addr,
        "GET",
        &format!("/api/analysis?id={id}&skip_loading=true"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["source"].as_str(), Some("mirror"));
    assert_eq!(fx.store.fetch_calls.load(Ordering::Relaxed), fetches_before);
}

#[tokio::test]
async fn readiness_follows_store_connectivity() {
    let fx = serve_fixture().await;

    let (status, body) = send_raw(fx.addr, "GET", "/readyz", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"].as_str(), Some("ready"));

    fx.store.fail_connectivity.store(true, Ordering::Relaxed);
    let (status, body) = send_raw(fx.addr, "GET", "/readyz", None).await;
    assert_eq!(status, 503);
    assert_eq!(body["error"]["code"].as_str(), Some("connectivity_error"));

    let (status, _) = send_raw(fx.addr, "GET", "/healthz", None).await;
    assert_eq!(status, 200, "liveness ignores the store");
}
