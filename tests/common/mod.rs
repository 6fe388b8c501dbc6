//! Shared utilities for integration testing: mock backend, mock identity
//! provider, and a gateway running on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use dashboard_gateway::config::{CredentialMode, GatewayConfig};
use dashboard_gateway::{HttpServer, Shutdown};
use hyper::ext::ReasonPhrase;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

pub const VALID_SESSION: &str = "sess_valid";
pub const ISSUED_TOKEN: &str = "jwt-for-valid";

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Records every request the mock backend receives.
#[derive(Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<Captured>>>,
}

impl Recorder {
    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> Captured {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("backend received no request")
    }
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Start a mock backend API service.
///
/// - `/api/repositories/sync` → `200 {"synced":3}`
/// - `/auth/login` → `302` to the identity provider with two cookies
/// - `/cookies` → `200` with three `Set-Cookie` headers and an internal header
/// - `/echo` → echoes the request body and content type
/// - `/teapot` → `418`
/// - `/reason` → `200 All Good Here`
/// - anything else → `200 {"ok":true}` with cache headers
pub async fn start_mock_backend() -> (SocketAddr, Recorder) {
    let recorder = Recorder::default();
    let router = Router::new()
        .fallback(backend_handler)
        .with_state(recorder.clone());
    (serve(router).await, recorder)
}

async fn backend_handler(State(recorder): State<Recorder>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    recorder.requests.lock().unwrap().push(Captured {
        method: parts.method.clone(),
        uri: parts.uri.clone(),
        headers: parts.headers.clone(),
        body: body.clone(),
    });

    match parts.uri.path() {
        "/api/repositories/sync" => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "{\"synced\":3}",
        )
            .into_response(),
        "/auth/login" => Response::builder()
            .status(StatusCode::FOUND)
            .header(header::LOCATION, "https://idp.example/authorize?state=xyz")
            .header(header::SET_COOKIE, "oauth_state=xyz; Path=/; HttpOnly")
            .header(header::SET_COOKIE, "oauth_nonce=n0nce; Path=/; HttpOnly")
            .body(Body::empty())
            .unwrap(),
        "/cookies" => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::SET_COOKIE, "session=abc; Path=/; HttpOnly")
            .header(header::SET_COOKIE, "csrf=def; Path=/")
            .header(header::SET_COOKIE, "theme=dark; Max-Age=3600")
            .header("x-internal-node", "db-3")
            .body(Body::from("{}"))
            .unwrap(),
        "/echo" => {
            let content_type = parts
                .headers
                .get(header::CONTENT_TYPE)
                .cloned()
                .unwrap_or_else(|| header::HeaderValue::from_static("application/octet-stream"));
            let mut response = Response::new(Body::from(body));
            response.headers_mut().insert(header::CONTENT_TYPE, content_type);
            response
        }
        "/teapot" => (StatusCode::IM_A_TEAPOT, "short and stout").into_response(),
        "/reason" => {
            let mut response = Response::new(Body::from("{}"));
            response
                .extensions_mut()
                .insert(ReasonPhrase::from_static(b"All Good Here"));
            response
        }
        _ => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CACHE_CONTROL, "no-store")
            .header(header::ETAG, "\"abc123\"")
            .header("x-backend-node", "api-1")
            .body(Body::from("{\"ok\":true}"))
            .unwrap(),
    }
}

/// Start a mock identity provider. Returns its token URL and a call counter.
///
/// Issues `ISSUED_TOKEN` for `Authorization: Bearer VALID_SESSION`, 401 otherwise.
pub async fn start_identity_provider() -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/v1/token", get(token_handler))
        .with_state(calls.clone());
    let addr = serve(router).await;
    (format!("http://{}/v1/token", addr), calls)
}

async fn token_handler(State(calls): State<Arc<AtomicUsize>>, headers: HeaderMap) -> Response {
    calls.fetch_add(1, Ordering::SeqCst);
    let expected = format!("Bearer {}", VALID_SESSION);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            format!("{{\"token\":\"{}\"}}", ISSUED_TOKEN),
        )
            .into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

pub fn cookie_config(backend: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backend.base_url = format!("http://{}", backend);
    config
}

pub fn bearer_config(backend: SocketAddr, token_url: &str) -> GatewayConfig {
    let mut config = cookie_config(backend);
    config.credentials.mode = CredentialMode::Bearer;
    config.credentials.identity_provider.token_url = Some(token_url.to_string());
    config
}

/// A gateway running in the background.
pub struct RunningGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<GatewayConfig>,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_gateway(config: GatewayConfig) -> RunningGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    RunningGateway {
        addr,
        shutdown,
        updates,
    }
}

/// A client that never follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Send one HTTP/1.1 request with the request target written exactly as
/// given and return the full raw response.
pub async fn raw_get(addr: SocketAddr, target: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        target, addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}
