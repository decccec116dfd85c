// Keyward — HTTP Server
//
// Binds the router to a TCP listener and owns the shutdown sequence. Shutdown is
// requested either by the admin through `/shutdown` or by Ctrl-C; the server then
// stops accepting connections, lets in-flight requests drain for the grace period
// and aborts whatever is still running after that.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{any, get, put};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::limit::RequestBodyLimitLayer;

use crate::error::{KeywardError, Result};
use crate::store::KvStore;

use super::handlers;
use super::login::Authenticator;

/// Request bodies larger than this are refused with 413.
pub const MAX_BODY_SIZE: usize = 64 * 1024;

// ─── Shared State ────────────────────────────────────────────────────────────

/// One-shot, multi-observer shutdown flag.
#[derive(Debug, Clone)]
pub struct ShutdownHandle(Arc<watch::Sender<bool>>);

impl ShutdownHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self(Arc::new(tx))
    }

    pub fn trigger(&self) {
        self.0.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once `trigger()` has been called (immediately if it already was).
    pub async fn triggered(&self) {
        let mut rx = self.0.subscribe();
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: KvStore,
    pub auth: Arc<Authenticator>,
    pub admin_user: String,
    pub shutdown: ShutdownHandle,
}

// ─── Router ──────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/login", get(handlers::login).post(handlers::login))
        .route("/store", any(handlers::missing_key))
        .route("/store/", any(handlers::missing_key))
        .route(
            "/store/{key}",
            put(handlers::put_key)
                .get(handlers::get_key)
                .delete(handlers::delete_key),
        )
        .route("/list", get(handlers::list_all))
        .route("/list/", get(handlers::missing_key))
        .route("/list/{key}", get(handlers::list_key))
        .route(
            "/shutdown",
            get(handlers::shutdown).post(handlers::shutdown),
        )
        .layer(middleware::from_fn(access_log))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .with_state(state)
}

/// One line per request. Never logs headers or bodies.
async fn access_log(request: Request, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    tracing::info!(
        target: "keyward::access",
        %remote,
        %method,
        %uri,
        status = response.status().as_u16(),
        "request"
    );
    response
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

/// The HTTP front end over a running store.
#[derive(Debug)]
pub struct Gateway {
    state: AppState,
    grace: Duration,
}

impl Gateway {
    pub fn new(
        store: KvStore,
        auth: Arc<Authenticator>,
        admin_user: impl Into<String>,
        grace: Duration,
    ) -> Self {
        Self {
            state: AppState {
                store,
                auth,
                admin_user: admin_user.into(),
                shutdown: ShutdownHandle::new(),
            },
            grace,
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// A handle that stops `run()` when triggered.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.state.shutdown.clone()
    }

    /// Serve on `listener` until shutdown is requested, then drain.
    pub async fn run(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "Keyward gateway listening");

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();
        let drain = self.state.shutdown.clone();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move { drain.triggered().await });
        let mut server = tokio::spawn(async move { serve.await });

        tokio::select! {
            result = &mut server => return flatten(result),
            _ = self.state.shutdown.triggered() => {
                tracing::info!("Shutdown requested; draining connections");
            }
            _ = interrupt() => {
                tracing::info!("Interrupt received; draining connections");
                self.state.shutdown.trigger();
            }
        }

        match tokio::time::timeout(self.grace, &mut server).await {
            Ok(result) => {
                tracing::info!("Gateway stopped");
                flatten(result)
            }
            Err(_) => {
                tracing::warn!(
                    grace_secs = self.grace.as_secs(),
                    "Grace period elapsed; aborting in-flight requests"
                );
                server.abort();
                Ok(())
            }
        }
    }
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl-C; only admin shutdown will stop the server");
        std::future::pending::<()>().await;
    }
}

fn flatten(
    result: std::result::Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    match result {
        Ok(served) => Ok(served?),
        Err(e) => Err(KeywardError::Other(format!("server task failed: {}", e))),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::AUTHORIZATION;
    use axum::http::{Method, StatusCode};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use http_body_util::BodyExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tower::ServiceExt;

    use crate::gateway::login::tests::test_authenticator;
    use crate::store::EntryInfo;

    pub(crate) fn test_state() -> AppState {
        AppState {
            store: KvStore::spawn(),
            auth: Arc::new(test_authenticator()),
            admin_user: "admin".to_string(),
            shutdown: ShutdownHandle::new(),
        }
    }

    fn bearer(state: &AppState, user: &str) -> String {
        format!("Bearer {}", state.auth.tokens().issue_token(user).unwrap())
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: impl Into<Body>,
    ) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        let response = app
            .clone()
            .oneshot(builder.body(body.into()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_ping() {
        let app = router(test_state());
        let (status, body) = send(&app, Method::GET, "/ping", None, "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "pong");
    }

    #[tokio::test]
    async fn test_login_then_use_token() {
        let app = router(test_state());
        let basic = format!("Basic {}", STANDARD.encode("user_a:passwordA"));

        let (status, body) = send(&app, Method::POST, "/login", Some(&basic), "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("Bearer "), "unexpected body: {}", body);

        let (status, _) = send(&app, Method::PUT, "/store/abc", Some(&body), "123").await;
        assert_eq!(status, StatusCode::OK);

        let (status, value) = send(&app, Method::GET, "/store/abc", Some(&body), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, "123");
    }

    #[tokio::test]
    async fn test_login_failures_are_unauthorized() {
        let app = router(test_state());
        let wrong = format!("Basic {}", STANDARD.encode("user_a:wrongpassword"));
        let unknown = format!("Basic {}", STANDARD.encode("nobody:passwordA"));

        for auth in [Some(wrong.as_str()), Some(unknown.as_str()), None] {
            let (status, _) = send(&app, Method::GET, "/login", auth, "").await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_store_routes_require_bearer() {
        let app = router(test_state());
        for auth in [None, Some("Bearer not.a.token"), Some("Basic dXNlcjpwdw==")] {
            let (status, _) = send(&app, Method::GET, "/store/abc", auth, "").await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            let (status, _) = send(&app, Method::PUT, "/store/abc", auth, "v").await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            let (status, _) = send(&app, Method::GET, "/list", auth, "").await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_crud_status_codes() {
        let state = test_state();
        let app = router(state.clone());
        let user_a = bearer(&state, "user_a");
        let user_b = bearer(&state, "user_b");

        let (status, body) = send(&app, Method::GET, "/store/abc", Some(&user_a), "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "404 key not found");

        let (status, body) = send(&app, Method::PUT, "/store/abc", Some(&user_a), "123").await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "OK"));

        // Another user may read but not overwrite or delete.
        let (status, value) = send(&app, Method::GET, "/store/abc", Some(&user_b), "").await;
        assert_eq!((status, value.as_str()), (StatusCode::OK, "123"));
        let (status, _) = send(&app, Method::PUT, "/store/abc", Some(&user_b), "456").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, Method::DELETE, "/store/abc", Some(&user_b), "").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, Method::PUT, "/store/abc", Some(&user_a), "456").await;
        assert_eq!(status, StatusCode::OK);
        let (_, value) = send(&app, Method::GET, "/store/abc", Some(&user_a), "").await;
        assert_eq!(value, "456");

        let (status, _) = send(&app, Method::DELETE, "/store/abc", Some(&user_a), "").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::DELETE, "/store/abc", Some(&user_a), "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_key_is_bad_request() {
        let state = test_state();
        let app = router(state.clone());
        let user_a = bearer(&state, "user_a");

        let (status, _) = send(&app, Method::PUT, "/store/", Some(&user_a), "v").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::GET, "/store", Some(&user_a), "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::GET, "/list/", Some(&user_a), "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Authentication is still checked first.
        let (status, _) = send(&app, Method::GET, "/store/", None, "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_nested_key_path_is_not_routed() {
        let state = test_state();
        let app = router(state.clone());
        let user_a = bearer(&state, "user_a");

        let (status, _) = send(&app, Method::PUT, "/store/a/b", Some(&user_a), "v").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(state.store.read("b").await.unwrap(), None);
        assert_eq!(state.store.read("a/b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_json_shape() {
        let state = test_state();
        let app = router(state.clone());
        let user_a = bearer(&state, "user_a");
        let user_b = bearer(&state, "user_b");

        send(&app, Method::PUT, "/store/abc", Some(&user_a), "secret-a").await;
        send(&app, Method::PUT, "/store/xyz", Some(&user_b), "secret-b").await;

        let (status, body) = send(&app, Method::GET, "/list/abc", Some(&user_b), "").await;
        assert_eq!(status, StatusCode::OK);
        let info: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(info, serde_json::json!({"key": "abc", "owner": "user_a"}));

        let (status, _) = send(&app, Method::GET, "/list/nope", Some(&user_b), "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, Method::GET, "/list", Some(&user_a), "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("secret-"));
        let mut all: Vec<EntryInfo> = serde_json::from_str(&body).unwrap();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        assert_eq!(
            all,
            vec![
                EntryInfo::new("abc", "user_a"),
                EntryInfo::new("xyz", "user_b"),
            ]
        );
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let state = test_state();
        let app = router(state.clone());
        let user_a = bearer(&state, "user_a");

        let big = "x".repeat(MAX_BODY_SIZE + 1);
        let (status, _) = send(&app, Method::PUT, "/store/big", Some(&user_a), big).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(state.store.read("big").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_closed_store_is_unavailable() {
        let state = test_state();
        let app = router(state.clone());
        let user_a = bearer(&state, "user_a");

        state.store.close().await.unwrap();
        let (status, _) = send(&app, Method::GET, "/store/abc", Some(&user_a), "").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_shutdown_is_admin_only() {
        let state = test_state();
        let app = router(state.clone());

        let user_a = bearer(&state, "user_a");
        let (status, _) = send(&app, Method::POST, "/shutdown", Some(&user_a), "").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!state.shutdown.is_triggered());

        let admin = bearer(&state, "admin");
        let (status, body) = send(&app, Method::GET, "/shutdown", Some(&admin), "").await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "OK"));
        assert!(state.shutdown.is_triggered());
    }

    async fn raw_request(addr: SocketAddr, request: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_run_serves_until_admin_shutdown() {
        let gateway = Gateway::new(
            KvStore::spawn(),
            Arc::new(test_authenticator()),
            "admin",
            Duration::from_secs(2),
        );
        let admin = format!(
            "Bearer {}",
            gateway.state.auth.tokens().issue_token("admin").unwrap()
        );
        let handle = gateway.shutdown_handle();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let running = tokio::spawn(gateway.run(listener));

        let response = raw_request(
            addr,
            "GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
        assert!(response.ends_with("pong"));

        let request = format!(
            "POST /shutdown HTTP/1.1\r\nHost: localhost\r\nAuthorization: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            admin
        );
        let response = raw_request(addr, &request).await;
        assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
        assert!(handle.is_triggered());

        let finished = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .expect("gateway did not stop")
            .unwrap();
        assert!(finished.is_ok());
    }

    #[tokio::test]
    async fn test_run_stops_on_handle_trigger() {
        let gateway = Gateway::new(
            KvStore::spawn(),
            Arc::new(test_authenticator()),
            "admin",
            Duration::from_millis(500),
        );
        let handle = gateway.shutdown_handle();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let running = tokio::spawn(gateway.run(listener));

        handle.trigger();
        let finished = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .expect("gateway did not stop")
            .unwrap();
        assert!(finished.is_ok());
    }
}
