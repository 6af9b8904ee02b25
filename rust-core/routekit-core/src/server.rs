//! # HTTP Server
//!
//! Minimal HTTP host built on Hyper and Tokio.
//! Implements graceful shutdown with signal handling.
//!
//! ## Key Features
//!
//! - Async request handling with Tokio runtime
//! - Graceful shutdown on Ctrl-C with a bounded drain
//! - Connection keep-alive support
//! - Request bodies stay streaming until a route buffers them
//! - Request ids: generated when absent, echoed on every response

use crate::error::{Error, Result};
use crate::request::RawRequest;
use crate::response::Response;
use crate::router::Method;
use crate::routes::{Routes, DEFAULT_MAX_BODY_SIZE};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Request id header
pub const REQUEST_ID: &str = "x-request-id";

/// HTTP Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub address: SocketAddr,
    /// Enable keep-alive connections
    pub keep_alive: bool,
    /// Shutdown timeout for graceful shutdown (default: 30 seconds)
    pub shutdown_timeout: Duration,
    /// Max request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ([127, 0, 0, 1], 8000).into(),
            keep_alive: true,
            shutdown_timeout: Duration::from_secs(30),
            max_body_size: crate::routes::DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with `ROUTEKIT_ADDR`, `ROUTEKIT_MAX_BODY_SIZE` and
    /// `ROUTEKIT_SHUTDOWN_TIMEOUT_SECS`
    ///
    /// Malformed values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(address) = parse_var(&lookup, "ROUTEKIT_ADDR") {
            config.address = address;
        }
        if let Some(bytes) = parse_var(&lookup, "ROUTEKIT_MAX_BODY_SIZE") {
            config.max_body_size = bytes;
        }
        if let Some(secs) = parse_var(&lookup, "ROUTEKIT_SHUTDOWN_TIMEOUT_SECS") {
            config.shutdown_timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Set the bind address
    #[must_use]
    pub const fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = address;
        self
    }

    /// Enable or disable keep-alive
    #[must_use]
    pub const fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Set the graceful shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the max request body size
    #[must_use]
    pub const fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, value = %raw, error = %err, "Ignoring malformed configuration value");
            None
        }
    }
}

/// HTTP server hosting a route table
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    routes: Arc<Routes>,
}

impl Server {
    /// Create a server
    ///
    /// A table still at the default body size limit takes
    /// `config.max_body_size`; a limit set on the table itself is kept.
    #[must_use]
    pub fn new(mut routes: Routes, config: ServerConfig) -> Self {
        if routes.max_body_size() == DEFAULT_MAX_BODY_SIZE {
            routes.set_max_body_size(config.max_body_size);
        }
        Self {
            config,
            routes: Arc::new(routes),
        }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The hosted route table
    #[must_use]
    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// Start the server with graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns `Error::BindError` if the address cannot be bound, or
    /// `Error::Io` if accepting connections fails.
    pub async fn serve(&self) -> Result<()> {
        let addr = self.config.address;
        let listener = bind(addr)?;

        info!(address = %addr, "Server listening on http://{}", addr);

        self.run(listener, shutdown_signal()).await
    }

    async fn run(
        &self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        let active = Arc::new(AtomicUsize::new(0));
        let keep_alive = self.config.keep_alive;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, remote_addr) = accept_result?;
                    let io = TokioIo::new(stream);
                    let routes = Arc::clone(&self.routes);
                    let guard = ConnectionGuard::new(&active);

                    tokio::task::spawn(async move {
                        let _guard = guard;
                        let service = service_fn(move |req| {
                            let routes = Arc::clone(&routes);
                            async move { handle_request(req, &routes, remote_addr).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .keep_alive(keep_alive)
                            .serve_connection(io, service)
                            .await
                        {
                            error!(remote = %remote_addr, error = ?err, "Error serving connection");
                        }
                    });
                }
                () = &mut shutdown => {
                    info!("Shutdown signal received, stopping server...");
                    break;
                }
            }
        }

        let timeout = self.config.shutdown_timeout;
        let drain = async {
            while active.load(Ordering::Relaxed) > 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!(
                connections = active.load(Ordering::Relaxed),
                "Shutdown timeout elapsed with open connections"
            );
        }

        Ok(())
    }

    /// Execute a test request directly without network stack
    ///
    /// The body arrives already buffered, so the size limit does not apply.
    pub async fn test_request(
        &self,
        method: Method,
        uri: &str,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> Response {
        let mut req = RawRequest::new(method, uri, headers, body);
        req.head_mut().set_header("x-client-ip", "test");
        process_request(req, &self.routes).await
    }
}

/// Counts an open connection until dropped, including by a panicking handler
struct ConnectionGuard(Arc<AtomicUsize>);

impl ConnectionGuard {
    fn new(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::Relaxed);
        Self(Arc::clone(active))
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

fn bind(addr: SocketAddr) -> Result<TcpListener> {
    let bind_error = |source| Error::BindError {
        address: addr.to_string(),
        source,
    };

    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4()
    } else {
        tokio::net::TcpSocket::new_v6()
    }
    .map_err(bind_error)?;

    socket.set_reuseaddr(true).map_err(bind_error)?;
    socket.bind(addr).map_err(bind_error)?;
    socket.listen(1024).map_err(bind_error)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to install Ctrl-C handler; graceful shutdown disabled");
        std::future::pending::<()>().await;
    }
}

/// Core request processing logic (network agnostic)
async fn process_request(mut req: RawRequest, routes: &Routes) -> Response {
    let request_id = match req.head().header(REQUEST_ID) {
        Some(id) => id.to_string(),
        None => {
            let id = generate_request_id();
            req.head_mut().set_header(REQUEST_ID, &id);
            id
        }
    };

    let mut response = routes.dispatch(req).await;
    response.set_header(REQUEST_ID, &request_id);
    response
}

async fn handle_request(
    req: Request<Incoming>,
    routes: &Routes,
    remote_addr: SocketAddr,
) -> std::result::Result<hyper::Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let version = req.version();

    let response = match Method::from_hyper(&method) {
        Some(m) => {
            let mut raw = RawRequest::from_hyper(m, req);
            raw.head_mut()
                .set_header("x-client-ip", &remote_addr.ip().to_string());
            process_request(raw, routes).await
        }
        None => Response::text("Method Not Allowed").with_status(405),
    };

    info!(
        remote = %remote_addr,
        method = %method,
        path = %path,
        version = ?version,
        status = response.status,
        "Request served"
    );

    Ok(response.into_hyper())
}

static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(1);

fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("{:x}-{:x}", now.as_nanos(), counter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Contract, RouteContract};
    use crate::facade::TypedRequest;
    use crate::param::QueryParam;
    use crate::variant::ResponseVariant;
    use crate::ContractFields;
    use std::sync::atomic::AtomicBool;

    #[derive(ContractFields)]
    struct Hello {
        echo: QueryParam<i64>,
        fail_hard: QueryParam<String>,
        success: ResponseVariant<String>,
        bad_request: ResponseVariant<()>,
    }

    impl RouteContract for Hello {
        type RequestBody = ();
    }

    async fn hello(req: TypedRequest<Hello>) -> Result<Response> {
        let contract = req.contract();
        if req.query().get(&contract.fail_hard).is_some() {
            return req.respond(&contract.bad_request).empty().await;
        }
        let body = req
            .query()
            .get(&contract.echo)
            .map_or_else(|| "Hello".to_string(), |echo| echo.to_string());
        req.respond(&contract.success).encode(body).await
    }

    fn server(config: ServerConfig) -> Server {
        let contract = Contract::new(Hello {
            echo: QueryParam::new("echo"),
            fail_hard: QueryParam::new("failHard"),
            success: ResponseVariant::status(200),
            bad_request: ResponseVariant::canned(Response::empty(400)),
        });
        let mut routes = Routes::new();
        routes.get("/hello", contract, hello).unwrap();
        Server::new(routes, config)
    }

    async fn get(server: &Server, uri: &str) -> Response {
        server
            .test_request(Method::Get, uri, HashMap::new(), None)
            .await
    }

    #[tokio::test]
    async fn test_hello_echo() {
        let server = server(ServerConfig::default());
        let res = get(&server, "/hello?echo=10").await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body, "10");
    }

    #[tokio::test]
    async fn test_hello_malformed_echo_falls_back() {
        let server = server(ServerConfig::default());
        let res = get(&server, "/hello?echo=a21f").await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body, "Hello");
    }

    #[tokio::test]
    async fn test_hello_fail_hard() {
        let server = server(ServerConfig::default());
        let res = get(&server, "/hello?failHard=t").await;
        assert_eq!(res.status, 400);
        assert!(res.body.is_empty());

        let res = get(&server, "/hello?echo=3").await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn test_request_id_generated_and_echoed() {
        let server = server(ServerConfig::default());
        let res = get(&server, "/hello").await;
        assert!(res.header(REQUEST_ID).is_some());

        let headers = HashMap::from([(REQUEST_ID.to_string(), "abc-1".to_string())]);
        let res = server
            .test_request(Method::Get, "/hello", headers, None)
            .await;
        assert_eq!(res.header(REQUEST_ID), Some("abc-1"));
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = server(ServerConfig::default());
        let res = get(&server, "/missing").await;
        assert_eq!(res.status, 404);
        assert_eq!(res.content_type(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_buffered_body_bypasses_limit() {
        let server = server(ServerConfig::default().with_max_body_size(4));
        assert_eq!(server.routes().max_body_size(), 4);
        let res = server
            .test_request(
                Method::Get,
                "/hello",
                HashMap::new(),
                Some(Bytes::from("too large")),
            )
            .await;
        assert_eq!(res.status, 200);
    }

    #[test]
    fn test_table_limit_wins_over_config() {
        let routes = Routes::new().with_max_body_size(8);
        let server = Server::new(routes, ServerConfig::default().with_max_body_size(4));
        assert_eq!(server.routes().max_body_size(), 8);

        let server = Server::new(Routes::new(), ServerConfig::default().with_max_body_size(4));
        assert_eq!(server.routes().max_body_size(), 4);
    }

    #[derive(ContractFields)]
    struct Upload {
        ok: ResponseVariant<String>,
    }

    impl RouteContract for Upload {
        type RequestBody = ();
    }

    /// Serve `routes` on an ephemeral loopback port until the sender fires
    async fn spawn_server(
        routes: Routes,
        config: ServerConfig,
    ) -> (
        SocketAddr,
        tokio::sync::oneshot::Sender<()>,
        tokio::task::JoinHandle<Result<()>>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::new(routes, config);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            server
                .run(listener, async {
                    let _ = rx.await;
                })
                .await
        });
        (addr, tx, task)
    }

    /// Send a raw HTTP/1.1 request and return the response head
    async fn send_raw(addr: SocketAddr, request: &str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_streaming_body_over_limit_never_reaches_handler() {
        let ran = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&ran);
        let contract = Contract::new(Upload {
            ok: ResponseVariant::status(200),
        });
        let mut routes = Routes::new();
        routes
            .post("/upload", contract, move |req: TypedRequest<Upload>| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.store(true, Ordering::SeqCst);
                    let body = req.head().content_length().unwrap_or(0).to_string();
                    req.respond(&req.contract().ok).encode(body).await
                }
            })
            .unwrap();

        let config = ServerConfig::default()
            .with_max_body_size(4)
            .with_shutdown_timeout(Duration::from_secs(1));
        let (addr, shutdown, task) = spawn_server(routes, config).await;

        let declared = send_raw(
            addr,
            "POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Length: 20\r\n\
             Connection: close\r\n\r\n01234567890123456789",
        )
        .await;
        assert!(declared.starts_with("HTTP/1.1 413"), "{declared}");

        let chunked = send_raw(
            addr,
            "POST /upload HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\n\
             Connection: close\r\n\r\n14\r\n01234567890123456789\r\n0\r\n\r\n",
        )
        .await;
        assert!(chunked.starts_with("HTTP/1.1 413"), "{chunked}");
        assert!(!ran.load(Ordering::SeqCst));

        let within = send_raw(
            addr,
            "POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Length: 3\r\n\
             Connection: close\r\n\r\nabc",
        )
        .await;
        assert!(within.starts_with("HTTP/1.1 200"), "{within}");
        assert!(ran.load(Ordering::SeqCst));

        shutdown.send(()).unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_handler_does_not_stall_shutdown() {
        let contract = Contract::new(Upload {
            ok: ResponseVariant::status(200),
        });
        let mut routes = Routes::new();
        routes
            .get("/explode", contract, |_req: TypedRequest<Upload>| async move {
                if true {
                    panic!("handler exploded");
                }
                Response::empty(200)
            })
            .unwrap();

        let config = ServerConfig::default().with_shutdown_timeout(Duration::from_secs(30));
        let (addr, shutdown, task) = spawn_server(routes, config).await;

        let head = send_raw(addr, "GET /explode HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert!(head.is_empty(), "{head}");

        shutdown.send(()).unwrap();
        let served = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("shutdown waited on a dead connection");
        served.unwrap().unwrap();
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.address.port(), 8000);
        assert!(config.keep_alive);
        assert_eq!(config.max_body_size, 1024 * 1024);
    }

    #[test]
    fn test_config_from_lookup() {
        let vars = HashMap::from([
            ("ROUTEKIT_ADDR", "0.0.0.0:9090"),
            ("ROUTEKIT_MAX_BODY_SIZE", "lots"),
            ("ROUTEKIT_SHUTDOWN_TIMEOUT_SECS", "5"),
        ]);
        let config = ServerConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string()));
        assert_eq!(config.address.port(), 9090);
        assert_eq!(config.max_body_size, 1024 * 1024);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(generate_request_id(), generate_request_id());
    }
}
