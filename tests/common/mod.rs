#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use unillm::providers::ProviderRegistry;
use unillm::server::build_router;
use unillm::util::AppState;

/// Utility module for gateway integration tests.
///
/// Spawns the real router bound to an ephemeral local port and returns a
/// `TestServer` with convenience helpers. Upstream providers are supplied by
/// the caller as a registry, typically pointing at a [`serve`]d mock router,
/// so no test ever contacts a real provider.
pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    join: JoinHandle<()>,
    client: reqwest::Client,
}

impl TestServer {
    /// Spawn the gateway over an explicit provider registry.
    pub async fn spawn(registry: ProviderRegistry) -> Self {
        let state = Arc::new(AppState::with_providers(Arc::new(registry)));
        let (base_url, addr, join) = serve(build_router(state)).await;
        Self {
            base_url,
            addr,
            join,
            client: make_client(),
        }
    }

    /// Spawn the gateway over the builtin registry (routing-only tests).
    pub async fn spawn_default() -> Self {
        let state = Arc::new(AppState::default());
        let (base_url, addr, join) = serve(build_router(state)).await;
        Self {
            base_url,
            addr,
            join,
            client: make_client(),
        }
    }

    /// Perform a GET relative to the server base URL.
    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
    }

    /// Perform a POST with JSON body and optional bearer credential.
    pub async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
        auth_bearer: Option<&str>,
    ) -> reqwest::Result<reqwest::Response> {
        let mut rb = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header(http::header::CONTENT_TYPE, "application/json");
        if let Some(b) = auth_bearer {
            rb = rb.bearer_auth(b);
        }
        rb.json(body).send().await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.join.abort();
    }
}

fn make_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("failed building reqwest client")
}

/// Bind a router (gateway or mock upstream) to an ephemeral port.
pub async fn serve(app: Router) -> (String, SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let join = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), addr, join)
}

/// Descriptor base URLs are `&'static str`; leak the ephemeral mock URL.
pub fn leak(s: String) -> &'static str {
    Box::leak(s.into_boxed_str())
}
