//! Test server harness for E2E testing.
//!
//! Provides `TestDrinksServer`, which runs the real router on a random port
//! against an in-memory repository and a mock token issuer.

use crate::mock_issuer::{MockIssuer, TEST_AUDIENCE};
use crate::token_builders::TestTokenBuilder;
use drinks_service::config::Config;
use drinks_service::repositories::mock::InMemoryDrinkRepository;
use drinks_service::routes::{self, init_metrics_recorder, AppState};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Process-wide metrics handle. The global recorder can only be installed
/// once, so later servers share it.
fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// A running drinks server.
pub struct TestDrinksServer {
    addr: SocketAddr,
    issuer: MockIssuer,
    repository: Arc<InMemoryDrinkRepository>,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestDrinksServer {
    /// Spawn a server with an empty store and a fresh mock issuer.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(MockIssuer::start().await, InMemoryDrinkRepository::new()).await
    }

    /// Spawn a server with the given issuer and store.
    pub async fn spawn_with(
        issuer: MockIssuer,
        repository: InMemoryDrinkRepository,
    ) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://test/test".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("AUTH_ISSUER".to_string(), issuer.issuer()),
            ("AUTH_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
            ("AUTH_JWKS_URL".to_string(), issuer.jwks_url()),
            // Short TTL so tests can rotate keys.
            ("JWKS_CACHE_TTL_SECONDS".to_string(), "1".to_string()),
            ("JWT_CLOCK_SKEW_SECONDS".to_string(), "60".to_string()),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let repository = Arc::new(repository);
        let state = Arc::new(AppState {
            repository: repository.clone(),
            config: config.clone(),
        });

        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            issuer,
            repository,
            config,
            _handle: handle,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn issuer(&self) -> &MockIssuer {
        &self.issuer
    }

    /// The store behind the server, for seeding and inspection.
    pub fn repository(&self) -> &InMemoryDrinkRepository {
        &self.repository
    }

    /// Token builder for the server's issuer and audience.
    pub fn token(&self) -> TestTokenBuilder {
        self.issuer.token()
    }
}

impl Drop for TestDrinksServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
