//! Test server harness for E2E testing
//!
//! Provides TestTokenServer for spawning real token service instances in tests.

use crate::crypto_fixtures::test_hmac_secret_base64;
use crate::fixtures::test_user_store;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use token_service::config::Config;
use token_service::handlers::AppState;
use token_service::routes;
use token_service::services::TokenExchange;

/// Environment for [`test_config`]: HS256 with the fixture secret, refresh on.
pub fn test_config_vars() -> HashMap<String, String> {
    HashMap::from([
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ("TOKEN_SECRET_KEY".to_string(), test_hmac_secret_base64()),
        ("TOKEN_ALLOW_REFRESH".to_string(), "true".to_string()),
    ])
}

pub fn test_config() -> Config {
    Config::from_vars(&test_config_vars()).expect("fixture config")
}

/// Test harness for spawning the token service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_login_e2e() -> Result<()> {
///     let server = TestTokenServer::spawn(test_config()).await?;
///
///     let response = server
///         .post_json("/api/v1/auth/token", &json!({"username": "alice", "password": "secret"}))
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestTokenServer {
    addr: SocketAddr,
    config: Config,
    client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestTokenServer {
    /// Spawn a server over the fixture user store
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Key the user store by the configured username field
    /// - Start the HTTP server in the background
    pub async fn spawn(config: Config) -> Result<Self, anyhow::Error> {
        let exchange = {
            let store = test_user_store(
                config.username_field.as_deref().unwrap_or("username"),
            );
            TokenExchange::from_config(&config, store.clone(), store)
                .map_err(|e| anyhow::anyhow!("Failed to build exchange: {}", e))?
        };

        let state = Arc::new(AppState { exchange });

        // The global recorder can only be installed once per process; later
        // servers get a standalone recorder
        let metrics_handle = match routes::init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                let recorder = PrometheusBuilder::new().build_recorder();
                recorder.handle()
            }
        };

        let app = routes::build_routes(state, metrics_handle);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            client: reqwest::Client::new(),
            handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// POST `body` as JSON to `path`
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .post(format!("{}{}", self.url(), path))
            .json(body)
            .send()
            .await?)
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .get(format!("{}{}", self.url(), path))
            .send()
            .await?)
    }
}

impl Drop for TestTokenServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
