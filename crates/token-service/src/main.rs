use std::net::SocketAddr;
use std::sync::Arc;
use token_service::config::Config;
use token_service::directory::InMemoryUserStore;
use token_service::handlers::AppState;
use token_service::policy::ClaimsPolicy;
use token_service::routes;
use token_service::services::TokenExchange;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Token Service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        algorithm = config.algorithm.as_str(),
        allow_refresh = config.allow_refresh,
        "Configuration loaded successfully"
    );

    // Load users
    let users_file = config.users_file.clone().ok_or_else(|| {
        error!("USERS_FILE is required");
        "Missing required environment variable: USERS_FILE"
    })?;

    let username_field = ClaimsPolicy::new(config.username_field.clone())
        .username_field()
        .to_string();

    let store = Arc::new(
        InMemoryUserStore::load_from_file(&users_file, &username_field).map_err(|e| {
            error!("Failed to load users: {}", e);
            e
        })?,
    );

    info!(users = store.len(), "User store loaded");

    let exchange = TokenExchange::from_config(&config, store.clone(), store).map_err(|e| {
        error!("Failed to build token codec: {}", e);
        e
    })?;

    // Initialize metrics recorder
    let metrics_handle = routes::init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics: {}", e);
        e
    })?;

    // Parse bind address
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let state = Arc::new(AppState { exchange });
    let app = routes::build_routes(state, metrics_handle);

    info!("Token Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
