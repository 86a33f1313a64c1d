#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code to prevent panics from bad input.
// Test code is allowed to use unwrap() for convenience.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;
use std::sync::Arc;

use storefront::accounts::AccountService;
use storefront::auth::TokenService;
use storefront::config::ServerConfig;
use storefront::models::{Person, Product};
use storefront::notify::{HttpNotifier, Notifier};
use storefront::repository::{InMemoryRepository, Repository};
use storefront::routes::{self, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: listen_port={}, token_ttl_secs={}, notifier_url={}",
        config.listen_port,
        config.token_settings.default_ttl.as_secs(),
        config.notifier_url
    );

    let tokens = Arc::new(TokenService::new(&config.signing_key, config.token_settings));

    let registry = match routes::default_registry(Arc::clone(&tokens)) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            tracing::error!("Invalid guard configuration: {e}");
            std::process::exit(1);
        }
    };

    let notifier: Arc<dyn Notifier> = match HttpNotifier::new(&config.notifier_url) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            tracing::error!("Failed to build notifier client: {e}");
            std::process::exit(1);
        }
    };

    let persons: Arc<dyn Repository<Person>> = Arc::new(InMemoryRepository::new());
    let products: Arc<dyn Repository<Product>> = Arc::new(InMemoryRepository::new());
    let accounts = Arc::new(AccountService::new(Arc::clone(&persons), tokens, notifier));

    let app = routes::router(
        AppState {
            persons,
            products,
            accounts,
        },
        &registry,
    );

    let addr = SocketAddr::from(([127, 0, 0, 1], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
