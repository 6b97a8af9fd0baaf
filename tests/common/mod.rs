use std::sync::Arc;
use std::time::Duration;

use storefront_api::{
    config::AppConfig,
    db::{self, DbConfig},
    events,
    services::{CartService, CatalogService, CustomerService, OrderService},
    AppState,
};

/// Helper harness backing the services with an in-memory SQLite database.
pub struct TestApp {
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());

        // A single pooled connection keeps the in-memory database alive
        // for the whole test.
        let db_cfg = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            idle_timeout: Duration::from_secs(600),
            ..Default::default()
        };

        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, mut event_rx) = events::channel(100);

        // Drain events so publishing never blocks the services under test.
        let event_task = tokio::spawn(async move { while event_rx.recv().await.is_some() {} });

        let state = AppState::new(Arc::new(pool), cfg, event_sender);

        Self {
            state,
            _event_task: event_task,
        }
    }

    pub fn catalog(&self) -> CatalogService {
        self.state.catalog_service()
    }

    pub fn customers(&self) -> CustomerService {
        self.state.customer_service()
    }

    pub fn orders(&self) -> OrderService {
        self.state.order_service()
    }

    pub fn carts(&self) -> CartService {
        self.state.cart_service()
    }
}
