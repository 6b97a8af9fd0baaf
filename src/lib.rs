//! Storefront API Library
//!
//! Catalog and order management data backend: entities, schema integrity
//! rules, and the typed CRUD services that enforce them.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use services::{carts::CartService, catalog::CatalogService, customers::CustomerService, orders::OrderService};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        Self {
            db,
            config,
            event_sender,
        }
    }

    pub fn catalog_service(&self) -> CatalogService {
        CatalogService::new(self.db.clone(), Arc::new(self.event_sender.clone()))
    }

    pub fn customer_service(&self) -> CustomerService {
        CustomerService::new(self.db.clone(), Arc::new(self.event_sender.clone()))
    }

    pub fn order_service(&self) -> OrderService {
        OrderService::new(self.db.clone(), Arc::new(self.event_sender.clone()))
    }

    pub fn cart_service(&self) -> CartService {
        CartService::new(self.db.clone(), Arc::new(self.event_sender.clone()))
    }
}
