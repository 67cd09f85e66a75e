pub mod app;
pub mod clients;
pub mod config;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod services;

pub use config::{Config, ConfigError, ServiceKind};
pub use observability::{init_observability, shutdown_observability, Metrics};
