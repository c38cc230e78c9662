//! Server module for ServerGuard
//!
//! Contains the main server initialization and runtime logic.
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `loader`: Configuration loading from files and environment
//! - `validation`: Production configuration validation
//! - `init`: Component wiring, router and run loop

pub mod config;
mod init;
mod loader;
mod validation;

// Re-export public API
pub use config::AppConfig;
pub use init::{build_router, run, Services};
pub use loader::{embedded_defaults, load_config};
pub use validation::production_warnings;
