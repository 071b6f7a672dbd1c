//! Zoo API - HTTP surface of the zoo admin backend
//!
//! - axum router over the domain service (`/v1/entities`, `/v1/cascade`,
//!   `/v1/sandbox`, `/health`)
//! - [`AppConfig`] resolved from the environment
//! - Structured logging setup shared by the `zoo-admin` binary

#![warn(unreachable_pub)]

pub mod actor;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod server;
pub mod state;

pub use actor::ActingUser;
pub use config::{AppConfig, BackendKind, ConfigError, LogFormat};
pub use error::{ApiError, ApiResult};
pub use logging::init_logging;
pub use routes::create_router;
pub use server::{build_app, build_service, connect_backend, create_server, run_server};
pub use state::AppState;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
