//! Application state for the API server

use zoo_core::AdminService;

/// API server state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Domain service
    pub service: AdminService,
    /// API version
    pub version: String,
}

impl AppState {
    /// Create state around a service
    #[must_use]
    pub fn new(service: AdminService) -> Self {
        Self {
            service,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
