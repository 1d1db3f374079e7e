// src/http.rs
// Shared HTTP client for all network operations

use std::time::Duration;

/// Default request timeout for reasoning and data calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default connect timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Create the shared HTTP client with appropriate defaults.
///
/// Created once at startup and handed to every source and reasoner.
/// Uses connection pooling internally.
pub fn create_shared_client() -> reqwest::Client {
    create_client(DEFAULT_TIMEOUT)
}

/// Create a client with a custom request timeout
pub fn create_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .pool_max_idle_per_host(10)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
