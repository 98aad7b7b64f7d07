use reqwest::Client;
use std::time::Duration;

/// Overall reqwest ceiling. The per-attempt deadline enforced by
/// [`super::reliable::ReliableClient`] is always shorter.
const CLIENT_CEILING_SECS: u64 = 120;

pub fn build_service_client() -> Client {
    build_service_client_with_connect_timeout(Duration::from_secs(10))
}

pub fn build_service_client_with_connect_timeout(connect_timeout: Duration) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(CLIENT_CEILING_SECS))
        .connect_timeout(connect_timeout)
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!("mailcraft/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}
