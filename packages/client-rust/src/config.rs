//! Configuration for the remote record client and the upload bridge.

use std::time::Duration;

/// Connection settings for the remote record service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the record API, without a trailing slash.
    pub base_url: String,
    /// Project the tables belong to.
    pub project_id: String,
    /// Public (browser-safe) API key.
    pub public_key: String,
    /// Per-request timeout for HTTP calls.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            project_id: String::new(),
            public_key: String::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Upload-bridge timing and queueing.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Delay between SDK availability checks.
    pub poll_interval: Duration,
    /// Number of availability checks before giving up.
    pub max_attempts: u32,
    /// Capacity of the per-bridge operation queue.
    pub queue_capacity: usize,
}

impl BridgeConfig {
    /// Upper bound on how long activation waits for the SDK.
    #[must_use]
    pub fn readiness_timeout(&self) -> Duration {
        self.poll_interval * self.max_attempts
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            max_attempts: 50,
            queue_capacity: 64,
        }
    }
}
