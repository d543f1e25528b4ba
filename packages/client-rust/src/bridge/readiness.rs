//! Waiting for the out-of-band upload SDK.

use std::sync::Arc;

use parking_lot::RwLock;
use taskdesk_core::{SdkSource, UploadSdk};

use crate::config::BridgeConfig;
use crate::error::BridgeError;

/// Settable [`SdkSource`] for hosts that load the SDK after startup.
#[derive(Default)]
pub struct SdkSlot {
    sdk: RwLock<Option<Arc<dyn UploadSdk>>>,
}

impl SdkSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the loaded SDK.
    pub fn set(&self, sdk: Arc<dyn UploadSdk>) {
        *self.sdk.write() = Some(sdk);
    }

    /// Withdraws the SDK (e.g. on host teardown).
    pub fn clear(&self) {
        self.sdk.write().take();
    }
}

impl SdkSource for SdkSlot {
    fn current(&self) -> Option<Arc<dyn UploadSdk>> {
        self.sdk.read().clone()
    }
}

impl std::fmt::Debug for SdkSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkSlot")
            .field("loaded", &self.sdk.read().is_some())
            .finish()
    }
}

/// Resolves the SDK, checking `source` up to `max_attempts` times with
/// `poll_interval` between checks.
///
/// # Errors
///
/// Returns [`BridgeError::SdkNotLoaded`] when every check came back empty.
pub async fn wait_for_sdk(
    source: &dyn SdkSource,
    config: &BridgeConfig,
) -> Result<Arc<dyn UploadSdk>, BridgeError> {
    for attempt in 1..=config.max_attempts {
        if let Some(sdk) = source.current() {
            tracing::debug!(attempt, "upload SDK available");
            return Ok(sdk);
        }
        if attempt < config.max_attempts {
            tokio::time::sleep(config.poll_interval).await;
        }
    }

    tracing::error!(
        attempts = config.max_attempts,
        waited_ms = u64::try_from(config.readiness_timeout().as_millis()).unwrap_or(u64::MAX),
        "upload SDK not loaded"
    );
    Err(BridgeError::SdkNotLoaded {
        attempts: config.max_attempts,
    })
}
