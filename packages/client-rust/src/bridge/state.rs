//! Bridge lifecycle state, published through a lock-free handle.

use std::sync::Arc;

use arc_swap::ArcSwap;

/// Lifecycle of a [`FileUploadBridge`](super::FileUploadBridge).
///
/// State machine: Uninitialized -> Ready | Error; deactivation returns to
/// Uninitialized from either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeState {
    /// Not mounted, or waiting for the SDK.
    Uninitialized,
    /// Widget mounted; snapshot changes are synced.
    Ready,
    /// Activation or a sync failed. Carries the user-facing message.
    Error(String),
}

impl BridgeState {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            Self::Uninitialized | Self::Ready => None,
        }
    }
}

/// Shared view of a bridge's state, readable from any task.
#[derive(Debug, Clone)]
pub struct StateHandle {
    inner: Arc<ArcSwap<BridgeState>>,
}

impl StateHandle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(BridgeState::Uninitialized)),
        }
    }

    /// Current state.
    #[must_use]
    pub fn get(&self) -> BridgeState {
        BridgeState::clone(&self.inner.load())
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.load().is_ready()
    }

    pub(crate) fn set(&self, state: BridgeState) {
        self.inner.store(Arc::new(state));
    }
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}
