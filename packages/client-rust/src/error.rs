//! Error types for the record services and the upload bridge.
//!
//! Public service operations never surface these to callers: they are logged
//! and folded into sentinel return values. They exist so that the failure
//! paths carry typed context up to the point where that happens, and so that
//! [`Lookup`](crate::service::Lookup) can expose the cause.

/// Failure of a single record-service call.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("record client not initialized")]
    NotInitialized,
    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
    #[error("remote rejected request: {message}")]
    Remote { message: String },
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Errors from initializing the [`ClientProvider`](crate::provider::ClientProvider).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("record client already initialized")]
    AlreadyInitialized,
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Failures that move a [`FileUploadBridge`](crate::bridge::FileUploadBridge)
/// into its error state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error(
        "upload SDK not loaded after {attempts} attempts. \
         Ensure the SDK is loaded before mounting the file field."
    )]
    SdkNotLoaded { attempts: u32 },
    #[error("file uploader not available in upload SDK")]
    UploaderUnavailable,
    #[error("failed to mount file uploader: {0}")]
    Mount(String),
    #[error("failed to update files: {0}")]
    Update(String),
    #[error("bridge worker stopped")]
    WorkerStopped,
}
