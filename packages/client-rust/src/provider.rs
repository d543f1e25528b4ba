//! Write-once holder for the configured remote client.
//!
//! The provider is created empty at startup, initialized exactly once, and
//! shared read-only (`Arc<ClientProvider>`) by every service afterwards.

use std::sync::{Arc, OnceLock};

use taskdesk_core::RemoteClient;

use crate::config::ClientConfig;
use crate::error::{ProviderError, ServiceError};
use crate::transport::HttpRecordClient;

/// Supplies the remote client to record services.
#[derive(Default)]
pub struct ClientProvider {
    client: OnceLock<Arc<dyn RemoteClient>>,
}

impl ClientProvider {
    /// Creates an uninitialized provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider that is already initialized with `client`.
    #[must_use]
    pub fn with_client(client: Arc<dyn RemoteClient>) -> Self {
        let provider = Self::new();
        let _ = provider.client.set(client);
        provider
    }

    /// Creates a provider backed by an [`HttpRecordClient`].
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Config`] if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ProviderError> {
        let client = HttpRecordClient::new(config)?;
        Ok(Self::with_client(Arc::new(client)))
    }

    /// Installs the client. Only the first call succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::AlreadyInitialized`] on any later call.
    pub fn initialize(&self, client: Arc<dyn RemoteClient>) -> Result<(), ProviderError> {
        self.client
            .set(client)
            .map_err(|_| ProviderError::AlreadyInitialized)
    }

    /// Returns `true` once a client has been installed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.client.get().is_some()
    }

    /// Returns the client.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotInitialized`] before [`initialize`](Self::initialize).
    pub fn client(&self) -> Result<Arc<dyn RemoteClient>, ServiceError> {
        self.client
            .get()
            .map(Arc::clone)
            .ok_or(ServiceError::NotInitialized)
    }
}

impl std::fmt::Debug for ClientProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientProvider")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
