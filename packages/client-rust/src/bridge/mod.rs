//! File Upload Bridge.
//!
//! Drives a hosted upload widget through mount, sync and unmount while
//! keeping it in step with a caller-owned list of existing files.
//!
//! [`FileUploadBridge`] holds the lifecycle logic and is driven through
//! `&mut self`. [`BridgeHandle`] runs one bridge on a dedicated worker task
//! so that operations submitted from anywhere apply in submission order.

pub mod readiness;
pub mod snapshot;
pub mod state;
pub mod worker;

use std::sync::Arc;

use taskdesk_core::files::{detect_format, SnapshotFormat};
use taskdesk_core::{FieldConfig, FileEntry, MountConfig, SdkSource, UploadWidget};

use crate::config::BridgeConfig;
use crate::error::BridgeError;

pub use readiness::{wait_for_sdk, SdkSlot};
pub use state::{BridgeState, StateHandle};
pub use worker::{BridgeHandle, BridgeTask};

/// Anchor and field identity the bridge was last activated for.
#[derive(Debug, Clone)]
struct Binding {
    anchor_id: String,
    field: FieldConfig,
}

impl Binding {
    fn matches(&self, anchor_id: &str, field: &FieldConfig) -> bool {
        self.anchor_id == anchor_id && !self.field.identity_differs(field)
    }
}

/// Lifecycle controller for one upload widget instance.
pub struct FileUploadBridge {
    sdk: Arc<dyn SdkSource>,
    config: BridgeConfig,
    state: StateHandle,
    binding: Option<Binding>,
    widget: Option<Arc<dyn UploadWidget>>,
    last_synced: Vec<FileEntry>,
}

impl FileUploadBridge {
    #[must_use]
    pub fn new(sdk: Arc<dyn SdkSource>, config: BridgeConfig) -> Self {
        Self {
            sdk,
            config,
            state: StateHandle::new(),
            binding: None,
            widget: None,
            last_synced: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> BridgeState {
        self.state.get()
    }

    /// Shared handle observing this bridge's state.
    #[must_use]
    pub fn state_handle(&self) -> StateHandle {
        self.state.clone()
    }

    /// Snapshot most recently handed to the widget.
    #[must_use]
    pub fn last_synced(&self) -> &[FileEntry] {
        &self.last_synced
    }

    /// Reconciles the bridge with the caller's current inputs.
    ///
    /// Remounts when the anchor or the field identity (`field_key`,
    /// `field_name`, `table_name`) changed since the last activation;
    /// otherwise adopts the new options and syncs `files`.
    ///
    /// # Errors
    ///
    /// Returns the activation or sync failure; the bridge state then holds
    /// the same message.
    pub async fn render(
        &mut self,
        anchor_id: &str,
        field: FieldConfig,
        files: &[FileEntry],
    ) -> Result<(), BridgeError> {
        let bound = self
            .binding
            .as_ref()
            .is_some_and(|binding| binding.matches(anchor_id, &field));
        if !bound {
            return self.activate(anchor_id, field, files).await;
        }

        if let Some(binding) = &mut self.binding {
            binding.field = field;
        }
        self.sync(files).await.map(|_| ())
    }

    /// Waits for the SDK and mounts the widget at `anchor_id`.
    ///
    /// An existing mount is torn down first.
    ///
    /// # Errors
    ///
    /// [`BridgeError::SdkNotLoaded`], [`BridgeError::UploaderUnavailable`] or
    /// [`BridgeError::Mount`]; no widget call is made before the SDK is found.
    pub async fn activate(
        &mut self,
        anchor_id: &str,
        field: FieldConfig,
        files: &[FileEntry],
    ) -> Result<(), BridgeError> {
        if self.binding.is_some() {
            self.deactivate().await;
        }
        self.binding = Some(Binding {
            anchor_id: anchor_id.to_string(),
            field: field.clone(),
        });

        let result = self.mount(anchor_id, field, files).await;
        match &result {
            Ok(()) => {
                tracing::info!(anchor_id, "file uploader mounted");
                self.state.set(BridgeState::Ready);
            }
            Err(err) => {
                tracing::error!(anchor_id, error = %err, "file uploader activation failed");
                self.state.set(BridgeState::Error(err.to_string()));
            }
        }
        result
    }

    async fn mount(
        &mut self,
        anchor_id: &str,
        field: FieldConfig,
        files: &[FileEntry],
    ) -> Result<(), BridgeError> {
        let sdk = wait_for_sdk(self.sdk.as_ref(), &self.config).await?;
        let widget = sdk
            .file_uploader()
            .ok_or(BridgeError::UploaderUnavailable)?;

        let existing_files = snapshot::memoize(&self.last_synced, files);
        let config = MountConfig {
            field,
            existing_files,
        };
        widget
            .mount(anchor_id, &config)
            .await
            .map_err(|err| BridgeError::Mount(err.to_string()))?;

        self.last_synced = config.existing_files;
        self.widget = Some(widget);
        Ok(())
    }

    /// Pushes `files` to the widget if they differ from the last synced
    /// snapshot.
    ///
    /// Returns `Ok(true)` when a widget call was made. Does nothing unless
    /// the bridge is ready and bound to a non-empty field key.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Update`] when conversion or the widget call fails.
    pub async fn sync(&mut self, files: &[FileEntry]) -> Result<bool, BridgeError> {
        if !self.state.is_ready() {
            return Ok(false);
        }
        let (Some(widget), Some(binding)) = (&self.widget, &self.binding) else {
            return Ok(false);
        };
        let field_key = binding.field.field_key.as_str();
        if field_key.is_empty() {
            return Ok(false);
        }

        let snapshot = snapshot::memoize(&self.last_synced, files);
        if !snapshot::needs_sync(&self.last_synced, &snapshot) {
            return Ok(false);
        }

        let pushed = Self::push(widget.as_ref(), field_key, &snapshot).await;
        match pushed {
            Ok(()) => {
                tracing::debug!(field_key, files = snapshot.len(), "existing files synced");
                self.last_synced = snapshot;
                Ok(true)
            }
            Err(err) => {
                tracing::error!(field_key, error = %err, "existing files sync failed");
                self.state.set(BridgeState::Error(err.to_string()));
                Err(err)
            }
        }
    }

    async fn push(
        widget: &dyn UploadWidget,
        field_key: &str,
        snapshot: &[FileEntry],
    ) -> Result<(), BridgeError> {
        let update = |err: anyhow::Error| BridgeError::Update(err.to_string());

        let converted;
        let files = if detect_format(snapshot) == SnapshotFormat::Api {
            converted = widget.to_ui_format(snapshot).map_err(update)?;
            converted.as_slice()
        } else {
            snapshot
        };

        if files.is_empty() {
            widget.clear_field(field_key).await.map_err(update)
        } else {
            widget.update_files(field_key, files).await.map_err(update)
        }
    }

    /// Unmounts the widget (best effort) and resets to `Uninitialized`.
    pub async fn deactivate(&mut self) {
        if let (Some(widget), Some(binding)) = (self.widget.take(), &self.binding) {
            if let Err(err) = widget.unmount(&binding.anchor_id).await {
                tracing::warn!(anchor_id = %binding.anchor_id, error = %err, "unmount failed");
            }
        }
        self.binding = None;
        self.last_synced.clear();
        self.state.set(BridgeState::Uninitialized);
    }
}

impl std::fmt::Debug for FileUploadBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUploadBridge")
            .field("state", &self.state.get())
            .field("anchor_id", &self.binding.as_ref().map(|b| &b.anchor_id))
            .field("last_synced", &self.last_synced.len())
            .finish_non_exhaustive()
    }
}
