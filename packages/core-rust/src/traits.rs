use std::sync::Arc;

use async_trait::async_trait;

use crate::envelope::{BatchResponse, DeleteBatch, FetchResponse, RecordResponse, WriteBatch};
use crate::files::{self, FileEntry, MountConfig};
use crate::query::QuerySpec;
use crate::record::RecordId;

/// Remote record service (the backend-as-a-service data API).
///
/// `Err` models the call itself failing (network, auth, serialization).
/// A call that reached the backend but was rejected comes back as
/// `Ok(envelope)` with `success == false`.
///
/// Implementations: HTTP (`HttpRecordClient`), memory (tests, demos).
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Fetch every record of `table` matching `query`.
    async fn fetch_records(&self, table: &str, query: &QuerySpec) -> anyhow::Result<FetchResponse>;

    /// Fetch a single record by identifier.
    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        query: &QuerySpec,
    ) -> anyhow::Result<RecordResponse>;

    /// Create every record in the batch.
    async fn create_record(
        &self,
        table: &str,
        batch: &WriteBatch,
    ) -> anyhow::Result<BatchResponse>;

    /// Update every record in the batch. Each record carries its `Id`.
    async fn update_record(
        &self,
        table: &str,
        batch: &WriteBatch,
    ) -> anyhow::Result<BatchResponse>;

    /// Delete every listed record.
    async fn delete_record(
        &self,
        table: &str,
        batch: &DeleteBatch,
    ) -> anyhow::Result<BatchResponse>;
}

/// Hosted file-upload widget.
///
/// The mount/update calls drive a UI the host does not render itself; all of
/// them may fail.
#[async_trait]
pub trait UploadWidget: Send + Sync {
    /// Mount a widget instance into the anchor element `anchor_id`.
    async fn mount(&self, anchor_id: &str, config: &MountConfig) -> anyhow::Result<()>;

    /// Tear down the widget instance mounted at `anchor_id`.
    async fn unmount(&self, anchor_id: &str) -> anyhow::Result<()>;

    /// Replace the displayed file set of `field_key` (UI format).
    async fn update_files(&self, field_key: &str, files: &[FileEntry]) -> anyhow::Result<()>;

    /// Reset `field_key` to an empty file set.
    async fn clear_field(&self, field_key: &str) -> anyhow::Result<()>;

    /// Convert API-format entries to the widget's UI format.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry cannot be represented in UI format. The
    /// default conversion never fails.
    fn to_ui_format(&self, files: &[FileEntry]) -> anyhow::Result<Vec<FileEntry>> {
        Ok(files::to_ui_format(files))
    }

    /// Convert a UI-format file handle into the shape the record service
    /// stores in a file field.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not a valid upload handle. The
    /// default passes the handle through unchanged.
    fn to_create_format(&self, file: &FileEntry) -> anyhow::Result<FileEntry> {
        Ok(file.clone())
    }
}

/// A loaded upload SDK.
pub trait UploadSdk: Send + Sync {
    /// The file uploader exposed by the SDK, if this build ships one.
    fn file_uploader(&self) -> Option<Arc<dyn UploadWidget>>;
}

/// Where the upload SDK comes from. The SDK is loaded out of band, so it may
/// not be available yet when a bridge activates.
pub trait SdkSource: Send + Sync {
    /// The SDK handle, once loaded.
    fn current(&self) -> Option<Arc<dyn UploadSdk>>;
}

/// User-visible transient error channel (toasts).
pub trait Notifier: Send + Sync {
    /// Show `message` to the user.
    fn notify_error(&self, message: &str);
}
