//! taskdesk client: typed access to the remote task and file tables, and the
//! bridge that keeps a hosted upload widget in step with a record's files.
//!
//! Services are total: failures are logged through `tracing`, surfaced to
//! the user through a [`Notifier`](taskdesk_core::Notifier) where the
//! failure policy says so, and folded into empty or `None` results.

pub mod bridge;
pub mod clock;
pub mod config;
pub mod error;
pub mod notify;
pub mod provider;
pub mod service;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use bridge::{BridgeHandle, BridgeState, FileUploadBridge, SdkSlot};
pub use config::{BridgeConfig, ClientConfig};
pub use error::{BridgeError, ProviderError, ServiceError};
pub use provider::ClientProvider;
pub use service::{AttachedFile, FileResource, FileService, Lookup, TaskService};
pub use transport::{HttpRecordClient, MemoryRecordClient};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use taskdesk_core::{Notifier, Record};

    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::transport::Fault;

    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }

    #[tokio::test]
    async fn tasks_and_files_round_trip_through_memory_backend() {
        let backend = Arc::new(MemoryRecordClient::new());
        backend.require_fields("task_c", &["Name"]);
        let provider = Arc::new(ClientProvider::with_client(Arc::clone(&backend) as _));
        let notifier = Arc::new(RecordingNotifier::new());
        let files = Arc::new(FileService::new(
            Arc::clone(&provider),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            FileResource::default(),
        ));
        let tasks = TaskService::new(
            Arc::clone(&provider),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::clone(&files),
        );

        let task = tasks
            .create_with_files(
                &Record::new()
                    .with("title", "Buy milk")
                    .with("priority", "high"),
                &[AttachedFile::new("list.txt", 12), AttachedFile::new("map.png", 40)],
            )
            .await
            .unwrap();
        let task_id = task.id().unwrap();

        let attached = files.get_by_task_id(&json!(task_id)).await;
        assert_eq!(attached.len(), 2);
        let linked = json!(task_id);
        assert!(attached.iter().all(|f| f.get("task_c") == Some(&linked)));

        let updated = tasks
            .update(task_id, &Record::new().with("status", "done"))
            .await
            .unwrap();
        assert_eq!(updated.get_str("status_c"), Some("done"));
        assert_eq!(updated.get_str("Name"), Some("Buy milk"));

        // Validation failure surfaces the field error and creates nothing.
        let invalid = Record::new().with("priority", "low");
        assert!(tasks.create(&invalid).await.is_none());
        assert_eq!(
            notifier.messages(),
            vec!["Name: is required", "Record validation failed"]
        );

        backend.fail_next("task_c", Fault::Transport("offline".to_string()));
        assert!(tasks.list_all().await.is_empty());
        assert_eq!(tasks.list_all().await.len(), 1);

        assert!(tasks.delete(task_id).await);
        assert!(tasks.get_by_id(task_id).await.is_none());
        assert_eq!(notifier.count(), 2);
    }
}
