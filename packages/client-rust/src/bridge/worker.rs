//! Serialized execution of bridge operations.
//!
//! [`BridgeHandle`] moves a [`FileUploadBridge`] onto its own tokio task and
//! feeds it [`BridgeTask`]s over a bounded mpsc channel, so activation, syncs
//! and deactivation apply strictly in submission order.

use taskdesk_core::{FieldConfig, FileEntry};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::{BridgeState, FileUploadBridge, StateHandle};
use crate::error::BridgeError;

// ---------------------------------------------------------------------------
// BridgeTask
// ---------------------------------------------------------------------------

/// Operations accepted by a bridge worker. Each carries the channel its
/// result is reported on.
#[derive(Debug)]
pub enum BridgeTask {
    /// Reconcile with new inputs (mount, remount or sync).
    Render {
        anchor_id: String,
        field: FieldConfig,
        files: Vec<FileEntry>,
        done: oneshot::Sender<Result<(), BridgeError>>,
    },
    /// Sync a new snapshot into the mounted widget.
    Sync {
        files: Vec<FileEntry>,
        done: oneshot::Sender<Result<bool, BridgeError>>,
    },
    /// Unmount and reset.
    Deactivate { done: oneshot::Sender<()> },
}

impl FileUploadBridge {
    async fn apply(&mut self, task: BridgeTask) {
        // A caller that stopped waiting is not an error.
        match task {
            BridgeTask::Render {
                anchor_id,
                field,
                files,
                done,
            } => {
                let result = self.render(&anchor_id, field, &files).await;
                let _ = done.send(result);
            }
            BridgeTask::Sync { files, done } => {
                let result = self.sync(&files).await;
                let _ = done.send(result);
            }
            BridgeTask::Deactivate { done } => {
                self.deactivate().await;
                let _ = done.send(());
            }
        }
    }
}

/// Applies tasks until stopped or every sender is gone, then deactivates.
async fn run(
    mut bridge: FileUploadBridge,
    mut rx: mpsc::Receiver<BridgeTask>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            task = rx.recv() => {
                match task {
                    Some(t) => bridge.apply(t).await,
                    None => break, // All senders dropped.
                }
            }
            _ = &mut shutdown_rx => {
                break;
            }
        }
    }

    bridge.deactivate().await;
    tracing::debug!("bridge worker stopped");
}

// ---------------------------------------------------------------------------
// BridgeHandle
// ---------------------------------------------------------------------------

/// Owner-side handle of a bridge running on its own worker task.
pub struct BridgeHandle {
    tx: Option<mpsc::Sender<BridgeTask>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
    state: StateHandle,
}

impl BridgeHandle {
    /// Moves `bridge` onto a new worker task.
    #[must_use]
    pub fn spawn(bridge: FileUploadBridge) -> Self {
        let state = bridge.state_handle();
        let (tx, rx) = mpsc::channel(bridge.config.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let join = tokio::spawn(run(bridge, rx, shutdown_rx));
        Self {
            tx: Some(tx),
            shutdown_tx: Some(shutdown_tx),
            join: Some(join),
            state,
        }
    }

    #[must_use]
    pub fn state(&self) -> BridgeState {
        self.state.get()
    }

    #[must_use]
    pub fn state_handle(&self) -> StateHandle {
        self.state.clone()
    }

    /// See [`FileUploadBridge::render`].
    ///
    /// # Errors
    ///
    /// The render failure, or [`BridgeError::WorkerStopped`].
    pub async fn render(
        &self,
        anchor_id: impl Into<String>,
        field: FieldConfig,
        files: Vec<FileEntry>,
    ) -> Result<(), BridgeError> {
        let (done, rx) = oneshot::channel();
        let task = BridgeTask::Render {
            anchor_id: anchor_id.into(),
            field,
            files,
            done,
        };
        self.request(task, rx).await?
    }

    /// See [`FileUploadBridge::sync`].
    ///
    /// # Errors
    ///
    /// The sync failure, or [`BridgeError::WorkerStopped`].
    pub async fn sync(&self, files: Vec<FileEntry>) -> Result<bool, BridgeError> {
        let (done, rx) = oneshot::channel();
        self.request(BridgeTask::Sync { files, done }, rx).await?
    }

    /// See [`FileUploadBridge::deactivate`].
    ///
    /// # Errors
    ///
    /// [`BridgeError::WorkerStopped`] if the worker is gone.
    pub async fn deactivate(&self) -> Result<(), BridgeError> {
        let (done, rx) = oneshot::channel();
        self.request(BridgeTask::Deactivate { done }, rx).await
    }

    async fn request<T>(
        &self,
        task: BridgeTask,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, BridgeError> {
        let tx = self.tx.as_ref().ok_or(BridgeError::WorkerStopped)?;
        tx.send(task).await.map_err(|_| BridgeError::WorkerStopped)?;
        rx.await.map_err(|_| BridgeError::WorkerStopped)
    }

    /// Stops the worker and waits for it; the bridge is deactivated on the
    /// way out. Queued tasks that have not started are dropped.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.tx.take();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl std::fmt::Debug for BridgeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeHandle")
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::bridge::SdkSlot;
    use crate::config::BridgeConfig;
    use crate::test_support::{FakeSdk, FakeWidget, WidgetCall};

    fn spawn_loaded() -> (BridgeHandle, Arc<FakeWidget>) {
        let widget = Arc::new(FakeWidget::new());
        let slot = Arc::new(SdkSlot::new());
        slot.set(Arc::new(FakeSdk::with_widget(Arc::clone(&widget))));
        let bridge = FileUploadBridge::new(slot, BridgeConfig::default());
        (BridgeHandle::spawn(bridge), widget)
    }

    fn field() -> FieldConfig {
        FieldConfig::new("file_c", "Attachments", "task_c")
    }

    #[tokio::test]
    async fn operations_apply_in_submission_order() {
        let (bridge, widget) = spawn_loaded();

        let (mounted, first, second) = tokio::join!(
            bridge.render("a", field(), Vec::new()),
            bridge.sync(vec![json!({"name": "one"})]),
            bridge.sync(vec![json!({"name": "one"}), json!({"name": "two"})]),
        );

        mounted.unwrap();
        assert!(first.unwrap());
        assert!(second.unwrap());
        assert_eq!(bridge.state(), BridgeState::Ready);

        let calls = widget.calls();
        assert!(matches!(calls[0], WidgetCall::Mount { .. }));
        assert!(matches!(&calls[1], WidgetCall::UpdateFiles { files, .. } if files.len() == 1));
        assert!(matches!(&calls[2], WidgetCall::UpdateFiles { files, .. } if files.len() == 2));
    }

    #[tokio::test(start_paused = true)]
    async fn state_is_observable_while_waiting_for_sdk() {
        let widget = Arc::new(FakeWidget::new());
        let slot = Arc::new(SdkSlot::new());
        let bridge = BridgeHandle::spawn(FileUploadBridge::new(
            Arc::clone(&slot) as _,
            BridgeConfig::default(),
        ));
        let observer = bridge.state_handle();

        let pending = tokio::spawn(async move {
            let result = bridge.render("a", field(), Vec::new()).await;
            (bridge, result)
        });

        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        assert_eq!(observer.get(), BridgeState::Uninitialized);

        slot.set(Arc::new(FakeSdk::with_widget(Arc::clone(&widget))));
        let (_bridge, result) = pending.await.unwrap();

        result.unwrap();
        assert!(observer.is_ready());
        assert_eq!(widget.call_count(), 1);
    }

    #[tokio::test]
    async fn stop_deactivates_and_rejects_later_requests() {
        let (mut bridge, widget) = spawn_loaded();
        bridge.render("a", field(), Vec::new()).await.unwrap();

        bridge.stop().await;

        assert_eq!(bridge.state(), BridgeState::Uninitialized);
        assert_eq!(
            widget.calls().last(),
            Some(&WidgetCall::Unmount("a".to_string()))
        );
        assert_eq!(
            bridge.sync(Vec::new()).await.unwrap_err(),
            BridgeError::WorkerStopped
        );
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let (mut bridge, widget) = spawn_loaded();
        bridge.render("a", field(), Vec::new()).await.unwrap();

        bridge.stop().await;
        bridge.stop().await;

        assert_eq!(widget.call_count(), 2);
        assert_eq!(
            bridge.deactivate().await.unwrap_err(),
            BridgeError::WorkerStopped
        );
    }

    #[tokio::test]
    async fn explicit_deactivate_keeps_worker_running() {
        let (bridge, widget) = spawn_loaded();
        bridge.render("a", field(), Vec::new()).await.unwrap();

        bridge.deactivate().await.unwrap();
        assert_eq!(bridge.state(), BridgeState::Uninitialized);

        bridge.render("a", field(), Vec::new()).await.unwrap();
        assert_eq!(bridge.state(), BridgeState::Ready);
        assert_eq!(widget.call_count(), 3);
    }
}
