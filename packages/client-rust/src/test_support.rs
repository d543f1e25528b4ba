//! Test doubles shared by the in-crate test suites.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use taskdesk_core::{
    BatchResponse, DeleteBatch, Envelope, FetchResponse, FileEntry, MountConfig, QuerySpec,
    RecordId, RecordResponse, RemoteClient, UploadSdk, UploadWidget, WriteBatch,
};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

// ---------------------------------------------------------------------------
// ScriptedClient
// ---------------------------------------------------------------------------

/// One recorded call against [`ScriptedClient`].
#[derive(Debug, Clone)]
pub enum Call {
    Fetch { table: String, query: QuerySpec },
    Get {
        table: String,
        id: RecordId,
        query: QuerySpec,
    },
    Create { table: String, batch: WriteBatch },
    Update { table: String, batch: WriteBatch },
    Delete { table: String, batch: DeleteBatch },
}

impl Call {
    pub fn table(&self) -> &str {
        match self {
            Self::Fetch { table, .. }
            | Self::Get { table, .. }
            | Self::Create { table, .. }
            | Self::Update { table, .. }
            | Self::Delete { table, .. } => table,
        }
    }
}

/// Remote client answering from per-operation response queues.
///
/// An exhausted queue answers with a successful empty envelope.
#[derive(Default)]
pub struct ScriptedClient {
    calls: Mutex<Vec<Call>>,
    fetch: Mutex<VecDeque<anyhow::Result<FetchResponse>>>,
    get: Mutex<VecDeque<anyhow::Result<RecordResponse>>>,
    create: Mutex<VecDeque<anyhow::Result<BatchResponse>>>,
    update: Mutex<VecDeque<anyhow::Result<BatchResponse>>>,
    delete: Mutex<VecDeque<anyhow::Result<BatchResponse>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_fetch(&self, response: anyhow::Result<FetchResponse>) {
        self.fetch.lock().push_back(response);
    }

    pub fn push_get(&self, response: anyhow::Result<RecordResponse>) {
        self.get.lock().push_back(response);
    }

    pub fn push_create(&self, response: anyhow::Result<BatchResponse>) {
        self.create.lock().push_back(response);
    }

    pub fn push_update(&self, response: anyhow::Result<BatchResponse>) {
        self.update.lock().push_back(response);
    }

    pub fn push_delete(&self, response: anyhow::Result<BatchResponse>) {
        self.delete.lock().push_back(response);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn next<T>(
        queue: &Mutex<VecDeque<anyhow::Result<Envelope<T>>>>,
    ) -> anyhow::Result<Envelope<T>> {
        queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Envelope::empty()))
    }
}

#[async_trait]
impl RemoteClient for ScriptedClient {
    async fn fetch_records(&self, table: &str, query: &QuerySpec) -> anyhow::Result<FetchResponse> {
        self.calls.lock().push(Call::Fetch {
            table: table.to_string(),
            query: query.clone(),
        });
        Self::next(&self.fetch)
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        query: &QuerySpec,
    ) -> anyhow::Result<RecordResponse> {
        self.calls.lock().push(Call::Get {
            table: table.to_string(),
            id,
            query: query.clone(),
        });
        Self::next(&self.get)
    }

    async fn create_record(
        &self,
        table: &str,
        batch: &WriteBatch,
    ) -> anyhow::Result<BatchResponse> {
        self.calls.lock().push(Call::Create {
            table: table.to_string(),
            batch: batch.clone(),
        });
        Self::next(&self.create)
    }

    async fn update_record(
        &self,
        table: &str,
        batch: &WriteBatch,
    ) -> anyhow::Result<BatchResponse> {
        self.calls.lock().push(Call::Update {
            table: table.to_string(),
            batch: batch.clone(),
        });
        Self::next(&self.update)
    }

    async fn delete_record(
        &self,
        table: &str,
        batch: &DeleteBatch,
    ) -> anyhow::Result<BatchResponse> {
        self.calls.lock().push(Call::Delete {
            table: table.to_string(),
            batch: batch.clone(),
        });
        Self::next(&self.delete)
    }
}

// ---------------------------------------------------------------------------
// FakeWidget / FakeSdk
// ---------------------------------------------------------------------------

/// One recorded widget call.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCall {
    Mount {
        anchor_id: String,
        field_key: String,
        existing_files: Vec<FileEntry>,
    },
    Unmount(String),
    UpdateFiles {
        field_key: String,
        files: Vec<FileEntry>,
    },
    ClearField(String),
}

/// Upload widget that records every call and can be told to fail.
#[derive(Default)]
pub struct FakeWidget {
    calls: Mutex<Vec<WidgetCall>>,
    fail_mount: Mutex<Option<String>>,
    fail_update: Mutex<Option<String>>,
    fail_unmount: Mutex<Option<String>>,
    ui_conversions: AtomicUsize,
}

impl FakeWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<WidgetCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn fail_mount(&self, message: &str) {
        *self.fail_mount.lock() = Some(message.to_string());
    }

    pub fn fail_update(&self, message: &str) {
        *self.fail_update.lock() = Some(message.to_string());
    }

    pub fn fail_unmount(&self, message: &str) {
        *self.fail_unmount.lock() = Some(message.to_string());
    }

    pub fn ui_conversions(&self) -> usize {
        self.ui_conversions.load(Ordering::Relaxed)
    }

    fn check(slot: &Mutex<Option<String>>) -> anyhow::Result<()> {
        match slot.lock().as_ref() {
            Some(message) => Err(anyhow::anyhow!("{message}")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UploadWidget for FakeWidget {
    async fn mount(&self, anchor_id: &str, config: &MountConfig) -> anyhow::Result<()> {
        self.calls.lock().push(WidgetCall::Mount {
            anchor_id: anchor_id.to_string(),
            field_key: config.field.field_key.clone(),
            existing_files: config.existing_files.clone(),
        });
        Self::check(&self.fail_mount)
    }

    async fn unmount(&self, anchor_id: &str) -> anyhow::Result<()> {
        self.calls
            .lock()
            .push(WidgetCall::Unmount(anchor_id.to_string()));
        Self::check(&self.fail_unmount)
    }

    async fn update_files(&self, field_key: &str, files: &[FileEntry]) -> anyhow::Result<()> {
        self.calls.lock().push(WidgetCall::UpdateFiles {
            field_key: field_key.to_string(),
            files: files.to_vec(),
        });
        Self::check(&self.fail_update)
    }

    async fn clear_field(&self, field_key: &str) -> anyhow::Result<()> {
        self.calls
            .lock()
            .push(WidgetCall::ClearField(field_key.to_string()));
        Self::check(&self.fail_update)
    }

    fn to_ui_format(&self, files: &[FileEntry]) -> anyhow::Result<Vec<FileEntry>> {
        self.ui_conversions.fetch_add(1, Ordering::Relaxed);
        Ok(taskdesk_core::files::to_ui_format(files))
    }
}

/// SDK exposing a fixed uploader (or none).
pub struct FakeSdk {
    pub uploader: Option<Arc<FakeWidget>>,
}

impl FakeSdk {
    pub fn with_widget(widget: Arc<FakeWidget>) -> Self {
        Self {
            uploader: Some(widget),
        }
    }

    pub fn without_uploader() -> Self {
        Self { uploader: None }
    }
}

impl UploadSdk for FakeSdk {
    fn file_uploader(&self) -> Option<Arc<dyn UploadWidget>> {
        self.uploader
            .as_ref()
            .map(|widget| Arc::clone(widget) as Arc<dyn UploadWidget>)
    }
}

// ---------------------------------------------------------------------------
// LogCapture
// ---------------------------------------------------------------------------

/// One captured tracing event: its level and its fields rendered as strings.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Default)]
struct FieldVisitor(BTreeMap<String, String>);

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

/// Layer that keeps every event emitted while it is installed.
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the capture as this thread's default subscriber until the
    /// guard drops. `#[tokio::test]` runs on one thread, so async calls
    /// made while the guard lives are captured.
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    /// Events at WARN or more severe.
    pub fn warnings(&self) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.level <= Level::WARN)
            .cloned()
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            fields: visitor.0,
        });
    }
}
