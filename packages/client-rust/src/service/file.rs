//! File records (`files_c`).

use std::sync::Arc;

use serde_json::Value;
use taskdesk_core::record::{NAME_FIELD, TAGS_FIELD};
use taskdesk_core::{coerce_id_value, Notifier, Record, RecordId, SdkSource, UploadWidget};

use super::alias::FieldAlias;
use super::normalize::Lookup;
use super::projection::{self, Projection};
use super::{RecordService, Resource};
use crate::clock::{Clock, SystemClock};
use crate::error::ServiceError;
use crate::provider::ClientProvider;

/// Loose truthiness: null, `false`, `0`, `NaN` and `""` are all "not set".
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn field<'a>(payload: &'a Record, name: &str) -> Option<&'a Value> {
    payload.get(name).filter(|value| truthy(value))
}

/// Resource description for file records.
///
/// The uploader used to convert file handles is resolved from the SDK source
/// at create time, so a late-loaded SDK is picked up.
#[derive(Clone)]
pub struct FileResource {
    sdk: Option<Arc<dyn SdkSource>>,
    clock: Arc<dyn Clock>,
}

impl FileResource {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { sdk: None, clock }
    }

    /// Converts `file_c` handles through the uploader of `sdk` when one is
    /// loaded.
    #[must_use]
    pub fn with_sdk(mut self, sdk: Arc<dyn SdkSource>) -> Self {
        self.sdk = Some(sdk);
        self
    }

    fn uploader(&self) -> Option<Arc<dyn UploadWidget>> {
        self.sdk
            .as_ref()
            .and_then(|source| source.current())
            .and_then(|sdk| sdk.file_uploader())
    }

    fn convert_handle(&self, handle: &Value) -> Result<Value, ServiceError> {
        let Some(uploader) = self.uploader() else {
            return Ok(handle.clone());
        };
        let convert = |file: &Value| {
            uploader
                .to_create_format(file)
                .map_err(|err| ServiceError::InvalidPayload(format!("file_c: {err}")))
        };
        match handle {
            Value::Array(files) => files
                .iter()
                .map(convert)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            single => convert(single),
        }
    }
}

impl Default for FileResource {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl Resource for FileResource {
    const PROJECTION: Projection = projection::FILES;
    const NOUN: &'static str = "file";
    /// Payloads are built field by field and files are never updated.
    const ALIASES: &'static [FieldAlias] = &[];

    fn prepare_create(&self, payload: &Record) -> Result<Record, ServiceError> {
        let name = field(payload, NAME_FIELD)
            .or_else(|| field(payload, "file_name_c"))
            .cloned()
            .unwrap_or_else(|| Value::from(""));
        let file_c = match field(payload, "file_c") {
            Some(handle) => self.convert_handle(handle)?,
            None => Value::Null,
        };

        let mut record = Record::new();
        record.set(NAME_FIELD, name);
        record.set(
            "file_name_c",
            field(payload, "file_name_c")
                .cloned()
                .unwrap_or_else(|| Value::from("")),
        );
        record.set(
            "file_size_c",
            field(payload, "file_size_c")
                .cloned()
                .unwrap_or_else(|| Value::from(0)),
        );
        record.set(
            "upload_date_c",
            field(payload, "upload_date_c")
                .cloned()
                .unwrap_or_else(|| Value::from(self.clock.now_iso())),
        );
        record.set(
            "task_c",
            coerce_id_value(payload.get("task_c").unwrap_or(&Value::Null)),
        );
        record.set("file_c", file_c);
        record.set(
            TAGS_FIELD,
            field(payload, TAGS_FIELD)
                .cloned()
                .unwrap_or_else(|| Value::from("")),
        );
        Ok(record)
    }
}

/// Service over file records.
#[derive(Debug)]
pub struct FileService {
    inner: RecordService<FileResource>,
}

impl FileService {
    #[must_use]
    pub fn new(
        provider: Arc<ClientProvider>,
        notifier: Arc<dyn Notifier>,
        resource: FileResource,
    ) -> Self {
        Self {
            inner: RecordService::new(provider, notifier, resource),
        }
    }

    pub async fn list_all(&self) -> Vec<Record> {
        self.inner.list_all().await
    }

    pub async fn get_by_id(&self, id: RecordId) -> Option<Record> {
        self.inner.get_by_id(id).await
    }

    pub async fn lookup(&self, id: RecordId) -> Lookup {
        self.inner.lookup(id).await
    }

    /// Files attached to the task `task_id`, newest first.
    pub async fn get_by_task_id(&self, task_id: &Value) -> Vec<Record> {
        self.inner.get_by_foreign_key(task_id).await
    }

    pub async fn create(&self, payload: &Record) -> Option<Record> {
        self.inner.create(payload).await
    }

    pub async fn delete(&self, id: RecordId) -> bool {
        self.inner.delete(id).await
    }
}

impl std::fmt::Debug for FileResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileResource")
            .field("sdk", &self.sdk.is_some())
            .finish_non_exhaustive()
    }
}
