//! Task records (`task_c`) and their file attachments.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use taskdesk_core::record::{NAME_FIELD, TAGS_FIELD};
use taskdesk_core::{Notifier, Record, RecordId};

use super::alias::{resolve, FieldAlias};
use super::file::FileService;
use super::normalize::Lookup;
use super::projection::{self, Projection};
use super::{RecordService, Resource, Updatable};
use crate::error::ServiceError;
use crate::provider::ClientProvider;

const TASK_FIELDS: &[FieldAlias] = &[
    FieldAlias::new(NAME_FIELD, "title"),
    FieldAlias::new("description_c", "description"),
    FieldAlias::new("priority_c", "priority"),
    FieldAlias::new("status_c", "status"),
    FieldAlias::new("completed_at_c", "completedAt"),
    FieldAlias::canonical(TAGS_FIELD),
];

/// Name given to an attachment that arrives without one.
pub const DEFAULT_ATTACHMENT_NAME: &str = "Uploaded File";

/// Resource description for task records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskResource;

impl Resource for TaskResource {
    const PROJECTION: Projection = projection::TASKS;
    const NOUN: &'static str = "task";
    const ALIASES: &'static [FieldAlias] = TASK_FIELDS;

    fn prepare_create(&self, payload: &Record) -> Result<Record, ServiceError> {
        let mut record = resolve(payload, Self::ALIASES);
        if !record.has(TAGS_FIELD) {
            record.set(TAGS_FIELD, "");
        }
        Ok(record)
    }
}

impl Updatable for TaskResource {}

/// A file handed over with a new task.
///
/// `name` and `size` describe the file; everything else is the opaque handle
/// produced by the upload widget and is stored as the file field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachedFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub handle: Map<String, Value>,
}

impl AttachedFile {
    #[must_use]
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: Some(name.into()),
            size: Some(size),
            handle: Map::new(),
        }
    }

    /// Payload for the file record linking this attachment to `task_id`.
    ///
    /// `upload_date_c` is left to the file resource, which stamps it.
    fn file_payload(&self, task_id: RecordId) -> Record {
        let name = self
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_ATTACHMENT_NAME);
        let handle = serde_json::to_value(self).unwrap_or(Value::Null);

        let mut payload = Record::new()
            .with(NAME_FIELD, name)
            .with("file_size_c", self.size.unwrap_or(0))
            .with("task_c", task_id)
            .with("file_c", handle)
            .with(TAGS_FIELD, "");
        if let Some(file_name) = &self.name {
            payload.set("file_name_c", file_name.as_str());
        }
        payload
    }
}

/// Service over task records.
#[derive(Debug)]
pub struct TaskService {
    inner: RecordService<TaskResource>,
    files: Arc<FileService>,
}

impl TaskService {
    #[must_use]
    pub fn new(
        provider: Arc<ClientProvider>,
        notifier: Arc<dyn Notifier>,
        files: Arc<FileService>,
    ) -> Self {
        Self {
            inner: RecordService::new(provider, notifier, TaskResource),
            files,
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

    pub async fn create(&self, payload: &Record) -> Option<Record> {
        self.create_with_files(payload, &[]).await
    }

    /// Creates the task, then one file record per attachment, in order.
    ///
    /// A failed attachment is logged and skipped; the created task is
    /// returned either way.
    pub async fn create_with_files(
        &self,
        payload: &Record,
        files: &[AttachedFile],
    ) -> Option<Record> {
        let task = self.inner.create(payload).await?;
        if files.is_empty() {
            return Some(task);
        }

        let Some(task_id) = task.id() else {
            tracing::warn!(
                table = TaskResource::PROJECTION.table,
                attachments = files.len(),
                "created task has no Id; attachments skipped"
            );
            return Some(task);
        };

        for (index, file) in files.iter().enumerate() {
            let payload = file.file_payload(task_id);
            if self.files.create(&payload).await.is_none() {
                tracing::error!(
                    table = TaskResource::PROJECTION.table,
                    record_id = task_id,
                    attachment = index,
                    "failed to create file attachment"
                );
            }
        }
        Some(task)
    }

    pub async fn update(&self, id: RecordId, updates: &Record) -> Option<Record> {
        self.inner.update(id, updates).await
    }

    pub async fn delete(&self, id: RecordId) -> bool {
        self.inner.delete(id).await
    }
}
