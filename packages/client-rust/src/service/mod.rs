//! Record access services.
//!
//! [`RecordService`] is the generic CRUD proxy. A [`Resource`] supplies the
//! table, projection, alias table and create-time defaults; the service
//! supplies client lookup, normalization, batch aggregation and the failure
//! policy. Every public operation is total: failures are logged (and, for
//! writes, notified) and folded into an empty list, `None` or `false`.

pub mod aggregate;
pub mod alias;
pub mod file;
pub mod normalize;
pub mod projection;
pub mod task;

use std::sync::Arc;

use serde_json::Value;
use taskdesk_core::record::ID_FIELD;
use taskdesk_core::{
    BatchResponse, DeleteBatch, Notifier, QuerySpec, Record, RecordId, WriteBatch,
};

use crate::error::ServiceError;
use crate::provider::ClientProvider;

pub use aggregate::{aggregate, BatchOutcome};
pub use alias::{resolve, FieldAlias};
pub use file::{FileResource, FileService};
pub use normalize::{CallContext, FailurePolicy, Lookup, Operation};
pub use projection::Projection;
pub use task::{AttachedFile, TaskResource, TaskService};

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// Static description of one remote table and how payloads for it are built.
pub trait Resource: Send + Sync {
    /// Table, projected fields, ordering and parent reference.
    const PROJECTION: Projection;
    /// Singular noun used in user-facing fallback messages.
    const NOUN: &'static str;
    /// Fields accepted on writes, with their legacy spellings.
    const ALIASES: &'static [FieldAlias];

    /// Builds the record sent on create, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidPayload`] if the payload cannot be
    /// converted into the stored shape.
    fn prepare_create(&self, payload: &Record) -> Result<Record, ServiceError>;

    /// Builds the record sent on update: the `Id` plus only the aliased
    /// fields present in `updates`.
    fn prepare_update(&self, id: RecordId, updates: &Record) -> Record {
        let mut record = resolve(updates, Self::ALIASES);
        record.set(ID_FIELD, id);
        record
    }
}

/// Marker for resources whose records may be updated in place.
pub trait Updatable: Resource {}

// ---------------------------------------------------------------------------
// RecordService
// ---------------------------------------------------------------------------

/// Generic CRUD proxy over one [`Resource`].
pub struct RecordService<R> {
    provider: Arc<ClientProvider>,
    notifier: Arc<dyn Notifier>,
    resource: R,
}

impl<R: Resource> RecordService<R> {
    #[must_use]
    pub fn new(provider: Arc<ClientProvider>, notifier: Arc<dyn Notifier>, resource: R) -> Self {
        Self {
            provider,
            notifier,
            resource,
        }
    }

    #[must_use]
    pub fn resource(&self) -> &R {
        &self.resource
    }

    fn context(operation: Operation) -> CallContext {
        CallContext::new(R::PROJECTION.table, R::NOUN, operation)
    }

    /// Every record of the table, newest first. Empty on any failure.
    pub async fn list_all(&self) -> Vec<Record> {
        let ctx = Self::context(Operation::List);
        self.fetch(&ctx, &R::PROJECTION.list_query()).await
    }

    /// Records whose parent reference equals `parent_id` (coerced to an
    /// integer), newest first. Empty on any failure or when the resource has
    /// no parent reference.
    pub async fn get_by_foreign_key(&self, parent_id: &Value) -> Vec<Record> {
        let ctx = Self::context(Operation::ListByParent);
        let Some(query) = R::PROJECTION.by_parent_query(parent_id) else {
            tracing::warn!(table = ctx.table, "resource has no parent reference");
            return Vec::new();
        };
        self.fetch(&ctx, &query).await
    }

    async fn fetch(&self, ctx: &CallContext, query: &QuerySpec) -> Vec<Record> {
        let response = match self.provider.client() {
            Ok(client) => client
                .fetch_records(ctx.table, query)
                .await
                .map_err(ServiceError::from),
            Err(err) => Err(err),
        };

        match normalize::normalize_list(ctx, response) {
            Ok(records) => records,
            Err(err) => {
                normalize::report_failure(ctx, &err, self.notifier.as_ref());
                Vec::new()
            }
        }
    }

    /// Looks a record up by identifier, keeping "not found" distinct from
    /// "the call failed". Failures are logged, never notified.
    pub async fn lookup(&self, id: RecordId) -> Lookup {
        let ctx = Self::context(Operation::Get).with_id(id);
        let response = match self.provider.client() {
            Ok(client) => client
                .get_record_by_id(ctx.table, id, &R::PROJECTION.by_id_query())
                .await
                .map_err(ServiceError::from),
            Err(err) => Err(err),
        };

        let lookup = normalize::normalize_lookup(&ctx, response);
        match &lookup {
            Lookup::Failed(err) => normalize::report_failure(&ctx, err, self.notifier.as_ref()),
            Lookup::NotFound => {
                tracing::debug!(table = ctx.table, record_id = id, "record not found");
            }
            Lookup::Found(_) => {}
        }
        lookup
    }

    /// The record with `id`, or `None` when it is missing or the call failed.
    pub async fn get_by_id(&self, id: RecordId) -> Option<Record> {
        self.lookup(id).await.into_option()
    }

    /// Creates one record and returns what the backend stored.
    pub async fn create(&self, payload: &Record) -> Option<Record> {
        let ctx = Self::context(Operation::Create);
        let record = match self.resource.prepare_create(payload) {
            Ok(record) => record,
            Err(err) => {
                normalize::report_failure(&ctx, &err, self.notifier.as_ref());
                return None;
            }
        };

        let response = match self.provider.client() {
            Ok(client) => client
                .create_record(ctx.table, &WriteBatch::single(record))
                .await
                .map_err(ServiceError::from),
            Err(err) => Err(err),
        };

        let created = self.settle(&ctx, response)?.into_first_data();
        if let Some(record) = &created {
            tracing::debug!(table = ctx.table, record_id = record.id(), "record created");
        }
        created
    }

    /// Deletes the record with `id`. `true` iff at least one result of the
    /// batch succeeded.
    pub async fn delete(&self, id: RecordId) -> bool {
        let ctx = Self::context(Operation::Delete).with_id(id);
        let batch = DeleteBatch {
            record_ids: vec![id],
        };
        let response = match self.provider.client() {
            Ok(client) => client
                .delete_record(ctx.table, &batch)
                .await
                .map_err(ServiceError::from),
            Err(err) => Err(err),
        };

        self.settle(&ctx, response)
            .is_some_and(|outcome| outcome.any_succeeded())
    }

    /// Normalizes and aggregates a write response. `None` when the call or
    /// the batch as a whole failed; the failure has been reported by then.
    fn settle(
        &self,
        ctx: &CallContext,
        response: Result<BatchResponse, ServiceError>,
    ) -> Option<BatchOutcome> {
        match normalize::normalize_batch(ctx, response) {
            Ok(results) => Some(aggregate(results, ctx, self.notifier.as_ref())),
            Err(err) => {
                normalize::report_failure(ctx, &err, self.notifier.as_ref());
                None
            }
        }
    }
}

impl<R: Updatable> RecordService<R> {
    /// Updates the fields present in `updates` on record `id`.
    pub async fn update(&self, id: RecordId, updates: &Record) -> Option<Record> {
        let ctx = Self::context(Operation::Update).with_id(id);
        let record = self.resource.prepare_update(id, updates);
        let response = match self.provider.client() {
            Ok(client) => client
                .update_record(ctx.table, &WriteBatch::single(record))
                .await
                .map_err(ServiceError::from),
            Err(err) => Err(err),
        };

        self.settle(&ctx, response)?.into_first_data()
    }
}

impl<R> std::fmt::Debug for RecordService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordService")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}
