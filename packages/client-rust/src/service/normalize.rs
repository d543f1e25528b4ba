//! Response normalization and the per-operation failure policy.
//!
//! Turns `Result<Envelope, _>` from the remote client into either a plain
//! value or a [`ServiceError`], and decides how each failure is surfaced.
//! Reads are log-only; writes are logged and pushed to the notifier.

use taskdesk_core::{
    BatchResponse, FetchResponse, Notifier, Record, RecordId, RecordOutcome, RecordResponse,
};

use crate::error::ServiceError;

// ---------------------------------------------------------------------------
// Policy table
// ---------------------------------------------------------------------------

/// Operations exposed by a record service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    ListByParent,
    Create,
    Update,
    Delete,
}

/// How a failed operation is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Diagnostic log entry only.
    LogOnly,
    /// Log entry plus a user-visible notification.
    LogAndNotify,
}

impl Operation {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::ListByParent => "list_by_parent",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    #[must_use]
    pub fn policy(self) -> FailurePolicy {
        match self {
            Self::List | Self::Get | Self::ListByParent => FailurePolicy::LogOnly,
            Self::Create | Self::Update | Self::Delete => FailurePolicy::LogAndNotify,
        }
    }
}

/// Where a call happened, attached to every log entry it produces.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    pub table: &'static str,
    /// Singular resource noun used in user-facing messages ("task", "file").
    pub resource: &'static str,
    pub operation: Operation,
    pub record_id: Option<RecordId>,
}

impl CallContext {
    #[must_use]
    pub fn new(table: &'static str, resource: &'static str, operation: Operation) -> Self {
        Self {
            table,
            resource,
            operation,
            record_id: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.record_id = Some(id);
        self
    }

    /// Message shown when the backend gives no message of its own.
    #[must_use]
    pub fn fallback_message(&self) -> String {
        format!("Failed to {} {}", self.operation.name(), self.resource)
    }
}

/// Logs `err` and, for write operations, notifies the user.
pub fn report_failure(ctx: &CallContext, err: &ServiceError, notifier: &dyn Notifier) {
    tracing::error!(
        table = ctx.table,
        operation = ctx.operation.name(),
        record_id = ctx.record_id,
        error = %err,
        "record service call failed"
    );

    if ctx.operation.policy() == FailurePolicy::LogAndNotify {
        let message = match err {
            ServiceError::Remote { message } => message.clone(),
            ServiceError::NotInitialized
            | ServiceError::Transport(_)
            | ServiceError::InvalidPayload(_) => ctx.fallback_message(),
        };
        notifier.notify_error(&message);
    }
}

fn rejected(ctx: &CallContext, message: Option<String>) -> ServiceError {
    ServiceError::Remote {
        message: message.unwrap_or_else(|| ctx.fallback_message()),
    }
}

// ---------------------------------------------------------------------------
// Normalizers
// ---------------------------------------------------------------------------

/// Result of a lookup by identifier.
///
/// Distinguishes "the backend has no such record" from "the call failed",
/// which [`get_by_id`](crate::service::RecordService::get_by_id) collapses.
#[derive(Debug)]
pub enum Lookup {
    Found(Record),
    NotFound,
    Failed(ServiceError),
}

impl Lookup {
    /// Collapses both non-found arms to `None`.
    #[must_use]
    pub fn into_option(self) -> Option<Record> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound | Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Normalizes a fetch response into its record list. Missing data is empty.
///
/// # Errors
///
/// Returns the transport error unchanged, or [`ServiceError::Remote`] when
/// the envelope reports failure.
pub fn normalize_list(
    ctx: &CallContext,
    response: Result<FetchResponse, ServiceError>,
) -> Result<Vec<Record>, ServiceError> {
    let envelope = response?;
    if !envelope.success {
        return Err(rejected(ctx, envelope.message));
    }
    Ok(envelope.data.unwrap_or_default())
}

/// Normalizes a get-by-id response into a [`Lookup`].
#[must_use]
pub fn normalize_lookup(
    ctx: &CallContext,
    response: Result<RecordResponse, ServiceError>,
) -> Lookup {
    match response {
        Err(err) => Lookup::Failed(err),
        Ok(envelope) if !envelope.success => Lookup::Failed(rejected(ctx, envelope.message)),
        Ok(envelope) => match envelope.data {
            Some(record) if !record.is_empty() => Lookup::Found(record),
            _ => Lookup::NotFound,
        },
    }
}

/// Normalizes a write response into its per-record outcomes. A successful
/// envelope without `results` yields an empty list.
///
/// # Errors
///
/// Returns the transport error unchanged, or [`ServiceError::Remote`] when
/// the batch as a whole was rejected.
pub fn normalize_batch(
    ctx: &CallContext,
    response: Result<BatchResponse, ServiceError>,
) -> Result<Vec<RecordOutcome>, ServiceError> {
    let envelope = response?;
    if !envelope.success {
        return Err(rejected(ctx, envelope.message));
    }
    Ok(envelope.results.unwrap_or_default())
}
