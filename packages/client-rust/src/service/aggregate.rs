//! Batch result aggregation.
//!
//! Splits the per-record outcomes of a write batch into succeeded and failed
//! subsets and reports every failure to the user. Never retries.

use taskdesk_core::{Notifier, Record, RecordOutcome};

use super::normalize::CallContext;

/// Outcomes of one write batch, split by success.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub succeeded: Vec<RecordOutcome>,
    pub failed: Vec<RecordOutcome>,
}

impl BatchOutcome {
    /// Returns `true` if at least one record succeeded.
    #[must_use]
    pub fn any_succeeded(&self) -> bool {
        !self.succeeded.is_empty()
    }

    /// Data of the first succeeded record, if any.
    #[must_use]
    pub fn into_first_data(self) -> Option<Record> {
        self.succeeded
            .into_iter()
            .next()
            .and_then(|outcome| outcome.data)
    }
}

/// Classifies `results` and notifies the user about each failure.
///
/// Every failed element produces one notification per field error, formatted
/// `"<field label>: <error message>"`, plus one for its record-level message.
pub fn aggregate(
    results: Vec<RecordOutcome>,
    ctx: &CallContext,
    notifier: &dyn Notifier,
) -> BatchOutcome {
    let (succeeded, failed): (Vec<_>, Vec<_>) =
        results.into_iter().partition(|outcome| outcome.success);

    if !failed.is_empty() {
        tracing::error!(
            table = ctx.table,
            operation = ctx.operation.name(),
            record_id = ctx.record_id,
            failed = failed.len(),
            succeeded = succeeded.len(),
            "partial batch failure"
        );

        for outcome in &failed {
            for error in outcome.field_errors() {
                notifier.notify_error(&format!("{}: {}", error.field_label, error.message));
            }
            if let Some(message) = &outcome.message {
                notifier.notify_error(message);
            }
        }
    }

    BatchOutcome { succeeded, failed }
}
