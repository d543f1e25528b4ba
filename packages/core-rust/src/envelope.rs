//! Request batches and response envelopes exchanged with the remote service.
//!
//! Every remote call answers with the same envelope shape:
//! `{success, message?, data?, results?}`. Write calls additionally return a
//! `results` list parallel to the submitted batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{Record, RecordId};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Records submitted together to a create or update call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WriteBatch {
    pub records: Vec<Record>,
}

impl WriteBatch {
    /// A batch holding exactly one record.
    #[must_use]
    pub fn single(record: Record) -> Self {
        Self {
            records: vec![record],
        }
    }
}

/// Identifiers submitted to a delete call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteBatch {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<RecordId>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Field-level validation error attached to a failed record outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Human-readable label of the offending field.
    pub field_label: String,
    /// Error text reported by the backend.
    #[serde(default)]
    pub message: String,
}

/// Outcome of one record within a write batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl RecordOutcome {
    /// A successful outcome carrying the resulting record.
    #[must_use]
    pub fn ok(data: Record) -> Self {
        Self {
            success: true,
            data: Some(data),
            ..Self::default()
        }
    }

    /// A failed outcome with a record-level message and no field errors.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Field errors carried by this outcome, or an empty slice.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        self.errors.as_deref().unwrap_or_default()
    }
}

/// Success/failure envelope returned by every remote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default = "none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub results: Option<Vec<RecordOutcome>>,
}

// `#[serde(default)]` on a generic field would require `T: Default`.
fn none<T>() -> Option<T> {
    None
}

impl<T> Envelope<T> {
    /// Successful envelope carrying `data`.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            results: None,
        }
    }

    /// Successful envelope with no data (e.g. a lookup that matched nothing).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            success: true,
            message: None,
            data: None,
            results: None,
        }
    }

    /// Failed envelope with a batch-level message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            results: None,
        }
    }

    /// Attaches per-record results.
    #[must_use]
    pub fn with_results(mut self, results: Vec<RecordOutcome>) -> Self {
        self.results = Some(results);
        self
    }
}

/// Envelope for fetch calls.
pub type FetchResponse = Envelope<Vec<Record>>;
/// Envelope for get-by-id calls.
pub type RecordResponse = Envelope<Record>;
/// Envelope for create/update/delete calls. `data` is unused by this layer.
pub type BatchResponse = Envelope<Value>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn batch_response_with_mixed_results_deserializes() {
        let raw = json!({
            "success": true,
            "results": [
                {"success": true, "data": {"Id": 3, "Name": "a"}},
                {
                    "success": false,
                    "errors": [{"fieldLabel": "Priority", "message": "is required"}],
                    "message": "validation failed"
                }
            ]
        });

        let env: BatchResponse = serde_json::from_value(raw).unwrap();
        assert!(env.success);
        let results = env.results.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].data.as_ref().unwrap().id(), Some(3));
        assert_eq!(results[1].field_errors()[0].field_label, "Priority");
        assert_eq!(results[1].message.as_deref(), Some("validation failed"));
    }

    #[test]
    fn failure_envelope_has_only_message() {
        let env: FetchResponse = serde_json::from_value(json!({
            "success": false,
            "message": "table not found"
        }))
        .unwrap();
        assert!(!env.success);
        assert!(env.data.is_none());
        assert!(env.results.is_none());
        assert_eq!(env.message.as_deref(), Some("table not found"));
    }

    #[test]
    fn delete_batch_uses_record_ids_key() {
        let batch = DeleteBatch {
            record_ids: vec![4, 5],
        };
        assert_eq!(
            serde_json::to_value(&batch).unwrap(),
            json!({"RecordIds": [4, 5]})
        );
    }

    #[test]
    fn field_errors_empty_when_absent() {
        let outcome = RecordOutcome::failed("nope");
        assert!(outcome.field_errors().is_empty());
    }
}
