//! In-process record backend.
//!
//! Used by tests and by the CLI's `--memory` mode. Honors projection,
//! filters and ordering, assigns auto-increment ids and `CreatedOn`, and can
//! be told to fail calls on a table or to reject records missing required
//! fields.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use taskdesk_core::record::{CREATED_ON_FIELD, ID_FIELD};
use taskdesk_core::{
    BatchResponse, Condition, DeleteBatch, Envelope, FetchResponse, FieldError, Operator,
    QuerySpec, Record, RecordId, RecordOutcome, RecordResponse, RemoteClient, SortType,
    WriteBatch,
};

use crate::clock::{Clock, SystemClock};

/// A failure to inject into the next call on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The call itself fails (network-style error).
    Transport(String),
    /// The backend answers `success: false` with this message.
    Reject(String),
}

#[derive(Debug, Default)]
struct Table {
    next_id: RecordId,
    rows: BTreeMap<RecordId, Record>,
}

/// [`RemoteClient`] holding every table in memory.
pub struct MemoryRecordClient {
    tables: DashMap<String, Table>,
    faults: Mutex<HashMap<String, VecDeque<Fault>>>,
    required: DashMap<String, Vec<String>>,
    clock: Arc<dyn Clock>,
}

impl MemoryRecordClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: DashMap::new(),
            faults: Mutex::new(HashMap::new()),
            required: DashMap::new(),
            clock,
        }
    }

    /// Makes the next call on `table` fail with `fault`. Queued faults are
    /// consumed one per call, in order.
    pub fn fail_next(&self, table: &str, fault: Fault) {
        self.faults
            .lock()
            .entry(table.to_string())
            .or_default()
            .push_back(fault);
    }

    /// Rejects created records of `table` whose `fields` are missing or empty.
    pub fn require_fields(&self, table: &str, fields: &[&str]) {
        self.required.insert(
            table.to_string(),
            fields.iter().map(|f| (*f).to_string()).collect(),
        );
    }

    /// Inserts `record` as stored, bypassing validation. Returns its id.
    pub fn seed(&self, table: &str, record: Record) -> RecordId {
        let mut entry = self.tables.entry(table.to_string()).or_default();
        self.store(&mut entry, record)
    }

    /// Number of stored rows in `table`.
    #[must_use]
    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, |t| t.rows.len())
    }

    fn store(&self, table: &mut Table, mut record: Record) -> RecordId {
        table.next_id += 1;
        let id = table.next_id;
        record.set(ID_FIELD, id);
        if !record.has(CREATED_ON_FIELD) {
            record.set(CREATED_ON_FIELD, self.clock.now_iso());
        }
        table.rows.insert(id, record);
        id
    }

    fn take_fault<T>(&self, table: &str) -> Option<anyhow::Result<Envelope<T>>> {
        let fault = self.faults.lock().get_mut(table)?.pop_front()?;
        tracing::debug!(table, ?fault, "injected fault");
        Some(match fault {
            Fault::Transport(message) => Err(anyhow::anyhow!(message)),
            Fault::Reject(message) => Ok(Envelope::failure(message)),
        })
    }

    fn missing_fields(&self, table: &str, record: &Record) -> Vec<FieldError> {
        let Some(required) = self.required.get(table) else {
            return Vec::new();
        };
        required
            .iter()
            .filter(|field| match record.get(field.as_str()) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(_) => false,
            })
            .map(|field| FieldError {
                field_label: field.clone(),
                message: "is required".to_string(),
            })
            .collect()
    }
}

impl Default for MemoryRecordClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryRecordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRecordClient")
            .field("tables", &self.tables.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Query evaluation
// ---------------------------------------------------------------------------

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}

fn matches(record: &Record, condition: &Condition) -> bool {
    let actual = record.get(&condition.field_name).unwrap_or(&Value::Null);
    let values = &condition.values;
    let cmp = |v: &Value| compare(actual, v);
    let hit = match condition.operator {
        Operator::EqualTo => values.iter().any(|v| cmp(v).is_eq()),
        Operator::NotEqualTo => values.iter().all(|v| cmp(v).is_ne()),
        Operator::Contains => {
            !actual.is_null() && values.iter().any(|v| text(actual).contains(&text(v)))
        }
        Operator::GreaterThan => values.iter().any(|v| cmp(v).is_gt()),
        Operator::LessThan => !actual.is_null() && values.iter().any(|v| cmp(v).is_lt()),
    };
    hit == condition.include
}

fn project(record: &Record, query: &QuerySpec) -> Record {
    if query.fields.is_empty() {
        return record.clone();
    }
    query
        .fields
        .iter()
        .filter_map(|d| record.get(d.name()).map(|v| (d.name(), v.clone())))
        .collect()
}

fn select(table: &Table, query: &QuerySpec) -> Vec<Record> {
    let mut rows: Vec<&Record> = table
        .rows
        .values()
        .filter(|row| query.r#where.iter().all(|c| matches(row, c)))
        .collect();

    let newest_first = query
        .order_by
        .first()
        .is_some_and(|o| o.sort_type == SortType::Desc);
    rows.sort_by(|a, b| {
        query
            .order_by
            .iter()
            .map(|o| {
                let ord = compare(
                    a.get(&o.field_name).unwrap_or(&Value::Null),
                    b.get(&o.field_name).unwrap_or(&Value::Null),
                );
                match o.sort_type {
                    SortType::Asc => ord,
                    SortType::Desc => ord.reverse(),
                }
            })
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| {
                let by_id = a.id().cmp(&b.id());
                if newest_first {
                    by_id.reverse()
                } else {
                    by_id
                }
            })
    });

    rows.into_iter().map(|row| project(row, query)).collect()
}

// ---------------------------------------------------------------------------
// RemoteClient
// ---------------------------------------------------------------------------

#[async_trait]
impl RemoteClient for MemoryRecordClient {
    async fn fetch_records(&self, table: &str, query: &QuerySpec) -> anyhow::Result<FetchResponse> {
        if let Some(fault) = self.take_fault(table) {
            return fault;
        }
        let rows = self
            .tables
            .get(table)
            .map(|t| select(&t, query))
            .unwrap_or_default();
        Ok(Envelope::ok(rows))
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        query: &QuerySpec,
    ) -> anyhow::Result<RecordResponse> {
        if let Some(fault) = self.take_fault(table) {
            return fault;
        }
        let row = self
            .tables
            .get(table)
            .and_then(|t| t.rows.get(&id).map(|row| project(row, query)));
        Ok(row.map_or_else(Envelope::empty, Envelope::ok))
    }

    async fn create_record(
        &self,
        table: &str,
        batch: &WriteBatch,
    ) -> anyhow::Result<BatchResponse> {
        if let Some(fault) = self.take_fault(table) {
            return fault;
        }
        let mut entry = self.tables.entry(table.to_string()).or_default();
        let results = batch
            .records
            .iter()
            .map(|record| {
                let errors = self.missing_fields(table, record);
                if !errors.is_empty() {
                    return RecordOutcome {
                        success: false,
                        data: None,
                        errors: Some(errors),
                        message: Some("Record validation failed".to_string()),
                    };
                }
                let mut stored = record.clone();
                stored.remove(CREATED_ON_FIELD);
                let id = self.store(&mut entry, stored);
                RecordOutcome::ok(entry.rows[&id].clone())
            })
            .collect();
        Ok(Envelope::empty().with_results(results))
    }

    async fn update_record(
        &self,
        table: &str,
        batch: &WriteBatch,
    ) -> anyhow::Result<BatchResponse> {
        if let Some(fault) = self.take_fault(table) {
            return fault;
        }
        let mut entry = self.tables.entry(table.to_string()).or_default();
        let results = batch
            .records
            .iter()
            .map(|record| {
                let Some(id) = record.id() else {
                    return RecordOutcome::failed("Record Id is required");
                };
                let Some(row) = entry.rows.get_mut(&id) else {
                    return RecordOutcome::failed("Record not found");
                };
                for (field, value) in record.as_map() {
                    if field != ID_FIELD && field != CREATED_ON_FIELD {
                        row.set(field.as_str(), value.clone());
                    }
                }
                RecordOutcome::ok(row.clone())
            })
            .collect();
        Ok(Envelope::empty().with_results(results))
    }

    async fn delete_record(
        &self,
        table: &str,
        batch: &DeleteBatch,
    ) -> anyhow::Result<BatchResponse> {
        if let Some(fault) = self.take_fault(table) {
            return fault;
        }
        let mut entry = self.tables.entry(table.to_string()).or_default();
        let results = batch
            .record_ids
            .iter()
            .map(|id| match entry.rows.remove(id) {
                Some(_) => RecordOutcome {
                    success: true,
                    ..RecordOutcome::default()
                },
                None => RecordOutcome::failed("Record not found"),
            })
            .collect();
        Ok(Envelope::empty().with_results(results))
    }
}
