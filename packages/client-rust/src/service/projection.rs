//! Field projection tables.
//!
//! Each resource declares, once, which fields it reads and how lists are
//! ordered. Every query the services issue is derived from these tables so a
//! field read by a caller can never be silently missing from the request.

use serde_json::Value;
use taskdesk_core::record::{CREATED_ON_FIELD, ID_FIELD, NAME_FIELD, TAGS_FIELD};
use taskdesk_core::{coerce_id_value, Operator, OrderBy, QuerySpec};

/// Static projection for one table.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    /// Remote table name.
    pub table: &'static str,
    /// Fields requested on every read, in order.
    pub fields: &'static [&'static str],
    /// Field used for the default ordering (most recent first).
    pub order_field: &'static str,
    /// Field referencing a parent record, if the resource has one.
    pub foreign_key: Option<&'static str>,
}

impl Projection {
    /// Query for `list_all`: every projected field, newest first.
    #[must_use]
    pub fn list_query(&self) -> QuerySpec {
        QuerySpec::project(self.fields.iter().copied()).order(OrderBy::desc(self.order_field))
    }

    /// Query for `get_by_id`: every projected field, no ordering.
    #[must_use]
    pub fn by_id_query(&self) -> QuerySpec {
        QuerySpec::project(self.fields.iter().copied())
    }

    /// Query for `get_by_foreign_key`, or `None` when the resource has no
    /// parent reference. The parent id is coerced to an integer.
    #[must_use]
    pub fn by_parent_query(&self, parent_id: &Value) -> Option<QuerySpec> {
        let fk = self.foreign_key?;
        Some(
            QuerySpec::project(self.fields.iter().copied())
                .filter(fk, Operator::EqualTo, vec![coerce_id_value(parent_id)])
                .order(OrderBy::desc(self.order_field)),
        )
    }
}

/// Tasks table.
pub const TASKS: Projection = Projection {
    table: "task_c",
    fields: &[
        ID_FIELD,
        NAME_FIELD,
        "description_c",
        "priority_c",
        "status_c",
        "completed_at_c",
        CREATED_ON_FIELD,
        TAGS_FIELD,
        "file_attachments_c",
    ],
    order_field: CREATED_ON_FIELD,
    foreign_key: None,
};

/// Files table. Each file belongs to a task through `task_c`.
pub const FILES: Projection = Projection {
    table: "files_c",
    fields: &[
        ID_FIELD,
        NAME_FIELD,
        "file_name_c",
        "file_size_c",
        "upload_date_c",
        "task_c",
        "file_c",
        TAGS_FIELD,
        CREATED_ON_FIELD,
    ],
    order_field: CREATED_ON_FIELD,
    foreign_key: Some("task_c"),
};
