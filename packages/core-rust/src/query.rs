//! Query specifications sent to the remote record service.
//!
//! Field names in the serialized form follow the backend's wire format
//! exactly (`FieldName`, `sorttype`, ...), which is why the serde renames
//! below are per-field rather than a blanket `rename_all`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Comparison operator for a `where` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    Contains,
    GreaterThan,
    LessThan,
}

/// Sort direction for an `orderBy` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortType {
    Asc,
    Desc,
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// Field reference inside a [`FieldDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    #[serde(rename = "Name")]
    pub name: String,
}

/// One projected field: `{"field": {"Name": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub field: FieldRef,
}

impl FieldDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            field: FieldRef { name: name.into() },
        }
    }

    /// Name of the projected field.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.field.name
    }
}

/// A single filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "FieldName")]
    pub field_name: String,
    #[serde(rename = "Operator")]
    pub operator: Operator,
    #[serde(rename = "Values")]
    pub values: Vec<Value>,
    /// `false` inverts the match.
    #[serde(rename = "Include")]
    pub include: bool,
}

/// A single ordering clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    #[serde(rename = "sorttype")]
    pub sort_type: SortType,
}

impl OrderBy {
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field_name: field.into(),
            sort_type: SortType::Desc,
        }
    }

    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field_name: field.into(),
            sort_type: SortType::Asc,
        }
    }
}

/// Projection, filter and ordering for a fetch or get call.
///
/// Every field the caller later reads must appear in `fields`; anything not
/// projected comes back absent rather than as an error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuerySpec {
    pub fields: Vec<FieldDescriptor>,
    /// `where` is a Rust keyword, so the field uses raw identifier syntax.
    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty", default)]
    pub r#where: Vec<Condition>,
    #[serde(rename = "orderBy", skip_serializing_if = "Vec::is_empty", default)]
    pub order_by: Vec<OrderBy>,
}

impl QuerySpec {
    /// Projects the given field names in order.
    #[must_use]
    pub fn project<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(FieldDescriptor::new).collect(),
            ..Self::default()
        }
    }

    /// Appends an including `field <op> values` condition.
    #[must_use]
    pub fn filter(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        values: Vec<Value>,
    ) -> Self {
        self.r#where.push(Condition {
            field_name: field.into(),
            operator,
            values,
            include: true,
        });
        self
    }

    /// Appends an ordering clause.
    #[must_use]
    pub fn order(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Returns `true` if `field` is projected.
    #[must_use]
    pub fn projects(&self, field: &str) -> bool {
        self.fields.iter().any(|d| d.name() == field)
    }
}
