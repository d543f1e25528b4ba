//! Existing-files snapshots handed to the upload widget.
//!
//! A snapshot is an ordered list of file entries. Entries coming straight from
//! the record service are in *API format* (they carry an `Id`); entries the
//! widget produced itself are in *UI format* (no `Id`). The widget only accepts
//! UI format, so API entries are converted before every hand-off.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of an existing-files snapshot (a JSON object).
pub type FileEntry = Value;

/// Key mapping applied by [`to_ui_format`]: API key -> UI key.
const API_TO_UI_KEYS: &[(&str, &str)] = &[
    ("Id", "id"),
    ("Name", "name"),
    ("Size", "size"),
    ("Type", "type"),
    ("Url", "url"),
];

/// Detected format of a snapshot, decided by its first element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// No entries.
    Empty,
    /// First entry carries an `Id` key.
    Api,
    /// First entry has no `Id` key.
    Ui,
}

/// Detects whether `files` is in API or UI format.
#[must_use]
pub fn detect_format(files: &[FileEntry]) -> SnapshotFormat {
    match files.first() {
        None => SnapshotFormat::Empty,
        Some(first) if first.get("Id").is_some() => SnapshotFormat::Api,
        Some(_) => SnapshotFormat::Ui,
    }
}

/// Identifier of the first entry (`Id`, falling back to `id`).
#[must_use]
pub fn first_identifier(files: &[FileEntry]) -> Option<&Value> {
    let first = files.first()?;
    first
        .get("Id")
        .filter(|v| !v.is_null())
        .or_else(|| first.get("id").filter(|v| !v.is_null()))
}

/// Converts API-format entries to UI format.
///
/// Entries without an `Id` are returned unchanged, so converting an
/// already-converted list is a no-op.
#[must_use]
pub fn to_ui_format(files: &[FileEntry]) -> Vec<FileEntry> {
    files.iter().map(entry_to_ui).collect()
}

fn entry_to_ui(entry: &FileEntry) -> FileEntry {
    let Some(object) = entry.as_object() else {
        return entry.clone();
    };
    if !object.contains_key("Id") {
        return entry.clone();
    }

    let mut converted = Map::with_capacity(object.len());
    for (key, value) in object {
        let ui_key = API_TO_UI_KEYS
            .iter()
            .find(|(api, _)| *api == key.as_str())
            .map_or(key.as_str(), |(_, ui)| *ui);
        converted.insert(ui_key.to_string(), value.clone());
    }
    Value::Object(converted)
}

/// Identity-defining configuration of a mounted file field.
///
/// Changing `field_key`, `field_name` or `table_name` forces a remount; any
/// other option travels in `options` and does not.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    pub field_key: String,
    pub field_name: String,
    pub table_name: String,
    /// Extra widget options passed through verbatim.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl FieldConfig {
    #[must_use]
    pub fn new(
        field_key: impl Into<String>,
        field_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            field_key: field_key.into(),
            field_name: field_name.into(),
            table_name: table_name.into(),
            options: Map::new(),
        }
    }

    /// Returns `true` when a change from `self` to `other` requires a remount.
    #[must_use]
    pub fn identity_differs(&self, other: &Self) -> bool {
        self.field_key != other.field_key
            || self.field_name != other.field_name
            || self.table_name != other.table_name
    }
}

/// Configuration passed to the widget's `mount` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountConfig {
    #[serde(flatten)]
    pub field: FieldConfig,
    pub existing_files: Vec<FileEntry>,
}
