//! Field alias resolution.
//!
//! Older callers spell some fields with a short legacy name (`title`) while
//! the backend uses the canonical suffixed name (`Name`, `description_c`).
//! The alias table is consulted once, at the service boundary, and the
//! canonical spelling always wins when both are supplied.

use serde_json::Value;
use taskdesk_core::Record;

/// Canonical field name and its accepted legacy spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAlias {
    pub canonical: &'static str,
    pub legacy: Option<&'static str>,
}

impl FieldAlias {
    #[must_use]
    pub const fn new(canonical: &'static str, legacy: &'static str) -> Self {
        Self {
            canonical,
            legacy: Some(legacy),
        }
    }

    /// A field with no legacy spelling.
    #[must_use]
    pub const fn canonical(canonical: &'static str) -> Self {
        Self {
            canonical,
            legacy: None,
        }
    }

    /// Looks the field up in `input`: the canonical name if present and not
    /// null, otherwise the legacy name under the same rule.
    #[must_use]
    pub fn lookup<'a>(&self, input: &'a Record) -> Option<&'a Value> {
        let present = |name: &str| input.get(name).filter(|v| !v.is_null());
        present(self.canonical).or_else(|| self.legacy.and_then(present))
    }
}

/// Builds a payload holding only the aliased fields present in `input`, keyed
/// by canonical name. Fields not listed in `table` are dropped.
#[must_use]
pub fn resolve(input: &Record, table: &[FieldAlias]) -> Record {
    let mut out = Record::new();
    for alias in table {
        if let Some(value) = alias.lookup(input) {
            out.set(alias.canonical, value.clone());
        }
    }
    out
}
