//! Existing-files snapshot memoization.
//!
//! The caller may hand the bridge a fresh copy of the same list on every
//! render. A snapshot with the same length and the same first identifier as
//! the last synced one is treated as unchanged, so only real edits reach the
//! widget.

use taskdesk_core::files::first_identifier;
use taskdesk_core::FileEntry;

/// Returns the snapshot the bridge should work with for `incoming`.
///
/// Empty input maps to an empty snapshot. Input matching `last_synced` in
/// length and first identifier maps to `last_synced` itself.
#[must_use]
pub fn memoize(last_synced: &[FileEntry], incoming: &[FileEntry]) -> Vec<FileEntry> {
    if incoming.is_empty() {
        return Vec::new();
    }
    if last_synced.len() == incoming.len()
        && first_identifier(last_synced) == first_identifier(incoming)
    {
        return last_synced.to_vec();
    }
    incoming.to_vec()
}

/// `true` when `snapshot` differs structurally from `last_synced`.
///
/// Object key order does not matter.
#[must_use]
pub fn needs_sync(last_synced: &[FileEntry], snapshot: &[FileEntry]) -> bool {
    last_synced != snapshot
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn empty_input_is_empty() {
        let last = vec![json!({"Id": 1})];
        assert!(memoize(&last, &[]).is_empty());
    }

    #[test]
    fn same_shape_reuses_last_synced() {
        let last = vec![json!({"Id": 1, "Name": "a"}), json!({"Id": 2})];
        let incoming = vec![json!({"Id": 1, "Name": "renamed"}), json!({"Id": 9})];
        assert_eq!(memoize(&last, &incoming), last);
    }

    #[test]
    fn lowercase_id_is_an_identifier_too() {
        let last = vec![json!({"id": "x"})];
        assert_eq!(memoize(&last, &[json!({"id": "x", "name": "b"})]), last);
        assert_ne!(memoize(&last, &[json!({"id": "y"})]), last);
    }

    #[test]
    fn different_length_or_first_id_is_new() {
        let last = vec![json!({"Id": 1})];
        let longer = vec![json!({"Id": 1}), json!({"Id": 2})];
        assert_eq!(memoize(&last, &longer), longer);
        let other_first = vec![json!({"Id": 5})];
        assert_eq!(memoize(&last, &other_first), other_first);
    }

    #[test]
    fn key_order_does_not_force_sync() {
        let a: Value = serde_json::from_str(r#"{"Id":1,"Name":"a"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"Name":"a","Id":1}"#).unwrap();
        assert!(!needs_sync(&[a], &[b]));
    }

    fn entry(id: i64, name: &str) -> Value {
        json!({"Id": id, "Name": name})
    }

    proptest! {
        #[test]
        fn same_length_and_first_id_never_syncs(
            first_id in 0i64..1_000,
            last_names in prop::collection::vec("[a-z]{0,6}", 1..8),
            seed in prop::collection::vec(("[a-z]{0,6}", 0i64..1_000), 0..8),
        ) {
            let last: Vec<Value> = last_names
                .iter()
                .enumerate()
                .map(|(i, name)| entry(if i == 0 { first_id } else { i as i64 }, name))
                .collect();

            let mut incoming = vec![entry(first_id, "changed")];
            incoming.extend(
                seed.iter()
                    .cycle()
                    .take(last.len() - 1)
                    .map(|(name, id)| entry(*id, name)),
            );
            if incoming.len() < last.len() {
                incoming.resize(last.len(), json!({"Id": -1}));
            }

            let snapshot = memoize(&last, &incoming);
            prop_assert!(!needs_sync(&last, &snapshot));
        }
    }
}
