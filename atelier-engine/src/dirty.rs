//! Dirty-state tracking against an open-time snapshot.
//!
//! Equality is structural: deep, order-sensitive for arrays and
//! key-set-sensitive for objects, computed over the serialized form so the
//! tracker works for any form-state type that embeds a document. The
//! snapshot is captured once when the session opens; saving does not move
//! it, only an explicit [`DirtyTracker::reset`] does.

use serde::Serialize;
use serde_json::Value;

fn to_value<T: Serialize>(data: &T) -> Value {
    serde_json::to_value(data).unwrap_or(Value::Null)
}

/// Deep structural equality between two serializable values.
pub fn structural_equal<T: Serialize>(a: &T, b: &T) -> bool {
    to_value(a) == to_value(b)
}

/// Count the top-level differences between two values, resolving each
/// candidate difference with deep equality. Arrays count differing index
/// positions plus the length delta; objects count keys whose values differ;
/// differing primitives count as one.
pub fn count_changes(snapshot: &Value, current: &Value) -> usize {
    if snapshot == current {
        return 0;
    }

    match (snapshot, current) {
        (Value::Array(a), Value::Array(b)) => {
            let max_len = a.len().max(b.len());
            let mut count = 0;
            for i in 0..max_len {
                match (a.get(i), b.get(i)) {
                    (Some(x), Some(y)) if x == y => {}
                    _ => count += 1,
                }
            }
            count
        }
        (Value::Object(a), Value::Object(b)) => {
            let mut count = 0;
            for key in a.keys() {
                if a.get(key) != b.get(key) {
                    count += 1;
                }
            }
            for key in b.keys() {
                if !a.contains_key(key) {
                    count += 1;
                }
            }
            count
        }
        _ => 1,
    }
}

/// Tracks whether editor state has diverged from its baseline snapshot.
#[derive(Debug, Clone)]
pub struct DirtyTracker<T> {
    snapshot: T,
    snapshot_value: Value,
}

impl<T: Serialize + Clone> DirtyTracker<T> {
    /// Capture the baseline. Call once, when the editing session opens.
    pub fn new(data: &T) -> Self {
        Self {
            snapshot: data.clone(),
            snapshot_value: to_value(data),
        }
    }

    /// Whether `current` differs structurally from the baseline.
    pub fn is_dirty(&self, current: &T) -> bool {
        self.snapshot_value != to_value(current)
    }

    /// Human-facing magnitude of the divergence from the baseline.
    pub fn change_count(&self, current: &T) -> usize {
        count_changes(&self.snapshot_value, &to_value(current))
    }

    /// A fresh copy of the baseline, for discarding local edits. Never
    /// hands out the snapshot itself.
    pub fn revert(&self) -> T {
        self.snapshot.clone()
    }

    /// The baseline as captured.
    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }

    /// Move the baseline. The only way it changes after capture.
    pub fn reset(&mut self, data: &T) {
        self.snapshot = data.clone();
        self.snapshot_value = to_value(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_edits_means_zero_changes() {
        let value = json!({"blocks": [1, 2, 3], "version": "1.0"});
        assert_eq!(count_changes(&value, &value), 0);
    }

    #[test]
    fn test_array_changes_count_positions_and_length() {
        let a = json!([1, 2, 3]);
        let b = json!([1, 9, 3, 4]);
        // One differing position, one extra element.
        assert_eq!(count_changes(&a, &b), 2);
    }

    #[test]
    fn test_object_changes_count_differing_keys() {
        let a = json!({"title": "old", "published": true, "tags": ["x"]});
        let b = json!({"title": "new", "published": true, "tags": ["x", "y"]});
        assert_eq!(count_changes(&a, &b), 2);
    }

    #[test]
    fn test_object_key_added_and_removed() {
        let a = json!({"kept": 1, "removed": 2});
        let b = json!({"kept": 1, "added": 3});
        assert_eq!(count_changes(&a, &b), 2);
    }

    #[test]
    fn test_primitive_difference_is_one() {
        assert_eq!(count_changes(&json!("a"), &json!("b")), 1);
        assert_eq!(count_changes(&json!(1), &json!({"a": 1})), 1);
    }

    #[test]
    fn test_tracker_dirty_and_revert() {
        let baseline = json!({"title": "page", "count": 1});
        let tracker = DirtyTracker::new(&baseline);

        assert!(!tracker.is_dirty(&baseline));
        assert_eq!(tracker.change_count(&baseline), 0);

        let edited = json!({"title": "page!", "count": 1});
        assert!(tracker.is_dirty(&edited));
        assert_eq!(tracker.change_count(&edited), 1);

        let restored = tracker.revert();
        assert!(!tracker.is_dirty(&restored));
    }

    #[test]
    fn test_reset_moves_baseline() {
        let mut tracker = DirtyTracker::new(&json!({"v": 1}));
        let next = json!({"v": 2});
        assert!(tracker.is_dirty(&next));

        tracker.reset(&next);
        assert!(!tracker.is_dirty(&next));
    }
}
