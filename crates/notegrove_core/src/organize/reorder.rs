//! Sibling reorder sequencing.
//!
//! # Responsibility
//! - Compute the new explicit id ordering for a sibling group after one
//!   item is dropped onto another.
//!
//! # Invariants
//! - The output contains exactly the input ids; only order changes.
//! - Moving forward in index order lands the source after the target,
//!   moving backward lands it before (a stable array move).

use uuid::Uuid;

/// Moves `source_id` next to `target_id` within `group`.
///
/// Returns `None` when either id is absent from the group. The returned
/// list's index becomes each item's new dense 0-based position.
pub fn reorder(group: &[Uuid], source_id: Uuid, target_id: Uuid) -> Option<Vec<Uuid>> {
    let from = group.iter().position(|id| *id == source_id)?;
    let to = group.iter().position(|id| *id == target_id)?;

    let mut ids = group.to_vec();
    if from == to {
        return Some(ids);
    }

    // Removing first shifts the target index such that a plain insert at
    // `to` lands after the target when moving forward and before it when
    // moving backward.
    let moved = ids.remove(from);
    ids.insert(to, moved);
    Some(ids)
}
