//! Page ancestry checks for cycle-safe nesting.
//!
//! # Responsibility
//! - Decide whether one page sits below another in the `parent_page_id`
//!   graph.
//!
//! # Invariants
//! - `is_descendant(p, p)` is `false` for every page.
//! - Pre-existing cycles in corrupt data terminate the walk and answer
//!   `false` instead of looping.

use super::NotebookSnapshot;
use crate::model::notebook::{FolderId, PageId};
use std::collections::HashSet;

/// Returns whether `candidate` is a descendant of `ancestor`.
///
/// Walks `parent_page_id` pointers upward from the candidate's parent. A
/// dangling parent pointer ends the walk as if the chain reached notebook
/// root. Used to veto nest-under operations that would create a cycle.
pub fn is_descendant(snapshot: &NotebookSnapshot, candidate: PageId, ancestor: PageId) -> bool {
    let mut visited = HashSet::new();
    let mut cursor = snapshot
        .page(candidate)
        .and_then(|page| page.parent_page_id);

    while let Some(current) = cursor {
        if current == ancestor {
            return true;
        }
        if !visited.insert(current) {
            return false;
        }
        cursor = snapshot.page(current).and_then(|page| page.parent_page_id);
    }
    false
}

/// Returns the folder a nested page chain effectively lives in.
///
/// Follows `parent_page_id` to the topmost ancestor and returns that page's
/// `folder_id`. A page that is not nested answers its own `folder_id`.
/// Corrupt chains (dangling pointer, cycle) answer `None`, i.e. notebook
/// root.
pub fn effective_folder(snapshot: &NotebookSnapshot, page_id: PageId) -> Option<FolderId> {
    let mut visited = HashSet::new();
    let mut current = snapshot.page(page_id)?;

    while let Some(parent_id) = current.parent_page_id {
        if !visited.insert(parent_id) {
            return None;
        }
        match snapshot.page(parent_id) {
            Some(parent) => current = parent,
            None => return None,
        }
    }
    current.folder_id
}
