//! Drop resolution: classified target + dragged item -> one mutation intent.
//!
//! # Responsibility
//! - Map a completed drop onto exactly one persistence intent, or none.
//! - Disambiguate the reorder-vs-nest gesture: dropping onto a sibling
//!   reorders, dropping onto a non-sibling nests. Current containment is
//!   the only tiebreak; this split is deliberate and must not change.
//!
//! # Invariants
//! - At most one intent per completed drop, even when several record fields
//!   change (nesting clears `folder_id` within the same call).
//! - Cycle attempts, self-drops and same-section drops resolve to `None`.
//! - Folders resolve only against section targets; folder reparenting by
//!   drag is unsupported.

use super::ancestry::is_descendant;
use super::drag::{DragSource, DropTarget};
use super::index::TreeIndex;
use super::reorder::reorder;
use super::NotebookSnapshot;
use crate::model::notebook::{FolderId, Page, PageId, SectionId};
use uuid::Uuid;

/// One persistence mutation, expressed as data and applied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    /// Reassign a folder's section; no position change.
    SetFolderSection {
        folder_id: FolderId,
        section_id: Option<SectionId>,
    },
    /// Reassign a page's section; no position change.
    SetPageSection {
        page_id: PageId,
        section_id: Option<SectionId>,
    },
    /// Move a page directly into a folder (`None` = notebook root),
    /// clearing any parent page.
    MovePageToFolder {
        page_id: PageId,
        folder_id: Option<FolderId>,
    },
    /// Nest a page under a parent page (`None` detaches it), clearing or
    /// reassigning `folder_id` as part of the same call.
    MovePageToParent {
        page_id: PageId,
        parent_page_id: Option<PageId>,
    },
    /// Rewrite positions for one page sibling group.
    ReorderPages {
        folder_id: Option<FolderId>,
        ordered_page_ids: Vec<PageId>,
    },
    /// Rewrite positions for one folder sibling group.
    ReorderFolders {
        parent_id: Option<FolderId>,
        ordered_folder_ids: Vec<FolderId>,
    },
}

impl MutationIntent {
    /// Ids that must be treated as transiently locked while this intent's
    /// persistence call is outstanding.
    pub fn touched_ids(&self) -> Vec<Uuid> {
        match self {
            Self::SetFolderSection { folder_id, .. } => vec![*folder_id],
            Self::SetPageSection { page_id, .. } => vec![*page_id],
            Self::MovePageToFolder { page_id, folder_id } => {
                let mut ids = vec![*page_id];
                ids.extend(folder_id.iter().copied());
                ids
            }
            Self::MovePageToParent {
                page_id,
                parent_page_id,
            } => {
                let mut ids = vec![*page_id];
                ids.extend(parent_page_id.iter().copied());
                ids
            }
            Self::ReorderPages {
                ordered_page_ids, ..
            } => ordered_page_ids.clone(),
            Self::ReorderFolders {
                ordered_folder_ids, ..
            } => ordered_folder_ids.clone(),
        }
    }
}

/// Resolves a completed drop into at most one mutation intent.
///
/// `None` is the silent structural no-op of exploratory dragging: self
/// drops, cycle attempts, already-satisfied moves and unsupported pairs.
pub fn resolve(
    snapshot: &NotebookSnapshot,
    index: &TreeIndex,
    source: DragSource,
    target: DropTarget,
) -> Option<MutationIntent> {
    match (source, target) {
        (DragSource::Folder(folder_id), DropTarget::Section(section_id)) => {
            let folder = snapshot.folder(folder_id)?;
            if folder.section_id == section_id {
                return None;
            }
            Some(MutationIntent::SetFolderSection {
                folder_id,
                section_id,
            })
        }
        (DragSource::Page(page_id), DropTarget::Section(section_id)) => {
            let page = snapshot.page(page_id)?;
            if page.section_id == section_id {
                return None;
            }
            Some(MutationIntent::SetPageSection {
                page_id,
                section_id,
            })
        }
        (DragSource::Page(page_id), DropTarget::Page(target_id)) => {
            resolve_page_on_page(snapshot, index, page_id, target_id)
        }
        (DragSource::Page(page_id), DropTarget::Folder(folder_id)) => {
            let page = snapshot.page(page_id)?;
            snapshot.folder(folder_id)?;
            if page.parent_page_id.is_none() && page.folder_id == Some(folder_id) {
                return None;
            }
            // One call detaches from any parent page and reparents.
            Some(MutationIntent::MovePageToFolder {
                page_id,
                folder_id: Some(folder_id),
            })
        }
        (DragSource::Page(page_id), DropTarget::Root) => {
            let page = snapshot.page(page_id)?;
            if page.is_nested() {
                return Some(MutationIntent::MovePageToParent {
                    page_id,
                    parent_page_id: None,
                });
            }
            if page.folder_id.is_none() {
                return None;
            }
            Some(MutationIntent::MovePageToFolder {
                page_id,
                folder_id: None,
            })
        }
        // Folders are not reparented or nested by drag in this design.
        (DragSource::Folder(_), _) => None,
    }
}

fn resolve_page_on_page(
    snapshot: &NotebookSnapshot,
    index: &TreeIndex,
    source_id: PageId,
    target_id: PageId,
) -> Option<MutationIntent> {
    if source_id == target_id {
        return None;
    }
    let source = snapshot.page(source_id)?;
    let target = snapshot.page(target_id)?;

    if same_container(source, target) {
        let group = index.page_siblings(source);
        let ordered_page_ids = reorder(group, source_id, target_id)?;
        return Some(MutationIntent::ReorderPages {
            folder_id: source.folder_id,
            ordered_page_ids,
        });
    }

    if is_descendant(snapshot, target_id, source_id) {
        return None;
    }

    Some(MutationIntent::MovePageToParent {
        page_id: source_id,
        parent_page_id: Some(target_id),
    })
}

fn same_container(source: &Page, target: &Page) -> bool {
    source.folder_id == target.folder_id && source.parent_page_id == target.parent_page_id
}
