//! Drop target classification over a single drag gesture.
//!
//! # Responsibility
//! - Track the drag state machine: `idle` -> `dragging` -> `dragging-over`
//!   -> terminal drop or cancel.
//! - Classify the raw pointer-over payload into one semantic drop target,
//!   first match wins: section zone, page, folder, root zone, none.
//!
//! # Invariants
//! - A gesture is well-formed: one `begin`, zero or more `hover` updates,
//!   ending in exactly one `take_drop` or `cancel`.
//! - The archive folder is never accepted as a drag source.
//! - A page target is vetoed when it is the source itself or a descendant
//!   of the source.
//! - Classification never mutates the snapshot; the auto-expand side effect
//!   is reported to the caller, who owns the expanded set.

use super::ancestry::is_descendant;
use super::NotebookSnapshot;
use crate::model::notebook::{FolderId, PageId, SectionId};
use log::debug;
use uuid::Uuid;

/// The item a drag gesture carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSource {
    /// A folder row is being dragged.
    Folder(FolderId),
    /// A page row is being dragged.
    Page(PageId),
}

impl DragSource {
    /// The dragged record's id.
    pub fn id(&self) -> Uuid {
        match self {
            Self::Folder(id) => *id,
            Self::Page(id) => *id,
        }
    }
}

/// Raw drop-zone payload under the pointer, decided once per hover by the
/// presentation layer and passed through the classifier unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropHint {
    /// An explicit section drop zone; `None` is the unsorted zone.
    Section(Option<SectionId>),
    /// Hovering another page row.
    Page(PageId),
    /// Hovering a folder row.
    Folder(FolderId),
    /// The sentinel root zone.
    Root,
}

/// Classified semantic drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Reassign the source's section; `None` clears it.
    Section(Option<SectionId>),
    /// Nest under or reorder against this page.
    Page(PageId),
    /// Reparent into this folder.
    Folder(FolderId),
    /// Detach toward notebook root.
    Root,
}

/// Result of classifying one hover update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    /// The semantic target, `None` when nothing under the pointer accepts
    /// this source.
    pub target: Option<DropTarget>,
    /// Container to mark expanded so the drop destination stays visible.
    /// Expansion is applied by the caller and persists after the drop.
    pub expand: Option<Uuid>,
}

/// Drag gesture phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Gesture started, pointer not over any accepting zone.
    Dragging { source: DragSource },
    /// Gesture started, pointer over a classified target.
    DraggingOver {
        source: DragSource,
        target: DropTarget,
    },
}

/// Classifies one raw hover payload for the given source.
///
/// Precedence is fixed: an explicit section zone wins, then a page (unless
/// it is the source or one of its descendants), then a folder, then the
/// root zone. Unknown ids classify as no target.
pub fn classify(
    snapshot: &NotebookSnapshot,
    source: DragSource,
    hint: DropHint,
) -> Classification {
    match hint {
        DropHint::Section(section_id) => {
            if let Some(id) = section_id {
                if !snapshot.has_section(id) {
                    return Classification::default();
                }
            }
            Classification {
                target: Some(DropTarget::Section(section_id)),
                expand: None,
            }
        }
        DropHint::Page(target_id) => classify_page_hover(snapshot, source, target_id),
        DropHint::Folder(folder_id) => {
            if snapshot.folder(folder_id).is_none() {
                return Classification::default();
            }
            Classification {
                target: Some(DropTarget::Folder(folder_id)),
                expand: Some(folder_id),
            }
        }
        DropHint::Root => Classification {
            target: Some(DropTarget::Root),
            expand: None,
        },
    }
}

fn classify_page_hover(
    snapshot: &NotebookSnapshot,
    source: DragSource,
    target_id: PageId,
) -> Classification {
    let Some(target) = snapshot.page(target_id) else {
        return Classification::default();
    };

    let expand = match source {
        DragSource::Page(source_id) => {
            if source_id == target_id || is_descendant(snapshot, target_id, source_id) {
                return Classification::default();
            }
            let source_page = snapshot.page(source_id);
            let same_container = source_page.is_some_and(|page| {
                page.folder_id == target.folder_id
                    && page.parent_page_id == target.parent_page_id
            });
            // Only a nest destination needs to open up; a sibling reorder
            // keeps the group as it is.
            if same_container {
                None
            } else {
                Some(target_id)
            }
        }
        DragSource::Folder(_) => None,
    };

    Classification {
        target: Some(DropTarget::Page(target_id)),
        expand,
    }
}

/// State machine for one drag gesture.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    /// Creates an idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current gesture phase.
    pub fn state(&self) -> DragState {
        self.state
    }

    /// Starts a gesture for `source`.
    ///
    /// Returns `false` without changing state when a gesture is already in
    /// progress, the source id is unknown, or the source is the archive
    /// folder. Rejection is silent toward the user; exploratory drags are
    /// not errors.
    pub fn begin(&mut self, snapshot: &NotebookSnapshot, source: DragSource) -> bool {
        if !matches!(self.state, DragState::Idle) {
            debug!(
                "event=drag_begin module=organize status=rejected reason=gesture_active source={}",
                source.id()
            );
            return false;
        }

        let accepted = match source {
            DragSource::Folder(id) => snapshot
                .folder(id)
                .is_some_and(|folder| !folder.is_archive()),
            DragSource::Page(id) => snapshot.page(id).is_some(),
        };
        if !accepted {
            debug!(
                "event=drag_begin module=organize status=rejected reason=invalid_source source={}",
                source.id()
            );
            return false;
        }

        self.state = DragState::Dragging { source };
        true
    }

    /// Re-classifies on pointer movement.
    ///
    /// `None` means the pointer left every registered drop zone. Returns the
    /// classification so the caller can render highlights and apply the
    /// expand side effect. A no-op while idle.
    pub fn hover(
        &mut self,
        snapshot: &NotebookSnapshot,
        hint: Option<DropHint>,
    ) -> Classification {
        let source = match self.state {
            DragState::Idle => return Classification::default(),
            DragState::Dragging { source } | DragState::DraggingOver { source, .. } => source,
        };

        let classification = match hint {
            Some(hint) => classify(snapshot, source, hint),
            None => Classification::default(),
        };

        self.state = match classification.target {
            Some(target) => DragState::DraggingOver { source, target },
            None => DragState::Dragging { source },
        };
        classification
    }

    /// Ends the gesture, handing off the source/target pair exactly once.
    ///
    /// Returns `None` when no valid target was under the pointer; either way
    /// the controller returns to idle.
    pub fn take_drop(&mut self) -> Option<(DragSource, DropTarget)> {
        let result = match self.state {
            DragState::DraggingOver { source, target } => Some((source, target)),
            DragState::Idle | DragState::Dragging { .. } => None,
        };
        self.state = DragState::Idle;
        result
    }

    /// Aborts the gesture with no effect.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}
