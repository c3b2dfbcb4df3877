//! Notebook organization use-case service.
//!
//! # Responsibility
//! - Own the single writable copy of notebook state: snapshot, view filter,
//!   expanded-container set, drag gesture and transient locks.
//! - Map each resolved drop onto exactly one repository call and reconcile
//!   the snapshot from storage afterwards.
//!
//! # Invariants
//! - The snapshot is refreshed only after a successful repository call; a
//!   failed call leaves the pre-mutation tree visible.
//! - While a mutation is outstanding, its touched items are locked: a new
//!   gesture sourcing or targeting them is refused.
//! - Structural rejections (cycle, self-drop, archive source) stay silent.

use crate::model::notebook::{Folder, FolderId, NotebookId, Page, PageId, Section};
use crate::organize::drag::{DragController, DragSource, DragState, DropHint, DropTarget};
use crate::organize::index::{SectionFilter, TreeIndex, ViewFilter};
use crate::organize::resolve::{resolve, MutationIntent};
use crate::organize::NotebookSnapshot;
use crate::repo::notebook_repo::{NotebookRepoError, NotebookRepository};
use log::{debug, error, info};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from organizer service operations.
#[derive(Debug)]
pub enum OrganizerServiceError {
    /// Persistence-layer failure; the in-memory tree is unchanged.
    Repo(NotebookRepoError),
}

impl Display for OrganizerServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OrganizerServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<NotebookRepoError> for OrganizerServiceError {
    fn from(value: NotebookRepoError) -> Self {
        Self::Repo(value)
    }
}

/// Organizer service facade over one notebook.
pub struct OrganizerService<R: NotebookRepository> {
    repo: R,
    notebook_id: NotebookId,
    snapshot: NotebookSnapshot,
    filter: ViewFilter,
    index: TreeIndex,
    drag: DragController,
    expanded: HashSet<Uuid>,
    in_flight: HashSet<Uuid>,
}

impl<R: NotebookRepository> OrganizerService<R> {
    /// Creates a service and loads the initial snapshot.
    pub fn new(repo: R, notebook_id: NotebookId) -> Result<Self, OrganizerServiceError> {
        let mut service = Self {
            repo,
            notebook_id,
            snapshot: NotebookSnapshot::default(),
            filter: ViewFilter::default(),
            index: TreeIndex::default(),
            drag: DragController::new(),
            expanded: HashSet::new(),
            in_flight: HashSet::new(),
        };
        service.refresh()?;
        Ok(service)
    }

    /// Reloads the snapshot from storage and rebuilds the tree index.
    pub fn refresh(&mut self) -> Result<(), OrganizerServiceError> {
        let folders = self.repo.list_folders(self.notebook_id)?;
        let pages = self.repo.list_pages(self.notebook_id)?;
        let sections = self.repo.list_sections(self.notebook_id)?;
        self.snapshot = NotebookSnapshot::new(folders, pages, sections);
        self.index = TreeIndex::build(&self.snapshot, &self.filter);
        Ok(())
    }

    /// Current notebook snapshot.
    pub fn snapshot(&self) -> &NotebookSnapshot {
        &self.snapshot
    }

    /// Active visibility filter.
    pub fn filter(&self) -> ViewFilter {
        self.filter
    }

    /// Toggles archived-item visibility and rebuilds the index.
    pub fn set_show_archived(&mut self, show_archived: bool) {
        self.filter.show_archived = show_archived;
        self.index = TreeIndex::build(&self.snapshot, &self.filter);
    }

    /// Switches the section filter and rebuilds the index.
    pub fn set_section_filter(&mut self, section: SectionFilter) {
        self.filter.section = section;
        self.index = TreeIndex::build(&self.snapshot, &self.filter);
    }

    /// Visible folders directly under `parent` (`None` = notebook root).
    pub fn child_folders(&self, parent: Option<FolderId>) -> Vec<&Folder> {
        self.index
            .child_folders(parent)
            .iter()
            .filter_map(|id| self.snapshot.folder(*id))
            .collect()
    }

    /// Visible pages without a parent page in `folder` (`None` = root).
    pub fn top_level_pages(&self, folder: Option<FolderId>) -> Vec<&Page> {
        self.index
            .top_level_pages(folder)
            .iter()
            .filter_map(|id| self.snapshot.page(*id))
            .collect()
    }

    /// Visible child pages nested under `parent`.
    pub fn child_pages(&self, parent: PageId) -> Vec<&Page> {
        self.index
            .child_pages(parent)
            .iter()
            .filter_map(|id| self.snapshot.page(*id))
            .collect()
    }

    /// Sections of the notebook, ordered by position.
    pub fn sections(&self) -> &[Section] {
        self.snapshot.sections()
    }

    /// Whether a container is currently marked expanded.
    pub fn is_expanded(&self, id: Uuid) -> bool {
        self.expanded.contains(&id)
    }

    /// Current drag gesture phase, for drop-highlight rendering.
    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    /// Starts a drag gesture.
    ///
    /// Refused while the source is transiently locked by an outstanding
    /// mutation, on unknown ids, and for the archive folder.
    pub fn begin_drag(&mut self, source: DragSource) -> bool {
        if self.in_flight.contains(&source.id()) {
            debug!(
                "event=drag_begin module=service status=rejected reason=locked source={}",
                source.id()
            );
            return false;
        }
        self.drag.begin(&self.snapshot, source)
    }

    /// Re-classifies the gesture against the zone under the pointer.
    ///
    /// Returns the classified target for highlight rendering and applies
    /// the auto-expand side effect, which persists after the drop.
    pub fn drag_over(&mut self, hint: Option<DropHint>) -> Option<DropTarget> {
        let hint = hint.filter(|hint| !self.hint_is_locked(hint));
        let classification = self.drag.hover(&self.snapshot, hint);
        if let Some(container) = classification.expand {
            self.expanded.insert(container);
        }
        classification.target
    }

    /// Aborts the gesture; nothing is persisted.
    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    /// Ends the gesture and resolves it into at most one mutation intent.
    ///
    /// The ids touched by the intent are locked until [`Self::apply`]
    /// completes. `None` means the drop was a structural no-op.
    pub fn resolve_drop(&mut self) -> Option<MutationIntent> {
        let (source, target) = self.drag.take_drop()?;
        let intent = resolve(&self.snapshot, &self.index, source, target)?;
        for id in intent.touched_ids() {
            self.in_flight.insert(id);
        }
        debug!(
            "event=drop_resolved module=service kind={} source={}",
            intent_kind(&intent),
            source.id()
        );
        Some(intent)
    }

    /// Issues the intent's single persistence call.
    ///
    /// On success the snapshot is reconciled from storage; on failure it is
    /// left untouched for the caller to keep rendering. Locks release
    /// either way.
    pub fn apply(&mut self, intent: &MutationIntent) -> Result<(), OrganizerServiceError> {
        let result = self.dispatch(intent);
        for id in intent.touched_ids() {
            self.in_flight.remove(&id);
        }

        match result {
            Ok(()) => {
                info!(
                    "event=organize_apply module=service status=ok kind={}",
                    intent_kind(intent)
                );
                self.refresh()
            }
            Err(err) => {
                error!(
                    "event=organize_apply module=service status=error kind={} error={err}",
                    intent_kind(intent)
                );
                Err(err.into())
            }
        }
    }

    fn dispatch(&self, intent: &MutationIntent) -> Result<(), NotebookRepoError> {
        match intent {
            MutationIntent::SetFolderSection {
                folder_id,
                section_id,
            } => self.repo.set_folder_section(*folder_id, *section_id),
            MutationIntent::SetPageSection {
                page_id,
                section_id,
            } => self.repo.set_page_section(*page_id, *section_id),
            MutationIntent::MovePageToFolder { page_id, folder_id } => {
                self.repo.move_page_to_folder(*page_id, *folder_id)
            }
            MutationIntent::MovePageToParent {
                page_id,
                parent_page_id,
            } => self.repo.move_page_to_parent(*page_id, *parent_page_id),
            MutationIntent::ReorderPages {
                folder_id,
                ordered_page_ids,
            } => self.repo.reorder_pages(*folder_id, ordered_page_ids),
            MutationIntent::ReorderFolders {
                parent_id,
                ordered_folder_ids,
            } => self.repo.reorder_folders(*parent_id, ordered_folder_ids),
        }
    }

    fn hint_is_locked(&self, hint: &DropHint) -> bool {
        match hint {
            DropHint::Page(id) => self.in_flight.contains(id),
            DropHint::Folder(id) => self.in_flight.contains(id),
            DropHint::Section(Some(id)) => self.in_flight.contains(id),
            DropHint::Section(None) | DropHint::Root => false,
        }
    }
}

fn intent_kind(intent: &MutationIntent) -> &'static str {
    match intent {
        MutationIntent::SetFolderSection { .. } => "set_folder_section",
        MutationIntent::SetPageSection { .. } => "set_page_section",
        MutationIntent::MovePageToFolder { .. } => "move_page_to_folder",
        MutationIntent::MovePageToParent { .. } => "move_page_to_parent",
        MutationIntent::ReorderPages { .. } => "reorder_pages",
        MutationIntent::ReorderFolders { .. } => "reorder_folders",
    }
}
