//! Hierarchical organization engine.
//!
//! # Responsibility
//! - Hold the immutable notebook snapshot queried by all engine decisions.
//! - Expose tree views, ancestry checks, drag classification, drop
//!   resolution and sibling reordering as pure functions over that snapshot.
//!
//! # Invariants
//! - No function in this module mutates shared state; mutation is expressed
//!   as [`resolve::MutationIntent`] values returned to the caller.
//! - Snapshot lookups tolerate dangling parent pointers; corrupt records
//!   degrade to root-level classification instead of failing.

pub mod ancestry;
pub mod drag;
pub mod index;
pub mod reorder;
pub mod resolve;

use crate::model::notebook::{Folder, FolderId, Page, PageId, Section, SectionId};
use std::collections::HashMap;

/// Immutable view of one notebook's folders, pages and sections.
///
/// The caller owns the single writable copy of state; the engine receives a
/// rebuilt snapshot after every successful mutation and never mutates it.
#[derive(Debug, Clone, Default)]
pub struct NotebookSnapshot {
    folders: HashMap<FolderId, Folder>,
    pages: HashMap<PageId, Page>,
    sections: Vec<Section>,
    folder_order: Vec<FolderId>,
    page_order: Vec<PageId>,
}

impl NotebookSnapshot {
    /// Builds a snapshot from flat record lists.
    ///
    /// Input order is preserved and used as the stable tie-break when
    /// `position` values collide.
    pub fn new(folders: Vec<Folder>, pages: Vec<Page>, mut sections: Vec<Section>) -> Self {
        sections.sort_by_key(|section| section.position);
        let folder_order: Vec<FolderId> = folders.iter().map(|folder| folder.id).collect();
        let page_order: Vec<PageId> = pages.iter().map(|page| page.id).collect();
        Self {
            folders: folders.into_iter().map(|folder| (folder.id, folder)).collect(),
            pages: pages.into_iter().map(|page| (page.id, page)).collect(),
            sections,
            folder_order,
            page_order,
        }
    }

    /// Looks up one folder by id.
    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.get(&id)
    }

    /// Looks up one page by id.
    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.get(&id)
    }

    /// Returns whether a section id exists in this snapshot.
    pub fn has_section(&self, id: SectionId) -> bool {
        self.sections.iter().any(|section| section.id == id)
    }

    /// Sections ordered by `position` ascending.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// All folders in stable input order.
    pub fn folders(&self) -> impl Iterator<Item = &Folder> + '_ {
        self.folder_order
            .iter()
            .filter_map(move |id| self.folders.get(id))
    }

    /// All pages in stable input order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> + '_ {
        self.page_order
            .iter()
            .filter_map(move |id| self.pages.get(id))
    }
}
