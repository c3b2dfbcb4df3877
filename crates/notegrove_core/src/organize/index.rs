//! Tree index: filtered, ordered views over one notebook snapshot.
//!
//! # Responsibility
//! - Compute child folders, top-level pages and child pages per container.
//! - Apply the active visibility filter (archived + section) before ordering.
//!
//! # Invariants
//! - Child listings are ordered by `position` ascending; ties keep the
//!   snapshot's stable input order.
//! - An archive-type folder sorts after all standard siblings regardless of
//!   its stored position.
//! - The index never mutates the snapshot; it is rebuilt per data refresh.

use super::NotebookSnapshot;
use crate::model::notebook::{Folder, FolderId, Page, PageId, SectionId};
use std::collections::HashMap;

/// Three-state section filter.
///
/// A single explicit representation replacing the `undefined`-vs-`null`
/// sentinel pair: `All` means no filtering, `Unsorted` admits only items
/// without a section, `Section(id)` admits only items tagged with that
/// section. The two non-`All` states produce disjoint result sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionFilter {
    /// No section filtering; every item is admitted.
    #[default]
    All,
    /// Only items with no section assignment.
    Unsorted,
    /// Only items assigned to the given section.
    Section(SectionId),
}

impl SectionFilter {
    /// Returns whether an item with the given section assignment is visible.
    pub fn admits(&self, section_id: Option<SectionId>) -> bool {
        match self {
            Self::All => true,
            Self::Unsorted => section_id.is_none(),
            Self::Section(wanted) => section_id == Some(*wanted),
        }
    }
}

/// Ambient visibility filter applied by every tree view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewFilter {
    /// Include archived folders and pages.
    pub show_archived: bool,
    /// Active section filter.
    pub section: SectionFilter,
}

impl ViewFilter {
    fn admits_folder(&self, folder: &Folder) -> bool {
        (self.show_archived || !folder.is_archived) && self.section.admits(folder.section_id)
    }

    fn admits_page(&self, page: &Page) -> bool {
        (self.show_archived || !page.is_archived) && self.section.admits(page.section_id)
    }
}

/// Adjacency index over one filtered snapshot.
///
/// Built once per data refresh or filter change so repeated view queries are
/// lookups instead of full scans.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    child_folders: HashMap<Option<FolderId>, Vec<FolderId>>,
    top_level_pages: HashMap<Option<FolderId>, Vec<PageId>>,
    child_pages: HashMap<PageId, Vec<PageId>>,
}

impl TreeIndex {
    /// Builds the index for one snapshot under the given filter.
    pub fn build(snapshot: &NotebookSnapshot, filter: &ViewFilter) -> Self {
        let mut child_folders: HashMap<Option<FolderId>, Vec<&Folder>> = HashMap::new();
        for folder in snapshot.folders() {
            if filter.admits_folder(folder) {
                child_folders.entry(folder.parent_id).or_default().push(folder);
            }
        }

        let mut top_level_pages: HashMap<Option<FolderId>, Vec<&Page>> = HashMap::new();
        let mut child_pages: HashMap<PageId, Vec<&Page>> = HashMap::new();
        for page in snapshot.pages() {
            if !filter.admits_page(page) {
                continue;
            }
            match page.parent_page_id {
                Some(parent) if snapshot.page(parent).is_some() => {
                    child_pages.entry(parent).or_default().push(page);
                }
                // A dangling parent pointer degrades to root-level placement.
                _ => {
                    top_level_pages.entry(page.folder_id).or_default().push(page);
                }
            }
        }

        Self {
            child_folders: child_folders
                .into_iter()
                .map(|(parent, mut group)| {
                    group.sort_by_key(|folder| (folder.is_archive(), folder.position));
                    (parent, group.into_iter().map(|folder| folder.id).collect())
                })
                .collect(),
            top_level_pages: top_level_pages
                .into_iter()
                .map(|(folder, group)| (folder, sorted_page_ids(group)))
                .collect(),
            child_pages: child_pages
                .into_iter()
                .map(|(parent, group)| (parent, sorted_page_ids(group)))
                .collect(),
        }
    }

    /// Visible folders directly under `parent` (`None` = notebook root).
    pub fn child_folders(&self, parent: Option<FolderId>) -> &[FolderId] {
        self.child_folders.get(&parent).map_or(&[], Vec::as_slice)
    }

    /// Visible pages without a parent page in `folder` (`None` = root).
    pub fn top_level_pages(&self, folder: Option<FolderId>) -> &[PageId] {
        self.top_level_pages.get(&folder).map_or(&[], Vec::as_slice)
    }

    /// Visible child pages nested under `parent`.
    pub fn child_pages(&self, parent: PageId) -> &[PageId] {
        self.child_pages.get(&parent).map_or(&[], Vec::as_slice)
    }

    /// The visible sibling group a page belongs to, in display order.
    pub fn page_siblings(&self, page: &Page) -> &[PageId] {
        match page.parent_page_id {
            Some(parent) => self.child_pages(parent),
            None => self.top_level_pages(page.folder_id),
        }
    }
}

fn sorted_page_ids(mut group: Vec<&Page>) -> Vec<PageId> {
    group.sort_by_key(|page| page.position);
    group.into_iter().map(|page| page.id).collect()
}
