//! Notebook domain model.
//!
//! # Responsibility
//! - Define the canonical folder/page/section records shared by the
//!   organization engine and the persistence layer.
//! - Provide lifecycle helpers for archived-visibility semantics.
//!
//! # Invariants
//! - Every id is stable and never reused for another record.
//! - A page nested under a parent page carries `folder_id = None`; its
//!   effective location is wherever its parent page lives.
//! - At most one folder per notebook has `FolderType::Archive`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a notebook.
pub type NotebookId = Uuid;

/// Stable identifier for a folder.
pub type FolderId = Uuid;

/// Stable identifier for a page.
pub type PageId = Uuid;

/// Stable identifier for a section.
pub type SectionId = Uuid;

/// Folder role within a notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderType {
    /// Ordinary user folder.
    Standard,
    /// The notebook's single archive folder. Excluded from normal ordering
    /// and always sorted last among siblings.
    Archive,
}

/// Top-level container for folders, pages and sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    /// Stable notebook id.
    pub id: NotebookId,
    /// User-facing name.
    pub name: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Folder record.
///
/// Folders nest via `parent_id` and order among siblings by `position`
/// ascending, with the one exception that an archive folder sorts after all
/// standard siblings regardless of its stored position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Stable folder id.
    pub id: FolderId,
    /// Owning notebook.
    pub notebook_id: NotebookId,
    /// User-facing name.
    pub name: String,
    /// Parent folder. `None` means notebook root.
    pub parent_id: Option<FolderId>,
    /// Optional orthogonal section tag. Never affects containment.
    pub section_id: Option<SectionId>,
    /// Folder role.
    pub folder_type: FolderType,
    /// Relative order key within one sibling group.
    pub position: i64,
    /// Archived-visibility marker.
    pub is_archived: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Folder {
    /// Returns whether this folder is the notebook archive folder.
    pub fn is_archive(&self) -> bool {
        self.folder_type == FolderType::Archive
    }
}

/// Page record.
///
/// A page's container is determined by `folder_id` and `parent_page_id`
/// jointly: a page with a parent page is a child page regardless of folder;
/// a page with only a `folder_id` lives directly in that folder; a page with
/// neither lives at notebook root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Stable page id.
    pub id: PageId,
    /// Owning notebook.
    pub notebook_id: NotebookId,
    /// User-facing title.
    pub title: String,
    /// Direct folder container. Cleared while nested under a parent page.
    pub folder_id: Option<FolderId>,
    /// Parent page for nested sub-pages. `None` means not nested.
    pub parent_page_id: Option<PageId>,
    /// Optional orthogonal section tag. Never affects containment.
    pub section_id: Option<SectionId>,
    /// Relative order key within one sibling group.
    pub position: i64,
    /// Archived-visibility marker.
    pub is_archived: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Page {
    /// Returns whether this page is nested under another page.
    pub fn is_nested(&self) -> bool {
        self.parent_page_id.is_some()
    }
}

/// Section record.
///
/// Sections are a tag-like grouping axis used only for filtering, never for
/// containment or ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Stable section id.
    pub id: SectionId,
    /// Owning notebook.
    pub notebook_id: NotebookId,
    /// User-facing name.
    pub name: String,
    /// Display color, stored as an opaque string (e.g. `#aabbcc`).
    pub color: String,
    /// Relative order key among the notebook's sections.
    pub position: i64,
}
