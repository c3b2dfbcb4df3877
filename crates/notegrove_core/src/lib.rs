//! Core domain logic for Notegrove.
//! This crate is the single source of truth for hierarchy invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod organize;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::notebook::{
    Folder, FolderId, FolderType, Notebook, NotebookId, Page, PageId, Section, SectionId,
};
pub use organize::ancestry::{effective_folder, is_descendant};
pub use organize::drag::{
    classify, Classification, DragController, DragSource, DragState, DropHint, DropTarget,
};
pub use organize::index::{SectionFilter, TreeIndex, ViewFilter};
pub use organize::reorder::reorder;
pub use organize::resolve::{resolve, MutationIntent};
pub use organize::NotebookSnapshot;
pub use repo::notebook_repo::{
    NotebookRepoError, NotebookRepoResult, NotebookRepository, SqliteNotebookRepository,
};
pub use service::organizer_service::{OrganizerService, OrganizerServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
