//! Notebook repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for notebook/folder/page/section records.
//! - Keep SQL details and position-assignment behavior inside the
//!   repository boundary.
//!
//! # Invariants
//! - Listing is deterministic: `position ASC, id ASC`.
//! - At most one archive folder exists per notebook.
//! - Each mutation entry point is atomic at the storage layer.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::notebook::{
    Folder, FolderId, FolderType, Notebook, NotebookId, Page, PageId, Section, SectionId,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Result type used by notebook repository operations.
pub type NotebookRepoResult<T> = Result<T, NotebookRepoError>;

/// Errors from notebook repository operations.
#[derive(Debug)]
pub enum NotebookRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target notebook does not exist.
    NotebookNotFound(NotebookId),
    /// Target folder does not exist.
    FolderNotFound(FolderId),
    /// Target page does not exist.
    PageNotFound(PageId),
    /// Target section does not exist.
    SectionNotFound(SectionId),
    /// The notebook already has an archive folder.
    ArchiveFolderExists(NotebookId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for NotebookRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotebookNotFound(id) => write!(f, "notebook not found: {id}"),
            Self::FolderNotFound(id) => write!(f, "folder not found: {id}"),
            Self::PageNotFound(id) => write!(f, "page not found: {id}"),
            Self::SectionNotFound(id) => write!(f, "section not found: {id}"),
            Self::ArchiveFolderExists(id) => {
                write!(f, "notebook already has an archive folder: {id}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "notebook repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "notebook repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "notebook repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid notebook data: {message}"),
        }
    }
}

impl Error for NotebookRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for NotebookRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for NotebookRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

const FOLDER_SELECT_SQL: &str = "SELECT
    id,
    notebook_id,
    name,
    parent_id,
    section_id,
    folder_type,
    position,
    is_archived,
    created_at,
    updated_at
FROM folders";

const PAGE_SELECT_SQL: &str = "SELECT
    id,
    notebook_id,
    title,
    folder_id,
    parent_page_id,
    section_id,
    position,
    is_archived,
    created_at,
    updated_at
FROM pages";

/// Repository interface for notebook storage operations.
///
/// The organization engine consumes the flat lists and emits mutation
/// intents; the service maps each intent onto exactly one call here.
pub trait NotebookRepository {
    /// Creates one notebook.
    fn create_notebook(&self, name: &str) -> NotebookRepoResult<Notebook>;
    /// Creates one folder; position lands at the end of its sibling group.
    fn create_folder(
        &self,
        notebook_id: NotebookId,
        name: &str,
        parent_id: Option<FolderId>,
        folder_type: FolderType,
    ) -> NotebookRepoResult<Folder>;
    /// Creates one page; a parent page implies no direct folder.
    fn create_page(
        &self,
        notebook_id: NotebookId,
        title: &str,
        folder_id: Option<FolderId>,
        parent_page_id: Option<PageId>,
    ) -> NotebookRepoResult<Page>;
    /// Creates one section; position lands at the end of the notebook list.
    fn create_section(
        &self,
        notebook_id: NotebookId,
        name: &str,
        color: &str,
    ) -> NotebookRepoResult<Section>;
    /// Loads one folder by id.
    fn get_folder(&self, id: FolderId) -> NotebookRepoResult<Option<Folder>>;
    /// Loads one page by id.
    fn get_page(&self, id: PageId) -> NotebookRepoResult<Option<Page>>;
    /// Lists every folder of a notebook.
    fn list_folders(&self, notebook_id: NotebookId) -> NotebookRepoResult<Vec<Folder>>;
    /// Lists every page of a notebook.
    fn list_pages(&self, notebook_id: NotebookId) -> NotebookRepoResult<Vec<Page>>;
    /// Lists every section of a notebook.
    fn list_sections(&self, notebook_id: NotebookId) -> NotebookRepoResult<Vec<Section>>;
    /// Renames one folder.
    fn rename_folder(&self, id: FolderId, name: &str) -> NotebookRepoResult<()>;
    /// Renames one page.
    fn rename_page(&self, id: PageId, title: &str) -> NotebookRepoResult<()>;
    /// Sets a folder's archived-visibility flag.
    fn set_folder_archived(&self, id: FolderId, archived: bool) -> NotebookRepoResult<()>;
    /// Sets a page's archived-visibility flag.
    fn set_page_archived(&self, id: PageId, archived: bool) -> NotebookRepoResult<()>;
    /// Reassigns a folder's section; position is untouched.
    fn set_folder_section(
        &self,
        id: FolderId,
        section_id: Option<SectionId>,
    ) -> NotebookRepoResult<()>;
    /// Reassigns a page's section; position is untouched.
    fn set_page_section(
        &self,
        id: PageId,
        section_id: Option<SectionId>,
    ) -> NotebookRepoResult<()>;
    /// Moves a page directly into a folder (`None` = notebook root),
    /// clearing any parent page, in one atomic call.
    fn move_page_to_folder(
        &self,
        id: PageId,
        folder_id: Option<FolderId>,
    ) -> NotebookRepoResult<()>;
    /// Nests a page under a parent page, or detaches it when `None`.
    /// Nesting clears `folder_id`; detaching assigns the effective folder
    /// of the old parent chain.
    fn move_page_to_parent(
        &self,
        id: PageId,
        parent_page_id: Option<PageId>,
    ) -> NotebookRepoResult<()>;
    /// Rewrites positions for one page sibling group to match `ordered`.
    fn reorder_pages(
        &self,
        folder_id: Option<FolderId>,
        ordered: &[PageId],
    ) -> NotebookRepoResult<()>;
    /// Rewrites positions for one folder sibling group to match `ordered`.
    fn reorder_folders(
        &self,
        parent_id: Option<FolderId>,
        ordered: &[FolderId],
    ) -> NotebookRepoResult<()>;
    /// Deletes one folder; direct pages and child folders reparent to the
    /// folder's own parent (root if none).
    fn delete_folder(&self, id: FolderId) -> NotebookRepoResult<()>;
    /// Deletes one page; child pages reparent to the page's parent, or
    /// detach into the page's folder when it had none.
    fn delete_page(&self, id: PageId) -> NotebookRepoResult<()>;
}

/// SQLite-backed notebook repository.
#[derive(Debug)]
pub struct SqliteNotebookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotebookRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> NotebookRepoResult<Self> {
        ensure_notebook_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NotebookRepository for SqliteNotebookRepository<'_> {
    fn create_notebook(&self, name: &str) -> NotebookRepoResult<Notebook> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO notebooks (id, name) VALUES (?1, ?2);",
            params![id.to_string(), name],
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT id, name, created_at, updated_at FROM notebooks WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return parse_notebook_row(row);
        }
        Err(NotebookRepoError::NotebookNotFound(id))
    }

    fn create_folder(
        &self,
        notebook_id: NotebookId,
        name: &str,
        parent_id: Option<FolderId>,
        folder_type: FolderType,
    ) -> NotebookRepoResult<Folder> {
        ensure_notebook_exists(self.conn, notebook_id)?;
        if let Some(parent_id) = parent_id {
            ensure_folder_exists(self.conn, parent_id)?;
        }
        if folder_type == FolderType::Archive && archive_folder_exists(self.conn, notebook_id)? {
            return Err(NotebookRepoError::ArchiveFolderExists(notebook_id));
        }

        let id = Uuid::new_v4();
        let position = next_folder_position(self.conn, notebook_id, parent_id)?;
        self.conn.execute(
            "INSERT INTO folders (id, notebook_id, name, parent_id, folder_type, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                notebook_id.to_string(),
                name,
                parent_id.map(|value| value.to_string()),
                folder_type_text(folder_type),
                position,
            ],
        )?;
        load_required_folder(self.conn, id)
    }

    fn create_page(
        &self,
        notebook_id: NotebookId,
        title: &str,
        folder_id: Option<FolderId>,
        parent_page_id: Option<PageId>,
    ) -> NotebookRepoResult<Page> {
        ensure_notebook_exists(self.conn, notebook_id)?;
        if let Some(parent_page_id) = parent_page_id {
            ensure_page_exists(self.conn, parent_page_id)?;
        }
        // A nested page has no direct folder of its own.
        let folder_id = if parent_page_id.is_some() {
            None
        } else {
            if let Some(folder_id) = folder_id {
                ensure_folder_exists(self.conn, folder_id)?;
            }
            folder_id
        };

        let id = Uuid::new_v4();
        let position =
            next_page_position(self.conn, notebook_id, folder_id, parent_page_id)?;
        self.conn.execute(
            "INSERT INTO pages (id, notebook_id, title, folder_id, parent_page_id, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                notebook_id.to_string(),
                title,
                folder_id.map(|value| value.to_string()),
                parent_page_id.map(|value| value.to_string()),
                position,
            ],
        )?;
        load_required_page(self.conn, id)
    }

    fn create_section(
        &self,
        notebook_id: NotebookId,
        name: &str,
        color: &str,
    ) -> NotebookRepoResult<Section> {
        ensure_notebook_exists(self.conn, notebook_id)?;

        let id = Uuid::new_v4();
        let position: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM sections WHERE notebook_id = ?1;",
            [notebook_id.to_string()],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO sections (id, notebook_id, name, color, position)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                notebook_id.to_string(),
                name,
                color,
                position,
            ],
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT id, notebook_id, name, color, position FROM sections WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return parse_section_row(row);
        }
        Err(NotebookRepoError::SectionNotFound(id))
    }

    fn get_folder(&self, id: FolderId) -> NotebookRepoResult<Option<Folder>> {
        let sql = format!("{FOLDER_SELECT_SQL} WHERE id = ?1;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_folder_row(row)?));
        }
        Ok(None)
    }

    fn get_page(&self, id: PageId) -> NotebookRepoResult<Option<Page>> {
        let sql = format!("{PAGE_SELECT_SQL} WHERE id = ?1;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_page_row(row)?));
        }
        Ok(None)
    }

    fn list_folders(&self, notebook_id: NotebookId) -> NotebookRepoResult<Vec<Folder>> {
        let sql = format!(
            "{FOLDER_SELECT_SQL} WHERE notebook_id = ?1 ORDER BY position ASC, id ASC;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([notebook_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_folder_row(row)?);
        }
        Ok(items)
    }

    fn list_pages(&self, notebook_id: NotebookId) -> NotebookRepoResult<Vec<Page>> {
        let sql =
            format!("{PAGE_SELECT_SQL} WHERE notebook_id = ?1 ORDER BY position ASC, id ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([notebook_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_page_row(row)?);
        }
        Ok(items)
    }

    fn list_sections(&self, notebook_id: NotebookId) -> NotebookRepoResult<Vec<Section>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, notebook_id, name, color, position
             FROM sections
             WHERE notebook_id = ?1
             ORDER BY position ASC, id ASC;",
        )?;
        let mut rows = stmt.query([notebook_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_section_row(row)?);
        }
        Ok(items)
    }

    fn rename_folder(&self, id: FolderId, name: &str) -> NotebookRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE folders
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), name],
        )?;
        if changed == 0 {
            return Err(NotebookRepoError::FolderNotFound(id));
        }
        Ok(())
    }

    fn rename_page(&self, id: PageId, title: &str) -> NotebookRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE pages
             SET title = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), title],
        )?;
        if changed == 0 {
            return Err(NotebookRepoError::PageNotFound(id));
        }
        Ok(())
    }

    fn set_folder_archived(&self, id: FolderId, archived: bool) -> NotebookRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE folders
             SET is_archived = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), archived as i64],
        )?;
        if changed == 0 {
            return Err(NotebookRepoError::FolderNotFound(id));
        }
        Ok(())
    }

    fn set_page_archived(&self, id: PageId, archived: bool) -> NotebookRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE pages
             SET is_archived = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), archived as i64],
        )?;
        if changed == 0 {
            return Err(NotebookRepoError::PageNotFound(id));
        }
        Ok(())
    }

    fn set_folder_section(
        &self,
        id: FolderId,
        section_id: Option<SectionId>,
    ) -> NotebookRepoResult<()> {
        if let Some(section_id) = section_id {
            ensure_section_exists(self.conn, section_id)?;
        }
        let changed = self.conn.execute(
            "UPDATE folders
             SET section_id = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), section_id.map(|value| value.to_string())],
        )?;
        if changed == 0 {
            return Err(NotebookRepoError::FolderNotFound(id));
        }
        Ok(())
    }

    fn set_page_section(
        &self,
        id: PageId,
        section_id: Option<SectionId>,
    ) -> NotebookRepoResult<()> {
        if let Some(section_id) = section_id {
            ensure_section_exists(self.conn, section_id)?;
        }
        let changed = self.conn.execute(
            "UPDATE pages
             SET section_id = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), section_id.map(|value| value.to_string())],
        )?;
        if changed == 0 {
            return Err(NotebookRepoError::PageNotFound(id));
        }
        Ok(())
    }

    fn move_page_to_folder(
        &self,
        id: PageId,
        folder_id: Option<FolderId>,
    ) -> NotebookRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let page = load_required_page(&tx, id)?;
        if let Some(folder_id) = folder_id {
            ensure_folder_exists(&tx, folder_id)?;
        }

        let position = next_page_position(&tx, page.notebook_id, folder_id, None)?;
        tx.execute(
            "UPDATE pages
             SET folder_id = ?2,
                 parent_page_id = NULL,
                 position = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id.to_string(),
                folder_id.map(|value| value.to_string()),
                position,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn move_page_to_parent(
        &self,
        id: PageId,
        parent_page_id: Option<PageId>,
    ) -> NotebookRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let page = load_required_page(&tx, id)?;

        match parent_page_id {
            Some(parent_page_id) => {
                ensure_page_exists(&tx, parent_page_id)?;
                let position =
                    next_page_position(&tx, page.notebook_id, None, Some(parent_page_id))?;
                tx.execute(
                    "UPDATE pages
                     SET parent_page_id = ?2,
                         folder_id = NULL,
                         position = ?3,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?1;",
                    params![id.to_string(), parent_page_id.to_string(), position],
                )?;
            }
            None => {
                // Detaching lands the page at the top level of whichever
                // folder its parent chain effectively lived in.
                let inherited_folder = match page.parent_page_id {
                    Some(old_parent) => effective_folder_of(&tx, old_parent)?,
                    None => page.folder_id,
                };
                let position =
                    next_page_position(&tx, page.notebook_id, inherited_folder, None)?;
                tx.execute(
                    "UPDATE pages
                     SET parent_page_id = NULL,
                         folder_id = ?2,
                         position = ?3,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?1;",
                    params![
                        id.to_string(),
                        inherited_folder.map(|value| value.to_string()),
                        position,
                    ],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn reorder_pages(
        &self,
        folder_id: Option<FolderId>,
        ordered: &[PageId],
    ) -> NotebookRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for (index, page_id) in ordered.iter().enumerate() {
            let changed = tx.execute(
                "UPDATE pages
                 SET position = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1
                   AND folder_id IS ?3;",
                params![
                    page_id.to_string(),
                    index as i64,
                    folder_id.map(|value| value.to_string()),
                ],
            )?;
            if changed == 0 {
                return Err(NotebookRepoError::PageNotFound(*page_id));
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn reorder_folders(
        &self,
        parent_id: Option<FolderId>,
        ordered: &[FolderId],
    ) -> NotebookRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for (index, folder_id) in ordered.iter().enumerate() {
            let changed = tx.execute(
                "UPDATE folders
                 SET position = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1
                   AND parent_id IS ?3;",
                params![
                    folder_id.to_string(),
                    index as i64,
                    parent_id.map(|value| value.to_string()),
                ],
            )?;
            if changed == 0 {
                return Err(NotebookRepoError::FolderNotFound(*folder_id));
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_folder(&self, id: FolderId) -> NotebookRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let folder = load_required_folder(&tx, id)?;
        let destination = folder.parent_id;

        let direct_pages = list_page_ids_in_folder(&tx, id)?;
        let page_base =
            next_page_position(&tx, folder.notebook_id, destination, None)?;
        for (index, page_id) in direct_pages.into_iter().enumerate() {
            tx.execute(
                "UPDATE pages
                 SET folder_id = ?2,
                     position = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    page_id.to_string(),
                    destination.map(|value| value.to_string()),
                    page_base + index as i64,
                ],
            )?;
        }

        let child_folders = list_child_folder_ids(&tx, id)?;
        let folder_base = next_folder_position(&tx, folder.notebook_id, destination)?;
        for (index, child_id) in child_folders.into_iter().enumerate() {
            tx.execute(
                "UPDATE folders
                 SET parent_id = ?2,
                     position = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    child_id.to_string(),
                    destination.map(|value| value.to_string()),
                    folder_base + index as i64,
                ],
            )?;
        }

        tx.execute("DELETE FROM folders WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok(())
    }

    fn delete_page(&self, id: PageId) -> NotebookRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let page = load_required_page(&tx, id)?;

        let children = list_child_page_ids(&tx, id)?;
        match page.parent_page_id {
            Some(grandparent) => {
                let base =
                    next_page_position(&tx, page.notebook_id, None, Some(grandparent))?;
                for (index, child_id) in children.into_iter().enumerate() {
                    tx.execute(
                        "UPDATE pages
                         SET parent_page_id = ?2,
                             position = ?3,
                             updated_at = (strftime('%s', 'now') * 1000)
                         WHERE id = ?1;",
                        params![
                            child_id.to_string(),
                            grandparent.to_string(),
                            base + index as i64,
                        ],
                    )?;
                }
            }
            None => {
                let base =
                    next_page_position(&tx, page.notebook_id, page.folder_id, None)?;
                for (index, child_id) in children.into_iter().enumerate() {
                    tx.execute(
                        "UPDATE pages
                         SET parent_page_id = NULL,
                             folder_id = ?2,
                             position = ?3,
                             updated_at = (strftime('%s', 'now') * 1000)
                         WHERE id = ?1;",
                        params![
                            child_id.to_string(),
                            page.folder_id.map(|value| value.to_string()),
                            base + index as i64,
                        ],
                    )?;
                }
            }
        }

        tx.execute("DELETE FROM pages WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok(())
    }
}

fn ensure_notebook_exists(conn: &Connection, id: NotebookId) -> NotebookRepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notebooks WHERE id = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(NotebookRepoError::NotebookNotFound(id));
    }
    Ok(())
}

fn ensure_folder_exists(conn: &Connection, id: FolderId) -> NotebookRepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM folders WHERE id = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(NotebookRepoError::FolderNotFound(id));
    }
    Ok(())
}

fn ensure_page_exists(conn: &Connection, id: PageId) -> NotebookRepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pages WHERE id = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(NotebookRepoError::PageNotFound(id));
    }
    Ok(())
}

fn ensure_section_exists(conn: &Connection, id: SectionId) -> NotebookRepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sections WHERE id = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(NotebookRepoError::SectionNotFound(id));
    }
    Ok(())
}

fn archive_folder_exists(conn: &Connection, notebook_id: NotebookId) -> NotebookRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM folders WHERE notebook_id = ?1 AND folder_type = 'archive'
        );",
        [notebook_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_required_folder(conn: &Connection, id: FolderId) -> NotebookRepoResult<Folder> {
    let sql = format!("{FOLDER_SELECT_SQL} WHERE id = ?1;");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_folder_row(row);
    }
    Err(NotebookRepoError::FolderNotFound(id))
}

fn load_required_page(conn: &Connection, id: PageId) -> NotebookRepoResult<Page> {
    let sql = format!("{PAGE_SELECT_SQL} WHERE id = ?1;");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_page_row(row);
    }
    Err(NotebookRepoError::PageNotFound(id))
}

fn next_folder_position(
    conn: &Connection,
    notebook_id: NotebookId,
    parent_id: Option<FolderId>,
) -> NotebookRepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1
         FROM folders
         WHERE notebook_id = ?1
           AND parent_id IS ?2;",
        params![
            notebook_id.to_string(),
            parent_id.map(|value| value.to_string()),
        ],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn next_page_position(
    conn: &Connection,
    notebook_id: NotebookId,
    folder_id: Option<FolderId>,
    parent_page_id: Option<PageId>,
) -> NotebookRepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1
         FROM pages
         WHERE notebook_id = ?1
           AND folder_id IS ?2
           AND parent_page_id IS ?3;",
        params![
            notebook_id.to_string(),
            folder_id.map(|value| value.to_string()),
            parent_page_id.map(|value| value.to_string()),
        ],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn list_page_ids_in_folder(conn: &Connection, folder_id: FolderId) -> NotebookRepoResult<Vec<PageId>> {
    let mut stmt = conn.prepare(
        "SELECT id
         FROM pages
         WHERE folder_id = ?1
           AND parent_page_id IS NULL
         ORDER BY position ASC, id ASC;",
    )?;
    let mut rows = stmt.query([folder_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "pages.id")?);
    }
    Ok(ids)
}

fn list_child_folder_ids(conn: &Connection, parent_id: FolderId) -> NotebookRepoResult<Vec<FolderId>> {
    let mut stmt = conn.prepare(
        "SELECT id
         FROM folders
         WHERE parent_id = ?1
         ORDER BY position ASC, id ASC;",
    )?;
    let mut rows = stmt.query([parent_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "folders.id")?);
    }
    Ok(ids)
}

fn list_child_page_ids(conn: &Connection, parent_page_id: PageId) -> NotebookRepoResult<Vec<PageId>> {
    let mut stmt = conn.prepare(
        "SELECT id
         FROM pages
         WHERE parent_page_id = ?1
         ORDER BY position ASC, id ASC;",
    )?;
    let mut rows = stmt.query([parent_page_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "pages.id")?);
    }
    Ok(ids)
}

/// Walks `parent_page_id` upward from `page_id` and returns the topmost
/// ancestor's `folder_id`. Dangling pointers and cycles answer `None`.
fn effective_folder_of(conn: &Connection, page_id: PageId) -> NotebookRepoResult<Option<FolderId>> {
    let mut visited = HashSet::new();
    let mut current = match load_page_link(conn, page_id)? {
        Some(link) => link,
        None => return Ok(None),
    };
    visited.insert(page_id);

    while let Some(parent_id) = current.0 {
        if !visited.insert(parent_id) {
            return Ok(None);
        }
        match load_page_link(conn, parent_id)? {
            Some(link) => current = link,
            None => return Ok(None),
        }
    }
    Ok(current.1)
}

fn load_page_link(
    conn: &Connection,
    page_id: PageId,
) -> NotebookRepoResult<Option<(Option<PageId>, Option<FolderId>)>> {
    let row: Option<(Option<String>, Option<String>)> = conn
        .query_row(
            "SELECT parent_page_id, folder_id FROM pages WHERE id = ?1;",
            [page_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match row {
        None => Ok(None),
        Some((parent, folder)) => {
            let parent = parent
                .map(|value| parse_uuid(&value, "pages.parent_page_id"))
                .transpose()?;
            let folder = folder
                .map(|value| parse_uuid(&value, "pages.folder_id"))
                .transpose()?;
            Ok(Some((parent, folder)))
        }
    }
}

fn parse_notebook_row(row: &Row<'_>) -> NotebookRepoResult<Notebook> {
    let id_text: String = row.get("id")?;
    Ok(Notebook {
        id: parse_uuid(&id_text, "notebooks.id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_folder_row(row: &Row<'_>) -> NotebookRepoResult<Folder> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "folders.id")?;
    let notebook_text: String = row.get("notebook_id")?;
    let notebook_id = parse_uuid(&notebook_text, "folders.notebook_id")?;
    let parent_id = row
        .get::<_, Option<String>>("parent_id")?
        .map(|value| parse_uuid(&value, "folders.parent_id"))
        .transpose()?;
    let section_id = row
        .get::<_, Option<String>>("section_id")?
        .map(|value| parse_uuid(&value, "folders.section_id"))
        .transpose()?;

    let type_text: String = row.get("folder_type")?;
    let folder_type = parse_folder_type(&type_text).ok_or_else(|| {
        NotebookRepoError::InvalidData(format!(
            "invalid folder type `{type_text}` in folders.folder_type"
        ))
    })?;

    Ok(Folder {
        id,
        notebook_id,
        name: row.get("name")?,
        parent_id,
        section_id,
        folder_type,
        position: row.get("position")?,
        is_archived: parse_flag(row.get::<_, i64>("is_archived")?, "folders.is_archived")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_page_row(row: &Row<'_>) -> NotebookRepoResult<Page> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "pages.id")?;
    let notebook_text: String = row.get("notebook_id")?;
    let notebook_id = parse_uuid(&notebook_text, "pages.notebook_id")?;
    let folder_id = row
        .get::<_, Option<String>>("folder_id")?
        .map(|value| parse_uuid(&value, "pages.folder_id"))
        .transpose()?;
    let parent_page_id = row
        .get::<_, Option<String>>("parent_page_id")?
        .map(|value| parse_uuid(&value, "pages.parent_page_id"))
        .transpose()?;
    let section_id = row
        .get::<_, Option<String>>("section_id")?
        .map(|value| parse_uuid(&value, "pages.section_id"))
        .transpose()?;

    Ok(Page {
        id,
        notebook_id,
        title: row.get("title")?,
        folder_id,
        parent_page_id,
        section_id,
        position: row.get("position")?,
        is_archived: parse_flag(row.get::<_, i64>("is_archived")?, "pages.is_archived")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_section_row(row: &Row<'_>) -> NotebookRepoResult<Section> {
    let id_text: String = row.get("id")?;
    let notebook_text: String = row.get("notebook_id")?;
    Ok(Section {
        id: parse_uuid(&id_text, "sections.id")?,
        notebook_id: parse_uuid(&notebook_text, "sections.notebook_id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        position: row.get("position")?,
    })
}

fn parse_folder_type(value: &str) -> Option<FolderType> {
    match value {
        "standard" => Some(FolderType::Standard),
        "archive" => Some(FolderType::Archive),
        _ => None,
    }
}

fn folder_type_text(value: FolderType) -> &'static str {
    match value {
        FolderType::Standard => "standard",
        FolderType::Archive => "archive",
    }
}

fn parse_flag(value: i64, column: &'static str) -> NotebookRepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(NotebookRepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn parse_uuid(value: &str, column: &'static str) -> NotebookRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| NotebookRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_notebook_connection_ready(conn: &Connection) -> NotebookRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(NotebookRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["notebooks", "folders", "pages", "sections"] {
        if !table_exists(conn, table)? {
            return Err(NotebookRepoError::MissingRequiredTable(table));
        }
    }

    for column in [
        "id",
        "notebook_id",
        "name",
        "parent_id",
        "section_id",
        "folder_type",
        "position",
        "is_archived",
    ] {
        if !table_has_column(conn, "folders", column)? {
            return Err(NotebookRepoError::MissingRequiredColumn {
                table: "folders",
                column,
            });
        }
    }

    for column in [
        "id",
        "notebook_id",
        "title",
        "folder_id",
        "parent_page_id",
        "section_id",
        "position",
        "is_archived",
    ] {
        if !table_has_column(conn, "pages", column)? {
            return Err(NotebookRepoError::MissingRequiredColumn {
                table: "pages",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> NotebookRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> NotebookRepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
