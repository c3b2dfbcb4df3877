use notegrove_core::db::open_db_in_memory;
use notegrove_core::{
    FolderType, Notebook, NotebookRepoError, NotebookRepository, SqliteNotebookRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> (Connection, Notebook) {
    let conn = open_db_in_memory().unwrap();
    let notebook = {
        let repo = SqliteNotebookRepository::try_new(&conn).unwrap();
        repo.create_notebook("Test notebook").unwrap()
    };
    (conn, notebook)
}

#[test]
fn repository_requires_migrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteNotebookRepository::try_new(&conn).unwrap_err();
    assert!(matches!(
        err,
        NotebookRepoError::UninitializedConnection { .. }
    ));
}

#[test]
fn create_folder_appends_to_sibling_positions() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let alpha = repo
        .create_folder(notebook.id, "Alpha", None, FolderType::Standard)
        .unwrap();
    let beta = repo
        .create_folder(notebook.id, "Beta", None, FolderType::Standard)
        .unwrap();
    let nested = repo
        .create_folder(notebook.id, "Nested", Some(alpha.id), FolderType::Standard)
        .unwrap();

    assert_eq!(alpha.position, 0);
    assert_eq!(beta.position, 1);
    assert_eq!(nested.position, 0);

    let listed = repo.list_folders(notebook.id).unwrap();
    assert_eq!(listed.len(), 3);
}

#[test]
fn second_archive_folder_is_rejected() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    repo.create_folder(notebook.id, "Archive", None, FolderType::Archive)
        .unwrap();
    let err = repo
        .create_folder(notebook.id, "Archive again", None, FolderType::Archive)
        .unwrap_err();
    assert!(matches!(
        err,
        NotebookRepoError::ArchiveFolderExists(id) if id == notebook.id
    ));
}

#[test]
fn create_folder_rejects_unknown_parent() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();
    let unknown = Uuid::new_v4();

    let err = repo
        .create_folder(notebook.id, "x", Some(unknown), FolderType::Standard)
        .unwrap_err();
    assert!(matches!(
        err,
        NotebookRepoError::FolderNotFound(id) if id == unknown
    ));
}

#[test]
fn nested_page_creation_clears_folder() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let folder = repo
        .create_folder(notebook.id, "F", None, FolderType::Standard)
        .unwrap();
    let parent = repo
        .create_page(notebook.id, "Parent", Some(folder.id), None)
        .unwrap();
    let child = repo
        .create_page(notebook.id, "Child", Some(folder.id), Some(parent.id))
        .unwrap();

    assert_eq!(parent.folder_id, Some(folder.id));
    assert_eq!(child.parent_page_id, Some(parent.id));
    assert_eq!(child.folder_id, None);
}

#[test]
fn set_section_validates_target_section() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let folder = repo
        .create_folder(notebook.id, "F", None, FolderType::Standard)
        .unwrap();
    let page = repo.create_page(notebook.id, "P", None, None).unwrap();
    let section = repo
        .create_section(notebook.id, "Work", "#aa3366")
        .unwrap();

    repo.set_folder_section(folder.id, Some(section.id)).unwrap();
    repo.set_page_section(page.id, Some(section.id)).unwrap();
    assert_eq!(
        repo.get_folder(folder.id).unwrap().unwrap().section_id,
        Some(section.id)
    );
    assert_eq!(
        repo.get_page(page.id).unwrap().unwrap().section_id,
        Some(section.id)
    );

    repo.set_page_section(page.id, None).unwrap();
    assert_eq!(repo.get_page(page.id).unwrap().unwrap().section_id, None);

    let unknown = Uuid::new_v4();
    let err = repo.set_page_section(page.id, Some(unknown)).unwrap_err();
    assert!(matches!(
        err,
        NotebookRepoError::SectionNotFound(id) if id == unknown
    ));
}

#[test]
fn move_page_to_folder_clears_parent_and_appends() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let folder = repo
        .create_folder(notebook.id, "F", None, FolderType::Standard)
        .unwrap();
    let resident = repo
        .create_page(notebook.id, "Resident", Some(folder.id), None)
        .unwrap();
    let parent = repo.create_page(notebook.id, "Parent", None, None).unwrap();
    let nested = repo
        .create_page(notebook.id, "Nested", None, Some(parent.id))
        .unwrap();

    repo.move_page_to_folder(nested.id, Some(folder.id)).unwrap();

    let moved = repo.get_page(nested.id).unwrap().unwrap();
    assert_eq!(moved.folder_id, Some(folder.id));
    assert_eq!(moved.parent_page_id, None);
    assert_eq!(moved.position, resident.position + 1);
}

#[test]
fn detached_page_inherits_effective_folder_of_old_parent() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let folder = repo
        .create_folder(notebook.id, "F", None, FolderType::Standard)
        .unwrap();
    let top = repo
        .create_page(notebook.id, "Top", Some(folder.id), None)
        .unwrap();
    let middle = repo
        .create_page(notebook.id, "Middle", None, Some(top.id))
        .unwrap();
    let leaf = repo
        .create_page(notebook.id, "Leaf", None, Some(middle.id))
        .unwrap();

    repo.move_page_to_parent(leaf.id, None).unwrap();
    let detached = repo.get_page(leaf.id).unwrap().unwrap();
    assert_eq!(detached.parent_page_id, None);
    assert_eq!(detached.folder_id, Some(folder.id));
}

#[test]
fn detached_page_lands_at_root_when_parent_chain_had_no_folder() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let parent = repo.create_page(notebook.id, "Parent", None, None).unwrap();
    let child = repo
        .create_page(notebook.id, "Child", None, Some(parent.id))
        .unwrap();

    repo.move_page_to_parent(child.id, None).unwrap();
    let detached = repo.get_page(child.id).unwrap().unwrap();
    assert_eq!(detached.parent_page_id, None);
    assert_eq!(detached.folder_id, None);
}

#[test]
fn nesting_clears_folder_membership() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let folder = repo
        .create_folder(notebook.id, "F", None, FolderType::Standard)
        .unwrap();
    let host = repo.create_page(notebook.id, "Host", None, None).unwrap();
    let filed = repo
        .create_page(notebook.id, "Filed", Some(folder.id), None)
        .unwrap();

    repo.move_page_to_parent(filed.id, Some(host.id)).unwrap();

    let nested = repo.get_page(filed.id).unwrap().unwrap();
    assert_eq!(nested.parent_page_id, Some(host.id));
    assert_eq!(nested.folder_id, None);
}

#[test]
fn reorder_pages_rewrites_dense_positions() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let folder = repo
        .create_folder(notebook.id, "F", None, FolderType::Standard)
        .unwrap();
    let a = repo
        .create_page(notebook.id, "A", Some(folder.id), None)
        .unwrap();
    let b = repo
        .create_page(notebook.id, "B", Some(folder.id), None)
        .unwrap();
    let c = repo
        .create_page(notebook.id, "C", Some(folder.id), None)
        .unwrap();

    repo.reorder_pages(Some(folder.id), &[b.id, c.id, a.id])
        .unwrap();

    assert_eq!(repo.get_page(b.id).unwrap().unwrap().position, 0);
    assert_eq!(repo.get_page(c.id).unwrap().unwrap().position, 1);
    assert_eq!(repo.get_page(a.id).unwrap().unwrap().position, 2);
}

#[test]
fn reorder_pages_rejects_ids_outside_the_group() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let folder = repo
        .create_folder(notebook.id, "F", None, FolderType::Standard)
        .unwrap();
    let inside = repo
        .create_page(notebook.id, "Inside", Some(folder.id), None)
        .unwrap();
    let outside = repo.create_page(notebook.id, "Outside", None, None).unwrap();

    let err = repo
        .reorder_pages(Some(folder.id), &[inside.id, outside.id])
        .unwrap_err();
    assert!(matches!(
        err,
        NotebookRepoError::PageNotFound(id) if id == outside.id
    ));

    // The failed call must not leave a partial reorder behind.
    assert_eq!(repo.get_page(inside.id).unwrap().unwrap().position, 0);
}

#[test]
fn reorder_folders_rewrites_dense_positions() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let alpha = repo
        .create_folder(notebook.id, "Alpha", None, FolderType::Standard)
        .unwrap();
    let beta = repo
        .create_folder(notebook.id, "Beta", None, FolderType::Standard)
        .unwrap();

    repo.reorder_folders(None, &[beta.id, alpha.id]).unwrap();

    assert_eq!(repo.get_folder(beta.id).unwrap().unwrap().position, 0);
    assert_eq!(repo.get_folder(alpha.id).unwrap().unwrap().position, 1);
}

#[test]
fn reorder_rolls_back_when_one_update_fails() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let folder = repo
        .create_folder(notebook.id, "F", None, FolderType::Standard)
        .unwrap();
    let a = repo
        .create_page(notebook.id, "A", Some(folder.id), None)
        .unwrap();
    let b = repo
        .create_page(notebook.id, "B", Some(folder.id), None)
        .unwrap();

    conn.execute_batch(&format!(
        "CREATE TRIGGER pages_fail_position_update_test
         BEFORE UPDATE OF position ON pages
         WHEN NEW.id = '{}'
         BEGIN
             SELECT RAISE(ABORT, 'forced position failure');
         END;",
        a.id
    ))
    .unwrap();

    let result = repo.reorder_pages(Some(folder.id), &[b.id, a.id]);
    assert!(result.is_err());

    assert_eq!(repo.get_page(a.id).unwrap().unwrap().position, 0);
    assert_eq!(repo.get_page(b.id).unwrap().unwrap().position, 1);
}

#[test]
fn delete_folder_reparents_direct_children_to_grandparent() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let outer = repo
        .create_folder(notebook.id, "Outer", None, FolderType::Standard)
        .unwrap();
    let doomed = repo
        .create_folder(notebook.id, "Doomed", Some(outer.id), FolderType::Standard)
        .unwrap();
    let inner = repo
        .create_folder(notebook.id, "Inner", Some(doomed.id), FolderType::Standard)
        .unwrap();
    let page = repo
        .create_page(notebook.id, "P", Some(doomed.id), None)
        .unwrap();

    repo.delete_folder(doomed.id).unwrap();

    assert!(repo.get_folder(doomed.id).unwrap().is_none());
    assert_eq!(
        repo.get_folder(inner.id).unwrap().unwrap().parent_id,
        Some(outer.id)
    );
    assert_eq!(
        repo.get_page(page.id).unwrap().unwrap().folder_id,
        Some(outer.id)
    );
}

#[test]
fn delete_root_folder_moves_children_to_notebook_root() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let doomed = repo
        .create_folder(notebook.id, "Doomed", None, FolderType::Standard)
        .unwrap();
    let page = repo
        .create_page(notebook.id, "P", Some(doomed.id), None)
        .unwrap();

    repo.delete_folder(doomed.id).unwrap();

    assert_eq!(repo.get_page(page.id).unwrap().unwrap().folder_id, None);
}

#[test]
fn delete_page_reparents_children() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let folder = repo
        .create_folder(notebook.id, "F", None, FolderType::Standard)
        .unwrap();
    let top = repo
        .create_page(notebook.id, "Top", Some(folder.id), None)
        .unwrap();
    let middle = repo
        .create_page(notebook.id, "Middle", None, Some(top.id))
        .unwrap();
    let leaf = repo
        .create_page(notebook.id, "Leaf", None, Some(middle.id))
        .unwrap();

    repo.delete_page(middle.id).unwrap();
    assert_eq!(
        repo.get_page(leaf.id).unwrap().unwrap().parent_page_id,
        Some(top.id)
    );

    repo.delete_page(top.id).unwrap();
    let detached = repo.get_page(leaf.id).unwrap().unwrap();
    assert_eq!(detached.parent_page_id, None);
    assert_eq!(detached.folder_id, Some(folder.id));
}

#[test]
fn rename_and_archive_flags_round_trip() {
    let (conn, notebook) = setup();
    let repo = SqliteNotebookRepository::try_new(&conn).unwrap();

    let folder = repo
        .create_folder(notebook.id, "Before", None, FolderType::Standard)
        .unwrap();
    let page = repo.create_page(notebook.id, "Draft", None, None).unwrap();

    repo.rename_folder(folder.id, "After").unwrap();
    repo.rename_page(page.id, "Final").unwrap();
    repo.set_folder_archived(folder.id, true).unwrap();
    repo.set_page_archived(page.id, true).unwrap();

    let folder = repo.get_folder(folder.id).unwrap().unwrap();
    let page = repo.get_page(page.id).unwrap().unwrap();
    assert_eq!(folder.name, "After");
    assert!(folder.is_archived);
    assert_eq!(page.title, "Final");
    assert!(page.is_archived);

    let err = repo.rename_page(Uuid::new_v4(), "x").unwrap_err();
    assert!(matches!(err, NotebookRepoError::PageNotFound(_)));
}
