use arbor_services::filesystem::{sort_entries, FileSystemAccessor, FsError, LocalAccessor};
use std::fs;

fn accessor_in(dir: &tempfile::TempDir) -> LocalAccessor {
    LocalAccessor::with_home(dir.path())
}

#[cfg(unix)]
#[tokio::test]
async fn test_list_drops_broken_symlink() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), vec![b'x'; 100]).unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("c.lnk")).unwrap();

    let accessor = accessor_in(&dir);
    let mut entries = accessor.list(Some(dir.path())).await.unwrap();
    sort_entries(&mut entries);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "b");
    assert!(entries[0].is_directory);
    assert_eq!(entries[0].size, 0);
    assert_eq!(entries[0].kind, "directory");
    assert_eq!(entries[1].name, "a.txt");
    assert_eq!(entries[1].size, 100);
    assert_eq!(entries[1].kind, "txt");
    assert_eq!(entries[1].path, dir.path().join("a.txt"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_directory_reports_target_metadata() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("real")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

    let entries = accessor_in(&dir).list(None).await.unwrap();
    let link = entries.iter().find(|e| e.name == "link").unwrap();
    assert!(link.is_directory);
    assert!(link.is_symlink);
}

#[tokio::test]
async fn test_empty_path_lists_home() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("note.md"), "# hi").unwrap();

    let accessor = accessor_in(&dir);
    let entries = accessor.list(Some(std::path::Path::new(""))).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, "md");
}

#[tokio::test]
async fn test_delete_directory_is_recursive() {
    let dir = tempfile::tempdir().unwrap();
    let b = dir.path().join("b");
    fs::create_dir_all(b.join("nested")).unwrap();
    fs::write(b.join("nested/file.txt"), "data").unwrap();
    fs::write(dir.path().join("keep.txt"), "data").unwrap();

    let accessor = accessor_in(&dir);
    accessor.delete(&b).await.unwrap();

    let names: Vec<_> = accessor
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["keep.txt".to_string()]);
}

#[tokio::test]
async fn test_create_directory_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let deep = dir.path().join("x/y/z");
    let accessor = accessor_in(&dir);

    accessor.create_directory(&deep).await.unwrap();
    accessor.create_directory(&deep).await.unwrap();
    assert!(accessor.details(&deep).await.unwrap().is_directory);
}

#[tokio::test]
async fn test_move_and_copy_refuse_existing_destination() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.txt");
    let dst = dir.path().join("dst.txt");
    fs::write(&src, "one").unwrap();
    fs::write(&dst, "two").unwrap();
    let accessor = accessor_in(&dir);

    assert!(matches!(
        accessor.move_entry(&src, &dst).await,
        Err(FsError::AlreadyExists(_))
    ));
    assert!(matches!(
        accessor.copy_entry(&src, &dst).await,
        Err(FsError::AlreadyExists(_))
    ));
    assert_eq!(accessor.read_text(&dst).await.unwrap(), "two");

    let missing = dir.path().join("missing");
    assert!(matches!(
        accessor.move_entry(&missing, &dir.path().join("other")).await,
        Err(FsError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_copy_directory_and_move_file() {
    let dir = tempfile::tempdir().unwrap();
    let tree = dir.path().join("tree");
    fs::create_dir_all(tree.join("leaf")).unwrap();
    fs::write(tree.join("leaf/a.txt"), "A").unwrap();
    let accessor = accessor_in(&dir);

    let copy = dir.path().join("copy");
    accessor.copy_entry(&tree, &copy).await.unwrap();
    assert_eq!(accessor.read_text(&copy.join("leaf/a.txt")).await.unwrap(), "A");

    let moved = dir.path().join("moved.txt");
    accessor.move_entry(&copy.join("leaf/a.txt"), &moved).await.unwrap();
    assert!(accessor.exists(&moved).await);
    assert!(!accessor.exists(&copy.join("leaf/a.txt")).await);
}

#[tokio::test]
async fn test_copy_into_own_subtree_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let tree = dir.path().join("a");
    fs::create_dir_all(tree.join("inner")).unwrap();
    fs::write(tree.join("inner/n.txt"), "n").unwrap();
    let accessor = accessor_in(&dir);

    assert!(matches!(
        accessor.copy_entry(&tree, &tree.join("b")).await,
        Err(FsError::InvalidPath(_))
    ));
    assert!(matches!(
        accessor.copy_entry(&tree, &tree.join("inner/deeper")).await,
        Err(FsError::InvalidPath(_))
    ));
    assert!(matches!(
        accessor.move_entry(&tree, &tree.join("b")).await,
        Err(FsError::InvalidPath(_))
    ));
    assert!(!tree.join("b").exists());

    // A sibling whose name shares the prefix is not inside the tree.
    accessor.copy_entry(&tree, &dir.path().join("ab")).await.unwrap();
    assert!(dir.path().join("ab/inner/n.txt").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_copy_through_linked_ancestor_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let tree = dir.path().join("a");
    fs::create_dir(&tree).unwrap();
    std::os::unix::fs::symlink(&tree, dir.path().join("alias")).unwrap();
    let accessor = accessor_in(&dir);

    assert!(matches!(
        accessor.copy_entry(&dir.path().join("alias"), &tree.join("b")).await,
        Err(FsError::InvalidPath(_))
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn test_copy_keeps_cyclic_link_as_link() {
    let dir = tempfile::tempdir().unwrap();
    let tree = dir.path().join("a");
    fs::create_dir(&tree).unwrap();
    std::os::unix::fs::symlink(dir.path(), tree.join("loop")).unwrap();
    let accessor = accessor_in(&dir);

    let copy = dir.path().join("copy");
    accessor.copy_entry(&tree, &copy).await.unwrap();
    let link = fs::symlink_metadata(copy.join("loop")).unwrap();
    assert!(link.file_type().is_symlink());
}

#[tokio::test]
async fn test_write_replaces_content() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    let accessor = accessor_in(&dir);

    accessor.write_text(&file, "first version").await.unwrap();
    accessor.write_text(&file, "second").await.unwrap();
    assert_eq!(accessor.read_text(&file).await.unwrap(), "second");
    assert_eq!(accessor.details(&file).await.unwrap().size, 6);
}

#[tokio::test]
async fn test_details_of_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = accessor_in(&dir)
        .details(&dir.path().join("nope"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "NotFound");
}

#[tokio::test]
async fn test_relative_paths_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let accessor = accessor_in(&dir);
    let err = accessor
        .write_text(std::path::Path::new("rel.txt"), "x")
        .await
        .unwrap_err();
    assert!(matches!(err, FsError::InvalidPath(_)));
    assert!(!accessor.exists(std::path::Path::new("rel.txt")).await);
}
