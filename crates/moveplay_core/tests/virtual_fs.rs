use moveplay_core::{FsError, MemoryRuntime, ProjectId, Runtime, VirtualFilesystem};
use std::sync::Arc;

async fn setup() -> (Arc<MemoryRuntime>, ProjectId, VirtualFilesystem) {
    let runtime = Arc::new(MemoryRuntime::new());
    let project = runtime.create_project("demo").await.unwrap();
    let fs = VirtualFilesystem::new(runtime.clone(), project);
    (runtime, project, fs)
}

#[tokio::test]
async fn get_or_create_dir_is_idempotent_without_second_mutation() {
    let (runtime, _project, mut fs) = setup().await;
    let root = fs.tree().await.unwrap().clone();

    let first = fs.get_or_create_dir(&root, "scripts").await.unwrap();
    assert!(first.is_provisional());
    assert_eq!(runtime.mutation_count(), 1);

    let root = fs.tree().await.unwrap().clone();
    let second = fs.get_or_create_dir(&root, "scripts").await.unwrap();
    assert_eq!(first.id, second.id);
    assert!(!second.is_provisional());
    assert_eq!(runtime.mutation_count(), 1);
}

#[tokio::test]
async fn resolve_path_creates_intermediate_directories_once() {
    let (runtime, _project, mut fs) = setup().await;
    let root = fs.tree().await.unwrap().clone();

    let file = fs.resolve_path(&root, "a/b/c.move").await.unwrap();
    assert_eq!(file.name, "c.move");
    assert!(!file.is_provisional());

    let tree = fs.tree().await.unwrap().clone();
    let a = tree.child_dir("a").unwrap();
    let b = a.child_dir("b").unwrap();
    assert_eq!(b.child_file("c.move").map(|f| f.id), Some(file.id));
    let mutations = runtime.mutation_count();
    assert_eq!(mutations, 3);

    let again = fs.resolve_path(&tree, "a/b/c.move").await.unwrap();
    assert_eq!(again.id, file.id);
    assert_eq!(runtime.mutation_count(), mutations);
}

#[tokio::test]
async fn same_name_under_same_parent_resolves_to_one_node() {
    let (_runtime, _project, mut fs) = setup().await;
    let root = fs.tree().await.unwrap().clone();

    let first = fs.resolve_path(&root, "main.move").await.unwrap();
    let root = fs.tree().await.unwrap().clone();
    let second = fs.resolve_path(&root, "main.move").await.unwrap();

    assert_eq!(first.id, second.id);
    let tree = fs.tree().await.unwrap();
    assert_eq!(
        tree.list.iter().filter(|node| node.name() == "main.move").count(),
        1
    );
}

#[tokio::test]
async fn file_creation_reloads_and_directory_creation_only_marks_dirty() {
    let (_runtime, _project, mut fs) = setup().await;
    let root = fs.tree().await.unwrap().clone();
    assert!(!fs.is_dirty());

    fs.get_or_create_dir(&root, "docs").await.unwrap();
    assert!(fs.is_dirty());
    assert!(fs.cached().unwrap().child_dir("docs").is_none());

    fs.resolve_path(&root, "readme.move").await.unwrap();
    assert!(!fs.is_dirty());
    let cached = fs.cached().unwrap();
    assert!(cached.child_dir("docs").is_some());
    assert!(cached.child_file("readme.move").is_some());
}

#[tokio::test]
async fn rename_returns_confirmed_descriptor_and_marks_dirty() {
    let (_runtime, _project, mut fs) = setup().await;
    let root = fs.tree().await.unwrap().clone();
    let file = fs.resolve_path(&root, "old.move").await.unwrap();

    let renamed = fs.rename(&file, "new.move").await.unwrap();
    assert_eq!(renamed.id, file.id);
    assert_eq!(renamed.name, "new.move");
    assert!(fs.is_dirty());

    let tree = fs.tree().await.unwrap();
    assert!(tree.child_file("old.move").is_none());
    assert_eq!(tree.child_file("new.move").map(|f| f.id), Some(file.id));
}

#[tokio::test]
async fn removed_file_is_recreated_with_new_id() {
    let (_runtime, _project, mut fs) = setup().await;
    let root = fs.tree().await.unwrap().clone();
    let file = fs.resolve_path(&root, "src/a.move").await.unwrap();

    fs.remove(file.id).await.unwrap();
    assert!(fs.is_dirty());

    let root = fs.tree().await.unwrap().clone();
    let recreated = fs.resolve_path(&root, "src/a.move").await.unwrap();
    assert_ne!(recreated.id, file.id);
}

#[tokio::test]
async fn clear_replaces_tree_with_empty_root() {
    let (_runtime, _project, mut fs) = setup().await;
    let root = fs.tree().await.unwrap().clone();
    fs.resolve_path(&root, "a/b.move").await.unwrap();

    fs.clear("demo").await.unwrap();
    let tree = fs.tree().await.unwrap();
    assert_eq!(tree.id, root.id);
    assert_eq!(tree.name, "demo");
    assert!(tree.list.is_empty());
}

#[tokio::test]
async fn invalid_paths_fail_before_runtime_calls() {
    let (runtime, _project, mut fs) = setup().await;
    let root = fs.tree().await.unwrap().clone();

    for path in ["", "a//b.move", "/abs.move", "dir/"] {
        let err = fs.resolve_path(&root, path).await.unwrap_err();
        assert!(matches!(err, FsError::InvalidPath(_)), "{path}");
    }
    assert_eq!(runtime.mutation_count(), 0);
}

#[tokio::test]
async fn runtime_failures_propagate_unchanged() {
    let (runtime, project, mut fs) = setup().await;
    let root = fs.tree().await.unwrap().clone();
    runtime.add_dir(project, root.id, "taken.move").await.unwrap();

    let err = fs.resolve_path(&root, "taken.move").await.unwrap_err();
    match err {
        FsError::Runtime(inner) => assert!(inner.message().contains("already exists")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(fs.cached().unwrap().child("taken.move").is_none());
}

#[tokio::test]
async fn mark_dirty_picks_up_external_changes() {
    let (runtime, project, mut fs) = setup().await;
    let root_id = fs.tree().await.unwrap().id;
    let external = runtime.add_file(project, root_id, "external.move").await.unwrap();

    assert!(fs.find_file(external).await.unwrap().is_none());
    fs.mark_dirty();
    assert!(fs.is_dirty());
    assert_eq!(
        fs.find_file(external).await.unwrap().map(|f| f.name),
        Some("external.move".to_string())
    );
}

#[tokio::test]
async fn resolving_twice_with_original_root_reuses_nodes() {
    let (runtime, project, mut fs) = setup().await;
    assert_eq!(fs.project(), project);
    let root = fs.tree().await.unwrap().clone();

    let first = fs.resolve_path(&root, "a/b/c.move").await.unwrap();
    let mutations = runtime.mutation_count();
    let again = fs.resolve_path(&root, "a/b/c.move").await.unwrap();

    assert_eq!(again.id, first.id);
    assert_eq!(runtime.mutation_count(), mutations);
}

#[tokio::test]
async fn stale_root_sees_directory_created_earlier() {
    let (runtime, _project, mut fs) = setup().await;
    let root = fs.tree().await.unwrap().clone();

    let scripts = fs.get_or_create_dir(&root, "scripts").await.unwrap();
    assert!(fs.is_dirty());
    let file = fs.resolve_path(&root, "scripts/main.move").await.unwrap();

    let tree = fs.tree().await.unwrap();
    assert_eq!(tree.list.len(), 1);
    assert_eq!(
        tree.child_dir("scripts").and_then(|dir| dir.child_file("main.move")).map(|f| f.id),
        Some(file.id)
    );
    assert_eq!(tree.child_dir("scripts").map(|dir| dir.id), Some(scripts.id));
    assert_eq!(runtime.mutation_count(), 2);
}
