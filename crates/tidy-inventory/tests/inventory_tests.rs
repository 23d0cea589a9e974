use pretty_assertions::assert_eq;
use tidy_inventory::{InventoryProvider, LocalWalkProvider, create_snapshot, load_snapshot};
use tidy_test_utils::TestTree;

#[test]
fn test_local_walk_order_is_deterministic() {
    let tree = TestTree::new();
    tree.write("z.txt", "z");
    tree.write("a/b.tmp", "b");
    tree.write("a/a.bak", "a");
    tree.write("m.tmp", "m");

    let provider = LocalWalkProvider::new();
    let first: Vec<_> = provider.enumerate(tree.root()).unwrap().into_iter().map(|r| r.path).collect();
    let second: Vec<_> = provider.enumerate(tree.root()).unwrap().into_iter().map(|r| r.path).collect();

    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}

#[test]
fn test_local_walk_hashes_when_asked() {
    let tree = TestTree::new();
    tree.write("a.txt", "hello world");

    let records = LocalWalkProvider::new()
        .with_hashing(true)
        .enumerate(tree.root())
        .unwrap();

    assert_eq!(
        records[0].content_hash.as_deref(),
        Some("sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9")
    );
    assert_eq!(records[0].size_bytes, 11);
}

#[test]
fn test_snapshot_round_trips_and_detects_change() {
    let tree = TestTree::new();
    tree.write("a.txt", "one");
    let before_path = tree.root().join("_meta/snapshots/before.json");
    let after_path = tree.root().join("_meta/snapshots/after.json");

    let before = create_snapshot(tree.root(), &before_path, true).unwrap();
    tree.write("a.txt", "two");
    let after = create_snapshot(tree.root(), &after_path, true).unwrap();

    assert_eq!(load_snapshot(&before_path).unwrap(), before);
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].path, "a.txt");
    assert_ne!(before[0].content_hash, after[0].content_hash);
}

#[test]
fn test_snapshot_excludes_meta_tree() {
    let tree = TestTree::new();
    tree.write("keep.txt", "k");
    tree.write("_meta/plans/plan_x.json", "{}");

    let entries = create_snapshot(tree.root(), &tree.root().join("_meta/snapshots/s.json"), false).unwrap();

    let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["keep.txt"]);
    assert!(entries[0].content_hash.is_none());
}
