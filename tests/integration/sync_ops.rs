use super::test_helpers::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use shotsync::{Direction, SyncError, SyncOptions};
use std::collections::BTreeSet;
use walkdir::WalkDir;

fn relative_files(root: &std::path::Path) -> BTreeSet<String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[tokio::test]
async fn test_upload_issues_one_put_per_image() {
    let env = TestEnv::new();
    let folder = env.local_tree(
        "screens",
        &[
            ("a.png", b"aaa"),
            ("b/c.png", b"cc"),
            ("b/d/e.png", b"e"),
            ("notes.txt", b"not an image"),
            ("b/thumb.png.bak", b"backup"),
        ],
    );

    let report = env
        .sync
        .upload_new_screenshots("run1", &folder)
        .await
        .expect("upload failed");

    assert_eq!(report.direction, Direction::Upload);
    assert_eq!(env.store.put_count(), 3);
    assert_eq!(
        env.store.keys(),
        vec!["run1/a.png", "run1/b/c.png", "run1/b/d/e.png"]
    );
    assert_eq!(&env.store.object("run1/b/c.png").unwrap()[..], b"cc");
    assert_eq!(report.succeeded().count(), 3);
}

#[tokio::test]
async fn test_upload_empty_folder_is_noop() {
    let env = TestEnv::new();
    let folder = env.local_tree("empty", &[("readme.txt", b"hi")]);

    let report = env
        .sync
        .upload_new_screenshots("run1", &folder)
        .await
        .expect("upload failed");

    assert!(report.outcomes.is_empty());
    assert!(report.is_success());
    assert_eq!(env.store.put_count(), 0);
}

#[tokio::test]
async fn test_download_writes_every_matching_key() {
    let env = TestEnv::new();
    env.store.insert("run1/a.png", "a");
    env.store.insert("run1/nested/deep/b.png", "bb");
    env.store.insert("run1/log.txt", "skip");
    env.store.insert("run10/c.png", "other dir");

    let out = env.temp_dir.child("out");
    let report = env.sync.download_screenshots("run1", out.path()).await;

    assert!(report.is_success());
    assert_eq!(env.store.get_count(), 2);
    out.child("a.png").assert(predicate::path::exists());
    out.child("nested/deep/b.png").assert("bb");
    out.child("log.txt").assert(predicate::path::missing());
    out.child("c.png").assert(predicate::path::missing());
}

#[tokio::test]
async fn test_round_trip_preserves_paths_and_bytes() {
    let env = TestEnv::new();
    let source = env.local_tree(
        "source",
        &[
            ("home.png", &[0x89, b'P', b'N', b'G', 1, 2, 3]),
            ("pages/login.png", &[9u8; 2048]),
            ("pages/settings/dark.png", b"dark"),
        ],
    );
    let target = env.temp_dir.child("target");

    env.sync
        .upload_new_screenshots("baseline", &source)
        .await
        .expect("upload failed");
    let report = env.sync.download_screenshots("baseline", target.path()).await;
    assert!(report.is_success());

    let uploaded = relative_files(&source);
    assert_eq!(uploaded, relative_files(target.path()));
    for path in uploaded {
        assert_eq!(
            std::fs::read(source.join(&path)).unwrap(),
            std::fs::read(target.path().join(&path)).unwrap(),
            "contents differ for {}",
            path
        );
    }
}

#[tokio::test]
async fn test_broken_object_does_not_stop_siblings() {
    let env = TestEnv::new();
    env.store.insert("run1/good-1.png", "one");
    env.store.insert("run1/bad.png", vec![1u8; 32]);
    env.store.insert("run1/good-2.png", "two");
    env.store.break_reads_of("run1/bad.png");

    let out = env.temp_dir.child("out");
    let report = env.sync.download_screenshots("run1", out.path()).await;

    assert_eq!(report.succeeded().count(), 2);
    let failed: Vec<_> = report.failed().map(|o| o.item.key.as_str()).collect();
    assert_eq!(failed, vec!["run1/bad.png"]);
    out.child("good-1.png").assert("one");
    out.child("good-2.png").assert("two");
    out.child("bad.png").assert(predicate::path::missing());
}

#[tokio::test]
async fn test_download_with_invalid_access_writes_nothing() {
    let env = TestEnv::new();
    env.store.insert("run1/a.png", "a");
    env.store.deny_access(true);

    let out = env.temp_dir.child("out");
    let report = env.sync.download_screenshots("run1", out.path()).await;

    assert_eq!(report.aborted.as_deref(), Some("storage access is invalid"));
    assert!(report.outcomes.is_empty());
    assert_eq!(env.store.get_count(), 0);
    out.assert(predicate::path::missing());
}

#[tokio::test]
async fn test_upload_with_invalid_access_propagates() {
    let env = TestEnv::new();
    let folder = env.local_tree("screens", &[("a.png", b"a")]);
    env.store.deny_access(true);

    let err = env
        .sync
        .upload_new_screenshots("run1", &folder)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::AccessInvalid(_)));
    assert_eq!(env.store.put_count(), 0);
}

#[tokio::test]
async fn test_custom_extensions() {
    let env = TestEnv::with_options(SyncOptions::default().with_extensions(["jpg", "webp"]));
    let folder = env.local_tree(
        "mixed",
        &[("a.jpg", b"j"), ("b.webp", b"w"), ("c.png", b"p")],
    );

    env.sync
        .upload_new_screenshots("mixed", &folder)
        .await
        .expect("upload failed");

    assert_eq!(env.store.keys(), vec!["mixed/a.jpg", "mixed/b.webp"]);
}

#[tokio::test]
async fn test_extension_match_is_case_sensitive() {
    let env = TestEnv::new();
    let folder = env.local_tree(
        "screens",
        &[("a.png", b"a"), ("upper.PNG", b"upper"), ("b.Png", b"mixed")],
    );
    env.store.insert("remote/c.png", "c");
    env.store.insert("remote/D.PNG", "upper");

    env.sync
        .upload_new_screenshots("run1", &folder)
        .await
        .expect("upload failed");
    assert_eq!(env.store.put_count(), 1);
    assert!(env.store.object("run1/a.png").is_some());
    assert!(env.store.object("run1/upper.PNG").is_none());

    let out = env.temp_dir.child("out");
    let report = env.sync.download_screenshots("remote", out.path()).await;
    assert_eq!(report.outcomes.len(), 1);
    out.child("c.png").assert("c");
    out.child("D.PNG").assert(predicate::path::missing());
}

#[cfg(unix)]
#[tokio::test]
async fn test_dangling_symlink_does_not_abort_upload() {
    let env = TestEnv::new();
    let folder = env.local_tree("screens", &[("a.png", b"a"), ("b.png", b"b")]);
    std::os::unix::fs::symlink(folder.join("gone.txt"), folder.join("stale-link.txt")).unwrap();
    std::os::unix::fs::symlink(folder.join("gone.png"), folder.join("stale-link.png")).unwrap();

    let report = env
        .sync
        .upload_new_screenshots("run1", &folder)
        .await
        .expect("upload failed");

    assert!(report.is_success());
    assert_eq!(env.store.keys(), vec!["run1/a.png", "run1/b.png"]);
}

#[tokio::test]
async fn test_failed_put_does_not_stop_siblings() {
    let env = TestEnv::new();
    let folder = env.local_tree(
        "screens",
        &[("a.png", b"a"), ("b/rejected.png", b"r"), ("c.png", b"c")],
    );
    env.store.break_puts_of("run1/b/rejected.png");

    let report = env
        .sync
        .upload_new_screenshots("run1", &folder)
        .await
        .expect("upload failed");

    assert_eq!(env.store.put_count(), 3);
    assert_eq!(env.store.keys(), vec!["run1/a.png", "run1/c.png"]);
    assert_eq!(report.succeeded().count(), 2);
    let failed: Vec<_> = report.failed().map(|o| o.item.key.as_str()).collect();
    assert_eq!(failed, vec!["run1/b/rejected.png"]);
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_keys_sharing_a_local_file_download_once() {
    let env = TestEnv::new();
    env.store.insert("run1//a.png", "first");
    env.store.insert("run1/a.png", "second");
    env.store.insert("run1/b.png", "b");

    let out = env.temp_dir.child("out");
    let report = env.sync.download_screenshots("run1", out.path()).await;

    assert_eq!(env.store.get_count(), 2);
    assert_eq!(report.succeeded().count(), 2);
    let failed: Vec<_> = report.failed().map(|o| o.item.key.as_str()).collect();
    assert_eq!(failed, vec!["run1/a.png"]);
    out.child("a.png").assert("first");
    out.child("b.png").assert("b");
}

#[tokio::test]
async fn test_sequential_pool_transfers_everything() {
    let env = TestEnv::with_options(SyncOptions::default().with_concurrency(1));
    let files: Vec<(String, Vec<u8>)> = (0..20)
        .map(|i| (format!("shot-{:02}.png", i), vec![i as u8; 16]))
        .collect();
    let borrowed: Vec<(&str, &[u8])> = files
        .iter()
        .map(|(name, body)| (name.as_str(), body.as_slice()))
        .collect();
    let folder = env.local_tree("many", &borrowed);

    let report = env
        .sync
        .upload_new_screenshots("many", &folder)
        .await
        .expect("upload failed");

    assert_eq!(report.outcomes.len(), 20);
    assert_eq!(report.total_bytes(), 20 * 16);
    assert_eq!(env.store.put_count(), 20);
}
