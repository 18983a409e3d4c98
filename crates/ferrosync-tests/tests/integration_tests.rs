//! Integration tests for ferrosync
//!
//! These tests run complete sync passes against real temporary trees.

use ferrosync_config::{ConfigBuilder, ConfigLoader};
use ferrosync_sync::{ErrorKind, SyncConfig, SyncPhase, TaskKind, ThreadCount, STAGING_SUFFIX};
use ferrosync_tests::*;
use rstest::rstest;
use std::fs;
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn test_initial_mirror_of_empty_destination() {
    let fixture = SyncFixture::new();
    write_tree(&fixture.source, &[("a.txt", "hello"), ("sub/b.txt", "world")]);

    let stats = fixture.run(fixture.config()).await.unwrap();

    assert_eq!(
        read_tree(&fixture.destination),
        tree(&[("a.txt", "hello"), ("sub/b.txt", "world")])
    );
    assert_eq!(stats.files_copied, 2);
    assert_eq!(stats.files_deleted, 0);
    assert_eq!(stats.bytes_copied, 10);
    assert!(!stats.has_errors());
}

#[tokio::test]
async fn test_orphan_removed_and_current_file_skipped() {
    let fixture = SyncFixture::new();
    write_tree(&fixture.source, &[("a.txt", "hello")]);
    write_tree(&fixture.destination, &[("a.txt", "hello"), ("stale.txt", "x")]);
    copy_mtime(&fixture.source.join("a.txt"), &fixture.destination.join("a.txt"));

    let stats = fixture.run(fixture.config()).await.unwrap();

    assert_eq!(stats.files_copied, 0);
    assert_eq!(stats.files_deleted, 1);
    assert_eq!(stats.files_skipped, 1);
    assert_eq!(read_tree(&fixture.destination), tree(&[("a.txt", "hello")]));
}

#[rstest]
#[case::fast(false)]
#[case::verify(true)]
#[tokio::test]
async fn test_newer_source_replaces_destination(#[case] verify: bool) {
    let fixture = SyncFixture::new();
    write_tree(&fixture.destination, &[("a.txt", "v1")]);
    set_mtime_ago(&fixture.destination.join("a.txt"), HOUR);
    write_tree(&fixture.source, &[("a.txt", "v2")]);

    let stats = fixture
        .run(fixture.config().with_verify(verify))
        .await
        .unwrap();

    assert_eq!(stats.files_copied, 1);
    assert_eq!(read_tree(&fixture.destination), tree(&[("a.txt", "v2")]));
}

#[rstest]
#[case::fast(false)]
#[case::verify(true)]
#[tokio::test]
async fn test_second_run_is_a_no_op(#[case] verify: bool) {
    let fixture = SyncFixture::new();
    write_tree(
        &fixture.source,
        &[("a.txt", "hello"), ("sub/b.txt", "world"), ("sub/deep/c.bin", "!")],
    );
    write_tree(&fixture.destination, &[("orphan.txt", "bye")]);
    let config = fixture.config().with_verify(verify);

    let first = fixture.run(config.clone()).await.unwrap();
    let second = fixture.run(config).await.unwrap();

    assert_eq!(first.files_copied, 3);
    assert_eq!(first.files_deleted, 1);
    assert_eq!(second.files_copied, 0);
    assert_eq!(second.files_deleted, 0);
    assert_eq!(second.files_skipped, 3);
    assert!(!second.has_errors());
}

#[tokio::test]
async fn test_every_source_file_arrives_with_equal_content() {
    let fixture = SyncFixture::new();
    let mut files = Vec::new();
    for dir in ["", "one/", "one/two/", "three/"] {
        for i in 0..5 {
            files.push((format!("{}file{}.dat", dir, i), format!("{}:{}", dir, i).repeat(i + 1)));
        }
    }
    for (relative, content) in &files {
        write_file(&fixture.source, relative, content);
    }
    fs::create_dir_all(fixture.source.join("empty/nested")).unwrap();

    let stats = fixture
        .run(fixture.config().with_workers(ThreadCount::new(3).unwrap()))
        .await
        .unwrap();

    assert_eq!(stats.files_copied, files.len() as u64);
    assert_eq!(read_tree(&fixture.destination), read_tree(&fixture.source));
    assert!(fixture.destination.join("empty/nested").is_dir());
}

#[tokio::test]
async fn test_destination_only_files_are_pruned() {
    let fixture = SyncFixture::new();
    write_tree(&fixture.source, &[("keep.txt", "k")]);
    write_tree(
        &fixture.destination,
        &[("gone.txt", "1"), ("old/gone.txt", "2"), ("old/deeper/gone.txt", "3")],
    );

    let stats = fixture.run(fixture.config()).await.unwrap();

    assert_eq!(stats.files_deleted, 3);
    assert_eq!(read_tree(&fixture.destination), tree(&[("keep.txt", "k")]));
}

#[rstest]
#[case::atomic(true)]
#[case::in_place(false)]
#[tokio::test]
async fn test_counts_match_outcomes(#[case] atomic: bool) {
    let fixture = SyncFixture::new();
    write_tree(&fixture.source, &[("ok.txt", "fine"), ("clash", "file in source")]);
    // A directory where the source has a file makes that copy fail
    write_tree(&fixture.destination, &[("clash/inner.txt", "blocker")]);

    let (result, observer) = fixture
        .run_recorded(fixture.config().with_atomic_copy(atomic))
        .await;
    let stats = result.unwrap();

    assert_eq!(stats.files_copied, observer.count(TaskKind::Copy, true) as u64);
    assert_eq!(stats.files_deleted, observer.count(TaskKind::Delete, true) as u64);
    assert_eq!(
        stats.error_count(),
        observer.count(TaskKind::Copy, false) + observer.count(TaskKind::Delete, false)
    );
    assert_eq!(observer.count(TaskKind::Copy, false), 1);
    assert_eq!(stats.files_copied, 1);
    assert_eq!(fs::read_to_string(fixture.destination.join("ok.txt")).unwrap(), "fine");
    assert_eq!(observer.completed(), Some(stats));
}

#[cfg(unix)]
#[tokio::test]
async fn test_traversal_warnings_are_counted_once() {
    let fixture = SyncFixture::new();
    write_tree(&fixture.source, &[("ok.txt", "fine")]);
    std::os::unix::fs::symlink(fixture.source.join("nowhere"), fixture.source.join("broken"))
        .unwrap();
    fs::create_dir_all(&fixture.destination).unwrap();
    std::os::unix::fs::symlink(
        fixture.destination.join("nowhere"),
        fixture.destination.join("orphan_link"),
    )
    .unwrap();

    let (result, observer) = fixture
        .run_recorded(fixture.config().with_follow_symlinks(true))
        .await;
    let stats = result.unwrap();

    let failed = observer.count(TaskKind::Copy, false) + observer.count(TaskKind::Delete, false);
    let warnings = stats
        .errors
        .iter()
        .filter(|e| e.starts_with("Traversal warning"))
        .count();
    assert_eq!(stats.files_copied, 1);
    assert_eq!(warnings, 2);
    assert_eq!(stats.error_count(), failed + warnings);
    assert_eq!(stats.errors.iter().filter(|e| e.contains("broken")).count(), 1);
    assert_eq!(stats.errors.iter().filter(|e| e.contains("orphan_link")).count(), 1);
}

#[tokio::test]
async fn test_verify_skips_identical_content_with_older_mtime() {
    let fixture = SyncFixture::new();
    write_tree(&fixture.destination, &[("a.txt", "same")]);
    set_mtime_ago(&fixture.destination.join("a.txt"), HOUR);
    write_tree(&fixture.source, &[("a.txt", "same")]);

    let verified = fixture
        .run(fixture.config().with_verify(true))
        .await
        .unwrap();
    assert_eq!(verified.files_copied, 0);
    assert_eq!(verified.files_verified_identical, 1);

    let fast = fixture.run(fixture.config()).await.unwrap();
    assert_eq!(fast.files_copied, 1);
}

#[tokio::test]
async fn test_verify_catches_change_hidden_by_mtime() {
    let fixture = SyncFixture::new();
    write_tree(&fixture.source, &[("a.txt", "new content")]);
    set_mtime_ago(&fixture.source.join("a.txt"), HOUR);
    write_tree(&fixture.destination, &[("a.txt", "old content")]);

    let fast = fixture.run(fixture.config()).await.unwrap();
    assert_eq!(fast.files_copied, 0);

    let verified = fixture
        .run(fixture.config().with_verify(true))
        .await
        .unwrap();
    assert_eq!(verified.files_copied, 1);
    assert_eq!(
        fs::read_to_string(fixture.destination.join("a.txt")).unwrap(),
        "new content"
    );
}

#[tokio::test]
async fn test_compare_size_catches_shrunk_file() {
    let fixture = SyncFixture::new();
    write_tree(&fixture.source, &[("a.txt", "short")]);
    set_mtime_ago(&fixture.source.join("a.txt"), HOUR);
    write_tree(&fixture.destination, &[("a.txt", "much longer")]);

    let stats = fixture
        .run(fixture.config().with_compare_size(true))
        .await
        .unwrap();

    assert_eq!(stats.files_copied, 1);
    assert_eq!(read_tree(&fixture.destination), tree(&[("a.txt", "short")]));
}

#[rstest]
#[case::fast(false, vec![
    SyncPhase::Idle,
    SyncPhase::Scanning,
    SyncPhase::Classifying,
    SyncPhase::Copying,
    SyncPhase::Deleting,
    SyncPhase::Reporting,
    SyncPhase::Done,
])]
#[case::verify(true, vec![
    SyncPhase::Idle,
    SyncPhase::Scanning,
    SyncPhase::Classifying,
    SyncPhase::Verifying,
    SyncPhase::Copying,
    SyncPhase::Deleting,
    SyncPhase::Reporting,
    SyncPhase::Done,
])]
#[tokio::test]
async fn test_phases_run_in_order(#[case] verify: bool, #[case] expected: Vec<SyncPhase>) {
    let fixture = SyncFixture::new();
    write_tree(&fixture.source, &[("a.txt", "hello")]);
    write_tree(&fixture.destination, &[("a.txt", "hello")]);

    let (result, observer) = fixture
        .run_recorded(fixture.config().with_verify(verify))
        .await;

    assert!(result.is_ok());
    assert_eq!(observer.phases(), expected);
}

#[tokio::test]
async fn test_missing_source_is_fatal() {
    let fixture = SyncFixture::new();
    fs::remove_dir(&fixture.source).unwrap();

    let (result, observer) = fixture.run_recorded(fixture.config()).await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::Config);
    assert_eq!(observer.phases().last(), Some(&SyncPhase::Aborted));
    assert!(observer.completed().is_none());
    assert!(!fixture.destination.exists());
}

#[tokio::test]
async fn test_copies_keep_timestamps_and_leave_no_staging_files() {
    let fixture = SyncFixture::new();
    let source_file = write_file(&fixture.source, "sub/a.txt", "hello");
    set_mtime_ago(&source_file, HOUR * 24);

    fixture.run(fixture.config()).await.unwrap();

    let copied = fixture.destination.join("sub/a.txt");
    assert_eq!(
        fs::metadata(&source_file).unwrap().modified().unwrap(),
        fs::metadata(&copied).unwrap().modified().unwrap()
    );
    assert!(read_tree(&fixture.destination)
        .keys()
        .all(|name| !name.ends_with(STAGING_SUFFIX)));
}

#[rstest]
#[case::atomic(true)]
#[case::in_place(false)]
#[tokio::test]
async fn test_files_named_like_staging_files_are_mirrored(#[case] atomic: bool) {
    let fixture = SyncFixture::new();
    let files = [("a.txt", "real"), (".a.txt.ferrosync-tmp", "also real")];
    write_tree(&fixture.source, &files);
    let config = fixture
        .config()
        .with_atomic_copy(atomic)
        .with_workers(ThreadCount::new(1).unwrap());

    let first = fixture.run(config.clone()).await.unwrap();
    let second = fixture.run(config).await.unwrap();

    assert_eq!(first.files_copied, 2);
    assert!(!first.has_errors());
    assert_eq!(read_tree(&fixture.destination), tree(&files));
    assert_eq!(second.files_copied, 0);
    assert_eq!(second.files_deleted, 0);
}

#[tokio::test]
async fn test_source_nested_in_destination_is_fatal() {
    let fixture = SyncFixture::new();
    let source = fixture.destination.join("inner");
    write_tree(&source, &[("f.txt", "precious")]);

    let (result, observer) = fixture
        .run_recorded(SyncConfig::new(&source, &fixture.destination))
        .await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::Config);
    assert_eq!(observer.phases().last(), Some(&SyncPhase::Aborted));
    assert!(observer.outcomes().is_empty());
    assert_eq!(read_tree(&source), tree(&[("f.txt", "precious")]));
}

#[tokio::test]
async fn test_configuration_file_drives_a_run() {
    let fixture = SyncFixture::new();
    write_tree(&fixture.source, &[("a.txt", "hello")]);
    let config_path = fixture.temp_dir.path().join("ferrosync.yaml");

    let mut config = ConfigBuilder::new().add_defaults().build().unwrap();
    config.sync.source = Some(fixture.source.clone());
    config.sync.destination = Some(fixture.destination.clone());
    config.sync.verify = true;
    ConfigLoader::save_to_file(&config, &config_path).unwrap();

    let loaded = ConfigLoader::load_from_file(&config_path).unwrap();
    assert_eq!(loaded, config);

    let stats = fixture
        .run(loaded.into_sync_config().unwrap())
        .await
        .unwrap();
    assert_eq!(stats.files_copied, 1);
    assert_eq!(read_tree(&fixture.destination), tree(&[("a.txt", "hello")]));
}
