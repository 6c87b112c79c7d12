//! End-to-end sync scenarios
//!
//! Every scenario runs the full engine against the in-memory photo service
//! and a real temporary directory.

use albumsync_sync::checksum::{content_checksum, encode};
use albumsync_sync::memory::SMALL_JPG;
use albumsync_sync::{MemoryPhotoService, SyncEngine, SyncOptions, SyncRequest};
use albumsync_sync::StatusEvent;
use albumsync_tests::{
    name_set, run_sync, run_sync_with, seeded, DelayedUploads, PhotoDir, ALBUM,
};
use albumsync_types::{Concurrency, Error, Operation, PhotoService, SyncMode};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;

fn push() -> SyncOptions {
    SyncOptions::new(SyncMode::push())
}

fn pull() -> SyncOptions {
    SyncOptions::new(SyncMode::pull())
}

#[tokio::test]
async fn test_push_then_push_again_is_idempotent() {
    let dir = PhotoDir::with_photos(&["a.jpg", "b.jpg", "c.png"]).unwrap();
    let service = Arc::new(MemoryPhotoService::new());
    let options = SyncOptions::new(SyncMode::push().with_checksum(true)).with_tag("family");

    let first = run_sync(&service, &dir, options.clone()).await;
    let report = first.result.unwrap();
    assert_eq!(report.stats.uploaded, 3);

    let contents = service.album_contents(ALBUM).await;
    let checksum_tag = encode(&content_checksum(SMALL_JPG));
    for photo in contents.values() {
        assert_eq!(photo.tags, vec!["family".to_string(), checksum_tag.clone()]);
    }

    let second = run_sync(&service, &dir, options).await;
    let report = second.result.unwrap();
    assert!(report.was_in_sync());
    assert_eq!(report.stats.transfers(), 0);
    assert!(second.narration.is_empty());
    assert_eq!(service.upload_count().await, 3);
}

#[tokio::test]
async fn test_pull_then_pull_again_is_idempotent() {
    let dir = PhotoDir::new().unwrap();
    let service = Arc::new(MemoryPhotoService::new());
    service.seed_album(ALBUM, seeded(&["x.jpg", "y.jpg"])).await;

    let report = run_sync(&service, &dir, pull()).await.result.unwrap();
    assert_eq!(report.stats.downloaded, 2);
    assert_eq!(dir.names().unwrap(), name_set(&["x.jpg", "y.jpg"]));
    assert_eq!(dir.read("x.jpg").unwrap(), SMALL_JPG);

    let report = run_sync(&service, &dir, pull()).await.result.unwrap();
    assert!(report.was_in_sync());
    assert_eq!(service.download_count().await, 2);
}

async fn mixed_state(seed_album: bool) -> (Arc<MemoryPhotoService>, PhotoDir) {
    let dir = PhotoDir::with_photos(&["edited.jpg", "local.jpg"]).unwrap();
    let service = Arc::new(MemoryPhotoService::new());
    if seed_album {
        service
            .seed_album(
                ALBUM,
                vec![
                    (
                        "edited.jpg",
                        b"old".to_vec(),
                        vec!["checksum:md5=00000000".to_string()],
                    ),
                    ("remote.jpg", SMALL_JPG.to_vec(), Vec::new()),
                ],
            )
            .await;
    }
    (service, dir)
}

#[rstest]
#[case::existing_album(true)]
#[case::missing_album(false)]
#[tokio::test]
async fn test_dry_run_narrates_what_the_real_run_does(#[case] seed_album: bool) {
    let options = SyncOptions::new(SyncMode::push().with_prune(true).with_checksum(true));

    let (service, dir) = mixed_state(seed_album).await;
    let before = service.album_contents(ALBUM).await;
    let dry = run_sync(&service, &dir, options.clone().with_dry_run(true)).await;
    let dry_report = dry.result.as_ref().unwrap();
    assert!(dry_report.dry_run);
    assert_eq!(service.upload_count().await, 0);
    assert_eq!(service.delete_count().await, 0);
    assert_eq!(service.album_contents(ALBUM).await, before);

    let (service, dir) = mixed_state(seed_album).await;
    let real = run_sync(&service, &dir, options).await;
    let real_report = real.result.as_ref().unwrap();

    assert_eq!(dry.sorted_narration(), real.sorted_narration());
    assert_eq!(dry_report.stats.uploaded, real_report.stats.uploaded);
    assert_eq!(dry_report.stats.deleted_remote, real_report.stats.deleted_remote);
    assert_eq!(
        service.album_contents(ALBUM).await.keys().collect::<Vec<_>>(),
        vec!["edited.jpg", "local.jpg"]
    );
}

#[tokio::test]
async fn test_push_with_checksum_replaces_edited_photo() {
    let (service, dir) = mixed_state(true).await;
    let options = SyncOptions::new(SyncMode::push().with_checksum(true));

    let report = run_sync(&service, &dir, options).await.result.unwrap();

    assert_eq!(report.mismatched, 1);
    assert_eq!(report.stats.deleted_remote, 1);
    assert_eq!(report.stats.uploaded, 2);
    let contents = service.album_contents(ALBUM).await;
    assert_eq!(contents["edited.jpg"].content, SMALL_JPG);
    assert!(contents.contains_key("remote.jpg"));
}

#[tokio::test]
async fn test_push_deletes_stale_copies_before_reuploading_and_prunes_last() {
    let (service, dir) = mixed_state(true).await;
    let options = SyncOptions::new(SyncMode::push().with_checksum(true).with_prune(true));

    run_sync(&service, &dir, options).await.result.unwrap();

    let op = |operation, title: &str| (operation, title.to_string());
    assert_eq!(
        service.operations().await,
        vec![
            op(Operation::Upload, "local.jpg"),
            op(Operation::DeleteRemote, "edited.jpg"),
            op(Operation::Upload, "edited.jpg"),
            op(Operation::DeleteRemote, "remote.jpg"),
        ]
    );
}

#[tokio::test]
async fn test_vanished_album_is_recreated_once_by_concurrent_reuploads() {
    let names = ["a.jpg", "b.jpg", "c.jpg", "d.jpg"];
    let dir = PhotoDir::with_photos(&names).unwrap();
    let memory = Arc::new(MemoryPhotoService::new());
    let stale = names
        .iter()
        .map(|name| {
            (
                *name,
                b"old".to_vec(),
                vec!["checksum:md5=00000000".to_string()],
            )
        })
        .collect();
    memory.seed_album(ALBUM, stale).await;

    let service = Arc::new(DelayedUploads::new(memory.clone(), Duration::from_millis(50)));
    let options = SyncOptions::new(SyncMode::push().with_checksum(true))
        .with_concurrency(Concurrency::new(4).unwrap());
    let report = run_sync_with(service, &dir, options).await.result.unwrap();

    assert_eq!(report.stats.deleted_remote, 4);
    assert_eq!(report.stats.uploaded, 4);
    assert_eq!(memory.albums_created().await, 1);
    let contents = memory.album_contents(ALBUM).await;
    assert_eq!(contents.len(), 4);
    assert!(contents.values().all(|photo| photo.content == SMALL_JPG));
}

#[tokio::test]
async fn test_names_alone_ignore_edits() {
    let (service, dir) = mixed_state(true).await;

    let report = run_sync(&service, &dir, push()).await.result.unwrap();

    assert_eq!(report.mismatched, 0);
    assert_eq!(report.stats.uploaded, 1);
    assert_eq!(service.album_contents(ALBUM).await["edited.jpg"].content, b"old");
}

#[tokio::test]
async fn test_pull_with_checksum_replaces_local_edit() {
    let dir = PhotoDir::new().unwrap();
    dir.write("a.jpg", b"edited locally").unwrap();
    let service = Arc::new(MemoryPhotoService::new());
    service
        .seed_album(
            ALBUM,
            vec![(
                "a.jpg",
                SMALL_JPG.to_vec(),
                vec![encode(&content_checksum(SMALL_JPG))],
            )],
        )
        .await;

    let options = SyncOptions::new(SyncMode::pull().with_checksum(true));
    let report = run_sync(&service, &dir, options).await.result.unwrap();

    assert_eq!(report.stats.deleted_local, 1);
    assert_eq!(report.stats.downloaded, 1);
    assert_eq!(dir.read("a.jpg").unwrap(), SMALL_JPG);
}

#[tokio::test]
async fn test_pull_deletes_local_edits_before_downloading_and_prunes_last() {
    let dir = PhotoDir::new().unwrap();
    dir.write("edited.jpg", b"edited locally").unwrap();
    dir.write("gone.jpg", SMALL_JPG).unwrap();
    let service = Arc::new(MemoryPhotoService::new());
    service
        .seed_album(
            ALBUM,
            vec![
                (
                    "edited.jpg",
                    SMALL_JPG.to_vec(),
                    vec![encode(&content_checksum(SMALL_JPG))],
                ),
                ("new.jpg", SMALL_JPG.to_vec(), Vec::new()),
            ],
        )
        .await;

    let options = SyncOptions::new(SyncMode::pull().with_checksum(true).with_prune(true));
    let outcome = run_sync(&service, &dir, options).await;
    outcome.result.unwrap();

    let downloading = |title: &str| {
        StatusEvent::Downloading {
            title: title.to_string(),
        }
        .to_string()
    };
    let deleting = |name: &str| format!("Deleting from local: {}", dir.join(name).display());
    assert_eq!(
        outcome.narration,
        vec![
            downloading("new.jpg"),
            deleting("edited.jpg"),
            downloading("edited.jpg"),
            deleting("gone.jpg"),
        ]
    );
    assert_eq!(dir.names().unwrap(), name_set(&["edited.jpg", "new.jpg"]));
    assert_eq!(dir.read("edited.jpg").unwrap(), SMALL_JPG);
}

#[tokio::test]
async fn test_push_and_pull_exchange_both_ways() {
    let dir = PhotoDir::with_photos(&["l.jpg"]).unwrap();
    let service = Arc::new(MemoryPhotoService::new());
    service.seed_album(ALBUM, seeded(&["r.jpg"])).await;

    let options = SyncOptions::new(SyncMode {
        push: true,
        pull: true,
        ..SyncMode::default()
    });
    let report = run_sync(&service, &dir, options).await.result.unwrap();

    assert_eq!(report.stats.uploaded, 1);
    assert_eq!(report.stats.downloaded, 1);
    assert_eq!(dir.names().unwrap(), name_set(&["l.jpg", "r.jpg"]));
    assert_eq!(
        service.album_contents(ALBUM).await.keys().collect::<Vec<_>>(),
        vec!["l.jpg", "r.jpg"]
    );
    assert_eq!(
        service.operations().await,
        vec![
            (Operation::Upload, "l.jpg".to_string()),
            (Operation::Download, "r.jpg".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_pull_with_sync_prunes_local() {
    let dir = PhotoDir::with_photos(&["gone.jpg", "shared.jpg"]).unwrap();
    let service = Arc::new(MemoryPhotoService::new());
    service
        .seed_album(ALBUM, seeded(&["shared.jpg", "new.jpg"]))
        .await;

    let outcome = run_sync(&service, &dir, SyncOptions::new(SyncMode::pull().with_prune(true))).await;
    let report = outcome.result.unwrap();

    assert_eq!(report.stats.downloaded, 1);
    assert_eq!(report.stats.deleted_local, 1);
    assert_eq!(dir.names().unwrap(), name_set(&["new.jpg", "shared.jpg"]));
    assert!(outcome
        .narration
        .iter()
        .any(|line| line.starts_with("Deleting from local: ") && line.ends_with("gone.jpg")));
}

#[tokio::test]
async fn test_push_with_sync_can_empty_the_album() {
    let dir = PhotoDir::new().unwrap();
    let service = Arc::new(MemoryPhotoService::new());
    service.seed_album(ALBUM, seeded(&["a.jpg", "b.jpg"])).await;

    let options = SyncOptions::new(SyncMode::push().with_prune(true));
    let report = run_sync(&service, &dir, options.clone()).await.result.unwrap();
    assert_eq!(report.stats.deleted_remote, 2);
    assert_eq!(service.find_album(ALBUM).await.unwrap(), None);

    let report = run_sync(&service, &dir, options).await.result.unwrap();
    assert!(report.was_in_sync());
    assert_eq!(report.album_id, None);
}

#[tokio::test]
async fn test_failed_upload_does_not_stop_the_batch() {
    let dir = PhotoDir::with_photos(&["a.jpg", "bad.jpg", "c.jpg"]).unwrap();
    let service = Arc::new(MemoryPhotoService::new());
    service.seed_album(ALBUM, seeded(&["existing.jpg"])).await;
    service.fail_uploads_of("bad.jpg").await;

    let outcome = run_sync(&service, &dir, push()).await;
    let error = outcome.result.unwrap_err();

    assert!(matches!(error, Error::Batch { .. }));
    let failures = error.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].operation, Operation::Upload);
    assert_eq!(failures[0].title, "bad.jpg");
    assert_eq!(
        service.album_contents(ALBUM).await.keys().collect::<Vec<_>>(),
        vec!["a.jpg", "c.jpg", "existing.jpg"]
    );
}

#[tokio::test]
async fn test_failed_download_does_not_stop_the_batch() {
    let dir = PhotoDir::new().unwrap();
    let service = Arc::new(MemoryPhotoService::new());
    service
        .seed_album(ALBUM, seeded(&["a.jpg", "private.jpg", "z.jpg"]))
        .await;
    service.fail_downloads_of("private.jpg").await;

    let error = run_sync(&service, &dir, pull()).await.result.unwrap_err();

    let failures = error.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].operation, Operation::Download);
    assert_eq!(dir.names().unwrap(), name_set(&["a.jpg", "z.jpg"]));
}

#[tokio::test]
async fn test_skips_are_not_failures() {
    let dir = PhotoDir::with_photos(&["a.jpg", "broken.jpg"]).unwrap();
    dir.write("notes.txt", b"shopping list").unwrap();
    let service = Arc::new(MemoryPhotoService::new());
    service.reject_uploads_of("broken.jpg").await;

    let outcome = run_sync(&service, &dir, push()).await;
    let report = outcome.result.unwrap();

    assert_eq!(report.stats.uploaded, 1);
    assert_eq!(report.stats.skipped, 2);
    assert_eq!(report.stats.failed, 0);
    assert!(outcome
        .narration
        .iter()
        .any(|line| line.starts_with("Skipping non-image: ") && line.ends_with("notes.txt")));
    assert_eq!(
        service.album_contents(ALBUM).await.keys().collect::<Vec<_>>(),
        vec!["a.jpg"]
    );
}

#[tokio::test]
async fn test_content_decides_what_is_a_photo() {
    let dir = PhotoDir::with_photos(&["IMG_0001"]).unwrap();
    dir.write("notes.jpg", b"shopping list").unwrap();
    let service = Arc::new(MemoryPhotoService::new());

    let outcome = run_sync(&service, &dir, push()).await;
    let report = outcome.result.unwrap();

    assert_eq!(report.stats.uploaded, 1);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(
        service.album_contents(ALBUM).await.keys().collect::<Vec<_>>(),
        vec!["IMG_0001"]
    );
    assert!(outcome
        .narration
        .contains(&format!("Skipping non-image: {}", dir.join("notes.jpg").display())));
}

#[tokio::test]
async fn test_concurrent_uploads_create_the_album_once() {
    let names: Vec<String> = (0..16).map(|i| format!("photo{i:02}.jpg")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let dir = PhotoDir::with_photos(&refs).unwrap();
    let service = Arc::new(MemoryPhotoService::new());

    let options = push().with_concurrency(Concurrency::new(8).unwrap());
    let outcome = run_sync(&service, &dir, options).await;
    let report = outcome.result.unwrap();

    assert_eq!(report.stats.uploaded, 16);
    assert_eq!(service.albums_created().await, 1);
    let creating = service
        .uploads()
        .await
        .iter()
        .filter(|upload| upload.album_id.is_none())
        .count();
    assert_eq!(creating, 1);
    let announced = outcome
        .narration
        .iter()
        .filter(|line| line.contains("doesn't exist, creating it"))
        .count();
    assert_eq!(announced, 1);
}

#[tokio::test]
async fn test_album_creation_is_retried_after_a_failed_first_upload() {
    let dir = PhotoDir::with_photos(&["a.jpg", "b.jpg", "c.jpg"]).unwrap();
    let service = Arc::new(MemoryPhotoService::new());
    service.fail_uploads_of("a.jpg").await;

    let outcome = run_sync(&service, &dir, push()).await;
    let error = outcome.result.unwrap_err();
    assert_eq!(error.failures().len(), 1);

    let uploads = service.uploads().await;
    let album_ids: Vec<bool> = uploads.iter().map(|u| u.album_id.is_some()).collect();
    assert_eq!(album_ids, vec![false, false, true]);
    assert_eq!(service.albums_created().await, 1);
    assert_eq!(
        service.album_contents(ALBUM).await.keys().collect::<Vec<_>>(),
        vec!["b.jpg", "c.jpg"]
    );
}

#[tokio::test]
async fn test_tag_filter_leaves_untagged_photos_alone() {
    let dir = PhotoDir::with_photos(&["new.jpg"]).unwrap();
    let service = Arc::new(MemoryPhotoService::new());
    service
        .seed_album(
            ALBUM,
            vec![
                ("mine.jpg", SMALL_JPG.to_vec(), vec!["family".to_string()]),
                ("other.jpg", SMALL_JPG.to_vec(), vec!["work".to_string()]),
            ],
        )
        .await;

    let options = SyncOptions::new(SyncMode::push().with_prune(true)).with_tag("family");
    let report = run_sync(&service, &dir, options).await.result.unwrap();

    assert_eq!(report.remote_only, 1);
    assert_eq!(report.stats.deleted_remote, 1);
    let contents = service.album_contents(ALBUM).await;
    assert_eq!(contents.keys().collect::<Vec<_>>(), vec!["new.jpg", "other.jpg"]);
    assert_eq!(contents["new.jpg"].tags, vec!["family".to_string()]);
}

#[tokio::test]
async fn test_missing_local_directory_fails_before_any_transfer() {
    let parent = PhotoDir::new().unwrap();
    let missing_path = parent.join("does-not-exist");
    let service = Arc::new(MemoryPhotoService::new());
    service.seed_album(ALBUM, seeded(&["a.jpg"])).await;

    let request = SyncRequest::new(ALBUM, &missing_path).with_options(pull());
    let error = SyncEngine::new(service.clone())
        .run(request)
        .await
        .unwrap_err();

    assert!(matches!(error, Error::PathNotFound { .. }));
    assert_eq!(service.download_count().await, 0);
    assert!(!missing_path.exists());
}
