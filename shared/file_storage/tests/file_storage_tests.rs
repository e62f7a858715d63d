use std::sync::Arc;

use bytes::Bytes;
use file_storage::provider::memory::InMemoryObjectStore;
use file_storage::{FileStorage, FileStorageError};
use pretty_assertions::assert_eq;

const BUCKET: &str = "backups";

fn setup() -> FileStorage {
    FileStorage::new(
        Arc::new(InMemoryObjectStore::with_buckets([BUCKET])),
        "ru-1",
    )
}

fn keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn test_upload_then_download_round_trip() {
    let storage = setup();
    let content = Bytes::from_static(b"%PDF-1.7 voucher");

    let key = storage
        .upload(BUCKET, "test/voucher.pdf", content.clone())
        .await
        .unwrap();
    assert_eq!(key, "test/voucher.pdf");

    let downloaded = storage.download(BUCKET, &key).await.unwrap();
    assert_eq!(downloaded, content);
}

#[tokio::test]
async fn test_upload_overwrites_existing_object() {
    let storage = setup();

    storage.upload(BUCKET, "a.txt", &b"first"[..]).await.unwrap();
    storage.upload(BUCKET, "a.txt", &b"second"[..]).await.unwrap();

    let downloaded = storage.download(BUCKET, "a.txt").await.unwrap();
    assert_eq!(downloaded, Bytes::from_static(b"second"));
}

#[tokio::test]
async fn test_list_only_returns_files_with_extension() {
    let storage = setup();
    for key in ["a.txt", "folder/", "b", "folder/c.tar.gz"] {
        storage.upload(BUCKET, key, &b"x"[..]).await.unwrap();
    }

    let listed = storage.list(BUCKET).await.unwrap();
    assert_eq!(listed, keys(&["a.txt", "folder/c.tar.gz"]));
}

#[tokio::test]
async fn test_list_missing_bucket_is_provider_error() {
    let storage = setup();

    let err = storage.list("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_download_missing_object_is_provider_error() {
    let storage = setup();

    let err = storage.download(BUCKET, "missing.txt").await.unwrap_err();
    assert!(matches!(err, FileStorageError::Provider { .. }));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_reports_missing_key() {
    let storage = setup();
    storage.upload(BUCKET, "k1.txt", &b"x"[..]).await.unwrap();

    let err = storage
        .delete(BUCKET, &keys(&["k1.txt", "k2.txt"]))
        .await
        .unwrap_err();

    match err {
        FileStorageError::PartialDelete { key, .. } => assert_eq!(key, "k2.txt"),
        other => panic!("unexpected error: {other:?}"),
    }
    // The confirmed key is still gone
    assert!(storage.list(BUCKET).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_all_files() {
    let storage = setup();
    let files = keys(&["test/folder/photo 19.58.37.jpeg", "photo.jpeg"]);
    for key in &files {
        storage.upload(BUCKET, key, &b"x"[..]).await.unwrap();
    }

    storage.delete(BUCKET, &files).await.unwrap();
    assert!(storage.list(BUCKET).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bucket_lifecycle() {
    let storage = setup();

    assert!(!storage.bucket_exists("test-bucket").await.unwrap());
    storage.create_bucket("test-bucket").await.unwrap();
    assert!(storage.bucket_exists("test-bucket").await.unwrap());

    let names: Vec<String> = storage
        .list_buckets()
        .await
        .unwrap()
        .into_iter()
        .map(|bucket| bucket.name)
        .collect();
    assert_eq!(names, keys(&[BUCKET, "test-bucket"]));

    storage.delete_bucket("test-bucket").await.unwrap();
    assert!(!storage.bucket_exists("test-bucket").await.unwrap());
}

#[tokio::test]
async fn test_create_existing_bucket_fails() {
    let storage = setup();

    let err = storage.create_bucket(BUCKET).await.unwrap_err();
    assert!(matches!(err, FileStorageError::Provider { .. }));
    assert!(err.to_string().contains("region ru-1"));
}

#[tokio::test]
async fn test_delete_non_empty_bucket_fails() {
    let storage = setup();
    storage.upload(BUCKET, "a.txt", &b"x"[..]).await.unwrap();

    let err = storage.delete_bucket(BUCKET).await.unwrap_err();
    assert!(matches!(err, FileStorageError::Provider { .. }));
    assert!(!err.is_not_found());
    assert!(storage.bucket_exists(BUCKET).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_uploads_share_one_facade() {
    let storage = setup();

    let handles: Vec<_> = (0..8_u8)
        .map(|i| {
            let storage = storage.clone();
            tokio::spawn(async move {
                storage
                    .upload(BUCKET, &format!("file-{i}.bin"), vec![i; 16])
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(storage.list(BUCKET).await.unwrap().len(), 8);
}
