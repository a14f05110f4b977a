use std::time::Duration;

use crate::error::Error;

use super::{LocalStorage, MemoryStorage, Storage, StorageUrl, TransientStore};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::test]
async fn memory_get_missing_error() {
    let storage = MemoryStorage::new();
    let result = storage.get("missing").await;
    assert_eq!(result, Err(Error::ItemNotFound("missing".to_owned())));
    assert_eq!(storage.try_get("missing").await.unwrap(), None);
}

#[tokio::test]
async fn memory_delete_missing_is_ok() {
    let storage = MemoryStorage::new();
    storage.put("a", vec![1, 2, 3]).await.unwrap();
    storage.delete("a").await.unwrap();
    storage.delete("a").await.unwrap();
    assert!(!storage.exists("a").await.unwrap());

    let stats = storage.stats();
    assert_eq!(stats.put_requests, 1);
    assert_eq!(stats.bytes_uploaded, 3);
    assert_eq!(stats.delete_requests, 2);
}

#[tokio::test]
async fn local_put_get_delete() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path().to_owned(), None);

    storage
        .put("bulk-restore/running/primary", b"state".to_vec())
        .await
        .unwrap();
    assert!(storage.exists("bulk-restore/running/primary").await.unwrap());
    assert_eq!(
        storage.get("bulk-restore/running/primary").await.unwrap(),
        b"state".to_vec()
    );

    storage.delete("bulk-restore/running/primary").await.unwrap();
    assert_eq!(
        storage.try_get("bulk-restore/running/primary").await.unwrap(),
        None
    );
}

#[tokio::test]
async fn transient_value_expires() {
    let store = TransientStore::new(Box::new(MemoryStorage::new()));

    store.set("fresh", &42_u64, DAY).await.unwrap();
    store.set("stale", &7_u64, Duration::ZERO).await.unwrap();

    assert_eq!(store.get::<u64>("fresh").await.unwrap(), Some(42));
    assert_eq!(store.get::<u64>("stale").await.unwrap(), None);
}

#[tokio::test]
async fn transient_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let first = TransientStore::new(Box::new(LocalStorage::new(dir.path().to_owned(), None)));
    first.set("bulk-restore/complete", &true, DAY).await.unwrap();
    drop(first);

    let second = TransientStore::new(Box::new(LocalStorage::new(dir.path().to_owned(), None)));
    assert_eq!(
        second.get::<bool>("bulk-restore/complete").await.unwrap(),
        Some(true)
    );
}

#[test]
fn storage_url_parse() {
    assert_eq!(
        "file:///var/lib/restore".parse::<StorageUrl>().unwrap(),
        StorageUrl::Local("/var/lib/restore".into())
    );
    assert_eq!("memory://".parse::<StorageUrl>().unwrap(), StorageUrl::Memory);
    assert!("s3://bucket".parse::<StorageUrl>().is_err());
    assert!("file://".parse::<StorageUrl>().is_err());
}
