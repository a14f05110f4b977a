use std::sync::Arc;

use crate::{
    job::Context,
    testing::{memory_store, FakeItem, MemoryCatalog},
};

use super::{Enumerator, BACKUP_SAMPLE_SIZE, PREVIEW_LIMIT};

fn enumerator(catalog: MemoryCatalog) -> (Arc<MemoryCatalog>, Enumerator) {
    let catalog = Arc::new(catalog);
    let enumerator = Enumerator::new(catalog.clone(), memory_store());
    (catalog, enumerator)
}

#[tokio::test]
async fn sample_without_backups_is_empty() {
    let (catalog, enumerator) =
        enumerator(MemoryCatalog::new().with_items(Context::Primary, 200, false));

    let ids = enumerator.enumerate(Context::Primary, true).await.unwrap();
    assert!(ids.is_empty());
    assert_eq!(catalog.backup_checks(), BACKUP_SAMPLE_SIZE);
}

#[tokio::test]
async fn one_backup_in_sample_includes_everything() {
    let catalog = MemoryCatalog::new()
        .with_items(Context::Primary, 30, false)
        .with_item(
            Context::Primary,
            FakeItem {
                id: 31,
                has_backup: true,
                sizes: Default::default(),
            },
        );
    let (catalog, enumerator) = enumerator(catalog);

    let ids = enumerator.enumerate(Context::Primary, true).await.unwrap();
    assert_eq!(ids.len(), 31);
    assert_eq!(ids.first(), Some(&1));
    assert_eq!(ids.last(), Some(&31));
    assert_eq!(catalog.backup_checks(), 31);
}

#[tokio::test]
async fn backup_beyond_sample_is_not_seen() {
    let catalog = MemoryCatalog::new()
        .with_items(Context::Primary, 50, false)
        .with_item(
            Context::Primary,
            FakeItem {
                id: 51,
                has_backup: true,
                sizes: Default::default(),
            },
        );
    let (_, enumerator) = enumerator(catalog);

    let ids = enumerator.enumerate(Context::Primary, true).await.unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
async fn unavailable_context_is_empty() {
    let (_, enumerator) = enumerator(MemoryCatalog::new());
    let ids = enumerator.enumerate(Context::Secondary, true).await.unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
async fn preview_is_capped_and_cached() {
    let (catalog, enumerator) =
        enumerator(MemoryCatalog::new().with_items(Context::Primary, 1500, true));

    let first = enumerator.enumerate(Context::Primary, false).await.unwrap();
    assert_eq!(first.len(), PREVIEW_LIMIT);
    assert_eq!(catalog.candidate_queries(), 1);

    let second = enumerator.enumerate(Context::Primary, false).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(catalog.candidate_queries(), 1);
}

#[tokio::test]
async fn execution_bypasses_cache() {
    let (catalog, enumerator) =
        enumerator(MemoryCatalog::new().with_items(Context::Primary, 1500, true));

    enumerator.enumerate(Context::Primary, false).await.unwrap();
    let ids = enumerator.enumerate(Context::Primary, true).await.unwrap();

    assert_eq!(ids.len(), 1500);
    assert_eq!(catalog.candidate_queries(), 2);
}
