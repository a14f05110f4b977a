use std::sync::Arc;

use crate::{
    driver::{Driver, DriverConfig, DriverStatus},
    error::Error,
    job::{BatchEntry, Context},
    progress::RunState,
    testing::{jobs, memory_store, FakeRestorer, MemoryCatalog},
};

use super::RestoreService;

fn service(catalog: MemoryCatalog, restorer: FakeRestorer) -> Arc<RestoreService> {
    Arc::new(RestoreService::new(
        Arc::new(catalog),
        Arc::new(restorer),
        memory_store(),
        1,
    ))
}

#[tokio::test]
async fn full_restore_of_primary() {
    let catalog = Arc::new(MemoryCatalog::new().with_items(Context::Primary, 23, true));
    let restorer = Arc::new(FakeRestorer::new());
    let service = Arc::new(RestoreService::new(
        catalog.clone(),
        restorer.clone(),
        memory_store(),
        1,
    ));

    let plan = service.start_restore(Context::Primary).await.unwrap();
    assert_eq!(plan.total(), 23);
    assert_eq!(
        service.get_progress().await.unwrap().remaining,
        23,
        "run state is tracked as soon as the restore starts"
    );

    let driver = Driver::new(
        service.clone(),
        service.queue_store(),
        DriverConfig::default(),
    );
    driver.start(plan.jobs).await.unwrap();

    let queue = service.get_queue().await.unwrap();
    assert_eq!(queue.total, 23);
    assert_eq!(queue.processed, 0);

    assert_eq!(driver.run().await.unwrap(), DriverStatus::Completed);
    assert_eq!(driver.summary().await.batches, 3);
    assert_eq!(driver.summary().await.processed, 23);
    assert_eq!(restorer.attempts(), 23);

    assert_eq!(service.get_queue().await, Err(Error::QueueNotFound));

    let progress = service.get_progress().await.unwrap();
    assert!(progress.is_complete);
    assert!(!progress.is_running);
    assert!((progress.percent - 100.0).abs() < f64::EPSILON);
    assert_eq!(service.get_result().await.unwrap().restored, 23);
}

#[tokio::test]
async fn no_backups_means_nothing_to_restore() {
    let catalog = Arc::new(MemoryCatalog::new().with_items(Context::Primary, 200, false));
    let service = RestoreService::new(
        catalog.clone(),
        Arc::new(FakeRestorer::new()),
        memory_store(),
        1,
    );

    assert_eq!(
        service.start_restore(Context::Primary).await,
        Err(Error::NothingToRestore(Context::Primary))
    );
    assert_eq!(catalog.backup_checks(), 50);
    assert_eq!(service.get_queue().await, Err(Error::QueueNotFound));
    assert_eq!(service.get_progress().await.unwrap().total, 0);
}

#[tokio::test]
async fn unavailable_context_is_rejected() {
    let service = service(
        MemoryCatalog::new().with_items(Context::Primary, 3, true),
        FakeRestorer::new(),
    );

    assert_eq!(
        service.start_restore(Context::Secondary).await,
        Err(Error::ContextUnavailable(Context::Secondary))
    );
    assert!(service.preview(Context::Secondary).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_restore_is_counted() {
    let service = service(
        MemoryCatalog::new().with_items(Context::Primary, 10, true),
        FakeRestorer::failing([7]),
    );
    service.start_restore(Context::Primary).await.unwrap();

    let batch: Vec<_> = jobs(Context::Primary, [6, 7])
        .into_iter()
        .map(BatchEntry::from)
        .collect();
    let outcome = service.process_batch(&batch).await.unwrap();

    assert_eq!(outcome.processed, 2);
    assert_eq!(outcome.errors, 1);
    assert_eq!(outcome.restored, 1);

    let progress = service.get_progress().await.unwrap();
    assert_eq!(progress.remaining, 8);
    assert_eq!(service.get_result().await.unwrap().failed, 1);
}

#[tokio::test]
async fn queue_round_trip_and_cancel() {
    let service = service(MemoryCatalog::new(), FakeRestorer::new());

    let remaining = service
        .save_queue(&jobs(Context::Secondary, 4..=6), 6, 3)
        .await
        .unwrap();
    assert_eq!(remaining, 3);

    let queue = service.get_queue().await.unwrap();
    assert_eq!(queue.items, jobs(Context::Secondary, 4..=6));
    assert_eq!(queue.processed, 3);

    assert_eq!(
        service
            .save_queue(&jobs(Context::Secondary, [5]), 6, 3)
            .await,
        Err(Error::InvalidQueue {
            total: 6,
            processed: 3,
            remaining: 1
        })
    );

    service.cancel_queue().await.unwrap();
    assert_eq!(service.get_queue().await, Err(Error::QueueNotFound));
}

#[tokio::test]
async fn clear_cache_keeps_queue() {
    let service = service(
        MemoryCatalog::new().with_items(Context::Secondary, 12, true),
        FakeRestorer::new(),
    );
    let plan = service.start_restore(Context::Secondary).await.unwrap();
    service.save_queue(&plan.jobs, 12, 0).await.unwrap();
    service.get_stats(Context::Secondary).await.unwrap();
    assert_eq!(service.preview(Context::Secondary).await.unwrap().len(), 12);

    service.clear_cache().await.unwrap();

    assert_eq!(service.get_progress().await.unwrap().total, 0);
    assert_eq!(service.get_queue().await.unwrap().remaining(), 12);
}

#[tokio::test]
async fn clear_complete_flag_after_run() {
    let service = service(
        MemoryCatalog::new().with_items(Context::Secondary, 2, true),
        FakeRestorer::new(),
    );
    let plan = service.start_restore(Context::Secondary).await.unwrap();
    let batch: Vec<_> = plan.jobs.into_iter().map(BatchEntry::from).collect();
    service.process_batch(&batch).await.unwrap();
    assert!(service.get_progress().await.unwrap().is_complete);

    service.clear_complete_flag().await.unwrap();
    let progress = service.get_progress().await.unwrap();
    assert!(!progress.is_complete);
    assert_eq!(service.get_result().await.unwrap().restored, 0);
}

#[tokio::test]
async fn stats_cover_each_context() {
    let service = service(
        MemoryCatalog::new()
            .with_items(Context::Primary, 4, true)
            .with_items(Context::Secondary, 2, false),
        FakeRestorer::new(),
    );

    let primary = service.get_stats(Context::Primary).await.unwrap();
    assert_eq!(primary.total_items, 4);
    assert_eq!(primary.original_size, 4000);
    assert_eq!(primary.saved_size, 1600);
    assert!(!primary.approximate);

    let secondary = service.get_stats(Context::Secondary).await.unwrap();
    assert_eq!(secondary.total_items, 2);
    assert!((secondary.percent_saved - 40.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn restart_replaces_run_state() {
    let service = service(
        MemoryCatalog::new().with_items(Context::Primary, 5, true),
        FakeRestorer::new(),
    );
    service.start_restore(Context::Primary).await.unwrap();
    service.start_restore(Context::Primary).await.unwrap();

    let progress = service.get_progress().await.unwrap();
    assert_eq!(progress.total, RunState::new(5).total);
    assert_eq!(progress.remaining, 5);
}
