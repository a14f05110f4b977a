use std::sync::Arc;

use crate::{
    job::{BatchEntry, Context},
    run_state::RunTracker,
    testing::{jobs, memory_store, FakeRestorer},
};

use super::{BatchOutcome, BatchProcessor, BATCH_SIZE};

fn entries(context: Context, ids: impl IntoIterator<Item = u64>) -> Vec<BatchEntry> {
    jobs(context, ids).into_iter().map(BatchEntry::from).collect()
}

fn processor(
    restorer: FakeRestorer,
    tasks: usize,
) -> (Arc<FakeRestorer>, Arc<RunTracker>, BatchProcessor) {
    let restorer = Arc::new(restorer);
    let tracker = Arc::new(RunTracker::new(memory_store()));
    let processor = BatchProcessor::new(restorer.clone(), tracker.clone(), tasks);
    (restorer, tracker, processor)
}

#[tokio::test]
async fn invalid_entries_are_errors() {
    let (restorer, _, processor) = processor(FakeRestorer::new(), 1);

    let mut batch = entries(Context::Primary, 1..=3);
    batch.push(BatchEntry {
        id: Some(4),
        context: None,
    });
    batch.push(BatchEntry {
        id: None,
        context: Some("primary".to_owned()),
    });
    batch.push(BatchEntry {
        id: Some(0),
        context: Some("primary".to_owned()),
    });
    batch.push(BatchEntry {
        id: Some(5),
        context: Some("elsewhere".to_owned()),
    });

    let outcome = processor.process(&batch).await.unwrap();
    assert_eq!(
        outcome,
        BatchOutcome {
            processed: 3,
            errors: 4,
            restored: 3,
            total: 7,
        }
    );
    assert_eq!(restorer.attempts(), 3);
}

#[tokio::test]
async fn restore_failure_still_processed() {
    let (restorer, tracker, processor) = processor(FakeRestorer::failing([7]), 1);
    tracker.begin(Context::Primary, 10).await.unwrap();

    let outcome = processor
        .process(&entries(Context::Primary, 5..=8))
        .await
        .unwrap();

    assert_eq!(outcome.processed, 4);
    assert_eq!(outcome.errors, 1);
    assert_eq!(outcome.restored, 3);
    assert_eq!(restorer.restored(), jobs(Context::Primary, [5, 6, 8]));

    let state = tracker.state(Context::Primary).await.unwrap().unwrap();
    assert_eq!(state.remaining, 6);
    assert_eq!(tracker.result().await.unwrap().failed, 1);
}

#[tokio::test]
async fn panicking_restore_still_settles_run_state() {
    let (restorer, tracker, processor) = processor(FakeRestorer::panicking([2]), 2);
    tracker.begin(Context::Primary, 3).await.unwrap();

    let outcome = processor
        .process(&entries(Context::Primary, 1..=3))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        BatchOutcome {
            processed: 3,
            errors: 1,
            restored: 2,
            total: 3,
        }
    );
    assert_eq!(restorer.attempts(), 3);
    assert_eq!(restorer.restored().len(), 2);

    let state = tracker.state(Context::Primary).await.unwrap().unwrap();
    assert_eq!(state.remaining, 0);
    assert!(tracker.is_complete().await.unwrap());
    assert_eq!(tracker.result().await.unwrap().failed, 1);
}

#[tokio::test]
async fn concurrent_restores_keep_counts() {
    let (restorer, tracker, processor) = processor(FakeRestorer::failing([2, 9]), 4);
    tracker.begin(Context::Secondary, 10).await.unwrap();

    let outcome = processor
        .process(&entries(Context::Secondary, 1..=10))
        .await
        .unwrap();

    assert_eq!(outcome.processed, 10);
    assert_eq!(outcome.errors, 2);
    assert_eq!(outcome.restored, 8);
    assert_eq!(restorer.attempts(), 10);
    assert!(tracker.is_complete().await.unwrap());
}

#[tokio::test]
async fn full_run_completes() {
    let (_, tracker, processor) = processor(FakeRestorer::new(), 1);
    tracker.begin(Context::Primary, 23).await.unwrap();

    let all = entries(Context::Primary, 1..=23);
    let mut processed = 0;
    let mut sizes = vec![];
    for batch in all.chunks(BATCH_SIZE) {
        let outcome = processor.process(batch).await.unwrap();
        processed += outcome.processed;
        sizes.push(outcome.total);
    }

    assert_eq!(sizes, vec![10, 10, 3]);
    assert_eq!(processed, 23);

    let progress = tracker.progress().await.unwrap();
    assert!(progress.is_complete);
    assert!((progress.percent - 100.0).abs() < f64::EPSILON);
}
