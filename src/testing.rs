//! Fakes shared by unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    error::{Error, Result},
    host::{Catalog, Restorer, SizeRecord},
    job::{Context, MediaId, RestoreJob},
    storage::{MemoryStorage, TransientStore},
};

pub fn memory_store() -> TransientStore {
    TransientStore::new(Box::new(MemoryStorage::new()))
}

#[derive(Debug, Clone)]
pub struct FakeItem {
    pub id: MediaId,
    pub has_backup: bool,
    pub sizes: SizeRecord,
}

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    items: HashMap<Context, Vec<FakeItem>>,
    backup_checks: AtomicUsize,
    candidate_queries: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        MemoryCatalog::default()
    }

    /// Adds items `1..=count` to `context`, each 1000 bytes originally and
    /// 600 bytes optimized.
    pub fn with_items(mut self, context: Context, count: u64, has_backup: bool) -> Self {
        let items = (1..=count).map(|id| FakeItem {
            id,
            has_backup,
            sizes: SizeRecord {
                original_size: 1000,
                optimized_size: 600,
            },
        });
        self.items.entry(context).or_default().extend(items);
        self
    }

    pub fn with_item(mut self, context: Context, item: FakeItem) -> Self {
        self.items.entry(context).or_default().push(item);
        self
    }

    pub fn backup_checks(&self) -> usize {
        self.backup_checks.load(Ordering::SeqCst)
    }

    pub fn candidate_queries(&self) -> usize {
        self.candidate_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn is_available(&self, context: Context) -> Result<bool> {
        Ok(self.items.contains_key(&context))
    }

    async fn candidates(
        &self,
        context: Context,
        limit: Option<usize>,
    ) -> Result<Option<Vec<MediaId>>> {
        self.candidate_queries.fetch_add(1, Ordering::SeqCst);
        let ids = self.items.get(&context).map(|items| {
            items
                .iter()
                .map(|item| item.id)
                .take(limit.unwrap_or(usize::MAX))
                .collect()
        });
        Ok(ids)
    }

    async fn has_backup(&self, id: MediaId, context: Context) -> Result<bool> {
        self.backup_checks.fetch_add(1, Ordering::SeqCst);
        let has_backup = self
            .items
            .get(&context)
            .and_then(|items| items.iter().find(|item| item.id == id))
            .is_some_and(|item| item.has_backup);
        Ok(has_backup)
    }

    async fn count(&self, context: Context) -> Result<u64> {
        Ok(self.items.get(&context).map_or(0, Vec::len) as u64)
    }

    async fn sizes(&self, context: Context, limit: Option<usize>) -> Result<Vec<SizeRecord>> {
        let sizes = self
            .items
            .get(&context)
            .map(|items| {
                items
                    .iter()
                    .map(|item| item.sizes)
                    .take(limit.unwrap_or(usize::MAX))
                    .collect()
            })
            .unwrap_or_default();
        Ok(sizes)
    }
}

/// Restores everything except the ids it was told to fail or panic on.
#[derive(Debug, Default)]
pub struct FakeRestorer {
    failing: HashSet<MediaId>,
    panicking: HashSet<MediaId>,
    restored: Mutex<Vec<RestoreJob>>,
    attempts: AtomicUsize,
}

impl FakeRestorer {
    pub fn new() -> Self {
        FakeRestorer::default()
    }

    pub fn failing<I: IntoIterator<Item = MediaId>>(ids: I) -> Self {
        FakeRestorer {
            failing: ids.into_iter().collect(),
            ..FakeRestorer::default()
        }
    }

    pub fn panicking<I: IntoIterator<Item = MediaId>>(ids: I) -> Self {
        FakeRestorer {
            panicking: ids.into_iter().collect(),
            ..FakeRestorer::default()
        }
    }

    pub fn restored(&self) -> Vec<RestoreJob> {
        self.restored.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Restorer for FakeRestorer {
    async fn restore(&self, id: MediaId, context: Context) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.panicking.contains(&id) {
            panic!("restorer crashed on item {id}");
        }

        if self.failing.contains(&id) {
            return Err(Error::restore(id, context, "backup is corrupt"));
        }

        self.restored
            .lock()
            .unwrap()
            .push(RestoreJob::new(id, context));
        Ok(())
    }
}

pub fn jobs(context: Context, ids: impl IntoIterator<Item = MediaId>) -> Vec<RestoreJob> {
    ids.into_iter()
        .map(|id| RestoreJob::new(id, context))
        .collect()
}
