#[cfg(test)]
mod tests;

use std::time::Duration;

use log::debug;

use crate::{
    error::Result,
    host::SharedCatalog,
    job::{Context, MediaId},
    keys,
    storage::TransientStore,
};

/// Upper bound on ids returned for display purposes.
pub const PREVIEW_LIMIT: usize = 1000;

/// Number of leading candidates checked for a recoverable backup.
pub const BACKUP_SAMPLE_SIZE: usize = 50;

pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct Enumerator {
    catalog: SharedCatalog,
    store: TransientStore,
}

impl Enumerator {
    pub fn new(catalog: SharedCatalog, store: TransientStore) -> Self {
        Enumerator { catalog, store }
    }

    /// Lists restorable items of `context`.
    ///
    /// With `for_execution` the full set is read straight from the catalog.
    /// Otherwise at most [`PREVIEW_LIMIT`] ids are returned and the result is
    /// cached for [`CACHE_TTL`].
    ///
    /// Only the first [`BACKUP_SAMPLE_SIZE`] candidates are checked for a
    /// backup: if any of them has one, every candidate is returned, and if
    /// none does the result is empty. Items that turn out to have no backup
    /// fail individually at restore time.
    pub async fn enumerate(&self, context: Context, for_execution: bool) -> Result<Vec<MediaId>> {
        let cache_key = keys::cached_ids(context);

        if !for_execution {
            if let Some(ids) = self.store.get(&cache_key).await? {
                return Ok(ids);
            }
        }

        let limit = (!for_execution).then_some(PREVIEW_LIMIT);
        let candidates = self
            .catalog
            .candidates(context, limit)
            .await?
            .unwrap_or_default();

        let ids = if self.sample_has_backup(context, &candidates).await? {
            candidates
        } else {
            vec![]
        };

        debug!("found {} restorable items in {context}", ids.len());

        if !for_execution {
            self.store.set(&cache_key, &ids, CACHE_TTL).await?;
        }

        Ok(ids)
    }

    async fn sample_has_backup(&self, context: Context, candidates: &[MediaId]) -> Result<bool> {
        for id in candidates.iter().take(BACKUP_SAMPLE_SIZE) {
            if self.catalog.has_backup(*id, context).await? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
