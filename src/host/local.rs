use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
    ffi::OsString,
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use clap::builder::styling::AnsiColor;
use log::debug;
use tokio::fs;

use crate::{
    error::{Error, Result},
    format::format_path,
    job::{Context, MediaId},
};

use super::{Catalog, Restorer, SizeRecord};

pub const BACKUP_DIR: &str = "backup";

#[derive(Debug, Clone)]
struct LocalItem {
    id: MediaId,
    path: PathBuf,
}

type PathIndex = HashMap<Context, HashMap<MediaId, PathBuf>>;

/// A media library on disk. Each context is a directory below `root` holding
/// optimized files named `<id>.<ext>`; originals live under `backup/` with
/// the same file name. Only files with a backup count as optimized.
///
/// Every listing refreshes an id to path index, so restores look items up
/// without reading the directory again.
#[derive(Debug, Clone)]
pub struct LocalLibrary {
    root: PathBuf,
    index: Arc<Mutex<PathIndex>>,
}

impl LocalLibrary {
    pub fn new(root: PathBuf) -> Self {
        LocalLibrary {
            root,
            index: Arc::default(),
        }
    }

    fn context_path(&self, context: Context) -> PathBuf {
        self.root.join(context.slug())
    }

    fn backup_path(&self, context: Context, item_path: &Path) -> Option<PathBuf> {
        let file_name = item_path.file_name()?;
        Some(self.context_path(context).join(BACKUP_DIR).join(file_name))
    }

    fn index(&self) -> MutexGuard<'_, PathIndex> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `None` if `context` was never listed.
    fn lookup(&self, id: MediaId, context: Context) -> Option<Option<PathBuf>> {
        self.index()
            .get(&context)
            .map(|paths| paths.get(&id).cloned())
    }

    fn forget(&self, id: MediaId, context: Context) {
        if let Some(paths) = self.index().get_mut(&context) {
            paths.remove(&id);
        }
    }

    async fn backup_names(&self, context: Context) -> Result<HashSet<OsString>> {
        let path = self.context_path(context).join(BACKUP_DIR);
        let mut entries = match fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = HashSet::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.insert(entry.file_name());
            }
        }

        Ok(names)
    }

    async fn items(&self, context: Context) -> Result<Option<Vec<LocalItem>>> {
        let path = self.context_path(context);
        let mut entries = match fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let backups = self.backup_names(context).await?;
        let mut items = vec![];
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() || !backups.contains(&entry.file_name()) {
                continue;
            }

            let path = entry.path();
            let maybe_id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<MediaId>().ok())
                .filter(|id| *id != 0);
            if let Some(id) = maybe_id {
                items.push(LocalItem { id, path });
            }
        }

        match context {
            Context::Primary => items.sort_by_key(|item| item.id),
            Context::Secondary => items.sort_by_key(|item| Reverse(item.id)),
        }

        let paths = items
            .iter()
            .map(|item| (item.id, item.path.clone()))
            .collect();
        self.index().insert(context, paths);

        Ok(Some(items))
    }

    async fn find(&self, id: MediaId, context: Context) -> Result<Option<PathBuf>> {
        if let Some(path) = self.lookup(id, context) {
            return Ok(path);
        }

        self.items(context).await?;
        Ok(self.lookup(id, context).flatten())
    }
}

#[async_trait]
impl Catalog for LocalLibrary {
    async fn is_available(&self, context: Context) -> Result<bool> {
        let exists = fs::try_exists(self.context_path(context)).await?;
        Ok(exists)
    }

    async fn candidates(
        &self,
        context: Context,
        limit: Option<usize>,
    ) -> Result<Option<Vec<MediaId>>> {
        let Some(items) = self.items(context).await? else {
            return Ok(None);
        };

        let ids = items
            .iter()
            .map(|item| item.id)
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        Ok(Some(ids))
    }

    async fn has_backup(&self, id: MediaId, context: Context) -> Result<bool> {
        let Some(path) = self.find(id, context).await? else {
            return Ok(false);
        };

        match self.backup_path(context, &path) {
            Some(path) => Ok(fs::try_exists(path).await?),
            None => Ok(false),
        }
    }

    async fn count(&self, context: Context) -> Result<u64> {
        let items = self.items(context).await?.unwrap_or_default();
        Ok(items.len() as u64)
    }

    async fn sizes(&self, context: Context, limit: Option<usize>) -> Result<Vec<SizeRecord>> {
        let items = self.items(context).await?.unwrap_or_default();
        let mut records = vec![];

        for item in items.iter().take(limit.unwrap_or(usize::MAX)) {
            let optimized_size = fs::metadata(&item.path).await?.len();
            let original_size = match self.backup_path(context, &item.path) {
                Some(path) => match fs::metadata(path).await {
                    Ok(metadata) => metadata.len(),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => optimized_size,
                    Err(err) => return Err(err.into()),
                },
                None => optimized_size,
            };

            records.push(SizeRecord {
                original_size,
                optimized_size,
            });
        }

        Ok(records)
    }
}

#[async_trait]
impl Restorer for LocalLibrary {
    async fn restore(&self, id: MediaId, context: Context) -> Result<()> {
        let path = self
            .find(id, context)
            .await?
            .ok_or_else(|| Error::restore(id, context, "no optimized item with a backup"))?;
        let backup_path = self
            .backup_path(context, &path)
            .ok_or_else(|| Error::restore(id, context, "item has no file name"))?;

        if !fs::try_exists(&backup_path).await? {
            self.forget(id, context);
            return Err(Error::restore(id, context, "no backup found"));
        }

        fs::copy(&backup_path, &path)
            .await
            .map_err(|err| Error::restore(id, context, err))?;
        fs::remove_file(&backup_path)
            .await
            .map_err(|err| Error::restore(id, context, err))?;
        self.forget(id, context);

        let formatted_path = format_path(&path);
        let style = AnsiColor::Green.on_default();
        debug!("{style}restored{style:#} {formatted_path}");
        Ok(())
    }
}
