//! Interfaces to the host optimization system. The queue only ever talks to
//! these traits; [`LocalLibrary`] is the on-disk implementation used by the CLI.

mod local;


use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    job::{Context, MediaId},
};

pub use local::LocalLibrary;

pub type SharedCatalog = Arc<dyn Catalog + Send + Sync + 'static>;
pub type SharedRestorer = Arc<dyn Restorer + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRecord {
    pub original_size: u64,
    pub optimized_size: u64,
}

/// Read-only access to optimized media.
#[async_trait]
pub trait Catalog: Debug {
    /// Whether the collection backing `context` exists at all.
    async fn is_available(&self, context: Context) -> Result<bool>;

    /// Ids of optimized items in catalog order, or `None` if the collection
    /// is unavailable.
    async fn candidates(
        &self,
        context: Context,
        limit: Option<usize>,
    ) -> Result<Option<Vec<MediaId>>>;

    async fn has_backup(&self, id: MediaId, context: Context) -> Result<bool>;

    async fn count(&self, context: Context) -> Result<u64>;

    async fn sizes(&self, context: Context, limit: Option<usize>) -> Result<Vec<SizeRecord>>;
}

#[async_trait]
pub trait Restorer: Debug {
    /// Reinstates the original of one item. Failures are reported as
    /// [`Error::Restore`](crate::error::Error::Restore).
    async fn restore(&self, id: MediaId, context: Context) -> Result<()>;
}
