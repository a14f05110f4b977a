use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::Result,
    serde::{deserialize, serialize},
};

use super::{BoxedStorage, StorageStats};

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    expires_at: DateTime<Utc>,
    value: Vec<u8>,
}

impl Envelope {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Typed records with an expiry, layered over any [`Storage`](super::Storage)
/// backend. Expired records read as absent and are removed lazily.
#[derive(Debug, Clone)]
pub struct TransientStore {
    storage: Arc<BoxedStorage>,
}

impl TransientStore {
    pub fn new(storage: BoxedStorage) -> Self {
        TransientStore {
            storage: Arc::new(storage),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(bytes) = self.storage.try_get(key).await? else {
            return Ok(None);
        };

        let envelope: Envelope = deserialize(&bytes)?;
        if envelope.is_expired(Utc::now()) {
            self.storage.delete(key).await?;
            return Ok(None);
        }

        let value = deserialize(&envelope.value)?;
        Ok(Some(value))
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let envelope = Envelope {
            expires_at,
            value: serialize(value)?,
        };

        let bytes = serialize(&envelope)?;
        self.storage.put(key, bytes).await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.storage.delete(key).await
    }

    pub async fn delete_many(&self, keys: &[String]) -> Result<()> {
        self.storage.delete_many(keys).await
    }

    pub fn stats(&self) -> StorageStats {
        self.storage.stats()
    }
}
