use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

pub fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let bytes = bincode::serialize(value)?;
    Ok(bytes)
}

pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let value = bincode::deserialize(bytes)?;
    Ok(value)
}
