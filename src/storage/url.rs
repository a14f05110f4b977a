use std::{path::PathBuf, str::FromStr};

use crate::error::Error;

pub const LOCAL_PREFIX: &str = "file://";
pub const MEMORY_URL: &str = "memory://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageUrl {
    Local(PathBuf),
    Memory,
}

impl FromStr for StorageUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(path_str) = s.strip_prefix(LOCAL_PREFIX) {
            if path_str.is_empty() {
                return Err(Error::InvalidStorageUrl(s.to_owned()));
            }

            Ok(StorageUrl::Local(path_str.into()))
        } else if s == MEMORY_URL {
            Ok(StorageUrl::Memory)
        } else {
            Err(Error::InvalidStorageUrl(s.to_owned()))
        }
    }
}
