use std::{
    env::{self, VarError},
    path::PathBuf,
    sync::Arc,
};

use humantime::parse_duration;
use log::debug;

use crate::{
    error::{Error, Result},
    host::LocalLibrary,
    service::RestoreService,
    storage::{create_storage, StorageUrl, TransientStore},
};

use super::args::GlobalArgs;

const ENV_VAR_STORAGE: &str = "BULK_RESTORE_STORAGE";
const ENV_VAR_LIBRARY: &str = "BULK_RESTORE_LIBRARY";
const ENV_VAR_LATENCY: &str = "BULK_RESTORE_LATENCY";

pub fn create_service(args: &GlobalArgs, tasks: usize) -> Result<Arc<RestoreService>> {
    let store = create_store(args)?;
    let library = Arc::new(create_library(args)?);
    let service = RestoreService::new(library.clone(), library, store, tasks);
    Ok(Arc::new(service))
}

pub fn create_store(args: &GlobalArgs) -> Result<TransientStore> {
    let url = match &args.storage {
        Some(url) => url.clone(),
        None => get_env_var(ENV_VAR_STORAGE)?
            .ok_or_else(|| Error::MissingEnvVar(ENV_VAR_STORAGE.to_owned()))?
            .parse::<StorageUrl>()?,
    };

    let latency = match args.latency {
        Some(latency) => Some(latency),
        None => get_env_var(ENV_VAR_LATENCY)?
            .as_deref()
            .map(parse_duration)
            .transpose()?,
    };

    debug!("using state storage {url:?}");
    Ok(TransientStore::new(create_storage(&url, latency)))
}

pub fn create_library(args: &GlobalArgs) -> Result<LocalLibrary> {
    let root = match &args.library {
        Some(path) => path.clone(),
        None => get_env_var(ENV_VAR_LIBRARY)?
            .map(PathBuf::from)
            .ok_or_else(|| Error::MissingEnvVar(ENV_VAR_LIBRARY.to_owned()))?,
    };

    Ok(LocalLibrary::new(root))
}

fn get_env_var(name: &str) -> Result<Option<String>> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
