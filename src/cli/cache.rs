use crate::error::Result;

use super::{args::ClearCacheArgs, storage::create_service};

pub async fn clear(cli: ClearCacheArgs) -> Result<()> {
    let service = create_service(&cli.global, 1)?;
    service.clear_cache().await
}
