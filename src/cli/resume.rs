use std::collections::BTreeSet;

use log::info;

use crate::{
    error::{Error, Result},
    stats::CommandStats,
};

use super::{
    args::ResumeArgs,
    drive::{create_driver, finish, run_driver},
    storage::create_service,
};

pub async fn main(cli: ResumeArgs) -> Result<()> {
    let stats = CommandStats::new();
    let service = create_service(&cli.global, cli.driver.tasks)?;
    let driver = create_driver(&service, &cli.driver);

    let queue = match driver.load_saved().await {
        Ok(queue) => queue,
        Err(Error::QueueNotFound) => {
            info!("no interrupted restore to resume");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let contexts: BTreeSet<_> = queue.items.iter().map(|job| job.context).collect();
    let status = run_driver(driver.clone()).await?;

    finish(&service, &driver, status, &contexts, cli.global.stats, stats).await
}
