use clap::builder::styling::AnsiColor;
use log::{debug, info};

use crate::{
    error::{Error, Result},
    format::format_time,
};

use super::{
    args::{ClearQueueArgs, QueueArgs},
    storage::create_service,
};

pub async fn main(cli: QueueArgs) -> Result<()> {
    let service = create_service(&cli.global, 1)?;
    let queue = match service.get_queue().await {
        Ok(queue) => queue,
        Err(Error::QueueNotFound) => {
            info!("no saved queue");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let time_style = AnsiColor::Blue.on_default();
    info!(
        "{time_style}{}{time_style:#} {}/{} processed, {} remaining",
        format_time(&queue.saved_at),
        queue.processed,
        queue.total,
        queue.remaining()
    );

    for job in &queue.items {
        debug!("{} {}", job.context.slug(), job.id);
    }

    Ok(())
}

pub async fn clear(cli: ClearQueueArgs) -> Result<()> {
    let service = create_service(&cli.global, 1)?;
    service.cancel_queue().await?;
    info!("saved queue deleted");
    Ok(())
}
