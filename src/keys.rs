use crate::job::Context;

pub const NAMESPACE: &str = "bulk-restore/";

pub const QUEUE_KEY: &str = "bulk-restore/queue";
pub const COMPLETE_KEY: &str = "bulk-restore/complete";
pub const RESULT_KEY: &str = "bulk-restore/result";

pub fn running(context: Context) -> String {
    format!("{NAMESPACE}running/{}", context.slug())
}

pub fn cached_ids(context: Context) -> String {
    format!("{NAMESPACE}ids/{}", context.slug())
}

pub fn cached_stats(context: Context) -> String {
    format!("{NAMESPACE}stats/{}", context.slug())
}

/// Every key except the queue itself, which has its own lifecycle.
pub fn transient_keys() -> Vec<String> {
    let mut keys = vec![COMPLETE_KEY.to_owned(), RESULT_KEY.to_owned()];
    for context in Context::ALL {
        keys.push(running(context));
        keys.push(cached_ids(context));
        keys.push(cached_stats(context));
    }

    keys
}
