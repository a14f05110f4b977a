use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type MediaId = u64;

/// A partition of restorable items. Contexts are processed independently but
/// share a single queue and an aggregate progress view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Context {
    /// The general media library.
    Primary,
    /// Files optimized from custom folders.
    Secondary,
}

impl Context {
    pub const ALL: [Context; 2] = [Context::Primary, Context::Secondary];

    pub fn slug(self) -> &'static str {
        match self {
            Context::Primary => "primary",
            Context::Secondary => "secondary",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Context::Primary => "Media Library",
            Context::Secondary => "Custom Folders",
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Context {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "primary" | "library" | "media" => Ok(Context::Primary),
            "secondary" | "folders" | "custom-folders" => Ok(Context::Secondary),
            _ => Err(Error::InvalidContext(s.to_owned())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestoreJob {
    pub id: MediaId,
    pub context: Context,
}

impl RestoreJob {
    pub fn new(id: MediaId, context: Context) -> Self {
        RestoreJob { id, context }
    }
}

/// A job as submitted to the batch processor. Fields may be missing; such
/// entries are rejected before any restore is attempted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    #[serde(default)]
    pub id: Option<MediaId>,
    #[serde(default)]
    pub context: Option<String>,
}

impl From<RestoreJob> for BatchEntry {
    fn from(job: RestoreJob) -> Self {
        BatchEntry {
            id: Some(job.id),
            context: Some(job.context.slug().to_owned()),
        }
    }
}

impl TryFrom<&BatchEntry> for RestoreJob {
    type Error = Error;

    fn try_from(entry: &BatchEntry) -> Result<Self> {
        let id = entry.id.filter(|id| *id != 0).ok_or(Error::InvalidJob)?;
        let context = entry
            .context
            .as_deref()
            .ok_or(Error::InvalidJob)?
            .parse()
            .map_err(|_| Error::InvalidJob)?;
        Ok(RestoreJob { id, context })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;

    use super::{BatchEntry, Context, RestoreJob};

    #[test]
    fn context_aliases() {
        assert_eq!("media".parse::<Context>(), Ok(Context::Primary));
        assert_eq!("custom-folders".parse::<Context>(), Ok(Context::Secondary));
        assert_eq!(
            "attachments".parse::<Context>(),
            Err(Error::InvalidContext("attachments".to_owned()))
        );
    }

    #[test]
    fn entries_need_id_and_context() {
        let job = RestoreJob::new(12, Context::Secondary);
        assert_eq!(RestoreJob::try_from(&BatchEntry::from(job)), Ok(job));

        let zero = BatchEntry {
            id: Some(0),
            context: Some("primary".to_owned()),
        };
        assert_eq!(RestoreJob::try_from(&zero), Err(Error::InvalidJob));
        assert_eq!(
            RestoreJob::try_from(&BatchEntry::default()),
            Err(Error::InvalidJob)
        );
    }
}
