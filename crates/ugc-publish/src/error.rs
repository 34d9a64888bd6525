//! Error types for item publishing.

use std::fmt;
use std::path::PathBuf;

use ugc_platform::{ItemId, JobOutcome, PlatformError};

use crate::poll::WaitError;

/// Item field an update can change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Description,
    Preview,
    Content,
    Title,
    Visibility,
    Tags,
    Language,
    AppDependencies,
    ItemDependencies,
    PatchNote,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Description => "description",
            Self::Preview => "preview",
            Self::Content => "content",
            Self::Title => "title",
            Self::Visibility => "visibility",
            Self::Tags => "tags",
            Self::Language => "language",
            Self::AppDependencies => "app dependencies",
            Self::ItemDependencies => "item dependencies",
            Self::PatchNote => "patch note",
        };
        f.write_str(name)
    }
}

/// Why a field value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("{} is not a file", .path.display())]
    NotAFile { path: PathBuf },

    #[error("{} is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("failed to read {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("exceeds maximum length of {max} characters (current: {length})")]
    TooLong { length: usize, max: usize },

    #[error("file is too large ({size} bytes, maximum is {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("invalid visibility value {0}, must be between 0 and 3")]
    VisibilityOutOfRange(i64),

    #[error("invalid language code {0:?}")]
    UnknownLanguage(String),

    #[error("{0} is both added and removed")]
    Conflicting(String),
}

/// A field value that failed validation.
///
/// Rejections are not fatal: the field is skipped and the update goes on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} rejected: {reason}")]
pub struct Rejection {
    pub field: Field,
    pub reason: RejectReason,
}

impl Rejection {
    pub(crate) fn new(field: Field, reason: RejectReason) -> Self {
        Self { field, reason }
    }
}

/// Asynchronous job the orchestrator waits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Job {
    Creation,
    Dependencies,
    Update,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creation => f.write_str("item creation"),
            Self::Dependencies => f.write_str("dependency change"),
            Self::Update => f.write_str("item update"),
        }
    }
}

/// Fatal error that stops a publish run.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PublishError {
    /// No application identifier was given.
    #[error("app id is required")]
    MissingAppId,

    /// No item identifier was given for an existing item.
    #[error("workshop id is required unless a new item is created")]
    MissingItemId,

    /// Platform call failed outside the best-effort field setters.
    #[error("platform error")]
    Platform(#[from] PlatformError),

    /// Item creation finished without issuing an identifier.
    #[error("item creation {outcome}")]
    CreateItem {
        /// Outcome reported by the creation job.
        outcome: JobOutcome<ItemId>,
    },

    /// Waiting on an asynchronous job failed.
    #[error("{job} wait failed")]
    Wait {
        job: Job,
        #[source]
        source: WaitError,
    },
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ugc_platform::ResultCode;

    use super::*;

    #[test]
    fn test_rejection_message() {
        let rejection = Rejection::new(
            Field::Title,
            RejectReason::TooLong {
                length: 130,
                max: 129,
            },
        );
        assert_eq!(
            rejection.to_string(),
            "title rejected: exceeds maximum length of 129 characters (current: 130)"
        );
    }

    #[test]
    fn test_create_item_message_includes_code() {
        let err = PublishError::CreateItem {
            outcome: JobOutcome::Failure {
                code: ResultCode::BANNED,
            },
        };
        assert!(err.to_string().starts_with("item creation failed (Banned: "));
    }

    #[test]
    fn test_wait_error_source() {
        let err = PublishError::Wait {
            job: Job::Update,
            source: WaitError::TimedOut {
                waited: Duration::from_secs(2),
                attempts: 3,
            },
        };
        assert_eq!(err.to_string(), "item update wait failed");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("timed out after 2s (3 attempts)"));
    }
}
