//! Identifiers and enumerations shared by every platform call.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Application identifier on the platform.
///
/// Zero is never a valid application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AppId(pub u32);

impl AppId {
    /// Whether this identifier refers to an actual application.
    #[must_use]
    pub fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Published item identifier.
///
/// Zero means "not assigned yet".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    /// Placeholder used before the platform issues an identifier.
    pub const UNASSIGNED: Self = Self(0);

    /// Whether this identifier has been assigned.
    #[must_use]
    pub fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque token scoping a sequence of setter calls and one submission to a single job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UpdateHandle(pub u64);

impl UpdateHandle {
    /// Handle value the platform returns when an update cannot be started.
    pub const INVALID: Self = Self(u64::MAX);

    #[must_use]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Kind of workshop item to create.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkshopFileType {
    /// Normal community item, visible in the workshop.
    #[default]
    Community,
}

/// Visibility level of a published item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public = 0,
    FriendsOnly = 1,
    Private = 2,
    Unlisted = 3,
}

impl TryFrom<i64> for Visibility {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Public),
            1 => Ok(Self::FriendsOnly),
            2 => Ok(Self::Private),
            3 => Ok(Self::Unlisted),
            other => Err(other),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Public => "public",
            Self::FriendsOnly => "friends-only",
            Self::Private => "private",
            Self::Unlisted => "unlisted",
        };
        f.write_str(name)
    }
}

/// Progress state of an update job, read repeatedly while polling.
///
/// `Invalid` is terminal: either no job is running for the handle, or it has
/// finished (successfully or not). The other states are reported in order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    #[default]
    Invalid,
    PreparingConfig,
    PreparingContent,
    UploadingContent,
    UploadingPreviewFile,
    CommittingChanges,
}

impl UpdateStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Invalid
    }

    /// Human-readable description for logs.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Invalid => "No update in progress or update finished",
            Self::PreparingConfig => "Processing configuration data",
            Self::PreparingContent => "Reading and processing content files",
            Self::UploadingContent => "Uploading content changes",
            Self::UploadingPreviewFile => "Uploading new preview file image",
            Self::CommittingChanges => "Committing all changes",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::PreparingConfig => "preparing_config",
            Self::PreparingContent => "preparing_content",
            Self::UploadingContent => "uploading_content",
            Self::UploadingPreviewFile => "uploading_preview_file",
            Self::CommittingChanges => "committing_changes",
        }
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown [`UpdateStatus`] name.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown update status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for UpdateStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Invalid,
            Self::PreparingConfig,
            Self::PreparingContent,
            Self::UploadingContent,
            Self::UploadingPreviewFile,
            Self::CommittingChanges,
        ]
        .into_iter()
        .find(|status| status.name() == s)
        .ok_or_else(|| UnknownStatus(s.to_owned()))
    }
}

/// Snapshot returned by a progress query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateProgress {
    pub status: UpdateStatus,
    pub bytes_processed: u64,
    pub bytes_total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_range() {
        for raw in 0..=3 {
            assert!(Visibility::try_from(raw).is_ok());
        }
        assert_eq!(Visibility::try_from(4), Err(4));
        assert_eq!(Visibility::try_from(-2), Err(-2));
        assert_eq!(Visibility::try_from(1), Ok(Visibility::FriendsOnly));
    }

    #[test]
    fn test_only_invalid_status_is_terminal() {
        assert!(UpdateStatus::Invalid.is_terminal());
        assert!(!UpdateStatus::UploadingContent.is_terminal());
        assert!(!UpdateStatus::CommittingChanges.is_terminal());
    }

    #[test]
    fn test_status_parse_uses_display_names() {
        assert_eq!(
            "uploading_content".parse::<UpdateStatus>(),
            Ok(UpdateStatus::UploadingContent)
        );
        assert_eq!(
            UpdateStatus::PreparingConfig
                .to_string()
                .parse::<UpdateStatus>(),
            Ok(UpdateStatus::PreparingConfig)
        );
        assert!("uploading".parse::<UpdateStatus>().is_err());
    }

    #[test]
    fn test_unassigned_ids() {
        assert!(!ItemId::UNASSIGNED.is_set());
        assert!(ItemId(999).is_set());
        assert!(!AppId(0).is_set());
        assert!(!UpdateHandle::INVALID.is_valid());
        assert!(UpdateHandle(1).is_valid());
    }
}
