//! Completion payloads: platform result codes and job outcomes.

use std::fmt;

use serde::Serialize;

/// Result code reported by a platform completion.
///
/// Stored as the raw platform value so codes this crate does not know about
/// survive a round trip and can still be reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResultCode(pub i32);

impl ResultCode {
    pub const OK: Self = Self(1);
    pub const FAIL: Self = Self(2);
    pub const NO_CONNECTION: Self = Self(3);
    pub const INVALID_PARAM: Self = Self(8);
    pub const FILE_NOT_FOUND: Self = Self(9);
    pub const BUSY: Self = Self(10);
    pub const INVALID_STATE: Self = Self(11);
    pub const DUPLICATE_NAME: Self = Self(14);
    pub const ACCESS_DENIED: Self = Self(15);
    pub const TIMEOUT: Self = Self(16);
    pub const BANNED: Self = Self(17);
    pub const SERVICE_UNAVAILABLE: Self = Self(20);
    pub const NOT_LOGGED_ON: Self = Self(21);
    pub const INSUFFICIENT_PRIVILEGE: Self = Self(24);
    pub const LIMIT_EXCEEDED: Self = Self(25);
    pub const DUPLICATE_REQUEST: Self = Self(29);
    pub const LOCKING_FAILED: Self = Self(33);
    pub const IO_FAILURE: Self = Self(35);
    pub const CANCELLED: Self = Self(52);

    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    /// Symbolic name of the code, as the platform documents it.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::OK => "OK",
            Self::FAIL => "Fail",
            Self::NO_CONNECTION => "NoConnection",
            Self::INVALID_PARAM => "InvalidParam",
            Self::FILE_NOT_FOUND => "FileNotFound",
            Self::BUSY => "Busy",
            Self::INVALID_STATE => "InvalidState",
            Self::DUPLICATE_NAME => "DuplicateName",
            Self::ACCESS_DENIED => "AccessDenied",
            Self::TIMEOUT => "Timeout",
            Self::BANNED => "Banned",
            Self::SERVICE_UNAVAILABLE => "ServiceUnavailable",
            Self::NOT_LOGGED_ON => "NotLoggedOn",
            Self::INSUFFICIENT_PRIVILEGE => "InsufficientPrivilege",
            Self::LIMIT_EXCEEDED => "LimitExceeded",
            Self::DUPLICATE_REQUEST => "DuplicateRequest",
            Self::LOCKING_FAILED => "LockingFailed",
            Self::IO_FAILURE => "IOFailure",
            Self::CANCELLED => "Cancelled",
            _ => "Unknown",
        }
    }

    /// Explanation of the code in the context of workshop uploads.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::OK => "Success.",
            Self::FAIL => "Generic failure.",
            Self::NO_CONNECTION => "No connection to the platform servers.",
            Self::INVALID_PARAM => {
                "Either the provided app ID is invalid or doesn't match the consumer app ID of \
                 the item, or the upload content or preview is invalid."
            }
            Self::FILE_NOT_FOUND => "Failed to get the workshop info for the item or the content.",
            Self::BUSY => "The platform is busy, try again later.",
            Self::INVALID_STATE => "The operation is not valid in the current state.",
            Self::DUPLICATE_NAME => "The preview image file already exists for this user.",
            Self::ACCESS_DENIED => "The user doesn't own a license for the provided app ID.",
            Self::TIMEOUT => "The operation took longer than expected. Have the user retry.",
            Self::BANNED => "The user doesn't have permission to upload content to this hub.",
            Self::SERVICE_UNAVAILABLE => {
                "The workshop server hosting the content is having issues."
            }
            Self::NOT_LOGGED_ON => "The user is not currently logged in.",
            Self::INSUFFICIENT_PRIVILEGE => {
                "The user is currently restricted from uploading content due to a hub ban, \
                 account lock, or community ban."
            }
            Self::LIMIT_EXCEEDED => {
                "The user has exceeded their cloud quota or the item is over the size limit."
            }
            Self::DUPLICATE_REQUEST => "A change for this item is already being processed.",
            Self::LOCKING_FAILED => "Failed to acquire the user lock.",
            Self::IO_FAILURE => "Failed to read or write local files.",
            Self::CANCELLED => "The call was cancelled before it completed.",
            _ => "Unrecognised result code.",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name(), self.description())
    }
}

/// Raw payload a completion delivers: result code, agreement flag, and value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallResult<T> {
    pub result: ResultCode,
    pub needs_user_agreement: bool,
    pub value: T,
}

impl<T> CallResult<T> {
    /// Successful result with no agreement gating.
    pub fn ok(value: T) -> Self {
        Self {
            result: ResultCode::OK,
            needs_user_agreement: false,
            value,
        }
    }

    /// Failed result carrying a placeholder value.
    pub fn failed(result: ResultCode, value: T) -> Self {
        Self {
            result,
            needs_user_agreement: false,
            value,
        }
    }
}

/// Outcome of one asynchronous job, as seen by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum JobOutcome<T> {
    /// No completion delivered yet.
    Pending,
    Success(T),
    Failure { code: ResultCode },
    /// The end user must accept the workshop legal agreement first.
    NeedsUserAgreement,
}

impl<T> JobOutcome<T> {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl<T> fmt::Display for JobOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("still pending"),
            Self::Success(_) => f.write_str("succeeded"),
            Self::Failure { code } => write!(f, "failed ({code})"),
            Self::NeedsUserAgreement => {
                f.write_str("user needs to accept the workshop legal agreement")
            }
        }
    }
}

impl<T> From<CallResult<T>> for JobOutcome<T> {
    /// Agreement gating takes precedence over the result code.
    fn from(call: CallResult<T>) -> Self {
        if call.needs_user_agreement {
            Self::NeedsUserAgreement
        } else if call.result.is_ok() {
            Self::Success(call.value)
        } else {
            Self::Failure { code: call.result }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agreement_flag_wins_over_ok() {
        let call = CallResult {
            result: ResultCode::OK,
            needs_user_agreement: true,
            value: 7_u64,
        };
        assert_eq!(JobOutcome::from(call), JobOutcome::NeedsUserAgreement);
    }

    #[test]
    fn test_agreement_flag_wins_over_failure() {
        let call = CallResult {
            result: ResultCode::BANNED,
            needs_user_agreement: true,
            value: 0_u64,
        };
        assert_eq!(JobOutcome::from(call), JobOutcome::NeedsUserAgreement);
    }

    #[test]
    fn test_ok_and_failure() {
        assert_eq!(
            JobOutcome::from(CallResult::ok(42_u64)),
            JobOutcome::Success(42)
        );
        assert_eq!(
            JobOutcome::from(CallResult::failed(ResultCode::TIMEOUT, 0_u64)),
            JobOutcome::Failure {
                code: ResultCode::TIMEOUT
            }
        );
    }

    #[test]
    fn test_unknown_code_keeps_raw_value() {
        let code = ResultCode(9999);
        assert_eq!(code.name(), "Unknown");
        assert_eq!(code.0, 9999);
        assert!(!code.is_ok());
    }

    #[test]
    fn test_display_includes_name_and_description() {
        let text = ResultCode::LIMIT_EXCEEDED.to_string();
        assert!(text.starts_with("LimitExceeded: "));
        assert!(text.contains("quota"));
    }
}
