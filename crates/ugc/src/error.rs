//! CLI error types.

use ugc_config::ConfigError;
use ugc_publish::PublishError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{}", describe_publish(.0))]
    Publish(#[from] PublishError),

    #[error("{0}")]
    Validation(String),
}

/// Publish error message including its source, if any.
fn describe_publish(err: &PublishError) -> String {
    match std::error::Error::source(err) {
        Some(source) => format!("{err}: {source}"),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ugc_platform::{AppId, PlatformError};
    use ugc_publish::{Job, WaitError};

    use super::*;

    #[test]
    fn test_publish_error_includes_source() {
        let err = CliError::from(PublishError::Wait {
            job: Job::Creation,
            source: WaitError::TimedOut {
                waited: Duration::from_secs(120),
                attempts: 1200,
            },
        });

        assert_eq!(
            err.to_string(),
            "item creation wait failed: timed out after 120s (1200 attempts)"
        );
    }

    #[test]
    fn test_platform_error_message() {
        let err = CliError::from(PublishError::Platform(
            PlatformError::SessionUnavailable { app_id: AppId(480) },
        ));

        assert_eq!(
            err.to_string(),
            "platform error: failed to initialize platform session for app 480"
        );
    }

    #[test]
    fn test_missing_app_id_message() {
        let err = CliError::from(PublishError::MissingAppId);
        assert_eq!(err.to_string(), "app id is required");
    }
}
