//! Platform session guard.

use ugc_platform::{AppId, Platform, PlatformError};

/// Open platform session, closed when dropped.
///
/// Every exit path of a publish run drops the guard, so each successful
/// open is paired with exactly one shutdown.
pub struct Session<'a> {
    platform: &'a dyn Platform,
    app_id: AppId,
}

impl<'a> Session<'a> {
    /// Initialize the platform for `app_id`.
    ///
    /// # Errors
    ///
    /// Returns the platform's error when initialization fails. Nothing needs
    /// closing in that case.
    pub fn open(platform: &'a dyn Platform, app_id: AppId) -> Result<Self, PlatformError> {
        platform.init(app_id)?;
        tracing::info!(%app_id, "Platform session opened");
        Ok(Self { platform, app_id })
    }

    #[must_use]
    pub fn app_id(&self) -> AppId {
        self.app_id
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.platform.shutdown();
        tracing::info!(app_id = %self.app_id, "Platform session closed");
    }
}

#[cfg(test)]
mod tests {
    use ugc_platform::SimulatedPlatform;

    use super::*;

    #[test]
    fn test_drop_closes_session() {
        let platform = SimulatedPlatform::new();

        {
            let session = Session::open(&platform, AppId(480)).unwrap();
            assert_eq!(session.app_id(), AppId(480));
            assert!(platform.is_session_open());
        }

        assert!(!platform.is_session_open());
        assert_eq!(platform.sessions_opened(), 1);
        assert_eq!(platform.sessions_closed(), 1);
    }

    #[test]
    fn test_failed_open_does_not_shut_down() {
        let platform = SimulatedPlatform::new().with_init_failure();

        let result = Session::open(&platform, AppId(480));

        assert!(matches!(
            result,
            Err(PlatformError::SessionUnavailable { .. })
        ));
        assert_eq!(platform.sessions_closed(), 0);
        assert!(!platform.calls().contains(&ugc_platform::PlatformCall::Shutdown));
    }
}
