//! Platform capability trait and error type.

use std::path::Path;

use crate::completion::Completion;
use crate::types::{AppId, ItemId, UpdateHandle, UpdateProgress, Visibility, WorkshopFileType};

/// Error from a synchronous platform call.
///
/// Asynchronous failures are reported through [`Completion`] instead.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PlatformError {
    /// The platform client could not be started for the application.
    #[error("failed to initialize platform session for app {app_id}")]
    SessionUnavailable {
        /// Application the session was opened for.
        app_id: AppId,
    },

    /// A call was made without an open session.
    #[error("no platform session is open")]
    NoSession,

    /// The platform refused the call.
    #[error("platform rejected {call}")]
    Rejected {
        /// Name of the rejected call.
        call: &'static str,
    },

    /// The update handle is unknown or already submitted.
    #[error("invalid update handle")]
    InvalidHandle,
}

/// Capabilities the uploader needs from a workshop platform.
///
/// Mirrors the platform SDK's asynchronous job model: calls that start a job
/// return a [`Completion`], and completions only fire while
/// [`run_callbacks`](Self::run_callbacks) is being pumped. Setter calls are
/// synchronous and scoped to an [`UpdateHandle`].
///
/// Implementations:
/// - [`SimulatedPlatform`](crate::SimulatedPlatform) runs in-process, for tests and dry runs
pub trait Platform: Send + Sync {
    /// Open the process-wide session for `app_id`.
    fn init(&self, app_id: AppId) -> Result<(), PlatformError>;

    /// Close the session opened by [`init`](Self::init).
    fn shutdown(&self);

    /// Dispatch pending completions. Must be called repeatedly while waiting.
    fn run_callbacks(&self);

    /// Start a job that creates a new item and resolves with its identifier.
    fn create_item(&self, app_id: AppId, file_type: WorkshopFileType) -> Completion<ItemId>;

    /// Open an update handle for an existing item.
    fn start_item_update(&self, app_id: AppId, item_id: ItemId) -> UpdateHandle;

    fn set_item_description(
        &self,
        handle: UpdateHandle,
        description: &str,
    ) -> Result<(), PlatformError>;

    fn set_item_preview(&self, handle: UpdateHandle, path: &Path) -> Result<(), PlatformError>;

    fn set_item_content(&self, handle: UpdateHandle, path: &Path) -> Result<(), PlatformError>;

    fn set_item_title(&self, handle: UpdateHandle, title: &str) -> Result<(), PlatformError>;

    fn set_item_visibility(
        &self,
        handle: UpdateHandle,
        visibility: Visibility,
    ) -> Result<(), PlatformError>;

    /// Replace the item's tags. An empty slice clears them.
    fn set_item_tags(&self, handle: UpdateHandle, tags: &[String]) -> Result<(), PlatformError>;

    fn set_item_update_language(
        &self,
        handle: UpdateHandle,
        language: &str,
    ) -> Result<(), PlatformError>;

    /// Submit the pending update with a change note.
    fn submit_item_update(&self, handle: UpdateHandle, change_note: &str) -> Completion<ItemId>;

    /// Progress of the job submitted for `handle`.
    fn item_update_progress(&self, handle: UpdateHandle) -> UpdateProgress;

    /// Applications the item currently depends on.
    fn app_dependencies(&self, item_id: ItemId) -> Completion<Vec<AppId>>;

    fn add_app_dependency(&self, item_id: ItemId, app_id: AppId) -> Completion<()>;

    fn remove_app_dependency(&self, item_id: ItemId, app_id: AppId) -> Completion<()>;

    /// Items the item currently depends on.
    fn item_dependencies(&self, item_id: ItemId) -> Completion<Vec<ItemId>>;

    fn add_item_dependency(&self, item_id: ItemId, child: ItemId) -> Completion<()>;

    fn remove_item_dependency(&self, item_id: ItemId, child: ItemId) -> Completion<()>;
}
