//! Workshop platform interface for UGC.
//!
//! This crate provides the [`Platform`] trait, the capability surface the
//! uploader needs from a workshop platform SDK: session lifecycle, item
//! creation, per-field update setters, submission, progress queries and
//! dependency management.
//!
//! The platform works with asynchronous jobs. Calls that start a job return
//! a [`Completion`] which resolves only while the caller pumps
//! [`Platform::run_callbacks`]. Each job gets its own one-shot channel, so
//! every submission can be awaited and tested independently.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Platform`] trait and [`PlatformError`]
//! - Identifier newtypes ([`AppId`], [`ItemId`], [`UpdateHandle`]) and enums
//!   ([`Visibility`], [`UpdateStatus`])
//! - [`ResultCode`], [`CallResult`] and [`JobOutcome`] for completion payloads
//! - [`completion_channel`] for one-shot job completions
//! - [`SimulatedPlatform`], an in-process backend for tests and dry runs
//! - The API language table ([`LANGUAGES`], [`is_valid_language_code`])

mod completion;
mod language;
mod platform;
mod result;
mod simulated;
mod types;

pub use completion::{Completer, Completion, completion_channel};
pub use language::{DEFAULT_LANGUAGE, LANGUAGES, is_valid_language_code};
pub use platform::{Platform, PlatformError};
pub use result::{CallResult, JobOutcome, ResultCode};
pub use simulated::{PlatformCall, SimulatedPlatform};
pub use types::{
    AppId, ItemId, UnknownStatus, UpdateHandle, UpdateProgress, UpdateStatus, Visibility,
    WorkshopFileType,
};
