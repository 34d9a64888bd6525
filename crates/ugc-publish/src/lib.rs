//! Workshop item publishing for UGC.
//!
//! This crate drives a single item update against a [`Platform`]:
//!
//! 1. Open the platform session ([`Session`])
//! 2. Create the item if requested, waiting on the creation job
//! 3. Open an update handle and apply each requested field, validated by [`validate`]
//! 4. Submit the update with the patch note
//! 5. Poll progress until the job is terminal ([`Poller`])
//!
//! Field and dependency problems are logged and skipped. A run stops only on
//! missing identifiers, session failures, failed or timed out item creation,
//! a timed out update, or cancellation.
//!
//! # Example
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ugc_platform::{AppId, ItemId, SimulatedPlatform};
//! use ugc_publish::{ItemIdentity, ItemOrchestrator, PublishConfig, UpdateRequest};
//!
//! let platform = SimulatedPlatform::new();
//! let request = UpdateRequest {
//!     title: Some("Hello".to_owned()),
//!     tags: Some("x, y".to_owned()),
//!     ..UpdateRequest::default()
//! };
//!
//! let outcome = ItemOrchestrator::new(&platform, PublishConfig::default())
//!     .run(ItemIdentity::existing(AppId(123), ItemId(999)), &request)?;
//! assert!(outcome.submit.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! [`Platform`]: ugc_platform::Platform

mod error;
mod orchestrator;
mod poll;
mod request;
mod session;
pub mod validate;

pub use error::{Field, Job, PublishError, RejectReason, Rejection};
pub use orchestrator::{ItemOrchestrator, PublishConfig, Stage, UpdateOutcome};
pub use poll::{Backoff, Poller, WaitError};
pub use request::{DependencyChanges, ItemIdentity, UpdateRequest};
pub use session::Session;
