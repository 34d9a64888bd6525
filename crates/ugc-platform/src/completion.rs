//! One-shot completion channel for asynchronous platform jobs.
//!
//! Each submitted job gets its own channel: the platform keeps the
//! [`Completer`] and fires it from its callback pump, the caller keeps the
//! [`Completion`] and checks it between pumps. Built on
//! [`std::sync::mpsc`] so a completion can be fired from any thread the
//! platform's dispatcher happens to run on.

use std::sync::mpsc;

use crate::result::{CallResult, JobOutcome, ResultCode};

/// Create a connected completer/completion pair for one job.
#[must_use]
pub fn completion_channel<T>() -> (Completer<T>, Completion<T>) {
    let (tx, rx) = mpsc::channel();
    (
        Completer { tx },
        Completion {
            rx,
            resolved: None,
        },
    )
}

/// Producer side of a job completion.
///
/// `complete` consumes the completer, so a job resolves at most once.
/// Dropping it without completing resolves the job as cancelled.
#[derive(Debug)]
pub struct Completer<T> {
    tx: mpsc::Sender<CallResult<T>>,
}

impl<T> Completer<T> {
    /// Deliver the job result. Ignored if the caller already dropped its side.
    pub fn complete(self, result: CallResult<T>) {
        let _ = self.tx.send(result);
    }
}

/// Consumer side of a job completion.
#[derive(Debug)]
pub struct Completion<T> {
    rx: mpsc::Receiver<CallResult<T>>,
    resolved: Option<JobOutcome<T>>,
}

impl<T: Clone> Completion<T> {
    /// Current outcome of the job, without blocking.
    ///
    /// Returns [`JobOutcome::Pending`] until the platform fires the
    /// completer. Once resolved, the same outcome is returned on every call.
    pub fn outcome(&mut self) -> JobOutcome<T> {
        if let Some(outcome) = &self.resolved {
            return outcome.clone();
        }

        let outcome = match self.rx.try_recv() {
            Ok(result) => JobOutcome::from(result),
            Err(mpsc::TryRecvError::Empty) => return JobOutcome::Pending,
            Err(mpsc::TryRecvError::Disconnected) => JobOutcome::Failure {
                code: ResultCode::CANCELLED,
            },
        };
        self.resolved = Some(outcome.clone());
        outcome
    }

    /// Whether the outcome has been observed as resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_until_completed() {
        let (completer, mut completion) = completion_channel::<u64>();

        assert_eq!(completion.outcome(), JobOutcome::Pending);
        assert!(!completion.is_resolved());

        completer.complete(CallResult::ok(5));

        assert_eq!(completion.outcome(), JobOutcome::Success(5));
        assert!(completion.is_resolved());
    }

    #[test]
    fn test_outcome_is_sticky() {
        let (completer, mut completion) = completion_channel::<u64>();
        completer.complete(CallResult::failed(ResultCode::BUSY, 0));

        let first = completion.outcome();
        let second = completion.outcome();

        assert_eq!(first, second);
        assert_eq!(
            first,
            JobOutcome::Failure {
                code: ResultCode::BUSY
            }
        );
    }

    #[test]
    fn test_dropped_completer_resolves_as_cancelled() {
        let (completer, mut completion) = completion_channel::<()>();
        drop(completer);

        assert_eq!(
            completion.outcome(),
            JobOutcome::Failure {
                code: ResultCode::CANCELLED
            }
        );
    }

    #[test]
    fn test_completed_from_another_thread() {
        let (completer, mut completion) = completion_channel::<u64>();

        std::thread::spawn(move || completer.complete(CallResult::ok(11)))
            .join()
            .unwrap();

        assert_eq!(completion.outcome(), JobOutcome::Success(11));
    }

    #[test]
    fn test_complete_after_consumer_dropped_is_ignored() {
        let (completer, completion) = completion_channel::<u64>();
        drop(completion);
        completer.complete(CallResult::ok(1));
    }
}
