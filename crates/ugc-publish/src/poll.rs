//! Bounded, cancellable polling for asynchronous platform jobs.
//!
//! A [`Poller`] repeatedly queries a status, reports changes, pumps the
//! platform's callbacks and sleeps until the status is terminal. The wait is
//! bounded by a timeout and can be cancelled from another thread through a
//! [`CancellationToken`].

use std::thread;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// Delay growth between polls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backoff {
    /// Same interval every time.
    Fixed,
    /// Interval doubles after each poll, capped at `max`.
    Exponential { max: Duration },
}

/// Error returned when a wait ends without reaching a terminal status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    #[error("timed out after {waited:?} ({attempts} attempts)")]
    TimedOut { waited: Duration, attempts: u32 },

    #[error("wait cancelled")]
    Cancelled,
}

/// Polling policy for one wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Poller {
    pub interval: Duration,
    pub backoff: Backoff,
    pub timeout: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            backoff: Backoff::Fixed,
            timeout: Duration::from_secs(3600),
        }
    }
}

impl Poller {
    /// Poller with a fixed interval.
    #[must_use]
    pub fn fixed(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            backoff: Backoff::Fixed,
            timeout,
        }
    }

    /// Delay before the poll following `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential { max } => {
                let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
                self.interval.saturating_mul(factor).min(max)
            }
        }
    }

    /// Poll until `is_terminal` accepts the queried status.
    ///
    /// Each iteration queries the status, calls `on_change` when it differs
    /// from the last one seen (the first status always counts as a change),
    /// returns it if terminal, and otherwise pumps callbacks and sleeps.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Cancelled`] once `cancel` is set and
    /// [`WaitError::TimedOut`] when the timeout elapses first.
    pub fn wait<S, P, Q, T, C>(
        &self,
        cancel: &CancellationToken,
        mut pump: P,
        mut query: Q,
        is_terminal: T,
        mut on_change: C,
    ) -> Result<S, WaitError>
    where
        S: Clone + PartialEq,
        P: FnMut(),
        Q: FnMut() -> S,
        T: Fn(&S) -> bool,
        C: FnMut(&S),
    {
        let start = Instant::now();
        // Timeouts too large to represent never expire.
        let deadline = start.checked_add(self.timeout);
        let mut attempts = 0_u32;
        let mut last: Option<S> = None;

        loop {
            attempts += 1;
            let status = query();
            if last.as_ref() != Some(&status) {
                on_change(&status);
                last = Some(status.clone());
            }
            if is_terminal(&status) {
                return Ok(status);
            }

            if cancel.is_cancelled() {
                return Err(WaitError::Cancelled);
            }
            let now = Instant::now();
            if deadline.is_some_and(|deadline| now >= deadline) {
                return Err(WaitError::TimedOut {
                    waited: now - start,
                    attempts,
                });
            }

            pump();

            let delay = self.delay(attempts);
            let remaining = deadline.map_or(delay, |deadline| {
                deadline.saturating_duration_since(Instant::now())
            });
            thread::sleep(delay.min(remaining));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    use super::*;

    fn fast(timeout: Duration) -> Poller {
        Poller::fixed(Duration::from_millis(1), timeout)
    }

    #[test]
    fn test_fixed_delay() {
        let poller = Poller::fixed(Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(poller.delay(1), Duration::from_millis(100));
        assert_eq!(poller.delay(7), Duration::from_millis(100));
    }

    #[test]
    fn test_exponential_delay_is_capped() {
        let poller = Poller {
            interval: Duration::from_millis(100),
            backoff: Backoff::Exponential {
                max: Duration::from_millis(500),
            },
            timeout: Duration::from_secs(1),
        };
        assert_eq!(poller.delay(1), Duration::from_millis(100));
        assert_eq!(poller.delay(2), Duration::from_millis(200));
        assert_eq!(poller.delay(3), Duration::from_millis(400));
        assert_eq!(poller.delay(4), Duration::from_millis(500));
        assert_eq!(poller.delay(60), Duration::from_millis(500));
    }

    #[test]
    fn test_returns_terminal_status_and_reports_transitions() {
        let script = [1, 1, 2, 2, 2, 3, 0];
        let index = Cell::new(0);
        let pumps = Cell::new(0);
        let mut seen = Vec::new();

        let result = fast(Duration::from_secs(5)).wait(
            &CancellationToken::new(),
            || pumps.set(pumps.get() + 1),
            || {
                let value = script[index.get()];
                index.set(index.get() + 1);
                value
            },
            |status| *status == 0,
            |status| seen.push(*status),
        );

        assert_eq!(result, Ok(0));
        assert_eq!(seen, vec![1, 2, 3, 0]);
        assert_eq!(pumps.get(), script.len() - 1);
    }

    #[test]
    fn test_immediately_terminal_does_not_pump() {
        let pumps = Cell::new(0);

        let result = fast(Duration::from_secs(1)).wait(
            &CancellationToken::new(),
            || pumps.set(pumps.get() + 1),
            || "done",
            |status| *status == "done",
            |_| {},
        );

        assert_eq!(result, Ok("done"));
        assert_eq!(pumps.get(), 0);
    }

    #[test]
    fn test_times_out() {
        let result = fast(Duration::from_millis(20)).wait(
            &CancellationToken::new(),
            || {},
            || 1,
            |status| *status == 0,
            |_| {},
        );

        match result {
            Err(WaitError::TimedOut { waited, attempts }) => {
                assert!(waited >= Duration::from_millis(20));
                assert!(attempts >= 2);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_from_pump() {
        let cancel = CancellationToken::new();
        let pumps = Cell::new(0);

        let result = fast(Duration::from_secs(5)).wait(
            &cancel,
            || {
                pumps.set(pumps.get() + 1);
                if pumps.get() == 3 {
                    cancel.cancel();
                }
            },
            || 1,
            |status| *status == 0,
            |_| {},
        );

        assert_eq!(result, Err(WaitError::Cancelled));
        assert_eq!(pumps.get(), 3);
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let cancel = CancellationToken::new();
        let remote = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            remote.cancel();
        });

        let result = fast(Duration::from_secs(10)).wait(&cancel, || {}, || 1, |s| *s == 0, |_| {});
        handle.join().unwrap();

        assert_eq!(result, Err(WaitError::Cancelled));
    }
}
