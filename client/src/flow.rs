//! Request/timeout/cancel state machine.
//!
//! A request moves `Idle -> Sending -> (Completed | TimedOut | Cancelled |
//! Errored) -> Idle`; `drive` covers the Sending window and returns the
//! terminal state. Staged hints fire at two thresholds purely as user
//! feedback and never touch the network deadline. All timers live inside
//! the `select!`, so every exit path drops them with the future; nothing
//! can fire against a later request.

use std::future::Future;
use std::time::Duration;

/// Nominal hint thresholds, clamped under the abort budget.
const FIRST_HINT: Duration = Duration::from_secs(4);
const SECOND_HINT: Duration = Duration::from_secs(12);

/// Default abort budget. Deliberately above the server's 10s platform
/// ceiling: the gateway always answers (with fallback text if it must)
/// before this fires, so a timeout here means the gateway itself is gone.
const DEFAULT_ABORT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    /// First threshold: the request is slower than a normal completion.
    StillWorking,
    /// Second threshold: something is probably wrong upstream.
    TakingLong,
}

#[derive(Debug)]
pub enum Outcome<T> {
    Completed(T),
    TimedOut,
    Cancelled,
    Errored(anyhow::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct FlowTimers {
    pub first_hint: Duration,
    pub second_hint: Duration,
    pub abort_after: Duration,
}

impl Default for FlowTimers {
    fn default() -> Self {
        Self::with_abort(DEFAULT_ABORT)
    }
}

impl FlowTimers {
    pub fn with_abort(abort_after: Duration) -> Self {
        let first_hint = FIRST_HINT.min(abort_after / 2);
        let second_hint = SECOND_HINT.min(abort_after * 4 / 5).max(first_hint);
        Self {
            first_hint,
            second_hint,
            abort_after,
        }
    }

    /// Run one request to a terminal state.
    ///
    /// `cancel` is the explicit user action (Ctrl-C in the CLI); it only
    /// performs local cleanup, the server is not told to stop.
    pub async fn drive<T, F, C>(
        &self,
        request: F,
        cancel: C,
        mut on_hint: impl FnMut(Hint),
    ) -> Outcome<T>
    where
        F: Future<Output = anyhow::Result<T>>,
        C: Future<Output = ()>,
    {
        tokio::pin!(request);
        tokio::pin!(cancel);
        let deadline = tokio::time::sleep(self.abort_after);
        tokio::pin!(deadline);
        let first = tokio::time::sleep(self.first_hint);
        tokio::pin!(first);
        let second = tokio::time::sleep(self.second_hint);
        tokio::pin!(second);

        let mut hints_fired = 0u8;
        loop {
            tokio::select! {
                result = &mut request => {
                    return match result {
                        Ok(value) => Outcome::Completed(value),
                        Err(e) => Outcome::Errored(e),
                    };
                }
                _ = &mut cancel => return Outcome::Cancelled,
                _ = &mut deadline => return Outcome::TimedOut,
                _ = &mut first, if hints_fired == 0 => {
                    hints_fired = 1;
                    on_hint(Hint::StillWorking);
                }
                _ = &mut second, if hints_fired == 1 => {
                    hints_fired = 2;
                    on_hint(Hint::TakingLong);
                }
            }
        }
    }
}
