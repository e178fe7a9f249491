use crate::error::OperationError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use ticktock_scheduler::Scheduler;

pub const RETRY_DELAY_MS: u64 = 500;
pub const RETRY_PAYLOAD: &str = "data fetched";

/// Decides whether a given attempt (1-based) succeeds.
pub trait AttemptOutcomes {
    fn succeeds(&mut self, attempt: u32) -> bool;
}

impl<F> AttemptOutcomes for F
where
    F: FnMut(u32) -> bool,
{
    fn succeeds(&mut self, attempt: u32) -> bool {
        self(attempt)
    }
}

/// Fixed per-attempt outcomes. Attempts past the end of the script fail.
#[derive(Debug, Clone, Default)]
pub struct Scripted(VecDeque<bool>);

impl Scripted {
    pub fn new(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self(outcomes.into_iter().collect())
    }
}

impl AttemptOutcomes for Scripted {
    fn succeeds(&mut self, _attempt: u32) -> bool {
        self.0.pop_front().unwrap_or(false)
    }
}

/// Fails the first `n` attempts, then succeeds.
#[derive(Debug, Clone, Copy)]
pub struct FailTimes(pub u32);

impl AttemptOutcomes for FailTimes {
    fn succeeds(&mut self, attempt: u32) -> bool {
        attempt > self.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFail;

impl AttemptOutcomes for AlwaysFail {
    fn succeeds(&mut self, _attempt: u32) -> bool {
        false
    }
}

/// Pseudo-random outcomes. The same seed always yields the same sequence.
#[derive(Debug, Clone)]
pub struct Seeded {
    rng: StdRng,
    success_rate: f64,
}

impl Seeded {
    pub fn new(seed: u64, success_rate: f64) -> Self {
        // gen_bool panics outside [0, 1].
        let success_rate = if success_rate.is_nan() {
            0.0
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self {
            rng: StdRng::seed_from_u64(seed),
            success_rate,
        }
    }
}

impl AttemptOutcomes for Seeded {
    fn succeeds(&mut self, _attempt: u32) -> bool {
        self.rng.gen_bool(self.success_rate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Zero is treated as a single attempt.
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: RETRY_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    fn limit(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Progress notifications, in the order they happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryEvent {
    /// Emitted synchronously when an attempt starts.
    Attempt { attempt: u32, max_attempts: u32 },
    /// Emitted when a failed attempt is about to be retried.
    Retrying { failed_attempt: u32 },
}

struct RetryState<S> {
    scheduler: S,
    policy: RetryPolicy,
    outcomes: Box<dyn AttemptOutcomes>,
    observer: Box<dyn FnMut(RetryEvent)>,
    callback: Option<Box<dyn FnOnce(Result<String, OperationError>)>>,
    attempts: u32,
}

/// Simulated fetch that retries through the scheduler.
///
/// Each attempt reports [`RetryEvent::Attempt`], then settles after
/// `policy.delay_ms`. A success calls back with `Ok`, a failure either starts
/// the next attempt from inside that deferred task or, once the attempt limit
/// is reached, calls back with [`OperationError::RetriesExhausted`]. The
/// callback runs exactly once.
pub fn fetch_with_retry<S>(
    scheduler: &S,
    policy: RetryPolicy,
    outcomes: impl AttemptOutcomes + 'static,
    observer: impl FnMut(RetryEvent) + 'static,
    callback: impl FnOnce(Result<String, OperationError>) + 'static,
) where
    S: Scheduler + Clone + 'static,
{
    let state = Rc::new(RefCell::new(RetryState {
        scheduler: scheduler.clone(),
        policy,
        outcomes: Box::new(outcomes),
        observer: Box::new(observer),
        callback: Some(Box::new(callback)),
        attempts: 0,
    }));
    attempt(state);
}

fn attempt<S>(state: Rc<RefCell<RetryState<S>>>)
where
    S: Scheduler + Clone + 'static,
{
    let (scheduler, delay_ms, attempt, succeeded) = {
        let mut guard = state.borrow_mut();
        let st = &mut *guard;
        st.attempts += 1;
        let attempt = st.attempts;
        (st.observer)(RetryEvent::Attempt {
            attempt,
            max_attempts: st.policy.limit(),
        });
        let succeeded = st.outcomes.succeeds(attempt);
        (st.scheduler.clone(), st.policy.delay_ms, attempt, succeeded)
    };
    tracing::debug!(attempt, succeeded, "retry attempt scheduled");

    scheduler.schedule_after(
        delay_ms,
        Box::new(move || settle(state, attempt, succeeded)),
    );
}

fn settle<S>(state: Rc<RefCell<RetryState<S>>>, attempt_no: u32, succeeded: bool)
where
    S: Scheduler + Clone + 'static,
{
    if succeeded {
        finish(&state, Ok(RETRY_PAYLOAD.to_string()));
        return;
    }

    let limit = state.borrow().policy.limit();
    if attempt_no < limit {
        (state.borrow_mut().observer)(RetryEvent::Retrying {
            failed_attempt: attempt_no,
        });
        attempt(state);
    } else {
        tracing::debug!(attempts = attempt_no, "retries exhausted");
        finish(
            &state,
            Err(OperationError::RetriesExhausted {
                attempts: attempt_no,
            }),
        );
    }
}

fn finish<S>(state: &Rc<RefCell<RetryState<S>>>, result: Result<String, OperationError>) {
    // Release the borrow before handing control to user code.
    let callback = state.borrow_mut().callback.take();
    if let Some(callback) = callback {
        callback(result);
    }
}
