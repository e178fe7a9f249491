pub mod clock;
pub mod error;
pub mod queue;
pub mod scheduler;
pub mod task;

/// The core Scheduler trait that callback-style operations are written against.
/// Everything runs on one logical thread; "waiting" is just a position in a queue.
pub trait Scheduler {
    /// Register `action` to run `delay_ms` logical milliseconds from now.
    /// Never runs the action during the call itself, even for a delay of 0.
    fn schedule_after(&self, delay_ms: u64, action: Box<dyn FnOnce()>) -> TimerHandle;

    /// Schedule a microtask (runs at the next checkpoint, ahead of any deferred task).
    /// Used for future wakeups and promise-style continuations.
    fn schedule_microtask(&self, task: Box<dyn FnOnce()>);

    /// Remove a deferred task before it is selected.
    /// Returns false if it already ran or was already cancelled.
    fn cancel(&self, handle: TimerHandle) -> bool;

    /// Stop the run loop once the current action returns, abandoning queued work.
    fn halt(&self, code: i32);

    /// Current logical time in milliseconds.
    fn now(&self) -> u64;
}

pub use clock::{ClockMode, MIN_WALL_CLOCK_SPEED, SchedulerConfig};
pub use error::SchedulerError;
pub use scheduler::{LocalScheduler, RunReport};
pub use task::{DeferredTask, TaskKey, TimerHandle};
