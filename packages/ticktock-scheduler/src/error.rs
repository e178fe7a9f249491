use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// `run` was called from inside an action the loop is already executing.
    #[error("run loop entered from inside a running task")]
    Reentrant,

    #[error("scheduler already halted with exit code {code}")]
    Halted { code: i32 },
}
