use thiserror::Error;

/// Simulated failures handed to error-first callbacks. Never panics, never escalates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("cannot divide by zero")]
    DivideByZero,

    #[error("url is empty")]
    EmptyUrl,

    #[error("gave up after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// The scheduled completion was dropped (cancelled or halted) before it ran.
    #[error("operation abandoned before completing")]
    Abandoned,
}
