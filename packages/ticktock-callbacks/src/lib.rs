pub mod console;
pub mod error;
pub mod lessons;
pub mod ops;
pub mod promise;
pub mod retry;

pub use console::{Console, Echo, Line};
pub use error::OperationError;
pub use lessons::{Lesson, LessonConfig, LessonRun, run_all, run_lesson};
pub use ops::{Step, delayed_greeting, divide, fetch_data, fetch_user_name, run_step};
pub use promise::{Deferred, divide_async, fetch_data_async, sleep};
pub use retry::{
    AlwaysFail, AttemptOutcomes, FailTimes, RetryEvent, RetryPolicy, Scripted, Seeded,
    fetch_with_retry,
};
