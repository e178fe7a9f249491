//! Simulated asynchronous operations.
//!
//! Nothing here touches the network or disk. Each operation computes a
//! hard-coded result and hands it to its callback from a deferred task, so
//! the callback always runs after the caller's synchronous code has returned.

use crate::error::OperationError;
use ticktock_scheduler::{Scheduler, TimerHandle};

pub const DIVIDE_DELAY_MS: u64 = 500;
pub const FETCH_DELAY_MS: u64 = 1000;
pub const STEP_DELAY_MS: u64 = 500;

const USERS: [(u32, &str); 3] = [(1, "Taro"), (2, "Hanako"), (3, "Jiro")];

/// Divides `a` by `b` after [`DIVIDE_DELAY_MS`].
pub fn divide<S>(
    scheduler: &S,
    a: f64,
    b: f64,
    callback: impl FnOnce(Result<f64, OperationError>) + 'static,
) -> TimerHandle
where
    S: Scheduler + ?Sized,
{
    scheduler.schedule_after(
        DIVIDE_DELAY_MS,
        Box::new(move || {
            if b == 0.0 {
                callback(Err(OperationError::DivideByZero));
            } else {
                callback(Ok(a / b));
            }
        }),
    )
}

/// Pretends to fetch `url` after [`FETCH_DELAY_MS`].
pub fn fetch_data<S>(
    scheduler: &S,
    url: &str,
    callback: impl FnOnce(Result<String, OperationError>) + 'static,
) -> TimerHandle
where
    S: Scheduler + ?Sized,
{
    let url = url.to_owned();
    scheduler.schedule_after(
        FETCH_DELAY_MS,
        Box::new(move || {
            if url.is_empty() {
                callback(Err(OperationError::EmptyUrl));
            } else {
                callback(Ok(format!("data from {url}")));
            }
        }),
    )
}

/// Looks a user up in a fixed directory. Unknown ids resolve to `"unknown"`;
/// this lookup has no error path.
pub fn fetch_user_name<S>(
    scheduler: &S,
    user_id: u32,
    callback: impl FnOnce(String) + 'static,
) -> TimerHandle
where
    S: Scheduler + ?Sized,
{
    scheduler.schedule_after(
        FETCH_DELAY_MS,
        Box::new(move || {
            let name = USERS
                .iter()
                .find(|(id, _)| *id == user_id)
                .map_or("unknown", |&(_, name)| name);
            callback(name.to_string());
        }),
    )
}

pub fn delayed_greeting<S>(
    scheduler: &S,
    name: &str,
    delay_ms: u64,
    callback: impl FnOnce(String) + 'static,
) -> TimerHandle
where
    S: Scheduler + ?Sized,
{
    let message = format!("Hello, {name}!");
    scheduler.schedule_after(delay_ms, Box::new(move || callback(message)))
}

/// One stage of the fetch, process, save pipeline used to show nested callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Fetch,
    Process,
    Save,
}

impl Step {
    pub fn number(self) -> u8 {
        match self {
            Step::Fetch => 1,
            Step::Process => 2,
            Step::Save => 3,
        }
    }

    pub fn apply(self, input: &str) -> String {
        match self {
            Step::Fetch => "data A".to_string(),
            Step::Process => format!("processed {input}"),
            Step::Save => format!("saved: {input}"),
        }
    }
}

/// Runs `step` on `input` after [`STEP_DELAY_MS`].
pub fn run_step<S>(
    scheduler: &S,
    step: Step,
    input: &str,
    callback: impl FnOnce(String) + 'static,
) -> TimerHandle
where
    S: Scheduler + ?Sized,
{
    let output = step.apply(input);
    scheduler.schedule_after(STEP_DELAY_MS, Box::new(move || callback(output)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use ticktock_scheduler::LocalScheduler;

    #[test]
    fn callbacks_never_run_synchronously() {
        let scheduler = LocalScheduler::new();
        let calls = Rc::new(RefCell::new(0));

        let bump = |calls: &Rc<RefCell<i32>>| {
            let calls = calls.clone();
            move |_: Result<f64, OperationError>| *calls.borrow_mut() += 1
        };
        divide(&scheduler, 1.0, 0.0, bump(&calls));
        divide(&scheduler, 1.0, 1.0, bump(&calls));
        assert_eq!(*calls.borrow(), 0);

        scheduler.run_until_idle().unwrap();
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn step_outputs_chain() {
        let fetched = Step::Fetch.apply("ignored");
        let processed = Step::Process.apply(&fetched);
        assert_eq!(Step::Save.apply(&processed), "saved: processed data A");
        assert_eq!(Step::Save.number(), 3);
    }

    #[test]
    fn unknown_user_is_not_an_error() {
        let scheduler = LocalScheduler::new();
        let name = Rc::new(RefCell::new(String::new()));
        {
            let name = name.clone();
            fetch_user_name(&scheduler, 42, move |n| *name.borrow_mut() = n);
        }
        scheduler.run_until_idle().unwrap();
        assert_eq!(*name.borrow(), "unknown");
    }
}
