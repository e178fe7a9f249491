//! Lesson scripts.
//!
//! Each lesson is a short synchronous block that prints a few lines and
//! registers deferred work. Only the order of the printed lines matters.

use crate::console::{Console, Echo, Line};
use crate::ops::{self, Step};
use crate::promise;
use crate::retry::{self, RetryEvent, RetryPolicy, Seeded};
use futures::FutureExt;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ticktock_scheduler::{LocalScheduler, RunReport, Scheduler, SchedulerConfig, SchedulerError};

/// Logical gap left between lessons when they are chained by [`run_all`].
pub const LESSON_GAP_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lesson {
    SyncCallbacks,
    ExecutionOrder,
    ZeroDelay,
    DelayedGreeting,
    CallbackPyramid,
    ErrorFirst,
    UserLookup,
    NestedTimers,
    Retry,
    PromiseCompare,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown lesson `{0}`")]
pub struct UnknownLesson(pub String);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LessonConfig {
    pub scheduler: SchedulerConfig,
    pub echo: Echo,
    /// Seed for the retry lesson's simulated failures.
    pub seed: u64,
    pub success_rate: f64,
    pub max_attempts: u32,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            echo: Echo::Silent,
            seed: 0,
            success_rate: 0.7,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LessonRun {
    pub lines: Vec<Line>,
    pub report: RunReport,
}

impl LessonRun {
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

impl Lesson {
    pub const ALL: [Lesson; 10] = [
        Lesson::SyncCallbacks,
        Lesson::ExecutionOrder,
        Lesson::ZeroDelay,
        Lesson::DelayedGreeting,
        Lesson::CallbackPyramid,
        Lesson::ErrorFirst,
        Lesson::UserLookup,
        Lesson::NestedTimers,
        Lesson::Retry,
        Lesson::PromiseCompare,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Lesson::SyncCallbacks => "sync-callbacks",
            Lesson::ExecutionOrder => "execution-order",
            Lesson::ZeroDelay => "zero-delay",
            Lesson::DelayedGreeting => "delayed-greeting",
            Lesson::CallbackPyramid => "callback-pyramid",
            Lesson::ErrorFirst => "error-first",
            Lesson::UserLookup => "user-lookup",
            Lesson::NestedTimers => "nested-timers",
            Lesson::Retry => "retry",
            Lesson::PromiseCompare => "promise-compare",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Lesson::SyncCallbacks => "a callback handed to plain code runs inline",
            Lesson::ExecutionOrder => "synchronous lines print before any timer",
            Lesson::ZeroDelay => "a 0 ms timer still waits for the current block",
            Lesson::DelayedGreeting => "a callback receives a value later",
            Lesson::CallbackPyramid => "sequential steps nest callbacks inside callbacks",
            Lesson::ErrorFirst => "failures arrive as the Err half of the callback",
            Lesson::UserLookup => "a simulated lookup returns through a callback",
            Lesson::NestedTimers => "a timer set inside a timer queues behind its siblings",
            Lesson::Retry => "retry through the scheduler until success or the limit",
            Lesson::PromiseCompare => "the same fetch as callback, combinator and async/await",
        }
    }

    /// Logical time from the lesson's start until its last deferred task runs.
    pub fn span_ms(self, config: &LessonConfig) -> u64 {
        match self {
            Lesson::ExecutionOrder => 100,
            Lesson::SyncCallbacks | Lesson::ZeroDelay | Lesson::NestedTimers => 0,
            Lesson::DelayedGreeting | Lesson::ErrorFirst | Lesson::UserLookup => {
                ops::FETCH_DELAY_MS
            }
            Lesson::CallbackPyramid => 3 * ops::STEP_DELAY_MS,
            Lesson::Retry => u64::from(config.max_attempts.max(1)) * retry::RETRY_DELAY_MS,
            Lesson::PromiseCompare => 3000 + ops::FETCH_DELAY_MS + ops::DIVIDE_DELAY_MS,
        }
    }

    /// Runs the lesson's synchronous block now, registering its deferred work on `scheduler`.
    pub fn play(self, scheduler: &LocalScheduler, console: &Console, config: &LessonConfig) {
        tracing::debug!(lesson = self.name(), now = scheduler.now(), "playing lesson");
        match self {
            Lesson::SyncCallbacks => sync_callbacks(scheduler, console),
            Lesson::ExecutionOrder => execution_order(scheduler, console),
            Lesson::ZeroDelay => zero_delay(scheduler, console),
            Lesson::DelayedGreeting => delayed_greeting(scheduler, console),
            Lesson::CallbackPyramid => callback_pyramid(scheduler, console),
            Lesson::ErrorFirst => error_first(scheduler, console),
            Lesson::UserLookup => user_lookup(scheduler, console),
            Lesson::NestedTimers => nested_timers(scheduler, console),
            Lesson::Retry => retry_lesson(scheduler, console, config),
            Lesson::PromiseCompare => promise_compare(scheduler, console),
        }
    }
}

impl fmt::Display for Lesson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Lesson {
    type Err = UnknownLesson;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Lesson::ALL
            .into_iter()
            .find(|lesson| lesson.name() == s)
            .ok_or_else(|| UnknownLesson(s.to_string()))
    }
}

/// Runs one lesson on a fresh scheduler.
pub fn run_lesson(lesson: Lesson, config: &LessonConfig) -> Result<LessonRun, SchedulerError> {
    let scheduler = LocalScheduler::with_config(config.scheduler);
    let console = Console::new(&scheduler, config.echo);
    let report = scheduler.run(|| lesson.play(&scheduler, &console, config))?;
    Ok(LessonRun {
        lines: console.lines(),
        report,
    })
}

/// Chains every lesson on one scheduler, each starting after the previous one
/// has finished, then halts with exit code 0.
pub fn run_all(config: &LessonConfig) -> Result<LessonRun, SchedulerError> {
    let scheduler = LocalScheduler::with_config(config.scheduler);
    let console = Console::new(&scheduler, config.echo);
    let config = *config;

    let report = scheduler.run(|| {
        let mut offset = 0;
        for lesson in Lesson::ALL {
            let sch = scheduler.clone();
            let out = console.clone();
            scheduler.set_timeout(offset, move || {
                out.log(format!("=== {lesson}: {} ===", lesson.summary()));
                lesson.play(&sch, &out, &config);
            });
            offset += lesson.span_ms(&config) + LESSON_GAP_MS;
        }

        let sch = scheduler.clone();
        let out = console.clone();
        scheduler.set_timeout(offset, move || {
            out.log("=== all lessons complete ===");
            sch.halt(0);
        });
    })?;

    Ok(LessonRun {
        lines: console.lines(),
        report,
    })
}

/// Hands `a` and `b` to `operation` and prints what comes back, all before returning.
fn execute_operation(console: &Console, a: i64, b: i64, operation: impl FnOnce(i64, i64) -> i64) {
    console.log(format!("result: {}", operation(a, b)));
}

fn sync_callbacks(scheduler: &LocalScheduler, console: &Console) {
    console.log("sync block start");
    let out = console.clone();
    scheduler.set_timeout(0, move || out.log("deferred: after every inline callback"));

    scheduler.run_synchronous(|| {
        execute_operation(console, 5, 3, |x, y| x + y);
        execute_operation(console, 5, 3, |x, y| x * y);

        let numbers = [1, 2, 3, 4, 5];
        console.log(format!("numbers: {numbers:?}"));
        numbers.iter().for_each(|n| console.log(format!("for_each: {}", n * 2)));
        let doubled: Vec<i32> = numbers.iter().map(|n| n * 2).collect();
        console.log(format!("map: {doubled:?}"));
        let evens: Vec<i32> = numbers.iter().copied().filter(|n| n % 2 == 0).collect();
        console.log(format!("filter: {evens:?}"));
        let sum = numbers.iter().fold(0, |acc, n| acc + n);
        console.log(format!("fold: {sum}"));
    });

    console.log("sync block end");
}

fn execution_order(scheduler: &LocalScheduler, console: &Console) {
    console.log("A");
    let out = console.clone();
    scheduler.set_timeout(0, move || out.log("B"));
    console.log("C");
    let out = console.clone();
    scheduler.set_timeout(100, move || out.log("D"));
    console.log("E");
}

fn zero_delay(scheduler: &LocalScheduler, console: &Console) {
    console.log("start");
    let out = console.clone();
    scheduler.set_timeout(0, move || out.log("inside timeout"));
    for i in 0..3 {
        console.log(format!("loop {i}"));
    }
    console.log("end");
}

fn delayed_greeting(scheduler: &LocalScheduler, console: &Console) {
    console.log("preparing greeting...");
    let out = console.clone();
    ops::delayed_greeting(scheduler, "Taro", ops::FETCH_DELAY_MS, move |message| {
        out.log(message)
    });
    console.log("ready");
}

// The nesting is the point of this lesson.
fn callback_pyramid(scheduler: &LocalScheduler, console: &Console) {
    console.log("pipeline started");
    let (sch, out) = (scheduler.clone(), console.clone());
    ops::run_step(scheduler, Step::Fetch, "", move |fetched| {
        out.log(format!("step 1: fetched {fetched}"));
        let (sch2, out2) = (sch.clone(), out.clone());
        ops::run_step(&sch, Step::Process, &fetched, move |processed| {
            out2.log(format!("step 2: {processed}"));
            let out3 = out2.clone();
            ops::run_step(&sch2, Step::Save, &processed, move |saved| {
                out3.log(format!("step 3: {saved}"));
                out3.log("pipeline finished");
            });
        });
    });
}

fn error_first(scheduler: &LocalScheduler, console: &Console) {
    for (a, b) in [(10.0, 2.0), (10.0, 0.0)] {
        let out = console.clone();
        ops::divide(scheduler, a, b, move |result| match result {
            Ok(quotient) => out.log(format!("{a} / {b} = {quotient}")),
            Err(err) => out.log(format!("error: {err}")),
        });
    }
    for url in ["https://example.com", ""] {
        let out = console.clone();
        ops::fetch_data(scheduler, url, move |result| match result {
            Ok(data) => out.log(format!("data: {data}")),
            Err(err) => out.log(format!("error: {err}")),
        });
    }
}

fn user_lookup(scheduler: &LocalScheduler, console: &Console) {
    console.log("looking up users 2 and 9...");
    for id in [2, 9] {
        let out = console.clone();
        ops::fetch_user_name(scheduler, id, move |name| {
            out.log(format!("user {id}: {name}"))
        });
    }
}

fn nested_timers(scheduler: &LocalScheduler, console: &Console) {
    console.log("1");
    let (sch, out) = (scheduler.clone(), console.clone());
    scheduler.set_timeout(0, move || {
        out.log("2");
        let inner = out.clone();
        sch.set_timeout(0, move || inner.log("3"));
    });
    let out = console.clone();
    scheduler.set_timeout(0, move || out.log("4"));
    console.log("5");
}

fn retry_lesson(scheduler: &LocalScheduler, console: &Console, config: &LessonConfig) {
    let policy = RetryPolicy::with_max_attempts(config.max_attempts);
    let events = console.clone();
    let out = console.clone();
    retry::fetch_with_retry(
        scheduler,
        policy,
        Seeded::new(config.seed, config.success_rate),
        move |event| match event {
            RetryEvent::Attempt {
                attempt,
                max_attempts,
            } => events.log(format!("attempt {attempt}/{max_attempts}")),
            RetryEvent::Retrying { failed_attempt } => {
                events.log(format!("attempt {failed_attempt} failed, retrying..."))
            }
        },
        move |result| match result {
            Ok(data) => out.log(format!("final result: {data}")),
            Err(err) => out.log(format!("final result: {err}")),
        },
    );
}

fn promise_compare(scheduler: &LocalScheduler, console: &Console) {
    console.log("[callback]");
    let out = console.clone();
    ops::fetch_data(scheduler, "callback://example", move |result| match result {
        Ok(data) => out.log(format!("callback: {data}")),
        Err(err) => out.log(format!("callback error: {err}")),
    });

    let (sch, out) = (scheduler.clone(), console.clone());
    scheduler.set_timeout(1500, move || {
        out.log("[future combinators]");
        let done = out.clone();
        let fetch = promise::fetch_data_async(&sch, "future://example").map(move |result| {
            match result {
                Ok(data) => done.log(format!("future: {data}")),
                Err(err) => done.log(format!("future error: {err}")),
            }
        });
        sch.spawn_local(fetch);
    });

    let (sch, out) = (scheduler.clone(), console.clone());
    scheduler.set_timeout(3000, move || {
        out.log("[async/await]");
        let inner = sch.clone();
        let done = out.clone();
        sch.spawn_local(async move {
            match promise::fetch_data_async(&inner, "await://example").await {
                Ok(data) => done.log(format!("async/await: {data}")),
                Err(err) => done.log(format!("async/await error: {err}")),
            }
            if let Err(err) = promise::divide_async(&inner, 1.0, 0.0).await {
                done.log(format!("async/await error: {err}"));
            }
        });
    });
}
