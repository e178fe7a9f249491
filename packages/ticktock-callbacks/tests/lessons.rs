use ticktock_callbacks::{Lesson, LessonConfig, run_all, run_lesson};
use ticktock_scheduler::SchedulerConfig;

fn transcript(lesson: Lesson) -> Vec<String> {
    let run = run_lesson(lesson, &LessonConfig::default()).unwrap();
    run.lines.into_iter().map(|l| l.text).collect()
}

#[test]
fn test_sync_callbacks_lesson() {
    let run = run_lesson(Lesson::SyncCallbacks, &LessonConfig::default()).unwrap();
    assert_eq!(
        run.texts(),
        vec![
            "sync block start",
            "result: 8",
            "result: 15",
            "numbers: [1, 2, 3, 4, 5]",
            "for_each: 2",
            "for_each: 4",
            "for_each: 6",
            "for_each: 8",
            "for_each: 10",
            "map: [2, 4, 6, 8, 10]",
            "filter: [2, 4]",
            "fold: 15",
            "sync block end",
            "deferred: after every inline callback",
        ]
    );
    // Everything inline happened at time 0, before the single deferred task ran.
    assert!(run.lines.iter().all(|l| l.at_ms == 0));
    assert_eq!(run.report.executed, 1);
}

#[test]
fn test_execution_order_lesson() {
    assert_eq!(transcript(Lesson::ExecutionOrder), vec!["A", "C", "E", "B", "D"]);
}

#[test]
fn test_zero_delay_lesson() {
    assert_eq!(
        transcript(Lesson::ZeroDelay),
        vec!["start", "loop 0", "loop 1", "loop 2", "end", "inside timeout"]
    );
}

#[test]
fn test_delayed_greeting_lesson() {
    assert_eq!(
        transcript(Lesson::DelayedGreeting),
        vec!["preparing greeting...", "ready", "Hello, Taro!"]
    );
}

#[test]
fn test_callback_pyramid_lesson() {
    let run = run_lesson(Lesson::CallbackPyramid, &LessonConfig::default()).unwrap();
    assert_eq!(
        run.texts(),
        vec![
            "pipeline started",
            "step 1: fetched data A",
            "step 2: processed data A",
            "step 3: saved: processed data A",
            "pipeline finished",
        ]
    );
    let times: Vec<u64> = run.lines.iter().map(|l| l.at_ms).collect();
    assert_eq!(times, vec![0, 500, 1000, 1500, 1500]);
}

#[test]
fn test_error_first_lesson() {
    assert_eq!(
        transcript(Lesson::ErrorFirst),
        vec![
            "10 / 2 = 5",
            "error: cannot divide by zero",
            "data: data from https://example.com",
            "error: url is empty",
        ]
    );
}

#[test]
fn test_user_lookup_lesson() {
    assert_eq!(
        transcript(Lesson::UserLookup),
        vec!["looking up users 2 and 9...", "user 2: Hanako", "user 9: unknown"]
    );
}

#[test]
fn test_nested_timers_lesson() {
    assert_eq!(transcript(Lesson::NestedTimers), vec!["1", "5", "2", "4", "3"]);
}

#[test]
fn test_retry_lesson_always_succeeds_with_full_rate() {
    let config = LessonConfig {
        success_rate: 1.0,
        ..LessonConfig::default()
    };
    let run = run_lesson(Lesson::Retry, &config).unwrap();
    assert_eq!(run.texts(), vec!["attempt 1/3", "final result: data fetched"]);
}

#[test]
fn test_retry_lesson_exhausts_with_zero_rate() {
    let config = LessonConfig {
        success_rate: 0.0,
        max_attempts: 2,
        ..LessonConfig::default()
    };
    let run = run_lesson(Lesson::Retry, &config).unwrap();
    assert_eq!(
        run.texts(),
        vec![
            "attempt 1/2",
            "attempt 1 failed, retrying...",
            "attempt 2/2",
            "final result: gave up after 2 attempts",
        ]
    );
    assert_eq!(run.report.elapsed, Lesson::Retry.span_ms(&config));
}

#[test]
fn test_retry_lesson_is_reproducible_per_seed() {
    let config = LessonConfig {
        seed: 42,
        success_rate: 0.5,
        ..LessonConfig::default()
    };
    let first = run_lesson(Lesson::Retry, &config).unwrap();
    let second = run_lesson(Lesson::Retry, &config).unwrap();
    assert_eq!(first.lines, second.lines);
    assert_eq!(
        first.texts().iter().filter(|t| t.starts_with("final result")).count(),
        1
    );
}

#[test]
fn test_promise_compare_lesson() {
    assert_eq!(
        transcript(Lesson::PromiseCompare),
        vec![
            "[callback]",
            "callback: data from callback://example",
            "[future combinators]",
            "future: data from future://example",
            "[async/await]",
            "async/await: data from await://example",
            "async/await error: cannot divide by zero",
        ]
    );
}

#[test]
fn test_spans_cover_every_lesson() {
    let config = LessonConfig::default();
    for lesson in Lesson::ALL {
        let run = run_lesson(lesson, &config).unwrap();
        assert!(
            run.report.elapsed <= lesson.span_ms(&config),
            "{lesson} ran for {} ms, span is {}",
            run.report.elapsed,
            lesson.span_ms(&config)
        );
        assert_eq!(run.report.exit_code, None);
    }
}

#[test]
fn test_lesson_names_round_trip() {
    for lesson in Lesson::ALL {
        assert_eq!(lesson.name().parse::<Lesson>(), Ok(lesson));
    }
    assert!("callback-hell".parse::<Lesson>().is_err());
}

#[test]
fn test_run_all_chains_lessons_and_halts() {
    let run = run_all(&LessonConfig::default()).unwrap();

    assert_eq!(run.report.exit_code, Some(0));
    assert_eq!(run.report.abandoned, 0);
    assert_eq!(run.lines.last().unwrap().text, "=== all lessons complete ===");

    let headers: Vec<&str> = run
        .texts()
        .into_iter()
        .filter(|t| t.starts_with("=== ") && t.contains(':'))
        .collect();
    assert_eq!(headers.len(), Lesson::ALL.len());
    assert!(headers[0].starts_with("=== sync-callbacks"));
    assert!(headers[1].starts_with("=== execution-order"));

    // Lessons never overlap: each header comes after the previous lesson's lines.
    let texts = run.texts();
    let nested = texts.iter().position(|t| t.starts_with("=== nested-timers")).unwrap();
    assert_eq!(&texts[nested + 1..nested + 6], &["1", "5", "2", "4", "3"]);

    let times: Vec<u64> = run.lines.iter().map(|l| l.at_ms).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_wall_clock_mode_matches_logical_order() {
    let config = LessonConfig {
        scheduler: SchedulerConfig::realtime(100_000.0),
        ..LessonConfig::default()
    };
    let run = run_lesson(Lesson::NestedTimers, &config).unwrap();
    assert_eq!(run.texts(), vec!["1", "5", "2", "4", "3"]);
}
