use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use ticktock_callbacks::{Lesson, LessonRun, run_all, run_lesson};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::RunArgs;

#[derive(Parser)]
#[command(name = "ticktock")]
#[command(about = "Watch callbacks run in scheduler order", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available lessons
    List,
    /// Run one lesson, or `all` to chain every lesson
    Run {
        /// Lesson name as shown by `list`, or `all`
        lesson: String,

        #[command(flatten)]
        args: RunArgs,
    },
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr so they never interleave with the transcript on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("ticktock=warn"))?,
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::List => {
            for lesson in Lesson::ALL {
                println!("{:<18} {}", lesson.name(), lesson.summary());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run { lesson, args } => {
            let config = args.lesson_config()?;
            let run = if lesson == "all" {
                run_all(&config)?
            } else {
                let lesson: Lesson = lesson
                    .parse()
                    .context("run `ticktock list` to see the lesson names")?;
                run_lesson(lesson, &config)?
            };
            summarize(&run, args.quiet);
            Ok(exit_code(&run))
        }
    }
}

fn summarize(run: &LessonRun, quiet: bool) {
    let report = &run.report;
    info!(
        lines = run.lines.len(),
        executed = report.executed,
        abandoned = report.abandoned,
        elapsed_ms = report.elapsed,
        "lesson run finished"
    );
    if report.pending_futures > 0 {
        tracing::warn!(pending = report.pending_futures, "futures never completed");
    }
    if quiet {
        println!(
            "{} lines, {} tasks, {} ms logical time",
            run.lines.len(),
            report.executed,
            report.elapsed
        );
    }
}

fn exit_code(run: &LessonRun) -> ExitCode {
    match run.report.exit_code {
        None | Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
    }
}
