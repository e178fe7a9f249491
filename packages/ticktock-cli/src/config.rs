use anyhow::{Result, bail};
use clap::Args;
use ticktock_callbacks::{Echo, LessonConfig};
use ticktock_scheduler::{MIN_WALL_CLOCK_SPEED, SchedulerConfig};

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Sleep through each delay instead of jumping straight to the next task
    #[arg(long)]
    pub realtime: bool,

    /// Divides every delay when --realtime is set (2.0 runs twice as fast)
    #[arg(long, env = "TICKTOCK_SPEED", default_value_t = 1.0)]
    pub speed: f64,

    /// Seed for the retry lesson's simulated failures
    #[arg(long, env = "TICKTOCK_SEED", default_value_t = 0)]
    pub seed: u64,

    /// Chance that a single retry attempt succeeds, between 0 and 1
    #[arg(long, default_value_t = 0.7)]
    pub success_rate: f64,

    /// Attempt limit for the retry lesson
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    /// Print one JSON object per line instead of plain text (ignored with --quiet)
    #[arg(long)]
    pub json: bool,

    /// Do not print the transcript, only the run summary
    #[arg(long)]
    pub quiet: bool,
}

impl RunArgs {
    pub fn lesson_config(&self) -> Result<LessonConfig> {
        if !(self.speed.is_finite() && self.speed >= MIN_WALL_CLOCK_SPEED) {
            bail!(
                "--speed must be a finite number of at least {MIN_WALL_CLOCK_SPEED}, got {}",
                self.speed
            );
        }
        if !(0.0..=1.0).contains(&self.success_rate) {
            bail!("--success-rate must be between 0 and 1, got {}", self.success_rate);
        }
        if self.max_attempts == 0 {
            bail!("--max-attempts must be at least 1");
        }

        let scheduler = if self.realtime {
            SchedulerConfig::realtime(self.speed)
        } else {
            SchedulerConfig::default()
        };
        let echo = match (self.quiet, self.json) {
            (true, _) => Echo::Silent,
            (false, true) => Echo::Json,
            (false, false) => Echo::Text,
        };

        Ok(LessonConfig {
            scheduler,
            echo,
            seed: self.seed,
            success_rate: self.success_rate,
            max_attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticktock_scheduler::ClockMode;

    fn args() -> RunArgs {
        RunArgs {
            realtime: false,
            speed: 1.0,
            seed: 0,
            success_rate: 0.7,
            max_attempts: 3,
            json: false,
            quiet: false,
        }
    }

    #[test]
    fn defaults_are_logical_text() {
        let config = args().lesson_config().unwrap();
        assert_eq!(config.scheduler.clock, ClockMode::Logical);
        assert_eq!(config.echo, Echo::Text);
    }

    #[test]
    fn realtime_uses_speed() {
        let config = RunArgs {
            realtime: true,
            speed: 4.0,
            ..args()
        }
        .lesson_config()
        .unwrap();
        assert_eq!(config.scheduler.clock, ClockMode::WallClock { speed: 4.0 });
    }

    #[test]
    fn rejects_bad_values() {
        assert!(RunArgs { speed: 0.0, ..args() }.lesson_config().is_err());
        assert!(RunArgs { speed: 1e-20, ..args() }.lesson_config().is_err());
        assert!(RunArgs { success_rate: 1.5, ..args() }.lesson_config().is_err());
        assert!(RunArgs { max_attempts: 0, ..args() }.lesson_config().is_err());
    }

    #[test]
    fn quiet_wins_over_json() {
        let config = RunArgs {
            quiet: true,
            json: true,
            ..args()
        }
        .lesson_config()
        .unwrap();
        assert_eq!(config.echo, Echo::Silent);
    }
}
