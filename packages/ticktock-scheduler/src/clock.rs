use std::thread;
use std::time::{Duration, Instant};

/// Slowest accepted wall-clock speed. Anything below it falls back to logical time.
pub const MIN_WALL_CLOCK_SPEED: f64 = 0.001;

/// How logical time relates to the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ClockMode {
    /// Time jumps straight to the next task's due time.
    #[default]
    Logical,
    /// The run loop sleeps until each task is due. `speed` divides every delay,
    /// so 2.0 runs twice as fast as real time.
    WallClock { speed: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SchedulerConfig {
    pub clock: ClockMode,
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(mut self, clock: ClockMode) -> Self {
        self.clock = clock;
        self
    }

    pub fn realtime(speed: f64) -> Self {
        Self::new().with_clock(ClockMode::WallClock { speed })
    }
}

/// Converts logical due times into sleeps for one pass of the run loop.
pub(crate) struct Pacer {
    origin: Instant,
    base: u64,
    speed: Option<f64>,
}

impl Pacer {
    pub(crate) fn start(mode: ClockMode, base: u64) -> Self {
        let speed = match mode {
            ClockMode::Logical => None,
            ClockMode::WallClock { speed }
                if speed.is_finite() && speed >= MIN_WALL_CLOCK_SPEED =>
            {
                Some(speed)
            }
            ClockMode::WallClock { speed } => {
                tracing::warn!(speed, "invalid wall clock speed, falling back to logical time");
                None
            }
        };
        Self {
            origin: Instant::now(),
            base,
            speed,
        }
    }

    /// Blocks until `due` in wall-clock terms. No-op in logical mode.
    pub(crate) fn wait_until(&self, due: u64) {
        let Some(speed) = self.speed else {
            return;
        };
        let offset_ms = due.saturating_sub(self.base) as f64 / speed;
        let Some(target) = Duration::try_from_secs_f64(offset_ms / 1000.0)
            .ok()
            .and_then(|offset| self.origin.checked_add(offset))
        else {
            tracing::warn!(due, speed, "wall clock target out of range, not sleeping");
            return;
        };
        let now = Instant::now();
        if target > now {
            thread::sleep(target - now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_slow_speed_falls_back_to_logical() {
        assert_eq!(Pacer::start(ClockMode::WallClock { speed: 1e-20 }, 0).speed, None);
        assert_eq!(Pacer::start(ClockMode::WallClock { speed: f64::NAN }, 0).speed, None);
        assert_eq!(Pacer::start(ClockMode::WallClock { speed: 2.0 }, 0).speed, Some(2.0));
    }

    #[test]
    fn unrepresentable_target_does_not_sleep() {
        let pacer = Pacer {
            origin: Instant::now(),
            base: 0,
            speed: Some(f64::MIN_POSITIVE),
        };
        let started = Instant::now();
        pacer.wait_until(u64::MAX);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
