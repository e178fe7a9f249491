use serde::Serialize;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use ticktock_scheduler::{LocalScheduler, Scheduler};

/// One line of lesson output, stamped with the logical time it was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub at_ms: u64,
    pub text: String,
}

/// Whether lines are also written to stdout as they are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Echo {
    #[default]
    Silent,
    Text,
    /// One JSON object per line.
    Json,
}

/// Ordered transcript of everything a lesson prints.
/// Clones share the same transcript.
#[derive(Clone)]
pub struct Console {
    scheduler: LocalScheduler,
    lines: Rc<RefCell<Vec<Line>>>,
    echo: Echo,
}

impl Console {
    pub fn new(scheduler: &LocalScheduler, echo: Echo) -> Self {
        Self {
            scheduler: scheduler.clone(),
            lines: Rc::new(RefCell::new(Vec::new())),
            echo,
        }
    }

    pub fn log(&self, text: impl Into<String>) {
        let line = Line {
            at_ms: self.scheduler.now(),
            text: text.into(),
        };
        self.emit(&line);
        self.lines.borrow_mut().push(line);
    }

    fn emit(&self, line: &Line) {
        // A closed stdout (e.g. piped into `head`) must not abort the run loop.
        let written = match self.echo {
            Echo::Silent => return,
            Echo::Text => writeln!(std::io::stdout().lock(), "{}", line.text),
            Echo::Json => match serde_json::to_string(line) {
                Ok(json) => writeln!(std::io::stdout().lock(), "{json}"),
                Err(err) => {
                    tracing::warn!(%err, "failed to encode transcript line");
                    return;
                }
            },
        };
        if let Err(err) = written {
            tracing::debug!(%err, "stdout closed, dropping transcript line");
        }
    }

    pub fn lines(&self) -> Vec<Line> {
        self.lines.borrow().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines.borrow().iter().map(|l| l.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }
}
