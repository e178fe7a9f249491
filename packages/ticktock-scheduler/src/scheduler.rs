use crate::Scheduler;
use crate::clock::{Pacer, SchedulerConfig};
use crate::error::SchedulerError;
use crate::queue::{MicrotaskQueue, TaskQueue};
use crate::task::{DeferredTask, ReadyList, TaskKey, TimerHandle, create_waker};
use slab::Slab;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

type LocalFuture = Pin<Box<dyn Future<Output = ()>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Idle,
    Running,
    Halted(i32),
}

/// Summary of one pass of the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunReport {
    /// Deferred tasks invoked during this pass.
    pub executed: usize,
    /// Deferred tasks and microtasks dropped unrun because of a halt.
    pub abandoned: usize,
    /// Spawned futures still waiting when the loop stopped. A halt drops them.
    pub pending_futures: usize,
    pub exit_code: Option<i32>,
    /// Logical milliseconds that passed during this pass.
    pub elapsed: u64,
}

struct Inner {
    config: SchedulerConfig,
    timers: TaskQueue,
    microtasks: MicrotaskQueue,
    futures: RefCell<Slab<Option<LocalFuture>>>,
    ready: ReadyList,
    now: Cell<u64>,
    next_seq: Cell<u64>,
    state: Cell<LoopState>,
}

/// Single-threaded cooperative scheduler.
///
/// Cloning is cheap and every clone drives the same queues, so actions can
/// capture a clone and schedule further work from inside the loop.
#[derive(Clone)]
pub struct LocalScheduler {
    inner: Rc<Inner>,
}

impl Default for LocalScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalScheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                timers: TaskQueue::new(),
                microtasks: MicrotaskQueue::new(),
                futures: RefCell::new(Slab::new()),
                ready: ReadyList::default(),
                now: Cell::new(0),
                next_seq: Cell::new(0),
                state: Cell::new(LoopState::Idle),
            }),
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.inner.config
    }

    /// Runs `block` right now on the calling thread. Nothing is queued.
    pub fn run_synchronous<R>(&self, block: impl FnOnce() -> R) -> R {
        tracing::trace!(now = self.now(), "running synchronous block");
        block()
    }

    /// Generic convenience over [`Scheduler::schedule_after`].
    pub fn set_timeout(&self, delay_ms: u64, action: impl FnOnce() + 'static) -> TimerHandle {
        self.schedule_after(delay_ms, Box::new(action))
    }

    /// Drives `future` to completion on this scheduler.
    /// The first poll happens at the next checkpoint, never inside this call.
    pub fn spawn_local<F>(&self, future: F)
    where
        F: Future<Output = ()> + 'static,
    {
        if self.is_halted() {
            tracing::debug!("scheduler halted, dropping spawned future");
            return;
        }
        let future: LocalFuture = Box::pin(future);
        let id = self.inner.futures.borrow_mut().insert(Some(future));
        tracing::debug!(id, "spawned local future");
        if let Ok(mut ready) = self.inner.ready.lock() {
            ready.push_back(id);
        }
    }

    /// Runs `main` as the synchronous program, then drains the queues.
    pub fn run(&self, main: impl FnOnce()) -> Result<RunReport, SchedulerError> {
        let started = self.enter()?;
        main();
        Ok(self.drive(started))
    }

    /// Drains whatever is already queued.
    pub fn run_until_idle(&self) -> Result<RunReport, SchedulerError> {
        let started = self.enter()?;
        Ok(self.drive(started))
    }

    /// Deferred tasks waiting in the queue.
    pub fn pending(&self) -> usize {
        self.inner.timers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.inner.timers.is_empty() && self.inner.microtasks.is_empty() && !self.has_ready()
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.inner.state.get(), LoopState::Halted(_))
    }

    /// Due time of the next deferred task, if any.
    pub fn next_due(&self) -> Option<u64> {
        self.inner.timers.peek_key().map(|key| key.due)
    }

    fn enter(&self) -> Result<u64, SchedulerError> {
        match self.inner.state.get() {
            LoopState::Running => Err(SchedulerError::Reentrant),
            LoopState::Halted(code) => Err(SchedulerError::Halted { code }),
            LoopState::Idle => {
                self.inner.state.set(LoopState::Running);
                Ok(self.now())
            }
        }
    }

    fn drive(&self, started: u64) -> RunReport {
        let pacer = Pacer::start(self.inner.config.clock, started);
        let mut executed = 0;

        loop {
            self.checkpoint();
            if self.is_halted() {
                break;
            }
            let Some(task) = self.inner.timers.pop() else {
                break;
            };
            let TaskKey { due, seq } = task.key();
            pacer.wait_until(due);
            // Keys are never below `now`, but keep the clock monotonic regardless.
            self.inner.now.set(due.max(self.now()));
            tracing::trace!(due, seq, "running deferred task");
            task.run();
            executed += 1;
        }

        let mut report = RunReport {
            executed,
            elapsed: self.now() - started,
            pending_futures: self.inner.futures.borrow().len(),
            ..RunReport::default()
        };

        match self.inner.state.get() {
            LoopState::Halted(code) => {
                report.abandoned = self.inner.timers.clear() + self.inner.microtasks.clear();
                self.drop_futures();
                report.exit_code = Some(code);
                tracing::info!(code, abandoned = report.abandoned, "run loop halted");
            }
            _ => {
                self.inner.state.set(LoopState::Idle);
                tracing::info!(executed, now = self.now(), "run loop drained");
            }
        }
        report
    }

    /// Drains microtasks and woken futures until neither has work left.
    fn checkpoint(&self) {
        while !self.is_halted() {
            if let Some(task) = self.inner.microtasks.pop() {
                task();
            } else if let Some(id) = self.pop_ready() {
                self.poll_future(id);
            } else {
                break;
            }
        }
    }

    /// Frees every spawned future. They may hold scheduler clones, so they are
    /// dropped after the slab borrow is released.
    fn drop_futures(&self) {
        let futures = std::mem::take(&mut *self.inner.futures.borrow_mut());
        if let Ok(mut ready) = self.inner.ready.lock() {
            ready.clear();
        }
        if !futures.is_empty() {
            tracing::debug!(count = futures.len(), "dropping spawned futures");
        }
        drop(futures);
    }

    fn pop_ready(&self) -> Option<usize> {
        self.inner.ready.lock().ok()?.pop_front()
    }

    fn has_ready(&self) -> bool {
        self.inner
            .ready
            .lock()
            .map(|ready| !ready.is_empty())
            .unwrap_or(false)
    }

    fn poll_future(&self, id: usize) {
        // Take the future out of its slot so it can spawn or wake others while polled.
        let taken = self
            .inner
            .futures
            .borrow_mut()
            .get_mut(id)
            .and_then(Option::take);
        let Some(mut future) = taken else {
            return;
        };

        let waker = create_waker(id, self.inner.ready.clone());
        let mut cx = Context::from_waker(&waker);
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                tracing::debug!(id, "local future completed");
                self.inner.futures.borrow_mut().remove(id);
            }
            Poll::Pending => {
                if let Some(slot) = self.inner.futures.borrow_mut().get_mut(id) {
                    *slot = Some(future);
                }
            }
        }
    }
}

impl Scheduler for LocalScheduler {
    fn schedule_after(&self, delay_ms: u64, action: Box<dyn FnOnce()>) -> TimerHandle {
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);
        let key = TaskKey {
            due: self.now().saturating_add(delay_ms),
            seq,
        };

        if self.is_halted() {
            tracing::debug!(due = key.due, seq, "scheduler halted, dropping task");
            return TimerHandle::new(key);
        }

        tracing::debug!(delay_ms, due = key.due, seq, "scheduled deferred task");
        self.inner.timers.push(DeferredTask::new(key, action));
        TimerHandle::new(key)
    }

    fn schedule_microtask(&self, task: Box<dyn FnOnce()>) {
        if self.is_halted() {
            return;
        }
        self.inner.microtasks.push(task);
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let removed = self.inner.timers.remove(handle.key());
        if removed {
            tracing::debug!(due = handle.due(), seq = handle.key().seq, "cancelled deferred task");
        }
        removed
    }

    fn halt(&self, code: i32) {
        if let LoopState::Halted(previous) = self.inner.state.get() {
            tracing::debug!(previous, code, "halt requested twice, keeping first code");
            return;
        }
        tracing::info!(code, now = self.now(), "halt requested");
        self.inner.state.set(LoopState::Halted(code));
    }

    fn now(&self) -> u64 {
        self.inner.now.get()
    }
}
