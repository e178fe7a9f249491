use futures::task::{ArcWake, waker};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::task::Waker;

/// Ordering key of a deferred task: logical due time first, then registration order.
/// The derived `Ord` compares fields in declaration order, which is exactly that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskKey {
    pub due: u64,
    pub seq: u64,
}

/// A unit of work registered to run later.
pub struct DeferredTask {
    key: TaskKey,
    action: Box<dyn FnOnce()>,
}

impl DeferredTask {
    pub fn new(key: TaskKey, action: Box<dyn FnOnce()>) -> Self {
        Self { key, action }
    }

    pub fn key(&self) -> TaskKey {
        self.key
    }

    /// Consumes the task, so it can only ever run once.
    pub fn run(self) {
        (self.action)();
    }
}

impl fmt::Debug for DeferredTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredTask")
            .field("due", &self.key.due)
            .field("seq", &self.key.seq)
            .finish_non_exhaustive()
    }
}

/// Returned by `schedule_after`; pass it to `cancel` to drop the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(TaskKey);

impl TimerHandle {
    pub(crate) fn new(key: TaskKey) -> Self {
        Self(key)
    }

    pub fn key(&self) -> TaskKey {
        self.0
    }

    /// Logical time at which the task becomes eligible.
    pub fn due(&self) -> u64 {
        self.0.due
    }
}

/// Ids of spawned futures that were woken and need another poll.
/// Wakers must be Send + Sync, so this is shared through an Arc<Mutex> even
/// though only the scheduler thread ever drains it.
pub(crate) type ReadyList = Arc<Mutex<VecDeque<usize>>>;

struct FutureWaker {
    id: usize,
    ready: ReadyList,
}

impl ArcWake for FutureWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        if let Ok(mut ready) = arc_self.ready.lock() {
            if !ready.contains(&arc_self.id) {
                ready.push_back(arc_self.id);
            }
        }
    }
}

pub(crate) fn create_waker(id: usize, ready: ReadyList) -> Waker {
    waker(Arc::new(FutureWaker { id, ready }))
}
