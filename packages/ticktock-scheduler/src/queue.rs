use crate::task::{DeferredTask, TaskKey};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

/// Deferred tasks ordered by (due, seq).
/// Since LocalScheduler is single-threaded, we use RefCell<BTreeMap>.
/// No borrow outlives a method call, so tasks may schedule more tasks while running.
#[derive(Default)]
pub struct TaskQueue {
    tasks: RefCell<BTreeMap<TaskKey, DeferredTask>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            tasks: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn push(&self, task: DeferredTask) {
        self.tasks.borrow_mut().insert(task.key(), task);
    }

    /// Removes the task with the smallest key.
    pub fn pop(&self) -> Option<DeferredTask> {
        self.tasks.borrow_mut().pop_first().map(|(_, task)| task)
    }

    pub fn peek_key(&self) -> Option<TaskKey> {
        self.tasks.borrow().keys().next().copied()
    }

    pub fn remove(&self, key: TaskKey) -> bool {
        self.tasks.borrow_mut().remove(&key).is_some()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Drops every queued task without running it. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        // Take the map out first: dropping a task's closure may drop values
        // whose destructors touch the scheduler again.
        let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
        tasks.len()
    }
}

/// A simple FIFO queue for microtasks.
#[derive(Default)]
pub struct MicrotaskQueue {
    queue: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

impl MicrotaskQueue {
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
        }
    }

    pub fn push(&self, task: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push_back(task);
    }

    pub fn pop(&self) -> Option<Box<dyn FnOnce()>> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    pub fn clear(&self) -> usize {
        let queue = std::mem::take(&mut *self.queue.borrow_mut());
        queue.len()
    }
}
