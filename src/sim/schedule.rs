//! Deferred tasks
//!
//! Cooperative timers: a task fires on the first `advance` at or after its
//! deadline, never in between frames. Tasks belong to an owner entity and are
//! dropped when that owner is destroyed first.

use super::host::{DeferredAction, EntityId};

/// A pending delayed action
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredTask {
    pub owner: EntityId,
    /// Scheduler time at which the task becomes due
    pub due: f64,
    pub action: DeferredAction,
    seq: u64,
}

/// Timer queue driven by scaled frame time
#[derive(Debug, Default)]
pub struct Scheduler {
    now: f64,
    next_seq: u64,
    tasks: Vec<DeferredTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds of scaled time advanced so far
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn schedule(&mut self, owner: EntityId, delay: f32, action: DeferredAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(DeferredTask {
            owner,
            due: self.now + f64::from(delay.max(0.0)),
            action,
            seq,
        });
    }

    /// Move the clock forward and take every task now due, earliest first
    pub fn advance(&mut self, dt: f32) -> Vec<DeferredTask> {
        self.now += f64::from(dt.max(0.0));
        let now = self.now;

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|task| task.due <= now);
        self.tasks = pending;

        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due
    }

    /// Drop every task owned by `owner`, returning how many were cancelled
    pub fn cancel_owned_by(&mut self, owner: EntityId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.owner != owner);
        before - self.tasks.len()
    }

    /// Drop everything (level change)
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Remaining time of the earliest pending task owned by `owner`
    pub fn time_until(&self, owner: EntityId) -> Option<f64> {
        self.tasks
            .iter()
            .filter(|task| task.owner == owner)
            .map(|task| task.due - self.now)
            .min_by(f64::total_cmp)
    }
}
