//! Ordered, duplicate-free holding area for admission candidates.
//!
//! The queue keeps entries in trial order: the front is the oldest surviving
//! entry and is tried first, while offered or newly discovered tasks go to the
//! back. Membership is tracked in a hash set next to the deque so `contains`
//! and `offer` stay O(1) amortized.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::{AdmissionError, Task, TaskId};

/// Counts of what a [`UniqueTaskQueue::reconcile`] call changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Entries dropped because the job system stopped reporting them as pending.
    pub removed: usize,
    /// Entries appended because they were pending but not yet queued.
    pub added: usize,
}

/// Duplicate-free task queue with fairness-preserving trial order.
#[derive(Debug, Default, Clone)]
pub struct UniqueTaskQueue {
    order: VecDeque<Task>,
    ids: HashSet<TaskId>,
}

impl UniqueTaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Align membership with the job system's current pending set.
    ///
    /// Retained entries keep their relative order and take the freshest
    /// descriptor from `pending`. New entries are appended sorted by id so the
    /// result never depends on hash iteration order.
    pub fn reconcile(&mut self, pending: &HashMap<TaskId, Task>) -> ReconcileSummary {
        let before = self.order.len();
        self.order.retain(|task| pending.contains_key(&task.id));
        for task in &mut self.order {
            if let Some(fresh) = pending.get(&task.id) {
                task.clone_from(fresh);
            }
        }
        let removed = before - self.order.len();
        if removed > 0 {
            self.ids = self.order.iter().map(|t| t.id.clone()).collect();
        }

        let mut fresh: Vec<&Task> = pending
            .values()
            .filter(|task| !self.ids.contains(&task.id))
            .collect();
        fresh.sort_by(|a, b| a.id.cmp(&b.id));
        let added = fresh.len();
        for task in fresh {
            self.ids.insert(task.id.clone());
            self.order.push_back(task.clone());
        }

        ReconcileSummary { removed, added }
    }

    /// Place `task` at the back of trial order unless its id is already queued.
    ///
    /// Returns `true` when the task was inserted.
    pub fn offer(&mut self, task: Task) -> bool {
        if self.ids.contains(&task.id) {
            return false;
        }
        self.ids.insert(task.id.clone());
        self.order.push_back(task);
        true
    }

    /// Remove and return the oldest surviving entry.
    pub fn take_next(&mut self) -> Result<Task, AdmissionError> {
        let task = self.order.pop_front().ok_or(AdmissionError::EmptyQueue)?;
        self.ids.remove(&task.id);
        Ok(task)
    }

    /// Whether the queue holds no entries.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether a task with `id` is queued.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Queued ids in trial order.
    pub fn ids(&self) -> Vec<TaskId> {
        self.order.iter().map(|t| t.id.clone()).collect()
    }
}
