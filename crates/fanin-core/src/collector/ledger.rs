use std::collections::HashMap;

use fanin_model::{TaskId, TaskStatus};

use crate::error::CoreError;

/// Per-run task bookkeeping.
///
/// Owned by the coordinator alone; tasks never touch it.
pub(crate) struct Ledger {
    /// Task ids in launch order.
    order: Vec<TaskId>,
    /// Current status by id.
    status: HashMap<TaskId, TaskStatus>,
    /// Number of tasks that delivered a result.
    reported: usize,
}

impl Ledger {
    /// Registers every id as pending; ids must be unique.
    pub(crate) fn new(ids: impl IntoIterator<Item = TaskId>) -> Result<Self, CoreError> {
        let ids = ids.into_iter();
        let (lower, _) = ids.size_hint();
        let mut order = Vec::with_capacity(lower);
        let mut status = HashMap::with_capacity(lower);

        for id in ids {
            if status.insert(id, TaskStatus::Pending).is_some() {
                return Err(CoreError::DuplicateTask(id));
            }
            order.push(id);
        }
        Ok(Self {
            order,
            status,
            reported: 0,
        })
    }

    #[inline]
    pub(crate) fn total(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub(crate) fn reported(&self) -> usize {
        self.reported
    }

    #[inline]
    pub(crate) fn is_complete(&self) -> bool {
        self.reported == self.order.len()
    }

    pub(crate) fn mark_running(&mut self, id: TaskId) {
        if let Some(status) = self.status.get_mut(&id)
            && *status == TaskStatus::Pending
        {
            *status = TaskStatus::Running;
        }
    }

    /// Records a delivered result.
    ///
    /// Returns `false` (and changes nothing) for unknown ids or ids that already
    /// reached a terminal state, so a task can never be counted twice.
    pub(crate) fn record(&mut self, id: TaskId, outcome: TaskStatus) -> bool {
        match self.status.get_mut(&id) {
            Some(status) if status.is_active() => {
                *status = outcome;
                self.reported += 1;
                true
            }
            _ => false,
        }
    }

    /// Moves every still-active task to `status` and returns their ids in launch order.
    pub(crate) fn expire(&mut self, status: TaskStatus) -> Vec<TaskId> {
        let mut expired = Vec::new();
        for id in &self.order {
            if let Some(current) = self.status.get_mut(id)
                && current.is_active()
            {
                *current = status;
                expired.push(*id);
            }
        }
        expired
    }

    #[cfg(test)]
    pub(crate) fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.status.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u64) -> impl Iterator<Item = TaskId> {
        (0..n).map(TaskId::new)
    }

    #[test]
    fn new_registers_pending() {
        let ledger = Ledger::new(ids(3)).unwrap();
        assert_eq!(ledger.total(), 3);
        assert_eq!(ledger.reported(), 0);
        assert_eq!(ledger.status(TaskId::new(1)), Some(TaskStatus::Pending));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let result = Ledger::new([TaskId::new(1), TaskId::new(2), TaskId::new(1)]);
        assert!(matches!(result, Err(CoreError::DuplicateTask(id)) if id == TaskId::new(1)));
    }

    #[test]
    fn record_counts_once() {
        let mut ledger = Ledger::new(ids(2)).unwrap();
        ledger.mark_running(TaskId::new(0));

        assert!(ledger.record(TaskId::new(0), TaskStatus::Succeeded));
        assert!(!ledger.record(TaskId::new(0), TaskStatus::Failed));
        assert_eq!(ledger.reported(), 1);
        assert_eq!(ledger.status(TaskId::new(0)), Some(TaskStatus::Succeeded));
    }

    #[test]
    fn record_ignores_unknown_ids() {
        let mut ledger = Ledger::new(ids(1)).unwrap();
        assert!(!ledger.record(TaskId::new(99), TaskStatus::Succeeded));
        assert_eq!(ledger.reported(), 0);
    }

    #[test]
    fn expire_marks_only_active_tasks() {
        let mut ledger = Ledger::new(ids(3)).unwrap();
        for id in ids(3) {
            ledger.mark_running(id);
        }
        ledger.record(TaskId::new(1), TaskStatus::Failed);

        let expired = ledger.expire(TaskStatus::Timeout);
        assert_eq!(expired, vec![TaskId::new(0), TaskId::new(2)]);
        assert_eq!(ledger.status(TaskId::new(0)), Some(TaskStatus::Timeout));
        assert_eq!(ledger.status(TaskId::new(1)), Some(TaskStatus::Failed));
        assert!(!ledger.is_complete());
    }

    #[test]
    fn empty_ledger_is_complete() {
        let ledger = Ledger::new(ids(0)).unwrap();
        assert!(ledger.is_complete());
    }
}
