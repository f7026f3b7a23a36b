//! One-shot deferred tasks run by the main loop
//!
//! Tasks are plain values; the owner decides what running one means. Nothing
//! here sleeps or spawns: the main loop asks for [`DeferredQueue::next_due`],
//! bounds its wait by it, and then drains [`DeferredQueue::take_due`].

use std::time::{Duration, Instant};

#[derive(Debug)]
struct Deferred<T> {
    due: Instant,
    task: T,
}

#[derive(Debug)]
pub struct DeferredQueue<T> {
    entries: Vec<Deferred<T>>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at(&mut self, due: Instant, task: T) {
        self.entries.push(Deferred { due, task });
    }

    pub fn schedule_after(&mut self, delay: Duration, task: T) {
        self.schedule_at(Instant::now() + delay, task);
    }

    /// Earliest deadline among pending tasks
    pub fn next_due(&self) -> Option<Instant> {
        self.entries.iter().map(|entry| entry.due).min()
    }

    /// Remove and return every task due at or before `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.due <= now);
        self.entries = pending;
        due.sort_by_key(|entry| entry.due);
        due.into_iter().map(|entry| entry.task).collect()
    }

    /// Drop pending tasks that no longer apply
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.entries.retain(|entry| keep(&entry.task));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_queue_has_no_deadline() {
        let queue: DeferredQueue<u32> = DeferredQueue::new();
        assert_eq!(queue.next_due(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_next_due_is_earliest() {
        let now = Instant::now();
        let mut queue = DeferredQueue::new();
        queue.schedule_at(now + Duration::from_millis(300), "late");
        queue.schedule_at(now + Duration::from_millis(100), "early");
        assert_eq!(queue.next_due(), Some(now + Duration::from_millis(100)));
    }

    #[test]
    fn test_take_due_only_returns_elapsed_tasks() {
        let now = Instant::now();
        let mut queue = DeferredQueue::new();
        queue.schedule_at(now + Duration::from_millis(200), 2);
        queue.schedule_at(now + Duration::from_millis(50), 1);
        queue.schedule_at(now + Duration::from_secs(10), 3);

        assert!(queue.take_due(now).is_empty());
        assert_eq!(queue.take_due(now + Duration::from_millis(250)), vec![1, 2]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_due(), Some(now + Duration::from_secs(10)));
    }

    #[test]
    fn test_tasks_run_once() {
        let now = Instant::now();
        let mut queue = DeferredQueue::new();
        queue.schedule_at(now, "once");
        assert_eq!(queue.take_due(now), vec!["once"]);
        assert!(queue.take_due(now + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_retain_discards_stale_tasks() {
        let now = Instant::now();
        let mut queue = DeferredQueue::new();
        queue.schedule_at(now, (1u64, 10u32));
        queue.schedule_at(now, (2u64, 11u32));
        queue.retain(|(generation, _)| *generation == 2);
        assert_eq!(queue.take_due(now), vec![(2, 11)]);
    }
}
