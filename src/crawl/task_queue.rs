// src/crawl/task_queue.rs
//! Bounded, concurrency-safe queue of page tasks.

use super::tasks::PageTask;
use crate::error::AppError;
use crossbeam::deque::{Injector, Steal};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Tracks work queue completion state
#[derive(Debug, Default)]
struct WorkTracker {
    /// Number of tasks ever accepted
    accepted: AtomicUsize,
    /// Number of tasks a worker finished with (whatever the outcome)
    completed: AtomicUsize,
}

impl WorkTracker {
    fn add_pending(&self, count: usize) {
        self.accepted.fetch_add(count, Ordering::SeqCst);
    }

    fn mark_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn has_pending_work(&self) -> bool {
        self.accepted.load(Ordering::SeqCst) > self.completed.load(Ordering::SeqCst)
    }
}

/// FIFO task queue with a hard capacity.
///
/// Any number of workers may dequeue concurrently. A task that would
/// exceed the capacity is rejected with [`AppError::QueueCapacity`],
/// never silently dropped.
pub struct TaskQueue {
    injector: Injector<PageTask>,
    capacity: usize,
    /// Tasks currently sitting in the queue
    queued: AtomicUsize,
    work_tracker: WorkTracker,
}

impl TaskQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            injector: Injector::new(),
            capacity,
            queued: AtomicUsize::new(0),
            work_tracker: WorkTracker::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Adds a task, failing if the queue is full.
    pub fn enqueue(&self, task: PageTask) -> Result<(), AppError> {
        let capacity = self.capacity;
        self.queued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |queued| {
                (queued < capacity).then_some(queued + 1)
            })
            .map_err(|_| AppError::QueueCapacity {
                capacity,
                page: task.page,
            })?;

        self.work_tracker.add_pending(1);
        self.injector.push(task);
        Ok(())
    }

    /// Adds every task in order, stopping at the first rejection.
    pub fn enqueue_all(&self, tasks: impl IntoIterator<Item = PageTask>) -> Result<usize, AppError> {
        let mut added = 0;
        for task in tasks {
            self.enqueue(task)?;
            added += 1;
        }
        Ok(added)
    }

    /// Takes the oldest task, or `None` when the queue is empty.
    pub fn dequeue(&self) -> Option<PageTask> {
        loop {
            match self.injector.steal() {
                Steal::Success(task) => {
                    self.queued.fetch_sub(1, Ordering::SeqCst);
                    return Some(task);
                }
                Steal::Empty => return None,
                Steal::Retry => continue,
            }
        }
    }

    /// Number of tasks waiting to be taken.
    pub fn len(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records that a dequeued task is finished.
    pub fn mark_completed(&self) {
        self.work_tracker.mark_completed();
    }

    /// Whether any accepted task is still queued or in flight.
    pub fn has_pending_work(&self) -> bool {
        self.work_tracker.has_pending_work()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlConfig;
    use crate::crawl::tasks::plan_page_tasks;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn dequeues_in_insertion_order() {
        let queue = TaskQueue::with_capacity(10);
        queue
            .enqueue_all(plan_page_tasks(&CrawlConfig::from_constants().unwrap(), 3))
            .unwrap();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dequeue().map(|t| t.page), Some(1));
        assert_eq!(queue.dequeue().map(|t| t.page), Some(2));
        assert_eq!(queue.dequeue().map(|t| t.page), Some(3));
        assert_eq!(queue.dequeue(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn exceeding_capacity_is_an_error() {
        let queue = TaskQueue::with_capacity(2);
        let err = queue
            .enqueue_all(plan_page_tasks(&CrawlConfig::from_constants().unwrap(), 3))
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::QueueCapacity {
                capacity: 2,
                page: 3
            }
        ));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn pending_work_covers_in_flight_tasks() {
        let queue = TaskQueue::with_capacity(4);
        queue
            .enqueue_all(plan_page_tasks(&CrawlConfig::from_constants().unwrap(), 1))
            .unwrap();

        let task = queue.dequeue().unwrap();
        assert!(queue.is_empty());
        assert!(queue.has_pending_work(), "task {} is still in flight", task.page);

        queue.mark_completed();
        assert!(!queue.has_pending_work());
    }

    #[test]
    fn concurrent_consumers_take_each_task_once() {
        let queue = Arc::new(TaskQueue::with_capacity(1_000));
        queue
            .enqueue_all(plan_page_tasks(&CrawlConfig::from_constants().unwrap(), 1_000))
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    let mut pages = Vec::new();
                    while let Some(task) = queue.dequeue() {
                        pages.push(task.page);
                        queue.mark_completed();
                    }
                    pages
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for page in handle.join().unwrap() {
                assert!(seen.insert(page));
            }
        }
        assert_eq!(seen.len(), 1_000);
        assert!(!queue.has_pending_work());
    }
}
