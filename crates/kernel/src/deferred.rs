use std::panic::{AssertUnwindSafe, catch_unwind};

use crossbeam_channel::{Receiver, Sender};

use crate::host::{DeferredExecutor, DeferredJob};

/// Post-tick queue of deferred jobs.
///
/// Workers ticking actors concurrently submit through a shared reference; the
/// simulation driver calls [`CommandBuffer::drain`] once the pass over all
/// actors has finished. Jobs submitted while a drain is running wait for the
/// next drain.
pub struct CommandBuffer {
    tx: Sender<DeferredJob>,
    rx: Receiver<DeferredJob>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    /// Number of jobs waiting for the next drain.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Run every job queued before this call, in submission order.
    ///
    /// A panicking job is logged and skipped; it never takes the remaining
    /// jobs or the caller down with it. Returns the number of jobs run.
    pub fn drain(&self) -> usize {
        let _span = tracing::debug_span!("deferred_drain").entered();
        let queued = self.rx.len();
        let mut ran = 0;
        for _ in 0..queued {
            let Ok(job) = self.rx.try_recv() else {
                break;
            };
            if catch_unwind(AssertUnwindSafe(job)).is_err() {
                tracing::error!("deferred job panicked");
            }
            ran += 1;
        }
        tracing::trace!(ran, "deferred drain complete");
        ran
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredExecutor for CommandBuffer {
    fn submit(&self, job: DeferredJob) {
        // The receiver lives as long as `self`, so the send cannot fail.
        let _ = self.tx.send(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn jobs_wait_for_drain() {
        let buffer = CommandBuffer::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        buffer.submit(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(buffer.len(), 1);

        assert_eq!(buffer.drain(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn drain_runs_in_submission_order() {
        let buffer = CommandBuffer::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for i in 0..5 {
            let o = Arc::clone(&order);
            buffer.submit(Box::new(move || o.lock().push(i)));
        }
        buffer.drain();
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn panicking_job_does_not_stop_the_drain() {
        let buffer = CommandBuffer::new();
        let hits = Arc::new(AtomicUsize::new(0));
        buffer.submit(Box::new(|| panic!("host exploded")));
        let h = Arc::clone(&hits);
        buffer.submit(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(buffer.drain(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn jobs_submitted_during_drain_wait_for_next_drain() {
        let buffer = Arc::new(CommandBuffer::new());
        let inner = Arc::clone(&buffer);
        buffer.submit(Box::new(move || {
            inner.submit(Box::new(|| {}));
        }));

        assert_eq!(buffer.drain(), 1);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.drain(), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn concurrent_submitters() {
        let buffer = Arc::new(CommandBuffer::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let b = Arc::clone(&buffer);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        b.submit(Box::new(|| {}));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(buffer.drain(), 100);
    }
}
