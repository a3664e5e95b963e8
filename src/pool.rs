// Offload pool - runs blocking extractor calls off the async runtime

use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::extractor::ExtractError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of OS threads for blocking extraction work.
///
/// Submissions queue FIFO and run as workers free up, so at most `capacity`
/// extractor invocations are in flight at once regardless of request volume.
/// Built once at startup and drained on shutdown; afterwards submissions fail
/// with [`ExtractError::WorkersUnavailable`].
pub struct WorkerPool {
    tx: flume::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (tx, rx) = flume::unbounded::<Job>();

        let workers = (0..size)
            .map(|i| {
                let rx = rx.clone();
                thread::Builder::new()
                    .name(format!("extract-{i}"))
                    .spawn(move || {
                        while let Ok(job) = rx.recv() {
                            job();
                        }
                    })
                    .expect("failed to spawn extraction worker")
            })
            .collect();

        Self { tx, workers }
    }

    /// Number of worker threads.
    pub fn capacity(&self) -> usize {
        self.workers.len()
    }

    /// Queue one blocking operation and await its result.
    ///
    /// The closure runs on a worker thread; the returned future resolves when
    /// the worker hands the result back. A failing closure resolves only its
    /// own submission; siblings are untouched.
    pub async fn submit<T, F>(&self, work: F) -> Result<T, ExtractError>
    where
        F: FnOnce() -> Result<T, ExtractError> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = flume::bounded(1);
        let job: Job = Box::new(move || {
            // Receiver may be gone when the request was abandoned mid-flight.
            let _ = reply_tx.send(work());
        });

        self.tx
            .send_async(job)
            .await
            .map_err(|_| ExtractError::WorkersUnavailable)?;
        reply_rx
            .recv_async()
            .await
            .map_err(|_| ExtractError::WorkersUnavailable)?
    }

    /// Stop accepting work and wait for in-flight jobs to finish.
    pub async fn shutdown(self) {
        let Self { tx, workers } = self;
        drop(tx);
        debug!("draining {} extraction workers", workers.len());
        let _ = tokio::task::spawn_blocking(move || {
            for worker in workers {
                if worker.join().is_err() {
                    warn!("extraction worker panicked");
                }
            }
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_never_exceeds_capacity() {
        let pool = Arc::new(WorkerPool::new(3));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..12 {
            let pool = Arc::clone(&pool);
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                pool.submit(move || {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(25));
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failures_are_isolated() {
        let pool = WorkerPool::new(2);
        let ok = pool.submit(|| Ok::<_, ExtractError>(7u32));
        let bad = pool.submit(|| Err::<u32, _>(ExtractError::Failed("boom".to_string())));
        let (ok, bad) = tokio::join!(ok, bad);

        assert_eq!(ok.unwrap(), 7);
        assert!(matches!(bad, Err(ExtractError::Failed(msg)) if msg == "boom"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn single_worker_runs_in_arrival_order() {
        let pool = WorkerPool::new(1);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut submissions = Vec::new();
        for i in 0..5u32 {
            let seen = Arc::clone(&seen);
            submissions.push(pool.submit(move || {
                seen.lock().unwrap().push(i);
                Ok(())
            }));
        }
        for submission in submissions {
            submission.await.unwrap();
        }

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_lets_in_flight_work_finish() {
        let pool = WorkerPool::new(1);
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = Arc::clone(&done);
            pool.submit(move || {
                thread::sleep(Duration::from_millis(10));
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();
        }
        pool.shutdown().await;

        assert_eq!(done.load(Ordering::SeqCst), 3);
    }
}
