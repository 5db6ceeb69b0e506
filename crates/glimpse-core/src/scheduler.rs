//! Cooperative scheduling helpers.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Give other tasks on the runtime a turn before and after heavy work.
pub async fn yield_to_event_loop() {
    tokio::task::yield_now().await;
}

#[derive(Debug, Default)]
struct DebounceState {
    generation: u64,
    /// Only set while the task is still in its quiet-period delay.
    waiting: Option<JoinHandle<()>>,
}

/// Single-slot "latest request wins" delay.
///
/// Each [`schedule`](Self::schedule) replaces whatever is still waiting and
/// restarts the quiet period. Work that has already started is never
/// aborted; callers decide whether its result is still wanted.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    state: Arc<Mutex<DebounceState>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: Arc::new(Mutex::new(DebounceState::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `work` after the quiet period unless rescheduled first.
    /// Returns the generation of this request.
    pub fn schedule<F>(&self, work: F) -> u64
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut state = self.state.lock();
        state.generation += 1;
        let generation = state.generation;
        if let Some(previous) = state.waiting.take() {
            previous.abort();
        }

        let shared = Arc::clone(&self.state);
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = shared.lock();
                if state.generation != generation {
                    return;
                }
                state.waiting = None;
            }
            work.await;
        });
        state.waiting = Some(handle);
        generation
    }

    /// Cancel the waiting request, if any.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        state.generation += 1;
        match state.waiting.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().waiting.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_only_last_request_runs() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let runs = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));

        for i in 1..=5 {
            let runs = Arc::clone(&runs);
            let last = Arc::clone(&last);
            debouncer.schedule(async move {
                runs.fetch_add(1, Ordering::SeqCst);
                last.store(i, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 5);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        debouncer.schedule(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debouncer.is_pending());
        assert!(debouncer.cancel());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!debouncer.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_work_is_not_aborted() {
        let debouncer = Debouncer::new(Duration::from_millis(10));
        let finished = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&finished);
        debouncer.schedule(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let counter = Arc::clone(&finished);
        debouncer.schedule(async move {
            counter.fetch_add(10, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 11);
    }
}
