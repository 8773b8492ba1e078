//! Cancellable repeating task with an RAII handle.

use futures::future::BoxFuture;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs `tick` immediately, then again after each `interval`, until the tick
/// breaks, the poller is cancelled, or the handle is dropped.
///
/// A tick is never started while the previous one is still running.
/// Cancelling drops an in-flight tick future.
#[derive(Debug)]
pub struct ScopedPoller {
    cancel: CancellationToken,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ScopedPoller {
    /// Spawn on the current tokio runtime. Cancelling `parent` also stops
    /// this poller.
    pub fn spawn<F>(
        name: &'static str,
        interval: Duration,
        parent: &CancellationToken,
        tick: F,
    ) -> Self
    where
        F: FnMut() -> BoxFuture<'static, ControlFlow<()>> + Send + 'static,
    {
        let cancel = parent.child_token();
        let wake = Arc::new(Notify::new());
        let task = tokio::spawn(run(name, interval, cancel.clone(), wake.clone(), tick));
        Self { cancel, wake, task }
    }

    /// Cut the current wait short. A wake during a tick runs the next tick as
    /// soon as the current one finishes.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    /// Shared handle for waking this poller from another task.
    pub fn waker(&self) -> Arc<Notify> {
        self.wake.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to exit.
    pub async fn stopped(&mut self) {
        let _ = (&mut self.task).await;
    }
}

impl Drop for ScopedPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run<F>(
    name: &'static str,
    interval: Duration,
    cancel: CancellationToken,
    wake: Arc<Notify>,
    mut tick: F,
) where
    F: FnMut() -> BoxFuture<'static, ControlFlow<()>> + Send + 'static,
{
    debug!(poller = name, ?interval, "Poller started");

    loop {
        let flow = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            flow = tick() => flow,
        };
        if flow.is_break() {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = wake.notified() => {}
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!(poller = name, "Poller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_tick(
        counter: Arc<AtomicUsize>,
        stop_after: usize,
    ) -> impl FnMut() -> BoxFuture<'static, ControlFlow<()>> + Send + 'static {
        move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n >= stop_after {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_first_tick_is_immediate() {
        let counter = Arc::new(AtomicUsize::new(0));
        let parent = CancellationToken::new();
        let _poller = ScopedPoller::spawn(
            "test",
            Duration::from_secs(3600),
            &parent,
            counting_tick(counter.clone(), usize::MAX),
        );

        tokio::time::timeout(Duration::from_secs(2), async {
            while counter.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("first tick should not wait for the interval");
    }

    #[tokio::test]
    async fn test_break_stops_loop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let parent = CancellationToken::new();
        let mut poller = ScopedPoller::spawn(
            "test",
            Duration::from_millis(1),
            &parent,
            counting_tick(counter.clone(), 3),
        );

        tokio::time::timeout(Duration::from_secs(2), poller.stopped())
            .await
            .expect("poller should stop after breaking");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(poller.is_finished());
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let counter = Arc::new(AtomicUsize::new(0));
        let parent = CancellationToken::new();
        let poller = ScopedPoller::spawn(
            "test",
            Duration::from_millis(5),
            &parent,
            counting_tick(counter.clone(), usize::MAX),
        );
        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(poller);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_drop = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), after_drop);
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_parent_cancel_stops_child() {
        let counter = Arc::new(AtomicUsize::new(0));
        let parent = CancellationToken::new();
        let mut poller = ScopedPoller::spawn(
            "test",
            Duration::from_millis(5),
            &parent,
            counting_tick(counter, usize::MAX),
        );
        parent.cancel();
        tokio::time::timeout(Duration::from_secs(2), poller.stopped())
            .await
            .expect("parent cancellation should stop the poller");
    }

    #[tokio::test]
    async fn test_wake_skips_wait() {
        let counter = Arc::new(AtomicUsize::new(0));
        let parent = CancellationToken::new();
        let poller = ScopedPoller::spawn(
            "test",
            Duration::from_secs(3600),
            &parent,
            counting_tick(counter.clone(), usize::MAX),
        );

        tokio::time::timeout(Duration::from_secs(2), async {
            while counter.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        poller.wake();
        tokio::time::timeout(Duration::from_secs(2), async {
            while counter.load(Ordering::SeqCst) < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("wake should trigger the next tick");
    }
}
