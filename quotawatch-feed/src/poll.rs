//! Recurring background fetches against one endpoint.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use quotawatch_client::ClientError;

/// One outcome of a scheduled fetch, tagged with the poller's tick
/// sequence. Every tick produces exactly one update.
#[derive(Debug)]
pub enum PollUpdate<T> {
    /// The fetch succeeded.
    Snapshot { seq: u64, value: T },
    /// The fetch failed; the schedule keeps running.
    Failed { seq: u64, error: ClientError },
}

/// A recurring fetch loop for one endpoint.
///
/// The loop fires once immediately and then on every period, delivering
/// each outcome over the update channel. Pollers are fully independent of
/// one another, and no fetch error ever escapes the loop.
///
/// One fetch is in flight at a time: the loop awaits the fetch before
/// taking the next tick, and ticks that elapse during a slow fetch are
/// skipped rather than burst. Retry of a failed fetch is simply the next
/// tick.
///
/// [`stop`](Self::stop) races the in-flight fetch against the stop signal,
/// so a result that arrives after stopping is discarded, never delivered.
/// Dropping the poller stops it the same way.
#[derive(Debug)]
pub struct Poller {
    stop_tx: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<()>,
}

impl Poller {
    /// Spawn the fetch loop onto the current tokio runtime.
    ///
    /// `name` labels the poller in logs. `fetch` is called once per tick;
    /// injecting it as a closure is what keeps the schedule testable
    /// without a live server.
    pub fn spawn<T, F, Fut>(
        name: impl Into<String>,
        period: Duration,
        updates: mpsc::Sender<PollUpdate<T>>,
        fetch: F,
    ) -> Self
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let name = name.into();
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut seq: u64 = 0;

            loop {
                tokio::select! {
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        seq += 1;

                        // Race the fetch against the stop signal so an
                        // in-flight request is abandoned, not delivered.
                        let outcome = tokio::select! {
                            result = fetch() => result,
                            _ = stop_rx.changed() => break,
                        };
                        if *stop_rx.borrow() {
                            break;
                        }

                        let update = match outcome {
                            Ok(value) => {
                                debug!(endpoint = %name, seq, "poll succeeded");
                                PollUpdate::Snapshot { seq, value }
                            }
                            Err(error) => {
                                warn!(endpoint = %name, seq, %error, "poll failed");
                                PollUpdate::Failed { seq, error }
                            }
                        };

                        if updates.send(update).await.is_err() {
                            // Receiver gone; nobody is listening anymore.
                            break;
                        }
                    }
                }
            }

            debug!(endpoint = %name, "poller stopped");
        });

        Self { stop_tx, handle }
    }

    /// Signal the loop to stop. Idempotent; returns immediately.
    ///
    /// No update is delivered once the loop observes the signal, including
    /// the result of a fetch already in flight.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Whether the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn counter_fetch(
        calls: &Arc<AtomicU64>,
    ) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = Result<u64, ClientError>> + Send>> + Send + 'static
    {
        let calls = calls.clone();
        move || {
            let calls = calls.clone();
            Box::pin(async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_immediately_then_on_the_period() {
        let (tx, mut rx) = mpsc::channel(8);
        let calls = Arc::new(AtomicU64::new(0));
        let poller = Poller::spawn("status", Duration::from_secs(10), tx, counter_fetch(&calls));

        let started = tokio::time::Instant::now();

        let first = rx.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(matches!(first, PollUpdate::Snapshot { seq: 1, value: 1 }));

        let second = rx.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        assert!(matches!(second, PollUpdate::Snapshot { seq: 2, value: 2 }));

        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_the_schedule_running() {
        let (tx, mut rx) = mpsc::channel(8);
        let calls = Arc::new(AtomicU64::new(0));
        let fetch_calls = calls.clone();
        let poller = Poller::spawn("flaky", Duration::from_secs(5), tx, move || {
            let calls = fetch_calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ClientError::Status(503))
                } else {
                    Ok(7u64)
                }
            }
        });

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first,
            PollUpdate::Failed {
                seq: 1,
                error: ClientError::Status(503)
            }
        ));

        // The next tick retries and succeeds.
        let second = rx.recv().await.unwrap();
        assert!(matches!(second, PollUpdate::Snapshot { seq: 2, value: 7 }));

        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_an_in_flight_fetch() {
        let (tx, mut rx) = mpsc::channel(8);
        let calls = Arc::new(AtomicU64::new(0));
        let fetch_calls = calls.clone();
        let poller = Poller::spawn("slow", Duration::from_secs(60), tx, move || {
            let calls = fetch_calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(42u64)
            }
        });

        // Let the first tick fire and the fetch get in flight.
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        poller.stop();

        // The in-flight result resolves into nothing: the loop exits
        // without delivering it.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_scheduled_ticks_from_firing() {
        let (tx, mut rx) = mpsc::channel(8);
        let calls = Arc::new(AtomicU64::new(0));
        let poller = Poller::spawn("status", Duration::from_secs(10), tx, counter_fetch(&calls));

        let first = rx.recv().await;
        assert!(first.is_some());

        poller.stop();

        assert!(rx.recv().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pollers_are_independent() {
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        let calls_a = Arc::new(AtomicU64::new(0));
        let calls_b = Arc::new(AtomicU64::new(0));

        let poller_a = Poller::spawn("a", Duration::from_secs(10), tx_a, counter_fetch(&calls_a));
        let poller_b = Poller::spawn("b", Duration::from_secs(10), tx_b, counter_fetch(&calls_b));

        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.recv().await.is_some());

        poller_a.stop();
        assert!(rx_a.recv().await.is_none());

        // Stopping one poller leaves the other's schedule intact.
        let next_b = rx_b.recv().await.unwrap();
        assert!(matches!(next_b, PollUpdate::Snapshot { seq: 2, .. }));

        poller_b.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_receiver_ends_the_loop() {
        let (tx, rx) = mpsc::channel(8);
        let calls = Arc::new(AtomicU64::new(0));
        let poller = Poller::spawn("status", Duration::from_secs(1), tx, counter_fetch(&calls));

        drop(rx);

        // The first delivery attempt fails and the task exits.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(poller.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let (tx, mut rx) = mpsc::channel(8);
        let calls = Arc::new(AtomicU64::new(0));
        let poller = Poller::spawn("status", Duration::from_secs(10), tx, counter_fetch(&calls));

        assert!(rx.recv().await.is_some());

        poller.stop();
        poller.stop();

        assert!(rx.recv().await.is_none());
    }
}
