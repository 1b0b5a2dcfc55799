//! Background polling for a poem's illustration.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::errors::CliError;
use crate::poem::{IllustrationState, IllustrationStatus};

pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub enum PollOutcome {
    /// The service reported `ready`; the URL may still be absent.
    Ready(Option<String>),
    /// The service gave up on this illustration.
    Failed,
    /// A status request failed. Polling stops without retrying.
    Stopped(CliError),
}

/// Issues one status request per `period`, starting one period from now, until
/// the illustration is ready or a request fails.
pub async fn poll_until_ready<F, Fut>(period: Duration, mut fetch: F) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<IllustrationStatus, CliError>>,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match fetch().await {
            Ok(status) => match status.status {
                IllustrationState::Ready => return PollOutcome::Ready(status.illustration_url),
                IllustrationState::Failed => return PollOutcome::Failed,
                IllustrationState::Pending | IllustrationState::Unknown => {
                    tracing::trace!(state = ?status.status, "illustration not ready");
                }
            },
            Err(err) => {
                tracing::debug!(error = %err, "illustration polling stopped");
                return PollOutcome::Stopped(err);
            }
        }
    }
}

/// A running poll. Stopping or dropping it cancels the timer.
#[derive(Debug)]
pub struct IllustrationPoll {
    poem_id: String,
    handle: JoinHandle<()>,
}

impl IllustrationPoll {
    pub fn start<F, Fut, D>(poem_id: String, period: Duration, fetch: F, on_done: D) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<IllustrationStatus, CliError>> + Send + 'static,
        D: FnOnce(PollOutcome) + Send + 'static,
    {
        tracing::debug!(%poem_id, "illustration polling started");
        let handle = tokio::spawn(async move {
            let outcome = poll_until_ready(period, fetch).await;
            on_done(outcome);
        });
        Self { poem_id, handle }
    }

    pub fn poem_id(&self) -> &str {
        &self.poem_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for IllustrationPoll {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            tracing::debug!(poem_id = %self.poem_id, "illustration polling cancelled");
        }
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::oneshot;

    use super::*;

    fn status(state: IllustrationState, url: Option<&str>) -> IllustrationStatus {
        IllustrationStatus {
            status: state,
            illustration_url: url.map(str::to_string),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_exactly_when_ready_is_observed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let started = Instant::now();

        let outcome = poll_until_ready(POLL_INTERVAL, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Ok(status(IllustrationState::Pending, None))
                } else {
                    Ok(status(IllustrationState::Ready, Some("https://img.example/a.png")))
                }
            }
        })
        .await;

        assert!(matches!(outcome, PollOutcome::Ready(Some(ref url)) if url == "https://img.example/a.png"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), POLL_INTERVAL * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn first_request_waits_one_period() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let poll = IllustrationPoll::start(
            "p-1".to_string(),
            POLL_INTERVAL,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(status(IllustrationState::Pending, None)) }
            },
            |_| {},
        );

        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(poll.poem_id(), "p-1");
    }

    #[tokio::test(start_paused = true)]
    async fn request_failure_stops_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let outcome = poll_until_ready(POLL_INTERVAL, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(CliError::Network("connection refused".to_string())) }
        })
        .await;

        assert!(matches!(outcome, PollOutcome::Stopped(CliError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_is_terminal() {
        let outcome = poll_until_ready(POLL_INTERVAL, || async {
            Ok(status(IllustrationState::Failed, None))
        })
        .await;
        assert!(matches!(outcome, PollOutcome::Failed));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels_the_timer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let poll = IllustrationPoll::start(
            "p-2".to_string(),
            POLL_INTERVAL,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(status(IllustrationState::Pending, None)) }
            },
            |_| {},
        );

        tokio::time::sleep(Duration::from_secs(7)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        poll.stop();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn outcome_is_reported_once() {
        let (tx, rx) = oneshot::channel();
        let poll = IllustrationPoll::start(
            "p-3".to_string(),
            POLL_INTERVAL,
            || async { Ok(status(IllustrationState::Ready, None)) },
            move |outcome| {
                let _ = tx.send(outcome);
            },
        );

        let outcome = rx.await.unwrap();
        assert!(matches!(outcome, PollOutcome::Ready(None)));
        tokio::task::yield_now().await;
        assert!(poll.is_finished());
    }
}
