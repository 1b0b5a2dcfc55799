// Background requests for the TUI. Each task reports back over the channel.

use tokio::sync::mpsc;

use crate::api::ApiClient;
use crate::illustration::{IllustrationPoll, POLL_INTERVAL};
use crate::poem::PoemMode;
use crate::tui::types::{App, Effect, TuiMsg};

pub fn spawn_health_fetch(api: ApiClient, tx: mpsc::UnboundedSender<TuiMsg>) {
    tokio::spawn(async move {
        let res = api.health().await;
        let _ = tx.send(TuiMsg::Health(res));
    });
}

pub fn spawn_generate(
    api: ApiClient,
    tx: mpsc::UnboundedSender<TuiMsg>,
    seq: u64,
    prompt: String,
    mode: PoemMode,
) {
    tokio::spawn(async move {
        let result = api.generate_poem(&prompt, mode).await;
        let _ = tx.send(TuiMsg::Generated { seq, result });
    });
}

pub fn spawn_archive_fetch(api: ApiClient, tx: mpsc::UnboundedSender<TuiMsg>) {
    tokio::spawn(async move {
        let res = api.list_poems().await;
        let _ = tx.send(TuiMsg::Archive(res));
    });
}

pub fn spawn_illustration_poll(
    api: ApiClient,
    tx: mpsc::UnboundedSender<TuiMsg>,
    seq: u64,
    poem_id: String,
) -> IllustrationPoll {
    let fetch_id = poem_id.clone();
    IllustrationPoll::start(
        poem_id,
        POLL_INTERVAL,
        move || {
            let api = api.clone();
            let poem_id = fetch_id.clone();
            async move { api.illustration_status(&poem_id).await }
        },
        move |outcome| {
            let _ = tx.send(TuiMsg::Illustration { seq, outcome });
        },
    )
}

pub fn dispatch(
    api: &ApiClient,
    tx: &mpsc::UnboundedSender<TuiMsg>,
    app: &mut App,
    effect: Effect,
) {
    match effect {
        Effect::Generate { seq, prompt, mode } => {
            tracing::info!(seq, mode = mode.as_str(), "generating poem");
            spawn_generate(api.clone(), tx.clone(), seq, prompt, mode);
        }
        Effect::LoadArchive => spawn_archive_fetch(api.clone(), tx.clone()),
        Effect::PollIllustration { seq, poem_id } => {
            // Replacing the handle cancels any earlier poll.
            app.illustration_poll = Some(spawn_illustration_poll(
                api.clone(),
                tx.clone(),
                seq,
                poem_id,
            ));
        }
        Effect::OpenUrl(url) => match open::that_detached(&url) {
            Ok(()) => app.status = "Opened illustration in browser.".to_string(),
            Err(err) => {
                tracing::warn!(%url, error = %err, "failed to open browser");
                app.status = format!("Could not open browser: {err}");
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::poem::{IllustrationState, IllustrationStatus};

    #[tokio::test(start_paused = true)]
    async fn new_poll_cancels_the_one_it_replaces() {
        let api = ApiClient::new("http://127.0.0.1:9".to_string(), 5_000, false).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(api.base_url().to_string(), PoemMode::Classic);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        app.illustration_poll = Some(IllustrationPoll::start(
            "old".to_string(),
            POLL_INTERVAL,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    Ok(IllustrationStatus {
                        status: IllustrationState::Pending,
                        illustration_url: None,
                    })
                }
            },
            |_| {},
        ));
        tokio::time::sleep(Duration::from_millis(4_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        dispatch(
            &api,
            &tx,
            &mut app,
            Effect::PollIllustration {
                seq: 1,
                poem_id: "new".to_string(),
            },
        );
        assert_eq!(
            app.illustration_poll.as_ref().map(|poll| poll.poem_id()),
            Some("new")
        );

        // The old poll's next tick was due at 6s; the new one starts at 7s.
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(rx.try_recv().is_err());
    }
}
