// Results from background tasks, applied on the UI loop.

use crate::illustration::PollOutcome;
use crate::poem::PoemView;
use crate::tui::types::{ApiHealth, App, Effect, Illustration, TuiMsg};

pub fn handle_tui_msg(app: &mut App, msg: TuiMsg) -> Option<Effect> {
    match msg {
        TuiMsg::Generated { seq, result } => {
            if seq != app.request_seq {
                tracing::debug!(seq, current = app.request_seq, "dropping stale generation");
                return None;
            }
            app.loading = false;
            match result {
                Ok(poem) => {
                    app.poem = Some(PoemView::from(&poem));
                    app.error = None;
                    app.scroll = 0;
                    app.status = if poem.title.trim().is_empty() {
                        "Poem ready.".to_string()
                    } else {
                        format!("Poem ready: {}", poem.title.trim())
                    };

                    if let Some(url) = poem.illustration_url {
                        app.illustration = Illustration::Ready { url: Some(url) };
                        return None;
                    }
                    let poem_id = poem.poem_id?;
                    app.illustration = Illustration::Pending {
                        poem_id: poem_id.clone(),
                    };
                    Some(Effect::PollIllustration { seq, poem_id })
                }
                Err(err) => {
                    tracing::warn!(error = %err, "generation failed");
                    app.error = Some(err.to_string());
                    app.status = "Generation failed.".to_string();
                    None
                }
            }
        }
        TuiMsg::Archive(res) => {
            app.archive.loading = false;
            match res {
                Ok(items) => {
                    app.archive.loaded = true;
                    app.archive.error = None;
                    let selected = app
                        .archive
                        .list_state
                        .selected()
                        .filter(|idx| *idx < items.len())
                        .or(if items.is_empty() { None } else { Some(0) });
                    app.archive.list_state.select(selected);
                    app.status = format!("Loaded {} archived poems", items.len());
                    app.archive.items = items;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "archive load failed");
                    app.archive.error = Some(err.to_string());
                    app.status = "Failed loading archive.".to_string();
                }
            }
            None
        }
        TuiMsg::Illustration { seq, outcome } => {
            if seq != app.request_seq {
                return None;
            }
            app.illustration_poll = None;
            app.illustration = match outcome {
                PollOutcome::Ready(url) => {
                    app.status = "Illustration ready. Ctrl+O opens it.".to_string();
                    Illustration::Ready { url }
                }
                PollOutcome::Failed => Illustration::Unavailable,
                PollOutcome::Stopped(_) => Illustration::None,
            };
            None
        }
        TuiMsg::Health(res) => {
            app.api_health = match res {
                Ok(_) => ApiHealth::Online,
                Err(err) => {
                    tracing::info!(error = %err, "health check failed");
                    ApiHealth::Offline
                }
            };
            None
        }
    }
}
