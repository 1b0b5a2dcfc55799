use std::time::Duration;

use clap::Args;

use crate::api::ApiClient;
use crate::app::Runtime;
use crate::errors::CliError;
use crate::illustration::{POLL_INTERVAL, PollOutcome, poll_until_ready};
use crate::poem::IllustrationState;

#[derive(Debug, Args)]
pub struct IllustrationArgs {
    pub poem_id: String,
    /// Poll every 3 seconds until the illustration is ready
    #[arg(long)]
    pub wait: bool,
}

pub async fn handle(runtime: &Runtime, args: IllustrationArgs) -> Result<(), CliError> {
    let poem_id = args.poem_id.trim().to_string();
    if poem_id.is_empty() {
        return Err(CliError::Usage("poem_id must not be empty.".to_string()));
    }
    let api = runtime.api_client()?;

    if args.wait {
        runtime
            .output
            .print_stderr("Waiting for illustration (checking every 3s)...");
        let outcome = wait_for(&api, &poem_id, POLL_INTERVAL).await;
        return super::generate::report_wait(runtime, &poem_id, outcome);
    }

    let status = api.illustration_status(&poem_id).await?;
    if runtime.output.json {
        runtime.output.print_json(&status)?;
        return Ok(());
    }

    let label = match status.status {
        IllustrationState::Pending => "pending",
        IllustrationState::Ready => "ready",
        IllustrationState::Failed => "failed",
        IllustrationState::Unknown => "unknown",
    };
    runtime.output.print_human(&format!("status: {label}"));
    if let Some(url) = status.illustration_url {
        runtime.output.print_human(&format!("illustration: {url}"));
    }
    Ok(())
}

pub(crate) async fn wait_for(api: &ApiClient, poem_id: &str, period: Duration) -> PollOutcome {
    poll_until_ready(period, move || api.illustration_status(poem_id)).await
}
