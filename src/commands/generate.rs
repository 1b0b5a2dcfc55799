use std::io::{self, Read};

use clap::Args;

use crate::app::Runtime;
use crate::errors::CliError;
use crate::illustration::{POLL_INTERVAL, PollOutcome};
use crate::poem::{PoemMode, PoemView};

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Prompt text
    pub prompt: Option<String>,
    /// Read prompt from stdin
    #[arg(long)]
    pub stdin: bool,
    /// Generation mode (defaults to the profile's mode, then classic)
    #[arg(long, value_enum, ignore_case = true)]
    pub mode: Option<PoemMode>,
    /// Keep polling until the illustration is ready
    #[arg(long = "wait-illustration")]
    pub wait_illustration: bool,
}

pub async fn handle(runtime: &Runtime, args: GenerateArgs) -> Result<(), CliError> {
    let prompt = resolve_prompt(&args)?;
    let mode = runtime.resolved_mode(args.mode);
    let api = runtime.api_client()?;

    runtime
        .output
        .print_verbose(&format!("mode={} api={}", mode.as_str(), api.base_url()));
    let poem = api.generate_poem(&prompt, mode).await?;
    tracing::info!(poem_id = ?poem.poem_id, "poem generated");

    if runtime.output.json {
        runtime.output.print_json(&poem)?;
    } else {
        runtime
            .output
            .print_poem(&PoemView::from(&poem), runtime.output.verbose);
        if let Some(id) = &poem.poem_id {
            runtime.output.print_stderr(&format!("poem_id: {id}"));
        }
        if let Some(url) = &poem.illustration_url {
            runtime.output.print_human(&format!("illustration: {url}"));
        }
    }

    if !args.wait_illustration || poem.illustration_url.is_some() {
        return Ok(());
    }
    let Some(poem_id) = poem.poem_id else {
        runtime
            .output
            .print_stderr("No poem_id returned; this poem has no illustration to wait for.");
        return Ok(());
    };

    runtime
        .output
        .print_stderr("Waiting for illustration (checking every 3s)...");
    let outcome = super::illustration::wait_for(&api, &poem_id, POLL_INTERVAL).await;
    report_wait(runtime, &poem_id, outcome)
}

pub(crate) fn report_wait(
    runtime: &Runtime,
    poem_id: &str,
    outcome: PollOutcome,
) -> Result<(), CliError> {
    match outcome {
        PollOutcome::Ready(url) => {
            if runtime.output.json {
                runtime.output.print_json(&serde_json::json!({
                    "poem_id": poem_id,
                    "status": "ready",
                    "illustration_url": url,
                }))?;
            } else {
                runtime.output.print_human(&format!(
                    "illustration: {}",
                    url.as_deref().unwrap_or("(ready, no url)")
                ));
            }
            Ok(())
        }
        PollOutcome::Failed => Err(CliError::Generic(format!(
            "Illustration for poem {poem_id} could not be generated."
        ))),
        PollOutcome::Stopped(err) => Err(err),
    }
}

fn resolve_prompt(args: &GenerateArgs) -> Result<String, CliError> {
    if args.stdin {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| CliError::Generic(format!("Failed reading stdin: {e}")))?;
        return non_empty_prompt(&input).ok_or_else(|| {
            CliError::Usage(
                "No prompt provided via stdin. Pipe text or pass a prompt argument.".to_string(),
            )
        });
    }

    args.prompt
        .as_deref()
        .and_then(non_empty_prompt)
        .ok_or_else(|| {
            CliError::Usage(
                "Missing prompt. Use `poemsmith generate \"...\"` or pass `--stdin`.".to_string(),
            )
        })
}

fn non_empty_prompt(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct GenerateCli {
        #[command(flatten)]
        args: GenerateArgs,
    }

    fn args(prompt: Option<&str>) -> GenerateArgs {
        GenerateArgs {
            prompt: prompt.map(str::to_string),
            stdin: false,
            mode: None,
            wait_illustration: false,
        }
    }

    #[test]
    fn prompt_is_trimmed() {
        assert_eq!(resolve_prompt(&args(Some("  autumn  "))).unwrap(), "autumn");
    }

    #[test]
    fn blank_or_missing_prompt_is_a_usage_error() {
        assert!(matches!(
            resolve_prompt(&args(Some(" \t "))),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(resolve_prompt(&args(None)), Err(CliError::Usage(_))));
    }

    #[test]
    fn mode_flag_ignores_case() {
        let cli = GenerateCli::try_parse_from(["generate", "--mode", "Classic", "rain"]).unwrap();
        assert_eq!(cli.args.mode, Some(PoemMode::Classic));

        let cli = GenerateCli::try_parse_from(["generate", "--mode", "EIGHTIES", "rain"]).unwrap();
        assert_eq!(cli.args.mode, Some(PoemMode::Eighties));
    }
}
