use crate::app::Runtime;
use crate::errors::CliError;

pub async fn handle(runtime: &Runtime) -> Result<(), CliError> {
    let api = runtime.api_client()?;
    let res = api.health().await?;
    runtime.output.print_verbose(&format!(
        "request_id={:?} elapsed_ms={}",
        res.request_id, res.elapsed_ms
    ));

    if runtime.output.json {
        runtime.output.print_json(&res.json)?;
        return Ok(());
    }

    let status = res
        .json
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("-");
    runtime.output.print_human(&format!("api: {}", api.base_url()));
    runtime.output.print_human(&format!("status: {status}"));
    Ok(())
}
