use clap::{Subcommand, ValueEnum};
use serde_json::json;

use crate::app::Runtime;
use crate::config::{ensure_profile, profile_mut, profile_ref, save_config, validate_url};
use crate::errors::CliError;
use crate::poem::PoemMode;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Initialize config file and profile
    Init {
        #[arg(long = "api-url")]
        api_url: Option<String>,
        #[arg(long, value_enum, ignore_case = true)]
        mode: Option<PoemMode>,
    },
    /// Read a config key from the active profile
    Get { key: ConfigKey },
    /// Set a config key on the active profile
    Set { key: ConfigKey, value: String },
    /// List all profiles
    Profiles,
    /// Switch active profile
    Use { profile: String },
    /// Print the config file location
    Path,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigKey {
    #[value(name = "apiUrl")]
    ApiUrl,
    #[value(name = "mode")]
    Mode,
}

pub async fn handle(runtime: &mut Runtime, command: ConfigCommand) -> Result<(), CliError> {
    match command {
        ConfigCommand::Init { api_url, mode } => init(runtime, api_url, mode),
        ConfigCommand::Get { key } => get(runtime, key),
        ConfigCommand::Set { key, value } => set(runtime, key, value),
        ConfigCommand::Profiles => profiles(runtime),
        ConfigCommand::Use { profile } => use_profile(runtime, profile),
        ConfigCommand::Path => path(runtime),
    }
}

fn init(
    runtime: &mut Runtime,
    api_url: Option<String>,
    mode: Option<PoemMode>,
) -> Result<(), CliError> {
    let profile_name = runtime.active_profile();
    ensure_profile(&mut runtime.config, &profile_name);
    if let Some(profile) = profile_mut(&mut runtime.config, &profile_name) {
        if let Some(url) = api_url {
            validate_url(&url)?;
            profile.api_url = url;
        }
        if mode.is_some() {
            profile.mode = mode;
        }
    }

    runtime.config.profile = profile_name;
    let path = save_config(&runtime.config)?;
    runtime.config_path = path.clone();

    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "ok": true, "path": path }))?;
    } else {
        runtime
            .output
            .print_human(&format!("Config initialized: {}", path.display()));
    }
    Ok(())
}

fn get(runtime: &Runtime, key: ConfigKey) -> Result<(), CliError> {
    let profile_name = runtime.active_profile();
    let profile = profile_ref(&runtime.config, &profile_name).ok_or_else(|| {
        CliError::Usage(format!(
            "Profile '{profile_name}' not found. Run `poemsmith config init` first."
        ))
    })?;

    let (name, value) = match key {
        ConfigKey::ApiUrl => ("apiUrl", profile.api_url.clone()),
        ConfigKey::Mode => (
            "mode",
            profile.mode.unwrap_or_default().as_str().to_string(),
        ),
    };

    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "key": name, "value": value }))?;
    } else {
        runtime.output.print_human(&value);
    }
    Ok(())
}

fn set(runtime: &mut Runtime, key: ConfigKey, value: String) -> Result<(), CliError> {
    let profile_name = runtime.active_profile();
    ensure_profile(&mut runtime.config, &profile_name);
    let profile = profile_mut(&mut runtime.config, &profile_name).ok_or_else(|| {
        CliError::Generic(format!(
            "Failed to resolve profile '{profile_name}' while setting config."
        ))
    })?;

    match key {
        ConfigKey::ApiUrl => {
            validate_url(&value)?;
            profile.api_url = value;
        }
        ConfigKey::Mode => {
            let mode = PoemMode::parse(&value).ok_or_else(|| {
                CliError::Usage(format!("Unknown mode '{value}'. Use `classic` or `1980s`."))
            })?;
            profile.mode = Some(mode);
        }
    }

    let path = save_config(&runtime.config)?;
    runtime.config_path = path;

    if runtime.output.json {
        runtime.output.print_json(&json!({ "ok": true }))?;
    } else {
        runtime.output.print_human("Config updated.");
    }
    Ok(())
}

fn profiles(runtime: &Runtime) -> Result<(), CliError> {
    let active = runtime.active_profile();
    let mut names: Vec<String> = runtime.config.profiles.keys().cloned().collect();
    names.sort();

    if runtime.output.json {
        let payload = names
            .iter()
            .map(|name| {
                let profile = runtime.config.profiles.get(name);
                json!({
                    "name": name,
                    "active": name == &active,
                    "apiUrl": profile.map(|p| p.api_url.clone()).unwrap_or_default(),
                    "mode": profile.and_then(|p| p.mode).unwrap_or_default(),
                })
            })
            .collect::<Vec<_>>();
        runtime.output.print_json(&json!({ "profiles": payload }))?;
        return Ok(());
    }

    for name in names {
        let marker = if name == active { "*" } else { " " };
        let url = runtime
            .config
            .profiles
            .get(&name)
            .map(|p| p.api_url.as_str())
            .unwrap_or("-");
        runtime.output.print_human(&format!("{marker} {name}  {url}"));
    }
    Ok(())
}

fn use_profile(runtime: &mut Runtime, profile_name: String) -> Result<(), CliError> {
    ensure_profile(&mut runtime.config, &profile_name);
    runtime.config.profile = profile_name.clone();
    let path = save_config(&runtime.config)?;
    runtime.config_path = path;

    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "ok": true, "profile": profile_name }))?;
    } else {
        runtime
            .output
            .print_human(&format!("Active profile: {profile_name}"));
    }
    Ok(())
}

fn path(runtime: &Runtime) -> Result<(), CliError> {
    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "path": runtime.config_path }))?;
    } else {
        runtime
            .output
            .print_human(&runtime.config_path.display().to_string());
    }
    Ok(())
}
