use std::path::PathBuf;

use crate::api::ApiClient;
use crate::config::{CliConfig, active_profile_name, resolve_api_url, resolve_mode};
use crate::errors::CliError;
use crate::output::OutputMode;
use crate::poem::PoemMode;

#[derive(Debug, Clone)]
pub struct Runtime {
    pub output: OutputMode,
    pub config: CliConfig,
    pub config_path: PathBuf,
    pub profile_override: Option<String>,
    pub api_url_override: Option<String>,
    pub timeout_ms: u64,
}

impl Runtime {
    pub fn active_profile(&self) -> String {
        active_profile_name(&self.config, self.profile_override.as_deref())
    }

    pub fn resolved_api_url(&self) -> Result<String, CliError> {
        resolve_api_url(
            &self.config,
            &self.active_profile(),
            self.api_url_override.as_deref(),
        )
    }

    pub fn resolved_mode(&self, mode_override: Option<PoemMode>) -> PoemMode {
        resolve_mode(&self.config, &self.active_profile(), mode_override)
    }

    pub fn api_client(&self) -> Result<ApiClient, CliError> {
        let base_url = self.resolved_api_url()?;
        tracing::debug!(%base_url, profile = %self.active_profile(), "using poem service");
        ApiClient::new(base_url, self.timeout_ms, self.output.debug)
    }
}
