use thiserror::Error;

#[derive(Debug, Clone, Copy)]
pub enum ExitCode {
    Generic = 1,
    Usage = 2,
    Network = 3,
    Http = 4,
    Server = 5,
    Parse = 6,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    Http(String),
    #[error("{0}")]
    Server(String),
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Generic(String),
}

impl CliError {
    /// Errors that came back from the service or the network, where the
    /// `--debug` output carries more detail.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            CliError::Network(_) | CliError::Http(_) | CliError::Server(_) | CliError::Parse(_)
        )
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => ExitCode::Usage as i32,
            CliError::Network(_) => ExitCode::Network as i32,
            CliError::Http(_) => ExitCode::Http as i32,
            CliError::Server(_) => ExitCode::Server as i32,
            CliError::Parse(_) => ExitCode::Parse as i32,
            CliError::Generic(_) => ExitCode::Generic as i32,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        CliError::Generic(format!("I/O error: {value}"))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        CliError::Parse(format!("JSON error: {value}"))
    }
}

impl From<url::ParseError> for CliError {
    fn from(value: url::ParseError) -> Self {
        CliError::Usage(format!("Invalid URL: {value}"))
    }
}

impl From<reqwest::Error> for CliError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return CliError::Network("Request timed out.".to_string());
        }
        CliError::Network(format!("Network request failed: {value}"))
    }
}

pub fn with_debug_hint(message: &str, debug: bool) -> String {
    if debug {
        return message.to_string();
    }
    format!("{message} (try --debug for details)")
}
