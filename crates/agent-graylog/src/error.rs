//! Error types for the Graylog special agent.

/// Failure while talking to the Graylog REST API.
///
/// Every variant counts as a transport failure for the purpose of the
/// debug flag: the runner either aborts on it or skips the section.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned a body that is not valid JSON: {reason}")]
    Decode { url: String, reason: String },
}

impl FetchError {
    /// URL of the request that failed.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }
}

/// Invalid command line or derived configuration.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown section '{0}'")]
    UnknownSection(String),

    #[error("no sections selected")]
    EmptySections,

    #[error("invalid API base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Errors that end an agent run early.
#[derive(thiserror::Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("writing agent output failed: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
