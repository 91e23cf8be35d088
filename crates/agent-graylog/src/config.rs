//! Run configuration, assembled once from the command line.

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;

use crate::catalog::SectionKind;
use crate::error::ConfigError;

/// Environment variable consulted when no `--password` is given.
pub const PASSWORD_ENV: &str = "GRAYLOG_PASSWORD";

/// URL scheme used to reach Graylog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Protocol {
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => f.write_str("http"),
            Protocol::Https => f.write_str("https"),
        }
    }
}

/// Where node details are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum NodeDisplay {
    /// Under the queried Graylog host.
    #[default]
    Host,
    /// Piggybacked to each node's own hostname.
    Node,
}

/// Where sidecar details are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SidecarDisplay {
    /// Under the queried Graylog host.
    #[default]
    Host,
    /// Piggybacked to each sidecar's node name.
    Sidecar,
}

/// Display-detail routing for the enriched sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    pub nodes: NodeDisplay,
    pub sidecars: SidecarDisplay,
}

/// Basic-auth credentials. The password may be empty.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Everything one agent run needs.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// `<proto>://<host>:<port>/api`, without a trailing slash.
    pub api_base: String,
    pub credentials: Credentials,
    /// Look-back for the failure count, in seconds.
    pub since_secs: u64,
    /// Enabled sections. Order is irrelevant; the catalog decides it.
    pub sections: Vec<SectionKind>,
    pub display: DisplayOptions,
    pub timeout: Option<Duration>,
    pub debug: bool,
}

impl AgentConfig {
    /// Compose and validate the API base URL.
    pub fn api_base(proto: Protocol, hostname: &str, port: u16) -> Result<String, ConfigError> {
        let base = format!("{proto}://{hostname}:{port}/api");
        url::Url::parse(&base).map_err(|e| ConfigError::InvalidUrl {
            url: base.clone(),
            reason: e.to_string(),
        })?;
        Ok(base)
    }

    pub fn is_enabled(&self, kind: SectionKind) -> bool {
        self.sections.contains(&kind)
    }
}

/// Parse a list of section names (each entry may itself be comma-separated).
pub fn parse_sections<S: AsRef<str>>(raw: &[S]) -> Result<Vec<SectionKind>, ConfigError> {
    let mut sections = Vec::new();
    for entry in raw {
        for name in entry.as_ref().split(',') {
            if name.trim().is_empty() {
                continue;
            }
            let kind: SectionKind = name.parse()?;
            if !sections.contains(&kind) {
                sections.push(kind);
            }
        }
    }
    if sections.is_empty() {
        return Err(ConfigError::EmptySections);
    }
    Ok(sections)
}
