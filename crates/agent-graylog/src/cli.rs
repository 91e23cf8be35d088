//! Command-line interface of the `agent_graylog` binary.

use std::time::Duration;

use clap::Parser;

use crate::catalog::SectionKind;
use crate::config::{
    parse_sections, AgentConfig, Credentials, DisplayOptions, NodeDisplay, Protocol,
    SidecarDisplay, PASSWORD_ENV,
};
use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(
    name = "agent_graylog",
    about = "Special agent for Graylog: queries the REST API and prints agent sections",
    version
)]
pub struct Cli {
    /// Username for Graylog login.
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password for Graylog login. Also reads from GRAYLOG_PASSWORD env var.
    #[arg(short = 's', long)]
    pub password: Option<String>,

    /// Protocol used to connect to Graylog.
    #[arg(short = 'P', long, value_enum, default_value = "https")]
    pub proto: Protocol,

    /// Port of the Graylog API.
    #[arg(short, long, default_value = "443")]
    pub port: u16,

    /// Time in seconds since when failures should be covered.
    #[arg(short = 't', long, default_value = "1800")]
    pub since: u64,

    /// Comma separated list of sections to query (default: all except
    /// cluster_health and cluster_inputstates).
    #[arg(short = 'm', long, value_delimiter = ',')]
    pub sections: Vec<String>,

    /// Where node details are shown.
    #[arg(long = "display_node_details", value_enum, default_value = "host")]
    pub display_node_details: NodeDisplay,

    /// Where sidecar details are shown.
    #[arg(long = "display_sidecar_details", value_enum, default_value = "host")]
    pub display_sidecar_details: SidecarDisplay,

    /// Request timeout in seconds (default: no explicit timeout).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Debug mode: abort with exit code 1 on the first failed request.
    #[arg(long)]
    pub debug: bool,

    /// Name of the Graylog instance to query.
    #[arg(value_name = "HOSTNAME")]
    pub hostname: String,
}

impl Cli {
    /// Turn parsed arguments into a validated run configuration.
    ///
    /// `env_password` is the value of the password environment variable,
    /// used only when `--password` is absent.
    pub fn into_config(self, env_password: Option<String>) -> Result<AgentConfig, ConfigError> {
        let api_base = AgentConfig::api_base(self.proto, &self.hostname, self.port)?;

        let sections = if self.sections.is_empty() {
            SectionKind::DEFAULT.to_vec()
        } else {
            parse_sections(&self.sections)?
        };

        Ok(AgentConfig {
            api_base,
            credentials: Credentials {
                user: self.user,
                password: self.password.or(env_password),
            },
            since_secs: self.since,
            sections,
            display: DisplayOptions {
                nodes: self.display_node_details,
                sidecars: self.display_sidecar_details,
            },
            timeout: self.timeout.map(Duration::from_secs),
            debug: self.debug,
        })
    }
}

/// Read the password fallback from the environment.
pub fn env_password() -> Option<String> {
    std::env::var(PASSWORD_ENV).ok()
}
