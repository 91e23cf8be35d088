//! Graylog special agent — polls the Graylog REST API and prints the
//! results as monitoring agent sections, optionally piggybacked to the
//! Graylog nodes and sidecars they describe.

pub mod agent;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod transform;

pub use agent::{Agent, RunReport};
pub use client::{Fetch, GraylogClient};
pub use config::AgentConfig;
pub use error::{AgentError, ConfigError, FetchError};
