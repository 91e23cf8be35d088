//! The fixed catalog of Graylog API queries.
//!
//! Each query maps a section name to a path below `/api`. The `failures`
//! query is the only parameterized one: it carries a cutoff timestamp
//! computed from the configured look-back.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use crate::error::ConfigError;

/// Path of the detailed indexer failure list merged into `failures`.
pub const FAILURE_DETAILS_PATH: &str = "/system/indexer/failures?limit=30";

/// Path of the per-node input states merged into `nodes`.
pub const NODE_INPUTSTATES_PATH: &str = "/cluster/inputstates";

/// Timestamp format of the failure cutoff (ISO-8601, UTC, seconds).
const SINCE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Every section the agent knows how to query, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    Alerts,
    ClusterHealth,
    ClusterInputstates,
    ClusterStats,
    ClusterTraffic,
    Failures,
    Jvm,
    License,
    Messages,
    Nodes,
    Sidecars,
}

impl SectionKind {
    pub const ALL: [SectionKind; 11] = [
        SectionKind::Alerts,
        SectionKind::ClusterHealth,
        SectionKind::ClusterInputstates,
        SectionKind::ClusterStats,
        SectionKind::ClusterTraffic,
        SectionKind::Failures,
        SectionKind::Jvm,
        SectionKind::License,
        SectionKind::Messages,
        SectionKind::Nodes,
        SectionKind::Sidecars,
    ];

    /// Sections queried when `--sections` is not given.
    ///
    /// `cluster_health` and `cluster_inputstates` are opt-in.
    pub const DEFAULT: [SectionKind; 9] = [
        SectionKind::Alerts,
        SectionKind::ClusterStats,
        SectionKind::ClusterTraffic,
        SectionKind::Failures,
        SectionKind::Jvm,
        SectionKind::License,
        SectionKind::Messages,
        SectionKind::Nodes,
        SectionKind::Sidecars,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SectionKind::Alerts => "alerts",
            SectionKind::ClusterHealth => "cluster_health",
            SectionKind::ClusterInputstates => "cluster_inputstates",
            SectionKind::ClusterStats => "cluster_stats",
            SectionKind::ClusterTraffic => "cluster_traffic",
            SectionKind::Failures => "failures",
            SectionKind::Jvm => "jvm",
            SectionKind::License => "license",
            SectionKind::Messages => "messages",
            SectionKind::Nodes => "nodes",
            SectionKind::Sidecars => "sidecars",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SectionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SectionKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownSection(wanted.to_string()))
    }
}

/// One named API query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub kind: SectionKind,
    /// Path relative to the `/api` base, including any query string.
    pub path: String,
}

impl Query {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Render the failure cutoff: `now` minus `lookback_secs`.
pub fn since_cutoff(now: DateTime<Utc>, lookback_secs: u64) -> String {
    let cutoff = i64::try_from(lookback_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|lookback| now.checked_sub_signed(lookback))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    cutoff.format(SINCE_FORMAT).to_string()
}

/// Build the full ordered catalog relative to `now`.
pub fn build(now: DateTime<Utc>, lookback_secs: u64) -> Vec<Query> {
    let since = since_cutoff(now, lookback_secs);

    SectionKind::ALL
        .into_iter()
        .map(|kind| {
            let path = match kind {
                SectionKind::Alerts => "/streams/alerts?limit=300".to_string(),
                SectionKind::ClusterHealth => "/system/indexer/cluster/health".to_string(),
                SectionKind::ClusterInputstates => NODE_INPUTSTATES_PATH.to_string(),
                SectionKind::ClusterStats => "/system/cluster/stats".to_string(),
                SectionKind::ClusterTraffic => {
                    "/system/cluster/traffic?days=1&daily=false".to_string()
                }
                SectionKind::Failures => format!("/system/indexer/failures/count/?since={since}"),
                SectionKind::Jvm => "/system/metrics/namespace/jvm.memory.heap".to_string(),
                SectionKind::License => {
                    "/plugins/org.graylog.plugins.license/licenses/status".to_string()
                }
                SectionKind::Messages => "/count/total".to_string(),
                SectionKind::Nodes => "/cluster".to_string(),
                SectionKind::Sidecars => "/sidecars".to_string(),
            };
            Query { kind, path }
        })
        .collect()
}
