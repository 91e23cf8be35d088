//! The fetch → transform → emit loop.
//!
//! Queries run one at a time in catalog order. A failed fetch writes one
//! `Error:` line to the error stream; in debug mode it then aborts the
//! run, otherwise the section is skipped and the loop moves on.

use std::io::Write;

use chrono::{DateTime, Utc};

use crate::catalog::{self, Query, SectionKind, FAILURE_DETAILS_PATH, NODE_INPUTSTATES_PATH};
use crate::client::Fetch;
use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult, FetchError};
use crate::output;
use crate::transform::{self, Fetched};

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Queries whose data was fetched and written.
    pub completed: Vec<SectionKind>,
    /// Queries skipped because a fetch failed.
    pub failed: Vec<SectionKind>,
}

/// Runs the enabled catalog against one Graylog instance.
pub struct Agent<'a, F> {
    fetcher: &'a F,
    config: &'a AgentConfig,
}

impl<'a, F: Fetch + Sync> Agent<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a AgentConfig) -> Self {
        Self { fetcher, config }
    }

    /// Run every enabled query, with the catalog anchored at the current time.
    pub async fn run<O: Write, E: Write>(&self, out: &mut O, err: &mut E) -> AgentResult<RunReport> {
        self.run_at(Utc::now(), out, err).await
    }

    /// Same as [`Agent::run`] with an explicit reference time.
    pub async fn run_at<O: Write, E: Write>(
        &self,
        now: DateTime<Utc>,
        out: &mut O,
        err: &mut E,
    ) -> AgentResult<RunReport> {
        let mut report = RunReport::default();
        let catalog = catalog::build(now, self.config.since_secs);

        for query in catalog.iter().filter(|q| self.config.is_enabled(q.kind)) {
            let fetched = match self.fetch_query(query).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    writeln!(err, "Error: {e}")?;
                    tracing::debug!(section = query.name(), "fetch failed: {e:?}");
                    if self.config.debug {
                        return Err(AgentError::Fetch(e));
                    }
                    report.failed.push(query.kind);
                    continue;
                }
            };

            let emissions = transform::transform(
                query.kind,
                fetched,
                self.config.display,
                self.config.since_secs,
            );
            tracing::debug!(
                section = query.name(),
                "writing {} emission(s)",
                emissions.len()
            );
            for emission in &emissions {
                output::write_emission(out, emission)?;
            }
            report.completed.push(query.kind);
        }

        out.flush()?;
        Ok(report)
    }

    /// Primary fetch plus the enrichment fetch some sections need.
    async fn fetch_query(&self, query: &Query) -> Result<Fetched, FetchError> {
        let primary = self.fetcher.fetch(&query.path).await?;
        let fetched = match query.kind {
            SectionKind::Failures => Fetched::Failures {
                count: primary,
                details: self.fetcher.fetch(FAILURE_DETAILS_PATH).await?,
            },
            SectionKind::Nodes => Fetched::Nodes {
                cluster: primary,
                inputstates: self.fetcher.fetch(NODE_INPUTSTATES_PATH).await?,
            },
            _ => Fetched::Plain(primary),
        };
        Ok(fetched)
    }
}
