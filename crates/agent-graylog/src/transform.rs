//! Per-section post-processing of fetched API documents.
//!
//! Transformation is pure: it consumes what the runner fetched and returns
//! the [`Emission`]s to write, never touching the network or stdout.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::catalog::SectionKind;
use crate::config::{DisplayOptions, NodeDisplay, SidecarDisplay};

/// Key under which node input states are merged into a node record.
pub const INPUTSTATES_KEY: &str = "inputstates";

/// Key carrying the configured look-back in the `failures` section.
pub const SINCE_PARAM_KEY: &str = "ds_param_since";

/// Documents fetched for one query.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// A single document, used by every query without enrichment.
    Plain(Value),
    /// Failure count plus the detailed failure list.
    Failures { count: Value, details: Value },
    /// Cluster node mapping plus the per-node input states.
    Nodes { cluster: Value, inputstates: Value },
}

/// Body of one section.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Printed as one JSON line.
    Single(Value),
    /// Printed as one JSON line per record.
    Records(Vec<Value>),
}

impl Payload {
    /// Arrays become records, everything else a single line.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Payload::Records(items),
            other => Payload::Single(other),
        }
    }
}

/// One unit of agent output.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    /// A section reported for the queried host.
    Section {
        kind: SectionKind,
        payload: Payload,
    },
    /// A section redirected to another host.
    Piggyback {
        host: String,
        kind: SectionKind,
        payload: Payload,
    },
}

/// Apply the section-specific rules to fetched data.
pub fn transform(
    kind: SectionKind,
    fetched: Fetched,
    display: DisplayOptions,
    since_secs: u64,
) -> Vec<Emission> {
    match (kind, fetched) {
        (SectionKind::Failures, Fetched::Failures { count, details }) => {
            vec![Emission::Section {
                kind,
                payload: Payload::Single(merge_failures(count, details, since_secs)),
            }]
        }
        (SectionKind::Nodes, Fetched::Nodes { cluster, inputstates }) => {
            nodes(cluster, inputstates, display.nodes)
        }
        (SectionKind::Jvm, Fetched::Plain(value)) => match jvm_metrics(&value) {
            Some(metrics) => vec![Emission::Section {
                kind,
                payload: Payload::Single(Value::Object(metrics)),
            }],
            None => Vec::new(),
        },
        (SectionKind::Sidecars, Fetched::Plain(value)) => sidecars(value, display.sidecars),
        (kind, Fetched::Plain(value)) => vec![Emission::Section {
            kind,
            payload: Payload::from_value(value),
        }],
        (kind, other) => {
            tracing::warn!("{kind}: unexpected enrichment data, passing primary document through");
            let primary = match other {
                Fetched::Failures { count, .. } => count,
                Fetched::Nodes { cluster, .. } => cluster,
                Fetched::Plain(value) => value,
            };
            vec![Emission::Section {
                kind,
                payload: Payload::from_value(primary),
            }]
        }
    }
}

/// Merge the failure detail document into the failure count and tag it
/// with the look-back used for the count query.
pub fn merge_failures(count: Value, details: Value, since_secs: u64) -> Value {
    let mut merged = match count {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            tracing::warn!("failures: count document is not an object, keeping it as 'count'");
            let mut map = Map::new();
            map.insert("count".to_string(), other);
            map
        }
    };

    match details {
        Value::Object(map) => merged.extend(map),
        Value::Null => {}
        _ => tracing::warn!("failures: detail document is not an object, ignoring it"),
    }

    merged.insert(SINCE_PARAM_KEY.to_string(), Value::from(since_secs));
    Value::Object(merged)
}

#[derive(Debug, Deserialize)]
struct MetricEntry {
    full_name: Option<String>,
    metric: Option<MetricBody>,
}

#[derive(Debug, Deserialize)]
struct MetricBody {
    value: Option<Value>,
}

/// Flatten the JVM metrics list into `full_name -> value`.
///
/// Returns `None` when the document has no `metrics` field. Entries that
/// lack either the name or the value are skipped.
pub fn jvm_metrics(value: &Value) -> Option<Map<String, Value>> {
    let metrics = value.get("metrics")?;
    if metrics.is_null() {
        return None;
    }

    let mut flat = Map::new();
    for raw in metrics.as_array().into_iter().flatten() {
        let Ok(entry) = MetricEntry::deserialize(raw) else {
            continue;
        };
        let name = entry.full_name;
        let value = entry.metric.and_then(|m| m.value).filter(|v| !v.is_null());
        if let (Some(name), Some(value)) = (name, value) {
            flat.insert(name, value);
        }
    }
    Some(flat)
}

fn nodes(cluster: Value, inputstates: Value, display: NodeDisplay) -> Vec<Emission> {
    let Value::Object(mut cluster) = cluster else {
        tracing::warn!("nodes: cluster document is not an object");
        return Vec::new();
    };
    let Value::Object(inputstates) = inputstates else {
        tracing::warn!("nodes: input state document is not an object");
        return Vec::new();
    };

    let mut emissions = Vec::new();
    let mut flat = Vec::new();

    for (node_id, states) in inputstates {
        let Some(mut record) = cluster.remove(&node_id) else {
            tracing::debug!("nodes: {node_id} has input states but is not a cluster member");
            continue;
        };
        if let Value::Object(fields) = &mut record {
            fields.insert(INPUTSTATES_KEY.to_string(), states);
        }

        let host = match display {
            NodeDisplay::Node => piggyback_target(&record, "hostname"),
            NodeDisplay::Host => None,
        };
        if display == NodeDisplay::Node && host.is_none() {
            tracing::warn!("nodes: {node_id} has no hostname, reporting it on the Graylog host");
        }

        let mut wrapped = Map::new();
        wrapped.insert(node_id, record);
        let wrapped = Value::Object(wrapped);

        match host {
            Some(host) => emissions.push(Emission::Piggyback {
                host,
                kind: SectionKind::Nodes,
                payload: Payload::Single(wrapped),
            }),
            None => flat.push(wrapped),
        }
    }

    push_flat(&mut emissions, SectionKind::Nodes, flat);
    emissions
}

fn sidecars(value: Value, display: SidecarDisplay) -> Vec<Emission> {
    let Some(Value::Array(records)) = value.get("sidecars").cloned() else {
        return Vec::new();
    };

    let mut emissions = Vec::new();
    let mut flat = Vec::new();

    for record in records {
        let host = match display {
            SidecarDisplay::Sidecar => {
                let host = piggyback_target(&record, "node_name");
                if host.is_none() {
                    tracing::warn!("sidecars: record without node_name, reporting it on the Graylog host");
                }
                host
            }
            SidecarDisplay::Host => None,
        };

        match host {
            Some(host) => emissions.push(Emission::Piggyback {
                host,
                kind: SectionKind::Sidecars,
                payload: Payload::Single(record),
            }),
            None => flat.push(record),
        }
    }

    push_flat(&mut emissions, SectionKind::Sidecars, flat);
    emissions
}

/// Append the host-level section unless it would be empty.
fn push_flat(emissions: &mut Vec<Emission>, kind: SectionKind, records: Vec<Value>) {
    if !records.is_empty() {
        emissions.push(Emission::Section {
            kind,
            payload: Payload::Records(records),
        });
    }
}

fn piggyback_target(record: &Value, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    fn display(nodes: NodeDisplay, sidecars: SidecarDisplay) -> DisplayOptions {
        DisplayOptions { nodes, sidecars }
    }

    fn single(emission: &Emission) -> &Value {
        match emission {
            Emission::Section {
                payload: Payload::Single(v),
                ..
            }
            | Emission::Piggyback {
                payload: Payload::Single(v),
                ..
            } => v,
            other => panic!("expected single payload, got {other:?}"),
        }
    }

    #[test]
    fn test_jvm_keeps_only_complete_entries() {
        let doc = json!({
            "metrics": [
                {"full_name": "jvm.memory.heap.used", "metric": {"value": 1024}},
                {"full_name": "jvm.memory.heap.max", "metric": {}},
                {"metric": {"value": 7}},
                {"full_name": "jvm.memory.heap.committed", "metric": {"value": 2048.5}},
                {"full_name": "jvm.memory.heap.init", "metric": {"value": null}},
                "garbage"
            ],
            "total": 6
        });

        let emissions = transform(SectionKind::Jvm, Fetched::Plain(doc), DisplayOptions::default(), 1800);
        assert_eq!(emissions.len(), 1);
        assert_json_eq!(
            single(&emissions[0]).clone(),
            json!({
                "jvm.memory.heap.used": 1024,
                "jvm.memory.heap.committed": 2048.5
            })
        );
    }

    #[test]
    fn test_jvm_without_metrics_emits_nothing() {
        let emissions = transform(
            SectionKind::Jvm,
            Fetched::Plain(json!({"total": 0})),
            DisplayOptions::default(),
            1800,
        );
        assert!(emissions.is_empty());
    }

    #[test]
    fn test_failures_merges_both_documents() {
        let fetched = Fetched::Failures {
            count: json!({"count": 3}),
            details: json!({"failures": [{"letter_id": "a"}], "total": 3}),
        };
        let emissions = transform(SectionKind::Failures, fetched, DisplayOptions::default(), 900);
        assert_json_eq!(
            single(&emissions[0]).clone(),
            json!({
                "count": 3,
                "failures": [{"letter_id": "a"}],
                "total": 3,
                "ds_param_since": 900
            })
        );
    }

    #[test]
    fn test_failures_since_param_wins_over_api_field() {
        let merged = merge_failures(json!({"ds_param_since": "x"}), json!({}), 60);
        assert_eq!(merged["ds_param_since"], json!(60));
    }

    #[test]
    fn test_nodes_flat_listing() {
        let fetched = Fetched::Nodes {
            cluster: json!({
                "n1": {"hostname": "gl1", "is_master": true},
                "n2": {"hostname": "gl2", "is_master": false},
                "n3": {"hostname": "gl3"}
            }),
            inputstates: json!({
                "n1": [{"state": "RUNNING"}],
                "n2": [],
                "n9": [{"state": "FAILED"}]
            }),
        };

        let emissions = transform(SectionKind::Nodes, fetched, DisplayOptions::default(), 1800);
        assert_eq!(
            emissions,
            vec![Emission::Section {
                kind: SectionKind::Nodes,
                payload: Payload::Records(vec![
                    json!({"n1": {"hostname": "gl1", "is_master": true, "inputstates": [{"state": "RUNNING"}]}}),
                    json!({"n2": {"hostname": "gl2", "is_master": false, "inputstates": []}}),
                ]),
            }]
        );
    }

    #[test]
    fn test_nodes_piggyback_per_hostname() {
        let fetched = Fetched::Nodes {
            cluster: json!({
                "n1": {"hostname": "gl1"},
                "n2": {"hostname": "gl2"}
            }),
            inputstates: json!({"n1": [], "n2": [{"id": "in"}]}),
        };

        let emissions = transform(
            SectionKind::Nodes,
            fetched,
            display(NodeDisplay::Node, SidecarDisplay::Host),
            1800,
        );
        assert_eq!(
            emissions,
            vec![
                Emission::Piggyback {
                    host: "gl1".into(),
                    kind: SectionKind::Nodes,
                    payload: Payload::Single(json!({"n1": {"hostname": "gl1", "inputstates": []}})),
                },
                Emission::Piggyback {
                    host: "gl2".into(),
                    kind: SectionKind::Nodes,
                    payload: Payload::Single(
                        json!({"n2": {"hostname": "gl2", "inputstates": [{"id": "in"}]}})
                    ),
                },
            ]
        );
    }

    #[test]
    fn test_nodes_without_hostname_fall_back_to_flat_section() {
        let fetched = Fetched::Nodes {
            cluster: json!({"n1": {"hostname": "gl1"}, "n2": {}}),
            inputstates: json!({"n1": [], "n2": []}),
        };
        let emissions = transform(
            SectionKind::Nodes,
            fetched,
            display(NodeDisplay::Node, SidecarDisplay::Host),
            1800,
        );
        assert_eq!(emissions.len(), 2);
        assert!(matches!(&emissions[0], Emission::Piggyback { host, .. } if host == "gl1"));
        assert_eq!(
            emissions[1],
            Emission::Section {
                kind: SectionKind::Nodes,
                payload: Payload::Records(vec![json!({"n2": {"inputstates": []}})]),
            }
        );
    }

    #[test]
    fn test_sidecars_flat_listing() {
        let doc = json!({"sidecars": [{"node_name": "web1"}, {"node_name": "web2"}], "total": 2});
        let emissions = transform(SectionKind::Sidecars, Fetched::Plain(doc), DisplayOptions::default(), 1800);
        assert_eq!(
            emissions,
            vec![Emission::Section {
                kind: SectionKind::Sidecars,
                payload: Payload::Records(vec![json!({"node_name": "web1"}), json!({"node_name": "web2"})]),
            }]
        );
    }

    #[test]
    fn test_sidecars_piggyback_has_no_flat_section() {
        let doc = json!({"sidecars": [{"node_name": "web1", "active": true}, {"node_name": "web2"}]});
        let emissions = transform(
            SectionKind::Sidecars,
            Fetched::Plain(doc),
            display(NodeDisplay::Host, SidecarDisplay::Sidecar),
            1800,
        );
        assert_eq!(emissions.len(), 2);
        for (emission, expected) in emissions.iter().zip(["web1", "web2"]) {
            match emission {
                Emission::Piggyback { host, kind, .. } => {
                    assert_eq!(host, expected);
                    assert_eq!(*kind, SectionKind::Sidecars);
                }
                other => panic!("expected piggyback, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_sidecars_missing_list_emits_nothing() {
        let emissions = transform(
            SectionKind::Sidecars,
            Fetched::Plain(json!({"total": 0})),
            DisplayOptions::default(),
            1800,
        );
        assert!(emissions.is_empty());

        let emissions = transform(
            SectionKind::Sidecars,
            Fetched::Plain(json!({"sidecars": []})),
            DisplayOptions::default(),
            1800,
        );
        assert!(emissions.is_empty());
    }

    #[test]
    fn test_pass_through_keeps_document() {
        let doc = json!({"stream_count": 4, "nested": {"a": [1, 2, 3]}});
        let emissions = transform(
            SectionKind::ClusterStats,
            Fetched::Plain(doc.clone()),
            DisplayOptions::default(),
            1800,
        );
        assert_eq!(
            emissions,
            vec![Emission::Section {
                kind: SectionKind::ClusterStats,
                payload: Payload::Single(doc),
            }]
        );
    }

    #[test]
    fn test_pass_through_array_becomes_records() {
        let emissions = transform(
            SectionKind::Alerts,
            Fetched::Plain(json!([{"id": 1}, {"id": 2}])),
            DisplayOptions::default(),
            1800,
        );
        assert_eq!(
            emissions,
            vec![Emission::Section {
                kind: SectionKind::Alerts,
                payload: Payload::Records(vec![json!({"id": 1}), json!({"id": 2})]),
            }]
        );
    }
}
