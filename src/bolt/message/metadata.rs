//! Typed metadata carried by SUCCESS and FAILURE summaries.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::packstream::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<Hints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_first: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Vec<HashMap<String, Value>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_last: Option<i64>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub statement_type: Option<StatementType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rt: Option<RoutingTable>,
}

impl SuccessMetadata {
    /// Absent and `false` both mean the stream is exhausted.
    pub fn has_more(&self) -> bool {
        self.has_more.unwrap_or(false)
    }
}

impl fmt::Display for SuccessMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(server) = &self.server {
            parts.push(format!("server: {}", server));
        }
        if let Some(id) = &self.connection_id {
            parts.push(format!("connection_id: {}", id));
        }
        if let Some(fields) = &self.fields {
            parts.push(format!("fields: {:?}", fields));
        }
        if let Some(qid) = self.qid {
            parts.push(format!("qid: {}", qid));
        }
        if let Some(has_more) = self.has_more {
            parts.push(format!("has_more: {}", has_more));
        }
        if let Some(bookmark) = &self.bookmark {
            parts.push(format!("bookmark: {}", bookmark));
        }
        if let Some(db) = &self.db {
            parts.push(format!("db: {}", db));
        }
        if let Some(stats) = &self.stats {
            parts.push(format!("stats: {{{}}}", stats));
        }
        if let Some(t_last) = self.t_last {
            parts.push(format!("t_last: {}", t_last));
        }
        f.write_str(&parts.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementType {
    #[serde(rename = "r")]
    ReadOnly,
    #[serde(rename = "w")]
    WriteOnly,
    #[serde(rename = "rw")]
    ReadWrite,
    #[serde(rename = "s")]
    Schema,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hints {
    #[serde(
        default,
        rename = "telemetry.enabled",
        skip_serializing_if = "Option::is_none"
    )]
    pub telemetry_enabled: Option<bool>,
    #[serde(
        default,
        rename = "connection.recv_timeout_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub connection_recv_timeout_seconds: Option<i64>,
}

/// Update counters of a query. Missing keys count as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Stats {
    pub constraints_added: i64,
    pub constraints_removed: i64,
    pub indexes_added: i64,
    pub indexes_removed: i64,
    pub labels_added: i64,
    pub labels_removed: i64,
    pub nodes_created: i64,
    pub nodes_deleted: i64,
    pub properties_set: i64,
    pub relationships_created: i64,
    pub relationships_deleted: i64,
    pub contains_updates: bool,
    pub contains_system_updates: bool,
    pub system_updates: i64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counters = [
            ("constraints-added", self.constraints_added),
            ("constraints-removed", self.constraints_removed),
            ("indexes-added", self.indexes_added),
            ("indexes-removed", self.indexes_removed),
            ("labels-added", self.labels_added),
            ("labels-removed", self.labels_removed),
            ("nodes-created", self.nodes_created),
            ("nodes-deleted", self.nodes_deleted),
            ("properties-set", self.properties_set),
            ("relationships-created", self.relationships_created),
            ("relationships-deleted", self.relationships_deleted),
            ("system-updates", self.system_updates),
        ];
        let mut parts: Vec<String> = counters
            .iter()
            .filter(|(_, n)| *n != 0)
            .map(|(key, n)| format!("{}: {}", key, n))
            .collect();
        if self.contains_updates {
            parts.push("contains-updates: true".to_string());
        }
        if self.contains_system_updates {
            parts.push("contains-system-updates: true".to_string());
        }
        f.write_str(&parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingTable {
    pub ttl: i64,
    pub db: String,
    pub servers: Vec<Server>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub addresses: Vec<String>,
    pub role: ServerRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServerRole {
    Route,
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureMetadata {
    pub code: String,
    pub message: String,
}

impl fmt::Display for FailureMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code: {}, message: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packstream::{from_value, to_value};

    fn map(entries: Vec<(&str, Value)>) -> Value {
        entries.into_iter().collect()
    }

    #[test]
    fn test_success_metadata_from_map() {
        let value = map(vec![
            ("fields", Value::List(vec![Value::from("n")])),
            ("t_first", Value::from(4)),
            ("qid", Value::from(0)),
            ("type", Value::from("rw")),
            ("unknown_key", Value::from(true)),
        ]);
        let metadata: SuccessMetadata = from_value(value).unwrap();
        assert_eq!(metadata.fields, Some(vec!["n".to_string()]));
        assert_eq!(metadata.t_first, Some(4));
        assert_eq!(metadata.qid, Some(0));
        assert_eq!(metadata.statement_type, Some(StatementType::ReadWrite));
        assert_eq!(metadata.has_more, None);
    }

    #[test]
    fn test_has_more_absent_equals_false() {
        let absent: SuccessMetadata = from_value(map(vec![])).unwrap();
        let explicit: SuccessMetadata =
            from_value(map(vec![("has_more", Value::from(false))])).unwrap();
        assert_eq!(absent.has_more(), explicit.has_more());
        assert!(!absent.has_more());
    }

    #[test]
    fn test_stats_default_missing_counters() {
        let value = map(vec![
            ("nodes-created", Value::from(2)),
            ("contains-updates", Value::from(true)),
        ]);
        let stats: Stats = from_value(value).unwrap();
        assert_eq!(stats.nodes_created, 2);
        assert_eq!(stats.nodes_deleted, 0);
        assert!(stats.contains_updates);
        assert_eq!(stats.to_string(), "nodes-created: 2, contains-updates: true");
    }

    #[test]
    fn test_hints_dotted_keys() {
        let value = map(vec![
            ("telemetry.enabled", Value::from(true)),
            ("connection.recv_timeout_seconds", Value::from(120)),
        ]);
        let hints: Hints = from_value(value).unwrap();
        assert_eq!(hints.telemetry_enabled, Some(true));
        assert_eq!(hints.connection_recv_timeout_seconds, Some(120));
    }

    #[test]
    fn test_routing_table() {
        let server = map(vec![
            ("addresses", Value::List(vec![Value::from("core1:7687")])),
            ("role", Value::from("WRITE")),
        ]);
        let value = map(vec![
            ("ttl", Value::from(300)),
            ("db", Value::from("neo4j")),
            ("servers", Value::List(vec![server])),
        ]);
        let table: RoutingTable = from_value(value).unwrap();
        assert_eq!(table.ttl, 300);
        assert_eq!(table.servers[0].role, ServerRole::Write);
    }

    #[test]
    fn test_serialized_metadata_omits_unset_fields() {
        let metadata = SuccessMetadata {
            has_more: Some(true),
            ..Default::default()
        };
        let value = to_value(&metadata).unwrap().into_map().unwrap();
        assert_eq!(value.len(), 1);
        assert_eq!(value.get("has_more"), Some(&Value::Boolean(true)));
    }
}
