//! Query compiler configuration

use serde::{Deserialize, Serialize};

/// Query compiler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Prefix applied to form field names before mapping (`alarm.source_ip`)
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Engine index the compiled query targets
    #[serde(default = "default_index")]
    pub index: String,

    /// Logical `namespace.field` names with an engine name of their own
    #[serde(default = "default_field_mappings")]
    pub field_mappings: Vec<FieldMapping>,
}

/// One logical to engine field name entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub logical: String,
    pub engine: String,
}

impl FieldMapping {
    pub fn new(logical: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            logical: logical.into(),
            engine: engine.into(),
        }
    }
}

impl QueryConfig {
    /// Engine name configured for a logical field
    pub fn mapping_for(&self, logical: &str) -> Option<&str> {
        self.field_mappings
            .iter()
            .rev()
            .find(|m| m.logical == logical)
            .map(|m| m.engine.as_str())
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            index: default_index(),
            field_mappings: default_field_mappings(),
        }
    }
}

fn default_namespace() -> String {
    "alarm".to_string()
}

fn default_index() -> String {
    "alarms".to_string()
}

fn default_field_mappings() -> Vec<FieldMapping> {
    [
        ("alarm.id", "_id"),
        ("alarm.source_ip", "source"),
        ("alarm.destination_ip", "destination"),
        ("alarm.source_port", "sport"),
        ("alarm.destination_port", "dport"),
        ("alarm.scenario_name", "directiveName"),
        ("alarm.date", "alarm_date"),
        ("alarm.collector", "collector.keyword"),
        ("alarm.status", "status"),
        ("alarm.event_count", "events_count"),
        ("alarm.doc_count", "_count"),
    ]
    .into_iter()
    .map(|(logical, engine)| FieldMapping::new(logical, engine))
    .collect()
}

/// Builder for QueryConfig
pub struct QueryConfigBuilder {
    config: QueryConfig,
}

impl QueryConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: QueryConfig::default(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.config.index = index.into();
        self
    }

    /// Drop the built-in mappings so every field maps to its bare name
    pub fn without_mappings(mut self) -> Self {
        self.config.field_mappings.clear();
        self
    }

    pub fn field_mapping(mut self, logical: impl Into<String>, engine: impl Into<String>) -> Self {
        self.config.field_mappings.push(FieldMapping::new(logical, engine));
        self
    }

    pub fn build(self) -> QueryConfig {
        self.config
    }
}

impl Default for QueryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = QueryConfigBuilder::new()
            .namespace("event")
            .index("events-*")
            .without_mappings()
            .field_mapping("event.source_ip", "src")
            .build();

        assert_eq!(config.namespace, "event");
        assert_eq!(config.index, "events-*");
        assert_eq!(config.field_mappings.len(), 1);
        assert_eq!(config.mapping_for("event.source_ip"), Some("src"));
    }

    #[test]
    fn test_default_mappings() {
        let config = QueryConfig::default();
        assert_eq!(config.namespace, "alarm");
        assert_eq!(config.mapping_for("alarm.scenario_name"), Some("directiveName"));
        assert_eq!(config.mapping_for("alarm.risk"), None);
        assert_eq!(config.mapping_for("alarm.doc_count"), Some("_count"));
    }
}
