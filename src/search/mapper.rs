//! Logical form field to engine field translation

use crate::search::config::QueryConfig;
use std::collections::HashMap;

/// Translates a namespaced logical field (`alarm.source_ip`) to the engine's field name
pub trait FieldMapper: Send + Sync {
    fn map(&self, logical: &str) -> String;
}

/// Table-driven mapper; names without an entry fall back to the part after the namespace.
#[derive(Debug, Clone, Default)]
pub struct TableFieldMapper {
    mappings: HashMap<String, String>,
}

impl TableFieldMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &QueryConfig) -> Self {
        Self {
            mappings: config
                .field_mappings
                .iter()
                .map(|m| (m.logical.clone(), m.engine.clone()))
                .collect(),
        }
    }

    pub fn with_mapping(mut self, logical: impl Into<String>, engine: impl Into<String>) -> Self {
        self.mappings.insert(logical.into(), engine.into());
        self
    }
}

impl FieldMapper for TableFieldMapper {
    fn map(&self, logical: &str) -> String {
        match self.mappings.get(logical) {
            Some(engine) => engine.clone(),
            None => logical
                .split_once('.')
                .map_or(logical, |(_, field)| field)
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_and_fallback_names() {
        let mapper = TableFieldMapper::new().with_mapping("alarm.source_ip", "source");

        assert_eq!(mapper.map("alarm.source_ip"), "source");
        assert_eq!(mapper.map("alarm.risk"), "risk");
        assert_eq!(mapper.map("risk"), "risk");
    }

    #[test]
    fn test_from_config() {
        let mapper = TableFieldMapper::from_config(&QueryConfig::default());
        assert_eq!(mapper.map("alarm.source_port"), "sport");
        assert_eq!(mapper.map("alarm.alarm_date"), "alarm_date");
    }
}
