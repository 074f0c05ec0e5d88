//! Static classification of form fields

use crate::search::error::{QueryError, QueryResult};
use crate::search::mixed::MixedPair;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::BTreeMap;

/// How a field's raw value is turned into clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Simple,
    Mixed(MixedPair),
    Comparison,
    Date,
    Aggregation,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Simple => "simple",
            FieldKind::Mixed(_) => "mixed",
            FieldKind::Comparison => "comparison",
            FieldKind::Date => "date",
            FieldKind::Aggregation => "aggregation",
        }
    }
}

/// Predicate a raw value must satisfy before the field contributes clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Value is truthy
    ValueIsSet,
    /// The `all` flag is not set
    NotAllDates,
    /// A non-null `value` sub-field exists (zero counts)
    HasComparisonValue,
}

impl Constraint {
    /// Never fails: missing sub-keys read as unset
    pub fn allows(&self, value: &Value) -> bool {
        match self {
            Constraint::ValueIsSet => is_truthy(value),
            Constraint::NotAllDates => !value.get("all").map_or(false, is_truthy),
            Constraint::HasComparisonValue => value.get("value").map_or(false, |v| !v.is_null()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Constraint::ValueIsSet => "value is set",
            Constraint::NotAllDates => "not all dates",
            Constraint::HasComparisonValue => "has comparison value",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub constraint: Option<Constraint>,
}

impl FieldSpec {
    const fn new(kind: FieldKind, constraint: Option<Constraint>) -> Self {
        Self { kind, constraint }
    }

    /// Whether `value` passes this field's constraint (fields without one always pass)
    pub fn admits(&self, value: &Value) -> bool {
        self.constraint.map_or(true, |c| c.allows(value))
    }
}

static FIELD_TABLE: Lazy<BTreeMap<&'static str, FieldSpec>> = Lazy::new(|| {
    use Constraint::*;
    use FieldKind::*;

    BTreeMap::from([
        ("address", FieldSpec::new(Mixed(MixedPair::new("source_ip", "destination_ip")), None)),
        ("port", FieldSpec::new(Mixed(MixedPair::new("source_port", "destination_port")), None)),
        ("scenario_name", FieldSpec::new(Simple, Some(ValueIsSet))),
        ("collector", FieldSpec::new(Simple, Some(ValueIsSet))),
        ("status", FieldSpec::new(Simple, Some(ValueIsSet))),
        ("aggregation", FieldSpec::new(Aggregation, Some(ValueIsSet))),
        ("date", FieldSpec::new(Date, Some(NotAllDates))),
        ("risk", FieldSpec::new(Comparison, Some(HasComparisonValue))),
        ("event_count", FieldSpec::new(Comparison, Some(HasComparisonValue))),
        ("id", FieldSpec::new(Simple, None)),
    ])
});

/// Lookup into the process-wide field table
pub struct FieldClassifier;

impl FieldClassifier {
    pub fn classify(field: &str) -> QueryResult<&'static FieldSpec> {
        FIELD_TABLE
            .get(field)
            .ok_or_else(|| QueryError::UnknownField(field.to_string()))
    }

    /// All classified fields in name order
    pub fn entries() -> impl Iterator<Item = (&'static str, &'static FieldSpec)> {
        FIELD_TABLE.iter().map(|(name, spec)| (*name, spec))
    }
}

/// Loose form truthiness: null, false, 0, "", "0" and empty containers are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// A sub-field value counts as blank when absent, null or the empty string
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_kinds() {
        let kind = |f: &str| FieldClassifier::classify(f).unwrap().kind.name();
        assert_eq!(kind("address"), "mixed");
        assert_eq!(kind("port"), "mixed");
        assert_eq!(kind("scenario_name"), "simple");
        assert_eq!(kind("collector"), "simple");
        assert_eq!(kind("status"), "simple");
        assert_eq!(kind("aggregation"), "aggregation");
        assert_eq!(kind("date"), "date");
        assert_eq!(kind("risk"), "comparison");
        assert_eq!(kind("event_count"), "comparison");
        assert_eq!(kind("id"), "simple");
        assert_eq!(FieldClassifier::entries().count(), 10);
    }

    #[test]
    fn test_unknown_field() {
        assert_eq!(
            FieldClassifier::classify("hostname"),
            Err(QueryError::UnknownField("hostname".to_string()))
        );
    }

    #[test]
    fn test_unconstrained_fields() {
        for field in ["address", "port", "id"] {
            let spec = FieldClassifier::classify(field).unwrap();
            assert!(spec.constraint.is_none());
            assert!(spec.admits(&json!("")));
        }
    }

    #[test]
    fn test_value_is_set() {
        let spec = FieldClassifier::classify("status").unwrap();
        assert!(spec.admits(&json!("open")));
        assert!(!spec.admits(&json!("")));
        assert!(!spec.admits(&json!("0")));
        assert!(!spec.admits(&json!(null)));
        assert!(!spec.admits(&json!(0)));
        assert!(!spec.admits(&json!(false)));
    }

    #[test]
    fn test_not_all_dates() {
        let spec = FieldClassifier::classify("date").unwrap();
        assert!(!spec.admits(&json!({ "all": true, "value": [] })));
        assert!(spec.admits(&json!({ "all": false, "value": [] })));
        assert!(spec.admits(&json!({ "value": [] })));
    }

    #[test]
    fn test_has_comparison_value() {
        let spec = FieldClassifier::classify("risk").unwrap();
        assert!(spec.admits(&json!({ "option": ">=", "value": 0 })));
        assert!(spec.admits(&json!({ "option": "=", "value": "" })));
        assert!(!spec.admits(&json!({ "option": "=", "value": null })));
        assert!(!spec.admits(&json!({ "option": "=" })));
        assert!(!spec.admits(&json!("5")));
    }

    #[test]
    fn test_blank_values() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&json!(null))));
        assert!(is_blank(Some(&json!(""))));
        assert!(!is_blank(Some(&json!("0"))));
        assert!(!is_blank(Some(&json!(0))));
    }
}
