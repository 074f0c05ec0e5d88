//! Compiled query tree and its engine wire format

use crate::search::form::SortDirection;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use strum::{Display, EnumString};

/// Name of the cardinality aggregation carrying the bucket total
pub const TOTAL_AGGREGATION: &str = "agg_total";

/// Name of the terms aggregation carrying the buckets
pub const RESULT_AGGREGATION: &str = "agg_result";

/// Bounds of a range clause
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeBounds {
    pub gte: Option<Value>,
    pub lte: Option<Value>,
    pub lt: Option<Value>,
    pub time_zone: Option<String>,
}

impl RangeBounds {
    /// `field >= value`
    pub fn gte(value: impl Into<Value>) -> Self {
        Self {
            gte: Some(value.into()),
            ..Default::default()
        }
    }

    /// `field <= value`
    pub fn lte(value: impl Into<Value>) -> Self {
        Self {
            lte: Some(value.into()),
            ..Default::default()
        }
    }

    /// Add an exclusive upper bound
    pub fn with_lt(mut self, value: impl Into<Value>) -> Self {
        self.lt = Some(value.into());
        self
    }

    /// Add the time zone the engine should apply to the bounds
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    fn to_json(&self) -> Value {
        let mut params = Map::new();
        if let Some(ref gte) = self.gte {
            params.insert("gte".to_string(), gte.clone());
        }
        if let Some(ref lte) = self.lte {
            params.insert("lte".to_string(), lte.clone());
        }
        if let Some(ref lt) = self.lt {
            params.insert("lt".to_string(), lt.clone());
        }
        if let Some(ref time_zone) = self.time_zone {
            params.insert("time_zone".to_string(), Value::String(time_zone.clone()));
        }
        Value::Object(params)
    }
}

/// One boolean condition node
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Match { field: String, value: Value },
    Range { field: String, bounds: RangeBounds },
    Terms { field: String, values: Vec<Value> },
    Bool(BoolQuery),
}

impl Clause {
    pub fn matching(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Clause::Match {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn range(field: impl Into<String>, bounds: RangeBounds) -> Self {
        Clause::Range {
            field: field.into(),
            bounds,
        }
    }

    pub fn terms(field: impl Into<String>, values: Vec<Value>) -> Self {
        Clause::Terms {
            field: field.into(),
            values,
        }
    }

    /// Whether this clause, or any nested clause, targets `field`
    pub fn references(&self, field: &str) -> bool {
        match self {
            Clause::Match { field: f, .. }
            | Clause::Range { field: f, .. }
            | Clause::Terms { field: f, .. } => f == field,
            Clause::Bool(inner) => inner.references(field),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Clause::Match { field, value } => json!({ "match": { field.as_str(): value } }),
            Clause::Range { field, bounds } => {
                json!({ "range": { field.as_str(): bounds.to_json() } })
            }
            Clause::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            Clause::Bool(inner) => inner.to_json(),
        }
    }
}

impl From<BoolQuery> for Clause {
    fn from(query: BoolQuery) -> Self {
        Clause::Bool(query)
    }
}

/// A `must` / `must_not` / `should` container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<Clause>,
    pub must_not: Vec<Clause>,
    pub should: Vec<Clause>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`BoolQuery::push_must`]
    pub fn must(mut self, clause: Clause) -> Self {
        self.must.push(clause);
        self
    }

    /// Builder form of [`BoolQuery::push_must_not`]
    pub fn must_not(mut self, clause: Clause) -> Self {
        self.must_not.push(clause);
        self
    }

    pub fn push_must(&mut self, clause: Clause) {
        self.must.push(clause);
    }

    pub fn push_must_not(&mut self, clause: Clause) {
        self.must_not.push(clause);
    }

    pub fn push_should(&mut self, clause: Clause) {
        self.should.push(clause);
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty() && self.should.is_empty()
    }

    /// Total number of direct children across all three lists
    pub fn len(&self) -> usize {
        self.must.len() + self.must_not.len() + self.should.len()
    }

    pub fn references(&self, field: &str) -> bool {
        self.must
            .iter()
            .chain(&self.must_not)
            .chain(&self.should)
            .any(|clause| clause.references(field))
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        for (occur, clauses) in [
            ("must", &self.must),
            ("must_not", &self.must_not),
            ("should", &self.should),
        ] {
            if !clauses.is_empty() {
                body.insert(
                    occur.to_string(),
                    Value::Array(clauses.iter().map(Clause::to_json).collect()),
                );
            }
        }
        json!({ "bool": body })
    }
}

/// Type hint the engine uses for documents missing the sort property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum UnmappedType {
    Keyword,
    Long,
}

impl UnmappedType {
    /// Hint for a logical sort property
    pub fn for_property(property: &str) -> Self {
        match property {
            "alarm_date" => UnmappedType::Keyword,
            "risk" | "level" => UnmappedType::Long,
            _ => UnmappedType::Keyword,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortDirective {
    pub field: String,
    pub direction: SortDirection,
    pub unmapped_type: UnmappedType,
}

/// Terms aggregation plus its cardinality denominator
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationDirective {
    pub field: String,
    pub order_field: String,
    pub direction: SortDirection,
    pub size: u64,
}

impl AggregationDirective {
    fn to_json(&self) -> Value {
        json!({
            TOTAL_AGGREGATION: {
                "cardinality": { "field": self.field }
            },
            RESULT_AGGREGATION: {
                "terms": {
                    "field": self.field,
                    "order": { self.order_field.as_str(): self.direction.to_string() },
                    "size": self.size,
                }
            }
        })
    }
}

/// Root of a compiled query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    pub query: BoolQuery,
    pub from: Option<u64>,
    pub size: Option<u64>,
    pub sort: Option<SortDirective>,
    pub aggregation: Option<AggregationDirective>,
}

impl CompiledQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_page_window(&mut self, from: u64, size: u64) {
        self.from = Some(from);
        self.size = Some(size);
    }

    pub fn set_sort(&mut self, sort: SortDirective) {
        self.sort = Some(sort);
    }

    /// Replaces any previously attached aggregation; a query carries at most one.
    pub fn set_aggregation(&mut self, aggregation: AggregationDirective) {
        self.aggregation = Some(aggregation);
    }

    pub fn is_aggregation(&self) -> bool {
        self.aggregation.is_some()
    }

    /// Serialize into the engine's search request body
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        root.insert("query".to_string(), self.query.to_json());

        if let Some(from) = self.from {
            root.insert("from".to_string(), json!(from));
        }
        if let Some(size) = self.size {
            root.insert("size".to_string(), json!(size));
        }
        if let Some(ref sort) = self.sort {
            root.insert(
                "sort".to_string(),
                json!([{
                    sort.field.as_str(): {
                        "order": sort.direction.to_string(),
                        "unmapped_type": sort.unmapped_type.to_string(),
                    }
                }]),
            );
        }
        if let Some(ref aggregation) = self.aggregation {
            root.insert("aggs".to_string(), aggregation.to_json());
        }

        Value::Object(root)
    }

    /// Hex SHA-256 of the canonical JSON document
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.to_json().to_string().as_bytes());
        digest.iter().map(|byte| format!("{:02x}", byte)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bool_lists_are_omitted() {
        let query = BoolQuery::new().must(Clause::matching("status", "open"));
        assert_eq!(
            query.to_json(),
            json!({ "bool": { "must": [ { "match": { "status": "open" } } ] } })
        );
    }

    #[test]
    fn test_range_wire_shape() {
        let clause = Clause::range(
            "alarm_date",
            RangeBounds::gte(10).with_lt(20).with_time_zone("Asia/Tehran"),
        );
        assert_eq!(
            clause.to_json(),
            json!({ "range": { "alarm_date": { "gte": 10, "lt": 20, "time_zone": "Asia/Tehran" } } })
        );
    }

    #[test]
    fn test_nested_references() {
        let nested = BoolQuery::new().must_not(Clause::matching("source", "10.0.0.1"));
        let mut root = BoolQuery::new();
        root.push_should(nested.into());

        assert!(root.references("source"));
        assert!(!root.references("destination"));
    }

    #[test]
    fn test_root_document_with_sort() {
        let mut compiled = CompiledQuery::new();
        compiled.query.push_must(Clause::range("risk", RangeBounds::gte(1)));
        compiled.set_page_window(20, 10);
        compiled.set_sort(SortDirective {
            field: "risk".to_string(),
            direction: SortDirection::Asc,
            unmapped_type: UnmappedType::Long,
        });

        let doc = compiled.to_json();
        assert_eq!(doc["from"], json!(20));
        assert_eq!(doc["size"], json!(10));
        assert_eq!(
            doc["sort"],
            json!([{ "risk": { "order": "asc", "unmapped_type": "long" } }])
        );
        assert!(doc.get("aggs").is_none());
    }

    #[test]
    fn test_aggregation_document() {
        let mut compiled = CompiledQuery::new();
        compiled.set_aggregation(AggregationDirective {
            field: "directiveName".to_string(),
            order_field: "alarm_date".to_string(),
            direction: SortDirection::Desc,
            size: 5,
        });

        let doc = compiled.to_json();
        assert_eq!(doc["aggs"]["agg_total"]["cardinality"]["field"], json!("directiveName"));
        assert_eq!(doc["aggs"]["agg_result"]["terms"]["size"], json!(5));
        assert_eq!(
            doc["aggs"]["agg_result"]["terms"]["order"],
            json!({ "alarm_date": "desc" })
        );
        assert!(doc.get("from").is_none());
    }

    #[test]
    fn test_unmapped_type_hints() {
        assert_eq!(UnmappedType::for_property("alarm_date"), UnmappedType::Keyword);
        assert_eq!(UnmappedType::for_property("risk"), UnmappedType::Long);
        assert_eq!(UnmappedType::for_property("level"), UnmappedType::Long);
        assert_eq!(UnmappedType::for_property("collector"), UnmappedType::Keyword);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let mut a = CompiledQuery::new();
        a.query.push_must(Clause::matching("status", "open"));
        let b = a.clone();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let mut c = a.clone();
        c.query.push_must(Clause::matching("collector", "fw-1"));
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
