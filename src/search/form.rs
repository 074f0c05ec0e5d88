//! Incoming search form, pagination and sort

use crate::search::error::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use strum::{Display, EnumString};
use validator::Validate;

/// Keys that steer compilation and are never searchable fields.
/// `busy`, `errors` and `originalData` are client-side form state.
pub const CONTROL_KEYS: &[&str] = &[
    "page",
    "limit",
    "sort",
    "aggregation",
    "aggregatedTerms",
    "busy",
    "errors",
    "originalData",
];

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 10;
const DEFAULT_SORT_PROPERTY: &str = "alarm_date";

/// Sort direction
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort property and direction as submitted by the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(rename = "prop")]
    pub property: String,
    #[serde(rename = "order")]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(property: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::new(DEFAULT_SORT_PROPERTY, SortDirection::Desc)
    }
}

/// Page window over the result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PaginationSpec {
    #[validate(range(min = 1))]
    pub page: u64,
    #[validate(range(min = 1))]
    pub limit: u64,
}

impl PaginationSpec {
    pub fn new(page: u64, limit: u64) -> QueryResult<Self> {
        let spec = Self { page, limit };
        spec.validate()?;
        spec.offset()?;
        Ok(spec)
    }

    /// Index of the first hit on this page; fails when the window is out of range
    pub fn offset(&self) -> QueryResult<u64> {
        self.page
            .checked_sub(1)
            .and_then(|skipped| skipped.checked_mul(self.limit))
            .ok_or_else(|| {
                QueryError::InvalidPagination(format!(
                    "page {} with limit {} is out of range",
                    self.page, self.limit
                ))
            })
    }

    pub fn size(&self) -> u64 {
        self.limit
    }
}

impl Default for PaginationSpec {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Buckets picked from an aggregation result, targeted by a bulk action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedTerms {
    pub field: String,
    pub terms: Vec<Value>,
}

/// Searchable fields of a submitted form, control keys removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchForm {
    fields: BTreeMap<String, Value>,
    aggregation: Option<Value>,
    aggregated_terms: Option<AggregatedTerms>,
}

impl SearchForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field. The `aggregation` key sets the aggregation selector;
    /// other control keys are dropped.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if name == "aggregation" {
            self.aggregation = Some(value);
        } else if !CONTROL_KEYS.contains(&name.as_str()) {
            self.fields.insert(name, value);
        }
        self
    }

    pub fn with_aggregated_terms(mut self, terms: AggregatedTerms) -> Self {
        self.aggregated_terms = Some(terms);
        self
    }

    /// Candidate fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw aggregation selector, if the form carried one
    pub fn aggregation(&self) -> Option<&Value> {
        self.aggregation.as_ref()
    }

    pub fn aggregated_terms(&self) -> Option<&AggregatedTerms> {
        self.aggregated_terms.as_ref()
    }
}

/// A complete submission: form plus the page window and sort it carried
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub form: SearchForm,
    pub pagination: PaginationSpec,
    pub sort: SortSpec,
}

impl SearchRequest {
    /// Split a raw form document into control values and searchable fields
    pub fn from_json(value: Value) -> QueryResult<Self> {
        let Value::Object(mut object) = value else {
            return Err(QueryError::InvalidForm(
                "form must be a JSON object".to_string(),
            ));
        };

        let page = read_count(&object, "page")?.unwrap_or(DEFAULT_PAGE);
        let limit = read_count(&object, "limit")?.unwrap_or(DEFAULT_LIMIT);
        let pagination = PaginationSpec::new(page, limit)?;

        let sort = match object.remove("sort") {
            None | Some(Value::Null) => SortSpec::default(),
            Some(raw) => serde_json::from_value(raw)
                .map_err(|e| QueryError::InvalidForm(format!("sort: {}", e)))?,
        };

        let aggregated_terms = match object.remove("aggregatedTerms") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(
                serde_json::from_value(raw)
                    .map_err(|e| QueryError::InvalidForm(format!("aggregatedTerms: {}", e)))?,
            ),
        };

        let aggregation = object.remove("aggregation");

        let fields = object
            .into_iter()
            .filter(|(name, _)| !CONTROL_KEYS.contains(&name.as_str()))
            .collect();

        Ok(Self {
            form: SearchForm {
                fields,
                aggregation,
                aggregated_terms,
            },
            pagination,
            sort,
        })
    }
}

/// Reads `page` / `limit`, which clients send either as numbers or numeric strings
fn read_count(object: &Map<String, Value>, key: &str) -> QueryResult<Option<u64>> {
    let invalid = || QueryError::InvalidPagination(format!("{} must be a positive integer", key));

    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<u64>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}
