//! Search form to boolean query compilation

use crate::metrics::{QUERY_COMPILATIONS_TOTAL, QUERY_COMPILE_ERRORS_TOTAL, QUERY_FIELDS_SKIPPED_TOTAL};
use crate::search::config::QueryConfig;
use crate::search::error::{QueryError, QueryResult};
use crate::search::fields::{is_truthy, FieldClassifier, FieldKind};
use crate::search::form::{PaginationSpec, SearchForm, SearchRequest, SortSpec};
use crate::search::mapper::{FieldMapper, TableFieldMapper};
use crate::search::mixed::{MixedFieldResolver, MixedPair};
use crate::search::query::{
    AggregationDirective, BoolQuery, Clause, CompiledQuery, RangeBounds, SortDirective,
    UnmappedType,
};
use chrono::{Duration, NaiveDateTime, TimeZone};
use chrono_tz::Asia::Tehran;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Format of both date bounds
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Time zone attached to every date range
pub const DATE_TIME_ZONE: &str = "Asia/Tehran";

/// Every compiled query carries `risk >= RISK_FLOOR`
pub const RISK_FLOOR: i64 = 1;

/// Compiles search forms into engine queries
#[derive(Clone)]
pub struct QueryCompiler {
    mapper: Arc<dyn FieldMapper>,
    namespace: String,
}

impl QueryCompiler {
    pub fn new(mapper: Arc<dyn FieldMapper>) -> Self {
        Self {
            mapper,
            namespace: "alarm".to_string(),
        }
    }

    pub fn from_config(config: &QueryConfig) -> Self {
        Self::new(Arc::new(TableFieldMapper::from_config(config))).with_namespace(&config.namespace)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Engine name of a form field
    pub fn engine_field(&self, field: &str) -> String {
        self.mapper.map(&format!("{}.{}", self.namespace, field))
    }

    /// Compile a form with its page window and sort
    #[instrument(skip_all, fields(fields = form.len()))]
    pub fn compile(
        &self,
        form: &SearchForm,
        pagination: &PaginationSpec,
        sort: &SortSpec,
    ) -> QueryResult<CompiledQuery> {
        observe(self.build(form, pagination, sort), |compiled| {
            if compiled.is_aggregation() {
                "aggregation"
            } else {
                "search"
            }
        })
    }

    pub fn compile_request(&self, request: &SearchRequest) -> QueryResult<CompiledQuery> {
        self.compile(&request.form, &request.pagination, &request.sort)
    }

    /// Boolean query for update/delete-by-query over the buckets picked in `aggregatedTerms`
    #[instrument(skip_all, fields(fields = form.len()))]
    pub fn compile_bulk_action(
        &self,
        form: &SearchForm,
        pagination: &PaginationSpec,
        sort: &SortSpec,
    ) -> QueryResult<BoolQuery> {
        observe(self.build_bulk_action(form, pagination, sort), |_| "bulk")
    }

    fn build_bulk_action(
        &self,
        form: &SearchForm,
        pagination: &PaginationSpec,
        sort: &SortSpec,
    ) -> QueryResult<BoolQuery> {
        let terms = form.aggregated_terms().ok_or_else(|| {
            QueryError::InvalidForm("bulk action requires aggregatedTerms".to_string())
        })?;

        let mut compiled = self.build(form, pagination, sort)?;
        compiled
            .query
            .push_must(Clause::terms(self.engine_field(&terms.field), terms.terms.clone()));
        Ok(compiled.query)
    }

    fn build(
        &self,
        form: &SearchForm,
        pagination: &PaginationSpec,
        sort: &SortSpec,
    ) -> QueryResult<CompiledQuery> {
        let mut compilation = Compilation {
            compiler: self,
            query: CompiledQuery::new(),
            pagination,
            sort,
        };

        compilation.range("risk", RangeBounds::gte(RISK_FLOOR));

        let aggregation = form.aggregation();
        if !aggregation.map_or(false, is_truthy) {
            compilation.paginate()?;
        }

        for (field, value) in form.fields() {
            compilation.dispatch(field, value)?;
        }
        if let Some(selected) = aggregation {
            compilation.dispatch("aggregation", selected)?;
        }

        Ok(compilation.query)
    }
}

/// State of one `compile` call
struct Compilation<'a> {
    compiler: &'a QueryCompiler,
    query: CompiledQuery,
    pagination: &'a PaginationSpec,
    sort: &'a SortSpec,
}

impl Compilation<'_> {
    fn paginate(&mut self) -> QueryResult<()> {
        self.query
            .set_page_window(self.pagination.offset()?, self.pagination.size());
        self.query.set_sort(SortDirective {
            field: self.compiler.engine_field(&self.sort.property),
            direction: self.sort.direction,
            unmapped_type: UnmappedType::for_property(&self.sort.property),
        });
        Ok(())
    }

    fn dispatch(&mut self, field: &str, value: &Value) -> QueryResult<()> {
        let spec = FieldClassifier::classify(field)?;

        if !spec.admits(value) {
            debug!(field, kind = spec.kind.name(), "constraint not met, field skipped");
            QUERY_FIELDS_SKIPPED_TOTAL.with_label_values(&[field]).inc();
            return Ok(());
        }

        debug!(field, kind = spec.kind.name(), "dispatching field");
        match spec.kind {
            FieldKind::Simple => {
                self.simple(field, value.clone());
                Ok(())
            }
            FieldKind::Mixed(pair) => self.mixed(field, &pair, value),
            FieldKind::Comparison => {
                self.comparison(field, value);
                Ok(())
            }
            FieldKind::Date => self.date(field, value),
            FieldKind::Aggregation => self.aggregation(value),
        }
    }

    fn simple(&mut self, field: &str, value: Value) {
        let clause = Clause::matching(self.compiler.engine_field(field), value);
        self.query.query.push_must(clause);
    }

    fn range(&mut self, field: &str, bounds: RangeBounds) {
        let clause = Clause::range(self.compiler.engine_field(field), bounds);
        self.query.query.push_must(clause);
    }

    fn mixed(&mut self, field: &str, pair: &MixedPair, value: &Value) -> QueryResult<()> {
        let resolver = MixedFieldResolver::new(|sub_field: &str| self.compiler.engine_field(sub_field));
        let resolution = resolver.resolve(field, pair, value)?;
        resolution.apply(&mut self.query.query);
        Ok(())
    }

    fn comparison(&mut self, field: &str, value: &Value) {
        let operand = value.get("value").cloned().unwrap_or(Value::Null);

        match value.get("option").and_then(Value::as_str) {
            Some("<=") => self.range(field, RangeBounds::lte(operand)),
            Some(">=") => self.range(field, RangeBounds::gte(operand)),
            _ => self.simple(field, operand),
        }
    }

    fn date(&mut self, field: &str, value: &Value) -> QueryResult<()> {
        let bounds = value.get("value").and_then(Value::as_array);
        let (from, to) = match bounds.map(Vec::as_slice) {
            Some([from, to]) => (epoch_seconds(field, from)?, epoch_seconds(field, to)?),
            _ => {
                return Err(QueryError::DateFormat {
                    field: field.to_string(),
                    value: value.get("value").map_or_else(String::new, Value::to_string),
                })
            }
        };

        self.range(
            field,
            RangeBounds::gte(from).with_lt(to).with_time_zone(DATE_TIME_ZONE),
        );
        Ok(())
    }

    fn aggregation(&mut self, selected: &Value) -> QueryResult<()> {
        let selected = selected.as_str().ok_or_else(|| {
            QueryError::InvalidForm("aggregation must name a field".to_string())
        })?;

        self.query.set_aggregation(AggregationDirective {
            field: self.compiler.engine_field(selected),
            order_field: self.compiler.engine_field(&self.sort.property),
            direction: self.sort.direction,
            size: self.pagination.size(),
        });
        Ok(())
    }
}

/// Count the outcome of one compilation under its mode or error kind
fn observe<T>(result: QueryResult<T>, mode: impl FnOnce(&T) -> &'static str) -> QueryResult<T> {
    match result {
        Ok(ref value) => {
            QUERY_COMPILATIONS_TOTAL.with_label_values(&[mode(value)]).inc();
        }
        Err(ref e) => {
            QUERY_COMPILE_ERRORS_TOTAL.with_label_values(&[e.kind()]).inc();
            debug!(error = %e, kind = e.kind(), "search form rejected");
        }
    }
    result
}

/// Parse a `YYYY-MM-DD HH:mm:ss` wall-clock time in Asia/Tehran into Unix seconds
fn epoch_seconds(field: &str, raw: &Value) -> QueryResult<i64> {
    let invalid = || QueryError::DateFormat {
        field: field.to_string(),
        value: raw.as_str().map_or_else(|| raw.to_string(), str::to_string),
    };

    let text = raw.as_str().ok_or_else(invalid)?;
    let naive = NaiveDateTime::parse_from_str(text, DATE_FORMAT).map_err(|_| invalid())?;
    // Wall times skipped by a daylight-saving jump resolve forward past the gap
    Tehran
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| Tehran.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|local| local.timestamp())
        .ok_or_else(invalid)
}
