//! Compilation of alarm search forms into search-engine boolean queries
//!
//! A submitted form is a loose JSON object of named fields. Each field is
//! classified by a static table, filtered by its constraint and handed to a
//! kind-specific handler that emits `match` / `range` / `terms` / `bool`
//! clauses into one root boolean query:
//!
//! ```text
//! raw form ──► SearchRequest (control keys stripped)
//!                   │
//!                   ▼
//!             QueryCompiler ──► FieldClassifier ──► simple / mixed / comparison
//!                   │                                 / date / aggregation
//!                   ▼
//!             CompiledQuery ──► engine JSON document
//! ```
//!
//! Every compiled query carries a `risk >= 1` range. Pagination and sort
//! are attached only when no aggregation is selected; otherwise a terms
//! aggregation with a cardinality total replaces them.
//!
//! # Example
//!
//! ```no_run
//! use alarm_query::search::{QueryCompiler, QueryConfig, SearchRequest};
//! use serde_json::json;
//!
//! let compiler = QueryCompiler::from_config(&QueryConfig::default());
//! let request = SearchRequest::from_json(json!({
//!     "page": 1, "limit": 10,
//!     "sort": { "prop": "alarm_date", "order": "desc" },
//!     "status": "open"
//! }))?;
//!
//! let compiled = compiler.compile_request(&request)?;
//! println!("{}", compiled.to_json());
//! # Ok::<(), alarm_query::search::QueryError>(())
//! ```

mod compiler;
mod config;
mod error;
mod fields;
mod form;
mod mapper;
mod mixed;
mod query;

pub use compiler::{QueryCompiler, DATE_FORMAT, DATE_TIME_ZONE, RISK_FLOOR};
pub use config::{FieldMapping, QueryConfig, QueryConfigBuilder};
pub use error::{QueryError, QueryResult};
pub use fields::{is_blank, is_truthy, Constraint, FieldClassifier, FieldKind, FieldSpec};
pub use form::{
    AggregatedTerms, PaginationSpec, SearchForm, SearchRequest, SortDirection, SortSpec,
    CONTROL_KEYS,
};
pub use mapper::{FieldMapper, TableFieldMapper};
pub use mixed::{
    JoinOperator, MatchOperator, MixedFieldResolver, MixedPair, MixedResolution, MixedShape,
    SideMatch,
};
pub use query::{
    AggregationDirective, BoolQuery, Clause, CompiledQuery, RangeBounds, SortDirective,
    UnmappedType, RESULT_AGGREGATION, TOTAL_AGGREGATION,
};
