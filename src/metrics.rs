//! Prometheus metrics for query compilation
//!
//! # Example
//! ```no_run
//! use alarm_query::metrics::QUERY_COMPILATIONS_TOTAL;
//!
//! QUERY_COMPILATIONS_TOTAL.with_label_values(&["search"]).inc();
//! ```

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Compiled queries
    ///
    /// Labels: mode (search, aggregation, bulk)
    pub static ref QUERY_COMPILATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("compilations_total", "Total number of compiled search forms")
            .namespace("alarm_query"),
        &["mode"]
    ).expect("Failed to create QUERY_COMPILATIONS_TOTAL metric");

    /// Rejected search forms
    ///
    /// Labels: kind
    pub static ref QUERY_COMPILE_ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("compile_errors_total", "Total number of search forms that failed to compile")
            .namespace("alarm_query"),
        &["kind"]
    ).expect("Failed to create QUERY_COMPILE_ERRORS_TOTAL metric");

    /// Known fields omitted because their constraint did not hold
    ///
    /// Labels: field
    pub static ref QUERY_FIELDS_SKIPPED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("fields_skipped_total", "Total number of form fields omitted by constraint")
            .namespace("alarm_query"),
        &["field"]
    ).expect("Failed to create QUERY_FIELDS_SKIPPED_TOTAL metric");
}

/// Register all collectors with the global registry
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(QUERY_COMPILATIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(QUERY_COMPILE_ERRORS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(QUERY_FIELDS_SKIPPED_TOTAL.clone()))?;
    Ok(())
}

/// Render the registry in Prometheus text exposition format
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&PROMETHEUS_REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let before = QUERY_COMPILATIONS_TOTAL.with_label_values(&["bulk"]).get();
        QUERY_COMPILATIONS_TOTAL.with_label_values(&["bulk"]).inc();
        assert_eq!(
            QUERY_COMPILATIONS_TOTAL.with_label_values(&["bulk"]).get(),
            before + 1.0
        );
    }
}
