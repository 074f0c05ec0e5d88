//! Error types for query compilation

/// Result type for query compilation
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Errors that can occur while compiling a search form
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The form names a field that has no classification
    #[error("Unknown search field: {0}")]
    UnknownField(String),

    /// A date bound is not in `YYYY-MM-DD HH:mm:ss` form
    #[error("Invalid date for field {field}: {value}")]
    DateFormat { field: String, value: String },

    /// An operator token outside the accepted set
    #[error("Invalid operator for field {field}: {token}")]
    InvalidOperator { field: String, token: String },

    /// Page or limit out of range
    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    /// Form root or a control key has the wrong shape
    #[error("Invalid search form: {0}")]
    InvalidForm(String),
}

impl QueryError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::UnknownField(_) => "unknown_field",
            QueryError::DateFormat { .. } => "date_format",
            QueryError::InvalidOperator { .. } => "invalid_operator",
            QueryError::InvalidPagination(_) => "invalid_pagination",
            QueryError::InvalidForm(_) => "invalid_form",
        }
    }
}

impl From<validator::ValidationErrors> for QueryError {
    fn from(err: validator::ValidationErrors) -> Self {
        QueryError::InvalidPagination(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_errors_from_validator() {
        let err = crate::search::PaginationSpec::new(0, 10).unwrap_err();
        assert_eq!(err.kind(), "invalid_pagination");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(QueryError::UnknownField("x".into()).kind(), "unknown_field");
        assert_eq!(QueryError::InvalidForm("x".into()).kind(), "invalid_form");
    }
}
