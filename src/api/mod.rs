pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::search::{QueryCompiler, QueryConfig};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub compiler: Arc<QueryCompiler>,
    pub index: String,
}

impl AppState {
    pub fn new(compiler: Arc<QueryCompiler>, index: impl Into<String>) -> Self {
        Self {
            compiler,
            index: index.into(),
        }
    }

    pub fn from_config(config: &QueryConfig) -> Self {
        Self::new(Arc::new(QueryCompiler::from_config(config)), config.index.clone())
    }
}
