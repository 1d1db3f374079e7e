// src/web/state.rs
// Shared handler state

use std::sync::Arc;

use crate::pipeline::QueryPipeline;
use crate::store::QueryStore;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QueryPipeline>,
}

impl AppState {
    pub fn new(pipeline: QueryPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn store(&self) -> &Arc<dyn QueryStore> {
        self.pipeline.store()
    }
}
