// src/sources/mod.rs
// Data backends and per-request dispatch

mod rest;
mod sheet;
mod sql;

pub use rest::RestSource;
pub use sheet::{SheetSource, is_valid_sheet_id, parse_csv};
pub use sql::SqlSource;

use tracing::info;

use crate::error::{QueryError, Result};
use crate::pipeline::{Artifact, ResultRows};

/// Runs an artifact against the backend it targets
pub struct SourceExecutor {
    sql: Option<SqlSource>,
    rest: RestSource,
    sheet: SheetSource,
}

impl SourceExecutor {
    pub fn new(sql: Option<SqlSource>, rest: RestSource, sheet: SheetSource) -> Self {
        Self { sql, rest, sheet }
    }

    pub async fn execute(&self, artifact: &Artifact) -> Result<ResultRows> {
        info!(kind = artifact.kind(), "Dispatching artifact");
        match artifact {
            Artifact::SqlText(query) => match self.sql {
                Some(ref sql) => sql.run(query).await,
                None => Err(QueryError::Execution("relational backend is not configured".into())),
            },
            Artifact::Rest(descriptor) => self.rest.fetch(descriptor).await,
            Artifact::Sheet(sheet) => self.sheet.fetch(sheet).await,
        }
    }
}
