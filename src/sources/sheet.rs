// src/sources/sheet.rs
// Spreadsheet CSV export for the special-cased source

use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;
use tracing::{info, instrument, warn};

use crate::error::{QueryError, Result};
use crate::pipeline::{ResultRows, SheetRef};

static SHEET_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: static literal pattern
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("sheet id regex")
});

pub fn is_valid_sheet_id(sheet_id: &str) -> bool {
    SHEET_ID_RE.is_match(sheet_id)
}

/// Parse comma-separated text into a grid.
///
/// Quoted fields may contain commas and newlines, `""` inside quotes is a
/// literal quote, cells are trimmed, blank lines are skipped and rows may
/// differ in length.
pub fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| QueryError::Execution(format!("malformed CSV: {}", e)))?;
        // A blank line reads as one empty field; `,,` keeps its empty cells
        if record.len() == 1 && record.get(0).is_some_and(str::is_empty) {
            continue;
        }
        grid.push(record.iter().map(str::to_string).collect());
    }
    Ok(grid)
}

pub struct SheetSource {
    client: Client,
    base_url: String,
}

impl SheetSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// CSV export URL; the id is validated before it is interpolated
    pub fn export_url(&self, sheet_id: &str) -> Result<String> {
        if !is_valid_sheet_id(sheet_id) {
            return Err(QueryError::Execution(format!("invalid sheet id '{}'", sheet_id)));
        }
        Ok(format!(
            "{}/{}/gviz/tq?tqx=out:csv",
            self.base_url.trim_end_matches('/'),
            sheet_id
        ))
    }

    #[instrument(skip(self, sheet), fields(sheet_id = %sheet.sheet_id))]
    pub async fn fetch(&self, sheet: &SheetRef) -> Result<ResultRows> {
        let url = self.export_url(&sheet.sheet_id)?;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| QueryError::Execution(format!("sheet download failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Sheet export rejected");
            return Err(QueryError::Execution(format!("failed to fetch sheet: {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| QueryError::Execution(format!("sheet download failed: {}", e)))?;
        let grid = parse_csv(&text)?;
        info!(rows = grid.len(), "Sheet export parsed");
        Ok(ResultRows::from_grid(grid))
    }
}
