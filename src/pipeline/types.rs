// src/pipeline/types.rs
// Values flowing between pipeline stages

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{QueryError, Result};

/// Minimum trimmed length of an answerable question
pub const MIN_QUESTION_CHARS: usize = 10;

/// A validated, trimmed question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    /// Validate raw user input. Runs before any external call.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QueryError::Validation("Question cannot be empty".to_string()));
        }
        if trimmed.chars().count() < MIN_QUESTION_CHARS {
            return Err(QueryError::Validation(format!(
                "Please enter a more detailed question (at least {} characters)",
                MIN_QUESTION_CHARS
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which source path a question takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    SpecialSource,
    General,
}

/// Pipeline states, used for logging and to tag failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Classifying,
    Generating,
    Executing,
    Formatting,
    Persisted,
    Returned,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Classifying => "classifying",
            Self::Generating => "generating",
            Self::Executing => "executing",
            Self::Formatting => "formatting",
            Self::Persisted => "persisted",
            Self::Returned => "returned",
        };
        f.write_str(name)
    }
}

/// Result of a stage that may recover locally instead of failing
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Resolved(T),
    /// A default or fallback value stands in for the real one
    Degraded { value: T, cause: String },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, cause: impl Into<String>) -> Self {
        Self::Degraded {
            value,
            cause: cause.into(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Resolved(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Resolved(value) | Self::Degraded { value, .. } => value,
        }
    }
}

/// Tables exposed by the REST data endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestTable {
    Transactions,
    Customers,
    Products,
    Stores,
}

impl RestTable {
    pub const ALL: [RestTable; 4] = [
        Self::Transactions,
        Self::Customers,
        Self::Products,
        Self::Stores,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == s.trim())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Customers => "customers",
            Self::Products => "products",
            Self::Stores => "stores",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Transactions => &[
                "id",
                "customer_id",
                "store_id",
                "product_id",
                "transaction_date",
                "quanity",
                "total_amount",
                "discount_amount",
                "final_amount",
                "loyalty_points",
            ],
            Self::Customers => &["id", "name", "email", "gender"],
            Self::Products => &["id", "product_name", "aisle", "unit_price"],
            Self::Stores => &["id", "store_name"],
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns().contains(&column)
    }
}

impl fmt::Display for RestTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structured REST query: `{table, select, order?, limit?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestDescriptor {
    pub table: RestTable,
    pub select: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl RestDescriptor {
    pub fn new(table: RestTable, select: impl Into<String>, limit: u32) -> Self {
        Self {
            table,
            select: select.into(),
            order: None,
            limit: Some(limit),
        }
    }

    /// Build from a reasoning-service reply. `table` and `select` are
    /// required; `table` must be a known table.
    pub fn from_value(value: &Value) -> std::result::Result<Self, String> {
        let table = value
            .get("table")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .ok_or("missing table")?;
        let table = RestTable::parse(table).ok_or_else(|| format!("unknown table '{}'", table))?;
        let select = value
            .get("select")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or("missing select")?;
        let order = value
            .get("order")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string);
        let limit = value
            .get("limit")
            .and_then(Value::as_u64)
            .filter(|l| *l > 0)
            .map(|l| l.min(u32::MAX as u64) as u32);

        Ok(Self {
            table,
            select: select.trim().to_string(),
            order,
            limit,
        })
    }

    /// Column named by `order` (`"final_amount.desc"` -> `"final_amount"`)
    pub fn order_column(&self) -> Option<&str> {
        self.order
            .as_deref()
            .map(|o| o.split('.').next().unwrap_or(o))
    }

    /// Drop an `order` that names a column the table does not have.
    /// Returns the removed clause.
    pub fn drop_invalid_order(&mut self) -> Option<String> {
        let valid = self.order_column().is_none_or(|c| self.table.has_column(c));
        if valid { None } else { self.order.take() }
    }
}

/// Reference to the special-cased spreadsheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRef {
    pub sheet_id: String,
    /// Display name, e.g. "Netflix stock"
    pub label: String,
}

/// Machine-executable artifact, dispatched once per request
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// Query text run as-is against the relational backend
    SqlText(String),
    Rest(RestDescriptor),
    Sheet(SheetRef),
}

impl Artifact {
    /// Short label used in logs and the plain-text fallback header
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SqlText(_) => "sql",
            Self::Rest(_) => "rest",
            Self::Sheet(_) => "sheet",
        }
    }
}

/// What the relational strategy produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationalOutcome {
    /// `{"query": "..."}`
    Query(String),
    /// `{"error": "..."}`: the service declined to answer. The reply text
    /// is kept as it arrived and becomes the answer.
    Declined { reason: String, reply: String },
    /// Reply was not the expected envelope; used as the answer verbatim
    Verbatim(String),
}

/// Rows returned by a backend; each row is a JSON object or array
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultRows(Vec<Value>);

impl ResultRows {
    pub fn new(rows: Vec<Value>) -> Self {
        Self(rows)
    }

    /// Rows from a parsed text grid
    pub fn from_grid(grid: Vec<Vec<String>>) -> Self {
        Self(
            grid.into_iter()
                .map(|row| Value::Array(row.into_iter().map(Value::String).collect()))
                .collect(),
        )
    }

    pub fn rows(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field values of one row, rendered as display strings
    pub fn row_fields(row: &Value) -> Vec<String> {
        match row {
            Value::Object(map) => map.values().map(display_value).collect(),
            Value::Array(items) => items.iter().map(display_value).collect(),
            other => vec![display_value(other)],
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_rejects_empty() {
        let err = Question::parse("   \n ").unwrap_err();
        assert_eq!(err.to_string(), "Question cannot be empty");
    }

    #[test]
    fn test_question_rejects_short() {
        let err = Question::parse("  short   ").unwrap_err();
        assert!(err.to_string().contains("at least 10 characters"));
    }

    #[test]
    fn test_question_counts_chars_after_trim() {
        assert!(Question::parse("  123456789  ").is_err());
        let q = Question::parse("  1234567890  ").unwrap();
        assert_eq!(q.as_str(), "1234567890");
        // Ten multi-byte characters are enough
        assert!(Question::parse("éééééééééé").is_ok());
    }

    #[test]
    fn test_outcome_accessors() {
        let resolved: Outcome<bool> = Outcome::Resolved(true);
        assert!(!resolved.is_degraded());
        assert!(*resolved.value());

        let degraded = Outcome::degraded(false, "not json");
        assert!(degraded.is_degraded());
        assert!(!degraded.into_value());
    }

    #[test]
    fn test_rest_table_parse() {
        assert_eq!(RestTable::parse("customers"), Some(RestTable::Customers));
        assert_eq!(RestTable::parse("orders"), None);
        assert!(RestTable::Transactions.has_column("final_amount"));
        assert!(!RestTable::Customers.has_column("final_amount"));
    }

    #[test]
    fn test_descriptor_from_value() {
        let d = RestDescriptor::from_value(&json!({
            "table": "transactions",
            "select": "*,customers(*)",
            "order": "final_amount.desc",
            "limit": 100
        }))
        .unwrap();
        assert_eq!(d.table, RestTable::Transactions);
        assert_eq!(d.order_column(), Some("final_amount"));
        assert_eq!(d.limit, Some(100));
    }

    #[test]
    fn test_descriptor_requires_table_and_select() {
        assert_eq!(
            RestDescriptor::from_value(&json!({"select": "*"})).unwrap_err(),
            "missing table"
        );
        assert_eq!(
            RestDescriptor::from_value(&json!({"table": "customers"})).unwrap_err(),
            "missing select"
        );
        assert!(
            RestDescriptor::from_value(&json!({"table": "orders", "select": "*"}))
                .unwrap_err()
                .contains("unknown table")
        );
    }

    #[test]
    fn test_descriptor_ignores_bad_limit() {
        let d = RestDescriptor::from_value(&json!({"table": "stores", "select": "*", "limit": 0})).unwrap();
        assert_eq!(d.limit, None);
        let d = RestDescriptor::from_value(&json!({"table": "stores", "select": "*", "limit": "ten"})).unwrap();
        assert_eq!(d.limit, None);
    }

    #[test]
    fn test_drop_invalid_order() {
        let mut d = RestDescriptor::new(RestTable::Customers, "*", 50);
        d.order = Some("final_amount.desc".into());
        assert_eq!(d.drop_invalid_order().as_deref(), Some("final_amount.desc"));
        assert!(d.order.is_none());

        let mut d = RestDescriptor::new(RestTable::Customers, "*", 50);
        d.order = Some("name.asc".into());
        assert_eq!(d.drop_invalid_order(), None);
        assert_eq!(d.order.as_deref(), Some("name.asc"));
    }

    #[test]
    fn test_rows_from_grid_and_fields() {
        let rows = ResultRows::from_grid(vec![vec!["Date".into(), "Close".into()]]);
        assert_eq!(rows.len(), 1);
        assert_eq!(ResultRows::row_fields(&rows.rows()[0]), vec!["Date", "Close"]);

        let fields = ResultRows::row_fields(&json!({"name": "Atomic Habits", "note": null, "price": 18.99}));
        assert_eq!(fields, vec!["Atomic Habits", "", "18.99"]);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Classifying.to_string(), "classifying");
        assert_eq!(Stage::Returned.to_string(), "returned");
    }
}
