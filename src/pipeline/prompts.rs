// src/pipeline/prompts.rs
// Prompt templates for the reasoning calls

use super::types::RestTable;

/// Key the classifier expects in its JSON reply
pub const CLASSIFICATION_KEY: &str = "isSpecialSource";

/// Marker object the relational strategy returns when it cannot help
pub const DECLINE_MARKER: &str = r#"{"error": "Cannot generate query for this request"}"#;

pub const DESCRIPTOR_SYSTEM: &str =
    "You are a helpful assistant that generates REST API queries. Always respond with valid JSON only.";

pub const NARRATIVE_SYSTEM: &str = "You are a helpful assistant that answers questions clearly and concisely. \
     Use the data provided to give direct answers with relevant numbers and facts. Always respond with valid JSON only.";

/// Worked narrative examples shown to the formatter
const NARRATIVE_EXAMPLES: [&str; 3] = [
    "Based on the sales data analysis, the top selling products last quarter were:\n\n\
     1. **Premium Widget Pro** - 1,247 units sold ($62,350 revenue)\n\
     2. **Standard Widget** - 982 units sold ($29,460 revenue)\n\
     3. **Widget Accessories Kit** - 756 units sold ($15,120 revenue)\n\n\
     The Premium Widget Pro showed a 23% increase compared to the previous quarter.",
    "Revenue analysis reveals:\n\n\
     • **Total revenue:** $2.4M (↑18% YoY)\n\
     • **Monthly recurring revenue:** $450K\n\
     • **Average deal size:** $3,200\n\n\
     Growth drivers include expansion in the enterprise segment.",
    "The conversion funnel analysis shows:\n\n\
     • **Website visitors:** 45,200\n\
     • **Lead generation:** 3,840 (8.5% conversion)\n\
     • **Closed deals:** 384 (20% close rate)\n\n\
     Recommendations: Focus on improving lead qualification.",
];

const RELATIONAL_SCHEMA: &str = "\
customers(id INTEGER PRIMARY KEY, first_name TEXT, last_name TEXT, email TEXT UNIQUE, city TEXT, state TEXT, country TEXT, registration_date TEXT)
categories(id INTEGER PRIMARY KEY, name TEXT, description TEXT)
products(id INTEGER PRIMARY KEY, name TEXT, description TEXT, category_id INTEGER REFERENCES categories(id), price REAL, stock_quantity INTEGER, is_active INTEGER)
orders(id INTEGER PRIMARY KEY, customer_id INTEGER REFERENCES customers(id), order_date TEXT, status TEXT, total_amount REAL, shipping_address TEXT)
order_items(id INTEGER PRIMARY KEY, order_id INTEGER REFERENCES orders(id), product_id INTEGER REFERENCES products(id), quantity INTEGER, unit_price REAL)

Order statuses: pending, processing, shipped, completed.";

/// Ask whether a question is about the special-cased source
pub fn classification(question: &str, source_name: &str) -> String {
    format!(
        r#"You are an AI assistant that determines if a user question is about {name}.

Analyze the following question and determine if it's asking about {name} data, prices, or performance.

Examples of {name} queries:
- "What is the latest {name} price?"
- "How is {name} performing?"
- "Show me {name} data"

Examples of other queries:
- "What are our top selling products?"
- "Who are our best customers?"
- "What's the revenue breakdown?"

Respond ONLY with a JSON object in this exact format:
{{"{key}": boolean}}

Here is the user's question: {question}"#,
        name = source_name,
        key = CLASSIFICATION_KEY,
        question = question,
    )
}

/// Ask for a query string against the relational schema
pub fn relational(question: &str) -> String {
    format!(
        r#"You are an AI assistant that converts user requests into SQL queries.

Database schema (SQLite):
{schema}

Rules:
1. Respond with a JSON object of the form {{"query": "<SQL>"}} and nothing else.
2. Only read data. Use table and column names exactly as listed.
3. Do NOT provide natural language in the response.
4. If the request cannot be fulfilled, return:
{decline}

Here is the user's question: {question}"#,
        schema = RELATIONAL_SCHEMA,
        decline = DECLINE_MARKER,
        question = question,
    )
}

fn rest_schema() -> String {
    RestTable::ALL
        .iter()
        .map(|t| format!("- {}: {}", t.name(), t.columns().join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ask for a `{table, select, order?, limit?}` descriptor
pub fn descriptor(question: &str) -> String {
    format!(
        r#"You are an AI assistant that generates accurate REST API queries.

DATABASE SCHEMA:
{schema}

RELATIONSHIPS:
- transactions.customer_id -> customers.id
- transactions.product_id -> products.id
- transactions.store_id -> stores.id

QUERY RULES:
1. Choose the primary table based on the main entity being asked about
2. Use "*" to get all fields for analysis
3. Use "*,customers(*)" when you need customer data with transactions, "*,stores(*)" for store data
4. Only order by fields that exist in the selected table
5. Use 500 for analysis, 50 for specific lookups

EXAMPLES:
- "What's the total revenue?" -> {{"table": "transactions", "select": "*", "limit": 500}}
- "Who are the top customers by spending?" -> {{"table": "transactions", "select": "*,customers(*)", "order": "final_amount.desc", "limit": 100}}
- "Show me recent transactions" -> {{"table": "transactions", "select": "*", "order": "transaction_date.desc", "limit": 50}}
- "List all customers" -> {{"table": "customers", "select": "*", "limit": 500}}
- "What products do we have?" -> {{"table": "products", "select": "*", "limit": 100}}

User question: "{question}"

Return ONLY the JSON object:"#,
        schema = rest_schema(),
        question = question,
    )
}

/// Ask for a narrative report over result rows
pub fn narrative(question: &str, label: &str, rows_json: &str) -> String {
    let examples: Vec<serde_json::Value> = NARRATIVE_EXAMPLES
        .iter()
        .map(|e| serde_json::json!({ "response": e }))
        .collect();
    let examples = serde_json::Value::Array(examples).to_string();

    format!(
        r#"You are an AI assistant that converts {label} data into clear markdown reports.

Example responses:
{examples}

Original question: {question}
Data: {rows_json}

Format this into a markdown report similar to the examples above. Respond with a JSON object with a key of "response" whose value is the markdown report."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_prompt_names_source_and_key() {
        let p = classification("How is the stock doing?", "Netflix Stock");
        assert!(p.contains("Netflix Stock"));
        assert!(p.contains(r#"{"isSpecialSource": boolean}"#));
        assert!(p.ends_with("How is the stock doing?"));
    }

    #[test]
    fn test_relational_prompt_has_decline_marker() {
        let p = relational("Who are our best customers?");
        assert!(p.contains("order_items"));
        assert!(p.contains(DECLINE_MARKER));
    }

    #[test]
    fn test_descriptor_prompt_lists_every_table() {
        let p = descriptor("List all customers");
        for table in RestTable::ALL {
            assert!(p.contains(&format!("- {}:", table.name())));
        }
        assert!(p.contains("final_amount.desc"));
    }

    #[test]
    fn test_narrative_prompt_embeds_rows() {
        let p = narrative("Top products?", "Database", r#"[{"name":"Atomic Habits"}]"#);
        assert!(p.contains("Atomic Habits"));
        assert!(p.contains(r#"{"response":"#));
        assert!(p.contains("Database data"));
    }
}
