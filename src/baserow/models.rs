use serde::Deserialize;
use serde_json::{Map, Value};

/// One column definition as returned by the Baserow fields endpoint.
/// Field ids are stable per deployment but only knowable at runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct TableField {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

/// A row as returned by the rows endpoint: an `id` plus dynamic
/// `field_XXXXX` cells whose shapes vary by column type.
#[derive(Debug, Deserialize)]
pub struct Row {
    pub id: u64,
    #[serde(flatten)]
    pub cells: Map<String, Value>,
}

/// Paged list-rows response. Results stay raw JSON so one malformed row
/// can be handled per row instead of failing the whole page.
#[derive(Debug, Deserialize)]
pub struct RowPage {
    pub results: Vec<Value>,
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}
