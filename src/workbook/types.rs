use serde::Serialize;
use serde_json::{Number, Value};

/// Table column as reported by the workbook schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ordinal_position: usize,
}

impl Column {
    pub fn new(name: impl Into<String>, ordinal_position: usize) -> Self {
        Self { name: name.into(), ordinal_position }
    }
}

/// One table row: cell values in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub ordinal_index: u64,
    pub values: Vec<CellValue>,
}

impl Row {
    pub fn new(ordinal_index: u64, values: Vec<CellValue>) -> Self {
        Self { ordinal_index, values }
    }
}

/// Scalar cell content. Serializes as the bare JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(Number),
    Boolean(bool),
    Empty,
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Boolean(b),
            Value::Number(n) => CellValue::Number(n),
            Value::String(s) => CellValue::Text(s),
            // workbook cells are scalar; anything nested is kept as its JSON text
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value.into())
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}
