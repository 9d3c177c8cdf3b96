use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::workbook::types::{CellValue, Column, Row};
use crate::utils::constants::ENTITY_KEY;

/// Row exposed as an OData entity. `id` is the row's ordinal index at fetch time.
#[derive(Debug, Clone, PartialEq)]
pub struct ODataEntity {
    pub id: String,
    /// column name -> cell, in column order
    pub fields: Vec<(String, CellValue)>,
}

impl ODataEntity {
    pub fn field(&self, name: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, value)| value)
    }
}

impl Serialize for ODataEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ENTITY_KEY, &self.id)?;
        for (name, value) in self.fields.iter().filter(|(name, _)| name != ENTITY_KEY) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Turn positional rows into entities.
///
/// A column whose position lies past the end of a row's values is left out
/// of that entity; rows may be shorter than the schema.
pub fn translate(rows: &[Row], columns: &[Column]) -> Vec<ODataEntity> {
    rows.iter().map(|row| translate_row(row, columns)).collect()
}

fn translate_row(row: &Row, columns: &[Column]) -> ODataEntity {
    let fields = columns
        .iter()
        .filter_map(|column| {
            row.values
                .get(column.ordinal_position)
                .map(|value| (column.name.to_owned(), value.clone()))
        })
        .collect();

    ODataEntity {
        id: row.ordinal_index.to_string(),
        fields,
    }
}
