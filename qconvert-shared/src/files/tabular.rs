/// Tabular parsing of uploaded data files
///
/// JSON files hold either an array of records or a single record. CSV files
/// have a header row followed by data rows; fields may be double-quoted, and
/// quoted fields may contain commas, newlines and doubled quotes (`""`).

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use super::FileKind;
use crate::models::data_file::FileMetadata;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("JSON content must be an array or an object")]
    UnsupportedJson,

    #[error("CSV file has no header row")]
    EmptyCsv,

    #[error("Unterminated quoted field in CSV")]
    UnterminatedQuote,

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
}

/// Parsed rows, each row an object keyed by column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabularData {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, JsonValue>>,
    pub total_rows: usize,
}

/// JSON type name used in column metadata
pub fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Splits CSV text into records of fields
pub fn parse_csv_records(content: &str) -> Result<Vec<Vec<String>>, ParseError> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ParseError::UnterminatedQuote);
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    // Blank lines are not records
    records.retain(|r| !(r.len() == 1 && r[0].trim().is_empty()));

    Ok(records)
}

/// Parses CSV into rows keyed by the header
///
/// Short rows are padded with empty strings; extra fields are dropped.
pub fn parse_csv(content: &str) -> Result<TabularData, ParseError> {
    let mut records = parse_csv_records(content)?.into_iter();

    let columns: Vec<String> = records
        .next()
        .ok_or(ParseError::EmptyCsv)?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let rows: Vec<Map<String, JsonValue>> = records
        .map(|record| {
            columns
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    let value = record.get(i).cloned().unwrap_or_default();
                    (column.clone(), JsonValue::String(value))
                })
                .collect()
        })
        .collect();

    Ok(TabularData {
        total_rows: rows.len(),
        columns,
        rows,
    })
}

/// Parses JSON records
///
/// Columns come from the keys of the first object; non-object array
/// elements become `{"value": <element>}`.
pub fn parse_json(content: &str) -> Result<TabularData, ParseError> {
    let value: JsonValue =
        serde_json::from_str(content).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let items = match value {
        JsonValue::Array(items) => items,
        JsonValue::Object(_) => vec![value],
        _ => return Err(ParseError::UnsupportedJson),
    };

    let rows: Vec<Map<String, JsonValue>> = items
        .into_iter()
        .map(|item| match item {
            JsonValue::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        })
        .collect();

    let columns = rows
        .first()
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default();

    Ok(TabularData {
        total_rows: rows.len(),
        columns,
        rows,
    })
}

/// Parses file content according to its kind
pub fn parse(kind: &FileKind, content: &str) -> Result<TabularData, ParseError> {
    match kind {
        FileKind::Json => parse_json(content),
        FileKind::Csv => parse_csv(content),
        FileKind::Other(ext) => Err(ParseError::UnsupportedType(ext.clone())),
    }
}

/// Infers record count and column shape
///
/// JSON reports the type of each column as seen in the first record; CSV
/// reports column names only.
pub fn infer_metadata(kind: &FileKind, content: &str) -> Result<FileMetadata, ParseError> {
    match kind {
        FileKind::Json => {
            let value: JsonValue = serde_json::from_str(content)
                .map_err(|e| ParseError::InvalidJson(e.to_string()))?;

            let (count, first) = match &value {
                JsonValue::Array(items) => (items.len(), items.first()),
                JsonValue::Object(_) => (1, Some(&value)),
                _ => return Err(ParseError::UnsupportedJson),
            };

            let (columns, column_types) = match first {
                Some(JsonValue::Object(map)) => {
                    let columns: Vec<String> = map.keys().cloned().collect();
                    let types: BTreeMap<String, String> = map
                        .iter()
                        .map(|(k, v)| (k.clone(), json_type_name(v).to_string()))
                        .collect();
                    (Some(columns), Some(types))
                }
                _ => (None, None),
            };

            Ok(FileMetadata {
                record_count: Some(count as u64),
                columns,
                column_types,
            })
        }
        FileKind::Csv => {
            let table = parse_csv(content)?;
            Ok(FileMetadata {
                record_count: Some(table.total_rows as u64),
                columns: Some(table.columns),
                column_types: None,
            })
        }
        FileKind::Other(ext) => Err(ParseError::UnsupportedType(ext.clone())),
    }
}
