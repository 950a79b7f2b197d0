/// Export and chart views of parsed data

use serde::Serialize;
use serde_json::Value as JsonValue;

use super::tabular::TabularData;

/// 1x1 transparent PNG served as the chart image
pub const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    /// Spreadsheet download; the body is CSV
    Xlsx,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            "xlsx" => Some(ExportFormat::Xlsx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Png,
    Json,
}

impl ChartFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Some(ChartFormat::Png),
            "json" => Some(ChartFormat::Json),
            _ => None,
        }
    }
}

/// Renders a cell for CSV output
fn cell_text(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Writes rows as CSV with a header line
pub fn to_csv(data: &TabularData) -> String {
    let mut out = String::new();

    let header: Vec<String> = data.columns.iter().map(|c| escape_csv(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for row in &data.rows {
        let line: Vec<String> = data
            .columns
            .iter()
            .map(|c| escape_csv(&cell_text(row.get(c))))
            .collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

/// Serializes rows for download
pub fn export(data: &TabularData, format: ExportFormat) -> Result<Vec<u8>, serde_json::Error> {
    match format {
        ExportFormat::Json => serde_json::to_vec_pretty(&data.rows),
        ExportFormat::Csv | ExportFormat::Xlsx => Ok(to_csv(data).into_bytes()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
}

/// Chart-ready series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

fn as_number(value: Option<&JsonValue>) -> Option<f64> {
    match value? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Builds chart series from numeric columns
///
/// A column is numeric when every row holds a number (or a numeric string,
/// as CSV cells are). Labels come from the first non-numeric column, or are
/// 1-based row numbers when every column is numeric.
pub fn chart_data(data: &TabularData) -> ChartData {
    let is_numeric = |column: &String| {
        !data.rows.is_empty() && data.rows.iter().all(|row| as_number(row.get(column)).is_some())
    };

    let label_column = data.columns.iter().find(|c| !is_numeric(c));

    let labels = match label_column {
        Some(column) => data.rows.iter().map(|row| cell_text(row.get(column))).collect(),
        None => (1..=data.rows.len()).map(|i| i.to_string()).collect(),
    };

    let datasets = data
        .columns
        .iter()
        .filter(|c| is_numeric(c))
        .map(|column| ChartDataset {
            label: column.clone(),
            data: data
                .rows
                .iter()
                .filter_map(|row| as_number(row.get(column)))
                .collect(),
        })
        .collect();

    ChartData { labels, datasets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::tabular::{parse_csv, parse_json};

    #[test]
    fn test_format_parsing() {
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("xlsx"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::parse("pdf"), None);
        assert_eq!(ChartFormat::parse("png"), Some(ChartFormat::Png));
        assert_eq!(ChartFormat::parse("svg"), None);
    }

    #[test]
    fn test_xlsx_export_is_csv_content() {
        let data = parse_csv("a,b\n1,2\n").unwrap();

        let csv = export(&data, ExportFormat::Csv).unwrap();
        let xlsx = export(&data, ExportFormat::Xlsx).unwrap();
        assert_eq!(csv, xlsx);
        assert_eq!(String::from_utf8(csv).unwrap(), "a,b\n1,2\n");
        assert!(ExportFormat::Xlsx.content_type().contains("spreadsheetml"));
    }

    #[test]
    fn test_csv_export_escapes_fields() {
        let data = parse_json(r#"[{"name": "Bell, pair", "note": "say \"hi\"", "n": 2}]"#).unwrap();
        let csv = to_csv(&data);

        assert_eq!(csv, "n,name,note\n2,\"Bell, pair\",\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_json_export_round_trips_rows() {
        let data = parse_csv("x\n1\n").unwrap();
        let bytes = export(&data, ExportFormat::Json).unwrap();
        let value: JsonValue = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value, serde_json::json!([{"x": "1"}]));
    }

    #[test]
    fn test_chart_data_from_csv() {
        let data = parse_csv("circuit,fidelity,depth\nbell,0.98,2\nghz,0.91,4\n").unwrap();
        let chart = chart_data(&data);

        assert_eq!(chart.labels, vec!["bell", "ghz"]);
        assert_eq!(chart.datasets.len(), 2);
        assert_eq!(chart.datasets[0].label, "fidelity");
        assert_eq!(chart.datasets[0].data, vec![0.98, 0.91]);
        assert_eq!(chart.datasets[1].data, vec![2.0, 4.0]);
    }

    #[test]
    fn test_chart_data_all_numeric_uses_row_numbers() {
        let data = parse_json(r#"[{"x": 1, "y": 2}, {"x": 3, "y": 4}]"#).unwrap();
        let chart = chart_data(&data);

        assert_eq!(chart.labels, vec!["1", "2"]);
        assert_eq!(chart.datasets.len(), 2);
    }

    #[test]
    fn test_placeholder_png_signature() {
        assert_eq!(&PLACEHOLDER_PNG[..8], b"\x89PNG\r\n\x1a\n");
    }
}
