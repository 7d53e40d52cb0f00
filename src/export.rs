//! Writes query results to files people can open elsewhere.
mod delimited;
mod xml;

pub use delimited::to_csv;
pub use xml::{sanitize_tag_name, to_xml};

use crate::api::QueryResult;
use crate::Error;
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Xml,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xml => "application/xml",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown export format `{0}`, expected one of: json, csv, xml")]
pub struct UnknownFormat(String);

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "xml" => Ok(ExportFormat::Xml),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

pub fn export(result: &QueryResult, format: ExportFormat) -> Result<String, Error> {
    match format {
        ExportFormat::Json => to_json(result),
        ExportFormat::Csv => delimited::to_csv(result),
        ExportFormat::Xml => Ok(xml::to_xml(result)),
    }
}

/// Rows as objects, keys in column order.
pub fn to_json(result: &QueryResult) -> Result<String, Error> {
    let rows: Vec<Map<String, Value>> = result
        .rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .map(|column| (column.clone(), result.value(row, column).clone()))
                .collect()
        })
        .collect();

    Ok(serde_json::to_string_pretty(&rows)?)
}

/// How a cell reads in the text based formats. Nulls are empty.
pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
