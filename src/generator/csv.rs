//! Built-in CSV generator

use super::{ExportGenerator, GeneratorSink};
use crate::error::{Error, Result};
use crate::types::{ExportDescriptor, FileKind};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Renders array-of-objects business data as CSV
///
/// Claims descriptors with `file_type = csv`. The data must be a JSON array
/// of objects; the header row is derived from the first record's keys and
/// records missing a column emit an empty field.
pub struct CsvGenerator;

/// Quote a field when it contains a delimiter, quote, or newline
fn escape_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') || raw.contains('\r') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Render a JSON value as a CSV field
fn field_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ExportGenerator for CsvGenerator {
    fn supports(&self, descriptor: &ExportDescriptor) -> bool {
        descriptor.file_type == FileKind::Csv
    }

    async fn generate(
        &self,
        data: &serde_json::Value,
        _descriptor: &ExportDescriptor,
        sink: &mut GeneratorSink,
    ) -> Result<()> {
        let rows = data
            .as_array()
            .ok_or_else(|| Error::Other("csv export expects an array of records".into()))?;

        let Some(first) = rows.first().and_then(|v| v.as_object()) else {
            // No records means no bytes; artifact verification then fails the task
            return Ok(());
        };

        let columns: Vec<String> = first.keys().cloned().collect();
        let header = columns
            .iter()
            .map(|c| escape_field(c))
            .collect::<Vec<_>>()
            .join(",");
        sink.write_all(header.as_bytes()).await?;
        sink.write_all(b"\n").await?;

        for row in rows {
            let record = row
                .as_object()
                .ok_or_else(|| Error::Other("csv export expects an array of records".into()))?;
            let line = columns
                .iter()
                .map(|c| {
                    record
                        .get(c)
                        .map(|v| escape_field(&field_text(v)))
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
                .join(",");
            sink.write_all(line.as_bytes()).await?;
            sink.write_all(b"\n").await?;
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}
