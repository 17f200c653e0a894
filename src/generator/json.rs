//! Built-in JSON generator

use super::{ExportGenerator, GeneratorSink};
use crate::error::Result;
use crate::types::{ExportDescriptor, FileKind};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Renders the business data as pretty-printed JSON
///
/// Claims descriptors with `file_type = json`. Any JSON value is accepted.
pub struct JsonGenerator;

#[async_trait]
impl ExportGenerator for JsonGenerator {
    fn supports(&self, descriptor: &ExportDescriptor) -> bool {
        descriptor.file_type == FileKind::Json
    }

    async fn generate(
        &self,
        data: &serde_json::Value,
        _descriptor: &ExportDescriptor,
        sink: &mut GeneratorSink,
    ) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(data)?;
        sink.write_all(&bytes).await?;
        sink.write_all(b"\n").await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(kind: FileKind) -> ExportDescriptor {
        ExportDescriptor {
            code: "TEST".into(),
            name: "Test".into(),
            description: String::new(),
            filename: "test".into(),
            file_type: kind,
            run_async: false,
        }
    }

    #[test]
    fn supports_only_json() {
        let generator = JsonGenerator;
        assert!(generator.supports(&descriptor(FileKind::Json)));
        assert!(!generator.supports(&descriptor(FileKind::Csv)));
        assert!(!generator.supports(&descriptor(FileKind::Excel)));
    }

    #[tokio::test]
    async fn output_round_trips_through_serde() {
        let generator = JsonGenerator;
        let data = serde_json::json!({"rows": [1, 2, 3], "total": 3});
        let mut buf: Vec<u8> = Vec::new();

        generator
            .generate(&data, &descriptor(FileKind::Json), &mut buf)
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, data);
    }
}
