//! Format generators and their registry
//!
//! The core abstraction is the [`ExportGenerator`] trait: a strategy that
//! renders business data into a specific file format. The engine resolves a
//! generator through a [`GeneratorRegistry`], an ordered list where the first
//! generator claiming support for a descriptor wins. Registration order is a
//! tie-break only; a well-formed descriptor should be claimed by at most one
//! generator, and two claiming the same descriptor is a configuration bug.
//!
//! Two lightweight generators ship with the crate:
//!
//! - [`JsonGenerator`]: pretty-printed JSON of the business data
//! - [`CsvGenerator`]: array-of-objects data rendered as CSV
//!
//! Heavier formats (Excel, PDF, Word) are host-provided: implement
//! [`ExportGenerator`] and register it.
//!
//! ```
//! use export_engine::{ExportDescriptor, FileKind, GeneratorRegistry};
//!
//! let registry = GeneratorRegistry::with_builtins();
//! let descriptor = ExportDescriptor {
//!     code: "ORDER_REPORT".into(),
//!     name: "Order report".into(),
//!     description: String::new(),
//!     filename: "orders".into(),
//!     file_type: FileKind::Json,
//!     run_async: false,
//! };
//! assert!(registry.resolve(&descriptor).is_ok());
//! ```

mod csv;
mod json;

pub use csv::CsvGenerator;
pub use json::JsonGenerator;

use crate::error::{Error, Result};
use crate::types::ExportDescriptor;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::AsyncWrite;

/// Byte sink a generator streams its output into
pub type GeneratorSink = dyn AsyncWrite + Send + Unpin;

/// A strategy that renders business data into a specific file format
#[async_trait]
pub trait ExportGenerator: Send + Sync {
    /// Whether this generator can render the given descriptor
    fn supports(&self, descriptor: &ExportDescriptor) -> bool;

    /// Render `data` into `sink`
    ///
    /// # Errors
    ///
    /// Returns an error if the data does not fit the format or the sink
    /// cannot be written. The engine converts generation errors into a
    /// failed task; synchronous exports propagate them directly.
    async fn generate(
        &self,
        data: &serde_json::Value,
        descriptor: &ExportDescriptor,
        sink: &mut GeneratorSink,
    ) -> Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

impl std::fmt::Debug for dyn ExportGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ExportGenerator").field(&self.name()).finish()
    }
}

/// Ordered registry of format generators
pub struct GeneratorRegistry {
    generators: Vec<Arc<dyn ExportGenerator>>,
}

impl GeneratorRegistry {
    /// Create a registry from an ordered list of generators
    pub fn new(generators: Vec<Arc<dyn ExportGenerator>>) -> Self {
        Self { generators }
    }

    /// Create a registry holding the built-in JSON and CSV generators
    pub fn with_builtins() -> Self {
        Self::new(vec![Arc::new(JsonGenerator), Arc::new(CsvGenerator)])
    }

    /// Append a generator; later registrations lose ties to earlier ones
    pub fn register(&mut self, generator: Arc<dyn ExportGenerator>) {
        self.generators.push(generator);
    }

    /// Resolve the first generator claiming support for the descriptor
    pub fn resolve(&self, descriptor: &ExportDescriptor) -> Result<Arc<dyn ExportGenerator>> {
        self.generators
            .iter()
            .find(|g| g.supports(descriptor))
            .cloned()
            .ok_or_else(|| Error::NoGeneratorFound {
                file_type: descriptor.file_type,
                filename: descriptor.filename.clone(),
            })
    }

    /// Number of registered generators
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileKind;

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

    /// Generator that claims everything, for ordering tests
    struct GreedyGenerator(&'static str);

    #[async_trait]
    impl ExportGenerator for GreedyGenerator {
        fn supports(&self, _descriptor: &ExportDescriptor) -> bool {
            true
        }

        async fn generate(
            &self,
            _data: &serde_json::Value,
            _descriptor: &ExportDescriptor,
            _sink: &mut GeneratorSink,
        ) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn builtins_cover_json_and_csv() {
        let registry = GeneratorRegistry::with_builtins();
        assert_eq!(
            registry.resolve(&descriptor(FileKind::Json)).unwrap().name(),
            "json"
        );
        assert_eq!(
            registry.resolve(&descriptor(FileKind::Csv)).unwrap().name(),
            "csv"
        );
    }

    #[test]
    fn unclaimed_descriptor_is_no_generator_found() {
        let registry = GeneratorRegistry::with_builtins();
        let err = registry.resolve(&descriptor(FileKind::Pdf)).unwrap_err();
        assert!(matches!(
            err,
            Error::NoGeneratorFound {
                file_type: FileKind::Pdf,
                ..
            }
        ));
    }

    #[test]
    fn registration_order_breaks_ties() {
        let registry = GeneratorRegistry::new(vec![
            Arc::new(GreedyGenerator("first")),
            Arc::new(GreedyGenerator("second")),
        ]);
        assert_eq!(
            registry.resolve(&descriptor(FileKind::Pdf)).unwrap().name(),
            "first"
        );
    }

    #[test]
    fn empty_registry_resolves_nothing() {
        let registry = GeneratorRegistry::new(vec![]);
        assert!(registry.is_empty());
        assert!(registry.resolve(&descriptor(FileKind::Json)).is_err());
    }
}
