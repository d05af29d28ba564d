//! Error types for the export pipeline.
//!
//! All pipeline stages surface failures through [`ExportError`]; conversion
//! from the underlying I/O, XML and CSV errors is automatic via `From`
//! implementations, so `?` works across stage boundaries. None of these are
//! recovered inside the pipeline — they propagate to the caller, which is
//! expected to log the error and exit non-zero.

use thiserror::Error;

/// Errors raised while streaming, shaping, validating or writing elements.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to read the input or write an output file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML markup. Fatal: a corrupt parse position cannot be
    /// trusted to resynchronize, so no partial-document recovery is made.
    #[error("malformed XML at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    /// An element lacked an attribute the relational model cannot do
    /// without (the element id, or a way child's node reference).
    #[error("{element} element ({id}) is missing required attribute '{field}'")]
    MissingAttribute {
        element: &'static str,
        id: String,
        field: &'static str,
    },

    /// A shaped record failed schema validation. Fatal when validation is
    /// enabled: schema drift means the export cannot be trusted.
    #[error("schema violation in table '{table}', field '{field}': {constraint}")]
    SchemaViolation {
        table: &'static str,
        field: String,
        constraint: String,
    },

    /// Failed to emit a CSV record.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ExportError {
    /// Wrap a quick-xml error together with the reader's byte position.
    pub fn xml(position: usize, source: quick_xml::Error) -> Self {
        ExportError::Xml { position, source }
    }
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_attribute_format() {
        let err = ExportError::MissingAttribute {
            element: "way",
            id: "4231".into(),
            field: "ref",
        };
        let msg = err.to_string();
        assert!(msg.contains("way"));
        assert!(msg.contains("4231"));
        assert!(msg.contains("ref"));
    }

    #[test]
    fn test_schema_violation_format() {
        let err = ExportError::SchemaViolation {
            table: "nodes",
            field: "lat".into(),
            constraint: "expected a float, got 'north'".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("nodes"));
        assert!(msg.contains("lat"));
        assert!(msg.contains("north"));
    }
}
