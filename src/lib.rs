//! # Osmelt - OSM Relational Export Toolkit
//!
//! A library for streaming an OpenStreetMap XML extract into a normalized
//! relational export: five correlated CSV tables holding node attributes,
//! node tags, way attributes, way-node references and way tags.
//!
//! ## Modules
//!
//! - **export**: the streaming pipeline (reader, normalizers, shaper,
//!   writer) plus read-only audits
//! - **schema**: optional structural validation of shaped records
//!
//! ## Quick Start
//!
//! ```rust
//! use osmelt::{ElementReader, ExportConfig, TableWriter};
//!
//! # fn main() -> osmelt::ExportResult<()> {
//! let xml = r#"<osm><node id="1" lat="51.5" lon="-3.2"/></osm>"#;
//! let reader = ElementReader::from_reader(xml.as_bytes());
//!
//! let mut nodes = Vec::new();
//! let mut node_tags = Vec::new();
//! let mut ways = Vec::new();
//! let mut way_nodes = Vec::new();
//! let mut way_tags = Vec::new();
//! let mut writer = TableWriter::from_writers(
//!     &mut nodes,
//!     &mut node_tags,
//!     &mut ways,
//!     &mut way_nodes,
//!     &mut way_tags,
//!     false,
//! )?;
//!
//! let stats = osmelt::export_osm(reader, &mut writer, &ExportConfig::default())?;
//! assert_eq!(stats.nodes, 1);
//! # Ok(())
//! # }
//! ```
//!
//! Processing is strictly sequential and pull-based: the reader suspends
//! after each element until it has been shaped, optionally validated and
//! written, so at most one element's data is in memory at a time. Any
//! error aborts the run; there is no per-record skip-and-continue.

use std::io::{BufRead, Write};

use tracing::debug;

pub mod error;
pub mod export;
pub mod schema;

// Re-export commonly used types for convenience
pub use error::{ExportError, ExportResult};
pub use export::normalize::{KeyNormalizer, MultiValueExpander, NormalizerRules, ValueNormalizer};
pub use export::reader::ElementReader;
pub use export::shaper::RecordShaper;
pub use export::types::{Element, ElementKind, ExportConfig, ShapedElement};
pub use export::writer::TableWriter;
pub use schema::{ExportSchema, SchemaValidator};

/// Row counts accumulated over one export run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportStats {
    /// Elements yielded by the reader.
    pub elements: u64,
    /// Node attribute rows written.
    pub nodes: u64,
    /// Way attribute rows written.
    pub ways: u64,
    /// Tag rows written, both tables combined.
    pub tag_rows: u64,
    /// Way-node reference rows written.
    pub way_node_rows: u64,
}

impl ExportStats {
    fn tally(&mut self, element: &ShapedElement) {
        self.elements += 1;
        match element {
            ShapedElement::Node { tags, .. } => {
                self.nodes += 1;
                self.tag_rows += tags.len() as u64;
            }
            ShapedElement::Way { nodes, tags, .. } => {
                self.ways += 1;
                self.way_node_rows += nodes.len() as u64;
                self.tag_rows += tags.len() as u64;
            }
        }
    }
}

/// Main entry point: stream elements from `reader` into `writer`.
///
/// Each element is shaped, schema-checked when `config.validate` is set,
/// and written before the next one is pulled. All destinations are
/// flushed before returning. The first error of any kind aborts the run.
pub fn export_osm<R: BufRead, W: Write>(
    reader: ElementReader<R>,
    writer: &mut TableWriter<W>,
    config: &ExportConfig,
) -> ExportResult<ExportStats> {
    let shaper = RecordShaper::new(&NormalizerRules::default());
    let validator = config.validate.then(SchemaValidator::default);
    let mut stats = ExportStats::default();

    for element in reader {
        let element = element?;
        let shaped = shaper.shape(&element)?;

        if let Some(validator) = &validator {
            validator.validate(&shaped)?;
        }

        writer.write(&shaped)?;
        stats.tally(&shaped);
        debug!(element_id = shaped.id(), elements = stats.elements, "element written");
    }

    writer.flush()?;
    Ok(stats)
}
