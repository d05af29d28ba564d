//! Streaming OSM export - one element at a time into relational tables.
//!
//! The pipeline runs reader -> shaper -> (optional validation) -> writer,
//! with the shaper invoking key normalization, multi-value expansion and
//! value normalization per tag. Stages communicate only through the
//! [`types::Element`] and [`types::ShapedElement`] values, so each stage
//! is testable on its own.

pub mod audit;
pub mod normalize;
pub mod reader;
pub mod shaper;
pub mod types;
pub mod writer;

pub use normalize::{KeyNormalizer, MultiValueExpander, NormalizerRules, ValueNormalizer};
pub use reader::ElementReader;
pub use shaper::RecordShaper;
pub use types::{Element, ElementKind, ExportConfig, RawTag, ShapedElement};
pub use writer::TableWriter;
