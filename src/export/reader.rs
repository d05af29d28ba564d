//! Streaming element reader.
//!
//! Pull-based iteration over the top-level elements of an OSM XML
//! document. The underlying parse visits every event, but only elements
//! whose kind is in the caller-supplied set are assembled and yielded;
//! the event buffer is cleared after every event, so memory stays bounded
//! by the size of one element rather than the whole document.
//!
//! The sequence is finite and non-restartable. Malformed markup is fatal:
//! the iterator yields the error once and then fuses, since a corrupt
//! parse position cannot be trusted to resynchronize.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{ExportError, ExportResult};
use crate::export::types::{Element, ElementKind, RawTag};

/// Lazily yields fully populated [`Element`]s from an XML source.
///
/// Holds the source open for the lifetime of the sequence; the handle is
/// released when the reader is dropped.
pub struct ElementReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    wanted: HashSet<ElementKind>,
    done: bool,
}

impl ElementReader<BufReader<File>> {
    /// Open a file and stream elements from it.
    pub fn from_path(path: impl AsRef<Path>) -> ExportResult<Self> {
        let file = File::open(path)?;
        Ok(ElementReader::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> ElementReader<R> {
    /// Stream elements from any buffered source. Yields nodes and ways by
    /// default; relations are parsed over but never yielded.
    pub fn from_reader(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);

        ElementReader {
            reader,
            buf: Vec::new(),
            wanted: [ElementKind::Node, ElementKind::Way].into_iter().collect(),
            done: false,
        }
    }

    /// Restrict the yielded elements to the given kinds.
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ElementKind>) -> Self {
        self.wanted = kinds.into_iter().collect();
        self
    }

    /// Advance the parse until the next wanted element completes, or the
    /// document ends.
    fn read_next(&mut self) -> ExportResult<Option<Element>> {
        let mut current: Option<Element> = None;

        loop {
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|e| ExportError::xml(self.reader.buffer_position(), e))?;
            let position = self.reader.buffer_position();

            match event {
                Event::Start(e) => {
                    if let Some(kind) = wanted_kind(&self.wanted, e.name().as_ref()) {
                        let mut element = Element::new(kind);
                        element.attributes = read_attributes(&e, position)?;
                        current = Some(element);
                    } else if let Some(element) = current.as_mut() {
                        read_child(element, &e, position)?;
                    }
                }
                Event::Empty(e) => {
                    if let Some(kind) = wanted_kind(&self.wanted, e.name().as_ref()) {
                        // Self-closing top-level element, complete as-is.
                        let mut element = Element::new(kind);
                        element.attributes = read_attributes(&e, position)?;
                        self.buf.clear();
                        return Ok(Some(element));
                    } else if let Some(element) = current.as_mut() {
                        read_child(element, &e, position)?;
                    }
                }
                Event::End(e) => {
                    let closes_current = current
                        .as_ref()
                        .map(|el| el.kind.as_str().as_bytes() == e.name().as_ref())
                        .unwrap_or(false);
                    if closes_current {
                        self.buf.clear();
                        return Ok(current.take());
                    }
                }
                Event::Eof => return Ok(None),
                // Declarations, comments and whitespace carry no elements.
                _ => {}
            }

            // Nothing borrows the buffer across iterations; clearing it here
            // is what keeps memory usage bounded by one element.
            self.buf.clear();
        }
    }
}

impl<R: BufRead> Iterator for ElementReader<R> {
    type Item = ExportResult<Element>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_next() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn wanted_kind(wanted: &HashSet<ElementKind>, name: &[u8]) -> Option<ElementKind> {
    let kind = match name {
        b"node" => ElementKind::Node,
        b"way" => ElementKind::Way,
        _ => return None,
    };
    wanted.contains(&kind).then_some(kind)
}

/// Collect an element's scalar attributes in document order.
fn read_attributes(start: &BytesStart, position: usize) -> ExportResult<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| ExportError::xml(position, e.into()))?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|e| ExportError::xml(position, e.into()))?
            .to_string();
        let value = attribute
            .unescape_value()
            .map_err(|e| ExportError::xml(position, e))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}

/// Single attribute lookup on a child element, without building the full
/// pair list.
fn child_attribute(
    start: &BytesStart,
    name: &[u8],
    position: usize,
) -> ExportResult<Option<String>> {
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| ExportError::xml(position, e.into()))?;
        if attribute.key.as_ref() == name {
            let value = attribute
                .unescape_value()
                .map_err(|e| ExportError::xml(position, e))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Record a `tag` or `nd` child on the element under construction.
fn read_child(current: &mut Element, start: &BytesStart, position: usize) -> ExportResult<()> {
    match start.name().as_ref() {
        b"tag" => {
            let key = child_attribute(start, b"k", position)?.unwrap_or_default();
            let value = child_attribute(start, b"v", position)?.unwrap_or_default();
            current.tags.push(RawTag { key, value });
        }
        b"nd" => {
            let node_ref = child_attribute(start, b"ref", position)?.ok_or_else(|| {
                ExportError::MissingAttribute {
                    element: "nd",
                    id: current.id().unwrap_or("unknown").to_string(),
                    field: "ref",
                }
            })?;
            current.node_refs.push(node_ref);
        }
        // Relation members and anything else have no relational mapping.
        _ => {}
    }
    Ok(())
}
