//! Pre-export audits.
//!
//! Read-only passes over a source file used to size up a new extract
//! before running the export: how many of which elements it holds, which
//! tag keys occur where, and which street names end in an unexpected
//! street type. Audits never mutate anything and share no state with the
//! export pipeline.

use std::collections::{BTreeMap, BTreeSet};
use std::io::BufRead;

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use serde::Serialize;

use crate::error::{ExportError, ExportResult};
use crate::export::reader::ElementReader;

/// The trailing word of a street name, optional dot included.
static STREET_TYPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\S+\.?$").unwrap());

/// Street types that need no attention in an audit report.
pub const EXPECTED_STREET_TYPES: [&str; 21] = [
    "Close", "Crescent", "Green", "Grove", "Park", "Rise", "View", "Walk", "Way", "Street",
    "Avenue", "Boulevard", "Drive", "Court", "Place", "Square", "Lane", "Road", "Trail",
    "Parkway", "Commons",
];

/// Element and tag-key frequencies over one source file.
#[derive(Debug, Default, Serialize)]
pub struct TagAudit {
    /// Count per element name, children included.
    pub element_counts: BTreeMap<String, u64>,

    /// Count per tag key on node elements.
    pub node_tag_keys: BTreeMap<String, u64>,

    /// Count per tag key on way elements.
    pub way_tag_keys: BTreeMap<String, u64>,
}

/// Street names grouped by their unexpected street type.
#[derive(Debug, Default, Serialize)]
pub struct StreetAudit {
    pub unexpected: BTreeMap<String, BTreeSet<String>>,
}

/// Count every element name in the document, and the tag keys carried by
/// nodes and ways.
pub fn audit_tags<R: BufRead>(source: R) -> ExportResult<TagAudit> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);

    let mut audit = TagAudit::default();
    let mut buf = Vec::new();
    // Name of the enclosing node/way, if any, so tag keys are attributed
    // to the right table.
    let mut enclosing: Option<&'static str> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| ExportError::xml(reader.buffer_position(), e))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(event, Event::Empty(_));
                let name = std::str::from_utf8(e.name().as_ref())
                    .map_err(|err| ExportError::xml(reader.buffer_position(), err.into()))?
                    .to_string();

                *audit.element_counts.entry(name.clone()).or_insert(0) += 1;

                match name.as_str() {
                    "node" if !empty => enclosing = Some("node"),
                    "way" if !empty => enclosing = Some("way"),
                    "tag" => {
                        if let Some(kind) = enclosing {
                            for attribute in e.attributes() {
                                let attribute = attribute.map_err(|err| {
                                    ExportError::xml(reader.buffer_position(), err.into())
                                })?;
                                if attribute.key.as_ref() == b"k" {
                                    let key = attribute
                                        .unescape_value()
                                        .map_err(|err| {
                                            ExportError::xml(reader.buffer_position(), err)
                                        })?
                                        .into_owned();
                                    let keys = if kind == "node" {
                                        &mut audit.node_tag_keys
                                    } else {
                                        &mut audit.way_tag_keys
                                    };
                                    *keys.entry(key).or_insert(0) += 1;
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => {
                if matches!(e.name().as_ref(), b"node" | b"way") {
                    enclosing = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    Ok(audit)
}

/// Collect `addr:street` values whose trailing word is not an expected
/// street type, grouped by that word.
pub fn audit_street_types<R: BufRead>(
    source: R,
    expected: &[&str],
) -> ExportResult<StreetAudit> {
    let mut audit = StreetAudit::default();

    for element in ElementReader::from_reader(source) {
        let element = element?;
        for tag in &element.tags {
            if tag.key != "addr:street" {
                continue;
            }
            if let Some(m) = STREET_TYPE_RE.find(&tag.value) {
                let street_type = m.as_str();
                if !expected.contains(&street_type) {
                    audit
                        .unexpected
                        .entry(street_type.to_string())
                        .or_default()
                        .insert(tag.value.clone());
                }
            }
        }
    }

    Ok(audit)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<osm>
  <node id="1" lat="0" lon="0">
    <tag k="amenity" v="pub"/>
    <tag k="addr:street" v="Station Rd"/>
  </node>
  <node id="2" lat="0" lon="0"/>
  <way id="10">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="residential"/>
    <tag k="addr:street" v="High Street"/>
  </way>
  <relation id="100">
    <tag k="type" v="route"/>
  </relation>
</osm>"#;

    #[test]
    fn test_element_counts_cover_the_whole_document() {
        let audit = audit_tags(SAMPLE.as_bytes()).unwrap();
        assert_eq!(audit.element_counts["node"], 2);
        assert_eq!(audit.element_counts["way"], 1);
        assert_eq!(audit.element_counts["relation"], 1);
        assert_eq!(audit.element_counts["nd"], 2);
        assert_eq!(audit.element_counts["tag"], 5);
    }

    #[test]
    fn test_tag_keys_attributed_to_their_element() {
        let audit = audit_tags(SAMPLE.as_bytes()).unwrap();
        assert_eq!(audit.node_tag_keys["amenity"], 1);
        assert_eq!(audit.node_tag_keys["addr:street"], 1);
        assert_eq!(audit.way_tag_keys["highway"], 1);
        // Relation tags belong to neither table.
        assert!(!audit.node_tag_keys.contains_key("type"));
        assert!(!audit.way_tag_keys.contains_key("type"));
    }

    #[test]
    fn test_street_audit_flags_unexpected_types_only() {
        let audit = audit_street_types(SAMPLE.as_bytes(), &EXPECTED_STREET_TYPES).unwrap();
        // "High Street" ends in an expected type; "Station Rd" does not.
        assert_eq!(audit.unexpected.len(), 1);
        assert!(audit.unexpected["Rd"].contains("Station Rd"));
    }
}
