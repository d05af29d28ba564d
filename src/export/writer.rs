//! Correlated table emission.
//!
//! [`TableWriter`] owns the five output destinations for one run — node
//! attributes, node tags, way attributes, way-node references, way tags —
//! and appends each shaped element's rows to them in document order. Rows
//! are UTF-8 throughout, so non-ASCII text round-trips unchanged.
//!
//! The referential correspondence between child rows and attribute rows
//! is guaranteed upstream by shaping one element at a time; the writer
//! does not re-check it.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::ExportResult;
use crate::export::types::ShapedElement;

/// Output file names, matching the downstream table names.
pub const NODES_FILE: &str = "nodes.csv";
pub const NODE_TAGS_FILE: &str = "nodes_tags.csv";
pub const WAYS_FILE: &str = "ways.csv";
pub const WAY_NODES_FILE: &str = "ways_nodes.csv";
pub const WAY_TAGS_FILE: &str = "ways_tags.csv";

/// Column order per destination. Field order on the record structs must
/// stay in sync with these.
pub const NODE_FIELDS: [&str; 8] = [
    "id", "lat", "lon", "user", "uid", "version", "changeset", "timestamp",
];
pub const WAY_FIELDS: [&str; 6] = ["id", "user", "uid", "version", "changeset", "timestamp"];
pub const TAG_FIELDS: [&str; 4] = ["id", "key", "value", "type"];
pub const WAY_NODE_FIELDS: [&str; 3] = ["id", "node_id", "position"];

/// Writes shaped elements to five correlated CSV destinations.
pub struct TableWriter<W: Write> {
    nodes: csv::Writer<W>,
    node_tags: csv::Writer<W>,
    ways: csv::Writer<W>,
    way_nodes: csv::Writer<W>,
    way_tags: csv::Writer<W>,
}

impl TableWriter<File> {
    /// Create the five output files under `dir`, truncating any previous
    /// run's output.
    pub fn create(dir: impl AsRef<Path>, header: bool) -> ExportResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        Ok(TableWriter::from_writers(
            File::create(dir.join(NODES_FILE))?,
            File::create(dir.join(NODE_TAGS_FILE))?,
            File::create(dir.join(WAYS_FILE))?,
            File::create(dir.join(WAY_NODES_FILE))?,
            File::create(dir.join(WAY_TAGS_FILE))?,
            header,
        )?)
    }
}

impl<W: Write> TableWriter<W> {
    /// Wrap five arbitrary sinks. With `header` set, each destination
    /// gets its header row up front, even if it ends up with no data
    /// rows.
    pub fn from_writers(
        nodes: W,
        node_tags: W,
        ways: W,
        way_nodes: W,
        way_tags: W,
        header: bool,
    ) -> ExportResult<Self> {
        let mut writer = TableWriter {
            nodes: plain_writer(nodes),
            node_tags: plain_writer(node_tags),
            ways: plain_writer(ways),
            way_nodes: plain_writer(way_nodes),
            way_tags: plain_writer(way_tags),
        };

        if header {
            writer.nodes.write_record(NODE_FIELDS)?;
            writer.node_tags.write_record(TAG_FIELDS)?;
            writer.ways.write_record(WAY_FIELDS)?;
            writer.way_nodes.write_record(WAY_NODE_FIELDS)?;
            writer.way_tags.write_record(TAG_FIELDS)?;
        }

        Ok(writer)
    }

    /// Append one shaped element's rows to their destinations.
    pub fn write(&mut self, element: &ShapedElement) -> ExportResult<()> {
        match element {
            ShapedElement::Node { record, tags } => {
                self.nodes.serialize(record)?;
                for tag in tags {
                    self.node_tags.serialize(tag)?;
                }
            }
            ShapedElement::Way {
                record,
                nodes,
                tags,
            } => {
                self.ways.serialize(record)?;
                for node in nodes {
                    self.way_nodes.serialize(node)?;
                }
                for tag in tags {
                    self.way_tags.serialize(tag)?;
                }
            }
        }
        Ok(())
    }

    /// Flush all five destinations.
    pub fn flush(&mut self) -> ExportResult<()> {
        self.nodes.flush()?;
        self.node_tags.flush()?;
        self.ways.flush()?;
        self.way_nodes.flush()?;
        self.way_tags.flush()?;
        Ok(())
    }
}

/// Header emission is handled explicitly in `from_writers`, so the csv
/// writers themselves never inject one.
fn plain_writer<W: Write>(sink: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().has_headers(false).from_writer(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::types::{NodeRecord, TagRecord, WayNodeRecord, WayRecord};

    fn sample_node() -> ShapedElement {
        ShapedElement::Node {
            record: NodeRecord {
                id: "1".into(),
                lat: Some("51.48".into()),
                lon: Some("-3.18".into()),
                user: Some("alice".into()),
                uid: Some("7".into()),
                version: Some("2".into()),
                changeset: Some("11".into()),
                timestamp: Some("2016-01-01T00:00:00Z".into()),
            },
            tags: vec![TagRecord {
                id: "1".into(),
                key: "name".into(),
                value: "Tŷ Coffi".into(),
                tag_type: "regular".into(),
            }],
        }
    }

    fn sample_way() -> ShapedElement {
        ShapedElement::Way {
            record: WayRecord {
                id: "10".into(),
                user: None,
                uid: None,
                version: Some("1".into()),
                changeset: Some("12".into()),
                timestamp: None,
            },
            nodes: vec![
                WayNodeRecord {
                    id: "10".into(),
                    node_id: "1".into(),
                    position: 0,
                },
                WayNodeRecord {
                    id: "10".into(),
                    node_id: "2".into(),
                    position: 1,
                },
            ],
            tags: vec![],
        }
    }

    fn write_all(elements: &[ShapedElement], header: bool) -> [String; 5] {
        let mut bufs: [Vec<u8>; 5] = Default::default();
        {
            let [a, b, c, d, e] = &mut bufs;
            let mut writer = TableWriter::from_writers(a, b, c, d, e, header).unwrap();
            for element in elements {
                writer.write(element).unwrap();
            }
            writer.flush().unwrap();
        }
        bufs.map(|buf| String::from_utf8(buf).unwrap())
    }

    #[test]
    fn test_rows_land_in_their_tables() {
        let [nodes, node_tags, ways, way_nodes, way_tags] =
            write_all(&[sample_node(), sample_way()], false);

        assert_eq!(
            nodes,
            "1,51.48,-3.18,alice,7,2,11,2016-01-01T00:00:00Z\n"
        );
        assert_eq!(node_tags, "1,name,Tŷ Coffi,regular\n");
        // Missing way attributes serialize as empty cells, in column order.
        assert_eq!(ways, "10,,,1,12,\n");
        assert_eq!(way_nodes, "10,1,0\n10,2,1\n");
        assert_eq!(way_tags, "");
    }

    #[test]
    fn test_header_rows_are_opt_in() {
        let [nodes, node_tags, ways, way_nodes, way_tags] = write_all(&[], true);

        assert_eq!(nodes, "id,lat,lon,user,uid,version,changeset,timestamp\n");
        assert_eq!(node_tags, "id,key,value,type\n");
        assert_eq!(ways, "id,user,uid,version,changeset,timestamp\n");
        assert_eq!(way_nodes, "id,node_id,position\n");
        assert_eq!(way_tags, "id,key,value,type\n");

        let [nodes, ..] = write_all(&[], false);
        assert_eq!(nodes, "");
    }

    #[test]
    fn test_non_ascii_round_trips() {
        let [_, node_tags, ..] = write_all(&[sample_node()], false);
        assert!(node_tags.contains("Tŷ Coffi"));
    }
}
