use serde::Serialize;

/// The kinds of top-level OSM elements the pipeline yields.
///
/// Relations exist in the source format but have no relational mapping
/// here; the reader parses over them without yielding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
}

impl ElementKind {
    /// The element's tag name in the source document.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
        }
    }
}

/// A raw key/value annotation attached to an element, exactly as it
/// appeared in the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTag {
    pub key: String,
    pub value: String,
}

/// One fully populated top-level element from the source document.
///
/// This is the pipeline's own abstraction over the parsed markup: tag
/// name, ordered attribute pairs and ordered typed children, decoupled
/// from any particular XML library. An `Element` and everything it owns
/// live only for the duration of processing one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,

    /// Scalar attributes in document order.
    pub attributes: Vec<(String, String)>,

    /// Child `tag` elements in document order.
    pub tags: Vec<RawTag>,

    /// For ways, the referenced node ids of the `nd` children in document
    /// order. Empty for nodes.
    pub node_refs: Vec<String>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Element {
            kind,
            attributes: Vec::new(),
            tags: Vec::new(),
            node_refs: Vec::new(),
        }
    }

    /// Look up a scalar attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The element's identifier attribute, if present.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }
}

/// One row of the node attribute table.
///
/// Field declaration order is the CSV column order. Missing source
/// attributes are `None` and serialize as empty cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub id: String,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub user: Option<String>,
    pub uid: Option<String>,
    pub version: Option<String>,
    pub changeset: Option<String>,
    pub timestamp: Option<String>,
}

/// One row of the way attribute table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WayRecord {
    pub id: String,
    pub user: Option<String>,
    pub uid: Option<String>,
    pub version: Option<String>,
    pub changeset: Option<String>,
    pub timestamp: Option<String>,
}

/// One row of a tag table (shared by the node and way tag tables).
///
/// `key` is the normalized key after the namespace split; `tag_type` is
/// the namespace prefix, or `regular` when the key had none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRecord {
    pub id: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub tag_type: String,
}

/// One row of the way-node reference table.
///
/// `position` is zero-based and strictly increasing in document order for
/// a given way; reconstructing way geometry depends on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WayNodeRecord {
    pub id: String,
    pub node_id: String,
    pub position: u64,
}

/// The relational projection of one element: an attribute record plus its
/// correlated child rows. Every child row carries the parent record's id.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapedElement {
    Node {
        record: NodeRecord,
        tags: Vec<TagRecord>,
    },
    Way {
        record: WayRecord,
        nodes: Vec<WayNodeRecord>,
        tags: Vec<TagRecord>,
    },
}

impl ShapedElement {
    /// The id shared by the attribute record and all of its child rows.
    pub fn id(&self) -> &str {
        match self {
            ShapedElement::Node { record, .. } => &record.id,
            ShapedElement::Way { record, .. } => &record.id,
        }
    }

    /// The shaped tag rows, whichever kind of element this is.
    pub fn tags(&self) -> &[TagRecord] {
        match self {
            ShapedElement::Node { tags, .. } => tags,
            ShapedElement::Way { tags, .. } => tags,
        }
    }
}

impl NodeRecord {
    /// Field name/value pairs in column order, for schema validation.
    pub fn fields(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("id", Some(self.id.clone())),
            ("lat", self.lat.clone()),
            ("lon", self.lon.clone()),
            ("user", self.user.clone()),
            ("uid", self.uid.clone()),
            ("version", self.version.clone()),
            ("changeset", self.changeset.clone()),
            ("timestamp", self.timestamp.clone()),
        ]
    }
}

impl WayRecord {
    /// Field name/value pairs in column order, for schema validation.
    pub fn fields(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("id", Some(self.id.clone())),
            ("user", self.user.clone()),
            ("uid", self.uid.clone()),
            ("version", self.version.clone()),
            ("changeset", self.changeset.clone()),
            ("timestamp", self.timestamp.clone()),
        ]
    }
}

impl TagRecord {
    /// Field name/value pairs in column order, for schema validation.
    pub fn fields(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("id", Some(self.id.clone())),
            ("key", Some(self.key.clone())),
            ("value", Some(self.value.clone())),
            ("type", Some(self.tag_type.clone())),
        ]
    }
}

impl WayNodeRecord {
    /// Field name/value pairs in column order, for schema validation.
    pub fn fields(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("id", Some(self.id.clone())),
            ("node_id", Some(self.node_id.clone())),
            ("position", Some(self.position.to_string())),
        ]
    }
}

/// Configuration for one export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Schema-check each shaped record before writing. Roughly a 10x
    /// throughput cost; a violation aborts the run.
    pub validate: bool,

    /// Write a header row per destination. Headers get in the way when
    /// bulk-loading into a pre-existing table schema, so this is off by
    /// default.
    pub header: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            validate: false,
            header: false,
        }
    }
}
