//! Record shaping.
//!
//! [`RecordShaper`] projects one [`Element`] into its relational form: an
//! attribute record, the ordered way-node references, and the tag rows
//! after key normalization, multi-value expansion and value normalization.
//! Shaping one element at a time is what guarantees the referential
//! invariant downstream: every child row it emits carries the id of the
//! attribute record emitted alongside it.

use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::export::normalize::{
    KeyNormalizer, MultiValueExpander, NormalizerRules, ValueNormalizer,
};
use crate::export::types::{
    Element, ElementKind, NodeRecord, ShapedElement, TagRecord, WayNodeRecord, WayRecord,
};

/// Shapes elements into correlated attribute, tag and way-node records.
pub struct RecordShaper {
    keys: KeyNormalizer,
    values: ValueNormalizer,
    expander: MultiValueExpander,
}

impl RecordShaper {
    pub fn new(rules: &NormalizerRules) -> Self {
        RecordShaper {
            keys: KeyNormalizer::new(rules),
            values: ValueNormalizer::new(rules),
            expander: MultiValueExpander::new(rules),
        }
    }

    /// Project an element into its relational records.
    ///
    /// Attribute projection is null-on-absence; the element id is the one
    /// structural exception, since child rows cannot be correlated
    /// without it.
    pub fn shape(&self, element: &Element) -> ExportResult<ShapedElement> {
        let id = element
            .id()
            .ok_or_else(|| ExportError::MissingAttribute {
                element: element.kind.as_str(),
                id: "unknown".to_string(),
                field: "id",
            })?
            .to_string();

        let tags = self.shape_tags(&id, element);

        match element.kind {
            ElementKind::Node => Ok(ShapedElement::Node {
                record: NodeRecord {
                    id,
                    lat: owned(element.attribute("lat")),
                    lon: owned(element.attribute("lon")),
                    user: owned(element.attribute("user")),
                    uid: owned(element.attribute("uid")),
                    version: owned(element.attribute("version")),
                    changeset: owned(element.attribute("changeset")),
                    timestamp: owned(element.attribute("timestamp")),
                },
                tags,
            }),
            ElementKind::Way => {
                let nodes = element
                    .node_refs
                    .iter()
                    .enumerate()
                    .map(|(position, node_ref)| WayNodeRecord {
                        id: id.clone(),
                        node_id: node_ref.clone(),
                        position: position as u64,
                    })
                    .collect();

                Ok(ShapedElement::Way {
                    record: WayRecord {
                        id,
                        user: owned(element.attribute("user")),
                        uid: owned(element.attribute("uid")),
                        version: owned(element.attribute("version")),
                        changeset: owned(element.attribute("changeset")),
                        timestamp: owned(element.attribute("timestamp")),
                    },
                    nodes,
                    tags,
                })
            }
        }
    }

    /// Run every child tag through the normalization chain.
    ///
    /// Order matters: the key is normalized first (and may drop the tag),
    /// multi-value expansion fans the raw value out per share, each share
    /// is value-normalized against the full normalized key, and the
    /// namespace split happens last, on the normalized key.
    fn shape_tags(&self, id: &str, element: &Element) -> Vec<TagRecord> {
        let mut records = Vec::new();

        for raw in &element.tags {
            let key = match self.keys.normalize(&raw.key) {
                Some(key) => key,
                None => {
                    debug!(element_id = id, key = %raw.key, "dropping ignored tag");
                    continue;
                }
            };

            for share in self.expander.expand(&key, &raw.value) {
                let value = self.values.normalize(&key, share);
                let (tag_type, subkey) = split_namespace(&key);
                records.push(TagRecord {
                    id: id.to_string(),
                    key: subkey,
                    value,
                    tag_type,
                });
            }
        }

        records
    }
}

/// Partition a normalized key on its first separator into
/// `(namespace type, stored key)`; keys without a separator bucket as
/// `regular`.
fn split_namespace(key: &str) -> (String, String) {
    match key.split_once(':') {
        Some((prefix, rest)) => (prefix.to_string(), rest.to_string()),
        None => ("regular".to_string(), key.to_string()),
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(|v| v.to_string())
}
