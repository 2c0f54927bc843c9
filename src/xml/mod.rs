//! The streaming XML-to-standoff conversion pipeline: text extraction with
//! whitespace compression, per-element/comment/PI range annotations, exact
//! source-to-text offset mapping, and the milestone/spanning generators, all
//! composed by [`XmlConverter`] over a pull-based `quick-xml` event stream.

mod context;
mod converter;
mod listener;
mod nodepath;
mod offsets;
mod stage;
mod whitespace;

pub use context::{InclusionContext, NamespaceContext};
pub use converter::{ConverterState, XmlConverter};
pub use listener::{ConversionListener, StoringListener};
pub use nodepath::NodePath;
pub use offsets::{OffsetMapper, RangeMapping};
pub use stage::{
    ConverterStage, ElementAnnotationStage, LineBreakStage, MilestoneStage, SpanningStage,
    StageEvent,
};
pub use whitespace::WhitespaceCompressor;

use serde::ser::{SerializeMap, SerializeStruct, Serializer};
use serde::Serialize;

use crate::name::Name;

/// The XML namespace, bound to the built-in `xml` prefix
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The TEI namespace, for configurations targeting TEI documents
pub const TEI_NAMESPACE: &str = "http://www.tei-c.org/ns/1.0";

/// Namespace of names synthesized by the conversion itself (comments,
/// processing instructions, the converted document's base layer)
pub const MARKUP_NAMESPACE: &str = "urn:standoff:xml";

/// One open element as seen by the conversion pipeline: its resolved qualified
/// name and its attributes (namespace declarations already stripped).
#[derive(Debug, Clone, PartialEq)]
pub struct ElementFrame {
    name: Name,
    attributes: Vec<(Name, String)>,
}

impl ElementFrame {
    pub fn new(name: Name, attributes: Vec<(Name, String)>) -> Self {
        Self { name, attributes }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn attributes(&self) -> &[(Name, String)] {
        &self.attributes
    }

    /// Look up an attribute value by its full qualified name
    pub fn attribute(&self, name: &Name) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    /// Look up an attribute value by local name only, regardless of namespace
    pub fn attribute_local(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr.local_name() == local_name)
            .map(|(_, value)| value.as_str())
    }
}

/// The payload captured for one annotation by a generator stage: the qualified
/// name, the attributes, and (when enabled) the structural node path. This is
/// what `annotation_start`/`annotation_end` events carry; the storing listener
/// serializes it into the layer's opaque data payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupData {
    name: Name,
    attributes: Vec<(Name, String)>,
    node: Option<NodePath>,
}

impl MarkupData {
    pub fn new(name: Name, attributes: Vec<(Name, String)>, node: Option<NodePath>) -> Self {
        Self {
            name,
            attributes,
            node,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn attributes(&self) -> &[(Name, String)] {
        &self.attributes
    }

    /// The structural node path, when node-path tracking is enabled
    pub fn node(&self) -> Option<&NodePath> {
        self.node.as_ref()
    }

    pub fn attribute_local(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr.local_name() == local_name)
            .map(|(_, value)| value.as_str())
    }
}

impl Serialize for MarkupData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct Attributes<'a>(&'a [(Name, String)]);

        impl Serialize for Attributes<'_> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (name, value) in self.0 {
                    map.serialize_entry(&name.to_string(), value)?;
                }
                map.end()
            }
        }

        let fields = 2 + usize::from(self.node.is_some());
        let mut state = serializer.serialize_struct("MarkupData", fields)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("attributes", &Attributes(&self.attributes))?;
        if let Some(node) = &self.node {
            state.serialize_field("node", node)?;
        }
        state.end()
    }
}
