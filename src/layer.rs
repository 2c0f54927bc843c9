use std::cmp::Ordering;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use smallvec::SmallVec;

use crate::name::Name;
use crate::types::{LayerId, TextRange};

/// An anchor binds an annotation layer to a range of some target text.
/// The target is referenced purely by id; it may itself be an annotation layer,
/// which is what makes recursive stand-off annotation (layers over layers) possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Anchor {
    target: LayerId,
    range: TextRange,
}

impl Anchor {
    pub fn new(target: LayerId, range: TextRange) -> Self {
        Self { target, range }
    }

    pub fn target(&self) -> LayerId {
        self.target
    }

    pub fn range(&self) -> TextRange {
        self.range
    }
}

impl Ord for Anchor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.target
            .cmp(&other.target)
            .then_with(|| self.range.cmp(&other.range))
    }
}

impl PartialOrd for Anchor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A layer is a named, optionally data-bearing annotation. Every layer is at the
/// same time a text: it has readable content and can in turn be the anchor target
/// of other layers. A layer with an empty anchor set is a *base text*, a root of
/// the anchoring forest; all other layers must carry at least one anchor.
///
/// Layers are immutable once stored; they are created through
/// [`crate::TextRepository::add`] or emitted by the XML conversion pipeline, and
/// removed by [`crate::TextRepository::delete`], which cascades over everything
/// (transitively) anchored to the deleted layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    id: LayerId,
    name: Name,
    anchors: SmallVec<[Anchor; 1]>,
    data: serde_json::Value,
}

impl Layer {
    pub fn new(
        id: LayerId,
        name: Name,
        anchors: impl IntoIterator<Item = Anchor>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id,
            name,
            anchors: anchors.into_iter().collect(),
            data,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// The opaque data payload attached to this layer
    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }

    /// A base text is a layer without anchors, a root of the anchoring forest
    pub fn is_base(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Returns the anchors of this layer that target the given text
    pub fn anchors_on(&self, target: LayerId) -> impl Iterator<Item = &Anchor> {
        self.anchors.iter().filter(move |a| a.target == target)
    }
}

impl Serialize for Layer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Layer", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("anchors", self.anchors.as_slice())?;
        state.serialize_field("data", &self.data)?;
        state.end()
    }
}
