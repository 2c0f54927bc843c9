use crate::layer::Layer;
use crate::name::Name;
use crate::types::{LayerId, TextRange};

/// A query over annotation layers, expressed as one closed union. Every storage
/// backend interprets the same `Query` value with its own evaluation function
/// (the in-memory interpreter is [`Query::test`]; a relational backend would
/// translate the same tree to SQL, a search backend to index queries).
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Matches every layer
    Any,
    /// Matches nothing
    None,
    And(Vec<Query>),
    Or(Vec<Query>),
    /// Matches layers with exactly this qualified name
    NameEquals(Name),
    /// Matches layers with an anchor whose range overlaps the given range
    RangeOverlaps(TextRange),
    /// Matches layers with an anchor whose range lies fully inside the given range
    RangeEncloses(TextRange),
    /// Matches layers with an anchor of exactly the given length
    RangeLength(usize),
    /// Matches layers anchored (directly) to the given target
    TargetIs(LayerId),
    /// Matches the single layer with this identifier
    LayerIdentity(LayerId),
}

impl Query {
    /// The in-memory interpretation of the query: test a single layer.
    pub fn test(&self, layer: &Layer) -> bool {
        match self {
            Self::Any => true,
            Self::None => false,
            Self::And(queries) => queries.iter().all(|q| q.test(layer)),
            Self::Or(queries) => queries.iter().any(|q| q.test(layer)),
            Self::NameEquals(name) => layer.name() == name,
            Self::RangeOverlaps(range) => {
                layer.anchors().iter().any(|a| range.overlaps(&a.range()))
            }
            Self::RangeEncloses(range) => {
                layer.anchors().iter().any(|a| range.encloses(&a.range()))
            }
            Self::RangeLength(length) => layer.anchors().iter().any(|a| a.range().len() == *length),
            Self::TargetIs(target) => layer.anchors().iter().any(|a| a.target() == *target),
            Self::LayerIdentity(id) => layer.id() == *id,
        }
    }
}
