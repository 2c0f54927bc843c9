use std::cmp::Ordering;
use std::fmt;

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use smallvec::{smallvec, SmallVec};

/// The structural coordinate of an XML node in document order: one sibling
/// counter per depth level, counted along the child axis. Used to order and
/// align annotations that share the same text offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath {
    components: SmallVec<[usize; 8]>,
}

impl NodePath {
    /// The path at stream start, before any element was seen
    pub fn new() -> Self {
        Self {
            components: smallvec![1],
        }
    }

    /// Enter an element: the element consumes the next sibling slot, then
    /// descends into first-child position
    pub fn enter_element(&mut self) {
        if let Some(last) = self.components.last_mut() {
            *last += 1;
        }
        self.components.push(1);
    }

    /// Leave an element
    pub fn leave_element(&mut self) {
        self.components.pop();
    }

    /// Leaf content (a text run, comment, or processing instruction) consumes
    /// one sibling slot without descending
    pub fn visit_leaf(&mut self) {
        if let Some(last) = self.components.last_mut() {
            *last += 1;
        }
    }

    pub fn components(&self) -> &[usize] {
        &self.components
    }

    pub fn depth(&self) -> usize {
        self.components.len()
    }
}

impl Ord for NodePath {
    /// Compare component-by-component from the root. When one path is a strict
    /// prefix of the other, the deeper path sorts after it: at an equal text
    /// offset it is structurally later in document order.
    fn cmp(&self, other: &Self) -> Ordering {
        for (own, others) in self.components.iter().zip(other.components.iter()) {
            match own.cmp(others) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.components.len().cmp(&other.components.len())
    }
}

impl PartialOrd for NodePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for component in self.components.iter() {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl Serialize for NodePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.components.len()))?;
        for component in self.components.iter() {
            seq.serialize_element(component)?;
        }
        seq.end()
    }
}

impl Default for NodePath {
    fn default() -> Self {
        Self::new()
    }
}
