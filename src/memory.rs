use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::StandoffError;
use crate::layer::Layer;
use crate::query::Query;
use crate::store::{ChangeSet, TextStore, TransactionalStore};
use crate::types::{LayerId, TextRange};

/// The in-memory reference implementation of [`TextStore`]. Texts and layer
/// records live in id-indexed arenas; anchors refer to their targets purely by
/// id, so the layer-as-text cycle never materializes as an ownership cycle.
///
/// Transactions are implemented by snapshotting: the store is cloned before the
/// body runs and restored wholesale on failure. That is adequate for an
/// in-memory store; persistent backends use their native transaction mechanism.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Text content per layer, in unicode codepoints
    texts: BTreeMap<LayerId, String>,

    /// The layer records (name, anchors, data payload)
    layers: BTreeMap<LayerId, Layer>,

    /// Reverse index: target layer -> layers anchored on it
    targets: BTreeMap<LayerId, Vec<LayerId>>,

    /// Mutations since the last [`TransactionalStore::take_changes`]
    changes: ChangeSet,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Does any record (text body or layer) exist under this id?
    pub fn contains(&self, id: LayerId) -> bool {
        self.texts.contains_key(&id) || self.layers.contains_key(&id)
    }

    /// Number of layer records held
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() && self.texts.is_empty()
    }

    /// Slice a text by codepoint range, converting to byte offsets on the fly
    fn codepoint_slice<'t>(
        text: &'t str,
        range: &TextRange,
    ) -> Result<&'t str, StandoffError> {
        let mut start_byte = None;
        let mut end_byte = None;
        for (charpos, (bytepos, _)) in text.char_indices().enumerate() {
            if charpos == range.start() {
                start_byte = Some(bytepos);
            }
            if charpos == range.end() {
                end_byte = Some(bytepos);
                break;
            }
        }
        let length = text.chars().count();
        if start_byte.is_none() && range.start() == length {
            start_byte = Some(text.len());
        }
        if end_byte.is_none() && range.end() == length {
            end_byte = Some(text.len());
        }
        match (start_byte, end_byte) {
            (Some(start), Some(end)) => Ok(&text[start..end]),
            _ => Err(StandoffError::InvalidRange(
                range.start(),
                range.end(),
                "range exceeds text length",
            )),
        }
    }
}

impl TextStore for MemoryStore {
    fn add_text<R>(
        &mut self,
        id: LayerId,
        writer: impl FnOnce(&mut dyn fmt::Write) -> Result<R, StandoffError>,
    ) -> Result<R, StandoffError> {
        if self.texts.contains_key(&id) {
            return Err(StandoffError::DuplicateIdError(id, "MemoryStore::add_text"));
        }
        let mut content = String::new();
        let result = writer(&mut content)?;
        self.texts.insert(id, content);
        self.changes.added_texts.push(id);
        Ok(result)
    }

    fn read_text(&self, id: LayerId, range: Option<TextRange>) -> Result<String, StandoffError> {
        let text = self
            .texts
            .get(&id)
            .ok_or(StandoffError::IdError(id, "MemoryStore::read_text"))?;
        match range {
            Some(range) => Ok(Self::codepoint_slice(text, &range)?.to_string()),
            None => Ok(text.clone()),
        }
    }

    fn text_length(&self, id: LayerId) -> Result<usize, StandoffError> {
        let text = self
            .texts
            .get(&id)
            .ok_or(StandoffError::IdError(id, "MemoryStore::text_length"))?;
        Ok(text.chars().count())
    }

    fn layer(&self, id: LayerId) -> Result<&Layer, StandoffError> {
        self.layers
            .get(&id)
            .ok_or(StandoffError::IdError(id, "MemoryStore::layer"))
    }

    fn annotate(&mut self, layers: Vec<Layer>) -> Result<(), StandoffError> {
        for layer in layers {
            let id = layer.id();
            if self.layers.contains_key(&id) {
                return Err(StandoffError::DuplicateIdError(id, "MemoryStore::annotate"));
            }
            for anchor in layer.anchors() {
                self.targets.entry(anchor.target()).or_default().push(id);
            }
            self.layers.insert(id, layer);
            self.changes.added_annotations.push(id);
        }
        Ok(())
    }

    fn delete_texts(&mut self, ids: &[LayerId]) -> Result<(), StandoffError> {
        for id in ids {
            if self.texts.remove(id).is_some() {
                self.changes.removed_texts.push(*id);
            }
        }
        Ok(())
    }

    fn delete_annotations(&mut self, ids: &[LayerId]) -> Result<(), StandoffError> {
        for id in ids {
            if let Some(layer) = self.layers.remove(id) {
                for anchor in layer.anchors() {
                    if let Some(anchored) = self.targets.get_mut(&anchor.target()) {
                        anchored.retain(|a| a != id);
                    }
                }
                self.changes.removed_annotations.push(*id);
            }
        }
        Ok(())
    }

    fn text_annotations(
        &self,
        id: LayerId,
        range: Option<TextRange>,
    ) -> Result<Vec<Layer>, StandoffError> {
        // BTreeSet gives us the contract's annotation-id ordering and deduplicates
        // layers that anchor the same text more than once
        let mut selected: BTreeSet<LayerId> = BTreeSet::new();
        if let Some(anchored) = self.targets.get(&id) {
            for annotation_id in anchored {
                let layer = match self.layers.get(annotation_id) {
                    Some(layer) => layer,
                    None => continue,
                };
                let matches = match &range {
                    Some(range) => layer.anchors_on(id).any(|a| range.overlaps(&a.range())),
                    None => true,
                };
                if matches {
                    selected.insert(*annotation_id);
                }
            }
        }
        Ok(selected
            .into_iter()
            .filter_map(|id| self.layers.get(&id).cloned())
            .collect())
    }

    fn query(&self, query: &Query) -> Result<Vec<Layer>, StandoffError> {
        Ok(self
            .layers
            .values()
            .filter(|layer| query.test(layer))
            .cloned()
            .collect())
    }
}

impl TransactionalStore for MemoryStore {
    fn transaction<R, F>(&mut self, body: F) -> Result<R, StandoffError>
    where
        F: FnOnce(&mut Self) -> Result<R, StandoffError>,
    {
        let snapshot = self.clone();
        match body(self) {
            Ok(result) => Ok(result),
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.changes)
    }
}
