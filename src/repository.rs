use std::collections::BTreeSet;

use crate::config::ConversionConfig;
use crate::error::StandoffError;
use crate::idgen::IdentifierGenerator;
use crate::layer::{Anchor, Layer};
use crate::name::Name;
use crate::query::Query;
use crate::store::{ChangeSet, TextStore, TransactionalStore};
use crate::types::{LayerId, TextRange};
use crate::xml::{ConversionListener, StoringListener, XmlConverter};

/// Notified with the change set of every committed repository transaction,
/// strictly after the commit: a listener never observes state that is later
/// rolled back.
pub trait RepositoryListener {
    fn committed(&mut self, changes: &ChangeSet);
}

/// The client boundary over a [`TransactionalStore`]: every mutating operation
/// runs inside exactly one store transaction, anchor targets are validated on
/// insert, and deletes cascade over everything transitively anchored to the
/// deleted layer (a dangling anchor is meaningless).
pub struct TextRepository<S: TransactionalStore, G: IdentifierGenerator> {
    store: S,
    ids: G,
    listeners: Vec<Box<dyn RepositoryListener>>,
}

impl<S: TransactionalStore, G: IdentifierGenerator> TextRepository<S, G> {
    pub fn new(store: S, ids: G) -> Self {
        Self {
            store,
            ids,
            listeners: Vec::new(),
        }
    }

    /// Register a listener for committed changes
    pub fn add_listener(&mut self, listener: Box<dyn RepositoryListener>) {
        self.listeners.push(listener);
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn identifiers(&self) -> &G {
        &self.ids
    }

    /// Run a transaction body against the store: commit on `Ok`, roll back on
    /// `Err`. Registered listeners are notified with the committed change set
    /// after the transaction has completed.
    pub fn execute<R, F>(&mut self, body: F) -> Result<R, StandoffError>
    where
        F: FnOnce(&mut S, &G) -> Result<R, StandoffError>,
    {
        let ids = &self.ids;
        let result = self.store.transaction(|store| body(store, ids))?;
        let changes = self.store.take_changes();
        if !changes.is_empty() {
            for listener in self.listeners.iter_mut() {
                listener.committed(&changes);
            }
        }
        Ok(result)
    }

    /// Create a new layer: a base text when `anchors` is empty, an annotation
    /// layer otherwise. Every anchor target must already exist.
    pub fn add(
        &mut self,
        name: Name,
        content: &str,
        data: serde_json::Value,
        anchors: Vec<Anchor>,
    ) -> Result<LayerId, StandoffError> {
        self.execute(move |store, ids| {
            for anchor in &anchors {
                store.layer(anchor.target()).map_err(|_| {
                    StandoffError::UnknownTarget(anchor.target(), "TextRepository::add")
                })?;
            }
            let id = ids.next()?;
            store.add_text(id, |writer| {
                writer
                    .write_str(content)
                    .map_err(|e| StandoffError::WriteError(e, "writing layer content"))
            })?;
            store.annotate(vec![Layer::new(id, name, anchors, data)])?;
            Ok(id)
        })
    }

    /// Delete a layer together with every layer (transitively) anchored to it.
    /// Returns the full set of deleted identifiers.
    pub fn delete(&mut self, id: LayerId) -> Result<Vec<LayerId>, StandoffError> {
        self.execute(move |store, _ids| {
            store.layer(id)?;
            let mut closure: BTreeSet<LayerId> = BTreeSet::new();
            closure.insert(id);
            let mut queue = vec![id];
            while let Some(target) = queue.pop() {
                for layer in store.text_annotations(target, None)? {
                    if closure.insert(layer.id()) {
                        queue.push(layer.id());
                    }
                }
            }
            let deleted: Vec<LayerId> = closure.into_iter().collect();
            store.delete_annotations(&deleted)?;
            store.delete_texts(&deleted)?;
            Ok(deleted)
        })
    }

    /// Read all or part of a layer's text content
    pub fn read(&self, id: LayerId, range: Option<TextRange>) -> Result<String, StandoffError> {
        self.store.read_text(id, range)
    }

    /// Text length of a layer in unicode codepoints
    pub fn length(&self, id: LayerId) -> Result<usize, StandoffError> {
        self.store.text_length(id)
    }

    /// Get a layer record by id
    pub fn layer(&self, id: LayerId) -> Result<Layer, StandoffError> {
        self.store.layer(id).cloned()
    }

    /// All layers anchored to the given text, optionally restricted to those
    /// overlapping a range
    pub fn annotations(
        &self,
        id: LayerId,
        range: Option<TextRange>,
    ) -> Result<Vec<Layer>, StandoffError> {
        self.store.text_annotations(id, range)
    }

    /// Evaluate a [`Query`] against the store
    pub fn query(&self, query: &Query) -> Result<Vec<Layer>, StandoffError> {
        self.store.query(query)
    }

    /// Convert an XML document to standoff form and persist the result, all
    /// inside one transaction. Returns the id of the new base text; its
    /// annotations are committed with it, or nothing is.
    pub fn convert_xml(
        &mut self,
        xml: &str,
        config: &ConversionConfig,
    ) -> Result<LayerId, StandoffError> {
        self.execute(move |store, ids| {
            let text_id = ids.next()?;
            let mut converter = XmlConverter::new(config)?;
            let mut listener =
                StoringListener::new(store, ids, text_id).with_batch_size(config.batch_size());
            let mut listeners: [&mut dyn ConversionListener; 1] = [&mut listener];
            converter.convert(xml, &mut listeners)?;
            Ok(text_id)
        })
    }
}
