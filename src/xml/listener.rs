use crate::config::DEFAULT_BATCH_SIZE;
use crate::error::StandoffError;
use crate::idgen::IdentifierGenerator;
use crate::layer::{Anchor, Layer};
use crate::name::Name;
use crate::store::TextStore;
use crate::types::{LayerId, TextRange};
use crate::xml::offsets::RangeMapping;
use crate::xml::{MarkupData, MARKUP_NAMESPACE};

/// Receives the events of one conversion run. `annotation_start` fires when a
/// generator opens an annotation; `annotation_end` delivers the completed range
/// together with the data captured at the start. Text arrives in chunks, in
/// output order; the text and the annotation set are only final once `end` has
/// been delivered. Returning an error from any method aborts the conversion.
pub trait ConversionListener {
    fn start(&mut self) -> Result<(), StandoffError> {
        Ok(())
    }

    #[allow(unused_variables)]
    fn annotation_start(&mut self, offset: usize, data: &MarkupData) -> Result<(), StandoffError> {
        Ok(())
    }

    #[allow(unused_variables)]
    fn annotation_end(&mut self, range: TextRange, data: &MarkupData) -> Result<(), StandoffError> {
        Ok(())
    }

    #[allow(unused_variables)]
    fn text(&mut self, text: &str) -> Result<(), StandoffError> {
        Ok(())
    }

    #[allow(unused_variables)]
    fn map(&mut self, mapping: &RangeMapping) -> Result<(), StandoffError> {
        Ok(())
    }

    #[allow(unused_variables)]
    fn end(&mut self, length: usize) -> Result<(), StandoffError> {
        Ok(())
    }
}

/// Persists one conversion run into a [`TextStore`]: annotations are anchored
/// to the new base text and flushed in batches as the run progresses, the text
/// itself is written through the store's writer callback at document end,
/// followed by the base layer record. Identifiers come from the supplied
/// generator.
///
/// Batches are purely a resource-usage optimization; the listener is expected
/// to run inside one store transaction, so all batches share one commit or
/// rollback fate.
pub struct StoringListener<'a, S: TextStore, G: IdentifierGenerator> {
    store: &'a mut S,
    ids: &'a G,
    text_id: LayerId,
    name: Name,
    batch_size: usize,
    batch: Vec<Layer>,
    text: String,
}

impl<'a, S: TextStore, G: IdentifierGenerator> StoringListener<'a, S, G> {
    pub fn new(store: &'a mut S, ids: &'a G, text_id: LayerId) -> Self {
        Self {
            store,
            ids,
            text_id,
            name: Name::new(Some(MARKUP_NAMESPACE), "document"),
            batch_size: DEFAULT_BATCH_SIZE,
            batch: Vec::new(),
            text: String::new(),
        }
    }

    /// Name for the base layer record of the converted document
    pub fn with_name(mut self, name: Name) -> Self {
        self.name = name;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// The id of the base text this run persists to
    pub fn text_id(&self) -> LayerId {
        self.text_id
    }

    fn flush(&mut self) -> Result<(), StandoffError> {
        if !self.batch.is_empty() {
            self.store.annotate(std::mem::take(&mut self.batch))?;
        }
        Ok(())
    }
}

impl<S: TextStore, G: IdentifierGenerator> ConversionListener for StoringListener<'_, S, G> {
    fn annotation_end(&mut self, range: TextRange, data: &MarkupData) -> Result<(), StandoffError> {
        let id = self.ids.next()?;
        let payload = serde_json::to_value(data)
            .map_err(|_| StandoffError::OtherError("annotation data is not serializable"))?;
        self.batch.push(Layer::new(
            id,
            data.name().clone(),
            [Anchor::new(self.text_id, range)],
            payload,
        ));
        if self.batch.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), StandoffError> {
        self.text.push_str(text);
        Ok(())
    }

    fn end(&mut self, _length: usize) -> Result<(), StandoffError> {
        let content = std::mem::take(&mut self.text);
        self.store.add_text(self.text_id, |writer| {
            writer
                .write_str(&content)
                .map_err(|e| StandoffError::WriteError(e, "writing converted text"))
        })?;
        self.store.annotate(vec![Layer::new(
            self.text_id,
            self.name.clone(),
            std::iter::empty::<Anchor>(),
            serde_json::Value::Null,
        )])?;
        self.flush()
    }
}
