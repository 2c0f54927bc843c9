use std::fmt;

use crate::error::StandoffError;
use crate::layer::Layer;
use crate::query::Query;
use crate::types::{LayerId, TextRange};

/// The storage contract consumed by the repository and the conversion pipeline.
/// The crate ships one reference implementation, [`crate::MemoryStore`]; relational
/// or graph-backed stores implement the same trait externally.
///
/// A store does not enforce referential integrity between annotations and their
/// targets: annotation batches may arrive before the text they anchor to is
/// written (the converter streams batches during a run and writes the text at the
/// end). Integrity is the concern of the client boundary, see
/// [`crate::TextRepository`].
pub trait TextStore {
    /// Allocate storage for a new text body and stream its content through the
    /// writer callback. Returns whatever the callback returns.
    fn add_text<R>(
        &mut self,
        id: LayerId,
        writer: impl FnOnce(&mut dyn fmt::Write) -> Result<R, StandoffError>,
    ) -> Result<R, StandoffError>;

    /// Read back all (`None`) or part of a text by half-open codepoint range
    fn read_text(&self, id: LayerId, range: Option<TextRange>) -> Result<String, StandoffError>;

    /// Length of a text in unicode codepoints
    fn text_length(&self, id: LayerId) -> Result<usize, StandoffError>;

    /// Get the layer record for an identifier
    fn layer(&self, id: LayerId) -> Result<&Layer, StandoffError>;

    /// Persist a batch of annotation layers. Batch boundaries carry no
    /// transactional meaning; all batches of a run share one commit/rollback fate.
    fn annotate(&mut self, layers: Vec<Layer>) -> Result<(), StandoffError>;

    /// Remove text bodies. Unknown ids are ignored; cascading over anchored
    /// layers is the caller's responsibility.
    fn delete_texts(&mut self, ids: &[LayerId]) -> Result<(), StandoffError>;

    /// Remove layer records (and their anchors). Unknown ids are ignored.
    fn delete_annotations(&mut self, ids: &[LayerId]) -> Result<(), StandoffError>;

    /// All layers with an anchor on the given text whose range overlaps the
    /// segment (`end > segment.start && start < segment.end`), or all layers
    /// anchored to the text when no segment is given. Ordered by annotation id.
    fn text_annotations(
        &self,
        id: LayerId,
        range: Option<TextRange>,
    ) -> Result<Vec<Layer>, StandoffError>;

    /// Evaluate a [`Query`] against this store
    fn query(&self, query: &Query) -> Result<Vec<Layer>, StandoffError>;
}

/// A store that can wrap mutations in a transaction. Every top-level repository
/// operation (including a whole XML conversion run) executes inside exactly one
/// transaction: either all of its writes become visible, or none.
pub trait TransactionalStore: TextStore {
    /// Run the body against this store; commit on `Ok`, roll back every
    /// mutation on `Err`. The error is propagated unchanged.
    fn transaction<R, F>(&mut self, body: F) -> Result<R, StandoffError>
    where
        F: FnOnce(&mut Self) -> Result<R, StandoffError>;

    /// Drain the change set accumulated by committed mutations
    fn take_changes(&mut self) -> ChangeSet;
}

/// The identifiers added and removed by one committed transaction. Handed to
/// [`crate::RepositoryListener`]s after (and only after) a successful commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub added_texts: Vec<LayerId>,
    pub added_annotations: Vec<LayerId>,
    pub removed_texts: Vec<LayerId>,
    pub removed_annotations: Vec<LayerId>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added_texts.is_empty()
            && self.added_annotations.is_empty()
            && self.removed_texts.is_empty()
            && self.removed_annotations.is_empty()
    }
}
