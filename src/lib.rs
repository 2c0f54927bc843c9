/*
    Standoff Text Library

        Licensed under the GNU General Public License v3

        https://github.com/annotation/standoff-rust
*/

//! ## Introduction
//!
//! This library models text documents annotated with range-based *stand-off*
//! markup: arbitrary spans of a base text are tagged with named, attributed
//! layers, and layers can themselves be anchored to other layers recursively.
//! Because a layer is simultaneously an annotation and a text, overlapping and
//! non-hierarchical structures — the reason stand-off annotation exists — come
//! for free.
//!
//! **What can you do with this library?**
//!
//! * Convert XML documents to stand-off form with a streaming pipeline:
//!    * Extract the character content into a flat text buffer, with whitespace
//!      compression, container-element handling, and line-break insertion.
//!    * Record every element, comment, and processing instruction as a range
//!      annotation anchored into that buffer.
//!    * Maintain an exact mapping between source-document character positions
//!      and output text positions, even across compression and insertion.
//!    * Handle TEI milestones (point markers closed by the next milestone of
//!      the same unit) and spanning elements (`spanTo`/id pairs) through a
//!      pluggable stage and listener chain.
//! * Keep texts and annotation layers in a store behind a narrow, transactional
//!   storage contract, with an in-memory reference implementation, cascading
//!   deletes, change notification, and a closed query union that every backend
//!   interprets natively.
//!
//! The conversion entry point for most users is
//! [`TextRepository::convert_xml()`]; the pipeline itself is exposed through
//! [`XmlConverter`] for custom listeners and stages.

mod config;
mod error;
mod idgen;
mod layer;
mod memory;
mod name;
mod query;
mod repository;
mod store;
mod types;
mod xml;

// Our internal crate structure is not very relevant to the outside world,
// expose all structs and traits in the root namespace, and be explicit about it:

pub use config::ConversionConfig;
pub use error::StandoffError;
pub use idgen::{BlockIdGenerator, IdentifierGenerator, MemorySequence, Sequence};
pub use layer::{Anchor, Layer};
pub use memory::MemoryStore;
pub use name::Name;
pub use query::Query;
pub use repository::{RepositoryListener, TextRepository};
pub use store::{ChangeSet, TextStore, TransactionalStore};
pub use types::{LayerId, TextRange};
pub use xml::{
    ConversionListener, ConverterStage, ConverterState, ElementAnnotationStage, ElementFrame,
    InclusionContext, LineBreakStage, MarkupData, MilestoneStage, NamespaceContext, NodePath,
    OffsetMapper, RangeMapping, SpanningStage, StageEvent, StoringListener, WhitespaceCompressor,
    XmlConverter, MARKUP_NAMESPACE, TEI_NAMESPACE, XML_NAMESPACE,
};
