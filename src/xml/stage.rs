use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::StandoffError;
use crate::name::Name;
use crate::types::TextRange;
use crate::xml::converter::ConverterState;
use crate::xml::{ElementFrame, MarkupData};

/// The events dispatched through the stage chain. Element events only reach the
/// stages for elements that pass the inclusion gate.
#[derive(Debug)]
pub enum StageEvent<'e> {
    DocumentStart,
    ElementStart(&'e ElementFrame),
    ElementEnd(&'e ElementFrame),
    DocumentEnd,
}

/// One stage of the conversion pipeline. The driver dispatches every event to
/// each stage in registration order; a stage reacts by updating its own state
/// and emitting effects through the [`ConverterState`] it is handed (text
/// insertion, annotation events).
pub trait ConverterStage {
    fn apply(
        &mut self,
        state: &mut ConverterState<'_, '_>,
        event: &StageEvent<'_>,
    ) -> Result<(), StandoffError>;
}

/// Inserts a separator (usually a newline) into the output text before each
/// configured line element. The insertion consumes no source characters, so the
/// offset mapper records it as a pure insertion entry.
#[derive(Debug)]
pub struct LineBreakStage {
    elements: HashSet<Name>,
    separator: String,
}

impl LineBreakStage {
    pub fn new(elements: HashSet<Name>, separator: impl Into<String>) -> Self {
        Self {
            elements,
            separator: separator.into(),
        }
    }
}

impl ConverterStage for LineBreakStage {
    fn apply(
        &mut self,
        state: &mut ConverterState<'_, '_>,
        event: &StageEvent<'_>,
    ) -> Result<(), StandoffError> {
        if let StageEvent::ElementStart(frame) = event {
            if self.elements.contains(frame.name()) {
                state.insert(&self.separator)?;
            }
        }
        Ok(())
    }
}

/// The default annotation generator: one annotation per element, opened at the
/// element start offset and closed on the matching end. Balance is guaranteed by
/// stack discipline; the driver gates both events on the same inclusion state.
#[derive(Debug, Default)]
pub struct ElementAnnotationStage {
    pending: Vec<(usize, MarkupData)>,
}

impl ElementAnnotationStage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConverterStage for ElementAnnotationStage {
    fn apply(
        &mut self,
        state: &mut ConverterState<'_, '_>,
        event: &StageEvent<'_>,
    ) -> Result<(), StandoffError> {
        match event {
            StageEvent::DocumentStart => self.pending.clear(),
            StageEvent::ElementStart(frame) => {
                let data = state.markup_data(frame);
                let offset = state.offset();
                state.emit_annotation_start(offset, &data)?;
                self.pending.push((offset, data));
            }
            StageEvent::ElementEnd(_) => {
                if let Some((start, data)) = self.pending.pop() {
                    state.emit_annotation_end(TextRange::new(start, state.offset()), &data)?;
                }
            }
            StageEvent::DocumentEnd => {}
        }
        Ok(())
    }
}

/// TEI milestone units implied by the shorthand element names
const MILESTONE_SHORTHANDS: [(&str, &str); 4] = [
    ("pb", "page"),
    ("lb", "line"),
    ("cb", "column"),
    ("gb", "gathering"),
];

/// Turns point-like milestone elements into range annotations. A milestone for
/// unit `U` opens an annotation that runs until the next milestone of the same
/// unit, or until the end of the document. Recognizes the generic `milestone`
/// element (unit taken from its `unit` attribute, which is then stripped from
/// the recorded attributes) and the pb/lb/cb/gb shorthands.
#[derive(Debug, Default)]
pub struct MilestoneStage {
    /// Open milestone per unit, keyed deterministically
    pending: BTreeMap<String, (usize, MarkupData)>,
}

impl MilestoneStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognize a milestone element and derive the annotation data for it
    fn recognize(&self, state: &ConverterState<'_, '_>, frame: &ElementFrame) -> Option<(String, MarkupData)> {
        let local = frame.name().local_name();
        if local == "milestone" {
            let unit = frame.attribute_local("unit")?.to_string();
            let attributes = frame
                .attributes()
                .iter()
                .filter(|(name, _)| name.local_name() != "unit")
                .cloned()
                .collect();
            let name = Name::new(frame.name().namespace(), unit.clone());
            Some((unit, state.markup_data_with(name, attributes)))
        } else {
            let unit = MILESTONE_SHORTHANDS
                .iter()
                .copied()
                .find(|(shorthand, _)| *shorthand == local)
                .map(|(_, unit)| unit.to_string())?;
            let name = Name::new(frame.name().namespace(), unit.clone());
            Some((unit, state.markup_data_with(name, frame.attributes().to_vec())))
        }
    }
}

impl ConverterStage for MilestoneStage {
    fn apply(
        &mut self,
        state: &mut ConverterState<'_, '_>,
        event: &StageEvent<'_>,
    ) -> Result<(), StandoffError> {
        match event {
            StageEvent::DocumentStart => self.pending.clear(),
            StageEvent::ElementStart(frame) => {
                if let Some((unit, data)) = self.recognize(state, frame) {
                    let offset = state.offset();
                    if let Some((start, previous)) = self.pending.remove(&unit) {
                        state.emit_annotation_end(TextRange::new(start, offset), &previous)?;
                    }
                    state.emit_annotation_start(offset, &data)?;
                    self.pending.insert(unit, (offset, data));
                }
            }
            StageEvent::ElementEnd(_) => {}
            StageEvent::DocumentEnd => {
                let offset = state.offset();
                let pending = std::mem::take(&mut self.pending);
                for (_, (start, data)) in pending {
                    state.emit_annotation_end(TextRange::new(start, offset), &data)?;
                }
            }
        }
        Ok(())
    }
}

/// Pairs spanning elements: an element with a `spanTo` attribute opens a pending
/// span under the referenced id (leading `#` stripped; a trailing `Span` suffix
/// is stripped from the element's local name to recover the logical name), and
/// an element carrying the configured id attribute closes *all* spans queued
/// under its id — several spans may legitimately point at the same id.
///
/// Spans whose id is never seen are dropped without diagnostic at document end;
/// they are only reported in debug mode.
#[derive(Debug)]
pub struct SpanningStage {
    id_attribute: Name,
    pending: HashMap<String, Vec<(usize, MarkupData)>>,
}

impl SpanningStage {
    pub fn new(id_attribute: Name) -> Self {
        Self {
            id_attribute,
            pending: HashMap::new(),
        }
    }
}

impl ConverterStage for SpanningStage {
    fn apply(
        &mut self,
        state: &mut ConverterState<'_, '_>,
        event: &StageEvent<'_>,
    ) -> Result<(), StandoffError> {
        match event {
            StageEvent::DocumentStart => self.pending.clear(),
            StageEvent::ElementStart(frame) => {
                if let Some(reference) = frame.attribute_local("spanTo") {
                    let id = reference.strip_prefix('#').unwrap_or(reference).to_string();
                    let local = frame.name().local_name();
                    let logical = local.strip_suffix("Span").unwrap_or(local);
                    let name = Name::new(frame.name().namespace(), logical);
                    let attributes = frame
                        .attributes()
                        .iter()
                        .filter(|(attr, _)| attr.local_name() != "spanTo")
                        .cloned()
                        .collect();
                    let data = state.markup_data_with(name, attributes);
                    let offset = state.offset();
                    state.emit_annotation_start(offset, &data)?;
                    self.pending.entry(id).or_default().push((offset, data));
                }
                if let Some(id) = frame.attribute(&self.id_attribute) {
                    if let Some(spans) = self.pending.remove(id) {
                        let offset = state.offset();
                        for (start, data) in spans {
                            state.emit_annotation_end(TextRange::new(start, offset), &data)?;
                        }
                    }
                }
            }
            StageEvent::ElementEnd(_) => {}
            StageEvent::DocumentEnd => {
                if !self.pending.is_empty() {
                    let dangling: usize = self.pending.values().map(|v| v.len()).sum();
                    state.debug(|| {
                        format!(
                            "SpanningStage: dropping {} span(s) with unresolved id references",
                            dangling
                        )
                    });
                    self.pending.clear();
                }
            }
        }
        Ok(())
    }
}
