use std::collections::HashSet;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::config::{debug, ConversionConfig};
use crate::error::StandoffError;
use crate::name::Name;
use crate::types::TextRange;
use crate::xml::context::{InclusionContext, NamespaceContext};
use crate::xml::listener::ConversionListener;
use crate::xml::nodepath::NodePath;
use crate::xml::offsets::OffsetMapper;
use crate::xml::stage::{
    ConverterStage, ElementAnnotationStage, LineBreakStage, MilestoneStage, SpanningStage,
    StageEvent,
};
use crate::xml::whitespace::WhitespaceCompressor;
use crate::xml::{ElementFrame, MarkupData, MARKUP_NAMESPACE, XML_NAMESPACE};

/// The per-run state of one conversion, handed to every stage. It owns the
/// structural stacks (node path, inclusion, namespaces, space preservation), the
/// offset bookkeeping, and the registered listeners, and exposes the text
/// primitives stages may use: [`ConverterState::insert`] for synthetic text and
/// the annotation event emitters.
pub struct ConverterState<'c, 'l> {
    config: &'c ConversionConfig,
    listeners: Vec<&'l mut dyn ConversionListener>,

    /// Current output text offset in unicode codepoints
    offset: usize,
    node_path: NodePath,
    pub(crate) inclusion: InclusionContext,
    pub(crate) namespaces: NamespaceContext,
    whitespace: WhitespaceCompressor,
    mapper: OffsetMapper,
    in_text_run: bool,
}

impl<'c, 'l> ConverterState<'c, 'l> {
    fn new(config: &'c ConversionConfig, listeners: Vec<&'l mut dyn ConversionListener>) -> Self {
        Self {
            config,
            listeners,
            offset: 0,
            node_path: NodePath::new(),
            inclusion: InclusionContext::new(),
            namespaces: NamespaceContext::new(),
            whitespace: WhitespaceCompressor::new(),
            mapper: OffsetMapper::new(),
            in_text_run: false,
        }
    }

    /// The current output text offset (unicode codepoints)
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The structural position of the node currently being processed
    pub fn node_path(&self) -> &NodePath {
        &self.node_path
    }

    /// Current visibility under the include/exclude rules
    pub fn included(&self) -> bool {
        self.inclusion.included()
    }

    /// Build the annotation payload for an element: its name and attributes,
    /// plus the current node path when node-path capture is enabled
    pub fn markup_data(&self, frame: &ElementFrame) -> MarkupData {
        self.markup_data_with(frame.name().clone(), frame.attributes().to_vec())
    }

    /// Like [`ConverterState::markup_data`] but with a caller-supplied name and
    /// attribute set (used by generators that rename or strip attributes)
    pub fn markup_data_with(&self, name: Name, attributes: Vec<(Name, String)>) -> MarkupData {
        let node = if self.config.node_paths {
            Some(self.node_path.clone())
        } else {
            None
        };
        MarkupData::new(name, attributes, node)
    }

    /// Insert synthetic text into the output without consuming any source
    /// characters
    pub fn insert(&mut self, text: &str) -> Result<(), StandoffError> {
        if text.is_empty() {
            return Ok(());
        }
        let length = text.chars().count();
        if let Some(mapping) = self.mapper.advance(length, 0) {
            for listener in self.listeners.iter_mut() {
                listener.map(&mapping)?;
            }
        }
        self.whitespace.observe(text);
        self.offset += length;
        for listener in self.listeners.iter_mut() {
            listener.text(text)?;
        }
        Ok(())
    }

    /// Copy already-compressed text to the output while consuming `source_len`
    /// source characters
    pub(crate) fn copy(&mut self, text: &str, source_len: usize) -> Result<(), StandoffError> {
        let length = text.chars().count();
        if let Some(mapping) = self.mapper.advance(length, source_len) {
            for listener in self.listeners.iter_mut() {
                listener.map(&mapping)?;
            }
        }
        self.offset += length;
        if !text.is_empty() {
            for listener in self.listeners.iter_mut() {
                listener.text(text)?;
            }
        }
        Ok(())
    }

    /// Consume source characters that have no effect on the output text
    pub(crate) fn skip(&mut self, source_len: usize) -> Result<(), StandoffError> {
        if let Some(mapping) = self.mapper.advance(0, source_len) {
            for listener in self.listeners.iter_mut() {
                listener.map(&mapping)?;
            }
        }
        Ok(())
    }

    /// Fan an `annotation_start` event out to all listeners
    pub fn emit_annotation_start(
        &mut self,
        offset: usize,
        data: &MarkupData,
    ) -> Result<(), StandoffError> {
        for listener in self.listeners.iter_mut() {
            listener.annotation_start(offset, data)?;
        }
        Ok(())
    }

    /// Fan an `annotation_end` event out to all listeners
    pub fn emit_annotation_end(
        &mut self,
        range: TextRange,
        data: &MarkupData,
    ) -> Result<(), StandoffError> {
        for listener in self.listeners.iter_mut() {
            listener.annotation_end(range, data)?;
        }
        Ok(())
    }

    /// Log a message when the configuration has debug mode enabled
    pub fn debug<F>(&self, message: F)
    where
        F: FnOnce() -> String,
    {
        debug(self.config, message);
    }

    /// One chunk of character content (text, CDATA, or a resolved entity
    /// reference). Contiguous chunks form a single text run and consume a single
    /// sibling slot on the node path.
    fn text_event(&mut self, content: &str, source_len: usize) -> Result<(), StandoffError> {
        if !self.in_text_run {
            self.node_path.visit_leaf();
            self.in_text_run = true;
        }
        if self.inclusion.included() {
            let compressed = self.whitespace.compress(content);
            self.copy(&compressed, source_len)
        } else {
            self.skip(source_len)
        }
    }

    fn end_text_run(&mut self) {
        self.in_text_run = false;
    }

    fn document_start(&mut self) -> Result<(), StandoffError> {
        for listener in self.listeners.iter_mut() {
            listener.start()?;
        }
        Ok(())
    }

    fn document_end(&mut self) -> Result<(), StandoffError> {
        let length = self.offset;
        for listener in self.listeners.iter_mut() {
            listener.end(length)?;
        }
        Ok(())
    }
}

/// Drives one XML event stream through the configured stage chain and fans the
/// resulting text, mapping, and annotation events out to registered listeners.
///
/// The conversion is single-threaded and strictly sequential: one XML event is
/// fully processed through every stage and listener before the next is pulled.
/// Any error — parse failure or a failing listener — aborts the whole run.
pub struct XmlConverter<'a> {
    config: &'a ConversionConfig,
    included: HashSet<Name>,
    excluded: HashSet<Name>,
    containers: HashSet<Name>,
    stages: Vec<Box<dyn ConverterStage>>,
}

impl<'a> XmlConverter<'a> {
    /// Set up a converter for the given configuration. Fails when the
    /// configuration uses an unregistered namespace prefix.
    pub fn new(config: &'a ConversionConfig) -> Result<Self, StandoffError> {
        let included = resolve_name_set(config, &config.included)?;
        let excluded = resolve_name_set(config, &config.excluded)?;
        let containers = resolve_name_set(config, &config.containers)?;
        let line_elements = resolve_name_set(config, &config.line_elements)?;

        let mut stages: Vec<Box<dyn ConverterStage>> = Vec::new();
        if !line_elements.is_empty() {
            stages.push(Box::new(LineBreakStage::new(
                line_elements,
                config.line_separator.clone(),
            )));
        }
        stages.push(Box::new(ElementAnnotationStage::new()));
        if config.milestones {
            stages.push(Box::new(MilestoneStage::new()));
        }
        if config.spanning {
            let id_attribute = resolve_config_name(config, &config.id_attribute)?;
            stages.push(Box::new(SpanningStage::new(id_attribute)));
        }
        debug(config, || {
            format!("XmlConverter: registered {} stages", stages.len())
        });

        Ok(Self {
            config,
            included,
            excluded,
            containers,
            stages,
        })
    }

    /// Append a custom stage to the end of the chain
    pub fn with_stage(mut self, stage: Box<dyn ConverterStage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Run the conversion over a complete XML document, fanning events out to
    /// the given listeners. Returns the length of the produced text in unicode
    /// codepoints.
    pub fn convert<'b>(
        &mut self,
        xml: &str,
        listeners: &'b mut [&'b mut dyn ConversionListener],
    ) -> Result<usize, StandoffError> {
        let mut reader = Reader::from_str(xml);
        // mismatched end tags must abort the conversion
        reader.config_mut().check_end_names = true;
        let mut state = ConverterState::new(
            self.config,
            listeners.iter_mut().map(|l| &mut **l).collect(),
        );
        let mut element_stack: Vec<ElementFrame> = Vec::new();

        state.document_start()?;
        self.dispatch(&mut state, &StageEvent::DocumentStart)?;

        let mut last_position = 0usize;
        loop {
            let event = reader
                .read_event()
                .map_err(|e| StandoffError::XmlError(e, "pulling the next XML event"))?;
            let position = reader.buffer_position() as usize;
            let source_delta = xml[last_position..position].chars().count();
            last_position = position;

            match event {
                Event::Start(raw) => {
                    state.end_text_run();
                    state.skip(source_delta)?;
                    let frame = self.element_start(&mut state, &raw)?;
                    element_stack.push(frame);
                }
                Event::Empty(raw) => {
                    state.end_text_run();
                    state.skip(source_delta)?;
                    let frame = self.element_start(&mut state, &raw)?;
                    element_stack.push(frame);
                    self.element_end(&mut state, &mut element_stack)?;
                }
                Event::End(_) => {
                    state.end_text_run();
                    state.skip(source_delta)?;
                    self.element_end(&mut state, &mut element_stack)?;
                }
                Event::Text(raw) => {
                    // whitespace in the prolog or epilog is not document content
                    if element_stack.is_empty() {
                        state.end_text_run();
                        state.skip(source_delta)?;
                    } else {
                        let content = String::from_utf8_lossy(raw.as_ref()).into_owned();
                        state.text_event(&content, source_delta)?;
                    }
                }
                Event::CData(raw) => {
                    let content = String::from_utf8_lossy(&raw.into_inner()).into_owned();
                    state.text_event(&content, source_delta)?;
                }
                Event::GeneralRef(raw) => {
                    let entity = String::from_utf8_lossy(raw.as_ref()).into_owned();
                    match resolve_entity(&entity) {
                        Some(resolved) => state.text_event(&resolved, source_delta)?,
                        None => {
                            state.debug(|| format!("unresolvable entity reference: &{};", entity));
                            state.text_event("", source_delta)?;
                        }
                    }
                }
                Event::Comment(raw) => {
                    state.end_text_run();
                    state.skip(source_delta)?;
                    let content = String::from_utf8_lossy(raw.as_ref()).into_owned();
                    let name = Name::new(Some(MARKUP_NAMESPACE), "comment");
                    let attributes = vec![(Name::local("content"), content)];
                    self.point_annotation(&mut state, name, attributes)?;
                }
                Event::PI(raw) => {
                    state.end_text_run();
                    state.skip(source_delta)?;
                    let target = String::from_utf8_lossy(raw.target()).into_owned();
                    let data = String::from_utf8_lossy(raw.content()).trim().to_string();
                    let name = Name::new(Some(MARKUP_NAMESPACE), "pi");
                    let attributes = vec![
                        (Name::local("target"), target),
                        (Name::local("data"), data),
                    ];
                    self.point_annotation(&mut state, name, attributes)?;
                }
                Event::Decl(_) | Event::DocType(_) => {
                    state.end_text_run();
                    state.skip(source_delta)?;
                }
                Event::Eof => {
                    if !element_stack.is_empty() {
                        return Err(StandoffError::OtherError(
                            "document ended before all elements were closed",
                        ));
                    }
                    state.end_text_run();
                    state.skip(source_delta)?;
                    if let Some(mapping) = state.mapper.flush() {
                        for listener in state.listeners.iter_mut() {
                            listener.map(&mapping)?;
                        }
                    }
                    self.dispatch(&mut state, &StageEvent::DocumentEnd)?;
                    state.document_end()?;
                    state.node_path.leave_element();
                    break;
                }
            }
        }
        Ok(state.offset())
    }

    fn dispatch(
        &mut self,
        state: &mut ConverterState<'_, '_>,
        event: &StageEvent<'_>,
    ) -> Result<(), StandoffError> {
        for stage in self.stages.iter_mut() {
            stage.apply(state, event)?;
        }
        Ok(())
    }

    /// Process an element start tag: collect namespace declarations, resolve
    /// names, advance the structural stacks, and notify the stages when the
    /// element is visible.
    fn element_start(
        &mut self,
        state: &mut ConverterState<'_, '_>,
        raw: &BytesStart,
    ) -> Result<ElementFrame, StandoffError> {
        let mut declarations: Vec<(Option<String>, String)> = Vec::new();
        let mut raw_attributes: Vec<(String, String)> = Vec::new();
        for attribute in raw.attributes() {
            let attribute =
                attribute.map_err(|e| StandoffError::AttrError(e, "parsing attributes"))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let raw_value = String::from_utf8_lossy(&attribute.value).into_owned();
            let value = unescape(&raw_value)
                .map_err(|e| StandoffError::EscapeError(e, "unescaping attribute value"))?
                .into_owned();
            if key == "xmlns" {
                declarations.push((None, value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((Some(prefix.to_string()), value));
            } else {
                raw_attributes.push((key, value));
            }
        }
        // declarations on the element apply to the element's own name
        state.namespaces.push_scope(declarations);

        let qname = String::from_utf8_lossy(raw.name().as_ref()).into_owned();
        let name = state.namespaces.resolve_element(&qname)?;

        let mut space_directive: Option<bool> = None;
        let mut attributes = Vec::with_capacity(raw_attributes.len());
        for (key, value) in raw_attributes {
            let attribute_name = state.namespaces.resolve_attribute(&key)?;
            if attribute_name.namespace() == Some(XML_NAMESPACE)
                && attribute_name.local_name() == "space"
            {
                space_directive = match value.as_str() {
                    "preserve" => Some(true),
                    "default" => Some(false),
                    _ => space_directive,
                };
            }
            attributes.push((attribute_name, value));
        }
        let frame = ElementFrame::new(name, attributes);

        debug(self.config, || {
            format!("XmlConverter: element start {}", frame.name())
        });

        state.node_path.enter_element();
        state.inclusion.enter(
            self.included.contains(frame.name()),
            self.excluded.contains(frame.name()),
        );
        state
            .whitespace
            .start_element(space_directive, self.containers.contains(frame.name()));
        if state.inclusion.included() {
            self.dispatch(state, &StageEvent::ElementStart(&frame))?;
        }
        Ok(frame)
    }

    /// Process an element end: notify stages while the stacks still describe the
    /// element, then pop everything in the mirror order of the pushes.
    fn element_end(
        &mut self,
        state: &mut ConverterState<'_, '_>,
        element_stack: &mut Vec<ElementFrame>,
    ) -> Result<(), StandoffError> {
        let frame = element_stack
            .last()
            .ok_or(StandoffError::OtherError("end element without matching start"))?;
        if state.inclusion.included() {
            self.dispatch(state, &StageEvent::ElementEnd(frame))?;
        }
        state.inclusion.leave();
        state.whitespace.end_element();
        state.node_path.leave_element();
        element_stack.pop();
        state.namespaces.pop_scope();
        Ok(())
    }

    /// Comments and processing instructions become zero-width annotations at the
    /// current offset, after consuming one sibling slot
    fn point_annotation(
        &mut self,
        state: &mut ConverterState<'_, '_>,
        name: Name,
        attributes: Vec<(Name, String)>,
    ) -> Result<(), StandoffError> {
        state.node_path.visit_leaf();
        if state.inclusion.included() {
            let data = state.markup_data_with(name, attributes);
            let offset = state.offset();
            state.emit_annotation_start(offset, &data)?;
            state.emit_annotation_end(TextRange::point(offset), &data)?;
        }
        Ok(())
    }
}

/// Resolve a set of configured element names against the configuration's prefix
/// map
fn resolve_name_set(
    config: &ConversionConfig,
    names: &[String],
) -> Result<HashSet<Name>, StandoffError> {
    names
        .iter()
        .map(|name| resolve_config_name(config, name))
        .collect()
}

/// Resolve a single `prefix:local` or `local` configuration entry. The `xml`
/// prefix is built in; all others must be registered on the configuration.
/// Unprefixed entries carry no namespace and thus only match elements outside
/// any default namespace.
fn resolve_config_name(config: &ConversionConfig, qname: &str) -> Result<Name, StandoffError> {
    if let Some((prefix, local)) = qname.split_once(':') {
        if prefix == "xml" {
            Ok(Name::new(Some(XML_NAMESPACE), local))
        } else if let Some(namespace) = config.namespaces.get(prefix) {
            Ok(Name::new(Some(namespace.as_str()), local))
        } else {
            Err(StandoffError::UnknownPrefix(
                prefix.to_string(),
                "resolving configured name",
            ))
        }
    } else {
        Ok(Name::local(qname))
    }
}

/// Resolve a general entity reference: the five predefined XML entities plus
/// decimal and hexadecimal character references
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "amp" => Some("&".to_string()),
        "lt" => Some("<".to_string()),
        "gt" => Some(">".to_string()),
        "apos" => Some("'".to_string()),
        "quot" => Some("\"".to_string()),
        _ => {
            let reference = entity.strip_prefix('#')?;
            let codepoint = if let Some(hex) = reference.strip_prefix('x').or_else(|| reference.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                reference.parse::<u32>().ok()?
            };
            char::from_u32(codepoint).map(|c| c.to_string())
        }
    }
}
