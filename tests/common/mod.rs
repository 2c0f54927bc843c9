#![allow(dead_code)]
use standoff::*;

/// Collects every event of a conversion run for inspection
#[derive(Default)]
pub struct CollectingListener {
    pub started: bool,
    pub text: String,
    pub starts: Vec<(usize, MarkupData)>,
    pub annotations: Vec<(TextRange, MarkupData)>,
    pub mappings: Vec<RangeMapping>,
    pub length: Option<usize>,
}

impl ConversionListener for CollectingListener {
    fn start(&mut self) -> Result<(), StandoffError> {
        self.started = true;
        Ok(())
    }

    fn annotation_start(&mut self, offset: usize, data: &MarkupData) -> Result<(), StandoffError> {
        self.starts.push((offset, data.clone()));
        Ok(())
    }

    fn annotation_end(&mut self, range: TextRange, data: &MarkupData) -> Result<(), StandoffError> {
        self.annotations.push((range, data.clone()));
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), StandoffError> {
        self.text.push_str(text);
        Ok(())
    }

    fn map(&mut self, mapping: &RangeMapping) -> Result<(), StandoffError> {
        self.mappings.push(*mapping);
        Ok(())
    }

    fn end(&mut self, length: usize) -> Result<(), StandoffError> {
        self.length = Some(length);
        Ok(())
    }
}

impl CollectingListener {
    /// The completed annotations carrying the given name, in emission order
    pub fn named(&self, name: &Name) -> Vec<(TextRange, MarkupData)> {
        self.annotations
            .iter()
            .filter(|(_, data)| data.name() == name)
            .cloned()
            .collect()
    }
}

/// Run one conversion and collect everything it emits
pub fn convert(xml: &str, config: &ConversionConfig) -> Result<CollectingListener, StandoffError> {
    let mut listener = CollectingListener::default();
    let mut converter = XmlConverter::new(config)?;
    let mut listeners: [&mut dyn ConversionListener; 1] = [&mut listener];
    converter.convert(xml, &mut listeners)?;
    Ok(listener)
}

/// A repository over the in-memory store with a block-allocating id generator
pub fn new_repository() -> TextRepository<MemoryStore, BlockIdGenerator<MemorySequence>> {
    TextRepository::new(
        MemoryStore::new(),
        BlockIdGenerator::new(MemorySequence::new()),
    )
}

/// Check the offset-mapping soundness guarantees: entries ordered by start,
/// non-overlapping, and together partitioning both the source document and the
/// produced text, so every output offset maps back to a source range.
pub fn assert_mapping_sound(xml: &str, listener: &CollectingListener) {
    let source_length = xml.chars().count();
    let text_length = listener.length.expect("conversion must have completed");
    let mut source_cursor = 0;
    let mut text_cursor = 0;
    for mapping in listener.mappings.iter() {
        assert_eq!(
            mapping.source.start(),
            source_cursor,
            "source ranges must be adjacent and ordered"
        );
        assert_eq!(
            mapping.text.start(),
            text_cursor,
            "text ranges must be adjacent and ordered"
        );
        source_cursor = mapping.source.end();
        text_cursor = mapping.text.end();
    }
    assert_eq!(source_cursor, source_length, "mappings must cover the whole source");
    assert_eq!(text_cursor, text_length, "mappings must cover the whole text");
}
