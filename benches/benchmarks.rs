use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use standoff::{
    ConversionConfig, ConversionListener, MarkupData, RangeMapping, StandoffError, TextRange,
    XmlConverter,
};

/// Counts events without retaining them, so we measure the pipeline itself
#[derive(Default)]
struct CountingListener {
    annotations: usize,
    text_len: usize,
    mappings: usize,
}

impl ConversionListener for CountingListener {
    fn annotation_end(&mut self, _range: TextRange, _data: &MarkupData) -> Result<(), StandoffError> {
        self.annotations += 1;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), StandoffError> {
        self.text_len += text.len();
        Ok(())
    }

    fn map(&mut self, _mapping: &RangeMapping) -> Result<(), StandoffError> {
        self.mappings += 1;
        Ok(())
    }
}

fn synthesize_document(paragraphs: usize) -> String {
    let mut xml = String::from("<text>");
    for n in 0..paragraphs {
        xml.push_str(&format!(
            "<div n=\"{}\"><pb n=\"{}\"/><p>The quick brown fox   jumps over the lazy dog. \
             <hi rend=\"italic\">Lorem ipsum</hi> dolor sit amet.</p></div>",
            n, n
        ));
    }
    xml.push_str("</text>");
    xml
}

pub fn bench_conversion(c: &mut Criterion) {
    let config = ConversionConfig::new()
        .with_container("text")
        .with_container("div")
        .with_line_element("p");
    let document = synthesize_document(200);

    let mut group = c.benchmark_group("convert");
    group.throughput(Throughput::Bytes(document.len() as u64));
    group.bench_function("xml_to_standoff", |b| {
        b.iter(|| {
            let mut converter = XmlConverter::new(&config).unwrap();
            let mut listener = CountingListener::default();
            let mut listeners: [&mut dyn ConversionListener; 1] = [&mut listener];
            converter
                .convert(black_box(&document), &mut listeners)
                .unwrap();
            assert!(listener.annotations > 0);
            black_box(listener.text_len)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_conversion);
criterion_main!(benches);
