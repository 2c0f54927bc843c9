mod common;

use common::*;
use standoff::*;

#[test]
fn container_scenario() -> Result<(), StandoffError> {
    let config = ConversionConfig::new().with_container("a");
    let listener = convert("<a>x <b>y</b> z</a>", &config)?;

    assert!(listener.started);
    assert_eq!(listener.text, "x y z");
    assert_eq!(listener.length, Some(5));

    let a = listener.named(&Name::local("a"));
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].0, TextRange::new(0, 5));
    let b = listener.named(&Name::local("b"));
    assert_eq!(b.len(), 1);
    assert_eq!(b[0].0, TextRange::new(2, 3));

    assert_mapping_sound("<a>x <b>y</b> z</a>", &listener);
    Ok(())
}

#[test]
fn milestone_scenario() -> Result<(), StandoffError> {
    let xml = r#"<p>Page<pb n="2"/>Two</p>"#;
    let listener = convert(xml, &ConversionConfig::new())?;

    assert_eq!(listener.text, "PageTwo");

    //the first pb opens a page, it does not close anything retroactively
    let pages = listener.named(&Name::local("page"));
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].0, TextRange::new(4, 7));
    assert_eq!(pages[0].1.attribute_local("n"), Some("2"));

    //the pb element itself still gets its zero-width default annotation
    let pb = listener.named(&Name::local("pb"));
    assert_eq!(pb.len(), 1);
    assert_eq!(pb[0].0, TextRange::new(4, 4));

    let p = listener.named(&Name::local("p"));
    assert_eq!(p[0].0, TextRange::new(0, 7));
    Ok(())
}

#[test]
fn milestone_closure_invariant() -> Result<(), StandoffError> {
    let xml = r#"<doc><pb n="1"/>one<pb n="2"/>two<pb n="3"/>three</doc>"#;
    let listener = convert(xml, &ConversionConfig::new())?;

    assert_eq!(listener.text, "onetwothree");
    let pages = listener.named(&Name::local("page"));
    assert_eq!(pages.len(), 3);
    //successive ranges for one unit are contiguous and cover the document from
    //the first milestone to the end, without gaps or overlaps
    let mut sorted: Vec<TextRange> = pages.iter().map(|(range, _)| *range).collect();
    sorted.sort();
    assert_eq!(
        sorted,
        vec![
            TextRange::new(0, 3),
            TextRange::new(3, 6),
            TextRange::new(6, 11),
        ]
    );
    Ok(())
}

#[test]
fn generic_milestone_element() -> Result<(), StandoffError> {
    let xml = r#"<doc><milestone unit="chapter" n="1"/>alpha<milestone unit="chapter" n="2"/>beta</doc>"#;
    let listener = convert(xml, &ConversionConfig::new())?;

    let chapters = listener.named(&Name::local("chapter"));
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].0, TextRange::new(0, 5));
    assert_eq!(chapters[1].0, TextRange::new(5, 9));
    //the unit attribute is stripped from the recorded attributes
    assert_eq!(chapters[0].1.attribute_local("unit"), None);
    assert_eq!(chapters[0].1.attribute_local("n"), Some("1"));
    Ok(())
}

#[test]
fn spanning_element_pairing() -> Result<(), StandoffError> {
    let xml = r##"<doc><noteSpan spanTo="#e1" resp="ed"/>abc<anchor xml:id="e1"/>def</doc>"##;
    let listener = convert(xml, &ConversionConfig::new())?;

    assert_eq!(listener.text, "abcdef");
    let notes = listener.named(&Name::local("note"));
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].0, TextRange::new(0, 3));
    assert_eq!(notes[0].1.attribute_local("resp"), Some("ed"));
    assert_eq!(notes[0].1.attribute_local("spanTo"), None);
    Ok(())
}

#[test]
fn spanning_elements_share_an_id() -> Result<(), StandoffError> {
    let xml =
        r##"<doc><hiSpan spanTo="#m"/>ab<noteSpan spanTo="#m"/>cd<anchor xml:id="m"/>ef</doc>"##;
    let listener = convert(xml, &ConversionConfig::new())?;

    let hi = listener.named(&Name::local("hi"));
    assert_eq!(hi[0].0, TextRange::new(0, 4));
    let notes = listener.named(&Name::local("note"));
    assert_eq!(notes[0].0, TextRange::new(2, 4));
    Ok(())
}

#[test]
fn unmatched_span_is_dropped() -> Result<(), StandoffError> {
    //a spanTo reference that never resolves produces no annotation; this is
    //the documented behavior, there is no auto-close at document end
    let xml = r##"<doc><noteSpan spanTo="#nowhere"/>abc</doc>"##;
    let listener = convert(xml, &ConversionConfig::new())?;
    assert!(listener.named(&Name::local("note")).is_empty());
    Ok(())
}

#[test]
fn roundtrip_identity() -> Result<(), StandoffError> {
    let xml = "<t>hello world</t>";
    let listener = convert(xml, &ConversionConfig::new())?;

    assert_eq!(listener.text, "hello world");
    //no compression fires, so the character data is covered by exactly one
    //mapping entry
    let copied: Vec<&RangeMapping> = listener
        .mappings
        .iter()
        .filter(|mapping| !mapping.text.is_empty())
        .collect();
    assert_eq!(copied.len(), 1);
    assert_eq!(copied[0].source, TextRange::new(3, 14));
    assert_eq!(copied[0].text, TextRange::new(0, 11));
    assert_mapping_sound(xml, &listener);
    Ok(())
}

#[test]
fn entity_references() -> Result<(), StandoffError> {
    let xml = "<t>a &amp; b &#65;</t>";
    let listener = convert(xml, &ConversionConfig::new())?;
    assert_eq!(listener.text, "a & b A");
    assert_mapping_sound(xml, &listener);
    Ok(())
}

#[test]
fn cdata_joins_the_text_run() -> Result<(), StandoffError> {
    let xml = "<t>a<![CDATA[ <raw> ]]>b</t>";
    let listener = convert(xml, &ConversionConfig::new())?;
    assert_eq!(listener.text, "a <raw> b");
    assert_mapping_sound(xml, &listener);
    Ok(())
}

#[test]
fn comments_and_pis_become_zero_width_annotations() -> Result<(), StandoffError> {
    let xml = "<doc>ab<!--note-->cd<?proc data?>ef</doc>";
    let listener = convert(xml, &ConversionConfig::new())?;

    assert_eq!(listener.text, "abcdef");
    let comments = listener.named(&Name::new(Some(MARKUP_NAMESPACE), "comment"));
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].0, TextRange::new(2, 2));
    assert_eq!(comments[0].1.attribute_local("content"), Some("note"));

    let pis = listener.named(&Name::new(Some(MARKUP_NAMESPACE), "pi"));
    assert_eq!(pis.len(), 1);
    assert_eq!(pis[0].0, TextRange::new(4, 4));
    assert_eq!(pis[0].1.attribute_local("target"), Some("proc"));
    assert_eq!(pis[0].1.attribute_local("data"), Some("data"));
    Ok(())
}

#[test]
fn line_elements_insert_separators() -> Result<(), StandoffError> {
    let config = ConversionConfig::new().with_line_element("l");
    let xml = "<doc><l>one</l><l>two</l></doc>";
    let listener = convert(xml, &config)?;

    assert_eq!(listener.text, "\none\ntwo");
    let lines = listener.named(&Name::local("l"));
    assert_eq!(lines[0].0, TextRange::new(1, 4));
    assert_eq!(lines[1].0, TextRange::new(5, 8));

    //the inserted separator consumed no source characters
    assert!(listener
        .mappings
        .iter()
        .any(|mapping| mapping.source.is_empty() && mapping.text == TextRange::new(0, 1)));
    assert_mapping_sound(xml, &listener);
    Ok(())
}

#[test]
fn exclusion_hides_subtrees() -> Result<(), StandoffError> {
    let config = ConversionConfig::new().with_exclude("head");
    let listener = convert("<doc><head>skip</head>tail</doc>", &config)?;

    assert_eq!(listener.text, "tail");
    assert!(listener.named(&Name::local("head")).is_empty());
    assert_eq!(
        listener.named(&Name::local("doc"))[0].0,
        TextRange::new(0, 4)
    );
    Ok(())
}

#[test]
fn reinclusion_inside_excluded_subtree() -> Result<(), StandoffError> {
    let config = ConversionConfig::new()
        .with_exclude("head")
        .with_include("note");
    let xml = "<doc><head><note>hi</note>skip</head>tail</doc>";
    let listener = convert(xml, &config)?;

    assert_eq!(listener.text, "hitail");
    let notes = listener.named(&Name::local("note"));
    assert_eq!(notes[0].0, TextRange::new(0, 2));
    assert!(listener.named(&Name::local("head")).is_empty());
    assert_mapping_sound(xml, &listener);
    Ok(())
}

#[test]
fn space_preservation_directive() -> Result<(), StandoffError> {
    let xml = r#"<doc><pre xml:space="preserve">a  b</pre>c  d</doc>"#;
    let listener = convert(xml, &ConversionConfig::new())?;

    assert_eq!(listener.text, "a  bc d");
    //the directive attribute is an ordinary attribute on the annotation
    let pre = listener.named(&Name::local("pre"));
    assert_eq!(pre[0].1.attribute_local("space"), Some("preserve"));
    Ok(())
}

#[test]
fn namespaces_resolve_against_declarations() -> Result<(), StandoffError> {
    let xml = r#"<tei:TEI xmlns:tei="http://www.tei-c.org/ns/1.0"><tei:p>hi</tei:p></tei:TEI>"#;
    let listener = convert(xml, &ConversionConfig::new())?;

    let tei = listener.named(&Name::new(Some(TEI_NAMESPACE), "TEI"));
    assert_eq!(tei.len(), 1);
    //the xmlns declaration is not recorded as an attribute
    assert!(tei[0].1.attributes().is_empty());
    let p = listener.named(&Name::new(Some(TEI_NAMESPACE), "p"));
    assert_eq!(p[0].0, TextRange::new(0, 2));
    Ok(())
}

#[test]
fn prolog_whitespace_is_not_content() -> Result<(), StandoffError> {
    let xml = "<?xml version=\"1.0\"?>\n<doc>hi</doc>\n";
    let listener = convert(xml, &ConversionConfig::new())?;
    assert_eq!(listener.text, "hi");
    assert_eq!(
        listener.named(&Name::local("doc"))[0].0,
        TextRange::new(0, 2)
    );
    assert_mapping_sound(xml, &listener);
    Ok(())
}

#[test]
fn undeclared_prefix_aborts() {
    let result = convert("<x:y>a</x:y>", &ConversionConfig::new());
    assert!(matches!(result, Err(StandoffError::UnknownPrefix(_, _))));
}

#[test]
fn unclosed_document_aborts() {
    assert!(convert("<doc><p>text", &ConversionConfig::new()).is_err());
}

#[test]
fn node_paths_order_same_offset_annotations() -> Result<(), StandoffError> {
    let xml = "<doc><a><b>x</b></a></doc>";
    let listener = convert(xml, &ConversionConfig::new())?;

    let a = &listener.named(&Name::local("a"))[0];
    let b = &listener.named(&Name::local("b"))[0];
    //both cover "x", the deeper element sorts after the shallower one
    assert_eq!(a.0, b.0);
    assert!(a.1.node().unwrap() < b.1.node().unwrap());
    Ok(())
}

#[test]
fn node_paths_can_be_disabled() -> Result<(), StandoffError> {
    let config = ConversionConfig::new().with_node_paths(false);
    let listener = convert("<doc>x</doc>", &config)?;
    assert!(listener.annotations.iter().all(|(_, data)| data.node().is_none()));
    Ok(())
}

#[test]
fn milestones_can_be_disabled() -> Result<(), StandoffError> {
    let config = ConversionConfig::new().with_milestones(false);
    let listener = convert("<p>a<pb/>b</p>", &config)?;
    assert!(listener.named(&Name::local("page")).is_empty());
    //the element annotation for pb is unaffected
    assert_eq!(listener.named(&Name::local("pb")).len(), 1);
    Ok(())
}

#[test]
fn custom_stages_can_be_appended() -> Result<(), StandoffError> {
    let config = ConversionConfig::new();
    let mut elements = std::collections::HashSet::new();
    elements.insert(Name::local("p"));
    let mut converter =
        XmlConverter::new(&config)?.with_stage(Box::new(LineBreakStage::new(elements, "|")));

    let mut listener = CollectingListener::default();
    let mut listeners: [&mut dyn ConversionListener; 1] = [&mut listener];
    converter.convert("<doc><p>a</p></doc>", &mut listeners)?;
    assert_eq!(listener.text, "|a");
    Ok(())
}
