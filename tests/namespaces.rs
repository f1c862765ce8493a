use pretty_assertions::assert_eq;
use stream_xml::{Writer, XMLNS_NAMESPACE, XML_NAMESPACE};

fn output(writer: Writer<Vec<u8>>) -> String {
    String::from_utf8(writer.into_inner()).expect("writer output is UTF-8")
}

#[test]
fn generated_prefixes_are_scoped_and_reused() {
    let mut writer = Writer::new(Vec::new());
    writer
        .element_start_ns("http://example.com/foo", "root")
        .unwrap();
    writer
        .element_start_ns("http://example.com/bar", "element")
        .unwrap();
    writer
        .element_start_ns("http://example.com/foo", "element")
        .unwrap();
    writer.element_end().unwrap();
    writer.element_end().unwrap();
    writer.element_end().unwrap();
    writer.eof().unwrap();

    assert_eq!(
        output(writer),
        "<ns0:root xmlns:ns0=\"http://example.com/foo\">\
         <ns1:element xmlns:ns1=\"http://example.com/bar\">\
         <ns0:element></ns0:element></ns1:element></ns0:root>"
    );
}

#[test]
fn bind_ns_stages_for_the_next_element() {
    let mut writer = Writer::new(Vec::new());
    writer.bind_ns("po", "urn:example:po").unwrap();
    writer.element_start_ns("urn:example:po", "order").unwrap();
    writer.element_end_empty().unwrap();
    writer.eof().unwrap();

    assert_eq!(output(writer), "<po:order xmlns:po=\"urn:example:po\"/>");
}

#[test]
fn bind_ns_inside_start_tag_is_immediate() {
    let mut writer = Writer::new(Vec::new());
    writer.element_start("r").unwrap();
    writer.bind_ns("x", "urn:x").unwrap();
    writer.attribute_ns("urn:x", "id", "1").unwrap();
    writer.element_end_empty().unwrap();
    writer.eof().unwrap();

    assert_eq!(output(writer), "<r xmlns:x=\"urn:x\" x:id=\"1\"/>");
}

#[test]
fn xmlns_attributes_declare_prefixes() {
    let mut writer = Writer::new(Vec::new());
    writer.element_start("r").unwrap();
    writer.attribute("xmlns:v", "urn:vocab").unwrap();
    writer.element_start_ns("urn:vocab", "word").unwrap();
    writer.element_end_empty().unwrap();
    writer.element_end().unwrap();
    writer.eof().unwrap();

    assert_eq!(
        output(writer),
        "<r xmlns:v=\"urn:vocab\"><v:word/></r>"
    );
}

#[test]
fn default_namespace_applies_to_elements_only() {
    let mut writer = Writer::new(Vec::new());
    writer.element_start("r").unwrap();
    writer.attribute("xmlns", "urn:d").unwrap();
    writer.element_start_ns("urn:d", "child").unwrap();
    // attributes never pick up the default namespace; a prefix is generated
    writer.attribute_ns("urn:d", "kind", "plain").unwrap();
    writer.element_end_empty().unwrap();
    writer.element_end().unwrap();
    writer.eof().unwrap();

    assert_eq!(
        output(writer),
        "<r xmlns=\"urn:d\"><child xmlns:ns0=\"urn:d\" ns0:kind=\"plain\"/></r>"
    );
}

#[test]
fn predefined_xml_prefix_needs_no_declaration() {
    let mut writer = Writer::new(Vec::new());
    writer.element_start("r").unwrap();
    writer.attribute_ns(XML_NAMESPACE, "lang", "en").unwrap();
    writer.element_end_empty().unwrap();
    writer.eof().unwrap();

    assert_eq!(output(writer), "<r xml:lang=\"en\"/>");
}

#[test]
fn xmlns_namespace_attribute_is_a_declaration() {
    let mut writer = Writer::new(Vec::new());
    writer.element_start("r").unwrap();
    writer.attribute_ns(XMLNS_NAMESPACE, "geo", "urn:geo").unwrap();
    writer.element_start_ns("urn:geo", "point").unwrap();
    writer.element_end_empty().unwrap();
    writer.element_end().unwrap();
    writer.eof().unwrap();

    assert_eq!(
        output(writer),
        "<r xmlns:geo=\"urn:geo\"><geo:point/></r>"
    );
}

#[test]
fn generated_prefix_skips_collisions() {
    let mut writer = Writer::new(Vec::new());
    writer.element_start("r").unwrap();
    writer.attribute("xmlns:ns0", "urn:zero").unwrap();
    writer.element_start_ns("urn:other", "x").unwrap();
    writer.element_end_empty().unwrap();
    writer.element_end().unwrap();
    writer.eof().unwrap();

    assert_eq!(
        output(writer),
        "<r xmlns:ns0=\"urn:zero\"><ns1:x xmlns:ns1=\"urn:other\"/></r>"
    );
}

#[test]
fn closed_scopes_release_their_bindings() {
    let mut writer = Writer::new(Vec::new());
    writer.element_start("r").unwrap();
    writer.element_start_ns("urn:a", "first").unwrap();
    writer.element_end_empty().unwrap();
    // the ns0 binding went out of scope; the counter does not restart
    writer.element_start_ns("urn:a", "second").unwrap();
    writer.element_end_empty().unwrap();
    writer.element_end().unwrap();
    writer.eof().unwrap();

    assert_eq!(
        output(writer),
        "<r><ns0:first xmlns:ns0=\"urn:a\"/><ns1:second xmlns:ns1=\"urn:a\"/></r>"
    );
}

#[test]
fn rebinding_shadows_the_outer_namespace() {
    let mut writer = Writer::new(Vec::new());
    writer.element_start("r").unwrap();
    writer.attribute("xmlns:p", "urn:outer").unwrap();
    writer.element_start("mid").unwrap();
    writer.attribute("xmlns:p", "urn:inner").unwrap();
    // urn:outer is shadowed, so a fresh prefix must be declared
    writer.element_start_ns("urn:outer", "leaf").unwrap();
    writer.element_end_empty().unwrap();
    writer.element_end().unwrap();
    // back outside the shadow, p works again
    writer.element_start_ns("urn:outer", "leaf").unwrap();
    writer.element_end_empty().unwrap();
    writer.element_end().unwrap();
    writer.eof().unwrap();

    assert_eq!(
        output(writer),
        "<r xmlns:p=\"urn:outer\"><mid xmlns:p=\"urn:inner\">\
         <ns0:leaf xmlns:ns0=\"urn:outer\"/></mid><p:leaf/></r>"
    );
}

#[test]
fn pending_bindings_are_dropped_when_the_scope_closes() {
    let mut writer = Writer::new(Vec::new());
    writer.element_start("r").unwrap();
    writer.element_start("a").unwrap();
    writer.text("x").unwrap();
    // staged inside <a>, but <a> closes before any element could carry it
    writer.bind_ns("gone", "urn:gone").unwrap();
    writer.element_end().unwrap();
    writer.element_start("b").unwrap();
    writer.element_end_empty().unwrap();
    writer.element_end().unwrap();
    writer.eof().unwrap();

    assert_eq!(output(writer), "<r><a>x</a><b/></r>");
}

#[test]
#[should_panic(expected = "the namespace must be non-empty")]
fn empty_namespace_panics() {
    let mut writer = Writer::new(Vec::new());
    writer.element_start_ns("", "r").unwrap();
}

#[test]
#[should_panic(expected = "the xmlns prefix is reserved")]
fn binding_the_xmlns_prefix_panics() {
    let mut writer = Writer::new(Vec::new());
    writer.element_start("r").unwrap();
    writer.bind_ns("xmlns", "urn:nope").unwrap();
}
