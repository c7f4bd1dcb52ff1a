use formfilter::{json_to_xml, xml_to_json, Predicate};

/// Characters users type into search fields that are structural in at least
/// one of the two encodings, plus neighbours that must pass through untouched.
const SYMBOLS: [char; 31] = [
    '\'', '"', '\\', '>', '<', '&', '{', '}', '[', ']', ':', ';', ',', '.', '?', '|', '-', '_',
    '+', '=', '*', '^', '%', '$', '#', '@', '!', '~', '`', '(', ')',
];

fn json_literal(c: char) -> String {
    match c {
        '"' => "\\\"".to_string(),
        '\\' => "\\\\".to_string(),
        c => c.to_string(),
    }
}

fn xml_literal(c: char) -> String {
    match c {
        '>' => "&gt;".to_string(),
        '<' => "&lt;".to_string(),
        '&' => "&amp;".to_string(),
        c => c.to_string(),
    }
}

fn json_doc(c: char) -> String {
    format!(
        r#"{{"filterTemplate":{{"type":"=","property":"title","value":"hello{}"}}}}"#,
        json_literal(c)
    )
}

fn xml_doc(c: char) -> String {
    format!(
        "<PropertyIsEqualTo><PropertyName>title</PropertyName><Literal>hello{}</Literal></PropertyIsEqualTo>",
        xml_literal(c)
    )
}

#[test]
fn every_symbol_maps_json_to_xml() {
    for c in SYMBOLS {
        let xml = json_to_xml(&json_doc(c)).unwrap_or_else(|e| panic!("symbol {c:?}: {e}"));
        assert_eq!(xml, xml_doc(c), "symbol {c:?}");
    }
}

#[test]
fn every_symbol_maps_xml_to_json() {
    for c in SYMBOLS {
        let json = xml_to_json(&xml_doc(c)).unwrap_or_else(|e| panic!("symbol {c:?}: {e}"));
        assert_eq!(json, json_doc(c), "symbol {c:?}");
    }
}

#[test]
fn every_symbol_round_trips_through_xml() {
    for c in SYMBOLS {
        let original = json_doc(c);
        let back = xml_to_json(&json_to_xml(&original).unwrap()).unwrap();
        assert_eq!(back, original, "symbol {c:?}");
    }
}

#[test]
fn symbols_reach_the_model_unescaped() {
    for c in SYMBOLS {
        let expected = Predicate::equals("title", format!("hello{c}")).unwrap();
        assert_eq!(formfilter::parse_json(&json_doc(c)).unwrap(), expected, "symbol {c:?}");
        assert_eq!(formfilter::parse_xml(&xml_doc(c)).unwrap(), expected, "symbol {c:?}");
    }
}

#[test]
fn all_symbols_in_one_value() {
    let raw: String = SYMBOLS.iter().collect();
    let p = Predicate::equals("title", raw.clone()).unwrap();
    let json = formfilter::render_json(&p).unwrap();
    let xml = json_to_xml(&json).unwrap();
    assert_eq!(formfilter::parse_xml(&xml).unwrap().values()[0].as_text(), Some(raw.as_str()));
    assert_eq!(xml_to_json(&xml).unwrap(), json);
}

#[test]
fn escape_lookalikes_are_not_resolved_twice() {
    // A user who types a literal entity must get it back verbatim.
    let json = r#"{"filterTemplate":{"type":"=","property":"title","value":"&amp; \\n"}}"#;
    let xml = json_to_xml(json).unwrap();
    assert!(xml.contains("<Literal>&amp;amp; \\n</Literal>"));
    assert_eq!(xml_to_json(&xml).unwrap(), json);
}
