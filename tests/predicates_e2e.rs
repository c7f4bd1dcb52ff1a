use formfilter::{
    json_to_xml, parse_json, parse_xml, render_json, render_xml, render_xml_with, xml_to_json,
    FilterDialect, Predicate, PredicateKind, Timestamp, Value, ValueClass, PREDICATE_TABLE,
};

const CANNED_MILLIS: i64 = 1_544_447_380_000;

fn canned() -> Timestamp {
    Timestamp::from_millis(CANNED_MILLIS).unwrap()
}

/// One representative predicate per table row.
fn sample(kind: PredicateKind) -> Predicate {
    let operand = |i: i64| match kind.operand() {
        ValueClass::Text => Value::from(format!("value <{i}> & \"more\"")),
        ValueClass::Temporal => Value::Temporal(Timestamp::from_millis(CANNED_MILLIS + i * 1_001).unwrap()),
    };
    let values = (0..kind.arity()).map(|i| operand(i as i64)).collect();
    Predicate::new(kind, "some.property", values).unwrap()
}

#[test]
fn equality_predicate_renders_ogc_fragment() {
    let xml = json_to_xml(
        r#"{"title":"MY_TITLE","description":"MY_DESCRIPTION","id":"abcdefg","filterTemplate":{"type":"=","property":"language","value":"english"}}"#,
    )
    .unwrap();
    assert_eq!(
        xml,
        "<PropertyIsEqualTo><PropertyName>language</PropertyName><Literal>english</Literal></PropertyIsEqualTo>"
    );
}

#[test]
fn during_predicate_renders_epoch_millis() {
    let json = r#"{"filterTemplate":{"type":"DURING","property":"created","value":"2018-12-10T13:09:40Z/2018-12-10T13:09:40Z"}}"#;
    let xml = json_to_xml(json).unwrap();
    assert_eq!(
        xml,
        "<During><PropertyName>created</PropertyName><Literal>1544447380000/1544447380000</Literal></During>"
    );

    let p = parse_xml(&xml).unwrap();
    let (low, high) = p.range().unwrap();
    assert_eq!(low.to_xml_text(), "1544447380000");
    assert_eq!(high.to_xml_text(), "1544447380000");
}

#[test]
fn during_predicate_renders_both_json_views() {
    let xml = "<During><PropertyName>created</PropertyName><Literal>1544447380000/1544447381500</Literal></During>";
    assert_eq!(
        xml_to_json(xml).unwrap(),
        r#"{"filterTemplate":{"type":"DURING","property":"created","value":"2018-12-10T13:09:40Z/2018-12-10T13:09:41.500Z","from":"2018-12-10T13:09:40Z","to":"2018-12-10T13:09:41.500Z"}}"#
    );
}

#[test]
fn during_accepts_matching_bounds_and_rejects_divergent_ones() {
    let matching = r#"{"filterTemplate":{"type":"DURING","property":"created","value":"2018-12-10T13:09:40Z/2018-12-10T13:09:40Z","from":"2018-12-10T14:09:40+01:00","to":"2018-12-10T13:09:40Z"}}"#;
    assert_eq!(parse_json(matching).unwrap(), Predicate::during("created", canned(), canned()).unwrap());

    let divergent = r#"{"filterTemplate":{"type":"DURING","property":"created","value":"2018-12-10T13:09:40Z/2018-12-10T13:09:40Z","from":"2019-01-01T00:00:00Z","to":"2018-12-10T13:09:40Z"}}"#;
    assert!(parse_json(divergent).unwrap_err().is_malformed());
}

#[test]
fn unknown_kinds_are_rejected() {
    let err = parse_xml("<PropertyIsBetween><PropertyName>a</PropertyName><Literal>1</Literal></PropertyIsBetween>")
        .unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(err.kind(), "unsupported_predicate_kind");

    let err = parse_json(r#"{"filterTemplate":{"type":"BETWEEN","property":"a","value":"1"}}"#).unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn table_tokens_and_elements_are_unique() {
    for (i, a) in PREDICATE_TABLE.iter().enumerate() {
        assert_eq!(a.kind.spec(), a, "table order must follow the enum");
        for b in &PREDICATE_TABLE[i + 1..] {
            assert_ne!(a.json_token, b.json_token);
            assert_ne!(a.xml_element, b.xml_element);
        }
    }
}

#[test]
fn every_kind_is_inverse_consistent() {
    for row in PREDICATE_TABLE {
        let p = sample(row.kind);
        assert_eq!(parse_json(&render_json(&p).unwrap()).unwrap(), p, "{}", row.json_token);
        assert_eq!(parse_xml(&render_xml(&p)).unwrap(), p, "{}", row.xml_element);
        assert_eq!(
            parse_xml(&render_xml_with(&p, FilterDialect::Fes2)).unwrap(),
            p,
            "{} (fes2)",
            row.xml_element
        );
    }
}

#[test]
fn every_kind_round_trips_between_encodings() {
    for row in PREDICATE_TABLE {
        let json = render_json(&sample(row.kind)).unwrap();
        assert_eq!(xml_to_json(&json_to_xml(&json).unwrap()).unwrap(), json, "{}", row.json_token);
    }
}

#[test]
fn iso_looking_text_stays_text() {
    let json = r#"{"filterTemplate":{"type":"=","property":"note","value":"2018-12-10T13:09:40Z"}}"#;
    let xml = json_to_xml(json).unwrap();
    assert!(xml.contains("<Literal>2018-12-10T13:09:40Z</Literal>"));
    assert_eq!(xml_to_json(&xml).unwrap(), json);
}

#[test]
fn temporal_errors_surface() {
    let json = r#"{"filterTemplate":{"type":"BEFORE","property":"created","value":"yesterday"}}"#;
    assert!(json_to_xml(json).unwrap_err().is_timestamp());

    let xml = "<After><PropertyName>created</PropertyName><Literal>2018-12-10</Literal></After>";
    assert!(xml_to_json(xml).unwrap_err().is_timestamp());
}

#[test]
fn malformed_documents_are_rejected() {
    let cases = [
        "not json",
        r#"{"filterTemplate":{"type":"=","value":"x"}}"#,
        r#"{"filterTemplate":{"type":"=","property":"  ","value":"x"}}"#,
        r#"{"filterTemplate":{"type":"=","property":"p","value":7}}"#,
        r#"{"filterTemplate":{"type":"DURING","property":"p","value":"2018-12-10T13:09:40Z"}}"#,
        r#"{"other":{}}"#,
    ];
    for case in cases {
        assert!(json_to_xml(case).unwrap_err().is_malformed(), "{case}");
    }

    let cases = [
        "<PropertyIsEqualTo><PropertyName>p</PropertyName></PropertyIsEqualTo>",
        "<PropertyIsEqualTo><Literal>x</Literal></PropertyIsEqualTo>",
        "<PropertyIsEqualTo><PropertyName>p</PropertyName><Literal>x</Literal>",
    ];
    for case in cases {
        assert!(xml_to_json(case).unwrap_err().is_malformed(), "{case}");
    }
}

#[test]
fn bad_escapes_are_rejected() {
    let json = r#"{"filterTemplate":{"type":"=","property":"p","value":"bad \x escape"}}"#;
    assert!(parse_json(json).is_err());

    let xml = "<PropertyIsEqualTo><PropertyName>p</PropertyName><Literal>&bogus;</Literal></PropertyIsEqualTo>";
    assert!(parse_xml(xml).unwrap_err().is_escape());
}

#[test]
fn inverted_during_range_is_carried_as_is() {
    let xml = "<During><PropertyName>created</PropertyName><Literal>1544447381000/1544447380000</Literal></During>";
    let json = r#"{"filterTemplate":{"type":"DURING","property":"created","value":"2018-12-10T13:09:41Z/2018-12-10T13:09:40Z","from":"2018-12-10T13:09:41Z","to":"2018-12-10T13:09:40Z"}}"#;

    assert_eq!(xml_to_json(xml).unwrap(), json);
    assert_eq!(json_to_xml(json).unwrap(), xml);

    let p = parse_json(json).unwrap();
    let (low, high) = p.range().unwrap();
    assert!(low.as_temporal().unwrap() > high.as_temporal().unwrap());
    assert_eq!(parse_xml(&render_xml(&p)).unwrap(), p);
}

#[test]
fn single_instant_kinds_ignore_range_fields() {
    let json = r#"{"filterTemplate":{"type":"BEFORE","property":"created","value":"2018-12-10T13:09:40Z","from":"junk","to":"2001-01-01T00:00:00Z"}}"#;
    let xml = json_to_xml(json).unwrap();
    assert_eq!(
        xml,
        "<Before><PropertyName>created</PropertyName><Literal>1544447380000</Literal></Before>"
    );
    assert_eq!(
        xml_to_json(&xml).unwrap(),
        r#"{"filterTemplate":{"type":"BEFORE","property":"created","value":"2018-12-10T13:09:40Z"}}"#
    );

    let json = r#"{"filterTemplate":{"type":"AFTER","property":"created","value":"2018-12-10T13:09:40Z","from":"2018-12-10T13:09:40Z","to":"2018-12-10T13:09:40Z"}}"#;
    let p = parse_json(json).unwrap();
    assert_eq!(p.kind(), PredicateKind::After);
    assert_eq!(p.values(), &[Value::Temporal(canned())]);
    assert!(p.range().is_none());
}

#[test]
fn characters_xml_cannot_carry_are_rejected() {
    let json = r#"{"filterTemplate":{"type":"=","property":"title","value":"a\u0001b"}}"#;
    let err = json_to_xml(json).unwrap_err();
    assert!(err.is_malformed());

    assert!(Predicate::equals("title", "a\u{1}b").unwrap_err().is_malformed());

    let xml = "<PropertyIsEqualTo><PropertyName>title</PropertyName><Literal>a&#1;b</Literal></PropertyIsEqualTo>";
    assert!(xml_to_json(xml).is_err());
}

#[test]
fn control_characters_that_xml_allows_round_trip() {
    let p = Predicate::equals("title", "line one\r\nline\ttwo").unwrap();
    assert_eq!(parse_json(&render_json(&p).unwrap()).unwrap(), p);
    assert_eq!(parse_xml(&render_xml(&p)).unwrap(), p);
}
