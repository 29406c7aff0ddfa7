//! Integration tests for the reference grammar and printer

use attr_template::template::{Instance, Tag};
use attr_template::{
    parse_attr_str, parse_attr_substr, AttrParse, Catalogue, ListKind, ParseError, RequestRef,
    Template, TemplateKind,
};
use insta::assert_snapshot;
use pretty_assertions::assert_eq;

fn parse<'a>(text: &'a str, catalogue: &Catalogue) -> Result<Template<'a>, ParseError> {
    parse_attr_str(text, catalogue, RequestRef::Current, ListKind::Request)
}

#[test]
fn test_canonical_round_trip() {
    let catalogue = Catalogue::builtin();
    let canonical = [
        "&User-Name",
        "&reply:Reply-Message",
        "&control:Auth-Type[0]",
        "&parent.reply:Tunnel-Type:1[0]",
        "&outer.proxy-request:User-Name[*]",
        "&outer.coa-reply:Tunnel-Password:31[1000]",
        "&parent.disconnect:Cisco-AVPair[2]",
        "&reply:Tunnel-Private-Group-Id:0",
        "&proxy-reply:Made-Up-Name[4]",
        "&Attr-26.4242.7[1]",
    ];

    for text in canonical {
        let tmpl = parse(text, &catalogue).unwrap_or_else(|e| panic!("{text}: {e}"));
        assert_eq!(tmpl.to_string(), text);
    }
}

#[test]
fn test_every_tag_in_range() {
    let catalogue = Catalogue::builtin();
    for tag in 0..=31u8 {
        let text = format!("&Tunnel-Type:{tag}");
        let tmpl = parse(&text, &catalogue).unwrap();
        assert_eq!(tmpl.attr_ref().map(|a| a.tag), Some(Tag::Value(tag)));
    }
}

#[test]
fn test_out_of_range_tags() {
    let catalogue = Catalogue::builtin();
    assert_eq!(
        parse("&Tunnel-Type:32", &catalogue),
        Err(ParseError::InvalidTag {
            value: "32".to_string(),
            offset: 13
        })
    );
    assert_eq!(
        parse("&Tunnel-Type:-1", &catalogue),
        Err(ParseError::InvalidTag {
            value: "-1".to_string(),
            offset: 13
        })
    );
}

#[test]
fn test_instance_bounds() {
    let catalogue = Catalogue::builtin();
    let num = |text| parse(text, &catalogue).map(|t| t.attr_ref().map(|a| a.num));

    assert_eq!(num("&User-Name[0]"), Ok(Some(Instance::Index(0))));
    assert_eq!(num("&User-Name[1000]"), Ok(Some(Instance::Index(1000))));
    assert_eq!(num("&User-Name[*]"), Ok(Some(Instance::All)));
    assert_eq!(
        num("&User-Name[1001]"),
        Err(ParseError::InvalidIndex {
            value: "1001".to_string(),
            offset: 11
        })
    );
}

#[test]
fn test_qualifiers_alone_make_a_list_reference() {
    let catalogue = Catalogue::builtin();
    match parse_attr_substr("request:", &catalogue, RequestRef::Current, ListKind::Reply) {
        Ok(AttrParse::Parsed { template, consumed }) => {
            assert_eq!(consumed, 8);
            assert!(template.is_list());
            assert_eq!(template.scope(), Some((RequestRef::Current, ListKind::Request)));
        }
        other => panic!("expected a list reference, got {other:?}"),
    }
}

#[test]
fn test_literal_fallback() {
    let catalogue = Catalogue::builtin();
    for text in ["hello", "127.0.0.1", "no-such-attribute"] {
        assert_eq!(
            parse_attr_substr(text, &catalogue, RequestRef::Current, ListKind::Request),
            Ok(AttrParse::Literal),
            "{text}"
        );
    }
}

#[test]
fn test_marker_requires_an_attribute() {
    let catalogue = Catalogue::builtin();
    assert_eq!(
        parse("&reply:User-Name:1", &catalogue),
        Err(ParseError::TagNotAllowed {
            name: "User-Name".to_string(),
            offset: 16
        })
    );
    assert_eq!(
        parse("&reply:", &catalogue).map(|t| t.kind.name()),
        Ok("list")
    );
    assert_eq!(
        parse("&nonsense:User-Name", &catalogue),
        Err(ParseError::InvalidList { offset: 1 })
    );
}

#[test]
fn test_unknown_attributes_take_no_tag() {
    let catalogue = Catalogue::builtin();
    assert_eq!(
        parse("&Made-Up:1", &catalogue),
        Err(ParseError::TagNotAllowed {
            name: "Made-Up".to_string(),
            offset: 8
        })
    );
    assert_eq!(
        parse("&Attr-26.4242.7:1", &catalogue),
        Err(ParseError::TagNotAllowed {
            name: "Attr-26.4242.7".to_string(),
            offset: 15
        })
    );
}

#[test]
fn test_vendor_zero_is_not_a_vendor_attribute() {
    let catalogue = Catalogue::builtin();
    let tmpl = parse("&Attr-26.0.5", &catalogue).unwrap();
    assert_eq!(tmpl.kind.name(), "unknown attribute");
    assert_eq!(tmpl.to_string(), "&Attr-26.0.5");
    assert_eq!(
        parse("&Attr-26.9.1", &catalogue).unwrap().to_string(),
        "&Cisco-AVPair"
    );
}

#[test]
fn test_diagnostic_points_at_qualifier() {
    let catalogue = Catalogue::builtin();
    let source = "&reply:Tunnel-Type:40";
    let err = parse(source, &catalogue).unwrap_err();
    assert_eq!(err.slen(), -19);

    let report = err.format(source, "reference");
    assert!(report.contains("invalid tag value '40' (should be between 0-31)"));
    assert!(report.contains(source));
}

#[test]
fn test_value_tokens() {
    let catalogue = Catalogue::builtin();
    let token = |text| {
        Template::from_token(text, &catalogue, RequestRef::Current, ListKind::Request)
            .unwrap()
            .to_string()
    };

    assert_snapshot!(token("&reply:Tunnel-Type:2"), @"&reply:Tunnel-Type:2");
    assert_snapshot!(token("'a literal'"), @"'a literal'");
    assert_snapshot!(token(r#""%{User-Name}""#), @r#""%{User-Name}""#);
    assert_snapshot!(token("`/bin/echo hi`"), @"`/bin/echo hi`");
    assert_snapshot!(token("/^[a-z]+$/i"), @"/^[a-z]+$/i");
    assert_snapshot!(token("plain-word"), @"plain-word");
}

#[test]
fn test_regex_tokens_reprint_unchanged() {
    let catalogue = Catalogue::builtin();
    let token = |text: &str| {
        Template::from_token(text, &catalogue, RequestRef::Current, ListKind::Request)
            .unwrap()
            .into_owned()
    };

    for source in [r"/\d+/", r"/^a\/b\\$/i", r"/\s*x/"] {
        let first = token(source);
        let printed = first.to_string();
        assert_eq!(printed, source);
        assert_eq!(token(&printed).name(), first.name());
    }
    assert_eq!(token(r"/\d+/").name(), r"\d+");
}

#[test]
fn test_value_token_errors() {
    let catalogue = Catalogue::builtin();
    let token =
        |text| Template::from_token(text, &catalogue, RequestRef::Current, ListKind::Request);

    assert_eq!(token("  "), Err(ParseError::EmptyValue { offset: 2 }));
    assert_eq!(token("'unterminated"), Err(ParseError::InvalidToken { offset: 0 }));
    assert_eq!(token("a b"), Err(ParseError::TrailingValue { offset: 2 }));
    assert_eq!(
        token("&User-Name[x]"),
        Err(ParseError::IndexNotInteger { offset: 11 })
    );
    assert!(matches!(token("bob:x").map(|t| t.kind), Ok(TemplateKind::Literal)));
}

#[test]
fn test_owned_template_outlives_source() {
    let catalogue = Catalogue::builtin();
    let owned = {
        let source = String::from("&reply:Tunnel-Type:4[1]");
        parse(&source, &catalogue).unwrap().into_owned()
    };
    assert_eq!(owned.name(), "&reply:Tunnel-Type:4[1]");
    assert_eq!(owned.to_string(), "&reply:Tunnel-Type:4[1]");
}
