//! Attribute reference grammar
//!
//! ```text
//! [&] [<request> "."] [<list> ":"] <attribute> [":" <tag>] ["[" (<index> | "*") "]"]
//! ```
//!
//! The driver walks the input left to right, consuming one qualifier at a
//! time. Tag and index suffixes and numeric attribute names are handed to
//! the chumsky parsers in [`super::qualifier`].

use std::borrow::Cow;

use super::lexer::{has_unescaped_percent, lex_value, unescape, Quote};
use super::qualifier::{instance_suffix, numeric_attr, tag_suffix};
use crate::dict::{is_allowed_char, Catalogue, DictAttr, MAX_ATTR_NAME_LEN};
use crate::template::verify::verify_tmpl;
use crate::template::{
    AttrDescriptor, AttrRef, Instance, ListKind, ListRef, RequestRef, Tag, Template, TemplateKind,
    UnknownAttrRef,
};
use crate::ParseError;

/// Outcome of parsing a reference that may turn out to be plain text
#[derive(Debug, Clone, PartialEq)]
pub enum AttrParse<'a> {
    /// A reference, and how many bytes of the input it occupied
    Parsed {
        template: Template<'a>,
        consumed: usize,
    },
    /// No attribute was named; the caller should treat the text as a literal
    Literal,
}

enum Outcome<'a> {
    Parsed(Template<'a>, usize),
    NoAttribute { offset: usize },
}

/// Length of the run of attribute name characters at the start of `text`
fn name_run(text: &str) -> usize {
    text.bytes().take_while(|c| is_allowed_char(*c)).count()
}

/// `<request>.` prefix, returning the request and the bytes consumed
///
/// Text before the first `.` that is not a request name (as in an IP
/// address) leaves the default in place.
fn request_qualifier(rest: &str) -> Option<(RequestRef, usize)> {
    let run = &rest[..name_run(rest)];
    let dot = run.find('.')?;
    RequestRef::from_name(&run[..dot]).map(|request| (request, dot + 1))
}

enum ListQualifier {
    /// `<list>:`, consuming the name and colon
    Prefixed(ListKind, usize),
    /// A list name that is the whole of the remaining input
    Whole(ListKind),
    None,
}

/// Whether the text after a colon is a tag: digits up to the end or `[`
///
/// A leading minus is taken as part of a tag so that it is reported as out
/// of range.
fn is_tag_lookahead(after_colon: &str) -> bool {
    let after_colon = after_colon.strip_prefix('-').unwrap_or(after_colon);
    let digits = after_colon.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && matches!(after_colon.as_bytes().get(digits), None | Some(b'['))
}

/// `<list>:` prefix
///
/// A colon followed by a tag belongs to the attribute, so the lookahead for
/// a tag runs before any list name is matched.
fn list_qualifier(rest: &str) -> Result<ListQualifier, ParseError> {
    let run = name_run(rest);
    let name = &rest[..run];

    match rest.as_bytes().get(run) {
        Some(b':') => {
            if is_tag_lookahead(&rest[run + 1..]) {
                return Ok(ListQualifier::None);
            }
            ListKind::from_name(name)
                .map(|list| ListQualifier::Prefixed(list, run + 1))
                .ok_or(ParseError::InvalidList { offset: 0 })
        }
        None if run > 0 => Ok(ListKind::from_name(name)
            .map_or(ListQualifier::None, ListQualifier::Whole)),
        _ => Ok(ListQualifier::None),
    }
}

/// Resolve the attribute name at the start of `rest`
///
/// Catalogue names take precedence; failing that the numeric forms are
/// tried, and a number the catalogue knows still yields its descriptor.
fn attribute_name(rest: &str, catalogue: &Catalogue) -> Option<(AttrDescriptor, usize)> {
    if let Some((da, len)) = catalogue.attr_from_substr(rest) {
        return Some((AttrDescriptor::Known(da), len));
    }

    let numeric = numeric_attr(rest)?;
    let descriptor = match catalogue.by_value(numeric.attr, numeric.vendor) {
        Some(da) => AttrDescriptor::Known(da),
        None => AttrDescriptor::Unknown(Box::new(DictAttr::unknown(
            &rest[..numeric.len],
            numeric.attr,
            numeric.vendor,
        ))),
    };
    Some((descriptor, numeric.len))
}

fn parse_reference<'a>(
    text: &'a str,
    catalogue: &Catalogue,
    request_default: RequestRef,
    list_default: ListKind,
) -> Result<Outcome<'a>, ParseError> {
    let force = text.starts_with('&');
    let mut p = usize::from(force);

    let mut request = request_default;
    if let Some((found, len)) = request_qualifier(&text[p..]) {
        request = found;
        p += len;
    }

    let mut list = list_default;
    match list_qualifier(&text[p..]).map_err(|e| e.shifted(p))? {
        ListQualifier::Prefixed(found, len) => {
            list = found;
            p += len;
        }
        ListQualifier::Whole(found) => {
            let list = ListRef {
                request,
                list: found,
            };
            let template = Template::new(TemplateKind::List(list), text);
            return Ok(Outcome::Parsed(template, text.len()));
        }
        ListQualifier::None => {}
    }

    // Nothing left but the qualifiers: the whole list is meant
    if p == text.len() && p > usize::from(force) {
        let template = Template::new(TemplateKind::List(ListRef { request, list }), text);
        return Ok(Outcome::Parsed(template, p));
    }

    let rest = &text[p..];
    let Some((da, len)) = attribute_name(rest, catalogue) else {
        if !force {
            return Ok(Outcome::NoAttribute { offset: p });
        }
        return unknown_reference(text, p, request, list).map(|(t, n)| Outcome::Parsed(t, n));
    };
    p += len;

    let mut tag = Tag::Any;
    if text[p..].starts_with(':') {
        if !da.flags.has_tag {
            return Err(ParseError::TagNotAllowed {
                name: da.name.clone(),
                offset: p,
            });
        }
        let (value, len) = tag_suffix(&text[p..]).map_err(|e| e.shifted(p))?;
        tag = Tag::Value(value);
        p += len;
    }

    let mut num = Instance::Any;
    if text[p..].starts_with('[') {
        let (instance, len) = instance_suffix(&text[p..]).map_err(|e| e.shifted(p))?;
        num = instance;
        p += len;
    }

    let template = Template::new(
        TemplateKind::Attribute(AttrRef {
            request,
            list,
            da,
            tag,
            num,
        }),
        &text[..p],
    );
    Ok(Outcome::Parsed(template, p))
}

/// Capture an unrecognised name after `&` so it can be defined later
fn unknown_reference<'a>(
    text: &'a str,
    start: usize,
    request: RequestRef,
    list: ListKind,
) -> Result<(Template<'a>, usize), ParseError> {
    let run = name_run(&text[start..]);
    if run == 0 {
        return Err(ParseError::ExpectedAttribute { offset: start });
    }
    if run > MAX_ATTR_NAME_LEN {
        return Err(ParseError::NameTooLong { offset: start });
    }
    let mut p = start + run;
    let name = text[start..p].to_string();

    if text[p..].starts_with(':') {
        return Err(ParseError::TagNotAllowed { name, offset: p });
    }

    let mut num = Instance::Any;
    if text[p..].starts_with('[') {
        let (instance, len) = instance_suffix(&text[p..]).map_err(|e| e.shifted(p))?;
        num = instance;
        p += len;
    }

    let template = Template::new(
        TemplateKind::UnknownAttribute(UnknownAttrRef {
            request,
            list,
            name,
            num,
        }),
        &text[..p],
    );
    Ok((template, p))
}

/// Parse an attribute reference from the start of `text`
///
/// Parsing may stop before the end of the input; the consumed length is
/// returned with the template. Without a leading `&`, text that names no
/// attribute yields [`AttrParse::Literal`].
pub fn parse_attr_substr<'a>(
    text: &'a str,
    catalogue: &Catalogue,
    request: RequestRef,
    list: ListKind,
) -> Result<AttrParse<'a>, ParseError> {
    match parse_reference(text, catalogue, request, list)? {
        Outcome::Parsed(template, consumed) => {
            verify_tmpl!(template, catalogue);
            Ok(AttrParse::Parsed { template, consumed })
        }
        Outcome::NoAttribute { .. } => {
            tracing::debug!(text, "No attribute named, treating as literal");
            Ok(AttrParse::Literal)
        }
    }
}

/// Parse an attribute reference that must occupy the whole of `text`
pub fn parse_attr_str<'a>(
    text: &'a str,
    catalogue: &Catalogue,
    request: RequestRef,
    list: ListKind,
) -> Result<Template<'a>, ParseError> {
    match parse_reference(text, catalogue, request, list)? {
        Outcome::Parsed(template, consumed) if consumed == text.len() => {
            verify_tmpl!(template, catalogue);
            Ok(template)
        }
        Outcome::Parsed(_, consumed) => Err(ParseError::TrailingText { offset: consumed }),
        Outcome::NoAttribute { offset } => Err(ParseError::ExpectedAttribute { offset }),
    }
}

impl<'a> Template<'a> {
    /// Build a template from a configuration value token
    ///
    /// Bare words are tried as attribute references first. A word that
    /// starts with `&` must be one; any other word that fails to parse is a
    /// literal. Quoted strings map to literals, expansions or commands by
    /// their quoting, and `/pattern/` to a regex.
    pub fn from_token(
        input: &'a str,
        catalogue: &Catalogue,
        request: RequestRef,
        list: ListKind,
    ) -> Result<Template<'a>, ParseError> {
        let token = lex_value(input)?;
        let start = token.span.start;

        let template = match token.quote {
            Quote::Bare => {
                let word = &input[token.span.clone()];
                match parse_attr_str(word, catalogue, request, list) {
                    Ok(template) => template,
                    Err(err) if word.starts_with('&') => return Err(err.shifted(start)),
                    Err(err) => {
                        tracing::debug!(
                            word,
                            %err,
                            "Bare word is not a reference, treating as literal"
                        );
                        Template::literal(word)
                    }
                }
            }
            Quote::Single => Template::literal(unescape(&token.text, token.quote)),
            Quote::Double if has_unescaped_percent(&token.text) => {
                Template::xlat(unescape(&token.text, token.quote))
            }
            Quote::Double => Template::literal(unescape(&token.text, token.quote)),
            Quote::Back => Template::exec(unescape(&token.text, token.quote)),
            Quote::Regex { case_insensitive } => Template::new(
                TemplateKind::Regex {
                    case_insensitive,
                    compiled: None,
                },
                Cow::Owned(unescape(&token.text, token.quote)),
            ),
        };

        verify_tmpl!(template, catalogue);
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<Template<'_>, ParseError> {
        parse_attr_str(text, &Catalogue::builtin(), RequestRef::Current, ListKind::Request)
    }

    fn attr_of(template: &Template<'_>) -> AttrRef {
        template.attr_ref().cloned().expect("attribute reference")
    }

    #[test]
    fn test_plain_attribute() {
        let template = parse("&User-Name").unwrap();
        let attr = attr_of(&template);
        assert_eq!(attr.da.name, "User-Name");
        assert_eq!(attr.request, RequestRef::Current);
        assert_eq!(attr.list, ListKind::Request);
        assert_eq!(attr.tag, Tag::Any);
        assert_eq!(attr.num, Instance::Any);
        assert_eq!(template.name(), "&User-Name");
    }

    #[test]
    fn test_qualifiers() {
        let attr = attr_of(&parse("&outer.reply:Tunnel-Type:3[2]").unwrap());
        assert_eq!(attr.request, RequestRef::Outer);
        assert_eq!(attr.list, ListKind::Reply);
        assert_eq!(attr.tag, Tag::Value(3));
        assert_eq!(attr.num, Instance::Index(2));

        let attr = attr_of(&parse("current.config:Cleartext-Password").unwrap());
        assert_eq!(attr.list, ListKind::Control);
    }

    #[test]
    fn test_tag_lookahead_beats_list() {
        let attr = attr_of(&parse("Tunnel-Type:1").unwrap());
        assert_eq!(attr.list, ListKind::Request);
        assert_eq!(attr.tag, Tag::Value(1));

        let attr = attr_of(&parse("Tunnel-Type:1[0]").unwrap());
        assert_eq!(attr.tag, Tag::Value(1));
        assert_eq!(attr.num, Instance::Index(0));
    }

    #[test]
    fn test_default_scope_is_used() {
        let catalogue = Catalogue::builtin();
        let template =
            parse_attr_str("User-Name", &catalogue, RequestRef::Parent, ListKind::Reply).unwrap();
        let attr = attr_of(&template);
        assert_eq!(attr.request, RequestRef::Parent);
        assert_eq!(attr.list, ListKind::Reply);
    }

    #[test]
    fn test_ip_address_is_not_a_request() {
        let catalogue = Catalogue::builtin();
        let parsed =
            parse_attr_substr("127.0.0.1", &catalogue, RequestRef::Current, ListKind::Request)
                .unwrap();
        assert_eq!(parsed, AttrParse::Literal);
    }

    #[test]
    fn test_invalid_list() {
        assert_eq!(
            parse("&bogus:User-Name"),
            Err(ParseError::InvalidList { offset: 1 })
        );
        assert_eq!(
            parse("&parent.bogus:User-Name"),
            Err(ParseError::InvalidList { offset: 8 })
        );
    }

    #[test]
    fn test_tag_errors() {
        assert_eq!(
            parse("&User-Name:1"),
            Err(ParseError::TagNotAllowed {
                name: "User-Name".to_string(),
                offset: 10
            })
        );
        assert_eq!(
            parse("&reply:Tunnel-Type:32"),
            Err(ParseError::InvalidTag {
                value: "32".to_string(),
                offset: 19
            })
        );
    }

    #[test]
    fn test_index_errors() {
        assert_eq!(
            parse("&User-Name[1001]"),
            Err(ParseError::InvalidIndex {
                value: "1001".to_string(),
                offset: 11
            })
        );
        assert_eq!(
            parse("&User-Name[x]"),
            Err(ParseError::IndexNotInteger { offset: 11 })
        );
        assert_eq!(
            parse("&User-Name[3"),
            Err(ParseError::UnclosedIndex { offset: 12 })
        );
    }

    #[test]
    fn test_list_references() {
        let template = parse("request:").unwrap();
        assert!(template.is_list());
        assert_eq!(template.scope(), Some((RequestRef::Current, ListKind::Request)));

        let template = parse("&parent.reply").unwrap();
        assert_eq!(template.scope(), Some((RequestRef::Parent, ListKind::Reply)));

        let template = parse("outer.").unwrap();
        assert_eq!(template.scope(), Some((RequestRef::Outer, ListKind::Request)));
    }

    #[test]
    fn test_marker_alone_is_an_error() {
        assert_eq!(parse("&"), Err(ParseError::ExpectedAttribute { offset: 1 }));
        assert_eq!(
            parse_attr_substr("", &Catalogue::builtin(), RequestRef::Current, ListKind::Request),
            Ok(AttrParse::Literal)
        );
    }

    #[test]
    fn test_numeric_names() {
        let known = attr_of(&parse("&Attr-1").unwrap());
        assert_eq!(known.da.name, "User-Name");
        assert!(!known.da.is_unknown());

        let unknown = attr_of(&parse("&Attr-26.9999.7").unwrap());
        assert!(unknown.da.is_unknown());
        assert!(unknown.da.flags.is_unknown);
        assert_eq!(unknown.da.vendor, 9999);
        assert_eq!(unknown.da.attr, 7);
        assert_eq!(unknown.da.name, "Attr-26.9999.7");
    }

    #[test]
    fn test_unknown_name_capture() {
        let template = parse("&reply:Made-Up-Attribute[1]").unwrap();
        match &template.kind {
            TemplateKind::UnknownAttribute(unknown) => {
                assert_eq!(unknown.name, "Made-Up-Attribute");
                assert_eq!(unknown.list, ListKind::Reply);
                assert_eq!(unknown.num, Instance::Index(1));
            }
            other => panic!("expected unknown attribute, got {other:?}"),
        }

        let long = format!("&{}", "A".repeat(129));
        assert_eq!(parse(&long), Err(ParseError::NameTooLong { offset: 1 }));
    }

    #[test]
    fn test_substr_stops_early() {
        let catalogue = Catalogue::builtin();
        let text = "&User-Name == bob";
        match parse_attr_substr(text, &catalogue, RequestRef::Current, ListKind::Request) {
            Ok(AttrParse::Parsed { template, consumed }) => {
                assert_eq!(consumed, 10);
                assert_eq!(template.name(), "&User-Name");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            parse("&User-Name == bob"),
            Err(ParseError::TrailingText { offset: 10 })
        );
    }

    #[test]
    fn test_from_token_dispatch() {
        let catalogue = Catalogue::builtin();
        let token = |input| {
            Template::from_token(input, &catalogue, RequestRef::Current, ListKind::Request)
        };

        assert!(token("&User-Name").unwrap().is_attribute());
        assert!(token("bob").unwrap().is_literal());
        assert!(token("'&User-Name'").unwrap().is_literal());
        assert_eq!(token("\"%{User-Name}\"").unwrap().kind, TemplateKind::Xlat);
        assert_eq!(token("\"plain\"").unwrap().kind, TemplateKind::Literal);
        assert_eq!(token("`/bin/true`").unwrap().kind, TemplateKind::Exec);

        let regex = token("/^bob/i").unwrap();
        assert_eq!(regex.name(), "^bob");
        assert!(matches!(
            regex.kind,
            TemplateKind::Regex {
                case_insensitive: true,
                compiled: None
            }
        ));

        assert_eq!(
            token("  &User-Name:3"),
            Err(ParseError::TagNotAllowed {
                name: "User-Name".to_string(),
                offset: 12
            })
        );
    }
}
