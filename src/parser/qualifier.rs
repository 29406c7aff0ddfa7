//! Suffix and numeric-name parsers built with chumsky
//!
//! Each parser here runs on the remainder of the input from the point the
//! grammar driver has reached, reports how many bytes it consumed, and turns
//! chumsky's errors into [`ParseError`]s relative to that remainder.

use chumsky::prelude::*;

use crate::dict::is_allowed_char;
use crate::template::{Instance, MAX_INSTANCE, MAX_TAG};
use crate::ParseError;

type Extra<'a> = extra::Err<Rich<'a, char>>;

fn digits<'a>() -> impl Parser<'a, &'a str, String, Extra<'a>> + Clone {
    any()
        .filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .collect::<String>()
}

/// Digits after `:`, with an optional minus sign so that negative tags are
/// reported as out of range rather than as garbage
fn tag_parser<'a>() -> impl Parser<'a, &'a str, (String, SimpleSpan), Extra<'a>> {
    just(':')
        .ignore_then(
            just('-')
                .or_not()
                .then(digits())
                .map_with(|(sign, digits), e| {
                    let text = match sign {
                        Some(_) => format!("-{}", digits),
                        None => digits,
                    };
                    (text, e.span())
                }),
        )
        .then_ignore(any().repeated())
}

/// Parse a `:<tag>` suffix at the start of `rest`
///
/// Returns the tag and the number of bytes consumed.
pub(crate) fn tag_suffix(rest: &str) -> Result<(u8, usize), ParseError> {
    let (text, span) = tag_parser()
        .parse(rest)
        .into_result()
        .map_err(|errs| {
            let offset = errs.first().map_or(1, |e| e.span().into_range().start);
            ParseError::TagNotInteger { offset }
        })?;

    let start = span.into_range().start;
    match text.parse::<u8>() {
        Ok(tag) if tag <= MAX_TAG => Ok((tag, span.into_range().end)),
        _ => Err(ParseError::InvalidTag {
            value: text,
            offset: start,
        }),
    }
}

#[derive(Debug, Clone)]
enum IndexText {
    All,
    Digits(String, SimpleSpan),
}

fn instance_parser<'a>() -> impl Parser<'a, &'a str, (IndexText, usize), Extra<'a>> {
    let index = choice((
        just('*').to(IndexText::All),
        digits().map_with(|digits, e| IndexText::Digits(digits, e.span())),
    ));

    just('[')
        .ignore_then(index)
        .then_ignore(just(']'))
        .map_with(|index, e| {
            let span: SimpleSpan = e.span();
            (index, span.into_range().end)
        })
        .then_ignore(any().repeated())
}

/// Parse a `[<index>]` or `[*]` suffix at the start of `rest`
///
/// Returns the instance selector and the number of bytes consumed.
pub(crate) fn instance_suffix(rest: &str) -> Result<(Instance, usize), ParseError> {
    let (index, consumed) = instance_parser()
        .parse(rest)
        .into_result()
        .map_err(|errs| {
            // Failing right after `[` means no index was given at all
            let offset = errs.first().map_or(1, |e| e.span().into_range().start);
            if offset <= 1 {
                ParseError::IndexNotInteger { offset: 1 }
            } else {
                ParseError::UnclosedIndex { offset }
            }
        })?;

    match index {
        IndexText::All => Ok((Instance::All, consumed)),
        IndexText::Digits(text, span) => match text.parse::<u16>() {
            Ok(n) if n <= MAX_INSTANCE => Ok((Instance::Index(n), consumed)),
            _ => Err(ParseError::InvalidIndex {
                value: text,
                offset: span.into_range().start,
            }),
        },
    }
}

/// A numeric attribute name, such as `Attr-26.9.1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NumericAttr {
    pub attr: u32,
    pub vendor: u32,
    /// Bytes the name occupied
    pub len: usize,
}

fn number<'a>() -> impl Parser<'a, &'a str, u32, Extra<'a>> + Clone {
    digits().try_map(|digits, span| {
        digits
            .parse::<u32>()
            .map_err(|_| Rich::custom(span, "number out of range"))
    })
}

fn numeric_parser<'a>() -> impl Parser<'a, &'a str, (Vec<u32>, Option<u32>, usize), Extra<'a>> {
    let attr_form = just("Attr-")
        .ignore_then(
            number()
                .separated_by(just('.'))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .map(|numbers| (numbers, None));

    let vendor_form = just("Vendor-")
        .ignore_then(number())
        .then_ignore(just("-Attr-"))
        .then(number())
        .map(|(vendor, attr)| (vec![attr], Some(vendor)));

    choice((attr_form, vendor_form))
        .map_with(|(numbers, vendor), e| {
            let span: SimpleSpan = e.span();
            (numbers, vendor, span.into_range().end)
        })
        .then_ignore(any().repeated())
}

/// Recognise the numeric forms `Attr-<n>`, `Attr-26.<vendor>.<n>` and
/// `Vendor-<vendor>-Attr-<n>` at the start of `rest`
pub(crate) fn numeric_attr(rest: &str) -> Option<NumericAttr> {
    let (numbers, vendor, len) = numeric_parser().parse(rest).into_result().ok()?;

    // The name must end where the numeric form ends
    if rest.as_bytes().get(len).is_some_and(|c| is_allowed_char(*c)) {
        return None;
    }

    let (attr, vendor) = match (vendor, numbers.as_slice()) {
        (Some(vendor), [attr]) if vendor != 0 => (*attr, vendor),
        (None, [attr]) => (*attr, 0),
        (None, [26, vendor, attr]) if *vendor != 0 => (*attr, *vendor),
        _ => return None,
    };

    // Standard attributes are a single octet; vendor attributes may be wider
    if attr == 0 || (vendor == 0 && attr > 255) {
        return None;
    }

    Some(NumericAttr { attr, vendor, len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tag_suffix() {
        assert_eq!(tag_suffix(":3"), Ok((3, 2)));
        assert_eq!(tag_suffix(":31[2]"), Ok((31, 3)));
        assert_eq!(
            tag_suffix(":32"),
            Err(ParseError::InvalidTag {
                value: "32".to_string(),
                offset: 1
            })
        );
        assert_eq!(
            tag_suffix(":-1"),
            Err(ParseError::InvalidTag {
                value: "-1".to_string(),
                offset: 1
            })
        );
        assert_eq!(tag_suffix(":x"), Err(ParseError::TagNotInteger { offset: 1 }));
    }

    #[test]
    fn test_instance_suffix() {
        assert_eq!(instance_suffix("[0]"), Ok((Instance::Index(0), 3)));
        assert_eq!(instance_suffix("[1000]"), Ok((Instance::Index(1000), 6)));
        assert_eq!(instance_suffix("[*]rest"), Ok((Instance::All, 3)));
        assert_eq!(
            instance_suffix("[1001]"),
            Err(ParseError::InvalidIndex {
                value: "1001".to_string(),
                offset: 1
            })
        );
        assert_eq!(
            instance_suffix("[abc]"),
            Err(ParseError::IndexNotInteger { offset: 1 })
        );
        assert_eq!(
            instance_suffix("[12"),
            Err(ParseError::UnclosedIndex { offset: 3 })
        );
    }

    #[test]
    fn test_numeric_attr() {
        assert_eq!(
            numeric_attr("Attr-200"),
            Some(NumericAttr {
                attr: 200,
                vendor: 0,
                len: 8
            })
        );
        assert_eq!(
            numeric_attr("Attr-26.9.77[1]"),
            Some(NumericAttr {
                attr: 77,
                vendor: 9,
                len: 12
            })
        );
        assert_eq!(
            numeric_attr("Vendor-9-Attr-77"),
            Some(NumericAttr {
                attr: 77,
                vendor: 9,
                len: 16
            })
        );
        assert_eq!(numeric_attr("Attr-300"), None);
        assert_eq!(numeric_attr("Attr-26.0.5"), None);
        assert_eq!(numeric_attr("Vendor-0-Attr-5"), None);
        assert_eq!(numeric_attr("Attr-12abc"), None);
        assert_eq!(numeric_attr("Attr-1.2"), None);
        assert_eq!(numeric_attr("Not-An-Attr"), None);
    }
}
