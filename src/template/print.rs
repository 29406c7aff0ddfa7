//! Canonical text form of templates
//!
//! Attribute references print with a leading `&` and only the qualifiers
//! that differ from the current request's `request` list. Everything else
//! prints its text, quoted according to its kind.

use std::fmt::{self, Write};

use super::types::{Instance, ListKind, RequestRef, Tag, Template, TemplateKind};
use super::verify::verify_tmpl;
use crate::dict::is_allowed_char;
use crate::value::Value;

fn write_scope(f: &mut fmt::Formatter<'_>, request: RequestRef, list: ListKind) -> fmt::Result {
    f.write_char('&')?;
    match (request, list) {
        (RequestRef::Current, ListKind::Request) => Ok(()),
        (RequestRef::Current, list) => write!(f, "{}:", list),
        (request, list) => write!(f, "{}.{}:", request, list),
    }
}

fn write_instance(f: &mut fmt::Formatter<'_>, num: Instance) -> fmt::Result {
    match num {
        Instance::Any => Ok(()),
        Instance::All => f.write_str("[*]"),
        Instance::Index(n) => write!(f, "[{}]", n),
    }
}

/// Write `text` between `quote` characters, escaping as the lexer expects
///
/// Newlines are written as `\r`.
fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str, quote: char) -> fmt::Result {
    f.write_char(quote)?;
    for c in text.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\r' | '\n' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            c => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}

/// Write a regex body between slashes
///
/// Backslashes are the regex engine's own escapes and pass through as they
/// are; only the delimiter is escaped.
fn write_pattern(f: &mut fmt::Formatter<'_>, pattern: &str) -> fmt::Result {
    f.write_char('/')?;
    for c in pattern.chars() {
        match c {
            '/' => f.write_str("\\/")?,
            '\r' | '\n' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('/')
}

/// Bare if every character could appear in an attribute name
fn write_word(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    if text.bytes().all(is_allowed_char) {
        f.write_str(text)
    } else {
        write_quoted(f, text, '\'')
    }
}

impl fmt::Display for Template<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        verify_tmpl!(self);

        match &self.kind {
            TemplateKind::Null => Ok(()),
            TemplateKind::Literal | TemplateKind::List(_) => write_word(f, &self.name),
            TemplateKind::Xlat => write_quoted(f, &self.name, '"'),
            TemplateKind::Exec => write_quoted(f, &self.name, '`'),
            TemplateKind::Regex {
                case_insensitive, ..
            } => {
                write_pattern(f, &self.name)?;
                if *case_insensitive {
                    f.write_char('i')?;
                }
                Ok(())
            }
            TemplateKind::Attribute(attr) => {
                write_scope(f, attr.request, attr.list)?;
                f.write_str(&attr.da.name)?;
                if let Tag::Value(tag) = attr.tag {
                    write!(f, ":{}", tag)?;
                }
                write_instance(f, attr.num)
            }
            TemplateKind::UnknownAttribute(unknown) => {
                write_scope(f, unknown.request, unknown.list)?;
                f.write_str(&unknown.name)?;
                write_instance(f, unknown.num)
            }
            TemplateKind::Data(data) => match &data.value {
                Value::String(s) => write_quoted(f, s, '\''),
                value => write!(f, "{}", value),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::Catalogue;
    use crate::parser::parse_attr_str;
    use insta::assert_snapshot;

    fn reprint(text: &str) -> String {
        parse_attr_str(text, &Catalogue::builtin(), RequestRef::Current, ListKind::Request)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_default_scope_is_omitted() {
        assert_snapshot!(reprint("User-Name"), @"&User-Name");
        assert_snapshot!(reprint("&current.request:User-Name"), @"&User-Name");
        assert_snapshot!(reprint("&config:Auth-Type"), @"&control:Auth-Type");
        assert_snapshot!(reprint("&outer.request:User-Name"), @"&outer.request:User-Name");
    }

    #[test]
    fn test_tag_and_instance() {
        assert_snapshot!(reprint("&reply:Tunnel-Type:0[1000]"), @"&reply:Tunnel-Type:0[1000]");
        assert_snapshot!(reprint("&Tunnel-Password[*]"), @"&Tunnel-Password[*]");
        assert_snapshot!(reprint("&parent.reply:Made-Up[3]"), @"&parent.reply:Made-Up[3]");
    }

    #[test]
    fn test_quoting() {
        assert_snapshot!(Template::literal("bob").to_string(), @"bob");
        assert_snapshot!(Template::literal("it's here").to_string(), @r"'it\'s here'");
        assert_snapshot!(Template::literal("a\tb\nc").to_string(), @r"'a\tb\rc'");
        assert_snapshot!(
            Template::xlat("%{User-Name} \"x\"").to_string(),
            @r#""%{User-Name} \"x\"""#
        );
        assert_snapshot!(Template::exec("/bin/echo hi").to_string(), @"`/bin/echo hi`");
        assert_snapshot!(Template::regex("^a/b$", true).to_string(), @r"/^a\/b$/i");
        assert_snapshot!(Template::regex(r"\d+\\", false).to_string(), @r"/\d+\\/");
    }

    #[test]
    fn test_list_and_data() {
        assert_snapshot!(reprint("reply"), @"reply");
        assert_snapshot!(reprint("&reply:"), @"'&reply:'");
        assert_snapshot!(Template::data(Value::Integer(7)).to_string(), @"7");
        assert_snapshot!(Template::data(Value::from("o'k")).to_string(), @r"'o\'k'");
    }
}
