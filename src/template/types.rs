//! Template data model

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::dict::{DictAttr, ValueType};
use crate::value::Value;

/// Highest tag value an attribute reference may carry
pub const MAX_TAG: u8 = 0x1f;

/// Highest instance index an attribute reference may carry
pub const MAX_INSTANCE: u16 = 1000;

/// Which request in the parent chain a reference applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestRef {
    Current,
    Parent,
    Outer,
}

impl RequestRef {
    const NAMES: [(&'static str, RequestRef); 3] = [
        ("outer", RequestRef::Outer),
        ("current", RequestRef::Current),
        ("parent", RequestRef::Parent),
    ];

    pub fn name(self) -> &'static str {
        match self {
            RequestRef::Current => "current",
            RequestRef::Parent => "parent",
            RequestRef::Outer => "outer",
        }
    }

    /// Look a request qualifier up by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, r)| *r)
    }
}

impl fmt::Display for RequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The named attribute lists of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Request,
    Reply,
    Control,
    ProxyRequest,
    ProxyReply,
    Coa,
    CoaReply,
    Disconnect,
    DisconnectReply,
}

impl ListKind {
    /// `config` is the deprecated spelling of `control`; `control` comes first
    /// so it is the name printed.
    const NAMES: [(&'static str, ListKind); 10] = [
        ("request", ListKind::Request),
        ("reply", ListKind::Reply),
        ("control", ListKind::Control),
        ("config", ListKind::Control),
        ("proxy-request", ListKind::ProxyRequest),
        ("proxy-reply", ListKind::ProxyReply),
        ("coa", ListKind::Coa),
        ("coa-reply", ListKind::CoaReply),
        ("disconnect", ListKind::Disconnect),
        ("disconnect-reply", ListKind::DisconnectReply),
    ];

    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("request")
    }

    /// Look a list up by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, kind)| *kind)
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tag selector of an attribute reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tag {
    #[default]
    Any,
    Value(u8),
}

impl Tag {
    /// Whether a pair carrying `tag` is selected
    pub fn matches(self, tag: Option<u8>) -> bool {
        match self {
            Tag::Any => true,
            Tag::Value(wanted) => tag == Some(wanted),
        }
    }
}

/// Instance selector of an attribute reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Instance {
    /// The first match only
    #[default]
    Any,
    /// Every match
    All,
    /// The n-th match, counting from zero
    Index(u16),
}

/// Descriptor held by an attribute reference
///
/// Known attributes share the catalogue's descriptor. Attributes referenced
/// by number but missing from the catalogue own a placeholder, which lives
/// and dies with the template.
#[derive(Debug, Clone)]
pub enum AttrDescriptor {
    Known(Arc<DictAttr>),
    Unknown(Box<DictAttr>),
}

impl AttrDescriptor {
    pub fn is_unknown(&self) -> bool {
        matches!(self, AttrDescriptor::Unknown(_))
    }
}

impl Deref for AttrDescriptor {
    type Target = DictAttr;

    fn deref(&self) -> &DictAttr {
        match self {
            AttrDescriptor::Known(da) => da,
            AttrDescriptor::Unknown(da) => da,
        }
    }
}

impl PartialEq for AttrDescriptor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrDescriptor::Known(a), AttrDescriptor::Known(b)) => Arc::ptr_eq(a, b),
            (AttrDescriptor::Unknown(a), AttrDescriptor::Unknown(b)) => a == b,
            _ => false,
        }
    }
}

/// Reference to an attribute in one of a request's lists
#[derive(Debug, Clone, PartialEq)]
pub struct AttrRef {
    pub request: RequestRef,
    pub list: ListKind,
    pub da: AttrDescriptor,
    pub tag: Tag,
    pub num: Instance,
}

/// Reference to an attribute the catalogue does not know by name
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownAttrRef {
    pub request: RequestRef,
    pub list: ListKind,
    pub name: String,
    pub num: Instance,
}

/// Reference to a whole list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListRef {
    pub request: RequestRef,
    pub list: ListKind,
}

/// A value that has already been parsed to its type
#[derive(Debug, Clone, PartialEq)]
pub struct TypedData {
    pub ty: ValueType,
    pub value: Value,
}

/// A compiled regular expression, compared by pattern
#[derive(Debug, Clone)]
pub struct CompiledRegex(pub regex::Regex);

impl PartialEq for CompiledRegex {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

/// What a template denotes
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateKind {
    /// Uninitialised; never valid for a consumer
    Null,
    /// Constant text, not yet typed
    Literal,
    /// Text expanded at run time
    Xlat,
    /// Text run as an external command
    Exec,
    /// Pattern text, compiled on demand
    Regex {
        case_insensitive: bool,
        compiled: Option<CompiledRegex>,
    },
    Attribute(AttrRef),
    UnknownAttribute(UnknownAttrRef),
    List(ListRef),
    Data(TypedData),
}

impl TemplateKind {
    pub fn name(&self) -> &'static str {
        match self {
            TemplateKind::Null => "null",
            TemplateKind::Literal => "literal",
            TemplateKind::Xlat => "xlat",
            TemplateKind::Exec => "exec",
            TemplateKind::Regex { compiled: None, .. } => "regex",
            TemplateKind::Regex { compiled: Some(_), .. } => "compiled regex",
            TemplateKind::Attribute(_) => "attribute",
            TemplateKind::UnknownAttribute(_) => "unknown attribute",
            TemplateKind::List(_) => "list",
            TemplateKind::Data(_) => "data",
        }
    }
}

/// A parsed reference or value
///
/// `name` is the source text the template was built from. Templates parsed
/// with the `_substr`/`_str` entry points borrow it; [`Template::into_owned`]
/// detaches a template from its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Template<'a> {
    pub name: Cow<'a, str>,
    pub kind: TemplateKind,
}

impl<'a> Template<'a> {
    pub fn new(kind: TemplateKind, name: impl Into<Cow<'a, str>>) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn literal(text: impl Into<Cow<'a, str>>) -> Self {
        Self::new(TemplateKind::Literal, text)
    }

    pub fn xlat(text: impl Into<Cow<'a, str>>) -> Self {
        Self::new(TemplateKind::Xlat, text)
    }

    pub fn exec(text: impl Into<Cow<'a, str>>) -> Self {
        Self::new(TemplateKind::Exec, text)
    }

    pub fn regex(text: impl Into<Cow<'a, str>>, case_insensitive: bool) -> Self {
        Self::new(
            TemplateKind::Regex {
                case_insensitive,
                compiled: None,
            },
            text,
        )
    }

    /// Typed data; the name is the printed value
    pub fn data(value: Value) -> Self {
        let name = value.to_string();
        Self::new(
            TemplateKind::Data(TypedData {
                ty: value.value_type(),
                value,
            }),
            name,
        )
    }

    /// Source text of the template
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Copy the source text so the template no longer borrows it
    pub fn into_owned(self) -> Template<'static> {
        Template {
            name: Cow::Owned(self.name.into_owned()),
            kind: self.kind,
        }
    }

    pub fn attr_ref(&self) -> Option<&AttrRef> {
        match &self.kind {
            TemplateKind::Attribute(attr) => Some(attr),
            _ => None,
        }
    }

    pub fn data_ref(&self) -> Option<&TypedData> {
        match &self.kind {
            TemplateKind::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Request and list the template refers to, if it names attributes
    pub fn scope(&self) -> Option<(RequestRef, ListKind)> {
        match &self.kind {
            TemplateKind::Attribute(a) => Some((a.request, a.list)),
            TemplateKind::UnknownAttribute(u) => Some((u.request, u.list)),
            TemplateKind::List(l) => Some((l.request, l.list)),
            _ => None,
        }
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, TemplateKind::Attribute(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, TemplateKind::List(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, TemplateKind::Literal)
    }
}
