//! Attribute templates
//!
//! A [`Template`] is the parsed form of an attribute reference or value. It
//! can be resolved against a [`Request`](crate::request::Request) with a
//! [`TmplCursor`], cast to a typed [`Value`](crate::value::Value) and printed
//! back to its canonical text.

mod cast;
mod cursor;
mod print;
mod resolver;
mod types;
pub mod verify;

pub use cast::{CastError, ExpandError, Expander, NoExpansion};
pub use cursor::TmplCursor;
pub use resolver::{resolve, resolve_list, resolve_request, ResolveError};
pub use types::{
    AttrDescriptor, AttrRef, CompiledRegex, Instance, ListKind, ListRef, RequestRef, Tag, Template,
    TemplateKind, TypedData, UnknownAttrRef, MAX_INSTANCE, MAX_TAG,
};
pub use verify::Fault;
