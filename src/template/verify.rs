//! Template consistency checks
//!
//! The type system rules out most malformed templates. What it cannot rule
//! out is checked here: the kind must not be [`TemplateKind::Null`], tags and
//! indexes must be in range, a shared descriptor must be the one the
//! catalogue hands out, an owned descriptor must be flagged as a placeholder,
//! and typed data must agree with its declared type.
//!
//! Components call [`verify_tmpl!`] on entry and exit. A failure is an engine
//! bug, never bad input, so in debug builds it aborts the process.

use thiserror::Error;

use super::types::{AttrDescriptor, Instance, Tag, Template, TemplateKind, MAX_INSTANCE, MAX_TAG};
use crate::dict::{is_allowed_char, Catalogue, ValueType, MAX_ATTR_NAME_LEN};

/// A broken template invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("template kind is null (uninitialised)")]
    Uninitialised,
    #[error("tag {0} outside 0-31")]
    TagOutOfRange(u8),
    #[error("instance index {0} outside 0-1000")]
    InstanceOutOfRange(u16),
    #[error("attribute '{0}' does not accept tags but the reference carries one")]
    UnexpectedTag(String),
    #[error("descriptor for '{0}' differs from the catalogue's descriptor")]
    DescriptorMismatch(String),
    #[error("owned descriptor for '{0}' is not flagged as unknown")]
    PlaceholderNotFlagged(String),
    #[error("shared descriptor for '{0}' is flagged as unknown")]
    SharedPlaceholder(String),
    #[error("unknown attribute name '{0}' is empty, too long or malformed")]
    BadUnknownName(String),
    #[error("typed data holds {found} but is declared as {declared}")]
    DataTypeMismatch { declared: ValueType, found: ValueType },
    #[error("typed {0} data has zero length")]
    EmptyData(ValueType),
    #[error("compiled regex does not match the template's pattern or flags")]
    RegexMismatch,
}

impl Template<'_> {
    /// Check the invariants that need no catalogue
    pub fn check(&self) -> Result<(), Fault> {
        match &self.kind {
            TemplateKind::Null => Err(Fault::Uninitialised),
            TemplateKind::Literal | TemplateKind::Xlat | TemplateKind::Exec => Ok(()),
            TemplateKind::Regex {
                case_insensitive,
                compiled,
            } => match compiled {
                Some(re) if re.0.as_str() != regex_source(&self.name, *case_insensitive) => {
                    Err(Fault::RegexMismatch)
                }
                _ => Ok(()),
            },
            TemplateKind::Attribute(attr) => {
                if let Tag::Value(tag) = attr.tag {
                    if tag > MAX_TAG {
                        return Err(Fault::TagOutOfRange(tag));
                    }
                    if !attr.da.flags.has_tag {
                        return Err(Fault::UnexpectedTag(attr.da.name.clone()));
                    }
                }
                check_instance(attr.num)?;
                match &attr.da {
                    AttrDescriptor::Known(da) if da.flags.is_unknown => {
                        Err(Fault::SharedPlaceholder(da.name.clone()))
                    }
                    AttrDescriptor::Unknown(da) if !da.flags.is_unknown => {
                        Err(Fault::PlaceholderNotFlagged(da.name.clone()))
                    }
                    _ => Ok(()),
                }
            }
            TemplateKind::UnknownAttribute(unknown) => {
                let name = &unknown.name;
                if name.is_empty()
                    || name.len() > MAX_ATTR_NAME_LEN
                    || !name.bytes().all(is_allowed_char)
                {
                    return Err(Fault::BadUnknownName(name.clone()));
                }
                check_instance(unknown.num)
            }
            TemplateKind::List(_) => Ok(()),
            TemplateKind::Data(data) => {
                let found = data.value.value_type();
                if found != data.ty {
                    return Err(Fault::DataTypeMismatch {
                        declared: data.ty,
                        found,
                    });
                }
                if data.value.is_empty() && !data.ty.allows_empty() {
                    return Err(Fault::EmptyData(data.ty));
                }
                Ok(())
            }
        }
    }

    /// Check every invariant, including descriptor identity
    pub fn check_with(&self, catalogue: &Catalogue) -> Result<(), Fault> {
        self.check()?;
        if let TemplateKind::Attribute(attr) = &self.kind {
            if let AttrDescriptor::Known(da) = &attr.da {
                match catalogue.by_value(da.attr, da.vendor) {
                    Some(shared) if std::sync::Arc::ptr_eq(&shared, da) => {}
                    _ => return Err(Fault::DescriptorMismatch(da.name.clone())),
                }
            }
        }
        Ok(())
    }
}

fn check_instance(num: Instance) -> Result<(), Fault> {
    match num {
        Instance::Index(n) if n > MAX_INSTANCE => Err(Fault::InstanceOutOfRange(n)),
        _ => Ok(()),
    }
}

/// Pattern handed to the regex engine for a template's text
pub(crate) fn regex_source(pattern: &str, case_insensitive: bool) -> String {
    if case_insensitive {
        format!("(?i){}", pattern)
    } else {
        pattern.to_string()
    }
}

/// Abort on a failed check
pub(crate) fn enforce(result: Result<(), Fault>, file: &str, line: u32) {
    if let Err(fault) = result {
        tracing::error!(%fault, file, line, "CONSISTENCY CHECK FAILED");
        eprintln!("CONSISTENCY CHECK FAILED {}[{}]: {}", file, line, fault);
        std::process::abort();
    }
}

/// Verify a template in debug builds, aborting on any broken invariant
macro_rules! verify_tmpl {
    ($tmpl:expr) => {
        if cfg!(debug_assertions) {
            $crate::template::verify::enforce($tmpl.check(), file!(), line!());
        }
    };
    ($tmpl:expr, $catalogue:expr) => {
        if cfg!(debug_assertions) {
            $crate::template::verify::enforce($tmpl.check_with($catalogue), file!(), line!());
        }
    };
}

pub(crate) use verify_tmpl;
