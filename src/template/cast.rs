//! Casting templates to typed values
//!
//! Literals can be cast once, in place, when the target type is known at
//! parse time. Everything else is cast per request: the template is expanded
//! to text and the text parsed as the target type. Expansion of `Xlat` and
//! `Exec` templates is delegated to an [`Expander`], which may block.

use std::sync::Arc;

use thiserror::Error;

use super::resolver::ResolveError;
use super::types::{CompiledRegex, Template, TemplateKind, TypedData};
use super::verify::{regex_source, verify_tmpl};
use crate::dict::{DictAttr, ValueType};
use crate::request::{Pair, Request};
use crate::value::{Value, ValueError};

/// Run-time expansion failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error("{0} expansion is not available")]
    Unsupported(&'static str),
    #[error("expansion failed: {0}")]
    Failed(String),
}

/// Run-time expansion of dynamic strings and commands
///
/// Implemented by the surrounding server. Both operations may block.
pub trait Expander {
    fn xlat(&self, request: &Request<'_>, text: &str) -> Result<String, ExpandError>;

    fn exec(&self, request: &Request<'_>, command: &str) -> Result<String, ExpandError>;
}

/// Expander that refuses every expansion
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExpansion;

impl Expander for NoExpansion {
    fn xlat(&self, _request: &Request<'_>, _text: &str) -> Result<String, ExpandError> {
        Err(ExpandError::Unsupported("xlat"))
    }

    fn exec(&self, _request: &Request<'_>, _command: &str) -> Result<String, ExpandError> {
        Err(ExpandError::Unsupported("exec"))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CastError {
    #[error("cannot {operation} a {kind} template")]
    Unsupported {
        operation: &'static str,
        kind: &'static str,
    },
    #[error("template holds {found} data but {expected} was requested")]
    TypeMismatch {
        expected: ValueType,
        found: ValueType,
    },
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("invalid regular expression: {0}")]
    Regex(#[from] regex::Error),
}

impl Template<'_> {
    /// Parse a literal as `ty`, turning the template into typed data
    ///
    /// The source text is kept as the template's name. On failure the
    /// template is unchanged, so the caller may try another type.
    pub fn cast_in_place(&mut self, ty: ValueType) -> Result<(), CastError> {
        verify_tmpl!(self);

        if !self.is_literal() {
            return Err(CastError::Unsupported {
                operation: "cast",
                kind: self.kind.name(),
            });
        }

        let value = Value::parse(ty, &self.name).map_err(|err| {
            tracing::debug!(name = %self.name, %ty, %err, "Literal cast failed");
            err
        })?;
        self.kind = TemplateKind::Data(TypedData { ty, value });

        verify_tmpl!(self);
        Ok(())
    }

    /// Expand the template to text in the context of `request`
    ///
    /// Attribute references expand to the printed value of the first
    /// matching pair.
    pub fn expand(
        &self,
        request: &Request<'_>,
        expander: &dyn Expander,
    ) -> Result<String, CastError> {
        match &self.kind {
            TemplateKind::Literal => Ok(self.name.to_string()),
            TemplateKind::Xlat => Ok(expander.xlat(request, &self.name)?),
            TemplateKind::Exec => Ok(expander.exec(request, &self.name)?),
            TemplateKind::Attribute(_) => Ok(self.find_pair(request)?.value.to_string()),
            TemplateKind::Data(data) => Ok(data.value.to_string()),
            kind => Err(CastError::Unsupported {
                operation: "expand",
                kind: kind.name(),
            }),
        }
    }

    /// Produce a value of type `ty` for `request`
    ///
    /// Typed data is copied as is and must already have type `ty`. Any other
    /// template is expanded and the result parsed.
    pub fn cast_to_value(
        &self,
        ty: ValueType,
        request: &Request<'_>,
        expander: &dyn Expander,
    ) -> Result<Value, CastError> {
        verify_tmpl!(self);

        if let TemplateKind::Data(data) = &self.kind {
            if data.ty != ty {
                return Err(CastError::TypeMismatch {
                    expected: ty,
                    found: data.ty,
                });
            }
            return Ok(data.value.clone());
        }

        let text = self.expand(request, expander)?;
        Value::parse(ty, &text).map_err(|err| {
            tracing::debug!(name = %self.name, %ty, %err, "Expanded value cast failed");
            CastError::Value(err)
        })
    }

    /// Produce a new pair for `da` holding this template's value
    pub fn cast_to_pair(
        &self,
        da: &Arc<DictAttr>,
        request: &Request<'_>,
        expander: &dyn Expander,
    ) -> Result<Pair, CastError> {
        let value = self.cast_to_value(da.ty, request, expander)?;
        Ok(Pair::new(Arc::clone(da), value))
    }

    /// Compile a regex template so it can be matched repeatedly
    ///
    /// Already compiled templates are left as they are.
    pub fn compile_regex(&mut self) -> Result<(), CastError> {
        let kind = self.kind.name();
        let TemplateKind::Regex {
            case_insensitive,
            compiled,
        } = &mut self.kind
        else {
            return Err(CastError::Unsupported {
                operation: "compile",
                kind,
            });
        };

        if compiled.is_none() {
            let re = regex::Regex::new(&regex_source(&self.name, *case_insensitive))?;
            *compiled = Some(CompiledRegex(re));
        }

        verify_tmpl!(self);
        Ok(())
    }
}
