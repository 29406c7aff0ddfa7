//! Iteration over the pairs a template denotes

use std::slice;

use super::resolver::{resolve, ResolveError};
use super::types::{AttrDescriptor, Instance, Tag, Template, TemplateKind};
use super::verify::verify_tmpl;
use crate::dict::{Catalogue, CatalogueError};
use crate::request::{Pair, Request};

#[derive(Debug, Clone, Copy)]
struct Filter {
    attr: u32,
    vendor: u32,
    has_tag: bool,
    tag: Tag,
}

impl Filter {
    fn matches(self, pair: &Pair) -> bool {
        pair.da.attr == self.attr
            && pair.da.vendor == self.vendor
            && (!self.has_tag || self.tag.matches(pair.tag))
    }
}

/// Forward-only iterator over the pairs a template selects
///
/// Created by [`Template::cursor`]. The cursor borrows the request graph, so
/// the lists it walks cannot change while it is alive.
#[derive(Debug, Clone)]
pub struct TmplCursor<'r> {
    pairs: slice::Iter<'r, Pair>,
    filter: Option<Filter>,
    pending: Option<&'r Pair>,
    /// Stop after the pending pair
    single: bool,
}

impl<'r> Iterator for TmplCursor<'r> {
    type Item = &'r Pair;

    fn next(&mut self) -> Option<&'r Pair> {
        if let Some(pair) = self.pending.take() {
            return Some(pair);
        }
        if self.single {
            return None;
        }
        match self.filter {
            Some(filter) => self.pairs.find(|pair| filter.matches(pair)),
            None => self.pairs.next(),
        }
    }
}

impl Template<'_> {
    /// Start iterating over the pairs this template denotes in `request`
    ///
    /// A list reference yields every pair of its list, possibly none. Other
    /// templates fail with [`ResolveError::NotFound`] when nothing matches,
    /// including templates that name no attributes at all.
    pub fn cursor<'r>(&self, request: &'r Request<'r>) -> Result<TmplCursor<'r>, ResolveError> {
        verify_tmpl!(self);

        let (filter, num) = match &self.kind {
            TemplateKind::List(_) => (None, Instance::All),
            TemplateKind::Attribute(attr) => (
                Some(Filter {
                    attr: attr.da.attr,
                    vendor: attr.da.vendor,
                    has_tag: attr.da.flags.has_tag,
                    tag: attr.tag,
                }),
                attr.num,
            ),
            _ => return Err(ResolveError::NotFound),
        };
        let Some((scope, list)) = self.scope() else {
            return Err(ResolveError::NotFound);
        };

        let mut pairs = resolve(request, scope, list)?.iter();
        let matching = |pairs: &mut slice::Iter<'r, Pair>| match filter {
            Some(filter) => pairs.find(|pair| filter.matches(pair)),
            None => pairs.next(),
        };

        if filter.is_none() {
            return Ok(TmplCursor {
                pairs,
                filter,
                pending: None,
                single: false,
            });
        }

        let first = match num {
            Instance::Index(n) => (0..=n).map(|_| matching(&mut pairs)).last().flatten(),
            Instance::Any | Instance::All => matching(&mut pairs),
        };
        let Some(first) = first else {
            return Err(ResolveError::NotFound);
        };

        Ok(TmplCursor {
            pairs,
            filter,
            pending: Some(first),
            single: num != Instance::All,
        })
    }

    /// The first pair the template selects
    pub fn find_pair<'r>(&self, request: &'r Request<'r>) -> Result<&'r Pair, ResolveError> {
        let mut cursor = self.cursor(request)?;
        cursor.next().ok_or(ResolveError::NotFound)
    }

    /// Copies of every pair the template selects
    pub fn copy_pairs(&self, request: &Request<'_>) -> Result<Vec<Pair>, ResolveError> {
        Ok(self.cursor(request)?.cloned().collect())
    }

    /// Register a placeholder descriptor with the catalogue
    ///
    /// The template then shares the catalogue's descriptor. Templates that
    /// hold no placeholder are left alone.
    pub fn define_unknown_attr(&mut self, catalogue: &Catalogue) -> Result<(), CatalogueError> {
        verify_tmpl!(self);

        if let TemplateKind::Attribute(attr) = &mut self.kind {
            if let AttrDescriptor::Unknown(placeholder) = &attr.da {
                let shared = catalogue.add_unknown(placeholder)?;
                attr.da = AttrDescriptor::Known(shared);
            }
        }

        verify_tmpl!(self, catalogue);
        Ok(())
    }
}
