//! Attribute catalogue
//!
//! The catalogue maps attribute names and numbers to shared descriptors. It is
//! built once before any request is handled and is read-mostly afterwards: the
//! only mutation allowed on a shared catalogue is promoting a previously unknown
//! attribute (see [`Catalogue::add_unknown`]).

mod attr;
mod catalogue;

pub use attr::{
    is_allowed_char, AttrFlags, DictAttr, UnknownValueType, ValueType, MAX_ATTR_NAME_LEN,
};
pub use catalogue::{Catalogue, CatalogueError};
