//! Attribute descriptors and data types

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Longest attribute name the catalogue will look up or capture
pub const MAX_ATTR_NAME_LEN: usize = 128;

/// Whether a byte may appear in an attribute name
pub fn is_allowed_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'-' | b'.' | b'/' | b'_')
}

/// Data type carried by an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Octets,
    Ipaddr,
    Ipv6addr,
    Integer,
    Byte,
    Short,
    Integer64,
    Signed,
    Date,
    Ether,
    Boolean,
    Tlv,
}

impl ValueType {
    pub const ALL: [ValueType; 13] = [
        ValueType::String,
        ValueType::Octets,
        ValueType::Ipaddr,
        ValueType::Ipv6addr,
        ValueType::Integer,
        ValueType::Byte,
        ValueType::Short,
        ValueType::Integer64,
        ValueType::Signed,
        ValueType::Date,
        ValueType::Ether,
        ValueType::Boolean,
        ValueType::Tlv,
    ];

    /// Dictionary name of the type
    pub fn name(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Octets => "octets",
            ValueType::Ipaddr => "ipaddr",
            ValueType::Ipv6addr => "ipv6addr",
            ValueType::Integer => "integer",
            ValueType::Byte => "byte",
            ValueType::Short => "short",
            ValueType::Integer64 => "integer64",
            ValueType::Signed => "signed",
            ValueType::Date => "date",
            ValueType::Ether => "ether",
            ValueType::Boolean => "boolean",
            ValueType::Tlv => "tlv",
        }
    }

    /// Look a type up by its dictionary name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(name))
    }

    /// Types whose values may legitimately be empty
    pub fn allows_empty(self) -> bool {
        matches!(self, ValueType::String | ValueType::Octets | ValueType::Tlv)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A data type name that matches no [`ValueType`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown data type '{0}'")]
pub struct UnknownValueType(pub String);

impl FromStr for ValueType {
    type Err = UnknownValueType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownValueType(s.to_string()))
    }
}

/// Per-attribute flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttrFlags {
    /// Attribute may carry a tag (0-31)
    pub has_tag: bool,
    /// Descriptor is a placeholder for an attribute missing from the catalogue
    pub is_unknown: bool,
}

/// A catalogue descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictAttr {
    pub name: String,
    pub attr: u32,
    pub vendor: u32,
    pub ty: ValueType,
    pub flags: AttrFlags,
}

impl DictAttr {
    pub fn new(name: impl Into<String>, attr: u32, vendor: u32, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            attr,
            vendor,
            ty,
            flags: AttrFlags::default(),
        }
    }

    /// Mark the attribute as accepting tags
    pub fn with_tag(mut self) -> Self {
        self.flags.has_tag = true;
        self
    }

    /// Placeholder descriptor for an attribute referenced by number only
    pub fn unknown(name: impl Into<String>, attr: u32, vendor: u32) -> Self {
        Self {
            name: name.into(),
            attr,
            vendor,
            ty: ValueType::Octets,
            flags: AttrFlags {
                has_tag: false,
                is_unknown: true,
            },
        }
    }

    /// True when both descriptors denote the same protocol attribute
    pub fn same_attribute(&self, other: &DictAttr) -> bool {
        self.attr == other.attr && self.vendor == other.vendor
    }
}

impl fmt::Display for DictAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
