//! The shared attribute catalogue

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Deserialize;
use thiserror::Error;

use super::attr::{is_allowed_char, DictAttr, ValueType, MAX_ATTR_NAME_LEN};

/// Errors that can occur while building the catalogue
#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("failed to read dictionary file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("failed to parse dictionary TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("attribute '{name}' has unknown data type '{ty}'")]
    UnknownType { name: String, ty: String },
    #[error("duplicate attribute name '{name}'")]
    DuplicateName { name: String },
    #[error("duplicate attribute number {vendor}:{attr} for '{name}'")]
    DuplicateNumber { name: String, attr: u32, vendor: u32 },
}

/// Attributes known without loading a dictionary: (name, number, vendor, type, tagged)
const BUILTIN_ATTRIBUTES: &[(&str, u32, u32, ValueType, bool)] = &[
    ("User-Name", 1, 0, ValueType::String, false),
    ("User-Password", 2, 0, ValueType::String, false),
    ("CHAP-Password", 3, 0, ValueType::Octets, false),
    ("NAS-IP-Address", 4, 0, ValueType::Ipaddr, false),
    ("NAS-Port", 5, 0, ValueType::Integer, false),
    ("Service-Type", 6, 0, ValueType::Integer, false),
    ("Framed-Protocol", 7, 0, ValueType::Integer, false),
    ("Framed-IP-Address", 8, 0, ValueType::Ipaddr, false),
    ("Filter-Id", 11, 0, ValueType::String, false),
    ("Reply-Message", 18, 0, ValueType::String, false),
    ("State", 24, 0, ValueType::Octets, false),
    ("Class", 25, 0, ValueType::Octets, false),
    ("Vendor-Specific", 26, 0, ValueType::Octets, false),
    ("Session-Timeout", 27, 0, ValueType::Integer, false),
    ("Idle-Timeout", 28, 0, ValueType::Integer, false),
    ("Called-Station-Id", 30, 0, ValueType::String, false),
    ("Calling-Station-Id", 31, 0, ValueType::String, false),
    ("NAS-Identifier", 32, 0, ValueType::String, false),
    ("Acct-Status-Type", 40, 0, ValueType::Integer, false),
    ("Acct-Input-Octets", 42, 0, ValueType::Integer, false),
    ("Acct-Output-Octets", 43, 0, ValueType::Integer, false),
    ("Acct-Session-Id", 44, 0, ValueType::String, false),
    ("Acct-Session-Time", 46, 0, ValueType::Integer, false),
    ("Event-Timestamp", 55, 0, ValueType::Date, false),
    ("Tunnel-Type", 64, 0, ValueType::Integer, true),
    ("Tunnel-Medium-Type", 65, 0, ValueType::Integer, true),
    ("Tunnel-Password", 69, 0, ValueType::String, true),
    ("Tunnel-Private-Group-Id", 81, 0, ValueType::String, true),
    ("NAS-Port-Id", 87, 0, ValueType::String, false),
    ("NAS-IPv6-Address", 95, 0, ValueType::Ipv6addr, false),
    ("Auth-Type", 1000, 0, ValueType::Integer, false),
    ("Cleartext-Password", 1100, 0, ValueType::String, false),
    ("Cisco-AVPair", 1, 9, ValueType::String, false),
];

#[derive(Debug, Default)]
struct Entries {
    /// Keyed by lowercased name
    by_name: HashMap<String, Arc<DictAttr>>,
    by_value: HashMap<(u32, u32), Arc<DictAttr>>,
}

impl Entries {
    fn insert(&mut self, da: DictAttr) -> Result<Arc<DictAttr>, CatalogueError> {
        let key = da.name.to_ascii_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(CatalogueError::DuplicateName { name: da.name });
        }
        if self.by_value.contains_key(&(da.vendor, da.attr)) {
            return Err(CatalogueError::DuplicateNumber {
                name: da.name,
                attr: da.attr,
                vendor: da.vendor,
            });
        }

        let da = Arc::new(da);
        self.by_name.insert(key, Arc::clone(&da));
        self.by_value.insert((da.vendor, da.attr), Arc::clone(&da));
        Ok(da)
    }
}

/// TOML structure for deserializing dictionaries
#[derive(Deserialize)]
struct TomlDictionary {
    #[serde(default)]
    attribute: Vec<TomlAttribute>,
}

#[derive(Deserialize)]
struct TomlAttribute {
    name: String,
    attr: u32,
    #[serde(default)]
    vendor: u32,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    has_tag: bool,
}

/// Registry of attribute descriptors, shared by every worker
///
/// Lookups hand out `Arc` handles; two lookups of the same attribute always
/// return the same allocation, which the template verifier relies on.
#[derive(Debug, Default)]
pub struct Catalogue {
    entries: RwLock<Entries>,
}

impl Catalogue {
    /// Create an empty catalogue
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue holding a handful of common RADIUS attributes
    pub fn builtin() -> Self {
        let mut entries = Entries::default();
        for &(name, attr, vendor, ty, has_tag) in BUILTIN_ATTRIBUTES {
            let mut da = DictAttr::new(name, attr, vendor, ty);
            da.flags.has_tag = has_tag;
            // The table above has no duplicates
            let _ = entries.insert(da);
        }
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Load a catalogue from a TOML dictionary file
    pub fn from_file(path: &Path) -> Result<Self, CatalogueError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load a catalogue from a TOML dictionary string
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogueError> {
        let parsed: TomlDictionary = toml::from_str(content)?;
        let mut catalogue = Self::new();
        for entry in parsed.attribute {
            let ty = ValueType::from_name(&entry.ty).ok_or_else(|| CatalogueError::UnknownType {
                name: entry.name.clone(),
                ty: entry.ty.clone(),
            })?;
            let mut da = DictAttr::new(entry.name, entry.attr, entry.vendor, ty);
            da.flags.has_tag = entry.has_tag;
            catalogue.insert(da)?;
        }
        Ok(catalogue)
    }

    /// Register a new attribute while the catalogue is still being built
    pub fn insert(&mut self, da: DictAttr) -> Result<Arc<DictAttr>, CatalogueError> {
        self.entries
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(da)
    }

    /// Number of registered attributes
    pub fn len(&self) -> usize {
        self.read().by_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look an attribute up by name (case-insensitive)
    pub fn by_name(&self, name: &str) -> Option<Arc<DictAttr>> {
        self.read().by_name.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Look an attribute up by number
    pub fn by_value(&self, attr: u32, vendor: u32) -> Option<Arc<DictAttr>> {
        self.read().by_value.get(&(vendor, attr)).cloned()
    }

    /// Look up the attribute named by the leading run of name characters
    ///
    /// Returns the descriptor and the number of bytes the name occupied.
    pub fn attr_from_substr(&self, text: &str) -> Option<(Arc<DictAttr>, usize)> {
        let len = text.bytes().take_while(|c| is_allowed_char(*c)).count();
        if len == 0 || len > MAX_ATTR_NAME_LEN {
            return None;
        }
        self.by_name(&text[..len]).map(|da| (da, len))
    }

    /// Promote an unknown attribute into the catalogue
    ///
    /// Keyed by vendor and number. When another caller already registered the
    /// attribute, its descriptor is returned instead so that racing callers
    /// end up sharing one descriptor.
    pub fn add_unknown(&self, unknown: &DictAttr) -> Result<Arc<DictAttr>, CatalogueError> {
        if let Some(da) = self.by_value(unknown.attr, unknown.vendor) {
            return Ok(da);
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(da) = entries.by_value.get(&(unknown.vendor, unknown.attr)) {
            return Ok(Arc::clone(da));
        }

        let mut da = unknown.clone();
        da.flags.is_unknown = false;
        let da = entries.insert(da)?;
        tracing::debug!(
            name = %da.name,
            attr = da.attr,
            vendor = da.vendor,
            "Registered unknown attribute"
        );
        Ok(da)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }
}
