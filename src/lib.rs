//! Attribute reference templates for a RADIUS server
//!
//! Policy and module configuration names attributes with a compact
//! reference syntax: `&outer.reply:Tunnel-Type:1[0]` is the first
//! `Tunnel-Type` with tag 1 in the reply of the outer request. This crate
//! parses such references into [`Template`]s, resolves them against a
//! request graph, casts them to typed values and prints them back.
//!
//! # Example
//!
//! ```rust
//! use attr_template::{parse_attr_str, Catalogue, ListKind, RequestRef};
//!
//! let catalogue = Catalogue::builtin();
//! let tmpl = parse_attr_str(
//!     "&parent.reply:Tunnel-Type:1[0]",
//!     &catalogue,
//!     RequestRef::Current,
//!     ListKind::Request,
//! )
//! .unwrap();
//!
//! assert!(tmpl.is_attribute());
//! assert_eq!(tmpl.to_string(), "&parent.reply:Tunnel-Type:1[0]");
//! ```

pub mod config;
pub mod dict;
pub mod error;
pub mod parser;
pub mod request;
pub mod template;
pub mod value;

pub use config::{ConfigError, EngineConfig};
pub use dict::{Catalogue, CatalogueError, DictAttr, ValueType};
pub use error::ParseError;
pub use parser::{parse_attr_str, parse_attr_substr, AttrParse};
pub use request::{Pair, Request};
pub use template::{
    CastError, Expander, ListKind, NoExpansion, RequestRef, ResolveError, Template, TemplateKind,
    TmplCursor,
};
pub use value::{Value, ValueError};

/// Parse a reference using the defaults from `config`
///
/// # Example
///
/// ```rust
/// use attr_template::{parse_with_config, Catalogue, EngineConfig, ListKind};
///
/// let config = EngineConfig::default().with_list(ListKind::Reply);
/// let tmpl = parse_with_config("User-Name", &Catalogue::builtin(), &config).unwrap();
/// assert_eq!(tmpl.to_string(), "&reply:User-Name");
/// ```
pub fn parse_with_config<'a>(
    text: &'a str,
    catalogue: &Catalogue,
    config: &EngineConfig,
) -> Result<Template<'a>, ParseError> {
    parse_attr_str(text, catalogue, config.default_request, config.default_list)
}
