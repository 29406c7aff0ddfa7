//! Parser for attribute references and value tokens

mod grammar;
pub mod lexer;
mod qualifier;

pub use grammar::{parse_attr_str, parse_attr_substr, AttrParse};
pub use lexer::{lex_value, Quote, ValueToken};
