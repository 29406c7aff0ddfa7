//! Typed attribute values
//!
//! A [`Value`] is what a literal becomes once it has been parsed against a
//! [`ValueType`]. Parsing accepts the textual forms configuration authors
//! write; [`fmt::Display`] prints the same forms back.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use thiserror::Error;

use crate::dict::ValueType;

/// Errors produced when text cannot be parsed as a given type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("'{text}' is not a valid {ty} value")]
    Invalid { ty: ValueType, text: String },
    #[error("'{text}' is out of range for {ty}")]
    OutOfRange { ty: ValueType, text: String },
    #[error("invalid hex string '{text}': {reason}")]
    Hex { text: String, reason: String },
}

/// A typed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Octets(Vec<u8>),
    Ipaddr(Ipv4Addr),
    Ipv6addr(Ipv6Addr),
    Integer(u32),
    Byte(u8),
    Short(u16),
    Integer64(u64),
    Signed(i32),
    /// Seconds since the epoch
    Date(u32),
    Ether([u8; 6]),
    Boolean(bool),
    Tlv(Vec<u8>),
}

impl Value {
    /// Parse `text` as a value of type `ty`
    pub fn parse(ty: ValueType, text: &str) -> Result<Self, ValueError> {
        let invalid = || ValueError::Invalid {
            ty,
            text: text.to_string(),
        };
        let out_of_range = || ValueError::OutOfRange {
            ty,
            text: text.to_string(),
        };

        let value = match ty {
            ValueType::String => Value::String(text.to_string()),
            ValueType::Octets => Value::Octets(parse_octets(text)?),
            ValueType::Tlv => Value::Tlv(parse_hex(text)?),
            ValueType::Ipaddr => Value::Ipaddr(text.trim().parse().map_err(|_| invalid())?),
            ValueType::Ipv6addr => Value::Ipv6addr(text.trim().parse().map_err(|_| invalid())?),
            ValueType::Integer => {
                let n = parse_unsigned(text).ok_or_else(invalid)?;
                Value::Integer(u32::try_from(n).map_err(|_| out_of_range())?)
            }
            ValueType::Byte => {
                let n = parse_unsigned(text).ok_or_else(invalid)?;
                Value::Byte(u8::try_from(n).map_err(|_| out_of_range())?)
            }
            ValueType::Short => {
                let n = parse_unsigned(text).ok_or_else(invalid)?;
                Value::Short(u16::try_from(n).map_err(|_| out_of_range())?)
            }
            ValueType::Integer64 => Value::Integer64(parse_unsigned(text).ok_or_else(invalid)?),
            ValueType::Date => {
                let n = parse_unsigned(text).ok_or_else(invalid)?;
                Value::Date(u32::try_from(n).map_err(|_| out_of_range())?)
            }
            ValueType::Signed => {
                let n: i64 = text.trim().parse().map_err(|_| invalid())?;
                Value::Signed(i32::try_from(n).map_err(|_| out_of_range())?)
            }
            ValueType::Ether => Value::Ether(parse_ether(text).ok_or_else(invalid)?),
            ValueType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
                "yes" | "true" | "1" => Value::Boolean(true),
                "no" | "false" | "0" => Value::Boolean(false),
                _ => return Err(invalid()),
            },
        };
        Ok(value)
    }

    /// Type of the value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Octets(_) => ValueType::Octets,
            Value::Ipaddr(_) => ValueType::Ipaddr,
            Value::Ipv6addr(_) => ValueType::Ipv6addr,
            Value::Integer(_) => ValueType::Integer,
            Value::Byte(_) => ValueType::Byte,
            Value::Short(_) => ValueType::Short,
            Value::Integer64(_) => ValueType::Integer64,
            Value::Signed(_) => ValueType::Signed,
            Value::Date(_) => ValueType::Date,
            Value::Ether(_) => ValueType::Ether,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Tlv(_) => ValueType::Tlv,
        }
    }

    /// Length of the value's data in bytes
    pub fn len(&self) -> usize {
        match self {
            Value::String(s) => s.len(),
            Value::Octets(b) | Value::Tlv(b) => b.len(),
            Value::Ipaddr(_) => 4,
            Value::Ipv6addr(_) => 16,
            Value::Integer(_) | Value::Signed(_) | Value::Date(_) => 4,
            Value::Byte(_) | Value::Boolean(_) => 1,
            Value::Short(_) => 2,
            Value::Integer64(_) => 8,
            Value::Ether(_) => 6,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Octets(bytes) | Value::Tlv(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Value::Ipaddr(ip) => write!(f, "{}", ip),
            Value::Ipv6addr(ip) => write!(f, "{}", ip),
            Value::Integer(n) | Value::Date(n) => write!(f, "{}", n),
            Value::Byte(n) => write!(f, "{}", n),
            Value::Short(n) => write!(f, "{}", n),
            Value::Integer64(n) => write!(f, "{}", n),
            Value::Signed(n) => write!(f, "{}", n),
            Value::Ether(mac) => write!(
                f,
                "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
            ),
            Value::Boolean(b) => f.write_str(if *b { "yes" } else { "no" }),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value)
    }
}

/// Decimal, or hex with a `0x` prefix
fn parse_unsigned(text: &str) -> Option<u64> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(digits) if digits.bytes().all(|c| c.is_ascii_hexdigit()) => {
            u64::from_str_radix(digits, 16).ok()
        }
        Some(_) => None,
        None => text.parse().ok(),
    }
}

/// `0x`-prefixed hex, otherwise the raw bytes of the text
fn parse_octets(text: &str) -> Result<Vec<u8>, ValueError> {
    if text.starts_with("0x") || text.starts_with("0X") {
        parse_hex(text)
    } else {
        Ok(text.as_bytes().to_vec())
    }
}

fn parse_hex(text: &str) -> Result<Vec<u8>, ValueError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(digits).map_err(|e| ValueError::Hex {
        text: text.to_string(),
        reason: e.to_string(),
    })
}

fn parse_ether(text: &str) -> Option<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut parts = text.trim().split(|c| c == ':' || c == '-');
    for byte in mac.iter_mut() {
        let part = parts.next()?;
        if !part.bytes().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        *byte = u8::from_str_radix(part, 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(mac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_integers() {
        assert_eq!(Value::parse(ValueType::Integer, "123"), Ok(Value::Integer(123)));
        assert_eq!(Value::parse(ValueType::Integer, "0x10"), Ok(Value::Integer(16)));
        assert_eq!(Value::parse(ValueType::Byte, "255"), Ok(Value::Byte(255)));
        assert!(matches!(
            Value::parse(ValueType::Byte, "256"),
            Err(ValueError::OutOfRange { .. })
        ));
        assert!(matches!(
            Value::parse(ValueType::Integer, "abc"),
            Err(ValueError::Invalid { .. })
        ));
        assert_eq!(Value::parse(ValueType::Signed, "-5"), Ok(Value::Signed(-5)));
    }

    #[test]
    fn test_parse_addresses() {
        assert_eq!(
            Value::parse(ValueType::Ipaddr, "192.0.2.1"),
            Ok(Value::Ipaddr(Ipv4Addr::new(192, 0, 2, 1)))
        );
        assert!(Value::parse(ValueType::Ipaddr, "192.0.2").is_err());
        assert_eq!(
            Value::parse(ValueType::Ether, "00:11:22:aa:bb:cc")
                .unwrap()
                .to_string(),
            "00:11:22:aa:bb:cc"
        );
    }

    #[test]
    fn test_parse_octets() {
        assert_eq!(
            Value::parse(ValueType::Octets, "0x0aff"),
            Ok(Value::Octets(vec![0x0a, 0xff]))
        );
        assert_eq!(
            Value::parse(ValueType::Octets, "ab"),
            Ok(Value::Octets(b"ab".to_vec()))
        );
        assert!(Value::parse(ValueType::Octets, "0xabc").is_err());
        assert_eq!(Value::Octets(vec![1, 2]).to_string(), "0x0102");
    }

    #[test]
    fn test_signs_are_not_hex_digits() {
        assert!(matches!(
            Value::parse(ValueType::Octets, "0x+f+f"),
            Err(ValueError::Hex { .. })
        ));
        assert!(matches!(
            Value::parse(ValueType::Tlv, "+f"),
            Err(ValueError::Hex { .. })
        ));
        assert_eq!(Value::parse(ValueType::Tlv, "0a0B"), Ok(Value::Tlv(vec![0x0a, 0x0b])));
        assert!(Value::parse(ValueType::Integer, "0x+10").is_err());
        assert!(Value::parse(ValueType::Ether, "+0:11:22:33:44:55").is_err());
    }

    #[test]
    fn test_lengths() {
        assert_eq!(Value::from("").len(), 0);
        assert_eq!(Value::Integer(0).len(), 4);
        assert_eq!(Value::Ipv6addr(Ipv6Addr::LOCALHOST).len(), 16);
        assert_eq!(Value::Octets(vec![]).value_type(), ValueType::Octets);
    }
}
