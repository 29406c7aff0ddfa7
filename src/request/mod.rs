//! Request graph
//!
//! A [`Request`] is the view of one request being handled: its packet, the
//! reply being built, the control list, any proxied leg and any
//! change-of-authorization leg. A request may link to the request it was
//! spawned from; the link is a plain borrow, so a parent always outlives the
//! requests that refer to it.

mod fixture;

use std::fmt;
use std::sync::Arc;

use crate::dict::DictAttr;
use crate::value::{Value, ValueError};

pub use fixture::{FixtureError, RequestFixture};

/// One attribute instance with its value
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub da: Arc<DictAttr>,
    pub tag: Option<u8>,
    pub value: Value,
}

impl Pair {
    pub fn new(da: Arc<DictAttr>, value: Value) -> Self {
        Self {
            da,
            tag: None,
            value,
        }
    }

    /// Parse `text` according to the attribute's type
    pub fn parse(da: Arc<DictAttr>, text: &str) -> Result<Self, ValueError> {
        let value = Value::parse(da.ty, text)?;
        Ok(Self::new(da, value))
    }

    pub fn with_tag(mut self, tag: u8) -> Self {
        self.tag = Some(tag);
        self
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            Some(tag) => write!(f, "{}:{} = {}", self.da.name, tag, self.value),
            None => write!(f, "{} = {}", self.da.name, self.value),
        }
    }
}

/// RADIUS packet codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketCode {
    AccessRequest,
    AccessAccept,
    AccessReject,
    AccountingRequest,
    AccountingResponse,
    AccessChallenge,
    StatusServer,
    DisconnectRequest,
    DisconnectAck,
    DisconnectNak,
    CoaRequest,
    CoaAck,
    CoaNak,
}

impl PacketCode {
    const NAMES: [(&'static str, PacketCode); 13] = [
        ("Access-Request", PacketCode::AccessRequest),
        ("Access-Accept", PacketCode::AccessAccept),
        ("Access-Reject", PacketCode::AccessReject),
        ("Accounting-Request", PacketCode::AccountingRequest),
        ("Accounting-Response", PacketCode::AccountingResponse),
        ("Access-Challenge", PacketCode::AccessChallenge),
        ("Status-Server", PacketCode::StatusServer),
        ("Disconnect-Request", PacketCode::DisconnectRequest),
        ("Disconnect-ACK", PacketCode::DisconnectAck),
        ("Disconnect-NAK", PacketCode::DisconnectNak),
        ("CoA-Request", PacketCode::CoaRequest),
        ("CoA-ACK", PacketCode::CoaAck),
        ("CoA-NAK", PacketCode::CoaNak),
    ];

    /// Numeric code on the wire
    pub fn code(self) -> u8 {
        match self {
            PacketCode::AccessRequest => 1,
            PacketCode::AccessAccept => 2,
            PacketCode::AccessReject => 3,
            PacketCode::AccountingRequest => 4,
            PacketCode::AccountingResponse => 5,
            PacketCode::AccessChallenge => 11,
            PacketCode::StatusServer => 12,
            PacketCode::DisconnectRequest => 40,
            PacketCode::DisconnectAck => 41,
            PacketCode::DisconnectNak => 42,
            PacketCode::CoaRequest => 43,
            PacketCode::CoaAck => 44,
            PacketCode::CoaNak => 45,
        }
    }

    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, code)| *code == self)
            .map(|(name, _)| *name)
            .unwrap_or("Unknown")
    }

    /// Look a code up by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, code)| *code)
    }
}

impl fmt::Display for PacketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A packet and its attribute list
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub code: PacketCode,
    pub vps: Vec<Pair>,
}

impl Packet {
    pub fn new(code: PacketCode) -> Self {
        Self {
            code,
            vps: Vec::new(),
        }
    }

    pub fn with_pairs(mut self, vps: Vec<Pair>) -> Self {
        self.vps = vps;
        self
    }
}

/// Change-of-authorization or disconnect leg originated by a request
#[derive(Debug, Clone, PartialEq)]
pub struct CoaLeg {
    /// The CoA-Request or Disconnect-Request sent
    pub proxy: Packet,
    /// The response, once received
    pub proxy_reply: Option<Packet>,
}

impl CoaLeg {
    pub fn new(proxy: Packet) -> Self {
        Self {
            proxy,
            proxy_reply: None,
        }
    }

    pub fn with_reply(mut self, reply: Packet) -> Self {
        self.proxy_reply = Some(reply);
        self
    }
}

/// A request being handled, with an optional link to its parent
#[derive(Debug, Clone)]
pub struct Request<'p> {
    pub packet: Packet,
    pub reply: Packet,
    pub control: Vec<Pair>,
    pub proxy: Option<Packet>,
    pub proxy_reply: Option<Packet>,
    pub coa: Option<CoaLeg>,
    parent: Option<&'p Request<'p>>,
}

impl<'p> Request<'p> {
    /// Create a request for a packet of the given code, with an empty reply
    pub fn new(code: PacketCode) -> Self {
        let reply_code = match code {
            PacketCode::AccountingRequest => PacketCode::AccountingResponse,
            PacketCode::CoaRequest => PacketCode::CoaAck,
            PacketCode::DisconnectRequest => PacketCode::DisconnectAck,
            _ => PacketCode::AccessAccept,
        };
        Self {
            packet: Packet::new(code),
            reply: Packet::new(reply_code),
            control: Vec::new(),
            proxy: None,
            proxy_reply: None,
            coa: None,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: &'p Request<'p>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn set_parent(&mut self, parent: &'p Request<'p>) {
        self.parent = Some(parent);
    }

    /// The request this one was spawned from, if any
    pub fn parent(&self) -> Option<&'p Request<'p>> {
        self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::Catalogue;

    #[test]
    fn test_packet_code_names() {
        assert_eq!(PacketCode::from_name("coa-request"), Some(PacketCode::CoaRequest));
        assert_eq!(PacketCode::DisconnectRequest.code(), 40);
        assert_eq!(PacketCode::CoaRequest.to_string(), "CoA-Request");
        assert_eq!(PacketCode::from_name("Bogus"), None);
    }

    #[test]
    fn test_parent_link() {
        let parent = Request::new(PacketCode::AccessRequest);
        let child = Request::new(PacketCode::AccessRequest).with_parent(&parent);
        assert!(child.parent().is_some());
        assert!(parent.parent().is_none());
    }

    #[test]
    fn test_pair_display() {
        let catalogue = Catalogue::builtin();
        let pair = Pair::parse(catalogue.by_name("Tunnel-Type").unwrap(), "13")
            .unwrap()
            .with_tag(2);
        assert_eq!(pair.to_string(), "Tunnel-Type:2 = 13");
    }
}
