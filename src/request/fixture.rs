//! TOML request fixtures
//!
//! Fixtures describe a request graph in a file so that references can be
//! resolved from the command line and in tests:
//!
//! ```toml
//! code = "Access-Request"
//! request = [{ attribute = "User-Name", value = "bob" }]
//! reply = [{ attribute = "Tunnel-Type", value = "13", tag = 1 }]
//!
//! [coa]
//! code = "Disconnect-Request"
//! request = [{ attribute = "User-Name", value = "bob" }]
//!
//! [parent]
//! request = [{ attribute = "User-Name", value = "outer" }]
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::{CoaLeg, Packet, PacketCode, Pair, Request};
use crate::dict::Catalogue;
use crate::value::ValueError;

/// Errors that can occur when loading a fixture
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("failed to read fixture file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("failed to parse fixture TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),
    #[error("unknown packet code '{0}'")]
    UnknownCode(String),
    #[error("bad value for '{attribute}': {source}")]
    Value {
        attribute: String,
        #[source]
        source: ValueError,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct PairFixture {
    attribute: String,
    value: String,
    tag: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
struct CoaFixture {
    code: String,
    #[serde(default)]
    request: Vec<PairFixture>,
    reply: Option<Vec<PairFixture>>,
}

/// A request graph described in TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequestFixture {
    code: Option<String>,
    #[serde(default)]
    request: Vec<PairFixture>,
    #[serde(default)]
    reply: Vec<PairFixture>,
    #[serde(default)]
    control: Vec<PairFixture>,
    proxy_request: Option<Vec<PairFixture>>,
    proxy_reply: Option<Vec<PairFixture>>,
    coa: Option<CoaFixture>,
    parent: Option<Box<RequestFixture>>,
}

impl RequestFixture {
    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, FixtureError> {
        Ok(toml::from_str(content)?)
    }

    /// Fixture for the parent request, if one was described
    pub fn parent(&self) -> Option<&RequestFixture> {
        self.parent.as_deref()
    }

    /// Build the request this fixture describes
    ///
    /// The parent is not linked; build it separately with [`Self::parent`]
    /// and attach it with [`Request::set_parent`].
    pub fn build<'p>(&self, catalogue: &Catalogue) -> Result<Request<'p>, FixtureError> {
        let code = parse_code(self.code.as_deref().unwrap_or("Access-Request"))?;
        let mut request = Request::new(code);
        request.packet.vps = build_pairs(&self.request, catalogue)?;
        request.reply.vps = build_pairs(&self.reply, catalogue)?;
        request.control = build_pairs(&self.control, catalogue)?;

        if let Some(pairs) = &self.proxy_request {
            request.proxy = Some(
                Packet::new(request.packet.code).with_pairs(build_pairs(pairs, catalogue)?),
            );
        }
        if let Some(pairs) = &self.proxy_reply {
            request.proxy_reply = Some(
                Packet::new(request.reply.code).with_pairs(build_pairs(pairs, catalogue)?),
            );
        }

        if let Some(coa) = &self.coa {
            let code = parse_code(&coa.code)?;
            let pairs = build_pairs(&coa.request, catalogue)?;
            let mut leg = CoaLeg::new(Packet::new(code).with_pairs(pairs));
            if let Some(reply) = &coa.reply {
                let reply_code = match code {
                    PacketCode::DisconnectRequest => PacketCode::DisconnectAck,
                    _ => PacketCode::CoaAck,
                };
                let pairs = build_pairs(reply, catalogue)?;
                leg = leg.with_reply(Packet::new(reply_code).with_pairs(pairs));
            }
            request.coa = Some(leg);
        }

        Ok(request)
    }
}

fn parse_code(name: &str) -> Result<PacketCode, FixtureError> {
    PacketCode::from_name(name).ok_or_else(|| FixtureError::UnknownCode(name.to_string()))
}

fn build_pairs(pairs: &[PairFixture], catalogue: &Catalogue) -> Result<Vec<Pair>, FixtureError> {
    pairs
        .iter()
        .map(|p| {
            let da = catalogue
                .by_name(&p.attribute)
                .ok_or_else(|| FixtureError::UnknownAttribute(p.attribute.clone()))?;
            let mut pair = Pair::parse(da, &p.value).map_err(|source| FixtureError::Value {
                attribute: p.attribute.clone(),
                source,
            })?;
            pair.tag = p.tag;
            Ok(pair)
        })
        .collect()
}
