//! Request and list resolution
//!
//! Maps the scope of a template (which request, which list) onto the
//! attribute list of a concrete request. Both ways of failing are soft:
//! the caller logs them and carries on with the rest of the request.

use thiserror::Error;

use super::types::{ListKind, RequestRef};
use crate::request::{PacketCode, Pair, Request};

/// Why a template could not be resolved against a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no matching attribute")]
    NotFound,
    #[error("list '{0}' is not available in this context")]
    ListUnavailable(ListKind),
    #[error("request '{0}' is not reachable from this request")]
    Unreachable(RequestRef),
}

impl ResolveError {
    /// Numeric form: -1 not found, -2 list unavailable, -3 unreachable
    pub fn code(self) -> i32 {
        match self {
            ResolveError::NotFound => -1,
            ResolveError::ListUnavailable(_) => -2,
            ResolveError::Unreachable(_) => -3,
        }
    }
}

/// Follow the request qualifier from `request`
///
/// `parent` and `outer` both follow a single link; a request without one
/// leaves them unreachable.
pub fn resolve_request<'r>(
    request: &'r Request<'r>,
    scope: RequestRef,
) -> Result<&'r Request<'r>, ResolveError> {
    match scope {
        RequestRef::Current => Ok(request),
        RequestRef::Parent | RequestRef::Outer => request.parent().ok_or_else(|| {
            tracing::debug!(%scope, "Request has no parent");
            ResolveError::Unreachable(scope)
        }),
    }
}

/// Find a named list in `request`
///
/// The CoA and disconnect lists are only present when the request
/// originated a packet of the matching code.
pub fn resolve_list<'r>(
    request: &'r Request<'_>,
    list: ListKind,
) -> Result<&'r [Pair], ResolveError> {
    let found = match list {
        ListKind::Request => Some(&request.packet.vps),
        ListKind::Reply => Some(&request.reply.vps),
        ListKind::Control => Some(&request.control),
        ListKind::ProxyRequest => request.proxy.as_ref().map(|p| &p.vps),
        ListKind::ProxyReply => request.proxy_reply.as_ref().map(|p| &p.vps),
        ListKind::Coa | ListKind::CoaReply | ListKind::Disconnect | ListKind::DisconnectReply => {
            let wanted = match list {
                ListKind::Coa | ListKind::CoaReply => PacketCode::CoaRequest,
                _ => PacketCode::DisconnectRequest,
            };
            request
                .coa
                .as_ref()
                .filter(|leg| leg.proxy.code == wanted)
                .and_then(|leg| match list {
                    ListKind::Coa | ListKind::Disconnect => Some(&leg.proxy.vps),
                    _ => leg.proxy_reply.as_ref().map(|p| &p.vps),
                })
        }
    };

    found.map(Vec::as_slice).ok_or_else(|| {
        tracing::debug!(%list, "List not available in this context");
        ResolveError::ListUnavailable(list)
    })
}

/// Resolve a request qualifier and list to the pairs they name
pub fn resolve<'r>(
    request: &'r Request<'r>,
    scope: RequestRef,
    list: ListKind,
) -> Result<&'r [Pair], ResolveError> {
    let target = resolve_request(request, scope)?;
    resolve_list(target, list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::Catalogue;
    use crate::request::{CoaLeg, Packet};

    fn coa_request(code: PacketCode) -> Request<'static> {
        let catalogue = Catalogue::builtin();
        let user = catalogue.by_name("User-Name").unwrap();
        let mut request = Request::new(PacketCode::AccessRequest);
        let proxy = Packet::new(code).with_pairs(vec![Pair::parse(user.clone(), "bob").unwrap()]);
        let reply =
            Packet::new(PacketCode::CoaAck).with_pairs(vec![Pair::parse(user, "ack").unwrap()]);
        request.coa = Some(CoaLeg::new(proxy).with_reply(reply));
        request
    }

    #[test]
    fn test_coa_lists_need_matching_code() {
        let request = coa_request(PacketCode::DisconnectRequest);
        assert_eq!(
            resolve(&request, RequestRef::Current, ListKind::CoaReply),
            Err(ResolveError::ListUnavailable(ListKind::CoaReply))
        );
        assert_eq!(
            resolve(&request, RequestRef::Current, ListKind::Coa),
            Err(ResolveError::ListUnavailable(ListKind::Coa))
        );
        assert_eq!(
            resolve(&request, RequestRef::Current, ListKind::Disconnect).map(<[Pair]>::len),
            Ok(1)
        );
    }

    #[test]
    fn test_disconnect_reply_is_the_reply_leg() {
        let request = coa_request(PacketCode::DisconnectRequest);
        let reply = resolve(&request, RequestRef::Current, ListKind::DisconnectReply).unwrap();
        assert_eq!(reply[0].value.to_string(), "ack");
    }

    #[test]
    fn test_coa_reply_available_for_coa() {
        let request = coa_request(PacketCode::CoaRequest);
        let reply = resolve(&request, RequestRef::Current, ListKind::CoaReply).unwrap();
        assert_eq!(reply.len(), 1);
    }

    #[test]
    fn test_parent_scope() {
        let parent = Request::new(PacketCode::AccessRequest);
        let child = Request::new(PacketCode::AccessRequest).with_parent(&parent);

        assert!(resolve(&child, RequestRef::Outer, ListKind::Request).is_ok());
        assert_eq!(
            resolve(&parent, RequestRef::Parent, ListKind::Request),
            Err(ResolveError::Unreachable(RequestRef::Parent))
        );
    }

    #[test]
    fn test_missing_proxy_leg() {
        let request = Request::new(PacketCode::AccessRequest);
        assert_eq!(
            resolve(&request, RequestRef::Current, ListKind::ProxyReply).map(<[Pair]>::len),
            Err(ResolveError::ListUnavailable(ListKind::ProxyReply))
        );
        assert_eq!(ResolveError::ListUnavailable(ListKind::ProxyReply).code(), -2);
    }
}
