use crate::message::{GET_ITEMS, GET_TEXT, GET_VALUE, INTROSPECT};
use crate::{BusRequest, Reply};
use busitem_registry::{
    describe, Capabilities, PathTree, PointRegistry, BUSITEM_INTERFACE, INTROSPECTABLE_INTERFACE,
};
use tracing::{debug, error, warn};

/// What to do with one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Reply(Reply),
    /// Send nothing back.
    Decline,
}

/// Answer one request from the registry and tree. Only reads; never blocks.
pub fn dispatch(request: &BusRequest, registry: &PointRegistry, tree: &PathTree) -> Outcome {
    if request.is(INTROSPECTABLE_INTERFACE, INTROSPECT) {
        return introspect(request, tree);
    }
    if request.interface.as_deref() != Some(BUSITEM_INTERFACE) {
        debug!(
            path = %request.path,
            interface = ?request.interface,
            member = %request.member,
            "ignoring call on foreign interface"
        );
        return Outcome::Decline;
    }

    let reply = match request.member.as_str() {
        GET_VALUE => match registry.find(&request.path) {
            Some(id) => match registry.marshal(id, false) {
                Ok(value) => Reply::Value(value),
                Err(e) => {
                    error!(path = %request.path, "marshal failed: {e}");
                    Reply::Invalid
                }
            },
            None => unknown_path(request),
        },
        GET_TEXT => match registry.get(&request.path) {
            Ok(point) => Reply::Text(point.text.clone()),
            Err(_) => unknown_path(request),
        },
        // Path is not used as a filter: every point is returned.
        GET_ITEMS => Reply::Items(registry.items()),
        other => {
            debug!(path = %request.path, member = other, "unsupported member");
            Reply::Invalid
        }
    };
    Outcome::Reply(reply)
}

fn unknown_path(request: &BusRequest) -> Reply {
    debug!(path = %request.path, member = %request.member, "unknown path");
    Reply::Invalid
}

fn introspect(request: &BusRequest, tree: &PathTree) -> Outcome {
    let Some(node) = tree.find(&request.path) else {
        warn!(path = %request.path, "introspect on unknown path");
        return Outcome::Decline;
    };
    match describe(&request.path, node, Capabilities::READ_ONLY) {
        Ok(doc) => Outcome::Reply(Reply::Document(doc)),
        Err(e) => {
            error!(path = %request.path, "introspection failed: {e}");
            Outcome::Decline
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busitem_registry::{PointUpdate, WireValue};

    fn fixture() -> (PointRegistry, PathTree) {
        let reg = PointRegistry::with_default_schema().unwrap();
        let tree = PathTree::build(&reg).unwrap();
        (reg, tree)
    }

    fn item(path: &str, member: &str) -> BusRequest {
        BusRequest::new(path, Some(BUSITEM_INTERFACE), member)
    }

    #[test]
    fn get_value_marshals_native_type() {
        let (mut reg, tree) = fixture();
        let id = reg.find("/Ac/Frequency").unwrap();
        reg.set_value(id, PointUpdate::decimal(49.98)).unwrap();

        let out = dispatch(&item("/Ac/Frequency", GET_VALUE), &reg, &tree);
        assert_eq!(out, Outcome::Reply(Reply::Value(WireValue::Double(49.98))));
        let out = dispatch(&item("/Ac/MaxPower", GET_VALUE), &reg, &tree);
        assert_eq!(out, Outcome::Reply(Reply::Value(WireValue::Uint32(3800))));
        let out = dispatch(&item("/CustomName", GET_VALUE), &reg, &tree);
        assert_eq!(
            out,
            Outcome::Reply(Reply::Value(WireValue::Text("SMA 3800".into())))
        );
    }

    #[test]
    fn get_text_always_returns_text() {
        let (mut reg, tree) = fixture();
        let id = reg.find("/Ac/Power").unwrap();
        reg.set_value(id, PointUpdate::decimal(1500.0)).unwrap();
        let out = dispatch(&item("/Ac/Power", GET_TEXT), &reg, &tree);
        assert_eq!(out, Outcome::Reply(Reply::Text("1500.00".into())));
    }

    #[test]
    fn unknown_path_is_invalid() {
        let (reg, tree) = fixture();
        for member in [GET_VALUE, GET_TEXT] {
            let out = dispatch(&item("/Bogus", member), &reg, &tree);
            assert_eq!(out, Outcome::Reply(Reply::Invalid));
        }
        // Interior nodes carry no value.
        let out = dispatch(&item("/Ac", GET_VALUE), &reg, &tree);
        assert_eq!(out, Outcome::Reply(Reply::Invalid));
    }

    #[test]
    fn get_items_ignores_path() {
        let (reg, tree) = fixture();
        for path in ["/", "/Ac/L1", "/Bogus"] {
            let out = dispatch(&item(path, GET_ITEMS), &reg, &tree);
            assert!(
                matches!(&out, Outcome::Reply(Reply::Items(items)) if items.len() == reg.len()),
                "{out:?}"
            );
        }
    }

    #[test]
    fn unsupported_member_is_invalid() {
        let (reg, tree) = fixture();
        let out = dispatch(&item("/Ac/Power", "SetValue"), &reg, &tree);
        assert_eq!(out, Outcome::Reply(Reply::Invalid));
    }

    #[test]
    fn introspect_resolves_tree_nodes() {
        let (reg, tree) = fixture();
        let req = BusRequest::new("/Ac", Some(INTROSPECTABLE_INTERFACE), INTROSPECT);
        let Outcome::Reply(Reply::Document(doc)) = dispatch(&req, &reg, &tree) else {
            unreachable!("introspect on /Ac must produce a document");
        };
        assert!(doc.contains("<node name=\"/Ac\">"));
        assert!(doc.contains("<node name=\"L1\"/>"));
        let req = BusRequest::new("/Nope", Some(INTROSPECTABLE_INTERFACE), INTROSPECT);
        assert_eq!(dispatch(&req, &reg, &tree), Outcome::Decline);
    }

    #[test]
    fn foreign_interface_is_declined() {
        let (reg, tree) = fixture();
        let req = BusRequest::new("/Ac/Power", Some("org.freedesktop.DBus.Properties"), "Get");
        assert_eq!(dispatch(&req, &reg, &tree), Outcome::Decline);
        let req = BusRequest::new("/Ac/Power", None, GET_VALUE);
        assert_eq!(dispatch(&req, &reg, &tree), Outcome::Decline);
    }
}
