//! Introspection documents for path-tree nodes.

use crate::tree::PathNode;
use crate::{RegistryError, Result};
use std::fmt::Write;

pub const INTROSPECTABLE_INTERFACE: &str = "org.freedesktop.DBus.Introspectable";
pub const BUSITEM_INTERFACE: &str = "com.victronenergy.BusItem";
pub const ITEMS_CHANGED_SIGNAL: &str = "ItemsChanged";

const DOCTYPE: &str = "<!DOCTYPE node PUBLIC \"-//freedesktop//DTD D-BUS Object Introspection 1.0//EN\"\n\
\"http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd\">\n";

const READ_METHODS: &str = "    <method name=\"GetValue\">\n\
\x20     <arg direction=\"out\" type=\"v\"/>\n\
\x20   </method>\n\
\x20   <method name=\"GetText\">\n\
\x20     <arg direction=\"out\" type=\"s\"/>\n\
\x20   </method>\n\
\x20   <method name=\"GetItems\">\n\
\x20     <arg direction=\"out\" type=\"a{sa{sv}}\"/>\n\
\x20   </method>\n";

const SET_VALUE: &str = "    <method name=\"SetValue\">\n\
\x20     <arg direction=\"in\" type=\"v\" name=\"newvalue\"/>\n\
\x20     <arg direction=\"out\" type=\"i\"/>\n\
\x20   </method>\n";

const GET_MIN: &str = "    <method name=\"GetMin\">\n\
\x20     <arg direction=\"out\" type=\"u\"/>\n\
\x20   </method>\n";

const GET_MAX: &str = "    <method name=\"GetMax\">\n\
\x20     <arg direction=\"out\" type=\"u\"/>\n\
\x20   </method>\n";

const GET_DESCRIPTION: &str = "    <method name=\"GetDescription\">\n\
\x20     <arg direction=\"in\" type=\"s\" name=\"language\"/>\n\
\x20     <arg direction=\"in\" type=\"i\" name=\"length\"/>\n\
\x20     <arg direction=\"out\" type=\"s\"/>\n\
\x20   </method>\n";

const ITEMS_CHANGED: &str = "    <signal name=\"ItemsChanged\">\n\
\x20     <arg type=\"a{sa{sv}}\" name=\"changes\"/>\n\
\x20   </signal>\n";

/// Optional affordances advertised on top of the read interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub settable: bool,
    pub has_min: bool,
    pub has_max: bool,
    pub has_description: bool,
}

impl Capabilities {
    /// Plain read-only item.
    pub const READ_ONLY: Self = Self {
        settable: false,
        has_min: false,
        has_max: false,
        has_description: false,
    };
}

/// Render the introspection document for `node`, published under `node_name`.
pub fn describe(node_name: &str, node: &PathNode, caps: Capabilities) -> Result<String> {
    render(node_name, node, caps).map_err(|e| RegistryError::Document(e.to_string()))
}

fn render(node_name: &str, node: &PathNode, caps: Capabilities) -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(DOCTYPE);
    writeln!(xml, "<node name=\"{}\">", escape(node_name))?;
    writeln!(xml, "  <interface name=\"{INTROSPECTABLE_INTERFACE}\">")?;
    xml.push_str("    <method name=\"Introspect\">\n");
    xml.push_str("      <arg name=\"data\" direction=\"out\" type=\"s\"/>\n");
    xml.push_str("    </method>\n");
    xml.push_str("  </interface>\n");

    writeln!(xml, "  <interface name=\"{BUSITEM_INTERFACE}\">")?;
    xml.push_str(READ_METHODS);
    if caps.settable {
        xml.push_str(SET_VALUE);
    }
    if caps.has_min {
        xml.push_str(GET_MIN);
    }
    if caps.has_max {
        xml.push_str(GET_MAX);
    }
    if caps.has_description {
        xml.push_str(GET_DESCRIPTION);
    }
    xml.push_str(ITEMS_CHANGED);
    xml.push_str("  </interface>\n");

    for child in node.children() {
        writeln!(xml, "  <node name=\"{}\"/>", escape(&child.name))?;
    }
    xml.push_str("</node>\n");
    Ok(xml)
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
