use busitem_registry::{ItemRecord, WireValue};

pub const GET_VALUE: &str = "GetValue";
pub const GET_TEXT: &str = "GetText";
pub const GET_ITEMS: &str = "GetItems";
pub const INTROSPECT: &str = "Introspect";

/// One inbound method call. `ticket` identifies it to the transport when replying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusRequest {
    pub path: String,
    pub interface: Option<String>,
    pub member: String,
    pub ticket: u64,
}

impl BusRequest {
    pub fn new(path: &str, interface: Option<&str>, member: &str) -> Self {
        Self {
            path: path.to_string(),
            interface: interface.map(str::to_string),
            member: member.to_string(),
            ticket: 0,
        }
    }

    pub fn with_ticket(mut self, ticket: u64) -> Self {
        self.ticket = ticket;
        self
    }

    pub fn is(&self, interface: &str, member: &str) -> bool {
        self.interface.as_deref() == Some(interface) && self.member == member
    }
}

/// Reply body for an answered request.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Value(WireValue),
    Text(String),
    Items(Vec<ItemRecord>),
    Document(String),
    /// Empty method return: unknown path or unsupported member.
    Invalid,
}

impl Reply {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Reply::Invalid)
    }
}
