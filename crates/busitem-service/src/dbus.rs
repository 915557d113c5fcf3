use crate::{BusRequest, BusTransport, Reply, Result, ServiceError};
use busitem_registry::{ItemRecord, WireValue, BUSITEM_INTERFACE, ITEMS_CHANGED_SIGNAL};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use zbus::blocking::{Connection, MessageIterator};
use zbus::fdo::{RequestNameFlags, RequestNameReply};
use zbus::message::Type as MessageType;
use zbus::names::BusName;
use zbus::zvariant::Value;
use zbus::Message;

/// Which message bus to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusKind {
    System,
    Session,
}

/// D-Bus transport. A forwarding thread drains the connection's message stream into
/// a channel so that polling can wait with a bound.
pub struct DbusTransport {
    name: String,
    connection: Connection,
    inbound: Receiver<Message>,
    in_flight: HashMap<u64, Message>,
    next_ticket: u64,
}

impl DbusTransport {
    /// Connect and claim `name` exclusively. Fails if the name is held by another peer.
    pub fn connect(kind: BusKind, name: &str) -> Result<Self> {
        let connection = match kind {
            BusKind::System => Connection::system(),
            BusKind::Session => Connection::session(),
        }
        .map_err(|e| ServiceError::Connect(e.to_string()))?;

        match connection.request_name_with_flags(name, RequestNameFlags::DoNotQueue.into()) {
            Ok(RequestNameReply::PrimaryOwner) | Ok(RequestNameReply::AlreadyOwner) => {}
            Ok(reply) => {
                warn!(?reply, name, "bus name not granted");
                return Err(ServiceError::NameUnavailable(name.to_string()));
            }
            Err(zbus::Error::NameTaken) => {
                return Err(ServiceError::NameUnavailable(name.to_string()));
            }
            Err(e) => return Err(ServiceError::Connect(e.to_string())),
        }
        info!(name, ?kind, "bus name acquired");

        let (tx, inbound) = mpsc::channel();
        let messages = MessageIterator::from(&connection);
        thread::Builder::new()
            .name("dbus-inbound".into())
            .spawn(move || {
                for msg in messages {
                    let msg = match msg {
                        Ok(msg) => msg,
                        Err(e) => {
                            warn!("dbus receive error: {e}");
                            continue;
                        }
                    };
                    if msg.header().message_type() != MessageType::MethodCall {
                        continue;
                    }
                    if tx.send(msg).is_err() {
                        break;
                    }
                }
                debug!("dbus inbound stream ended");
            })
            .map_err(|e| ServiceError::Connect(e.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            connection,
            inbound,
            in_flight: HashMap::new(),
            next_ticket: 0,
        })
    }

    fn take(&mut self, request: &BusRequest) -> Result<Message> {
        self.in_flight
            .remove(&request.ticket)
            .ok_or(ServiceError::UnknownRequest(request.ticket))
    }

    fn reply_with<B>(&self, call: &Message, body: &B) -> Result<()>
    where
        B: serde::Serialize + zbus::zvariant::DynamicType,
    {
        self.connection
            .reply(call, body)
            .map(|_| ())
            .map_err(|e| ServiceError::Send(e.to_string()))
    }
}

fn to_value(value: &WireValue) -> Value<'static> {
    match value {
        WireValue::Double(v) => Value::F64(*v),
        WireValue::Uint32(v) => Value::U32(*v),
        WireValue::Text(s) => Value::from(s.clone()),
    }
}

fn item_map(items: &[ItemRecord]) -> HashMap<String, HashMap<String, Value<'static>>> {
    items
        .iter()
        .map(|item| {
            let mut entry = HashMap::with_capacity(2);
            entry.insert("Value".to_string(), to_value(&item.value));
            entry.insert("Text".to_string(), Value::from(item.text.clone()));
            (item.path.clone(), entry)
        })
        .collect()
}

impl BusTransport for DbusTransport {
    fn service_name(&self) -> &str {
        &self.name
    }

    fn poll_request(&mut self, wait: Duration) -> Result<Option<BusRequest>> {
        let msg = match self.inbound.recv_timeout(wait) {
            Ok(msg) => msg,
            Err(RecvTimeoutError::Timeout) => return Ok(None),
            Err(RecvTimeoutError::Disconnected) => return Err(ServiceError::Disconnected),
        };
        let header = msg.header();
        let path = header.path().map(|p| p.to_string()).unwrap_or_default();
        let interface = header.interface().map(|i| i.to_string());
        let member = header.member().map(|m| m.to_string()).unwrap_or_default();

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.in_flight.insert(ticket, msg.clone());
        Ok(Some(BusRequest {
            path,
            interface,
            member,
            ticket,
        }))
    }

    fn send_reply(&mut self, request: &BusRequest, reply: Reply) -> Result<()> {
        let call = self.take(request)?;
        match reply {
            Reply::Value(value) => self.reply_with(&call, &to_value(&value)),
            Reply::Text(text) | Reply::Document(text) => self.reply_with(&call, &text),
            Reply::Items(items) => self.reply_with(&call, &item_map(&items)),
            Reply::Invalid => self.reply_with(&call, &()),
        }
    }

    fn decline(&mut self, request: &BusRequest) -> Result<()> {
        self.take(request).map(|_| ())
    }

    fn emit_items_changed(&mut self, items: &[ItemRecord]) -> Result<()> {
        self.connection
            .emit_signal(
                None::<BusName<'_>>,
                "/",
                BUSITEM_INTERFACE,
                ITEMS_CHANGED_SIGNAL,
                &item_map(items),
            )
            .map_err(|e| ServiceError::Send(e.to_string()))
    }
}
