//! busitem-service: answering bus-item requests and broadcasting changes
//!
//! A `BusTransport` delivers inbound method calls and carries replies and
//! `ItemsChanged` broadcasts. The dispatcher maps each call onto the point registry
//! and path tree; `BusService` ties the two together for the poll loop. An in-memory
//! transport is always available for tests; the `zbus` feature adds a D-Bus backend.

mod error;
pub use error::{Result, ServiceError};

mod message;
pub use message::{BusRequest, Reply, GET_ITEMS, GET_TEXT, GET_VALUE, INTROSPECT};

mod transport;
pub use transport::BusTransport;

mod dispatcher;
pub use dispatcher::{dispatch, Outcome};

mod notifier;
pub use notifier::ChangeNotifier;

mod metrics;
pub use metrics::{BusMetrics, MetricsHub};

mod service;
pub use service::BusService;

#[cfg(feature = "mock")]
mod memory;
#[cfg(feature = "mock")]
pub use memory::{MemoryBus, SentReply};

#[cfg(feature = "zbus")]
mod dbus;
#[cfg(feature = "zbus")]
pub use dbus::{BusKind, DbusTransport};

/// Well-known name claimed when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "com.victronenergy.pvinverter.smanet";
