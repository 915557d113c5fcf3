use crate::{BusRequest, Reply, Result};
use busitem_registry::ItemRecord;
use std::time::Duration;

/// A message bus connection holding one well-known service name.
pub trait BusTransport {
    fn service_name(&self) -> &str;

    /// Next inbound method call, waiting at most `wait`. `Ok(None)` when nothing arrived.
    fn poll_request(&mut self, wait: Duration) -> Result<Option<BusRequest>>;

    fn send_reply(&mut self, request: &BusRequest, reply: Reply) -> Result<()>;

    /// Drop a request without answering; the caller times out on its side.
    fn decline(&mut self, _request: &BusRequest) -> Result<()> {
        Ok(())
    }

    /// Broadcast `ItemsChanged` from the root object.
    fn emit_items_changed(&mut self, items: &[ItemRecord]) -> Result<()>;
}
