use crate::{BusRequest, BusTransport, Reply, Result, ServiceError};
use busitem_registry::ItemRecord;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::trace;

/// A reply recorded by [`MemoryBus`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentReply {
    pub request: BusRequest,
    pub reply: Reply,
}

/// In-process bus: requests are queued by the caller, replies and signals are
/// recorded for inspection. Polling never waits.
#[derive(Debug, Default)]
pub struct MemoryBus {
    name: String,
    inbox: VecDeque<BusRequest>,
    replies: Vec<SentReply>,
    declined: Vec<BusRequest>,
    signals: Vec<Vec<ItemRecord>>,
    next_ticket: u64,
    fail_sends: bool,
    closed: bool,
}

impl MemoryBus {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Queue a request; returns the ticket it was assigned.
    pub fn push(&mut self, request: BusRequest) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.inbox.push_back(request.with_ticket(ticket));
        ticket
    }

    pub fn push_call(&mut self, path: &str, interface: Option<&str>, member: &str) -> u64 {
        self.push(BusRequest::new(path, interface, member))
    }

    pub fn pending(&self) -> usize {
        self.inbox.len()
    }

    pub fn replies(&self) -> &[SentReply] {
        &self.replies
    }

    pub fn declined(&self) -> &[BusRequest] {
        &self.declined
    }

    pub fn signals(&self) -> &[Vec<ItemRecord>] {
        &self.signals
    }

    /// Make every subsequent send fail.
    pub fn fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }

    /// Simulate the peer dropping the connection.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl BusTransport for MemoryBus {
    fn service_name(&self) -> &str {
        &self.name
    }

    fn poll_request(&mut self, _wait: Duration) -> Result<Option<BusRequest>> {
        if self.closed {
            return Err(ServiceError::Disconnected);
        }
        Ok(self.inbox.pop_front())
    }

    fn send_reply(&mut self, request: &BusRequest, reply: Reply) -> Result<()> {
        if self.fail_sends {
            return Err(ServiceError::Send("memory bus rejected reply".into()));
        }
        trace!(ticket = request.ticket, ?reply, "reply");
        self.replies.push(SentReply {
            request: request.clone(),
            reply,
        });
        Ok(())
    }

    fn decline(&mut self, request: &BusRequest) -> Result<()> {
        self.declined.push(request.clone());
        Ok(())
    }

    fn emit_items_changed(&mut self, items: &[ItemRecord]) -> Result<()> {
        if self.fail_sends {
            return Err(ServiceError::Send("memory bus rejected signal".into()));
        }
        self.signals.push(items.to_vec());
        Ok(())
    }
}
