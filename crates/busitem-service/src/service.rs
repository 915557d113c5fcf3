use crate::{dispatch, BusMetrics, BusTransport, ChangeNotifier, Outcome, Result};
use busitem_registry::{ChangeSet, PathTree, PointRegistry};
use std::time::Duration;
use tracing::debug;

/// A transport plus the dispatch and notification logic run from the poll loop.
pub struct BusService<T> {
    transport: T,
    notifier: ChangeNotifier,
    metrics: Option<BusMetrics>,
}

impl<T: BusTransport> BusService<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            notifier: ChangeNotifier::new(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: BusMetrics) -> Self {
        self.set_metrics(metrics);
        self
    }

    pub fn set_metrics(&mut self, metrics: BusMetrics) {
        self.metrics = Some(metrics);
    }

    pub fn service_name(&self) -> &str {
        self.transport.service_name()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Handle at most one pending request, waiting up to `wait` for it.
    /// Returns whether a request was processed.
    pub fn pump_once(
        &mut self,
        registry: &PointRegistry,
        tree: &PathTree,
        wait: Duration,
    ) -> Result<bool> {
        let Some(request) = self.transport.poll_request(wait)? else {
            return Ok(false);
        };
        debug!(path = %request.path, member = %request.member, "bus request");
        match dispatch(&request, registry, tree) {
            Outcome::Reply(reply) => {
                if let Some(m) = &self.metrics {
                    m.requests.inc();
                    if reply.is_invalid() {
                        m.invalid.inc();
                    }
                }
                self.transport.send_reply(&request, reply)?;
            }
            Outcome::Decline => {
                if let Some(m) = &self.metrics {
                    m.declined.inc();
                }
                self.transport.decline(&request)?;
            }
        }
        Ok(true)
    }

    /// Emit one `ItemsChanged` for `changes` if it is non-empty.
    pub fn notify(&mut self, registry: &PointRegistry, changes: &ChangeSet) -> Result<bool> {
        let sent = self.notifier.notify(&mut self.transport, registry, changes)?;
        if sent {
            if let Some(m) = &self.metrics {
                m.signals.inc();
            }
        }
        Ok(sent)
    }

    pub fn signals_emitted(&self) -> u64 {
        self.notifier.emitted()
    }
}
