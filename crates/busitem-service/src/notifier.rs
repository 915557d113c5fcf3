use crate::{BusTransport, Result};
use busitem_registry::{ChangeSet, PointRegistry};
use tracing::trace;

/// Flushes a pass's change set as one `ItemsChanged` broadcast.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    emitted: u64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Broadcast every changed point; nothing is sent for an empty set.
    /// Returns whether a signal went out.
    pub fn notify<T: BusTransport + ?Sized>(
        &mut self,
        transport: &mut T,
        registry: &PointRegistry,
        changes: &ChangeSet,
    ) -> Result<bool> {
        if changes.is_empty() {
            return Ok(false);
        }
        let items = registry.items_for(changes.ids())?;
        transport.emit_items_changed(&items)?;
        self.emitted += 1;
        trace!(points = items.len(), total = self.emitted, "ItemsChanged emitted");
        Ok(true)
    }

    /// Signals emitted since startup.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}
