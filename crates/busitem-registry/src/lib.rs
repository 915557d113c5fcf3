//! busitem-registry: the object model published on the bus
//!
//! A flat registry of addressable points (each with a fixed wire type and a live value),
//! the hierarchical path tree derived from the point paths, and the introspection
//! documents generated from that tree. Everything here is plain owned data; the
//! service and bridge crates drive it from a single thread.

mod error;
pub use error::{RegistryError, Result};

mod point;
pub use point::{PointDefault, PointId, PointKind, PointSpec, PointUpdate, RegistryPoint};

mod registry;
pub use registry::PointRegistry;

pub mod schema;
pub use schema::{DEFAULT_KEYMAP, DEFAULT_SCHEMA};

mod wire;
pub use wire::{ItemRecord, WireValue};

mod tree;
pub use tree::{segments, PathNode, PathTree, NODE_CHILD_MAX};

mod introspect;
pub use introspect::{
    describe, Capabilities, BUSITEM_INTERFACE, INTROSPECTABLE_INTERFACE, ITEMS_CHANGED_SIGNAL,
};

mod keymap;
pub use keymap::{ChannelKeyMap, KeyMapEntry, POINTS_PER_CHANNEL};

mod changes;
pub use changes::ChangeSet;

