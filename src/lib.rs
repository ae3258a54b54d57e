//! # wirebox
//!
//! Node/wire program graph with nested groups that collapse into a single
//! composite node and expand back without loss.
//!
//! ## Architecture
//!
//! - [`graph`]: nodes, wires and group membership (structural bookkeeping only).
//! - [`naming`]: collision-free external names.
//! - [`interface`]: which member ports a group exposes, and as what.
//! - [`serialise`] and [`collapse`]: group to composite node.
//! - [`expand`]: composite node back to group, and ungroup.
//! - [`editor`]: session facade with options and an observer.
//!
//! Collapse, expand and ungroup are staged on a copy of the graph and only
//! committed when they succeed.

pub mod collapse;
#[cfg(test)]
mod collapse_test;
pub mod editor;
pub mod error;
pub mod expand;
#[cfg(test)]
mod fixtures;
pub mod graph;
pub mod graph_io;
#[cfg(test)]
mod graph_io_test;
pub mod interface;
pub mod naming;
pub mod observer;
pub mod serialise;
pub mod types;

pub use collapse::collapse;
pub use editor::{Editor, EditorOptions};
pub use error::{EngineError, GraphError, MappingError};
pub use expand::{UngroupOutcome, expand, expand_composite, ungroup};
pub use graph::{Graph, MemberRef};
pub use interface::{OverrideCheck, build_map, check_overrides};
pub use naming::fresh_name;
pub use observer::{GroupEvent, GroupObserver, RecordingObserver};
pub use types::{GroupId, InterfaceMap, NodeId, WireId};
