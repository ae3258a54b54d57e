//! Error types for the graph model and the collapse/expand engine.

use serde::{Deserialize, Serialize};

use crate::types::{GroupId, NodeId, WireId};

/// Two ports asked for the same external name in one namespace.
///
/// The only error a user can cause through overrides; everything else is a
/// [`GraphError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", rename = "MappingError")]
#[error("MappingError: {message}")]
pub struct MappingError {
  pub message: String,
}

impl MappingError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

/// Structural misuse of the graph model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
  #[error("unknown node {0}")]
  UnknownNode(NodeId),
  #[error("unknown wire {0}")]
  UnknownWire(WireId),
  #[error("unknown group {0}")]
  UnknownGroup(GroupId),
  #[error("node {node} has no terminal or wirable field '{port}'")]
  UnknownPort { node: NodeId, port: String },
  #[error("node {node} has no field '{field}'")]
  UnknownField { node: NodeId, field: String },
  #[error("port name '{0}' is declared twice")]
  DuplicatePort(String),
  #[error("node {node} still has {count} wire(s) attached")]
  NodeHasWires { node: NodeId, count: usize },
  #[error("node {node} already belongs to group {group}")]
  NodeInGroup { node: NodeId, group: GroupId },
  #[error("group {group} already has parent {parent}")]
  GroupHasParent { group: GroupId, parent: GroupId },
  #[error("adding group {child} to {parent} would create a cycle")]
  GroupCycle { parent: GroupId, child: GroupId },
  #[error("{member} is not a direct member of group {group}")]
  NotAMember { group: GroupId, member: String },
  #[error("group {0} is collapsed")]
  GroupCollapsed(GroupId),
  #[error("group {0} is not collapsed")]
  GroupExpanded(GroupId),
  #[error("group {0} is being collapsed")]
  GroupBusy(GroupId),
  #[error("cannot group an empty selection")]
  EmptySelection,
  #[error("group {0} has no members")]
  EmptyGroup(GroupId),
  #[error("selected members do not share one parent scope")]
  MixedScope,
  #[error("node {0} is not a composite node")]
  NotComposite(NodeId),
  #[error("composite node {0} is not bound to any group")]
  UnboundComposite(NodeId),
  #[error("invalid collapsed config: {0}")]
  BadCollapsedConfig(String),
  #[error("inconsistent membership: {0}")]
  BrokenLink(String),
}

/// Error from a collapse, expand, ungroup or map-building call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
  #[error(transparent)]
  Mapping(#[from] MappingError),
  #[error(transparent)]
  Graph(#[from] GraphError),
}
