//! Directed wires between node ports.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{NodeId, WireId};

/// One end of a wire: a node and the name of a terminal or wirable field on it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
  pub node: NodeId,
  pub terminal: String,
}

impl Endpoint {
  pub fn new(node: NodeId, terminal: impl Into<String>) -> Self {
    Self {
      node,
      terminal: terminal.into(),
    }
  }
}

impl fmt::Display for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.node, self.terminal)
  }
}

/// Input to [`Graph::add_wire`](crate::Graph::add_wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireConfig {
  pub src: Endpoint,
  pub tgt: Endpoint,
}

impl WireConfig {
  pub fn new(src: Endpoint, tgt: Endpoint) -> Self {
    Self { src, tgt }
  }
}

/// A live wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
  pub id: WireId,
  pub src: Endpoint,
  pub tgt: Endpoint,
}

impl Wire {
  pub fn touches(&self, node: NodeId) -> bool {
    self.src.node == node || self.tgt.node == node
  }

  /// True if either end is exactly `endpoint`.
  pub fn attached_at(&self, endpoint: &Endpoint) -> bool {
    &self.src == endpoint || &self.tgt == endpoint
  }

  /// The end opposite `endpoint`, or `None` if the wire is not attached there.
  pub fn other_end(&self, endpoint: &Endpoint) -> Option<&Endpoint> {
    if &self.src == endpoint {
      Some(&self.tgt)
    } else if &self.tgt == endpoint {
      Some(&self.src)
    } else {
      None
    }
  }
}
