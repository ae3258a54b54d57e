//! User-supplied visibility and naming overrides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{GroupId, NodeId, Side};

/// Override for one field or terminal of a group member.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortOverride {
  #[serde(default)]
  pub visible: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rename: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub side: Option<Side>,
}

impl PortOverride {
  pub fn shown() -> Self {
    Self {
      visible: true,
      ..Self::default()
    }
  }

  pub fn hidden() -> Self {
    Self::default()
  }

  /// Visible under `name`.
  pub fn renamed(name: impl Into<String>) -> Self {
    Self {
      visible: true,
      rename: Some(name.into()),
      side: None,
    }
  }

  pub fn on(mut self, side: Side) -> Self {
    self.side = Some(side);
    self
  }
}

/// Per-member override record, keyed by the member's port names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Override {
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub fields: BTreeMap<String, PortOverride>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub terminals: BTreeMap<String, PortOverride>,
}

impl Override {
  pub fn field(mut self, name: impl Into<String>, po: PortOverride) -> Self {
    self.fields.insert(name.into(), po);
    self
  }

  pub fn terminal(mut self, name: impl Into<String>, po: PortOverride) -> Self {
    self.terminals.insert(name.into(), po);
    self
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty() && self.terminals.is_empty()
  }
}

/// Replacement overrides for the direct members of one group, passed to collapse.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupOverrides {
  #[serde(default)]
  pub containers: BTreeMap<NodeId, Override>,
  #[serde(default)]
  pub groups: BTreeMap<GroupId, Override>,
}

impl GroupOverrides {
  pub fn container(mut self, node: NodeId, o: Override) -> Self {
    self.containers.insert(node, o);
    self
  }

  pub fn group(mut self, group: GroupId, o: Override) -> Self {
    self.groups.insert(group, o);
    self
  }
}
