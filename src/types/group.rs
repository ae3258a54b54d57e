//! Groups of nodes and sub-groups.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{GroupId, NodeId, Override};

/// Free-form group properties (`name`, `description`, ...).
pub type GroupProperties = serde_json::Map<String, Value>;

/// A direct member of a group with its override record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member<T> {
  pub id: T,
  #[serde(default)]
  pub overrides: Override,
}

impl<T> Member<T> {
  pub fn new(id: T) -> Self {
    Self {
      id,
      overrides: Override::default(),
    }
  }

  pub fn with_overrides(id: T, overrides: Override) -> Self {
    Self { id, overrides }
  }
}

/// Live membership of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GroupState {
  Expanded {
    containers: Vec<Member<NodeId>>,
    groups: Vec<Member<GroupId>>,
  },
  /// Members live only inside the composite node's config.
  Collapsed { group_container: NodeId },
}

/// A possibly nested, possibly collapsed group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
  pub id: GroupId,
  #[serde(default)]
  pub properties: GroupProperties,
  pub parent: Option<GroupId>,
  pub state: GroupState,
  /// Set while a collapse is removing members; suppresses pruning.
  #[serde(skip)]
  pub collapsing: bool,
}

impl Group {
  pub(crate) fn expanded(id: GroupId, properties: GroupProperties) -> Self {
    Self {
      id,
      properties,
      parent: None,
      state: GroupState::Expanded {
        containers: Vec::new(),
        groups: Vec::new(),
      },
      collapsing: false,
    }
  }

  pub fn name(&self) -> Option<&str> {
    self.properties.get("name").and_then(Value::as_str)
  }

  pub fn is_collapsed(&self) -> bool {
    matches!(self.state, GroupState::Collapsed { .. })
  }

  pub fn group_container(&self) -> Option<NodeId> {
    match self.state {
      GroupState::Collapsed { group_container } => Some(group_container),
      GroupState::Expanded { .. } => None,
    }
  }

  /// Direct member nodes; empty while collapsed.
  pub fn containers(&self) -> &[Member<NodeId>] {
    match &self.state {
      GroupState::Expanded { containers, .. } => containers,
      GroupState::Collapsed { .. } => &[],
    }
  }

  /// Direct sub-groups; empty while collapsed.
  pub fn groups(&self) -> &[Member<GroupId>] {
    match &self.state {
      GroupState::Expanded { groups, .. } => groups,
      GroupState::Collapsed { .. } => &[],
    }
  }

  /// Expanded with no members left.
  pub fn is_empty(&self) -> bool {
    match &self.state {
      GroupState::Expanded { containers, groups } => containers.is_empty() && groups.is_empty(),
      GroupState::Collapsed { .. } => false,
    }
  }
}
