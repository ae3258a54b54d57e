//! Persisted payload of a composite node.
//!
//! Shape:
//! ```text
//! groupConfig = {
//!   group: { properties, containers:[{container, overrides}] | groupContainer, groups:[{group, overrides}] },
//!   center: [x,y],
//!   modules: [{name, value, config:{position:[x,y], ...}}],
//!   wires: [{src:{moduleId,terminal}, tgt:{moduleId,terminal}}],
//!   map: { containerMap:{fields:{ext->{containerId,name}}, terminals:{...}}, groupMap:{...} }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{FieldDef, GroupProperties, ModuleConfig, Override, Position, TerminalDef};

/// A member node referenced by index into `modules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedContainer {
  pub container: usize,
  #[serde(default)]
  pub overrides: Override,
}

/// A sub-group entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedSubGroup {
  pub group: SerializedGroup,
  #[serde(default)]
  pub overrides: Override,
}

/// Membership of a serialised group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SerializedMembers {
  Collapsed {
    #[serde(rename = "groupContainer")]
    group_container: usize,
  },
  Expanded {
    containers: Vec<SerializedContainer>,
    groups: Vec<SerializedSubGroup>,
  },
}

/// Structural snapshot of a group with node identities replaced by module indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedGroup {
  #[serde(default)]
  pub properties: GroupProperties,
  #[serde(flatten)]
  pub members: SerializedMembers,
}

/// One end of an internal wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleEndpoint {
  pub module_id: usize,
  pub terminal: String,
}

/// A wire with both ends inside the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalWire {
  pub src: ModuleEndpoint,
  pub tgt: ModuleEndpoint,
}

/// Target of an external name on a direct member node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPortRef {
  /// Index into the group's `containers` list.
  pub container_id: usize,
  pub name: String,
}

/// Target of an external name on a sub-group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPortRef {
  /// Index into the group's `groups` list.
  pub group_id: usize,
  /// The sub-group's own external name.
  pub name: String,
}

/// External name -> internal port, split by namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortIndex<R> {
  pub fields: BTreeMap<String, R>,
  pub terminals: BTreeMap<String, R>,
}

impl<R> Default for PortIndex<R> {
  fn default() -> Self {
    Self {
      fields: BTreeMap::new(),
      terminals: BTreeMap::new(),
    }
  }
}

/// Reverse map from composite port names to member ports.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalToInternalMap {
  pub container_map: PortIndex<ContainerPortRef>,
  pub group_map: PortIndex<GroupPortRef>,
}

/// Everything a composite node stores to rebuild its group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
  pub group: SerializedGroup,
  pub center: Position,
  pub modules: Vec<ModuleConfig>,
  pub wires: Vec<InternalWire>,
  pub map: ExternalToInternalMap,
}

/// Full persisted configuration of a composite node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollapsedConfig {
  pub fields: Vec<FieldDef>,
  pub terminals: Vec<TerminalDef>,
  pub position: Position,
  pub center: Position,
  pub group_config: GroupConfig,
}
