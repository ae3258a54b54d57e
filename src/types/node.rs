//! A node (container) of the program graph.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{FieldDef, GroupConfig, GroupId, NodeId, Position, TerminalDef};

/// Opaque field-value bag of a node, keyed by field name.
pub type FieldValues = serde_json::Map<String, Value>;

/// Default xtype of a plain module node.
pub const DEFAULT_XTYPE: &str = "Container";

/// Placement and declarations of a node, as stored in a module entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerConfig {
  pub position: Position,
  #[serde(default = "default_xtype")]
  pub xtype: String,
  #[serde(default)]
  pub fields: Vec<FieldDef>,
  #[serde(default)]
  pub terminals: Vec<TerminalDef>,
  /// Present only on composite nodes.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub group_config: Option<Box<GroupConfig>>,
}

fn default_xtype() -> String {
  DEFAULT_XTYPE.to_string()
}

/// Everything needed to (re)create a node: `{name, value, config}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
  pub name: String,
  #[serde(default)]
  pub value: FieldValues,
  pub config: ContainerConfig,
}

impl ModuleConfig {
  /// A plain module at `position` with no ports.
  pub fn new(name: impl Into<String>, position: Position) -> Self {
    Self {
      name: name.into(),
      value: FieldValues::new(),
      config: ContainerConfig {
        position,
        xtype: default_xtype(),
        fields: Vec::new(),
        terminals: Vec::new(),
        group_config: None,
      },
    }
  }

  pub fn field(mut self, field: FieldDef) -> Self {
    self.config.fields.push(field);
    self
  }

  pub fn terminal(mut self, terminal: TerminalDef) -> Self {
    self.config.terminals.push(terminal);
    self
  }

  pub fn value(mut self, name: impl Into<String>, value: Value) -> Self {
    self.value.insert(name.into(), value);
    self
  }
}

/// Whether a node is an ordinary module or stands in for a collapsed group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
  Module,
  Composite { group_config: Box<GroupConfig> },
}

/// A node with fields, terminals and a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub id: NodeId,
  pub name: String,
  pub xtype: String,
  pub position: Position,
  pub fields: Vec<FieldDef>,
  pub terminals: Vec<TerminalDef>,
  pub value: FieldValues,
  /// Enclosing group, or `None` on the root layer.
  pub group: Option<GroupId>,
  pub kind: NodeKind,
}

impl Node {
  pub(crate) fn from_module(id: NodeId, module: ModuleConfig) -> Self {
    let ModuleConfig {
      name,
      value,
      config,
    } = module;
    let kind = match config.group_config {
      Some(group_config) => NodeKind::Composite { group_config },
      None => NodeKind::Module,
    };
    Self {
      id,
      name,
      xtype: config.xtype,
      position: config.position,
      fields: config.fields,
      terminals: config.terminals,
      value,
      group: None,
      kind,
    }
  }

  pub fn field(&self, name: &str) -> Option<&FieldDef> {
    self.fields.iter().find(|f| f.name == name)
  }

  pub fn terminal(&self, name: &str) -> Option<&TerminalDef> {
    self.terminals.iter().find(|t| t.name == name)
  }

  /// True if a wire may attach at `name` (a terminal or a wirable field).
  pub fn has_port(&self, name: &str) -> bool {
    self.terminal(name).is_some() || self.field(name).is_some_and(|f| f.wirable)
  }

  pub fn is_composite(&self) -> bool {
    matches!(self.kind, NodeKind::Composite { .. })
  }

  pub fn group_config(&self) -> Option<&GroupConfig> {
    match &self.kind {
      NodeKind::Composite { group_config } => Some(&**group_config),
      NodeKind::Module => None,
    }
  }

  /// Module entry for this node with its position shifted by `-origin`.
  pub fn module_config(&self, origin: Position) -> ModuleConfig {
    ModuleConfig {
      name: self.name.clone(),
      value: self.value.clone(),
      config: ContainerConfig {
        position: self.position - origin,
        xtype: self.xtype.clone(),
        fields: self.fields.clone(),
        terminals: self.terminals.clone(),
        group_config: self.group_config().cloned().map(Box::new),
      },
    }
  }

  /// Full persisted payload of a composite node.
  pub fn collapsed_config(&self) -> Option<super::CollapsedConfig> {
    let group_config = self.group_config()?;
    Some(super::CollapsedConfig {
      fields: self.fields.clone(),
      terminals: self.terminals.clone(),
      position: self.position,
      center: group_config.center,
      group_config: group_config.clone(),
    })
  }
}
