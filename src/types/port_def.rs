//! Field and terminal declarations on a node.

use serde::{Deserialize, Serialize};

use super::{Direction, Side};
use crate::naming::Namespace;

/// A named value slot on a node. A `wirable` field also acts as a port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
  pub name: String,
  /// Value type hint for the form renderer (e.g. `string`, `integer`).
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub field_type: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  #[serde(default)]
  pub wirable: bool,
  /// Exposed on a composite when no override says otherwise.
  #[serde(default)]
  pub visible: bool,
  #[serde(default)]
  pub side: Side,
}

impl FieldDef {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      field_type: None,
      label: None,
      wirable: false,
      visible: false,
      side: Side::Auto,
    }
  }

  pub fn wirable(mut self) -> Self {
    self.wirable = true;
    self
  }

  pub fn visible(mut self) -> Self {
    self.visible = true;
    self
  }

  pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
    self.field_type = Some(field_type.into());
    self
  }
}

/// A named directional port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalDef {
  pub name: String,
  #[serde(default)]
  pub direction: Direction,
  #[serde(default)]
  pub side: Side,
}

impl TerminalDef {
  pub fn input(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      direction: Direction::Input,
      side: Side::Auto,
    }
  }

  pub fn output(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      direction: Direction::Output,
      side: Side::Auto,
    }
  }

  pub fn on(mut self, side: Side) -> Self {
    self.side = side;
    self
  }
}

/// Common view over [`FieldDef`] and [`TerminalDef`] used by the map builder.
pub trait PortDef: Clone {
  fn name(&self) -> &str;

  /// Namespace the port's external name is allocated in.
  fn namespace(&self) -> Namespace;

  /// Copy of this declaration as it appears on a composite node.
  fn exposed_as(&self, external_name: &str, side: Side) -> Self;
}

impl PortDef for FieldDef {
  fn name(&self) -> &str {
    &self.name
  }

  fn namespace(&self) -> Namespace {
    if self.wirable {
      Namespace::WirableField
    } else {
      Namespace::Field
    }
  }

  fn exposed_as(&self, external_name: &str, side: Side) -> Self {
    Self {
      name: external_name.to_string(),
      side,
      ..self.clone()
    }
  }
}

impl PortDef for TerminalDef {
  fn name(&self) -> &str {
    &self.name
  }

  fn namespace(&self) -> Namespace {
    Namespace::Terminal
  }

  fn exposed_as(&self, external_name: &str, side: Side) -> Self {
    Self {
      name: external_name.to_string(),
      direction: self.direction,
      side,
    }
  }
}
