//! Computed interface of a group: which member ports are exposed, and as what.

use serde::{Deserialize, Serialize};

use super::{Endpoint, FieldDef, PortDef, Side, TerminalDef};

/// Visibility decision for one member field or terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntry<C> {
  /// Declaration as seen on the member (internal name).
  pub config: C,
  /// Live port this entry stands for; wires attach here.
  pub anchor: Endpoint,
  pub visible: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub external_name: Option<String>,
  /// A wire crosses the group boundary here; the user cannot hide it.
  pub force_visible: bool,
  #[serde(default)]
  pub side: Side,
}

impl<C: PortDef> MapEntry<C> {
  pub fn internal_name(&self) -> &str {
    self.config.name()
  }

  /// External declaration, if this entry is exposed and named.
  pub fn exposed(&self) -> Option<C> {
    match (&self.external_name, self.visible) {
      (Some(ext), true) => Some(self.config.exposed_as(ext, self.side)),
      _ => None,
    }
  }
}

/// Field and terminal entries for one member, in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemberMap {
  pub fields: Vec<MapEntry<FieldDef>>,
  pub terminals: Vec<MapEntry<TerminalDef>>,
}

impl MemberMap {
  pub fn field(&self, internal: &str) -> Option<&MapEntry<FieldDef>> {
    self.fields.iter().find(|e| e.config.name == internal)
  }

  pub fn terminal(&self, internal: &str) -> Option<&MapEntry<TerminalDef>> {
    self.terminals.iter().find(|e| e.config.name == internal)
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty() && self.terminals.is_empty()
  }
}

/// Entry for a sub-group: its ports as seen from the enclosing group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMap {
  /// The sub-group's own interface while it is still expanded.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub inner: Option<Box<InterfaceMap>>,
  pub group_container_map: MemberMap,
}

/// Interface of an expanded group, one entry per direct member.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceMap {
  pub container_map: Vec<MemberMap>,
  pub group_map: Vec<GroupMap>,
}

impl InterfaceMap {
  fn member_maps(&self) -> impl Iterator<Item = &MemberMap> {
    self
      .container_map
      .iter()
      .chain(self.group_map.iter().map(|g| &g.group_container_map))
  }

  /// Exposed fields in member order (containers first, then sub-groups).
  pub fn external_fields(&self) -> Vec<FieldDef> {
    self
      .member_maps()
      .flat_map(|m| m.fields.iter().filter_map(MapEntry::exposed))
      .collect()
  }

  /// Exposed terminals in member order (containers first, then sub-groups).
  pub fn external_terminals(&self) -> Vec<TerminalDef> {
    self
      .member_maps()
      .flat_map(|m| m.terminals.iter().filter_map(MapEntry::exposed))
      .collect()
  }

  /// External name of the wirable port anchored at `anchor`.
  pub fn external_name_at(&self, anchor: &Endpoint) -> Option<&str> {
    for m in self.member_maps() {
      if let Some(e) = m.terminals.iter().find(|e| &e.anchor == anchor) {
        return e.external_name.as_deref().filter(|_| e.visible);
      }
      if let Some(e) = m
        .fields
        .iter()
        .find(|e| e.config.wirable && &e.anchor == anchor)
      {
        return e.external_name.as_deref().filter(|_| e.visible);
      }
    }
    None
  }
}
