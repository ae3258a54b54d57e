//! Visibility/map builder: decides which member ports a group exposes and
//! under which external names.
//!
//! A port is forced visible when a wire attached to it leaves the group's
//! full (recursive) member closure. Otherwise the member's override decides,
//! falling back to the field's own default. Explicit renames are claimed
//! first, in member order; remaining visible ports then get default names
//! from the [name allocator](crate::naming).

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

use crate::error::{EngineError, GraphError, MappingError};
use crate::graph::{Graph, MemberRef};
use crate::naming::UsedNames;
use crate::types::{
  Endpoint, FieldDef, GroupId, GroupMap, GroupOverrides, InterfaceMap, MapEntry, MemberMap, Node,
  NodeId, Override, PortDef, PortOverride, TerminalDef,
};

/// Ports of one member, each paired with the live endpoint it stands for.
struct Ports {
  fields: Vec<(FieldDef, Endpoint)>,
  terminals: Vec<(TerminalDef, Endpoint)>,
}

impl Ports {
  fn of_node(node: &Node) -> Self {
    Self {
      fields: node
        .fields
        .iter()
        .map(|f| (f.clone(), Endpoint::new(node.id, f.name.clone())))
        .collect(),
      terminals: node
        .terminals
        .iter()
        .map(|t| (t.clone(), Endpoint::new(node.id, t.name.clone())))
        .collect(),
    }
  }

  /// Exposed ports of an already mapped group, in member order.
  fn of_map(map: &InterfaceMap) -> Self {
    let members = map
      .container_map
      .iter()
      .chain(map.group_map.iter().map(|g| &g.group_container_map));
    let mut ports = Ports {
      fields: Vec::new(),
      terminals: Vec::new(),
    };
    for m in members {
      ports.fields.extend(
        m.fields
          .iter()
          .filter_map(|e| e.exposed().map(|d| (d, e.anchor.clone()))),
      );
      ports.terminals.extend(
        m.terminals
          .iter()
          .filter_map(|e| e.exposed().map(|d| (d, e.anchor.clone()))),
      );
    }
    ports
  }
}

/// Builds the interface map of an expanded group.
///
/// Collapsed sub-groups are seen through their composite node; expanded ones
/// are mapped first and seen through their own exposed ports.
#[instrument(level = "trace", skip(graph))]
pub fn build_map(graph: &Graph, group: GroupId) -> Result<InterfaceMap, EngineError> {
  let g = graph.group(group)?;
  if g.is_collapsed() {
    return Err(GraphError::GroupCollapsed(group).into());
  }
  let all_members = graph.members_of(group)?;

  let mut container_map = Vec::with_capacity(g.containers().len());
  for member in g.containers() {
    let ports = Ports::of_node(graph.node(member.id)?);
    container_map.push(member_map(graph, &all_members, ports, &member.overrides));
  }

  let mut group_map = Vec::with_capacity(g.groups().len());
  for member in g.groups() {
    let sub = graph.group(member.id)?;
    let (inner, ports) = match sub.group_container() {
      Some(composite) => (None, Ports::of_node(graph.node(composite)?)),
      None => {
        let inner = build_map(graph, member.id)?;
        let ports = Ports::of_map(&inner);
        (Some(Box::new(inner)), ports)
      }
    };
    group_map.push(GroupMap {
      inner,
      group_container_map: member_map(graph, &all_members, ports, &member.overrides),
    });
  }

  let mut map = InterfaceMap {
    container_map,
    group_map,
  };
  assign_names(&mut map)?;
  Ok(map)
}

/// True if a wire at `anchor` has its other end outside `inside`.
fn crosses_boundary(graph: &Graph, inside: &BTreeSet<NodeId>, anchor: &Endpoint) -> bool {
  graph
    .wires_at(anchor)
    .into_iter()
    .any(|w| w.other_end(anchor).is_some_and(|o| !inside.contains(&o.node)))
}

fn entry<C: PortDef>(
  config: C,
  anchor: Endpoint,
  po: Option<&PortOverride>,
  default_visible: bool,
  force_visible: bool,
) -> MapEntry<C> {
  let visible = po.map_or(default_visible, |o| o.visible) || force_visible;
  MapEntry {
    config,
    anchor,
    visible,
    external_name: po.and_then(|o| o.rename.clone()).filter(|_| visible),
    force_visible,
    side: po.and_then(|o| o.side).unwrap_or_default(),
  }
}

fn member_map(graph: &Graph, inside: &BTreeSet<NodeId>, ports: Ports, overrides: &Override) -> MemberMap {
  let fields = ports
    .fields
    .into_iter()
    .map(|(f, anchor)| {
      let force = f.wirable && crosses_boundary(graph, inside, &anchor);
      let po = overrides.fields.get(&f.name);
      let default_visible = f.visible;
      entry(f, anchor, po, default_visible, force)
    })
    .collect();
  let terminals = ports
    .terminals
    .into_iter()
    .map(|(t, anchor)| {
      let force = crosses_boundary(graph, inside, &anchor);
      let po = overrides.terminals.get(&t.name);
      entry(t, anchor, po, false, force)
    })
    .collect();
  MemberMap { fields, terminals }
}

fn member_maps_mut(map: &mut InterfaceMap) -> impl Iterator<Item = &mut MemberMap> {
  map
    .container_map
    .iter_mut()
    .chain(map.group_map.iter_mut().map(|g| &mut g.group_container_map))
}

fn reserve_renames<C: PortDef>(entries: &[MapEntry<C>], used: &mut UsedNames) -> Result<(), MappingError> {
  for e in entries.iter().filter(|e| e.visible) {
    if let Some(name) = &e.external_name {
      used.reserve(name, e.config.namespace(), &e.anchor.to_string())?;
    }
  }
  Ok(())
}

fn allocate_defaults<C: PortDef>(entries: &mut [MapEntry<C>], used: &mut UsedNames) {
  for e in entries.iter_mut().filter(|e| e.visible && e.external_name.is_none()) {
    let name = used.allocate(e.config.name(), e.config.namespace(), &e.anchor.to_string());
    e.external_name = Some(name);
  }
}

/// Claims explicit renames, then fills in default names.
fn assign_names(map: &mut InterfaceMap) -> Result<(), MappingError> {
  let mut used = UsedNames::default();
  for m in member_maps_mut(map) {
    reserve_renames(&m.fields, &mut used)?;
    reserve_renames(&m.terminals, &mut used)?;
  }
  for m in member_maps_mut(map) {
    allocate_defaults(&mut m.fields, &mut used);
    allocate_defaults(&mut m.terminals, &mut used);
  }
  Ok(())
}

/// Outcome of validating a set of overrides without touching the live graph.
#[derive(Debug, Clone, Serialize)]
pub struct OverrideCheck {
  pub valid: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<MappingError>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub map: Option<InterfaceMap>,
}

/// Replaces member override records of `group` with the given ones.
pub(crate) fn apply_overrides(
  graph: &mut Graph,
  group: GroupId,
  overrides: &GroupOverrides,
) -> Result<(), GraphError> {
  for (node, o) in &overrides.containers {
    graph.set_member_overrides(group, MemberRef::Node(*node), o.clone())?;
  }
  for (sub, o) in &overrides.groups {
    graph.set_member_overrides(group, MemberRef::Group(*sub), o.clone())?;
  }
  Ok(())
}

/// Builds the map of `group` on a scratch copy with `overrides` applied.
///
/// A name collision comes back as `valid: false`; structural errors propagate.
#[instrument(level = "trace", skip(graph, overrides))]
pub fn check_overrides(
  graph: &Graph,
  group: GroupId,
  overrides: Option<&GroupOverrides>,
) -> Result<OverrideCheck, GraphError> {
  let mut scratch = graph.clone();
  if let Some(o) = overrides {
    apply_overrides(&mut scratch, group, o)?;
  }
  match build_map(&scratch, group) {
    Ok(map) => Ok(OverrideCheck {
      valid: true,
      error: None,
      map: Some(map),
    }),
    Err(EngineError::Mapping(error)) => {
      debug!(group = %group, %error, "overrides rejected");
      Ok(OverrideCheck {
        valid: false,
        error: Some(error),
        map: None,
      })
    }
    Err(EngineError::Graph(e)) => Err(e),
  }
}
