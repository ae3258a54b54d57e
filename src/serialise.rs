//! Serialisation half of collapse: turns a live group into index-based
//! records that no longer depend on node identity.
//!
//! Every node the group owns (direct members, members of expanded
//! sub-groups, composites of collapsed ones) is given an index into one flat
//! list. Membership, internal wires and module configs are all written in
//! terms of that index.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{instrument, trace};

use crate::error::GraphError;
use crate::graph::Graph;
use crate::types::{
  ContainerPortRef, Endpoint, ExternalToInternalMap, FieldValues, GroupConfig, GroupId,
  GroupPortRef, GroupState, InterfaceMap, InternalWire, MapEntry, ModuleConfig, ModuleEndpoint,
  NodeId, PortDef, PortIndex, Position, SerializedContainer, SerializedGroup, SerializedMembers,
  SerializedSubGroup, WireId,
};

/// Appends every node owned by `group` to `out`, direct members first.
pub fn add_all_containers(graph: &Graph, group: GroupId, out: &mut Vec<NodeId>) -> Result<(), GraphError> {
  match &graph.group(group)?.state {
    GroupState::Collapsed { group_container } => out.push(*group_container),
    GroupState::Expanded { containers, groups } => {
      out.extend(containers.iter().map(|m| m.id));
      for sub in groups {
        add_all_containers(graph, sub.id, out)?;
      }
    }
  }
  Ok(())
}

fn index_of(index: &BTreeMap<NodeId, usize>, node: NodeId) -> Result<usize, GraphError> {
  index
    .get(&node)
    .copied()
    .ok_or_else(|| GraphError::BadCollapsedConfig(format!("node {} has no module index", node)))
}

/// Structural snapshot of `group` with nodes replaced by their module index.
pub fn serialise_group(
  graph: &Graph,
  group: GroupId,
  index: &BTreeMap<NodeId, usize>,
) -> Result<SerializedGroup, GraphError> {
  let g = graph.group(group)?;
  let members = match &g.state {
    GroupState::Collapsed { group_container } => SerializedMembers::Collapsed {
      group_container: index_of(index, *group_container)?,
    },
    GroupState::Expanded { containers, groups } => SerializedMembers::Expanded {
      containers: containers
        .iter()
        .map(|m| {
          Ok(SerializedContainer {
            container: index_of(index, m.id)?,
            overrides: m.overrides.clone(),
          })
        })
        .collect::<Result<_, GraphError>>()?,
      groups: groups
        .iter()
        .map(|m| {
          Ok(SerializedSubGroup {
            group: serialise_group(graph, m.id, index)?,
            overrides: m.overrides.clone(),
          })
        })
        .collect::<Result<_, GraphError>>()?,
    },
  };
  Ok(SerializedGroup {
    properties: g.properties.clone(),
    members,
  })
}

/// Midpoint of the bounding box of the direct members' positions.
///
/// A collapsed sub-group counts with its composite's position, an expanded
/// one with its own center.
pub fn group_center(graph: &Graph, group: GroupId) -> Result<Position, GraphError> {
  let g = graph.group(group)?;
  let mut points = Vec::new();
  match &g.state {
    GroupState::Collapsed { group_container } => return Ok(graph.node(*group_container)?.position),
    GroupState::Expanded { containers, groups } => {
      for m in containers {
        points.push(graph.node(m.id)?.position);
      }
      for m in groups {
        points.push(group_center(graph, m.id)?);
      }
    }
  }
  Position::center_of(points).ok_or(GraphError::EmptyGroup(group))
}

/// A wire with exactly one end inside the group.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalWire {
  pub wire: WireId,
  /// The inside end is the wire's source.
  pub group_is_source: bool,
  pub internal: Endpoint,
  pub outside: Endpoint,
  /// Name of the composite port that replaces `internal`.
  pub external_name: String,
}

/// Splits the wires touching `index`'s nodes into internal and external ones.
///
/// Internal wires are deduplicated on `(src index, src port, tgt index, tgt port)`.
pub fn partition_wires(
  graph: &Graph,
  index: &BTreeMap<NodeId, usize>,
  map: &InterfaceMap,
) -> Result<(Vec<InternalWire>, Vec<ExternalWire>), GraphError> {
  let mut internal = Vec::new();
  let mut seen = BTreeSet::new();
  let mut external = Vec::new();
  for w in graph.wires() {
    match (index.get(&w.src.node), index.get(&w.tgt.node)) {
      (Some(&s), Some(&t)) => {
        let wire = InternalWire {
          src: ModuleEndpoint {
            module_id: s,
            terminal: w.src.terminal.clone(),
          },
          tgt: ModuleEndpoint {
            module_id: t,
            terminal: w.tgt.terminal.clone(),
          },
        };
        if seen.insert((wire.src.clone(), wire.tgt.clone())) {
          internal.push(wire);
        } else {
          trace!(wire = %w.id, "duplicate internal wire dropped");
        }
      }
      (Some(_), None) | (None, Some(_)) => {
        let group_is_source = index.contains_key(&w.src.node);
        let (inside, outside) = if group_is_source {
          (&w.src, &w.tgt)
        } else {
          (&w.tgt, &w.src)
        };
        let external_name = map.external_name_at(inside).ok_or_else(|| {
          GraphError::BadCollapsedConfig(format!("boundary port {} has no external name", inside))
        })?;
        external.push(ExternalWire {
          wire: w.id,
          group_is_source,
          internal: inside.clone(),
          outside: outside.clone(),
          external_name: external_name.to_string(),
        });
      }
      (None, None) => {}
    }
  }
  Ok((internal, external))
}

fn index_entries<C: PortDef, R>(
  entries: &[MapEntry<C>],
  into: &mut BTreeMap<String, R>,
  make: impl Fn(&str) -> R,
) {
  for e in entries.iter().filter(|e| e.visible) {
    if let Some(ext) = &e.external_name {
      into.insert(ext.clone(), make(e.internal_name()));
    }
  }
}

/// Reverse index from external names to member ports.
pub fn external_to_internal(map: &InterfaceMap) -> ExternalToInternalMap {
  let mut container_map = PortIndex::default();
  for (i, m) in map.container_map.iter().enumerate() {
    let make = |name: &str| ContainerPortRef {
      container_id: i,
      name: name.to_string(),
    };
    index_entries(&m.fields, &mut container_map.fields, make);
    index_entries(&m.terminals, &mut container_map.terminals, make);
  }
  let mut group_map = PortIndex::default();
  for (i, g) in map.group_map.iter().enumerate() {
    let make = |name: &str| GroupPortRef {
      group_id: i,
      name: name.to_string(),
    };
    index_entries(&g.group_container_map.fields, &mut group_map.fields, make);
    index_entries(&g.group_container_map.terminals, &mut group_map.terminals, make);
  }
  ExternalToInternalMap {
    container_map,
    group_map,
  }
}

/// Current values of the exposed fields, keyed by external name.
pub fn external_values(graph: &Graph, map: &InterfaceMap) -> Result<FieldValues, GraphError> {
  let members = map
    .container_map
    .iter()
    .chain(map.group_map.iter().map(|g| &g.group_container_map));
  let mut values = FieldValues::new();
  for m in members {
    for e in m.fields.iter().filter(|e| e.visible) {
      let Some(ext) = &e.external_name else {
        continue;
      };
      if let Some(v) = graph.node(e.anchor.node)?.value.get(&e.anchor.terminal) {
        values.insert(ext.clone(), v.clone());
      }
    }
  }
  Ok(values)
}

/// Everything collapse needs, computed before any mutation.
#[derive(Debug, Clone)]
pub struct Snapshot {
  /// Nodes owned by the group, in module index order.
  pub containers: Vec<NodeId>,
  pub group_config: GroupConfig,
  pub external_wires: Vec<ExternalWire>,
  pub values: FieldValues,
}

/// Serialises an expanded `group` whose interface is `map`.
#[instrument(level = "trace", skip(graph, map))]
pub fn snapshot(graph: &Graph, group: GroupId, map: &InterfaceMap) -> Result<Snapshot, GraphError> {
  let mut containers = Vec::new();
  add_all_containers(graph, group, &mut containers)?;
  let index: BTreeMap<NodeId, usize> = containers.iter().enumerate().map(|(i, n)| (*n, i)).collect();

  let center = group_center(graph, group)?;
  let modules = containers
    .iter()
    .map(|n| Ok(graph.node(*n)?.module_config(center)))
    .collect::<Result<Vec<ModuleConfig>, GraphError>>()?;
  let (wires, external_wires) = partition_wires(graph, &index, map)?;

  Ok(Snapshot {
    group_config: GroupConfig {
      group: serialise_group(graph, group, &index)?,
      center,
      modules,
      wires,
      map: external_to_internal(map),
    },
    values: external_values(graph, map)?,
    containers,
    external_wires,
  })
}
