//! Expand and ungroup.
//!
//! Expand rebuilds a collapsed group from the composite node's stored
//! config alone: members come back at `composite.position + local`,
//! internal wires are restored, and wires on the composite are moved to the
//! member ports the stored map names. Like collapse, both operations are
//! staged on a copy and committed at the end.

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::GraphError;
use crate::graph::Graph;
use crate::observer::{GroupObserver, RecordingObserver};
use crate::types::{
  ContainerPortRef, Endpoint, GroupConfig, GroupId, GroupPortRef, GroupState, ModuleEndpoint, NodeId,
  SerializedContainer, SerializedGroup, SerializedMembers, SerializedSubGroup, Wire, WireConfig,
};

fn bad(msg: String) -> GraphError {
  GraphError::BadCollapsedConfig(msg)
}

/// Node created for module `i`.
fn module_node(ids: &[NodeId], i: usize) -> Result<NodeId, GraphError> {
  ids
    .get(i)
    .copied()
    .ok_or_else(|| bad(format!("module index {} out of range ({} modules)", i, ids.len())))
}

fn module_endpoint(ids: &[NodeId], ep: &ModuleEndpoint) -> Result<Endpoint, GraphError> {
  Ok(Endpoint::new(module_node(ids, ep.module_id)?, ep.terminal.clone()))
}

/// Recreates the membership described by `serialised` under `group`.
fn materialise(
  graph: &mut Graph,
  group: GroupId,
  serialised: &SerializedGroup,
  ids: &[NodeId],
) -> Result<(), GraphError> {
  let SerializedMembers::Expanded { containers, groups } = &serialised.members else {
    return Err(bad(format!("group {} was stored collapsed", group)));
  };
  for c in containers {
    graph.attach_node(group, module_node(ids, c.container)?, c.overrides.clone())?;
  }
  for sg in groups {
    let sub = graph.insert_group(sg.group.properties.clone(), None);
    graph.attach_group(group, sub, sg.overrides.clone())?;
    match &sg.group.members {
      SerializedMembers::Collapsed { group_container } => {
        let composite = module_node(ids, *group_container)?;
        graph.node_mut(composite)?.group = Some(sub);
        graph.group_mut(sub)?.state = GroupState::Collapsed {
          group_container: composite,
        };
      }
      SerializedMembers::Expanded { .. } => materialise(graph, sub, &sg.group, ids)?,
    }
  }
  Ok(())
}

/// Which index a composite port name is looked up in.
#[derive(Clone, Copy)]
enum Lookup {
  /// Terminals of every member, then wirable fields.
  Wire,
  Field,
}

/// Member port behind the composite port `name`.
///
/// Plain fields and terminals are separate namespaces, so a wire lookup must
/// exhaust the terminals of direct members and sub-groups before it looks at
/// fields, and then only at wirable ones.
fn resolve(
  graph: &Graph,
  config: &GroupConfig,
  ids: &[NodeId],
  name: &str,
  lookup: Lookup,
) -> Result<Option<Endpoint>, GraphError> {
  let map = &config.map;
  let fields = || -> Result<Option<Endpoint>, GraphError> {
    if let Some(r) = map.container_map.fields.get(name) {
      return container_port(config, ids, r).map(Some);
    }
    map
      .group_map
      .fields
      .get(name)
      .map(|r| group_port(config, ids, r, name))
      .transpose()
  };
  match lookup {
    Lookup::Field => fields(),
    Lookup::Wire => {
      if let Some(r) = map.container_map.terminals.get(name) {
        return container_port(config, ids, r).map(Some);
      }
      if let Some(r) = map.group_map.terminals.get(name) {
        return group_port(config, ids, r, name).map(Some);
      }
      match fields()? {
        Some(ep) if graph.node(ep.node)?.field(&ep.terminal).is_some_and(|f| f.wirable) => Ok(Some(ep)),
        _ => Ok(None),
      }
    }
  }
}

fn stored_members(
  config: &GroupConfig,
) -> Result<(&[SerializedContainer], &[SerializedSubGroup]), GraphError> {
  match &config.group.members {
    SerializedMembers::Expanded { containers, groups } => Ok((containers.as_slice(), groups.as_slice())),
    SerializedMembers::Collapsed { .. } => Err(bad("top-level group stored collapsed".to_string())),
  }
}

fn container_port(config: &GroupConfig, ids: &[NodeId], r: &ContainerPortRef) -> Result<Endpoint, GraphError> {
  let (containers, _) = stored_members(config)?;
  let c = containers
    .get(r.container_id)
    .ok_or_else(|| bad(format!("container {} out of range", r.container_id)))?;
  Ok(Endpoint::new(module_node(ids, c.container)?, r.name.clone()))
}

fn group_port(config: &GroupConfig, ids: &[NodeId], r: &GroupPortRef, name: &str) -> Result<Endpoint, GraphError> {
  let (_, groups) = stored_members(config)?;
  let sg = groups
    .get(r.group_id)
    .ok_or_else(|| bad(format!("sub-group {} out of range", r.group_id)))?;
  match sg.group.members {
    SerializedMembers::Collapsed { group_container } => Ok(Endpoint::new(
      module_node(ids, group_container)?,
      r.name.clone(),
    )),
    SerializedMembers::Expanded { .. } => Err(bad(format!(
      "port '{}' points into expanded sub-group {}",
      name, r.group_id
    ))),
  }
}

/// Makes sure a composite node has a collapsed group record of its own.
///
/// A composite added from a stored config is not bound yet; it gets a new
/// group in its current scope, keeping its member override there.
fn bind_composite(graph: &mut Graph, node: NodeId) -> Result<GroupId, GraphError> {
  let n = graph.node(node)?;
  let config = n.group_config().ok_or(GraphError::NotComposite(node))?;
  let properties = config.group.properties.clone();
  if let Some(g) = n.group {
    match graph.group(g)?.group_container() {
      Some(bound) if bound == node => return Ok(g),
      Some(_) => return Err(GraphError::UnboundComposite(node)),
      None => {}
    }
  }
  let scope = graph.detach_node(node)?;
  let group = graph.insert_group(properties, None);
  if let Some((parent, overrides)) = scope {
    graph.attach_group(parent, group, overrides)?;
  }
  graph.group_mut(group)?.state = GroupState::Collapsed {
    group_container: node,
  };
  graph.node_mut(node)?.group = Some(group);
  Ok(group)
}

/// Expands a collapsed group. Returns the recreated nodes in module order.
#[instrument(level = "trace", skip(graph, observer))]
pub fn expand(graph: &mut Graph, group: GroupId, observer: &mut dyn GroupObserver) -> Result<Vec<NodeId>, GraphError> {
  let mut staged = graph.clone();
  let mut events = RecordingObserver::default();
  let nodes = expand_staged(&mut staged, group, &mut events)?;
  *graph = staged;
  events.replay(observer);
  Ok(nodes)
}

/// Expands the group a composite node stands for, binding it first if needed.
#[instrument(level = "trace", skip(graph, observer))]
pub fn expand_composite(
  graph: &mut Graph,
  node: NodeId,
  observer: &mut dyn GroupObserver,
) -> Result<(GroupId, Vec<NodeId>), GraphError> {
  let mut staged = graph.clone();
  let mut events = RecordingObserver::default();
  let group = bind_composite(&mut staged, node)?;
  let nodes = expand_staged(&mut staged, group, &mut events)?;
  *graph = staged;
  events.replay(observer);
  Ok((group, nodes))
}

pub(crate) fn expand_staged(
  graph: &mut Graph,
  group: GroupId,
  events: &mut RecordingObserver,
) -> Result<Vec<NodeId>, GraphError> {
  let g = graph.group(group)?;
  if g.collapsing {
    return Err(GraphError::GroupBusy(group));
  }
  let composite = g.group_container().ok_or(GraphError::GroupExpanded(group))?;
  let node = graph.node(composite)?.clone();
  let config = node
    .group_config()
    .ok_or(GraphError::NotComposite(composite))?
    .clone();

  let outer: Vec<Wire> = graph.wires_touching(composite).into_iter().cloned().collect();
  for w in &outer {
    graph.remove_wire(w.id)?;
  }
  graph.node_mut(composite)?.group = None;
  graph.discard_node(composite)?;

  let mut ids = Vec::with_capacity(config.modules.len());
  for m in &config.modules {
    let mut m = m.clone();
    m.config.position = node.position + m.config.position;
    ids.push(graph.add_container(m)?);
  }
  for w in &config.wires {
    graph.add_wire(WireConfig::new(
      module_endpoint(&ids, &w.src)?,
      module_endpoint(&ids, &w.tgt)?,
    ))?;
  }

  graph.group_mut(group)?.state = GroupState::Expanded {
    containers: Vec::new(),
    groups: Vec::new(),
  };
  materialise(graph, group, &config.group, &ids)?;

  for w in &outer {
    let relink = |ep: &Endpoint| -> Result<Endpoint, GraphError> {
      if ep.node != composite {
        return Ok(ep.clone());
      }
      resolve(graph, &config, &ids, &ep.terminal, Lookup::Wire)?
        .ok_or_else(|| bad(format!("composite port '{}' has no member port", ep.terminal)))
    };
    let relinked = WireConfig::new(relink(&w.src)?, relink(&w.tgt)?);
    graph.add_wire(relinked)?;
  }

  for (name, value) in &node.value {
    if let Some(ep) = resolve(graph, &config, &ids, name, Lookup::Field)? {
      graph.set_value(ep.node, &ep.terminal, value.clone())?;
    }
  }

  info!(
    group = %group,
    composite = %composite,
    members = ids.len(),
    internal_wires = config.wires.len(),
    external_wires = outer.len(),
    "group expanded"
  );
  events.group_expanded(group);
  Ok(ids)
}

/// Result of dissolving a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UngroupOutcome {
  /// Scope the members moved to; `None` is the root layer.
  pub parent: Option<GroupId>,
  pub nodes: Vec<NodeId>,
  pub groups: Vec<GroupId>,
}

/// Dissolves `group`, expanding it first if collapsed. Direct members move
/// to the parent group (or the root layer) with their override records.
#[instrument(level = "trace", skip(graph, observer))]
pub fn ungroup(
  graph: &mut Graph,
  group: GroupId,
  observer: &mut dyn GroupObserver,
) -> Result<UngroupOutcome, GraphError> {
  let mut staged = graph.clone();
  let mut events = RecordingObserver::default();
  let outcome = ungroup_staged(&mut staged, group, &mut events)?;
  *graph = staged;
  events.replay(observer);
  Ok(outcome)
}

fn ungroup_staged(
  graph: &mut Graph,
  group: GroupId,
  events: &mut RecordingObserver,
) -> Result<UngroupOutcome, GraphError> {
  if graph.group(group)?.is_collapsed() {
    expand_staged(graph, group, events)?;
  }
  let g = graph.group(group)?;
  let parent = g.parent;
  let nodes: Vec<NodeId> = g.containers().iter().map(|m| m.id).collect();
  let groups: Vec<GroupId> = g.groups().iter().map(|m| m.id).collect();

  graph.detach_group(group)?;
  for n in &nodes {
    if let Some((_, overrides)) = graph.detach_node(*n)? {
      if let Some(p) = parent {
        graph.attach_node(p, *n, overrides)?;
      }
    }
  }
  for sub in &groups {
    if let Some((_, overrides)) = graph.detach_group(*sub)? {
      if let Some(p) = parent {
        graph.attach_group(p, *sub, overrides)?;
      }
    }
  }
  graph.delete_group_record(group)?;
  events.group_removed(group);
  if let Some(p) = parent {
    graph.prune(p, events)?;
  }

  info!(
    group = %group,
    promoted_nodes = nodes.len(),
    promoted_groups = groups.len(),
    "group removed"
  );
  Ok(UngroupOutcome {
    parent,
    nodes,
    groups,
  })
}
