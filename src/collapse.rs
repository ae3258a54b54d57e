//! Collapse: replaces an expanded group by one composite node.
//!
//! The whole operation runs on a copy of the graph and is swapped in only
//! once every step has succeeded, so a failed collapse leaves the caller's
//! graph untouched. Observer events are buffered and delivered after the
//! swap.

use tracing::{debug, info, instrument};

use crate::editor::EditorOptions;
use crate::error::{EngineError, GraphError};
use crate::graph::Graph;
use crate::interface::{apply_overrides, build_map};
use crate::observer::{GroupObserver, RecordingObserver};
use crate::serialise::snapshot;
use crate::types::{
  ContainerConfig, Endpoint, GroupId, GroupOverrides, GroupState, ModuleConfig, NodeId, WireConfig,
};

/// Collapses `group`, applying `overrides` to its members first.
///
/// Returns the composite node now standing in for the group.
#[instrument(level = "trace", skip(graph, overrides, options, observer))]
pub fn collapse(
  graph: &mut Graph,
  group: GroupId,
  overrides: Option<&GroupOverrides>,
  options: &EditorOptions,
  observer: &mut dyn GroupObserver,
) -> Result<NodeId, EngineError> {
  let mut staged = graph.clone();
  let mut events = RecordingObserver::default();
  let composite = collapse_staged(&mut staged, group, overrides, options, &mut events)?;
  *graph = staged;
  events.replay(observer);
  Ok(composite)
}

pub(crate) fn collapse_staged(
  graph: &mut Graph,
  group: GroupId,
  overrides: Option<&GroupOverrides>,
  options: &EditorOptions,
  events: &mut RecordingObserver,
) -> Result<NodeId, EngineError> {
  let g = graph.group(group)?;
  if g.collapsing {
    return Err(GraphError::GroupBusy(group).into());
  }
  if g.is_collapsed() {
    return Err(GraphError::GroupCollapsed(group).into());
  }
  if let Some(o) = overrides {
    apply_overrides(graph, group, o)?;
  }

  let open_subs: Vec<GroupId> = graph
    .group(group)?
    .groups()
    .iter()
    .map(|m| m.id)
    .filter(|id| graph.group(*id).is_ok_and(|s| !s.is_collapsed()))
    .collect();
  for sub in open_subs {
    debug!(group = %group, sub = %sub, "collapsing sub-group first");
    collapse_staged(graph, sub, None, options, events)?;
  }

  let map = build_map(graph, group)?;
  let snap = snapshot(graph, group, &map)?;

  graph.group_mut(group)?.collapsing = true;
  for node in &snap.containers {
    let ids: Vec<_> = graph.wires_touching(*node).iter().map(|w| w.id).collect();
    for id in ids {
      graph.remove_wire(id)?;
    }
  }
  let nested: Vec<GroupId> = graph
    .groups()
    .filter(|g| g.id != group && graph.descends_from(g.id, group))
    .map(|g| g.id)
    .collect();
  for sub in &nested {
    graph.delete_group_record(*sub)?;
  }
  for node in &snap.containers {
    graph.node_mut(*node)?.group = None;
    graph.discard_node(*node)?;
  }

  let g = graph.group(group)?;
  let name = g.name().unwrap_or(options.composite_name.as_str()).to_string();
  let composite = graph.add_container(ModuleConfig {
    name,
    value: snap.values,
    config: ContainerConfig {
      position: snap.group_config.center,
      xtype: options.composite_xtype.clone(),
      fields: map.external_fields(),
      terminals: map.external_terminals(),
      group_config: Some(Box::new(snap.group_config)),
    },
  })?;
  graph.node_mut(composite)?.group = Some(group);
  let g = graph.group_mut(group)?;
  g.state = GroupState::Collapsed {
    group_container: composite,
  };
  g.collapsing = false;

  for ext in &snap.external_wires {
    let port = Endpoint::new(composite, ext.external_name.clone());
    let config = if ext.group_is_source {
      WireConfig::new(port, ext.outside.clone())
    } else {
      WireConfig::new(ext.outside.clone(), port)
    };
    graph.add_wire(config)?;
  }

  info!(
    group = %group,
    composite = %composite,
    members = snap.containers.len(),
    sub_groups = nested.len(),
    external_wires = snap.external_wires.len(),
    "group collapsed"
  );
  events.group_collapsed(group, composite);
  Ok(composite)
}
