//! Editor session: one graph, its options and the observer that hears about
//! group lifecycle changes.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, instrument};

use crate::collapse::collapse;
use crate::error::{EngineError, GraphError};
use crate::expand::{UngroupOutcome, expand, expand_composite, ungroup};
use crate::graph::{Graph, MemberRef};
use crate::interface::{OverrideCheck, build_map, check_overrides};
use crate::observer::GroupObserver;
use crate::types::{GroupId, GroupOverrides, InterfaceMap, NodeId, Override};

/// Env var overriding [`EditorOptions::composite_xtype`].
pub const ENV_COMPOSITE_XTYPE: &str = "WIREBOX_COMPOSITE_XTYPE";
/// Env var overriding [`EditorOptions::composite_name`].
pub const ENV_COMPOSITE_NAME: &str = "WIREBOX_COMPOSITE_NAME";
/// Env var overriding [`EditorOptions::prune_empty_groups`].
pub const ENV_PRUNE_EMPTY_GROUPS: &str = "WIREBOX_PRUNE_EMPTY_GROUPS";

/// Session-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
  /// xtype stamped on composite nodes.
  pub composite_xtype: String,
  /// Composite name when the group has no `name` property.
  pub composite_name: String,
  /// Remove a group once its last member leaves.
  pub prune_empty_groups: bool,
}

impl Default for EditorOptions {
  fn default() -> Self {
    Self {
      composite_xtype: "GroupContainer".to_string(),
      composite_name: "Group".to_string(),
      prune_empty_groups: true,
    }
  }
}

impl EditorOptions {
  /// Defaults overlaid with `WIREBOX_*` environment variables.
  pub fn from_env() -> Self {
    Self::default().overlay(|k| env::var(k).ok())
  }

  /// Applies overrides from `lookup`; unparsable booleans are ignored.
  pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
    if let Some(v) = lookup(ENV_COMPOSITE_XTYPE) {
      self.composite_xtype = v;
    }
    if let Some(v) = lookup(ENV_COMPOSITE_NAME) {
      self.composite_name = v;
    }
    if let Some(v) = lookup(ENV_PRUNE_EMPTY_GROUPS) {
      match parse_bool(&v) {
        Some(b) => self.prune_empty_groups = b,
        None => debug!(value = %v, "ignoring {}", ENV_PRUNE_EMPTY_GROUPS),
      }
    }
    self
  }
}

fn parse_bool(v: &str) -> Option<bool> {
  match v.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => None,
  }
}

/// A graph plus everything the grouping operations need around it.
pub struct Editor<O: GroupObserver = ()> {
  graph: Graph,
  options: EditorOptions,
  observer: O,
}

impl Editor<()> {
  pub fn new(options: EditorOptions) -> Self {
    Self::with_graph(Graph::new(), options, ())
  }
}

impl<O: GroupObserver> Editor<O> {
  pub fn with_graph(mut graph: Graph, options: EditorOptions, observer: O) -> Self {
    graph.set_prune_empty_groups(options.prune_empty_groups);
    Self {
      graph,
      options,
      observer,
    }
  }

  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// Direct access for building the graph. Grouping operations should go
  /// through the editor so the observer hears about them.
  pub fn graph_mut(&mut self) -> &mut Graph {
    &mut self.graph
  }

  pub fn into_graph(self) -> Graph {
    self.graph
  }

  pub fn options(&self) -> &EditorOptions {
    &self.options
  }

  pub fn observer(&self) -> &O {
    &self.observer
  }

  pub fn interface_map(&self, group: GroupId) -> Result<InterfaceMap, EngineError> {
    build_map(&self.graph, group)
  }

  pub fn check_overrides(
    &self,
    group: GroupId,
    overrides: Option<&GroupOverrides>,
  ) -> Result<OverrideCheck, GraphError> {
    check_overrides(&self.graph, group, overrides)
  }

  /// Stores one member's override once the whole group still maps cleanly.
  #[instrument(level = "trace", skip(self, overrides))]
  pub fn set_overrides(
    &mut self,
    group: GroupId,
    member: MemberRef,
    overrides: Override,
  ) -> Result<InterfaceMap, EngineError> {
    let mut staged = self.graph.clone();
    staged.set_member_overrides(group, member, overrides)?;
    let map = build_map(&staged, group)?;
    self.graph = staged;
    Ok(map)
  }

  pub fn collapse(&mut self, group: GroupId, overrides: Option<&GroupOverrides>) -> Result<NodeId, EngineError> {
    collapse(&mut self.graph, group, overrides, &self.options, &mut self.observer)
  }

  pub fn expand(&mut self, group: GroupId) -> Result<Vec<NodeId>, GraphError> {
    expand(&mut self.graph, group, &mut self.observer)
  }

  pub fn expand_composite(&mut self, node: NodeId) -> Result<(GroupId, Vec<NodeId>), GraphError> {
    expand_composite(&mut self.graph, node, &mut self.observer)
  }

  pub fn ungroup(&mut self, group: GroupId) -> Result<UngroupOutcome, GraphError> {
    ungroup(&mut self.graph, group, &mut self.observer)
  }

  /// Moves a node out of its group; an emptied group is pruned.
  pub fn remove_node_from_group(&mut self, node: NodeId) -> Result<Option<Override>, GraphError> {
    self.graph.remove_node_from_group(node, &mut self.observer)
  }

  pub fn remove_group_from_group(&mut self, group: GroupId) -> Result<Option<Override>, GraphError> {
    self.graph.remove_group_from_group(group, &mut self.observer)
  }
}
