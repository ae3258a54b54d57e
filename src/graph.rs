//! The abstract program graph: nodes, wires and group membership.
//!
//! Only structural bookkeeping lives here. Visibility and naming are the map
//! builder's business; collapse and expand drive the mutation surface
//! (`add_container`, `remove_container`, `add_wire`, `remove_wire`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, instrument, trace};

use crate::error::GraphError;
use crate::observer::GroupObserver;
use crate::types::{
  Endpoint, FieldValues, Group, GroupId, GroupProperties, GroupState, Member, ModuleConfig, Node, NodeId,
  Override, Position, Wire, WireConfig, WireId,
};

/// A direct member of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRef {
  Node(NodeId),
  Group(GroupId),
}

impl fmt::Display for MemberRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      MemberRef::Node(n) => write!(f, "node {}", n),
      MemberRef::Group(g) => write!(f, "group {}", g),
    }
  }
}

fn default_true() -> bool {
  true
}

/// Nodes, wires and groups of one editor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
  nodes: BTreeMap<NodeId, Node>,
  wires: BTreeMap<WireId, Wire>,
  groups: BTreeMap<GroupId, Group>,
  next_node: u64,
  next_wire: u64,
  next_group: u64,
  /// Remove a group (and notify) once its last member leaves.
  #[serde(default = "default_true")]
  prune_empty_groups: bool,
}

impl Default for Graph {
  fn default() -> Self {
    Self::new()
  }
}

impl Graph {
  pub fn new() -> Self {
    Self {
      nodes: BTreeMap::new(),
      wires: BTreeMap::new(),
      groups: BTreeMap::new(),
      next_node: 1,
      next_wire: 1,
      next_group: 1,
      prune_empty_groups: true,
    }
  }

  pub fn set_prune_empty_groups(&mut self, on: bool) {
    self.prune_empty_groups = on;
  }

  // ---- lookups ----

  pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
    self.nodes.get(&id).ok_or(GraphError::UnknownNode(id))
  }

  pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
    self.nodes.get_mut(&id).ok_or(GraphError::UnknownNode(id))
  }

  pub fn nodes(&self) -> impl Iterator<Item = &Node> {
    self.nodes.values()
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn wire(&self, id: WireId) -> Result<&Wire, GraphError> {
    self.wires.get(&id).ok_or(GraphError::UnknownWire(id))
  }

  pub fn wires(&self) -> impl Iterator<Item = &Wire> {
    self.wires.values()
  }

  pub fn wire_count(&self) -> usize {
    self.wires.len()
  }

  pub fn group(&self, id: GroupId) -> Result<&Group, GraphError> {
    self.groups.get(&id).ok_or(GraphError::UnknownGroup(id))
  }

  pub(crate) fn group_mut(&mut self, id: GroupId) -> Result<&mut Group, GraphError> {
    self.groups.get_mut(&id).ok_or(GraphError::UnknownGroup(id))
  }

  pub fn groups(&self) -> impl Iterator<Item = &Group> {
    self.groups.values()
  }

  pub fn group_count(&self) -> usize {
    self.groups.len()
  }

  /// Groups attached directly to the root layer.
  pub fn root_groups(&self) -> Vec<GroupId> {
    self
      .groups
      .values()
      .filter(|g| g.parent.is_none())
      .map(|g| g.id)
      .collect()
  }

  /// Nodes attached directly to the root layer.
  pub fn root_nodes(&self) -> Vec<NodeId> {
    self
      .nodes
      .values()
      .filter(|n| n.group.is_none())
      .map(|n| n.id)
      .collect()
  }

  pub fn group_of(&self, node: NodeId) -> Result<Option<GroupId>, GraphError> {
    Ok(self.node(node)?.group)
  }

  /// True if `group` is `ancestor` or nested anywhere below it.
  pub fn descends_from(&self, group: GroupId, ancestor: GroupId) -> bool {
    let mut cur = Some(group);
    while let Some(g) = cur {
      if g == ancestor {
        return true;
      }
      cur = self.groups.get(&g).and_then(|g| g.parent);
    }
    false
  }

  /// Every node inside `group`, recursively. Collapsed sub-groups contribute
  /// their composite node.
  pub fn members_of(&self, group: GroupId) -> Result<BTreeSet<NodeId>, GraphError> {
    let mut out = BTreeSet::new();
    self.collect_members(group, &mut out)?;
    Ok(out)
  }

  fn collect_members(&self, group: GroupId, out: &mut BTreeSet<NodeId>) -> Result<(), GraphError> {
    match &self.group(group)?.state {
      GroupState::Collapsed { group_container } => {
        out.insert(*group_container);
      }
      GroupState::Expanded { containers, groups } => {
        out.extend(containers.iter().map(|m| m.id));
        for sub in groups {
          self.collect_members(sub.id, out)?;
        }
      }
    }
    Ok(())
  }

  // ---- nodes ----

  /// Creates a node on the root layer.
  #[instrument(level = "trace", skip(self, module), fields(name = %module.name))]
  pub fn add_container(&mut self, module: ModuleConfig) -> Result<NodeId, GraphError> {
    check_port_names(&module)?;
    let id = NodeId(self.next_node);
    self.next_node += 1;
    self.nodes.insert(id, Node::from_module(id, module));
    trace!(node = %id, "container added");
    Ok(id)
  }

  /// Removes an ungrouped node. Wires must have been removed first.
  #[instrument(level = "trace", skip(self))]
  pub fn remove_container(&mut self, id: NodeId) -> Result<Node, GraphError> {
    if let Some(group) = self.node(id)?.group {
      return Err(GraphError::NodeInGroup { node: id, group });
    }
    self.discard_node(id)
  }

  /// Removes a node regardless of membership bookkeeping; the caller owns that.
  pub(crate) fn discard_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
    let count = self.wires.values().filter(|w| w.touches(id)).count();
    if count > 0 {
      return Err(GraphError::NodeHasWires { node: id, count });
    }
    let node = self.nodes.remove(&id).ok_or(GraphError::UnknownNode(id))?;
    trace!(node = %id, "container removed");
    Ok(node)
  }

  pub fn set_value(&mut self, node: NodeId, field: &str, value: Value) -> Result<(), GraphError> {
    let n = self.node_mut(node)?;
    if n.field(field).is_none() {
      return Err(GraphError::UnknownField {
        node,
        field: field.to_string(),
      });
    }
    n.value.insert(field.to_string(), value);
    Ok(())
  }

  /// Field-value bag of `node`.
  pub fn value(&self, node: NodeId) -> Result<&FieldValues, GraphError> {
    Ok(&self.node(node)?.value)
  }

  pub fn move_container(&mut self, node: NodeId, position: Position) -> Result<(), GraphError> {
    self.node_mut(node)?.position = position;
    Ok(())
  }

  /// Checks that node and group back-references agree with the member
  /// lists and that every wire ends on a declared port.
  #[instrument(level = "trace", skip(self))]
  pub fn check_links(&self) -> Result<(), GraphError> {
    for node in self.nodes.values() {
      let Some(g) = node.group else { continue };
      let listed = match &self.group(g)?.state {
        GroupState::Expanded { containers, .. } => containers.iter().any(|m| m.id == node.id),
        GroupState::Collapsed { group_container } => *group_container == node.id,
      };
      if !listed {
        return Err(GraphError::BrokenLink(format!(
          "node {} names group {} which does not hold it",
          node.id, g
        )));
      }
    }
    for group in self.groups.values() {
      if let Some(p) = group.parent {
        if !self.group(p)?.groups().iter().any(|m| m.id == group.id) {
          return Err(GraphError::BrokenLink(format!(
            "group {} names parent {} which does not list it",
            group.id, p
          )));
        }
      }
      match &group.state {
        GroupState::Expanded { containers, groups } => {
          let owns_node = |id: &NodeId| self.nodes.get(id).is_some_and(|n| n.group == Some(group.id));
          if let Some(m) = containers.iter().find(|m| !owns_node(&m.id)) {
            return Err(GraphError::BrokenLink(format!(
              "group {} lists node {} which names another group",
              group.id, m.id
            )));
          }
          let owns_group = |id: &GroupId| self.groups.get(id).is_some_and(|s| s.parent == Some(group.id));
          if let Some(m) = groups.iter().find(|m| !owns_group(&m.id)) {
            return Err(GraphError::BrokenLink(format!(
              "group {} lists sub-group {} which names another parent",
              group.id, m.id
            )));
          }
        }
        GroupState::Collapsed { group_container } => {
          let n = self.node(*group_container)?;
          if n.group != Some(group.id) || !n.is_composite() {
            return Err(GraphError::BrokenLink(format!(
              "group {} is collapsed into node {} which is not its composite",
              group.id, group_container
            )));
          }
        }
      }
    }
    for w in self.wires.values() {
      for ep in [&w.src, &w.tgt] {
        if !self.node(ep.node)?.has_port(&ep.terminal) {
          return Err(GraphError::UnknownPort {
            node: ep.node,
            port: ep.terminal.clone(),
          });
        }
      }
    }
    trace!(nodes = self.nodes.len(), groups = self.groups.len(), "links consistent");
    Ok(())
  }

  // ---- wires ----

  #[instrument(level = "trace", skip(self, config), fields(src = %config.src, tgt = %config.tgt))]
  pub fn add_wire(&mut self, config: WireConfig) -> Result<WireId, GraphError> {
    for ep in [&config.src, &config.tgt] {
      if !self.node(ep.node)?.has_port(&ep.terminal) {
        return Err(GraphError::UnknownPort {
          node: ep.node,
          port: ep.terminal.clone(),
        });
      }
    }
    let id = WireId(self.next_wire);
    self.next_wire += 1;
    self.wires.insert(
      id,
      Wire {
        id,
        src: config.src,
        tgt: config.tgt,
      },
    );
    Ok(id)
  }

  #[instrument(level = "trace", skip(self))]
  pub fn remove_wire(&mut self, id: WireId) -> Result<Wire, GraphError> {
    self.wires.remove(&id).ok_or(GraphError::UnknownWire(id))
  }

  /// Wires with at least one end on `node`, by wire id.
  pub fn wires_touching(&self, node: NodeId) -> Vec<&Wire> {
    self.wires.values().filter(|w| w.touches(node)).collect()
  }

  /// Wires attached at exactly `endpoint`.
  pub fn wires_at(&self, endpoint: &Endpoint) -> Vec<&Wire> {
    self
      .wires
      .values()
      .filter(|w| w.attached_at(endpoint))
      .collect()
  }

  // ---- groups ----

  pub(crate) fn insert_group(&mut self, properties: GroupProperties, parent: Option<GroupId>) -> GroupId {
    let id = GroupId(self.next_group);
    self.next_group += 1;
    let mut group = Group::expanded(id, properties);
    group.parent = parent;
    self.groups.insert(id, group);
    id
  }

  /// Drops a group record. Parent lists and member back-references are the
  /// caller's responsibility.
  pub(crate) fn delete_group_record(&mut self, id: GroupId) -> Result<Group, GraphError> {
    self.groups.remove(&id).ok_or(GraphError::UnknownGroup(id))
  }

  fn expanded_members_mut(
    &mut self,
    id: GroupId,
  ) -> Result<(&mut Vec<Member<NodeId>>, &mut Vec<Member<GroupId>>), GraphError> {
    let group = self.group_mut(id)?;
    if group.collapsing {
      return Err(GraphError::GroupBusy(id));
    }
    match &mut group.state {
      GroupState::Expanded { containers, groups } => Ok((containers, groups)),
      GroupState::Collapsed { .. } => Err(GraphError::GroupCollapsed(id)),
    }
  }

  /// Groups the selected members, which must all sit in the same scope
  /// (root layer or one expanded group). The new group takes their place there.
  #[instrument(level = "trace", skip(self, properties))]
  pub fn create_group(
    &mut self,
    properties: GroupProperties,
    nodes: &[NodeId],
    groups: &[GroupId],
  ) -> Result<GroupId, GraphError> {
    let nodes: Vec<NodeId> = dedup(nodes);
    let groups: Vec<GroupId> = dedup(groups);
    if nodes.is_empty() && groups.is_empty() {
      return Err(GraphError::EmptySelection);
    }
    let mut scopes = BTreeSet::new();
    for n in &nodes {
      scopes.insert(self.node(*n)?.group);
    }
    for g in &groups {
      scopes.insert(self.group(*g)?.parent);
    }
    if scopes.len() != 1 {
      return Err(GraphError::MixedScope);
    }
    let scope = scopes.into_iter().next().flatten();
    if let Some(parent) = scope {
      // parent must be expanded and idle before anything moves
      let _ = self.expanded_members_mut(parent)?;
    }

    let id = self.insert_group(properties, None);
    for n in &nodes {
      let overrides = self.detach_node(*n)?.map(|(_, o)| o).unwrap_or_default();
      self.attach_node(id, *n, overrides)?;
    }
    for g in &groups {
      let overrides = self.detach_group(*g)?.map(|(_, o)| o).unwrap_or_default();
      self.attach_group(id, *g, overrides)?;
    }
    if let Some(parent) = scope {
      self.attach_group(parent, id, Override::default())?;
    }
    debug!(group = %id, nodes = nodes.len(), groups = groups.len(), "group created");
    Ok(id)
  }

  /// Adds an ungrouped node to an expanded group.
  pub fn add_node_to_group(
    &mut self,
    group: GroupId,
    node: NodeId,
    overrides: Override,
  ) -> Result<(), GraphError> {
    if let Some(existing) = self.node(node)?.group {
      return Err(GraphError::NodeInGroup {
        node,
        group: existing,
      });
    }
    self.attach_node(group, node, overrides)
  }

  /// Nests a parentless group inside an expanded group.
  pub fn add_group_to_group(
    &mut self,
    parent: GroupId,
    child: GroupId,
    overrides: Override,
  ) -> Result<(), GraphError> {
    self.group(parent)?;
    if let Some(existing) = self.group(child)?.parent {
      return Err(GraphError::GroupHasParent {
        group: child,
        parent: existing,
      });
    }
    if self.descends_from(parent, child) {
      return Err(GraphError::GroupCycle { parent, child });
    }
    self.attach_group(parent, child, overrides)
  }

  /// Moves a node out of its group onto the root layer. An emptied group
  /// is pruned and reported to `observer`.
  pub fn remove_node_from_group(
    &mut self,
    node: NodeId,
    observer: &mut dyn GroupObserver,
  ) -> Result<Option<Override>, GraphError> {
    match self.detach_node(node)? {
      Some((group, overrides)) => {
        self.prune(group, observer)?;
        Ok(Some(overrides))
      }
      None => Ok(None),
    }
  }

  /// Moves a sub-group out of its parent onto the root layer.
  pub fn remove_group_from_group(
    &mut self,
    child: GroupId,
    observer: &mut dyn GroupObserver,
  ) -> Result<Option<Override>, GraphError> {
    match self.detach_group(child)? {
      Some((parent, overrides)) => {
        self.prune(parent, observer)?;
        Ok(Some(overrides))
      }
      None => Ok(None),
    }
  }

  /// Replaces the override record of a direct member.
  pub fn set_member_overrides(
    &mut self,
    group: GroupId,
    member: MemberRef,
    overrides: Override,
  ) -> Result<(), GraphError> {
    let (containers, groups) = self.expanded_members_mut(group)?;
    let slot = match member {
      MemberRef::Node(n) => containers.iter_mut().find(|m| m.id == n).map(|m| &mut m.overrides),
      MemberRef::Group(g) => groups.iter_mut().find(|m| m.id == g).map(|m| &mut m.overrides),
    };
    match slot {
      Some(slot) => {
        *slot = overrides;
        Ok(())
      }
      None => Err(GraphError::NotAMember {
        group,
        member: member.to_string(),
      }),
    }
  }

  pub(crate) fn attach_node(
    &mut self,
    group: GroupId,
    node: NodeId,
    overrides: Override,
  ) -> Result<(), GraphError> {
    self.node(node)?;
    let (containers, _) = self.expanded_members_mut(group)?;
    containers.push(Member::with_overrides(node, overrides));
    self.node_mut(node)?.group = Some(group);
    Ok(())
  }

  pub(crate) fn attach_group(
    &mut self,
    parent: GroupId,
    child: GroupId,
    overrides: Override,
  ) -> Result<(), GraphError> {
    self.group(child)?;
    let (_, groups) = self.expanded_members_mut(parent)?;
    groups.push(Member::with_overrides(child, overrides));
    self.group_mut(child)?.parent = Some(parent);
    Ok(())
  }

  /// Unlinks a node from its group without pruning.
  pub(crate) fn detach_node(&mut self, node: NodeId) -> Result<Option<(GroupId, Override)>, GraphError> {
    let Some(group) = self.node(node)?.group else {
      return Ok(None);
    };
    let (containers, _) = self.expanded_members_mut(group)?;
    let pos = containers
      .iter()
      .position(|m| m.id == node)
      .ok_or_else(|| GraphError::NotAMember {
        group,
        member: MemberRef::Node(node).to_string(),
      })?;
    let member = containers.remove(pos);
    self.node_mut(node)?.group = None;
    Ok(Some((group, member.overrides)))
  }

  /// Unlinks a group from its parent without pruning.
  pub(crate) fn detach_group(&mut self, child: GroupId) -> Result<Option<(GroupId, Override)>, GraphError> {
    let Some(parent) = self.group(child)?.parent else {
      return Ok(None);
    };
    let (_, groups) = self.expanded_members_mut(parent)?;
    let pos = groups
      .iter()
      .position(|m| m.id == child)
      .ok_or_else(|| GraphError::NotAMember {
        group: parent,
        member: MemberRef::Group(child).to_string(),
      })?;
    let member = groups.remove(pos);
    self.group_mut(child)?.parent = None;
    Ok(Some((parent, member.overrides)))
  }

  /// Removes `group` if it is expanded, idle and empty, then walks up.
  pub(crate) fn prune(&mut self, group: GroupId, observer: &mut dyn GroupObserver) -> Result<(), GraphError> {
    let mut cur = Some(group);
    while let Some(id) = cur {
      let g = self.group(id)?;
      if !self.prune_empty_groups || g.collapsing || !g.is_empty() {
        break;
      }
      let parent = g.parent;
      if let Some(p) = parent {
        if self.group(p)?.collapsing {
          break;
        }
        self.detach_group(id)?;
      }
      self.delete_group_record(id)?;
      debug!(group = %id, "empty group pruned");
      observer.group_emptied(id);
      cur = parent;
    }
    Ok(())
  }
}

fn dedup<T: Copy + Ord>(items: &[T]) -> Vec<T> {
  let mut seen = BTreeSet::new();
  items.iter().copied().filter(|i| seen.insert(*i)).collect()
}

/// Plain field names must be unique; terminals and wirable fields share one namespace.
fn check_port_names(module: &ModuleConfig) -> Result<(), GraphError> {
  let mut fields = BTreeSet::new();
  for f in &module.config.fields {
    if !fields.insert(f.name.as_str()) {
      return Err(GraphError::DuplicatePort(f.name.clone()));
    }
  }
  let mut ports = BTreeSet::new();
  let wirable = module
    .config
    .fields
    .iter()
    .filter(|f| f.wirable)
    .map(|f| f.name.as_str());
  for name in module.config.terminals.iter().map(|t| t.name.as_str()).chain(wirable) {
    if !ports.insert(name) {
      return Err(GraphError::DuplicatePort(name.to_string()));
    }
  }
  Ok(())
}
