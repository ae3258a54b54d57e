//! Small graph builders shared by unit tests.

use serde_json::json;

use crate::graph::Graph;
use crate::types::{
  Endpoint, FieldDef, GroupId, GroupProperties, ModuleConfig, NodeId, Position, TerminalDef,
  WireConfig, WireId,
};

/// Module with terminals `in`/`out` and a plain field `value`.
pub(crate) fn io_module(name: &str, x: f64, y: f64) -> ModuleConfig {
  ModuleConfig::new(name, Position::new(x, y))
    .terminal(TerminalDef::input("in"))
    .terminal(TerminalDef::output("out"))
    .field(FieldDef::new("value"))
    .value("value", json!(name))
}

pub(crate) fn add(g: &mut Graph, name: &str, x: f64, y: f64) -> NodeId {
  g.add_container(io_module(name, x, y)).unwrap()
}

pub(crate) fn connect(g: &mut Graph, src: NodeId, sp: &str, tgt: NodeId, tp: &str) -> WireId {
  g.add_wire(WireConfig::new(Endpoint::new(src, sp), Endpoint::new(tgt, tp)))
    .unwrap()
}

pub(crate) fn props(name: &str) -> GroupProperties {
  let mut p = GroupProperties::new();
  p.insert("name".to_string(), json!(name));
  p
}

pub(crate) fn group(g: &mut Graph, name: &str, nodes: &[NodeId], groups: &[GroupId]) -> GroupId {
  g.create_group(props(name), nodes, groups).unwrap()
}
