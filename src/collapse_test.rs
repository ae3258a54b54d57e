//! Tests for collapse.

use serde_json::json;

use crate::collapse::collapse;
use crate::editor::EditorOptions;
use crate::error::{EngineError, GraphError};
use crate::fixtures::{add, connect, group};
use crate::graph::{Graph, MemberRef};
use crate::interface::build_map;
use crate::observer::{GroupEvent, RecordingObserver};
use crate::types::{
  Endpoint, GroupOverrides, GroupProperties, Override, Position, PortOverride, SerializedMembers,
};

fn opts() -> EditorOptions {
  EditorOptions::default()
}

#[test]
fn collapse_rewires_boundary_and_keeps_internal_wires() {
  let mut g = Graph::new();
  let n1 = add(&mut g, "n1", 0.0, 0.0);
  let n2 = add(&mut g, "n2", 100.0, 0.0);
  let n3 = add(&mut g, "n3", 400.0, 0.0);
  connect(&mut g, n1, "out", n2, "in");
  connect(&mut g, n1, "out", n3, "in");
  let grp = group(&mut g, "pair", &[n1, n2], &[]);

  let mut events = RecordingObserver::default();
  let c = collapse(&mut g, grp, None, &opts(), &mut events).unwrap();

  assert_eq!(events.events, vec![GroupEvent::Collapsed(grp, c)]);
  assert!(g.node(n1).is_err());
  assert!(g.node(n2).is_err());
  assert_eq!(g.node_count(), 2);
  let composite = g.node(c).unwrap();
  assert_eq!(composite.name, "pair");
  assert_eq!(composite.xtype, "GroupContainer");
  assert_eq!(composite.position, Position::new(50.0, 0.0));
  assert_eq!(composite.group, Some(grp));
  let names: Vec<_> = composite.terminals.iter().map(|t| t.name.as_str()).collect();
  assert_eq!(names, vec!["out"]);
  let cfg = composite.group_config().unwrap();
  assert_eq!(cfg.wires.len(), 1);
  assert_eq!(cfg.modules.len(), 2);

  assert_eq!(g.wire_count(), 1);
  let w = g.wires().next().unwrap();
  assert_eq!(w.src, Endpoint::new(c, "out"));
  assert_eq!(w.tgt, Endpoint::new(n3, "in"));
  assert_eq!(g.group(grp).unwrap().group_container(), Some(c));
}

#[test]
fn rename_collision_aborts_without_mutation() {
  let mut g = Graph::new();
  let a = add(&mut g, "a", 0.0, 0.0);
  let b = add(&mut g, "b", 10.0, 0.0);
  let grp = group(&mut g, "g", &[a, b], &[]);
  let before = g.clone();
  let x = Override::default().terminal("out", PortOverride::renamed("x"));
  let overrides = GroupOverrides::default()
    .container(a, x.clone())
    .container(b, x);
  let mut events = RecordingObserver::default();
  let r = collapse(&mut g, grp, Some(&overrides), &opts(), &mut events);
  assert!(matches!(r, Err(EngineError::Mapping(_))));
  assert_eq!(g, before);
  assert!(events.events.is_empty());
}

#[test]
fn overrides_passed_to_collapse_are_kept_on_members() {
  let mut g = Graph::new();
  let a = add(&mut g, "a", 0.0, 0.0);
  let grp = group(&mut g, "g", &[a], &[]);
  let o = Override::default().field("value", PortOverride::renamed("title"));
  let overrides = GroupOverrides::default().container(a, o.clone());
  let c = collapse(&mut g, grp, Some(&overrides), &opts(), &mut ()).unwrap();
  let cfg = g.node(c).unwrap().group_config().unwrap().clone();
  let SerializedMembers::Expanded { containers, .. } = cfg.group.members else {
    panic!("top-level group is stored expanded");
  };
  assert_eq!(containers[0].overrides, o);
  assert_eq!(g.node(c).unwrap().value.get("title"), Some(&json!("a")));
  assert_eq!(g.node(c).unwrap().fields[0].name, "title");
}

#[test]
fn unnamed_group_takes_configured_composite_name() {
  let mut g = Graph::new();
  let a = add(&mut g, "a", 0.0, 0.0);
  let grp = g.create_group(GroupProperties::new(), &[a], &[]).unwrap();
  let options = EditorOptions {
    composite_xtype: "Macro".to_string(),
    composite_name: "Unnamed".to_string(),
    prune_empty_groups: true,
  };
  let c = collapse(&mut g, grp, None, &options, &mut ()).unwrap();
  let node = g.node(c).unwrap();
  assert_eq!(node.name, "Unnamed");
  assert_eq!(node.xtype, "Macro");
  assert!(node.is_composite());
}

#[test]
fn nested_groups_collapse_bottom_up() {
  let mut g = Graph::new();
  let a = add(&mut g, "a", 0.0, 0.0);
  let b = add(&mut g, "b", 100.0, 0.0);
  let outside = add(&mut g, "outside", 500.0, 0.0);
  connect(&mut g, outside, "out", b, "in");
  let inner = group(&mut g, "inner", &[b], &[]);
  let outer = group(&mut g, "outer", &[a], &[inner]);

  let mut events = RecordingObserver::default();
  let c = collapse(&mut g, outer, None, &opts(), &mut events).unwrap();

  assert_eq!(events.events.len(), 2);
  let GroupEvent::Collapsed(first, inner_composite) = events.events[0] else {
    panic!("expected collapse event, got {:?}", events.events[0]);
  };
  assert_eq!(first, inner);
  assert_eq!(events.events[1], GroupEvent::Collapsed(outer, c));
  assert!(g.group(inner).is_err());
  assert!(g.node(inner_composite).is_err());
  assert_eq!(g.group_count(), 1);

  let cfg = g.node(c).unwrap().group_config().unwrap();
  let SerializedMembers::Expanded { groups, .. } = &cfg.group.members else {
    panic!("outer stored expanded");
  };
  assert_eq!(
    groups[0].group.members,
    SerializedMembers::Collapsed { group_container: 1 }
  );
  assert!(cfg.modules[1].config.group_config.is_some());
  let r = &cfg.map.group_map.terminals["in"];
  assert_eq!((r.group_id, r.name.as_str()), (0, "in"));

  let w = g.wires().next().unwrap();
  assert_eq!(w.src, Endpoint::new(outside, "out"));
  assert_eq!(w.tgt, Endpoint::new(c, "in"));
}

#[test]
fn collapsed_group_cannot_be_collapsed_or_mapped() {
  let mut g = Graph::new();
  let a = add(&mut g, "a", 0.0, 0.0);
  let grp = group(&mut g, "g", &[a], &[]);
  collapse(&mut g, grp, None, &opts(), &mut ()).unwrap();
  assert_eq!(
    collapse(&mut g, grp, None, &opts(), &mut ()),
    Err(EngineError::Graph(GraphError::GroupCollapsed(grp)))
  );
  assert!(matches!(
    build_map(&g, grp),
    Err(EngineError::Graph(GraphError::GroupCollapsed(_)))
  ));
  assert!(matches!(
    g.set_member_overrides(grp, MemberRef::Node(a), Override::default()),
    Err(GraphError::GroupCollapsed(_))
  ));
}

#[test]
fn collapsed_sub_group_stays_member_of_parent() {
  let mut g = Graph::new();
  let a = add(&mut g, "a", 0.0, 0.0);
  let b = add(&mut g, "b", 10.0, 0.0);
  let inner = group(&mut g, "inner", &[b], &[]);
  let outer = group(&mut g, "outer", &[a], &[inner]);
  let c = collapse(&mut g, inner, None, &opts(), &mut ()).unwrap();
  assert_eq!(g.group(outer).unwrap().groups()[0].id, inner);
  assert!(g.members_of(outer).unwrap().contains(&c));
  assert_eq!(g.group(inner).unwrap().parent, Some(outer));
}
