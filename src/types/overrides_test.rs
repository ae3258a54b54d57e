//! Tests for override records.

use super::{GroupOverrides, NodeId, Override, PortOverride, Side};

#[test]
fn renamed_is_visible() {
  let po = PortOverride::renamed("x");
  assert!(po.visible);
  assert_eq!(po.rename.as_deref(), Some("x"));
  assert_eq!(po.side, None);
}

#[test]
fn empty_override_serialises_to_empty_object() {
  assert_eq!(serde_json::to_string(&Override::default()).unwrap(), "{}");
  assert!(Override::default().is_empty());
}

#[test]
fn override_json_shape() {
  let o = Override::default()
    .field("value", PortOverride::hidden())
    .terminal("out", PortOverride::shown().on(Side::Right));
  let v = serde_json::to_value(&o).unwrap();
  assert_eq!(v["fields"]["value"]["visible"], false);
  assert_eq!(v["terminals"]["out"]["side"], "right");
  let back: Override = serde_json::from_value(v).unwrap();
  assert_eq!(back, o);
}

#[test]
fn group_overrides_keys_by_node_id() {
  let go = GroupOverrides::default().container(NodeId(3), Override::default());
  let json = serde_json::to_string(&go).unwrap();
  let back: GroupOverrides = serde_json::from_str(&json).unwrap();
  assert!(back.containers.contains_key(&NodeId(3)));
}
