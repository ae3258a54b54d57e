//! Tests for the persisted composite payload shape.

use serde_json::json;

use super::{
  ContainerPortRef, ExternalToInternalMap, GroupConfig, InternalWire, ModuleConfig, ModuleEndpoint,
  Override, Position, SerializedContainer, SerializedGroup, SerializedMembers, SerializedSubGroup,
};

fn sample() -> GroupConfig {
  let mut map = ExternalToInternalMap::default();
  map.container_map.terminals.insert(
    "o".to_string(),
    ContainerPortRef {
      container_id: 0,
      name: "o".to_string(),
    },
  );
  GroupConfig {
    group: SerializedGroup {
      properties: Default::default(),
      members: SerializedMembers::Expanded {
        containers: vec![
          SerializedContainer {
            container: 0,
            overrides: Override::default(),
          },
          SerializedContainer {
            container: 1,
            overrides: Override::default(),
          },
        ],
        groups: vec![SerializedSubGroup {
          group: SerializedGroup {
            properties: Default::default(),
            members: SerializedMembers::Collapsed { group_container: 2 },
          },
          overrides: Override::default(),
        }],
      },
    },
    center: Position::new(10.0, 0.0),
    modules: vec![
      ModuleConfig::new("a", Position::new(-10.0, 0.0)),
      ModuleConfig::new("b", Position::new(10.0, 0.0)),
      ModuleConfig::new("c", Position::new(0.0, 5.0)),
    ],
    wires: vec![InternalWire {
      src: ModuleEndpoint {
        module_id: 0,
        terminal: "o".to_string(),
      },
      tgt: ModuleEndpoint {
        module_id: 1,
        terminal: "i".to_string(),
      },
    }],
    map,
  }
}

#[test]
fn json_uses_camel_case_keys() {
  let v = serde_json::to_value(sample()).unwrap();
  assert_eq!(v["center"], json!([10.0, 0.0]));
  assert_eq!(v["group"]["containers"][1]["container"], 1);
  assert_eq!(v["group"]["groups"][0]["group"]["groupContainer"], 2);
  assert_eq!(v["wires"][0]["src"]["moduleId"], 0);
  assert_eq!(v["map"]["containerMap"]["terminals"]["o"]["containerId"], 0);
  assert!(v["map"]["groupMap"]["fields"].as_object().unwrap().is_empty());
}

#[test]
fn json_round_trip_is_stable() {
  let first = serde_json::to_string(&sample()).unwrap();
  let back: GroupConfig = serde_json::from_str(&first).unwrap();
  assert_eq!(back, sample());
  let second = serde_json::to_string(&back).unwrap();
  assert_eq!(first, second);
}

#[test]
fn collapsed_member_form_deserialises() {
  let g: SerializedGroup =
    serde_json::from_value(json!({"properties": {"name": "inner"}, "groupContainer": 4})).unwrap();
  assert_eq!(g.members, SerializedMembers::Collapsed { group_container: 4 });
  assert_eq!(g.properties["name"], "inner");
}
