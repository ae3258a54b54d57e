//! Tests for graph save/load.

use crate::fixtures::{add, connect, group};
use crate::graph::Graph;
use serde_json::json;

use crate::graph_io::{load_graph, save_graph};

#[test]
fn roundtrip_save_load() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("nested").join("graph.json");
  let mut g = Graph::new();
  let a = add(&mut g, "a", 0.0, 0.0);
  let b = add(&mut g, "b", 10.0, 5.0);
  connect(&mut g, a, "out", b, "in");
  group(&mut g, "pair", &[a, b], &[]);
  save_graph(&path, &g).unwrap();
  assert!(path.exists());
  let loaded = load_graph(&path).unwrap();
  assert_eq!(loaded, g);
}

#[test]
fn load_missing_file_returns_error() {
  let dir = tempfile::tempdir().unwrap();
  let r = load_graph(&dir.path().join("nonexistent.json"));
  assert!(r.is_err());
}

#[test]
fn load_invalid_json_is_invalid_data() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("graph.json");
  std::fs::write(&path, "{ not json").unwrap();
  let e = load_graph(&path).unwrap_err();
  assert_eq!(e.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn load_rejects_group_that_drops_its_members() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("graph.json");
  let mut g = Graph::new();
  let a = add(&mut g, "a", 0.0, 0.0);
  let grp = group(&mut g, "solo", &[a], &[]);
  let mut v = serde_json::to_value(&g).unwrap();
  v["groups"][grp.0.to_string()]["state"]["containers"] = json!([]);
  std::fs::write(&path, v.to_string()).unwrap();

  let e = load_graph(&path).unwrap_err();
  assert_eq!(e.kind(), std::io::ErrorKind::InvalidData);
  assert!(e.to_string().contains("inconsistent membership"), "{}", e);
}

#[test]
fn load_rejects_wire_to_undeclared_port() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("graph.json");
  let mut g = Graph::new();
  let a = add(&mut g, "a", 0.0, 0.0);
  let b = add(&mut g, "b", 10.0, 0.0);
  let w = connect(&mut g, a, "out", b, "in");
  let mut v = serde_json::to_value(&g).unwrap();
  v["wires"][w.0.to_string()]["tgt"]["terminal"] = json!("missing");
  std::fs::write(&path, v.to_string()).unwrap();

  let e = load_graph(&path).unwrap_err();
  assert_eq!(e.kind(), std::io::ErrorKind::InvalidData);
}
