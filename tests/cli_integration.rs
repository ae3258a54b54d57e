//! Integration tests for the wirebox CLI on temp graph files.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::{Value, json};
use wirebox::graph_io::{load_graph, save_graph};
use wirebox::types::{Endpoint, FieldDef, GroupProperties, ModuleConfig, Position, TerminalDef, WireConfig};
use wirebox::{Graph, GroupId};

fn run_wirebox(args: &[&str]) -> Output {
  run_wirebox_with_env(args, &[])
}

fn run_wirebox_with_env(args: &[&str], env_add: &[(&str, &str)]) -> Output {
  let mut cmd = Command::new(env!("CARGO_BIN_EXE_wirebox"));
  cmd.args(args).env_remove("RUST_LOG");
  for (k, v) in env_add {
    cmd.env(k, v);
  }
  cmd.output().expect("run wirebox")
}

/// Two wired modules in group g1, feeding a third outside it.
fn write_graph(path: &Path) -> GroupId {
  let mut g = Graph::new();
  let module = |name: &str, x: f64| {
    ModuleConfig::new(name, Position::new(x, 0.0))
      .terminal(TerminalDef::input("in"))
      .terminal(TerminalDef::output("out"))
      .field(FieldDef::new("value"))
  };
  let a = g.add_container(module("a", 0.0)).unwrap();
  let b = g.add_container(module("b", 50.0)).unwrap();
  let c = g.add_container(module("c", 200.0)).unwrap();
  for (s, t) in [(a, b), (b, c)] {
    g.add_wire(WireConfig::new(Endpoint::new(s, "out"), Endpoint::new(t, "in")))
      .unwrap();
  }
  let mut props = GroupProperties::new();
  props.insert("name".to_string(), json!("pair"));
  let grp = g.create_group(props, &[a, b], &[]).unwrap();
  save_graph(path, &g).unwrap();
  grp
}

fn stdout_json(out: &Output) -> Value {
  serde_json::from_slice(&out.stdout).expect("stdout is JSON")
}

#[test]
fn prints_usage_without_args() {
  let out = run_wirebox(&[]);
  assert!(!out.status.success());
  let stderr = String::from_utf8_lossy(&out.stderr);
  assert!(stderr.contains("Usage") || stderr.contains("usage"), "stderr: {}", stderr);
}

#[test]
fn exits_1_for_missing_file() {
  let out = run_wirebox(&["map", "/nonexistent/graph.json", "g1"]);
  assert_eq!(out.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&out.stderr);
  assert!(stderr.contains("Error reading"), "stderr: {}", stderr);
}

#[test]
fn map_prints_interface() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("graph.json");
  write_graph(&path);
  let out = run_wirebox(&["map", path.to_str().unwrap(), "g1"]);
  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
  let map = stdout_json(&out);
  let b_out = &map["containerMap"][1]["terminals"][1];
  assert_eq!(b_out["externalName"], json!("out"));
  assert_eq!(b_out["forceVisible"], json!(true));
}

#[test]
fn check_reports_collision_and_exits_1() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("graph.json");
  write_graph(&path);
  let overrides = dir.path().join("overrides.json");
  let x = json!({ "fields": { "value": { "visible": true, "rename": "x" } } });
  std::fs::write(
    &overrides,
    json!({ "containers": { "1": x, "2": x } }).to_string(),
  )
  .unwrap();

  let out = run_wirebox(&[
    "check",
    path.to_str().unwrap(),
    "1",
    "--overrides",
    overrides.to_str().unwrap(),
  ]);
  assert_eq!(out.status.code(), Some(1));
  let v = stdout_json(&out);
  assert_eq!(v["valid"], json!(false));
  assert_eq!(v["error"]["type"], json!("MappingError"));
}

#[test]
fn collapse_then_expand_through_files() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("graph.json");
  let collapsed = dir.path().join("collapsed.json");
  let grp = write_graph(&path);
  let original = load_graph(&path).unwrap();

  let out = run_wirebox_with_env(
    &[
      "collapse",
      path.to_str().unwrap(),
      "g1",
      "--out",
      collapsed.to_str().unwrap(),
    ],
    &[("WIREBOX_COMPOSITE_XTYPE", "Macro")],
  );
  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
  let composite = stdout_json(&out)["composite"].as_u64().unwrap();
  assert_eq!(load_graph(&path).unwrap(), original);

  let g = load_graph(&collapsed).unwrap();
  let node = g.nodes().find(|n| n.id.0 == composite).unwrap();
  assert_eq!(node.xtype, "Macro");
  assert_eq!(node.name, "pair");
  assert_eq!(g.group(grp).unwrap().group_container(), Some(node.id));

  let out = run_wirebox(&["expand", collapsed.to_str().unwrap(), "g1"]);
  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
  assert_eq!(stdout_json(&out)["nodes"].as_array().unwrap().len(), 2);
  let g = load_graph(&collapsed).unwrap();
  assert!(!g.group(grp).unwrap().is_collapsed());
  assert_eq!(g.wire_count(), 2);
}

#[test]
fn ungroup_rewrites_input_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("graph.json");
  let grp = write_graph(&path);
  let out = run_wirebox(&["ungroup", path.to_str().unwrap(), "g1"]);
  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
  assert_eq!(stdout_json(&out)["nodes"], json!([1, 2]));
  let g = load_graph(&path).unwrap();
  assert!(g.group(grp).is_err());
  assert_eq!(g.root_nodes().len(), 3);
}

#[test]
fn bad_group_id_is_a_usage_error() {
  let out = run_wirebox(&["map", "graph.json", "group-one"]);
  assert!(!out.status.success());
  let stderr = String::from_utf8_lossy(&out.stderr);
  assert!(stderr.contains("invalid group id"), "stderr: {}", stderr);
}
