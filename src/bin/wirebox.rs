//! CLI: inspect, collapse, expand and ungroup groups in a saved graph.
//!
//! Usage: `wirebox [OPTIONS] <COMMAND> <graph.json> <group>`
//! Example: wirebox collapse graph.json g2 --overrides overrides.json
//!
//! Commands that change the graph rewrite the input file unless `--out` is given.
//!
//! Set RUST_LOG=wirebox=trace for TRACE-level span enter/exit and events.

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};
use wirebox::editor::{ENV_COMPOSITE_NAME, ENV_COMPOSITE_XTYPE, ENV_PRUNE_EMPTY_GROUPS};
use wirebox::graph_io::{load_graph, save_graph};
use wirebox::types::GroupOverrides;
use wirebox::{Editor, EditorOptions, GroupId};

/// Collapse and expand node groups in a graph snapshot.
#[derive(Parser, Debug)]
#[command(name = "wirebox")]
#[command(
  after_help = r#"Environment variables (override the matching flags when set):
  WIREBOX_COMPOSITE_XTYPE     xtype of composite nodes (default: GroupContainer)
  WIREBOX_COMPOSITE_NAME      name of composites for unnamed groups (default: Group)
  WIREBOX_PRUNE_EMPTY_GROUPS  true/false: remove groups that lose their last member

Examples:
  wirebox map graph.json g1
  wirebox check graph.json g1 --overrides overrides.json
  wirebox collapse graph.json g1 --out collapsed.json"#
)]
struct Args {
  /// xtype of composite nodes. Overridden by WIREBOX_COMPOSITE_XTYPE if set.
  #[arg(long, value_name = "XTYPE", global = true)]
  composite_xtype: Option<String>,

  /// Name of composites for unnamed groups. Overridden by WIREBOX_COMPOSITE_NAME if set.
  #[arg(long, value_name = "NAME", global = true)]
  composite_name: Option<String>,

  /// Keep groups that lose their last member. Overridden by WIREBOX_PRUNE_EMPTY_GROUPS if set.
  #[arg(long, global = true)]
  keep_empty_groups: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the interface map of an expanded group.
  Map {
    graph: PathBuf,
    #[arg(value_parser = parse_group)]
    group: GroupId,
  },
  /// Validate overrides for a group; exits 1 on a name collision.
  Check {
    graph: PathBuf,
    #[arg(value_parser = parse_group)]
    group: GroupId,
    #[arg(long, value_name = "JSON")]
    overrides: Option<PathBuf>,
  },
  /// Collapse a group into one composite node.
  Collapse {
    graph: PathBuf,
    #[arg(value_parser = parse_group)]
    group: GroupId,
    #[arg(long, value_name = "JSON")]
    overrides: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
  },
  /// Expand a collapsed group.
  Expand {
    graph: PathBuf,
    #[arg(value_parser = parse_group)]
    group: GroupId,
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
  },
  /// Dissolve a group, moving its members to the enclosing scope.
  Ungroup {
    graph: PathBuf,
    #[arg(value_parser = parse_group)]
    group: GroupId,
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
  },
}

/// Accepts `3` or `g3`.
fn parse_group(s: &str) -> Result<GroupId, String> {
  let digits = s.strip_prefix('g').unwrap_or(s);
  digits
    .parse::<u64>()
    .map(GroupId)
    .map_err(|e| format!("invalid group id '{}': {}", s, e))
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
  eprintln!("{}: {}", context, e);
  process::exit(1);
}

fn print_json(value: &impl Serialize) {
  match serde_json::to_string_pretty(value) {
    Ok(s) => println!("{}", s),
    Err(e) => fail("Error encoding output", e),
  }
}

fn load_overrides(path: Option<&Path>) -> Option<GroupOverrides> {
  let path = path?;
  let text = std::fs::read_to_string(path)
    .unwrap_or_else(|e| fail(&format!("Error reading {}", path.display()), e));
  Some(
    serde_json::from_str(&text)
      .unwrap_or_else(|e| fail(&format!("Error parsing {}", path.display()), e)),
  )
}

fn open(path: &Path, options: EditorOptions) -> Editor {
  let graph = load_graph(path).unwrap_or_else(|e| fail(&format!("Error reading {}", path.display()), e));
  Editor::with_graph(graph, options, ())
}

fn save(editor: Editor, input: &Path, out: Option<&Path>) {
  let target = out.unwrap_or(input);
  if let Err(e) = save_graph(target, editor.graph()) {
    fail(&format!("Error writing {}", target.display()), e);
  }
  info!(path = %target.display(), "graph saved");
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  // Env vars override flags.
  let mut options = EditorOptions::default();
  if let Some(x) = args.composite_xtype.clone() {
    options.composite_xtype = x;
  }
  if let Some(n) = args.composite_name.clone() {
    options.composite_name = n;
  }
  options.prune_empty_groups = !args.keep_empty_groups;
  let options = options.overlay(|k| std::env::var(k).ok());
  info!(
    composite_xtype = %options.composite_xtype,
    composite_name = %options.composite_name,
    prune_empty_groups = options.prune_empty_groups,
    "options (env {}, {}, {} or flags)",
    ENV_COMPOSITE_XTYPE,
    ENV_COMPOSITE_NAME,
    ENV_PRUNE_EMPTY_GROUPS
  );

  match args.command {
    Command::Map { graph, group } => {
      let editor = open(&graph, options);
      match editor.interface_map(group) {
        Ok(map) => print_json(&map),
        Err(e) => fail("Map error", e),
      }
    }
    Command::Check {
      graph,
      group,
      overrides,
    } => {
      let editor = open(&graph, options);
      let overrides = load_overrides(overrides.as_deref());
      let check = editor
        .check_overrides(group, overrides.as_ref())
        .unwrap_or_else(|e| fail("Check error", e));
      print_json(&json!({ "valid": check.valid, "error": check.error }));
      if !check.valid {
        process::exit(1);
      }
    }
    Command::Collapse {
      graph,
      group,
      overrides,
      out,
    } => {
      let mut editor = open(&graph, options);
      let overrides = load_overrides(overrides.as_deref());
      let composite = editor
        .collapse(group, overrides.as_ref())
        .unwrap_or_else(|e| fail("Collapse error", e));
      print_json(&json!({ "group": group, "composite": composite }));
      save(editor, &graph, out.as_deref());
    }
    Command::Expand { graph, group, out } => {
      let mut editor = open(&graph, options);
      let nodes = editor
        .expand(group)
        .unwrap_or_else(|e| fail("Expand error", e));
      print_json(&json!({ "group": group, "nodes": nodes }));
      save(editor, &graph, out.as_deref());
    }
    Command::Ungroup { graph, group, out } => {
      let mut editor = open(&graph, options);
      let outcome = editor
        .ungroup(group)
        .unwrap_or_else(|e| fail("Ungroup error", e));
      print_json(&outcome);
      save(editor, &graph, out.as_deref());
    }
  }
}
