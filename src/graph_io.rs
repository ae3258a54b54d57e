//! Graph snapshot save/load (JSON).
//!
//! A loaded graph must have consistent membership: every node and sub-group
//! names the group that lists it, and every wire ends on a declared port.

use crate::graph::Graph;
use std::io::{Error, ErrorKind};
use std::path::Path;
use tracing::{debug, instrument};

/// Saves `graph` to `path` as pretty JSON, creating parent directories.
#[instrument(level = "trace", skip(path, graph))]
pub fn save_graph(path: &Path, graph: &Graph) -> Result<(), Error> {
  let json = serde_json::to_string_pretty(graph).map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, json)?;
  debug!(path = %path.display(), nodes = graph.node_count(), groups = graph.group_count(), "graph saved");
  Ok(())
}

/// Loads a graph from `path`.
///
/// Malformed JSON and broken membership links are both `InvalidData`.
#[instrument(level = "trace", skip(path))]
pub fn load_graph(path: &Path) -> Result<Graph, Error> {
  let bytes = std::fs::read(path)?;
  let graph: Graph = serde_json::from_slice(&bytes).map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
  graph
    .check_links()
    .map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
  debug!(path = %path.display(), nodes = graph.node_count(), groups = graph.group_count(), "graph loaded");
  Ok(graph)
}
