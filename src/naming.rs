//! Collision-free external name allocation.
//!
//! Wirable fields share a namespace with terminals (both can take a wire);
//! plain fields have their own. A wirable field therefore has to be free in
//! both sets and is registered in both.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::MappingError;

/// Where an external name lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
  Field,
  WirableField,
  Terminal,
}

/// Returns `candidate` if unused, otherwise `candidate1`, `candidate2`, ...
/// The returned name is inserted into `used`.
pub fn fresh_name(candidate: &str, used: &mut BTreeSet<String>) -> String {
  let name = first_free(candidate, |n| used.contains(n));
  used.insert(name.clone());
  name
}

fn first_free(candidate: &str, taken: impl Fn(&str) -> bool) -> String {
  if !taken(candidate) {
    return candidate.to_string();
  }
  let mut suffix = 1u64;
  loop {
    let name = format!("{}{}", candidate, suffix);
    if !taken(&name) {
      return name;
    }
    suffix += 1;
  }
}

/// Names registered so far for one group, each with the port that owns it.
#[derive(Debug, Clone, Default)]
pub struct UsedNames {
  fields: BTreeMap<String, String>,
  terminals: BTreeMap<String, String>,
}

impl UsedNames {
  /// Owner of `name` in `ns`, if taken.
  pub fn owner(&self, name: &str, ns: Namespace) -> Option<&str> {
    match ns {
      Namespace::Field => self.fields.get(name),
      Namespace::Terminal => self.terminals.get(name),
      Namespace::WirableField => self.fields.get(name).or_else(|| self.terminals.get(name)),
    }
    .map(String::as_str)
  }

  fn register(&mut self, name: &str, ns: Namespace, owner: &str) {
    if matches!(ns, Namespace::Field | Namespace::WirableField) {
      self.fields.insert(name.to_string(), owner.to_string());
    }
    if matches!(ns, Namespace::Terminal | Namespace::WirableField) {
      self.terminals.insert(name.to_string(), owner.to_string());
    }
  }

  /// Claims an explicitly requested name.
  pub fn reserve(&mut self, name: &str, ns: Namespace, owner: &str) -> Result<(), MappingError> {
    if let Some(existing) = self.owner(name, ns) {
      return Err(MappingError::new(format!(
        "external name '{}' requested by {} is already used by {}",
        name, owner, existing
      )));
    }
    self.register(name, ns, owner);
    Ok(())
  }

  /// Claims `candidate` or the first free suffixed variant of it.
  pub fn allocate(&mut self, candidate: &str, ns: Namespace, owner: &str) -> String {
    let name = first_free(candidate, |n| self.owner(n, ns).is_some());
    self.register(&name, ns, owner);
    name
  }
}
