//! Port placement and direction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which edge of a node a port is drawn on.
///
/// `Auto` leaves placement to the renderer; composite ports get `Auto`
/// unless an override picks a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
  #[default]
  Auto,
  Top,
  Bottom,
  Left,
  Right,
}

/// Data direction of a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  #[default]
  Input,
  Output,
}

impl fmt::Display for Side {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Side::Auto => write!(f, "auto"),
      Side::Top => write!(f, "top"),
      Side::Bottom => write!(f, "bottom"),
      Side::Left => write!(f, "left"),
      Side::Right => write!(f, "right"),
    }
  }
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Direction::Input => write!(f, "input"),
      Direction::Output => write!(f, "output"),
    }
  }
}
