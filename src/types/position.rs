//! Canvas coordinates.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A point on the canvas. Serialised as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

impl Position {
  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }

  /// Midpoint of the bounding box of `points`, or `None` when empty.
  pub fn center_of<I>(points: I) -> Option<Position>
  where
    I: IntoIterator<Item = Position>,
  {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let (mut min, mut max) = (first, first);
    for p in iter {
      min.x = min.x.min(p.x);
      min.y = min.y.min(p.y);
      max.x = max.x.max(p.x);
      max.y = max.y.max(p.y);
    }
    Some(Position::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0))
  }
}

impl From<[f64; 2]> for Position {
  fn from([x, y]: [f64; 2]) -> Self {
    Self { x, y }
  }
}

impl From<Position> for [f64; 2] {
  fn from(p: Position) -> Self {
    [p.x, p.y]
  }
}

impl Add for Position {
  type Output = Position;

  fn add(self, rhs: Position) -> Position {
    Position::new(self.x + rhs.x, self.y + rhs.y)
  }
}

impl Sub for Position {
  type Output = Position;

  fn sub(self, rhs: Position) -> Position {
    Position::new(self.x - rhs.x, self.y - rhs.y)
  }
}
