//! Notifications about group lifecycle, delivered to a caller-supplied observer.

use crate::types::{GroupId, NodeId};

/// Receives group lifecycle events after an operation commits.
pub trait GroupObserver {
  /// The group lost its last member and was removed.
  fn group_emptied(&mut self, _group: GroupId) {}

  fn group_collapsed(&mut self, _group: GroupId, _composite: NodeId) {}

  fn group_expanded(&mut self, _group: GroupId) {}

  /// The group was dissolved by ungroup.
  fn group_removed(&mut self, _group: GroupId) {}
}

impl GroupObserver for () {}

/// One recorded notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupEvent {
  Emptied(GroupId),
  Collapsed(GroupId, NodeId),
  Expanded(GroupId),
  Removed(GroupId),
}

/// Observer that keeps every event, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
  pub events: Vec<GroupEvent>,
}

impl RecordingObserver {
  /// Delivers the recorded events to `observer`, oldest first.
  pub fn replay(self, observer: &mut dyn GroupObserver) {
    for event in self.events {
      match event {
        GroupEvent::Emptied(g) => observer.group_emptied(g),
        GroupEvent::Collapsed(g, n) => observer.group_collapsed(g, n),
        GroupEvent::Expanded(g) => observer.group_expanded(g),
        GroupEvent::Removed(g) => observer.group_removed(g),
      }
    }
  }
}

impl GroupObserver for RecordingObserver {
  fn group_emptied(&mut self, group: GroupId) {
    self.events.push(GroupEvent::Emptied(group));
  }

  fn group_collapsed(&mut self, group: GroupId, composite: NodeId) {
    self.events.push(GroupEvent::Collapsed(group, composite));
  }

  fn group_expanded(&mut self, group: GroupId) {
    self.events.push(GroupEvent::Expanded(group));
  }

  fn group_removed(&mut self, group: GroupId) {
    self.events.push(GroupEvent::Removed(group));
  }
}
