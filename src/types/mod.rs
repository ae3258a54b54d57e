//! Graph model records: nodes, wires, groups, overrides, interface maps and
//! the persisted composite payload.

mod group;
mod group_config;
#[cfg(test)]
mod group_config_test;
mod ids;
mod interface_map;
mod node;
mod overrides;
#[cfg(test)]
mod overrides_test;
mod port_def;
mod position;
mod side;
mod wire;

pub use group::{Group, GroupProperties, GroupState, Member};
pub use group_config::{
  CollapsedConfig, ContainerPortRef, ExternalToInternalMap, GroupConfig, GroupPortRef,
  InternalWire, ModuleEndpoint, PortIndex, SerializedContainer, SerializedGroup,
  SerializedMembers, SerializedSubGroup,
};
pub use ids::{GroupId, NodeId, WireId};
pub use interface_map::{GroupMap, InterfaceMap, MapEntry, MemberMap};
pub use node::{ContainerConfig, DEFAULT_XTYPE, FieldValues, ModuleConfig, Node, NodeKind};
pub use overrides::{GroupOverrides, Override, PortOverride};
pub use port_def::{FieldDef, PortDef, TerminalDef};
pub use position::Position;
pub use side::{Direction, Side};
pub use wire::{Endpoint, Wire, WireConfig};
