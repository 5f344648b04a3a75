// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connector definitions for node inputs/outputs.
//!
//! A connector never owns a reference to another node. It names its owner by
//! [`NodeId`] and, for inputs, names the upstream output by [`ConnectorId`].
//! The [`Graph`](crate::graph::Graph) resolves those ids, so removing a node
//! cannot leave a dangling link behind.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connector direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorDirection {
    /// Input connector
    Input,
    /// Output connector
    Output,
}

/// Identifies a connector by owning node, direction and position.
///
/// The index is stable for the node's lifetime because connectors are fixed
/// at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectorId {
    /// Owning node
    pub node: NodeId,
    /// Input or output side
    pub direction: ConnectorDirection,
    /// Position within its direction on the node
    pub index: usize,
}

impl ConnectorId {
    /// Id of the `index`-th input of `node`
    pub fn input(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: ConnectorDirection::Input,
            index,
        }
    }

    /// Id of the `index`-th output of `node`
    pub fn output(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: ConnectorDirection::Output,
            index,
        }
    }

    /// Whether this is an input connector
    pub fn is_input(&self) -> bool {
        self.direction == ConnectorDirection::Input
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.direction {
            ConnectorDirection::Input => "in",
            ConnectorDirection::Output => "out",
        };
        write!(f, "{}.{}{}", self.node, side, self.index)
    }
}

/// Data type that can flow through connectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// 32-bit float
    Float,
    /// 32-bit signed integer
    Int,
}

impl ValueType {
    /// Check if this type can connect to another type.
    ///
    /// There is no implicit coercion: only identical types connect.
    pub fn can_connect_to(&self, other: &ValueType) -> bool {
        self == other
    }

    /// The zero value of this type
    pub fn zero(&self) -> Value {
        match self {
            Self::Float => Value::Float(0.0),
            Self::Int => Value::Int(0),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float => f.write_str("Float"),
            Self::Int => f.write_str("Int"),
        }
    }
}

/// Value that flows between connectors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Float
    Float(f32),
    /// Integer
    Int(i32),
}

impl Value {
    /// Get the value type for this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Float(_) => ValueType::Float,
            Self::Int(_) => ValueType::Int,
        }
    }

    /// The float payload, if this is a float
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(_) => None,
        }
    }

    /// The integer payload, if this is an integer
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

/// A connector on a node
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    id: ConnectorId,
    name: String,
    value_type: ValueType,
    connected_to: Option<ConnectorId>,
}

impl Connector {
    pub(crate) fn new(id: ConnectorId, name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id,
            name: name.into(),
            value_type,
            connected_to: None,
        }
    }

    /// Connector id
    pub fn id(&self) -> ConnectorId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connector direction
    pub fn direction(&self) -> ConnectorDirection {
        self.id.direction
    }

    /// Position within its direction
    pub fn index(&self) -> usize {
        self.id.index
    }

    /// Data type accepted or produced
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// The output feeding this input, if any. Always `None` for outputs.
    pub fn connected_to(&self) -> Option<ConnectorId> {
        self.connected_to
    }

    /// Whether this input currently holds a connection
    pub fn is_connected(&self) -> bool {
        self.connected_to.is_some()
    }

    pub(crate) fn set_connected_to(&mut self, output: Option<ConnectorId>) {
        debug_assert!(self.id.is_input(), "only inputs hold a connection");
        self.connected_to = output;
    }
}
