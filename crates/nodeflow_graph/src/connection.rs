// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) view of the graph.
//!
//! Connections are not stored separately: an input connector's
//! `connected_to` link is the single source of truth, and [`Connection`] is
//! the value the graph derives from it for callers that want edges.

use crate::connector::ConnectorId;
use crate::node::NodeId;

/// A connection from one output connector to one input connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Producing output connector
    pub from: ConnectorId,
    /// Consuming input connector
    pub to: ConnectorId,
}

impl Connection {
    /// Create a new connection
    pub fn new(from: ConnectorId, to: ConnectorId) -> Self {
        Self { from, to }
    }

    /// Producing node
    pub fn from_node(&self) -> NodeId {
        self.from.node
    }

    /// Consuming node
    pub fn to_node(&self) -> NodeId {
        self.to.node
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from.node == node_id || self.to.node == node_id
    }
}
