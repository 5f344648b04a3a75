// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and the connections between them.
//!
//! The graph is the only place connector links are created or severed, so it
//! is where the wiring invariants live:
//!
//! - a connection always runs from an output to an input of another node,
//! - both ends carry the same [`ValueType`],
//! - an input holds at most one connection,
//! - no link ever names a node that is not in the graph.
//!
//! Mutation needs `&mut Graph`, as does [`Evaluator::run`](crate::Evaluator::run),
//! so mutating while a run is in progress cannot be expressed. Callers that
//! share a graph across threads must serialize access themselves.

use crate::connection::Connection;
use crate::connector::{Connector, ConnectorDirection, ConnectorId, Value, ValueType};
use crate::node::{Evaluation, Node, NodeId};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

/// Producer nodes of each node, keyed by consumer in graph order
pub type Dependencies = IndexMap<NodeId, IndexSet<NodeId>>;

/// A node graph
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in insertion order
    nodes: IndexMap<NodeId, Node>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
        }
    }

    /// Add a node to the graph.
    ///
    /// Any input links the node carried in from elsewhere are dropped, since
    /// they cannot refer to nodes of this graph.
    pub fn add_node(&mut self, mut node: Node) -> Result<NodeId, GraphError> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        for input in node.inputs_mut() {
            input.set_connected_to(None);
        }
        tracing::debug!(node = %id, name = %node.name, "Node added");
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Remove a node, severing every connection it takes part in first
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<Node, GraphError> {
        if !self.nodes.contains_key(&node_id) {
            return Err(GraphError::UnknownNode(node_id));
        }

        let mut severed = 0;
        for node in self.nodes.values_mut() {
            let is_removed = node.id() == node_id;
            for input in node.inputs_mut() {
                let Some(output) = input.connected_to() else {
                    continue;
                };
                if is_removed || output.node == node_id {
                    input.set_connected_to(None);
                    severed += 1;
                }
            }
        }

        let node = self
            .nodes
            .shift_remove(&node_id)
            .ok_or(GraphError::UnknownNode(node_id))?;
        tracing::debug!(node = %node_id, severed, "Node removed");
        Ok(node)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Change the display name of a node
    pub fn rename_node(
        &mut self,
        node_id: NodeId,
        name: impl Into<String>,
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::UnknownNode(node_id))?;
        node.name = name.into();
        Ok(())
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has a node with this id
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get a connector by ID
    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.nodes.get(&id.node)?.connector(id)
    }

    fn find_connector(&self, id: ConnectorId) -> Result<&Connector, GraphError> {
        let node = self
            .nodes
            .get(&id.node)
            .ok_or(GraphError::UnknownNode(id.node))?;
        node.connector(id).ok_or(GraphError::UnknownConnector(id))
    }

    /// Replace the literal of a source node
    pub fn set_value(&mut self, node_id: NodeId, value: Value) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::UnknownNode(node_id))?;
        node.set_value(value)?;
        tracing::debug!(node = %node_id, %value, "Source value set");
        Ok(())
    }

    /// Connect an output connector to an input connector.
    ///
    /// On error the graph is left untouched.
    pub fn connect(&mut self, output: ConnectorId, input: ConnectorId) -> Result<(), GraphError> {
        if let Err(err) = self.check_connection(output, input) {
            tracing::warn!(%output, %input, "Connection rejected: {err}");
            return Err(err);
        }

        let connector = self
            .nodes
            .get_mut(&input.node)
            .and_then(|node| node.input_mut(input.index))
            .ok_or(GraphError::UnknownConnector(input))?;
        connector.set_connected_to(Some(output));

        tracing::debug!(%output, %input, "Connected");
        Ok(())
    }

    /// Check whether `connect(output, input)` would succeed, without mutating
    pub fn check_connection(
        &self,
        output: ConnectorId,
        input: ConnectorId,
    ) -> Result<(), GraphError> {
        let source = self.find_connector(output)?;
        let target = self.find_connector(input)?;

        if source.direction() != ConnectorDirection::Output
            || target.direction() != ConnectorDirection::Input
        {
            return Err(RejectReason::DirectionMismatch.into());
        }
        if output.node == input.node {
            return Err(RejectReason::SelfLoop.into());
        }
        if !source.value_type().can_connect_to(&target.value_type()) {
            return Err(RejectReason::TypeMismatch.into());
        }
        if target.is_connected() {
            return Err(RejectReason::AlreadyConnected.into());
        }
        Ok(())
    }

    /// Clear the connection held by an input.
    ///
    /// Returns the output it was connected to; `Ok(None)` if it was free.
    pub fn disconnect(&mut self, input: ConnectorId) -> Result<Option<ConnectorId>, GraphError> {
        if !input.is_input() {
            return Err(RejectReason::DirectionMismatch.into());
        }
        let node = self
            .nodes
            .get_mut(&input.node)
            .ok_or(GraphError::UnknownNode(input.node))?;
        let connector = node
            .input_mut(input.index)
            .ok_or(GraphError::UnknownConnector(input))?;

        let previous = connector.connected_to();
        connector.set_connected_to(None);
        if let Some(output) = previous {
            tracing::debug!(%output, %input, "Disconnected");
        }
        Ok(previous)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.nodes
            .values()
            .flat_map(|node| node.inputs().iter())
            .filter_map(|input| {
                input
                    .connected_to()
                    .map(|output| Connection::new(output, input.id()))
            })
    }

    /// Get connections involving a node
    pub fn connections_for_node(
        &self,
        node_id: NodeId,
    ) -> impl Iterator<Item = Connection> + '_ {
        self.connections().filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections().count()
    }

    /// Inputs fed by an output connector
    pub fn consumers(&self, output: ConnectorId) -> Vec<ConnectorId> {
        self.connections()
            .filter(|c| c.from == output)
            .map(|c| c.to)
            .collect()
    }

    /// Nodes whose outputs feed any input of `node_id`
    pub fn producers(&self, node_id: NodeId) -> IndexSet<NodeId> {
        self.nodes
            .get(&node_id)
            .map(producers_of)
            .unwrap_or_default()
    }

    /// Nodes consuming any output of `node_id`
    pub fn dependents(&self, node_id: NodeId) -> IndexSet<NodeId> {
        self.connections_for_node(node_id)
            .filter(|c| c.from_node() == node_id)
            .map(|c| c.to_node())
            .collect()
    }

    /// Dependency view: every node mapped to the set of nodes it consumes.
    ///
    /// Derived from connector state on each call, so it is never stale.
    pub fn dependencies(&self) -> Dependencies {
        self.nodes
            .values()
            .map(|node| (node.id(), producers_of(node)))
            .collect()
    }

    /// Get nodes in topological order (producers before consumers).
    ///
    /// Ties are broken by insertion order, so the result is deterministic.
    /// The depth-first walk keeps its own stack, so chain depth is bounded
    /// by memory rather than by the thread's call stack.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let dependencies = self.dependencies();
        let mut visited = HashSet::with_capacity(dependencies.len());
        // Nodes on the current walk, in walk order
        let mut path: IndexSet<NodeId> = IndexSet::new();
        // (node, index of the next producer to visit)
        let mut stack: Vec<(NodeId, usize)> = Vec::new();
        let mut order = Vec::with_capacity(dependencies.len());

        for &root in dependencies.keys() {
            if visited.contains(&root) {
                continue;
            }
            path.insert(root);
            stack.push((root, 0));

            while let Some(top) = stack.last_mut() {
                let (node_id, next) = *top;
                top.1 += 1;

                let producer = dependencies
                    .get(&node_id)
                    .and_then(|producers| producers.get_index(next));
                match producer {
                    Some(&producer) => {
                        if visited.contains(&producer) {
                            continue;
                        }
                        if let Some(start) = path.get_index_of(&producer) {
                            return Err(CycleError {
                                nodes: path.iter().skip(start).copied().collect(),
                            });
                        }
                        path.insert(producer);
                        stack.push((producer, 0));
                    }
                    None => {
                        stack.pop();
                        path.pop();
                        visited.insert(node_id);
                        order.push(node_id);
                    }
                }
            }
        }

        Ok(order)
    }

    /// Value currently exposed on an output connector
    pub fn output_value(&self, output: ConnectorId) -> Option<Value> {
        if output.is_input() {
            return None;
        }
        self.nodes.get(&output.node)?.output_value(output.index)
    }

    /// Value an input would read right now through its connection
    pub fn resolve_input(&self, input: ConnectorId) -> Option<Value> {
        self.connector(input)?
            .connected_to()
            .and_then(|output| self.output_value(output))
    }

    /// Evaluate one node against the current values of its producers.
    ///
    /// Only the evaluator calls this, after every producer of the node.
    pub(crate) fn evaluate_node(&mut self, node_id: NodeId) -> Result<Evaluation, GraphError> {
        let node = self
            .nodes
            .get(&node_id)
            .ok_or(GraphError::UnknownNode(node_id))?;
        let inputs: Vec<Option<Value>> = node
            .inputs()
            .iter()
            .map(|input| {
                input
                    .connected_to()
                    .and_then(|output| self.output_value(output))
            })
            .collect();

        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::UnknownNode(node_id))?;
        Ok(node.evaluate(&inputs))
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

fn producers_of(node: &Node) -> IndexSet<NodeId> {
    node.inputs()
        .iter()
        .filter_map(Connector::connected_to)
        .map(|output| output.node)
        .collect()
}

/// Why a connection was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// The input already holds a connection
    #[error("input already connected")]
    AlreadyConnected,

    /// Connector value types differ
    #[error("value types differ")]
    TypeMismatch,

    /// Both connectors belong to the same node
    #[error("self-loop not allowed")]
    SelfLoop,

    /// Not an output-to-input pair
    #[error("connection must run from an output to an input")]
    DirectionMismatch,
}

/// Error when mutating a graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// The connection violates a wiring invariant
    #[error("Connection rejected: {reason}")]
    Rejected {
        /// Violated invariant
        #[from]
        reason: RejectReason,
    },

    /// Node not found
    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    /// Connector not found on an existing node
    #[error("Connector not found: {0}")]
    UnknownConnector(ConnectorId),

    /// A node with this id is already in the graph
    #[error("Node already in graph: {0}")]
    DuplicateNode(NodeId),

    /// Only source nodes hold a settable value
    #[error("Node is not a source: {0}")]
    NotASource(NodeId),

    /// A source's value cannot change type
    #[error("Value type mismatch: expected {expected}, found {found}")]
    ValueTypeMismatch {
        /// Type the source was created with
        expected: ValueType,
        /// Type of the rejected value
        found: ValueType,
    },
}

/// Error when graph contains a cycle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Graph contains a cycle through {} nodes", .nodes.len())]
pub struct CycleError {
    /// Nodes on the cycle, each one consuming the next
    pub nodes: Vec<NodeId>,
}
