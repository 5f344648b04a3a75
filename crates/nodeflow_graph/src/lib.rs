// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dataflow node graph core for the `nodeflow` editor.
//!
//! This crate holds everything about a node graph except how it is drawn:
//! - Typed input/output connectors
//! - Source, combiner and sink nodes
//! - Connection validation
//! - Topological evaluation
//!
//! ## Architecture
//!
//! A [`Graph`] owns its [`Node`]s. Each node owns its [`Connector`]s, and an
//! input connector names the output feeding it by [`ConnectorId`] rather than
//! by reference, so links are resolved through the graph. The [`Evaluator`]
//! derives a dependency order from those links and evaluates each node once
//! per run. A presentation layer drives the crate through
//! [`NodeRegistry::create_node`], [`Graph::connect`] and [`Evaluator::run`],
//! and reads results back with [`Node::current_output_value`].

pub mod connector;
pub mod node;
pub mod registry;
pub mod library;
pub mod connection;
pub mod graph;
pub mod evaluation;

pub use connector::{Connector, ConnectorDirection, ConnectorId, Value, ValueType};
pub use node::{BinaryOp, Evaluation, Node, NodeId, NodeKind};
pub use registry::{NodeCategory, NodeRegistry, NodeTemplate};
pub use library::create_builtin_registry;
pub use connection::Connection;
pub use graph::{CycleError, Dependencies, Graph, GraphError, RejectReason};
pub use evaluation::{EvaluationError, Evaluator, Observation, RunReport};
