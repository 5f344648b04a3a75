// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph evaluation and execution.
//!
//! A run is all-or-nothing with respect to ordering: the evaluation order is
//! derived (and a cycle rejected) before any node is touched. After that each
//! node is evaluated exactly once, strictly after every node feeding it.
//! Values travel through connector links only; the evaluator just sequences
//! per-node evaluation calls on the graph.

use crate::connector::Value;
use crate::graph::{CycleError, Graph};
use crate::node::{Evaluation, NodeId};
use std::collections::HashSet;

/// A value a sink observed during a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Observing sink
    pub node: NodeId,
    /// Observed value
    pub value: Value,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Each evaluated node with what its evaluation did, in evaluation order
    pub steps: Vec<(NodeId, Evaluation)>,
    /// Sink observations made during this run, in evaluation order
    pub observations: Vec<Observation>,
}

impl RunReport {
    /// Node evaluation order
    pub fn order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.steps.iter().map(|(id, _)| *id)
    }

    /// Number of nodes whose outputs were recomputed
    pub fn updated_count(&self) -> usize {
        self.count(Evaluation::Updated)
    }

    /// Nodes that kept their previous values because an input was unresolved
    pub fn skipped(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.steps
            .iter()
            .filter(|(_, e)| *e == Evaluation::Skipped)
            .map(|(id, _)| *id)
    }

    /// Value observed by `node` during this run, if it observed one
    pub fn observation(&self, node: NodeId) -> Option<Value> {
        self.observations
            .iter()
            .find(|o| o.node == node)
            .map(|o| o.value)
    }

    fn count(&self, evaluation: Evaluation) -> usize {
        self.steps.iter().filter(|(_, e)| *e == evaluation).count()
    }
}

/// Drives node evaluation over a graph in dependency order.
///
/// Stateless: every run derives its order from the graph as it is at that
/// moment, so edits between runs are picked up.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    /// Create an evaluator
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every node in a topological order of the graph
    pub fn run(&self, graph: &mut Graph) -> Result<RunReport, EvaluationError> {
        let order = graph.topological_order()?;
        self.evaluate_in_order(graph, &order)
    }

    /// Evaluate every node in a caller-supplied order.
    ///
    /// The order must list each node of the graph exactly once, with every
    /// producer ahead of its consumers. Nothing is evaluated if it does not.
    pub fn run_with_order(
        &self,
        graph: &mut Graph,
        order: &[NodeId],
    ) -> Result<RunReport, EvaluationError> {
        graph.topological_order()?;
        validate_order(graph, order)?;
        self.evaluate_in_order(graph, order)
    }

    fn evaluate_in_order(
        &self,
        graph: &mut Graph,
        order: &[NodeId],
    ) -> Result<RunReport, EvaluationError> {
        let span = tracing::debug_span!("run", graph = %graph.name, nodes = order.len());
        let _enter = span.enter();

        let mut report = RunReport::default();
        for &node_id in order {
            let evaluation = graph
                .evaluate_node(node_id)
                .map_err(|_| EvaluationError::UnknownNode(node_id))?;
            tracing::trace!(node = %node_id, ?evaluation, "Node evaluated");

            if evaluation == Evaluation::Updated {
                if let Some(node) = graph.node(node_id) {
                    if let Some(value) = node.observation() {
                        tracing::info!(
                            node = %node_id,
                            name = %node.name,
                            %value,
                            "Sink observed value"
                        );
                        report.observations.push(Observation {
                            node: node_id,
                            value,
                        });
                    }
                }
            }
            report.steps.push((node_id, evaluation));
        }

        tracing::debug!(
            updated = report.updated_count(),
            skipped = report.skipped().count(),
            "Run finished"
        );
        Ok(report)
    }
}

fn validate_order(graph: &Graph, order: &[NodeId]) -> Result<(), EvaluationError> {
    if order.len() != graph.node_count() {
        return Err(EvaluationError::InvalidOrder(format!(
            "order lists {} nodes, graph has {}",
            order.len(),
            graph.node_count()
        )));
    }

    let mut seen = HashSet::with_capacity(order.len());
    for &node_id in order {
        if !graph.contains_node(node_id) {
            return Err(EvaluationError::UnknownNode(node_id));
        }
        if !seen.insert(node_id) {
            return Err(EvaluationError::InvalidOrder(format!(
                "node {node_id} listed twice"
            )));
        }
        if let Some(producer) = graph
            .producers(node_id)
            .into_iter()
            .find(|producer| !seen.contains(producer))
        {
            return Err(EvaluationError::InvalidOrder(format!(
                "node {node_id} listed before its producer {producer}"
            )));
        }
    }
    Ok(())
}

/// Error during evaluation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// Graph contains a cycle; no node was evaluated
    #[error("Graph contains a cycle through {} nodes", .nodes.len())]
    CyclicGraph {
        /// Nodes on the cycle
        nodes: Vec<NodeId>,
    },

    /// Node not found
    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    /// A caller-supplied order is not a topological order of the graph
    #[error("Invalid evaluation order: {0}")]
    InvalidOrder(String),
}

impl From<CycleError> for EvaluationError {
    fn from(err: CycleError) -> Self {
        Self::CyclicGraph { nodes: err.nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{ConnectorId, ValueType};
    use crate::node::{BinaryOp, Node, NodeKind};

    fn add(graph: &mut Graph, kind: NodeKind) -> NodeId {
        graph.add_node(Node::new(kind)).unwrap()
    }

    fn wire(graph: &mut Graph, from: NodeId, to: NodeId, input: usize) {
        graph
            .connect(ConnectorId::output(from, 0), ConnectorId::input(to, input))
            .unwrap();
    }

    fn combiner(op: BinaryOp) -> NodeKind {
        NodeKind::combiner(op, ValueType::Float)
    }

    fn value(graph: &Graph, node: NodeId) -> Option<Value> {
        graph.node(node).and_then(Node::current_output_value)
    }

    /// A = 2, B = 3, C = A + B, D prints C
    fn reference_graph() -> (Graph, [NodeId; 4]) {
        let mut graph = Graph::new("reference");
        let a = add(&mut graph, NodeKind::float(2.0));
        let b = add(&mut graph, NodeKind::float(3.0));
        let c = add(&mut graph, combiner(BinaryOp::Add));
        let d = add(&mut graph, NodeKind::sink(ValueType::Float));
        wire(&mut graph, a, c, 0);
        wire(&mut graph, b, c, 1);
        wire(&mut graph, c, d, 0);
        (graph, [a, b, c, d])
    }

    #[test]
    fn test_reference_scenario() {
        let (mut graph, [_, _, c, d]) = reference_graph();
        let report = Evaluator::new().run(&mut graph).unwrap();

        assert_eq!(value(&graph, c), Some(Value::Float(5.0)));
        assert_eq!(value(&graph, d), Some(Value::Float(5.0)));
        assert_eq!(report.observation(d), Some(Value::Float(5.0)));
        assert_eq!(graph.node(d).unwrap().display_text(), "Result: 5");
        assert_eq!(report.updated_count(), 2);
        assert_eq!(report.skipped().count(), 0);
    }

    #[test]
    fn test_stale_value_after_disconnect() {
        let (mut graph, [_, _, c, d]) = reference_graph();
        let evaluator = Evaluator::new();
        evaluator.run(&mut graph).unwrap();

        graph.disconnect(ConnectorId::input(c, 0)).unwrap();
        let report = evaluator.run(&mut graph).unwrap();

        assert_eq!(value(&graph, c), Some(Value::Float(5.0)));
        assert_eq!(value(&graph, d), Some(Value::Float(5.0)));
        assert_eq!(report.skipped().collect::<Vec<_>>(), vec![c]);
    }

    #[test]
    fn test_never_evaluated_combiner_has_no_value() {
        let mut graph = Graph::default();
        let a = add(&mut graph, NodeKind::float(2.0));
        let c = add(&mut graph, combiner(BinaryOp::Add));
        let e = add(&mut graph, combiner(BinaryOp::Multiply));
        let f = add(&mut graph, NodeKind::float(4.0));
        let d = add(&mut graph, NodeKind::sink(ValueType::Float));
        // C has only one input wired, so E cannot resolve through it either
        wire(&mut graph, a, c, 0);
        wire(&mut graph, c, e, 0);
        wire(&mut graph, f, e, 1);
        wire(&mut graph, e, d, 0);

        let report = Evaluator::new().run(&mut graph).unwrap();
        assert_eq!(value(&graph, c), None);
        assert_eq!(value(&graph, e), None);
        assert_eq!(value(&graph, d), None);
        assert!(report.observations.is_empty());
        assert_eq!(report.skipped().count(), 3);

        // Completing the chain resolves it transitively
        wire(&mut graph, f, c, 1);
        Evaluator::new().run(&mut graph).unwrap();
        assert_eq!(value(&graph, c), Some(Value::Float(6.0)));
        assert_eq!(value(&graph, e), Some(Value::Float(24.0)));
        assert_eq!(value(&graph, d), Some(Value::Float(24.0)));
    }

    #[test]
    fn test_cycle_fails_without_side_effects() {
        let (mut graph, [_, b, c, d]) = reference_graph();
        let evaluator = Evaluator::new();
        evaluator.run(&mut graph).unwrap();

        // C -> E -> C through a second combiner
        let e = add(&mut graph, combiner(BinaryOp::Multiply));
        wire(&mut graph, c, e, 0);
        graph.disconnect(ConnectorId::input(c, 1)).unwrap();
        wire(&mut graph, e, c, 1);
        wire(&mut graph, b, e, 1);
        graph.set_value(b, Value::Float(10.0)).unwrap();

        let before = graph.clone();
        let err = evaluator.run(&mut graph).unwrap_err();
        match err {
            EvaluationError::CyclicGraph { nodes } => {
                assert!(nodes.contains(&c));
                assert!(nodes.contains(&e));
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
        assert_eq!(graph, before);
        assert_eq!(value(&graph, c), Some(Value::Float(5.0)));
        assert_eq!(value(&graph, d), Some(Value::Float(5.0)));

        let order: Vec<NodeId> = graph.node_ids().collect();
        assert!(matches!(
            evaluator.run_with_order(&mut graph, &order),
            Err(EvaluationError::CyclicGraph { .. })
        ));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_longer_cycle_fails_without_side_effects() {
        let (mut graph, [_, b, c, d]) = reference_graph();
        let evaluator = Evaluator::new();
        evaluator.run(&mut graph).unwrap();

        // A -> C -> E -> F -> C
        let e = add(&mut graph, combiner(BinaryOp::Add));
        let f = add(&mut graph, combiner(BinaryOp::Multiply));
        wire(&mut graph, c, e, 0);
        wire(&mut graph, b, e, 1);
        wire(&mut graph, e, f, 0);
        wire(&mut graph, b, f, 1);
        graph.disconnect(ConnectorId::input(c, 1)).unwrap();
        wire(&mut graph, f, c, 1);
        graph.set_value(b, Value::Float(10.0)).unwrap();

        let before = graph.clone();
        match evaluator.run(&mut graph) {
            Err(EvaluationError::CyclicGraph { nodes }) => {
                assert_eq!(nodes.len(), 3);
                for node in [c, e, f] {
                    assert!(nodes.contains(&node));
                }
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
        assert_eq!(graph, before);
        assert_eq!(value(&graph, c), Some(Value::Float(5.0)));
        assert_eq!(value(&graph, d), Some(Value::Float(5.0)));
        assert_eq!(value(&graph, e), None);
        assert_eq!(value(&graph, f), None);
    }

    #[test]
    fn test_deep_chain_inserted_consumer_first() {
        const DEPTH: usize = 100_000;

        let source = Node::new(NodeKind::float(1.0));
        let zero = Node::new(NodeKind::float(0.0));
        let adders: Vec<Node> = (0..DEPTH)
            .map(|_| Node::new(combiner(BinaryOp::Add)))
            .collect();
        let sink = Node::new(NodeKind::sink(ValueType::Float));
        let (source_id, zero_id, sink_id) = (source.id(), zero.id(), sink.id());
        let adder_ids: Vec<NodeId> = adders.iter().map(Node::id).collect();

        let mut graph = Graph::new("deep");
        graph.add_node(sink).unwrap();
        for adder in adders.into_iter().rev() {
            graph.add_node(adder).unwrap();
        }
        graph.add_node(zero).unwrap();
        graph.add_node(source).unwrap();

        let mut upstream = source_id;
        for &adder in &adder_ids {
            wire(&mut graph, upstream, adder, 0);
            wire(&mut graph, zero_id, adder, 1);
            upstream = adder;
        }
        wire(&mut graph, upstream, sink_id, 0);

        let report = Evaluator::new().run(&mut graph).unwrap();
        assert_eq!(report.steps.len(), DEPTH + 3);
        assert_eq!(report.skipped().count(), 0);
        assert_eq!(report.observation(sink_id), Some(Value::Float(1.0)));
    }

    #[test]
    fn test_direct_self_wiring_is_rejected_at_connect() {
        let (mut graph, [_, _, c, _]) = reference_graph();
        graph.disconnect(ConnectorId::input(c, 1)).unwrap();
        assert!(graph
            .connect(ConnectorId::output(c, 0), ConnectorId::input(c, 1))
            .is_err());
        assert!(Evaluator::new().run(&mut graph).is_ok());
    }

    #[test]
    fn test_each_node_once_after_producers() {
        // Layered graph: sources, then combiners reading from earlier layers
        let mut graph = Graph::default();
        let mut nodes = Vec::new();
        for i in 0..4 {
            nodes.push(add(&mut graph, NodeKind::float(i as f32)));
        }
        for i in 0..8 {
            let c = add(&mut graph, combiner(BinaryOp::Add));
            let len = nodes.len();
            wire(&mut graph, nodes[(i * 7) % len], c, 0);
            wire(&mut graph, nodes[(i * 3 + 1) % len], c, 1);
            nodes.push(c);
        }
        let sink = add(&mut graph, NodeKind::sink(ValueType::Float));
        wire(&mut graph, *nodes.last().unwrap(), sink, 0);

        let report = Evaluator::new().run(&mut graph).unwrap();
        let order: Vec<NodeId> = report.order().collect();
        assert_eq!(order.len(), graph.node_count());
        let unique: HashSet<NodeId> = order.iter().copied().collect();
        assert_eq!(unique.len(), order.len());

        let pos = |id: &NodeId| order.iter().position(|n| n == id).unwrap();
        for connection in graph.connections() {
            assert!(pos(&connection.from_node()) < pos(&connection.to_node()));
        }
        assert!(report.skipped().next().is_none());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let (mut graph, _) = reference_graph();
        let evaluator = Evaluator::new();
        let first = evaluator.run(&mut graph).unwrap();
        let after_first = graph.clone();
        let second = evaluator.run(&mut graph).unwrap();
        assert_eq!(graph, after_first);
        assert_eq!(first, second);
    }

    #[test]
    fn test_edits_between_runs_are_picked_up() {
        let (mut graph, [a, _, c, d]) = reference_graph();
        let evaluator = Evaluator::new();
        evaluator.run(&mut graph).unwrap();

        graph.set_value(a, Value::Float(10.0)).unwrap();
        evaluator.run(&mut graph).unwrap();
        assert_eq!(value(&graph, d), Some(Value::Float(13.0)));

        graph.remove_node(c).unwrap();
        let report = evaluator.run(&mut graph).unwrap();
        assert_eq!(report.steps.len(), 3);
        assert_eq!(value(&graph, d), Some(Value::Float(13.0)));
    }

    fn permutations(items: &[NodeId]) -> Vec<Vec<NodeId>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut result = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head);
                result.push(tail);
            }
        }
        result
    }

    #[test]
    fn test_order_independence() {
        // (A + B) and (E * F) feed G = left - right, observed by P
        let mut graph = Graph::default();
        let a = add(&mut graph, NodeKind::float(2.0));
        let b = add(&mut graph, NodeKind::float(3.0));
        let c = add(&mut graph, combiner(BinaryOp::Add));
        let e = add(&mut graph, NodeKind::float(4.0));
        let f = add(&mut graph, NodeKind::float(0.5));
        let h = add(&mut graph, combiner(BinaryOp::Multiply));
        let g = add(&mut graph, combiner(BinaryOp::Subtract));
        let p = add(&mut graph, NodeKind::sink(ValueType::Float));
        wire(&mut graph, a, c, 0);
        wire(&mut graph, b, c, 1);
        wire(&mut graph, e, h, 0);
        wire(&mut graph, f, h, 1);
        wire(&mut graph, c, g, 0);
        wire(&mut graph, h, g, 1);
        wire(&mut graph, g, p, 0);

        let evaluator = Evaluator::new();
        let mut valid_orders = 0;
        for mut order in permutations(&[a, b, c, e, f, h]) {
            order.extend([g, p]);
            let mut candidate = graph.clone();
            match evaluator.run_with_order(&mut candidate, &order) {
                Ok(report) => {
                    valid_orders += 1;
                    assert_eq!(report.observation(p), Some(Value::Float(3.0)));
                    assert_eq!(value(&candidate, g), Some(Value::Float(3.0)));
                }
                Err(EvaluationError::InvalidOrder(_)) => assert_eq!(candidate, graph),
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
        // 6! / (3 * 3) interleavings of two independent three-node chains
        assert_eq!(valid_orders, 80);
    }

    #[test]
    fn test_invalid_orders() {
        let (mut graph, [a, b, c, d]) = reference_graph();
        let evaluator = Evaluator::new();
        let before = graph.clone();

        let cases: [&[NodeId]; 3] = [&[a, b, c], &[a, a, c, d], &[a, c, b, d]];
        for order in cases {
            assert!(matches!(
                evaluator.run_with_order(&mut graph, order),
                Err(EvaluationError::InvalidOrder(_))
            ));
        }
        let ghost = NodeId::new();
        assert_eq!(
            evaluator.run_with_order(&mut graph, &[a, b, c, ghost]),
            Err(EvaluationError::UnknownNode(ghost))
        );
        assert_eq!(graph, before);

        evaluator.run_with_order(&mut graph, &[b, a, c, d]).unwrap();
        assert_eq!(value(&graph, d), Some(Value::Float(5.0)));
    }

    #[test]
    fn test_integer_pipeline() {
        let mut graph = Graph::default();
        let a = add(&mut graph, NodeKind::int(i32::MAX));
        let b = add(&mut graph, NodeKind::int(1));
        let c = add(&mut graph, NodeKind::combiner(BinaryOp::Add, ValueType::Int));
        let d = add(&mut graph, NodeKind::sink(ValueType::Int));
        wire(&mut graph, a, c, 0);
        wire(&mut graph, b, c, 1);
        wire(&mut graph, c, d, 0);

        Evaluator::new().run(&mut graph).unwrap();
        assert_eq!(value(&graph, d), Some(Value::Int(i32::MIN)));
    }
}
