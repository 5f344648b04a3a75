// SPDX-License-Identifier: MIT OR Apache-2.0
//! Builds and runs the two-sources, one-combiner, one-print graph.

use crate::config::AppConfig;
use nodeflow_graph::{
    create_builtin_registry, BinaryOp, ConnectorId, EvaluationError, Evaluator, Graph, GraphError,
    NodeId, NodeRegistry, RunReport, Value,
};
use thiserror::Error;

/// Demo errors
#[derive(Debug, Error)]
pub enum DemoError {
    /// The registry has no template with this id
    #[error("Unknown node template: {0}")]
    UnknownTemplate(String),

    /// Graph mutation failed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Evaluation failed
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Graph built by [`build_graph`] and the ids of its nodes
pub struct DemoGraph {
    /// The graph
    pub graph: Graph,
    /// First source
    pub source_a: NodeId,
    /// Second source
    pub source_b: NodeId,
    /// Combiner fed by both sources
    pub combiner: NodeId,
    /// Print node observing the combiner
    pub sink: NodeId,
}

fn template_id(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add",
        BinaryOp::Subtract => "subtract",
        BinaryOp::Multiply => "multiply",
        BinaryOp::Min => "min",
        BinaryOp::Max => "max",
    }
}

fn add_from_template(
    graph: &mut Graph,
    registry: &NodeRegistry,
    template: &str,
) -> Result<NodeId, DemoError> {
    let node = registry
        .create_node(template)
        .ok_or_else(|| DemoError::UnknownTemplate(template.to_string()))?;
    Ok(graph.add_node(node)?)
}

/// Build `A (op) B -> Print` from the built-in registry
pub fn build_graph(config: &AppConfig) -> Result<DemoGraph, DemoError> {
    let registry = create_builtin_registry();
    let mut graph = Graph::new("demo");

    let source_a = add_from_template(&mut graph, &registry, "float")?;
    let source_b = add_from_template(&mut graph, &registry, "float")?;
    let combiner = add_from_template(&mut graph, &registry, template_id(config.operation))?;
    let sink = add_from_template(&mut graph, &registry, "print")?;

    graph.set_value(source_a, Value::Float(config.source_a))?;
    graph.set_value(source_b, Value::Float(config.source_b))?;
    graph.connect(ConnectorId::output(source_a, 0), ConnectorId::input(combiner, 0))?;
    graph.connect(ConnectorId::output(source_b, 0), ConnectorId::input(combiner, 1))?;
    graph.connect(ConnectorId::output(combiner, 0), ConnectorId::input(sink, 0))?;

    Ok(DemoGraph {
        graph,
        source_a,
        source_b,
        combiner,
        sink,
    })
}

/// Build the demo graph and run it once
pub fn run(config: &AppConfig) -> Result<(DemoGraph, RunReport), DemoError> {
    let mut demo = build_graph(config)?;
    let report = Evaluator::new().run(&mut demo.graph)?;
    Ok((demo, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeflow_graph::Node;

    #[test]
    fn test_default_demo() {
        let (demo, report) = run(&AppConfig::default()).unwrap();
        assert_eq!(report.observation(demo.sink), Some(Value::Float(5.0)));
        let sink = demo.graph.node(demo.sink).unwrap();
        assert_eq!(sink.display_text(), "Result: 5");
        assert_eq!(demo.graph.connection_count(), 3);
    }

    #[test]
    fn test_configured_operation() {
        let config = AppConfig {
            operation: BinaryOp::Subtract,
            source_a: 1.0,
            source_b: 4.0,
            ..AppConfig::default()
        };
        let (demo, _) = run(&config).unwrap();
        let combiner = demo.graph.node(demo.combiner).unwrap();
        assert_eq!(combiner.name, "Subtract");
        assert_eq!(combiner.current_output_value(), Some(Value::Float(-3.0)));
        assert_eq!(
            demo.graph.node(demo.source_b).and_then(Node::current_output_value),
            Some(Value::Float(4.0))
        );
    }
}
