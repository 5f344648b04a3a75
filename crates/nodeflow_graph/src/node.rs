// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.
//!
//! Node behaviour is a closed sum type, [`NodeKind`]. Every variant goes
//! through the same [`Node::evaluate`] entry point, so the evaluator never has
//! to know which kind of node it is driving.

use crate::connector::{Connector, ConnectorId, Value, ValueType};
use crate::graph::GraphError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Binary operation applied by a combiner node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `a + b`
    Add,
    /// `a - b`
    Subtract,
    /// `a * b`
    Multiply,
    /// Smaller of `a` and `b`
    Min,
    /// Larger of `a` and `b`
    Max,
}

impl BinaryOp {
    /// Display name of the operation
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Subtract => "Subtract",
            Self::Multiply => "Multiply",
            Self::Min => "Min",
            Self::Max => "Max",
        }
    }

    /// Apply the operation to two values of the same type.
    ///
    /// Returns `None` when the operand types differ. Integer arithmetic wraps.
    pub fn apply(&self, a: Value, b: Value) -> Option<Value> {
        match (a, b) {
            (Value::Float(a), Value::Float(b)) => Some(Value::Float(match self {
                Self::Add => a + b,
                Self::Subtract => a - b,
                Self::Multiply => a * b,
                Self::Min => a.min(b),
                Self::Max => a.max(b),
            })),
            (Value::Int(a), Value::Int(b)) => Some(Value::Int(match self {
                Self::Add => a.wrapping_add(b),
                Self::Subtract => a.wrapping_sub(b),
                Self::Multiply => a.wrapping_mul(b),
                Self::Min => a.min(b),
                Self::Max => a.max(b),
            })),
            _ => None,
        }
    }
}

/// Kind of node, together with the state it needs to compute its outputs
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Value origin: no inputs, one output holding a settable literal
    Source {
        /// Current literal
        value: Value,
    },
    /// Binary computation: two inputs, one output
    Combiner {
        /// Operation applied to the two inputs
        op: BinaryOp,
        /// Type of both inputs and the output
        value_type: ValueType,
        /// Last computed result; `None` until first successful evaluation
        result: Option<Value>,
    },
    /// Terminal observation: one input, no outputs
    Sink {
        /// Type of the observed input
        value_type: ValueType,
        /// Last observed value; `None` until first successful evaluation
        observed: Option<Value>,
    },
}

impl NodeKind {
    /// A source holding `value`
    pub fn source(value: Value) -> Self {
        Self::Source { value }
    }

    /// A float source
    pub fn float(value: f32) -> Self {
        Self::source(Value::Float(value))
    }

    /// An integer source
    pub fn int(value: i32) -> Self {
        Self::source(Value::Int(value))
    }

    /// A combiner applying `op` to two inputs of `value_type`
    pub fn combiner(op: BinaryOp, value_type: ValueType) -> Self {
        Self::Combiner {
            op,
            value_type,
            result: None,
        }
    }

    /// A sink observing one input of `value_type`
    pub fn sink(value_type: ValueType) -> Self {
        Self::Sink {
            value_type,
            observed: None,
        }
    }

    /// Default display name for this kind
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::Source {
                value: Value::Float(_),
            } => "Float",
            Self::Source {
                value: Value::Int(_),
            } => "Int",
            Self::Combiner { op, .. } => op.name(),
            Self::Sink { .. } => "Print",
        }
    }
}

/// What a single call to [`Node::evaluate`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Nothing to compute, outputs were already current (sources)
    Current,
    /// Outputs or observation were recomputed from resolved inputs
    Updated,
    /// A required input was unresolved; previous values were kept
    Skipped,
}

/// A node instance in the graph
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    /// Display name (can be customized)
    pub name: String,
    kind: NodeKind,
    inputs: Vec<Connector>,
    outputs: Vec<Connector>,
}

impl Node {
    /// Create a node of `kind` with its connectors laid out for that kind
    pub fn new(kind: NodeKind) -> Self {
        let id = NodeId::new();
        let (inputs, outputs) = match &kind {
            NodeKind::Source { value } => (
                Vec::new(),
                vec![Connector::new(
                    ConnectorId::output(id, 0),
                    "Value",
                    value.value_type(),
                )],
            ),
            NodeKind::Combiner { value_type, .. } => (
                vec![
                    Connector::new(ConnectorId::input(id, 0), "A", *value_type),
                    Connector::new(ConnectorId::input(id, 1), "B", *value_type),
                ],
                vec![Connector::new(
                    ConnectorId::output(id, 0),
                    "Result",
                    *value_type,
                )],
            ),
            NodeKind::Sink { value_type, .. } => (
                vec![Connector::new(ConnectorId::input(id, 0), "Value", *value_type)],
                Vec::new(),
            ),
        };

        Self {
            id,
            name: kind.default_name().to_string(),
            kind,
            inputs,
            outputs,
        }
    }

    /// Unique instance ID, fixed at construction
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Node kind and its internal state
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Input connectors in position order
    pub fn inputs(&self) -> &[Connector] {
        &self.inputs
    }

    /// Output connectors in position order
    pub fn outputs(&self) -> &[Connector] {
        &self.outputs
    }

    /// Get an input connector by index
    pub fn input(&self, index: usize) -> Option<&Connector> {
        self.inputs.get(index)
    }

    /// Get an output connector by index
    pub fn output(&self, index: usize) -> Option<&Connector> {
        self.outputs.get(index)
    }

    /// Get a connector by ID, if it belongs to this node
    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        if id.node != self.id {
            return None;
        }
        if id.is_input() {
            self.inputs.get(id.index)
        } else {
            self.outputs.get(id.index)
        }
    }

    pub(crate) fn input_mut(&mut self, index: usize) -> Option<&mut Connector> {
        self.inputs.get_mut(index)
    }

    pub(crate) fn inputs_mut(&mut self) -> impl Iterator<Item = &mut Connector> {
        self.inputs.iter_mut()
    }

    /// Get all connectors
    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Value currently exposed on output `index`
    pub fn output_value(&self, index: usize) -> Option<Value> {
        match (&self.kind, index) {
            (NodeKind::Source { value }, 0) => Some(*value),
            (NodeKind::Combiner { result, .. }, 0) => *result,
            _ => None,
        }
    }

    /// The value this node currently shows: a source's literal, a combiner's
    /// result or a sink's last observation
    pub fn current_output_value(&self) -> Option<Value> {
        match &self.kind {
            NodeKind::Source { value } => Some(*value),
            NodeKind::Combiner { result, .. } => *result,
            NodeKind::Sink { observed, .. } => *observed,
        }
    }

    /// Last value observed by a sink; `None` for other kinds
    pub fn observation(&self) -> Option<Value> {
        match &self.kind {
            NodeKind::Sink { observed, .. } => *observed,
            _ => None,
        }
    }

    /// Text a presentation layer can show inside the node body
    pub fn display_text(&self) -> String {
        match (&self.kind, self.current_output_value()) {
            (NodeKind::Sink { .. }, Some(value)) => format!("Result: {value}"),
            (NodeKind::Sink { .. }, None) => "Result: -".to_string(),
            (_, Some(value)) => value.to_string(),
            (_, None) => "-".to_string(),
        }
    }

    /// Replace a source's literal.
    ///
    /// The new value must keep the source's type, since connections were
    /// type-checked against it.
    pub fn set_value(&mut self, new_value: Value) -> Result<(), GraphError> {
        let NodeKind::Source { value } = &mut self.kind else {
            return Err(GraphError::NotASource(self.id));
        };
        if value.value_type() != new_value.value_type() {
            return Err(GraphError::ValueTypeMismatch {
                expected: value.value_type(),
                found: new_value.value_type(),
            });
        }
        *value = new_value;
        Ok(())
    }

    /// Recompute outputs from the resolved upstream value of each input.
    ///
    /// `inputs[i]` is the value feeding input `i`, or `None` when that input
    /// is unconnected or its producer has nothing yet. A node missing a
    /// required value keeps its previous output.
    ///
    /// # Panics
    ///
    /// Panics if a resolved value's type differs from its connector's type.
    /// Connect-time type checks make that unreachable unless the graph is
    /// internally inconsistent.
    pub(crate) fn evaluate(&mut self, inputs: &[Option<Value>]) -> Evaluation {
        assert_eq!(
            inputs.len(),
            self.inputs.len(),
            "node {} evaluated with {} inputs, expected {}",
            self.id,
            inputs.len(),
            self.inputs.len()
        );
        for (connector, value) in self.inputs.iter().zip(inputs) {
            if let Some(value) = value {
                assert_eq!(
                    value.value_type(),
                    connector.value_type(),
                    "inconsistent graph: {} received {} but accepts {}",
                    connector.id(),
                    value.value_type(),
                    connector.value_type()
                );
            }
        }

        match &mut self.kind {
            NodeKind::Source { .. } => Evaluation::Current,
            NodeKind::Combiner { op, result, .. } => match inputs {
                [Some(a), Some(b)] => match op.apply(*a, *b) {
                    Some(value) => {
                        *result = Some(value);
                        Evaluation::Updated
                    }
                    None => Evaluation::Skipped,
                },
                _ => Evaluation::Skipped,
            },
            NodeKind::Sink { observed, .. } => match inputs {
                [Some(value)] => {
                    *observed = Some(*value);
                    Evaluation::Updated
                }
                _ => Evaluation::Skipped,
            },
        }
    }
}
