// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node library: float/int literals, arithmetic and print nodes.

use crate::connector::ValueType;
use crate::node::{BinaryOp, NodeKind};
use crate::registry::{NodeCategory, NodeRegistry, NodeTemplate};

/// Create the registry with every built-in node template
pub fn create_builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    // ========================================================================
    // Input Nodes - Constants
    // ========================================================================

    registry.register(NodeTemplate {
        id: "float".to_string(),
        name: "Float".to_string(),
        category: NodeCategory::Input,
        description: "Constant float value".to_string(),
        kind: NodeKind::float(0.0),
    });

    registry.register(NodeTemplate {
        id: "int".to_string(),
        name: "Int".to_string(),
        category: NodeCategory::Input,
        description: "Constant integer value".to_string(),
        kind: NodeKind::int(0),
    });

    // ========================================================================
    // Math Nodes
    // ========================================================================

    for (id, op, description) in [
        ("add", BinaryOp::Add, "A + B"),
        ("subtract", BinaryOp::Subtract, "A - B"),
        ("multiply", BinaryOp::Multiply, "A * B"),
        ("min", BinaryOp::Min, "Smaller of A and B"),
        ("max", BinaryOp::Max, "Larger of A and B"),
    ] {
        registry.register(NodeTemplate {
            id: id.to_string(),
            name: op.name().to_string(),
            category: NodeCategory::Math,
            description: description.to_string(),
            kind: NodeKind::combiner(op, ValueType::Float),
        });
    }

    registry.register(NodeTemplate {
        id: "add_int".to_string(),
        name: "Add (Int)".to_string(),
        category: NodeCategory::Math,
        description: "Integer A + B, wrapping on overflow".to_string(),
        kind: NodeKind::combiner(BinaryOp::Add, ValueType::Int),
    });

    // ========================================================================
    // Output Nodes
    // ========================================================================

    registry.register(NodeTemplate {
        id: "print".to_string(),
        name: "Print".to_string(),
        category: NodeCategory::Output,
        description: "Show the incoming float".to_string(),
        kind: NodeKind::sink(ValueType::Float),
    });

    registry.register(NodeTemplate {
        id: "print_int".to_string(),
        name: "Print (Int)".to_string(),
        category: NodeCategory::Output,
        description: "Show the incoming integer".to_string(),
        kind: NodeKind::sink(ValueType::Int),
    });

    registry
}
