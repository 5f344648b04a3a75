// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of node templates the presentation layer can instantiate by id.

use crate::node::{Node, NodeKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Node template category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Value sources (literals)
    Input,
    /// Math operations
    Math,
    /// Observers (print, preview)
    Output,
    /// Custom/user-defined
    Custom,
}

/// Node template definition
#[derive(Debug, Clone)]
pub struct NodeTemplate {
    /// Unique template identifier
    pub id: String,
    /// Display name given to created nodes
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Kind (and initial state) cloned into each created node
    pub kind: NodeKind,
}

impl NodeTemplate {
    /// Instantiate a fresh node from this template
    pub fn instantiate(&self) -> Node {
        Node::new(self.kind.clone()).with_name(self.name.clone())
    }
}

/// Registry of available node templates
pub struct NodeRegistry {
    /// Registered templates by ID
    templates: IndexMap<String, NodeTemplate>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            templates: IndexMap::new(),
        }
    }

    /// Register a node template, replacing any template with the same id
    pub fn register(&mut self, template: NodeTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    /// Get a template by ID
    pub fn get(&self, id: &str) -> Option<&NodeTemplate> {
        self.templates.get(id)
    }

    /// Get all registered templates
    pub fn templates(&self) -> impl Iterator<Item = &NodeTemplate> {
        self.templates.values()
    }

    /// Get templates by category
    pub fn templates_in_category(
        &self,
        category: NodeCategory,
    ) -> impl Iterator<Item = &NodeTemplate> {
        self.templates.values().filter(move |t| t.category == category)
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether no templates are registered
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Create a node from a template ID
    pub fn create_node(&self, template_id: &str) -> Option<Node> {
        self.get(template_id).map(NodeTemplate::instantiate)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{Value, ValueType};
    use crate::node::BinaryOp;

    fn registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.register(NodeTemplate {
            id: "half".to_string(),
            name: "Half".to_string(),
            category: NodeCategory::Input,
            description: "Constant one half".to_string(),
            kind: NodeKind::float(0.5),
        });
        registry.register(NodeTemplate {
            id: "mul".to_string(),
            name: "Multiply".to_string(),
            category: NodeCategory::Math,
            description: "Multiply two floats".to_string(),
            kind: NodeKind::combiner(BinaryOp::Multiply, ValueType::Float),
        });
        registry
    }

    #[test]
    fn test_create_node() {
        let registry = registry();
        let node = registry.create_node("half").unwrap();
        assert_eq!(node.name, "Half");
        assert_eq!(node.current_output_value(), Some(Value::Float(0.5)));
        assert!(registry.create_node("missing").is_none());
    }

    #[test]
    fn test_created_nodes_are_distinct() {
        let registry = registry();
        let a = registry.create_node("mul").unwrap();
        let b = registry.create_node("mul").unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.inputs().len(), 2);
    }

    #[test]
    fn test_categories() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.templates_in_category(NodeCategory::Math).count(), 1);
        assert_eq!(registry.templates_in_category(NodeCategory::Output).count(), 0);
    }
}
