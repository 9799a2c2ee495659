//! `roxmltree`-backed document

use std::fmt;

use prefill_core::{Bindings, PathEvaluator};
use roxmltree::{Document, Node, NodeId};

use super::path::{
    local_name, parse_path, Comparison, Condition, NodeTest, Operand, Predicate, Step,
};
use crate::error::Result;

/// Parsed XML document navigated with the dialect in [`super::path`]
pub struct XmlDocument<'input> {
    doc: Document<'input>,
}

impl<'input> XmlDocument<'input> {
    /// Parse XML text. The document borrows the input.
    pub fn parse(text: &'input str) -> Result<Self> {
        let doc = Document::parse(text)?;
        Ok(Self { doc })
    }

    /// Local name of the root element
    pub fn root_name(&self) -> &str {
        self.doc.root_element().tag_name().name()
    }

    /// Local name of an element, if `node` is one
    pub fn node_name(&self, node: NodeId) -> Option<&str> {
        self.doc
            .get_node(node)
            .filter(|n| n.is_element())
            .map(|n| n.tag_name().name())
    }

    fn select(&self, node: NodeId, path: &str, bindings: &Bindings) -> Vec<NodeId> {
        let parsed = match parse_path(path) {
            Ok(parsed) => parsed,
            Err(message) => {
                tracing::warn!("Unsupported path '{}': {}", path, message);
                return vec![];
            }
        };

        let start = if parsed.absolute {
            if parsed.steps.is_empty() {
                return vec![self.doc.root_element().id()];
            }
            self.doc.root()
        } else {
            match self.doc.get_node(node) {
                Some(n) => n,
                None => return vec![],
            }
        };

        self.walk(vec![start], &parsed.steps, bindings)
            .into_iter()
            .map(|n| n.id())
            .collect()
    }

    fn walk<'a>(
        &'a self,
        start: Vec<Node<'a, 'input>>,
        steps: &[Step],
        bindings: &Bindings,
    ) -> Vec<Node<'a, 'input>> {
        let mut current = start;

        for step in steps {
            let mut next: Vec<Node<'a, 'input>> = Vec::new();
            for context in &current {
                let mut candidates = axis(*context, step);
                for predicate in &step.predicates {
                    candidates = self.filter(candidates, predicate, bindings);
                }
                for candidate in candidates {
                    if !next.contains(&candidate) {
                        next.push(candidate);
                    }
                }
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }

        current
    }

    fn filter<'a>(
        &'a self,
        candidates: Vec<Node<'a, 'input>>,
        predicate: &Predicate,
        bindings: &Bindings,
    ) -> Vec<Node<'a, 'input>> {
        match predicate {
            Predicate::Position(position) => candidates
                .into_iter()
                .nth(position - 1)
                .into_iter()
                .collect(),
            Predicate::Conditions(conditions) => candidates
                .into_iter()
                .filter(|candidate| {
                    conditions
                        .iter()
                        .all(|condition| self.holds(*candidate, condition, bindings))
                })
                .collect(),
        }
    }

    fn holds<'a>(
        &'a self,
        candidate: Node<'a, 'input>,
        condition: &Condition,
        bindings: &Bindings,
    ) -> bool {
        let nodes = self.walk(vec![candidate], &condition.steps, bindings);

        let attribute = match &condition.attribute {
            Some(attribute) => attribute,
            None => return !nodes.is_empty(),
        };

        let (comparison, operand) = match &condition.comparison {
            Some(c) => c,
            None => return nodes.iter().any(|n| attribute_value(*n, attribute).is_some()),
        };

        let expected = match operand {
            Operand::Literal(value) => value.as_str(),
            Operand::Variable(name) => match bindings.get(name) {
                Some(value) => value.as_str(),
                None => {
                    tracing::debug!("Unbound path variable ${}", name);
                    return false;
                }
            },
        };

        nodes.iter().any(|n| match attribute_value(*n, attribute) {
            Some(actual) => match comparison {
                Comparison::Eq => actual == expected,
                Comparison::Ne => actual != expected,
            },
            None => false,
        })
    }
}

impl fmt::Debug for XmlDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlDocument")
            .field("root", &self.root_name())
            .finish()
    }
}

fn axis<'a, 'input>(context: Node<'a, 'input>, step: &Step) -> Vec<Node<'a, 'input>> {
    match &step.test {
        NodeTest::SelfNode if !step.descendant => vec![context],
        NodeTest::Parent if !step.descendant => context.parent_element().into_iter().collect(),
        _ => {
            let elements: Box<dyn Iterator<Item = Node<'a, 'input>>> = if step.descendant {
                Box::new(context.descendants().skip(1).filter(|n| n.is_element()))
            } else {
                Box::new(context.children().filter(|n| n.is_element()))
            };
            match &step.test {
                NodeTest::Name(name) => elements
                    .filter(|n| n.tag_name().name() == name.as_str())
                    .collect(),
                _ => elements.collect(),
            }
        }
    }
}

fn attribute_value<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    let name = local_name(name);
    node.attributes()
        .find(|a| a.name() == name)
        .map(|a| a.value())
}

impl<'input> PathEvaluator for XmlDocument<'input> {
    type Node = NodeId;

    fn root(&self) -> Option<NodeId> {
        Some(self.doc.root_element().id())
    }

    fn locate(&self, node: NodeId, path: &str, bindings: &Bindings) -> Option<NodeId> {
        self.select(node, path, bindings).into_iter().next()
    }

    fn locate_all_bound(&self, node: NodeId, path: &str, bindings: &Bindings) -> Vec<NodeId> {
        self.select(node, path, bindings)
    }

    fn read_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let node = self.doc.get_node(node)?;
        attribute_value(node, name).map(str::to_string)
    }

    fn read_first_level_text(&self, node: NodeId) -> Option<String> {
        let node = self.doc.get_node(node)?;
        let text: String = node
            .children()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    fn read_first_level_children_by_name(&self, node: NodeId, name: &str) -> Vec<NodeId> {
        let name = local_name(name);
        match self.doc.get_node(node) {
            Some(node) => node
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == name)
                .map(|n| n.id())
                .collect(),
            None => vec![],
        }
    }
}
