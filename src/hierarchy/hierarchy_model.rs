use std::collections::BTreeMap;

use crate::error::ProbeError;

use super::bounds::Bounds;

/// Position of a node inside one snapshot's arena.
///
/// Only meaningful for the snapshot that produced it; across refreshes
/// elements are matched by canonical path instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct Node {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub bounds: Option<Bounds>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Lowercased attribute value, empty when absent.
    pub fn attr_lower(&self, name: &str) -> String {
        self.attr(name).unwrap_or("").to_lowercase()
    }

    /// True only for an explicit `"true"`.
    pub fn flag(&self, name: &str) -> bool {
        self.attr(name) == Some("true")
    }

    /// `class` attribute, falling back to the element tag.
    pub fn class_name(&self) -> &str {
        self.attr("class").unwrap_or(&self.tag)
    }

    /// `index` attribute as emitted by the dump, `"0"` when absent.
    pub fn index(&self) -> &str {
        self.attr("index").unwrap_or("0")
    }

    pub fn clickable(&self) -> bool {
        self.flag("clickable")
    }

    pub fn long_clickable(&self) -> bool {
        self.flag("long-clickable")
    }

    pub fn scrollable(&self) -> bool {
        self.flag("scrollable")
    }

    pub fn displayed(&self) -> bool {
        self.attr("displayed") != Some("false")
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.attr("resource-id")
    }

    pub fn content_desc(&self) -> Option<&str> {
        self.attr("content-desc")
    }

    pub fn text(&self) -> Option<&str> {
        self.attr("text")
    }
}

/// Immutable tree parsed from one serialized UI hierarchy.
///
/// Nodes live in a flat arena in pre-order, so `NodeId(0)` is the root and
/// ids increase in document order.
#[derive(Debug, Clone)]
pub struct HierarchySnapshot {
    source: String,
    nodes: Vec<Node>,
}

impl HierarchySnapshot {
    pub fn parse(xml: &str) -> Result<HierarchySnapshot, ProbeError> {
        let doc = roxmltree::Document::parse(xml).map_err(|e| ProbeError::XmlParse(e.to_string()))?;

        let mut nodes = Vec::new();
        push_element(doc.root_element(), None, &mut nodes);

        Ok(HierarchySnapshot {
            source: xml.to_string(),
            nodes,
        })
    }

    /// Raw serialized text the snapshot was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// All node ids in pre-order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Strict descendants of `id` in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();

        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }

        out
    }
}

fn push_element(element: roxmltree::Node<'_, '_>, parent: Option<NodeId>, nodes: &mut Vec<Node>) -> NodeId {
    let id = NodeId(nodes.len());

    let attributes: BTreeMap<String, String> = element
        .attributes()
        .map(|a| (a.name().to_string(), a.value().to_string()))
        .collect();

    let bounds = attributes.get("bounds").and_then(|b| Bounds::parse(b));

    nodes.push(Node {
        tag: element.tag_name().name().to_string(),
        attributes,
        bounds,
        parent,
        children: vec![],
    });

    for child in element.children().filter(|c| c.is_element()) {
        let child_id = push_element(child, Some(id), nodes);
        nodes[id.0].children.push(child_id);
    }

    id
}
