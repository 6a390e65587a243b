use serde::Serialize;

use crate::error::ProbeError;
use crate::hierarchy::{
    bounds::Bounds,
    hierarchy_model::{HierarchySnapshot, Node, NodeId},
};

/// One entry of a `.vh` file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimplifiedElement {
    pub id: usize,
    pub parent: i64,
    pub children: Vec<usize>,
    pub child_count: usize,
    pub class: String,
    pub resource_id: Option<String>,
    pub text: Option<String>,
    pub content_description: Option<String>,
    pub package: Option<String>,
    pub bounds: String,
    pub size: String,

    pub clickable: bool,
    pub long_clickable: bool,
    pub scrollable: bool,
    pub checkable: bool,
    pub checked: bool,
    pub focusable: bool,
    pub focused: bool,
    pub selected: bool,
    pub enabled: bool,
    pub editable: bool,
    pub is_password: bool,
    pub displayed: bool,
}

pub fn simplify(xml: &str) -> Result<Vec<SimplifiedElement>, ProbeError> {
    let snapshot = HierarchySnapshot::parse(xml)?;
    Ok(simplify_snapshot(&snapshot))
}

/// Flatten every descendant of the root in pre-order. Ids are renumbered
/// from 0; top-level elements have parent -1.
pub fn simplify_snapshot(snapshot: &HierarchySnapshot) -> Vec<SimplifiedElement> {
    let mut out = Vec::new();
    if snapshot.is_empty() {
        return out;
    }

    for child in snapshot.children(snapshot.root()) {
        push_simplified(snapshot, *child, -1, &mut out);
    }

    out
}

fn push_simplified(snapshot: &HierarchySnapshot, id: NodeId, parent: i64, out: &mut Vec<SimplifiedElement>) -> usize {
    let current = out.len();
    out.push(simplified_element(snapshot.node(id), current, parent));

    let mut children = Vec::new();
    for child in snapshot.children(id) {
        children.push(push_simplified(snapshot, *child, current as i64, out));
    }

    out[current].child_count = children.len();
    out[current].children = children;
    current
}

fn simplified_element(node: &Node, id: usize, parent: i64) -> SimplifiedElement {
    let bounds = node.bounds.unwrap_or(Bounds::new(0, 0, 0, 0));
    let non_blank = |name: &str| {
        node.attr(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    SimplifiedElement {
        id,
        parent,
        children: vec![],
        child_count: 0,
        class: node.attr("class").unwrap_or_default().to_string(),
        resource_id: non_blank("resource-id"),
        text: non_blank("text"),
        content_description: non_blank("content-desc"),
        package: non_blank("package"),
        bounds: bounds.to_string(),
        size: format!("{}*{}", bounds.width(), bounds.height()),

        clickable: node.flag("clickable"),
        long_clickable: node.flag("long-clickable"),
        scrollable: node.flag("scrollable"),
        checkable: node.flag("checkable"),
        checked: node.flag("checked"),
        focusable: node.flag("focusable"),
        focused: node.flag("focused"),
        selected: node.flag("selected"),
        enabled: node.attr("enabled") != Some("false"),
        editable: node.flag("editable"),
        is_password: node.flag("password"),
        displayed: node.attr("displayed") != Some("false"),
    }
}
