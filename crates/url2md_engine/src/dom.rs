//! Mutable HTML tree for one page.
//!
//! scraper parses the page; the result is copied into an owned `ego_tree::Tree`
//! so the normalizer can remove, replace and create nodes freely. Detached nodes
//! stay in the arena but are unreachable from the document root.

use ego_tree::{NodeId, NodeRef, Tree};
use scraper::{node::Node, Html};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }
}

#[derive(Debug, Clone)]
pub struct PageDocument {
    tree: Tree<DomNode>,
}

impl PageDocument {
    pub fn parse(html: &str) -> Self {
        let source = Html::parse_document(html);
        let mut tree = Tree::new(DomNode::Document);
        let root_id = tree.root().id();

        let mut stack = vec![(source.tree.root(), root_id)];
        while let Some((src, dst)) = stack.pop() {
            for child in src.children() {
                let value = match child.value() {
                    Node::Element(element) => DomNode::Element(ElementData {
                        name: element.name().to_ascii_lowercase(),
                        attrs: element
                            .attrs()
                            .map(|(key, value)| (key.to_string(), value.to_string()))
                            .collect(),
                    }),
                    Node::Text(text) => {
                        let text: &str = text;
                        DomNode::Text(text.to_owned())
                    }
                    _ => continue,
                };
                if let Some(mut parent) = tree.get_mut(dst) {
                    let id = parent.append(value).id();
                    stack.push((child, id));
                }
            }
        }

        Self { tree }
    }

    pub fn root(&self) -> NodeId {
        self.tree.root().id()
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, DomNode>> {
        self.tree.get(id)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.tree.get(id)?.value() {
            DomNode::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|data| data.name.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(mut node) = self.tree.get_mut(id) {
            if let DomNode::Element(data) = node.value() {
                data.set_attr(name, value);
            }
        }
    }

    pub fn class_list(&self, id: NodeId) -> Vec<&str> {
        self.element(id)
            .map(|data| data.classes().collect())
            .unwrap_or_default()
    }

    /// Concatenated text of the subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.tree.get(id) else {
            return String::new();
        };
        node.descendants()
            .filter_map(|n| match n.value() {
                DomNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| node.children().map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.parent().map(|p| p.id())
    }

    /// Attached elements in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendant_elements(self.root())
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|id| self.tag(*id) == Some(tag))
            .collect()
    }

    /// Elements strictly below `id`, in document order.
    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.tree.get(id) else {
            return Vec::new();
        };
        node.descendants()
            .skip(1)
            .filter(|n| matches!(n.value(), DomNode::Element(_)))
            .map(|n| n.id())
            .collect()
    }

    pub fn first_element_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.tree
            .root()
            .descendants()
            .find(|n| matches!(n.value(), DomNode::Element(data) if data.name == tag))
            .map(|n| n.id())
    }

    /// False once the node or one of its ancestors has been removed.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let root = self.root();
        id == root
            || self
                .tree
                .get(id)
                .is_some_and(|node| node.ancestors().any(|a| a.id() == root))
    }

    pub fn has_ancestor_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tree.get(id).is_some_and(|node| {
            node.ancestors()
                .any(|a| matches!(a.value(), DomNode::Element(data) if data.name == tag))
        })
    }

    pub fn remove(&mut self, id: NodeId) {
        if let Some(mut node) = self.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Puts `replacement` where `old` was and detaches `old`.
    pub fn replace_with(&mut self, old: NodeId, replacement: NodeId) {
        if old == replacement || self.parent(old).is_none() {
            return;
        }
        if let Some(mut node) = self.tree.get_mut(replacement) {
            node.detach();
        }
        if let Some(mut node) = self.tree.get_mut(old) {
            node.insert_id_before(replacement);
            node.detach();
        }
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.tree
            .orphan(DomNode::Element(ElementData::new(name)))
            .id()
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.tree.orphan(DomNode::Text(text.into())).id()
    }

    /// Moves `child` (detaching it first) to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child {
            return;
        }
        if let Some(mut node) = self.tree.get_mut(child) {
            node.detach();
        }
        if let Some(mut node) = self.tree.get_mut(parent) {
            node.append_id(child);
        }
    }

    /// `<body>` if present, the document root otherwise.
    pub fn body(&self) -> NodeId {
        self.first_element_by_tag("body").unwrap_or_else(|| self.root())
    }
}
