//! Core document tree types.
//!
//! The tree is an arena: nodes live in a flat `Vec` and refer to each other
//! by [`NodeId`]. Detached subtrees stay in the arena but are unreachable
//! from the root, so traversals never observe them.

/// Handle to a node in a [`Document`] arena.
///
/// Ids are only meaningful for the document that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Element with a tag name and attributes.
    Element(ElementData),
    /// Text run. Text nodes never carry attributes or styles.
    Text(String),
}

/// Tag name and attribute list of an element node.
///
/// Attributes keep insertion order so serialization is stable. The `class`
/// and `style` attributes are stored as raw strings; the typed accessors on
/// [`Document`] parse them on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) data: NodeData,
}

/// A mutable DOM-like document tree.
///
/// Index 0 is always the synthetic `body` root created by [`Document::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only the synthetic `body` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Element(ElementData {
                    tag: "body".to_string(),
                    attrs: Vec::new(),
                }),
            }],
        }
    }

    /// The synthetic root of the document.
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Total number of nodes in the arena, detached subtrees included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: tag.to_string(),
            attrs: Vec::new(),
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Detach a node (and implicitly its subtree) from its parent.
    ///
    /// Detaching the root or an already-detached node is a no-op.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|&c| c != id);
    }

    /// Parent of a node, if attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Children of a node in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Node payload.
    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    /// Tag name, or `None` for text nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(&el.tag),
            NodeData::Text(_) => None,
        }
    }

    /// Returns true if the node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Element(_))
    }

    /// Text content of a text node, or `None` for elements.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element(_) => None,
            NodeData::Text(text) => Some(text),
        }
    }

    /// Attribute value by name, or `None` for missing attributes and text
    /// nodes.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => el
                .attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            NodeData::Text(_) => None,
        }
    }

    /// Set (or replace) an attribute. No-op on text nodes.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let NodeData::Element(el) = &mut self.nodes[id.0].data else {
            return;
        };
        if let Some(attr) = el.attrs.iter_mut().find(|(k, _)| k == name) {
            attr.1 = value.to_string();
        } else {
            el.attrs.push((name.to_string(), value.to_string()));
        }
    }

    /// Remove an attribute if present.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element(el) = &mut self.nodes[id.0].data {
            el.attrs.retain(|(k, _)| k != name);
        }
    }

    /// All attributes of an element in insertion order.
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => &el.attrs,
            NodeData::Text(_) => &[],
        }
    }

    /// Returns true if the element's `class` attribute contains `class`.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    /// Add a class to the element's `class` attribute if not already present.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let updated = match self.attribute(id, "class") {
            Some(list) if !list.trim().is_empty() => format!("{list} {class}"),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", &updated);
    }

    /// Remove a class from the element's `class` attribute.
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(list) = self.attribute(id, "class") else {
            return;
        };
        let updated = list
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        if updated.is_empty() {
            self.remove_attribute(id, "class");
        } else {
            self.set_attribute(id, "class", &updated);
        }
    }

    /// Value of one declaration in the element's inline `style` attribute.
    pub fn style_property(&self, id: NodeId, name: &str) -> Option<String> {
        let style = self.attribute(id, "style")?;
        style.split(';').find_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            if key.trim().eq_ignore_ascii_case(name) {
                Some(value.trim().to_string())
            } else {
                None
            }
        })
    }

    /// Set one declaration in the element's inline `style` attribute,
    /// preserving unrelated declarations.
    pub fn set_style_property(&mut self, id: NodeId, name: &str, value: &str) {
        let mut decls = self.style_declarations(id);
        if let Some(decl) = decls.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            decl.1 = value.to_string();
        } else {
            decls.push((name.to_string(), value.to_string()));
        }
        self.write_style(id, &decls);
    }

    /// Remove one declaration from the element's inline `style` attribute.
    ///
    /// Drops the `style` attribute entirely when no declarations remain.
    pub fn remove_style_property(&mut self, id: NodeId, name: &str) {
        if self.attribute(id, "style").is_none() {
            return;
        }
        let mut decls = self.style_declarations(id);
        decls.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.write_style(id, &decls);
    }

    fn style_declarations(&self, id: NodeId) -> Vec<(String, String)> {
        self.attribute(id, "style")
            .map(|style| {
                style
                    .split(';')
                    .filter_map(|decl| {
                        let (key, value) = decl.split_once(':')?;
                        let key = key.trim();
                        let value = value.trim();
                        if key.is_empty() || value.is_empty() {
                            None
                        } else {
                            Some((key.to_string(), value.to_string()))
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn write_style(&mut self, id: NodeId, decls: &[(String, String)]) {
        if decls.is_empty() {
            self.remove_attribute(id, "style");
            return;
        }
        let style = decls
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attribute(id, "style", &style);
    }

    /// Ancestors of a node, nearest first, ending at the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Descendants of a node in preorder, excluding the node itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: self.children(id).iter().rev().copied().collect(),
        }
    }

    /// Concatenated text of the node's subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.text(id) {
            out.push_str(text);
        }
        for desc in self.descendants(id) {
            if let Some(text) = self.text(desc) {
                out.push_str(text);
            }
        }
        out
    }
}

/// Iterator over a node's ancestors, nearest first.
#[derive(Debug)]
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Preorder iterator over a node's descendants.
#[derive(Debug)]
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(current).iter().rev().copied());
        Some(current)
    }
}
