//! The alignment synchronizer.
//!
//! This module implements the full synchronization pass over a document:
//! - **Reset**: strip previously applied alignment styles per editor
//! - **Discover**: find content blocks by structural or legacy marker
//! - **Resolve**: nearest-ancestor alignment marker, stopping at the editor
//! - **Apply**: write the resolved alignment onto the block subtree
//! - **Sweep**: re-apply every marker to its own subtree in document order
//!
//! Editors are re-discovered on every pass, so editors added or removed
//! between passes need no registration.

pub mod report;

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::document::{Document, NodeId};

/// The three recognized alignment values, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    /// All alignments in the order markers are tested.
    pub const ALL: [Self; 3] = [Self::Left, Self::Center, Self::Right];

    /// The CSS value written into `text-align`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    /// Parse a CSS `text-align` value. Unrecognized values (e.g. `justify`)
    /// are not alignments this synchronizer owns.
    pub fn from_css(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// The block-type attribute value naming this alignment.
    pub const fn block_type(self) -> &'static str {
        match self {
            Self::Left => "text-left",
            Self::Center => "text-center",
            Self::Right => "text-right",
        }
    }

    /// The marker class naming this alignment.
    pub const fn marker_class(self) -> &'static str {
        match self {
            Self::Left => "Draftail-block--text-left",
            Self::Center => "Draftail-block--text-center",
            Self::Right => "Draftail-block--text-right",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classes identifying an editor root.
const EDITOR_ROOT_CLASSES: [&str; 2] = ["DraftEditor-root", "Draftail-Editor"];
/// Attribute marking the contents wrapper inside an editor.
const CONTENTS_ATTR: &str = "data-contents";
/// Attribute marking a content block.
const BLOCK_ATTR: &str = "data-block";
/// Legacy class form of the content-block marker.
const LEGACY_BLOCK_CLASS: &str = "public-DraftStyleDefault-block";
/// Attribute form of the alignment marker.
const BLOCK_TYPE_ATTR: &str = "data-block-type";
/// Inline style property the synchronizer owns.
const STYLE_PROPERTY: &str = "text-align";

/// All editor roots currently present, in document order.
pub fn editor_roots(doc: &Document) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .filter(|&id| is_editor_root(doc, id))
        .collect()
}

fn is_editor_root(doc: &Document, id: NodeId) -> bool {
    EDITOR_ROOT_CLASSES
        .iter()
        .any(|class| doc.has_class(id, class))
}

/// Alignment marker carried by a node itself, if any.
///
/// The attribute form and the class form are synonyms; alignments are
/// tested in [`Alignment::ALL`] order and the first match wins.
pub fn marker_on(doc: &Document, id: NodeId) -> Option<Alignment> {
    let block_type = doc.attribute(id, BLOCK_TYPE_ATTR);
    Alignment::ALL.into_iter().find(|&align| {
        block_type == Some(align.block_type()) || doc.has_class(id, align.marker_class())
    })
}

/// Returns true if the node is a content block.
///
/// Either the structural form (`data-block="true"` beneath a
/// `data-contents="true"` wrapper) or the legacy class form matches.
pub fn is_content_block(doc: &Document, id: NodeId) -> bool {
    if !doc.is_element(id) {
        return false;
    }
    if doc.has_class(id, LEGACY_BLOCK_CLASS) {
        return true;
    }
    doc.attribute(id, BLOCK_ATTR) == Some("true")
        && doc
            .ancestors(id)
            .any(|anc| doc.attribute(anc, CONTENTS_ATTR) == Some("true"))
}

/// Content blocks within one editor root, in document order.
pub(crate) fn content_blocks(doc: &Document, root: NodeId) -> Vec<NodeId> {
    doc.descendants(root)
        .filter(|&id| is_content_block(doc, id))
        .collect()
}

/// Resolve a block's alignment by walking toward the editor root.
///
/// The block itself is checked first, then each ancestor; the walk stops
/// before the root, so a marker on the root itself never applies.
pub fn resolve_alignment(doc: &Document, root: NodeId, block: NodeId) -> Option<Alignment> {
    let mut current = block;
    loop {
        if let Some(alignment) = marker_on(doc, current) {
            return Some(alignment);
        }
        let parent = doc.parent(current)?;
        if parent == root {
            return None;
        }
        current = parent;
    }
}

/// Run one full synchronization pass over every editor in the document.
///
/// Idempotent: a second pass over an unchanged document writes the same
/// styles again. Documents without editors are a no-op.
pub fn synchronize(doc: &mut Document) {
    let roots = editor_roots(doc);
    debug!(editors = roots.len(), "alignment pass");
    for root in roots {
        synchronize_editor(doc, root);
    }
}

fn synchronize_editor(doc: &mut Document, root: NodeId) {
    let elements: Vec<NodeId> = doc
        .descendants(root)
        .filter(|&id| doc.is_element(id))
        .collect();

    // Reset: clear only the alignments this pass owns; foreign values
    // like `justify` are left alone.
    for &el in &elements {
        if doc
            .style_property(el, STYLE_PROPERTY)
            .as_deref()
            .and_then(Alignment::from_css)
            .is_some()
        {
            doc.remove_style_property(el, STYLE_PROPERTY);
        }
    }

    // Discover, resolve, apply.
    let blocks: Vec<NodeId> = elements
        .iter()
        .copied()
        .filter(|&id| is_content_block(doc, id))
        .collect();
    let mut styled = 0usize;
    for &block in &blocks {
        if let Some(alignment) = resolve_alignment(doc, root, block) {
            apply_subtree(doc, block, alignment);
            styled += 1;
        }
    }

    // Marker sweep: every marked node styles its own subtree, in document
    // order so a nested marker re-applies after its ancestor.
    for &el in &elements {
        if let Some(alignment) = marker_on(doc, el) {
            apply_subtree(doc, el, alignment);
        }
    }

    debug!(
        blocks = blocks.len(),
        styled,
        elements = elements.len(),
        "editor synchronized"
    );
}

/// Write an alignment onto a node and every element beneath it.
fn apply_subtree(doc: &mut Document, id: NodeId, alignment: Alignment) {
    if doc.is_element(id) {
        doc.set_style_property(id, STYLE_PROPERTY, alignment.as_str());
    }
    let descendants: Vec<NodeId> = doc
        .descendants(id)
        .filter(|&desc| doc.is_element(desc))
        .collect();
    for desc in descendants {
        doc.set_style_property(desc, STYLE_PROPERTY, alignment.as_str());
    }
}

/// A node whose applied style disagrees with a fresh synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleStyle {
    /// The out-of-date node.
    #[serde(skip)]
    pub node: NodeId,
    /// Tag name of the node.
    pub tag: String,
    /// `text-align` currently present on the node.
    pub found: Option<String>,
    /// `text-align` a fresh pass would produce.
    pub expected: Option<String>,
}

/// Compare a document's applied styles against a fresh pass.
///
/// Returns the nodes whose `text-align` would change, in document order.
/// A freshly synchronized document reports nothing.
pub fn check_stale(doc: &Document) -> Vec<StaleStyle> {
    let mut synced = doc.clone();
    synchronize(&mut synced);
    doc.descendants(doc.root())
        .filter(|&id| doc.is_element(id))
        .filter_map(|id| {
            let found = doc.style_property(id, STYLE_PROPERTY);
            let expected = synced.style_property(id, STYLE_PROPERTY);
            if found == expected {
                return None;
            }
            Some(StaleStyle {
                node: id,
                tag: doc.tag(id).unwrap_or_default().to_string(),
                found,
                expected,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One editor with a contents wrapper; returns (doc, editor, contents).
    fn editor_fixture() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let editor = doc.create_element("div");
        doc.add_class(editor, "Draftail-Editor");
        let contents = doc.create_element("div");
        doc.set_attribute(contents, "data-contents", "true");
        let root = doc.root();
        doc.append_child(root, editor);
        doc.append_child(editor, contents);
        (doc, editor, contents)
    }

    fn add_block(doc: &mut Document, parent: NodeId) -> NodeId {
        let block = doc.create_element("div");
        doc.set_attribute(block, "data-block", "true");
        doc.append_child(parent, block);
        block
    }

    fn align_of(doc: &Document, id: NodeId) -> Option<String> {
        doc.style_property(id, "text-align")
    }

    #[test]
    fn test_empty_document_is_noop() {
        let mut doc = Document::new();
        synchronize(&mut doc);
        assert_eq!(doc, Document::new());
    }

    #[test]
    fn test_marker_attribute_styles_block() {
        let (mut doc, _, contents) = editor_fixture();
        let block = add_block(&mut doc, contents);
        doc.set_attribute(block, "data-block-type", "text-center");
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, block), Some("center".to_string()));
    }

    #[test]
    fn test_marker_class_styles_block() {
        let (mut doc, _, contents) = editor_fixture();
        let block = add_block(&mut doc, contents);
        doc.add_class(block, "Draftail-block--text-right");
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, block), Some("right".to_string()));
    }

    #[test]
    fn test_marker_forms_are_equivalent() {
        let (mut attr_doc, _, contents) = editor_fixture();
        let attr_block = add_block(&mut attr_doc, contents);
        attr_doc.set_attribute(attr_block, "data-block-type", "text-left");

        let (mut class_doc, _, contents) = editor_fixture();
        let class_block = add_block(&mut class_doc, contents);
        class_doc.add_class(class_block, "Draftail-block--text-left");

        synchronize(&mut attr_doc);
        synchronize(&mut class_doc);
        assert_eq!(
            align_of(&attr_doc, attr_block),
            align_of(&class_doc, class_block)
        );
    }

    #[test]
    fn test_legacy_block_class_is_discovered() {
        let (mut doc, editor, _) = editor_fixture();
        // No contents wrapper above this one; the legacy class alone matches.
        let block = doc.create_element("div");
        doc.add_class(block, "public-DraftStyleDefault-block");
        doc.add_class(block, "Draftail-block--text-center");
        doc.append_child(editor, block);
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, block), Some("center".to_string()));
    }

    #[test]
    fn test_block_without_contents_wrapper_not_discovered() {
        let (mut doc, editor, _) = editor_fixture();
        let stray = doc.create_element("div");
        doc.set_attribute(stray, "data-block", "true");
        doc.set_attribute(stray, "data-block-type", "text-right");
        doc.append_child(editor, stray);
        assert!(!is_content_block(&doc, stray));
        // The sweep still styles it: it carries a marker.
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, stray), Some("right".to_string()));
    }

    #[test]
    fn test_descendant_propagation() {
        let (mut doc, _, contents) = editor_fixture();
        let block = add_block(&mut doc, contents);
        doc.set_attribute(block, "data-block-type", "text-right");
        let span = doc.create_element("span");
        let inner = doc.create_element("em");
        let text = doc.create_text("deep");
        doc.append_child(block, span);
        doc.append_child(span, inner);
        doc.append_child(inner, text);
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, span), Some("right".to_string()));
        assert_eq!(align_of(&doc, inner), Some("right".to_string()));
    }

    #[test]
    fn test_nearest_ancestor_wins() {
        let (mut doc, _, contents) = editor_fixture();
        let outer = doc.create_element("div");
        doc.set_attribute(outer, "data-block-type", "text-right");
        doc.append_child(contents, outer);
        let mid = doc.create_element("div");
        doc.set_attribute(mid, "data-block-type", "text-center");
        doc.append_child(outer, mid);
        let block = add_block(&mut doc, mid);
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, block), Some("center".to_string()));
    }

    #[test]
    fn test_marker_on_editor_root_does_not_apply() {
        let (mut doc, editor, contents) = editor_fixture();
        doc.set_attribute(editor, "data-block-type", "text-center");
        let block = add_block(&mut doc, contents);
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, block), None);
    }

    #[test]
    fn test_marker_above_editor_root_does_not_apply() {
        let mut doc = Document::new();
        let wrapper = doc.create_element("div");
        doc.set_attribute(wrapper, "data-block-type", "text-right");
        let root = doc.root();
        doc.append_child(root, wrapper);
        let editor = doc.create_element("div");
        doc.add_class(editor, "Draftail-Editor");
        doc.append_child(wrapper, editor);
        let contents = doc.create_element("div");
        doc.set_attribute(contents, "data-contents", "true");
        doc.append_child(editor, contents);
        let block = add_block(&mut doc, contents);
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, block), None);
    }

    #[test]
    fn test_clear_on_marker_removal() {
        let (mut doc, _, contents) = editor_fixture();
        let block = add_block(&mut doc, contents);
        doc.set_attribute(block, "data-block-type", "text-left");
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, block), Some("left".to_string()));

        doc.remove_attribute(block, "data-block-type");
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, block), None);
    }

    #[test]
    fn test_reset_preserves_foreign_text_align() {
        let (mut doc, _, contents) = editor_fixture();
        let block = add_block(&mut doc, contents);
        doc.set_style_property(block, "text-align", "justify");
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, block), Some("justify".to_string()));
    }

    #[test]
    fn test_reset_preserves_unrelated_styles() {
        let (mut doc, _, contents) = editor_fixture();
        let block = add_block(&mut doc, contents);
        doc.set_style_property(block, "color", "red");
        doc.set_attribute(block, "data-block-type", "text-center");
        synchronize(&mut doc);
        assert_eq!(doc.style_property(block, "color"), Some("red".to_string()));
        assert_eq!(align_of(&doc, block), Some("center".to_string()));
    }

    #[test]
    fn test_styles_outside_editors_untouched() {
        let mut doc = Document::new();
        let outside = doc.create_element("p");
        doc.set_style_property(outside, "text-align", "center");
        let root = doc.root();
        doc.append_child(root, outside);
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, outside), Some("center".to_string()));
    }

    #[test]
    fn test_idempotence() {
        let (mut doc, _, contents) = editor_fixture();
        let block = add_block(&mut doc, contents);
        doc.set_attribute(block, "data-block-type", "text-center");
        let other = add_block(&mut doc, contents);
        doc.add_class(other, "Draftail-block--text-right");
        synchronize(&mut doc);
        let once = doc.clone();
        synchronize(&mut doc);
        assert_eq!(doc, once);
    }

    #[test]
    fn test_multi_root_independence() {
        let mut doc = Document::new();
        let root = doc.root();
        let mut editors = Vec::new();
        for align in ["text-center", "text-right"] {
            let editor = doc.create_element("div");
            doc.add_class(editor, "DraftEditor-root");
            doc.append_child(root, editor);
            let contents = doc.create_element("div");
            doc.set_attribute(contents, "data-contents", "true");
            doc.append_child(editor, contents);
            let block = add_block(&mut doc, contents);
            doc.set_attribute(block, "data-block-type", align);
            editors.push(block);
        }
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, editors[0]), Some("center".to_string()));
        assert_eq!(align_of(&doc, editors[1]), Some("right".to_string()));
    }

    #[test]
    fn test_sweep_styles_marked_non_block_subtree() {
        let (mut doc, editor, _) = editor_fixture();
        // A marked wrapper with no content block beneath it: only the
        // sweep reaches this.
        let wrapper = doc.create_element("section");
        doc.set_attribute(wrapper, "data-block-type", "text-center");
        doc.append_child(editor, wrapper);
        let span = doc.create_element("span");
        doc.append_child(wrapper, span);
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, wrapper), Some("center".to_string()));
        assert_eq!(align_of(&doc, span), Some("center".to_string()));
    }

    #[test]
    fn test_nested_marker_overrides_ancestor_in_sweep() {
        let (mut doc, _, contents) = editor_fixture();
        let outer = doc.create_element("div");
        doc.set_attribute(outer, "data-block-type", "text-center");
        doc.append_child(contents, outer);
        let inner = doc.create_element("div");
        doc.set_attribute(inner, "data-block-type", "text-right");
        doc.append_child(outer, inner);
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, outer), Some("center".to_string()));
        assert_eq!(align_of(&doc, inner), Some("right".to_string()));
    }

    #[test]
    fn test_resolution_order_prefers_left() {
        let (mut doc, _, contents) = editor_fixture();
        let block = add_block(&mut doc, contents);
        // Contradictory marker forms on one node: fixed test order wins.
        doc.set_attribute(block, "data-block-type", "text-left");
        doc.add_class(block, "Draftail-block--text-center");
        synchronize(&mut doc);
        assert_eq!(align_of(&doc, block), Some("left".to_string()));
    }

    #[test]
    fn test_check_stale_reports_drift() {
        let (mut doc, _, contents) = editor_fixture();
        let block = add_block(&mut doc, contents);
        doc.set_attribute(block, "data-block-type", "text-center");
        doc.set_style_property(block, "text-align", "left");
        let stale = check_stale(&doc);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].node, block);
        assert_eq!(stale[0].found, Some("left".to_string()));
        assert_eq!(stale[0].expected, Some("center".to_string()));
    }

    #[test]
    fn test_check_stale_clean_after_synchronize() {
        let (mut doc, _, contents) = editor_fixture();
        let block = add_block(&mut doc, contents);
        doc.add_class(block, "Draftail-block--text-right");
        synchronize(&mut doc);
        assert!(check_stale(&doc).is_empty());
    }

    #[test]
    fn test_alignment_display_and_from_css() {
        for align in Alignment::ALL {
            assert_eq!(Alignment::from_css(align.as_str()), Some(align));
            assert_eq!(align.to_string(), align.as_str());
        }
        assert_eq!(Alignment::from_css("justify"), None);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum TreeShape {
            Text,
            Element {
                marker: Option<Alignment>,
                block: bool,
                children: Vec<TreeShape>,
            },
        }

        fn alignment_strategy() -> impl Strategy<Value = Alignment> {
            prop_oneof![
                Just(Alignment::Left),
                Just(Alignment::Center),
                Just(Alignment::Right),
            ]
        }

        fn tree_strategy() -> impl Strategy<Value = TreeShape> {
            let leaf = prop_oneof![
                Just(TreeShape::Text),
                (proptest::option::of(alignment_strategy()), any::<bool>()).prop_map(
                    |(marker, block)| TreeShape::Element {
                        marker,
                        block,
                        children: Vec::new(),
                    }
                ),
            ];
            leaf.prop_recursive(4, 48, 4, |inner| {
                (
                    proptest::option::of(alignment_strategy()),
                    any::<bool>(),
                    prop::collection::vec(inner, 0..4),
                )
                    .prop_map(|(marker, block, children)| TreeShape::Element {
                        marker,
                        block,
                        children,
                    })
            })
        }

        fn build(doc: &mut Document, parent: NodeId, shape: &TreeShape, use_class_form: bool) {
            match shape {
                TreeShape::Text => {
                    let text = doc.create_text("t");
                    doc.append_child(parent, text);
                }
                TreeShape::Element {
                    marker,
                    block,
                    children,
                } => {
                    let el = doc.create_element("div");
                    if *block {
                        doc.set_attribute(el, "data-block", "true");
                    }
                    if let Some(align) = marker {
                        if use_class_form {
                            doc.add_class(el, align.marker_class());
                        } else {
                            doc.set_attribute(el, "data-block-type", align.block_type());
                        }
                    }
                    doc.append_child(parent, el);
                    for child in children {
                        build(doc, el, child, use_class_form);
                    }
                }
            }
        }

        fn build_document(shape: &TreeShape, use_class_form: bool) -> (Document, NodeId) {
            let mut doc = Document::new();
            let editor = doc.create_element("div");
            doc.add_class(editor, "Draftail-Editor");
            let root = doc.root();
            doc.append_child(root, editor);
            let contents = doc.create_element("div");
            doc.set_attribute(contents, "data-contents", "true");
            doc.append_child(editor, contents);
            build(&mut doc, contents, shape, use_class_form);
            (doc, editor)
        }

        proptest! {
            #[test]
            fn synchronize_is_idempotent(shape in tree_strategy(), class_form in any::<bool>()) {
                let (mut doc, _) = build_document(&shape, class_form);
                synchronize(&mut doc);
                let once = doc.clone();
                synchronize(&mut doc);
                prop_assert_eq!(doc, once);
            }

            #[test]
            fn block_style_matches_resolved_marker(shape in tree_strategy()) {
                let (mut doc, editor) = build_document(&shape, false);
                synchronize(&mut doc);
                for block in content_blocks(&doc, editor) {
                    let resolved = resolve_alignment(&doc, editor, block)
                        .map(|a| a.as_str().to_string());
                    prop_assert_eq!(doc.style_property(block, "text-align"), resolved);
                }
            }

            #[test]
            fn descendants_mirror_block_without_inner_markers(shape in tree_strategy()) {
                let (mut doc, editor) = build_document(&shape, false);
                synchronize(&mut doc);
                for block in content_blocks(&doc, editor) {
                    let has_inner_marker = doc
                        .descendants(block)
                        .any(|d| doc.is_element(d) && marker_on(&doc, d).is_some());
                    if has_inner_marker {
                        continue;
                    }
                    let style = doc.style_property(block, "text-align");
                    for desc in doc.descendants(block).collect::<Vec<_>>() {
                        if doc.is_element(desc) {
                            prop_assert_eq!(doc.style_property(desc, "text-align"), style.clone());
                        }
                    }
                }
            }

            #[test]
            fn marker_forms_resolve_identically(shape in tree_strategy()) {
                let (mut attr_doc, _) = build_document(&shape, false);
                let (mut class_doc, _) = build_document(&shape, true);
                synchronize(&mut attr_doc);
                synchronize(&mut class_doc);
                let attr_styles: Vec<_> = attr_doc
                    .descendants(attr_doc.root())
                    .map(|id| attr_doc.style_property(id, "text-align"))
                    .collect();
                let class_styles: Vec<_> = class_doc
                    .descendants(class_doc.root())
                    .map(|id| class_doc.style_property(id, "text-align"))
                    .collect();
                prop_assert_eq!(attr_styles, class_styles);
            }
        }
    }
}
