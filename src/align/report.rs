//! Per-editor alignment summaries.
//!
//! Built from a document after a synchronization pass; rendered as plain
//! text for the terminal or as JSON with `--json`.

use std::fmt;

use serde::Serialize;

use crate::document::{Document, NodeId};

use super::{Alignment, content_blocks, editor_roots};

/// Maximum characters of block text shown in a preview.
const PREVIEW_LEN: usize = 40;

/// Resolved alignments for every editor in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentReport {
    /// One entry per editor root, in document order.
    pub editors: Vec<EditorSummary>,
}

/// Resolved alignments for one editor root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorSummary {
    /// Human-readable label for the editor (id attribute, or positional).
    pub label: String,
    /// One entry per content block, in document order.
    pub blocks: Vec<BlockSummary>,
}

/// Resolved alignment of one content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    /// Applied alignment, or `None` when the block resolved to nothing.
    pub alignment: Option<Alignment>,
    /// Truncated text content of the block.
    pub preview: String,
}

impl AlignmentReport {
    /// Summarize a document's applied styles.
    ///
    /// Reads the styles currently present, so call this after
    /// [`synchronize`](super::synchronize) to report a consistent state.
    pub fn from_document(doc: &Document) -> Self {
        let editors = editor_roots(doc)
            .into_iter()
            .enumerate()
            .map(|(idx, root)| EditorSummary {
                label: editor_label(doc, root, idx),
                blocks: content_blocks(doc, root)
                    .into_iter()
                    .map(|block| BlockSummary {
                        alignment: doc
                            .style_property(block, "text-align")
                            .as_deref()
                            .and_then(Alignment::from_css),
                        preview: preview(&doc.text_content(block)),
                    })
                    .collect(),
            })
            .collect();
        Self { editors }
    }

    /// Render the report as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn editor_label(doc: &Document, root: NodeId, idx: usize) -> String {
    doc.attribute(root, "id").map_or_else(
        || format!("editor {}", idx + 1),
        |id| format!("editor #{id}"),
    )
}

fn preview(text: &str) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= PREVIEW_LEN {
        return text;
    }
    let truncated: String = text.chars().take(PREVIEW_LEN).collect();
    format!("{truncated}…")
}

impl fmt::Display for AlignmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.editors.is_empty() {
            return writeln!(f, "no editors found");
        }
        for editor in &self.editors {
            writeln!(
                f,
                "{}: {} block{}",
                editor.label,
                editor.blocks.len(),
                if editor.blocks.len() == 1 { "" } else { "s" }
            )?;
            for block in &editor.blocks {
                let alignment = block.alignment.map_or("-", Alignment::as_str);
                writeln!(f, "  [{alignment:>6}] {}", block.preview)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::synchronize;

    fn fixture() -> Document {
        let mut doc = Document::parse(concat!(
            r#"<div class="Draftail-Editor" id="intro">"#,
            r#"<div data-contents="true">"#,
            r#"<div data-block="true" data-block-type="text-center">Centered words</div>"#,
            r#"<div data-block="true">Plain paragraph</div>"#,
            "</div></div>",
            r#"<div class="DraftEditor-root">"#,
            r#"<div data-contents="true">"#,
            r#"<div data-block="true" class="Draftail-block--text-right">Right side</div>"#,
            "</div></div>"
        ))
        .unwrap();
        synchronize(&mut doc);
        doc
    }

    #[test]
    fn test_report_structure() {
        let report = AlignmentReport::from_document(&fixture());
        assert_eq!(report.editors.len(), 2);
        assert_eq!(report.editors[0].label, "editor #intro");
        assert_eq!(report.editors[1].label, "editor 2");
        assert_eq!(report.editors[0].blocks.len(), 2);
        assert_eq!(
            report.editors[0].blocks[0].alignment,
            Some(Alignment::Center)
        );
        assert_eq!(report.editors[0].blocks[1].alignment, None);
        assert_eq!(
            report.editors[1].blocks[0].alignment,
            Some(Alignment::Right)
        );
    }

    #[test]
    fn test_report_previews_text() {
        let report = AlignmentReport::from_document(&fixture());
        assert_eq!(report.editors[0].blocks[0].preview, "Centered words");
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "word ".repeat(30);
        let short = preview(&long);
        assert!(short.chars().count() <= PREVIEW_LEN + 1);
        assert!(short.ends_with('…'));
    }

    #[test]
    fn test_display_renders_alignment_column() {
        let text = AlignmentReport::from_document(&fixture()).to_string();
        assert!(text.contains("editor #intro: 2 blocks"));
        assert!(text.contains("[center] Centered words"));
        assert!(text.contains("[     -] Plain paragraph"));
    }

    #[test]
    fn test_display_empty_document() {
        let report = AlignmentReport::from_document(&Document::new());
        assert_eq!(report.to_string(), "no editors found\n");
    }

    #[test]
    fn test_json_serialization() {
        let json = AlignmentReport::from_document(&fixture()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["editors"][0]["blocks"][0]["alignment"],
            serde_json::json!("center")
        );
        assert_eq!(
            value["editors"][0]["blocks"][1]["alignment"],
            serde_json::Value::Null
        );
    }
}
