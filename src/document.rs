//! Document content tree.
//!
//! A fetched document is an ordered sequence of structural nodes: paragraphs,
//! tables, and tables of contents. Tables nest further node sequences inside
//! their cells, and a table of contents wraps its own node sequence, so the
//! body forms a recursive tagged tree. The wire format (what the fetch
//! collaborator returns) deserializes directly into these types.

use serde::{Deserialize, Serialize};

/// A document fetched from the source, ready for extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// External id of the document in the source system.
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    /// Opaque content-version identifier for the fetched content.
    #[serde(default)]
    pub revision_id: String,
    /// Root node sequence. Absent body means empty text and no links.
    #[serde(default)]
    pub body: Vec<StructuralNode>,
}

/// One node in a document body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralNode {
    Paragraph(Paragraph),
    Table(Table),
    /// A table of contents carries its own nested node sequence.
    TableOfContents(Vec<StructuralNode>),
}

/// An ordered run of inline elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
}

/// An inline element with its character offsets in the document text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParagraphElement {
    #[serde(default)]
    pub start_index: i64,
    #[serde(default)]
    pub end_index: i64,
    #[serde(default)]
    pub text_run: Option<TextRun>,
    /// A smart-chip style inline link annotation.
    #[serde(default)]
    pub rich_link: Option<RichLink>,
}

/// A run of styled text. The style may carry a hyperlink; an empty link URL
/// is an internal same-document cross-reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub link_url: Option<String>,
}

/// An inline rich link (link chip) with a display title and target URI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RichLink {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uri: String,
}

/// A table of rows of cells; each cell holds a nested node sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub content: Vec<StructuralNode>,
}

impl Paragraph {
    /// Convenience constructor for a paragraph of plain text.
    pub fn text(content: &str) -> Self {
        Paragraph {
            elements: vec![ParagraphElement {
                text_run: Some(TextRun {
                    content: content.to_string(),
                    link_url: None,
                }),
                ..Default::default()
            }],
        }
    }
}
