//! Structural extraction of plain text and hyperlinks.
//!
//! Both extractors are pure recursive traversals over the document tree,
//! producing their output in document order (top to bottom, left to right
//! through table cells). A missing body yields empty output, not an error.
//!
//! Table-of-contents nodes contribute text but are not scanned for links: a
//! TOC is built from internal same-document references, which the link
//! extractor excludes anyway.

use crate::document::{Document, Paragraph, StructuralNode, Table};

/// A hyperlink occurrence with its character offsets in the document text.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperLink {
    pub url: String,
    pub text: String,
    pub start_index: i64,
    pub end_index: i64,
}

/// Reads all the text from the document, in document order.
pub fn read_text(doc: &Document) -> String {
    read_node_text(&doc.body)
}

fn read_node_text(nodes: &[StructuralNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            StructuralNode::Paragraph(p) => out.push_str(&read_paragraph_text(p)),
            StructuralNode::Table(t) => out.push_str(&read_table_text(t)),
            // Recursively read the table of contents text
            StructuralNode::TableOfContents(content) => out.push_str(&read_node_text(content)),
        }
    }
    out
}

fn read_paragraph_text(p: &Paragraph) -> String {
    let mut out = String::new();
    for e in &p.elements {
        if let Some(run) = &e.text_run {
            out.push_str(&run.content);
        }
    }
    out
}

fn read_table_text(t: &Table) -> String {
    let mut out = String::new();
    for row in &t.rows {
        for cell in &row.cells {
            out.push_str(&read_node_text(&cell.content));
        }
    }
    out
}

/// Gets all the hyperlinks in the document, in traversal order.
///
/// Order matters downstream: link identity includes character offsets, so
/// a reordering that changed which occurrence lands on which offsets would
/// change persisted keys.
pub fn read_links(doc: &Document) -> Vec<HyperLink> {
    read_node_links(&doc.body)
}

fn read_node_links(nodes: &[StructuralNode]) -> Vec<HyperLink> {
    let mut links = Vec::new();
    for node in nodes {
        match node {
            StructuralNode::Paragraph(p) => links.extend(read_paragraph_links(p)),
            StructuralNode::Table(t) => links.extend(read_table_links(t)),
            StructuralNode::TableOfContents(_) => {}
        }
    }
    links
}

fn read_paragraph_links(p: &Paragraph) -> Vec<HyperLink> {
    let mut links = Vec::new();
    for e in &p.elements {
        if let Some(rich) = &e.rich_link {
            if !rich.uri.is_empty() {
                links.push(HyperLink {
                    url: rich.uri.clone(),
                    text: rich.title.clone(),
                    start_index: e.start_index,
                    end_index: e.end_index,
                });
            }
        }
        if let Some(run) = &e.text_run {
            // An empty URL is a link within the document, which we ignore.
            if let Some(url) = run.link_url.as_deref().filter(|u| !u.is_empty()) {
                links.push(HyperLink {
                    url: url.to_string(),
                    text: run.content.clone(),
                    start_index: e.start_index,
                    end_index: e.end_index,
                });
            }
        }
    }
    links
}

fn read_table_links(t: &Table) -> Vec<HyperLink> {
    let mut links = Vec::new();
    for row in &t.rows {
        for cell in &row.cells {
            links.extend(read_node_links(&cell.content));
        }
    }
    links
}
