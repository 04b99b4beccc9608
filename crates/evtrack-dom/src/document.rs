//! Document - High-level document API

use crate::{DomTree, NodeId};

/// Markup flavour of a document
///
/// Element names are case-folded only in HTML documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentKind {
    #[default]
    Html,
    Xml,
}

/// Document
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    /// HTML or XML
    kind: DocumentKind,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
}

impl Document {
    /// Create a new HTML document with `html/head/body`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();
        
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");
        
        // Freshly created nodes cannot fail to link
        let _ = tree.append_child(tree.root(), html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);
        
        Self {
            tree,
            url: url.to_string(),
            kind: DocumentKind::Html,
            html_element: html,
            head_element: head,
            body_element: body,
        }
    }
    
    /// Create an empty document (document node only)
    pub fn empty(url: &str, kind: DocumentKind) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            kind,
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
        }
    }
    
    /// Re-discover the `html/head/body` elements after the tree was built
    pub fn finalize(&mut self) {
        self.html_element = self.find_child_element(self.tree.root(), "html");
        if self.html_element.is_valid() {
            self.head_element = self.find_child_element(self.html_element, "head");
            self.body_element = self.find_child_element(self.html_element, "body");
        }
        tracing::trace!(
            "Document finalized: html={:?} head={:?} body={:?}",
            self.html_element, self.head_element, self.body_element
        );
    }
    
    fn find_child_element(&self, parent: NodeId, tag: &str) -> NodeId {
        self.tree.children(parent)
            .find(|(_, node)| {
                node.as_element()
                    .is_some_and(|e| e.tag_name.eq_ignore_ascii_case(tag))
            })
            .map_or(NodeId::NONE, |(id, _)| id)
    }
    
    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }
    
    /// HTML or XML
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }
    
    /// Whether this is an HTML document
    pub fn is_html(&self) -> bool {
        self.kind == DocumentKind::Html
    }
    
    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }
    
    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }
    
    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }
    
    /// Get the first connected element with the given id, in document order
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_element_with_id(self.tree.root(), id)
    }
    
    fn find_element_with_id(&self, start: NodeId, target_id: &str) -> Option<NodeId> {
        for (node_id, node) in self.tree.children(start) {
            if node.as_element().and_then(|e| e.id()) == Some(target_id) {
                return Some(node_id);
            }
            if let Some(found) = self.find_element_with_id(node_id, target_id) {
                return Some(found);
            }
        }
        None
    }
    
    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }
    
    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_new_document_structure() {
        let doc = Document::new("https://example.com/");
        
        assert!(doc.is_html());
        assert!(doc.body().is_valid());
        assert_eq!(doc.tree().parent(doc.body()), Some(doc.document_element()));
        assert_eq!(doc.url(), "https://example.com/");
    }
    
    #[test]
    fn test_get_element_by_id() {
        let mut doc = Document::new("about:blank");
        let body = doc.body();
        let div = doc.tree_mut().create_element("div");
        doc.tree_mut().append_child(body, div).unwrap();
        doc.tree_mut().set_attribute(div, "id", "main").unwrap();
        
        assert_eq!(doc.get_element_by_id("main"), Some(div));
        assert_eq!(doc.get_element_by_id("missing"), None);
    }
    
    #[test]
    fn test_finalize_empty_document() {
        let mut doc = Document::empty("about:blank", DocumentKind::Xml);
        doc.finalize();
        
        assert!(!doc.is_html());
        assert!(!doc.body().is_valid());
    }
}
