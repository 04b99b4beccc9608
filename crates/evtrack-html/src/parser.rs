//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it to our DOM format. Every text node
//! is kept, whitespace included, so text-step indices line up with what a
//! live page would report.

use evtrack_dom::{Document, DocumentKind, DomTree, NodeId};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::HtmlError;

/// HTML5 parser
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }
    
    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Result<Document, HtmlError> {
        self.parse_with_url(html, "about:blank")
    }
    
    /// Parse HTML with a document URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Document, HtmlError> {
        tracing::debug!("Parsing HTML document: {}", url);
        
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())?;
        
        let mut document = Document::empty(url, DocumentKind::Html);
        let root = document.tree().root();
        self.convert_node(&dom.document, document.tree_mut(), root);
        document.finalize();
        
        tracing::debug!("Parsed {} nodes", document.tree().len());
        Ok(document)
    }
    
    /// Convert an RcDom node (and its subtree) into `tree` under `parent`
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) {
        let id = match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent);
                }
                return;
            }
            RcNodeData::Doctype { name, .. } => tree.create_doctype(name),
            RcNodeData::Text { contents } => tree.create_text(&contents.borrow()),
            RcNodeData::Comment { contents } => tree.create_comment(contents),
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    if let Err(err) = tree.set_attribute(id, &attr.name.local, &attr.value) {
                        tracing::trace!("Dropping attribute {} on {:?}: {}", attr.name.local, id, err);
                    }
                }
                id
            }
            RcNodeData::ProcessingInstruction { .. } => return,
        };
        
        if let Err(err) = tree.append_child(parent, id) {
            tracing::trace!("Dropping unlinkable node {:?}: {}", id, err);
            return;
        }
        
        for child in handle.children.borrow().iter() {
            self.convert_node(child, tree, id);
        }
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_parse_simple() {
        let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
        let doc = HtmlParser::new().parse(html).unwrap();
        
        assert!(doc.tree().len() > 1, "Expected more than 1 node, got {}", doc.tree().len());
        assert!(doc.body().is_valid());
    }
    
    #[test]
    fn test_parse_fragment() {
        let html = "<div><span>Text</span></div>";
        let doc = HtmlParser::new().parse(html).unwrap();
        
        // Fragments get wrapped in html/head/body by html5ever
        assert!(doc.document_element().is_valid());
        assert!(doc.head().is_valid());
    }
    
    #[test]
    fn test_attributes_copied_in_source_order() {
        let html = r#"<body><a id="home" href="/x" class="y" data-k="v">Home</a></body>"#;
        let doc = HtmlParser::new().parse(html).unwrap();
        let link = doc.get_element_by_id("home").unwrap();
        let elem = doc.tree().get(link).and_then(|n| n.as_element()).unwrap();
        
        let names: Vec<&str> = elem.attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["id", "href", "class", "data-k"]);
        assert_eq!(
            evtrack_dom::serialize_attrs(&doc, link),
            r#"{"A":{"id":"home","href":"/x","class":"y","data-k":"v"}}"#
        );
    }
}
