//! Attribute serialization
//!
//! Event records carry the target's own attributes as a one-level JSON
//! object keyed by the element's node name: `{"A":{"href":"/x"}}`.

use serde_json::{Map, Value};

use crate::{Document, NodeId};

/// Serialize the attributes of `node`
///
/// Non-element nodes and missing nodes serialize as `{}`.
pub fn serialize_attrs(document: &Document, node: NodeId) -> String {
    let Some(elem) = document.tree().get(node).and_then(|n| n.as_element()) else {
        return "{}".to_string();
    };
    
    let attrs: Map<String, Value> = elem.attrs.iter()
        .map(|a| (a.name.clone(), Value::String(a.value.clone())))
        .collect();
    
    // nodeName is upper-case for HTML elements
    let node_name = if document.is_html() {
        elem.tag_name.to_uppercase()
    } else {
        elem.tag_name.clone()
    };
    
    let mut outer = Map::new();
    outer.insert(node_name, Value::Object(attrs));
    Value::Object(outer).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocumentKind;
    
    #[test]
    fn test_serialize_element_attrs() {
        let mut doc = Document::new("about:blank");
        let body = doc.body();
        let tree = doc.tree_mut();
        let button = tree.create_element("button");
        tree.append_child(body, button).unwrap();
        tree.set_attribute(button, "id", "go").unwrap();
        
        assert_eq!(serialize_attrs(&doc, button), r#"{"BUTTON":{"id":"go"}}"#);
    }
    
    #[test]
    fn test_attribute_order_kept() {
        let mut doc = Document::new("about:blank");
        let body = doc.body();
        let tree = doc.tree_mut();
        let link = tree.create_element("a");
        tree.append_child(body, link).unwrap();
        tree.set_attribute(link, "href", "/x").unwrap();
        tree.set_attribute(link, "class", "y").unwrap();
        
        assert_eq!(serialize_attrs(&doc, link), r#"{"A":{"href":"/x","class":"y"}}"#);
    }
    
    #[test]
    fn test_serialize_without_attrs() {
        let doc = Document::new("about:blank");
        assert_eq!(serialize_attrs(&doc, doc.body()), r#"{"BODY":{}}"#);
    }
    
    #[test]
    fn test_serialize_non_elements() {
        let mut doc = Document::new("about:blank");
        let text = doc.tree_mut().create_text("hello");
        
        assert_eq!(serialize_attrs(&doc, doc.tree().root()), "{}");
        assert_eq!(serialize_attrs(&doc, text), "{}");
        assert_eq!(serialize_attrs(&doc, NodeId::NONE), "{}");
    }
    
    #[test]
    fn test_xml_node_name_verbatim() {
        let mut doc = Document::empty("about:blank", DocumentKind::Xml);
        let tree = doc.tree_mut();
        let item = tree.create_element("svg:Rect");
        tree.append_child(tree.root(), item).unwrap();
        tree.set_attribute(item, "width", "10").unwrap();
        
        assert_eq!(serialize_attrs(&doc, item), r#"{"svg:Rect":{"width":"10"}}"#);
    }
}
