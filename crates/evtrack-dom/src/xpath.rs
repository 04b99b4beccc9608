//! Node paths in XPath notation
//!
//! A path names where a node sits in the document without holding on to the
//! node itself. By default the path is anchored at the nearest ancestor that
//! carries an `id` (`/*[@id='main']/ul/li[2]`); in absolute mode it always
//! starts at the document root (`/html/body/div/ul/li[2]`).
//!
//! Sibling indices are 1-based and only emitted when more than one sibling
//! shares the step's tag name (or, for text steps, when the parent has more
//! than one text child).

use std::fmt;

use crate::{Document, NodeData, NodeId};

/// One step of a node path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// `*[@id='value']`, always the first step of an anchored path
    IdAnchor(String),
    /// `tag` or `tag[index]`
    Element { tag: String, index: Option<usize> },
    /// `text()` or `text()[index]`
    Text { index: Option<usize> },
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdAnchor(id) => write!(f, "*[@id='{}']", id),
            Self::Element { tag, index: Some(i) } => write!(f, "{}[{}]", tag, i),
            Self::Element { tag, index: None } => f.write_str(tag),
            Self::Text { index: Some(i) } => write!(f, "text()[{}]", i),
            Self::Text { index: None } => f.write_str("text()"),
        }
    }
}

/// Ordered sequence of path steps, rendered as `/step/step/...`
///
/// The empty path renders as `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathResult {
    steps: Vec<PathStep>,
}

impl PathResult {
    /// The degenerate path of an unreachable node
    pub fn empty() -> Self {
        Self::default()
    }
    
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }
    
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
    
    /// Whether the path starts at an element with an `id`
    pub fn is_anchored(&self) -> bool {
        matches!(self.steps.first(), Some(PathStep::IdAnchor(_)))
    }
}

impl fmt::Display for PathResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("/");
        }
        for step in &self.steps {
            write!(f, "/{}", step)?;
        }
        Ok(())
    }
}

/// Compute the path of `node`
///
/// Walks element and text ancestors up to the document root, stopping early
/// at the first ancestor with an `id` unless `absolute` is set. A node that
/// is not connected to the document yields the empty path.
pub fn resolve(document: &Document, node: NodeId, absolute: bool) -> PathResult {
    let tree = document.tree();
    if !tree.is_connected(node) {
        tracing::trace!("Path requested for detached node {:?}", node);
        return PathResult::empty();
    }
    
    let mut steps = Vec::new();
    let mut current = Some(node);
    
    while let Some(id) = current {
        let Some(n) = tree.get(id) else { break };
        match &n.data {
            NodeData::Element(elem) => {
                if !absolute {
                    if let Some(value) = elem.id() {
                        steps.push(PathStep::IdAnchor(value.to_string()));
                        break;
                    }
                }
                let tag = if document.is_html() {
                    elem.tag_name.to_lowercase()
                } else {
                    elem.tag_name.clone()
                };
                let index = element_index(document, id, &elem.tag_name);
                steps.push(PathStep::Element { tag, index });
            }
            NodeData::Text(_) => {
                steps.push(PathStep::Text { index: text_index(document, id) });
            }
            _ => break,
        }
        current = tree.parent(id);
    }
    
    steps.reverse();
    PathResult { steps }
}

/// 1-based position among same-tag siblings, `None` when unique
fn element_index(document: &Document, node: NodeId, tag_name: &str) -> Option<usize> {
    let tree = document.tree();
    let parent = tree.parent(node)?;
    let same_tag: Vec<NodeId> = tree.children(parent)
        .filter(|(_, n)| n.as_element().is_some_and(|e| e.tag_name == tag_name))
        .map(|(id, _)| id)
        .collect();
    
    if same_tag.len() <= 1 {
        return None;
    }
    same_tag.iter().position(|&id| id == node).map(|i| i + 1)
}

/// 1-based position among text siblings, `None` when unique
fn text_index(document: &Document, node: NodeId) -> Option<usize> {
    let tree = document.tree();
    let parent = tree.parent(node)?;
    let texts: Vec<NodeId> = tree.children(parent)
        .filter(|(_, n)| n.is_text())
        .map(|(id, _)| id)
        .collect();
    
    if texts.len() <= 1 {
        return None;
    }
    texts.iter().position(|&id| id == node).map(|i| i + 1)
}

/// Look up the node a rendered path points at
///
/// Accepts the output of [`resolve`]. Returns `None` for the empty path `/`
/// or when any step has no match. Anchor ids are rendered verbatim, so an id
/// containing `']` or `/` is matched by trying each possible end of the
/// anchor in turn.
pub fn evaluate(document: &Document, path: &str) -> Option<NodeId> {
    let rest = path.strip_prefix('/')?;
    let root = document.tree().root();
    
    let Some(after) = rest.strip_prefix("*[@id='") else {
        if rest.is_empty() {
            return None;
        }
        return evaluate_steps(document, root, rest);
    };
    
    after.match_indices("']").find_map(|(end, _)| {
        let anchor = document.get_element_by_id(&after[..end])?;
        match &after[end + 2..] {
            "" => Some(anchor),
            tail => evaluate_steps(document, anchor, tail.strip_prefix('/')?),
        }
    })
}

fn evaluate_steps(document: &Document, from: NodeId, steps: &str) -> Option<NodeId> {
    steps.split('/').try_fold(from, |current, segment| evaluate_step(document, current, segment))
}

fn evaluate_step(document: &Document, parent: NodeId, segment: &str) -> Option<NodeId> {
    let (name, index) = match segment.find('[') {
        Some(open) => {
            let inner = segment[open + 1..].strip_suffix(']')?;
            (&segment[..open], inner.parse::<usize>().ok()?)
        }
        None => (segment, 1),
    };
    if index == 0 {
        return None;
    }
    
    let tree = document.tree();
    let is_text = name == "text()";
    tree.children(parent)
        .filter(|(_, n)| {
            if is_text {
                return n.is_text();
            }
            n.as_element().is_some_and(|e| {
                if document.is_html() {
                    e.tag_name.eq_ignore_ascii_case(name)
                } else {
                    e.tag_name == name
                }
            })
        })
        .nth(index - 1)
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocumentKind;
    
    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new("about:blank");
        let body = doc.body();
        let tree = doc.tree_mut();
        let first = tree.create_element("div");
        let span = tree.create_element("span");
        let second = tree.create_element("div");
        for id in [first, span, second] {
            tree.append_child(body, id).unwrap();
        }
        (doc, first, span, second)
    }
    
    #[test]
    fn test_sibling_indexing() {
        let (doc, first, span, second) = sample();
        
        assert_eq!(resolve(&doc, first, true).to_string(), "/html/body/div[1]");
        assert_eq!(resolve(&doc, second, true).to_string(), "/html/body/div[2]");
        assert_eq!(resolve(&doc, span, true).to_string(), "/html/body/span");
    }
    
    #[test]
    fn test_id_anchor() {
        let (mut doc, _, span, _) = sample();
        let body = doc.body();
        doc.tree_mut().set_attribute(body, "id", "page").unwrap();
        
        let path = resolve(&doc, span, false);
        assert!(path.is_anchored());
        assert_eq!(path.to_string(), "/*[@id='page']/span");
        
        let absolute = resolve(&doc, span, true);
        assert!(!absolute.is_anchored());
        assert_eq!(absolute.to_string(), "/html/body/span");
    }
    
    #[test]
    fn test_anchor_on_target_itself() {
        let (mut doc, first, _, _) = sample();
        doc.tree_mut().set_attribute(first, "id", "go").unwrap();
        
        assert_eq!(resolve(&doc, first, false).to_string(), "/*[@id='go']");
    }
    
    #[test]
    fn test_text_steps() {
        let (mut doc, first, _, _) = sample();
        let tree = doc.tree_mut();
        let a = tree.create_text("a");
        let b = tree.create_element("b");
        let c = tree.create_text("c");
        let inner = tree.create_text("inner");
        for id in [a, b, c] {
            tree.append_child(first, id).unwrap();
        }
        tree.append_child(b, inner).unwrap();
        
        assert_eq!(resolve(&doc, c, true).to_string(), "/html/body/div[1]/text()[2]");
        assert_eq!(resolve(&doc, inner, true).to_string(), "/html/body/div[1]/b/text()");
    }
    
    #[test]
    fn test_detached_node() {
        let mut doc = Document::new("about:blank");
        let orphan = doc.tree_mut().create_element("div");
        doc.tree_mut().set_attribute(orphan, "id", "lost").unwrap();
        
        let path = resolve(&doc, orphan, false);
        assert!(path.is_empty());
        assert_eq!(path.to_string(), "/");
    }
    
    #[test]
    fn test_document_node_is_empty_path() {
        let doc = Document::new("about:blank");
        assert_eq!(resolve(&doc, doc.tree().root(), false).to_string(), "/");
    }
    
    #[test]
    fn test_xml_case_preserved() {
        let mut doc = Document::empty("about:blank", DocumentKind::Xml);
        let tree = doc.tree_mut();
        let root = tree.create_element("Catalog");
        let item = tree.create_element("Item");
        tree.append_child(tree.root(), root).unwrap();
        tree.append_child(root, item).unwrap();
        
        assert_eq!(resolve(&doc, item, true).to_string(), "/Catalog/Item");
    }
    
    #[test]
    fn test_html_lowercases_tags() {
        let mut doc = Document::new("about:blank");
        let body = doc.body();
        let tree = doc.tree_mut();
        let upper = tree.create_element("DIV");
        tree.append_child(body, upper).unwrap();
        
        assert_eq!(resolve(&doc, upper, true).to_string(), "/html/body/div");
    }
    
    #[test]
    fn test_evaluate_round_trip() {
        let (mut doc, first, span, second) = sample();
        let body = doc.body();
        doc.tree_mut().set_attribute(body, "id", "page").unwrap();
        
        for node in [first, span, second] {
            let relative = resolve(&doc, node, false).to_string();
            let absolute = resolve(&doc, node, true).to_string();
            assert_eq!(evaluate(&doc, &relative), Some(node));
            assert_eq!(evaluate(&doc, &absolute), Some(node));
        }
        assert_eq!(evaluate(&doc, "/*[@id='page']"), Some(body));
    }
    
    #[test]
    fn test_evaluate_misses() {
        let (doc, _, _, _) = sample();
        
        assert_eq!(evaluate(&doc, "/"), None);
        assert_eq!(evaluate(&doc, "/html/body/div[3]"), None);
        assert_eq!(evaluate(&doc, "/html/body/div[0]"), None);
        assert_eq!(evaluate(&doc, "/*[@id='nope']"), None);
        assert_eq!(evaluate(&doc, "html"), None);
    }
    
    #[test]
    fn test_evaluate_ids_with_path_characters() {
        let (mut doc, first, _, second) = sample();
        let tree = doc.tree_mut();
        tree.set_attribute(first, "id", "a").unwrap();
        tree.set_attribute(second, "id", "a']/b").unwrap();
        let inner = tree.create_element("span");
        tree.append_child(second, inner).unwrap();
        
        let path = resolve(&doc, inner, false).to_string();
        assert_eq!(path, "/*[@id='a']/b']/span");
        assert_eq!(evaluate(&doc, &path), Some(inner));
        assert_eq!(evaluate(&doc, "/*[@id='a']/b']"), Some(second));
        assert_eq!(evaluate(&doc, "/*[@id='a']"), Some(first));
    }
}
