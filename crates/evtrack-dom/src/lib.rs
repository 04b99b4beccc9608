//! evtrack DOM - Document Object Model
//!
//! Arena-based DOM tree that event targets are resolved against.

mod node;
mod tree;
mod document;
mod attributes;
pub mod xpath;

pub use node::{Node, NodeData, NodeType, ElementData, Attribute};
pub use tree::{DomTree, DomError, DomResult};
pub use document::{Document, DocumentKind};
pub use attributes::serialize_attrs;
pub use xpath::{PathResult, PathStep};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);
    
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);
    
    /// Check if this ID refers to a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }
    
    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
    
    #[inline]
    pub(crate) fn option(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}
