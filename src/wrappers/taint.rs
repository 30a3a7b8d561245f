//! Modification tracking shared between a wrapper and its owner.
//!
//! Every wrapper holds one [`Taint`]. Nested wrappers (a step's tool, a
//! workflow's steps) hold a weak link to their owner's node; marking a node
//! modified walks that chain upward. The link never keeps an owner alive and
//! is never used to reach the owner's data.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

#[derive(Debug, Default)]
struct TaintNode {
    modified: AtomicBool,
    parent: Option<Weak<TaintNode>>,
}

/// Modified flag with an optional upward propagation link.
#[derive(Debug)]
pub struct Taint {
    node: Arc<TaintNode>,
}

impl Default for Taint {
    fn default() -> Self {
        Self::new()
    }
}

impl Taint {
    /// A clean flag with no owner.
    pub fn new() -> Self {
        Self {
            node: Arc::new(TaintNode::default()),
        }
    }

    /// A clean flag whose modifications propagate to `parent`.
    pub fn with_parent(parent: &Taint) -> Self {
        Self {
            node: Arc::new(TaintNode {
                modified: AtomicBool::new(false),
                parent: Some(Arc::downgrade(&parent.node)),
            }),
        }
    }

    /// Mark this node and every live ancestor modified.
    pub fn mark_modified(&self) {
        self.node.modified.store(true, Ordering::Relaxed);
        let mut next = self.node.parent.as_ref().and_then(Weak::upgrade);
        while let Some(node) = next {
            node.modified.store(true, Ordering::Relaxed);
            next = node.parent.as_ref().and_then(Weak::upgrade);
        }
    }

    pub fn is_modified(&self) -> bool {
        self.node.modified.load(Ordering::Relaxed)
    }

    /// True when `parent` is the node this one propagates to.
    pub fn is_child_of(&self, parent: &Taint) -> bool {
        self.node
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|p| Arc::ptr_eq(&p, &parent.node))
    }
}
