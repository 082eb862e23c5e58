//! Entity pipelines.
//!
//! Each pipeline turns one raw input collection into one output collection
//! in a single forward pass. Users and groups also feed the
//! [`ReferenceTable`](crate::refs::ReferenceTable) that group membership is
//! resolved against.

pub mod computers;
pub mod domains;
pub mod groups;
pub mod users;

use std::collections::HashSet;

use serde::Serialize;

use crate::bloodhound::{CollectionKind, OutputDocument};

/// The result of running one pipeline.
#[derive(Debug, Clone)]
pub struct Collection<N> {
    pub kind: CollectionKind,
    pub nodes: Vec<N>,
    /// Records dropped because they lacked a usable identifier or repeated
    /// one already emitted.
    pub skipped: usize,
    /// Group member references that did not resolve.
    pub unresolved_members: usize,
    emitted: HashSet<String>,
}

impl<N> Collection<N> {
    pub fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            skipped: 0,
            unresolved_members: 0,
            emitted: HashSet::new(),
        }
    }

    /// Append `node` unless a node with `object_id` is already in the
    /// collection. A repeat is counted as skipped and `false` is returned.
    pub fn push_unique(&mut self, object_id: &str, node: N) -> bool {
        if !self.emitted.insert(object_id.to_string()) {
            self.skipped += 1;
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn count(&self) -> usize {
        self.nodes.len()
    }
}

impl<N: Serialize> Collection<N> {
    /// The versioned document wrapping these nodes.
    pub fn document(&self) -> OutputDocument<'_, N> {
        OutputDocument::new(self.kind, &self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_unique_skips_repeats() {
        let mut out = Collection::new(CollectionKind::Users);
        assert!(out.push_unique("S-1-5-21-1-2-3-1104", 1));
        assert!(out.push_unique("S-1-5-21-1-2-3-1105", 2));
        assert!(!out.push_unique("S-1-5-21-1-2-3-1104", 3));
        assert_eq!(out.nodes, vec![1, 2]);
        assert_eq!(out.count(), 2);
        assert_eq!(out.skipped, 1);
    }
}
