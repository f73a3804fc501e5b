//! LineageId - identifies a dispatch stream within its split tree
//!
//! Format: `{root}` for a top-level dispatch, `{root}.{half}.{half}...` for
//! descendants, where `half` is 0 (first half) or 1 (second half).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lineage of a dispatch stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineageId {
    root: u64,
    path: Vec<u8>,
}

impl LineageId {
    /// Lineage of a top-level dispatch
    pub fn root(root: u64) -> Self {
        Self {
            root,
            path: Vec::new(),
        }
    }

    /// Lineage of one half of a split
    pub fn child(&self, half: u8) -> Self {
        let mut path = self.path.clone();
        path.push(half);
        Self {
            root: self.root,
            path,
        }
    }

    /// Id of the top-level dispatch this stream descends from
    pub fn root_id(&self) -> u64 {
        self.root
    }

    /// Number of splits between the root and this stream
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Whether `self` is `other` or one of its descendants
    pub fn descends_from(&self, other: &LineageId) -> bool {
        self.root == other.root && self.path.starts_with(&other.path)
    }
}

impl fmt::Display for LineageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for half in &self.path {
            write!(f, ".{half}")?;
        }
        Ok(())
    }
}
