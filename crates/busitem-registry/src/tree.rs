use crate::{PointRegistry, RegistryError, Result};
use std::collections::BTreeMap;

/// Maximum number of children below any one node.
pub const NODE_CHILD_MAX: usize = 20;

/// Non-empty segments of a `/`-delimited path. Leading, trailing and doubled
/// delimiters contribute nothing, so `""` and `"/"` both name the root.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// One segment of the namespace. The root carries an empty name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathNode {
    pub name: String,
    children: BTreeMap<String, PathNode>,
}

impl PathNode {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: BTreeMap::new(),
        }
    }

    /// Children in name order.
    pub fn children(&self) -> impl Iterator<Item = &PathNode> {
        self.children.values()
    }

    pub fn child(&self, name: &str) -> Option<&PathNode> {
        self.children.get(name)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn count(&self) -> usize {
        1 + self.children.values().map(PathNode::count).sum::<usize>()
    }
}

/// Hierarchical index over registry paths, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathTree {
    root: PathNode,
}

impl PathTree {
    pub fn build(registry: &PointRegistry) -> Result<Self> {
        let mut tree = Self::default();
        for path in registry.paths() {
            tree.insert(path)?;
        }
        tracing::debug!(nodes = tree.node_count(), "path tree built");
        Ok(tree)
    }

    /// Walk `path` from the root, creating missing segments and reusing present ones.
    pub fn insert(&mut self, path: &str) -> Result<()> {
        let mut node = &mut self.root;
        for seg in segments(path) {
            if !node.children.contains_key(seg) && node.children.len() >= NODE_CHILD_MAX {
                let parent = if node.name.is_empty() {
                    "/".to_string()
                } else {
                    node.name.clone()
                };
                return Err(RegistryError::FanOutExceeded {
                    parent,
                    max: NODE_CHILD_MAX,
                });
            }
            node = node
                .children
                .entry(seg.to_string())
                .or_insert_with(|| PathNode::named(seg));
        }
        Ok(())
    }

    /// Node addressed by `path`, if every segment matches an existing child.
    pub fn find(&self, path: &str) -> Option<&PathNode> {
        segments(path).try_fold(&self.root, |node, seg| node.child(seg))
    }

    pub fn root(&self) -> &PathNode {
        &self.root
    }

    /// Total node count including the root.
    pub fn node_count(&self) -> usize {
        self.root.count()
    }
}
