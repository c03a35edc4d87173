//! Taxon Tree - in-memory arena of the taxonomy
//!
//! Nodes live in a single `Vec`; parent links are stored as indices into
//! it, and an id → index map serves lookups. Built either from a parsed dump
//! before it is written to SQLite, or from the store for bulk traversal.

use std::collections::HashMap;
use crate::resolver::RecordStore;
use crate::taxon::{TaxId, TaxonNode};
use crate::{Error, Result};

/// Arena of taxon nodes with index-based parent links.
#[derive(Debug)]
pub struct TaxonTree {
    /// All nodes, in insertion order
    nodes: Vec<TaxonNode>,
    /// `parents[i]` is the index of the parent of `nodes[i]`
    parents: Vec<usize>,
    /// tax_id → index into `nodes`
    index: HashMap<TaxId, usize>,
    /// Index of the self-parented root
    root: usize,
}

impl TaxonTree {
    /// Build the arena, resolving every parent reference.
    ///
    /// Fails on duplicate identifiers, on parents that are not in `nodes`,
    /// and unless exactly one node is its own parent. Cycles are not looked
    /// for here; see `check_integrity`.
    pub fn from_nodes(nodes: Vec<TaxonNode>) -> Result<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.tax_id, i).is_some() {
                return Err(Error::Parse(format!("Duplicate taxon {}", node.tax_id)));
            }
        }

        let mut parents = Vec::with_capacity(nodes.len());
        let mut roots = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            let parent = *index.get(&node.parent_id).ok_or(Error::DanglingParent {
                child: node.tax_id,
                parent: node.parent_id,
            })?;
            if parent == i {
                roots.push(i);
            }
            parents.push(parent);
        }

        let root = match roots.as_slice() {
            [root] => *root,
            other => return Err(Error::MissingRoot(other.len())),
        };

        tracing::debug!("Built taxon tree with {} nodes, root {}", nodes.len(), nodes[root].tax_id);

        Ok(Self { nodes, parents, index, root })
    }

    /// Verify that every node reaches the root.
    ///
    /// Each node is visited once: paths are marked while walked and
    /// settled once they join the root or an already settled path.
    pub fn check_integrity(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnPath,
            Settled,
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        marks[self.root] = Mark::Settled;
        let mut path = Vec::new();

        for start in 0..self.nodes.len() {
            let mut current = start;
            while marks[current] == Mark::Unvisited {
                marks[current] = Mark::OnPath;
                path.push(current);
                current = self.parents[current];
            }
            if marks[current] == Mark::OnPath {
                return Err(Error::CorruptHierarchy {
                    start: self.nodes[start].tax_id,
                    steps: path.len(),
                });
            }
            for i in path.drain(..) {
                marks[i] = Mark::Settled;
            }
        }

        Ok(())
    }

    /// The root node
    pub fn root(&self) -> &TaxonNode {
        &self.nodes[self.root]
    }

    /// Get a node by identifier
    pub fn get(&self, tax_id: TaxId) -> Option<&TaxonNode> {
        self.index.get(&tax_id).map(|&i| &self.nodes[i])
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> &[TaxonNode] {
        &self.nodes
    }

    /// Largest number of hops from any node to the root.
    ///
    /// Depths are memoized along each walked path, so every node is
    /// settled once. Fails with `CorruptHierarchy` on a non-root cycle.
    pub fn max_depth(&self) -> Result<usize> {
        let mut depths: Vec<Option<usize>> = vec![None; self.nodes.len()];
        depths[self.root] = Some(0);
        let mut path = Vec::new();

        for start in 0..self.nodes.len() {
            let mut current = start;
            let mut base = depths[current];
            while base.is_none() {
                if path.len() >= self.nodes.len() {
                    return Err(Error::CorruptHierarchy {
                        start: self.nodes[start].tax_id,
                        steps: path.len(),
                    });
                }
                path.push(current);
                current = self.parents[current];
                base = depths[current];
            }

            let mut depth = base.unwrap_or_default();
            while let Some(i) = path.pop() {
                depth += 1;
                depths[i] = Some(depth);
            }
        }

        Ok(depths.into_iter().flatten().max().unwrap_or_default())
    }
}

impl RecordStore for TaxonTree {
    type Node<'a> = &'a TaxonNode;

    fn lookup(&self, tax_id: TaxId) -> Result<Option<Self::Node<'_>>> {
        Ok(self.get(tax_id))
    }

    fn parent(&self, node: &TaxonNode) -> Result<Self::Node<'_>> {
        let i = *self.index.get(&node.tax_id).ok_or(Error::TaxonNotFound(node.tax_id))?;
        Ok(&self.nodes[self.parents[i]])
    }

    fn node_count(&self) -> Result<usize> {
        Ok(self.nodes.len())
    }
}
