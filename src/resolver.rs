//! Lineage Resolver
//!
//! Walks parent references to answer two questions about a taxon:
//! 1. The nearest ancestor (itself included) at a given rank
//! 2. The full ordered lineage up to the root
//!
//! The walk compares rank labels only. NCBI leaves many ranks out of many
//! lineages, so the number of hops between two ranks is never assumed.
//!
//! Every walk is bounded by the number of nodes in the store. A walk that
//! exceeds it is stuck in a cycle that does not pass through the root and
//! fails with `Error::CorruptHierarchy`.

use crate::rank::Rank;
use crate::taxon::{RankedLineage, TaxId, TaxonNode};
use crate::{Error, Result};

/// Read access to a persisted taxonomy.
///
/// `Node` lets in-memory stores hand out borrowed nodes while database
/// backed stores return owned rows.
pub trait RecordStore {
    type Node<'a>: AsRef<TaxonNode>
    where
        Self: 'a;

    /// Look up a node by identifier
    fn lookup(&self, tax_id: TaxId) -> Result<Option<Self::Node<'_>>>;

    /// Dereference a node's parent. Fails with `DanglingParent` when the
    /// parent identifier does not resolve.
    fn parent(&self, node: &TaxonNode) -> Result<Self::Node<'_>>;

    /// Total number of nodes, used to bound walks
    fn node_count(&self) -> Result<usize>;
}

/// Resolves ancestors and lineages over a `RecordStore`
pub struct LineageResolver<'s, S: RecordStore> {
    store: &'s S,
    max_steps: usize,
}

impl<'s, S: RecordStore + 's> LineageResolver<'s, S> {
    /// Create a resolver, reading the node count once as the walk bound
    pub fn new(store: &'s S) -> Result<Self> {
        let max_steps = store.node_count()?;
        Ok(Self { store, max_steps })
    }

    /// Fetch a starting node by identifier
    pub fn fetch(&self, tax_id: TaxId) -> Result<S::Node<'s>> {
        self.store
            .lookup(tax_id)?
            .ok_or(Error::TaxonNotFound(tax_id))
    }

    /// Nearest ancestor of `node` (inclusive) whose rank is `target`.
    ///
    /// Returns `Ok(None)` when the root is reached without a match.
    pub fn get_ancestor(&self, node: S::Node<'s>, target: Rank) -> Result<Option<S::Node<'s>>> {
        let start = node.as_ref().tax_id;
        let mut current = node;
        let mut steps = 0;

        loop {
            if current.as_ref().rank == target {
                return Ok(Some(current));
            }
            if current.as_ref().is_root() {
                return Ok(None);
            }
            current = self.step(start, &mut steps, current.as_ref())?;
        }
    }

    /// Ordered lineage from `node` to the root, both included
    pub fn get_lineage(&self, node: S::Node<'s>) -> Result<Vec<S::Node<'s>>> {
        let start = node.as_ref().tax_id;
        let mut lineage = Vec::new();
        let mut current = node;
        let mut steps = 0;

        while !current.as_ref().is_root() {
            let next = self.step(start, &mut steps, current.as_ref())?;
            lineage.push(current);
            current = next;
        }
        lineage.push(current);

        Ok(lineage)
    }

    /// Ancestors at the seven principal ranks, from a single lineage walk
    pub fn ranked_lineage(&self, node: S::Node<'s>) -> Result<RankedLineage> {
        let mut ranked = RankedLineage::default();
        for ancestor in self.get_lineage(node)? {
            let ancestor = ancestor.as_ref();
            if Rank::PRINCIPAL.contains(&ancestor.rank) && ranked.get(ancestor.rank).is_none() {
                ranked.set(ancestor.clone());
            }
        }
        Ok(ranked)
    }

    /// `get_ancestor` starting from an identifier
    pub fn ancestor_of(&self, tax_id: TaxId, target: Rank) -> Result<Option<S::Node<'s>>> {
        let node = self.fetch(tax_id)?;
        self.get_ancestor(node, target)
    }

    /// `get_lineage` starting from an identifier
    pub fn lineage_of(&self, tax_id: TaxId) -> Result<Vec<S::Node<'s>>> {
        let node = self.fetch(tax_id)?;
        self.get_lineage(node)
    }

    /// `ranked_lineage` starting from an identifier
    pub fn ranked_lineage_of(&self, tax_id: TaxId) -> Result<RankedLineage> {
        let node = self.fetch(tax_id)?;
        self.ranked_lineage(node)
    }

    /// Follow one parent reference, enforcing the walk bound
    fn step(&self, start: TaxId, steps: &mut usize, from: &TaxonNode) -> Result<S::Node<'s>> {
        if *steps >= self.max_steps {
            tracing::error!(
                "Taxon {} did not reach the root after {} steps; hierarchy is cyclic",
                start,
                steps
            );
            return Err(Error::CorruptHierarchy { start, steps: *steps });
        }
        *steps += 1;
        self.store.parent(from)
    }
}
