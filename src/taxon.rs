//! Taxon types
//!
//! A `TaxonNode` is one row of the taxonomy: an identifier, a rank, a
//! reference to the parent's identifier and the scientific name. The root
//! is the only node whose parent is itself.

use crate::rank::Rank;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// NCBI taxonomy identifier (e.g. 9606 for Homo sapiens)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxId(pub u32);

impl TaxId {
    /// Identifier of the NCBI root node
    pub const ROOT: TaxId = TaxId(1);

    pub fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for TaxId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u32>()
            .map(TaxId)
            .map_err(|e| Error::Parse(format!("Invalid taxonomy id '{}': {}", s, e)))
    }
}

impl std::fmt::Display for TaxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the taxonomy hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonNode {
    /// Unique, stable identifier
    pub tax_id: TaxId,
    /// Identifier of the parent node (equal to `tax_id` for the root)
    pub parent_id: TaxId,
    /// Taxonomic rank
    pub rank: Rank,
    /// Scientific name, if one was present in `names.dmp`
    pub name: Option<String>,
}

impl TaxonNode {
    /// Create a node without a name
    pub fn new(tax_id: u32, parent_id: u32, rank: Rank) -> Self {
        Self {
            tax_id: TaxId(tax_id),
            parent_id: TaxId(parent_id),
            rank,
            name: None,
        }
    }

    /// Set the scientific name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The root is the node that is its own parent
    pub fn is_root(&self) -> bool {
        self.tax_id == self.parent_id
    }

    /// Name for display, falling back to the identifier
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("taxon {}", self.tax_id),
        }
    }
}

impl AsRef<TaxonNode> for TaxonNode {
    fn as_ref(&self) -> &TaxonNode {
        self
    }
}

impl PartialEq for TaxonNode {
    fn eq(&self, other: &Self) -> bool {
        self.tax_id == other.tax_id
    }
}

impl Eq for TaxonNode {}

impl std::hash::Hash for TaxonNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.tax_id.hash(state);
    }
}

/// Ancestors of a taxon at the seven principal ranks.
///
/// Each slot holds the nearest node of that rank on the lineage (the taxon
/// itself included), or `None` when the lineage skips the rank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankedLineage {
    pub kingdom: Option<TaxonNode>,
    pub phylum: Option<TaxonNode>,
    pub class: Option<TaxonNode>,
    pub order: Option<TaxonNode>,
    pub family: Option<TaxonNode>,
    pub genus: Option<TaxonNode>,
    pub species: Option<TaxonNode>,
}

impl RankedLineage {
    /// Get the slot for one of the principal ranks
    pub fn get(&self, rank: Rank) -> Option<&TaxonNode> {
        match rank {
            Rank::Kingdom => self.kingdom.as_ref(),
            Rank::Phylum => self.phylum.as_ref(),
            Rank::Class => self.class.as_ref(),
            Rank::Order => self.order.as_ref(),
            Rank::Family => self.family.as_ref(),
            Rank::Genus => self.genus.as_ref(),
            Rank::Species => self.species.as_ref(),
            _ => None,
        }
    }

    /// Fill the slot for `node.rank`; non-principal ranks are ignored
    pub(crate) fn set(&mut self, node: TaxonNode) {
        let slot = match node.rank {
            Rank::Kingdom => &mut self.kingdom,
            Rank::Phylum => &mut self.phylum,
            Rank::Class => &mut self.class,
            Rank::Order => &mut self.order,
            Rank::Family => &mut self.family,
            Rank::Genus => &mut self.genus,
            Rank::Species => &mut self.species,
            _ => return,
        };
        *slot = Some(node);
    }

    /// Iterate the principal ranks, broadest first, with their slots
    pub fn iter(&self) -> impl Iterator<Item = (Rank, Option<&TaxonNode>)> + '_ {
        Rank::PRINCIPAL.iter().map(move |rank| (*rank, self.get(*rank)))
    }
}

impl std::fmt::Display for RankedLineage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = |node: Option<&TaxonNode>| node.map(TaxonNode::display_name).unwrap_or_default();
        write!(
            f,
            "Lineage<kingdom={}, phylum={}, class={}, order={}, family={}, genus={}, species={}>",
            name(self.kingdom.as_ref()),
            name(self.phylum.as_ref()),
            name(self.class.as_ref()),
            name(self.order.as_ref()),
            name(self.family.as_ref()),
            name(self.genus.as_ref()),
            name(self.species.as_ref()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_detection() {
        assert!(TaxonNode::new(1, 1, Rank::NoRank).is_root());
        assert!(!TaxonNode::new(9606, 9605, Rank::Species).is_root());
    }

    #[test]
    fn test_taxid_parse() {
        assert_eq!(TaxId::from_str(" 9606 ").unwrap(), TaxId(9606));
        assert!(matches!(TaxId::from_str("human"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_equality_by_id() {
        let a = TaxonNode::new(9606, 9605, Rank::Species).with_name("Homo sapiens");
        let b = TaxonNode::new(9606, 9605, Rank::Species);
        assert_eq!(a, b);
    }

    #[test]
    fn test_ranked_lineage_display() {
        let mut lineage = RankedLineage::default();
        lineage.set(TaxonNode::new(9605, 9604, Rank::Genus).with_name("Homo"));
        lineage.set(TaxonNode::new(9606, 9605, Rank::Species).with_name("Homo sapiens"));
        lineage.set(TaxonNode::new(207598, 9604, Rank::Subfamily).with_name("Homininae"));

        assert_eq!(
            lineage.to_string(),
            "Lineage<kingdom=, phylum=, class=, order=, family=, genus=Homo, species=Homo sapiens>"
        );
        assert_eq!(lineage.get(Rank::Genus).unwrap().tax_id, TaxId(9605));
        assert!(lineage.get(Rank::Subfamily).is_none());
    }
}
