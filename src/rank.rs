//! Rank enumeration
//!
//! Every node in `nodes.dmp` carries one of a fixed set of rank labels.
//! The resolver only compares ranks for identity; the declaration order
//! below runs from the broadest rank to the narrowest but nothing depends
//! on it.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Taxonomic rank labels as they appear in the NCBI taxdump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Rank {
    Superkingdom,
    Domain,
    Realm,
    Kingdom,
    Subkingdom,
    Superphylum,
    Phylum,
    Subphylum,
    Superclass,
    Class,
    Subclass,
    Infraclass,
    Cohort,
    Subcohort,
    Superorder,
    Order,
    Suborder,
    Infraorder,
    Parvorder,
    Superfamily,
    Family,
    Subfamily,
    Tribe,
    Subtribe,
    Genus,
    Subgenus,
    Section,
    Subsection,
    Series,
    SpeciesGroup,
    SpeciesSubgroup,
    Species,
    Subspecies,
    Varietas,
    Subvariety,
    Forma,
    FormaSpecialis,
    Strain,
    Isolate,
    Serogroup,
    Serotype,
    Biotype,
    Genotype,
    Morph,
    Pathogroup,
    Clade,
    AcellularRoot,
    CellularRoot,
    /// Placeholder rank used by NCBI for unranked groupings (including the root)
    NoRank,
}

impl Rank {
    /// The seven principal Linnaean ranks, broadest first
    pub const PRINCIPAL: [Rank; 7] = [
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
    ];

    /// Get the label exactly as written in `nodes.dmp`
    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Superkingdom => "superkingdom",
            Rank::Domain => "domain",
            Rank::Realm => "realm",
            Rank::Kingdom => "kingdom",
            Rank::Subkingdom => "subkingdom",
            Rank::Superphylum => "superphylum",
            Rank::Phylum => "phylum",
            Rank::Subphylum => "subphylum",
            Rank::Superclass => "superclass",
            Rank::Class => "class",
            Rank::Subclass => "subclass",
            Rank::Infraclass => "infraclass",
            Rank::Cohort => "cohort",
            Rank::Subcohort => "subcohort",
            Rank::Superorder => "superorder",
            Rank::Order => "order",
            Rank::Suborder => "suborder",
            Rank::Infraorder => "infraorder",
            Rank::Parvorder => "parvorder",
            Rank::Superfamily => "superfamily",
            Rank::Family => "family",
            Rank::Subfamily => "subfamily",
            Rank::Tribe => "tribe",
            Rank::Subtribe => "subtribe",
            Rank::Genus => "genus",
            Rank::Subgenus => "subgenus",
            Rank::Section => "section",
            Rank::Subsection => "subsection",
            Rank::Series => "series",
            Rank::SpeciesGroup => "species group",
            Rank::SpeciesSubgroup => "species subgroup",
            Rank::Species => "species",
            Rank::Subspecies => "subspecies",
            Rank::Varietas => "varietas",
            Rank::Subvariety => "subvariety",
            Rank::Forma => "forma",
            Rank::FormaSpecialis => "forma specialis",
            Rank::Strain => "strain",
            Rank::Isolate => "isolate",
            Rank::Serogroup => "serogroup",
            Rank::Serotype => "serotype",
            Rank::Biotype => "biotype",
            Rank::Genotype => "genotype",
            Rank::Morph => "morph",
            Rank::Pathogroup => "pathogroup",
            Rank::Clade => "clade",
            Rank::AcellularRoot => "acellular root",
            Rank::CellularRoot => "cellular root",
            Rank::NoRank => "no rank",
        }
    }

    /// Get all ranks
    pub fn all() -> &'static [Rank] {
        &[
            Rank::Superkingdom,
            Rank::Domain,
            Rank::Realm,
            Rank::Kingdom,
            Rank::Subkingdom,
            Rank::Superphylum,
            Rank::Phylum,
            Rank::Subphylum,
            Rank::Superclass,
            Rank::Class,
            Rank::Subclass,
            Rank::Infraclass,
            Rank::Cohort,
            Rank::Subcohort,
            Rank::Superorder,
            Rank::Order,
            Rank::Suborder,
            Rank::Infraorder,
            Rank::Parvorder,
            Rank::Superfamily,
            Rank::Family,
            Rank::Subfamily,
            Rank::Tribe,
            Rank::Subtribe,
            Rank::Genus,
            Rank::Subgenus,
            Rank::Section,
            Rank::Subsection,
            Rank::Series,
            Rank::SpeciesGroup,
            Rank::SpeciesSubgroup,
            Rank::Species,
            Rank::Subspecies,
            Rank::Varietas,
            Rank::Subvariety,
            Rank::Forma,
            Rank::FormaSpecialis,
            Rank::Strain,
            Rank::Isolate,
            Rank::Serogroup,
            Rank::Serotype,
            Rank::Biotype,
            Rank::Genotype,
            Rank::Morph,
            Rank::Pathogroup,
            Rank::Clade,
            Rank::AcellularRoot,
            Rank::CellularRoot,
            Rank::NoRank,
        ]
    }
}

impl FromStr for Rank {
    type Err = Error;

    /// Accepts the taxdump label, case-insensitively. Underscores and
    /// hyphens are read as spaces so `species_group` works on the command line.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        Rank::all()
            .iter()
            .copied()
            .find(|rank| rank.as_str() == normalized)
            .ok_or_else(|| Error::UnknownRank(s.to_string()))
    }
}

impl TryFrom<String> for Rank {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Rank> for String {
    fn from(rank: Rank) -> String {
        rank.as_str().to_string()
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_roundtrip() {
        for rank in Rank::all() {
            let parsed: Rank = rank.as_str().parse().unwrap();
            assert_eq!(*rank, parsed);
        }
    }

    #[test]
    fn test_rank_spellings() {
        assert_eq!(Rank::from_str("Kingdom").unwrap(), Rank::Kingdom);
        assert_eq!(Rank::from_str("species_group").unwrap(), Rank::SpeciesGroup);
        assert_eq!(Rank::from_str("no-rank").unwrap(), Rank::NoRank);
        assert_eq!(Rank::from_str(" forma specialis ").unwrap(), Rank::FormaSpecialis);
    }

    #[test]
    fn test_serializes_as_dump_label() {
        let json = serde_json::to_string(&Rank::SpeciesGroup).unwrap();
        assert_eq!(json, "\"species group\"");
        let back: Rank = serde_json::from_str("\"no rank\"").unwrap();
        assert_eq!(back, Rank::NoRank);
    }

    #[test]
    fn test_unknown_rank() {
        let err = Rank::from_str("subsubgenus").unwrap_err();
        assert!(matches!(err, Error::UnknownRank(ref s) if s == "subsubgenus"));
    }
}
