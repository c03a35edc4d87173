//! # Taxtree - NCBI taxonomy in SQLite
//!
//! Loads the NCBI taxonomy dump into a local SQLite database and answers
//! two questions about any taxon:
//! - Which of its ancestors (itself included) sits at a given rank
//! - What is its full lineage up to the root
//!
//! Taxtree provides:
//! - A fixed rank enumeration matching the labels used in `nodes.dmp`
//! - A taxdump parser for `nodes.dmp` and `names.dmp`
//! - SQLite-backed storage with transactional bulk reload
//! - An in-memory arena of the hierarchy for bulk traversal
//! - A lineage resolver that works over either store

pub mod rank;
pub mod taxon;
pub mod tree;
pub mod dump;
pub mod storage;
pub mod loader;
pub mod resolver;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use rank::Rank;
pub use taxon::{TaxId, TaxonNode, RankedLineage};
pub use tree::TaxonTree;
pub use storage::{SqliteStore, StoreSnapshot};
pub use resolver::{LineageResolver, RecordStore};

/// Result type alias for Taxtree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Taxtree operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown rank: {0}")]
    UnknownRank(String),

    #[error("Taxon not found: {0}")]
    TaxonNotFound(TaxId),

    #[error("Taxon {child} references missing parent {parent}")]
    DanglingParent { child: TaxId, parent: TaxId },

    #[error("Corrupt hierarchy: walk from taxon {start} did not reach the root within {steps} steps")]
    CorruptHierarchy { start: TaxId, steps: usize },

    #[error("Dump file not found: {}", .0.display())]
    MissingDumpFile(std::path::PathBuf),

    #[error("Hierarchy has no root (expected exactly one self-parented taxon, found {0})")]
    MissingRoot(usize),
}
