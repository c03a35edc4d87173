//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, Transaction, params, OptionalExtension};
use crate::{Result, Error};
use crate::rank::Rank;
use crate::resolver::RecordStore;
use crate::taxon::{TaxId, TaxonNode};
use crate::tree::TaxonTree;
use super::schema;

const SELECT_TAXON: &str = "SELECT tax_id, parent_id, rank, name FROM taxa";

/// SQLite-backed storage for the taxonomy
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist).
    ///
    /// File databases use WAL journaling so a reload can commit while
    /// snapshots on other connections keep reading the previous hierarchy.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!("Opened {} (journal_mode={})", path.display(), mode);
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Taxon Operations ==========

    /// Insert or replace a single row, bypassing the transactional reload.
    /// Tests use it to plant broken hierarchies.
    #[cfg(test)]
    fn insert_taxon(&self, node: &TaxonNode) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO taxa (tax_id, parent_id, rank, name) VALUES (?1, ?2, ?3, ?4)",
            params![node.tax_id.get(), node.parent_id.get(), node.rank.as_str(), node.name],
        )?;
        Ok(())
    }

    /// Get a taxon by identifier
    pub fn get_taxon(&self, tax_id: TaxId) -> Result<Option<TaxonNode>> {
        query_taxon(&self.conn, tax_id)
    }

    /// Find taxa whose scientific name is exactly `name`
    pub fn find_by_name(&self, name: &str) -> Result<Vec<TaxonNode>> {
        let mut stmt = self.conn.prepare(
            &format!("{} WHERE name = ?1 ORDER BY tax_id", SELECT_TAXON)
        )?;

        let taxa = stmt
            .query_map([name], row_to_taxon)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(taxa)
    }

    /// Find taxa by name pattern (LIKE query)
    pub fn find_by_name_pattern(&self, pattern: &str, limit: usize) -> Result<Vec<TaxonNode>> {
        let mut stmt = self.conn.prepare(
            &format!("{} WHERE name LIKE ?1 ORDER BY tax_id LIMIT ?2", SELECT_TAXON)
        )?;

        let taxa = stmt
            .query_map(params![pattern, limit as i64], row_to_taxon)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(taxa)
    }

    /// Count all taxa
    pub fn count_taxa(&self) -> Result<usize> {
        query_count(&self.conn)
    }

    /// Count taxa that carry a scientific name
    pub fn count_named(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM taxa WHERE name IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Number of taxa per rank, most common first
    pub fn rank_counts(&self) -> Result<Vec<(Rank, usize)>> {
        let mut stmt = self.conn.prepare(
            "SELECT rank, COUNT(*) AS n FROM taxa GROUP BY rank ORDER BY n DESC, rank"
        )?;

        let counts = stmt
            .query_map([], |row| {
                let rank = parse_rank_column(row, 0)?;
                let count: i64 = row.get(1)?;
                Ok((rank, count as usize))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(counts)
    }

    // ========== Bulk Operations ==========

    /// Replace the whole hierarchy with `nodes` in one transaction.
    ///
    /// Readers on other connections see either the old hierarchy or the
    /// new one, never a mix.
    pub fn replace_all(&mut self, nodes: &[TaxonNode]) -> Result<()> {
        self.replace_all_with_progress(nodes, |_| {})
    }

    /// `replace_all`, reporting the number of rows written so far
    pub fn replace_all_with_progress(
        &mut self,
        nodes: &[TaxonNode],
        mut on_progress: impl FnMut(usize),
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM taxa", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO taxa (tax_id, parent_id, rank, name) VALUES (?1, ?2, ?3, ?4)"
            )?;
            for (i, node) in nodes.iter().enumerate() {
                stmt.execute(params![
                    node.tax_id.get(),
                    node.parent_id.get(),
                    node.rank.as_str(),
                    node.name,
                ])?;
                if (i + 1) % 10_000 == 0 {
                    on_progress(i + 1);
                }
            }
        }
        tx.commit()?;
        on_progress(nodes.len());

        tracing::debug!("Replaced taxonomy with {} taxa", nodes.len());
        Ok(())
    }

    /// Read every row into an in-memory arena
    pub fn load_tree(&self) -> Result<TaxonTree> {
        let mut stmt = self.conn.prepare(SELECT_TAXON)?;
        let nodes = stmt
            .query_map([], row_to_taxon)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        TaxonTree::from_nodes(nodes)
    }

    /// Open a read transaction for a consistent view across many lookups
    pub fn snapshot(&self) -> Result<StoreSnapshot<'_>> {
        let tx = self.conn.unchecked_transaction()?;
        Ok(StoreSnapshot { tx })
    }

    /// Get database statistics.
    ///
    /// Reads the whole hierarchy to measure its depth, so this also fails
    /// on a corrupt hierarchy.
    pub fn stats(&self) -> Result<DbStats> {
        let taxa = self.count_taxa()?;
        let max_depth = if taxa == 0 { 0 } else { self.load_tree()?.max_depth()? };
        Ok(DbStats {
            taxa,
            named: self.count_named()?,
            ranks: self.rank_counts()?.len(),
            max_depth,
        })
    }
}

/// A read transaction over the store.
///
/// Every lookup made through a snapshot sees the same committed hierarchy,
/// even if another connection reloads the taxonomy in the meantime. The
/// transaction is rolled back when the snapshot is dropped.
pub struct StoreSnapshot<'c> {
    tx: Transaction<'c>,
}

impl RecordStore for StoreSnapshot<'_> {
    type Node<'a> = TaxonNode where Self: 'a;

    fn lookup(&self, tax_id: TaxId) -> Result<Option<Self::Node<'_>>> {
        query_taxon(&self.tx, tax_id)
    }

    fn parent(&self, node: &TaxonNode) -> Result<Self::Node<'_>> {
        resolve_parent(query_taxon(&self.tx, node.parent_id)?, node)
    }

    fn node_count(&self) -> Result<usize> {
        query_count(&self.tx)
    }
}

impl RecordStore for SqliteStore {
    type Node<'a> = TaxonNode;

    fn lookup(&self, tax_id: TaxId) -> Result<Option<Self::Node<'_>>> {
        self.get_taxon(tax_id)
    }

    fn parent(&self, node: &TaxonNode) -> Result<Self::Node<'_>> {
        resolve_parent(self.get_taxon(node.parent_id)?, node)
    }

    fn node_count(&self) -> Result<usize> {
        self.count_taxa()
    }
}

fn query_taxon(conn: &Connection, tax_id: TaxId) -> Result<Option<TaxonNode>> {
    conn.query_row(
        &format!("{} WHERE tax_id = ?1", SELECT_TAXON),
        [tax_id.get()],
        row_to_taxon,
    )
    .optional()
    .map_err(Into::into)
}

fn query_count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM taxa", [], |row| row.get(0))?;
    Ok(count as usize)
}

fn resolve_parent(parent: Option<TaxonNode>, child: &TaxonNode) -> Result<TaxonNode> {
    parent.ok_or(Error::DanglingParent {
        child: child.tax_id,
        parent: child.parent_id,
    })
}

fn row_to_taxon(row: &rusqlite::Row) -> rusqlite::Result<TaxonNode> {
    Ok(TaxonNode {
        tax_id: TaxId(row.get(0)?),
        parent_id: TaxId(row.get(1)?),
        rank: parse_rank_column(row, 2)?,
        name: row.get(3)?,
    })
}

fn parse_rank_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Rank> {
    let rank_str: String = row.get(idx)?;
    rank_str.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub taxa: usize,
    pub named: usize,
    pub ranks: usize,
    /// Hops from the deepest taxon to the root
    pub max_depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_taxa() -> Vec<TaxonNode> {
        vec![
            TaxonNode::new(1, 1, Rank::NoRank).with_name("root"),
            TaxonNode::new(2759, 1, Rank::Domain).with_name("Eukaryota"),
            TaxonNode::new(4751, 2759, Rank::Kingdom).with_name("Fungi"),
            TaxonNode::new(4930, 4751, Rank::Genus).with_name("Saccharomyces"),
            TaxonNode::new(4932, 4930, Rank::Species).with_name("Saccharomyces cerevisiae"),
            TaxonNode::new(1294385, 4930, Rank::Species),
        ]
    }

    #[test]
    fn test_taxon_crud() {
        let store = SqliteStore::open_in_memory().unwrap();
        let node = TaxonNode::new(4932, 4930, Rank::Species).with_name("Saccharomyces cerevisiae");
        store.insert_taxon(&node).unwrap();

        let retrieved = store.get_taxon(TaxId(4932)).unwrap().unwrap();
        assert_eq!(retrieved.parent_id, TaxId(4930));
        assert_eq!(retrieved.rank, Rank::Species);
        assert_eq!(retrieved.name.as_deref(), Some("Saccharomyces cerevisiae"));

        assert!(store.get_taxon(TaxId(1)).unwrap().is_none());
    }

    #[test]
    fn test_replace_all() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert_taxon(&TaxonNode::new(99, 99, Rank::NoRank)).unwrap();

        let mut reported = Vec::new();
        store
            .replace_all_with_progress(&sample_taxa(), |n| reported.push(n))
            .unwrap();

        assert_eq!(reported, vec![6]);
        assert_eq!(store.count_taxa().unwrap(), 6);
        assert!(store.get_taxon(TaxId(99)).unwrap().is_none());

        let stats = store.stats().unwrap();
        assert_eq!(stats.named, 5);
        assert_eq!(stats.ranks, 5);
        assert_eq!(stats.max_depth, 4);
    }

    #[test]
    fn test_failed_replace_keeps_old_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.replace_all(&sample_taxa()).unwrap();

        let mut duplicated = sample_taxa();
        duplicated.push(TaxonNode::new(4932, 1, Rank::Species));
        assert!(store.replace_all(&duplicated).is_err());

        assert_eq!(store.count_taxa().unwrap(), 6);
        assert_eq!(store.get_taxon(TaxId(4932)).unwrap().unwrap().parent_id, TaxId(4930));
    }

    #[test]
    fn test_find_by_name() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.replace_all(&sample_taxa()).unwrap();

        let exact = store.find_by_name("Saccharomyces").unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].tax_id, TaxId(4930));

        let pattern = store.find_by_name_pattern("Saccharomyces%", 10).unwrap();
        assert_eq!(pattern.len(), 2);

        let limited = store.find_by_name_pattern("%", 3).unwrap();
        assert_eq!(limited.len(), 3);
    }

    #[test]
    fn test_rank_counts() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.replace_all(&sample_taxa()).unwrap();

        let counts = store.rank_counts().unwrap();
        assert_eq!(counts[0], (Rank::Species, 2));
        assert_eq!(counts.len(), 5);
    }

    #[test]
    fn test_load_tree() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.replace_all(&sample_taxa()).unwrap();

        let tree = store.load_tree().unwrap();
        assert_eq!(tree.nodes().len(), 6);
        assert_eq!(tree.root().tax_id, TaxId::ROOT);
        tree.check_integrity().unwrap();
    }

    #[test]
    fn test_parent_dereference() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.replace_all(&sample_taxa()).unwrap();
        store.insert_taxon(&TaxonNode::new(555, 404, Rank::Strain)).unwrap();

        let yeast = store.get_taxon(TaxId(4932)).unwrap().unwrap();
        assert_eq!(store.parent(&yeast).unwrap().tax_id, TaxId(4930));

        let orphan = store.get_taxon(TaxId(555)).unwrap().unwrap();
        let err = store.parent(&orphan).unwrap_err();
        assert!(matches!(err, Error::DanglingParent { child: TaxId(555), parent: TaxId(404) }));
    }

    #[test]
    fn test_cycle_in_store_is_detected() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.replace_all(&sample_taxa()).unwrap();
        // Rewire the genus under its own species
        store.insert_taxon(&TaxonNode::new(4930, 4932, Rank::Genus)).unwrap();

        let resolver = crate::LineageResolver::new(&store).unwrap();
        let err = resolver.lineage_of(TaxId(1294385)).unwrap_err();
        assert!(matches!(err, Error::CorruptHierarchy { start: TaxId(1294385), .. }));
    }

    #[test]
    fn test_unknown_rank_in_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .conn
            .execute("INSERT INTO taxa (tax_id, parent_id, rank, name) VALUES (5, 1, 'bogus', NULL)", [])
            .unwrap();
        assert!(matches!(store.get_taxon(TaxId(5)), Err(Error::Storage(_))));
    }

    #[test]
    fn test_empty_stats() {
        let store = SqliteStore::open_in_memory().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.taxa, 0);
        assert_eq!(stats.max_depth, 0);
    }

    #[test]
    fn test_stats_fail_on_cycle() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.replace_all(&sample_taxa()).unwrap();
        store.insert_taxon(&TaxonNode::new(4930, 4932, Rank::Genus)).unwrap();

        assert!(matches!(store.stats(), Err(Error::CorruptHierarchy { .. })));
    }

    fn lineage_ids<S: RecordStore>(store: &S, tax_id: u32) -> Vec<u32> {
        crate::LineageResolver::new(store)
            .unwrap()
            .lineage_of(TaxId(tax_id))
            .unwrap()
            .iter()
            .map(|n| n.as_ref().tax_id.get())
            .collect()
    }

    #[test]
    fn test_snapshot_is_isolated_from_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxa.db");
        let mut writer = SqliteStore::open(&path).unwrap();
        writer.replace_all(&sample_taxa()).unwrap();

        let reader = SqliteStore::open(&path).unwrap();
        let snapshot = reader.snapshot().unwrap();
        let resolver = crate::LineageResolver::new(&snapshot).unwrap();
        let species = resolver.fetch(TaxId(4932)).unwrap();

        // Move the species straight under the kingdom and drop its genus
        let mut moved = sample_taxa();
        moved.retain(|n| n.tax_id != TaxId(4930) && n.tax_id != TaxId(1294385));
        moved.iter_mut().find(|n| n.tax_id == TaxId(4932)).unwrap().parent_id = TaxId(4751);
        writer.replace_all(&moved).unwrap();

        let lineage: Vec<u32> = resolver
            .get_lineage(species)
            .unwrap()
            .iter()
            .map(|n| n.tax_id.get())
            .collect();
        assert_eq!(lineage, vec![4932, 4930, 4751, 2759, 1]);
        assert_eq!(snapshot.node_count().unwrap(), 6);

        drop(resolver);
        drop(snapshot);
        assert_eq!(lineage_ids(&reader.snapshot().unwrap(), 4932), vec![4932, 4751, 2759, 1]);
        assert_eq!(lineage_ids(&reader, 4932), vec![4932, 4751, 2759, 1]);
    }
}
