//! Taxdump loader
//!
//! Reads `names.dmp` and `nodes.dmp` from an extracted dump directory,
//! checks that the result is a proper tree, and swaps it into the store in
//! a single transaction. Nothing is written unless the whole dump is sound.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use crate::dump::{self, TaxdumpParser, NAMES_FILE, NODES_FILE};
use crate::storage::SqliteStore;
use crate::tree::TaxonTree;
use crate::{Error, Result};

/// Stages of a load, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    ReadingNames,
    ReadingNodes,
    Verifying,
    Writing,
}

impl LoadPhase {
    pub fn describe(&self) -> &'static str {
        match self {
            LoadPhase::ReadingNames => "Reading names.dmp",
            LoadPhase::ReadingNodes => "Reading nodes.dmp",
            LoadPhase::Verifying => "Verifying hierarchy",
            LoadPhase::Writing => "Writing taxa",
        }
    }
}

/// Progress notifications emitted while loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    Started(LoadPhase),
    Written { rows: usize, total: usize },
    Finished(LoadPhase),
}

/// A parsed and verified dump, not yet written anywhere
#[derive(Debug)]
pub struct Taxdump {
    pub tree: TaxonTree,
    /// Taxa that received a scientific name
    pub named: usize,
    /// Malformed lines across both files
    pub skipped: usize,
    /// Taxa stored as `no rank` because their rank label was not recognized
    pub unknown_ranks: usize,
}

/// Outcome of a successful load
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoadReport {
    pub taxa: usize,
    pub named: usize,
    pub skipped: usize,
    pub unknown_ranks: usize,
    pub elapsed: Duration,
}

/// Parse and verify the dump in `dump_dir`
pub fn read_taxdump(dump_dir: &Path, on_event: &mut impl FnMut(LoadEvent)) -> Result<Taxdump> {
    let parser = TaxdumpParser::new();

    on_event(LoadEvent::Started(LoadPhase::ReadingNames));
    let (names, names_stats) = parser.parse_names(open_dump_file(dump_dir, NAMES_FILE)?)?;
    on_event(LoadEvent::Finished(LoadPhase::ReadingNames));

    on_event(LoadEvent::Started(LoadPhase::ReadingNodes));
    let (mut nodes, nodes_stats) = parser.parse_nodes(open_dump_file(dump_dir, NODES_FILE)?)?;
    on_event(LoadEvent::Finished(LoadPhase::ReadingNodes));

    let named = dump::attach_names(&mut nodes, names);
    if named < nodes.len() {
        warn!("{} of {} taxa have no scientific name", nodes.len() - named, nodes.len());
    }

    on_event(LoadEvent::Started(LoadPhase::Verifying));
    let tree = TaxonTree::from_nodes(nodes)?;
    tree.check_integrity()?;
    on_event(LoadEvent::Finished(LoadPhase::Verifying));

    Ok(Taxdump {
        tree,
        named,
        skipped: names_stats.skipped + nodes_stats.skipped,
        unknown_ranks: nodes_stats.unknown_ranks,
    })
}

/// Replace the contents of `store` with the dump in `dump_dir`
pub fn load_taxdump(
    store: &mut SqliteStore,
    dump_dir: &Path,
    mut on_event: impl FnMut(LoadEvent),
) -> Result<LoadReport> {
    let started = Instant::now();
    info!("Loading taxonomy dump from {}", dump_dir.display());

    let dump = read_taxdump(dump_dir, &mut on_event)?;
    let total = dump.tree.nodes().len();

    on_event(LoadEvent::Started(LoadPhase::Writing));
    store.replace_all_with_progress(dump.tree.nodes(), |rows| {
        on_event(LoadEvent::Written { rows, total })
    })?;
    on_event(LoadEvent::Finished(LoadPhase::Writing));

    let report = LoadReport {
        taxa: total,
        named: dump.named,
        skipped: dump.skipped,
        unknown_ranks: dump.unknown_ranks,
        elapsed: started.elapsed(),
    };
    info!("Loaded {} taxa in {:?}", report.taxa, report.elapsed);
    Ok(report)
}

fn open_dump_file(dump_dir: &Path, file_name: &str) -> Result<BufReader<File>> {
    let path = dump_dir.join(file_name);
    if !path.is_file() {
        return Err(Error::MissingDumpFile(path));
    }
    Ok(BufReader::new(File::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::Rank;
    use crate::taxon::TaxId;
    use tempfile::TempDir;

    const NODES: &str = "1\t|\t1\t|\tno rank\t|\n\
        2\t|\t131567\t|\tdomain\t|\n\
        131567\t|\t1\t|\tcellular root\t|\n\
        1224\t|\t2\t|\tphylum\t|\n\
        1236\t|\t1224\t|\tclass\t|\n\
        91347\t|\t1236\t|\torder\t|\n\
        543\t|\t91347\t|\tfamily\t|\n\
        561\t|\t543\t|\tgenus\t|\n\
        562\t|\t561\t|\tspecies\t|\n";

    const NAMES: &str = "1\t|\troot\t|\t\t|\tscientific name\t|\n\
        2\t|\tBacteria\t|\tBacteria <bacteria>\t|\tscientific name\t|\n\
        131567\t|\tcellular organisms\t|\t\t|\tscientific name\t|\n\
        1224\t|\tPseudomonadota\t|\t\t|\tscientific name\t|\n\
        1236\t|\tGammaproteobacteria\t|\t\t|\tscientific name\t|\n\
        91347\t|\tEnterobacterales\t|\t\t|\tscientific name\t|\n\
        543\t|\tEnterobacteriaceae\t|\t\t|\tscientific name\t|\n\
        561\t|\tEscherichia\t|\t\t|\tscientific name\t|\n\
        562\t|\tEscherichia coli\t|\t\t|\tscientific name\t|\n\
        562\t|\tE. coli\t|\t\t|\tcommon name\t|\n";

    fn dump_dir(nodes: &str, names: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(NODES_FILE), nodes).unwrap();
        std::fs::write(dir.path().join(NAMES_FILE), names).unwrap();
        dir
    }

    #[test]
    fn test_load_taxdump() {
        let dir = dump_dir(NODES, NAMES);
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut events = Vec::new();

        let report = load_taxdump(&mut store, dir.path(), |e| events.push(e)).unwrap();
        assert_eq!(report.taxa, 9);
        assert_eq!(report.named, 9);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.unknown_ranks, 0);

        assert_eq!(events.first(), Some(&LoadEvent::Started(LoadPhase::ReadingNames)));
        assert_eq!(events.last(), Some(&LoadEvent::Finished(LoadPhase::Writing)));
        assert!(events.contains(&LoadEvent::Written { rows: 9, total: 9 }));

        let coli = store.get_taxon(TaxId(562)).unwrap().unwrap();
        assert_eq!(coli.name.as_deref(), Some("Escherichia coli"));
        assert_eq!(coli.rank, Rank::Species);

        let resolver = crate::LineageResolver::new(&store).unwrap();
        let order = resolver.ancestor_of(TaxId(562), Rank::Order).unwrap().unwrap();
        assert_eq!(order.name.as_deref(), Some("Enterobacterales"));
    }

    #[test]
    fn test_reload_replaces_previous() {
        let dir = dump_dir(NODES, NAMES);
        let mut store = SqliteStore::open_in_memory().unwrap();
        load_taxdump(&mut store, dir.path(), |_| {}).unwrap();

        let smaller = "1\t|\t1\t|\tno rank\t|\n2\t|\t1\t|\tdomain\t|\n";
        std::fs::write(dir.path().join(NODES_FILE), smaller).unwrap();
        let report = load_taxdump(&mut store, dir.path(), |_| {}).unwrap();

        assert_eq!(report.taxa, 2);
        assert_eq!(store.count_taxa().unwrap(), 2);
        assert!(store.get_taxon(TaxId(562)).unwrap().is_none());
    }

    #[test]
    fn test_cyclic_dump_is_rejected() {
        let cyclic = "1\t|\t1\t|\tno rank\t|\n\
            10\t|\t11\t|\tgenus\t|\n\
            11\t|\t10\t|\tfamily\t|\n";
        let dir = dump_dir(cyclic, NAMES);
        let mut store = SqliteStore::open_in_memory().unwrap();

        let err = load_taxdump(&mut store, dir.path(), |_| {}).unwrap_err();
        assert!(matches!(err, Error::CorruptHierarchy { .. }));
        assert_eq!(store.count_taxa().unwrap(), 0);
    }

    #[test]
    fn test_dangling_parent_is_rejected() {
        let dangling = "1\t|\t1\t|\tno rank\t|\n562\t|\t561\t|\tspecies\t|\n";
        let dir = dump_dir(dangling, NAMES);
        let mut store = SqliteStore::open_in_memory().unwrap();

        let err = load_taxdump(&mut store, dir.path(), |_| {}).unwrap_err();
        assert!(matches!(err, Error::DanglingParent { child: TaxId(562), parent: TaxId(561) }));
    }

    #[test]
    fn test_missing_dump_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open_in_memory().unwrap();

        let err = load_taxdump(&mut store, dir.path(), |_| {}).unwrap_err();
        assert!(matches!(err, Error::MissingDumpFile(ref p) if p.ends_with(NAMES_FILE)));
    }

    #[test]
    fn test_unknown_rank_is_reported() {
        let nodes = "1\t|\t1\t|\tno rank\t|\n\
            5\t|\t1\t|\tgenus\t|\n\
            7\t|\t5\t|\tsubsubgenus\t|\n\
            8\t|\t7\t|\tspecies\t|\n";
        let dir = dump_dir(nodes, NAMES);
        let mut store = SqliteStore::open_in_memory().unwrap();

        let report = load_taxdump(&mut store, dir.path(), |_| {}).unwrap();
        assert_eq!(report.taxa, 4);
        assert_eq!(report.unknown_ranks, 1);
        assert_eq!(report.skipped, 0);

        // The substituted node stays in the lineage under its placeholder rank
        let resolver = crate::LineageResolver::new(&store).unwrap();
        let unranked = resolver.ancestor_of(TaxId(8), Rank::NoRank).unwrap().unwrap();
        assert_eq!(unranked.tax_id, TaxId(7));
        let genus = resolver.ancestor_of(TaxId(8), Rank::Genus).unwrap().unwrap();
        assert_eq!(genus.tax_id, TaxId(5));
    }
}
