//! NCBI taxdump parser
//!
//! Reads the two dump files the hierarchy needs:
//! - nodes.dmp: tax_id, parent tax_id and rank for every taxon
//! - names.dmp: names of every taxon; only scientific names are kept
//!
//! # File Format
//! Fields are separated by `\t|\t` and every line ends with `\t|`.
//! ```text
//! 9606	|	9605	|	species	|	HS	|	5	|	1	|	1	|	1	|	2	|	1	|	1	|	0	|		|
//! 9606	|	Homo sapiens	|		|	scientific name	|
//! ```
//!
//! Malformed lines are logged and skipped rather than failing the parse.

use std::collections::HashMap;
use std::io::BufRead;
use tracing::{debug, warn};
use crate::rank::Rank;
use crate::taxon::{TaxId, TaxonNode};
use crate::{Error, Result};

/// File holding the hierarchy
pub const NODES_FILE: &str = "nodes.dmp";
/// File holding the names
pub const NAMES_FILE: &str = "names.dmp";

const FIELD_TERMINATOR: &str = "\t|\t";
const LINE_TERMINATOR: &str = "\t|";
const SCIENTIFIC_NAME: &str = "scientific name";

/// Line counts from one dump file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Non-empty lines read
    pub lines: usize,
    /// Lines that could not be parsed
    pub skipped: usize,
    /// Lines whose rank label was not recognized and was stored as `no rank`
    pub unknown_ranks: usize,
}

/// Parser for NCBI taxdump files
#[derive(Debug, Default)]
pub struct TaxdumpParser;

impl TaxdumpParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse nodes.dmp into unnamed taxon nodes
    pub fn parse_nodes<R: BufRead>(&self, reader: R) -> Result<(Vec<TaxonNode>, ParseStats)> {
        let mut nodes = Vec::new();
        let mut stats = ParseStats::default();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            stats.lines += 1;

            match self.parse_nodes_line(&line, i + 1) {
                Ok((node, known_rank)) => {
                    if !known_rank {
                        stats.unknown_ranks += 1;
                    }
                    nodes.push(node);
                }
                Err(e) => {
                    warn!("Skipping {} line {}: {}", NODES_FILE, i + 1, e);
                    stats.skipped += 1;
                }
            }
        }

        if stats.unknown_ranks > 0 {
            warn!("{} taxa had unrecognized ranks and were stored as 'no rank'", stats.unknown_ranks);
        }
        debug!("Parsed {} nodes ({} skipped)", nodes.len(), stats.skipped);
        Ok((nodes, stats))
    }

    /// Parse a single line from nodes.dmp, along with whether its rank
    /// label was recognized.
    ///
    /// Unrecognized rank labels are kept as `no rank` so that the node's
    /// children still have a parent to point at.
    pub fn parse_nodes_line(&self, line: &str, line_num: usize) -> Result<(TaxonNode, bool)> {
        let fields = split_fields(line);
        if fields.len() < 3 {
            return Err(Error::Parse(format!(
                "Line {}: Expected at least 3 fields, got {}",
                line_num,
                fields.len()
            )));
        }

        let tax_id: TaxId = fields[0].parse()?;
        let parent_id: TaxId = fields[1].parse()?;
        let (rank, known_rank) = match fields[2].parse() {
            Ok(rank) => (rank, true),
            Err(_) => {
                debug!("Line {}: unknown rank '{}' for taxon {}, using 'no rank'", line_num, fields[2], tax_id);
                (Rank::NoRank, false)
            }
        };

        Ok((TaxonNode::new(tax_id.get(), parent_id.get(), rank), known_rank))
    }

    /// Parse names.dmp into a map of scientific names
    pub fn parse_names<R: BufRead>(&self, reader: R) -> Result<(HashMap<TaxId, String>, ParseStats)> {
        let mut names = HashMap::new();
        let mut stats = ParseStats::default();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            stats.lines += 1;

            match self.parse_names_line(&line, i + 1) {
                Ok(Some((tax_id, name))) => {
                    names.insert(tax_id, name);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Skipping {} line {}: {}", NAMES_FILE, i + 1, e);
                    stats.skipped += 1;
                }
            }
        }

        debug!("Parsed {} scientific names ({} skipped)", names.len(), stats.skipped);
        Ok((names, stats))
    }

    /// Parse a single line from names.dmp; `None` for non-scientific names
    pub fn parse_names_line(&self, line: &str, line_num: usize) -> Result<Option<(TaxId, String)>> {
        let fields = split_fields(line);
        if fields.len() < 4 {
            return Err(Error::Parse(format!(
                "Line {}: Expected at least 4 fields, got {}",
                line_num,
                fields.len()
            )));
        }

        if fields[3] != SCIENTIFIC_NAME {
            return Ok(None);
        }

        let tax_id: TaxId = fields[0].parse()?;
        Ok(Some((tax_id, fields[1].to_string())))
    }
}

/// Attach scientific names to nodes; returns how many were named
pub fn attach_names(nodes: &mut [TaxonNode], mut names: HashMap<TaxId, String>) -> usize {
    let mut named = 0;
    for node in nodes.iter_mut() {
        if let Some(name) = names.remove(&node.tax_id) {
            node.name = Some(name);
            named += 1;
        }
    }
    named
}

fn split_fields(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    let line = line.strip_suffix(LINE_TERMINATOR).unwrap_or(line);
    line.split(FIELD_TERMINATOR).collect()
}
