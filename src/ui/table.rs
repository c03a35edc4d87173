use crate::taxon::TaxonNode;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct TaxonRow {
    #[tabled(rename = "#")]
    pub position: usize,
    #[tabled(rename = "Tax ID")]
    pub tax_id: u32,
    #[tabled(rename = "Rank")]
    pub rank: String,
    #[tabled(rename = "Name")]
    pub name: String,
}

impl TaxonRow {
    fn new(position: usize, node: &TaxonNode) -> Self {
        Self {
            position,
            tax_id: node.tax_id.get(),
            rank: node.rank.to_string(),
            name: node.name.clone().unwrap_or_default(),
        }
    }
}

pub fn stats_table(stats: &[(&str, String)]) -> String {
    let rows: Vec<TableRow> = stats
        .iter()
        .map(|(label, value)| TableRow {
            metric: label.to_string(),
            value: value.clone(),
        })
        .collect();
    if rows.is_empty() {
        return String::new();
    }
    Table::new(&rows).with(Style::rounded()).to_string()
}

/// Numbered table, starting at the queried taxon and ending at the root
pub fn lineage_table<N: AsRef<TaxonNode>>(lineage: &[N]) -> String {
    taxa_table(lineage)
}

pub fn taxa_table<N: AsRef<TaxonNode>>(taxa: &[N]) -> String {
    let rows: Vec<TaxonRow> = taxa
        .iter()
        .enumerate()
        .map(|(i, node)| TaxonRow::new(i + 1, node.as_ref()))
        .collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}
