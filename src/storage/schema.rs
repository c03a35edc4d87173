//! Database schema definitions

/// SQL to create the taxa table
pub const CREATE_TAXA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS taxa (
    tax_id INTEGER PRIMARY KEY,
    parent_id INTEGER NOT NULL,
    rank TEXT NOT NULL,
    name TEXT
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_taxa_parent ON taxa(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_taxa_rank ON taxa(rank)",
    "CREATE INDEX IF NOT EXISTS idx_taxa_name ON taxa(name)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_TAXA_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
