//! Taxtree CLI - load the NCBI taxonomy into SQLite and walk its lineages

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use taxtree::config::{self, TaxtreeConfig};
use taxtree::loader;
use taxtree::ui::{self, Icons};
use taxtree::{LineageResolver, Rank, SqliteStore, TaxId};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "taxtree")]
#[command(version)]
#[command(about = "NCBI taxonomy in SQLite - ancestors at rank and full lineages")]
#[command(long_about = r#"
Taxtree loads the NCBI taxonomy dump into a local SQLite database and
resolves, for any taxon, its nearest ancestor at a rank or its full lineage.

Example usage:
  taxtree load --dump-dir ./taxdmp
  taxtree ancestor --taxid 9606 --rank kingdom
  taxtree lineage --taxid 9606 --ranked
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a taxtree.toml with the given paths
    Init {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Directory holding the extracted nodes.dmp and names.dmp
        #[arg(long)]
        dump_dir: Option<PathBuf>,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Load (or reload) the taxonomy from an extracted dump
    Load {
        /// Directory holding the extracted nodes.dmp and names.dmp
        #[arg(long)]
        dump_dir: Option<PathBuf>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show a single taxon
    Show {
        /// Taxonomy identifier
        #[arg(short, long)]
        taxid: u32,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Find the nearest ancestor of a taxon (itself included) at a rank
    Ancestor {
        /// Taxonomy identifier
        #[arg(short, long)]
        taxid: u32,

        /// Target rank, e.g. kingdom, family, "species group"
        #[arg(short, long)]
        rank: String,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Print the lineage of a taxon up to the root
    Lineage {
        /// Taxonomy identifier
        #[arg(short, long)]
        taxid: u32,

        /// Only show kingdom, phylum, class, order, family, genus and species
        #[arg(long)]
        ranked: bool,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Search taxa by scientific name (`%` is a wildcard)
    Search {
        /// Name or pattern
        #[arg(short, long)]
        name: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show database statistics
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let json = cli.format == OutputFormat::Json;
    match run(cli.command, cli.config, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(&failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// The error and its causes on one line
fn failure_message(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}

fn run(command: Commands, config_path: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let settings = &config::load_config(config_path.as_deref())?.unwrap_or_default();

    match command {
        Commands::Init { database, dump_dir, force } => {
            let path = config::default_config_path();
            let new_config = TaxtreeConfig {
                database: Some(settings.database_path(database).display().to_string()),
                dump_dir: Some(settings.dump_dir(dump_dir).display().to_string()),
            };
            config::write_config(&path, &new_config, force)?;

            if json {
                print_json(&serde_json::json!({ "config": path, "settings": new_config }))?;
            } else {
                ui::success(&format!("Wrote {}", path.display()));
            }
        }

        Commands::Load { dump_dir, database } => {
            let dump_dir = settings.dump_dir(dump_dir);
            let database = settings.database_path(database);
            config::ensure_db_dir(&database)?;

            if !json {
                ui::header(Icons::ROCKET, "Loading NCBI taxonomy");
                ui::info(&format!("{} Dump", Icons::FOLDER), &format!("{}", dump_dir.display()));
                ui::info(&format!("{} Database", Icons::DATABASE), &format!("{}", database.display()));
            }

            let mut store = SqliteStore::open(&database)?;
            let progress = ui::LoadProgress::new();
            let report = loader::load_taxdump(&mut store, &dump_dir, |event| {
                if !json {
                    progress.handle(&event);
                }
            })?;

            if json {
                print_json(&report)?;
            } else {
                progress.finish_with_summary(report.elapsed, report.taxa, report.named);
                if report.skipped > 0 {
                    ui::warn(&format!("{} malformed dump lines were skipped", report.skipped));
                }
                if report.unknown_ranks > 0 {
                    ui::warn(&format!(
                        "{} taxa had unrecognized ranks and were stored as '{}'",
                        report.unknown_ranks,
                        Rank::NoRank
                    ));
                }
            }
        }

        Commands::Show { taxid, database } => {
            let store = open_existing(settings, database)?;
            let snapshot = store.snapshot()?;
            let resolver = LineageResolver::new(&snapshot)?;
            let node = resolver.fetch(TaxId(taxid))?;

            if json {
                print_json(&node)?;
            } else {
                ui::header(Icons::LEAF, &node.display_name());
                ui::summary_row("Tax ID:", &node.tax_id.to_string());
                ui::summary_row("Rank:", &ui::rank(node.rank.as_str()));
                ui::summary_row("Parent:", &node.parent_id.to_string());
                if node.is_root() {
                    ui::summary_row("Root:", "yes");
                }
            }
        }

        Commands::Ancestor { taxid, rank, database } => {
            let rank: Rank = rank.parse()?;
            let store = open_existing(settings, database)?;
            let snapshot = store.snapshot()?;
            let resolver = LineageResolver::new(&snapshot)?;
            let ancestor = resolver.ancestor_of(TaxId(taxid), rank)?;

            if json {
                print_json(&serde_json::json!({
                    "taxid": taxid,
                    "rank": rank,
                    "ancestor": ancestor,
                }))?;
            } else {
                match ancestor {
                    Some(node) => {
                        println!(
                            "{} {} {} ({})",
                            Icons::UP,
                            ui::rank(&format!("{}:", rank)),
                            node.display_name(),
                            node.tax_id
                        );
                    }
                    None => {
                        println!(
                            "{} No {} in the lineage of taxon {}.",
                            Icons::EMPTY,
                            ui::rank(rank.as_str()),
                            taxid
                        );
                    }
                }
            }
        }

        Commands::Lineage { taxid, ranked, database } => {
            let store = open_existing(settings, database)?;
            let snapshot = store.snapshot()?;
            let resolver = LineageResolver::new(&snapshot)?;

            if ranked {
                let lineage = resolver.ranked_lineage_of(TaxId(taxid))?;
                if json {
                    print_json(&lineage)?;
                } else {
                    ui::section(&format!(" Ranked lineage of {} ", taxid));
                    for (rank, node) in lineage.iter() {
                        let value = node
                            .map(|n| format!("{} ({})", n.display_name(), n.tax_id))
                            .unwrap_or_else(|| ui::dim("-"));
                        println!("  {} {}", ui::rank(&format!("{:>8}", rank.as_str())), value);
                    }
                }
            } else {
                let lineage = resolver.lineage_of(TaxId(taxid))?;
                if json {
                    print_json(&lineage)?;
                } else {
                    ui::section(&format!(" Lineage of {} ({} levels) ", taxid, lineage.len()));
                    println!("{}", ui::lineage_table(&lineage));
                }
            }
        }

        Commands::Search { name, limit, database } => {
            let store = open_existing(settings, database)?;
            let results = if name.contains('%') {
                store.find_by_name_pattern(&name, limit)?
            } else {
                let mut exact = store.find_by_name(&name)?;
                exact.truncate(limit);
                exact
            };

            if json {
                print_json(&results)?;
            } else if results.is_empty() {
                println!("{} No taxa named '{}'.", Icons::EMPTY, name);
            } else {
                println!("{} {} result(s) for '{}'", Icons::SEARCH, results.len(), name);
                println!("{}", ui::taxa_table(&results));
            }
        }

        Commands::Stats { database } => {
            let database = settings.database_path(database);
            let store = open_existing(settings, Some(database.clone()))?;
            let stats = store.stats()?;

            if json {
                print_json(&stats)?;
            } else {
                ui::header(Icons::STATS, &format!("Taxtree Statistics ({})", database.display()));
                let mut rows = vec![
                    ("Taxa", stats.taxa.to_string()),
                    ("Named", stats.named.to_string()),
                    ("Distinct ranks", stats.ranks.to_string()),
                    ("Max depth", stats.max_depth.to_string()),
                ];
                let counts = store.rank_counts()?;
                for (rank, count) in counts.iter().take(5) {
                    rows.push((rank.as_str(), count.to_string()));
                }
                println!("{}", ui::stats_table(&rows));
            }
        }
    }

    Ok(())
}

/// Open the configured database, refusing to create an empty one
fn open_existing(settings: &TaxtreeConfig, flag: Option<PathBuf>) -> anyhow::Result<SqliteStore> {
    let database = settings.database_path(flag);
    if !database.exists() {
        anyhow::bail!(
            "database {} does not exist (run `taxtree load` first)",
            database.display()
        );
    }
    Ok(SqliteStore::open(&database)?)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
