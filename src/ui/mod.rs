pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, info, rank, section, success, summary_row, warn};
pub use progress::LoadProgress;
pub use table::{lineage_table, stats_table, taxa_table};
pub use theme::{theme, Theme};
