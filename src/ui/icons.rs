pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const SEARCH: &str = "🔍";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const TREE: &str = "🌳";
    pub const LEAF: &str = "🍃";
    pub const UP: &str = "⬆️";
    pub const DATABASE: &str = "🗄️";
    pub const FOLDER: &str = "📂";
    pub const EMPTY: &str = "∅";
}
