/// Separator between names inside one credit cell.
pub const NAME_SEPARATOR: &str = "、";

pub mod defaults {

    pub const BATCH_SIZE: usize = 200;

    pub const GRADUATION_VIEWS: i64 = 10_000;

    pub const GROWTH_PER_DAY: i64 = 100;

    pub const STREAK_CRON: &str = "0 30 3 * * *";
}

pub mod env {

    pub const DATABASE_URL: &str = "VOCABILI_DATABASE_URL";
}

pub mod limits {

    pub const MAX_PAGE_SIZE: u64 = 200;

    pub const DEFAULT_PAGE_SIZE: u64 = 50;
}

pub mod metrics {

    pub const ROWS_TOTAL: &str = "import_rows_total";

    pub const ROWS_DROPPED_TOTAL: &str = "import_rows_dropped_total";

    pub const BATCHES_TOTAL: &str = "import_batches_total";

    pub const STREAK_UPDATED_TOTAL: &str = "streak_videos_updated_total";
}
