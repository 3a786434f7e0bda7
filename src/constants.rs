//! Constants shared by the coordinator and the statistics report.

/// Sort key given to curves that have no candidate block.
pub const NO_BLOCK_SORT_KEY: i64 = -1;

/// Width that statistic labels are padded to in the report.
pub const LABEL_WIDTH: usize = 10;

/// Significant digits used when printing report values.
pub const REPORT_PRECISION: usize = 6;

/// Banner opening a report.
pub const REPORT_BEGIN: &str = "ReportBegin: ***********************************************";

/// Banner closing a report.
pub const REPORT_END: &str = "ReportEnd: ***********************************************";

/// Banner opening the timing section.
pub const TIMINGS_BANNER: &str = "Timings: *********************************************";

/// Banner opening the counter section.
pub const COUNTERS_BANNER: &str = "Counters: ********************************************";

/// Prefix of the per-process timing file, followed by the zero padded rank.
pub const TIMINGS_FILE_PREFIX: &str = "timings";

/// Suffix of the per-counter histogram files.
pub const HISTOGRAM_FILE_SUFFIX: &str = "_histogram.txt";
