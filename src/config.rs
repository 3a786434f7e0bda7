//! Configuration of the coordinator.

use std::{path::PathBuf, time::Duration};

/// Settings of an [crate::algorithm::IcAlgorithm].
#[derive(Clone, Debug, PartialEq)]
pub struct AlgorithmConfig {
    /// Write the statistics report during post execution.
    pub report_statistics: bool,
    /// Directory the timing and histogram files are written to.
    pub report_dir: PathBuf,
    /// Write per-counter histogram files in multi-process runs.
    pub write_histograms: bool,
    /// How long a scheduler backs off when it has no runnable curve.
    pub idle_sleep: Duration,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            report_statistics: false,
            report_dir: PathBuf::from("."),
            write_histograms: true,
            idle_sleep: Duration::from_millis(1),
        }
    }
}

impl AlgorithmConfig {
    /// Enable the statistics report and write it to `dir`.
    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_statistics = true;
        self.report_dir = dir.into();
        self
    }

    /// Enable or disable the histogram files.
    pub fn with_histograms(mut self, write_histograms: bool) -> Self {
        self.write_histograms = write_histograms;
        self
    }

    /// Set the idle back-off of schedulers.
    pub fn with_idle_sleep(mut self, idle_sleep: Duration) -> Self {
        self.idle_sleep = idle_sleep;
        self
    }
}
