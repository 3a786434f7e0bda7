//! Text report of the run statistics.
//!
//! The report is meant to be read by humans and scraped by scripts. Sections
//! are delimited by banner lines and every value line starts with `t_` for
//! totals over all processes or `l_` for the values of this process.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{
    constants::{
        COUNTERS_BANNER, HISTOGRAM_FILE_SUFFIX, LABEL_WIDTH, REPORT_BEGIN, REPORT_END,
        REPORT_PRECISION, TIMINGS_BANNER, TIMINGS_FILE_PREFIX,
    },
    error::{Error, Result},
    provider::ProviderSettings,
    statistics::{AlgorithmStatistics, DomainLoads, Statistic},
};

/// Run description printed at the top of a report.
#[derive(Clone, Debug, Default)]
pub struct ReportHeader {
    /// Name of the scheduling algorithm.
    pub algorithm_name: String,
    /// Number of processes.
    pub n_procs: usize,
    /// Number of spatial domains.
    pub num_domains: usize,
    /// Number of seed curves of this process.
    pub num_seed_points: usize,
    /// Settings of the domain provider.
    pub settings: ProviderSettings,
}

/// Format a value like `printf("%g")`: six significant digits, trailing
/// zeros removed, scientific notation for very small or large magnitudes.
pub fn fmt_g(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return format!("{}", value);
    }

    let precision = REPORT_PRECISION as i32;

    // The exponent is taken after rounding to the report precision.
    let formatted = format!("{:.*e}", (precision - 1) as usize, value);
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision {
        format!(
            "{}e{}{:02}",
            trim_zeros(mantissa),
            if exponent < 0 { '-' } else { '+' },
            exponent.abs()
        )
    } else {
        let decimals = (precision - 1 - exponent).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, value))
    }
}

fn trim_zeros(number: &str) -> String {
    if number.contains('.') {
        number
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        number.to_string()
    }
}

fn label(totals: bool, name: &str) -> String {
    format!(
        "{}{:<width$.width$} = ",
        if totals { "t_" } else { "l_" },
        name,
        width = LABEL_WIDTH
    )
}

fn percent(part: f64, whole: f64) -> String {
    if whole != 0.0 {
        format!(" [{}%] ", fmt_g(100.0 * (part / whole)))
    } else {
        " [0%] ".to_string()
    }
}

fn spread(s: &Statistic) -> String {
    format!(
        " [{}, {}, {} : {}]",
        fmt_g(s.min),
        fmt_g(s.max),
        fmt_g(s.mean),
        fmt_g(s.sigma)
    )
}

/// One line of the timing section. `t` is the total time.
pub fn timing_line(name: &str, s: &Statistic, t: &Statistic, totals: bool) -> String {
    let mut line = label(totals, name);

    if totals {
        line += &fmt_g(s.total);
        line += &percent(s.total, t.total);
        line += &spread(s);
        if s.mean != 0.0 {
            line += &format!(" [s/m{}]", fmt_g(s.sigma / s.mean));
        }
    } else {
        let v = s.local_value();
        line += &fmt_g(v);
        line += &percent(v, t.local_value());
    }

    line
}

/// One line of the counter section.
pub fn counter_line(name: &str, s: &Statistic, totals: bool) -> String {
    let mut line = label(totals, name);

    if totals {
        line += &fmt_g(s.total);
        line += &spread(s);
        if s.mean != 0.0 {
            line += &format!(" [{}]", fmt_g(s.sigma / s.mean));
        }
    } else {
        let v = s.local_value();
        let p = if s.total > 0.0 {
            v / s.total * 100.0
        } else {
            0.0
        };
        let sd = if s.sigma != 0.0 {
            (v - s.mean) / s.sigma
        } else {
            0.0
        };

        // Value, share of the total and distance from the mean in sigmas.
        line += &format!("{} [{}%] [{}] ", fmt_g(v), fmt_g(p), fmt_g(sd));
    }

    line
}

fn domain_line(loads: &DomainLoads, totals: bool) -> String {
    format!(
        "{}_DomUsed    = #Dom: {} TLoads: {} [{}, {}, {}]",
        if totals { "t" } else { "l" },
        loads.domains_used,
        loads.total_loaded,
        loads.min_loaded,
        loads.max_loaded,
        fmt_g(loads.avg_loaded)
    )
}

/// Timing labels with the statistic they print.
fn timings(stats: &AlgorithmStatistics) -> [(&'static str, &Statistic); 5] {
    [
        ("TotalTime", &stats.total_time),
        ("IntgTime", &stats.integrate_time),
        ("IOTime", &stats.io_time),
        ("SortTime", &stats.sort_time),
        ("ExtraTime", &stats.extra_time),
    ]
}

/// Counter labels with the statistic they print.
pub fn counters(stats: &AlgorithmStatistics) -> [(&'static str, &Statistic); 4] {
    [
        ("DomLoad", &stats.dom_load_cnt),
        ("DomPurge", &stats.dom_purge_cnt),
        ("IntgrCnt", &stats.integrate_cnt),
        ("IntgrStep", &stats.integrate_step_cnt),
    ]
}

fn write_timings<W: Write>(out: &mut W, stats: &AlgorithmStatistics, totals: bool) -> Result<()> {
    writeln!(out, "{}", TIMINGS_BANNER)?;
    if totals {
        writeln!(out, "t_Time       = {}", fmt_g(stats.total_time.max))?;
    } else {
        writeln!(out, "l_Time      = {}", fmt_g(stats.total_time.local_value()))?;
    }

    for (name, s) in timings(stats) {
        writeln!(out, "{}", timing_line(name, s, &stats.total_time, totals))?;
    }
    Ok(())
}

fn write_counters<W: Write>(out: &mut W, stats: &AlgorithmStatistics, totals: bool) -> Result<()> {
    writeln!(out, "{}", COUNTERS_BANNER)?;

    for (name, s) in counters(stats) {
        writeln!(out, "{}", counter_line(name, s, totals))?;
    }

    let loads = if totals {
        &stats.domain_loads.global
    } else {
        &stats.domain_loads.local
    };
    writeln!(out, "{}", domain_line(loads, totals))?;
    Ok(())
}

/// Write the full report.
pub fn write_report<W: Write>(
    out: &mut W,
    header: &ReportHeader,
    stats: &AlgorithmStatistics,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", REPORT_BEGIN)?;
    writeln!(out, "File= {}", header.settings.input_name)?;
    writeln!(
        out,
        "Method= {} nCPUs= {} nDom= {} nPts= {}",
        header.algorithm_name, header.n_procs, header.num_domains, header.num_seed_points
    )?;
    writeln!(
        out,
        "maxCount= {} domCache= {} workGrp=  {}",
        header.settings.max_count, header.settings.cache_q_len, header.settings.work_group_size
    )?;
    writeln!(out)?;

    write_timings(out, stats, true)?;
    writeln!(out)?;
    write_counters(out, stats, true)?;

    writeln!(out)?;
    writeln!(out, "Per Process:")?;
    write_timings(out, stats, false)?;
    write_counters(out, stats, false)?;
    writeln!(out)?;
    writeln!(out, "{}", REPORT_END)?;
    Ok(())
}

/// Name of the timing file of `rank`.
pub fn timings_file_name(rank: usize) -> String {
    format!("{}{:03}.txt", TIMINGS_FILE_PREFIX, rank)
}

/// Create `path` and fill it through `write`.
pub fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let to_report_error = |source| Error::Report {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(to_report_error)?;
    let mut out = BufWriter::new(file);
    match write(&mut out) {
        Err(Error::Io(source)) => Err(to_report_error(source)),
        other => other,
    }?;
    out.flush().map_err(to_report_error)
}

/// Write the histogram of every counter to `<dir>/<Counter>_histogram.txt`.
pub fn write_histograms(dir: &Path, stats: &AlgorithmStatistics) -> Result<Vec<PathBuf>> {
    counters(stats)
        .into_iter()
        .map(|(name, s)| {
            let path = dir.join(format!("{}{}", name, HISTOGRAM_FILE_SUFFIX));
            write_file(&path, |out| {
                for value in &s.histogram {
                    writeln!(out, "{}", fmt_g(*value))?;
                }
                Ok(())
            })?;
            Ok(path)
        })
        .collect()
}
