//! Line statistics from `verilator_coverage --annotate` output.
//!
//! The annotator prefixes every measurable source line with a marker and a
//! six-digit hit count: `+NNNNNN` for executed lines and `-NNNNNN` for lines
//! below the coverage threshold. A `-000000` line was never hit at all.
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Counts derived from annotated line prefixes.
///
/// `real_negative` is a subset of `total_negative`: every `-000000` line also
/// matches the generic `-NNNNNN` pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageCounters {
    pub positive: u64,
    pub total_negative: u64,
    pub real_negative: u64,
}

impl CoverageCounters {
    /// `(1 - real_negative / (total_negative + positive)) * 100`, or 100 when
    /// no line is measurable.
    pub fn percentage(&self) -> f64 {
        let denominator = self.total_negative + self.positive;
        if denominator == 0 {
            return 100.0;
        }
        (1.0 - self.real_negative as f64 / denominator as f64) * 100.0
    }

    pub fn summary(&self) -> CoverageSummary {
        CoverageSummary {
            num_positive: self.positive,
            num_total_neg: self.total_negative,
            num_real_neg: self.real_negative,
            percent_coverage: self.percentage(),
        }
    }
}

/// Serializable coverage summary printed at the end of the coverage target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub num_positive: u64,
    pub num_total_neg: u64,
    pub num_real_neg: u64,
    pub percent_coverage: f64,
}

impl fmt::Display for CoverageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(30);
        writeln!(f, "{rule}")?;
        writeln!(f, "num_positive: {}", self.num_positive)?;
        writeln!(f, "num_total_neg: {}", self.num_total_neg)?;
        writeln!(f, "num_real_neg: {}", self.num_real_neg)?;
        writeln!(f, "percent_coverage: {:.4}%", self.percent_coverage)?;
        write!(f, "{rule}")
    }
}

/// Classify annotated lines by their leading prefix.
pub fn count_lines<I, S>(lines: I) -> CoverageCounters
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let positive = Regex::new(r"^\+[0-9]{6}").expect("regex for executed lines");
    let negative = Regex::new(r"^-[0-9]{6}").expect("regex for unexecuted lines");
    let never_hit = Regex::new(r"^-000000").expect("regex for zero-hit lines");

    let mut counters = CoverageCounters::default();
    for line in lines {
        let line = line.as_ref();
        if positive.is_match(line) {
            counters.positive += 1;
        }
        if negative.is_match(line) {
            counters.total_negative += 1;
        }
        if never_hit.is_match(line) {
            counters.real_negative += 1;
        }
    }
    counters
}

/// Read an annotated source file and count its lines.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn analyze_file(path: &Path) -> io::Result<Option<CoverageCounters>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    let text = String::from_utf8_lossy(&bytes);
    Ok(Some(count_lines(text.lines())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn mixed_annotations_produce_expected_counts() {
        let lines = [
            "+000010  assign a = b;",
            "+000010  assign c = d;",
            "+000010  always @(posedge clk)",
            "-000000  if (reset)",
            "-000000    q <= 0;",
            "-000002  else",
        ];
        let counters = count_lines(lines);
        assert_eq!(
            counters,
            CoverageCounters {
                positive: 3,
                total_negative: 3,
                real_negative: 2,
            }
        );
        assert_close(counters.percentage(), (1.0 - 2.0 / 6.0) * 100.0);
        assert_eq!(format!("{:.4}", counters.percentage()), "66.6667");
    }

    #[test]
    fn unannotated_lines_are_ignored() {
        let lines = [
            "module fpmul(a, b, y);",
            "         input a;",
            " +000001 leading space is not a prefix",
            "+00001 five digits is not a prefix",
            "-00000 five digits is not a prefix",
            "%000003 other markers are ignored",
            "",
        ];
        assert_eq!(count_lines(lines), CoverageCounters::default());
    }

    #[test]
    fn no_measurable_lines_means_full_coverage() {
        let counters = count_lines(Vec::<String>::new());
        assert_close(counters.percentage(), 100.0);
    }

    #[test]
    fn zero_hit_lines_count_toward_both_negative_counters() {
        let counters = count_lines(["-000000 x", "-000000 y"]);
        assert_eq!(counters.total_negative, 2);
        assert_eq!(counters.real_negative, 2);
        assert_close(counters.percentage(), 0.0);
    }

    #[test]
    fn partial_misses_do_not_lower_the_percentage() {
        let counters = count_lines(["+000004 a", "-000003 b", "-000001 c"]);
        assert_eq!(counters.real_negative, 0);
        assert_close(counters.percentage(), 100.0);
    }

    #[test]
    fn longer_counts_still_match_on_the_first_six_digits() {
        let counters = count_lines(["+1234567 hot loop", "-0000001 rare"]);
        assert_eq!(counters.positive, 1);
        assert_eq!(counters.total_negative, 1);
        assert_eq!(counters.real_negative, 1);
    }

    #[test]
    fn summary_block_prints_four_decimals() {
        let summary = CoverageCounters {
            positive: 3,
            total_negative: 3,
            real_negative: 2,
        }
        .summary();
        let rendered = summary.to_string();
        assert!(rendered.contains("num_positive: 3\n"));
        assert!(rendered.contains("num_total_neg: 3\n"));
        assert!(rendered.contains("num_real_neg: 2\n"));
        assert!(rendered.contains("percent_coverage: 66.6667%\n"));
        assert!(rendered.starts_with(&"-".repeat(30)));
    }

    #[test]
    fn analyze_file_reports_missing_files_as_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("fpmul.v");
        assert_eq!(analyze_file(&missing).expect("analyze"), None);

        fs::write(&missing, "+000001 a\n-000000 b\n").expect("write annotated file");
        let counters = analyze_file(&missing).expect("analyze").expect("counters");
        assert_eq!(counters.positive, 1);
        assert_eq!(counters.real_negative, 1);
    }
}
