//! Descriptive statistics per timing column.

use crate::Result;
use crate::timing::table::TimingTable;
use anyhow::bail;

/// The four figures shown in the report table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    /// Arithmetic mean rounded to two decimals.
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl ColumnStats {
    /// `None` for an empty series.
    pub fn compute(values: &[f64]) -> Option<Self> {
        let sorted = sorted(values)?;
        Some(Self {
            mean: round2(mean(&sorted)),
            median: percentile(&sorted, 0.5),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        })
    }

    /// Values in table order: Mean, Median, Min, Max.
    pub fn as_row(&self) -> [f64; 4] {
        [self.mean, self.median, self.min, self.max]
    }
}

/// Box-plot geometry. Whiskers reach the furthest samples within 1.5 IQR of
/// the box; samples beyond them are not drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Unrounded mean.
    pub mean: f64,
    pub whisker_lo: f64,
    pub whisker_hi: f64,
}

impl BoxStats {
    pub fn compute(values: &[f64]) -> Option<Self> {
        let sorted = sorted(values)?;
        let q1 = percentile(&sorted, 0.25);
        let q3 = percentile(&sorted, 0.75);
        let iqr = q3 - q1;

        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;
        let whisker_lo = sorted
            .iter()
            .copied()
            .find(|&v| v >= lo_fence)
            .filter(|&v| v <= q1)
            .unwrap_or(q1);
        let whisker_hi = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= hi_fence)
            .filter(|&v| v >= q3)
            .unwrap_or(q3);

        Some(Self {
            q1,
            median: percentile(&sorted, 0.5),
            q3,
            mean: mean(&sorted),
            whisker_lo,
            whisker_hi,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub samples: usize,
    pub stats: ColumnStats,
    pub boxplot: BoxStats,
}

/// Everything the figure needs, one summary per retained column in header
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingReport {
    pub columns: Vec<ColumnSummary>,
}

impl TimingReport {
    pub fn from_table(table: &TimingTable) -> Result<Self> {
        if table.columns.is_empty() {
            bail!("timing table has no columns");
        }
        if table.rows() == 0 {
            bail!(
                "timing table has no complete rows ({} dropped for missing values)",
                table.dropped_rows
            );
        }

        let mut columns = Vec::with_capacity(table.columns.len());
        for col in &table.columns {
            let (Some(stats), Some(boxplot)) =
                (ColumnStats::compute(&col.values), BoxStats::compute(&col.values))
            else {
                bail!("column {:?} has no samples", col.name);
            };
            let b = &boxplot;
            let geometry = [b.q1, b.median, b.q3, b.mean, b.whisker_lo, b.whisker_hi];
            if !stats.as_row().iter().chain(&geometry).all(|v| v.is_finite()) {
                bail!("column {:?}: statistics are not finite", col.name);
            }
            columns.push(ColumnSummary {
                name: col.name.clone(),
                samples: col.values.len(),
                stats,
                boxplot,
            });
        }

        Ok(Self { columns })
    }
}

fn sorted(values: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() {
        return None;
    }
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    Some(v)
}

fn mean(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let m = values.iter().sum::<f64>() / n;
    if m.is_finite() {
        m
    } else {
        // The sum overflowed; scale each sample first.
        values.iter().map(|v| v / n).sum()
    }
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    // Weighted sum: `b - a` overflows for distant neighbours.
    let t = pos - lo as f64;
    sorted[lo] * (1.0 - t) + sorted[hi] * t
}

fn round2(v: f64) -> f64 {
    // Large magnitudes have no fractional digits, and `v * 100.0` may overflow.
    if !(v.abs() < 1e15) {
        return v;
    }
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::table::{TableOptions, TimingTable};
    use pretty_assertions::assert_eq;

    #[test]
    fn stats_for_two_series_with_trailing_column() {
        let table = TimingTable::from_reader(
            "A,B,C\n1,4,x\n2,5,y\n3,6,z\n".as_bytes(),
            &TableOptions::default(),
        )
        .unwrap();
        let report = TimingReport::from_table(&table).unwrap();

        assert_eq!(report.columns.len(), 2);
        assert_eq!(report.columns[0].name, "A");
        assert_eq!(report.columns[0].stats.as_row(), [2.0, 2.0, 1.0, 3.0]);
        assert_eq!(report.columns[1].name, "B");
        assert_eq!(report.columns[1].stats.as_row(), [5.0, 5.0, 4.0, 6.0]);
    }

    #[test]
    fn mean_is_rounded_median_is_not() {
        let stats = ColumnStats::compute(&[1.0, 1.0, 2.0, 2.5]).unwrap();
        assert_eq!(stats.mean, 1.63);
        assert_eq!(stats.median, 1.5);

        let stats = ColumnStats::compute(&[0.001, 0.002, 0.004]).unwrap();
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.min, 0.001);
    }

    #[test]
    fn input_order_does_not_matter() {
        let a = ColumnStats::compute(&[3.0, 1.0, 2.0]).unwrap();
        let b = ColumnStats::compute(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn box_geometry_uses_interpolated_quartiles() {
        let b = BoxStats::compute(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!((b.q1, b.median, b.q3), (2.0, 3.0, 4.0));
        assert_eq!((b.whisker_lo, b.whisker_hi), (1.0, 5.0));
        assert_eq!(b.mean, 3.0);
    }

    #[test]
    fn whiskers_stop_before_outliers() {
        let b = BoxStats::compute(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!((b.q1, b.q3), (2.0, 4.0));
        assert_eq!(b.whisker_hi, 4.0);
        assert_eq!(b.whisker_lo, 1.0);
    }

    #[test]
    fn single_sample_collapses_the_box() {
        let b = BoxStats::compute(&[7.0]).unwrap();
        assert_eq!((b.whisker_lo, b.q1, b.median, b.q3, b.whisker_hi), (7.0, 7.0, 7.0, 7.0, 7.0));
    }

    #[test]
    fn table_without_complete_rows_is_rejected() {
        let table = TimingTable::from_reader(
            "A,B,\n1,,\n,2,\n".as_bytes(),
            &TableOptions::default(),
        )
        .unwrap();
        let err = TimingReport::from_table(&table).unwrap_err();
        assert!(err.to_string().contains("no complete rows"));
    }

    #[test]
    fn median_of_extreme_values_does_not_overflow() {
        let stats = ColumnStats::compute(&[1e308, -1e308]).unwrap();
        assert_eq!(stats.median, 0.0);
        assert_eq!(stats.mean, 0.0);
        assert_eq!((stats.min, stats.max), (-1e308, 1e308));

        let b = BoxStats::compute(&[-1e308, 0.0, 1e308]).unwrap();
        assert_eq!((b.q1, b.median, b.q3), (-5e307, 0.0, 5e307));
    }

    #[test]
    fn mean_of_large_samples_stays_finite() {
        let stats = ColumnStats::compute(&[1e308, 1e308, 1e308]).unwrap();
        assert!(stats.mean.is_finite());
        assert_eq!(stats.median, 1e308);

        let table = TimingTable::from_reader(
            "A,\n1.5e308,\n1.7e308,\n".as_bytes(),
            &TableOptions::default(),
        )
        .unwrap();
        let report = TimingReport::from_table(&table).unwrap();
        assert!(report.columns[0].boxplot.mean.is_finite());
        assert_eq!(report.columns[0].stats.max, 1.7e308);
    }

    #[test]
    fn empty_series_has_no_stats() {
        assert_eq!(ColumnStats::compute(&[]), None);
        assert_eq!(BoxStats::compute(&[]), None);
    }
}
