//! Portfolio correlation: aligned closes, percentage changes, Pearson
//! correlations and complete-linkage clustering of the correlation rows.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::error::TrendstopError;
use crate::domain::series::OhlcSeries;

/// About a year of business days.
pub const CORRELATION_WINDOW: usize = 261;

/// Date-indexed table with one column per asset. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseTable {
    pub dates: Vec<NaiveDate>,
    pub labels: Vec<String>,
    /// Column-major: `columns[c][row]`.
    pub columns: Vec<Vec<Option<f64>>>,
}

impl CloseTable {
    pub fn rows(&self) -> usize {
        self.dates.len()
    }

    pub fn tail(mut self, n: usize) -> Self {
        let skip = self.dates.len().saturating_sub(n);
        self.dates.drain(..skip);
        for column in &mut self.columns {
            column.drain(..skip);
        }
        self
    }

    fn reorder(self, order: &[usize]) -> Self {
        Self {
            dates: self.dates,
            labels: order.iter().map(|&i| self.labels[i].clone()).collect(),
            columns: order.iter().map(|&i| self.columns[i].clone()).collect(),
        }
    }
}

/// Outer-joins labelled columns of date → value on date.
fn outer_join(inputs: Vec<(String, BTreeMap<NaiveDate, Option<f64>>)>) -> CloseTable {
    let dates: Vec<NaiveDate> = inputs
        .iter()
        .flat_map(|(_, column)| column.keys().copied())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut labels = Vec::with_capacity(inputs.len());
    let mut columns = Vec::with_capacity(inputs.len());
    for (label, column) in inputs {
        columns.push(
            dates
                .iter()
                .map(|d| column.get(d).copied().flatten())
                .collect(),
        );
        labels.push(label);
    }

    CloseTable {
        dates,
        labels,
        columns,
    }
}

fn table_columns(table: CloseTable) -> Vec<(String, BTreeMap<NaiveDate, Option<f64>>)> {
    table
        .labels
        .into_iter()
        .zip(table.columns)
        .map(|(label, values)| (label, table.dates.iter().copied().zip(values).collect()))
        .collect()
}

/// One close column per asset keyed on the bar date, outer-joined and cut to
/// the last `CORRELATION_WINDOW` dates.
pub fn merge_closes(assets: &[(String, OhlcSeries)]) -> CloseTable {
    let inputs = assets
        .iter()
        .map(|(label, series)| {
            let column = series
                .bars()
                .iter()
                .map(|bar| (bar.date(), Some(bar.close)))
                .collect();
            (label.clone(), column)
        })
        .collect();

    outer_join(inputs).tail(CORRELATION_WINDOW)
}

/// Outer-joins two tables column-wise, `left` columns first.
pub fn merge_tables(left: CloseTable, right: CloseTable) -> CloseTable {
    let mut inputs = table_columns(left);
    inputs.extend(table_columns(right));
    outer_join(inputs)
}

/// Relative change from the previous element. The first element, and any
/// element next to a gap or a zero, is undefined.
pub fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        let change = match (i.checked_sub(1).and_then(|p| values[p]), value) {
            (Some(prev), Some(cur)) if prev != 0.0 => Some(cur / prev - 1.0),
            _ => None,
        };
        out.push(change);
    }
    out
}

pub fn table_pct_change(table: &CloseTable) -> CloseTable {
    CloseTable {
        dates: table.dates.clone(),
        labels: table.labels.clone(),
        columns: table.columns.iter().map(|c| pct_change(c)).collect(),
    }
}

/// Pearson correlation over rows where both columns are present. `NaN` with
/// fewer than two such rows or a constant column.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major, square.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.labels.iter().position(|l| l == row)?;
        let c = self.labels.iter().position(|l| l == column)?;
        Some(self.values[r][c])
    }

    /// `sep`-separated matrix with a header row; undefined cells are empty.
    pub fn to_csv(&self, sep: u8) -> Result<String, TrendstopError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(sep)
            .from_writer(Vec::new());

        let header = std::iter::once(String::new()).chain(self.labels.iter().cloned());
        writer
            .write_record(header)
            .map_err(|e| TrendstopError::Io(e.into()))?;

        for (label, row) in self.labels.iter().zip(&self.values) {
            let record = std::iter::once(label.clone()).chain(row.iter().map(|v| {
                if v.is_nan() {
                    String::new()
                } else {
                    format!("{v:?}")
                }
            }));
            writer
                .write_record(record)
                .map_err(|e| TrendstopError::Io(e.into()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| TrendstopError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| TrendstopError::Io(std::io::Error::other(e)))
    }
}

pub fn correlation_matrix(table: &CloseTable) -> CorrelationMatrix {
    let n = table.columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&table.columns[i], &table.columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    CorrelationMatrix {
        labels: table.labels.clone(),
        values,
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = or_zero(*x) - or_zero(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

// undefined correlations count as uncorrelated
fn or_zero(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value }
}

/// Flat cluster id per column: complete linkage over the Euclidean distances
/// between correlation rows, merging while the linkage distance stays within
/// half the largest pairwise distance. Ids follow first appearance.
pub fn flat_clusters(correlations: &CorrelationMatrix) -> Vec<usize> {
    let n = correlations.labels.len();
    if n <= 1 {
        return vec![0; n];
    }

    let mut distances = vec![vec![0.0; n]; n];
    let mut max_distance: f64 = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(&correlations.values[i], &correlations.values[j]);
            distances[i][j] = d;
            distances[j][i] = d;
            max_distance = max_distance.max(d);
        }
    }
    let threshold = 0.5 * max_distance;

    let mut clusters: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    loop {
        let mut best: Option<(usize, usize, f64)> = None;
        for a in 0..clusters.len() {
            for b in (a + 1)..clusters.len() {
                let linkage = clusters[a]
                    .iter()
                    .flat_map(|&i| clusters[b].iter().map(move |&j| (i, j)))
                    .map(|(i, j)| distances[i][j])
                    .fold(0.0, f64::max);
                if best.is_none_or(|(_, _, d)| linkage < d) {
                    best = Some((a, b, linkage));
                }
            }
        }

        match best {
            Some((a, b, linkage)) if linkage <= threshold => {
                let merged = clusters.remove(b);
                clusters[a].extend(merged);
            }
            _ => break,
        }
    }

    let mut owner = vec![0usize; n];
    for (id, members) in clusters.iter().enumerate() {
        for &m in members {
            owner[m] = id;
        }
    }

    let mut renumber: Vec<Option<usize>> = vec![None; clusters.len()];
    let mut next = 0;
    owner
        .into_iter()
        .map(|c| {
            *renumber[c].get_or_insert_with(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}

/// Reorders the table's columns so that correlated assets sit together.
pub fn cluster_by_correlation(table: CloseTable) -> CloseTable {
    let ids = flat_clusters(&correlation_matrix(&table));
    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.sort_by_key(|&i| ids[i]);
    table.reorder(&order)
}

/// Clustered correlation matrix of `portfolio`, with `external` assets
/// appended after clustering for comparison.
pub fn portfolio_correlations(
    portfolio: &[(String, OhlcSeries)],
    external: &[(String, OhlcSeries)],
) -> CorrelationMatrix {
    let changes = table_pct_change(&merge_closes(portfolio));
    let mut clustered = cluster_by_correlation(changes);

    if !external.is_empty() {
        let external_changes = table_pct_change(&merge_closes(external));
        clustered = merge_tables(clustered, external_changes);
    }

    correlation_matrix(&clustered)
}
