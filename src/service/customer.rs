use crate::error::AnalysisError;
use crate::models::{CellKey, InvoiceTable};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupStats {
    pub mean: f64,
    pub std: f64,
}

impl GroupStats {
    pub fn is_outlier(&self, value: f64, sigma: f64) -> bool {
        value > self.mean + sigma * self.std || value < self.mean - sigma * self.std
    }
}

/// Sample mean and standard deviation (n - 1). `None` when fewer than two values
/// or no spread, since such a group cannot have outliers.
pub fn sample_mean_std(values: &[f64]) -> Option<GroupStats> {
    if values.len() < 2 {
        return None;
    }
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if hi <= lo {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = var.sqrt();
    (std > 0.0 && std.is_finite()).then_some(GroupStats { mean, std })
}

/// 客户维度异常: per `Customer ID`, prices beyond `sigma` standard deviations of
/// that customer's mean.
///
/// Customers are visited in ascending order and rows keep input order within a
/// customer. Rows without a customer or a price are never flagged.
pub fn detect_customer_outliers(table: &InvoiceTable, sigma: f64) -> Result<InvoiceTable, AnalysisError> {
    let prices = table.numeric_column("Price")?;
    let customers = table.column("Customer ID").unwrap_or_default();

    let mut groups: BTreeMap<CellKey, Vec<usize>> = BTreeMap::new();
    for (row, customer) in customers.iter().enumerate() {
        if let Some(key) = customer.key() {
            groups.entry(key).or_default().push(row);
        }
    }

    let stats: BTreeMap<&CellKey, GroupStats> = groups
        .iter()
        .filter_map(|(key, rows)| {
            let values: Vec<f64> = rows.iter().filter_map(|&r| prices[r]).collect();
            sample_mean_std(&values).map(|s| (key, s))
        })
        .collect();

    let outliers: Vec<usize> = groups
        .iter()
        .filter_map(|(key, rows)| stats.get(key).map(|s| (rows, s)))
        .flat_map(|(rows, s)| {
            rows.iter()
                .copied()
                .filter(|&r| prices[r].is_some_and(|p| s.is_outlier(p, sigma)))
        })
        .collect();

    tracing::debug!(
        "Customer deviation scan: {} customers, {} with spread, {} outliers",
        groups.len(),
        stats.len(),
        outliers.len()
    );

    Ok(table.select(&outliers))
}
