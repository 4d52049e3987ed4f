use crate::error::AnalysisError;
use crate::models::{InvoiceTable, Value};
use crate::service::isolation_forest::{ForestParams, IsolationForest};

/// 金额异常检测: isolation forest over the positive `Price` values.
///
/// Rows without a positive price never enter the sample. Outlier rows come back
/// with every source column plus `Anomaly = -1`.
pub fn detect_amount_outliers(
    table: &InvoiceTable,
    params: ForestParams,
) -> Result<InvoiceTable, AnalysisError> {
    let prices = table.numeric_column("Price")?;

    let positive: Vec<(usize, f64)> = prices
        .iter()
        .enumerate()
        .filter_map(|(row, p)| p.filter(|v| *v > 0.0).map(|v| (row, v)))
        .collect();

    let outliers: Vec<usize> = if positive.is_empty() {
        Vec::new()
    } else {
        let samples: Vec<Vec<f64>> = positive.iter().map(|(_, v)| vec![*v]).collect();
        let flags = IsolationForest::fit_predict(&samples, params)?;
        positive
            .iter()
            .zip(flags)
            .filter(|(_, is_outlier)| *is_outlier)
            .map(|((row, _), _)| *row)
            .collect()
    };

    tracing::debug!(
        "Amount sample: {} positive prices of {} rows, {} outliers",
        positive.len(),
        table.len(),
        outliers.len()
    );

    let mut result = table.select(&outliers);
    result.set_column("Anomaly", vec![Value::Int(-1); outliers.len()]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(prices: Vec<Value>) -> InvoiceTable {
        InvoiceTable::from_rows(
            vec!["Invoice".into(), "Price".into()],
            prices
                .into_iter()
                .enumerate()
                .map(|(i, p)| vec![Value::Int(i as i64), p])
                .collect(),
        )
    }

    #[test]
    fn non_positive_prices_never_flagged() {
        let mut prices: Vec<Value> = (0..60).map(|i| Value::Float(20.0 + (i % 7) as f64)).collect();
        prices.push(Value::Float(-50_000.0));
        prices.push(Value::Float(0.0));
        prices.push(Value::Empty);
        prices.push(Value::Float(90_000.0));
        let result = detect_amount_outliers(&table(prices), ForestParams::default()).unwrap();

        let flagged: Vec<&Value> = result.column("Invoice").unwrap();
        assert!(flagged.contains(&&Value::Int(63)));
        for excluded in [60, 61, 62] {
            assert!(!flagged.contains(&&Value::Int(excluded)));
        }
        assert!(result.column("Anomaly").unwrap().iter().all(|v| **v == Value::Int(-1)));
    }

    #[test]
    fn no_positive_prices_gives_empty_result() {
        let result = detect_amount_outliers(
            &table(vec![Value::Float(0.0), Value::Empty]),
            ForestParams::default(),
        )
        .unwrap();
        assert!(result.is_empty());
        assert!(result.has_column("Anomaly"));
    }

    #[test]
    fn text_price_fails_the_analysis() {
        let err = detect_amount_outliers(
            &table(vec![Value::Float(1.0), Value::text("abc")]),
            ForestParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::NonNumeric { row: 1, .. }));
    }
}
