use crate::error::AnalysisError;
use crate::models::{InvoiceTable, Value};
use crate::service::isolation_forest::{ForestParams, IsolationForest};
use std::collections::BTreeMap;

/// Character count of the description's string form; missing counts as 0.
pub fn description_length(value: &Value) -> usize {
    if value.is_missing() {
        0
    } else {
        value.to_string().chars().count()
    }
}

/// Maps each distinct string form to 0..k-1 in sorted order. Missing values
/// encode as the string `nan`.
pub fn encode_labels(values: &[&Value]) -> Vec<usize> {
    let keys: Vec<String> = values
        .iter()
        .map(|v| {
            if v.is_missing() {
                "nan".to_string()
            } else {
                v.to_string()
            }
        })
        .collect();

    let mut codes: BTreeMap<&str, usize> = keys.iter().map(|k| (k.as_str(), 0)).collect();
    for (code, slot) in codes.values_mut().enumerate() {
        *slot = code;
    }
    keys.iter().map(|k| codes[k.as_str()]).collect()
}

/// 多特征异常检测: isolation forest over (Price, Quantity, DescLength,
/// CustomerID_Label). Price and Quantity must be numeric and present on every row.
pub fn detect_multi_feature_outliers(
    table: &InvoiceTable,
    params: ForestParams,
) -> Result<InvoiceTable, AnalysisError> {
    let prices = table.dense_numeric_column("Price")?;
    let quantities = table.dense_numeric_column("Quantity")?;
    let desc_lengths: Vec<usize> = table
        .column("Description")
        .unwrap_or_default()
        .into_iter()
        .map(description_length)
        .collect();
    let labels = encode_labels(&table.column("Customer ID").unwrap_or_default());

    let samples: Vec<Vec<f64>> = (0..table.len())
        .map(|row| {
            vec![
                prices[row],
                quantities[row],
                desc_lengths[row] as f64,
                labels[row] as f64,
            ]
        })
        .collect();

    let outliers: Vec<usize> = if samples.is_empty() {
        Vec::new()
    } else {
        IsolationForest::fit_predict(&samples, params)?
            .into_iter()
            .enumerate()
            .filter(|(_, is_outlier)| *is_outlier)
            .map(|(row, _)| row)
            .collect()
    };

    tracing::debug!(
        "Multi-feature sample: {} rows, {} customers, {} outliers",
        samples.len(),
        labels.iter().max().map_or(0, |m| m + 1),
        outliers.len()
    );

    let mut result = table.select(&outliers);
    result.set_column(
        "DescLength",
        outliers
            .iter()
            .map(|&r| Value::Int(desc_lengths[r] as i64))
            .collect(),
    );
    result.set_column(
        "CustomerID_Label",
        outliers.iter().map(|&r| Value::Int(labels[r] as i64)).collect(),
    );
    result.set_column("AdvancedAnomaly", vec![Value::Int(-1); outliers.len()]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        ["Invoice", "Customer ID", "Description", "Price", "Quantity"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn labels_follow_sorted_string_order() {
        let vals = [
            Value::text("C-2"),
            Value::Int(10),
            Value::text("C-2"),
            Value::Empty,
            Value::text("A-1"),
        ];
        let refs: Vec<&Value> = vals.iter().collect();
        // "10" < "A-1" < "C-2" < "nan"
        assert_eq!(encode_labels(&refs), vec![2, 0, 2, 3, 1]);
    }

    #[test]
    fn description_length_uses_string_form() {
        assert_eq!(description_length(&Value::text("Çeşitli")), 7);
        assert_eq!(description_length(&Value::Float(12.5)), 4);
        assert_eq!(description_length(&Value::Empty), 0);
    }

    #[test]
    fn flags_joint_outlier() {
        let mut rows: Vec<Vec<Value>> = (0..80)
            .map(|i| {
                vec![
                    Value::Int(i),
                    Value::Int(i % 4),
                    Value::text("Monthly maintenance"),
                    Value::Float(50.0 + (i % 5) as f64),
                    Value::Int(1 + i % 3),
                ]
            })
            .collect();
        rows.push(vec![
            Value::Int(999),
            Value::Int(2),
            Value::text("Monthly maintenance"),
            Value::Float(52.0),
            Value::Int(5_000),
        ]);
        let table = InvoiceTable::from_rows(columns(), rows);
        let result = detect_multi_feature_outliers(&table, ForestParams::default()).unwrap();

        let flagged = result.column("Invoice").unwrap();
        assert!(flagged.contains(&&Value::Int(999)));
        assert!(result.len() <= 4);
        assert!(result.has_column("DescLength"));
        assert!(result.has_column("CustomerID_Label"));
    }

    #[test]
    fn missing_quantity_fails_the_analysis() {
        let table = InvoiceTable::from_rows(
            columns(),
            vec![
                vec![Value::Int(1), Value::Int(1), Value::text("x"), Value::Float(1.0), Value::Int(1)],
                vec![Value::Int(2), Value::Int(1), Value::text("y"), Value::Float(1.0), Value::Empty],
            ],
        );
        let err = detect_multi_feature_outliers(&table, ForestParams::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingValue { row: 1, .. }));
    }
}
