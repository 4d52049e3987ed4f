use crate::error::AnalysisError;
use crate::models::{cmp_missing_last, CellKey, InvoiceTable, Value};
use bigdecimal::{BigDecimal, ToPrimitive};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Price rounded half-up to 2 decimals, working on the shortest decimal form of
/// the float so `100.005` rounds the way it reads.
pub fn round_price(price: f64) -> Option<BigDecimal> {
    if !price.is_finite() {
        return None;
    }
    BigDecimal::from_str(&price.to_string())
        .ok()
        .map(|d| d.round(2).with_scale(2))
}

/// 重复收费检测: rows sharing the exact `Description` and the 2-decimal `Price`
/// with at least one other row.
///
/// Output rows carry `Price_rounded` and `RepeatCount`, sorted by description,
/// rounded price and `Invoice`. Rows missing either key take no part.
pub fn detect_repeated_charges(table: &InvoiceTable) -> Result<InvoiceTable, AnalysisError> {
    let prices = table.numeric_column("Price")?;
    let descriptions = table.column("Description").unwrap_or_default();
    let rounded: Vec<Option<BigDecimal>> =
        prices.iter().map(|p| p.and_then(round_price)).collect();

    // BTreeMap keeps groups in (description, rounded price) order
    let mut groups: BTreeMap<(CellKey, BigDecimal), Vec<usize>> = BTreeMap::new();
    for (row, desc) in descriptions.iter().enumerate() {
        if let (Some(desc), Some(price)) = (desc.key(), rounded[row].clone()) {
            groups.entry((desc, price)).or_default().push(row);
        }
    }

    let invoices = table.column("Invoice");
    let mut ordered: Vec<usize> = Vec::new();
    let mut counts: Vec<Value> = Vec::new();
    for (_, mut rows) in groups.into_iter().filter(|(_, rows)| rows.len() >= 2) {
        if let Some(invoices) = &invoices {
            rows.sort_by(|a, b| cmp_missing_last(invoices[*a], invoices[*b]));
        }
        counts.extend(std::iter::repeat(Value::Int(rows.len() as i64)).take(rows.len()));
        ordered.extend(rows);
    }

    let rounded_column: Vec<Value> = ordered
        .iter()
        .map(|&row| {
            rounded[row]
                .as_ref()
                .and_then(|d| d.to_f64())
                .map(Value::Float)
                .unwrap_or(Value::Empty)
        })
        .collect();

    let mut result = table.select(&ordered);
    result.set_column("Price_rounded", rounded_column);
    result.set_column("RepeatCount", counts);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<(i64, Value, Value)>) -> InvoiceTable {
        InvoiceTable::from_rows(
            vec!["Invoice".into(), "Description".into(), "Price".into()],
            rows.into_iter()
                .map(|(i, d, p)| vec![Value::Int(i), d, p])
                .collect(),
        )
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_price(100.004), BigDecimal::from_str("100.00").ok());
        assert_eq!(round_price(100.005), BigDecimal::from_str("100.01").ok());
        assert_eq!(round_price(7.0), BigDecimal::from_str("7").ok());
        assert_eq!(round_price(f64::NAN), None);
    }

    #[test]
    fn near_equal_prices_group_together() {
        let t = table(vec![
            (1, Value::text("test"), Value::Float(100.0)),
            (3, Value::text("Consulting fee Q1"), Value::Float(100.004)),
            (2, Value::text("Consulting fee Q1"), Value::Float(100.0)),
        ]);
        let result = detect_repeated_charges(&t).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.cell(0, "Invoice"), Some(&Value::Int(2)));
        assert_eq!(result.cell(1, "Invoice"), Some(&Value::Int(3)));
        assert_eq!(result.cell(0, "RepeatCount"), Some(&Value::Int(2)));
        assert_eq!(result.cell(1, "Price_rounded"), Some(&Value::Float(100.0)));
    }

    #[test]
    fn description_match_is_case_sensitive() {
        let t = table(vec![
            (1, Value::text("Rent"), Value::Float(50.0)),
            (2, Value::text("rent"), Value::Float(50.0)),
        ]);
        assert!(detect_repeated_charges(&t).unwrap().is_empty());
    }

    #[test]
    fn groups_sorted_and_counted() {
        let t = table(vec![
            (5, Value::text("B"), Value::Float(1.0)),
            (4, Value::text("A"), Value::Float(2.0)),
            (3, Value::text("B"), Value::Float(1.001)),
            (2, Value::text("A"), Value::Float(2.0)),
            (1, Value::text("A"), Value::Float(2.0)),
            (6, Value::text("C"), Value::Float(9.0)),
            (7, Value::Empty, Value::Float(9.0)),
            (8, Value::Empty, Value::Float(9.0)),
        ]);
        let result = detect_repeated_charges(&t).unwrap();
        let invoices: Vec<&Value> = result.column("Invoice").unwrap();
        assert_eq!(
            invoices,
            vec![&Value::Int(1), &Value::Int(2), &Value::Int(4), &Value::Int(3), &Value::Int(5)]
        );
        assert_eq!(result.cell(0, "RepeatCount"), Some(&Value::Int(3)));
        assert_eq!(result.cell(4, "RepeatCount"), Some(&Value::Int(2)));
    }
}
