use crate::error::AnalysisError;
use crate::models::value::{Numeric, Value};
use serde::Serialize;

/// 发票明细表 (InvoiceTable): rows × named columns, in upload order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvoiceTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl InvoiceTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Header-only table.
    pub fn with_headers(columns: &[&str]) -> Self {
        Self::new(columns.iter().map(|c| c.to_string()).collect())
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Short rows are padded with `Empty`, long rows truncated to the header width.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Required columns that are absent, in the order asked for.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }

    /// All values of a column, or `None` if the column does not exist.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Reads a column as numbers; missing cells are `None`, text is an error.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>, AnalysisError> {
        let values = self.column(name).unwrap_or_default();
        values
            .into_iter()
            .enumerate()
            .map(|(row, v)| match v.numeric() {
                Numeric::Number(n) => Ok(Some(n)),
                Numeric::Missing => Ok(None),
                Numeric::NotANumber => Err(AnalysisError::NonNumeric {
                    column: name.to_string(),
                    row,
                    value: v.to_string(),
                }),
            })
            .collect()
    }

    /// Like [`numeric_column`](Self::numeric_column) but a missing cell is an error too.
    pub fn dense_numeric_column(&self, name: &str) -> Result<Vec<f64>, AnalysisError> {
        self.numeric_column(name)?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| AnalysisError::MissingValue {
                    column: name.to_string(),
                    row,
                })
            })
            .collect()
    }

    /// New table with the given rows, in the given order.
    pub fn select(&self, indices: &[usize]) -> InvoiceTable {
        InvoiceTable {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// Appends a column, or overwrites it if a column of that name already exists.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                self.columns.push(name.to_string());
                let mut values = values.into_iter();
                for row in self.rows.iter_mut() {
                    row.push(values.next().unwrap_or(Value::Empty));
                }
            }
        }
    }

    /// Keeps only the named columns that exist, in the order given.
    pub fn project(&self, names: &[&str]) -> InvoiceTable {
        let picked: Vec<(usize, &str)> = names
            .iter()
            .filter_map(|n| self.column_index(n).map(|i| (i, *n)))
            .collect();
        InvoiceTable {
            columns: picked.iter().map(|(_, n)| n.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| picked.iter().map(|(i, _)| r[*i].clone()).collect())
                .collect(),
        }
    }

    pub fn head(&self, n: usize) -> InvoiceTable {
        InvoiceTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}
