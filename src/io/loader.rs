use crate::error::LoadError;
use crate::models::{InvoiceTable, Value};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use indexmap::IndexSet;
use std::collections::HashMap;
use std::io::Cursor;

/// Cell texts read as missing in CSV input.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_csv(file_name: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(".csv")
}

/// 读取上传文件: CSV by file name, anything else as a workbook (first sheet,
/// at most `max_spreadsheet_rows` data rows).
pub fn load_table(
    file_name: &str,
    bytes: &[u8],
    max_spreadsheet_rows: usize,
) -> Result<InvoiceTable, LoadError> {
    let table = if is_csv(file_name) {
        read_csv(bytes)?
    } else {
        read_spreadsheet(bytes, max_spreadsheet_rows)?
    };
    tracing::info!(
        "Loaded {}: {} rows, {} columns",
        file_name,
        table.len(),
        table.columns().len()
    );
    Ok(table)
}

pub fn read_csv(bytes: &[u8]) -> Result<InvoiceTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(LoadError::EmptyInput);
    }
    let columns = unique_headers(headers.iter().map(str::to_string));
    let width = columns.len();

    let mut raw: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() > width {
            return Err(LoadError::RecordTooLong {
                line: record.position().map_or(0, |p| p.line()),
                expected: width,
                found: record.len(),
            });
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(width, String::new());
        raw.push(row);
    }

    let typed: Vec<Vec<Value>> = (0..width)
        .map(|col| {
            let cells: Vec<&str> = raw.iter().map(|r| r[col].as_str()).collect();
            infer_column(&cells)
        })
        .collect();

    let rows = (0..raw.len())
        .map(|r| typed.iter().map(|col| col[r].clone()).collect())
        .collect();
    Ok(InvoiceTable::from_rows(columns, rows))
}

fn is_na(cell: &str) -> bool {
    NA_VALUES.contains(&cell.trim())
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim() {
        "True" | "TRUE" | "true" => Some(true),
        "False" | "FALSE" | "false" => Some(false),
        _ => None,
    }
}

/// Column-wide typing: Int when every cell is an integer, Float when every present
/// cell is a number, Bool for all-boolean columns, Text otherwise.
fn infer_column(cells: &[&str]) -> Vec<Value> {
    let present: Vec<&str> = cells.iter().copied().filter(|c| !is_na(c)).collect();
    if present.is_empty() {
        return vec![Value::Empty; cells.len()];
    }
    let complete = present.len() == cells.len();

    if complete && present.iter().all(|c| c.trim().parse::<i64>().is_ok()) {
        return cells
            .iter()
            .map(|c| c.trim().parse::<i64>().map_or(Value::Empty, Value::Int))
            .collect();
    }
    if present.iter().all(|c| c.trim().parse::<f64>().is_ok()) {
        return cells
            .iter()
            .map(|c| match c.trim().parse::<f64>() {
                Ok(f) if !is_na(c) => Value::Float(f),
                _ => Value::Empty,
            })
            .collect();
    }
    if complete && present.iter().all(|c| parse_bool(c).is_some()) {
        return cells
            .iter()
            .map(|c| parse_bool(c).map_or(Value::Empty, Value::Bool))
            .collect();
    }
    cells
        .iter()
        .map(|c| {
            if is_na(c) {
                Value::Empty
            } else {
                Value::text(*c)
            }
        })
        .collect()
}

/// Blank headers become `Unnamed: <i>`, repeats get `.1`, `.2`, ... suffixes.
fn unique_headers(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out: IndexSet<String> = IndexSet::new();
    for (i, name) in names.enumerate() {
        let name = if name.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name
        };
        let mut candidate = name.clone();
        while out.contains(&candidate) {
            let n = seen.entry(name.clone()).or_insert(0);
            *n += 1;
            candidate = format!("{}.{}", name, n);
        }
        out.insert(candidate);
    }
    out.into_iter().collect()
}

pub fn read_spreadsheet(bytes: &[u8], max_rows: usize) -> Result<InvoiceTable, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)??;

    let mut rows = range.rows();
    let header = rows.next().ok_or(LoadError::EmptyInput)?;
    let columns = unique_headers(header.iter().map(|c| cell_value(c).to_string()));

    let mut table = InvoiceTable::new(columns);
    for row in rows
        .map(|r| r.iter().map(cell_value).collect::<Vec<Value>>())
        .filter(|r| r.iter().any(|v| !v.is_missing()))
        .take(max_rows)
    {
        table.push_row(row);
    }
    Ok(table)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Empty,
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if s.is_empty() => Value::Empty,
        Data::String(s) => Value::text(s.as_str()),
        other => Value::text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn csv_columns_are_typed_per_column() {
        let data = "Invoice,Description,Price,Quantity,Customer ID\n\
                    536365,WHITE MUG,2.55,6,17850\n\
                    536366,test,3,,17850\n\
                    536367,,1e2,2,\n";
        let t = read_csv(data.as_bytes()).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.cell(0, "Invoice"), Some(&Value::Int(536365)));
        assert_eq!(t.cell(1, "Price"), Some(&Value::Float(3.0)));
        assert_eq!(t.cell(2, "Price"), Some(&Value::Float(100.0)));
        assert_eq!(t.cell(1, "Quantity"), Some(&Value::Empty));
        assert_eq!(t.cell(0, "Quantity"), Some(&Value::Float(6.0)));
        assert_eq!(t.cell(2, "Description"), Some(&Value::Empty));
        assert_eq!(t.cell(0, "Description"), Some(&Value::text("WHITE MUG")));
    }

    #[test]
    fn mixed_column_stays_text() {
        let t = read_csv(b"Invoice,Price\n1,10\n2,free\n3,NA\n").unwrap();
        assert_eq!(t.cell(0, "Price"), Some(&Value::text("10")));
        assert_eq!(t.cell(2, "Price"), Some(&Value::Empty));
    }

    #[test]
    fn short_rows_padded_long_rows_rejected() {
        let t = read_csv(b"a,b,c\n1,2\n").unwrap();
        assert_eq!(t.cell(0, "c"), Some(&Value::Empty));

        let err = read_csv(b"a,b\n1,2\n1,2,3\n").unwrap_err();
        assert!(matches!(
            err,
            LoadError::RecordTooLong {
                line: 3,
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn empty_input_is_fatal() {
        assert!(matches!(read_csv(b""), Err(LoadError::EmptyInput)));
    }

    #[test]
    fn headers_are_made_unique() {
        let t = read_csv(b"Price,Price,,Price\n1,2,3,4\n").unwrap();
        assert_eq!(t.columns(), &["Price", "Price.1", "Unnamed: 2", "Price.2"]);
    }

    #[test]
    fn dispatch_by_extension() {
        assert!(is_csv("faturalar.CSV"));
        assert!(!is_csv("faturalar.xlsx"));
        assert!(matches!(
            load_table("faturalar.xlsx", b"not a workbook", 5000),
            Err(LoadError::Spreadsheet(_))
        ));
    }

    #[test]
    fn spreadsheet_rows_are_capped() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Invoice").unwrap();
        sheet.write_string(0, 1, "Description").unwrap();
        sheet.write_string(0, 2, "Price").unwrap();
        for r in 1..=12u32 {
            sheet.write_number(r, 0, r as f64).unwrap();
            sheet.write_string(r, 1, "Kargo ücreti").unwrap();
            sheet.write_number(r, 2, 9.5).unwrap();
        }
        let bytes = workbook.save_to_buffer().unwrap();

        let t = load_table("upload.xlsx", &bytes, 10).unwrap();
        assert_eq!(t.len(), 10);
        assert_eq!(t.columns(), &["Invoice", "Description", "Price"]);
        assert_eq!(t.cell(0, "Price"), Some(&Value::Float(9.5)));
        assert_eq!(t.cell(9, "Description"), Some(&Value::text("Kargo ücreti")));
    }
}
