use crate::error::ExportError;
use crate::models::{AuditReport, InvoiceTable, Value};
use rust_xlsxwriter::{Format, FormatBorder, Workbook, Worksheet};

pub const REPORT_FILE_NAME: &str = "SmartInvoice_Rapor.xlsx";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const ABOUT_SHEET_NAME: &str = "Rapor Hakkında";

/// Extra characters added to each auto-sized column.
const COLUMN_MARGIN: usize = 2;

fn about_table() -> InvoiceTable {
    InvoiceTable::from_rows(
        vec!["Rapor".to_string(), "Açıklama".to_string()],
        vec![vec![
            Value::text("Bu dosya SmartInvoice tarafından otomatik oluşturulmuştur."),
            Value::text(
                "Her analiz sonucu ayrı bir sekmede, başlıkları ve otomatik kolon genişliğiyle sunulmuştur.",
            ),
        ]],
    )
}

/// Widest stringified cell or header, in characters, plus the margin.
fn column_width(table: &InvoiceTable, col: usize) -> usize {
    let longest = table
        .rows()
        .iter()
        .map(|r| r[col].to_string().chars().count())
        .max()
        .unwrap_or(0);
    longest.max(table.columns()[col].chars().count()) + COLUMN_MARGIN
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &InvoiceTable,
    header: &Format,
) -> Result<(), ExportError> {
    for (col, name) in table.columns().iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, name, header)?;
    }

    for (r, row) in table.rows().iter().enumerate() {
        let r = (r + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            let col = col as u16;
            match value {
                Value::Empty => {}
                Value::Int(i) => {
                    worksheet.write_number(r, col, *i as f64)?;
                }
                Value::Float(f) if f.is_finite() => {
                    worksheet.write_number(r, col, *f)?;
                }
                Value::Float(_) => {}
                Value::Text(s) => {
                    worksheet.write_string(r, col, s)?;
                }
                Value::Bool(b) => {
                    worksheet.write_boolean(r, col, *b)?;
                }
            }
        }
    }

    for col in 0..table.columns().len() {
        worksheet.set_column_width(col as u16, column_width(table, col) as f64)?;
    }
    Ok(())
}

/// 导出报表: one sheet per (name, table) in order, then the about sheet.
/// Empty tables are written as header-only sheets.
pub fn export_workbook(sheets: &[(&str, &InvoiceTable)]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold().set_border(FormatBorder::Thin);

    for (name, table) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;
        write_table(worksheet, table, &header)?;
        tracing::debug!("Sheet '{}' written: {} rows", name, table.len());
    }

    let about = workbook.add_worksheet();
    about.set_name(ABOUT_SHEET_NAME)?;
    write_table(about, &about_table(), &header)?;

    let bytes = workbook.save_to_buffer()?;
    tracing::info!("Report workbook built: {} sheets, {} bytes", sheets.len() + 1, bytes.len());
    Ok(bytes)
}

pub fn export_audit(report: &AuditReport) -> Result<Vec<u8>, ExportError> {
    let sheets = report.sheets();
    let refs: Vec<(&str, &InvoiceTable)> = sheets.iter().map(|(name, t)| (*name, &**t)).collect();
    export_workbook(&refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisKind;
    use calamine::{open_workbook_auto_from_rs, Data, Reader};
    use std::io::Cursor;

    #[test]
    fn empty_tables_give_six_sheets_with_headers_only() {
        let bytes = export_audit(&AuditReport::default()).unwrap();
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();

        let names = workbook.sheet_names();
        let mut expected: Vec<String> = AnalysisKind::ALL
            .iter()
            .map(|k| k.sheet_name().to_string())
            .collect();
        expected.push(ABOUT_SHEET_NAME.to_string());
        assert_eq!(names, expected);

        for kind in AnalysisKind::ALL {
            let range = workbook.worksheet_range(kind.sheet_name()).unwrap();
            assert_eq!(range.height(), 1, "{} should be header-only", kind.sheet_name());
            assert_eq!(range.width(), kind.preview_columns().len());
        }
        let about = workbook.worksheet_range(ABOUT_SHEET_NAME).unwrap();
        assert_eq!(about.height(), 2);
    }

    #[test]
    fn values_round_trip_with_types() {
        let table = InvoiceTable::from_rows(
            vec!["Invoice".into(), "Description".into(), "Price".into(), "Flag".into()],
            vec![
                vec![Value::Int(7), Value::text("Danışmanlık"), Value::Float(12.5), Value::Bool(true)],
                vec![Value::Int(8), Value::Empty, Value::Float(f64::NAN), Value::Bool(false)],
            ],
        );
        let bytes = export_workbook(&[("Sheet", &table)]).unwrap();
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range("Sheet").unwrap();

        assert_eq!(range.get((0, 1)), Some(&Data::String("Description".into())));
        assert_eq!(range.get((1, 1)), Some(&Data::String("Danışmanlık".into())));
        assert_eq!(range.get((1, 2)), Some(&Data::Float(12.5)));
        assert_eq!(range.get((1, 3)), Some(&Data::Bool(true)));
        assert_eq!(range.get((2, 2)), Some(&Data::Empty));
    }

    #[test]
    fn width_covers_longest_value_or_header() {
        let table = InvoiceTable::from_rows(
            vec!["Price".into(), "Description".into()],
            vec![vec![Value::Float(1234567.25), Value::text("ab")]],
        );
        assert_eq!(column_width(&table, 0), "1234567.25".len() + 2);
        assert_eq!(column_width(&table, 1), "Description".len() + 2);
        assert_eq!(column_width(&InvoiceTable::with_headers(&["Invoice"]), 0), 9);
    }
}
