use crate::models::table::InvoiceTable;
use serde::Serialize;
use std::borrow::Cow;

/// 分析类型 (the five analyses, in report order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    AmountOutlier,
    SuspiciousDescription,
    RepeatedCharge,
    MultiFeatureOutlier,
    CustomerOutlier,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 5] = [
        AnalysisKind::AmountOutlier,
        AnalysisKind::SuspiciousDescription,
        AnalysisKind::RepeatedCharge,
        AnalysisKind::MultiFeatureOutlier,
        AnalysisKind::CustomerOutlier,
    ];

    pub fn sheet_name(self) -> &'static str {
        match self {
            AnalysisKind::AmountOutlier => "Tutar Bazlı Anomali",
            AnalysisKind::SuspiciousDescription => "Şüpheli Açıklamalar",
            AnalysisKind::RepeatedCharge => "Tekrarlayan Faturalar",
            AnalysisKind::MultiFeatureOutlier => "Gelişmiş Anomali",
            AnalysisKind::CustomerOutlier => "Müşteri Bazlı Anomali",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AnalysisKind::AmountOutlier => "Anomali Tespiti (Tutar Bazlı)",
            AnalysisKind::SuspiciousDescription => "Şüpheli Açıklama Analizi (NLP)",
            AnalysisKind::RepeatedCharge => "Tekrarlayan Açıklama ve Tutar Analizi",
            AnalysisKind::MultiFeatureOutlier => "Gelişmiş Anomali Tespiti (Çoklu Özellik)",
            AnalysisKind::CustomerOutlier => "Müşteri/Firma Bazında Lokal Anomali Tespiti",
        }
    }

    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            AnalysisKind::AmountOutlier => &["Price"],
            AnalysisKind::SuspiciousDescription => &["Description"],
            AnalysisKind::RepeatedCharge => &["Description", "Price"],
            AnalysisKind::MultiFeatureOutlier => &["Price", "Quantity", "Customer ID", "Description"],
            AnalysisKind::CustomerOutlier => &["Price", "Customer ID"],
        }
    }

    /// Columns shown in the on-screen preview; also the header of a skipped sheet.
    pub fn preview_columns(self) -> &'static [&'static str] {
        match self {
            AnalysisKind::AmountOutlier => &["Invoice", "Description", "Price", "Anomaly"],
            AnalysisKind::SuspiciousDescription => &["Invoice", "Description", "Price"],
            AnalysisKind::RepeatedCharge => &["Invoice", "Description", "Price", "RepeatCount"],
            AnalysisKind::MultiFeatureOutlier => &[
                "Invoice",
                "Customer ID",
                "Description",
                "Price",
                "Quantity",
                "DescLength",
            ],
            AnalysisKind::CustomerOutlier => &["Invoice", "Customer ID", "Description", "Price"],
        }
    }

    fn skipped_message(self) -> &'static str {
        match self {
            AnalysisKind::AmountOutlier => {
                "Price (Tutar) sütunu bulunamadı. Anomali tespiti atlandı."
            }
            AnalysisKind::SuspiciousDescription => {
                "Description (Açıklama) sütunu bulunamadı. NLP analizi için açıklama alanı gereklidir."
            }
            AnalysisKind::RepeatedCharge => {
                "Description veya Price alanı bulunamadı. Tekrarlayan analiz yapılamadı."
            }
            AnalysisKind::MultiFeatureOutlier => {
                "Price, Quantity, Customer ID ve Description alanları olmadan gelişmiş anomaly detection yapılamaz."
            }
            AnalysisKind::CustomerOutlier => {
                "Customer ID ve Price alanı olmadan müşteri bazlı anomaly detection yapılamaz."
            }
        }
    }

    fn completed_status(self, count: usize) -> (StatusLevel, String) {
        match self {
            AnalysisKind::AmountOutlier => (
                StatusLevel::Success,
                format!("Bulunan anomali fatura sayısı: {}", count),
            ),
            AnalysisKind::SuspiciousDescription => (
                StatusLevel::Warning,
                format!("Şüpheli açıklama içeren fatura sayısı: {}", count),
            ),
            AnalysisKind::RepeatedCharge => (
                StatusLevel::Info,
                format!(
                    "Tekrarlayan açıklama ve benzer tutara sahip fatura sayısı: {}",
                    count
                ),
            ),
            AnalysisKind::MultiFeatureOutlier => (
                StatusLevel::Success,
                format!(
                    "Gelişmiş anomaly detection ile bulunan anomali fatura sayısı: {}",
                    count
                ),
            ),
            AnalysisKind::CustomerOutlier if count == 0 => (
                StatusLevel::Info,
                "Müşteri bazında istatistiksel anomaly bulunamadı.".to_string(),
            ),
            AnalysisKind::CustomerOutlier => (
                StatusLevel::Success,
                format!("Müşteri/Firma bazında bulunan anomaly sayısı: {}", count),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Success,
    Warning,
    Info,
    Error,
}

/// Outcome of one analysis. Missing columns are a normal outcome, not an error.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Completed(InvoiceTable),
    Skipped { missing: Vec<String> },
    Failed { message: String },
}

/// 单项分析结果 (one analysis and what came of it)
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub kind: AnalysisKind,
    pub outcome: AnalysisOutcome,
}

impl AnalysisReport {
    /// Table destined for the report sheet; header-only when nothing was produced.
    pub fn table(&self) -> Cow<'_, InvoiceTable> {
        match &self.outcome {
            AnalysisOutcome::Completed(table) => Cow::Borrowed(table),
            _ => Cow::Owned(InvoiceTable::with_headers(self.kind.preview_columns())),
        }
    }

    pub fn preview(&self) -> InvoiceTable {
        self.table().project(self.kind.preview_columns())
    }

    pub fn row_count(&self) -> usize {
        match &self.outcome {
            AnalysisOutcome::Completed(table) => table.len(),
            _ => 0,
        }
    }

    pub fn status(&self) -> (StatusLevel, String) {
        match &self.outcome {
            AnalysisOutcome::Completed(table) => self.kind.completed_status(table.len()),
            AnalysisOutcome::Skipped { .. } => {
                (StatusLevel::Info, self.kind.skipped_message().to_string())
            }
            AnalysisOutcome::Failed { message } => (
                StatusLevel::Error,
                format!("{} sırasında hata: {}", self.kind.title(), message),
            ),
        }
    }
}

/// 审计结果汇总: all five analyses of one upload
#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub analyses: Vec<AnalysisReport>,
}

impl AuditReport {
    pub fn get(&self, kind: AnalysisKind) -> Option<&AnalysisReport> {
        self.analyses.iter().find(|a| a.kind == kind)
    }

    /// (sheet name, table) pairs in report order.
    pub fn sheets(&self) -> Vec<(&'static str, Cow<'_, InvoiceTable>)> {
        AnalysisKind::ALL
            .iter()
            .map(|&kind| match self.get(kind) {
                Some(report) => (kind.sheet_name(), report.table()),
                None => (
                    kind.sheet_name(),
                    Cow::Owned(InvoiceTable::with_headers(kind.preview_columns())),
                ),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_outcome_exports_header_only() {
        let report = AnalysisReport {
            kind: AnalysisKind::RepeatedCharge,
            outcome: AnalysisOutcome::Skipped {
                missing: vec!["Price".into()],
            },
        };
        let table = report.table();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 4);
        assert_eq!(report.status().0, StatusLevel::Info);
    }

    #[test]
    fn failed_outcome_reports_error_level() {
        let report = AnalysisReport {
            kind: AnalysisKind::AmountOutlier,
            outcome: AnalysisOutcome::Failed {
                message: "boom".into(),
            },
        };
        let (level, message) = report.status();
        assert_eq!(level, StatusLevel::Error);
        assert!(message.ends_with("boom"));
    }

    #[test]
    fn missing_analyses_still_fill_every_sheet() {
        let report = AuditReport::default();
        let sheets = report.sheets();
        assert_eq!(sheets.len(), 5);
        assert_eq!(sheets[2].0, "Tekrarlayan Faturalar");
    }
}
