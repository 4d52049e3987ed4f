use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::models::{AnalysisKind, AnalysisOutcome, AnalysisReport, AuditReport, InvoiceTable};
use crate::service::amount::detect_amount_outliers;
use crate::service::customer::detect_customer_outliers;
use crate::service::description::{detect_suspicious_descriptions, DescriptionRule};
use crate::service::duplicate::detect_repeated_charges;
use crate::service::isolation_forest::ForestParams;
use crate::service::multi_feature::detect_multi_feature_outliers;
use std::time::Instant;

/// 发票审计服务: runs the five analyses over one uploaded table.
pub struct InvoiceAuditor {
    config: AnalysisConfig,
    rule: DescriptionRule,
}

impl InvoiceAuditor {
    pub fn new(config: AnalysisConfig) -> Self {
        let rule = DescriptionRule::new(config.suspect_keywords.as_slice(), config.min_description_chars);
        Self { config, rule }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// One sequential pass. Each analysis stands alone: a missing column skips it,
    /// a failure is recorded on it, and neither affects the others.
    pub fn audit(&self, table: &InvoiceTable) -> AuditReport {
        let start = Instant::now();
        tracing::info!(
            "Audit started: {} rows, columns {:?}",
            table.len(),
            table.columns()
        );

        let params = ForestParams::from(&self.config);
        let analyses = AnalysisKind::ALL
            .iter()
            .map(|&kind| {
                run(kind, table, |t| match kind {
                    AnalysisKind::AmountOutlier => detect_amount_outliers(t, params),
                    AnalysisKind::SuspiciousDescription => {
                        Ok(detect_suspicious_descriptions(t, &self.rule))
                    }
                    AnalysisKind::RepeatedCharge => detect_repeated_charges(t),
                    AnalysisKind::MultiFeatureOutlier => detect_multi_feature_outliers(t, params),
                    AnalysisKind::CustomerOutlier => {
                        detect_customer_outliers(t, self.config.customer_sigma)
                    }
                })
            })
            .collect();

        tracing::info!("Audit finished in {:?}", start.elapsed());
        AuditReport { analyses }
    }
}

fn run(
    kind: AnalysisKind,
    table: &InvoiceTable,
    analysis: impl FnOnce(&InvoiceTable) -> Result<InvoiceTable, AnalysisError>,
) -> AnalysisReport {
    let missing = table.missing_columns(kind.required_columns());
    let outcome = if !missing.is_empty() {
        tracing::warn!("[{}] skipped, missing columns {:?}", kind.sheet_name(), missing);
        AnalysisOutcome::Skipped { missing }
    } else {
        match analysis(table) {
            Ok(result) => {
                tracing::info!("[{}] {} rows flagged", kind.sheet_name(), result.len());
                AnalysisOutcome::Completed(result)
            }
            Err(e) => {
                tracing::error!("[{}] failed: {}", kind.sheet_name(), e);
                AnalysisOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    };
    AnalysisReport { kind, outcome }
}
