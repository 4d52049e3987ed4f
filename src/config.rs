use serde::{Deserialize, Serialize};

/// Placeholder or vague phrases that make an invoice description suspicious.
/// Matched case-insensitively as substrings.
pub const DEFAULT_SUSPECT_KEYWORDS: &[&str] = &[
    "unknown",
    "misc",
    "various",
    "test",
    "sample",
    "no description",
    "dummy",
    "undefined",
    "hizmet bedeli",
    "genel gider",
    "diğer",
    "vs",
    "çeşitli",
    "lost",
    "missing",
];

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Tunables of the audit pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Expected share of anomalous rows for the isolation forests.
    pub contamination: f64,
    pub seed: u64,
    pub n_estimators: usize,
    /// Subsample size per tree (capped at the sample count).
    pub max_samples: usize,
    pub max_spreadsheet_rows: usize,
    /// Trimmed descriptions shorter than this are suspicious.
    pub min_description_chars: usize,
    /// Deviation multiplier for the per-customer rule.
    pub customer_sigma: f64,
    pub suspect_keywords: Vec<String>,
    pub preview_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            contamination: 0.05,
            seed: 42,
            n_estimators: 100,
            max_samples: 256,
            max_spreadsheet_rows: 5000,
            min_description_chars: 5,
            customer_sigma: 2.0,
            suspect_keywords: DEFAULT_SUSPECT_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preview_rows: 20,
        }
    }
}

impl AppConfig {
    /// Defaults, then an optional `smart_invoice.{toml,yaml,json}` file, then
    /// `SMART_INVOICE_*` environment variables (`__` separates nested keys).
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("smart_invoice").required(false))
            .add_source(
                config::Environment::with_prefix("SMART_INVOICE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_audit_contract() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.analysis.contamination, 0.05);
        assert_eq!(cfg.analysis.seed, 42);
        assert_eq!(cfg.analysis.max_spreadsheet_rows, 5000);
        assert!(cfg.analysis.suspect_keywords.iter().any(|k| k == "no description"));
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn partial_sources_fall_back_to_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .set_override("analysis.seed", 7)
            .unwrap()
            .set_override("server.port", 9000)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.analysis.seed, 7);
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.analysis.n_estimators, 100);
        assert_eq!(cfg.server.host, "127.0.0.1");
    }
}
