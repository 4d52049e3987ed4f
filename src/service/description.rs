use crate::models::{InvoiceTable, Value};

/// Vague-description rule: a denylist substring match or a too-short text.
/// Keywords are matched case-insensitively; only text cells can match.
#[derive(Debug, Clone)]
pub struct DescriptionRule {
    keywords: Vec<String>,
    min_chars: usize,
}

impl DescriptionRule {
    pub fn new<S: AsRef<str>>(keywords: &[S], min_chars: usize) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            min_chars,
        }
    }

    pub fn is_suspect(&self, value: &Value) -> bool {
        let Some(desc) = value.as_text() else {
            return false;
        };
        let desc = desc.to_lowercase();
        if self.keywords.iter().any(|k| desc.contains(k.as_str())) {
            return true;
        }
        desc.trim().chars().count() < self.min_chars
    }
}

/// 可疑描述检测: rows whose `Description` trips the rule, tagged with
/// `SuspectDescription = true`.
pub fn detect_suspicious_descriptions(table: &InvoiceTable, rule: &DescriptionRule) -> InvoiceTable {
    let matches: Vec<usize> = table
        .column("Description")
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter(|(_, v)| rule.is_suspect(v))
        .map(|(row, _)| row)
        .collect();

    let mut result = table.select(&matches);
    result.set_column("SuspectDescription", vec![Value::Bool(true); matches.len()]);
    result
}
