use std::path::Path;

use serde::Deserialize;

use super::model::{InvestmentRecord, InvestmentRow, SubSegment};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// One `(keywords → label)` rule. Keywords are matched as case-insensitive
/// substrings; any hit selects the label.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rule {
    pub label: SubSegment,
    pub keywords: Vec<String>,
}

impl Rule {
    pub fn new(label: SubSegment, keywords: &[&str]) -> Self {
        Rule {
            label,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered rule list. The first matching rule wins; no match yields
/// [`SubSegment::Other`].
#[derive(Debug, Clone)]
pub struct Classifier {
    // Keywords are stored lower-cased so matching only folds the haystack.
    rules: Vec<Rule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(vec![
            Rule::new(SubSegment::Buyout, &["buyout", "lbo", "leveraged", "רכישת שליטה"]),
            Rule::new(
                SubSegment::VentureCapital,
                &["venture", "vc", "seed", "early stage", "הון סיכון"],
            ),
            Rule::new(SubSegment::Growth, &["growth", "expansion", "צמיחה"]),
            Rule::new(
                SubSegment::RealEstate,
                &["real estate", "property", "reit", "נדל\"ן", "נדלן"],
            ),
        ])
    }
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| Rule {
                label: rule.label,
                keywords: rule
                    .keywords
                    .into_iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Classifier { rules }
    }

    /// Read rules from a JSON file: `[{"label": "Buyout", "keywords": [...]}, ...]`.
    pub fn from_json_file(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rules: Vec<Rule> = serde_json::from_str(&text).map_err(|e| LoadError::Rules {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if rules.is_empty() {
            return Err(LoadError::Rules {
                path: path.to_path_buf(),
                reason: "rule list is empty".into(),
            });
        }
        Ok(Classifier::new(rules))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify free text.
    pub fn classify(&self, text: &str) -> SubSegment {
        let haystack = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| haystack.contains(k.as_str())))
            .map(|rule| rule.label)
            .unwrap_or(SubSegment::Other)
    }

    /// Attach the derived sub-segment to a loaded row. The name is matched
    /// together with the description.
    pub fn classify_row(&self, row: InvestmentRow) -> InvestmentRecord {
        let sub_segment = self.classify(&format!("{} {}", row.fund_name, row.description));
        InvestmentRecord {
            fund_name: row.fund_name,
            description: row.description,
            region: row.region,
            fund_type: row.fund_type,
            investment_size: row.investment_size,
            sub_segment,
        }
    }
}
