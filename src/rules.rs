// 🏷️ Classification Rules - Rules as Data
// Keyword triggers that map topic titles to stock codes

use serde::{Deserialize, Serialize};
use anyhow::{bail, Result, Context as AnyhowContext};
use std::fs;
use std::path::Path;

/// Rule table shipped with the binary
const BUILTIN_RULES_JSON: &str = include_str!("../data/stock_rules.json");

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Names one company (its name, short name, or numeric code)
    Company,

    /// Sector or market-wide fallback that injects several tags at once
    Category,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Rule ID for tracking
    pub id: String,

    pub kind: RuleKind,

    /// Substrings that fire the rule (any one is enough)
    pub triggers: Vec<String>,

    /// Stock codes to emit, in output order
    pub emits: Vec<String>,
}

impl KeywordRule {
    /// Check if any trigger appears in the title.
    ///
    /// Plain substring containment, case-sensitive. Triggers are CJK names or
    /// numeric codes so folding case buys nothing.
    pub fn matches(&self, title: &str) -> bool {
        self.triggers
            .iter()
            .any(|trigger| !trigger.is_empty() && title.contains(trigger.as_str()))
    }
}

// ============================================================================
// RULE SET
// ============================================================================

/// Ordered rule table: company rules first, then category rules, each group
/// in declaration order.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<KeywordRule>,
}

impl RuleSet {
    /// Rules embedded in the binary (`data/stock_rules.json`)
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_RULES_JSON).context("Failed to parse built-in stock rules")
    }

    /// Load rules from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read rules file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to load rules file: {:?}", path.as_ref()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let rules: Vec<KeywordRule> = serde_json::from_str(content)
            .context("Failed to parse rules JSON")?;

        Self::from_rules(rules)
    }

    /// Create from a list of rules
    pub fn from_rules(mut rules: Vec<KeywordRule>) -> Result<Self> {
        for rule in &rules {
            if rule.triggers.iter().all(|t| t.is_empty()) {
                bail!("Rule {} has no triggers", rule.id);
            }
            if rule.emits.is_empty() {
                bail!("Rule {} emits no stock codes", rule.id);
            }
        }

        // Stable sort keeps declaration order within each kind
        rules.sort_by_key(|rule| rule.kind);
        Ok(RuleSet { rules })
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// Get number of rules loaded
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
