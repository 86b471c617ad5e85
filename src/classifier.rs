// 🔎 Topic Classifier - trending topic title → stock tags
//
// Company rules fire first, category rules after, and every emitted code is
// kept at most once. A category rule that overlaps an earlier company match
// only contributes the codes that are still missing.

use crate::catalog::{StockCatalog, StockEntry};
use crate::rules::{KeywordRule, RuleKind, RuleSet};
use crate::tags::{StockTag, TagOrigin};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SELECTION MODE
// ============================================================================

/// How the dashboard builds the tag list for a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Classifier output only
    Trending,

    /// Operator-picked codes only
    Manual,

    /// Trending followed by manual, duplicates across the two kept
    Mixed,
}

impl SelectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::Trending => "trending",
            SelectionMode::Manual => "manual",
            SelectionMode::Mixed => "mixed",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trending" => Ok(SelectionMode::Trending),
            "manual" => Ok(SelectionMode::Manual),
            "mixed" => Ok(SelectionMode::Mixed),
            other => Err(format!(
                "unknown selection mode {:?} (expected trending, manual or mixed)",
                other
            )),
        }
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// A rule with its emitted codes already resolved against the catalog
#[derive(Debug, Clone)]
struct ResolvedRule {
    rule: KeywordRule,
    emits: Vec<StockEntry>,
}

/// Immutable classifier built once from a rule set and a catalog.
#[derive(Debug)]
pub struct TopicClassifier {
    rules: Vec<ResolvedRule>,
    catalog: StockCatalog,
}

impl TopicClassifier {
    /// Build from the embedded rule table and catalog
    pub fn builtin() -> Result<Self> {
        Self::new(RuleSet::builtin()?, StockCatalog::builtin()?)
    }

    /// Resolve every emitted code against `catalog`.
    ///
    /// Fails if a rule names a code the catalog does not know.
    pub fn new(rules: RuleSet, catalog: StockCatalog) -> Result<Self> {
        let mut resolved = Vec::with_capacity(rules.rule_count());

        for rule in rules.rules() {
            let mut emits = Vec::with_capacity(rule.emits.len());
            for code in &rule.emits {
                match catalog.get(code) {
                    Some(entry) => emits.push(entry.clone()),
                    None => bail!("Rule {} emits unknown stock code {}", rule.id, code),
                }
            }

            resolved.push(ResolvedRule {
                rule: rule.clone(),
                emits,
            });
        }

        tracing::debug!(
            rules = resolved.len(),
            catalog = catalog.len(),
            "topic classifier ready"
        );

        Ok(TopicClassifier {
            rules: resolved,
            catalog,
        })
    }

    /// Classify a topic title into trending stock tags.
    ///
    /// Never fails: a title that matches nothing yields an empty list.
    pub fn classify(&self, title: &str) -> Vec<StockTag> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut tags = Vec::new();

        // Rules are stored company-first, so a single pass honors priority
        for resolved in &self.rules {
            if !resolved.rule.matches(title) {
                continue;
            }

            tracing::trace!(rule = %resolved.rule.id, kind = ?resolved.rule.kind, "rule fired");

            for entry in &resolved.emits {
                if seen.insert(entry.code.as_str()) {
                    tags.push(StockTag::from_entry(entry, TagOrigin::Trending));
                }
            }
        }

        tags
    }

    /// Catalog lookup for display code
    pub fn catalog_entry(&self, code: &str) -> Option<&StockEntry> {
        self.catalog.get(code)
    }

    /// Operator-picked codes as manual tags.
    ///
    /// Caller order is kept; unknown codes are skipped and a code picked
    /// twice appears once.
    pub fn manual_tags<S: AsRef<str>>(&self, codes: &[S]) -> Vec<StockTag> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut tags = Vec::new();

        for code in codes {
            let code = code.as_ref().trim();
            match self.catalog.get(code) {
                Some(entry) => {
                    if seen.insert(entry.code.as_str()) {
                        tags.push(StockTag::from_entry(entry, TagOrigin::Manual));
                    }
                }
                None => tracing::debug!(code, "skipping manual code missing from catalog"),
            }
        }

        tags
    }

    /// Compose the tag list for `mode`.
    ///
    /// `Mixed` concatenates trending and manual tags without deduplicating
    /// across the two origins.
    pub fn select<S: AsRef<str>>(
        &self,
        mode: SelectionMode,
        title: &str,
        manual_codes: &[S],
    ) -> Vec<StockTag> {
        match mode {
            SelectionMode::Trending => self.classify(title),
            SelectionMode::Manual => self.manual_tags(manual_codes),
            SelectionMode::Mixed => {
                let mut tags = self.classify(title);
                tags.extend(self.manual_tags(manual_codes));
                tags
            }
        }
    }

    pub fn catalog(&self) -> &StockCatalog {
        &self.catalog
    }

    /// `(id, kind, emitted codes)` in evaluation order
    pub fn rule_summaries(&self) -> Vec<(&str, RuleKind, Vec<&str>)> {
        self.rules
            .iter()
            .map(|r| {
                (
                    r.rule.id.as_str(),
                    r.rule.kind,
                    r.emits.iter().map(|e| e.code.as_str()).collect(),
                )
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
