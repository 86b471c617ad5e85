// 📇 Stock Catalog - the one list of known tickers
// Every tag the gateway emits resolves through this table, so the classifier
// rules and the manual picker can never disagree on a display name.

use anyhow::{bail, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Catalog shipped with the binary
const BUILTIN_CATALOG_CSV: &str = include_str!("../data/stock_catalog.csv");

// ============================================================================
// STOCK ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    /// 4-digit exchange code, e.g. "2330"
    pub code: String,

    /// Display name, e.g. "台積電"
    pub name: String,
}

/// True if `code` is exactly four ASCII digits
pub fn is_valid_code(code: &str) -> bool {
    code.len() == 4 && code.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// STOCK CATALOG
// ============================================================================

/// Immutable code → entry table.
///
/// Declaration order is preserved for listing; lookups go through an index.
#[derive(Debug, Clone)]
pub struct StockCatalog {
    entries: Vec<StockEntry>,
    index: HashMap<String, usize>,
}

impl StockCatalog {
    /// Catalog embedded in the binary (`data/stock_catalog.csv`)
    pub fn builtin() -> Result<Self> {
        Self::from_csv_reader(BUILTIN_CATALOG_CSV.as_bytes())
            .context("Failed to parse built-in stock catalog")
    }

    /// Load a catalog from a `code,name` CSV file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open catalog file: {:?}", path.as_ref()))?;

        Self::from_csv_reader(file)
            .with_context(|| format!("Failed to parse catalog file: {:?}", path.as_ref()))
    }

    /// Parse a catalog from any CSV source with a `code,name` header
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut entries = Vec::new();
        for (line, record) in rdr.deserialize::<StockEntry>().enumerate() {
            let entry = record.with_context(|| format!("Invalid catalog row {}", line + 1))?;
            entries.push(entry);
        }

        Self::from_entries(entries)
    }

    /// Build from entries, rejecting malformed or repeated codes
    pub fn from_entries(entries: Vec<StockEntry>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            if !is_valid_code(&entry.code) {
                bail!("Stock code must be 4 digits, got {:?}", entry.code);
            }
            if index.insert(entry.code.clone(), i).is_some() {
                bail!("Duplicate stock code in catalog: {}", entry.code);
            }
        }

        Ok(StockCatalog { entries, index })
    }

    /// Look up one entry by code
    pub fn get(&self, code: &str) -> Option<&StockEntry> {
        self.index.get(code).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn entries(&self) -> &[StockEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
