use crate::error::{KbmAccrualError, Result};
use crate::sheet::{Cell, RawSheet, Table};
use crate::workbook::read_workbook;
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const ACCOUNT_KEY_COLUMN: &str = "Nama Kegiatan";
pub const ACCOUNT_CODE_COLUMN: &str = "COA";

pub const PRICE_KEY_COLUMN: &str = "CABANG";
pub const PRICE_HANDLING_COLUMN: &str = "STVDR";
pub const PRICE_HAULAGE_COLUMN: &str = "HAULAGE";
pub const PRICE_LIFT_COLUMN: &str = "LOLO BM";

/// Chart-of-accounts code by activity name.
#[derive(Debug, Clone, Default)]
pub struct AccountLookup {
    codes: HashMap<String, String>,
}

impl AccountLookup {
    pub fn from_table(table: &Table) -> Result<Self> {
        table.require_columns(&[ACCOUNT_KEY_COLUMN, ACCOUNT_CODE_COLUMN])?;

        let mut lookup = Self::default();
        for row in &table.rows {
            let (Some(key), Some(code)) = (
                row.get(ACCOUNT_KEY_COLUMN).trimmed(),
                row.get(ACCOUNT_CODE_COLUMN).trimmed(),
            ) else {
                continue;
            };
            lookup.insert(key, code);
        }
        Ok(lookup)
    }

    /// The first code registered for a key wins.
    pub fn insert(&mut self, key: impl Into<String>, code: impl Into<String>) {
        let key = key.into();
        if self.codes.contains_key(&key) {
            warn!("Duplicate account lookup key '{}' ignored", key);
            return;
        }
        self.codes.insert(key, code.into());
    }

    pub fn code_for(&self, key: &str) -> Option<&str> {
        self.codes.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Unit rates for one `<branch> <size/type>` combination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub handling: Option<Decimal>,
    pub haulage: Option<Decimal>,
    pub lift_on_lift_off: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct PriceList {
    entries: HashMap<String, PriceEntry>,
}

impl PriceList {
    pub fn key(branch: &str, size: &str) -> String {
        format!("{} {}", branch, size)
    }

    pub fn from_table(table: &Table) -> Result<Self> {
        table.require_columns(&[
            PRICE_KEY_COLUMN,
            PRICE_HANDLING_COLUMN,
            PRICE_HAULAGE_COLUMN,
            PRICE_LIFT_COLUMN,
        ])?;

        let mut prices = Self::default();
        for row in &table.rows {
            let Some(key) = row.get(PRICE_KEY_COLUMN).trimmed() else {
                continue;
            };
            prices.insert(
                key,
                PriceEntry {
                    handling: row.get(PRICE_HANDLING_COLUMN).to_decimal(),
                    haulage: row.get(PRICE_HAULAGE_COLUMN).to_decimal(),
                    lift_on_lift_off: row.get(PRICE_LIFT_COLUMN).to_decimal(),
                },
            );
        }
        Ok(prices)
    }

    /// Keeps the first entry per key so a join never fans out.
    pub fn insert(&mut self, key: impl Into<String>, entry: PriceEntry) {
        let key = key.into();
        if self.entries.contains_key(&key) {
            warn!("Duplicate price entry '{}' ignored", key);
            return;
        }
        self.entries.insert(key, entry);
    }

    pub fn lookup(&self, branch: &str, size: &str) -> Option<&PriceEntry> {
        self.entries.get(&Self::key(branch, size))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The two static lookups, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub accounts: AccountLookup,
    pub prices: PriceList,
}

impl ReferenceTables {
    pub fn new(accounts: AccountLookup, prices: PriceList) -> Self {
        Self { accounts, prices }
    }

    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(accounts_path: P, prices_path: Q) -> Result<Self> {
        let accounts_table = load_reference_table(accounts_path.as_ref())?;
        let accounts = AccountLookup::from_table(&accounts_table)
            .map_err(|e| reference_error(accounts_path.as_ref(), e))?;

        let prices_table = load_reference_table(prices_path.as_ref())?;
        let prices = PriceList::from_table(&prices_table)
            .map_err(|e| reference_error(prices_path.as_ref(), e))?;

        info!(
            "Loaded {} account code(s) and {} price entr(ies)",
            accounts.len(),
            prices.len()
        );

        Ok(Self { accounts, prices })
    }
}

/// Reads a `.csv` or spreadsheet reference file; its first row is the header.
pub fn load_reference_table(path: &Path) -> Result<Table> {
    let sheet = read_reference_sheet(path).map_err(|e| reference_error(path, e))?;
    Table::with_first_row_header(&sheet).map_err(|e| reference_error(path, e))
}

fn read_reference_sheet(path: &Path) -> Result<RawSheet> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        return read_csv_sheet(path);
    }

    read_workbook(path)?
        .sheets
        .into_iter()
        .next()
        .ok_or_else(|| KbmAccrualError::MissingSheet {
            expected: 1,
            found: 0,
        })
}

pub fn read_csv_sheet(path: &Path) -> Result<RawSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::text(field)
                    }
                })
                .collect(),
        );
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    Ok(RawSheet::new(name, rows))
}

fn reference_error(path: &Path, error: KbmAccrualError) -> KbmAccrualError {
    match error {
        KbmAccrualError::ReferenceData { .. } => error,
        other => KbmAccrualError::ReferenceData {
            source_name: path.display().to_string(),
            details: other.to_string(),
        },
    }
}
