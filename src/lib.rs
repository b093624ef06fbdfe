//! # KBM Accrual
//!
//! A library for closing a reporting period over container-handling ("KBM") records:
//! it finds activity that lacks a supporting document, prices it, and turns it into a
//! per-branch balanced accrual journal.
//!
//! ## Core Concepts
//!
//! - **Old / New format**: two export schemas; the old one carries a `Sub Total`, the new
//!   one a quantity that is priced against a tariff list
//! - **Classification**: each record is tagged `NO_DOC_PORT`, `NO_DOC_YARD`, `NEXT_PERIOD`
//!   or left unset; the next-period rule always wins
//! - **Accrual journal**: one debit per undocumented cost and one credit per branch; every
//!   branch balances and zero-value lines are dropped
//! - **Carry-forward list**: document numbers already dated into the next period
//!
//! ## Example
//!
//! ```rust,ignore
//! use kbm_accrual::*;
//!
//! let dataset = read_workbook("KBM_SEPTEMBER.xlsx")?;
//! let references = ReferenceTables::load("list_COA.csv", "tarif.csv")?;
//! let params = RunParameters {
//!     month: "september".to_string(),
//!     year: "2025".to_string(),
//!     branches: vec!["BMS".to_string(), "SBY".to_string()],
//! };
//!
//! let report = process_kbm_accrual(&dataset, &references, &params, &AccrualConfig::default())?;
//! write_report(&report, "OUTPUT_KBM_SEPTEMBER_2025.xlsx")?;
//! ```

pub mod branches;
pub mod carry_forward;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod ingestion;
pub mod journal;
pub mod period;
pub mod reference;
pub mod report;
pub mod schema;
pub mod sheet;
pub mod workbook;

pub use branches::{BranchDirectory, DEFAULT_BRANCHES};
pub use carry_forward::build_carry_forward;
pub use classifier::{ClassificationRule, Classifier};
pub use config::{AccountCodes, AccrualConfig, BranchCategory, BranchEntry};
pub use engine::{process_dataset, AccrualEngine, AccrualReport, ClassifiedRecords};
pub use error::{KbmAccrualError, Result};
pub use ingestion::{KbmDataset, SheetRole};
pub use journal::{build_journal, verify_journal_balance, JournalBuilder};
pub use period::ReportingPeriod;
pub use reference::{AccountLookup, PriceEntry, PriceList, ReferenceTables};
pub use report::{BranchReport, DetailBlock};
pub use schema::*;
pub use sheet::{Cell, RawSheet};
pub use workbook::{read_workbook, render_report, write_report};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Caller-supplied run parameters, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Month name, case-insensitive (`januari` .. `desember`).
    pub month: String,
    /// Exactly four digits.
    pub year: String,
    pub branches: Vec<String>,
}

/// Validated run parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub period: ReportingPeriod,
    /// Known branch codes in the order given, without duplicates.
    pub branches: Vec<String>,
}

impl RunContext {
    pub fn new(period: ReportingPeriod, branches: Vec<String>) -> Self {
        Self { period, branches }
    }
}

impl RunParameters {
    pub fn validate(&self, directory: &BranchDirectory) -> Result<RunContext> {
        let period = ReportingPeriod::new(&self.month, &self.year)?;

        let mut seen = HashSet::new();
        let mut branches = Vec::new();
        for code in &self.branches {
            let code = code.trim().to_uppercase();
            if code.is_empty() {
                continue;
            }
            if !directory.contains(&code) {
                return Err(KbmAccrualError::UnknownBranch(code));
            }
            if seen.insert(code.clone()) {
                branches.push(code);
            }
        }

        if branches.is_empty() {
            return Err(KbmAccrualError::EmptyBranchSelection);
        }

        Ok(RunContext { period, branches })
    }

    /// `OUTPUT_KBM_<MONTH>_<YEAR>.xlsx`
    pub fn default_output_name(&self) -> Result<String> {
        let period = ReportingPeriod::new(&self.month, &self.year)?;
        Ok(format!(
            "OUTPUT_KBM_{}_{}.xlsx",
            period.month_label, period.year
        ))
    }
}

pub struct AccrualProcessor;

impl AccrualProcessor {
    pub fn process(
        dataset: &KbmDataset,
        references: &ReferenceTables,
        params: &RunParameters,
        config: &AccrualConfig,
    ) -> Result<AccrualReport> {
        config.validate()?;
        let run = params.validate(&config.branch_directory())?;

        info!(
            "Processing KBM accrual for {} across {} branch(es)",
            run.period.label(),
            run.branches.len()
        );
        debug!(
            "Dataset contains {} sheet(s); branches: {}",
            dataset.sheets.len(),
            run.branches.join(", ")
        );

        process_dataset(dataset, references, &run, config)
    }

    pub fn process_with_verification(
        dataset: &KbmDataset,
        references: &ReferenceTables,
        params: &RunParameters,
        config: &AccrualConfig,
    ) -> Result<AccrualReport> {
        let report = Self::process(dataset, references, params, config)?;

        verify_journal_balance(&report.journal)?;

        Ok(report)
    }
}

pub fn process_kbm_accrual(
    dataset: &KbmDataset,
    references: &ReferenceTables,
    params: &RunParameters,
    config: &AccrualConfig,
) -> Result<AccrualReport> {
    AccrualProcessor::process(dataset, references, params, config)
}

pub fn process_with_verification(
    dataset: &KbmDataset,
    references: &ReferenceTables,
    params: &RunParameters,
    config: &AccrualConfig,
) -> Result<AccrualReport> {
    AccrualProcessor::process_with_verification(dataset, references, params, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(month: &str, year: &str, branches: &[&str]) -> RunParameters {
        RunParameters {
            month: month.to_string(),
            year: year.to_string(),
            branches: branches.iter().map(|b| b.to_string()).collect(),
        }
    }

    #[test]
    fn test_branch_selection_is_normalized() {
        let directory = AccrualConfig::default().branch_directory();
        let run = params("September", "2025", &["sby", " BMS ", "SBY"])
            .validate(&directory)
            .unwrap();

        assert_eq!(run.branches, vec!["SBY", "BMS"]);
        assert_eq!(run.period.month, 9);
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let directory = AccrualConfig::default().branch_directory();

        assert!(matches!(
            params("september", "25", &["BMS"]).validate(&directory),
            Err(KbmAccrualError::InvalidYear(_))
        ));
        assert!(matches!(
            params("septembre", "2025", &["BMS"]).validate(&directory),
            Err(KbmAccrualError::InvalidMonth(_))
        ));
        assert!(matches!(
            params("september", "2025", &[]).validate(&directory),
            Err(KbmAccrualError::EmptyBranchSelection)
        ));
        assert!(matches!(
            params("september", "2025", &["XXX"]).validate(&directory),
            Err(KbmAccrualError::UnknownBranch(_))
        ));
    }

    #[test]
    fn test_validation_runs_before_the_dataset_is_read() {
        let result = process_kbm_accrual(
            &KbmDataset::default(),
            &ReferenceTables::default(),
            &params("september", "20x5", &["BMS"]),
            &AccrualConfig::default(),
        );
        assert!(matches!(result, Err(KbmAccrualError::InvalidYear(_))));
    }

    #[test]
    fn test_default_output_name() {
        assert_eq!(
            params("oktober", "2025", &["BMS"])
                .default_output_name()
                .unwrap(),
            "OUTPUT_KBM_OKTOBER_2025.xlsx"
        );
    }
}
