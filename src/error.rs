use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KbmAccrualError {
    #[error("Invalid year '{0}': expected exactly four digits")]
    InvalidYear(String),

    #[error("Unrecognized month name '{0}'")]
    InvalidMonth(String),

    #[error("No branch selected: at least one branch code is required")]
    EmptyBranchSelection,

    #[error("Unknown branch code '{0}'")]
    UnknownBranch(String),

    #[error("Dataset has {found} sheet(s), expected at least {expected}")]
    MissingSheet { expected: usize, found: usize },

    #[error("Sheet '{sheet}' has no header row (every row has fewer than {min_cells} non-empty cells)")]
    MissingHeader { sheet: String, min_cells: usize },

    #[error("Sheet '{sheet}' is missing required column '{column}'")]
    MissingColumn { sheet: String, column: String },

    #[error("Reference data '{source_name}' could not be loaded: {details}")]
    ReferenceData { source_name: String, details: String },

    #[error("Journal for branch {branch} does not balance: debits {debits} != accrual credit {credit}")]
    UnbalancedJournal {
        branch: String,
        debits: Decimal,
        credit: Decimal,
    },

    #[error("Amount overflow while totalling branch {branch}")]
    AmountOverflow { branch: String },

    #[error("Spreadsheet read error: {0}")]
    SpreadsheetRead(#[from] calamine::Error),

    #[error("Spreadsheet write error: {0}")]
    SpreadsheetWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KbmAccrualError>;
