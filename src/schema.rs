use crate::sheet::Row;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordFormat {
    /// Legacy export: one pre-computed `Sub Total` per record.
    Old,
    /// Current export: a quantity priced against the tariff list.
    New,
}

impl RecordFormat {
    pub fn source_label(&self) -> &'static str {
        match self {
            RecordFormat::Old => "old",
            RecordFormat::New => "new",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, JsonSchema)]
pub enum ClassificationTag {
    #[default]
    Unset,
    NoDocPort,
    NoDocYard,
    NextPeriod,
}

impl ClassificationTag {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            ClassificationTag::Unset => None,
            ClassificationTag::NoDocPort => Some("NO_DOC_PORT"),
            ClassificationTag::NoDocYard => Some("NO_DOC_YARD"),
            ClassificationTag::NextPeriod => Some("NEXT_PERIOD"),
        }
    }

    pub fn is_no_doc(&self) -> bool {
        matches!(
            self,
            ClassificationTag::NoDocPort | ClassificationTag::NoDocYard
        )
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, ClassificationTag::Unset)
    }
}

/// Whether a new-format record's document already appears in old-format data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CrossReference {
    Hide,
    Show,
}

impl CrossReference {
    pub fn label(&self) -> &'static str {
        match self {
            CrossReference::Hide => "hide",
            CrossReference::Show => "show",
        }
    }
}

/// Quantity times unit rate for each priced component; `None` when the rate or quantity is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostComponents {
    pub handling: Option<Decimal>,
    pub haulage: Option<Decimal>,
    pub lift_on_lift_off: Option<Decimal>,
}

/// Canonical container-handling record, shared by both source formats.
#[derive(Debug, Clone, PartialEq)]
pub struct KbmRecord {
    pub format: RecordFormat,
    pub branch: Option<String>,
    pub vessel_voyage: Option<String>,
    /// `No Dokumen` (old) or the comma-separated `Id Document` (new).
    pub document: Option<String>,
    /// `Jenis Dokumen`; old format only.
    pub document_type: Option<String>,
    pub activity: Option<String>,
    pub size: Option<String>,
    pub status: Option<String>,
    /// `Kode ACC`; old format only.
    pub account_key: Option<String>,
    /// `Sub Total` for the old format, `Qty Angkatan` for the new one.
    pub measure: Option<Decimal>,
    pub tag: ClassificationTag,
    pub costs: Option<CostComponents>,
    pub cross_reference: Option<CrossReference>,
    /// The normalized source row, kept for the detail listing.
    pub source: Row,
}

impl KbmRecord {
    pub fn with_tag(&self, tag: ClassificationTag) -> Self {
        Self {
            tag,
            ..self.clone()
        }
    }

    pub fn document_missing(&self) -> bool {
        is_placeholder(self.document.as_deref())
    }

    pub fn document_type_missing(&self) -> bool {
        is_placeholder(self.document_type.as_deref())
    }

    pub fn branch_is(&self, code: &str) -> bool {
        self.branch.as_deref() == Some(code)
    }
}

pub(crate) fn is_placeholder(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => {
            let v = v.trim();
            v.is_empty() || v == "-"
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, JsonSchema)]
pub enum LineKind {
    Detail,
    AccrualCredit,
}

impl LineKind {
    pub fn code(&self) -> u8 {
        match self {
            LineKind::Detail => 1,
            LineKind::AccrualCredit => 3,
        }
    }
}

/// Fields printed only on the first line of each branch group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalHeader {
    pub date: String,
    pub journal_name: String,
    pub marker: String,
    pub sequence_flag: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub branch: String,
    /// Full branch name; filled when the journal is finalized.
    pub branch_name: Option<String>,
    pub header: Option<JournalHeader>,
    pub description: String,
    pub kind: LineKind,
    pub vessel_voyage: String,
    /// `None` when the underlying amount could not be computed.
    pub debit: Option<Decimal>,
    pub credit: Decimal,
    pub debit_account: Option<String>,
    pub credit_account: String,
}

impl JournalLine {
    pub fn debit_or_zero(&self) -> Decimal {
        self.debit.unwrap_or(Decimal::ZERO)
    }

    /// Only a known zero total is suppressed; a missing debit stays visible.
    pub fn is_zero_value(&self) -> bool {
        match self.debit {
            Some(debit) => debit + self.credit == Decimal::ZERO,
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryForwardEntry {
    pub branch: String,
    pub document_number: String,
    pub vessel_voyage: Option<String>,
    pub source: RecordFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_labels() {
        assert_eq!(ClassificationTag::Unset.label(), None);
        assert_eq!(ClassificationTag::NoDocYard.label(), Some("NO_DOC_YARD"));
        assert!(ClassificationTag::NoDocPort.is_no_doc());
        assert!(!ClassificationTag::NextPeriod.is_no_doc());
        assert!(!ClassificationTag::Unset.is_set());
    }

    #[test]
    fn test_zero_value_lines() {
        let mut line = JournalLine {
            branch: "BMS".to_string(),
            branch_name: None,
            header: None,
            description: "X".to_string(),
            kind: LineKind::Detail,
            vessel_voyage: "V 1".to_string(),
            debit: Some(Decimal::ZERO),
            credit: Decimal::ZERO,
            debit_account: None,
            credit_account: "-".to_string(),
        };
        assert!(line.is_zero_value());

        line.debit = None;
        assert!(!line.is_zero_value());
        assert_eq!(line.debit_or_zero(), Decimal::ZERO);

        line.debit = Some(Decimal::new(150, 0));
        assert!(!line.is_zero_value());
    }

    #[test]
    fn test_line_kind_ordering() {
        assert!(LineKind::Detail < LineKind::AccrualCredit);
        assert_eq!(LineKind::Detail.code(), 1);
        assert_eq!(LineKind::AccrualCredit.code(), 3);
    }
}
