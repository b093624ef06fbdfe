use crate::error::{KbmAccrualError, Result};
use crate::schema::{ClassificationTag, KbmRecord, RecordFormat};
use crate::sheet::{Cell, RawSheet, Row, Table, MIN_NON_EMPTY_CELLS};
use log::debug;

pub mod columns {
    pub const BRANCH: &str = "Port Id";

    pub const OLD_VESSEL: &str = "Vessel Id To";
    pub const OLD_VOYAGE: &str = "Voyage No To";
    pub const OLD_DOCUMENT: &str = "No Dokumen";
    pub const OLD_DOCUMENT_TYPE: &str = "Jenis Dokumen";
    pub const OLD_ACTIVITY: &str = "Nama Kegiatan";
    pub const OLD_SIZE: &str = "Ukuran";
    pub const OLD_STATUS: &str = "Status";
    pub const OLD_SUBTOTAL: &str = "Sub Total";
    pub const OLD_ACCOUNT_KEY: &str = "Kode ACC";

    pub const NEW_VESSEL: &str = "Vessel Id";
    pub const NEW_VOYAGE: &str = "Voyage No";
    pub const NEW_DOCUMENT: &str = "Id Document";
    pub const NEW_ACTIVITY: &str = "Activity System Name";
    pub const NEW_SIZE: &str = "Type Size Name";
    pub const NEW_STATUS: &str = "ETS Status";
    pub const NEW_QUANTITY: &str = "Qty Angkatan";

    pub const VESSEL_VOYAGE: &str = "vesvoy";
    pub const TAG: &str = "Status_KBM";
    pub const HANDLING: &str = "STVDR";
    pub const HAULAGE: &str = "HAULAGE";
    pub const LIFT_ON_LIFT_OFF: &str = "LOLO BM";
    pub const CROSS_REFERENCE: &str = "Status_dokumen";
}

use columns::*;

const OLD_REQUIRED: [&str; 10] = [
    BRANCH,
    OLD_VESSEL,
    OLD_VOYAGE,
    OLD_DOCUMENT,
    OLD_DOCUMENT_TYPE,
    OLD_ACTIVITY,
    OLD_SIZE,
    OLD_STATUS,
    OLD_SUBTOTAL,
    OLD_ACCOUNT_KEY,
];

const NEW_REQUIRED: [&str; 6] = [
    BRANCH,
    NEW_VESSEL,
    NEW_VOYAGE,
    NEW_DOCUMENT,
    NEW_SIZE,
    NEW_QUANTITY,
];

/// How a sheet takes part in the run, by its position in the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetRole {
    /// Old format, one or two periods back: only next-period documents are kept.
    PriorPeriod,
    /// Old format, the period being closed.
    CurrentPeriod,
    NewFormat,
}

/// The uploaded multi-sheet dataset.
#[derive(Debug, Clone, Default)]
pub struct KbmDataset {
    pub sheets: Vec<RawSheet>,
}

/// The four consumed sheets in workbook order.
#[derive(Debug, Clone, Copy)]
pub struct DatasetSheets<'a> {
    pub two_periods_back: &'a RawSheet,
    pub one_period_back: &'a RawSheet,
    pub current_period: &'a RawSheet,
    pub new_format: &'a RawSheet,
}

impl KbmDataset {
    pub const CONSUMED_SHEETS: usize = 4;

    pub fn new(sheets: Vec<RawSheet>) -> Self {
        Self { sheets }
    }

    /// A fifth (or later) sheet is accepted and ignored.
    pub fn consumed_sheets(&self) -> Result<DatasetSheets<'_>> {
        match self.sheets.as_slice() {
            [two_back, one_back, current, new_format, ..] => Ok(DatasetSheets {
                two_periods_back: two_back,
                one_period_back: one_back,
                current_period: current,
                new_format,
            }),
            _ => Err(KbmAccrualError::MissingSheet {
                expected: Self::CONSUMED_SHEETS,
                found: self.sheets.len(),
            }),
        }
    }
}

pub fn normalize_old_format(sheet: &RawSheet) -> Result<Vec<KbmRecord>> {
    let table = Table::from_raw(sheet, MIN_NON_EMPTY_CELLS)?;
    table.require_columns(&OLD_REQUIRED)?;

    let records: Vec<KbmRecord> = table
        .rows
        .into_iter()
        .map(|row| KbmRecord {
            format: RecordFormat::Old,
            branch: row.get(BRANCH).trimmed(),
            vessel_voyage: vessel_voyage_key(row.get(OLD_VESSEL), row.get(OLD_VOYAGE)),
            document: row.get(OLD_DOCUMENT).trimmed(),
            document_type: row.get(OLD_DOCUMENT_TYPE).trimmed(),
            activity: row.get(OLD_ACTIVITY).trimmed(),
            size: row.get(OLD_SIZE).trimmed(),
            status: row.get(OLD_STATUS).trimmed(),
            account_key: row.get(OLD_ACCOUNT_KEY).trimmed(),
            measure: row.get(OLD_SUBTOTAL).to_decimal(),
            tag: ClassificationTag::Unset,
            costs: None,
            cross_reference: None,
            source: row,
        })
        .collect();

    debug!(
        "Normalized {} old-format record(s) from sheet '{}'",
        records.len(),
        sheet.name
    );

    Ok(records)
}

pub fn normalize_new_format(sheet: &RawSheet) -> Result<Vec<KbmRecord>> {
    let table = Table::from_raw(sheet, MIN_NON_EMPTY_CELLS)?;
    table.require_columns(&NEW_REQUIRED)?;

    let records: Vec<KbmRecord> = table
        .rows
        .into_iter()
        .map(|row: Row| KbmRecord {
            format: RecordFormat::New,
            branch: row.get(BRANCH).trimmed(),
            vessel_voyage: vessel_voyage_key(row.get(NEW_VESSEL), row.get(NEW_VOYAGE)),
            document: row.get(NEW_DOCUMENT).trimmed(),
            document_type: None,
            activity: row.get(NEW_ACTIVITY).trimmed(),
            size: row.get(NEW_SIZE).trimmed(),
            status: row.get(NEW_STATUS).trimmed(),
            account_key: None,
            measure: row.get(NEW_QUANTITY).to_decimal(),
            tag: ClassificationTag::Unset,
            costs: None,
            cross_reference: None,
            source: row,
        })
        .collect();

    debug!(
        "Normalized {} new-format record(s) from sheet '{}'",
        records.len(),
        sheet.name
    );

    Ok(records)
}

/// `<vessel> <voyage>`; missing when either part is missing.
pub fn vessel_voyage_key(vessel: &Cell, voyage: &Cell) -> Option<String> {
    let vessel = vessel.as_text()?;
    let voyage = voyage.as_text()?;
    Some(format!("{} {}", vessel, voyage))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn old_header() -> Vec<Cell> {
        [
            "Id KBM",
            "Port Id",
            "Vessel Id To",
            "Voyage No To",
            "Nama Kegiatan",
            "Ukuran",
            "Status",
            "Sub Total",
            "Jenis Dokumen",
            "No Dokumen",
            "Kode ACC",
        ]
        .iter()
        .map(|s| Cell::from(*s))
        .collect()
    }

    #[test]
    fn test_old_format_record_shape() {
        let sheet = RawSheet::new(
            "current",
            vec![
                vec![Cell::from("DATA KBM")],
                old_header(),
                vec![
                    Cell::from("K1"),
                    Cell::from("BMS"),
                    Cell::from("KM SEJAHTERA"),
                    Cell::from("012"),
                    Cell::from("BONGKAR"),
                    Cell::from("20"),
                    Cell::from("EMPTY"),
                    Cell::from("abc"),
                    Cell::from("-"),
                    Cell::Empty,
                    Cell::from("BONGKAR"),
                ],
            ],
        );

        let records = normalize_old_format(&sheet).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.format, RecordFormat::Old);
        assert_eq!(record.vessel_voyage.as_deref(), Some("KM SEJAHTERA 012"));
        assert_eq!(record.measure, None);
        assert_eq!(record.tag, ClassificationTag::Unset);
        assert!(record.document_missing());
        assert!(record.document_type_missing());
        assert_eq!(record.source.get("Id KBM"), &Cell::from("K1"));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let mut header = old_header();
        header.pop();
        let sheet = RawSheet::new("current", vec![header]);

        let result = normalize_old_format(&sheet);
        match result {
            Err(KbmAccrualError::MissingColumn { column, .. }) => assert_eq!(column, "Kode ACC"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_vessel_voyage_key() {
        assert_eq!(
            vessel_voyage_key(&Cell::from("MV A"), &Cell::Number(7.0)).as_deref(),
            Some("MV A 7")
        );
        assert_eq!(vessel_voyage_key(&Cell::Empty, &Cell::from("7")), None);
    }

    #[test]
    fn test_dataset_needs_four_sheets() {
        let dataset = KbmDataset::new(vec![RawSheet::default(); 3]);
        assert!(matches!(
            dataset.consumed_sheets(),
            Err(KbmAccrualError::MissingSheet { found: 3, .. })
        ));

        let dataset = KbmDataset::new(vec![RawSheet::default(); 5]);
        assert!(dataset.consumed_sheets().is_ok());
    }
}
