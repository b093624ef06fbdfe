use crate::ingestion::columns;
use crate::schema::{ClassificationTag, KbmRecord, RecordFormat};
use crate::sheet::Cell;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub const OLD_FORMAT_COLUMNS: [&str; 27] = [
    "Id KBM",
    "Tgl KBM",
    "Port Id",
    "TD Month",
    "Vessel Id To",
    "Voyage No To",
    "Nama Kegiatan",
    "Jenis",
    "Ukuran",
    "Status",
    "Jumlah Container",
    "Biaya",
    "Sub Total",
    "Jenis Dokumen",
    "No Dokumen",
    "Tgl Create Documen",
    "Tgl Kasir Documen",
    "Created By",
    "Port Id From",
    "Port Id To",
    "Kode ACC",
    "Supplier",
    "Id BS Penyelesaian",
    "Tgl Kasir Id BS Penyelesaian",
    "Id BKM",
    "vesvoy",
    "Status_KBM",
];

pub const NEW_FORMAT_COLUMNS: [&str; 28] = [
    "No.",
    "Vessel Id",
    "Voyage No",
    "TD",
    "Port Id",
    "Load Port",
    "Disc Port",
    "Id Session",
    "Vessel Id From",
    "Voyage No From",
    "Vessel Id To",
    "Voyage No To",
    "Port Id From",
    "Port Id To",
    "Type Size Name",
    "Qty Angkatan",
    "Nama Vendor",
    "ETS Status",
    "Activity System Name",
    "Id KBM",
    "Tanggal",
    "Id Document",
    "vesvoy",
    "Status_KBM",
    "STVDR",
    "HAULAGE",
    "LOLO BM",
    "Status_dokumen",
];

/// Block titles as they appear in the first populated column of each block.
pub struct BlockLabels {
    pub no_document: &'static str,
    pub next_period: &'static str,
    pub label_column: usize,
}

pub const OLD_FORMAT_LABELS: BlockLabels = BlockLabels {
    no_document: "FORMAT LAMA - NO DOCUMENT",
    next_period: "FORMAT LAMA - JMH NEXT MONTH",
    label_column: 0,
};

pub const NEW_FORMAT_LABELS: BlockLabels = BlockLabels {
    no_document: "FORMAT BARU - NO DOCUMENT",
    next_period: "FORMAT BARU - JMH NEXT MONTH",
    label_column: 1,
};

/// A fixed-column table: label row, no-document rows, blank row, label row, next-period rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailBlock {
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

impl DetailBlock {
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchReport {
    pub branch: String,
    pub old_format: DetailBlock,
    pub new_format: DetailBlock,
}

impl BranchReport {
    /// 0-based sheet row of the divider; the old block's column-name row sits at row 0.
    pub fn divider_row(&self) -> usize {
        self.old_format.rows.len() + 2
    }

    /// 0-based sheet row of the new block's column-name row.
    pub fn new_format_start_row(&self) -> usize {
        self.old_format.rows.len() + 4
    }

    pub fn width(&self) -> usize {
        self.old_format.width().max(self.new_format.width())
    }
}

pub fn assemble_branch_reports(
    branches: &[String],
    old_records: &[KbmRecord],
    new_records: &[KbmRecord],
) -> Vec<BranchReport> {
    branches
        .iter()
        .map(|branch| BranchReport {
            branch: branch.clone(),
            old_format: assemble_block(branch, old_records, RecordFormat::Old),
            new_format: assemble_block(branch, new_records, RecordFormat::New),
        })
        .collect()
}

pub fn assemble_block(branch: &str, records: &[KbmRecord], format: RecordFormat) -> DetailBlock {
    let (columns, labels): (&'static [&'static str], &BlockLabels) = match format {
        RecordFormat::Old => (&OLD_FORMAT_COLUMNS, &OLD_FORMAT_LABELS),
        RecordFormat::New => (&NEW_FORMAT_COLUMNS, &NEW_FORMAT_LABELS),
    };

    let in_branch = move || records.iter().filter(move |r| r.branch_is(branch));

    let no_document = in_branch().filter(|r| r.tag.is_no_doc()).map(|r| match format {
        RecordFormat::Old => r.clone(),
        RecordFormat::New => KbmRecord {
            cross_reference: None,
            ..r.clone()
        },
    });

    let next_period: Vec<KbmRecord> = in_branch()
        .filter(|r| r.tag == ClassificationTag::NextPeriod)
        .map(|r| match format {
            RecordFormat::Old => r.clone(),
            RecordFormat::New => KbmRecord {
                costs: None,
                ..r.clone()
            },
        })
        .collect();

    let mut rows = vec![label_row(columns.len(), labels.label_column, labels.no_document)];
    rows.extend(no_document.map(|r| project(&r, columns)));
    rows.push(vec![Cell::Empty; columns.len()]);
    rows.push(label_row(columns.len(), labels.label_column, labels.next_period));
    rows.extend(next_period.iter().map(|r| project(r, columns)));

    DetailBlock { columns, rows }
}

fn label_row(width: usize, column: usize, label: &str) -> Vec<Cell> {
    let mut row = vec![Cell::Empty; width];
    row[column] = Cell::text(label);
    row
}

/// Explicit projection: derived columns come from the record, the rest from its source row.
pub fn project(record: &KbmRecord, columns: &[&str]) -> Vec<Cell> {
    columns
        .iter()
        .map(|column| derived_cell(record, column).unwrap_or_else(|| record.source.get(column).clone()))
        .collect()
}

fn derived_cell(record: &KbmRecord, column: &str) -> Option<Cell> {
    let costs = record.costs.clone().unwrap_or_default();

    let cell = match column {
        columns::VESSEL_VOYAGE => text_cell(record.vessel_voyage.as_deref()),
        columns::TAG => text_cell(record.tag.label()),
        columns::OLD_SUBTOTAL if record.format == RecordFormat::Old => amount_cell(record.measure),
        columns::NEW_QUANTITY if record.format == RecordFormat::New => amount_cell(record.measure),
        columns::HANDLING => amount_cell(costs.handling),
        columns::HAULAGE => amount_cell(costs.haulage),
        columns::LIFT_ON_LIFT_OFF => amount_cell(costs.lift_on_lift_off),
        columns::CROSS_REFERENCE => text_cell(record.cross_reference.map(|c| c.label())),
        _ => return None,
    };

    Some(cell)
}

fn text_cell(value: Option<&str>) -> Cell {
    value.map(Cell::text).unwrap_or_default()
}

pub fn amount_cell(value: Option<Decimal>) -> Cell {
    value
        .and_then(|v| v.to_f64())
        .map(Cell::Number)
        .unwrap_or_default()
}
