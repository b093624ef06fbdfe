use crate::engine::AccrualReport;
use crate::error::Result;
use crate::ingestion::KbmDataset;
use crate::report::{amount_cell, BranchReport, DetailBlock};
use crate::schema::{CarryForwardEntry, JournalLine};
use crate::sheet::{Cell, RawSheet};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use log::{debug, info};
use rust_decimal::Decimal;
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, Worksheet};
use std::path::Path;

pub const CARRY_FORWARD_SHEET: &str = "List JMH";
pub const JOURNAL_SHEET: &str = "JURNAL NO JMH";
pub const CARRY_FORWARD_HEADER: [&str; 4] = ["Port Id", "No Dokumen", "vesvoy", "sumber"];

const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Reads every sheet of an `.xlsx`/`.xls`/`.ods` workbook, in workbook order.
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<KbmDataset> {
    let mut workbook = open_workbook_auto(path.as_ref())?;

    let sheets: Vec<RawSheet> = workbook
        .worksheets()
        .into_iter()
        .map(|(name, range)| {
            let rows = range
                .rows()
                .map(|row| row.iter().map(to_cell).collect())
                .collect();
            RawSheet::new(name, rows)
        })
        .collect();

    debug!(
        "Read {} sheet(s) from {}",
        sheets.len(),
        path.as_ref().display()
    );

    Ok(KbmDataset::new(sheets))
}

fn to_cell(value: &Data) -> Cell {
    match value {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Text(b.to_string().to_uppercase()),
        Data::DateTime(dt) => value
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or(Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Renders the complete output workbook into memory.
pub fn render_report(report: &AccrualReport) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let divider = Format::new()
        .set_background_color(Color::Black)
        .set_pattern(FormatPattern::Solid);
    let datetime = Format::new().set_num_format(DATETIME_FORMAT);

    for branch in &report.branch_reports {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&branch.branch)?;
        write_branch_sheet(worksheet, branch, &divider, &datetime)?;
    }

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(CARRY_FORWARD_SHEET)?;
    for (col, title) in CARRY_FORWARD_HEADER.iter().enumerate() {
        worksheet.write_string(0, col as u16, *title)?;
    }
    for (idx, entry) in report.carry_forward.iter().enumerate() {
        write_row(worksheet, idx as u32 + 1, &carry_forward_row(entry), &datetime)?;
    }

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(JOURNAL_SHEET)?;
    for (idx, line) in report.journal.iter().enumerate() {
        write_row(worksheet, idx as u32, &journal_row(line), &datetime)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Renders first and touches the filesystem only once rendering succeeded.
pub fn write_report<P: AsRef<Path>>(report: &AccrualReport, path: P) -> Result<()> {
    let buffer = render_report(report)?;
    std::fs::write(path.as_ref(), &buffer)?;
    info!(
        "Wrote {} ({} bytes)",
        path.as_ref().display(),
        buffer.len()
    );
    Ok(())
}

fn write_branch_sheet(
    worksheet: &mut Worksheet,
    report: &BranchReport,
    divider: &Format,
    datetime: &Format,
) -> Result<()> {
    write_block(worksheet, 0, &report.old_format, datetime)?;

    let divider_row = report.divider_row() as u32;
    for col in 0..report.width() {
        worksheet.write_blank(divider_row, col as u16, divider)?;
    }

    write_block(
        worksheet,
        report.new_format_start_row() as u32,
        &report.new_format,
        datetime,
    )
}

fn write_block(
    worksheet: &mut Worksheet,
    first_row: u32,
    block: &DetailBlock,
    datetime: &Format,
) -> Result<()> {
    for (col, title) in block.columns.iter().enumerate() {
        worksheet.write_string(first_row, col as u16, *title)?;
    }
    for (idx, cells) in block.rows.iter().enumerate() {
        write_row(worksheet, first_row + 1 + idx as u32, cells, datetime)?;
    }
    Ok(())
}

fn write_row(worksheet: &mut Worksheet, row: u32, cells: &[Cell], datetime: &Format) -> Result<()> {
    for (col, cell) in cells.iter().enumerate() {
        let col = col as u16;
        match cell {
            Cell::Empty => {}
            Cell::Text(s) => {
                worksheet.write_string(row, col, s)?;
            }
            Cell::Number(n) => {
                worksheet.write_number(row, col, *n)?;
            }
            Cell::DateTime(dt) => {
                worksheet.write_datetime_with_format(row, col, dt, datetime)?;
            }
        }
    }
    Ok(())
}

pub fn carry_forward_row(entry: &CarryForwardEntry) -> Vec<Cell> {
    vec![
        Cell::text(entry.branch.as_str()),
        Cell::text(entry.document_number.as_str()),
        entry
            .vessel_voyage
            .as_deref()
            .map(Cell::text)
            .unwrap_or_default(),
        Cell::text(entry.source.source_label()),
    ]
}

/// Journal columns: date, branch, journal name, marker, sequence flag, description,
/// line kind, vessel-voyage, debit, credit, debit account, credit account.
pub fn journal_row(line: &JournalLine) -> Vec<Cell> {
    let header = line.header.as_ref();
    let optional_text = |value: Option<&str>| value.map(Cell::text).unwrap_or_default();

    vec![
        optional_text(header.map(|h| h.date.as_str())),
        optional_text(line.branch_name.as_deref()),
        optional_text(header.map(|h| h.journal_name.as_str())),
        optional_text(header.map(|h| h.marker.as_str())),
        header
            .map(|h| Cell::Number(f64::from(h.sequence_flag)))
            .unwrap_or_default(),
        Cell::text(line.description.as_str()),
        Cell::Number(f64::from(line.kind.code())),
        Cell::text(line.vessel_voyage.as_str()),
        amount_cell(line.debit),
        amount_cell(Some(line.credit)),
        optional_text(line.debit_account.as_deref()),
        Cell::text(line.credit_account.as_str()),
    ]
}

/// Journal totals as printed in the run summary; saturates at `Decimal::MAX`.
pub fn journal_totals(lines: &[JournalLine]) -> (Decimal, Decimal) {
    lines.iter().fold((Decimal::ZERO, Decimal::ZERO), |(debit, credit), line| {
        (
            debit.saturating_add(line.debit_or_zero()),
            credit.saturating_add(line.credit),
        )
    })
}
