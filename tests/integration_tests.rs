use kbm_accrual::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

const OLD_HEADER: [&str; 11] = [
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
];

const NEW_HEADER: [&str; 7] = [
    "Port Id",
    "Vessel Id",
    "Voyage No",
    "Id Document",
    "Type Size Name",
    "Qty Angkatan",
    "Activity System Name",
];

fn text(value: &str) -> Cell {
    if value.is_empty() {
        Cell::Empty
    } else {
        Cell::from(value)
    }
}

fn sheet(name: &str, header: &[&str], rows: Vec<Vec<Cell>>) -> RawSheet {
    let mut all = vec![
        vec![text("LAPORAN KBM"), Cell::Empty, text(name)],
        header.iter().map(|h| text(h)).collect(),
    ];
    all.extend(rows);
    RawSheet::new(name, all)
}

fn old_row(
    id: &str,
    branch: &str,
    voyage: &str,
    status: &str,
    subtotal: f64,
    document_type: &str,
    document: &str,
) -> Vec<Cell> {
    vec![
        text(id),
        text(branch),
        text("KM MERATUS"),
        text(voyage),
        text("BONGKAR"),
        text("20"),
        text(status),
        Cell::Number(subtotal),
        text(document_type),
        text(document),
        text("BONGKAR"),
    ]
}

fn new_row(branch: &str, vessel: &str, voyage: &str, document: &str, size: &str, qty: f64) -> Vec<Cell> {
    vec![
        text(branch),
        text(vessel),
        text(voyage),
        text(document),
        text(size),
        Cell::Number(qty),
        text("STUFFING"),
    ]
}

fn dataset() -> KbmDataset {
    KbmDataset::new(vec![
        sheet(
            "KBM JULI",
            &OLD_HEADER,
            vec![
                old_row("P1", "BMS", "101", "FULL", 10.0, "JMH", "JMH/BMS/2510/0007"),
                old_row("P2", "BMS", "102", "EMPTY", 999.0, "-", "-"),
            ],
        ),
        sheet(
            "KBM AGUSTUS",
            &OLD_HEADER,
            vec![old_row("P3", "BMS", "101", "FULL", 10.0, "JMH", "JMH/BMS/2510/0007")],
        ),
        sheet(
            "KBM SEPTEMBER",
            &OLD_HEADER,
            vec![
                old_row("K1", "BMS", "201", "EMPTY", 150_000.0, "-", "-"),
                old_row("K2", "BMS", "202", "-", 50_000.0, "", ""),
                old_row("K3", "BMS", "203", "FULL", 70_000.0, "-", "-"),
                old_row("K4", "KDI", "301", "FULL", 80_000.0, "-", "-"),
                old_row("K5", "KDI", "302", "EMPTY", 0.0, "-", "-"),
                old_row("K6", "SBY", "401", "EMPTY", 25_000.0, "-", "JMH/SBY/2510/0001"),
                old_row("K7", "MKS", "501", "EMPTY", 90_000.0, "JMH", "JMH/MKS/2509/0009"),
                old_row("K8", "BPN", "601", "EMPTY", 10_000.0, "-", "-"),
            ],
        ),
        sheet(
            "KBM BARU",
            &NEW_HEADER,
            vec![
                new_row("BMS", "MV TANTO", "701", "", "20 MT", 2.0),
                new_row("BMS", "MV TANTO", "702", "", "40 FL", 1.0),
                new_row("KDI", "MV TANTO", "801", "-", "40 FL", 1.0),
                new_row(
                    "KDI",
                    "MV TANTO",
                    "802",
                    "JMH/KDI/2510/0004, JMH/BMS/2509/0099",
                    "20 MT",
                    3.0,
                ),
                new_row("SBY", "KM MERATUS", "401", "JMH/SBY/2510/0001", "20 MT", 1.0),
                new_row("MKS", "MV TANTO", "901", "JMH/MKS/2509/0009", "20 MT", 1.0),
            ],
        ),
        sheet("CATATAN", &["a", "b", "c", "d", "e"], vec![]),
    ])
}

fn references() -> ReferenceTables {
    let mut accounts = AccountLookup::default();
    accounts.insert("BONGKAR", "7XX.03.01.01");

    let mut prices = PriceList::default();
    prices.insert(
        "BMS 20 MT",
        PriceEntry {
            handling: Some(Decimal::new(100_000, 0)),
            haulage: Some(Decimal::new(50_000, 0)),
            lift_on_lift_off: Some(Decimal::new(25_000, 0)),
        },
    );
    prices.insert(
        "KDI 40 FL",
        PriceEntry {
            handling: Some(Decimal::new(200_000, 0)),
            haulage: None,
            lift_on_lift_off: Some(Decimal::new(30_000, 0)),
        },
    );

    ReferenceTables::new(accounts, prices)
}

fn params(month: &str, year: &str) -> RunParameters {
    RunParameters {
        month: month.to_string(),
        year: year.to_string(),
        branches: ["BMS", "KDI", "SBY", "MKS"]
            .iter()
            .map(|b| b.to_string())
            .collect(),
    }
}

fn run() -> AccrualReport {
    process_with_verification(
        &dataset(),
        &references(),
        &params("september", "2025"),
        &AccrualConfig::default(),
    )
    .unwrap()
}

fn totals_by_branch(journal: &[JournalLine]) -> BTreeMap<String, (Decimal, Decimal)> {
    let mut totals: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for line in journal {
        let entry = totals.entry(line.branch.clone()).or_default();
        match line.kind {
            LineKind::Detail => entry.0 += line.debit_or_zero(),
            LineKind::AccrualCredit => entry.1 += line.credit,
        }
    }
    totals
}

#[test]
fn test_journal_balances_per_branch() {
    let report = run();
    let totals = totals_by_branch(&report.journal);

    for (branch, (debits, credit)) in &totals {
        assert_eq!(debits, credit, "branch {} does not balance", branch);
    }

    assert_eq!(totals["BMS"].1, Decimal::new(200_000 + 350_000, 0));
    assert_eq!(totals["KDI"].1, Decimal::new(80_000 + 230_000, 0));
}

#[test]
fn test_journal_shape_and_order() {
    let report = run();
    assert_eq!(report.journal.len(), 13);

    let old_part: Vec<(&str, LineKind)> = report.journal[..5]
        .iter()
        .map(|l| (l.branch.as_str(), l.kind))
        .collect();
    assert_eq!(
        old_part,
        vec![
            ("BMS", LineKind::Detail),
            ("BMS", LineKind::Detail),
            ("BMS", LineKind::AccrualCredit),
            ("KDI", LineKind::Detail),
            ("KDI", LineKind::AccrualCredit),
        ]
    );

    let headers: Vec<(usize, &str)> = report
        .journal
        .iter()
        .enumerate()
        .filter_map(|(idx, l)| l.header.as_ref().map(|h| (idx, h.journal_name.as_str())))
        .collect();
    assert_eq!(
        headers,
        vec![
            (0, "ACCRUE SEPTEMBER 2025"),
            (3, "ACCRUE SEPTEMBER 2025"),
            (5, "ACCRUE XYZ SEPTEMBER 2025"),
            (9, "ACCRUE XYZ SEPTEMBER 2025"),
        ]
    );

    let kdi_haulage = &report.journal[10];
    assert_eq!(kdi_haulage.debit_account.as_deref(), Some("7XX.18.01"));
    assert_eq!(kdi_haulage.debit, None);
}

#[test]
fn test_zero_activity_branches_have_no_journal_lines() {
    let report = run();
    let branches: Vec<&str> = report.journal.iter().map(|l| l.branch.as_str()).collect();

    assert!(!branches.contains(&"SBY"));
    assert!(!branches.contains(&"MKS"));
    assert!(report.journal.iter().all(|l| !l.is_zero_value()));
}

#[test]
fn test_next_period_document_wins_over_no_document() {
    let config = AccrualConfig::default();
    let refs = references();
    let run = params("september", "2025")
        .validate(&config.branch_directory())
        .unwrap();

    let records = AccrualEngine::new(&config, &refs)
        .classify(&dataset(), &run)
        .unwrap();

    let sby = records
        .old_format
        .iter()
        .find(|r| r.source.get("Id KBM") == &Cell::from("K6"))
        .unwrap();
    assert!(sby.document_type_missing());
    assert_eq!(sby.tag, ClassificationTag::NextPeriod);

    let tags: Vec<Option<&str>> = records.old_format.iter().map(|r| r.tag.label()).collect();
    assert_eq!(
        tags,
        vec![
            Some("NO_DOC_PORT"),
            Some("NO_DOC_PORT"),
            None,
            Some("NO_DOC_YARD"),
            Some("NO_DOC_YARD"),
            Some("NEXT_PERIOD"),
            None,
            None,
            Some("NEXT_PERIOD"),
            Some("NEXT_PERIOD"),
        ]
    );
}

#[test]
fn test_yard_accepts_full_status() {
    let report = run();
    let kdi = report
        .branch_reports
        .iter()
        .find(|r| r.branch == "KDI")
        .unwrap();

    let ids: Vec<&Cell> = kdi.old_format.rows.iter().map(|r| &r[0]).collect();
    assert_eq!(ids[1], &Cell::from("K4"));

    let bms = report
        .branch_reports
        .iter()
        .find(|r| r.branch == "BMS")
        .unwrap();
    assert!(bms.old_format.rows.iter().all(|r| r[0] != Cell::from("K3")));
}

#[test]
fn test_handling_account_follows_size_label() {
    let report = run();
    let new_details: Vec<&JournalLine> = report.journal[5..]
        .iter()
        .filter(|l| l.kind == LineKind::Detail)
        .collect();

    assert_eq!(new_details[0].description, "MV TANTO 701 20 MT");
    assert_eq!(new_details[0].debit_account.as_deref(), Some("7XX.03.01.02.04"));
    assert_eq!(new_details[0].debit, Some(Decimal::new(200_000, 0)));

    assert_eq!(new_details[3].description, "MV TANTO 801 40 FL");
    assert_eq!(new_details[3].debit_account.as_deref(), Some("7XX.03.01.02.03"));
}

#[test]
fn test_carry_forward_is_unique_and_sorted() {
    let report = run();
    let list: Vec<(&str, &str, &str)> = report
        .carry_forward
        .iter()
        .map(|e| {
            (
                e.branch.as_str(),
                e.document_number.as_str(),
                e.source.source_label(),
            )
        })
        .collect();

    assert_eq!(
        list,
        vec![
            ("BMS", "JMH/BMS/2510/0007", "old"),
            ("KDI", "JMH/KDI/2510/0004", "new"),
            ("SBY", "JMH/SBY/2510/0001", "old"),
        ]
    );
}

#[test]
fn test_next_period_code_rolls_over_the_year() {
    let period = ReportingPeriod::new("desember", "2025").unwrap();
    assert_eq!(period.next_period_code(), "2601");
    assert_eq!(period.next_period_pattern(), "/2601/");
    assert_eq!(period.closing_date_label(), "31/12/2025");
}

#[test]
fn test_branch_sheet_layout() {
    let report = run();
    let bms = &report.branch_reports[0];

    assert_eq!(bms.branch, "BMS");
    assert_eq!(bms.old_format.rows.len(), 7);
    assert_eq!(bms.divider_row(), 9);
    assert_eq!(bms.new_format_start_row(), 11);
    assert_eq!(bms.new_format.rows.len(), 4);

    let mks = &report.branch_reports[3];
    let status_column = report::NEW_FORMAT_COLUMNS
        .iter()
        .position(|c| *c == "Status_dokumen")
        .unwrap();
    assert!(mks.new_format.rows.iter().all(|r| r[status_column].is_empty()));
}

#[test]
fn test_runs_are_deterministic() {
    let first = run();
    let second = run();

    assert_eq!(first.journal, second.journal);
    assert_eq!(first.carry_forward, second.carry_forward);
    assert_eq!(first.branch_reports, second.branch_reports);
}

#[test]
fn test_missing_sheet_aborts_the_run() {
    let mut short = dataset();
    short.sheets.truncate(3);

    let result = process_kbm_accrual(
        &short,
        &references(),
        &params("september", "2025"),
        &AccrualConfig::default(),
    );
    assert!(matches!(
        result,
        Err(KbmAccrualError::MissingSheet { found: 3, .. })
    ));
}

#[test]
fn test_missing_prices_degrade_to_blank_costs() {
    let report = process_with_verification(
        &dataset(),
        &ReferenceTables::default(),
        &params("september", "2025"),
        &AccrualConfig::default(),
    )
    .unwrap();

    let new_part: Vec<&JournalLine> = report
        .journal
        .iter()
        .filter(|l| l.description.starts_with("MV TANTO"))
        .collect();
    assert_eq!(new_part.len(), 6);
    assert!(new_part.iter().all(|l| l.debit.is_none()));
    assert!(report
        .journal
        .iter()
        .filter(|l| l.kind == LineKind::Detail && l.description.starts_with("KM MERATUS"))
        .all(|l| l.debit_account.is_none()));
}

#[test]
fn test_workbook_round_trip() -> anyhow::Result<()> {
    let report = run();
    let path = std::env::temp_dir().join(format!(
        "kbm_accrual_round_trip_{}.xlsx",
        std::process::id()
    ));

    write_report(&report, &path)?;
    let written = read_workbook(&path)?;
    std::fs::remove_file(&path)?;

    let names: Vec<&str> = written.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["BMS", "KDI", "SBY", "MKS", "List JMH", "JURNAL NO JMH"]
    );

    let bms = &written.sheets[0];
    assert_eq!(bms.rows[0][0], Cell::from("Id KBM"));
    assert_eq!(bms.rows[1][0], Cell::from("FORMAT LAMA - NO DOCUMENT"));
    assert_eq!(bms.rows[11][1], Cell::from("Vessel Id"));
    assert_eq!(bms.rows[12][1], Cell::from("FORMAT BARU - NO DOCUMENT"));

    let list = &written.sheets[4];
    assert_eq!(list.rows[0][3], Cell::from("sumber"));
    assert_eq!(list.rows.len(), 4);

    let journal = &written.sheets[5];
    assert_eq!(journal.rows.len(), report.journal.len());
    assert_eq!(journal.rows[0][0], Cell::from("30/09/2025"));
    assert_eq!(journal.rows[0][1], Cell::from("BANJARMASIN"));
    assert_eq!(journal.rows[0][8], Cell::Number(150_000.0));

    Ok(())
}

#[test]
fn test_reference_tables_from_csv() -> anyhow::Result<()> {
    let dir = std::env::temp_dir();
    let coa = dir.join(format!("kbm_accrual_coa_{}.csv", std::process::id()));
    let tariff = dir.join(format!("kbm_accrual_tarif_{}.csv", std::process::id()));

    let mut writer = csv::Writer::from_path(&coa)?;
    writer.write_record(["Nama Kegiatan", "COA"])?;
    writer.write_record(["BONGKAR", "7XX.03.01.01"])?;
    writer.flush()?;

    let mut writer = csv::Writer::from_path(&tariff)?;
    writer.write_record(["CABANG", "STVDR", "HAULAGE", "LOLO BM"])?;
    writer.write_record(["BMS 20 MT", "100000", "50000", "25000"])?;
    writer.write_record(["KDI 40 FL", "200000", "", "30000"])?;
    writer.flush()?;

    let loaded = ReferenceTables::load(&coa, &tariff)?;
    std::fs::remove_file(&coa)?;
    std::fs::remove_file(&tariff)?;

    assert_eq!(loaded.accounts.code_for("BONGKAR"), Some("7XX.03.01.01"));
    assert_eq!(loaded.prices.len(), 2);

    let from_csv = process_with_verification(
        &dataset(),
        &loaded,
        &params("september", "2025"),
        &AccrualConfig::default(),
    )?;
    assert_eq!(from_csv.journal, run().journal);

    Ok(())
}
