use crate::branches::BranchDirectory;
use crate::config::AccrualConfig;
use crate::error::{KbmAccrualError, Result};
use crate::period::ReportingPeriod;
use crate::reference::AccountLookup;
use crate::schema::{JournalHeader, JournalLine, KbmRecord, LineKind};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

const NOT_APPLICABLE: &str = "-";
const HEADER_SEQUENCE_FLAG: u8 = 1;

/// Turns undocumented activity into a per-branch balanced accrual journal.
pub struct JournalBuilder<'a> {
    config: &'a AccrualConfig,
    directory: &'a BranchDirectory,
    accounts: &'a AccountLookup,
    period: &'a ReportingPeriod,
}

impl<'a> JournalBuilder<'a> {
    pub fn new(
        config: &'a AccrualConfig,
        directory: &'a BranchDirectory,
        accounts: &'a AccountLookup,
        period: &'a ReportingPeriod,
    ) -> Self {
        Self {
            config,
            directory,
            accounts,
            period,
        }
    }

    pub fn old_format_label(&self) -> String {
        format!("ACCRUE {}", self.period.label())
    }

    pub fn new_format_label(&self) -> String {
        format!("ACCRUE XYZ {}", self.period.label())
    }

    /// Old-format journal followed by the new-format journal.
    pub fn build(&self, old_records: &[KbmRecord], new_records: &[KbmRecord]) -> Result<Vec<JournalLine>> {
        let mut journal = self.finalize(self.old_format_details(old_records), &self.old_format_label())?;
        journal.extend(self.finalize(self.new_format_details(new_records), &self.new_format_label())?);
        Ok(journal)
    }

    /// One debit line per undocumented old-format record, charged to its activity's account.
    pub fn old_format_details(&self, records: &[KbmRecord]) -> Vec<JournalLine> {
        let mut unmapped: BTreeSet<&str> = BTreeSet::new();

        let lines: Vec<JournalLine> = no_doc_records(records)
            .map(|(branch, record)| {
                let debit_account = record
                    .account_key
                    .as_deref()
                    .and_then(|key| self.accounts.code_for(key));

                if debit_account.is_none() {
                    unmapped.insert(record.account_key.as_deref().unwrap_or(""));
                }

                let description = [
                    record.vessel_voyage.as_deref(),
                    record.activity.as_deref(),
                    record.size.as_deref(),
                    record.status.as_deref(),
                ]
                .map(|part| part.unwrap_or(""))
                .join(" ");

                detail_line(
                    branch,
                    description,
                    record,
                    record.measure,
                    debit_account.map(str::to_string),
                )
            })
            .collect();

        if !unmapped.is_empty() {
            warn!(
                "No account code for {} activity key(s); their debit account is left blank: {:?}",
                unmapped.len(),
                unmapped
            );
        }

        lines
    }

    /// Three passes over the undocumented new-format records: all handling lines,
    /// then all haulage lines, then all lift-on/lift-off lines.
    pub fn new_format_details(&self, records: &[KbmRecord]) -> Vec<JournalLine> {
        let accounts = &self.config.accounts;
        let description = |record: &KbmRecord| {
            format!(
                "{} {}",
                record.vessel_voyage.as_deref().unwrap_or(""),
                record.size.as_deref().unwrap_or("")
            )
        };

        let handling = no_doc_records(records).map(|(branch, record)| {
            let account = if is_empty_container(record) {
                &accounts.handling_empty
            } else {
                &accounts.handling_other
            };
            let debit = record.costs.as_ref().and_then(|c| c.handling);
            detail_line(branch, description(record), record, debit, Some(account.clone()))
        });

        let haulage = no_doc_records(records).map(|(branch, record)| {
            let debit = record.costs.as_ref().and_then(|c| c.haulage);
            detail_line(branch, description(record), record, debit, Some(accounts.haulage.clone()))
        });

        let lift = no_doc_records(records).map(|(branch, record)| {
            let debit = record.costs.as_ref().and_then(|c| c.lift_on_lift_off);
            detail_line(
                branch,
                description(record),
                record,
                debit,
                Some(accounts.lift_on_lift_off.clone()),
            )
        });

        handling.chain(haulage).chain(lift).collect()
    }

    /// Adds the accrual credits, orders by branch, drops zero-value lines and stamps headers.
    pub fn finalize(&self, details: Vec<JournalLine>, label: &str) -> Result<Vec<JournalLine>> {
        let accruals = accrual_lines(&details, label, &self.config.accounts.accrual_credit)?;

        let mut lines = details;
        lines.extend(accruals);
        lines.sort_by(|a, b| (&a.branch, a.kind).cmp(&(&b.branch, b.kind)));

        let before = lines.len();
        lines.retain(|line| !line.is_zero_value());
        debug!(
            "{}: {} line(s), {} zero-value line(s) dropped",
            label,
            lines.len(),
            before - lines.len()
        );

        self.stamp_headers(&mut lines, label);
        Ok(lines)
    }

    fn stamp_headers(&self, lines: &mut [JournalLine], label: &str) {
        let mut previous: Option<String> = None;

        for line in lines.iter_mut() {
            if previous.as_deref() == Some(line.branch.as_str()) {
                continue;
            }
            previous = Some(line.branch.clone());

            line.branch_name = Some(
                self.directory
                    .display_name(&line.branch)
                    .unwrap_or(line.branch.as_str())
                    .to_string(),
            );
            line.header = Some(JournalHeader {
                date: self.period.closing_date_label(),
                journal_name: label.to_string(),
                marker: self.config.marker_for(&line.branch).to_string(),
                sequence_flag: HEADER_SEQUENCE_FLAG,
            });
        }
    }
}

fn no_doc_records(records: &[KbmRecord]) -> impl Iterator<Item = (&str, &KbmRecord)> {
    records
        .iter()
        .filter(|r| r.tag.is_no_doc())
        .filter_map(|r| r.branch.as_deref().map(|branch| (branch, r)))
}

fn is_empty_container(record: &KbmRecord) -> bool {
    record
        .size
        .as_deref()
        .is_some_and(|size| size.contains(crate::classifier::EMPTY_CONTAINER_MARKER))
}

fn detail_line(
    branch: &str,
    description: String,
    record: &KbmRecord,
    debit: Option<Decimal>,
    debit_account: Option<String>,
) -> JournalLine {
    JournalLine {
        branch: branch.to_string(),
        branch_name: None,
        header: None,
        description,
        kind: LineKind::Detail,
        vessel_voyage: record.vessel_voyage.clone().unwrap_or_default(),
        debit,
        credit: Decimal::ZERO,
        debit_account,
        credit_account: NOT_APPLICABLE.to_string(),
    }
}

/// One credit per branch equal to the sum of that branch's detail debits.
pub fn accrual_lines(
    details: &[JournalLine],
    label: &str,
    credit_account: &str,
) -> Result<Vec<JournalLine>> {
    let lines = debit_totals(details)?
        .into_iter()
        .map(|(branch, total)| JournalLine {
            branch: branch.to_string(),
            branch_name: None,
            header: None,
            description: label.to_string(),
            kind: LineKind::AccrualCredit,
            vessel_voyage: NOT_APPLICABLE.to_string(),
            debit: Some(Decimal::ZERO),
            credit: total,
            debit_account: Some(NOT_APPLICABLE.to_string()),
            credit_account: credit_account.to_string(),
        })
        .collect();
    Ok(lines)
}

fn debit_totals(lines: &[JournalLine]) -> Result<BTreeMap<&str, Decimal>> {
    branch_totals(
        lines
            .iter()
            .filter(|l| l.kind == LineKind::Detail)
            .map(|l| (l.branch.as_str(), l.debit_or_zero())),
    )
}

fn branch_totals<'l>(
    amounts: impl Iterator<Item = (&'l str, Decimal)>,
) -> Result<BTreeMap<&'l str, Decimal>> {
    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
    for (branch, amount) in amounts {
        let total = totals.entry(branch).or_default();
        *total = total
            .checked_add(amount)
            .ok_or_else(|| KbmAccrualError::AmountOverflow {
                branch: branch.to_string(),
            })?;
    }
    Ok(totals)
}

/// Checks that each branch's detail debits equal its accrual credits.
pub fn verify_journal_balance(lines: &[JournalLine]) -> Result<()> {
    let debits = debit_totals(lines)?;
    let credits = branch_totals(
        lines
            .iter()
            .filter(|l| l.kind == LineKind::AccrualCredit)
            .map(|l| (l.branch.as_str(), l.credit)),
    )?;

    let branches: BTreeSet<&str> = debits.keys().chain(credits.keys()).copied().collect();
    for branch in branches {
        let debit = debits.get(branch).copied().unwrap_or_default();
        let credit = credits.get(branch).copied().unwrap_or_default();
        if debit != credit {
            return Err(KbmAccrualError::UnbalancedJournal {
                branch: branch.to_string(),
                debits: debit,
                credit,
            });
        }
    }

    Ok(())
}

pub fn build_journal(
    config: &AccrualConfig,
    accounts: &AccountLookup,
    period: &ReportingPeriod,
    old_records: &[KbmRecord],
    new_records: &[KbmRecord],
) -> Result<Vec<JournalLine>> {
    let directory = config.branch_directory();
    JournalBuilder::new(config, &directory, accounts, period).build(old_records, new_records)
}
