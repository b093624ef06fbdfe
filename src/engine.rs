use crate::branches::BranchDirectory;
use crate::carry_forward::build_carry_forward;
use crate::classifier::Classifier;
use crate::config::AccrualConfig;
use crate::enrichment::{apply_cross_references, enrich_costs};
use crate::error::Result;
use crate::ingestion::{normalize_new_format, normalize_old_format, KbmDataset, SheetRole};
use crate::journal::JournalBuilder;
use crate::period::ReportingPeriod;
use crate::reference::ReferenceTables;
use crate::report::{assemble_branch_reports, BranchReport};
use crate::schema::{CarryForwardEntry, JournalLine, KbmRecord};
use crate::RunContext;
use log::{debug, info};

/// Everything one run produces, ready to be rendered.
#[derive(Debug, Clone)]
pub struct AccrualReport {
    pub period: ReportingPeriod,
    pub branches: Vec<String>,
    pub branch_reports: Vec<BranchReport>,
    pub carry_forward: Vec<CarryForwardEntry>,
    pub journal: Vec<JournalLine>,
}

/// Classified and enriched records of both formats.
#[derive(Debug, Clone)]
pub struct ClassifiedRecords {
    /// Current-period rows, then the tagged rows of the two prior periods.
    pub old_format: Vec<KbmRecord>,
    pub new_format: Vec<KbmRecord>,
}

pub struct AccrualEngine<'a> {
    config: &'a AccrualConfig,
    references: &'a ReferenceTables,
    directory: BranchDirectory,
}

impl<'a> AccrualEngine<'a> {
    pub fn new(config: &'a AccrualConfig, references: &'a ReferenceTables) -> Self {
        Self {
            config,
            references,
            directory: config.branch_directory(),
        }
    }

    pub fn classify(&self, dataset: &KbmDataset, run: &RunContext) -> Result<ClassifiedRecords> {
        let sheets = dataset.consumed_sheets()?;
        let classifier = Classifier::new(&self.directory, &run.branches, &run.period);

        info!(
            "Closing {} (next-period pattern '{}')",
            run.period.label(),
            classifier.next_period_pattern()
        );

        let current = normalize_old_format(sheets.current_period)?;
        let two_back = normalize_old_format(sheets.two_periods_back)?;
        let one_back = normalize_old_format(sheets.one_period_back)?;
        let new_format = normalize_new_format(sheets.new_format)?;

        info!(
            "Normalized records: current {}, prior {} + {}, new format {}",
            current.len(),
            two_back.len(),
            one_back.len(),
            new_format.len()
        );

        let mut old_format = classifier.classify_sheet(&current, SheetRole::CurrentPeriod);
        old_format.extend(classifier.classify_sheet(&two_back, SheetRole::PriorPeriod));
        old_format.extend(classifier.classify_sheet(&one_back, SheetRole::PriorPeriod));

        let new_format = classifier.classify_sheet(&new_format, SheetRole::NewFormat);
        let new_format = enrich_costs(&new_format, &self.references.prices);
        let new_format = apply_cross_references(&new_format, &old_format);

        Ok(ClassifiedRecords {
            old_format,
            new_format,
        })
    }

    pub fn process(&self, dataset: &KbmDataset, run: &RunContext) -> Result<AccrualReport> {
        let records = self.classify(dataset, run)?;

        let branch_reports =
            assemble_branch_reports(&run.branches, &records.old_format, &records.new_format);
        for report in &branch_reports {
            debug!(
                "Branch {}: {} old-format row(s), {} new-format row(s)",
                report.branch,
                report.old_format.rows.len(),
                report.new_format.rows.len()
            );
        }

        let journal = JournalBuilder::new(
            self.config,
            &self.directory,
            &self.references.accounts,
            &run.period,
        )
        .build(&records.old_format, &records.new_format)?;

        let carry_forward = build_carry_forward(
            &records.old_format,
            &records.new_format,
            &run.period.next_period_pattern(),
            &run.branches,
        );

        info!(
            "Produced {} journal line(s) and {} carry-forward document(s) for {} branch(es)",
            journal.len(),
            carry_forward.len(),
            run.branches.len()
        );

        Ok(AccrualReport {
            period: run.period.clone(),
            branches: run.branches.clone(),
            branch_reports,
            carry_forward,
            journal,
        })
    }
}

pub fn process_dataset(
    dataset: &KbmDataset,
    references: &ReferenceTables,
    run: &RunContext,
    config: &AccrualConfig,
) -> Result<AccrualReport> {
    AccrualEngine::new(config, references).process(dataset, run)
}
