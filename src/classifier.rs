use crate::branches::BranchDirectory;
use crate::config::BranchCategory;
use crate::ingestion::SheetRole;
use crate::period::ReportingPeriod;
use crate::schema::{ClassificationTag, KbmRecord, RecordFormat};
use log::debug;
use std::collections::HashSet;

/// Old-format statuses that count as undocumented at a port branch.
pub const PORT_STATUSES: [&str; 2] = ["EMPTY", "-"];
/// Yard branches additionally accept loaded containers.
pub const YARD_STATUSES: [&str; 3] = ["EMPTY", "-", "FULL"];
/// New-format size label marker for empty containers.
pub const EMPTY_CONTAINER_MARKER: &str = "MT";
/// A bare `-` matches any label containing a hyphen.
pub const YARD_SIZE_MARKERS: [&str; 3] = ["MT", "FL", "-"];

const FULL_RULE_SET: [ClassificationRule; 3] = [
    ClassificationRule::NoDocPort,
    ClassificationRule::NoDocYard,
    ClassificationRule::NextPeriod,
];
const PRIOR_RULE_SET: [ClassificationRule; 1] = [ClassificationRule::NextPeriod];

/// One tagging rule. Rules run in order and a later match replaces an earlier tag,
/// so `NextPeriod` must stay last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationRule {
    NoDocPort,
    NoDocYard,
    NextPeriod,
}

impl ClassificationRule {
    pub fn tag(&self) -> ClassificationTag {
        match self {
            ClassificationRule::NoDocPort => ClassificationTag::NoDocPort,
            ClassificationRule::NoDocYard => ClassificationTag::NoDocYard,
            ClassificationRule::NextPeriod => ClassificationTag::NextPeriod,
        }
    }

    pub fn rules_for(role: SheetRole) -> &'static [ClassificationRule] {
        match role {
            SheetRole::PriorPeriod => &PRIOR_RULE_SET,
            SheetRole::CurrentPeriod | SheetRole::NewFormat => &FULL_RULE_SET,
        }
    }
}

pub struct Classifier<'a> {
    directory: &'a BranchDirectory,
    selected: HashSet<&'a str>,
    next_period_pattern: String,
}

impl<'a> Classifier<'a> {
    pub fn new(
        directory: &'a BranchDirectory,
        selected: &'a [String],
        period: &ReportingPeriod,
    ) -> Self {
        Self {
            directory,
            selected: selected.iter().map(String::as_str).collect(),
            next_period_pattern: period.next_period_pattern(),
        }
    }

    pub fn next_period_pattern(&self) -> &str {
        &self.next_period_pattern
    }

    pub fn classify(&self, record: &KbmRecord, role: SheetRole) -> KbmRecord {
        ClassificationRule::rules_for(role)
            .iter()
            .fold(record.clone(), |current, rule| {
                if self.matches(*rule, record) {
                    current.with_tag(rule.tag())
                } else {
                    current
                }
            })
    }

    /// Classifies a whole sheet. Prior-period sheets keep only their tagged rows.
    pub fn classify_sheet(&self, records: &[KbmRecord], role: SheetRole) -> Vec<KbmRecord> {
        let classified: Vec<KbmRecord> = records
            .iter()
            .map(|r| self.classify(r, role))
            .filter(|r| role != SheetRole::PriorPeriod || r.tag.is_set())
            .collect();

        debug!(
            "{:?}: {} of {} record(s) tagged",
            role,
            classified.iter().filter(|r| r.tag.is_set()).count(),
            records.len()
        );

        classified
    }

    pub fn matches(&self, rule: ClassificationRule, record: &KbmRecord) -> bool {
        match rule {
            ClassificationRule::NoDocPort => {
                self.in_category(record, BranchCategory::Port)
                    && match record.format {
                        RecordFormat::Old => {
                            record.document_type_missing()
                                && status_in(record, &PORT_STATUSES)
                        }
                        RecordFormat::New => {
                            record.document_missing()
                                && size_contains_any(record, &[EMPTY_CONTAINER_MARKER])
                        }
                    }
            }
            ClassificationRule::NoDocYard => {
                self.in_category(record, BranchCategory::Yard)
                    && match record.format {
                        RecordFormat::Old => {
                            record.document_type_missing()
                                && status_in(record, &YARD_STATUSES)
                        }
                        RecordFormat::New => {
                            record.document_missing()
                                && size_contains_any(record, &YARD_SIZE_MARKERS)
                        }
                    }
            }
            ClassificationRule::NextPeriod => record
                .document
                .as_deref()
                .is_some_and(|doc| doc.contains(&self.next_period_pattern)),
        }
    }

    fn in_category(&self, record: &KbmRecord, category: BranchCategory) -> bool {
        match record.branch.as_deref() {
            Some(branch) => {
                self.selected.contains(branch) && self.directory.category(branch) == category
            }
            None => false,
        }
    }
}

fn status_in(record: &KbmRecord, accepted: &[&str]) -> bool {
    record
        .status
        .as_deref()
        .is_some_and(|status| accepted.contains(&status))
}

fn size_contains_any(record: &KbmRecord, markers: &[&str]) -> bool {
    record
        .size
        .as_deref()
        .is_some_and(|size| markers.iter().any(|m| size.contains(m)))
}
