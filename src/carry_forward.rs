use crate::enrichment::split_document_ids;
use crate::schema::{CarryForwardEntry, ClassificationTag, KbmRecord, RecordFormat};
use log::debug;
use std::collections::HashSet;

/// New-format document ids only count when they are JMH documents.
pub const CARRY_FORWARD_DOCUMENT_MARKER: &str = "JMH";

/// Document numbers deferred to the next period, across both formats.
///
/// Entries are unique on (document number, vessel-voyage key), keep the first
/// occurrence (old format before new), are ordered by branch then document number
/// and are restricted to `selected` branches.
pub fn build_carry_forward(
    old_records: &[KbmRecord],
    new_records: &[KbmRecord],
    next_period_pattern: &str,
    selected: &[String],
) -> Vec<CarryForwardEntry> {
    let old_side = dedup_by_key(old_format_entries(old_records), |e| {
        (e.branch.clone(), e.document_number.clone(), e.vessel_voyage.clone())
    });
    let new_side = dedup_by_key(new_format_entries(new_records, next_period_pattern), |e| {
        (e.document_number.clone(), e.vessel_voyage.clone())
    });

    let mut entries = dedup_by_key(old_side.into_iter().chain(new_side), |e| {
        (e.document_number.clone(), e.vessel_voyage.clone())
    });

    entries.sort_by(|a, b| {
        (&a.branch, &a.document_number).cmp(&(&b.branch, &b.document_number))
    });

    let selected: HashSet<&str> = selected.iter().map(String::as_str).collect();
    entries.retain(|e| selected.contains(e.branch.as_str()));

    debug!("Carry-forward list: {} document(s)", entries.len());
    entries
}

fn old_format_entries(records: &[KbmRecord]) -> Vec<CarryForwardEntry> {
    records
        .iter()
        .filter(|r| r.tag == ClassificationTag::NextPeriod)
        .filter_map(|r| {
            Some(CarryForwardEntry {
                branch: r.branch.clone().unwrap_or_default(),
                document_number: r.document.clone()?,
                vessel_voyage: r.vessel_voyage.clone(),
                source: RecordFormat::Old,
            })
        })
        .collect()
}

fn new_format_entries(records: &[KbmRecord], next_period_pattern: &str) -> Vec<CarryForwardEntry> {
    records
        .iter()
        .flat_map(|r| {
            r.document
                .as_deref()
                .into_iter()
                .flat_map(split_document_ids)
                .filter(move |d| d.contains(CARRY_FORWARD_DOCUMENT_MARKER) && d.contains(next_period_pattern))
                .map(move |d| CarryForwardEntry {
                    branch: r.branch.clone().unwrap_or_default(),
                    document_number: d.to_string(),
                    vessel_voyage: r.vessel_voyage.clone(),
                    source: RecordFormat::New,
                })
        })
        .collect()
}

fn dedup_by_key<I, K, F>(entries: I, key: F) -> Vec<CarryForwardEntry>
where
    I: IntoIterator<Item = CarryForwardEntry>,
    K: std::hash::Hash + Eq,
    F: Fn(&CarryForwardEntry) -> K,
{
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(key(e)))
        .collect()
}
