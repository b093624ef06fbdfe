use crate::reference::{PriceEntry, PriceList};
use crate::schema::{is_placeholder, CostComponents, CrossReference, KbmRecord};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashSet};

/// Prices every new-format record. A missing price entry leaves all three costs empty.
pub fn enrich_costs(records: &[KbmRecord], prices: &PriceList) -> Vec<KbmRecord> {
    let mut unpriced: BTreeSet<String> = BTreeSet::new();

    let enriched = records
        .iter()
        .map(|record| {
            let entry = match (record.branch.as_deref(), record.size.as_deref()) {
                (Some(branch), Some(size)) => prices.lookup(branch, size),
                _ => None,
            };

            if entry.is_none() {
                unpriced.insert(PriceList::key(
                    record.branch.as_deref().unwrap_or("?"),
                    record.size.as_deref().unwrap_or("?"),
                ));
            }

            KbmRecord {
                costs: Some(price_record(record.measure, entry)),
                ..record.clone()
            }
        })
        .collect();

    if !unpriced.is_empty() {
        warn!(
            "No price entry for {} branch/size combination(s); their costs are left empty",
            unpriced.len()
        );
        for key in &unpriced {
            debug!("Unpriced combination: '{}'", key);
        }
    }

    enriched
}

pub fn price_record(quantity: Option<Decimal>, entry: Option<&PriceEntry>) -> CostComponents {
    let Some(entry) = entry else {
        return CostComponents::default();
    };

    let times = |rate: Option<Decimal>| {
        let (quantity, rate) = (quantity?, rate?);
        let cost = quantity.checked_mul(rate);
        if cost.is_none() {
            warn!("Cost {} x {} overflows; left empty", quantity, rate);
        }
        cost
    };

    CostComponents {
        handling: times(entry.handling),
        haulage: times(entry.haulage),
        lift_on_lift_off: times(entry.lift_on_lift_off),
    }
}

/// Comma-separated document ids, trimmed, without empty fragments.
pub fn split_document_ids(document: &str) -> impl Iterator<Item = &str> {
    document.split(',').map(str::trim).filter(|d| !d.is_empty())
}

pub fn known_document_numbers(old_records: &[KbmRecord]) -> HashSet<String> {
    old_records
        .iter()
        .filter_map(|r| r.document.clone())
        .collect()
}

pub fn cross_reference(
    document: Option<&str>,
    known_documents: &HashSet<String>,
) -> Option<CrossReference> {
    if is_placeholder(document) {
        return None;
    }
    let document = document?;

    if split_document_ids(document).any(|d| known_documents.contains(d)) {
        Some(CrossReference::Hide)
    } else {
        Some(CrossReference::Show)
    }
}

/// Flags new-format records whose document is already present in old-format data.
pub fn apply_cross_references(
    new_records: &[KbmRecord],
    old_records: &[KbmRecord],
) -> Vec<KbmRecord> {
    let known = known_document_numbers(old_records);

    new_records
        .iter()
        .map(|record| KbmRecord {
            cross_reference: cross_reference(record.document.as_deref(), &known),
            ..record.clone()
        })
        .collect()
}
