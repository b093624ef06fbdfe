use crate::config::{BranchCategory, BranchEntry};
use std::collections::BTreeMap;

use crate::config::BranchCategory::{Port, Yard};

pub const DEFAULT_BRANCHES: [(&str, &str, BranchCategory); 36] = [
    ("BMS", "BANJARMASIN", Port),
    ("BPN", "BALIKPAPAN", Yard),
    ("BTM", "BATAM", Yard),
    ("MKS", "MAKASSAR", Port),
    ("MDN", "MEDAN", Port),
    ("PKB", "PEKANBARU", Port),
    ("SMD", "SAMARINDA", Port),
    ("SRG", "SORONG", Port),
    ("TRK", "TARAKAN", Port),
    ("MKW", "MANOKWARI", Yard),
    ("MRK", "MERAUKE", Port),
    ("BTJ", "BATULICIN", Port),
    ("BUW", "BAU - BAU", Yard),
    ("BER", "BERAU", Port),
    ("BIK", "BIAK", Yard),
    ("BIT", "BITUNG", Port),
    ("FAK", "FAK - FAK", Yard),
    ("KTG", "KETAPANG", Yard),
    ("KNG", "KAIMANA", Yard),
    ("NBI", "NABIRE", Yard),
    ("NNK", "NUNUKAN", Yard),
    ("SPT", "SAMPIT", Port),
    ("SRI", "SERUI", Yard),
    ("TRT", "TERNATE", Yard),
    ("TMK", "TIMIKA", Yard),
    ("TUA", "TUAL", Yard),
    ("PNK", "PONTIANAK", Yard),
    ("PBG", "PALEMBANG", Yard),
    ("AMB", "AMBON", Port),
    ("GOR", "GORONTALO", Port),
    ("PALU", "PALU", Port),
    ("PDG", "PADANG", Yard),
    ("KDI", "KENDARI", Yard),
    ("SMG", "SEMARANG", Yard),
    ("BKU", "BUNGKU", Yard),
    ("SBY", "SURABAYA", Port),
];

/// Read-only lookup from branch code to display name and category.
#[derive(Debug, Clone, Default)]
pub struct BranchDirectory {
    entries: BTreeMap<String, BranchEntry>,
}

impl BranchDirectory {
    pub fn new(branches: &[BranchEntry]) -> Self {
        let entries = branches
            .iter()
            .map(|b| (b.code.clone(), b.clone()))
            .collect();
        Self { entries }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Unknown codes fall into `Other`, which no no-document rule accepts.
    pub fn category(&self, code: &str) -> BranchCategory {
        self.entries
            .get(code)
            .map(|b| b.category)
            .unwrap_or(BranchCategory::Other)
    }

    pub fn display_name(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(|b| b.name.as_str())
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
