use crate::branches::{BranchDirectory, DEFAULT_BRANCHES};
use crate::error::{KbmAccrualError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BranchCategory {
    #[schemars(
        description = "Port branch: undocumented activity counts only for EMPTY or '-' status (old format) or MT containers (new format)."
    )]
    Port,

    #[schemars(
        description = "Container-yard branch: undocumented activity also counts FULL status (old format) and MT/FL/'-' sizes (new format)."
    )]
    Yard,

    #[schemars(description = "Neither port nor yard: never eligible for the no-document rules.")]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct BranchEntry {
    #[schemars(description = "Branch code as it appears in the 'Port Id' column (e.g. 'BMS').")]
    pub code: String,

    #[schemars(description = "Full branch name printed in the journal (e.g. 'BANJARMASIN').")]
    pub name: String,

    pub category: BranchCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct AccountCodes {
    #[schemars(description = "Credit account of every accrual line.")]
    pub accrual_credit: String,

    #[schemars(description = "Handling (stevedoring) debit account for empty 'MT' containers.")]
    pub handling_empty: String,

    #[schemars(description = "Handling (stevedoring) debit account for every other container size.")]
    pub handling_other: String,

    pub haulage: String,

    pub lift_on_lift_off: String,
}

impl Default for AccountCodes {
    fn default() -> Self {
        Self {
            accrual_credit: "3XX.01.12".to_string(),
            handling_empty: "7XX.03.01.02.04".to_string(),
            handling_other: "7XX.03.01.02.03".to_string(),
            haulage: "7XX.18.01".to_string(),
            lift_on_lift_off: "7XX.04.02".to_string(),
        }
    }
}

/// Static configuration of one accrual run: the branch partition and the fixed ledger codes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct AccrualConfig {
    #[schemars(description = "Every known branch with its display name and category.")]
    pub branches: Vec<BranchEntry>,

    #[serde(default)]
    pub accounts: AccountCodes,

    #[serde(default)]
    #[schemars(
        description = "Branch code -> journal marker replacing the default 'A' on that branch's header lines."
    )]
    pub marker_overrides: BTreeMap<String, String>,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        let branches = DEFAULT_BRANCHES
            .iter()
            .map(|(code, name, category)| BranchEntry {
                code: code.to_string(),
                name: name.to_string(),
                category: *category,
            })
            .collect();

        let mut marker_overrides = BTreeMap::new();
        marker_overrides.insert("SBY".to_string(), "B".to_string());

        Self {
            branches,
            accounts: AccountCodes::default(),
            marker_overrides,
        }
    }
}

impl AccrualConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for branch in &self.branches {
            if !seen.insert(branch.code.as_str()) {
                return Err(KbmAccrualError::ReferenceData {
                    source_name: "config".to_string(),
                    details: format!("branch code '{}' is listed twice", branch.code),
                });
            }
        }
        Ok(())
    }

    pub fn branch_directory(&self) -> BranchDirectory {
        BranchDirectory::new(&self.branches)
    }

    pub fn marker_for(&self, branch: &str) -> &str {
        self.marker_overrides
            .get(branch)
            .map(String::as_str)
            .unwrap_or("A")
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AccrualConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
