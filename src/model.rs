use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Business,
    Personnel,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::Personnel => "personnel",
        }
    }

    /// `PL*` listings carry businesses, `PP*` listings carry personnel.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let prefix = filename.get(..2)?;
        if prefix.eq_ignore_ascii_case("PL") {
            Some(Self::Business)
        } else if prefix.eq_ignore_ascii_case("PP") {
            Some(Self::Personnel)
        } else {
            None
        }
    }

    pub fn file_prefix(self) -> &'static str {
        match self {
            Self::Business => "PL",
            Self::Personnel => "PP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    Active,
    Inactive,
    Expired,
    Suspended,
}

impl LicenseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Expired => "expired",
            Self::Suspended => "suspended",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "ACTIVE" => Some(Self::Active),
            "INACTIVE" => Some(Self::Inactive),
            "EXPIRED" => Some(Self::Expired),
            "SUSPENDED" => Some(Self::Suspended),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonnelTitle {
    Owner,
    Rmo,
    Rme,
    Partner,
    Officer,
    Member,
}

impl PersonnelTitle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Rmo => "RMO",
            Self::Rme => "RME",
            Self::Partner => "PARTNER",
            Self::Officer => "OFFICER",
            Self::Member => "MEMBER",
        }
    }

    /// Maps a listing role keyword onto the title enumeration. Corporate
    /// officer designations collapse into `Officer`.
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "OWNER" | "SOLE OWNER" => Some(Self::Owner),
            "RMO" => Some(Self::Rmo),
            "RME" => Some(Self::Rme),
            "PARTNER" | "GENERAL PARTNER" => Some(Self::Partner),
            "OFFICER" | "PRESIDENT" | "CEO" | "CFO" | "SECRETARY" | "TREASURER" | "VP" => {
                Some(Self::Officer)
            }
            "MEMBER" | "MANAGER" => Some(Self::Member),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BusinessRecord {
    pub license_number: String,
    pub business_name: Option<String>,
    pub status: Option<LicenseStatus>,
    pub address: Option<String>,
    pub city_state_zip: Option<String>,
    pub phone: Option<String>,
    pub bond_amount: Option<String>,
    /// Distinct codes in discovery order.
    pub classifications: Vec<String>,
    pub expire_date: Option<String>,
    pub line_number: usize,
    pub raw_text: String,
}

impl BusinessRecord {
    pub fn add_classification(&mut self, code: String) {
        if !self.classifications.contains(&code) {
            self.classifications.push(code);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonnelRecord {
    pub license_number: String,
    pub person_name: String,
    pub title: Option<PersonnelTitle>,
    pub association_date: Option<String>,
    pub disassociation_date: Option<String>,
    pub line_number: usize,
    pub raw_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResult {
    pub filename: String,
    pub success: bool,
    pub file_size: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub filename: String,
    pub kind: RecordKind,
    pub record_count: usize,
    pub output_path: Option<String>,
    pub source_sha256: Option<String>,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub filename: String,
    pub kind: Option<RecordKind>,
    pub size_bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub document_count: usize,
    pub documents: Vec<SourceEntry>,
}

/// The subset of a persisted session manifest that `status` reads back.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionManifestSummary {
    pub session_id: String,
    pub mode: String,
    pub status: String,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub failure_reason: Option<String>,
    pub totals: SessionTotals,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    pub downloads_attempted: usize,
    pub downloads_succeeded: usize,
    pub downloads_failed: usize,
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    pub total_records: usize,
    pub contractor_records: usize,
    pub personnel_records: usize,
    pub archived_files: usize,
}
