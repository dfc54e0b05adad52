use serde::{Deserialize, Serialize};

/// Räkenskapsår (tahun buku)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    pub year: i32,
    pub is_active: bool,
    pub created_at: Option<String>,
}

impl FiscalYear {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            is_active: true,
            created_at: None,
        }
    }
}

/// Antal borttagna rader per tabell när ett år rensas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCleanupStats {
    pub checklist: usize,
    pub aspects: usize,
    pub assignments: usize,
    pub uploaded_files: usize,
    pub documents: usize,
    pub structure: usize,
    pub assessments: usize,
    pub users: usize,
    /// AOI-tabeller, rekommendationer, uppföljning och AOI-dokument
    #[serde(default)]
    pub aoi: usize,
}

impl YearCleanupStats {
    pub fn total(&self) -> usize {
        self.checklist
            + self.aspects
            + self.assignments
            + self.uploaded_files
            + self.documents
            + self.structure
            + self.assessments
            + self.users
            + self.aoi
    }

    pub fn summary(&self) -> String {
        format!(
            "{} checklist, {} aspekter, {} tilldelningar, {} filer, {} dokument, {} enheter, {} bedömningsrader, {} AOI-rader",
            self.checklist,
            self.aspects,
            self.assignments,
            self.uploaded_files,
            self.documents,
            self.structure,
            self.assessments,
            self.aoi
        )
    }
}

/// Svar från backend vid borttagning av ett år
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearDeletion {
    pub year: i32,
    pub cleanup_stats: YearCleanupStats,
}
