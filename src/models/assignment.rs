use serde::{Deserialize, Serialize};
use std::fmt;

/// Vilken typ av enhet som ansvarar för ett checklistobjekt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    #[default]
    Division,
    Subdirectorate,
}

impl UnitType {
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "subdirectorate" | "subdirektorat" => Self::Subdirectorate,
            _ => Self::Division,
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Division => write!(f, "division"),
            Self::Subdirectorate => write!(f, "subdirectorate"),
        }
    }
}

/// Tilldelning av ett checklistobjekt till en enhet för ett år.
///
/// Nyckeln är (checklist_id, year); en ny tilldelning ersätter den gamla.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Option<i64>,
    pub checklist_id: i64,
    #[serde(rename = "tahun")]
    pub year: i32,
    #[serde(rename = "subdirektorat")]
    pub unit_name: String,
    pub unit_type: UnitType,
    #[serde(rename = "aspek")]
    pub aspect: Option<String>,
    pub assigned_at: Option<String>,
}

impl Assignment {
    pub fn new(checklist_id: i64, year: i32, unit_name: impl Into<String>, unit_type: UnitType) -> Self {
        Self {
            id: None,
            checklist_id,
            year,
            unit_name: unit_name.into(),
            unit_type,
            aspect: None,
            assigned_at: None,
        }
    }

    pub fn key(&self) -> (i64, i32) {
        (self.checklist_id, self.year)
    }
}
