use serde::{Deserialize, Serialize};
use std::fmt;

/// Typ av organisationsenhet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrgUnitKind {
    #[serde(rename = "direktorat")]
    Directorate,
    #[serde(rename = "subdirektorat")]
    Subdirectorate,
    #[serde(rename = "divisi")]
    Division,
    #[serde(rename = "anak_perusahaan")]
    Subsidiary,
}

impl OrgUnitKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Directorate => "Direktorat",
            Self::Subdirectorate => "Sub Direktorat",
            Self::Division => "Divisi",
            Self::Subsidiary => "Anak Perusahaan",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "direktorat" => Some(Self::Directorate),
            "subdirektorat" => Some(Self::Subdirectorate),
            "divisi" => Some(Self::Division),
            "anak_perusahaan" => Some(Self::Subsidiary),
            _ => None,
        }
    }

    /// Vilken typ en förälder måste ha
    pub fn parent_kind(&self) -> Option<Self> {
        match self {
            Self::Subdirectorate => Some(Self::Directorate),
            Self::Division => Some(Self::Subdirectorate),
            Self::Directorate | Self::Subsidiary => None,
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::Directorate,
            Self::Subdirectorate,
            Self::Division,
            Self::Subsidiary,
        ]
    }
}

impl fmt::Display for OrgUnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directorate => write!(f, "direktorat"),
            Self::Subdirectorate => write!(f, "subdirektorat"),
            Self::Division => write!(f, "divisi"),
            Self::Subsidiary => write!(f, "anak_perusahaan"),
        }
    }
}

/// En enhet i organisationsstrukturen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgUnit {
    pub id: Option<i64>,
    pub kind: OrgUnitKind,
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "deskripsi")]
    pub description: String,
    pub parent_id: Option<i64>,
    #[serde(rename = "tahun")]
    pub year: i32,
    pub is_active: bool,
    pub created_at: Option<String>,
}

impl OrgUnit {
    pub fn new(kind: OrgUnitKind, name: impl Into<String>, year: i32) -> Self {
        Self {
            id: None,
            kind,
            name: name.into(),
            description: String::new(),
            parent_id: None,
            year,
            is_active: true,
            created_at: None,
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Partiell uppdatering av en enhet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrgUnitUpdate {
    #[serde(rename = "nama", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "deskripsi", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OrgUnitUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Standardstruktur: (direktorat, [(subdirektorat, [divisioner])])
pub type DefaultStructure = &'static [(&'static str, &'static [(&'static str, &'static [&'static str])])];

/// Standardstruktur som kan seedas in för ett nytt år
pub const DEFAULT_STRUCTURE: DefaultStructure = &[
    (
        "Direktorat Utama",
        &[(
            "Sub Direktorat Internal Audit",
            &["Divisi Satuan Pengawasan Intern"],
        )],
    ),
    (
        "Direktorat Keuangan",
        &[
            (
                "Sub Direktorat Financial Policy and Asset Management",
                &["Divisi Kebijakan Keuangan", "Divisi Manajemen Aset"],
            ),
            ("Sub Direktorat Treasury", &["Divisi Treasury"]),
        ],
    ),
    (
        "Direktorat Operasional",
        &[(
            "Sub Direktorat Courier and Logistic Operation",
            &["Divisi Operasional Logistik", "Divisi Operasional Kurir"],
        )],
    ),
    (
        "Direktorat Human Capital",
        &[(
            "Sub Direktorat Human Capital Policy",
            &["Divisi Human Capital"],
        )],
    ),
];

/// Standardnamn för dotterbolag
pub const DEFAULT_SUBSIDIARIES: &[&str] = &["PT Pos Logistik Indonesia", "PT Pos Finansial Indonesia"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in OrgUnitKind::all() {
            assert_eq!(OrgUnitKind::from_db_str(&kind.to_string()), Some(*kind));
        }
        assert_eq!(OrgUnitKind::from_db_str("bolag"), None);
    }

    #[test]
    fn test_parent_kind() {
        assert_eq!(OrgUnitKind::Division.parent_kind(), Some(OrgUnitKind::Subdirectorate));
        assert_eq!(OrgUnitKind::Subdirectorate.parent_kind(), Some(OrgUnitKind::Directorate));
        assert_eq!(OrgUnitKind::Subsidiary.parent_kind(), None);
    }
}
