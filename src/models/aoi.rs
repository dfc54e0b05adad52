//! Area of Improvement (AOI): förbättringsområden från bedömningen,
//! deras rekommendationer, uppföljning och bevisdokument.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Organisationsnivå som en AOI-tabell riktar sig mot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AoiTargetType {
    Direktorat,
    Subdirektorat,
    #[default]
    Divisi,
}

impl AoiTargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direktorat => "direktorat",
            Self::Subdirektorat => "subdirektorat",
            Self::Divisi => "divisi",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "direktorat" => Self::Direktorat,
            "subdirektorat" => Self::Subdirektorat,
            _ => Self::Divisi,
        }
    }
}

/// Jenis: rekommendation eller råd
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum AoiKind {
    #[default]
    Rekomendasi,
    Saran,
}

impl AoiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rekomendasi => "REKOMENDASI",
            Self::Saran => "SARAN",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("SARAN") {
            Self::Saran
        } else {
            Self::Rekomendasi
        }
    }
}

impl fmt::Display for AoiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AoiStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl AoiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "completed" => Self::Completed,
            "archived" => Self::Archived,
            _ => Self::Active,
        }
    }
}

/// En AOI-tabell för ett år, riktad mot en enhet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AoiTable {
    pub id: Option<i64>,
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "deskripsi", default)]
    pub description: String,
    #[serde(rename = "tahun")]
    pub year: i32,
    #[serde(rename = "isActive", default)]
    pub is_active: bool,
    #[serde(rename = "targetType")]
    pub target_type: AoiTargetType,
    #[serde(rename = "targetDirektorat", default)]
    pub target_direktorat: Option<String>,
    #[serde(rename = "targetSubdirektorat", default)]
    pub target_subdirektorat: Option<String>,
    #[serde(rename = "targetDivisi", default)]
    pub target_divisi: Option<String>,
    #[serde(rename = "createdBy", default)]
    pub created_by: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

impl AoiTable {
    pub fn new(name: impl Into<String>, year: i32, target_type: AoiTargetType) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            year,
            is_active: true,
            target_type,
            target_direktorat: None,
            target_subdirektorat: None,
            target_divisi: None,
            created_by: String::new(),
            created_at: None,
        }
    }

    /// Namnet på enheten som tabellen riktar sig mot
    pub fn target_name(&self) -> Option<&str> {
        let name = match self.target_type {
            AoiTargetType::Direktorat => &self.target_direktorat,
            AoiTargetType::Subdirektorat => &self.target_subdirektorat,
            AoiTargetType::Divisi => &self.target_divisi,
        };
        name.as_deref().filter(|n| !n.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Namn på AOI-tabellen måste anges".into());
        }
        if self.target_name().is_none() {
            return Err(format!("Mål ({}) måste anges", self.target_type.as_str()));
        }
        Ok(())
    }
}

/// Enhet som ansvarar för uppföljningen av en rekommendation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpUnit {
    #[serde(default)]
    pub direktorat: String,
    #[serde(default)]
    pub subdirektorat: String,
    #[serde(default)]
    pub divisi: String,
}

pub const MIN_URGENCY: u8 = 1;
pub const MAX_URGENCY: u8 = 5;

/// Rekommendation eller råd i en AOI-tabell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AoiRecommendation {
    pub id: Option<i64>,
    #[serde(rename = "aoiTableId")]
    pub table_id: i64,
    #[serde(rename = "jenis")]
    pub kind: AoiKind,
    /// Löpnummer inom tabellen, sätts vid skapande
    #[serde(default)]
    pub no: i32,
    #[serde(rename = "rekomendasi", default)]
    pub recommendation: String,
    #[serde(rename = "saran", default)]
    pub suggestion: String,
    #[serde(rename = "pihakTerkait", default)]
    pub related_party: String,
    #[serde(rename = "pihakTerkaitTindakLanjut", default)]
    pub follow_up: FollowUpUnit,
    #[serde(rename = "aspekAOI", default)]
    pub aspect: Option<String>,
    /// Antal stjärnor, 1-5
    #[serde(rename = "tingkatUrgensi")]
    pub urgency: u8,
    #[serde(rename = "jangkaWaktu", default)]
    pub timeframe: String,
    #[serde(rename = "tahun")]
    pub year: i32,
    #[serde(default)]
    pub status: AoiStatus,
    #[serde(rename = "createdBy", default)]
    pub created_by: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
}

impl AoiRecommendation {
    pub fn new(table_id: i64, kind: AoiKind, text: impl Into<String>, year: i32) -> Self {
        let text = text.into();
        let (recommendation, suggestion) = match kind {
            AoiKind::Rekomendasi => (text, String::new()),
            AoiKind::Saran => (String::new(), text),
        };
        Self {
            id: None,
            table_id,
            kind,
            no: 0,
            recommendation,
            suggestion,
            related_party: String::new(),
            follow_up: FollowUpUnit::default(),
            aspect: None,
            urgency: MIN_URGENCY,
            timeframe: String::new(),
            year,
            status: AoiStatus::Active,
            created_by: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Texten som hör till radens jenis
    pub fn text(&self) -> &str {
        match self.kind {
            AoiKind::Rekomendasi => &self.recommendation,
            AoiKind::Saran => &self.suggestion,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_URGENCY..=MAX_URGENCY).contains(&self.urgency) {
            return Err(format!(
                "Tingkat urgensi måste vara {}-{}, fick {}",
                MIN_URGENCY, MAX_URGENCY, self.urgency
            ));
        }
        if self.text().trim().is_empty() {
            return Err(format!("Text för {} måste anges", self.kind));
        }
        Ok(())
    }
}

/// Vilka organ som har följt upp en rekommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AoiTracking {
    pub id: Option<i64>,
    #[serde(rename = "aoiId")]
    pub recommendation_id: i64,
    #[serde(default)]
    pub rups: bool,
    #[serde(rename = "dewanKomisaris", default)]
    pub board_of_commissioners: bool,
    #[serde(rename = "sekdekom", default)]
    pub commissioners_secretariat: bool,
    #[serde(rename = "komite", default)]
    pub committee: bool,
    #[serde(rename = "direksi", default)]
    pub board_of_directors: bool,
    #[serde(rename = "sekretarisPerusahaan", default)]
    pub corporate_secretary: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: Option<String>,
    #[serde(rename = "updatedBy", default)]
    pub updated_by: String,
}

impl AoiTracking {
    pub const PARTIES: usize = 6;

    /// Tom uppföljning, skapas tillsammans med rekommendationen
    pub fn new(recommendation_id: i64) -> Self {
        Self {
            id: None,
            recommendation_id,
            rups: false,
            board_of_commissioners: false,
            commissioners_secretariat: false,
            committee: false,
            board_of_directors: false,
            corporate_secretary: false,
            notes: None,
            last_updated: None,
            updated_by: String::new(),
        }
    }

    fn flags(&self) -> [bool; Self::PARTIES] {
        [
            self.rups,
            self.board_of_commissioners,
            self.commissioners_secretariat,
            self.committee,
            self.board_of_directors,
            self.corporate_secretary,
        ]
    }

    /// Sätt ett organ via dess nyckel i JSON-formatet (`rups`, `direksi`, ...)
    pub fn set_party(&mut self, key: &str, done: bool) -> Result<(), String> {
        let flag = match key {
            "rups" => &mut self.rups,
            "dewanKomisaris" => &mut self.board_of_commissioners,
            "sekdekom" => &mut self.commissioners_secretariat,
            "komite" => &mut self.committee,
            "direksi" => &mut self.board_of_directors,
            "sekretarisPerusahaan" => &mut self.corporate_secretary,
            other => return Err(format!("Okänt organ: '{}'", other)),
        };
        *flag = done;
        Ok(())
    }

    pub fn completed_count(&self) -> usize {
        self.flags().iter().filter(|f| **f).count()
    }

    pub fn is_complete(&self) -> bool {
        self.completed_count() == Self::PARTIES
    }
}

/// Bevisdokument uppladdat mot en rekommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AoiDocument {
    pub id: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileSize")]
    pub file_size: i64,
    #[serde(rename = "uploadDate")]
    pub upload_date: Option<String>,
    #[serde(rename = "aoiRecommendationId")]
    pub recommendation_id: i64,
    #[serde(rename = "aoiJenis")]
    pub kind: AoiKind,
    #[serde(rename = "aoiUrutan")]
    pub no: i32,
    #[serde(rename = "userId", default)]
    pub user_id: String,
    #[serde(rename = "userDirektorat", default)]
    pub user_direktorat: String,
    #[serde(rename = "userSubdirektorat", default)]
    pub user_subdirektorat: String,
    #[serde(rename = "userDivisi", default)]
    pub user_divisi: String,
    #[serde(rename = "fileType")]
    pub file_type: String,
    pub status: String,
    #[serde(rename = "tahun")]
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub relative_path: Option<String>,
}

/// Uppladdning enligt `POST /api/upload-aoi-file`
#[derive(Debug, Clone, Default)]
pub struct AoiUploadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub recommendation_id: i64,
    pub user_id: String,
    pub user_direktorat: String,
    pub user_subdirektorat: String,
    pub user_divisi: String,
}

impl AoiUploadRequest {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, recommendation_id: i64) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            recommendation_id,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.file_name.trim().is_empty() {
            return Err("Ingen fil vald".into());
        }
        if self.bytes.is_empty() {
            return Err(format!("Filen '{}' är tom", self.file_name));
        }
        Ok(())
    }

    /// MIME-typ gissad från filändelsen
    pub fn file_type(&self) -> &'static str {
        let ext = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => "application/pdf",
            "doc" => "application/msword",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "xls" => "application/vnd.ms-excel",
            "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            _ => "application/octet-stream",
        }
    }
}
