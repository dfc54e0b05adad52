//! Bedömningsrader (penilaian) och klassificering

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::services::scoring;

/// Kvalitativ klassificering (penjelasan) härledd från capaian
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "Sangat Baik")]
    VeryGood,
    #[serde(rename = "Baik")]
    Good,
    #[serde(rename = "Cukup Baik")]
    FairlyGood,
    #[serde(rename = "Kurang Baik")]
    Poor,
    #[serde(rename = "Tidak Baik")]
    VeryPoor,
}

impl Classification {
    /// Engelsk etikett
    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::FairlyGood => "Fairly Good",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }

    /// Indonesisk etikett, används vid lagring
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::VeryGood => "Sangat Baik",
            Self::Good => "Baik",
            Self::FairlyGood => "Cukup Baik",
            Self::Poor => "Kurang Baik",
            Self::VeryPoor => "Tidak Baik",
        }
    }

    /// Tolka både engelsk och indonesisk etikett
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.display_name().eq_ignore_ascii_case(s) || c.label().eq_ignore_ascii_case(s))
    }

    /// Klassificera ett capaian-värde (gäller vikt >= 0)
    pub fn from_achievement(achievement: i64) -> Self {
        match achievement {
            a if a > 85 => Self::VeryGood,
            76..=85 => Self::Good,
            61..=75 => Self::FairlyGood,
            51..=60 => Self::Poor,
            _ => Self::VeryPoor,
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::VeryGood,
            Self::Good,
            Self::FairlyGood,
            Self::Poor,
            Self::VeryPoor,
        ]
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// En indikatorrad i bedömningen.
///
/// `achievement` och `classification` är rena funktioner av (`weight`, `score`)
/// och räknas om i samma anrop som ändrar någon av dem. Fälten är privata så att
/// de inte kan sättas var för sig. Vid deserialisering räknas de om från
/// `bobot` och `skor`; inkommande `capaian`/`penjelasan` ignoreras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPenilaianRow")]
pub struct PenilaianRow {
    pub no: i32,
    #[serde(rename = "aspek")]
    pub aspect: String,
    #[serde(rename = "deskripsi")]
    pub description: String,
    #[serde(rename = "bobot")]
    weight: f64,
    #[serde(rename = "skor")]
    score: f64,
    #[serde(rename = "capaian")]
    achievement: i64,
    #[serde(rename = "penjelasan")]
    classification: Classification,
    /// Fritext som ersätter den beräknade klassificeringen vid visning
    #[serde(rename = "penjelasanManual", default, skip_serializing_if = "Option::is_none")]
    classification_override: Option<String>,
}

impl PenilaianRow {
    pub fn new(aspect: impl Into<String>, description: impl Into<String>, weight: f64, score: f64) -> Self {
        Self {
            no: 0,
            aspect: aspect.into(),
            description: description.into(),
            weight,
            score,
            achievement: scoring::achievement(weight, score),
            classification: scoring::classify(weight, score),
            classification_override: None,
        }
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn achievement(&self) -> i64 {
        self.achievement
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn classification_override(&self) -> Option<&str> {
        self.classification_override.as_deref()
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.set_inputs(weight, self.score);
    }

    pub fn set_score(&mut self, score: f64) {
        self.set_inputs(self.weight, score);
    }

    /// Sätt båda indata och räkna om härledda fält. Manuell klassificering nollställs.
    pub fn set_inputs(&mut self, weight: f64, score: f64) {
        self.weight = weight;
        self.score = score;
        self.achievement = scoring::achievement(weight, score);
        self.classification = scoring::classify(weight, score);
        self.classification_override = None;
    }

    /// Ersätt klassificeringen med fritext. Tom text tar bort ersättningen.
    pub fn override_classification(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.classification_override = if text.trim().is_empty() {
            None
        } else {
            Some(text)
        };
    }

    /// Klassificering som ska visas (manuell om satt)
    pub fn display_classification(&self) -> &str {
        self.classification_override
            .as_deref()
            .unwrap_or_else(|| self.classification.display_name())
    }

    /// Stämmer härledda fält med indata?
    pub fn is_consistent(&self) -> bool {
        self.achievement == scoring::achievement(self.weight, self.score)
            && self.classification == scoring::classify(self.weight, self.score)
    }

}

/// Indata för en rad så som den kommer över nätet
#[derive(Deserialize)]
struct RawPenilaianRow {
    #[serde(default)]
    no: i32,
    #[serde(rename = "aspek")]
    aspect: String,
    #[serde(rename = "deskripsi", default)]
    description: String,
    #[serde(rename = "bobot")]
    weight: f64,
    #[serde(rename = "skor")]
    score: f64,
    #[serde(rename = "penjelasanManual", default)]
    classification_override: Option<String>,
}

impl From<RawPenilaianRow> for PenilaianRow {
    fn from(raw: RawPenilaianRow) -> Self {
        let mut row = PenilaianRow::new(raw.aspect, raw.description, raw.weight, raw.score);
        row.no = raw.no;
        if let Some(text) = raw.classification_override {
            row.override_classification(text);
        }
        row
    }
}

/// Sammanfattning per aspekt (härledd från indikatorraderna)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectSummary {
    #[serde(rename = "aspek")]
    pub aspect: String,
    /// Satt när sammanfattningen hör till ett visst år
    #[serde(rename = "tahun", default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(rename = "jumlah_parameter")]
    pub indicator_count: usize,
    #[serde(rename = "bobot")]
    pub total_weight: f64,
    #[serde(rename = "skor")]
    pub total_score: f64,
    #[serde(rename = "capaian")]
    pub achievement: i64,
    #[serde(rename = "penjelasan")]
    pub classification: Classification,
}

/// Data som skickas vid `POST /api/save`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSubmission {
    #[serde(rename = "tahun")]
    pub year: i32,
    #[serde(rename = "penilai")]
    pub assessor: String,
    #[serde(rename = "jenisAsesmen")]
    pub assessment_type: String,
    pub rows: Vec<PenilaianRow>,
}

/// Sparad bedömningsrad (`GET /api/indicator-data`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredIndicator {
    #[serde(rename = "tahun")]
    pub year: i32,
    #[serde(rename = "penilai")]
    pub assessor: String,
    #[serde(rename = "jenisAsesmen")]
    pub assessment_type: String,
    #[serde(flatten)]
    pub row: PenilaianRow,
}
