use serde::{Deserialize, Serialize};

/// Aspekt (aspek) som grupperar checklistobjekt och indikatorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aspect {
    pub id: Option<i64>,
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "tahun")]
    pub year: i32,
    #[serde(rename = "urutan")]
    pub sort_order: i32,
}

impl Aspect {
    pub fn new(name: impl Into<String>, year: i32) -> Self {
        Self {
            id: None,
            name: name.into(),
            year,
            sort_order: 0,
        }
    }
}

/// Ett obligatoriskt dokument i GCG-checklistan för ett år
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: Option<i64>,
    #[serde(rename = "aspek")]
    pub aspect: String,
    #[serde(rename = "deskripsi")]
    pub description: String,
    #[serde(rename = "tahun")]
    pub year: i32,
    /// Ansvarig enhet (PIC), None = ej tilldelad
    #[serde(rename = "pic")]
    pub assigned_unit: Option<String>,
    /// Stabilt radnummer inom året
    #[serde(rename = "rowNumber")]
    pub row_number: i32,
}

impl ChecklistItem {
    pub fn new(aspect: impl Into<String>, description: impl Into<String>, year: i32) -> Self {
        Self {
            id: None,
            aspect: aspect.into(),
            description: description.into(),
            year,
            assigned_unit: None,
            row_number: 0,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_unit
            .as_deref()
            .map(|u| !u.trim().is_empty())
            .unwrap_or(false)
    }

    /// Kontrollera obligatoriska fält innan något skickas till backend
    pub fn validate(&self) -> Result<(), String> {
        if self.aspect.trim().is_empty() {
            return Err("Aspek måste anges".into());
        }
        if self.description.trim().is_empty() {
            return Err("Deskripsi måste anges".into());
        }
        if !crate::utils::date::is_valid_fiscal_year(self.year) {
            return Err(format!("Ogiltigt år: {}", self.year));
        }
        Ok(())
    }
}
