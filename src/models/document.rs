use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Utökad metadata för ett GCG-dokument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub id: String,
    pub title: String,
    pub document_number: String,
    pub document_date: String,
    pub description: String,
    pub direktorat: String,
    pub subdirektorat: String,
    pub division: String,
    pub file_name: String,
    pub file_size: i64,
    pub status: String,
    pub confidentiality: String,
    #[serde(rename = "catatan")]
    pub note: Option<String>,
    pub year: i32,
    pub uploaded_by: String,
    pub upload_date: Option<String>,
    pub checklist_id: Option<i64>,
    pub checklist_description: Option<String>,
    pub aspect: Option<String>,
}

impl DocumentMetadata {
    pub fn new(title: impl Into<String>, file_name: impl Into<String>, year: i32) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            document_number: String::new(),
            document_date: String::new(),
            description: String::new(),
            direktorat: String::new(),
            subdirektorat: String::new(),
            division: String::new(),
            file_name: file_name.into(),
            file_size: 0,
            status: "active".to_string(),
            confidentiality: "internal".to_string(),
            note: None,
            year,
            uploaded_by: String::new(),
            upload_date: None,
            checklist_id: None,
            checklist_description: None,
            aspect: None,
        }
    }
}

/// Partiell uppdatering av dokumentmetadata
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub document_number: Option<String>,
    pub document_date: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub confidentiality: Option<String>,
    pub note: Option<String>,
}

impl DocumentUpdate {
    pub fn apply(&self, doc: &mut DocumentMetadata) {
        if let Some(v) = &self.title {
            doc.title = v.clone();
        }
        if let Some(v) = &self.document_number {
            doc.document_number = v.clone();
        }
        if let Some(v) = &self.document_date {
            doc.document_date = v.clone();
        }
        if let Some(v) = &self.description {
            doc.description = v.clone();
        }
        if let Some(v) = &self.status {
            doc.status = v.clone();
        }
        if let Some(v) = &self.confidentiality {
            doc.confidentiality = v.clone();
        }
        if let Some(v) = &self.note {
            doc.note = Some(v.clone());
        }
    }
}

/// Statistik över dokument för ett år
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentYearStats {
    pub total_documents: usize,
    pub total_size: i64,
    pub by_direktorat: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_apply() {
        let mut doc = DocumentMetadata::new("Laporan Tahunan", "lt.pdf", 2024);
        let update = DocumentUpdate {
            title: Some("Laporan Tahunan 2024".into()),
            confidentiality: Some("rahasia".into()),
            ..Default::default()
        };

        update.apply(&mut doc);

        assert_eq!(doc.title, "Laporan Tahunan 2024");
        assert_eq!(doc.confidentiality, "rahasia");
        assert_eq!(doc.status, "active");
    }
}
