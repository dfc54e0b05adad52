use serde::{Deserialize, Serialize};
use std::fmt;

/// Aspekt som används när uppladdningen saknar aspekt
pub const UNASSIGNED_ASPECT: &str = "Tidak Diberikan Aspek";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    #[default]
    Uploaded,
    Pending,
}

impl FileStatus {
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            _ => Self::Uploaded,
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uploaded => write!(f, "uploaded"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// Metadata för en uppladdad fil
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileSize")]
    pub file_size: i64,
    #[serde(rename = "uploadDate")]
    pub upload_date: Option<String>,
    pub year: i32,
    #[serde(rename = "checklistId")]
    pub checklist_id: Option<i64>,
    #[serde(rename = "checklistDescription")]
    pub checklist_description: Option<String>,
    pub aspect: Option<String>,
    pub status: FileStatus,
    /// Ansvarig enhet (subdirektorat/divisi)
    #[serde(rename = "subdirektorat")]
    pub unit: Option<String>,
    #[serde(rename = "catatan")]
    pub note: Option<String>,
    #[serde(rename = "rowNumber")]
    pub row_number: Option<i32>,
    /// Sökväg relativt dokumentroten
    pub relative_path: Option<String>,
}

impl UploadedFile {
    pub fn new(id: impl Into<String>, file_name: impl Into<String>, year: i32) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            file_size: 0,
            upload_date: None,
            year,
            checklist_id: None,
            checklist_description: None,
            aspect: Some(UNASSIGNED_ASPECT.to_string()),
            status: FileStatus::Uploaded,
            unit: None,
            note: None,
            row_number: None,
            relative_path: None,
        }
    }

    pub fn file_size_display(&self) -> String {
        const KB: i64 = 1024;
        const MB: i64 = KB * 1024;
        const GB: i64 = MB * 1024;

        match self.file_size {
            s if s >= GB => format!("{:.1} GB", s as f64 / GB as f64),
            s if s >= MB => format!("{:.1} MB", s as f64 / MB as f64),
            s if s >= KB => format!("{:.1} KB", s as f64 / KB as f64),
            s => format!("{} B", s),
        }
    }

    /// Tillhör filen en viss rad (år, enhet, radnummer)?
    pub fn matches_row(&self, year: i32, unit: &str, row_number: i32) -> bool {
        self.year == year
            && self.unit.as_deref() == Some(unit)
            && self.row_number == Some(row_number)
    }
}

/// Uppladdning enligt `POST /api/upload-gcg-file`
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub year: i32,
    pub checklist_id: Option<i64>,
    pub checklist_description: Option<String>,
    pub aspect: Option<String>,
    pub unit: Option<String>,
    pub note: Option<String>,
    pub row_number: Option<i32>,
}

impl UploadRequest {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, year: i32) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            year,
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
        if !crate::utils::date::is_valid_fiscal_year(self.year) {
            return Err(format!("Ogiltigt år: {}", self.year));
        }
        Ok(())
    }
}

/// Statistik över uppladdade filer för ett år
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileYearStats {
    pub total_files: usize,
    pub total_size: i64,
    pub uploaded_count: usize,
    pub pending_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_size_display() {
        let mut file = UploadedFile::new("a", "laporan.pdf", 2024);

        file.file_size = 500;
        assert_eq!(file.file_size_display(), "500 B");

        file.file_size = 1500;
        assert_eq!(file.file_size_display(), "1.5 KB");

        file.file_size = 1_500_000;
        assert_eq!(file.file_size_display(), "1.4 MB");
    }

    #[test]
    fn test_upload_validation() {
        assert!(UploadRequest::new("a.pdf", vec![1], 2024).validate().is_ok());
        assert!(UploadRequest::new("", vec![1], 2024).validate().is_err());
        assert!(UploadRequest::new("a.pdf", vec![], 2024).validate().is_err());
        assert!(UploadRequest::new("a.pdf", vec![1], 0).validate().is_err());
    }

    #[test]
    fn test_matches_row() {
        let mut file = UploadedFile::new("a", "laporan.pdf", 2024);
        file.unit = Some("Divisi Treasury".into());
        file.row_number = Some(3);

        assert!(file.matches_row(2024, "Divisi Treasury", 3));
        assert!(!file.matches_row(2023, "Divisi Treasury", 3));
        assert!(!file.matches_row(2024, "Divisi Treasury", 4));
    }
}
