//! Skanning av dokumentkatalogen
//!
//! Stämmer av `{år}/{enhet}/{checklist_id}/{fil}` på disk mot databasen.
//! - Registrerar filer som saknar post
//! - Uppdaterar storlek för befintliga poster
//! - Markerar poster vars fil saknas som `pending`

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use anyhow::Result;
use uuid::Uuid;

use crate::db::Database;
use crate::models::{FileStatus, UploadedFile, UNASSIGNED_ASPECT};
use crate::utils::file_ops;
use crate::utils::path::unit_from_dir_name;

/// Resultat av en skanning
#[derive(Debug, Default)]
pub struct ScanResult {
    pub added: usize,
    pub updated: usize,
    /// Poster vars fil inte längre finns på disk
    pub missing: usize,
    /// Filer utanför den förväntade katalogstrukturen
    pub ignored: usize,
    pub warnings: Vec<String>,
}

impl ScanResult {
    pub fn summary(&self) -> String {
        format!(
            "{} tillagda, {} uppdaterade, {} saknas, {} ignorerade",
            self.added, self.updated, self.missing, self.ignored
        )
    }

    pub fn has_changes(&self) -> bool {
        self.added > 0 || self.updated > 0 || self.missing > 0
    }
}

/// Fil på disk tolkad från sin sökväg
#[derive(Debug, Clone, PartialEq)]
struct ScannedPath {
    year: i32,
    unit: String,
    checklist_id: i64,
    file_name: String,
}

impl ScannedPath {
    fn parse(relative_path: &str) -> Option<Self> {
        let parts: Vec<&str> = relative_path.split('/').collect();
        let [year, unit, checklist_id, file_name] = parts.as_slice() else {
            return None;
        };

        Some(Self {
            year: year.parse().ok()?,
            unit: unit_from_dir_name(unit),
            checklist_id: checklist_id.parse().ok()?,
            file_name: file_name.to_string(),
        })
    }
}

pub struct FileScanService<'a> {
    db: &'a Database,
    documents_dir: PathBuf,
}

impl<'a> FileScanService<'a> {
    pub fn new(db: &'a Database, documents_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            documents_dir: documents_dir.into(),
        }
    }

    pub fn scan(&self) -> Result<ScanResult> {
        let mut result = ScanResult::default();

        let existing = self.db.files().find_all(None)?;
        let by_path: HashMap<&str, &UploadedFile> = existing
            .iter()
            .filter_map(|f| f.relative_path.as_deref().map(|p| (p, f)))
            .collect();

        let files = file_ops::scan_directory_relative(&self.documents_dir)?;
        let on_disk: HashSet<&str> = files.iter().map(|(_, rel)| rel.as_str()).collect();

        // 1. Filer på disk
        for (full_path, relative_path) in &files {
            let Some(scanned) = ScannedPath::parse(relative_path) else {
                result.ignored += 1;
                tracing::debug!("Ignorerade fil utanför strukturen: {}", relative_path);
                continue;
            };

            let size = match file_ops::get_file_size(full_path) {
                Ok(size) => size as i64,
                Err(e) => {
                    result.warnings.push(format!("{}: {}", relative_path, e));
                    continue;
                }
            };

            match by_path.get(relative_path.as_str()) {
                Some(record) => {
                    if record.file_size == size && record.status == FileStatus::Uploaded {
                        continue;
                    }
                    match self.db.files().update_scan(&record.id, size, FileStatus::Uploaded) {
                        Ok(_) => {
                            result.updated += 1;
                            tracing::info!("Uppdaterade fil: {}", relative_path);
                        }
                        Err(e) => result
                            .warnings
                            .push(format!("Kunde inte uppdatera {}: {}", relative_path, e)),
                    }
                }
                None => match self.register(&scanned, relative_path, size) {
                    Ok(()) => {
                        result.added += 1;
                        tracing::info!("Lade till fil: {}", relative_path);
                    }
                    Err(e) => result
                        .warnings
                        .push(format!("Kunde inte lägga till {}: {}", relative_path, e)),
                },
            }
        }

        // 2. Poster vars fil saknas
        for record in &existing {
            let Some(relative_path) = record.relative_path.as_deref() else {
                continue;
            };
            if on_disk.contains(relative_path) || record.status == FileStatus::Pending {
                continue;
            }

            match self
                .db
                .files()
                .update_scan(&record.id, record.file_size, FileStatus::Pending)
            {
                Ok(_) => {
                    result.missing += 1;
                    tracing::warn!("Fil saknas på disk: {}", relative_path);
                }
                Err(e) => result
                    .warnings
                    .push(format!("Kunde inte markera {}: {}", relative_path, e)),
            }
        }

        tracing::info!("Skanning klar: {}", result.summary());
        Ok(result)
    }

    fn register(&self, scanned: &ScannedPath, relative_path: &str, size: i64) -> Result<()> {
        let item = self.db.checklists().find_by_id(scanned.checklist_id)?;

        let mut file = UploadedFile::new(Uuid::new_v4().to_string(), &scanned.file_name, scanned.year);
        file.file_size = size;
        file.checklist_id = Some(scanned.checklist_id);
        file.unit = Some(scanned.unit.clone());
        file.relative_path = Some(relative_path.to_string());

        match item {
            Some(item) => {
                file.checklist_description = Some(item.description);
                file.aspect = Some(item.aspect);
                file.row_number = Some(item.row_number);
            }
            None => {
                file.aspect = Some(UNASSIGNED_ASPECT.to_string());
            }
        }

        self.db.files().create(&mut file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChecklistItem;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write(root: &Path, relative: &str, bytes: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_parse_path() {
        let parsed = ScannedPath::parse("2025/Divisi_Human_Capital/324/Annual_Report.pdf").unwrap();
        assert_eq!(parsed.year, 2025);
        assert_eq!(parsed.unit, "Divisi Human Capital");
        assert_eq!(parsed.checklist_id, 324);
        assert_eq!(parsed.file_name, "Annual_Report.pdf");

        assert!(ScannedPath::parse("2025/Divisi/umum/a.pdf").is_none());
        assert!(ScannedPath::parse("readme.txt").is_none());
        assert!(ScannedPath::parse("abc/Divisi/1/a.pdf").is_none());
    }

    #[test]
    fn test_scan_registers_and_marks_missing() {
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();

        let mut item = ChecklistItem::new("Direksi", "Pedoman Direksi", 2025);
        db.checklists().create(&mut item).unwrap();
        let id = item.id.unwrap();

        let relative = format!("2025/Divisi_Treasury/{}/pedoman.pdf", id);
        write(dir.path(), &relative, b"hello");
        write(dir.path(), "lose.txt", b"x");

        let scanner = FileScanService::new(&db, dir.path());
        let result = scanner.scan().unwrap();
        assert_eq!(result.added, 1);
        assert_eq!(result.ignored, 1);

        let files = db.files().find_by_checklist(id).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_size, 5);
        assert_eq!(files[0].aspect.as_deref(), Some("Direksi"));
        assert_eq!(files[0].unit.as_deref(), Some("Divisi Treasury"));

        // Andra skanningen ändrar inget
        assert!(!scanner.scan().unwrap().has_changes());

        fs::remove_file(dir.path().join(&relative)).unwrap();
        let result = scanner.scan().unwrap();
        assert_eq!(result.missing, 1);
        assert_eq!(
            db.files().find_by_checklist(id).unwrap()[0].status,
            FileStatus::Pending
        );

        // Filen tillbaka med ny storlek
        write(dir.path(), &relative, b"hello world");
        let result = scanner.scan().unwrap();
        assert_eq!(result.updated, 1);
        let file = &db.files().find_by_checklist(id).unwrap()[0];
        assert_eq!(file.status, FileStatus::Uploaded);
        assert_eq!(file.file_size, 11);
    }

    #[test]
    fn test_missing_directory_is_empty_scan() {
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();

        let scanner = FileScanService::new(&db, dir.path().join("saknas"));
        let result = scanner.scan().unwrap();
        assert!(!result.has_changes());
        assert_eq!(result.ignored, 0);
    }
}
