//! Uppladdade filer per år

use std::sync::Arc;

use tracing::info;

use super::editing::{drops_local, stale_to_conflict};
use super::year_store::YearScoped;
use crate::api::GcgBackend;
use crate::models::{FileStatus, FileYearStats, UploadRequest, UploadedFile};
use crate::utils::{AppError, AppResult};

pub struct FileStore {
    backend: Arc<dyn GcgBackend>,
    files: Vec<UploadedFile>,
}

impl FileStore {
    pub fn new(backend: Arc<dyn GcgBackend>) -> Self {
        Self {
            backend,
            files: Vec::new(),
        }
    }

    pub fn load(&mut self, year: i32) -> AppResult<()> {
        let files = self.backend.list_files(Some(year))?;
        self.files.retain(|f| f.year != year);
        self.files.extend(files);
        Ok(())
    }

    pub fn files_for_year(&self, year: i32) -> Vec<&UploadedFile> {
        self.files.iter().filter(|f| f.year == year).collect()
    }

    pub fn find(&self, id: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn by_checklist(&self, checklist_id: i64, year: i32) -> Vec<&UploadedFile> {
        self.files
            .iter()
            .filter(|f| f.year == year && f.checklist_id == Some(checklist_id))
            .collect()
    }

    pub fn row_files(&self, year: i32, unit: &str, row_number: i32) -> Vec<&UploadedFile> {
        self.files
            .iter()
            .filter(|f| f.matches_row(year, unit, row_number))
            .collect()
    }

    pub fn is_uploaded(&self, checklist_id: i64, year: i32) -> bool {
        self.by_checklist(checklist_id, year)
            .iter()
            .any(|f| f.status == FileStatus::Uploaded)
    }

    /// Ladda upp en fil. En tidigare fil för samma checklistobjekt ersätts.
    pub fn upload(&mut self, request: &UploadRequest) -> AppResult<UploadedFile> {
        request.validate().map_err(AppError::Validation)?;

        let file = self.backend.upload_file(request)?;

        if let Some(checklist_id) = file.checklist_id {
            self.files
                .retain(|f| !(f.year == file.year && f.checklist_id == Some(checklist_id)));
        }
        self.files.push(file.clone());

        info!("Uppladdad: {} för {}", file.file_name, file.year);
        Ok(file)
    }

    /// Ersätt filen för ett checklistobjekt
    pub fn reupload(&mut self, checklist_id: i64, request: &UploadRequest) -> AppResult<UploadedFile> {
        let mut request = request.clone();
        request.checklist_id = Some(checklist_id);
        self.upload(&request)
    }

    pub fn delete(&mut self, id: &str) -> AppResult<()> {
        let result = self.backend.delete_uploaded_file(id);
        if drops_local(&result) {
            self.files.retain(|f| f.id != id);
        }
        result.map_err(|e| stale_to_conflict(e, &format!("Fil {}", id)))
    }

    /// Ta bort alla filer med ett visst namn inom året
    pub fn delete_by_file_name(&mut self, year: i32, file_name: &str) -> AppResult<usize> {
        let ids: Vec<String> = self
            .files
            .iter()
            .filter(|f| f.year == year && f.file_name == file_name)
            .map(|f| f.id.clone())
            .collect();

        if ids.is_empty() {
            return Err(AppError::not_found(format!("Fil '{}' ({})", file_name, year)));
        }

        let mut deleted = 0;
        for id in &ids {
            match self.delete(id) {
                Ok(()) => deleted += 1,
                Err(AppError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(deleted)
    }

    /// Ta bort filerna för en rad (år, enhet, radnummer)
    pub fn delete_row_files(&mut self, year: i32, unit: &str, row_number: i32) -> AppResult<usize> {
        let deleted = self.backend.delete_row_files(year, unit, row_number)?;
        self.files.retain(|f| !f.matches_row(year, unit, row_number));
        Ok(deleted)
    }

    /// Fråga backend vilka filer en rad har (oberoende av lokalt tillstånd)
    pub fn check_row_files(&self, year: i32, unit: &str, row_number: i32) -> AppResult<Vec<UploadedFile>> {
        self.backend.check_row_files(year, unit, row_number)
    }

    pub fn check_files_exist(&self, checklist_id: i64) -> AppResult<bool> {
        Ok(!self.backend.check_files_exist(checklist_id)?.is_empty())
    }

    pub fn stats(&self, year: i32) -> FileYearStats {
        let files = self.files_for_year(year);
        FileYearStats {
            total_files: files.len(),
            total_size: files.iter().map(|f| f.file_size).sum(),
            uploaded_count: files
                .iter()
                .filter(|f| f.status == FileStatus::Uploaded)
                .count(),
            pending_count: files
                .iter()
                .filter(|f| f.status == FileStatus::Pending)
                .count(),
        }
    }
}

impl YearScoped for FileStore {
    fn purge_year(&mut self, year: i32) -> usize {
        let before = self.files.len();
        self.files.retain(|f| f.year != year);
        before - self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::LocalBackend;
    use tempfile::tempdir;

    fn setup(dir: &std::path::Path) -> (Arc<dyn GcgBackend>, FileStore) {
        let backend: Arc<dyn GcgBackend> =
            Arc::new(LocalBackend::in_memory(dir.join("docs")).unwrap());
        let store = FileStore::new(Arc::clone(&backend));
        (backend, store)
    }

    fn request(name: &str, size: usize, checklist_id: i64) -> UploadRequest {
        let mut request = UploadRequest::new(name, vec![b'x'; size], 2024);
        request.checklist_id = Some(checklist_id);
        request.unit = Some("Divisi Treasury".into());
        request.row_number = Some(checklist_id as i32);
        request
    }

    #[test]
    fn test_upload_and_stats() {
        let dir = tempdir().unwrap();
        let (_, mut store) = setup(dir.path());

        store.upload(&request("a.pdf", 100, 1)).unwrap();
        store.upload(&request("b.pdf", 50, 2)).unwrap();

        let stats = store.stats(2024);
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size, 150);
        assert_eq!(stats.uploaded_count, 2);
        assert_eq!(stats.pending_count, 0);
        assert_eq!(store.stats(2023), FileYearStats::default());
        assert!(store.is_uploaded(1, 2024));
    }

    #[test]
    fn test_reupload_replaces_local_record() {
        let dir = tempdir().unwrap();
        let (_, mut store) = setup(dir.path());

        store.upload(&request("v1.pdf", 10, 4)).unwrap();
        store.reupload(4, &request("v2.pdf", 20, 99)).unwrap();

        let files = store.by_checklist(4, 2024);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "v2.pdf");
        assert!(store.check_files_exist(4).unwrap());
    }

    #[test]
    fn test_delete_by_file_name() {
        let dir = tempdir().unwrap();
        let (_, mut store) = setup(dir.path());

        store.upload(&request("laporan.pdf", 10, 1)).unwrap();
        store.upload(&request("laporan.pdf", 10, 2)).unwrap();
        store.upload(&request("lain.pdf", 10, 3)).unwrap();

        assert_eq!(store.delete_by_file_name(2024, "laporan.pdf").unwrap(), 2);
        assert_eq!(store.files_for_year(2024).len(), 1);
        assert!(store.delete_by_file_name(2024, "laporan.pdf").unwrap_err().is_not_found());
    }

    #[test]
    fn test_row_files() {
        let dir = tempdir().unwrap();
        let (_, mut store) = setup(dir.path());

        store.upload(&request("a.pdf", 10, 5)).unwrap();
        assert_eq!(store.row_files(2024, "Divisi Treasury", 5).len(), 1);
        assert_eq!(store.check_row_files(2024, "Divisi Treasury", 5).unwrap().len(), 1);

        assert_eq!(store.delete_row_files(2024, "Divisi Treasury", 5).unwrap(), 1);
        assert!(store.row_files(2024, "Divisi Treasury", 5).is_empty());
    }

    #[test]
    fn test_delete_missing_file_is_conflict() {
        let dir = tempdir().unwrap();
        let (backend, mut store) = setup(dir.path());

        let file = store.upload(&request("a.pdf", 10, 1)).unwrap();
        backend.delete_uploaded_file(&file.id).unwrap();

        assert!(matches!(store.delete(&file.id), Err(AppError::Conflict(_))));
        assert!(store.find(&file.id).is_none());
    }

    #[test]
    fn test_failed_delete_keeps_local_record() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(LocalBackend::in_memory(dir.path().join("docs")).unwrap());
        let mut store = FileStore::new(backend.clone());

        let file = store.upload(&request("a.pdf", 10, 1)).unwrap();
        backend
            .database()
            .with_connection(|conn| {
                conn.execute_batch("DROP TABLE uploaded_files")?;
                Ok(())
            })
            .unwrap();

        let err = store.delete(&file.id).unwrap_err();
        assert!(!matches!(err, AppError::Conflict(_)));
        assert!(store.find(&file.id).is_some());
    }

    #[test]
    fn test_empty_upload_never_reaches_backend() {
        let dir = tempdir().unwrap();
        let (backend, mut store) = setup(dir.path());

        let err = store.upload(&request("a.pdf", 0, 1)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(backend.list_files(None).unwrap().is_empty());
    }
}
