//! Dokumentmetadata per år

use std::collections::BTreeMap;
use std::sync::Arc;

use super::editing::{drops_local, stale_to_conflict};
use super::request_guard::{RequestGuard, RequestToken};
use super::year_store::YearScoped;
use crate::api::GcgBackend;
use crate::models::{DocumentMetadata, DocumentUpdate, DocumentYearStats};
use crate::utils::{AppError, AppResult};

pub struct DocumentStore {
    backend: Arc<dyn GcgBackend>,
    documents: Vec<DocumentMetadata>,
    guard: RequestGuard<String>,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn GcgBackend>) -> Self {
        Self {
            backend,
            documents: Vec::new(),
            guard: RequestGuard::new(),
        }
    }

    pub fn load(&mut self, year: i32) -> AppResult<()> {
        let documents = self.backend.list_documents(Some(year))?;
        self.documents.retain(|d| d.year != year);
        self.documents.extend(documents);
        Ok(())
    }

    pub fn for_year(&self, year: i32) -> Vec<&DocumentMetadata> {
        self.documents.iter().filter(|d| d.year == year).collect()
    }

    pub fn find(&self, id: &str) -> Option<&DocumentMetadata> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn by_aspect(&self, year: i32, aspect: &str) -> Vec<&DocumentMetadata> {
        self.documents
            .iter()
            .filter(|d| d.year == year && d.aspect.as_deref() == Some(aspect))
            .collect()
    }

    pub fn by_direktorat(&self, year: i32, direktorat: &str) -> Vec<&DocumentMetadata> {
        self.documents
            .iter()
            .filter(|d| d.year == year && d.direktorat == direktorat)
            .collect()
    }

    pub fn create(&mut self, doc: &DocumentMetadata) -> AppResult<DocumentMetadata> {
        if doc.title.trim().is_empty() {
            return Err(AppError::validation("Titel måste anges"));
        }
        if doc.file_name.trim().is_empty() {
            return Err(AppError::validation("Filnamn måste anges"));
        }

        let created = self.backend.create_document(doc)?;
        self.documents.push(created.clone());
        Ok(created)
    }

    pub fn begin_update(&mut self, id: &str) -> RequestToken<String> {
        self.guard.begin(id.to_string())
    }

    /// Tillämpa ett uppdateringssvar. `Ok(false)` betyder att svaret var inaktuellt.
    pub fn apply_update(
        &mut self,
        token: &RequestToken<String>,
        result: AppResult<DocumentMetadata>,
    ) -> AppResult<bool> {
        let id = token.key().clone();
        if !self.guard.complete(token) {
            return Ok(false);
        }

        match result {
            Ok(updated) => {
                if let Some(existing) = self.documents.iter_mut().find(|d| d.id == id) {
                    *existing = updated;
                }
                Ok(true)
            }
            Err(e) => {
                if e.is_not_found() {
                    self.documents.retain(|d| d.id != id);
                }
                Err(stale_to_conflict(e, &format!("Dokument {}", id)))
            }
        }
    }

    pub fn update(&mut self, id: &str, update: &DocumentUpdate) -> AppResult<DocumentMetadata> {
        let mut doc = self
            .find(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Dokument {}", id)))?;
        update.apply(&mut doc);

        let token = self.begin_update(id);
        let result = self.backend.update_document(&doc);
        let returned = result.as_ref().ok().cloned();
        self.apply_update(&token, result)?;

        returned.ok_or_else(|| AppError::other("Uppdatering gav inget resultat"))
    }

    pub fn delete(&mut self, id: &str) -> AppResult<()> {
        let result = self.backend.delete_document(id);
        if drops_local(&result) {
            self.documents.retain(|d| d.id != id);
        }
        result.map_err(|e| stale_to_conflict(e, &format!("Dokument {}", id)))
    }

    pub fn stats(&self, year: i32) -> DocumentYearStats {
        let docs = self.for_year(year);
        let mut by_direktorat = BTreeMap::new();
        for doc in &docs {
            *by_direktorat.entry(doc.direktorat.clone()).or_insert(0) += 1;
        }

        DocumentYearStats {
            total_documents: docs.len(),
            total_size: docs.iter().map(|d| d.file_size).sum(),
            by_direktorat,
        }
    }
}

impl YearScoped for DocumentStore {
    fn purge_year(&mut self, year: i32) -> usize {
        let before = self.documents.len();
        self.documents.retain(|d| d.year != year);
        before - self.documents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::LocalBackend;
    use tempfile::tempdir;

    fn setup(dir: &std::path::Path) -> (Arc<dyn GcgBackend>, DocumentStore) {
        let backend: Arc<dyn GcgBackend> =
            Arc::new(LocalBackend::in_memory(dir.join("docs")).unwrap());
        let store = DocumentStore::new(Arc::clone(&backend));
        (backend, store)
    }

    fn doc(title: &str, direktorat: &str, size: i64) -> DocumentMetadata {
        let mut doc = DocumentMetadata::new(title, format!("{}.pdf", title), 2024);
        doc.direktorat = direktorat.into();
        doc.file_size = size;
        doc.aspect = Some("Direksi".into());
        doc
    }

    #[test]
    fn test_stats_by_direktorat() {
        let dir = tempdir().unwrap();
        let (_, mut store) = setup(dir.path());

        store.create(&doc("A", "Direktorat Keuangan", 100)).unwrap();
        store.create(&doc("B", "Direktorat Keuangan", 50)).unwrap();
        store.create(&doc("C", "Direktorat Utama", 25)).unwrap();

        let stats = store.stats(2024);
        assert_eq!(stats.total_documents, 3);
        assert_eq!(stats.total_size, 175);
        assert_eq!(stats.by_direktorat.get("Direktorat Keuangan"), Some(&2));
        assert_eq!(stats.by_direktorat.get("Direktorat Utama"), Some(&1));

        assert_eq!(store.by_aspect(2024, "Direksi").len(), 3);
        assert_eq!(store.by_direktorat(2024, "Direktorat Utama").len(), 1);
    }

    #[test]
    fn test_update_and_conflict() {
        let dir = tempdir().unwrap();
        let (backend, mut store) = setup(dir.path());

        let created = store.create(&doc("A", "Direktorat Utama", 1)).unwrap();
        assert!(!created.id.is_empty());

        let update = DocumentUpdate {
            status: Some("archived".into()),
            ..Default::default()
        };
        let updated = store.update(&created.id, &update).unwrap();
        assert_eq!(updated.status, "archived");
        assert_eq!(store.find(&created.id).unwrap().status, "archived");

        backend.delete_document(&created.id).unwrap();
        let err = store.update(&created.id, &update).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(store.find(&created.id).is_none());
    }

    #[test]
    fn test_purge_year() {
        let dir = tempdir().unwrap();
        let (_, mut store) = setup(dir.path());

        store.create(&doc("A", "Direktorat Utama", 1)).unwrap();
        assert_eq!(store.purge_year(2024), 1);
        assert_eq!(store.stats(2024).total_documents, 0);
    }
}
