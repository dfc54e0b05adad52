//! Area of Improvement per år: tabeller, rekommendationer, uppföljning och bevis

use std::sync::Arc;

use super::editing::{drops_local, stale_to_conflict};
use super::request_guard::{RequestGuard, RequestToken};
use super::year_store::YearScoped;
use crate::api::GcgBackend;
use crate::models::{AoiDocument, AoiRecommendation, AoiTable, AoiTracking, AoiUploadRequest};
use crate::utils::{AppError, AppResult};

pub struct AoiStore {
    backend: Arc<dyn GcgBackend>,
    tables: Vec<AoiTable>,
    recommendations: Vec<AoiRecommendation>,
    tracking: Vec<AoiTracking>,
    documents: Vec<AoiDocument>,
    guard: RequestGuard<i64>,
}

impl AoiStore {
    pub fn new(backend: Arc<dyn GcgBackend>) -> Self {
        Self {
            backend,
            tables: Vec::new(),
            recommendations: Vec::new(),
            tracking: Vec::new(),
            documents: Vec::new(),
            guard: RequestGuard::new(),
        }
    }

    pub fn load(&mut self, year: i32) -> AppResult<()> {
        let tables = self.backend.list_aoi_tables(Some(year))?;
        let recommendations = self.backend.list_aoi_recommendations(Some(year))?;
        let tracking = self.backend.list_aoi_tracking(Some(year))?;
        let documents = self.backend.list_aoi_documents(Some(year))?;

        self.purge_year(year);
        self.tables.extend(tables);
        self.recommendations.extend(recommendations);
        self.tracking.extend(tracking);
        self.documents.extend(documents);
        Ok(())
    }

    // ── Läsning ────────────────────────────────────────────────────

    pub fn tables(&self, year: i32) -> Vec<&AoiTable> {
        self.tables.iter().filter(|t| t.year == year).collect()
    }

    pub fn table(&self, id: i64) -> Option<&AoiTable> {
        self.tables.iter().find(|t| t.id == Some(id))
    }

    /// Tabellens rader i nummerordning
    pub fn recommendations(&self, table_id: i64) -> Vec<&AoiRecommendation> {
        let mut recs: Vec<_> = self
            .recommendations
            .iter()
            .filter(|r| r.table_id == table_id)
            .collect();
        recs.sort_by_key(|r| r.no);
        recs
    }

    pub fn recommendation(&self, id: i64) -> Option<&AoiRecommendation> {
        self.recommendations.iter().find(|r| r.id == Some(id))
    }

    pub fn tracking_for(&self, recommendation_id: i64) -> Option<&AoiTracking> {
        self.tracking
            .iter()
            .find(|t| t.recommendation_id == recommendation_id)
    }

    pub fn documents_for(&self, recommendation_id: i64) -> Vec<&AoiDocument> {
        self.documents
            .iter()
            .filter(|d| d.recommendation_id == recommendation_id)
            .collect()
    }

    /// (helt uppföljda, totalt) för årets rekommendationer
    pub fn completion(&self, year: i32) -> (usize, usize) {
        let ids: Vec<i64> = self
            .recommendations
            .iter()
            .filter(|r| r.year == year)
            .filter_map(|r| r.id)
            .collect();
        let complete = ids
            .iter()
            .filter(|id| self.tracking_for(**id).is_some_and(|t| t.is_complete()))
            .count();
        (complete, ids.len())
    }

    // ── Tabeller ───────────────────────────────────────────────────

    pub fn create_table(&mut self, table: &AoiTable) -> AppResult<AoiTable> {
        let created = self.backend.create_aoi_table(table)?;
        self.tables.push(created.clone());
        Ok(created)
    }

    pub fn update_table(&mut self, table: &AoiTable) -> AppResult<AoiTable> {
        let id = table
            .id
            .ok_or_else(|| AppError::validation("AOI-tabellen saknar id"))?;

        match self.backend.update_aoi_table(table) {
            Ok(updated) => {
                if let Some(existing) = self.tables.iter_mut().find(|t| t.id == Some(id)) {
                    *existing = updated.clone();
                }
                Ok(updated)
            }
            Err(e) => {
                if e.is_not_found() {
                    self.drop_table_locally(id);
                }
                Err(stale_to_conflict(e, &format!("AOI-tabell {}", id)))
            }
        }
    }

    pub fn delete_table(&mut self, id: i64) -> AppResult<()> {
        let result = self.backend.delete_aoi_table(id);
        if drops_local(&result) {
            self.drop_table_locally(id);
        }
        result.map_err(|e| stale_to_conflict(e, &format!("AOI-tabell {}", id)))
    }

    fn drop_table_locally(&mut self, id: i64) {
        let rec_ids: Vec<i64> = self
            .recommendations
            .iter()
            .filter(|r| r.table_id == id)
            .filter_map(|r| r.id)
            .collect();
        for rec_id in rec_ids {
            self.drop_recommendation_locally(rec_id);
        }
        self.tables.retain(|t| t.id != Some(id));
    }

    // ── Rekommendationer ───────────────────────────────────────────

    pub fn create_recommendation(&mut self, rec: &AoiRecommendation) -> AppResult<AoiRecommendation> {
        let created = self.backend.create_aoi_recommendation(rec)?;
        if let Some(id) = created.id {
            let mut tracking = AoiTracking::new(id);
            tracking.updated_by = created.created_by.clone();
            self.tracking.push(tracking);
        }
        self.recommendations.push(created.clone());
        Ok(created)
    }

    pub fn begin_update(&mut self, id: i64) -> RequestToken<i64> {
        self.guard.begin(id)
    }

    /// `Ok(false)` betyder att svaret var inaktuellt
    pub fn apply_update(
        &mut self,
        token: &RequestToken<i64>,
        result: AppResult<AoiRecommendation>,
    ) -> AppResult<bool> {
        let id = *token.key();
        if !self.guard.complete(token) {
            return Ok(false);
        }

        match result {
            Ok(updated) => {
                if let Some(existing) = self.recommendations.iter_mut().find(|r| r.id == Some(id)) {
                    *existing = updated;
                }
                Ok(true)
            }
            Err(e) => {
                if e.is_not_found() {
                    self.drop_recommendation_locally(id);
                }
                Err(stale_to_conflict(e, &format!("AOI-rekommendation {}", id)))
            }
        }
    }

    pub fn update_recommendation(&mut self, rec: &AoiRecommendation) -> AppResult<AoiRecommendation> {
        let id = rec
            .id
            .ok_or_else(|| AppError::validation("Rekommendationen saknar id"))?;

        let token = self.begin_update(id);
        let result = self.backend.update_aoi_recommendation(rec);
        let returned = result.as_ref().ok().cloned();
        self.apply_update(&token, result)?;

        returned.ok_or_else(|| AppError::other("Uppdatering gav inget resultat"))
    }

    pub fn delete_recommendation(&mut self, id: i64) -> AppResult<()> {
        let result = self.backend.delete_aoi_recommendation(id);
        if drops_local(&result) {
            self.drop_recommendation_locally(id);
        }
        result.map_err(|e| stale_to_conflict(e, &format!("AOI-rekommendation {}", id)))
    }

    fn drop_recommendation_locally(&mut self, id: i64) {
        self.recommendations.retain(|r| r.id != Some(id));
        self.tracking.retain(|t| t.recommendation_id != id);
        self.documents.retain(|d| d.recommendation_id != id);
    }

    // ── Uppföljning och bevis ──────────────────────────────────────

    pub fn update_tracking(&mut self, tracking: &AoiTracking) -> AppResult<AoiTracking> {
        let id = tracking.recommendation_id;
        match self.backend.update_aoi_tracking(tracking) {
            Ok(updated) => {
                self.tracking.retain(|t| t.recommendation_id != id);
                self.tracking.push(updated.clone());
                Ok(updated)
            }
            Err(e) => {
                if e.is_not_found() {
                    self.drop_recommendation_locally(id);
                }
                Err(stale_to_conflict(e, &format!("AOI-rekommendation {}", id)))
            }
        }
    }

    pub fn upload(&mut self, request: &AoiUploadRequest) -> AppResult<AoiDocument> {
        let doc = self.backend.upload_aoi_document(request)?;
        self.documents
            .retain(|d| d.recommendation_id != request.recommendation_id);
        self.documents.push(doc.clone());
        Ok(doc)
    }

    pub fn delete_document(&mut self, id: &str) -> AppResult<()> {
        let result = self.backend.delete_aoi_document(id);
        if drops_local(&result) {
            self.documents.retain(|d| d.id != id);
        }
        result.map_err(|e| stale_to_conflict(e, &format!("AOI-dokument {}", id)))
    }

    /// Glöm årets bevis, tabellerna behålls
    pub fn purge_documents(&mut self, year: i32) -> usize {
        let before = self.documents.len();
        self.documents.retain(|d| d.year != year);
        before - self.documents.len()
    }
}

impl YearScoped for AoiStore {
    fn purge_year(&mut self, year: i32) -> usize {
        let before = self.tables.len() + self.recommendations.len() + self.tracking.len();
        let rec_ids: Vec<i64> = self
            .recommendations
            .iter()
            .filter(|r| r.year == year)
            .filter_map(|r| r.id)
            .collect();

        self.tables.retain(|t| t.year != year);
        self.recommendations.retain(|r| r.year != year);
        self.tracking.retain(|t| !rec_ids.contains(&t.recommendation_id));
        let after = self.tables.len() + self.recommendations.len() + self.tracking.len();

        before - after + self.purge_documents(year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::LocalBackend;
    use crate::models::{AoiKind, AoiTargetType};
    use tempfile::tempdir;

    fn setup(dir: &std::path::Path) -> (Arc<dyn GcgBackend>, AoiStore) {
        let backend: Arc<dyn GcgBackend> =
            Arc::new(LocalBackend::in_memory(dir.join("docs")).unwrap());
        let store = AoiStore::new(Arc::clone(&backend));
        (backend, store)
    }

    fn table(store: &mut AoiStore, year: i32) -> i64 {
        let mut table = AoiTable::new("AOI Komisaris", year, AoiTargetType::Direktorat);
        table.target_direktorat = Some("Direktorat Utama".into());
        store.create_table(&table).unwrap().id.unwrap()
    }

    fn rec(store: &mut AoiStore, table_id: i64, text: &str) -> i64 {
        store
            .create_recommendation(&AoiRecommendation::new(table_id, AoiKind::Rekomendasi, text, 2024))
            .unwrap()
            .id
            .unwrap()
    }

    #[test]
    fn test_load_and_completion() {
        let dir = tempdir().unwrap();
        let (backend, mut store) = setup(dir.path());
        let table_id = table(&mut store, 2024);
        let first = rec(&mut store, table_id, "A");
        rec(&mut store, table_id, "B");

        let mut done = AoiTracking::new(first);
        done.rups = true;
        done.board_of_commissioners = true;
        done.commissioners_secretariat = true;
        done.committee = true;
        done.board_of_directors = true;
        done.corporate_secretary = true;
        backend.update_aoi_tracking(&done).unwrap();

        let mut fresh = AoiStore::new(backend);
        fresh.load(2024).unwrap();
        assert_eq!(fresh.tables(2024).len(), 1);
        let nos: Vec<i32> = fresh.recommendations(table_id).iter().map(|r| r.no).collect();
        assert_eq!(nos, vec![1, 2]);
        assert_eq!(fresh.completion(2024), (1, 2));
        assert!(fresh.tracking_for(first).unwrap().is_complete());
    }

    #[test]
    fn test_stale_recommendation_update_is_conflict() {
        let dir = tempdir().unwrap();
        let (backend, mut store) = setup(dir.path());
        let table_id = table(&mut store, 2024);
        let id = rec(&mut store, table_id, "A");

        let mut edited = store.recommendation(id).unwrap().clone();
        edited.urgency = 5;
        assert_eq!(store.update_recommendation(&edited).unwrap().urgency, 5);

        backend.delete_aoi_recommendation(id).unwrap();
        let err = store.update_recommendation(&edited).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(store.recommendation(id).is_none());
        assert!(store.tracking_for(id).is_none());
    }

    #[test]
    fn test_superseded_update_is_ignored() {
        let dir = tempdir().unwrap();
        let (backend, mut store) = setup(dir.path());
        let table_id = table(&mut store, 2024);
        let id = rec(&mut store, table_id, "A");

        let mut older = store.recommendation(id).unwrap().clone();
        older.timeframe = "Q1".into();
        let mut newer = older.clone();
        newer.timeframe = "Q2".into();

        let first = store.begin_update(id);
        let second = store.begin_update(id);
        let newer_result = backend.update_aoi_recommendation(&newer);
        let older_result = backend.update_aoi_recommendation(&older);
        assert!(store.apply_update(&second, newer_result).unwrap());
        assert!(!store.apply_update(&first, older_result).unwrap());
        assert_eq!(store.recommendation(id).unwrap().timeframe, "Q2");
    }

    #[test]
    fn test_delete_table_drops_everything_below_it() {
        let dir = tempdir().unwrap();
        let (_, mut store) = setup(dir.path());
        let table_id = table(&mut store, 2024);
        let id = rec(&mut store, table_id, "A");
        store
            .upload(&AoiUploadRequest::new("bukti.pdf", b"x".to_vec(), id))
            .unwrap();
        assert_eq!(store.documents_for(id).len(), 1);

        store.delete_table(table_id).unwrap();
        assert!(store.table(table_id).is_none());
        assert!(store.recommendation(id).is_none());
        assert!(store.documents_for(id).is_empty());

        // Redan borttagen på servern: lokalt borta, felet blir en konflikt
        assert!(matches!(store.delete_table(table_id), Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_upload_keeps_one_document_per_recommendation() {
        let dir = tempdir().unwrap();
        let (_, mut store) = setup(dir.path());
        let table_id = table(&mut store, 2024);
        let id = rec(&mut store, table_id, "A");

        store
            .upload(&AoiUploadRequest::new("v1.pdf", b"1".to_vec(), id))
            .unwrap();
        let second = store
            .upload(&AoiUploadRequest::new("v2.pdf", b"2".to_vec(), id))
            .unwrap();
        let docs = store.documents_for(id);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, second.id);

        store.delete_document(&second.id).unwrap();
        assert!(store.documents_for(id).is_empty());
    }

    #[test]
    fn test_purge_year() {
        let dir = tempdir().unwrap();
        let (_, mut store) = setup(dir.path());
        let table_id = table(&mut store, 2024);
        let other = table(&mut store, 2023);
        rec(&mut store, table_id, "A");

        // tabell, rekommendation och uppföljning
        assert_eq!(store.purge_year(2024), 3);
        assert!(store.tables(2024).is_empty());
        assert!(store.table(other).is_some());
    }
}
