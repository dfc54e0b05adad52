//! `GcgHub`: äger lagren, samordnar åtgärder som berör flera lager och
//! sänder händelser till prenumeranter.

use std::sync::Arc;

use tracing::{info, warn};

use super::aoi_store::AoiStore;
use super::assessment_sheet::AssessmentSheet;
use super::assignment_store::AssignmentStore;
use super::checklist_store::ChecklistStore;
use super::document_store::DocumentStore;
use super::editing::drops_local;
use super::events::{EventBus, HubEvent, SubscriptionId};
use super::file_store::FileStore;
use super::progress::YearProgress;
use super::structure_store::StructureStore;
use super::year_store::{YearScoped, YearStore};
use crate::api::GcgBackend;
use crate::models::{
    AoiDocument, AoiRecommendation, AoiTable, AoiTracking, AoiUploadRequest, Assignment,
    ChecklistItem, FiscalYear, OrgUnit, UnitType, UploadRequest, UploadedFile, YearCleanupStats,
};
use crate::utils::{AppError, AppResult};

/// Resultat av att ta bort ett år
#[derive(Debug, Clone, PartialEq)]
pub struct YearRemoval {
    pub year: i32,
    /// Rader som rensades ur de lokala lagren
    pub local_rows_removed: usize,
    pub cleanup_stats: Option<YearCleanupStats>,
    /// Fel från backend; den lokala rensningen har ändå gjorts
    pub backend_error: Option<String>,
}

impl YearRemoval {
    pub fn backend_ok(&self) -> bool {
        self.backend_error.is_none()
    }
}

pub struct GcgHub {
    backend: Arc<dyn GcgBackend>,
    years: YearStore,
    structure: StructureStore,
    checklist: ChecklistStore,
    assignments: AssignmentStore,
    files: FileStore,
    documents: DocumentStore,
    aoi: AoiStore,
    assessment: Option<AssessmentSheet>,
    events: EventBus,
}

impl GcgHub {
    pub fn new(backend: Arc<dyn GcgBackend>) -> Self {
        Self {
            years: YearStore::new(Arc::clone(&backend)),
            structure: StructureStore::new(Arc::clone(&backend)),
            checklist: ChecklistStore::new(Arc::clone(&backend)),
            assignments: AssignmentStore::new(Arc::clone(&backend)),
            files: FileStore::new(Arc::clone(&backend)),
            documents: DocumentStore::new(Arc::clone(&backend)),
            aoi: AoiStore::new(Arc::clone(&backend)),
            assessment: None,
            events: EventBus::new(),
            backend,
        }
    }

    pub fn backend(&self) -> &Arc<dyn GcgBackend> {
        &self.backend
    }

    // ── Lagren ─────────────────────────────────────────────────────

    pub fn years(&self) -> &YearStore {
        &self.years
    }

    pub fn structure(&self) -> &StructureStore {
        &self.structure
    }

    pub fn structure_mut(&mut self) -> &mut StructureStore {
        &mut self.structure
    }

    pub fn checklist(&self) -> &ChecklistStore {
        &self.checklist
    }

    pub fn checklist_mut(&mut self) -> &mut ChecklistStore {
        &mut self.checklist
    }

    pub fn assignments(&self) -> &AssignmentStore {
        &self.assignments
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut DocumentStore {
        &mut self.documents
    }

    pub fn aoi(&self) -> &AoiStore {
        &self.aoi
    }

    pub fn aoi_mut(&mut self) -> &mut AoiStore {
        &mut self.aoi
    }

    pub fn assessment(&self) -> Option<&AssessmentSheet> {
        self.assessment.as_ref()
    }

    pub fn assessment_mut(&mut self) -> Option<&mut AssessmentSheet> {
        self.assessment.as_mut()
    }

    // ── Händelser ──────────────────────────────────────────────────

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&HubEvent) + Send + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ── Laddning ───────────────────────────────────────────────────

    /// Ladda år och data för det valda året
    pub fn load(&mut self) -> AppResult<()> {
        self.years.load()?;
        if let Some(year) = self.years.selected() {
            self.load_year(year)?;
        }
        Ok(())
    }

    pub fn load_year(&mut self, year: i32) -> AppResult<()> {
        self.structure.load(year)?;
        self.checklist.load(year)?;
        self.assignments.load(year)?;
        self.files.load(year)?;
        self.documents.load(year)?;
        self.aoi.load(year)?;
        Ok(())
    }

    pub fn selected_year(&self) -> Option<i32> {
        self.years.selected()
    }

    pub fn select_year(&mut self, year: i32) -> AppResult<()> {
        self.years.select(year)?;
        self.load_year(year)
    }

    fn require_selected(&self) -> AppResult<i32> {
        self.years
            .selected()
            .ok_or_else(|| AppError::validation("Inget tahun buku valt"))
    }

    // ── År ─────────────────────────────────────────────────────────

    /// Rensa alla lokala rader för året ur samtliga lager
    fn purge_local(&mut self, year: i32) -> usize {
        let mut removed = self.structure.purge_year(year)
            + self.checklist.purge_year(year)
            + self.assignments.purge_year(year)
            + self.files.purge_year(year)
            + self.documents.purge_year(year)
            + self.aoi.purge_year(year);

        if let Some(sheet) = self.assessment.as_mut() {
            removed += sheet.purge_year(year);
        }
        if self.assessment.as_ref().is_some_and(|s| s.year() == year) {
            self.assessment = None;
        }
        removed
    }

    /// Skapa ett nytt år. Gamla lokala rester för året rensas först.
    pub fn add_year(&mut self, year: i32, seed_structure: bool) -> AppResult<FiscalYear> {
        self.years.validate_new(year)?;

        let leftovers = self.purge_local(year);
        if leftovers > 0 {
            warn!("{} gamla lokala rader för {} rensade", leftovers, year);
        }

        let created = self.years.add(year)?;
        self.checklist.load(year)?;

        if seed_structure {
            self.structure.seed_default(year)?;
            self.events.emit(&HubEvent::StructureUpdated { year: Some(year) });
        }

        self.events.emit(&HubEvent::YearCreatedFresh { year });
        Ok(created)
    }

    /// Ta bort ett år. Lokala lager rensas även om backend-anropet misslyckas.
    pub fn remove_year(&mut self, year: i32) -> AppResult<YearRemoval> {
        if !self.years.contains(year) {
            return Err(AppError::not_found(format!("Tahun buku {}", year)));
        }

        let result = self.years.remove(year);
        let local_rows_removed = self.purge_local(year);
        let (cleanup_stats, backend_error) = match result {
            Ok(deletion) => (Some(deletion.cleanup_stats), None),
            Err(e) => {
                warn!("Tahun buku {} rensat lokalt men inte i backend: {}", year, e);
                (None, Some(e.to_string()))
            }
        };

        self.events.emit(&HubEvent::YearDataCleaned {
            year,
            cleanup_stats: cleanup_stats.clone(),
            backend_ok: backend_error.is_none(),
        });
        self.events.emit(&HubEvent::YearRemoved { year });

        if let Some(selected) = self.years.selected() {
            if let Err(e) = self.load_year(selected) {
                warn!("Kunde inte ladda {} efter borttagning: {}", selected, e);
            }
        }

        info!("Tahun buku {} borttaget ({} lokala rader)", year, local_rows_removed);
        Ok(YearRemoval {
            year,
            local_rows_removed,
            cleanup_stats,
            backend_error,
        })
    }

    /// Ta bort årets uppladdade filer och dokument
    pub fn clear_year_documents(&mut self, year: i32) -> AppResult<YearCleanupStats> {
        let stats = self.backend.delete_year_data(year)?;
        self.files.purge_year(year);
        self.documents.purge_year(year);
        self.aoi.purge_documents(year);

        self.events.emit(&HubEvent::UploadedFilesChanged { year });
        self.events.emit(&HubEvent::AoiUpdated { year });
        Ok(stats)
    }

    /// Ta bort all data för året men behåll året
    pub fn bulk_delete(&mut self, year: i32) -> AppResult<YearCleanupStats> {
        let stats = self.backend.bulk_delete(year)?;
        self.purge_local(year);

        self.events.emit(&HubEvent::YearDataCleaned {
            year,
            cleanup_stats: Some(stats.clone()),
            backend_ok: true,
        });
        Ok(stats)
    }

    // ── Struktur och checklista ────────────────────────────────────

    pub fn create_unit(&mut self, unit: &OrgUnit) -> AppResult<OrgUnit> {
        let created = self.structure.create(unit)?;
        self.events.emit(&HubEvent::StructureUpdated {
            year: Some(created.year),
        });
        Ok(created)
    }

    pub fn delete_unit(&mut self, id: i64) -> AppResult<()> {
        let year = self.structure.find(id).map(|u| u.year);
        let result = self.structure.delete(id);
        self.events.emit(&HubEvent::StructureUpdated { year });
        result
    }

    pub fn create_checklist_item(&mut self, item: &ChecklistItem) -> AppResult<ChecklistItem> {
        let created = self.checklist.create(item)?;
        self.events
            .emit(&HubEvent::ChecklistUpdated { year: created.year });
        Ok(created)
    }

    /// Ta bort checklistobjektet och dess lokala tilldelning
    pub fn delete_checklist_item(&mut self, id: i64) -> AppResult<()> {
        let year = self.checklist.find(id).map(|i| i.year);
        let result = self.checklist.delete(id);

        if let Some(year) = year {
            if self.assignments.find(id, year).is_some() {
                if let Err(e) = self.assignments.unassign(id, year) {
                    warn!("Tilldelning för {} kunde inte tas bort: {}", id, e);
                }
                self.events.emit(&HubEvent::AssignmentsUpdated { year });
            }
            self.events.emit(&HubEvent::ChecklistUpdated { year });
        }
        result
    }

    // ── Tilldelningar ──────────────────────────────────────────────

    /// Tilldela ett checklistobjekt till en enhet. Objektets ansvariga enhet
    /// uppdateras i samma steg.
    pub fn assign(&mut self, checklist_id: i64, unit_name: &str, unit_type: UnitType) -> AppResult<Assignment> {
        let item = self
            .checklist
            .find(checklist_id)
            .ok_or_else(|| AppError::not_found(format!("Checklistobjekt {}", checklist_id)))?;

        let mut assignment = Assignment::new(checklist_id, item.year, unit_name, unit_type);
        assignment.aspect = Some(item.aspect.clone());

        let created = self.assignments.assign(&assignment)?;
        self.checklist
            .set_assigned_unit_local(checklist_id, Some(created.unit_name.clone()));

        self.events.emit(&HubEvent::AssignmentsUpdated { year: created.year });
        self.events.emit(&HubEvent::ChecklistUpdated { year: created.year });
        Ok(created)
    }

    pub fn unassign(&mut self, checklist_id: i64, year: i32) -> AppResult<()> {
        let result = self.assignments.unassign(checklist_id, year);
        if drops_local(&result) {
            self.checklist.set_assigned_unit_local(checklist_id, None);
        }

        self.events.emit(&HubEvent::AssignmentsUpdated { year });
        self.events.emit(&HubEvent::ChecklistUpdated { year });
        result
    }

    // ── Filer ──────────────────────────────────────────────────────

    pub fn upload(&mut self, request: &UploadRequest) -> AppResult<UploadedFile> {
        let file = self.files.upload(request)?;

        self.events.emit(&HubEvent::FileUploaded { file: file.clone() });
        self.events
            .emit(&HubEvent::UploadedFilesChanged { year: file.year });
        Ok(file)
    }

    pub fn delete_file(&mut self, id: &str) -> AppResult<()> {
        let year = self.files.find(id).map(|f| f.year);
        let result = self.files.delete(id);

        if let Some(year) = year {
            self.events.emit(&HubEvent::UploadedFilesChanged { year });
        }
        result
    }

    // ── AOI ────────────────────────────────────────────────────────

    pub fn create_aoi_table(&mut self, table: &AoiTable) -> AppResult<AoiTable> {
        let created = self.aoi.create_table(table)?;
        self.events.emit(&HubEvent::AoiUpdated { year: created.year });
        Ok(created)
    }

    pub fn delete_aoi_table(&mut self, id: i64) -> AppResult<()> {
        let year = self.aoi.table(id).map(|t| t.year);
        let result = self.aoi.delete_table(id);
        if let Some(year) = year {
            self.events.emit(&HubEvent::AoiUpdated { year });
        }
        result
    }

    pub fn create_aoi_recommendation(&mut self, rec: &AoiRecommendation) -> AppResult<AoiRecommendation> {
        let created = self.aoi.create_recommendation(rec)?;
        self.events.emit(&HubEvent::AoiUpdated { year: created.year });
        Ok(created)
    }

    pub fn update_aoi_tracking(&mut self, tracking: &AoiTracking) -> AppResult<AoiTracking> {
        let year = self
            .aoi
            .recommendation(tracking.recommendation_id)
            .map(|r| r.year);
        let updated = self.aoi.update_tracking(tracking)?;
        if let Some(year) = year {
            self.events.emit(&HubEvent::AoiUpdated { year });
        }
        Ok(updated)
    }

    pub fn upload_aoi_document(&mut self, request: &AoiUploadRequest) -> AppResult<AoiDocument> {
        let doc = self.aoi.upload(request)?;
        self.events.emit(&HubEvent::AoiUpdated { year: doc.year });
        Ok(doc)
    }

    pub fn progress(&self, year: i32) -> YearProgress {
        YearProgress::compute(
            year,
            &self.checklist.items(year),
            &self.files.files_for_year(year),
        )
    }

    // ── Bedömning ──────────────────────────────────────────────────

    /// Öppna bedömningsbladet för det valda året.
    ///
    /// Finns sparade rader gäller deras bedömare och typ; `assessor` används
    /// bara för ett tomt blad. Se [`AssessmentSheet::assessor`] för vem som gäller.
    pub fn open_assessment(&mut self, assessor: &str) -> AppResult<&mut AssessmentSheet> {
        let year = self.require_selected()?;
        let sheet = AssessmentSheet::load(self.backend.as_ref(), year, assessor)?;
        Ok(self.assessment.insert(sheet))
    }

    pub fn save_assessment(&mut self) -> AppResult<usize> {
        let sheet = self
            .assessment
            .as_ref()
            .ok_or_else(|| AppError::validation("Ingen bedömning öppen"))?;

        let rows = sheet.save(self.backend.as_ref())?;
        self.events.emit(&HubEvent::AssessmentSaved {
            year: sheet.year(),
            rows,
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::LocalBackend;
    use crate::models::{AoiKind, AoiTargetType, DocumentMetadata, OrgUnitKind, PenilaianRow};
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn hub(dir: &std::path::Path) -> (Arc<LocalBackend>, GcgHub) {
        let backend = Arc::new(LocalBackend::in_memory(dir.join("gcg-documents")).unwrap());
        let hub = GcgHub::new(backend.clone());
        (backend, hub)
    }

    fn record_events(hub: &mut GcgHub) -> Arc<Mutex<Vec<HubEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        hub.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        events
    }

    /// Fyll året med data i alla lager
    fn populate(hub: &mut GcgHub, year: i32) -> i64 {
        hub.create_unit(&OrgUnit::new(OrgUnitKind::Division, "Divisi Treasury", year))
            .unwrap();
        let item = hub
            .create_checklist_item(&ChecklistItem::new("Direksi", "Pedoman Direksi", year))
            .unwrap();
        let id = item.id.unwrap();
        hub.assign(id, "Divisi Treasury", UnitType::Division).unwrap();

        let mut request = UploadRequest::new("pedoman.pdf", b"pdf".to_vec(), year);
        request.checklist_id = Some(id);
        hub.upload(&request).unwrap();

        hub.documents_mut()
            .create(&DocumentMetadata::new("Pedoman", "pedoman.pdf", year))
            .unwrap();

        let mut table = AoiTable::new("AOI Direksi", year, AoiTargetType::Divisi);
        table.target_divisi = Some("Divisi Treasury".into());
        let table_id = hub.create_aoi_table(&table).unwrap().id.unwrap();
        let rec = hub
            .create_aoi_recommendation(&AoiRecommendation::new(
                table_id,
                AoiKind::Rekomendasi,
                "Perbarui pedoman direksi",
                year,
            ))
            .unwrap();
        hub.upload_aoi_document(&AoiUploadRequest::new("bukti.pdf", b"pdf".to_vec(), rec.id.unwrap()))
            .unwrap();
        id
    }

    #[test]
    fn test_add_year_emits_created_fresh() {
        let dir = tempdir().unwrap();
        let (_, mut hub) = hub(dir.path());
        let events = record_events(&mut hub);

        hub.add_year(2024, true).unwrap();
        assert_eq!(hub.selected_year(), Some(2024));
        assert!(!hub.structure().units_for_year(2024).is_empty());
        assert!(!hub.checklist().aspects(2024).is_empty());

        let events = events.lock().unwrap();
        assert!(events.contains(&HubEvent::YearCreatedFresh { year: 2024 }));

        drop(events);
        assert!(matches!(hub.add_year(2024, false), Err(AppError::AlreadyExists(_))));
    }

    #[test]
    fn test_remove_year_cascades() {
        let dir = tempdir().unwrap();
        let (_, mut hub) = hub(dir.path());
        hub.add_year(2023, false).unwrap();
        hub.add_year(2024, false).unwrap();
        populate(&mut hub, 2023);
        populate(&mut hub, 2024);
        let events = record_events(&mut hub);

        let removal = hub.remove_year(2024).unwrap();
        assert!(removal.backend_ok());
        assert!(removal.local_rows_removed > 0);
        assert!(removal.cleanup_stats.unwrap().total() > 0);

        assert!(hub.structure().units_for_year(2024).is_empty());
        assert!(hub.checklist().items(2024).is_empty());
        assert!(hub.assignments().for_year(2024).is_empty());
        assert!(hub.files().files_for_year(2024).is_empty());
        assert!(hub.documents().for_year(2024).is_empty());
        assert!(hub.aoi().tables(2024).is_empty());
        assert_eq!(hub.aoi().completion(2024), (0, 0));
        assert_eq!(hub.selected_year(), Some(2023));
        assert_eq!(hub.checklist().items(2023).len(), 1);
        assert_eq!(hub.aoi().tables(2023).len(), 1);

        let events = events.lock().unwrap();
        assert!(events.contains(&HubEvent::YearRemoved { year: 2024 }));
        assert!(events.iter().any(|e| matches!(
            e,
            HubEvent::YearDataCleaned { year: 2024, backend_ok: true, .. }
        )));
    }

    #[test]
    fn test_remove_year_cleans_locally_when_backend_fails() {
        let dir = tempdir().unwrap();
        let (backend, mut hub) = hub(dir.path());
        hub.add_year(2024, false).unwrap();
        populate(&mut hub, 2024);

        backend
            .database()
            .with_connection(|conn| {
                conn.execute_batch("DROP TABLE years")?;
                Ok(())
            })
            .unwrap();
        let events = record_events(&mut hub);

        let removal = hub.remove_year(2024).unwrap();
        assert!(!removal.backend_ok());
        assert!(removal.cleanup_stats.is_none());

        assert!(!hub.years().contains(2024));
        assert!(hub.structure().units_for_year(2024).is_empty());
        assert!(hub.checklist().items(2024).is_empty());
        assert!(hub.assignments().for_year(2024).is_empty());
        assert!(hub.files().files_for_year(2024).is_empty());
        assert!(hub.documents().for_year(2024).is_empty());
        assert_eq!(hub.selected_year(), None);

        let events = events.lock().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            HubEvent::YearDataCleaned { year: 2024, backend_ok: false, .. }
        )));
    }

    #[test]
    fn test_remove_unknown_year() {
        let dir = tempdir().unwrap();
        let (_, mut hub) = hub(dir.path());
        assert!(hub.remove_year(2030).unwrap_err().is_not_found());
    }

    #[test]
    fn test_assign_updates_checklist_unit() {
        let dir = tempdir().unwrap();
        let (_, mut hub) = hub(dir.path());
        hub.add_year(2024, false).unwrap();
        let id = populate(&mut hub, 2024);

        assert_eq!(
            hub.checklist().find(id).unwrap().assigned_unit.as_deref(),
            Some("Divisi Treasury")
        );

        hub.unassign(id, 2024).unwrap();
        assert!(hub.checklist().find(id).unwrap().assigned_unit.is_none());
        assert!(hub.assignments().find(id, 2024).is_none());
    }

    #[test]
    fn test_cancel_edit_after_assign_keeps_unit() {
        let dir = tempdir().unwrap();
        let (_, mut hub) = hub(dir.path());
        hub.add_year(2024, false).unwrap();
        let id = hub
            .create_checklist_item(&ChecklistItem::new("Direksi", "Pedoman Direksi", 2024))
            .unwrap()
            .id
            .unwrap();
        let index = hub
            .checklist()
            .rows()
            .iter()
            .position(|r| r.value().id == Some(id))
            .unwrap();

        hub.checklist_mut()
            .edit_row(index, |item| item.description = "Utkast".into())
            .unwrap();
        hub.assign(id, "Divisi Treasury", UnitType::Division).unwrap();
        hub.checklist_mut().cancel_row(index).unwrap();

        let item = hub.checklist().find(id).unwrap();
        assert_eq!(item.description, "Pedoman Direksi");
        assert_eq!(item.assigned_unit.as_deref(), Some("Divisi Treasury"));
    }

    #[test]
    fn test_progress_and_clear_documents() {
        let dir = tempdir().unwrap();
        let (_, mut hub) = hub(dir.path());
        hub.add_year(2024, false).unwrap();
        populate(&mut hub, 2024);
        hub.create_checklist_item(&ChecklistItem::new("Direksi", "Laporan", 2024))
            .unwrap();

        let progress = hub.progress(2024);
        assert_eq!(progress.overall.total_items, 2);
        assert_eq!(progress.overall.uploaded_count, 1);
        assert_eq!(progress.overall.percentage, 50);

        let stats = hub.clear_year_documents(2024).unwrap();
        assert_eq!(stats.uploaded_files, 1);
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.aoi, 1);
        assert!(hub.files().files_for_year(2024).is_empty());
        assert_eq!(hub.checklist().items(2024).len(), 2);
        // AOI-tabellen finns kvar, bara beviset är borta
        let table_id = hub.aoi().tables(2024)[0].id.unwrap();
        let rec_id = hub.aoi().recommendations(table_id)[0].id.unwrap();
        assert!(hub.aoi().documents_for(rec_id).is_empty());
        assert_eq!(hub.progress(2024).overall.uploaded_count, 0);
    }

    #[test]
    fn test_assessment_roundtrip_through_hub() {
        let dir = tempdir().unwrap();
        let (_, mut hub) = hub(dir.path());
        assert!(hub.open_assessment("Tim").is_err());

        hub.add_year(2024, false).unwrap();
        let events = record_events(&mut hub);

        let sheet = hub.open_assessment("Tim Penilai").unwrap();
        sheet.add_row(PenilaianRow::new("Direksi", "Rapat", 50.0, 40.0));
        sheet.add_row(PenilaianRow::new("Direksi", "Pelanggaran", -5.0, 2.0));
        assert_eq!(hub.save_assessment().unwrap(), 2);

        let reopened = hub.open_assessment("Lain").unwrap();
        assert_eq!(reopened.assessor(), "Tim Penilai");
        assert_eq!(reopened.rows().len(), 2);
        assert_eq!(reopened.aspect_summaries()[0].achievement, 81);

        let events = events.lock().unwrap();
        assert!(events.contains(&HubEvent::AssessmentSaved { year: 2024, rows: 2 }));
    }
}
