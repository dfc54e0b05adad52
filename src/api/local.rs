//! Lokal backend: SQLite + dokumentkatalog på disk
//!
//! Filer lagras som `{år}/{enhet}/{checklist_id}/{filnamn}` under
//! dokumentkatalogen. AOI-bevis ligger i `{år}/AOI/{tabell}/{rekommendation}/{filnamn}`
//! och räknas därför inte av filskanningen.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::GcgBackend;
use crate::db::year_repo::PurgeScope;
use crate::db::Database;
use crate::models::{
    AoiDocument, AoiRecommendation, AoiTable, AoiTracking, AoiUploadRequest, AppSettings, Aspect,
    AspectSummary, AssessmentSubmission, Assignment, ChecklistItem, DocumentMetadata, FiscalYear,
    LoginSession, OrgUnit, OrgUnitUpdate, PenilaianRow, StoredIndicator, UploadRequest,
    UploadedFile, User, YearCleanupStats, YearDeletion, UNASSIGNED_ASPECT,
};
use crate::services::scoring;
use crate::utils::date::is_valid_fiscal_year;
use crate::utils::file_ops;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::path::{sanitize_filename, unit_dir_name};
use crate::utils::{AppError, AppResult};

/// Katalognamn för uppladdningar som inte hör till ett checklistobjekt
const GENERAL_DIR: &str = "umum";

const AOI_DIR: &str = "AOI";

pub struct LocalBackend {
    db: Database,
    documents_dir: PathBuf,
}

impl LocalBackend {
    pub fn new(db: Database, documents_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            documents_dir: documents_dir.into(),
        }
    }

    /// Öppna databas och dokumentkatalog enligt inställningarna
    pub fn open(settings: &AppSettings) -> anyhow::Result<Self> {
        let db = Database::open(&settings.database_path)?;
        db.migrate()?;

        let documents_dir = settings.documents_directory();
        std::fs::create_dir_all(&documents_dir)?;

        info!("Backend öppnad: {:?}", settings.database_path);
        Ok(Self::new(db, documents_dir))
    }

    /// In-memory databas med dokument i en given katalog (för tester)
    pub fn in_memory(documents_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        Ok(Self::new(Database::open_in_memory()?, documents_dir))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    fn relative_upload_path(request: &UploadRequest) -> String {
        let unit = unit_dir_name(request.unit.as_deref().unwrap_or_default());
        let checklist = request
            .checklist_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| GENERAL_DIR.to_string());

        format!(
            "{}/{}/{}/{}",
            request.year,
            unit,
            checklist,
            sanitize_filename(&request.file_name)
        )
    }

    /// Ledig sökväg för uppladdningen. Är namnet upptaget (på disk eller av en
    /// annan post) får filen ett löpnummer: `laporan_2.pdf`, `laporan_3.pdf` osv.
    fn unique_upload_path(&self, request: &UploadRequest) -> AppResult<String> {
        let base = Self::relative_upload_path(request);
        let mut candidate = base.clone();
        let mut n = 1;
        while self.path_taken(&candidate)? {
            n += 1;
            candidate = numbered_path(&base, n);
        }
        Ok(candidate)
    }

    fn path_taken(&self, relative_path: &str) -> AppResult<bool> {
        Ok(self.documents_dir.join(relative_path).exists()
            || self.db.files().find_by_relative_path(relative_path)?.is_some())
    }

    /// Ta bort filerna på disk för en uppsättning poster. Fel loggas bara.
    fn remove_stored_files(&self, files: &[UploadedFile]) {
        for file in files {
            if let Some(rel) = &file.relative_path {
                if let Err(e) = file_ops::delete_file(&self.documents_dir.join(rel)) {
                    warn!("Kunde inte ta bort {}: {}", rel, e);
                }
            }
        }
    }

    fn remove_aoi_files(&self, docs: &[AoiDocument]) {
        for doc in docs {
            if let Some(rel) = &doc.relative_path {
                if let Err(e) = file_ops::delete_file(&self.documents_dir.join(rel)) {
                    warn!("Kunde inte ta bort AOI-fil {}: {}", rel, e);
                }
            }
        }
    }

    fn remove_year_directory(&self, year: i32) {
        let dir = self.documents_dir.join(year.to_string());
        if let Err(e) = file_ops::delete_directory(&dir) {
            warn!("Kunde inte ta bort katalog för år {}: {}", year, e);
        }
    }

    fn purge(&self, year: i32, scope: PurgeScope) -> AppResult<YearCleanupStats> {
        let stats = self.db.years().purge(year, scope)?;
        self.remove_year_directory(year);
        Ok(stats)
    }
}

/// `2024/Tanpa_PIC/umum/laporan.pdf` + 2 -> `2024/Tanpa_PIC/umum/laporan_2.pdf`
fn numbered_path(relative_path: &str, n: usize) -> String {
    let (dir, name) = match relative_path.rsplit_once('/') {
        Some((dir, name)) => (format!("{}/", dir), name),
        None => (String::new(), relative_path),
    };
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}{}_{}.{}", dir, stem, n, ext),
        _ => format!("{}{}_{}", dir, name, n),
    }
}

impl GcgBackend for LocalBackend {
    // ── Checklista ─────────────────────────────────────────────────

    fn list_checklist(&self, year: Option<i32>) -> AppResult<Vec<ChecklistItem>> {
        Ok(self.db.checklists().find_all(year)?)
    }

    fn create_checklist(&self, item: &ChecklistItem) -> AppResult<ChecklistItem> {
        item.validate().map_err(AppError::Validation)?;

        let mut created = item.clone();
        created.id = None;
        self.db.checklists().create(&mut created)?;

        debug!("Checklistobjekt {:?} skapat för {}", created.id, created.year);
        Ok(created)
    }

    fn update_checklist(&self, item: &ChecklistItem) -> AppResult<ChecklistItem> {
        item.validate().map_err(AppError::Validation)?;
        let id = item
            .id
            .ok_or_else(|| AppError::validation("Checklistobjekt saknar ID"))?;

        if !self.db.checklists().update(item)? {
            return Err(AppError::not_found(format!("Checklistobjekt {}", id)));
        }

        self.db
            .checklists()
            .find_by_id(id)?
            .ok_or_else(|| AppError::not_found(format!("Checklistobjekt {}", id)))
    }

    fn delete_checklist(&self, id: i64) -> AppResult<()> {
        if !self.db.checklists().delete(id)? {
            return Err(AppError::not_found(format!("Checklistobjekt {}", id)));
        }
        Ok(())
    }

    // ── Aspekter ───────────────────────────────────────────────────

    fn list_aspects(&self, year: Option<i32>) -> AppResult<Vec<Aspect>> {
        Ok(self.db.checklists().find_aspects(year)?)
    }

    fn create_aspect(&self, aspect: &Aspect) -> AppResult<Aspect> {
        let name = aspect.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Aspektnamn måste anges"));
        }
        if self.db.checklists().aspect_exists(name, aspect.year)? {
            return Err(AppError::already_exists(format!(
                "Aspekt '{}' för {}",
                name, aspect.year
            )));
        }

        let mut created = aspect.clone();
        created.id = None;
        created.name = name.to_string();
        self.db.checklists().create_aspect(&mut created)?;
        Ok(created)
    }

    fn rename_aspect(&self, id: i64, name: &str) -> AppResult<Aspect> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Aspektnamn måste anges"));
        }

        self.db
            .checklists()
            .rename_aspect(id, name)?
            .ok_or_else(|| AppError::not_found(format!("Aspekt {}", id)))
    }

    fn delete_aspect(&self, id: i64) -> AppResult<()> {
        if !self.db.checklists().delete_aspect(id)? {
            return Err(AppError::not_found(format!("Aspekt {}", id)));
        }
        Ok(())
    }

    // ── Filer ──────────────────────────────────────────────────────

    fn list_files(&self, year: Option<i32>) -> AppResult<Vec<UploadedFile>> {
        Ok(self.db.files().find_all(year)?)
    }

    fn upload_file(&self, request: &UploadRequest) -> AppResult<UploadedFile> {
        request.validate().map_err(AppError::Validation)?;

        // Ny uppladdning för samma checklistobjekt ersätter den gamla filen
        if let Some(checklist_id) = request.checklist_id {
            let previous: Vec<UploadedFile> = self
                .db
                .files()
                .find_by_checklist(checklist_id)?
                .into_iter()
                .filter(|f| f.year == request.year)
                .collect();

            if !previous.is_empty() {
                self.remove_stored_files(&previous);
                self.db.files().delete_by_checklist(checklist_id, request.year)?;
                debug!(
                    "Ersatte {} fil(er) för checklistobjekt {}",
                    previous.len(),
                    checklist_id
                );
            }
        }

        let relative_path = self.unique_upload_path(request)?;
        file_ops::write_bytes(&self.documents_dir.join(&relative_path), &request.bytes)?;

        let mut file = UploadedFile::new(Uuid::new_v4().to_string(), &request.file_name, request.year);
        file.file_size = request.bytes.len() as i64;
        file.checklist_id = request.checklist_id;
        file.checklist_description = request.checklist_description.clone();
        file.aspect = Some(
            request
                .aspect
                .clone()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| UNASSIGNED_ASPECT.to_string()),
        );
        file.unit = request.unit.clone();
        file.note = request.note.clone();
        file.row_number = request.row_number;
        file.relative_path = Some(relative_path);

        self.db.files().create(&mut file)?;

        info!("Fil uppladdad: {} ({})", file.file_name, file.file_size_display());
        Ok(file)
    }

    fn delete_uploaded_file(&self, id: &str) -> AppResult<()> {
        let file = self
            .db
            .files()
            .find_by_id(id)?
            .ok_or_else(|| AppError::not_found(format!("Fil {}", id)))?;

        self.db.files().delete(id)?;

        // Äldre data kan ha flera poster på samma sökväg
        if let Some(rel) = &file.relative_path {
            if let Some(other) = self.db.files().find_by_relative_path(rel)? {
                debug!("{} används fortfarande av {}, filen behålls", rel, other.id);
                return Ok(());
            }
        }
        self.remove_stored_files(std::slice::from_ref(&file));
        Ok(())
    }

    fn check_files_exist(&self, checklist_id: i64) -> AppResult<Vec<UploadedFile>> {
        Ok(self.db.files().find_by_checklist(checklist_id)?)
    }

    fn check_row_files(&self, year: i32, unit: &str, row_number: i32) -> AppResult<Vec<UploadedFile>> {
        Ok(self.db.files().find_by_row(year, unit, row_number)?)
    }

    fn delete_row_files(&self, year: i32, unit: &str, row_number: i32) -> AppResult<usize> {
        let files = self.db.files().find_by_row(year, unit, row_number)?;
        self.remove_stored_files(&files);
        Ok(self.db.files().delete_by_row(year, unit, row_number)?)
    }

    // ── År ─────────────────────────────────────────────────────────

    fn list_years(&self) -> AppResult<Vec<FiscalYear>> {
        Ok(self.db.years().find_all()?)
    }

    fn create_year(&self, year: i32) -> AppResult<FiscalYear> {
        if !is_valid_fiscal_year(year) {
            return Err(AppError::validation(format!("Ogiltigt år: {}", year)));
        }
        if self.db.years().exists(year)? {
            return Err(AppError::already_exists(format!("Tahun buku {}", year)));
        }

        let created = self.db.years().create(year)?;
        let seeded = self.db.checklists().seed_default_aspects(year)?;

        info!("Tahun buku {} skapat ({} standardaspekter)", year, seeded);
        Ok(created)
    }

    fn delete_year(&self, year: i32) -> AppResult<YearDeletion> {
        if !self.db.years().exists(year)? {
            return Err(AppError::not_found(format!("Tahun buku {}", year)));
        }

        let cleanup_stats = self.purge(year, PurgeScope::Year)?;
        Ok(YearDeletion { year, cleanup_stats })
    }

    fn delete_year_data(&self, year: i32) -> AppResult<YearCleanupStats> {
        self.purge(year, PurgeScope::Documents)
    }

    fn bulk_delete(&self, year: i32) -> AppResult<YearCleanupStats> {
        self.purge(year, PurgeScope::AllData)
    }

    // ── Tilldelningar ──────────────────────────────────────────────

    fn list_assignments(&self, year: Option<i32>) -> AppResult<Vec<Assignment>> {
        Ok(self.db.assignments().find_all(year)?)
    }

    fn create_assignment(&self, assignment: &Assignment) -> AppResult<Assignment> {
        if assignment.unit_name.trim().is_empty() {
            return Err(AppError::validation("Enhet måste anges"));
        }
        if self.db.checklists().find_by_id(assignment.checklist_id)?.is_none() {
            return Err(AppError::not_found(format!(
                "Checklistobjekt {}",
                assignment.checklist_id
            )));
        }

        let mut created = assignment.clone();
        self.db.assignments().upsert(&mut created)?;
        Ok(created)
    }

    fn delete_assignment(&self, checklist_id: i64, year: i32) -> AppResult<()> {
        if !self.db.assignments().delete(checklist_id, year)? {
            return Err(AppError::not_found(format!(
                "Tilldelning för checklistobjekt {} ({})",
                checklist_id, year
            )));
        }
        Ok(())
    }

    // ── Användare ──────────────────────────────────────────────────

    fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.db.users().find_all()?)
    }

    fn create_user(&self, user: &User) -> AppResult<User> {
        user.validate().map_err(AppError::Validation)?;
        if self.db.users().find_by_email(&user.email)?.is_some() {
            return Err(AppError::already_exists(format!("Användare {}", user.email)));
        }

        let mut created = user.clone();
        self.db.users().create(&mut created)?;
        Ok(created)
    }

    fn update_user(&self, user: &User) -> AppResult<User> {
        user.validate().map_err(AppError::Validation)?;
        if !self.db.users().update(user)? {
            return Err(AppError::not_found(format!("Användare {}", user.email)));
        }
        Ok(user.clone())
    }

    fn delete_user(&self, id: i64) -> AppResult<()> {
        if !self.db.users().delete(id)? {
            return Err(AppError::not_found(format!("Användare {}", id)));
        }
        Ok(())
    }

    // ── Inloggning ─────────────────────────────────────────────────

    /// Samma fel oavsett om kontot saknas, är inaktivt eller lösenordet är fel
    fn login(&self, email: &str, password: &str) -> AppResult<LoginSession> {
        let rejected = || AppError::unauthorized("Ogiltiga inloggningsuppgifter");

        let Some((user, hash)) = self.db.users().find_credentials(email.trim())? else {
            debug!("Inloggning för okänt konto {}", email);
            return Err(rejected());
        };
        if !user.is_active || hash.is_empty() || !verify_password(password, &hash) {
            warn!("Misslyckad inloggning för {}", user.email);
            return Err(rejected());
        }

        info!("{} inloggad", user.email);
        Ok(LoginSession {
            user,
            token: Uuid::new_v4().to_string(),
        })
    }

    fn set_password(&self, user_id: i64, password: &str) -> AppResult<()> {
        let hash = hash_password(password)?;
        if !self.db.users().set_password_hash(user_id, &hash)? {
            return Err(AppError::not_found(format!("Användare {}", user_id)));
        }
        Ok(())
    }

    // ── Organisationsstruktur ──────────────────────────────────────

    fn list_structure(&self, year: Option<i32>) -> AppResult<Vec<OrgUnit>> {
        Ok(self.db.structure().find_all(year)?)
    }

    fn create_unit(&self, unit: &OrgUnit) -> AppResult<OrgUnit> {
        if unit.name.trim().is_empty() {
            return Err(AppError::validation("Namn måste anges"));
        }

        if let Some(parent_id) = unit.parent_id {
            let parent = self
                .db
                .structure()
                .find_by_id(parent_id)?
                .ok_or_else(|| AppError::not_found(format!("Överordnad enhet {}", parent_id)))?;

            if unit.kind.parent_kind() != Some(parent.kind) {
                return Err(AppError::validation(format!(
                    "{} kan inte ligga under {}",
                    unit.kind.display_name(),
                    parent.kind.display_name()
                )));
            }
        }

        let mut created = unit.clone();
        created.id = None;
        self.db.structure().create(&mut created)?;
        Ok(created)
    }

    fn update_unit(&self, id: i64, update: &OrgUnitUpdate) -> AppResult<OrgUnit> {
        if update.is_empty() {
            return Err(AppError::validation("Inget att uppdatera"));
        }
        if !self.db.structure().update(id, update)? {
            return Err(AppError::not_found(format!("Enhet {}", id)));
        }

        self.db
            .structure()
            .find_by_id(id)?
            .ok_or_else(|| AppError::not_found(format!("Enhet {}", id)))
    }

    fn delete_unit(&self, id: i64) -> AppResult<()> {
        if self.db.structure().delete(id)? == 0 {
            return Err(AppError::not_found(format!("Enhet {}", id)));
        }
        Ok(())
    }

    // ── Dokumentmetadata ───────────────────────────────────────────

    fn list_documents(&self, year: Option<i32>) -> AppResult<Vec<DocumentMetadata>> {
        Ok(self.db.documents().find_all(year)?)
    }

    fn create_document(&self, doc: &DocumentMetadata) -> AppResult<DocumentMetadata> {
        if doc.title.trim().is_empty() {
            return Err(AppError::validation("Titel måste anges"));
        }

        let mut created = doc.clone();
        if created.id.is_empty() {
            created.id = Uuid::new_v4().to_string();
        }
        self.db.documents().create(&mut created)?;
        Ok(created)
    }

    fn update_document(&self, doc: &DocumentMetadata) -> AppResult<DocumentMetadata> {
        if !self.db.documents().update(doc)? {
            return Err(AppError::not_found(format!("Dokument {}", doc.id)));
        }

        self.db
            .documents()
            .find_by_id(&doc.id)?
            .ok_or_else(|| AppError::not_found(format!("Dokument {}", doc.id)))
    }

    fn delete_document(&self, id: &str) -> AppResult<()> {
        if !self.db.documents().delete(id)? {
            return Err(AppError::not_found(format!("Dokument {}", id)));
        }
        Ok(())
    }

    // ── Bedömning ──────────────────────────────────────────────────

    /// Aspektsammanfattningar per år. Utan år summeras varje år för sig,
    /// nyaste först.
    fn aspect_data(&self, year: Option<i32>) -> AppResult<Vec<AspectSummary>> {
        let mut by_year: BTreeMap<i32, Vec<PenilaianRow>> = BTreeMap::new();
        for indicator in self.db.assessments().find_indicators(year)? {
            by_year.entry(indicator.year).or_default().push(indicator.row);
        }

        let mut summaries = Vec::new();
        for (year, rows) in by_year.into_iter().rev() {
            summaries.extend(scoring::summarize_aspects(&rows).into_iter().map(|mut s| {
                s.year = Some(year);
                s
            }));
        }
        Ok(summaries)
    }

    fn indicator_data(&self, year: Option<i32>) -> AppResult<Vec<StoredIndicator>> {
        Ok(self.db.assessments().find_indicators(year)?)
    }

    fn save_assessment(&self, submission: &AssessmentSubmission) -> AppResult<usize> {
        if !is_valid_fiscal_year(submission.year) {
            return Err(AppError::validation(format!("Ogiltigt år: {}", submission.year)));
        }
        if submission.assessor.trim().is_empty() {
            return Err(AppError::validation("Penilai måste anges"));
        }

        Ok(self.db.assessments().replace_year(submission)?)
    }

    // ── AOI ────────────────────────────────────────────────────────

    fn list_aoi_tables(&self, year: Option<i32>) -> AppResult<Vec<AoiTable>> {
        Ok(self.db.aoi().find_tables(year)?)
    }

    fn create_aoi_table(&self, table: &AoiTable) -> AppResult<AoiTable> {
        table.validate().map_err(AppError::Validation)?;
        if !is_valid_fiscal_year(table.year) {
            return Err(AppError::validation(format!("Ogiltigt år: {}", table.year)));
        }

        let mut created = table.clone();
        self.db.aoi().create_table(&mut created)?;
        info!("AOI-tabell skapad: {} ({})", created.name, created.year);
        Ok(created)
    }

    fn update_aoi_table(&self, table: &AoiTable) -> AppResult<AoiTable> {
        table.validate().map_err(AppError::Validation)?;
        let id = table
            .id
            .ok_or_else(|| AppError::validation("AOI-tabellen saknar id"))?;

        if !self.db.aoi().update_table(table)? {
            return Err(AppError::not_found(format!("AOI-tabell {}", id)));
        }
        Ok(self.db.aoi().find_table(id)?.unwrap_or_else(|| table.clone()))
    }

    fn delete_aoi_table(&self, id: i64) -> AppResult<()> {
        let docs = self.db.aoi().find_documents_by_table(id)?;
        if !self.db.aoi().delete_table(id)? {
            return Err(AppError::not_found(format!("AOI-tabell {}", id)));
        }
        self.remove_aoi_files(&docs);
        Ok(())
    }

    fn list_aoi_recommendations(&self, year: Option<i32>) -> AppResult<Vec<AoiRecommendation>> {
        Ok(self.db.aoi().find_recommendations(year, None)?)
    }

    /// Året tas från tabellen
    fn create_aoi_recommendation(&self, rec: &AoiRecommendation) -> AppResult<AoiRecommendation> {
        rec.validate().map_err(AppError::Validation)?;
        let table = self
            .db
            .aoi()
            .find_table(rec.table_id)?
            .ok_or_else(|| AppError::not_found(format!("AOI-tabell {}", rec.table_id)))?;

        let mut created = rec.clone();
        created.year = table.year;
        self.db.aoi().create_recommendation(&mut created)?;
        debug!("{} nr {} i AOI-tabell {}", created.kind, created.no, table.name);
        Ok(created)
    }

    fn update_aoi_recommendation(&self, rec: &AoiRecommendation) -> AppResult<AoiRecommendation> {
        rec.validate().map_err(AppError::Validation)?;
        let id = rec
            .id
            .ok_or_else(|| AppError::validation("Rekommendationen saknar id"))?;

        if !self.db.aoi().update_recommendation(rec)? {
            return Err(AppError::not_found(format!("AOI-rekommendation {}", id)));
        }
        Ok(self.db.aoi().find_recommendation(id)?.unwrap_or_else(|| rec.clone()))
    }

    fn delete_aoi_recommendation(&self, id: i64) -> AppResult<()> {
        let docs = self.db.aoi().find_documents_by_recommendation(id)?;
        if !self.db.aoi().delete_recommendation(id)? {
            return Err(AppError::not_found(format!("AOI-rekommendation {}", id)));
        }
        self.remove_aoi_files(&docs);
        Ok(())
    }

    fn list_aoi_tracking(&self, year: Option<i32>) -> AppResult<Vec<AoiTracking>> {
        Ok(self.db.aoi().find_tracking(year)?)
    }

    fn update_aoi_tracking(&self, tracking: &AoiTracking) -> AppResult<AoiTracking> {
        self.db.aoi().update_tracking(tracking)?.ok_or_else(|| {
            AppError::not_found(format!("Uppföljning för rekommendation {}", tracking.recommendation_id))
        })
    }

    fn list_aoi_documents(&self, year: Option<i32>) -> AppResult<Vec<AoiDocument>> {
        Ok(self.db.aoi().find_documents(year)?)
    }

    /// Ett nytt bevis ersätter det förra för samma rekommendation
    fn upload_aoi_document(&self, request: &AoiUploadRequest) -> AppResult<AoiDocument> {
        request.validate().map_err(AppError::Validation)?;
        let rec = self
            .db
            .aoi()
            .find_recommendation(request.recommendation_id)?
            .ok_or_else(|| {
                AppError::not_found(format!("AOI-rekommendation {}", request.recommendation_id))
            })?;

        let previous = self.db.aoi().find_documents_by_recommendation(request.recommendation_id)?;
        for doc in &previous {
            self.db.aoi().delete_document(&doc.id)?;
        }
        self.remove_aoi_files(&previous);

        let relative_path = format!(
            "{}/{}/{}/{}/{}",
            rec.year,
            AOI_DIR,
            rec.table_id,
            request.recommendation_id,
            sanitize_filename(&request.file_name)
        );
        file_ops::write_bytes(&self.documents_dir.join(&relative_path), &request.bytes)?;

        let mut doc = AoiDocument {
            id: Uuid::new_v4().to_string(),
            file_name: request.file_name.clone(),
            file_size: request.bytes.len() as i64,
            upload_date: None,
            recommendation_id: request.recommendation_id,
            kind: rec.kind,
            no: rec.no,
            user_id: request.user_id.clone(),
            user_direktorat: request.user_direktorat.clone(),
            user_subdirektorat: request.user_subdirektorat.clone(),
            user_divisi: request.user_divisi.clone(),
            file_type: request.file_type().to_string(),
            status: "active".to_string(),
            year: rec.year,
            relative_path: Some(relative_path),
        };
        self.db.aoi().create_document(&mut doc)?;

        info!("AOI-bevis uppladdat: {} för {} nr {}", doc.file_name, doc.kind, doc.no);
        Ok(doc)
    }

    fn delete_aoi_document(&self, id: &str) -> AppResult<()> {
        let doc = self
            .db
            .aoi()
            .find_document(id)?
            .ok_or_else(|| AppError::not_found(format!("AOI-dokument {}", id)))?;

        self.db.aoi().delete_document(id)?;
        self.remove_aoi_files(std::slice::from_ref(&doc));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AoiKind, AoiTargetType, OrgUnitKind, PenilaianRow, Role, UnitType};
    use crate::services::FileScanService;
    use tempfile::tempdir;

    fn backend(dir: &Path) -> LocalBackend {
        LocalBackend::in_memory(dir.join("gcg-documents")).unwrap()
    }

    #[test]
    fn test_create_year_rejects_duplicates() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        backend.create_year(2024).unwrap();
        let err = backend.create_year(2024).unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));

        assert!(matches!(backend.create_year(12), Err(AppError::Validation(_))));
        assert!(!backend.list_aspects(Some(2024)).unwrap().is_empty());
    }

    #[test]
    fn test_upload_stores_file_on_disk() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        let mut request = UploadRequest::new("Pedoman GCG.pdf", b"%PDF-1.4".to_vec(), 2024);
        request.checklist_id = Some(5);
        request.unit = Some("Divisi Human Capital".into());

        let file = backend.upload_file(&request).unwrap();
        assert_eq!(file.file_size, 8);
        assert_eq!(file.aspect.as_deref(), Some(UNASSIGNED_ASPECT));
        assert_eq!(
            file.relative_path.as_deref(),
            Some("2024/Divisi_Human_Capital/5/Pedoman GCG.pdf")
        );
        assert!(backend
            .documents_dir()
            .join("2024/Divisi_Human_Capital/5/Pedoman GCG.pdf")
            .exists());
    }

    #[test]
    fn test_reupload_replaces_previous_file() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        let mut first = UploadRequest::new("v1.pdf", b"one".to_vec(), 2024);
        first.checklist_id = Some(1);
        let old = backend.upload_file(&first).unwrap();

        let mut second = UploadRequest::new("v2.pdf", b"two!".to_vec(), 2024);
        second.checklist_id = Some(1);
        backend.upload_file(&second).unwrap();

        let files = backend.check_files_exist(1).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "v2.pdf");
        assert!(!backend
            .documents_dir()
            .join(old.relative_path.unwrap())
            .exists());
    }

    #[test]
    fn test_general_uploads_with_same_name_get_own_paths() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        let first = backend
            .upload_file(&UploadRequest::new("laporan.pdf", b"first".to_vec(), 2024))
            .unwrap();
        let second = backend
            .upload_file(&UploadRequest::new("laporan.pdf", b"second".to_vec(), 2024))
            .unwrap();

        assert_eq!(first.relative_path.as_deref(), Some("2024/Tanpa_PIC/umum/laporan.pdf"));
        assert_eq!(second.relative_path.as_deref(), Some("2024/Tanpa_PIC/umum/laporan_2.pdf"));
        assert_eq!(second.file_name, "laporan.pdf");

        let second_path = backend.documents_dir().join(second.relative_path.unwrap());
        assert_eq!(std::fs::read(&second_path).unwrap(), b"second");

        backend.delete_uploaded_file(&first.id).unwrap();
        assert!(!backend.documents_dir().join(first.relative_path.unwrap()).exists());
        assert!(second_path.exists());
        assert_eq!(backend.list_files(Some(2024)).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_keeps_file_shared_with_other_record() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        let file = backend
            .upload_file(&UploadRequest::new("delad.pdf", b"x".to_vec(), 2024))
            .unwrap();
        let mut copy = UploadedFile::new("kopia", "delad.pdf", 2024);
        copy.relative_path = file.relative_path.clone();
        backend.database().files().create(&mut copy).unwrap();

        backend.delete_uploaded_file(&file.id).unwrap();
        assert!(backend.documents_dir().join(file.relative_path.unwrap()).exists());
    }

    #[test]
    fn test_numbered_path() {
        assert_eq!(numbered_path("2024/A/umum/a.pdf", 2), "2024/A/umum/a_2.pdf");
        assert_eq!(numbered_path("2024/A/umum/README", 3), "2024/A/umum/README_3");
        assert_eq!(numbered_path(".env", 2), ".env_2");
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        let request = UploadRequest::new("tom.pdf", Vec::new(), 2024);
        assert!(matches!(backend.upload_file(&request), Err(AppError::Validation(_))));
        assert!(backend.list_files(None).unwrap().is_empty());
    }

    #[test]
    fn test_delete_year_reports_cleanup_stats() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        backend.create_year(2024).unwrap();
        let item = backend
            .create_checklist(&ChecklistItem::new("Direksi", "Pedoman Direksi", 2024))
            .unwrap();
        backend
            .create_assignment(&Assignment::new(
                item.id.unwrap(),
                2024,
                "Divisi Treasury",
                UnitType::Division,
            ))
            .unwrap();
        backend
            .upload_file(&UploadRequest::new("a.pdf", b"x".to_vec(), 2024))
            .unwrap();

        let deletion = backend.delete_year(2024).unwrap();
        assert_eq!(deletion.cleanup_stats.checklist, 1);
        assert_eq!(deletion.cleanup_stats.assignments, 1);
        assert_eq!(deletion.cleanup_stats.uploaded_files, 1);
        assert!(!backend.documents_dir().join("2024").exists());

        assert!(backend.delete_year(2024).unwrap_err().is_not_found());
    }

    #[test]
    fn test_stale_checklist_update_is_not_found() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        let item = backend
            .create_checklist(&ChecklistItem::new("Direksi", "Pedoman Direksi", 2024))
            .unwrap();
        backend.delete_checklist(item.id.unwrap()).unwrap();

        assert!(backend.update_checklist(&item).unwrap_err().is_not_found());
        assert!(backend.delete_checklist(item.id.unwrap()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_unit_parent_kind_is_checked() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        let dir_unit = backend
            .create_unit(&OrgUnit::new(OrgUnitKind::Directorate, "Direktorat Utama", 2024))
            .unwrap();

        let division = OrgUnit::new(OrgUnitKind::Division, "Divisi SPI", 2024)
            .with_parent(dir_unit.id.unwrap());
        assert!(matches!(backend.create_unit(&division), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_save_assessment_and_aspect_data() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        let submission = AssessmentSubmission {
            year: 2024,
            assessor: "Tim Penilai".into(),
            assessment_type: "internal".into(),
            rows: vec![
                PenilaianRow::new("Komitmen", "Indikator A", 50.0, 40.0),
                PenilaianRow::new("Komitmen", "Pelanggaran", -5.0, 2.0),
            ],
        };
        assert_eq!(backend.save_assessment(&submission).unwrap(), 2);

        let summaries = backend.aspect_data(Some(2024)).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_weight, 52.0);
        assert_eq!(summaries[0].achievement, 81);

        assert_eq!(backend.indicator_data(Some(2024)).unwrap().len(), 2);
    }

    #[test]
    fn test_aspect_data_without_year_keeps_years_apart() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        for (year, score) in [(2023, 20.0), (2024, 50.0)] {
            let submission = AssessmentSubmission {
                year,
                assessor: "Tim Penilai".into(),
                assessment_type: "internal".into(),
                rows: vec![PenilaianRow::new("Komitmen", "Indikator A", 50.0, score)],
            };
            backend.save_assessment(&submission).unwrap();
        }

        let summaries = backend.aspect_data(None).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].year, Some(2024));
        assert_eq!(summaries[0].achievement, 100);
        assert_eq!(summaries[1].year, Some(2023));
        assert_eq!(summaries[1].achievement, 40);
        assert_eq!(summaries[1].indicator_count, 1);
    }

    fn user_with_password(backend: &LocalBackend, email: &str, password: &str) -> User {
        let user = backend
            .create_user(&User::new(email, "Admin GCG", Role::Admin))
            .unwrap();
        backend.set_password(user.id.unwrap(), password).unwrap();
        user
    }

    #[test]
    fn test_login_with_correct_password() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());
        user_with_password(&backend, "admin@gcg.co.id", "rahasia123");

        let session = backend.login(" Admin@GCG.co.id ", "rahasia123").unwrap();
        assert_eq!(session.user.email, "admin@gcg.co.id");
        assert!(!session.token.is_empty());

        // Varje inloggning får en egen token
        let again = backend.login("admin@gcg.co.id", "rahasia123").unwrap();
        assert_ne!(session.token, again.token);
    }

    #[test]
    fn test_login_rejections_look_the_same() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());
        let mut user = user_with_password(&backend, "admin@gcg.co.id", "rahasia123");
        backend
            .create_user(&User::new("tanpa@gcg.co.id", "Tanpa Sandi", Role::User))
            .unwrap();

        let wrong = backend.login("admin@gcg.co.id", "salah123").unwrap_err();
        let unknown = backend.login("siapa@gcg.co.id", "rahasia123").unwrap_err();
        let no_hash = backend.login("tanpa@gcg.co.id", "").unwrap_err();
        for err in [&wrong, &unknown, &no_hash] {
            assert!(matches!(err, AppError::Unauthorized(_)));
        }
        assert_eq!(wrong.to_string(), unknown.to_string());

        user.is_active = false;
        backend.update_user(&user).unwrap();
        assert!(matches!(
            backend.login("admin@gcg.co.id", "rahasia123"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_set_password_for_missing_user() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        assert!(backend.set_password(42, "rahasia123").unwrap_err().is_not_found());
        assert!(matches!(backend.set_password(42, "kort"), Err(AppError::Validation(_))));
    }

    fn aoi_table(backend: &LocalBackend, year: i32) -> AoiTable {
        let mut table = AoiTable::new("AOI Direksi", year, AoiTargetType::Divisi);
        table.target_divisi = Some("Divisi Treasury".into());
        backend.create_aoi_table(&table).unwrap()
    }

    #[test]
    fn test_aoi_recommendation_takes_year_from_table() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());
        let table = aoi_table(&backend, 2024);

        let mut rec = AoiRecommendation::new(table.id.unwrap(), AoiKind::Saran, "Perbarui pedoman", 1999);
        rec.urgency = 3;
        let created = backend.create_aoi_recommendation(&rec).unwrap();
        assert_eq!((created.year, created.no), (2024, 1));
        assert_eq!(backend.list_aoi_tracking(Some(2024)).unwrap().len(), 1);

        let missing = AoiRecommendation::new(999, AoiKind::Rekomendasi, "X", 2024);
        assert!(backend.create_aoi_recommendation(&missing).unwrap_err().is_not_found());

        let mut tracking = AoiTracking::new(created.id.unwrap());
        tracking.rups = true;
        assert_eq!(backend.update_aoi_tracking(&tracking).unwrap().completed_count(), 1);
        assert!(backend.update_aoi_tracking(&AoiTracking::new(999)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_aoi_upload_replaces_previous_evidence() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());
        let table = aoi_table(&backend, 2024);
        let rec = backend
            .create_aoi_recommendation(&AoiRecommendation::new(
                table.id.unwrap(),
                AoiKind::Rekomendasi,
                "Susun kebijakan",
                2024,
            ))
            .unwrap();
        let rec_id = rec.id.unwrap();

        let first = backend
            .upload_aoi_document(&AoiUploadRequest::new("bukti.pdf", b"v1".to_vec(), rec_id))
            .unwrap();
        let first_path = backend.documents_dir().join(first.relative_path.as_deref().unwrap());
        assert!(first_path.is_file());
        assert_eq!(first.file_type, "application/pdf");
        assert_eq!((first.kind, first.no, first.year), (AoiKind::Rekomendasi, 1, 2024));

        let second = backend
            .upload_aoi_document(&AoiUploadRequest::new("bukti-baru.pdf", b"v2".to_vec(), rec_id))
            .unwrap();
        assert!(!first_path.exists());
        let docs = backend.list_aoi_documents(Some(2024)).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, second.id);

        // AOI-bevis är inte checklistfiler
        let scan = FileScanService::new(backend.database(), backend.documents_dir())
            .scan()
            .unwrap();
        assert_eq!(scan.added, 0);

        let missing = AoiUploadRequest::new("bukti.pdf", b"x".to_vec(), 999);
        assert!(backend.upload_aoi_document(&missing).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_aoi_table_removes_evidence_files() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());
        let table = aoi_table(&backend, 2024);
        let table_id = table.id.unwrap();
        let rec = backend
            .create_aoi_recommendation(&AoiRecommendation::new(table_id, AoiKind::Rekomendasi, "A", 2024))
            .unwrap();
        let doc = backend
            .upload_aoi_document(&AoiUploadRequest::new("bukti.pdf", b"x".to_vec(), rec.id.unwrap()))
            .unwrap();
        let stored = backend.documents_dir().join(doc.relative_path.as_deref().unwrap());

        backend.delete_aoi_table(table_id).unwrap();
        assert!(!stored.exists());
        assert!(backend.list_aoi_recommendations(Some(2024)).unwrap().is_empty());
        assert!(backend.list_aoi_documents(None).unwrap().is_empty());
        assert!(backend.delete_aoi_table(table_id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_year_removes_aoi() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());
        backend.create_year(2024).unwrap();
        let table = aoi_table(&backend, 2024);
        let rec = backend
            .create_aoi_recommendation(&AoiRecommendation::new(table.id.unwrap(), AoiKind::Saran, "B", 2024))
            .unwrap();
        backend
            .upload_aoi_document(&AoiUploadRequest::new("bukti.pdf", b"x".to_vec(), rec.id.unwrap()))
            .unwrap();

        let deletion = backend.delete_year(2024).unwrap();
        // tabell, rekommendation, uppföljning och dokument
        assert_eq!(deletion.cleanup_stats.aoi, 4);
        assert!(backend.list_aoi_tables(Some(2024)).unwrap().is_empty());
        assert!(!backend.documents_dir().join("2024/AOI").exists());
    }
}
