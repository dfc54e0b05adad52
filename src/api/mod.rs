//! Backendgränssnittet
//!
//! Varje metod motsvarar en endpoint i GCG-tjänstens REST-kontrakt. Lagren
//! (stores) pratar bara med `GcgBackend`, aldrig direkt med databasen.

pub mod local;

use crate::models::{
    AoiDocument, AoiRecommendation, AoiTable, AoiTracking, AoiUploadRequest, Aspect,
    AspectSummary, AssessmentSubmission, Assignment, ChecklistItem, DocumentMetadata, FiscalYear,
    LoginSession, OrgUnit, OrgUnitUpdate, StoredIndicator, UploadRequest, UploadedFile, User,
    YearCleanupStats, YearDeletion,
};
use crate::utils::AppResult;

pub use local::LocalBackend;

pub trait GcgBackend: Send + Sync {
    // `/api/checklist`
    fn list_checklist(&self, year: Option<i32>) -> AppResult<Vec<ChecklistItem>>;
    fn create_checklist(&self, item: &ChecklistItem) -> AppResult<ChecklistItem>;
    fn update_checklist(&self, item: &ChecklistItem) -> AppResult<ChecklistItem>;
    fn delete_checklist(&self, id: i64) -> AppResult<()>;

    // `/api/aspects`
    fn list_aspects(&self, year: Option<i32>) -> AppResult<Vec<Aspect>>;
    fn create_aspect(&self, aspect: &Aspect) -> AppResult<Aspect>;
    fn rename_aspect(&self, id: i64, name: &str) -> AppResult<Aspect>;
    fn delete_aspect(&self, id: i64) -> AppResult<()>;

    // Filer
    fn list_files(&self, year: Option<i32>) -> AppResult<Vec<UploadedFile>>;
    fn upload_file(&self, request: &UploadRequest) -> AppResult<UploadedFile>;
    fn delete_uploaded_file(&self, id: &str) -> AppResult<()>;
    fn check_files_exist(&self, checklist_id: i64) -> AppResult<Vec<UploadedFile>>;
    fn check_row_files(&self, year: i32, unit: &str, row_number: i32) -> AppResult<Vec<UploadedFile>>;
    fn delete_row_files(&self, year: i32, unit: &str, row_number: i32) -> AppResult<usize>;

    // `/api/config/tahun-buku`
    fn list_years(&self) -> AppResult<Vec<FiscalYear>>;
    fn create_year(&self, year: i32) -> AppResult<FiscalYear>;
    fn delete_year(&self, year: i32) -> AppResult<YearDeletion>;
    fn delete_year_data(&self, year: i32) -> AppResult<YearCleanupStats>;
    fn bulk_delete(&self, year: i32) -> AppResult<YearCleanupStats>;

    // `/api/config/assignments`
    fn list_assignments(&self, year: Option<i32>) -> AppResult<Vec<Assignment>>;
    fn create_assignment(&self, assignment: &Assignment) -> AppResult<Assignment>;
    fn delete_assignment(&self, checklist_id: i64, year: i32) -> AppResult<()>;

    // `/api/users`
    fn list_users(&self) -> AppResult<Vec<User>>;
    fn create_user(&self, user: &User) -> AppResult<User>;
    fn update_user(&self, user: &User) -> AppResult<User>;
    fn delete_user(&self, id: i64) -> AppResult<()>;

    // `/api/login`
    fn login(&self, email: &str, password: &str) -> AppResult<LoginSession>;
    fn set_password(&self, user_id: i64, password: &str) -> AppResult<()>;

    // `/api/struktur-organisasi`
    fn list_structure(&self, year: Option<i32>) -> AppResult<Vec<OrgUnit>>;
    fn create_unit(&self, unit: &OrgUnit) -> AppResult<OrgUnit>;
    fn update_unit(&self, id: i64, update: &OrgUnitUpdate) -> AppResult<OrgUnit>;
    fn delete_unit(&self, id: i64) -> AppResult<()>;

    // `/api/documents`
    fn list_documents(&self, year: Option<i32>) -> AppResult<Vec<DocumentMetadata>>;
    fn create_document(&self, doc: &DocumentMetadata) -> AppResult<DocumentMetadata>;
    fn update_document(&self, doc: &DocumentMetadata) -> AppResult<DocumentMetadata>;
    fn delete_document(&self, id: &str) -> AppResult<()>;

    // Bedömning
    fn aspect_data(&self, year: Option<i32>) -> AppResult<Vec<AspectSummary>>;
    fn indicator_data(&self, year: Option<i32>) -> AppResult<Vec<StoredIndicator>>;
    fn save_assessment(&self, submission: &AssessmentSubmission) -> AppResult<usize>;

    // `/api/aoi-tables`, `/api/aoi-recommendations`, `/api/aoi-tracking`
    fn list_aoi_tables(&self, year: Option<i32>) -> AppResult<Vec<AoiTable>>;
    fn create_aoi_table(&self, table: &AoiTable) -> AppResult<AoiTable>;
    fn update_aoi_table(&self, table: &AoiTable) -> AppResult<AoiTable>;
    fn delete_aoi_table(&self, id: i64) -> AppResult<()>;
    fn list_aoi_recommendations(&self, year: Option<i32>) -> AppResult<Vec<AoiRecommendation>>;
    fn create_aoi_recommendation(&self, rec: &AoiRecommendation) -> AppResult<AoiRecommendation>;
    fn update_aoi_recommendation(&self, rec: &AoiRecommendation) -> AppResult<AoiRecommendation>;
    fn delete_aoi_recommendation(&self, id: i64) -> AppResult<()>;
    fn list_aoi_tracking(&self, year: Option<i32>) -> AppResult<Vec<AoiTracking>>;
    fn update_aoi_tracking(&self, tracking: &AoiTracking) -> AppResult<AoiTracking>;

    // `/api/aoi-documents`, `/api/upload-aoi-file`
    fn list_aoi_documents(&self, year: Option<i32>) -> AppResult<Vec<AoiDocument>>;
    fn upload_aoi_document(&self, request: &AoiUploadRequest) -> AppResult<AoiDocument>;
    fn delete_aoi_document(&self, id: &str) -> AppResult<()>;
}
