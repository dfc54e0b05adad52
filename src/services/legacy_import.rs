//! Import av gammal webbläsarlagring (JSON-export av localStorage)
//!
//! Värden kan vara JSON-strängar (som i localStorage) eller redan tolkade
//! arrayer. Gamla id:n mappas till nya när poster refererar till varandra.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::session::SessionStore;
use crate::db::Database;
use crate::models::{
    Aspect, Assignment, ChecklistItem, DocumentMetadata, FileStatus, OrgUnit, OrgUnitKind, Role,
    UnitType, UploadedFile, User, UNASSIGNED_ASPECT,
};
use crate::utils::date::{current_year, format_timestamp, parse_timestamp};
use crate::utils::password::hash_password;

/// Nycklar i exporten som importen känner till
const KNOWN_KEYS: &[&str] = &[
    "availableYears",
    "users",
    "aspects",
    "checklistGCG",
    "direktorat",
    "subdirektorat",
    "divisi",
    "anakPerusahaan",
    "checklistAssignments",
    "documentMetadata",
    "uploadedFiles",
];

/// Resultat av en import
#[derive(Debug, Default)]
pub struct ImportResult {
    pub years: usize,
    pub users: usize,
    pub aspects: usize,
    pub checklist: usize,
    pub structure: usize,
    pub assignments: usize,
    pub documents: usize,
    pub files: usize,
    /// Poster som redan fanns, var inaktiva eller inte gick att tolka
    pub skipped: usize,
    pub warnings: Vec<String>,
}

impl ImportResult {
    pub fn total(&self) -> usize {
        self.years
            + self.users
            + self.aspects
            + self.checklist
            + self.structure
            + self.assignments
            + self.documents
            + self.files
    }

    pub fn summary(&self) -> String {
        format!(
            "{} importerade ({} år, {} användare, {} checklistobjekt, {} enheter, {} tilldelningar, {} dokument, {} filer), {} överhoppade",
            self.total(),
            self.years,
            self.users,
            self.checklist,
            self.structure,
            self.assignments,
            self.documents,
            self.files,
            self.skipped
        )
    }
}

/// Förhandsgranskning: antal poster per känd nyckel
#[derive(Debug, Clone, Default)]
pub struct ImportPreview {
    pub counts: Vec<(String, usize)>,
    pub unknown_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyUser {
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    role: String,
    direktorat: Option<String>,
    subdirektorat: Option<String>,
    divisi: Option<String>,
    /// Klartext i gammal lagring, hashas vid import
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyAspect {
    #[serde(alias = "nama")]
    name: String,
    #[serde(alias = "tahun")]
    year: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyChecklist {
    id: i64,
    aspek: String,
    deskripsi: String,
    tahun: Option<i32>,
    pic: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyUnit {
    id: i64,
    nama: String,
    #[serde(default)]
    deskripsi: String,
    tahun: Option<i32>,
    #[serde(alias = "is_active")]
    is_active: Option<Value>,
    direktorat_id: Option<i64>,
    subdirektorat_id: Option<i64>,
}

impl LegacyUnit {
    /// `isActive` förekommer både som bool och som 0/1
    fn active(&self) -> bool {
        match &self.is_active {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64() != Some(0),
            _ => true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyAssignment {
    checklist_id: i64,
    #[serde(alias = "year")]
    tahun: Option<i32>,
    subdirektorat: Option<String>,
    divisi: Option<String>,
    aspek: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyDocument {
    id: Option<String>,
    title: String,
    file_name: String,
    year: i32,
    #[serde(default)]
    document_number: String,
    #[serde(default)]
    document_date: String,
    #[serde(default)]
    description: String,
    #[serde(default, alias = "direksi")]
    direktorat: String,
    #[serde(default)]
    subdirektorat: String,
    #[serde(default)]
    division: String,
    #[serde(default)]
    file_size: i64,
    status: Option<String>,
    confidentiality: Option<String>,
    #[serde(default)]
    uploaded_by: String,
    upload_date: Option<String>,
    checklist_id: Option<i64>,
    checklist_description: Option<String>,
    aspect: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyFile {
    id: Option<String>,
    file_name: String,
    year: i32,
    #[serde(default)]
    file_size: i64,
    upload_date: Option<String>,
    checklist_id: Option<i64>,
    checklist_description: Option<String>,
    aspect: Option<String>,
    status: Option<String>,
    #[serde(alias = "subdirektorat")]
    unit: Option<String>,
    #[serde(alias = "catatan")]
    note: Option<String>,
    row_number: Option<i32>,
}

pub struct LegacyImportService<'a> {
    db: &'a Database,
}

impl<'a> LegacyImportService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn read_export(path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Kunde inte läsa exportfil {:?}", path))?;
        serde_json::from_str(&content).context("Exportfilen är inte giltig JSON")
    }

    pub fn preview(data: &Value) -> ImportPreview {
        let mut preview = ImportPreview::default();

        for key in KNOWN_KEYS {
            if let Some(value) = data.get(*key) {
                preview.counts.push((key.to_string(), items_of(value).len()));
            }
        }
        if let Some(object) = data.as_object() {
            preview.unknown_keys = object
                .keys()
                .filter(|k| !KNOWN_KEYS.contains(&k.as_str()))
                .cloned()
                .collect();
        }

        preview
    }

    /// Importera en exportfil en gång. `None` om sessionen redan är migrerad.
    pub fn import_once(&self, path: &Path, session: &mut SessionStore) -> Result<Option<ImportResult>> {
        if session.is_migrated() {
            tracing::info!("Gammal lagring redan importerad, hoppar över");
            return Ok(None);
        }

        let data = Self::read_export(path)?;
        let result = self.import(&data)?;
        session.mark_migrated()?;

        Ok(Some(result))
    }

    pub fn import(&self, data: &Value) -> Result<ImportResult> {
        let mut result = ImportResult::default();

        self.import_years(data, &mut result)?;
        self.import_users(data, &mut result)?;
        self.import_aspects(data, &mut result)?;
        let checklist_ids = self.import_checklist(data, &mut result)?;
        self.import_structure(data, &mut result)?;
        self.import_assignments(data, &checklist_ids, &mut result)?;
        self.import_documents(data, &checklist_ids, &mut result)?;
        self.import_files(data, &checklist_ids, &mut result)?;

        tracing::info!("Import klar: {}", result.summary());
        Ok(result)
    }

    fn ensure_year(&self, year: i32, result: &mut ImportResult) -> Result<()> {
        if !self.db.years().exists(year)? {
            self.db.years().create(year)?;
            result.years += 1;
        }
        Ok(())
    }

    fn import_years(&self, data: &Value, result: &mut ImportResult) -> Result<()> {
        let years: Vec<i32> = entries(data, "availableYears", result);
        for year in years {
            if self.db.years().exists(year)? {
                result.skipped += 1;
            } else {
                self.ensure_year(year, result)?;
            }
        }
        Ok(())
    }

    fn import_users(&self, data: &Value, result: &mut ImportResult) -> Result<()> {
        let users: Vec<LegacyUser> = entries(data, "users", result);
        for legacy in users {
            if legacy.email.trim().is_empty() || self.db.users().find_by_email(&legacy.email)?.is_some() {
                result.skipped += 1;
                continue;
            }

            let mut user = User::new(legacy.email, legacy.name, Role::from_db_str(&legacy.role));
            user.direktorat = legacy.direktorat;
            user.subdirektorat = legacy.subdirektorat;
            user.divisi = legacy.divisi;

            self.db.users().create(&mut user)?;
            result.users += 1;

            let Some(password) = legacy.password.filter(|p| !p.is_empty()) else {
                continue;
            };
            match hash_password(&password) {
                Ok(hash) => {
                    if let Some(id) = user.id {
                        self.db.users().set_password_hash(id, &hash)?;
                    }
                }
                Err(e) => result
                    .warnings
                    .push(format!("Användare {}: lösenordet importerades inte ({})", user.email, e)),
            }
        }
        Ok(())
    }

    fn import_aspects(&self, data: &Value, result: &mut ImportResult) -> Result<()> {
        let aspects: Vec<LegacyAspect> = entries(data, "aspects", result);
        for legacy in aspects {
            let year = legacy.year.unwrap_or_else(current_year);
            if legacy.name.trim().is_empty() || self.db.checklists().aspect_exists(&legacy.name, year)? {
                result.skipped += 1;
                continue;
            }

            self.ensure_year(year, result)?;
            self.db.checklists().create_aspect(&mut Aspect::new(legacy.name, year))?;
            result.aspects += 1;
        }
        Ok(())
    }

    /// Returnerar mappning gammalt id -> nytt id
    fn import_checklist(&self, data: &Value, result: &mut ImportResult) -> Result<HashMap<i64, i64>> {
        let mut ids = HashMap::new();

        let items: Vec<LegacyChecklist> = entries(data, "checklistGCG", result);
        for legacy in items {
            let year = legacy.tahun.unwrap_or_else(current_year);
            self.ensure_year(year, result)?;

            let mut item = ChecklistItem::new(legacy.aspek, legacy.deskripsi, year);
            item.assigned_unit = legacy.pic.filter(|p| !p.trim().is_empty());
            if let Err(e) = item.validate() {
                result.warnings.push(format!("Checklistobjekt {}: {}", legacy.id, e));
                result.skipped += 1;
                continue;
            }

            let new_id = self.db.checklists().create(&mut item)?;
            ids.insert(legacy.id, new_id);
            result.checklist += 1;
        }

        Ok(ids)
    }

    fn import_structure(&self, data: &Value, result: &mut ImportResult) -> Result<()> {
        let directorates = self.import_units(data, "direktorat", OrgUnitKind::Directorate, |_| None, result)?;
        let subdirectorates = self.import_units(
            data,
            "subdirektorat",
            OrgUnitKind::Subdirectorate,
            |u| u.direktorat_id.and_then(|id| directorates.get(&id).copied()),
            result,
        )?;
        self.import_units(
            data,
            "divisi",
            OrgUnitKind::Division,
            |u| u.subdirektorat_id.and_then(|id| subdirectorates.get(&id).copied()),
            result,
        )?;
        self.import_units(data, "anakPerusahaan", OrgUnitKind::Subsidiary, |_| None, result)?;
        Ok(())
    }

    fn import_units<F>(
        &self,
        data: &Value,
        key: &str,
        kind: OrgUnitKind,
        parent_of: F,
        result: &mut ImportResult,
    ) -> Result<HashMap<i64, i64>>
    where
        F: Fn(&LegacyUnit) -> Option<i64>,
    {
        let mut ids = HashMap::new();

        let units: Vec<LegacyUnit> = entries(data, key, result);
        for legacy in units {
            if !legacy.active() || legacy.nama.trim().is_empty() {
                result.skipped += 1;
                continue;
            }

            let year = legacy.tahun.unwrap_or_else(current_year);
            self.ensure_year(year, result)?;

            let mut unit = OrgUnit::new(kind, legacy.nama.clone(), year);
            unit.description = legacy.deskripsi.clone();
            unit.parent_id = parent_of(&legacy);

            let new_id = self.db.structure().create(&mut unit)?;
            ids.insert(legacy.id, new_id);
            result.structure += 1;
        }

        Ok(ids)
    }

    fn import_assignments(
        &self,
        data: &Value,
        checklist_ids: &HashMap<i64, i64>,
        result: &mut ImportResult,
    ) -> Result<()> {
        let assignments: Vec<LegacyAssignment> = entries(data, "checklistAssignments", result);
        for legacy in assignments {
            let Some(&checklist_id) = checklist_ids.get(&legacy.checklist_id) else {
                result
                    .warnings
                    .push(format!("Tilldelning för okänt checklistobjekt {}", legacy.checklist_id));
                result.skipped += 1;
                continue;
            };

            let (unit_name, unit_type) = match (legacy.divisi, legacy.subdirektorat) {
                (Some(divisi), _) if !divisi.trim().is_empty() => (divisi, UnitType::Division),
                (_, Some(sub)) if !sub.trim().is_empty() => (sub, UnitType::Subdirectorate),
                _ => {
                    result.skipped += 1;
                    continue;
                }
            };

            let year = legacy.tahun.unwrap_or_else(current_year);
            let mut assignment = Assignment::new(checklist_id, year, unit_name, unit_type);
            assignment.aspect = legacy.aspek;

            self.db.assignments().upsert(&mut assignment)?;
            result.assignments += 1;
        }
        Ok(())
    }

    fn import_documents(
        &self,
        data: &Value,
        checklist_ids: &HashMap<i64, i64>,
        result: &mut ImportResult,
    ) -> Result<()> {
        let documents: Vec<LegacyDocument> = entries(data, "documentMetadata", result);
        for legacy in documents {
            if let Some(id) = &legacy.id {
                if self.db.documents().find_by_id(id)?.is_some() {
                    result.skipped += 1;
                    continue;
                }
            }

            self.ensure_year(legacy.year, result)?;

            let mut doc = DocumentMetadata::new(legacy.title, legacy.file_name, legacy.year);
            doc.id = legacy
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            doc.document_number = legacy.document_number;
            doc.document_date = legacy.document_date;
            doc.description = legacy.description;
            doc.direktorat = legacy.direktorat;
            doc.subdirektorat = legacy.subdirektorat;
            doc.division = legacy.division;
            doc.file_size = legacy.file_size;
            if let Some(status) = legacy.status {
                doc.status = status;
            }
            if let Some(confidentiality) = legacy.confidentiality {
                doc.confidentiality = confidentiality;
            }
            doc.uploaded_by = legacy.uploaded_by;
            doc.upload_date = normalize_date(legacy.upload_date);
            doc.checklist_id = legacy.checklist_id.and_then(|id| checklist_ids.get(&id).copied());
            doc.checklist_description = legacy.checklist_description;
            doc.aspect = legacy.aspect;

            self.db.documents().create(&mut doc)?;
            result.documents += 1;
        }
        Ok(())
    }

    fn import_files(
        &self,
        data: &Value,
        checklist_ids: &HashMap<i64, i64>,
        result: &mut ImportResult,
    ) -> Result<()> {
        let files: Vec<LegacyFile> = entries(data, "uploadedFiles", result);
        for legacy in files {
            let id = legacy
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            if self.db.files().find_by_id(&id)?.is_some() {
                result.skipped += 1;
                continue;
            }

            self.ensure_year(legacy.year, result)?;

            // Gamla poster har ingen fil i dokumentkatalogen
            let mut file = UploadedFile::new(id, legacy.file_name, legacy.year);
            file.file_size = legacy.file_size;
            file.upload_date = normalize_date(legacy.upload_date);
            file.checklist_id = legacy.checklist_id.and_then(|id| checklist_ids.get(&id).copied());
            file.checklist_description = legacy.checklist_description;
            file.aspect = Some(
                legacy
                    .aspect
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| UNASSIGNED_ASPECT.to_string()),
            );
            file.status = legacy
                .status
                .map(|s| FileStatus::from_db_str(&s))
                .unwrap_or(FileStatus::Uploaded);
            file.unit = legacy.unit;
            file.note = legacy.note;
            file.row_number = legacy.row_number;

            self.db.files().create(&mut file)?;
            result.files += 1;
        }
        Ok(())
    }
}

/// Element under en nyckel: JSON-sträng, array eller ett ensamt objekt
fn items_of(value: &Value) -> Vec<Value> {
    let parsed;
    let value = match value {
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(v) => {
                parsed = v;
                &parsed
            }
            Err(_) => return Vec::new(),
        },
        other => other,
    };

    match value {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

/// Gamla exporter har ISO-tider med millisekunder; oläsbara datum blir `None`
fn normalize_date(raw: Option<String>) -> Option<String> {
    raw.as_deref().and_then(parse_timestamp).map(format_timestamp)
}

fn entries<T: DeserializeOwned>(data: &Value, key: &str, result: &mut ImportResult) -> Vec<T> {
    let Some(value) = data.get(key) else {
        return Vec::new();
    };

    items_of(value)
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                result.warnings.push(format!("{}: {}", key, e));
                result.skipped += 1;
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn export() -> Value {
        json!({
            "availableYears": "[2023, 2024]",
            "users": [
                {"id": 1, "email": "admin@example.com", "name": "Admin", "role": "admin", "password": "admin123"},
                {"id": 2, "email": "", "name": "Tom", "role": "user"},
                {"id": 3, "email": "pic@example.com", "name": "PIC", "role": "user", "password": "123"}
            ],
            "checklistGCG": [
                {"id": 101, "aspek": "Direksi", "deskripsi": "Pedoman Direksi", "tahun": 2024},
                {"id": 102, "aspek": "Komisaris", "deskripsi": "Laporan Komisaris", "tahun": 2024}
            ],
            "direktorat": [{"id": 1, "nama": "Direktorat Keuangan", "tahun": 2024, "isActive": true}],
            "subdirektorat": [
                {"id": 10, "nama": "Sub Direktorat Treasury", "direktoratId": 1, "tahun": 2024},
                {"id": 11, "nama": "Gammal", "direktoratId": 1, "tahun": 2024, "isActive": 0}
            ],
            "divisi": [{"id": 20, "nama": "Divisi Treasury", "subdirektoratId": 10, "tahun": 2024}],
            "checklistAssignments": [
                {"id": 1, "checklistId": 101, "subdirektorat": "Sub Direktorat Treasury", "tahun": 2024},
                {"id": 2, "checklistId": 999, "subdirektorat": "Okänd", "tahun": 2024}
            ],
            "uploadedFiles": [
                {"id": "f1", "fileName": "pedoman.pdf", "fileSize": 10, "year": 2024, "checklistId": 101}
            ],
            "theme": "dark"
        })
    }

    #[test]
    fn test_import_maps_ids() {
        let db = Database::open_in_memory().unwrap();
        let result = LegacyImportService::new(&db).import(&export()).unwrap();

        assert_eq!(result.years, 2);
        assert_eq!(result.users, 2);
        assert_eq!(result.checklist, 2);
        assert_eq!(result.structure, 3);
        assert_eq!(result.assignments, 1);
        assert_eq!(result.files, 1);
        assert!(result.skipped >= 3);

        let units = db.structure().find_all(Some(2024)).unwrap();
        let division = units.iter().find(|u| u.name == "Divisi Treasury").unwrap();
        let parent = units.iter().find(|u| u.id == division.parent_id).unwrap();
        assert_eq!(parent.name, "Sub Direktorat Treasury");

        let items = db.checklists().find_by_year(2024).unwrap();
        let pedoman = items.iter().find(|i| i.description == "Pedoman Direksi").unwrap();
        assert_eq!(
            pedoman.assigned_unit.as_deref(),
            Some("Sub Direktorat Treasury")
        );

        let file = db.files().find_by_id("f1").unwrap().unwrap();
        assert_eq!(file.checklist_id, pedoman.id);
    }

    #[test]
    fn test_import_hashes_plaintext_passwords() {
        let db = Database::open_in_memory().unwrap();
        let result = LegacyImportService::new(&db).import(&export()).unwrap();

        let (_, hash) = db.users().find_credentials("admin@example.com").unwrap().unwrap();
        assert_ne!(hash, "admin123");
        assert!(crate::utils::password::verify_password("admin123", &hash));

        // För kort lösenord: kontot importeras utan lösenord
        let (_, hash) = db.users().find_credentials("pic@example.com").unwrap().unwrap();
        assert!(hash.is_empty());
        assert!(result.warnings.iter().any(|w| w.contains("pic@example.com")));
    }

    #[test]
    fn test_import_is_idempotent_for_keyed_rows() {
        let db = Database::open_in_memory().unwrap();
        let service = LegacyImportService::new(&db);
        service.import(&export()).unwrap();

        let second = service.import(&export()).unwrap();
        assert_eq!(second.years, 0);
        assert_eq!(second.users, 0);
        assert_eq!(second.files, 0);
    }

    #[test]
    fn test_import_once_uses_session_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("localstorage.json");
        fs::write(&path, export().to_string()).unwrap();

        let db = Database::open_in_memory().unwrap();
        let mut session = SessionStore::open(dir.path().join("session.json"));
        let service = LegacyImportService::new(&db);

        assert!(service.import_once(&path, &mut session).unwrap().is_some());
        assert!(session.is_migrated());
        assert!(service.import_once(&path, &mut session).unwrap().is_none());
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(
            normalize_date(Some("2024-03-01T10:15:00.000Z".to_string())).as_deref(),
            Some("2024-03-01 10:15:00")
        );
        assert_eq!(normalize_date(Some("okänt".to_string())), None);
        assert_eq!(normalize_date(None), None);
    }

    #[test]
    fn test_preview() {
        let preview = LegacyImportService::preview(&export());
        assert!(preview.counts.contains(&("availableYears".to_string(), 2)));
        assert!(preview.counts.contains(&("checklistGCG".to_string(), 2)));
        assert_eq!(preview.unknown_keys, vec!["theme".to_string()]);
    }
}
