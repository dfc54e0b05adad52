pub mod schema;
pub mod migrations;
pub mod year_repo;
pub mod structure_repo;
pub mod checklist_repo;
pub mod assignment_repo;
pub mod file_repo;
pub mod document_repo;
pub mod assessment_repo;
pub mod user_repo;
pub mod aoi_repo;

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub use year_repo::YearRepository;
pub use structure_repo::StructureRepository;
pub use checklist_repo::ChecklistRepository;
pub use assignment_repo::AssignmentRepository;
pub use file_repo::FileRepository;
pub use document_repo::DocumentRepository;
pub use assessment_repo::AssessmentRepository;
pub use user_repo::UserRepository;
pub use aoi_repo::AoiRepository;

/// Lås connection och gör en förgiftad mutex till ett vanligt fel
pub(crate) fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| anyhow!("Databaslåset är förgiftat"))
}

/// Huvuddatabas-wrapper med thread-safe access
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Öppna eller skapa databas
    pub fn open(path: &Path) -> Result<Self> {
        // Skapa katalog om den inte finns
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Konfigurera SQLite
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            "
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Öppna in-memory databas (för tester)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Kör databasmigrationer
    pub fn migrate(&self) -> Result<()> {
        let conn = lock(&self.conn)?;
        migrations::run_migrations(&conn)
    }

    /// Hämta års-repository
    pub fn years(&self) -> YearRepository {
        YearRepository::new(Arc::clone(&self.conn))
    }

    /// Hämta organisationsstruktur-repository
    pub fn structure(&self) -> StructureRepository {
        StructureRepository::new(Arc::clone(&self.conn))
    }

    /// Hämta checklist-repository (inklusive aspekter)
    pub fn checklists(&self) -> ChecklistRepository {
        ChecklistRepository::new(Arc::clone(&self.conn))
    }

    /// Hämta tilldelnings-repository
    pub fn assignments(&self) -> AssignmentRepository {
        AssignmentRepository::new(Arc::clone(&self.conn))
    }

    /// Hämta repository för uppladdade filer
    pub fn files(&self) -> FileRepository {
        FileRepository::new(Arc::clone(&self.conn))
    }

    /// Hämta dokumentmetadata-repository
    pub fn documents(&self) -> DocumentRepository {
        DocumentRepository::new(Arc::clone(&self.conn))
    }

    /// Hämta bedömnings-repository
    pub fn assessments(&self) -> AssessmentRepository {
        AssessmentRepository::new(Arc::clone(&self.conn))
    }

    /// Hämta användar-repository
    pub fn users(&self) -> UserRepository {
        UserRepository::new(Arc::clone(&self.conn))
    }

    /// Hämta AOI-repository
    pub fn aoi(&self) -> AoiRepository {
        AoiRepository::new(Arc::clone(&self.conn))
    }

    /// Direkt tillgång till connection (för avancerade operationer)
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = lock(&self.conn)?;
        f(&conn)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}
