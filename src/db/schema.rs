/// SQL-schema för GCG Hub
/// Kolumnnamn följer den ursprungliga webbtjänstens tabeller där det går

pub const SCHEMA_VERSION: i32 = 3;

pub const CREATE_TABLES: &str = r#"
-- Räkenskapsår (tahun buku)
CREATE TABLE IF NOT EXISTS years (
    year INTEGER PRIMARY KEY,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Aspekter per år
CREATE TABLE IF NOT EXISTS aspects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    year INTEGER NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_aspects_year ON aspects(year);

-- GCG-checklista
CREATE TABLE IF NOT EXISTS checklist_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    aspect TEXT NOT NULL,
    description TEXT NOT NULL,
    year INTEGER NOT NULL,
    assigned_unit TEXT,
    row_number INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_checklist_year ON checklist_items(year);

-- Organisationsstruktur (direktorat, subdirektorat, divisi, anak perusahaan)
CREATE TABLE IF NOT EXISTS org_units (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    parent_id INTEGER,
    year INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (parent_id) REFERENCES org_units(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_org_units_year ON org_units(year, kind);

-- Tilldelningar checklist -> enhet
CREATE TABLE IF NOT EXISTS assignments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    checklist_id INTEGER NOT NULL,
    year INTEGER NOT NULL,
    unit_name TEXT NOT NULL,
    unit_type TEXT NOT NULL DEFAULT 'division',
    aspect TEXT,
    assigned_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (checklist_id, year)
);

-- Uppladdade filer
CREATE TABLE IF NOT EXISTS uploaded_files (
    id TEXT PRIMARY KEY,
    file_name TEXT NOT NULL,
    file_size INTEGER NOT NULL DEFAULT 0,
    year INTEGER NOT NULL,
    checklist_id INTEGER,
    checklist_description TEXT,
    aspect TEXT,
    status TEXT NOT NULL DEFAULT 'uploaded',
    unit TEXT,
    note TEXT,
    row_number INTEGER,
    relative_path TEXT,
    upload_date TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_uploaded_files_year ON uploaded_files(year);
CREATE INDEX IF NOT EXISTS idx_uploaded_files_checklist ON uploaded_files(checklist_id);

-- Dokumentmetadata
CREATE TABLE IF NOT EXISTS document_metadata (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    document_number TEXT NOT NULL DEFAULT '',
    document_date TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    direktorat TEXT NOT NULL DEFAULT '',
    subdirektorat TEXT NOT NULL DEFAULT '',
    division TEXT NOT NULL DEFAULT '',
    file_name TEXT NOT NULL,
    file_size INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'active',
    confidentiality TEXT NOT NULL DEFAULT 'internal',
    note TEXT,
    year INTEGER NOT NULL,
    uploaded_by TEXT NOT NULL DEFAULT '',
    upload_date TEXT NOT NULL DEFAULT (datetime('now')),
    checklist_id INTEGER,
    checklist_description TEXT,
    aspect TEXT
);

CREATE INDEX IF NOT EXISTS idx_document_metadata_year ON document_metadata(year);

-- Bedömningsrader (penilaian)
CREATE TABLE IF NOT EXISTS assessment_rows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    year INTEGER NOT NULL,
    no INTEGER NOT NULL DEFAULT 0,
    aspect TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    weight REAL NOT NULL DEFAULT 0,
    score REAL NOT NULL DEFAULT 0,
    achievement INTEGER NOT NULL DEFAULT 0,
    classification TEXT NOT NULL,
    classification_override TEXT,
    assessor TEXT NOT NULL DEFAULT '',
    assessment_type TEXT NOT NULL DEFAULT '',
    saved_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_assessment_rows_year ON assessment_rows(year);

-- Användare
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user',
    direktorat TEXT,
    subdirektorat TEXT,
    divisi TEXT,
    created_year INTEGER,
    password_hash TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Migrationshistorik
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Area of Improvement. Egen konstant så att migration v3 kan återanvända den.
pub const CREATE_AOI_TABLES: &str = r#"
-- AOI-tabeller per år och målenhet
CREATE TABLE IF NOT EXISTS aoi_tables (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    year INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    target_type TEXT NOT NULL DEFAULT 'divisi',
    target_direktorat TEXT,
    target_subdirektorat TEXT,
    target_divisi TEXT,
    created_by TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_aoi_tables_year ON aoi_tables(year);

-- Rekommendationer och råd
CREATE TABLE IF NOT EXISTS aoi_recommendations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    table_id INTEGER NOT NULL,
    kind TEXT NOT NULL DEFAULT 'REKOMENDASI',
    no INTEGER NOT NULL DEFAULT 0,
    recommendation TEXT NOT NULL DEFAULT '',
    suggestion TEXT NOT NULL DEFAULT '',
    related_party TEXT NOT NULL DEFAULT '',
    follow_up_direktorat TEXT NOT NULL DEFAULT '',
    follow_up_subdirektorat TEXT NOT NULL DEFAULT '',
    follow_up_divisi TEXT NOT NULL DEFAULT '',
    aspect TEXT,
    urgency INTEGER NOT NULL DEFAULT 1,
    timeframe TEXT NOT NULL DEFAULT '',
    year INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    created_by TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (table_id) REFERENCES aoi_tables(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_aoi_recommendations_table ON aoi_recommendations(table_id);
CREATE INDEX IF NOT EXISTS idx_aoi_recommendations_year ON aoi_recommendations(year);

-- Uppföljning per rekommendation
CREATE TABLE IF NOT EXISTS aoi_tracking (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    recommendation_id INTEGER NOT NULL UNIQUE,
    rups INTEGER NOT NULL DEFAULT 0,
    board_of_commissioners INTEGER NOT NULL DEFAULT 0,
    commissioners_secretariat INTEGER NOT NULL DEFAULT 0,
    committee INTEGER NOT NULL DEFAULT 0,
    board_of_directors INTEGER NOT NULL DEFAULT 0,
    corporate_secretary INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    updated_by TEXT NOT NULL DEFAULT '',
    last_updated TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (recommendation_id) REFERENCES aoi_recommendations(id) ON DELETE CASCADE
);

-- Bevisdokument. Filerna på disk tas bort av backend, därför ingen kaskad.
CREATE TABLE IF NOT EXISTS aoi_documents (
    id TEXT PRIMARY KEY,
    recommendation_id INTEGER NOT NULL,
    kind TEXT NOT NULL DEFAULT 'REKOMENDASI',
    no INTEGER NOT NULL DEFAULT 0,
    file_name TEXT NOT NULL,
    file_size INTEGER NOT NULL DEFAULT 0,
    file_type TEXT NOT NULL DEFAULT 'application/octet-stream',
    user_id TEXT NOT NULL DEFAULT '',
    user_direktorat TEXT NOT NULL DEFAULT '',
    user_subdirektorat TEXT NOT NULL DEFAULT '',
    user_divisi TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'active',
    year INTEGER NOT NULL,
    relative_path TEXT,
    upload_date TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_aoi_documents_recommendation ON aoi_documents(recommendation_id);
"#;

/// Standardaspekter att skapa för ett nytt år
pub const DEFAULT_ASPECTS: &[&str] = &[
    "Komitmen terhadap Penerapan Tata Kelola secara Berkelanjutan",
    "Pemegang Saham dan RUPS",
    "Dewan Komisaris",
    "Direksi",
    "Pengungkapan Informasi dan Transparansi",
    "Aspek Lainnya",
];
