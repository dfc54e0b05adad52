use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::path::{get_database_path, get_document_root, get_session_path, get_settings_path};

/// Applikationsinställningar (settings.toml)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// SQLite-databasen
    pub database_path: PathBuf,
    /// Rot för uppladdade dokument (innehåller `gcg-documents/`)
    pub document_root: PathBuf,
    /// Lokalt sessionstillstånd
    pub session_path: PathBuf,
    /// Loggnivå: error, warn, info, debug, trace
    pub log_level: String,
    /// Namn som används som bedömare när inget anges
    pub default_assessor: String,
    /// Seeda standardstruktur när ett nytt år skapas
    pub seed_structure_on_new_year: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            database_path: get_database_path(),
            document_root: get_document_root(),
            session_path: get_session_path(),
            log_level: "info".to_string(),
            default_assessor: "Admin".to_string(),
            seed_structure_on_new_year: false,
        }
    }
}

impl AppSettings {
    /// Ladda från standardplatsen, faller tillbaka på default
    pub fn load() -> Self {
        Self::load_from(&get_settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Ogiltig inställningsfil {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&get_settings_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Katalog där dokument sorteras per år/enhet/checklist
    pub fn documents_directory(&self) -> PathBuf {
        self.document_root.join("gcg-documents")
    }

    pub fn tracing_level(&self) -> tracing::Level {
        match self.log_level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}
