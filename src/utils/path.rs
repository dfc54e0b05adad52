use std::path::{Path, PathBuf};

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("id", "gcg-hub", "GcgHub")
}

/// Hämta databassökväg
pub fn get_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("gcg_hub.db"))
        .unwrap_or_else(|| PathBuf::from("gcg_hub.db"))
}

/// Hämta sökväg till inställningsfilen
pub fn get_settings_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .unwrap_or_else(|| PathBuf::from("settings.toml"))
}

/// Hämta sökväg till lokalt sessionstillstånd
pub fn get_session_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("session.json"))
        .unwrap_or_else(|| PathBuf::from("session.json"))
}

/// Rotkatalog för uppladdade dokument
pub fn get_document_root() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("storage"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Normalisera sökväg för visning
pub fn display_path(path: &Path) -> String {
    // Förkorta hemkatalogen till ~
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

/// Skapa en säker filnamn från en sträng
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Katalognamn för en organisationsenhet ("Divisi Human Capital" -> "Divisi_Human_Capital")
pub fn unit_dir_name(unit: &str) -> String {
    let cleaned = sanitize_filename(unit).replace(' ', "_");
    if cleaned.is_empty() {
        "Tanpa_PIC".to_string()
    } else {
        cleaned
    }
}

/// Tolka ett katalognamn tillbaka till enhetsnamn
pub fn unit_from_dir_name(dir_name: &str) -> String {
    dir_name.replace('_', " ")
}
