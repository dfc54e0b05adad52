//! Filoperationer för dokumentlagringen

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Skriv bytes till fil, skapar kataloger vid behov
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Kunde inte skapa katalog: {:?}", parent))?;
    }

    fs::write(path, bytes).with_context(|| format!("Kunde inte skriva till fil: {:?}", path))
}

/// Ta bort en fil
pub fn delete_file(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Kunde inte ta bort fil: {:?}", path))?;
    }
    Ok(())
}

/// Ta bort en katalog rekursivt
pub fn delete_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    fs::remove_dir_all(path).with_context(|| format!("Kunde inte ta bort katalog: {:?}", path))
}

/// Hämta filstorlek i bytes
pub fn get_file_size(path: &Path) -> Result<u64> {
    let metadata =
        fs::metadata(path).with_context(|| format!("Kunde inte läsa metadata för: {:?}", path))?;
    Ok(metadata.len())
}

/// Skanna katalog och returnera filer med relativ sökväg
pub fn scan_directory_relative(base_dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    if !base_dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(base_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file() {
            let full_path = entry.path().to_path_buf();
            if let Ok(relative) = full_path.strip_prefix(base_dir) {
                // Normalisera till forward slashes
                let relative_normalized = relative.to_string_lossy().replace('\\', "/");
                files.push((full_path, relative_normalized));
            }
        }
    }

    Ok(files)
}
