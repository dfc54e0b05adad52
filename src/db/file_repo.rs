//! Repository för uppladdade filer

use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::lock;
use crate::models::{FileStatus, UploadedFile};

const SELECT_COLUMNS: &str = "SELECT id, file_name, file_size, upload_date, year, checklist_id,
        checklist_description, aspect, status, unit, note, row_number, relative_path
     FROM uploaded_files";

pub struct FileRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FileRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Filer, valfritt filtrerade på år, nyaste först
    pub fn find_all(&self, year: Option<i32>) -> Result<Vec<UploadedFile>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE ?1 IS NULL OR year = ?1 ORDER BY upload_date DESC, file_name",
            SELECT_COLUMNS
        ))?;

        let files = stmt
            .query_map(params![year], |row| Ok(Self::row_to_file(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(files)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<UploadedFile>> {
        let conn = lock(&self.conn)?;
        let file = conn
            .query_row(&format!("{} WHERE id = ?", SELECT_COLUMNS), [id], |row| {
                Ok(Self::row_to_file(row))
            })
            .optional()?;

        Ok(file)
    }

    pub fn find_by_checklist(&self, checklist_id: i64) -> Result<Vec<UploadedFile>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!("{} WHERE checklist_id = ?", SELECT_COLUMNS))?;

        let files = stmt
            .query_map([checklist_id], |row| Ok(Self::row_to_file(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(files)
    }

    /// Filer för en rad (år, enhet, radnummer)
    pub fn find_by_row(&self, year: i32, unit: &str, row_number: i32) -> Result<Vec<UploadedFile>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE year = ? AND unit = ? AND row_number = ?",
            SELECT_COLUMNS
        ))?;

        let files = stmt
            .query_map(params![year, unit, row_number], |row| Ok(Self::row_to_file(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(files)
    }

    pub fn find_by_relative_path(&self, relative_path: &str) -> Result<Option<UploadedFile>> {
        let conn = lock(&self.conn)?;
        let file = conn
            .query_row(
                &format!("{} WHERE relative_path = ?", SELECT_COLUMNS),
                [relative_path],
                |row| Ok(Self::row_to_file(row)),
            )
            .optional()?;

        Ok(file)
    }

    pub fn create(&self, file: &mut UploadedFile) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO uploaded_files (id, file_name, file_size, year, checklist_id,
                checklist_description, aspect, status, unit, note, row_number, relative_path,
                upload_date)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, COALESCE(?, datetime('now')))",
            params![
                file.id,
                file.file_name,
                file.file_size,
                file.year,
                file.checklist_id,
                file.checklist_description,
                file.aspect,
                file.status.to_string(),
                file.unit,
                file.note,
                file.row_number,
                file.relative_path,
                file.upload_date,
            ],
        )?;

        if file.upload_date.is_none() {
            file.upload_date = conn
                .query_row(
                    "SELECT upload_date FROM uploaded_files WHERE id = ?",
                    [&file.id],
                    |row| row.get(0),
                )
                .optional()?;
        }

        Ok(())
    }

    /// Uppdatera storlek och status efter en skanning av dokumentkatalogen
    pub fn update_scan(&self, id: &str, file_size: i64, status: FileStatus) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE uploaded_files SET file_size = ?, status = ? WHERE id = ?",
            params![file_size, status.to_string(), id],
        )?;
        Ok(affected > 0)
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute("DELETE FROM uploaded_files WHERE id = ?", [id])?;
        Ok(affected > 0)
    }

    /// Ta bort alla poster för ett checklistobjekt (vid ersättning)
    pub fn delete_by_checklist(&self, checklist_id: i64, year: i32) -> Result<usize> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "DELETE FROM uploaded_files WHERE checklist_id = ? AND year = ?",
            params![checklist_id, year],
        )?;
        Ok(affected)
    }

    pub fn delete_by_row(&self, year: i32, unit: &str, row_number: i32) -> Result<usize> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "DELETE FROM uploaded_files WHERE year = ? AND unit = ? AND row_number = ?",
            params![year, unit, row_number],
        )?;
        Ok(affected)
    }

    fn row_to_file(row: &Row) -> UploadedFile {
        let status: String = row.get(8).unwrap_or_default();
        UploadedFile {
            id: row.get(0).unwrap_or_default(),
            file_name: row.get(1).unwrap_or_default(),
            file_size: row.get(2).unwrap_or_default(),
            upload_date: row.get(3).ok(),
            year: row.get(4).unwrap_or_default(),
            checklist_id: row.get(5).ok().flatten(),
            checklist_description: row.get(6).ok().flatten(),
            aspect: row.get(7).ok().flatten(),
            status: FileStatus::from_db_str(&status),
            unit: row.get(9).ok().flatten(),
            note: row.get(10).ok().flatten(),
            row_number: row.get(11).ok().flatten(),
            relative_path: row.get(12).ok().flatten(),
        }
    }
}
