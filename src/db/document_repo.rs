use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::models::DocumentMetadata;

const SELECT_COLUMNS: &str = "SELECT id, title, document_number, document_date, description,
        direktorat, subdirektorat, division, file_name, file_size, status, confidentiality,
        note, year, uploaded_by, upload_date, checklist_id, checklist_description, aspect
     FROM document_metadata";

pub struct DocumentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Hämta dokument, valfritt filtrerade på år
    pub fn find_all(&self, year: Option<i32>) -> Result<Vec<DocumentMetadata>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE ?1 IS NULL OR year = ?1 ORDER BY upload_date DESC, title",
            SELECT_COLUMNS
        ))?;

        let docs = stmt
            .query_map(params![year], |row| Ok(Self::row_to_document(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(docs)
    }

    /// Hämta dokument via ID
    pub fn find_by_id(&self, id: &str) -> Result<Option<DocumentMetadata>> {
        let conn = lock(&self.conn)?;
        let doc = conn
            .query_row(&format!("{} WHERE id = ?", SELECT_COLUMNS), [id], |row| {
                Ok(Self::row_to_document(row))
            })
            .optional()?;

        Ok(doc)
    }

    /// Skapa dokument
    pub fn create(&self, doc: &mut DocumentMetadata) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO document_metadata (id, title, document_number, document_date,
                description, direktorat, subdirektorat, division, file_name, file_size, status,
                confidentiality, note, year, uploaded_by, checklist_id, checklist_description,
                aspect, upload_date)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                COALESCE(?, datetime('now')))",
            params![
                doc.id,
                doc.title,
                doc.document_number,
                doc.document_date,
                doc.description,
                doc.direktorat,
                doc.subdirektorat,
                doc.division,
                doc.file_name,
                doc.file_size,
                doc.status,
                doc.confidentiality,
                doc.note,
                doc.year,
                doc.uploaded_by,
                doc.checklist_id,
                doc.checklist_description,
                doc.aspect,
                doc.upload_date,
            ],
        )?;

        if doc.upload_date.is_none() {
            doc.upload_date = conn
                .query_row(
                    "SELECT upload_date FROM document_metadata WHERE id = ?",
                    [&doc.id],
                    |row| row.get(0),
                )
                .optional()?;
        }

        Ok(())
    }

    /// Uppdatera dokument. Returnerar false om dokumentet saknas.
    pub fn update(&self, doc: &DocumentMetadata) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE document_metadata SET
                title = ?, document_number = ?, document_date = ?, description = ?,
                status = ?, confidentiality = ?, note = ?
             WHERE id = ?",
            params![
                doc.title,
                doc.document_number,
                doc.document_date,
                doc.description,
                doc.status,
                doc.confidentiality,
                doc.note,
                doc.id,
            ],
        )?;

        Ok(affected > 0)
    }

    /// Ta bort dokument
    pub fn delete(&self, id: &str) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute("DELETE FROM document_metadata WHERE id = ?", [id])?;
        Ok(affected > 0)
    }

    fn row_to_document(row: &Row) -> DocumentMetadata {
        DocumentMetadata {
            id: row.get(0).unwrap_or_default(),
            title: row.get(1).unwrap_or_default(),
            document_number: row.get(2).unwrap_or_default(),
            document_date: row.get(3).unwrap_or_default(),
            description: row.get(4).unwrap_or_default(),
            direktorat: row.get(5).unwrap_or_default(),
            subdirektorat: row.get(6).unwrap_or_default(),
            division: row.get(7).unwrap_or_default(),
            file_name: row.get(8).unwrap_or_default(),
            file_size: row.get(9).unwrap_or_default(),
            status: row.get(10).unwrap_or_default(),
            confidentiality: row.get(11).unwrap_or_default(),
            note: row.get(12).ok().flatten(),
            year: row.get(13).unwrap_or_default(),
            uploaded_by: row.get(14).unwrap_or_default(),
            upload_date: row.get(15).ok(),
            checklist_id: row.get(16).ok().flatten(),
            checklist_description: row.get(17).ok().flatten(),
            aspect: row.get(18).ok().flatten(),
        }
    }
}
