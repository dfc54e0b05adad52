//! Repository för Area of Improvement

use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::lock;
use crate::models::{
    AoiDocument, AoiKind, AoiRecommendation, AoiStatus, AoiTable, AoiTargetType, AoiTracking,
    FollowUpUnit,
};

const TABLE_COLUMNS: &str = "SELECT id, name, description, year, is_active, target_type,
        target_direktorat, target_subdirektorat, target_divisi, created_by, created_at
     FROM aoi_tables";

const RECOMMENDATION_COLUMNS: &str = "SELECT id, table_id, kind, no, recommendation, suggestion,
        related_party, follow_up_direktorat, follow_up_subdirektorat, follow_up_divisi, aspect,
        urgency, timeframe, year, status, created_by, created_at, updated_at
     FROM aoi_recommendations";

const TRACKING_COLUMNS: &str = "SELECT t.id, t.recommendation_id, t.rups,
        t.board_of_commissioners, t.commissioners_secretariat, t.committee,
        t.board_of_directors, t.corporate_secretary, t.notes, t.last_updated, t.updated_by
     FROM aoi_tracking t";

const DOCUMENT_COLUMNS: &str = "SELECT id, file_name, file_size, upload_date, recommendation_id,
        kind, no, user_id, user_direktorat, user_subdirektorat, user_divisi, file_type, status,
        year, relative_path
     FROM aoi_documents";

pub struct AoiRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AoiRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    // ── Tabeller ───────────────────────────────────────────────────

    pub fn find_tables(&self, year: Option<i32>) -> Result<Vec<AoiTable>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE ?1 IS NULL OR year = ?1 ORDER BY year DESC, id",
            TABLE_COLUMNS
        ))?;

        let tables = stmt
            .query_map(params![year], |row| Ok(Self::row_to_table(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(tables)
    }

    pub fn find_table(&self, id: i64) -> Result<Option<AoiTable>> {
        let conn = lock(&self.conn)?;
        Self::query_table(&conn, id)
    }

    fn query_table(conn: &Connection, id: i64) -> Result<Option<AoiTable>> {
        let table = conn
            .query_row(&format!("{} WHERE id = ?", TABLE_COLUMNS), [id], |row| {
                Ok(Self::row_to_table(row))
            })
            .optional()?;
        Ok(table)
    }

    pub fn create_table(&self, table: &mut AoiTable) -> Result<i64> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO aoi_tables (name, description, year, is_active, target_type,
                target_direktorat, target_subdirektorat, target_divisi, created_by)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                table.name,
                table.description,
                table.year,
                table.is_active,
                table.target_type.as_str(),
                table.target_direktorat,
                table.target_subdirektorat,
                table.target_divisi,
                table.created_by,
            ],
        )?;

        let id = conn.last_insert_rowid();
        if let Some(stored) = Self::query_table(&conn, id)? {
            *table = stored;
        }
        Ok(id)
    }

    /// Returnerar false om tabellen saknas
    pub fn update_table(&self, table: &AoiTable) -> Result<bool> {
        let Some(id) = table.id else {
            return Ok(false);
        };

        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE aoi_tables SET name = ?, description = ?, is_active = ?, target_type = ?,
                target_direktorat = ?, target_subdirektorat = ?, target_divisi = ?
             WHERE id = ?",
            params![
                table.name,
                table.description,
                table.is_active,
                table.target_type.as_str(),
                table.target_direktorat,
                table.target_subdirektorat,
                table.target_divisi,
                id,
            ],
        )?;

        Ok(affected > 0)
    }

    /// Ta bort tabellen med rekommendationer, uppföljning och dokumentposter
    pub fn delete_table(&self, id: i64) -> Result<bool> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM aoi_documents WHERE recommendation_id IN
                (SELECT id FROM aoi_recommendations WHERE table_id = ?)",
            [id],
        )?;
        tx.execute(
            "DELETE FROM aoi_tracking WHERE recommendation_id IN
                (SELECT id FROM aoi_recommendations WHERE table_id = ?)",
            [id],
        )?;
        tx.execute("DELETE FROM aoi_recommendations WHERE table_id = ?", [id])?;
        let affected = tx.execute("DELETE FROM aoi_tables WHERE id = ?", [id])?;

        tx.commit()?;
        Ok(affected > 0)
    }

    // ── Rekommendationer ───────────────────────────────────────────

    /// Rekommendationer, valfritt filtrerade på år och tabell
    pub fn find_recommendations(&self, year: Option<i32>, table_id: Option<i64>) -> Result<Vec<AoiRecommendation>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE (?1 IS NULL OR year = ?1) AND (?2 IS NULL OR table_id = ?2)
             ORDER BY table_id, no, id",
            RECOMMENDATION_COLUMNS
        ))?;

        let recommendations = stmt
            .query_map(params![year, table_id], |row| Ok(Self::row_to_recommendation(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(recommendations)
    }

    pub fn find_recommendation(&self, id: i64) -> Result<Option<AoiRecommendation>> {
        let conn = lock(&self.conn)?;
        Self::query_recommendation(&conn, id)
    }

    fn query_recommendation(conn: &Connection, id: i64) -> Result<Option<AoiRecommendation>> {
        let recommendation = conn
            .query_row(&format!("{} WHERE id = ?", RECOMMENDATION_COLUMNS), [id], |row| {
                Ok(Self::row_to_recommendation(row))
            })
            .optional()?;
        Ok(recommendation)
    }

    /// Skapa en rekommendation med nästa nummer i tabellen och en tom uppföljning
    pub fn create_recommendation(&self, rec: &mut AoiRecommendation) -> Result<i64> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        let next_no: i32 = tx.query_row(
            "SELECT COALESCE(MAX(no), 0) + 1 FROM aoi_recommendations WHERE table_id = ?",
            [rec.table_id],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO aoi_recommendations (table_id, kind, no, recommendation, suggestion,
                related_party, follow_up_direktorat, follow_up_subdirektorat, follow_up_divisi,
                aspect, urgency, timeframe, year, status, created_by)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                rec.table_id,
                rec.kind.as_str(),
                next_no,
                rec.recommendation,
                rec.suggestion,
                rec.related_party,
                rec.follow_up.direktorat,
                rec.follow_up.subdirektorat,
                rec.follow_up.divisi,
                rec.aspect,
                rec.urgency,
                rec.timeframe,
                rec.year,
                rec.status.as_str(),
                rec.created_by,
            ],
        )?;
        let id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO aoi_tracking (recommendation_id, updated_by) VALUES (?, ?)",
            params![id, rec.created_by],
        )?;

        if let Some(stored) = Self::query_recommendation(&tx, id)? {
            *rec = stored;
        }
        tx.commit()?;
        Ok(id)
    }

    /// Uppdatera innehållet. Tabell och nummer ändras inte.
    pub fn update_recommendation(&self, rec: &AoiRecommendation) -> Result<bool> {
        let Some(id) = rec.id else {
            return Ok(false);
        };

        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE aoi_recommendations SET kind = ?, recommendation = ?, suggestion = ?,
                related_party = ?, follow_up_direktorat = ?, follow_up_subdirektorat = ?,
                follow_up_divisi = ?, aspect = ?, urgency = ?, timeframe = ?, status = ?,
                updated_at = datetime('now')
             WHERE id = ?",
            params![
                rec.kind.as_str(),
                rec.recommendation,
                rec.suggestion,
                rec.related_party,
                rec.follow_up.direktorat,
                rec.follow_up.subdirektorat,
                rec.follow_up.divisi,
                rec.aspect,
                rec.urgency,
                rec.timeframe,
                rec.status.as_str(),
                id,
            ],
        )?;

        Ok(affected > 0)
    }

    pub fn delete_recommendation(&self, id: i64) -> Result<bool> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM aoi_documents WHERE recommendation_id = ?", [id])?;
        tx.execute("DELETE FROM aoi_tracking WHERE recommendation_id = ?", [id])?;
        let affected = tx.execute("DELETE FROM aoi_recommendations WHERE id = ?", [id])?;

        tx.commit()?;
        Ok(affected > 0)
    }

    // ── Uppföljning ────────────────────────────────────────────────

    pub fn find_tracking(&self, year: Option<i32>) -> Result<Vec<AoiTracking>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "{} JOIN aoi_recommendations r ON r.id = t.recommendation_id
             WHERE ?1 IS NULL OR r.year = ?1
             ORDER BY r.table_id, r.no",
            TRACKING_COLUMNS
        ))?;

        let tracking = stmt
            .query_map(params![year], |row| Ok(Self::row_to_tracking(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(tracking)
    }

    pub fn find_tracking_for(&self, recommendation_id: i64) -> Result<Option<AoiTracking>> {
        let conn = lock(&self.conn)?;
        Self::query_tracking(&conn, recommendation_id)
    }

    fn query_tracking(conn: &Connection, recommendation_id: i64) -> Result<Option<AoiTracking>> {
        let tracking = conn
            .query_row(
                &format!("{} WHERE t.recommendation_id = ?", TRACKING_COLUMNS),
                [recommendation_id],
                |row| Ok(Self::row_to_tracking(row)),
            )
            .optional()?;
        Ok(tracking)
    }

    /// Skriv uppföljningen för en rekommendation. `None` om den saknas.
    pub fn update_tracking(&self, tracking: &AoiTracking) -> Result<Option<AoiTracking>> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE aoi_tracking SET rups = ?, board_of_commissioners = ?,
                commissioners_secretariat = ?, committee = ?, board_of_directors = ?,
                corporate_secretary = ?, notes = ?, updated_by = ?,
                last_updated = datetime('now')
             WHERE recommendation_id = ?",
            params![
                tracking.rups,
                tracking.board_of_commissioners,
                tracking.commissioners_secretariat,
                tracking.committee,
                tracking.board_of_directors,
                tracking.corporate_secretary,
                tracking.notes,
                tracking.updated_by,
                tracking.recommendation_id,
            ],
        )?;

        if affected == 0 {
            return Ok(None);
        }
        Self::query_tracking(&conn, tracking.recommendation_id)
    }

    // ── Dokument ───────────────────────────────────────────────────

    pub fn find_documents(&self, year: Option<i32>) -> Result<Vec<AoiDocument>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE ?1 IS NULL OR year = ?1 ORDER BY upload_date DESC, file_name",
            DOCUMENT_COLUMNS
        ))?;

        let docs = stmt
            .query_map(params![year], |row| Ok(Self::row_to_document(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(docs)
    }

    pub fn find_document(&self, id: &str) -> Result<Option<AoiDocument>> {
        let conn = lock(&self.conn)?;
        let doc = conn
            .query_row(&format!("{} WHERE id = ?", DOCUMENT_COLUMNS), [id], |row| {
                Ok(Self::row_to_document(row))
            })
            .optional()?;

        Ok(doc)
    }

    pub fn find_documents_by_recommendation(&self, recommendation_id: i64) -> Result<Vec<AoiDocument>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE recommendation_id = ? ORDER BY upload_date DESC",
            DOCUMENT_COLUMNS
        ))?;

        let docs = stmt
            .query_map([recommendation_id], |row| Ok(Self::row_to_document(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(docs)
    }

    pub fn find_documents_by_table(&self, table_id: i64) -> Result<Vec<AoiDocument>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE recommendation_id IN
                (SELECT id FROM aoi_recommendations WHERE table_id = ?)",
            DOCUMENT_COLUMNS
        ))?;

        let docs = stmt
            .query_map([table_id], |row| Ok(Self::row_to_document(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(docs)
    }

    pub fn create_document(&self, doc: &mut AoiDocument) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO aoi_documents (id, recommendation_id, kind, no, file_name, file_size,
                file_type, user_id, user_direktorat, user_subdirektorat, user_divisi, status,
                year, relative_path, upload_date)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, COALESCE(?, datetime('now')))",
            params![
                doc.id,
                doc.recommendation_id,
                doc.kind.as_str(),
                doc.no,
                doc.file_name,
                doc.file_size,
                doc.file_type,
                doc.user_id,
                doc.user_direktorat,
                doc.user_subdirektorat,
                doc.user_divisi,
                doc.status,
                doc.year,
                doc.relative_path,
                doc.upload_date,
            ],
        )?;

        if doc.upload_date.is_none() {
            doc.upload_date = conn
                .query_row(
                    "SELECT upload_date FROM aoi_documents WHERE id = ?",
                    [&doc.id],
                    |row| row.get(0),
                )
                .optional()?;
        }

        Ok(())
    }

    pub fn delete_document(&self, id: &str) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute("DELETE FROM aoi_documents WHERE id = ?", [id])?;
        Ok(affected > 0)
    }

    // ── Radkonvertering ────────────────────────────────────────────

    fn row_to_table(row: &Row) -> AoiTable {
        let target_type: String = row.get(5).unwrap_or_default();
        AoiTable {
            id: row.get(0).ok(),
            name: row.get(1).unwrap_or_default(),
            description: row.get(2).unwrap_or_default(),
            year: row.get(3).unwrap_or_default(),
            is_active: row.get(4).unwrap_or(true),
            target_type: AoiTargetType::from_db_str(&target_type),
            target_direktorat: row.get(6).ok().flatten(),
            target_subdirektorat: row.get(7).ok().flatten(),
            target_divisi: row.get(8).ok().flatten(),
            created_by: row.get(9).unwrap_or_default(),
            created_at: row.get(10).ok(),
        }
    }

    fn row_to_recommendation(row: &Row) -> AoiRecommendation {
        let kind: String = row.get(2).unwrap_or_default();
        let status: String = row.get(14).unwrap_or_default();
        AoiRecommendation {
            id: row.get(0).ok(),
            table_id: row.get(1).unwrap_or_default(),
            kind: AoiKind::from_db_str(&kind),
            no: row.get(3).unwrap_or_default(),
            recommendation: row.get(4).unwrap_or_default(),
            suggestion: row.get(5).unwrap_or_default(),
            related_party: row.get(6).unwrap_or_default(),
            follow_up: FollowUpUnit {
                direktorat: row.get(7).unwrap_or_default(),
                subdirektorat: row.get(8).unwrap_or_default(),
                divisi: row.get(9).unwrap_or_default(),
            },
            aspect: row.get(10).ok().flatten(),
            urgency: row.get(11).unwrap_or(1),
            timeframe: row.get(12).unwrap_or_default(),
            year: row.get(13).unwrap_or_default(),
            status: AoiStatus::from_db_str(&status),
            created_by: row.get(15).unwrap_or_default(),
            created_at: row.get(16).ok(),
            updated_at: row.get(17).ok(),
        }
    }

    fn row_to_tracking(row: &Row) -> AoiTracking {
        AoiTracking {
            id: row.get(0).ok(),
            recommendation_id: row.get(1).unwrap_or_default(),
            rups: row.get(2).unwrap_or_default(),
            board_of_commissioners: row.get(3).unwrap_or_default(),
            commissioners_secretariat: row.get(4).unwrap_or_default(),
            committee: row.get(5).unwrap_or_default(),
            board_of_directors: row.get(6).unwrap_or_default(),
            corporate_secretary: row.get(7).unwrap_or_default(),
            notes: row.get(8).ok().flatten(),
            last_updated: row.get(9).ok(),
            updated_by: row.get(10).unwrap_or_default(),
        }
    }

    fn row_to_document(row: &Row) -> AoiDocument {
        let kind: String = row.get(5).unwrap_or_default();
        AoiDocument {
            id: row.get(0).unwrap_or_default(),
            file_name: row.get(1).unwrap_or_default(),
            file_size: row.get(2).unwrap_or_default(),
            upload_date: row.get(3).ok(),
            recommendation_id: row.get(4).unwrap_or_default(),
            kind: AoiKind::from_db_str(&kind),
            no: row.get(6).unwrap_or_default(),
            user_id: row.get(7).unwrap_or_default(),
            user_direktorat: row.get(8).unwrap_or_default(),
            user_subdirektorat: row.get(9).unwrap_or_default(),
            user_divisi: row.get(10).unwrap_or_default(),
            file_type: row.get(11).unwrap_or_default(),
            status: row.get(12).unwrap_or_default(),
            year: row.get(13).unwrap_or_default(),
            relative_path: row.get(14).ok().flatten(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn table(db: &Database, year: i32) -> i64 {
        let mut table = AoiTable::new("AOI Keuangan", year, AoiTargetType::Direktorat);
        table.target_direktorat = Some("Direktorat Keuangan".into());
        db.aoi().create_table(&mut table).unwrap()
    }

    fn document(id: &str, recommendation_id: i64) -> AoiDocument {
        AoiDocument {
            id: id.into(),
            file_name: "bukti.pdf".into(),
            file_size: 3,
            upload_date: None,
            recommendation_id,
            kind: AoiKind::Rekomendasi,
            no: 1,
            user_id: String::new(),
            user_direktorat: String::new(),
            user_subdirektorat: String::new(),
            user_divisi: String::new(),
            file_type: "application/pdf".into(),
            status: "active".into(),
            year: 2024,
            relative_path: None,
        }
    }

    #[test]
    fn test_table_crud() {
        let db = Database::open_in_memory().unwrap();
        let id = table(&db, 2024);

        let mut stored = db.aoi().find_table(id).unwrap().unwrap();
        assert_eq!(stored.target_type, AoiTargetType::Direktorat);
        assert!(stored.created_at.is_some());

        stored.description = "Temuan asesmen 2024".into();
        assert!(db.aoi().update_table(&stored).unwrap());
        assert_eq!(db.aoi().find_tables(Some(2024)).unwrap()[0].description, "Temuan asesmen 2024");
        assert!(db.aoi().find_tables(Some(2023)).unwrap().is_empty());

        assert!(db.aoi().delete_table(id).unwrap());
        assert!(!db.aoi().delete_table(id).unwrap());
    }

    #[test]
    fn test_recommendation_numbers_and_tracking() {
        let db = Database::open_in_memory().unwrap();
        let table_id = table(&db, 2024);

        let mut first = AoiRecommendation::new(table_id, AoiKind::Rekomendasi, "A", 2024);
        let mut second = AoiRecommendation::new(table_id, AoiKind::Saran, "B", 2024);
        db.aoi().create_recommendation(&mut first).unwrap();
        db.aoi().create_recommendation(&mut second).unwrap();
        assert_eq!((first.no, second.no), (1, 2));

        let tracking = db.aoi().find_tracking_for(first.id.unwrap()).unwrap().unwrap();
        assert_eq!(tracking.completed_count(), 0);

        // Numret återanvänds inte efter borttagning
        assert!(db.aoi().delete_recommendation(first.id.unwrap()).unwrap());
        let mut third = AoiRecommendation::new(table_id, AoiKind::Rekomendasi, "C", 2024);
        db.aoi().create_recommendation(&mut third).unwrap();
        assert_eq!(third.no, 3);
        assert!(db.aoi().find_tracking_for(first.id.unwrap()).unwrap().is_none());
        assert_eq!(db.aoi().find_tracking(Some(2024)).unwrap().len(), 2);
    }

    #[test]
    fn test_update_tracking() {
        let db = Database::open_in_memory().unwrap();
        let table_id = table(&db, 2024);
        let mut rec = AoiRecommendation::new(table_id, AoiKind::Rekomendasi, "A", 2024);
        let rec_id = db.aoi().create_recommendation(&mut rec).unwrap();

        let mut tracking = AoiTracking::new(rec_id);
        tracking.rups = true;
        tracking.committee = true;
        tracking.notes = Some("Dibahas di RUPS".into());
        let stored = db.aoi().update_tracking(&tracking).unwrap().unwrap();
        assert_eq!(stored.completed_count(), 2);
        assert_eq!(stored.notes.as_deref(), Some("Dibahas di RUPS"));

        assert!(db.aoi().update_tracking(&AoiTracking::new(999)).unwrap().is_none());
    }

    #[test]
    fn test_delete_table_cascades() {
        let db = Database::open_in_memory().unwrap();
        let table_id = table(&db, 2024);
        let other_id = table(&db, 2024);

        let mut rec = AoiRecommendation::new(table_id, AoiKind::Rekomendasi, "A", 2024);
        let rec_id = db.aoi().create_recommendation(&mut rec).unwrap();
        db.aoi().create_document(&mut document("d1", rec_id)).unwrap();
        let mut kept = AoiRecommendation::new(other_id, AoiKind::Rekomendasi, "B", 2024);
        db.aoi().create_recommendation(&mut kept).unwrap();

        assert_eq!(db.aoi().find_documents_by_table(table_id).unwrap().len(), 1);
        assert!(db.aoi().delete_table(table_id).unwrap());

        assert!(db.aoi().find_recommendations(None, Some(table_id)).unwrap().is_empty());
        assert!(db.aoi().find_document("d1").unwrap().is_none());
        assert_eq!(db.aoi().find_recommendations(Some(2024), None).unwrap().len(), 1);
        assert_eq!(db.aoi().find_tracking(None).unwrap().len(), 1);
    }
}
