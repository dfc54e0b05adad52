//! Repository för räkenskapsår och årsrensning

use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::{params, Connection, Row, Transaction};

use super::lock;
use crate::models::{FiscalYear, YearCleanupStats};

/// Vad som ska rensas för ett år
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeScope {
    /// Endast uppladdade filer och dokumentmetadata
    Documents,
    /// All årsdata, men året finns kvar
    AllData,
    /// All årsdata och själva året
    Year,
}

pub struct YearRepository {
    conn: Arc<Mutex<Connection>>,
}

impl YearRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Alla år, senaste först
    pub fn find_all(&self) -> Result<Vec<FiscalYear>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT year, is_active, created_at FROM years ORDER BY year DESC",
        )?;

        let years = stmt
            .query_map([], |row| Ok(Self::row_to_year(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(years)
    }

    pub fn exists(&self, year: i32) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM years WHERE year = ?)",
            [year],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn create(&self, year: i32) -> Result<FiscalYear> {
        let conn = lock(&self.conn)?;
        conn.execute("INSERT INTO years (year) VALUES (?)", [year])?;

        let created = conn.query_row(
            "SELECT year, is_active, created_at FROM years WHERE year = ?",
            [year],
            |row| Ok(Self::row_to_year(row)),
        )?;

        Ok(created)
    }

    /// Rensa ett år i en transaktion och returnera vad som togs bort
    pub fn purge(&self, year: i32, scope: PurgeScope) -> Result<YearCleanupStats> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        let stats = Self::purge_in(&tx, year, scope)?;

        tx.commit()?;

        tracing::info!("Rensade år {} ({:?}): {}", year, scope, stats.summary());
        Ok(stats)
    }

    fn purge_in(tx: &Transaction<'_>, year: i32, scope: PurgeScope) -> Result<YearCleanupStats> {
        let mut stats = YearCleanupStats {
            uploaded_files: tx.execute("DELETE FROM uploaded_files WHERE year = ?", [year])?,
            documents: tx.execute("DELETE FROM document_metadata WHERE year = ?", [year])?,
            aoi: tx.execute("DELETE FROM aoi_documents WHERE year = ?", [year])?,
            ..Default::default()
        };

        if scope == PurgeScope::Documents {
            return Ok(stats);
        }

        stats.assignments = tx.execute("DELETE FROM assignments WHERE year = ?", [year])?;
        stats.checklist = tx.execute("DELETE FROM checklist_items WHERE year = ?", [year])?;
        stats.aspects = tx.execute("DELETE FROM aspects WHERE year = ?", [year])?;
        stats.structure = tx.execute("DELETE FROM org_units WHERE year = ?", [year])?;
        stats.assessments = tx.execute("DELETE FROM assessment_rows WHERE year = ?", [year])?;
        // Uppföljningen har inget eget år
        stats.aoi += tx.execute(
            "DELETE FROM aoi_tracking WHERE recommendation_id IN
                (SELECT id FROM aoi_recommendations WHERE year = ?)",
            [year],
        )?;
        stats.aoi += tx.execute("DELETE FROM aoi_recommendations WHERE year = ?", [year])?;
        stats.aoi += tx.execute("DELETE FROM aoi_tables WHERE year = ?", [year])?;
        stats.users = tx.execute(
            "DELETE FROM users WHERE created_year = ? AND role != 'superadmin'",
            params![year],
        )?;

        if scope == PurgeScope::Year {
            tx.execute("DELETE FROM years WHERE year = ?", [year])?;
        }

        Ok(stats)
    }

    fn row_to_year(row: &Row) -> FiscalYear {
        FiscalYear {
            year: row.get(0).unwrap_or_default(),
            is_active: row.get(1).unwrap_or(true),
            created_at: row.get(2).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{AoiKind, AoiRecommendation, AoiTable, AoiTargetType, ChecklistItem, Role, User};

    #[test]
    fn test_years_sorted_descending() {
        let db = Database::open_in_memory().unwrap();
        db.years().create(2022).unwrap();
        db.years().create(2024).unwrap();
        db.years().create(2023).unwrap();

        let years: Vec<i32> = db.years().find_all().unwrap().iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2024, 2023, 2022]);
        assert!(db.years().exists(2023).unwrap());
        assert!(!db.years().exists(2021).unwrap());
    }

    #[test]
    fn test_duplicate_year_fails() {
        let db = Database::open_in_memory().unwrap();
        db.years().create(2024).unwrap();
        assert!(db.years().create(2024).is_err());
    }

    #[test]
    fn test_purge_year_removes_all_rows() {
        let db = Database::open_in_memory().unwrap();
        db.years().create(2024).unwrap();
        db.years().create(2023).unwrap();

        let mut item = ChecklistItem::new("Direksi", "Pedoman Direksi", 2024);
        db.checklists().create(&mut item).unwrap();
        let mut other = ChecklistItem::new("Direksi", "Pedoman Direksi", 2023);
        db.checklists().create(&mut other).unwrap();

        let mut user = User::new("pic@example.com", "PIC", Role::User);
        user.created_year = Some(2024);
        db.users().create(&mut user).unwrap();

        let mut admin = User::new("root@example.com", "Root", Role::Superadmin);
        admin.created_year = Some(2024);
        db.users().create(&mut admin).unwrap();

        let stats = db.years().purge(2024, PurgeScope::Year).unwrap();
        assert_eq!(stats.checklist, 1);
        assert_eq!(stats.users, 1);

        assert!(!db.years().exists(2024).unwrap());
        assert!(db.checklists().find_by_year(2024).unwrap().is_empty());
        assert_eq!(db.checklists().find_by_year(2023).unwrap().len(), 1);
        assert_eq!(db.users().find_all().unwrap().len(), 1);
    }

    #[test]
    fn test_purge_all_data_keeps_year() {
        let db = Database::open_in_memory().unwrap();
        db.years().create(2024).unwrap();

        let mut item = ChecklistItem::new("Direksi", "Pedoman Direksi", 2024);
        db.checklists().create(&mut item).unwrap();

        let stats = db.years().purge(2024, PurgeScope::AllData).unwrap();
        assert_eq!(stats.checklist, 1);
        assert!(db.years().exists(2024).unwrap());
    }

    #[test]
    fn test_purge_removes_aoi_rows_of_the_year_only() {
        let db = Database::open_in_memory().unwrap();
        for year in [2023, 2024] {
            let mut table = AoiTable::new("AOI", year, AoiTargetType::Divisi);
            table.target_divisi = Some("Divisi Treasury".into());
            db.aoi().create_table(&mut table).unwrap();
            let mut rec =
                AoiRecommendation::new(table.id.unwrap(), AoiKind::Rekomendasi, "Perbaiki", year);
            db.aoi().create_recommendation(&mut rec).unwrap();
        }

        let stats = db.years().purge(2024, PurgeScope::Documents).unwrap();
        assert_eq!(stats.aoi, 0);
        assert_eq!(db.aoi().find_tables(Some(2024)).unwrap().len(), 1);

        // Tabell, rekommendation och uppföljning
        let stats = db.years().purge(2024, PurgeScope::AllData).unwrap();
        assert_eq!(stats.aoi, 3);
        assert!(db.aoi().find_tables(Some(2024)).unwrap().is_empty());
        assert_eq!(db.aoi().find_recommendations(Some(2023), None).unwrap().len(), 1);
        assert_eq!(db.aoi().find_tracking(Some(2023)).unwrap().len(), 1);
    }
}
