//! Repository för tilldelningar checklist -> enhet

use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::{params, Connection, Row};

use super::lock;
use crate::models::{Assignment, UnitType};

pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn find_all(&self, year: Option<i32>) -> Result<Vec<Assignment>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, checklist_id, year, unit_name, unit_type, aspect, assigned_at
             FROM assignments
             WHERE ?1 IS NULL OR year = ?1
             ORDER BY year DESC, checklist_id",
        )?;

        let assignments = stmt
            .query_map(params![year], |row| Ok(Self::row_to_assignment(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(assignments)
    }

    /// Skapa eller ersätt tilldelningen för (checklist_id, år).
    ///
    /// Checklistobjektets `assigned_unit` uppdateras i samma transaktion.
    pub fn upsert(&self, assignment: &mut Assignment) -> Result<i64> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO assignments (checklist_id, year, unit_name, unit_type, aspect, assigned_at)
             VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
             ON CONFLICT (checklist_id, year) DO UPDATE SET
                unit_name = excluded.unit_name,
                unit_type = excluded.unit_type,
                aspect = excluded.aspect,
                assigned_at = excluded.assigned_at",
            params![
                assignment.checklist_id,
                assignment.year,
                assignment.unit_name,
                assignment.unit_type.to_string(),
                assignment.aspect,
            ],
        )?;

        let (id, assigned_at): (i64, String) = tx.query_row(
            "SELECT id, assigned_at FROM assignments WHERE checklist_id = ? AND year = ?",
            params![assignment.checklist_id, assignment.year],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        tx.execute(
            "UPDATE checklist_items SET assigned_unit = ? WHERE id = ?",
            params![assignment.unit_name, assignment.checklist_id],
        )?;

        tx.commit()?;

        assignment.id = Some(id);
        assignment.assigned_at = Some(assigned_at);
        Ok(id)
    }

    /// Ta bort tilldelningen och rensa checklistobjektets enhet
    pub fn delete(&self, checklist_id: i64, year: i32) -> Result<bool> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        let affected = tx.execute(
            "DELETE FROM assignments WHERE checklist_id = ? AND year = ?",
            params![checklist_id, year],
        )?;
        tx.execute(
            "UPDATE checklist_items SET assigned_unit = NULL WHERE id = ? AND year = ?",
            params![checklist_id, year],
        )?;

        tx.commit()?;
        Ok(affected > 0)
    }

    fn row_to_assignment(row: &Row) -> Assignment {
        let unit_type: String = row.get(4).unwrap_or_default();
        Assignment {
            id: row.get(0).ok(),
            checklist_id: row.get(1).unwrap_or_default(),
            year: row.get(2).unwrap_or_default(),
            unit_name: row.get(3).unwrap_or_default(),
            unit_type: UnitType::from_db_str(&unit_type),
            aspect: row.get(5).ok().flatten(),
            assigned_at: row.get(6).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::ChecklistItem;

    #[test]
    fn test_upsert_replaces_per_key() {
        let db = Database::open_in_memory().unwrap();
        let mut item = ChecklistItem::new("Direksi", "Pedoman Direksi", 2024);
        let checklist_id = db.checklists().create(&mut item).unwrap();

        let repo = db.assignments();
        let mut first = Assignment::new(checklist_id, 2024, "Divisi Treasury", UnitType::Division);
        repo.upsert(&mut first).unwrap();

        let mut second = Assignment::new(
            checklist_id,
            2024,
            "Sub Direktorat Treasury",
            UnitType::Subdirectorate,
        );
        repo.upsert(&mut second).unwrap();

        let all = repo.find_all(Some(2024)).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].unit_name, "Sub Direktorat Treasury");
        assert_eq!(all[0].unit_type, UnitType::Subdirectorate);
        assert_eq!(first.id, second.id);

        let stored = db.checklists().find_by_id(checklist_id).unwrap().unwrap();
        assert_eq!(stored.assigned_unit.as_deref(), Some("Sub Direktorat Treasury"));
    }

    #[test]
    fn test_delete_clears_checklist_unit() {
        let db = Database::open_in_memory().unwrap();
        let mut item = ChecklistItem::new("Direksi", "Pedoman Direksi", 2024);
        let checklist_id = db.checklists().create(&mut item).unwrap();

        let mut assignment = Assignment::new(checklist_id, 2024, "Divisi Treasury", UnitType::Division);
        db.assignments().upsert(&mut assignment).unwrap();

        assert!(db.assignments().delete(checklist_id, 2024).unwrap());
        assert!(!db.assignments().delete(checklist_id, 2024).unwrap());
        assert!(db.assignments().find_all(None).unwrap().is_empty());

        let stored = db.checklists().find_by_id(checklist_id).unwrap().unwrap();
        assert!(stored.assigned_unit.is_none());
    }
}
