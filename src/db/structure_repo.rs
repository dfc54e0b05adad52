//! Repository för organisationsstruktur

use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::{params, Connection, Row};

use super::lock;
use crate::models::{OrgUnit, OrgUnitKind, OrgUnitUpdate};

pub struct StructureRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StructureRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Aktiva enheter, valfritt filtrerade på år
    pub fn find_all(&self, year: Option<i32>) -> Result<Vec<OrgUnit>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, kind, name, description, parent_id, year, is_active, created_at
             FROM org_units
             WHERE is_active = 1 AND (?1 IS NULL OR year = ?1)
             ORDER BY year DESC, kind, name",
        )?;

        let units = stmt
            .query_map(params![year], |row| Ok(Self::row_to_unit(row)))?
            .filter_map(|r| r.ok())
            .flatten()
            .collect();

        Ok(units)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<OrgUnit>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, kind, name, description, parent_id, year, is_active, created_at
             FROM org_units WHERE id = ? AND is_active = 1",
        )?;

        let unit = stmt
            .query_row([id], |row| Ok(Self::row_to_unit(row)))
            .ok()
            .flatten();

        Ok(unit)
    }

    pub fn create(&self, unit: &mut OrgUnit) -> Result<i64> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO org_units (kind, name, description, parent_id, year, is_active)
             VALUES (?, ?, ?, ?, ?, 1)",
            params![
                unit.kind.to_string(),
                unit.name,
                unit.description,
                unit.parent_id,
                unit.year,
            ],
        )?;

        let id = conn.last_insert_rowid();
        unit.id = Some(id);
        unit.is_active = true;
        Ok(id)
    }

    /// Uppdatera namn/beskrivning. Returnerar false om enheten saknas.
    pub fn update(&self, id: i64, update: &OrgUnitUpdate) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE org_units SET
                name = COALESCE(?, name),
                description = COALESCE(?, description)
             WHERE id = ? AND is_active = 1",
            params![update.name, update.description, id],
        )?;

        Ok(affected > 0)
    }

    /// Mjuk borttagning av enheten och dess underenheter. 0 om enheten saknas.
    pub fn delete(&self, id: i64) -> Result<usize> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "WITH RECURSIVE subtree(id) AS (
                SELECT id FROM org_units WHERE id = ?1
                UNION ALL
                SELECT o.id FROM org_units o JOIN subtree s ON o.parent_id = s.id
             )
             UPDATE org_units SET is_active = 0
             WHERE is_active = 1 AND id IN (SELECT id FROM subtree)",
            [id],
        )?;

        Ok(affected)
    }

    fn row_to_unit(row: &Row) -> Option<OrgUnit> {
        let kind: String = row.get(1).ok()?;
        Some(OrgUnit {
            id: row.get(0).ok(),
            kind: OrgUnitKind::from_db_str(&kind)?,
            name: row.get(2).unwrap_or_default(),
            description: row.get(3).unwrap_or_default(),
            parent_id: row.get(4).ok().flatten(),
            year: row.get(5).unwrap_or_default(),
            is_active: row.get(6).unwrap_or(true),
            created_at: row.get(7).ok(),
        })
    }
}
