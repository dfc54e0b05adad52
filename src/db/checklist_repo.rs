//! Repository för checklista och aspekter

use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::lock;
use super::schema::DEFAULT_ASPECTS;
use crate::models::{Aspect, ChecklistItem};

/// Repository för checklistobjekt och aspektlistan
pub struct ChecklistRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ChecklistRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    // ── Checklista ─────────────────────────────────────────────────

    /// Aktiva checklistobjekt, valfritt filtrerade på år
    pub fn find_all(&self, year: Option<i32>) -> Result<Vec<ChecklistItem>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, aspect, description, year, assigned_unit, row_number
             FROM checklist_items
             WHERE is_active = 1 AND (?1 IS NULL OR year = ?1)
             ORDER BY year DESC, row_number, id",
        )?;

        let items = stmt
            .query_map(params![year], |row| Ok(Self::row_to_item(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(items)
    }

    pub fn find_by_year(&self, year: i32) -> Result<Vec<ChecklistItem>> {
        self.find_all(Some(year))
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<ChecklistItem>> {
        let conn = lock(&self.conn)?;
        let item = conn
            .query_row(
                "SELECT id, aspect, description, year, assigned_unit, row_number
                 FROM checklist_items WHERE id = ? AND is_active = 1",
                [id],
                |row| Ok(Self::row_to_item(row)),
            )
            .optional()?;

        Ok(item)
    }

    /// Skapa objekt. Radnummer sätts till max + 1 inom året om det saknas.
    pub fn create(&self, item: &mut ChecklistItem) -> Result<i64> {
        let conn = lock(&self.conn)?;

        if item.row_number <= 0 {
            let max: i32 = conn.query_row(
                "SELECT COALESCE(MAX(row_number), 0) FROM checklist_items WHERE year = ?",
                [item.year],
                |row| row.get(0),
            )?;
            item.row_number = max + 1;
        }

        conn.execute(
            "INSERT INTO checklist_items (aspect, description, year, assigned_unit, row_number)
             VALUES (?, ?, ?, ?, ?)",
            params![
                item.aspect,
                item.description,
                item.year,
                item.assigned_unit,
                item.row_number,
            ],
        )?;

        let id = conn.last_insert_rowid();
        item.id = Some(id);
        Ok(id)
    }

    /// Uppdatera aspekt och beskrivning. Returnerar false om objektet saknas.
    pub fn update(&self, item: &ChecklistItem) -> Result<bool> {
        let Some(id) = item.id else {
            return Ok(false);
        };

        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE checklist_items SET aspect = ?, description = ?, assigned_unit = ?
             WHERE id = ? AND is_active = 1",
            params![item.aspect, item.description, item.assigned_unit, id],
        )?;

        Ok(affected > 0)
    }

    /// Sätt eller rensa ansvarig enhet (sist skrivande vinner)
    pub fn set_assigned_unit(&self, id: i64, unit: Option<&str>) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE checklist_items SET assigned_unit = ? WHERE id = ? AND is_active = 1",
            params![unit, id],
        )?;
        Ok(affected > 0)
    }

    /// Mjuk borttagning. Returnerar false om objektet saknas.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE checklist_items SET is_active = 0 WHERE id = ? AND is_active = 1",
            [id],
        )?;
        Ok(affected > 0)
    }

    // ── Aspekter ───────────────────────────────────────────────────

    pub fn find_aspects(&self, year: Option<i32>) -> Result<Vec<Aspect>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, name, year, sort_order FROM aspects
             WHERE is_active = 1 AND (?1 IS NULL OR year = ?1)
             ORDER BY year DESC, sort_order, name",
        )?;

        let aspects = stmt
            .query_map(params![year], |row| Ok(Self::row_to_aspect(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(aspects)
    }

    pub fn aspect_exists(&self, name: &str, year: i32) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM aspects WHERE name = ? AND year = ? AND is_active = 1)",
            params![name, year],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn create_aspect(&self, aspect: &mut Aspect) -> Result<i64> {
        let conn = lock(&self.conn)?;

        if aspect.sort_order <= 0 {
            let max: i32 = conn.query_row(
                "SELECT COALESCE(MAX(sort_order), 0) FROM aspects WHERE year = ?",
                [aspect.year],
                |row| row.get(0),
            )?;
            aspect.sort_order = max + 1;
        }

        conn.execute(
            "INSERT INTO aspects (name, year, sort_order) VALUES (?, ?, ?)",
            params![aspect.name, aspect.year, aspect.sort_order],
        )?;

        let id = conn.last_insert_rowid();
        aspect.id = Some(id);
        Ok(id)
    }

    /// Byt namn på en aspekt och på checklistobjekten som refererar till den.
    /// Returnerar None om aspekten saknas.
    pub fn rename_aspect(&self, id: i64, new_name: &str) -> Result<Option<Aspect>> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        let existing = tx
            .query_row(
                "SELECT id, name, year, sort_order FROM aspects WHERE id = ? AND is_active = 1",
                [id],
                |row| Ok(Self::row_to_aspect(row)),
            )
            .optional()?;

        let Some(mut aspect) = existing else {
            return Ok(None);
        };

        tx.execute("UPDATE aspects SET name = ? WHERE id = ?", params![new_name, id])?;
        let moved = tx.execute(
            "UPDATE checklist_items SET aspect = ? WHERE aspect = ? AND year = ?",
            params![new_name, aspect.name, aspect.year],
        )?;
        tx.commit()?;

        tracing::debug!("Aspekt '{}' -> '{}' ({} checklistobjekt)", aspect.name, new_name, moved);
        aspect.name = new_name.to_string();
        Ok(Some(aspect))
    }

    pub fn delete_aspect(&self, id: i64) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE aspects SET is_active = 0 WHERE id = ? AND is_active = 1",
            [id],
        )?;
        Ok(affected > 0)
    }

    /// Skapa standardaspekterna för ett år som saknar aspekter
    pub fn seed_default_aspects(&self, year: i32) -> Result<usize> {
        if !self.find_aspects(Some(year))?.is_empty() {
            return Ok(0);
        }

        for name in DEFAULT_ASPECTS {
            self.create_aspect(&mut Aspect::new(*name, year))?;
        }

        Ok(DEFAULT_ASPECTS.len())
    }

    fn row_to_item(row: &Row) -> ChecklistItem {
        ChecklistItem {
            id: row.get(0).ok(),
            aspect: row.get(1).unwrap_or_default(),
            description: row.get(2).unwrap_or_default(),
            year: row.get(3).unwrap_or_default(),
            assigned_unit: row.get(4).ok().flatten(),
            row_number: row.get(5).unwrap_or_default(),
        }
    }

    fn row_to_aspect(row: &Row) -> Aspect {
        Aspect {
            id: row.get(0).ok(),
            name: row.get(1).unwrap_or_default(),
            year: row.get(2).unwrap_or_default(),
            sort_order: row.get(3).unwrap_or_default(),
        }
    }
}
