//! Repository för bedömningsrader (penilaian)

use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::{params, Connection, Row};

use super::lock;
use crate::models::{AssessmentSubmission, PenilaianRow, StoredIndicator};

pub struct AssessmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssessmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Ersätt årets rader med en ny inlämning (en transaktion)
    pub fn replace_year(&self, submission: &AssessmentSubmission) -> Result<usize> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        let removed = tx.execute("DELETE FROM assessment_rows WHERE year = ?", [submission.year])?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO assessment_rows (year, no, aspect, description, weight, score,
                    achievement, classification, classification_override, assessor, assessment_type)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )?;

            for row in &submission.rows {
                stmt.execute(params![
                    submission.year,
                    row.no,
                    row.aspect,
                    row.description,
                    row.weight(),
                    row.score(),
                    row.achievement(),
                    row.classification().display_name(),
                    row.classification_override(),
                    submission.assessor,
                    submission.assessment_type,
                ])?;
            }
        }

        tx.commit()?;

        tracing::debug!(
            "Bedömning {} sparad: {} rader ersatte {}",
            submission.year,
            submission.rows.len(),
            removed
        );
        Ok(submission.rows.len())
    }

    /// Sparade rader, valfritt filtrerade på år
    pub fn find_indicators(&self, year: Option<i32>) -> Result<Vec<StoredIndicator>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT year, no, aspect, description, weight, score, classification_override,
                    assessor, assessment_type
             FROM assessment_rows
             WHERE ?1 IS NULL OR year = ?1
             ORDER BY year DESC, no, id",
        )?;

        let rows = stmt
            .query_map(params![year], |row| Ok(Self::row_to_indicator(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    pub fn delete_year(&self, year: i32) -> Result<usize> {
        let conn = lock(&self.conn)?;
        Ok(conn.execute("DELETE FROM assessment_rows WHERE year = ?", [year])?)
    }

    /// Härledda fält räknas om från vikt och skor vid läsning
    fn row_to_indicator(row: &Row) -> StoredIndicator {
        let mut indicator = PenilaianRow::new(
            row.get::<_, String>(2).unwrap_or_default(),
            row.get::<_, String>(3).unwrap_or_default(),
            row.get(4).unwrap_or_default(),
            row.get(5).unwrap_or_default(),
        );
        indicator.no = row.get(1).unwrap_or_default();

        if let Ok(Some(text)) = row.get::<_, Option<String>>(6) {
            indicator.override_classification(text);
        }

        StoredIndicator {
            year: row.get(0).unwrap_or_default(),
            assessor: row.get(7).unwrap_or_default(),
            assessment_type: row.get(8).unwrap_or_default(),
            row: indicator,
        }
    }
}
