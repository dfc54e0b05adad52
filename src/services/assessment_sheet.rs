//! Bedömningsblad: indikatorrader för ett år, sammanfattningar och sparande

use tracing::{debug, info};

use super::scoring;
use super::year_store::YearScoped;
use crate::api::GcgBackend;
use crate::models::{AspectSummary, AssessmentSubmission, Classification, PenilaianRow};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct AssessmentSheet {
    year: i32,
    assessor: String,
    assessment_type: String,
    rows: Vec<PenilaianRow>,
}

impl AssessmentSheet {
    pub fn new(year: i32, assessor: impl Into<String>, assessment_type: impl Into<String>) -> Self {
        Self {
            year,
            assessor: assessor.into(),
            assessment_type: assessment_type.into(),
            rows: Vec::new(),
        }
    }

    /// Ladda sparade rader för året. Bedömare och typ tas från första raden om den finns.
    pub fn load(backend: &dyn GcgBackend, year: i32, assessor: &str) -> AppResult<Self> {
        let stored = backend.indicator_data(Some(year))?;

        let mut sheet = match stored.first() {
            Some(first) => Self::new(year, first.assessor.clone(), first.assessment_type.clone()),
            None => Self::new(year, assessor, "internal"),
        };
        sheet.rows = stored.into_iter().map(|s| s.row).collect();
        sheet.renumber();

        debug!("Bedömning {} laddad: {} rader", year, sheet.rows.len());
        Ok(sheet)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn assessor(&self) -> &str {
        &self.assessor
    }

    pub fn assessment_type(&self) -> &str {
        &self.assessment_type
    }

    pub fn rows(&self) -> &[PenilaianRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn renumber(&mut self) {
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.no = i as i32 + 1;
        }
    }

    /// Lägg till en rad sist och returnera dess nummer
    pub fn add_row(&mut self, row: PenilaianRow) -> i32 {
        self.rows.push(row);
        self.renumber();
        self.rows.len() as i32
    }

    /// Ta bort rad med nummer `no` (1-baserat)
    pub fn remove_row(&mut self, no: i32) -> AppResult<PenilaianRow> {
        let index = self.index_of(no)?;
        let removed = self.rows.remove(index);
        self.renumber();
        Ok(removed)
    }

    fn index_of(&self, no: i32) -> AppResult<usize> {
        self.rows
            .iter()
            .position(|r| r.no == no)
            .ok_or_else(|| AppError::not_found(format!("Rad {}", no)))
    }

    pub fn row_mut(&mut self, no: i32) -> AppResult<&mut PenilaianRow> {
        let index = self.index_of(no)?;
        Ok(&mut self.rows[index])
    }

    pub fn set_inputs(&mut self, no: i32, weight: f64, score: f64) -> AppResult<()> {
        self.row_mut(no)?.set_inputs(weight, score);
        Ok(())
    }

    pub fn set_aspect(&mut self, no: i32, aspect: impl Into<String>) -> AppResult<()> {
        self.row_mut(no)?.aspect = aspect.into();
        Ok(())
    }

    pub fn set_description(&mut self, no: i32, description: impl Into<String>) -> AppResult<()> {
        self.row_mut(no)?.description = description.into();
        Ok(())
    }

    pub fn override_classification(&mut self, no: i32, text: impl Into<String>) -> AppResult<()> {
        self.row_mut(no)?.override_classification(text);
        Ok(())
    }

    pub fn filter_by_classification(&self, classification: Classification) -> Vec<&PenilaianRow> {
        self.rows
            .iter()
            .filter(|r| r.classification() == classification)
            .collect()
    }

    pub fn sorted_by_achievement(&self, ascending: bool) -> Vec<&PenilaianRow> {
        let mut rows: Vec<&PenilaianRow> = self.rows.iter().collect();
        rows.sort_by_key(|r| r.achievement());
        if !ascending {
            rows.reverse();
        }
        rows
    }

    pub fn aspect_summaries(&self) -> Vec<AspectSummary> {
        scoring::summarize_aspects(&self.rows)
    }

    pub fn overall(&self) -> AspectSummary {
        scoring::overall_summary(&self.rows)
    }

    pub fn submission(&self) -> AssessmentSubmission {
        AssessmentSubmission {
            year: self.year,
            assessor: self.assessor.clone(),
            assessment_type: self.assessment_type.clone(),
            rows: self.rows.clone(),
        }
    }

    /// Spara bladet; ersätter årets tidigare sparade rader
    pub fn save(&self, backend: &dyn GcgBackend) -> AppResult<usize> {
        if self.rows.is_empty() {
            return Err(AppError::validation("Bedömningen har inga rader"));
        }
        if let Some(row) = self.rows.iter().find(|r| r.aspect.trim().is_empty()) {
            return Err(AppError::validation(format!("Rad {} saknar aspekt", row.no)));
        }

        let saved = backend.save_assessment(&self.submission())?;
        info!("Bedömning {} sparad ({} rader)", self.year, saved);
        Ok(saved)
    }
}

impl YearScoped for AssessmentSheet {
    fn purge_year(&mut self, year: i32) -> usize {
        if self.year != year {
            return 0;
        }
        let removed = self.rows.len();
        self.rows.clear();
        removed
    }
}
