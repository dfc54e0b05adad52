//! Tilldelningar: vilket organisatoriskt ansvar ett checklistobjekt har

use std::collections::BTreeMap;
use std::sync::Arc;

use super::editing::{drops_local, stale_to_conflict};
use super::request_guard::{RequestGuard, RequestToken};
use super::year_store::YearScoped;
use crate::api::GcgBackend;
use crate::models::Assignment;
use crate::utils::{AppError, AppResult};

/// Nyckel för en tilldelning: (checklist_id, år)
pub type AssignmentKey = (i64, i32);

pub struct AssignmentStore {
    backend: Arc<dyn GcgBackend>,
    assignments: Vec<Assignment>,
    guard: RequestGuard<AssignmentKey>,
}

impl AssignmentStore {
    pub fn new(backend: Arc<dyn GcgBackend>) -> Self {
        Self {
            backend,
            assignments: Vec::new(),
            guard: RequestGuard::new(),
        }
    }

    pub fn load(&mut self, year: i32) -> AppResult<()> {
        let assignments = self.backend.list_assignments(Some(year))?;
        self.assignments.retain(|a| a.year != year);
        self.assignments.extend(assignments);
        Ok(())
    }

    pub fn for_year(&self, year: i32) -> Vec<&Assignment> {
        self.assignments.iter().filter(|a| a.year == year).collect()
    }

    pub fn find(&self, checklist_id: i64, year: i32) -> Option<&Assignment> {
        self.assignments
            .iter()
            .find(|a| a.key() == (checklist_id, year))
    }

    pub fn by_unit(&self, unit_name: &str, year: i32) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.year == year && a.unit_name == unit_name)
            .collect()
    }

    /// Antal tilldelade objekt per enhet
    pub fn count_by_unit(&self, year: i32) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for assignment in self.for_year(year) {
            *counts.entry(assignment.unit_name.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Lägg in lokalt; en befintlig tilldelning för samma nyckel ersätts
    fn upsert_local(&mut self, assignment: Assignment) {
        match self
            .assignments
            .iter_mut()
            .find(|a| a.key() == assignment.key())
        {
            Some(existing) => *existing = assignment,
            None => self.assignments.push(assignment),
        }
    }

    pub fn begin_assign(&mut self, key: AssignmentKey) -> RequestToken<AssignmentKey> {
        self.guard.begin(key)
    }

    /// Tillämpa ett tilldelningssvar. `Ok(false)` betyder att svaret var inaktuellt.
    pub fn apply_assign(
        &mut self,
        token: &RequestToken<AssignmentKey>,
        result: AppResult<Assignment>,
    ) -> AppResult<bool> {
        if !self.guard.complete(token) {
            return Ok(false);
        }

        let assignment = result?;
        self.upsert_local(assignment);
        Ok(true)
    }

    pub fn assign(&mut self, assignment: &Assignment) -> AppResult<Assignment> {
        if assignment.unit_name.trim().is_empty() {
            return Err(AppError::validation("Enhet måste anges"));
        }

        let token = self.begin_assign(assignment.key());
        let result = self.backend.create_assignment(assignment);
        let returned = result.as_ref().ok().cloned();
        self.apply_assign(&token, result)?;

        returned.ok_or_else(|| AppError::other("Tilldelning gav inget resultat"))
    }

    pub fn unassign(&mut self, checklist_id: i64, year: i32) -> AppResult<()> {
        // En pågående tilldelning för nyckeln blir inaktuell
        let token = self.guard.begin((checklist_id, year));
        let result = self.backend.delete_assignment(checklist_id, year);
        self.guard.complete(&token);

        if drops_local(&result) {
            self.assignments.retain(|a| a.key() != (checklist_id, year));
        }
        result.map_err(|e| {
            stale_to_conflict(e, &format!("Tilldelning för checklistobjekt {}", checklist_id))
        })
    }
}

impl YearScoped for AssignmentStore {
    fn purge_year(&mut self, year: i32) -> usize {
        let before = self.assignments.len();
        self.assignments.retain(|a| a.year != year);
        before - self.assignments.len()
    }
}
