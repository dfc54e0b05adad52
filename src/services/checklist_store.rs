//! Checklista och aspekter per år, med radredigering

use std::sync::Arc;

use tracing::debug;

use super::editing::{drops_local, stale_to_conflict, EditableRow, RowState, SaveAction};
use super::request_guard::{RequestGuard, RequestToken};
use super::year_store::YearScoped;
use crate::api::GcgBackend;
use crate::models::{Aspect, ChecklistItem};
use crate::utils::{AppError, AppResult};

pub struct ChecklistStore {
    backend: Arc<dyn GcgBackend>,
    rows: Vec<EditableRow<ChecklistItem>>,
    aspects: Vec<Aspect>,
    guard: RequestGuard<i64>,
}

impl ChecklistStore {
    pub fn new(backend: Arc<dyn GcgBackend>) -> Self {
        Self {
            backend,
            rows: Vec::new(),
            aspects: Vec::new(),
            guard: RequestGuard::new(),
        }
    }

    /// Ladda årets checklista och aspekter. Osparade rader för året kastas.
    pub fn load(&mut self, year: i32) -> AppResult<()> {
        let items = self.backend.list_checklist(Some(year))?;
        let aspects = self.backend.list_aspects(Some(year))?;

        self.rows.retain(|r| r.value().year != year);
        self.rows.extend(items.into_iter().map(EditableRow::saved));

        self.aspects.retain(|a| a.year != year);
        self.aspects.extend(aspects);

        debug!("Checklista {} laddad: {} objekt", year, self.items(year).len());
        Ok(())
    }

    pub fn rows(&self) -> &[EditableRow<ChecklistItem>] {
        &self.rows
    }

    /// Årets objekt i radordning
    pub fn items(&self, year: i32) -> Vec<&ChecklistItem> {
        let mut items: Vec<&ChecklistItem> = self
            .rows
            .iter()
            .map(|r| r.value())
            .filter(|i| i.year == year)
            .collect();
        items.sort_by_key(|i| (i.row_number, i.id));
        items
    }

    pub fn find(&self, id: i64) -> Option<&ChecklistItem> {
        self.rows
            .iter()
            .map(|r| r.value())
            .find(|i| i.id == Some(id))
    }

    pub fn by_aspect(&self, year: i32, aspect: &str) -> Vec<&ChecklistItem> {
        self.items(year)
            .into_iter()
            .filter(|i| i.aspect == aspect)
            .collect()
    }

    /// Objekt utan ansvarig enhet
    pub fn unassigned(&self, year: i32) -> Vec<&ChecklistItem> {
        self.items(year)
            .into_iter()
            .filter(|i| !i.is_assigned())
            .collect()
    }

    // ── Radredigering ──────────────────────────────────────────────

    /// Lägg till en osparad rad. Returnerar radens index.
    pub fn add_row(&mut self, item: ChecklistItem) -> usize {
        self.rows.push(EditableRow::new(item));
        self.rows.len() - 1
    }

    pub fn edit_row<F: FnOnce(&mut ChecklistItem)>(&mut self, index: usize, f: F) -> AppResult<RowState> {
        let row = self
            .rows
            .get_mut(index)
            .ok_or_else(|| AppError::not_found(format!("Rad {}", index)))?;
        row.edit(f);
        Ok(row.state())
    }

    /// Spara en rad: `New` skapas, `Dirty` uppdateras, `Saved` lämnas orörd
    pub fn save_row(&mut self, index: usize) -> AppResult<SaveAction> {
        let row = self
            .rows
            .get(index)
            .ok_or_else(|| AppError::not_found(format!("Rad {}", index)))?;

        let action = row.save_action();
        let item = row.value().clone();

        match action {
            SaveAction::None => {}
            SaveAction::Create => {
                item.validate().map_err(AppError::Validation)?;
                let created = self.backend.create_checklist(&item)?;
                self.rows[index].mark_saved(created);
            }
            SaveAction::Update => {
                item.validate().map_err(AppError::Validation)?;
                let id = item
                    .id
                    .ok_or_else(|| AppError::validation("Sparad rad saknar ID"))?;
                let token = self.begin_update(id);
                let result = self.backend.update_checklist(&item);
                self.apply_update(&token, result)?;
            }
        }

        Ok(action)
    }

    /// Avbryt redigering. En ny rad tas bort helt.
    pub fn cancel_row(&mut self, index: usize) -> AppResult<()> {
        if index >= self.rows.len() {
            return Err(AppError::not_found(format!("Rad {}", index)));
        }

        let row = self.rows.remove(index);
        if let Some(reverted) = row.cancel() {
            self.rows.insert(index, reverted);
        }
        Ok(())
    }

    // ── Direkta operationer ────────────────────────────────────────

    pub fn create(&mut self, item: &ChecklistItem) -> AppResult<ChecklistItem> {
        let index = self.add_row(item.clone());
        match self.save_row(index) {
            Ok(_) => Ok(self.rows[index].value().clone()),
            Err(e) => {
                self.rows.remove(index);
                Err(e)
            }
        }
    }

    pub fn begin_update(&mut self, id: i64) -> RequestToken<i64> {
        self.guard.begin(id)
    }

    /// Tillämpa ett uppdateringssvar. `Ok(false)` betyder att svaret var inaktuellt.
    pub fn apply_update(
        &mut self,
        token: &RequestToken<i64>,
        result: AppResult<ChecklistItem>,
    ) -> AppResult<bool> {
        let id = *token.key();
        if !self.guard.complete(token) {
            return Ok(false);
        }

        match result {
            Ok(updated) => {
                if let Some(row) = self.rows.iter_mut().find(|r| r.value().id == Some(id)) {
                    row.mark_saved(updated);
                }
                Ok(true)
            }
            Err(e) => {
                if e.is_not_found() {
                    self.remove_local(id);
                }
                Err(stale_to_conflict(e, &format!("Checklistobjekt {}", id)))
            }
        }
    }

    pub fn update(&mut self, item: &ChecklistItem) -> AppResult<ChecklistItem> {
        item.validate().map_err(AppError::Validation)?;
        let id = item
            .id
            .ok_or_else(|| AppError::validation("Checklistobjekt saknar ID"))?;

        let token = self.begin_update(id);
        let result = self.backend.update_checklist(item);
        let returned = result.as_ref().ok().cloned();
        self.apply_update(&token, result)?;

        returned.ok_or_else(|| AppError::other("Uppdatering gav inget resultat"))
    }

    /// Ta bort ett objekt. Raden behålls lokalt om backend svarar med annat
    /// fel än att posten saknas.
    pub fn delete(&mut self, id: i64) -> AppResult<()> {
        let result = self.backend.delete_checklist(id);
        if drops_local(&result) {
            self.remove_local(id);
        }
        result.map_err(|e| stale_to_conflict(e, &format!("Checklistobjekt {}", id)))
    }

    /// Lokal uppdatering av ansvarig enhet efter en tilldelning
    pub fn set_assigned_unit_local(&mut self, id: i64, unit: Option<String>) -> bool {
        match self.rows.iter_mut().find(|r| r.value().id == Some(id)) {
            Some(row) => {
                row.apply_saved(|item| item.assigned_unit = unit.clone());
                true
            }
            None => false,
        }
    }

    fn remove_local(&mut self, id: i64) {
        self.rows.retain(|r| r.value().id != Some(id));
    }

    // ── Aspekter ───────────────────────────────────────────────────

    pub fn aspects(&self, year: i32) -> Vec<&Aspect> {
        let mut aspects: Vec<&Aspect> = self.aspects.iter().filter(|a| a.year == year).collect();
        aspects.sort_by_key(|a| a.sort_order);
        aspects
    }

    pub fn add_aspect(&mut self, name: &str, year: i32) -> AppResult<Aspect> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Aspektnamn måste anges"));
        }
        if self.aspects.iter().any(|a| a.year == year && a.name == name) {
            return Err(AppError::already_exists(format!("Aspekt '{}' för {}", name, year)));
        }

        let created = self.backend.create_aspect(&Aspect::new(name, year))?;
        self.aspects.push(created.clone());
        Ok(created)
    }

    /// Byt namn på en aspekt; årets checklistobjekt följer med
    pub fn rename_aspect(&mut self, id: i64, new_name: &str) -> AppResult<Aspect> {
        let result = self.backend.rename_aspect(id, new_name);

        let renamed = match result {
            Ok(aspect) => aspect,
            Err(e) => {
                if e.is_not_found() {
                    self.aspects.retain(|a| a.id != Some(id));
                }
                return Err(stale_to_conflict(e, &format!("Aspekt {}", id)));
            }
        };

        if let Some(old) = self.aspects.iter_mut().find(|a| a.id == Some(id)) {
            let old_name = std::mem::replace(&mut old.name, renamed.name.clone());
            for row in self.rows.iter_mut() {
                let value = row.value();
                if value.year == renamed.year && value.aspect == old_name {
                    row.apply_saved(|item| item.aspect = renamed.name.clone());
                }
            }
        }

        Ok(renamed)
    }

    pub fn delete_aspect(&mut self, id: i64) -> AppResult<()> {
        let result = self.backend.delete_aspect(id);
        if drops_local(&result) {
            self.aspects.retain(|a| a.id != Some(id));
        }
        result.map_err(|e| stale_to_conflict(e, &format!("Aspekt {}", id)))
    }
}

impl YearScoped for ChecklistStore {
    fn purge_year(&mut self, year: i32) -> usize {
        let before = self.rows.len() + self.aspects.len();
        self.rows.retain(|r| r.value().year != year);
        self.aspects.retain(|a| a.year != year);
        before - self.rows.len() - self.aspects.len()
    }
}
