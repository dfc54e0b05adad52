//! Organisationsstruktur per år

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use super::editing::{drops_local, stale_to_conflict};
use super::request_guard::{RequestGuard, RequestToken};
use super::year_store::YearScoped;
use crate::api::GcgBackend;
use crate::models::{OrgUnit, OrgUnitKind, OrgUnitUpdate, DEFAULT_STRUCTURE, DEFAULT_SUBSIDIARIES};
use crate::utils::{AppError, AppResult};

pub struct StructureStore {
    backend: Arc<dyn GcgBackend>,
    units: Vec<OrgUnit>,
    guard: RequestGuard<i64>,
}

impl StructureStore {
    pub fn new(backend: Arc<dyn GcgBackend>) -> Self {
        Self {
            backend,
            units: Vec::new(),
            guard: RequestGuard::new(),
        }
    }

    /// Ladda årets enheter (ersätter de lokala för året)
    pub fn load(&mut self, year: i32) -> AppResult<()> {
        let units = self.backend.list_structure(Some(year))?;
        self.units.retain(|u| u.year != year);
        self.units.extend(units);
        Ok(())
    }

    pub fn units(&self) -> &[OrgUnit] {
        &self.units
    }

    pub fn units_for_year(&self, year: i32) -> Vec<&OrgUnit> {
        self.units.iter().filter(|u| u.year == year).collect()
    }

    pub fn by_kind(&self, kind: OrgUnitKind, year: i32) -> Vec<&OrgUnit> {
        self.units
            .iter()
            .filter(|u| u.kind == kind && u.year == year)
            .collect()
    }

    pub fn children(&self, parent_id: i64) -> Vec<&OrgUnit> {
        self.units
            .iter()
            .filter(|u| u.parent_id == Some(parent_id))
            .collect()
    }

    pub fn find(&self, id: i64) -> Option<&OrgUnit> {
        self.units.iter().find(|u| u.id == Some(id))
    }

    pub fn find_by_name(&self, name: &str, year: i32) -> Option<&OrgUnit> {
        self.units
            .iter()
            .find(|u| u.year == year && u.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Enheter som kan ansvara för checklistobjekt (subdirektorat och divisioner)
    pub fn assignable_units(&self, year: i32) -> Vec<&OrgUnit> {
        self.units
            .iter()
            .filter(|u| {
                u.year == year
                    && matches!(u.kind, OrgUnitKind::Subdirectorate | OrgUnitKind::Division)
            })
            .collect()
    }

    pub fn create(&mut self, unit: &OrgUnit) -> AppResult<OrgUnit> {
        if unit.name.trim().is_empty() {
            return Err(AppError::validation("Namn måste anges"));
        }

        let created = self.backend.create_unit(unit)?;
        self.units.push(created.clone());
        Ok(created)
    }

    pub fn begin_update(&mut self, id: i64) -> RequestToken<i64> {
        self.guard.begin(id)
    }

    /// Tillämpa ett uppdateringssvar. `Ok(false)` betyder att svaret var inaktuellt.
    pub fn apply_update(
        &mut self,
        token: &RequestToken<i64>,
        result: AppResult<OrgUnit>,
    ) -> AppResult<bool> {
        let id = *token.key();
        if !self.guard.complete(token) {
            return Ok(false);
        }

        match result {
            Ok(updated) => {
                if let Some(existing) = self.units.iter_mut().find(|u| u.id == Some(id)) {
                    *existing = updated;
                }
                Ok(true)
            }
            Err(e) => {
                if e.is_not_found() {
                    self.remove_subtree(id);
                }
                Err(stale_to_conflict(e, &format!("Enhet {}", id)))
            }
        }
    }

    pub fn update(&mut self, id: i64, update: &OrgUnitUpdate) -> AppResult<OrgUnit> {
        if update.is_empty() {
            return Err(AppError::validation("Inget att uppdatera"));
        }

        let token = self.begin_update(id);
        let result = self.backend.update_unit(id, update);
        let returned = result.as_ref().ok().cloned();
        self.apply_update(&token, result)?;

        returned.ok_or_else(|| AppError::other("Uppdatering gav inget resultat"))
    }

    /// Ta bort enheten och dess underenheter
    pub fn delete(&mut self, id: i64) -> AppResult<()> {
        let result = self.backend.delete_unit(id);
        // Raden tas bort lokalt även om den redan var borta i backend
        if drops_local(&result) {
            self.remove_subtree(id);
        }
        result.map_err(|e| stale_to_conflict(e, &format!("Enhet {}", id)))
    }

    /// Skapa standardstrukturen för ett år som saknar enheter
    pub fn seed_default(&mut self, year: i32) -> AppResult<usize> {
        if !self.units_for_year(year).is_empty() {
            return Ok(0);
        }

        let mut created = 0;
        for (directorate, subdirectorates) in DEFAULT_STRUCTURE {
            let dir = self.create(&OrgUnit::new(OrgUnitKind::Directorate, *directorate, year))?;
            created += 1;
            let Some(dir_id) = dir.id else { continue };

            for (subdirectorate, divisions) in subdirectorates.iter() {
                let sub = self.create(
                    &OrgUnit::new(OrgUnitKind::Subdirectorate, *subdirectorate, year)
                        .with_parent(dir_id),
                )?;
                created += 1;
                let Some(sub_id) = sub.id else { continue };

                for division in divisions.iter() {
                    self.create(
                        &OrgUnit::new(OrgUnitKind::Division, *division, year).with_parent(sub_id),
                    )?;
                    created += 1;
                }
            }
        }

        for subsidiary in DEFAULT_SUBSIDIARIES {
            self.create(&OrgUnit::new(OrgUnitKind::Subsidiary, *subsidiary, year))?;
            created += 1;
        }

        info!("Standardstruktur för {} skapad ({} enheter)", year, created);
        Ok(created)
    }

    fn remove_subtree(&mut self, id: i64) {
        let mut doomed: HashSet<i64> = HashSet::from([id]);
        loop {
            let before = doomed.len();
            for unit in &self.units {
                if let (Some(uid), Some(parent)) = (unit.id, unit.parent_id) {
                    if doomed.contains(&parent) {
                        doomed.insert(uid);
                    }
                }
            }
            if doomed.len() == before {
                break;
            }
        }

        self.units
            .retain(|u| !u.id.is_some_and(|uid| doomed.contains(&uid)));
    }
}

impl YearScoped for StructureStore {
    fn purge_year(&mut self, year: i32) -> usize {
        let before = self.units.len();
        self.units.retain(|u| u.year != year);
        before - self.units.len()
    }
}
