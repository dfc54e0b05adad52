//! Register över räkenskapsår och valt år

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::GcgBackend;
use crate::models::{FiscalYear, YearDeletion};
use crate::utils::date::is_valid_fiscal_year;
use crate::utils::{AppError, AppResult};

/// Lager vars data är knuten till ett räkenskapsår
pub trait YearScoped {
    /// Ta bort alla lokala rader för året. Returnerar antal borttagna rader.
    fn purge_year(&mut self, year: i32) -> usize;
}

pub struct YearStore {
    backend: Arc<dyn GcgBackend>,
    years: Vec<FiscalYear>,
    selected: Option<i32>,
}

impl YearStore {
    pub fn new(backend: Arc<dyn GcgBackend>) -> Self {
        Self {
            backend,
            years: Vec::new(),
            selected: None,
        }
    }

    /// Ladda år från backend. Valt år behålls om det finns kvar.
    pub fn load(&mut self) -> AppResult<()> {
        let mut years = self.backend.list_years()?;
        years.sort_by(|a, b| b.year.cmp(&a.year));
        self.years = years;

        if !self.selected.is_some_and(|y| self.contains(y)) {
            self.selected = self.most_recent();
        }
        Ok(())
    }

    /// År, senaste först
    pub fn years(&self) -> &[FiscalYear] {
        &self.years
    }

    pub fn year_numbers(&self) -> Vec<i32> {
        self.years.iter().map(|y| y.year).collect()
    }

    pub fn contains(&self, year: i32) -> bool {
        self.years.iter().any(|y| y.year == year)
    }

    pub fn most_recent(&self) -> Option<i32> {
        self.years.first().map(|y| y.year)
    }

    pub fn selected(&self) -> Option<i32> {
        self.selected
    }

    pub fn select(&mut self, year: i32) -> AppResult<()> {
        if !self.contains(year) {
            return Err(AppError::not_found(format!("Tahun buku {}", year)));
        }
        self.selected = Some(year);
        Ok(())
    }

    /// Kontroller som görs innan något skickas till backend
    pub fn validate_new(&self, year: i32) -> AppResult<()> {
        if !is_valid_fiscal_year(year) {
            return Err(AppError::validation(format!("Ogiltigt år: {}", year)));
        }
        if self.contains(year) {
            return Err(AppError::already_exists(format!("Tahun buku {}", year)));
        }
        Ok(())
    }

    pub fn add(&mut self, year: i32) -> AppResult<FiscalYear> {
        self.validate_new(year)?;

        let created = self.backend.create_year(year)?;
        self.years.push(created.clone());
        self.years.sort_by(|a, b| b.year.cmp(&a.year));

        if self.selected.is_none() {
            self.selected = Some(year);
        }

        info!("Tahun buku {} tillagt", year);
        Ok(created)
    }

    /// Ta bort året i backend och lokalt.
    ///
    /// Den lokala borttagningen görs även om backend-anropet misslyckas; felet
    /// returneras då till anroparen.
    pub fn remove(&mut self, year: i32) -> AppResult<YearDeletion> {
        if !self.contains(year) {
            return Err(AppError::not_found(format!("Tahun buku {}", year)));
        }

        let result = self.backend.delete_year(year);
        if let Err(e) = &result {
            warn!("Backend kunde inte ta bort år {}: {}", year, e);
        }

        self.years.retain(|y| y.year != year);
        if self.selected == Some(year) {
            self.selected = self.most_recent();
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::LocalBackend;
    use tempfile::tempdir;

    fn store(dir: &std::path::Path) -> YearStore {
        let backend = LocalBackend::in_memory(dir.join("gcg-documents")).unwrap();
        YearStore::new(Arc::new(backend))
    }

    #[test]
    fn test_add_keeps_descending_order() {
        let dir = tempdir().unwrap();
        let mut years = store(dir.path());

        years.add(2022).unwrap();
        years.add(2024).unwrap();
        years.add(2023).unwrap();

        assert_eq!(years.year_numbers(), vec![2024, 2023, 2022]);
        assert_eq!(years.selected(), Some(2022));
    }

    #[test]
    fn test_duplicate_is_rejected_locally() {
        let dir = tempdir().unwrap();
        let mut years = store(dir.path());

        years.add(2024).unwrap();
        assert!(matches!(years.add(2024), Err(AppError::AlreadyExists(_))));
        assert!(matches!(years.add(99), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_remove_selected_picks_most_recent() {
        let dir = tempdir().unwrap();
        let mut years = store(dir.path());

        years.add(2023).unwrap();
        years.add(2024).unwrap();
        years.add(2022).unwrap();
        years.select(2024).unwrap();

        years.remove(2024).unwrap();
        assert_eq!(years.selected(), Some(2023));

        years.remove(2023).unwrap();
        years.remove(2022).unwrap();
        assert_eq!(years.selected(), None);
        assert!(years.remove(2022).unwrap_err().is_not_found());
    }

    #[test]
    fn test_load_restores_from_backend() {
        let dir = tempdir().unwrap();
        let backend: Arc<dyn GcgBackend> =
            Arc::new(LocalBackend::in_memory(dir.path().join("docs")).unwrap());
        backend.create_year(2021).unwrap();
        backend.create_year(2025).unwrap();

        let mut years = YearStore::new(Arc::clone(&backend));
        years.load().unwrap();

        assert_eq!(years.year_numbers(), vec![2025, 2021]);
        assert_eq!(years.selected(), Some(2025));
    }
}
