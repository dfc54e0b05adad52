//! Redigeringstillstånd för tabellrader
//!
//! `New` finns bara lokalt, `Saved` matchar backend och `Dirty` har lokala
//! ändringar med en ögonblicksbild av det sparade värdet.

use crate::utils::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    New,
    Saved,
    Dirty,
}

/// Vilket backendanrop en sparning kräver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    Create,
    Update,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditableRow<T> {
    value: T,
    snapshot: Option<T>,
    state: RowState,
}

impl<T: Clone + PartialEq> EditableRow<T> {
    /// Ny rad som ännu inte finns i backend
    pub fn new(value: T) -> Self {
        Self {
            value,
            snapshot: None,
            state: RowState::New,
        }
    }

    /// Rad som laddats från backend
    pub fn saved(value: T) -> Self {
        Self {
            value,
            snapshot: None,
            state: RowState::Saved,
        }
    }

    pub fn state(&self) -> RowState {
        self.state
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Ändra värdet. En redigering tillbaka till ögonblicksbilden ger `Saved`.
    pub fn edit<F: FnOnce(&mut T)>(&mut self, f: F) {
        if self.state == RowState::Saved {
            self.snapshot = Some(self.value.clone());
        }

        f(&mut self.value);

        if self.state == RowState::New {
            return;
        }

        if self.snapshot.as_ref() == Some(&self.value) {
            self.snapshot = None;
            self.state = RowState::Saved;
        } else {
            self.state = RowState::Dirty;
        }
    }

    /// Ändring som redan är sparad i backend. Gäller både värdet och
    /// ögonblicksbilden så att en senare `cancel` inte återställer den.
    pub fn apply_saved<F: Fn(&mut T)>(&mut self, f: F) {
        f(&mut self.value);
        if let Some(snapshot) = self.snapshot.as_mut() {
            f(snapshot);
        }

        if self.state == RowState::Dirty && self.snapshot.as_ref() == Some(&self.value) {
            self.snapshot = None;
            self.state = RowState::Saved;
        }
    }

    pub fn save_action(&self) -> SaveAction {
        match self.state {
            RowState::New => SaveAction::Create,
            RowState::Dirty => SaveAction::Update,
            RowState::Saved => SaveAction::None,
        }
    }

    /// Backend har bekräftat raden
    pub fn mark_saved(&mut self, value: T) {
        self.value = value;
        self.snapshot = None;
        self.state = RowState::Saved;
    }

    /// Avbryt redigering. En ny rad kastas (returnerar `None`).
    pub fn cancel(mut self) -> Option<Self> {
        match self.state {
            RowState::New => None,
            RowState::Dirty => {
                if let Some(snapshot) = self.snapshot.take() {
                    self.value = snapshot;
                }
                self.state = RowState::Saved;
                Some(self)
            }
            RowState::Saved => Some(self),
        }
    }
}

/// Ska den lokala raden släppas efter en borttagning? Bara när backend
/// lyckades eller när posten redan saknades.
pub fn drops_local<T>(result: &AppResult<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => e.is_not_found(),
    }
}

/// En ändring mot en post som inte längre finns blir en konflikt.
/// Borttagningen vinner; anroparen släpper sin lokala rad.
pub fn stale_to_conflict(err: AppError, what: &str) -> AppError {
    if err.is_not_found() {
        tracing::warn!("{} har tagits bort av en annan session", what);
        AppError::conflict(format!("{} har tagits bort", what))
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_saved_becomes_dirty() {
        let mut row = EditableRow::saved("Pedoman".to_string());
        assert_eq!(row.save_action(), SaveAction::None);

        row.edit(|v| v.push_str(" GCG"));
        assert_eq!(row.state(), RowState::Dirty);
        assert_eq!(row.save_action(), SaveAction::Update);

        row.edit(|v| *v = "Pedoman".to_string());
        assert_eq!(row.state(), RowState::Saved);
    }

    #[test]
    fn test_new_row_stays_new() {
        let mut row = EditableRow::new(String::new());
        row.edit(|v| v.push_str("Board Manual"));
        assert_eq!(row.state(), RowState::New);
        assert_eq!(row.save_action(), SaveAction::Create);

        row.mark_saved("Board Manual".to_string());
        assert_eq!(row.state(), RowState::Saved);
    }

    #[test]
    fn test_stale_to_conflict() {
        let err = stale_to_conflict(AppError::not_found("x"), "Checklistobjekt 3");
        assert!(matches!(err, AppError::Conflict(_)));

        let err = stale_to_conflict(AppError::validation("x"), "Checklistobjekt 3");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_apply_saved_survives_cancel() {
        let mut row = EditableRow::saved((1, "a"));
        row.edit(|v| v.0 = 2);
        row.apply_saved(|v| v.1 = "b");
        assert_eq!(row.state(), RowState::Dirty);

        let reverted = row.cancel().unwrap();
        assert_eq!(*reverted.value(), (1, "b"));

        let mut saved = EditableRow::saved(1);
        saved.apply_saved(|v| *v = 4);
        assert_eq!(saved.state(), RowState::Saved);
        assert_eq!(*saved.cancel().unwrap().value(), 4);
    }

    #[test]
    fn test_drops_local() {
        assert!(drops_local(&Ok(())));
        assert!(drops_local::<()>(&Err(AppError::not_found("x"))));
        assert!(!drops_local::<()>(&Err(AppError::other("disk full"))));
    }

    #[test]
    fn test_cancel() {
        let mut dirty = EditableRow::saved(1);
        dirty.edit(|v| *v = 2);
        let reverted = dirty.cancel().unwrap();
        assert_eq!(*reverted.value(), 1);
        assert_eq!(reverted.state(), RowState::Saved);

        assert!(EditableRow::new(5).cancel().is_none());
        assert_eq!(EditableRow::saved(3).cancel().unwrap().state(), RowState::Saved);
    }
}
