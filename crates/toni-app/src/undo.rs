// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Undo/redo as a log of inverse repository calls.
//!
//! Actions hold value snapshots of the rows they touched. Replaying one
//! reinserts rows under their original ids, so references between rows stay
//! valid no matter what was created in between.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::model::{ListKind, Restaurant, Visit, WantToVisit};
use crate::repository::RecordRepository;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowSnapshot {
    Restaurant(Restaurant),
    Visit(Visit),
    WantToVisit(WantToVisit),
}

impl RowSnapshot {
    fn insert<R: RecordRepository>(&self, repo: &R) -> Result<()> {
        match self {
            Self::Restaurant(row) => repo.insert_restaurant(row),
            Self::Visit(row) => repo.insert_visit(row),
            Self::WantToVisit(row) => repo.insert_want_to_visit(row),
        }
    }

    fn update<R: RecordRepository>(&self, repo: &R) -> Result<()> {
        match self {
            Self::Restaurant(row) => repo.update_restaurant(row),
            Self::Visit(row) => repo.update_visit(row),
            Self::WantToVisit(row) => repo.update_want_to_visit(row),
        }
    }

    // Restaurants are never cascaded here: undoing their insert must fail
    // loudly if something now references them.
    fn delete<R: RecordRepository>(&self, repo: &R) -> Result<()> {
        match self {
            Self::Restaurant(row) => repo.delete_restaurant(row.id),
            Self::Visit(row) => repo.delete_visit(row.id),
            Self::WantToVisit(row) => repo.delete_want_to_visit(row.id),
        }
    }

    const fn affected_lists(&self) -> &'static [ListKind] {
        match self {
            Self::Restaurant(_) => &ListKind::ALL,
            Self::Visit(_) => &[ListKind::Visits, ListKind::Restaurants],
            Self::WantToVisit(_) => &[ListKind::WantToVisit],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    Insert(RowSnapshot),
    Update {
        before: RowSnapshot,
        after: RowSnapshot,
    },
    Delete(RowSnapshot),
    DeleteCascade {
        parent: Restaurant,
        visits: Vec<Visit>,
        wishlist: Vec<WantToVisit>,
    },
}

impl Step {
    fn undo<R: RecordRepository>(&self, repo: &R) -> Result<()> {
        match self {
            Self::Insert(row) => row.delete(repo),
            Self::Update { before, .. } => before.update(repo),
            Self::Delete(row) => row.insert(repo),
            Self::DeleteCascade {
                parent,
                visits,
                wishlist,
            } => {
                repo.insert_restaurant(parent)?;
                for entry in wishlist {
                    repo.insert_want_to_visit(entry)?;
                }
                for visit in visits {
                    repo.insert_visit(visit)?;
                }
                Ok(())
            }
        }
    }

    fn redo<R: RecordRepository>(&self, repo: &R) -> Result<()> {
        match self {
            Self::Insert(row) => row.insert(repo),
            Self::Update { after, .. } => after.update(repo),
            Self::Delete(row) => row.delete(repo),
            Self::DeleteCascade { parent, .. } => repo.delete_restaurant_cascade(parent.id),
        }
    }

    fn affected_lists(&self) -> &'static [ListKind] {
        match self {
            Self::Insert(row) | Self::Delete(row) | Self::Update { after: row, .. } => {
                row.affected_lists()
            }
            Self::DeleteCascade { .. } => &ListKind::ALL,
        }
    }
}

/// One user-visible change: its steps are undone in reverse and redone in
/// order, each direction as a single atomic unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoableAction {
    pub label: String,
    steps: Vec<Step>,
}

impl UndoableAction {
    pub fn new(label: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            label: label.into(),
            steps,
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn undo<R: RecordRepository>(&self, repo: &R) -> Result<()> {
        repo.atomically(|repo| {
            for step in self.steps.iter().rev() {
                step.undo(repo)?;
            }
            Ok(())
        })
    }

    pub fn redo<R: RecordRepository>(&self, repo: &R) -> Result<()> {
        repo.atomically(|repo| {
            for step in &self.steps {
                step.redo(repo)?;
            }
            Ok(())
        })
    }

    /// Lists whose rows or aggregates this action can change, in tab order.
    pub fn affected_lists(&self) -> Vec<ListKind> {
        ListKind::ALL
            .into_iter()
            .filter(|list| {
                self.steps
                    .iter()
                    .any(|step| step.affected_lists().contains(list))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl HistoryDirection {
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryStart {
    Ready(UndoableAction),
    Empty,
    Busy,
}

/// Two stacks of actions, plus the direction currently being replayed.
///
/// `begin` hands out a copy of the top action; the stacks only change when
/// `settle` reports success, so a failed replay leaves them untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndoRedoLog {
    undo: Vec<UndoableAction>,
    redo: Vec<UndoableAction>,
    pending: Option<HistoryDirection>,
}

impl UndoRedoLog {
    /// Records an action whose forward effect already landed.
    pub fn push(&mut self, action: UndoableAction) {
        self.undo.push(action);
        self.redo.clear();
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn peek(&self, direction: HistoryDirection) -> Option<&UndoableAction> {
        self.stack(direction).last()
    }

    pub const fn pending(&self) -> Option<HistoryDirection> {
        self.pending
    }

    pub fn begin(&mut self, direction: HistoryDirection) -> HistoryStart {
        if self.pending.is_some() {
            return HistoryStart::Busy;
        }
        let Some(action) = self.stack(direction).last().cloned() else {
            return HistoryStart::Empty;
        };
        self.pending = Some(direction);
        HistoryStart::Ready(action)
    }

    /// Finishes the replay started by `begin`. On success the action moves
    /// to the other stack and its label is returned.
    pub fn settle(&mut self, direction: HistoryDirection, succeeded: bool) -> Option<String> {
        if self.pending != Some(direction) {
            return None;
        }
        self.pending = None;
        if !succeeded {
            return None;
        }
        let (from, to) = match direction {
            HistoryDirection::Undo => (&mut self.undo, &mut self.redo),
            HistoryDirection::Redo => (&mut self.redo, &mut self.undo),
        };
        let action = from.pop()?;
        let label = action.label.clone();
        to.push(action);
        Some(label)
    }

    /// Replays synchronously. Used where the repository lives on this thread.
    pub fn apply<R: RecordRepository>(
        &mut self,
        repo: &R,
        direction: HistoryDirection,
    ) -> Result<Option<String>> {
        let HistoryStart::Ready(action) = self.begin(direction) else {
            return Ok(None);
        };
        let result = match direction {
            HistoryDirection::Undo => action.undo(repo),
            HistoryDirection::Redo => action.redo(repo),
        };
        let succeeded = result.is_ok();
        let label = self.settle(direction, succeeded);
        result.map(|()| label)
    }

    fn stack(&self, direction: HistoryDirection) -> &Vec<UndoableAction> {
        match direction {
            HistoryDirection::Undo => &self.undo,
            HistoryDirection::Redo => &self.redo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryDirection, HistoryStart, UndoRedoLog, UndoableAction};
    use crate::memory::MemoryRepository;
    use crate::repository::{
        Mutation, RecordRepository, RestaurantDraft, RestaurantRef, VisitFields,
    };
    use time::{Date, Month};

    fn visit_fields() -> anyhow::Result<VisitFields> {
        Ok(VisitFields {
            visited_on: Date::from_calendar_date(2026, Month::January, 17)?,
            rating: Some(8.0),
            notes: String::new(),
            would_return: None,
        })
    }

    fn add_restaurant(repo: &MemoryRepository, name: &str) -> anyhow::Result<UndoableAction> {
        let (action, _) = Mutation::SaveRestaurant {
            id: None,
            draft: RestaurantDraft {
                name: name.to_owned(),
                ..RestaurantDraft::default()
            },
        }
        .apply(repo)?;
        Ok(action)
    }

    #[test]
    fn push_clears_redo() -> anyhow::Result<()> {
        let repo = MemoryRepository::default();
        let mut log = UndoRedoLog::default();
        log.push(add_restaurant(&repo, "Lucia")?);
        log.apply(&repo, HistoryDirection::Undo)?;
        assert_eq!(log.redo_len(), 1);
        log.push(add_restaurant(&repo, "Lilia")?);
        assert_eq!(log.redo_len(), 0);
        assert_eq!(log.undo_len(), 1);
        Ok(())
    }

    #[test]
    fn undo_then_redo_insert_restores_identity_and_fields() -> anyhow::Result<()> {
        let repo = MemoryRepository::default();
        let mut log = UndoRedoLog::default();
        let action = add_restaurant(&repo, "Lucia")?;
        let original = repo.list_restaurants(None)?[0].clone();
        let original = repo.get_restaurant(original.id)?;
        log.push(action);

        assert_eq!(
            log.apply(&repo, HistoryDirection::Undo)?.as_deref(),
            Some("add restaurant Lucia")
        );
        assert!(repo.get_restaurant(original.id).is_err());
        // Rows created in between must not steal the id back.
        add_restaurant(&repo, "Filler")?;

        log.apply(&repo, HistoryDirection::Redo)?;
        assert_eq!(repo.get_restaurant(original.id)?, original);
        assert_eq!(log.undo_len(), 1);
        assert_eq!(log.redo_len(), 0);
        Ok(())
    }

    #[test]
    fn cascade_undo_restores_dependents_with_original_ids() -> anyhow::Result<()> {
        let repo = MemoryRepository::default();
        let mut log = UndoRedoLog::default();
        let (action, _) = Mutation::SaveVisit {
            id: None,
            restaurant: RestaurantRef::Named("Lucia".to_owned()),
            fields: visit_fields()?,
            converting: None,
        }
        .apply(&repo)?;
        log.push(action);
        let restaurant = repo.list_restaurants(None)?[0].id;
        let before = repo.visits_for_restaurant(restaurant)?;

        let (delete, _) = Mutation::DeleteRestaurant(restaurant).apply(&repo)?;
        assert_eq!(delete.label, "delete restaurant Lucia and 1 visit");
        log.push(delete);
        assert!(repo.list_visits(None)?.is_empty());

        log.apply(&repo, HistoryDirection::Undo)?;
        assert_eq!(repo.visits_for_restaurant(restaurant)?, before);

        log.apply(&repo, HistoryDirection::Redo)?;
        assert!(repo.get_restaurant(restaurant).is_err());
        assert!(repo.list_visits(None)?.is_empty());
        Ok(())
    }

    #[test]
    fn failed_undo_leaves_both_stacks_alone() -> anyhow::Result<()> {
        let repo = MemoryRepository::default();
        let mut log = UndoRedoLog::default();
        log.push(add_restaurant(&repo, "Lucia")?);
        let restaurant = repo.list_restaurants(None)?[0].id;
        // A visit added outside the log now references the restaurant.
        Mutation::SaveVisit {
            id: None,
            restaurant: RestaurantRef::Existing(restaurant),
            fields: visit_fields()?,
            converting: None,
        }
        .apply(&repo)?;

        let error = log
            .apply(&repo, HistoryDirection::Undo)
            .expect_err("restaurant still has a visit");
        assert!(format!("{error:#}").contains("still has"));
        assert_eq!(log.undo_len(), 1);
        assert_eq!(log.redo_len(), 0);
        assert_eq!(log.pending(), None);
        assert!(repo.get_restaurant(restaurant).is_ok());
        Ok(())
    }

    #[test]
    fn begin_is_single_flight() -> anyhow::Result<()> {
        let repo = MemoryRepository::default();
        let mut log = UndoRedoLog::default();
        assert_eq!(log.begin(HistoryDirection::Undo), HistoryStart::Empty);
        log.push(add_restaurant(&repo, "Lucia")?);
        assert!(matches!(
            log.begin(HistoryDirection::Undo),
            HistoryStart::Ready(_)
        ));
        assert_eq!(log.begin(HistoryDirection::Redo), HistoryStart::Busy);
        assert_eq!(log.settle(HistoryDirection::Redo, true), None);
        assert_eq!(
            log.settle(HistoryDirection::Undo, true).as_deref(),
            Some("add restaurant Lucia")
        );
        assert_eq!(log.redo_len(), 1);
        Ok(())
    }

    #[test]
    fn update_undo_restores_before_snapshot() -> anyhow::Result<()> {
        let repo = MemoryRepository::default();
        add_restaurant(&repo, "Lucia")?;
        let id = repo.list_restaurants(None)?[0].id;
        let before = repo.get_restaurant(id)?;
        let (action, _) = Mutation::SaveRestaurant {
            id: Some(id),
            draft: RestaurantDraft {
                name: "Lucia Pizza".to_owned(),
                cuisine: "Pizza".to_owned(),
                ..RestaurantDraft::default()
            },
        }
        .apply(&repo)?;
        assert_eq!(repo.get_restaurant(id)?.cuisine, "Pizza");
        action.undo(&repo)?;
        assert_eq!(repo.get_restaurant(id)?, before);
        Ok(())
    }
}
