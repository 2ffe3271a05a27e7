// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! The record repository seam, and the requests the controller sends to it.
//!
//! Requests run on whatever thread owns the repository; their outcomes come
//! back as plain values so the controller never sees a repository error
//! type.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{debug, info, warn};

use crate::ids::{RestaurantId, VisitId, WantToVisitId};
use crate::model::{
    Detail, ListKind, PriceRange, Restaurant, RestaurantDetail, RestaurantRow, Suggestion, Visit,
    VisitDetail, VisitRow, WantToVisit, WantToVisitDetail, WantToVisitRow,
};
use crate::undo::{HistoryDirection, RowSnapshot, Step, UndoableAction};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantDraft {
    pub name: String,
    pub address: String,
    pub city: String,
    pub neighborhood: String,
    pub cuisine: String,
    pub price_range: Option<PriceRange>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place_id: String,
}

impl From<&Suggestion> for RestaurantDraft {
    fn from(suggestion: &Suggestion) -> Self {
        Self {
            name: suggestion.name.trim().to_owned(),
            address: suggestion.address.clone(),
            city: suggestion.city.clone(),
            neighborhood: suggestion.neighborhood.clone(),
            cuisine: suggestion.cuisine.clone(),
            price_range: suggestion.price_range,
            latitude: suggestion.latitude,
            longitude: suggestion.longitude,
            place_id: suggestion.place_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitDraft {
    pub restaurant_id: RestaurantId,
    pub visited_on: Date,
    pub rating: Option<f64>,
    pub notes: String,
    pub would_return: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WantToVisitDraft {
    pub restaurant_id: RestaurantId,
    pub notes: String,
    pub priority: Option<u8>,
}

/// CRUD over the three record kinds, with explicit-id inserts for undo.
pub trait RecordRepository {
    fn get_restaurant(&self, id: RestaurantId) -> Result<Restaurant>;
    fn find_restaurant_by_name(&self, name: &str) -> Result<Option<Restaurant>>;
    fn search_restaurants(&self, query: &str, limit: usize) -> Result<Vec<Restaurant>>;
    fn create_restaurant(&self, draft: &RestaurantDraft) -> Result<Restaurant>;
    fn insert_restaurant(&self, restaurant: &Restaurant) -> Result<()>;
    fn update_restaurant(&self, restaurant: &Restaurant) -> Result<()>;
    /// Fails while visits or wishlist entries still reference the restaurant.
    fn delete_restaurant(&self, id: RestaurantId) -> Result<()>;
    /// Deletes the restaurant with its visits and wishlist entries, atomically.
    fn delete_restaurant_cascade(&self, id: RestaurantId) -> Result<()>;
    fn list_restaurants(&self, filter: Option<&str>) -> Result<Vec<RestaurantRow>>;
    fn restaurant_detail(&self, id: RestaurantId) -> Result<RestaurantDetail>;

    fn get_visit(&self, id: VisitId) -> Result<Visit>;
    fn create_visit(&self, draft: &VisitDraft) -> Result<Visit>;
    fn insert_visit(&self, visit: &Visit) -> Result<()>;
    fn update_visit(&self, visit: &Visit) -> Result<()>;
    fn delete_visit(&self, id: VisitId) -> Result<()>;
    fn list_visits(&self, filter: Option<&str>) -> Result<Vec<VisitRow>>;
    fn visits_for_restaurant(&self, id: RestaurantId) -> Result<Vec<Visit>>;

    fn get_want_to_visit(&self, id: WantToVisitId) -> Result<WantToVisit>;
    fn create_want_to_visit(&self, draft: &WantToVisitDraft) -> Result<WantToVisit>;
    fn insert_want_to_visit(&self, entry: &WantToVisit) -> Result<()>;
    fn update_want_to_visit(&self, entry: &WantToVisit) -> Result<()>;
    fn delete_want_to_visit(&self, id: WantToVisitId) -> Result<()>;
    fn list_want_to_visit(&self, filter: Option<&str>) -> Result<Vec<WantToVisitRow>>;
    fn want_to_visit_for_restaurant(&self, id: RestaurantId) -> Result<Vec<WantToVisit>>;

    /// Logs a visit for a wishlist entry and removes the entry, atomically.
    fn convert_want_to_visit(&self, id: WantToVisitId, draft: &VisitDraft) -> Result<Visit>;

    /// Runs `work` as one unit: either every change it makes lands, or none.
    fn atomically<T>(&self, work: impl FnOnce(&Self) -> Result<T>) -> Result<T>
    where
        Self: Sized;
}

/// How a form names the restaurant a visit or wishlist entry belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RestaurantRef {
    Existing(RestaurantId),
    Named(String),
    Suggested(Suggestion),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitFields {
    pub visited_on: Date,
    pub rating: Option<f64>,
    pub notes: String,
    pub would_return: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WantToVisitFields {
    pub notes: String,
    pub priority: Option<u8>,
}

/// A user-initiated change. Applying one yields exactly one undoable action.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SaveVisit {
        id: Option<VisitId>,
        restaurant: RestaurantRef,
        fields: VisitFields,
        converting: Option<WantToVisitId>,
    },
    SaveRestaurant {
        id: Option<RestaurantId>,
        draft: RestaurantDraft,
    },
    SaveWantToVisit {
        id: Option<WantToVisitId>,
        restaurant: RestaurantRef,
        fields: WantToVisitFields,
    },
    DeleteVisit(VisitId),
    DeleteRestaurant(RestaurantId),
    DeleteWantToVisit(WantToVisitId),
}

/// Where the cursor should land once the affected lists reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    pub list: ListKind,
    pub id: i64,
}

impl Mutation {
    pub fn apply<R: RecordRepository>(&self, repo: &R) -> Result<(UndoableAction, Option<Focus>)> {
        repo.atomically(|repo| self.apply_steps(repo))
    }

    fn apply_steps<R: RecordRepository>(
        &self,
        repo: &R,
    ) -> Result<(UndoableAction, Option<Focus>)> {
        match self {
            Self::SaveVisit {
                id,
                restaurant,
                fields,
                converting,
            } => {
                let (restaurant, mut steps) = resolve_restaurant(repo, restaurant)?;
                let draft = VisitDraft {
                    restaurant_id: restaurant.id,
                    visited_on: fields.visited_on,
                    rating: fields.rating,
                    notes: fields.notes.trim().to_owned(),
                    would_return: fields.would_return,
                };
                let (label, visit_id) = match (id, converting) {
                    (Some(id), _) => {
                        let before = repo.get_visit(*id)?;
                        let after = Visit {
                            restaurant_id: draft.restaurant_id,
                            visited_on: draft.visited_on,
                            rating: draft.rating,
                            notes: draft.notes.clone(),
                            would_return: draft.would_return,
                            ..before.clone()
                        };
                        repo.update_visit(&after)?;
                        steps.push(Step::Update {
                            before: RowSnapshot::Visit(before),
                            after: RowSnapshot::Visit(after),
                        });
                        (format!("edit visit to {}", restaurant.name), *id)
                    }
                    (None, Some(entry_id)) => {
                        let entry = repo.get_want_to_visit(*entry_id)?;
                        let visit = repo.convert_want_to_visit(*entry_id, &draft)?;
                        let visit_id = visit.id;
                        steps.push(Step::Insert(RowSnapshot::Visit(visit)));
                        steps.push(Step::Delete(RowSnapshot::WantToVisit(entry)));
                        (format!("visited {}", restaurant.name), visit_id)
                    }
                    (None, None) => {
                        let visit = repo.create_visit(&draft)?;
                        let visit_id = visit.id;
                        steps.push(Step::Insert(RowSnapshot::Visit(visit)));
                        (format!("add visit to {}", restaurant.name), visit_id)
                    }
                };
                Ok((
                    UndoableAction::new(label, steps),
                    Some(Focus {
                        list: ListKind::Visits,
                        id: visit_id.get(),
                    }),
                ))
            }
            Self::SaveRestaurant { id, draft } => {
                let name = draft.name.trim();
                if name.is_empty() {
                    bail!("restaurant name is required -- fill it in and save again");
                }
                let (label, step, restaurant_id) = match id {
                    Some(id) => {
                        let before = repo.get_restaurant(*id)?;
                        let after = Restaurant {
                            name: name.to_owned(),
                            address: draft.address.trim().to_owned(),
                            city: draft.city.trim().to_owned(),
                            neighborhood: draft.neighborhood.trim().to_owned(),
                            cuisine: draft.cuisine.trim().to_owned(),
                            price_range: draft.price_range,
                            ..before.clone()
                        };
                        repo.update_restaurant(&after)?;
                        (
                            format!("edit restaurant {name}"),
                            Step::Update {
                                before: RowSnapshot::Restaurant(before),
                                after: RowSnapshot::Restaurant(after),
                            },
                            *id,
                        )
                    }
                    None => {
                        let created = repo.create_restaurant(draft)?;
                        let created_id = created.id;
                        (
                            format!("add restaurant {name}"),
                            Step::Insert(RowSnapshot::Restaurant(created)),
                            created_id,
                        )
                    }
                };
                Ok((
                    UndoableAction::new(label, vec![step]),
                    Some(Focus {
                        list: ListKind::Restaurants,
                        id: restaurant_id.get(),
                    }),
                ))
            }
            Self::SaveWantToVisit {
                id,
                restaurant,
                fields,
            } => {
                let (restaurant, mut steps) = resolve_restaurant(repo, restaurant)?;
                let notes = fields.notes.trim().to_owned();
                let (label, entry_id) = match id {
                    Some(id) => {
                        let before = repo.get_want_to_visit(*id)?;
                        let after = WantToVisit {
                            restaurant_id: restaurant.id,
                            notes,
                            priority: fields.priority,
                            ..before.clone()
                        };
                        repo.update_want_to_visit(&after)?;
                        steps.push(Step::Update {
                            before: RowSnapshot::WantToVisit(before),
                            after: RowSnapshot::WantToVisit(after),
                        });
                        (format!("edit wishlist {}", restaurant.name), *id)
                    }
                    None => {
                        let entry = repo.create_want_to_visit(&WantToVisitDraft {
                            restaurant_id: restaurant.id,
                            notes,
                            priority: fields.priority,
                        })?;
                        let entry_id = entry.id;
                        steps.push(Step::Insert(RowSnapshot::WantToVisit(entry)));
                        (format!("wishlist {}", restaurant.name), entry_id)
                    }
                };
                Ok((
                    UndoableAction::new(label, steps),
                    Some(Focus {
                        list: ListKind::WantToVisit,
                        id: entry_id.get(),
                    }),
                ))
            }
            Self::DeleteVisit(id) => {
                let visit = repo.get_visit(*id)?;
                let restaurant = repo.get_restaurant(visit.restaurant_id)?;
                repo.delete_visit(*id)?;
                Ok((
                    UndoableAction::new(
                        format!("delete visit to {}", restaurant.name),
                        vec![Step::Delete(RowSnapshot::Visit(visit))],
                    ),
                    None,
                ))
            }
            Self::DeleteRestaurant(id) => {
                let parent = repo.get_restaurant(*id)?;
                let visits = repo.visits_for_restaurant(*id)?;
                let wishlist = repo.want_to_visit_for_restaurant(*id)?;
                repo.delete_restaurant_cascade(*id)?;
                let label = match visits.len() {
                    0 => format!("delete restaurant {}", parent.name),
                    1 => format!("delete restaurant {} and 1 visit", parent.name),
                    count => format!("delete restaurant {} and {count} visits", parent.name),
                };
                Ok((
                    UndoableAction::new(
                        label,
                        vec![Step::DeleteCascade {
                            parent,
                            visits,
                            wishlist,
                        }],
                    ),
                    None,
                ))
            }
            Self::DeleteWantToVisit(id) => {
                let entry = repo.get_want_to_visit(*id)?;
                let restaurant = repo.get_restaurant(entry.restaurant_id)?;
                repo.delete_want_to_visit(*id)?;
                Ok((
                    UndoableAction::new(
                        format!("delete wishlist {}", restaurant.name),
                        vec![Step::Delete(RowSnapshot::WantToVisit(entry))],
                    ),
                    None,
                ))
            }
        }
    }
}

/// Finds the referenced restaurant, creating it when only a name or a
/// suggestion is known and no restaurant of that name exists yet. A created
/// restaurant is returned as an insert step so it undoes with its parent action.
pub fn resolve_restaurant<R: RecordRepository>(
    repo: &R,
    reference: &RestaurantRef,
) -> Result<(Restaurant, Vec<Step>)> {
    let draft = match reference {
        RestaurantRef::Existing(id) => return Ok((repo.get_restaurant(*id)?, Vec::new())),
        RestaurantRef::Named(name) => RestaurantDraft {
            name: name.trim().to_owned(),
            ..RestaurantDraft::default()
        },
        RestaurantRef::Suggested(suggestion) => RestaurantDraft::from(suggestion),
    };
    if draft.name.is_empty() {
        bail!("restaurant is required -- type a name or pick a suggestion");
    }
    if let RestaurantRef::Suggested(suggestion) = reference
        && let Some(existing) = known_suggestion(repo, suggestion)?
    {
        debug!(restaurant = %existing.id, "reusing restaurant for suggestion");
        return Ok((existing, Vec::new()));
    }
    if let Some(existing) = repo.find_restaurant_by_name(&draft.name)? {
        debug!(restaurant = %existing.id, "reusing restaurant with matching name");
        return Ok((existing, Vec::new()));
    }
    let created = repo.create_restaurant(&draft)?;
    info!(restaurant = %created.id, "created restaurant from form");
    Ok((
        created.clone(),
        vec![Step::Insert(RowSnapshot::Restaurant(created))],
    ))
}

/// A stored restaurant with the suggestion's place id, else one whose name
/// matches it exactly.
fn known_suggestion<R: RecordRepository>(
    repo: &R,
    suggestion: &Suggestion,
) -> Result<Option<Restaurant>> {
    let name = suggestion.name.trim();
    let candidates = repo.search_restaurants(name, SUGGESTION_MATCH_LIMIT)?;
    let by_place = candidates.iter().find(|restaurant| {
        !suggestion.place_id.is_empty() && restaurant.place_id == suggestion.place_id
    });
    let by_name = || {
        candidates
            .iter()
            .find(|restaurant| restaurant.name.trim().eq_ignore_ascii_case(name))
    };
    Ok(by_place.or_else(by_name).cloned())
}

const SUGGESTION_MATCH_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum ListData {
    Visits(Vec<VisitRow>),
    Restaurants(Vec<RestaurantRow>),
    WantToVisit(Vec<WantToVisitRow>),
}

impl ListData {
    pub const fn kind(&self) -> ListKind {
        match self {
            Self::Visits(_) => ListKind::Visits,
            Self::Restaurants(_) => ListKind::Restaurants,
            Self::WantToVisit(_) => ListKind::WantToVisit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RepoRequest {
    LoadList(ListKind),
    LoadDetail { list: ListKind, id: i64 },
    Mutate(Mutation),
    History {
        direction: HistoryDirection,
        action: UndoableAction,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RepoOutcome {
    ListLoaded(ListData),
    DetailLoaded(Detail),
    LoadFailed {
        list: ListKind,
        error: String,
    },
    DetailFailed {
        list: ListKind,
        id: i64,
        error: String,
    },
    Mutated {
        action: UndoableAction,
        focus: Option<Focus>,
    },
    MutationFailed {
        error: String,
    },
    HistoryApplied {
        direction: HistoryDirection,
    },
    HistoryFailed {
        direction: HistoryDirection,
        error: String,
    },
}

pub fn load_list<R: RecordRepository>(repo: &R, list: ListKind) -> Result<ListData> {
    Ok(match list {
        ListKind::Visits => ListData::Visits(repo.list_visits(None)?),
        ListKind::Restaurants => ListData::Restaurants(repo.list_restaurants(None)?),
        ListKind::WantToVisit => ListData::WantToVisit(repo.list_want_to_visit(None)?),
    })
}

pub fn load_detail<R: RecordRepository>(repo: &R, list: ListKind, id: i64) -> Result<Detail> {
    Ok(match list {
        ListKind::Visits => {
            let visit = repo.get_visit(VisitId::new(id))?;
            let restaurant = repo.get_restaurant(visit.restaurant_id)?;
            Detail::Visit(VisitDetail { visit, restaurant })
        }
        ListKind::Restaurants => {
            Detail::Restaurant(repo.restaurant_detail(RestaurantId::new(id))?)
        }
        ListKind::WantToVisit => {
            let entry = repo.get_want_to_visit(WantToVisitId::new(id))?;
            let restaurant = repo.get_restaurant(entry.restaurant_id)?;
            Detail::WantToVisit(WantToVisitDetail { entry, restaurant })
        }
    })
}

/// Runs one request to completion. Errors become outcome values.
pub fn execute<R: RecordRepository>(repo: &R, request: RepoRequest) -> RepoOutcome {
    match request {
        RepoRequest::LoadList(list) => match load_list(repo, list) {
            Ok(data) => RepoOutcome::ListLoaded(data),
            Err(error) => {
                warn!(list = list.label(), error = %format!("{error:#}"), "list load failed");
                RepoOutcome::LoadFailed {
                    list,
                    error: format!("{error:#}"),
                }
            }
        },
        RepoRequest::LoadDetail { list, id } => match load_detail(repo, list, id) {
            Ok(detail) => RepoOutcome::DetailLoaded(detail),
            Err(error) => RepoOutcome::DetailFailed {
                list,
                id,
                error: format!("{error:#}"),
            },
        },
        RepoRequest::Mutate(mutation) => match mutation.apply(repo) {
            Ok((action, focus)) => {
                info!(label = %action.label, "mutation applied");
                RepoOutcome::Mutated { action, focus }
            }
            Err(error) => {
                warn!(error = %format!("{error:#}"), "mutation failed");
                RepoOutcome::MutationFailed {
                    error: format!("{error:#}"),
                }
            }
        },
        RepoRequest::History { direction, action } => {
            let result = match direction {
                HistoryDirection::Undo => action.undo(repo),
                HistoryDirection::Redo => action.redo(repo),
            };
            match result {
                Ok(()) => {
                    info!(label = %action.label, ?direction, "history applied");
                    RepoOutcome::HistoryApplied { direction }
                }
                Err(error) => {
                    warn!(label = %action.label, ?direction, error = %format!("{error:#}"), "history failed");
                    RepoOutcome::HistoryFailed {
                        direction,
                        error: format!("{error:#}"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Mutation, RecordRepository, RepoOutcome, RepoRequest, RestaurantDraft, RestaurantRef,
        VisitFields, WantToVisitFields, execute, resolve_restaurant,
    };
    use crate::memory::MemoryRepository;
    use crate::model::{ListKind, Suggestion};
    use crate::undo::{HistoryDirection, UndoRedoLog};
    use crate::{RestaurantId, WantToVisitId};
    use time::{Date, Month};

    fn fields(day: u8) -> anyhow::Result<VisitFields> {
        Ok(VisitFields {
            visited_on: Date::from_calendar_date(2026, Month::May, day)?,
            rating: Some(9.0),
            notes: " cacio e pepe ".to_owned(),
            would_return: Some(true),
        })
    }

    #[test]
    fn visit_for_unknown_name_creates_one_restaurant_and_one_visit() -> anyhow::Result<()> {
        let repo = MemoryRepository::default();
        let mut log = UndoRedoLog::default();
        let mutation = Mutation::SaveVisit {
            id: None,
            restaurant: RestaurantRef::Named("Lucia".to_owned()),
            fields: fields(2)?,
            converting: None,
        };
        let (action, focus) = mutation.apply(&repo)?;
        log.push(action);

        let restaurants = repo.list_restaurants(None)?;
        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0].name, "Lucia");
        let visits = repo.visits_for_restaurant(restaurants[0].id)?;
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].notes, "cacio e pepe");
        assert_eq!(log.undo_len(), 1);
        assert_eq!(focus.map(|focus| focus.list), Some(ListKind::Visits));
        Ok(())
    }

    #[test]
    fn second_visit_reuses_the_restaurant_case_insensitively() -> anyhow::Result<()> {
        let repo = MemoryRepository::default();
        for name in ["Lucia", "  lucia "] {
            Mutation::SaveVisit {
                id: None,
                restaurant: RestaurantRef::Named(name.to_owned()),
                fields: fields(3)?,
                converting: None,
            }
            .apply(&repo)?;
        }
        let restaurants = repo.list_restaurants(None)?;
        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0].visit_count, 2);
        Ok(())
    }

    #[test]
    fn suggestion_metadata_lands_on_created_restaurant() -> anyhow::Result<()> {
        let repo = MemoryRepository::default();
        let suggestion = Suggestion {
            name: "Lilia".to_owned(),
            city: "Brooklyn".to_owned(),
            latitude: Some(40.72),
            longitude: Some(-73.95),
            place_id: "lilia-brooklyn".to_owned(),
            ..Suggestion::default()
        };
        Mutation::SaveWantToVisit {
            id: None,
            restaurant: RestaurantRef::Suggested(suggestion),
            fields: WantToVisitFields {
                notes: String::new(),
                priority: Some(5),
            },
        }
        .apply(&repo)?;
        let found = repo
            .find_restaurant_by_name("lilia")?
            .ok_or_else(|| anyhow::anyhow!("restaurant missing"))?;
        assert_eq!(found.place_id, "lilia-brooklyn");
        assert_eq!(found.latitude, Some(40.72));
        Ok(())
    }

    #[test]
    fn suggestion_reuses_restaurant_with_same_place_id() -> anyhow::Result<()> {
        let repo = MemoryRepository::default();
        let known = repo.create_restaurant(&RestaurantDraft {
            name: "Lilia".to_owned(),
            place_id: "lilia-brooklyn".to_owned(),
            ..RestaurantDraft::default()
        })?;
        let decoy = repo.create_restaurant(&RestaurantDraft {
            name: "Lilia Brooklyn".to_owned(),
            ..RestaurantDraft::default()
        })?;

        let (found, steps) = resolve_restaurant(
            &repo,
            &RestaurantRef::Suggested(Suggestion {
                name: "LILIA".to_owned(),
                place_id: "lilia-brooklyn".to_owned(),
                ..Suggestion::default()
            }),
        )?;
        assert_eq!(found.id, known.id);
        assert!(steps.is_empty());

        let (found, steps) = resolve_restaurant(
            &repo,
            &RestaurantRef::Suggested(Suggestion {
                name: "lilia brooklyn".to_owned(),
                place_id: "elsewhere".to_owned(),
                ..Suggestion::default()
            }),
        )?;
        assert_eq!(found.id, decoy.id);
        assert!(steps.is_empty());
        assert_eq!(repo.list_restaurants(None)?.len(), 2);
        Ok(())
    }

    #[test]
    fn failed_mutation_leaves_nothing_behind() -> anyhow::Result<()> {
        let repo = MemoryRepository::default();
        let outcome = execute(
            &repo,
            RepoRequest::Mutate(Mutation::SaveVisit {
                id: None,
                restaurant: RestaurantRef::Named("Lucia".to_owned()),
                fields: fields(4)?,
                converting: Some(WantToVisitId::new(77)),
            }),
        );
        assert!(matches!(outcome, RepoOutcome::MutationFailed { .. }));
        assert!(repo.list_restaurants(None)?.is_empty());
        Ok(())
    }

    #[test]
    fn empty_restaurant_name_is_rejected() {
        let repo = MemoryRepository::default();
        let error = Mutation::SaveRestaurant {
            id: None,
            draft: RestaurantDraft::default(),
        }
        .apply(&repo)
        .expect_err("blank name should fail");
        assert!(error.to_string().contains("name is required"));
    }

    #[test]
    fn convert_moves_entry_into_a_visit_and_undoes_as_one() -> anyhow::Result<()> {
        let repo = MemoryRepository::default();
        let (wish, _) = Mutation::SaveWantToVisit {
            id: None,
            restaurant: RestaurantRef::Named("Via Carota".to_owned()),
            fields: WantToVisitFields {
                notes: "try the svizzerina".to_owned(),
                priority: Some(4),
            },
        }
        .apply(&repo)?;
        let entry = repo.list_want_to_visit(None)?[0].clone();

        let (action, _) = Mutation::SaveVisit {
            id: None,
            restaurant: RestaurantRef::Existing(entry.restaurant_id),
            fields: fields(9)?,
            converting: Some(entry.id),
        }
        .apply(&repo)?;
        assert!(repo.list_want_to_visit(None)?.is_empty());
        assert_eq!(repo.list_visits(None)?.len(), 1);

        let outcome = execute(
            &repo,
            RepoRequest::History {
                direction: HistoryDirection::Undo,
                action: action.clone(),
            },
        );
        assert_eq!(
            outcome,
            RepoOutcome::HistoryApplied {
                direction: HistoryDirection::Undo
            }
        );
        assert!(repo.list_visits(None)?.is_empty());
        let restored = repo.get_want_to_visit(entry.id)?;
        assert_eq!(restored.notes, "try the svizzerina");
        assert_eq!(wish.steps().len(), 2);
        assert_eq!(action.affected_lists(), ListKind::ALL.to_vec());
        Ok(())
    }

    #[test]
    fn load_failures_are_reported_as_outcomes() {
        let repo = MemoryRepository::default();
        let outcome = execute(
            &repo,
            RepoRequest::LoadDetail {
                list: ListKind::Restaurants,
                id: RestaurantId::new(404).get(),
            },
        );
        assert!(matches!(
            outcome,
            RepoOutcome::DetailFailed {
                list: ListKind::Restaurants,
                id: 404,
                ..
            }
        ));
    }
}
