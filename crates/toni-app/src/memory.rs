// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! In-memory `RecordRepository` for controller and undo tests.

use std::cell::RefCell;
use std::collections::BTreeMap;

use anyhow::{Result, anyhow, bail};
use time::OffsetDateTime;
use time::macros::datetime;

use crate::ids::{RestaurantId, VisitId, WantToVisitId};
use crate::model::{Restaurant, RestaurantDetail, RestaurantRow, Visit, VisitRow, WantToVisit, WantToVisitRow};
use crate::repository::{RecordRepository, RestaurantDraft, VisitDraft, WantToVisitDraft};

#[derive(Debug, Clone, Default)]
struct Tables {
    restaurants: BTreeMap<i64, Restaurant>,
    visits: BTreeMap<i64, Visit>,
    wishlist: BTreeMap<i64, WantToVisit>,
    last_restaurant: i64,
    last_visit: i64,
    last_wishlist: i64,
    clock: i64,
}

impl Tables {
    fn tick(&mut self) -> OffsetDateTime {
        self.clock += 1;
        datetime!(2026-01-01 12:00 UTC) + time::Duration::minutes(self.clock)
    }
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: RefCell<Tables>,
    fail_next: RefCell<Option<String>>,
}

impl MemoryRepository {
    /// Makes the next mutating call fail with `message`.
    pub fn fail_next(&self, message: &str) {
        *self.fail_next.borrow_mut() = Some(message.to_owned());
    }

    fn check_failure(&self) -> Result<()> {
        if let Some(message) = self.fail_next.borrow_mut().take() {
            bail!("{message}");
        }
        Ok(())
    }

    fn restaurant_exists(&self, id: RestaurantId) -> Result<()> {
        if !self.tables.borrow().restaurants.contains_key(&id.get()) {
            bail!("restaurant {id} not found -- reload the list and retry");
        }
        Ok(())
    }
}

fn matches(filter: Option<&str>, fields: &[&str]) -> bool {
    let Some(filter) = filter.map(str::trim).filter(|value| !value.is_empty()) else {
        return true;
    };
    let needle = filter.to_lowercase();
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

impl RecordRepository for MemoryRepository {
    fn get_restaurant(&self, id: RestaurantId) -> Result<Restaurant> {
        self.tables
            .borrow()
            .restaurants
            .get(&id.get())
            .cloned()
            .ok_or_else(|| anyhow!("restaurant {id} not found -- reload the list and retry"))
    }

    fn find_restaurant_by_name(&self, name: &str) -> Result<Option<Restaurant>> {
        let name = name.trim().to_lowercase();
        Ok(self
            .tables
            .borrow()
            .restaurants
            .values()
            .find(|restaurant| restaurant.name.to_lowercase() == name)
            .cloned())
    }

    fn search_restaurants(&self, query: &str, limit: usize) -> Result<Vec<Restaurant>> {
        Ok(self
            .tables
            .borrow()
            .restaurants
            .values()
            .filter(|restaurant| matches(Some(query), &[&restaurant.name]))
            .take(limit)
            .cloned()
            .collect())
    }

    fn create_restaurant(&self, draft: &RestaurantDraft) -> Result<Restaurant> {
        self.check_failure()?;
        let mut tables = self.tables.borrow_mut();
        tables.last_restaurant += 1;
        let restaurant = Restaurant {
            id: RestaurantId::new(tables.last_restaurant),
            name: draft.name.trim().to_owned(),
            address: draft.address.clone(),
            city: draft.city.clone(),
            neighborhood: draft.neighborhood.clone(),
            cuisine: draft.cuisine.clone(),
            price_range: draft.price_range,
            latitude: draft.latitude,
            longitude: draft.longitude,
            place_id: draft.place_id.clone(),
            created_at: tables.tick(),
        };
        tables
            .restaurants
            .insert(restaurant.id.get(), restaurant.clone());
        Ok(restaurant)
    }

    fn insert_restaurant(&self, restaurant: &Restaurant) -> Result<()> {
        self.check_failure()?;
        let mut tables = self.tables.borrow_mut();
        if tables.restaurants.contains_key(&restaurant.id.get()) {
            bail!("restaurant {} already exists", restaurant.id);
        }
        tables.last_restaurant = tables.last_restaurant.max(restaurant.id.get());
        tables
            .restaurants
            .insert(restaurant.id.get(), restaurant.clone());
        Ok(())
    }

    fn update_restaurant(&self, restaurant: &Restaurant) -> Result<()> {
        self.check_failure()?;
        let mut tables = self.tables.borrow_mut();
        let Some(slot) = tables.restaurants.get_mut(&restaurant.id.get()) else {
            bail!("restaurant {} not found -- reload the list and retry", restaurant.id);
        };
        *slot = restaurant.clone();
        Ok(())
    }

    fn delete_restaurant(&self, id: RestaurantId) -> Result<()> {
        self.check_failure()?;
        let mut tables = self.tables.borrow_mut();
        let referenced = tables.visits.values().any(|visit| visit.restaurant_id == id)
            || tables
                .wishlist
                .values()
                .any(|entry| entry.restaurant_id == id);
        if referenced {
            bail!("restaurant {id} still has visits or wishlist entries -- delete those first");
        }
        if tables.restaurants.remove(&id.get()).is_none() {
            bail!("restaurant {id} not found -- reload the list and retry");
        }
        Ok(())
    }

    fn delete_restaurant_cascade(&self, id: RestaurantId) -> Result<()> {
        self.check_failure()?;
        let mut tables = self.tables.borrow_mut();
        if tables.restaurants.remove(&id.get()).is_none() {
            bail!("restaurant {id} not found -- reload the list and retry");
        }
        tables.visits.retain(|_, visit| visit.restaurant_id != id);
        tables.wishlist.retain(|_, entry| entry.restaurant_id != id);
        Ok(())
    }

    fn list_restaurants(&self, filter: Option<&str>) -> Result<Vec<RestaurantRow>> {
        let tables = self.tables.borrow();
        let mut rows: Vec<RestaurantRow> = tables
            .restaurants
            .values()
            .filter(|restaurant| matches(filter, &[&restaurant.name, &restaurant.city]))
            .map(|restaurant| {
                let visits: Vec<&Visit> = tables
                    .visits
                    .values()
                    .filter(|visit| visit.restaurant_id == restaurant.id)
                    .collect();
                let ratings: Vec<f64> = visits.iter().filter_map(|visit| visit.rating).collect();
                let avg_rating = if ratings.is_empty() {
                    None
                } else {
                    Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
                };
                RestaurantRow {
                    id: restaurant.id,
                    name: restaurant.name.clone(),
                    address: restaurant.address.clone(),
                    city: restaurant.city.clone(),
                    neighborhood: restaurant.neighborhood.clone(),
                    cuisine: restaurant.cuisine.clone(),
                    price_range: restaurant.price_range,
                    avg_rating,
                    visit_count: visits.len() as i64,
                    last_visit: visits.iter().map(|visit| visit.visited_on).max(),
                }
            })
            .collect();
        rows.sort_by_key(|row| row.name.to_lowercase());
        Ok(rows)
    }

    fn restaurant_detail(&self, id: RestaurantId) -> Result<RestaurantDetail> {
        let restaurant = self.get_restaurant(id)?;
        let mut visits = self.visits_for_restaurant(id)?;
        visits.sort_by(|left, right| right.visited_on.cmp(&left.visited_on));
        Ok(RestaurantDetail { restaurant, visits })
    }

    fn get_visit(&self, id: VisitId) -> Result<Visit> {
        self.tables
            .borrow()
            .visits
            .get(&id.get())
            .cloned()
            .ok_or_else(|| anyhow!("visit {id} not found -- reload the list and retry"))
    }

    fn create_visit(&self, draft: &VisitDraft) -> Result<Visit> {
        self.check_failure()?;
        self.restaurant_exists(draft.restaurant_id)?;
        let mut tables = self.tables.borrow_mut();
        tables.last_visit += 1;
        let visit = Visit {
            id: VisitId::new(tables.last_visit),
            restaurant_id: draft.restaurant_id,
            visited_on: draft.visited_on,
            rating: draft.rating,
            notes: draft.notes.clone(),
            would_return: draft.would_return,
            created_at: tables.tick(),
        };
        tables.visits.insert(visit.id.get(), visit.clone());
        Ok(visit)
    }

    fn insert_visit(&self, visit: &Visit) -> Result<()> {
        self.check_failure()?;
        self.restaurant_exists(visit.restaurant_id)?;
        let mut tables = self.tables.borrow_mut();
        if tables.visits.contains_key(&visit.id.get()) {
            bail!("visit {} already exists", visit.id);
        }
        tables.last_visit = tables.last_visit.max(visit.id.get());
        tables.visits.insert(visit.id.get(), visit.clone());
        Ok(())
    }

    fn update_visit(&self, visit: &Visit) -> Result<()> {
        self.check_failure()?;
        self.restaurant_exists(visit.restaurant_id)?;
        let mut tables = self.tables.borrow_mut();
        let Some(slot) = tables.visits.get_mut(&visit.id.get()) else {
            bail!("visit {} not found -- reload the list and retry", visit.id);
        };
        *slot = visit.clone();
        Ok(())
    }

    fn delete_visit(&self, id: VisitId) -> Result<()> {
        self.check_failure()?;
        if self.tables.borrow_mut().visits.remove(&id.get()).is_none() {
            bail!("visit {id} not found -- reload the list and retry");
        }
        Ok(())
    }

    fn list_visits(&self, filter: Option<&str>) -> Result<Vec<VisitRow>> {
        let tables = self.tables.borrow();
        let mut rows = Vec::new();
        for visit in tables.visits.values() {
            let Some(restaurant) = tables.restaurants.get(&visit.restaurant_id.get()) else {
                continue;
            };
            if !matches(filter, &[&restaurant.name, &visit.notes]) {
                continue;
            }
            rows.push(VisitRow {
                id: visit.id,
                restaurant_id: restaurant.id,
                visited_on: visit.visited_on,
                restaurant_name: restaurant.name.clone(),
                address: restaurant.address.clone(),
                city: restaurant.city.clone(),
                price_range: restaurant.price_range,
                rating: visit.rating,
                would_return: visit.would_return,
                notes: visit.notes.clone(),
            });
        }
        rows.sort_by(|left, right| {
            right
                .visited_on
                .cmp(&left.visited_on)
                .then(right.id.cmp(&left.id))
        });
        Ok(rows)
    }

    fn visits_for_restaurant(&self, id: RestaurantId) -> Result<Vec<Visit>> {
        Ok(self
            .tables
            .borrow()
            .visits
            .values()
            .filter(|visit| visit.restaurant_id == id)
            .cloned()
            .collect())
    }

    fn get_want_to_visit(&self, id: WantToVisitId) -> Result<WantToVisit> {
        self.tables
            .borrow()
            .wishlist
            .get(&id.get())
            .cloned()
            .ok_or_else(|| anyhow!("wishlist entry {id} not found -- reload the list and retry"))
    }

    fn create_want_to_visit(&self, draft: &WantToVisitDraft) -> Result<WantToVisit> {
        self.check_failure()?;
        self.restaurant_exists(draft.restaurant_id)?;
        let mut tables = self.tables.borrow_mut();
        tables.last_wishlist += 1;
        let entry = WantToVisit {
            id: WantToVisitId::new(tables.last_wishlist),
            restaurant_id: draft.restaurant_id,
            notes: draft.notes.clone(),
            priority: draft.priority,
            created_at: tables.tick(),
        };
        tables.wishlist.insert(entry.id.get(), entry.clone());
        Ok(entry)
    }

    fn insert_want_to_visit(&self, entry: &WantToVisit) -> Result<()> {
        self.check_failure()?;
        self.restaurant_exists(entry.restaurant_id)?;
        let mut tables = self.tables.borrow_mut();
        if tables.wishlist.contains_key(&entry.id.get()) {
            bail!("wishlist entry {} already exists", entry.id);
        }
        tables.last_wishlist = tables.last_wishlist.max(entry.id.get());
        tables.wishlist.insert(entry.id.get(), entry.clone());
        Ok(())
    }

    fn update_want_to_visit(&self, entry: &WantToVisit) -> Result<()> {
        self.check_failure()?;
        self.restaurant_exists(entry.restaurant_id)?;
        let mut tables = self.tables.borrow_mut();
        let Some(slot) = tables.wishlist.get_mut(&entry.id.get()) else {
            bail!("wishlist entry {} not found -- reload the list and retry", entry.id);
        };
        *slot = entry.clone();
        Ok(())
    }

    fn delete_want_to_visit(&self, id: WantToVisitId) -> Result<()> {
        self.check_failure()?;
        if self.tables.borrow_mut().wishlist.remove(&id.get()).is_none() {
            bail!("wishlist entry {id} not found -- reload the list and retry");
        }
        Ok(())
    }

    fn list_want_to_visit(&self, filter: Option<&str>) -> Result<Vec<WantToVisitRow>> {
        let tables = self.tables.borrow();
        let mut rows = Vec::new();
        for entry in tables.wishlist.values() {
            let Some(restaurant) = tables.restaurants.get(&entry.restaurant_id.get()) else {
                continue;
            };
            if !matches(filter, &[&restaurant.name, &entry.notes]) {
                continue;
            }
            rows.push((
                entry.created_at,
                WantToVisitRow {
                    id: entry.id,
                    restaurant_id: restaurant.id,
                    restaurant_name: restaurant.name.clone(),
                    address: restaurant.address.clone(),
                    city: restaurant.city.clone(),
                    neighborhood: restaurant.neighborhood.clone(),
                    cuisine: restaurant.cuisine.clone(),
                    price_range: restaurant.price_range,
                    priority: entry.priority,
                    notes: entry.notes.clone(),
                },
            ));
        }
        rows.sort_by(|(left_at, left), (right_at, right)| {
            right
                .priority
                .is_some()
                .cmp(&left.priority.is_some())
                .then(right.priority.cmp(&left.priority))
                .then(right_at.cmp(left_at))
        });
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    fn want_to_visit_for_restaurant(&self, id: RestaurantId) -> Result<Vec<WantToVisit>> {
        Ok(self
            .tables
            .borrow()
            .wishlist
            .values()
            .filter(|entry| entry.restaurant_id == id)
            .cloned()
            .collect())
    }

    fn convert_want_to_visit(&self, id: WantToVisitId, draft: &VisitDraft) -> Result<Visit> {
        self.atomically(|repo| {
            repo.get_want_to_visit(id)?;
            let visit = repo.create_visit(draft)?;
            repo.delete_want_to_visit(id)?;
            Ok(visit)
        })
    }

    fn atomically<T>(&self, work: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let snapshot = self.tables.borrow().clone();
        let result = work(self);
        if result.is_err() {
            *self.tables.borrow_mut() = snapshot;
        }
        result
    }
}
