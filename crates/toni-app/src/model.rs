// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::ids::*;
use crate::table::{Column, TableRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriceRange {
    One,
    Two,
    Three,
    Four,
}

impl PriceRange {
    pub const ALL: [Self; 4] = [Self::One, Self::Two, Self::Three, Self::Four];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::One => "$",
            Self::Two => "$$",
            Self::Three => "$$$",
            Self::Four => "$$$$",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "$" => Some(Self::One),
            "$$" => Some(Self::Two),
            "$$$" => Some(Self::Three),
            "$$$$" => Some(Self::Four),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub neighborhood: String,
    pub cuisine: String,
    pub price_range: Option<PriceRange>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place_id: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub restaurant_id: RestaurantId,
    pub visited_on: Date,
    pub rating: Option<f64>,
    pub notes: String,
    pub would_return: Option<bool>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WantToVisit {
    pub id: WantToVisitId,
    pub restaurant_id: RestaurantId,
    pub notes: String,
    pub priority: Option<u8>,
    pub created_at: OffsetDateTime,
}

/// Visit joined with the restaurant columns shown in the visits list.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitRow {
    pub id: VisitId,
    pub restaurant_id: RestaurantId,
    pub visited_on: Date,
    pub restaurant_name: String,
    pub address: String,
    pub city: String,
    pub price_range: Option<PriceRange>,
    pub rating: Option<f64>,
    pub would_return: Option<bool>,
    pub notes: String,
}

/// Restaurant with aggregates over its visits.
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantRow {
    pub id: RestaurantId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub neighborhood: String,
    pub cuisine: String,
    pub price_range: Option<PriceRange>,
    pub avg_rating: Option<f64>,
    pub visit_count: i64,
    pub last_visit: Option<Date>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WantToVisitRow {
    pub id: WantToVisitId,
    pub restaurant_id: RestaurantId,
    pub restaurant_name: String,
    pub address: String,
    pub city: String,
    pub neighborhood: String,
    pub cuisine: String,
    pub price_range: Option<PriceRange>,
    pub priority: Option<u8>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisitDetail {
    pub visit: Visit,
    pub restaurant: Restaurant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantDetail {
    pub restaurant: Restaurant,
    pub visits: Vec<Visit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WantToVisitDetail {
    pub entry: WantToVisit,
    pub restaurant: Restaurant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    Visit(VisitDetail),
    Restaurant(RestaurantDetail),
    WantToVisit(WantToVisitDetail),
}

impl Detail {
    pub const fn id(&self) -> i64 {
        match self {
            Self::Visit(detail) => detail.visit.id.get(),
            Self::Restaurant(detail) => detail.restaurant.id.get(),
            Self::WantToVisit(detail) => detail.entry.id.get(),
        }
    }

    pub const fn list(&self) -> ListKind {
        match self {
            Self::Visit(_) => ListKind::Visits,
            Self::Restaurant(_) => ListKind::Restaurants,
            Self::WantToVisit(_) => ListKind::WantToVisit,
        }
    }
}

/// One ranked result from the remote business search.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Suggestion {
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

impl Suggestion {
    pub fn summary(&self) -> String {
        let mut parts = vec![self.name.clone()];
        if !self.address.is_empty() {
            parts.push(self.address.clone());
        }
        if !self.city.is_empty() {
            parts.push(self.city.clone());
        }
        if !self.cuisine.is_empty() {
            parts.push(self.cuisine.clone());
        }
        if let Some(price) = self.price_range {
            parts.push(price.as_str().to_owned());
        }
        parts.join(" · ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ListKind {
    Visits,
    WantToVisit,
    Restaurants,
}

impl ListKind {
    /// Top-level tab order.
    pub const ALL: [Self; 3] = [Self::Visits, Self::WantToVisit, Self::Restaurants];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Visits => "visits",
            Self::WantToVisit => "wishlist",
            Self::Restaurants => "restaurants",
        }
    }

    pub const fn form(self) -> FormKind {
        match self {
            Self::Visits => FormKind::Visit,
            Self::WantToVisit => FormKind::WantToVisit,
            Self::Restaurants => FormKind::Restaurant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormKind {
    Visit,
    Restaurant,
    WantToVisit,
}

impl FormKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Visit => "visit",
            Self::Restaurant => "restaurant",
            Self::WantToVisit => "wishlist entry",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screen {
    List(ListKind),
    Detail(ListKind),
    Form(FormKind),
}

impl Screen {
    pub const fn label(self) -> &'static str {
        match self {
            Self::List(list) => list.label(),
            Self::Detail(ListKind::Visits) => "visit",
            Self::Detail(ListKind::Restaurants) => "restaurant",
            Self::Detail(ListKind::WantToVisit) => "wishlist entry",
            Self::Form(kind) => kind.label(),
        }
    }

    pub const fn list(self) -> Option<ListKind> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Insert,
}

pub fn format_date(value: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        value.year(),
        u8::from(value.month()),
        value.day()
    )
}

pub fn format_rating(rating: Option<f64>) -> String {
    rating.map_or_else(String::new, |value| format!("{value:.1}"))
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "",
    }
}

fn price_text(value: Option<PriceRange>) -> String {
    value.map(PriceRange::as_str).unwrap_or_default().to_owned()
}

// Sort keys are zero-padded so that lexical order matches numeric order.
fn padded_rating(value: Option<f64>) -> String {
    value.map_or_else(String::new, |rating| format!("{rating:05.2}"))
}

const VISIT_COLUMNS: [(&str, &str, u16); 8] = [
    ("date", "date", 12),
    ("name", "name", 24),
    ("address", "address", 20),
    ("city", "city", 14),
    ("price", "price", 7),
    ("rating", "rating", 8),
    ("return", "return", 8),
    ("notes", "notes", 24),
];

const RESTAURANT_COLUMNS: [(&str, &str, u16); 9] = [
    ("name", "name", 24),
    ("address", "address", 20),
    ("city", "city", 14),
    ("area", "area", 14),
    ("cuisine", "cuisine", 14),
    ("price", "price", 7),
    ("rating", "rating", 8),
    ("visits", "visits", 8),
    ("last", "last", 12),
];

const WANT_TO_VISIT_COLUMNS: [(&str, &str, u16); 8] = [
    ("name", "name", 24),
    ("address", "address", 20),
    ("city", "city", 14),
    ("area", "area", 14),
    ("cuisine", "cuisine", 14),
    ("price", "price", 7),
    ("priority", "priority", 10),
    ("notes", "notes", 24),
];

fn columns_from(defs: &[(&'static str, &'static str, u16)]) -> Vec<Column> {
    defs.iter()
        .map(|&(key, label, width)| Column::new(key, label, width))
        .collect()
}

impl TableRecord for VisitRow {
    fn record_id(&self) -> i64 {
        self.id.get()
    }

    fn columns() -> Vec<Column> {
        columns_from(&VISIT_COLUMNS)
    }

    fn project(&self, key: &str) -> String {
        match key {
            "date" => format_date(self.visited_on),
            "name" => self.restaurant_name.clone(),
            "address" => self.address.clone(),
            "city" => self.city.clone(),
            "price" => price_text(self.price_range),
            "rating" => padded_rating(self.rating),
            "return" => yes_no(self.would_return).to_owned(),
            "notes" => self.notes.clone(),
            _ => String::new(),
        }
    }

    fn display(&self, key: &str) -> String {
        match key {
            "rating" => format_rating(self.rating),
            _ => self.project(key),
        }
    }
}

impl TableRecord for RestaurantRow {
    fn record_id(&self) -> i64 {
        self.id.get()
    }

    fn columns() -> Vec<Column> {
        columns_from(&RESTAURANT_COLUMNS)
    }

    fn project(&self, key: &str) -> String {
        match key {
            "name" => self.name.clone(),
            "address" => self.address.clone(),
            "city" => self.city.clone(),
            "area" => self.neighborhood.clone(),
            "cuisine" => self.cuisine.clone(),
            "price" => price_text(self.price_range),
            "rating" => padded_rating(self.avg_rating),
            "visits" => format!("{:06}", self.visit_count),
            "last" => self.last_visit.map(format_date).unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn display(&self, key: &str) -> String {
        match key {
            "rating" => format_rating(self.avg_rating),
            "visits" => self.visit_count.to_string(),
            _ => self.project(key),
        }
    }
}

impl TableRecord for WantToVisitRow {
    fn record_id(&self) -> i64 {
        self.id.get()
    }

    fn columns() -> Vec<Column> {
        columns_from(&WANT_TO_VISIT_COLUMNS)
    }

    fn project(&self, key: &str) -> String {
        match key {
            "name" => self.restaurant_name.clone(),
            "address" => self.address.clone(),
            "city" => self.city.clone(),
            "area" => self.neighborhood.clone(),
            "cuisine" => self.cuisine.clone(),
            "price" => price_text(self.price_range),
            "priority" => self
                .priority
                .map(|priority| format!("{priority:02}"))
                .unwrap_or_default(),
            "notes" => self.notes.clone(),
            _ => String::new(),
        }
    }

    fn display(&self, key: &str) -> String {
        match key {
            "priority" => self
                .priority
                .map(|priority| priority.to_string())
                .unwrap_or_default(),
            _ => self.project(key),
        }
    }
}
