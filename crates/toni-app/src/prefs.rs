// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::ListKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablePrefs {
    pub sort_key: Option<String>,
    pub sort_desc: bool,
    pub hidden_columns: BTreeSet<String>,
    pub active_column: Option<String>,
}

/// Per-list table preferences, persisted between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPreferences {
    pub visits: TablePrefs,
    pub restaurants: TablePrefs,
    pub want_to_visit: TablePrefs,
}

impl UiPreferences {
    pub const fn table(&self, list: ListKind) -> &TablePrefs {
        match list {
            ListKind::Visits => &self.visits,
            ListKind::Restaurants => &self.restaurants,
            ListKind::WantToVisit => &self.want_to_visit,
        }
    }

    pub fn set_table(&mut self, list: ListKind, prefs: TablePrefs) {
        match list {
            ListKind::Visits => self.visits = prefs,
            ListKind::Restaurants => self.restaurants = prefs,
            ListKind::WantToVisit => self.want_to_visit = prefs,
        }
    }
}
