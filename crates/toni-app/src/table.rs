// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Sort, filter, column visibility and cursor state for one list screen.
//!
//! `TableState` never mutates its records. Every operation re-derives the
//! visible ordering and re-clamps the cursor and viewport before returning.

use std::cmp::Ordering;

use crate::prefs::TablePrefs;

pub const DEFAULT_VIEWPORT_HEIGHT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub width: u16,
    pub hidden: bool,
}

impl Column {
    pub const fn new(key: &'static str, label: &'static str, width: u16) -> Self {
        Self {
            key,
            label,
            width,
            hidden: false,
        }
    }
}

/// A record that can be shown in a `TableState`.
pub trait TableRecord: Clone {
    fn record_id(&self) -> i64;

    fn columns() -> Vec<Column>;

    /// String used for sorting and filtering. Unknown keys project to "".
    fn project(&self, key: &str) -> String;

    /// String shown in the cell.
    fn display(&self, key: &str) -> String {
        self.project(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    SortAsc(&'static str),
    SortDesc(&'static str),
    SortCleared,
    ColumnHidden(&'static str),
    KeepOneColumnVisible,
    ColumnsShown,
    FilterOn(&'static str, String),
    FilterOff,
    FilterUnavailable,
    EmptyCell,
    ColumnJump(&'static str),
    NoSuchColumn(usize),
}

impl TableStatus {
    pub fn message(&self) -> String {
        match self {
            Self::SortAsc(label) => format!("sort {label} asc"),
            Self::SortDesc(label) => format!("sort {label} desc"),
            Self::SortCleared => "sort cleared".to_owned(),
            Self::ColumnHidden(label) => format!("column hidden: {label}"),
            Self::KeepOneColumnVisible => "keep one column visible".to_owned(),
            Self::ColumnsShown => "all columns shown".to_owned(),
            Self::FilterOn(label, value) => format!("filter {label} = {value}"),
            Self::FilterOff => "filter off".to_owned(),
            Self::FilterUnavailable => "nothing to filter".to_owned(),
            Self::EmptyCell => "empty cell, filter unchanged".to_owned(),
            Self::ColumnJump(label) => format!("column jump: {label}"),
            Self::NoSuchColumn(ordinal) => format!("no visible column {ordinal}"),
        }
    }

    /// Whether the status reflects a change worth persisting to preferences.
    pub const fn changes_prefs(&self) -> bool {
        matches!(
            self,
            Self::SortAsc(_)
                | Self::SortDesc(_)
                | Self::SortCleared
                | Self::ColumnHidden(_)
                | Self::ColumnsShown
                | Self::ColumnJump(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Filter {
    key: &'static str,
    value: String,
}

#[derive(Debug, Clone)]
pub struct TableState<R> {
    all: Vec<R>,
    columns: Vec<Column>,
    visible: Vec<usize>,
    active_column: usize,
    sort_key: Option<&'static str>,
    sort_desc: bool,
    filter: Option<Filter>,
    cursor: usize,
    offset: usize,
    viewport_height: usize,
}

impl<R: TableRecord> TableState<R> {
    pub fn new(records: Vec<R>) -> Self {
        let mut table = Self {
            all: records,
            columns: R::columns(),
            visible: Vec::new(),
            active_column: 0,
            sort_key: None,
            sort_desc: false,
            filter: None,
            cursor: 0,
            offset: 0,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
        };
        table.rederive();
        table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = (usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| !column.hidden)
    }

    pub fn active_column(&self) -> usize {
        self.active_column
    }

    pub fn active_column_key(&self) -> &'static str {
        self.columns
            .get(self.active_column)
            .map(|column| column.key)
            .unwrap_or_default()
    }

    pub fn sort(&self) -> Option<(&'static str, bool)> {
        self.sort_key.map(|key| (key, self.sort_desc))
    }

    pub fn filter(&self) -> Option<(&'static str, &str)> {
        self.filter
            .as_ref()
            .map(|filter| (filter.key, filter.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn total_len(&self) -> usize {
        self.all.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    pub fn rows(&self) -> impl Iterator<Item = &R> {
        self.visible.iter().filter_map(|index| self.all.get(*index))
    }

    /// Rows inside the current viewport, with their visible index.
    pub fn window(&self) -> impl Iterator<Item = (usize, &R)> {
        self.rows()
            .enumerate()
            .skip(self.offset)
            .take(self.viewport_height)
    }

    pub fn selected(&self) -> Option<&R> {
        self.visible
            .get(self.cursor)
            .and_then(|index| self.all.get(*index))
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.selected().map(TableRecord::record_id)
    }

    /// Moves the cursor onto the record with `id`, if it is visible.
    pub fn select_id(&mut self, id: i64) -> bool {
        let Some(position) = self
            .rows()
            .position(|record| record.record_id() == id)
        else {
            return false;
        };
        self.cursor = position;
        self.clamp();
        true
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = if height == 0 {
            DEFAULT_VIEWPORT_HEIGHT
        } else {
            height
        };
        self.clamp();
    }

    pub fn move_active_column(&mut self, delta: isize) {
        if self.columns.is_empty() {
            return;
        }
        let count = self.columns.len();
        let forward = delta >= 0;
        for _ in 0..delta.unsigned_abs() {
            let mut next = self.active_column;
            for _ in 0..count {
                next = if forward {
                    (next + 1) % count
                } else {
                    (next + count - 1) % count
                };
                if !self.columns[next].hidden {
                    break;
                }
            }
            self.active_column = next;
        }
        self.rederive();
    }

    /// Selects the column at a 1-based ordinal. Hidden or missing targets fail.
    pub fn jump_to_column(&mut self, ordinal: usize) -> bool {
        let Some(index) = ordinal.checked_sub(1) else {
            return false;
        };
        match self.columns.get(index) {
            Some(column) if !column.hidden => {
                self.active_column = index;
                self.rederive();
                true
            }
            _ => false,
        }
    }

    pub fn set_sort(&mut self, key: &str, descending: bool) -> bool {
        let Some(column) = self.column_by_key(key) else {
            return false;
        };
        self.sort_key = Some(column.key);
        self.sort_desc = descending;
        self.rederive();
        true
    }

    /// Cycles the active column through ascending, descending and unsorted.
    pub fn cycle_sort(&mut self) -> TableStatus {
        let Some(column) = self.columns.get(self.active_column) else {
            return TableStatus::SortCleared;
        };
        let (key, label) = (column.key, column.label);
        let status = match (self.sort_key, self.sort_desc) {
            (Some(current), false) if current == key => {
                self.sort_desc = true;
                TableStatus::SortDesc(label)
            }
            (Some(current), true) if current == key => {
                self.sort_key = None;
                self.sort_desc = false;
                TableStatus::SortCleared
            }
            _ => {
                self.sort_key = Some(key);
                self.sort_desc = false;
                TableStatus::SortAsc(label)
            }
        };
        self.rederive();
        status
    }

    pub fn toggle_hide_active_column(&mut self) -> TableStatus {
        if self.visible_columns().count() <= 1 {
            return TableStatus::KeepOneColumnVisible;
        }
        let Some(column) = self.columns.get_mut(self.active_column) else {
            return TableStatus::KeepOneColumnVisible;
        };
        column.hidden = true;
        let label = column.label;
        self.rehome_active_column();
        self.rederive();
        TableStatus::ColumnHidden(label)
    }

    pub fn show_all_columns(&mut self) -> TableStatus {
        for column in &mut self.columns {
            column.hidden = false;
        }
        self.rederive();
        TableStatus::ColumnsShown
    }

    pub fn set_filter_from_cursor(&mut self) -> TableStatus {
        let Some((key, label, value)) = self.selected_cell() else {
            return TableStatus::FilterUnavailable;
        };
        if value.is_empty() {
            return TableStatus::EmptyCell;
        }
        self.filter = Some(Filter {
            key,
            value: value.clone(),
        });
        self.rederive();
        TableStatus::FilterOn(label, value)
    }

    /// Same as `set_filter_from_cursor`, but turns off an identical filter.
    pub fn cycle_filter_from_cursor(&mut self) -> TableStatus {
        let Some((key, _, value)) = self.selected_cell() else {
            return TableStatus::FilterUnavailable;
        };
        if let Some(active) = &self.filter
            && active.key == key
            && active.value.eq_ignore_ascii_case(&value)
        {
            return self.clear_filter();
        }
        self.set_filter_from_cursor()
    }

    pub fn clear_filter(&mut self) -> TableStatus {
        self.filter = None;
        self.rederive();
        TableStatus::FilterOff
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        self.cursor = if delta.is_negative() {
            self.cursor.saturating_sub(delta.unsigned_abs())
        } else {
            self.cursor.saturating_add(delta.unsigned_abs())
        };
        self.clamp();
    }

    pub fn jump_top(&mut self) {
        self.cursor = 0;
        self.clamp();
    }

    pub fn jump_bottom(&mut self) {
        self.cursor = self.visible.len().saturating_sub(1);
        self.clamp();
    }

    pub fn half_page_down(&mut self, rows: usize) {
        self.move_cursor(isize::try_from(rows.max(1)).unwrap_or(isize::MAX));
    }

    pub fn half_page_up(&mut self, rows: usize) {
        self.move_cursor(-isize::try_from(rows.max(1)).unwrap_or(isize::MAX));
    }

    /// Half of the viewport height, at least one row.
    pub fn half_page(&self) -> usize {
        (self.viewport_height / 2).max(1)
    }

    /// Short position and sort/filter summary for the table header.
    pub fn meta(&self) -> String {
        let position = if self.visible.is_empty() {
            format!("0/{}", self.all.len())
        } else if self.visible.len() == self.all.len() {
            format!("{}/{}", self.cursor + 1, self.visible.len())
        } else {
            format!(
                "{}/{} of {}",
                self.cursor + 1,
                self.visible.len(),
                self.all.len()
            )
        };
        let mut parts = vec![position];
        if let Some(key) = self.sort_key {
            let direction = if self.sort_desc { "desc" } else { "asc" };
            parts.push(format!("sort {} {direction}", self.label_for(key)));
        }
        if let Some(filter) = &self.filter {
            parts.push(format!(
                "filter {} = {}",
                self.label_for(filter.key),
                filter.value
            ));
        }
        parts.join(" · ")
    }

    pub fn prefs(&self) -> TablePrefs {
        TablePrefs {
            sort_key: self.sort_key.map(str::to_owned),
            sort_desc: self.sort_desc,
            hidden_columns: self
                .columns
                .iter()
                .filter(|column| column.hidden)
                .map(|column| column.key.to_owned())
                .collect(),
            active_column: self.columns.get(self.active_column).map(|c| c.key.to_owned()),
        }
    }

    /// Applies stored preferences, ignoring keys this table does not know.
    pub fn apply_prefs(&mut self, prefs: &TablePrefs) {
        for column in &mut self.columns {
            column.hidden = prefs.hidden_columns.contains(column.key);
        }
        if self.columns.iter().all(|column| column.hidden)
            && let Some(first) = self.columns.first_mut()
        {
            first.hidden = false;
        }

        self.sort_key = prefs
            .sort_key
            .as_deref()
            .and_then(|key| self.column_by_key(key))
            .map(|column| column.key);
        self.sort_desc = self.sort_key.is_some() && prefs.sort_desc;

        if let Some(index) = prefs
            .active_column
            .as_deref()
            .and_then(|key| self.columns.iter().position(|column| column.key == key))
        {
            self.active_column = index;
        }
        self.rehome_active_column();
        self.rederive();
    }

    /// Carries the filter, viewport height and selected record over from the
    /// table this one replaces after a reload.
    pub fn carry_view_from(&mut self, previous: &Self) {
        self.viewport_height = previous.viewport_height;
        self.filter = previous.filter.clone();
        self.cursor = previous.cursor;
        self.offset = previous.offset;
        self.rederive();
        if let Some(id) = previous.selected_id() {
            self.select_id(id);
        }
    }

    fn column_by_key(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.key == key)
    }

    fn label_for(&self, key: &str) -> &'static str {
        self.column_by_key(key)
            .map(|column| column.label)
            .unwrap_or_default()
    }

    fn selected_cell(&self) -> Option<(&'static str, &'static str, String)> {
        let column = self.columns.get(self.active_column)?;
        let record = self.selected()?;
        Some((
            column.key,
            column.label,
            record.project(column.key).trim().to_owned(),
        ))
    }

    // Moves the active column to the nearest visible one, looking right first.
    fn rehome_active_column(&mut self) {
        let count = self.columns.len();
        if count == 0 {
            self.active_column = 0;
            return;
        }
        self.active_column = self.active_column.min(count - 1);
        if !self.columns[self.active_column].hidden {
            return;
        }
        for distance in 1..count {
            let right = self.active_column + distance;
            if right < count && !self.columns[right].hidden {
                self.active_column = right;
                return;
            }
            if let Some(left) = self.active_column.checked_sub(distance)
                && !self.columns[left].hidden
            {
                self.active_column = left;
                return;
            }
        }
    }

    fn rederive(&mut self) {
        let selected = self.selected_id();

        let filter = self
            .filter
            .as_ref()
            .map(|filter| (filter.key, filter.value.to_lowercase()));
        let mut visible: Vec<usize> = self
            .all
            .iter()
            .enumerate()
            .filter(|(_, record)| match &filter {
                Some((key, value)) => record.project(key).trim().to_lowercase() == *value,
                None => true,
            })
            .map(|(index, _)| index)
            .collect();

        if let Some(key) = self.sort_key {
            let mut keyed: Vec<(String, i64, usize)> = visible
                .iter()
                .map(|index| {
                    let record = &self.all[*index];
                    (
                        record.project(key).to_lowercase(),
                        record.record_id(),
                        *index,
                    )
                })
                .collect();
            let descending = self.sort_desc;
            keyed.sort_by(|left, right| {
                let by_value = left.0.cmp(&right.0);
                let by_value = if descending {
                    by_value.reverse()
                } else {
                    by_value
                };
                match by_value {
                    Ordering::Equal => right.1.cmp(&left.1),
                    other => other,
                }
            });
            visible = keyed.into_iter().map(|(_, _, index)| index).collect();
        }

        self.visible = visible;
        let position =
            selected.and_then(|id| self.rows().position(|record| record.record_id() == id));
        if let Some(position) = position {
            self.cursor = position;
        }
        self.clamp();
    }

    fn clamp(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            self.cursor = 0;
            self.offset = 0;
            return;
        }
        let height = self.viewport_height.max(1);
        self.cursor = self.cursor.min(len - 1);
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }
        self.offset = self.offset.min(len.saturating_sub(height));
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, TableRecord, TableState, TableStatus};
    use crate::prefs::TablePrefs;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        name: String,
        cuisine: String,
        city: String,
    }

    impl TableRecord for Row {
        fn record_id(&self) -> i64 {
            self.id
        }

        fn columns() -> Vec<Column> {
            vec![
                Column::new("name", "name", 20),
                Column::new("cuisine", "cuisine", 12),
                Column::new("city", "city", 12),
            ]
        }

        fn project(&self, key: &str) -> String {
            match key {
                "name" => self.name.clone(),
                "cuisine" => self.cuisine.clone(),
                "city" => self.city.clone(),
                _ => String::new(),
            }
        }
    }

    fn row(id: i64, name: &str, cuisine: &str) -> Row {
        Row {
            id,
            name: name.to_owned(),
            cuisine: cuisine.to_owned(),
            city: "Brooklyn".to_owned(),
        }
    }

    fn sample() -> TableState<Row> {
        TableState::new(vec![
            row(1, "Lucia", "Italian"),
            row(2, "Ugly Baby", "Thai"),
            row(3, "Lilia", "italian"),
            row(4, "Di Fara", ""),
        ])
    }

    fn ids(table: &TableState<Row>) -> Vec<i64> {
        table.rows().map(|row| row.id).collect()
    }

    #[test]
    fn empty_table_pins_cursor_and_ignores_movement() {
        let mut table = TableState::<Row>::new(Vec::new());
        table.move_cursor(3);
        table.jump_bottom();
        table.half_page_down(5);
        table.move_cursor(-2);
        assert_eq!(table.cursor(), 0);
        assert_eq!(table.offset(), 0);
        assert!(table.selected().is_none());
        assert_eq!(table.set_filter_from_cursor(), TableStatus::FilterUnavailable);
        assert_eq!(table.meta(), "0/0");
    }

    #[test]
    fn unsorted_table_keeps_load_order() {
        let table = sample();
        assert_eq!(ids(&table), vec![1, 2, 3, 4]);
    }

    #[test]
    fn cycle_sort_walks_asc_desc_cleared() {
        let mut table = sample();
        assert_eq!(table.cycle_sort(), TableStatus::SortAsc("name"));
        assert_eq!(ids(&table), vec![4, 3, 1, 2]);
        assert_eq!(table.cycle_sort(), TableStatus::SortDesc("name"));
        assert_eq!(ids(&table), vec![2, 1, 3, 4]);
        assert_eq!(table.cycle_sort(), TableStatus::SortCleared);
        assert_eq!(table.sort(), None);
        assert_eq!(ids(&table), vec![1, 2, 3, 4]);
    }

    #[test]
    fn equal_projections_break_ties_by_descending_id() {
        let mut table = sample();
        assert!(table.set_sort("cuisine", false));
        // "" first, then the two italian rows by id desc, then thai.
        assert_eq!(ids(&table), vec![4, 3, 1, 2]);
        assert!(table.set_sort("cuisine", true));
        assert_eq!(ids(&table), vec![2, 3, 1, 4]);
        assert!(!table.set_sort("missing", false));
    }

    #[test]
    fn filter_from_cell_then_clear_restores_everything() {
        let mut table = sample();
        table.move_active_column(1);
        assert_eq!(table.active_column_key(), "cuisine");
        assert_eq!(
            table.set_filter_from_cursor(),
            TableStatus::FilterOn("cuisine", "Italian".to_owned())
        );
        assert_eq!(ids(&table), vec![1, 3]);
        assert_eq!(table.clear_filter(), TableStatus::FilterOff);
        assert_eq!(table.len(), table.total_len());
    }

    #[test]
    fn cycle_filter_toggles_the_same_cell_off() {
        let mut table = sample();
        table.move_active_column(1);
        assert!(matches!(
            table.cycle_filter_from_cursor(),
            TableStatus::FilterOn(..)
        ));
        assert_eq!(table.len(), 2);
        assert_eq!(table.cycle_filter_from_cursor(), TableStatus::FilterOff);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn empty_cell_does_not_filter() {
        let mut table = sample();
        table.move_active_column(1);
        table.jump_bottom();
        assert_eq!(table.set_filter_from_cursor(), TableStatus::EmptyCell);
        assert_eq!(table.filter(), None);
    }

    #[test]
    fn hiding_rehomes_and_keeps_one_column() {
        let mut table = sample();
        assert_eq!(
            table.toggle_hide_active_column(),
            TableStatus::ColumnHidden("name")
        );
        assert_eq!(table.active_column_key(), "cuisine");
        table.move_active_column(1);
        assert_eq!(
            table.toggle_hide_active_column(),
            TableStatus::ColumnHidden("city")
        );
        assert_eq!(table.active_column_key(), "cuisine");
        assert_eq!(
            table.toggle_hide_active_column(),
            TableStatus::KeepOneColumnVisible
        );
        assert_eq!(table.visible_columns().count(), 1);
        assert_eq!(table.show_all_columns(), TableStatus::ColumnsShown);
        assert_eq!(table.visible_columns().count(), 3);
    }

    #[test]
    fn jump_to_column_rejects_hidden_and_out_of_range() {
        let mut table = sample();
        table.move_active_column(1);
        table.toggle_hide_active_column();
        assert!(!table.jump_to_column(2));
        assert!(!table.jump_to_column(0));
        assert!(!table.jump_to_column(9));
        assert!(table.jump_to_column(3));
        assert_eq!(table.active_column_key(), "city");
    }

    #[test]
    fn viewport_follows_cursor() {
        let records = (1..=30).map(|id| row(id, "x", "y")).collect();
        let mut table = TableState::new(records);
        table.set_viewport_height(5);
        table.half_page_down(table.half_page());
        assert_eq!(table.cursor(), 2);
        table.move_cursor(10);
        assert_eq!(table.cursor(), 12);
        assert_eq!(table.offset(), 8);
        table.jump_bottom();
        assert_eq!(table.cursor(), 29);
        assert_eq!(table.offset(), 25);
        table.jump_top();
        assert_eq!(table.offset(), 0);
        table.set_viewport_height(0);
        assert_eq!(table.viewport_height(), super::DEFAULT_VIEWPORT_HEIGHT);
    }

    #[test]
    fn cursor_follows_selected_record_across_sorts() {
        let mut table = sample();
        table.jump_bottom();
        assert_eq!(table.selected_id(), Some(4));
        table.cycle_sort();
        assert_eq!(table.selected_id(), Some(4));
        assert_eq!(table.cursor(), 0);
    }

    #[test]
    fn prefs_apply_ignores_unknown_keys_and_repairs_all_hidden() {
        let mut table = sample();
        let prefs = TablePrefs {
            sort_key: Some("nope".to_owned()),
            sort_desc: true,
            hidden_columns: ["name", "cuisine", "city", "ghost"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            active_column: Some("city".to_owned()),
        };
        table.apply_prefs(&prefs);
        assert_eq!(table.sort(), None);
        assert_eq!(table.visible_columns().count(), 1);
        assert_eq!(table.active_column_key(), "name");

        let mut other = sample();
        other.move_active_column(2);
        other.cycle_sort();
        other.cycle_sort();
        let saved = other.prefs();
        let mut restored = sample();
        restored.apply_prefs(&saved);
        assert_eq!(restored.sort(), Some(("city", true)));
        assert_eq!(restored.active_column_key(), "city");
    }

    #[test]
    fn meta_reports_position_sort_and_filter() {
        let mut table = sample();
        table.move_active_column(1);
        table.cycle_sort();
        table.set_filter_from_cursor();
        assert_eq!(
            table.meta(),
            "2/2 of 4 · sort cuisine asc · filter cuisine = Italian"
        );
    }

    #[test]
    fn reload_keeps_filter_and_selection() {
        let mut old = sample();
        old.move_active_column(1);
        old.set_filter_from_cursor();
        old.move_cursor(1);
        assert_eq!(old.selected_id(), Some(3));

        let mut fresh = TableState::new(vec![
            row(3, "Lilia", "Italian"),
            row(5, "Roscioli", "Italian"),
            row(2, "Ugly Baby", "Thai"),
        ]);
        fresh.apply_prefs(&old.prefs());
        fresh.carry_view_from(&old);
        assert_eq!(ids(&fresh), vec![3, 5]);
        assert_eq!(fresh.selected_id(), Some(3));
        assert_eq!(fresh.active_column_key(), "cuisine");
    }

    fn records() -> impl Strategy<Value = Vec<Row>> {
        prop::collection::vec(
            ("[a-c]{0,2}", "[A-Ca-c]{0,1}", "[xy]{1}"),
            0..24,
        )
        .prop_map(|fields| {
            fields
                .into_iter()
                .enumerate()
                .map(|(index, (name, cuisine, city))| Row {
                    id: i64::try_from(index).unwrap_or_default() + 1,
                    name,
                    cuisine,
                    city,
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn active_column_stays_visible_and_cycles(
            hidden in prop::collection::vec(any::<bool>(), 3),
            steps in prop::collection::vec(prop_oneof![Just(1isize), Just(-1isize)], 0..20),
        ) {
            let mut table = TableState::new(vec![row(1, "a", "b")]);
            for (index, hide) in hidden.iter().enumerate() {
                if *hide {
                    table.jump_to_column(index + 1);
                    table.toggle_hide_active_column();
                }
            }
            for step in steps {
                table.move_active_column(step);
                prop_assert!(!table.columns()[table.active_column()].hidden);
            }
            let start = table.active_column();
            let visible = table.visible_columns().count();
            for _ in 0..visible {
                table.move_active_column(1);
            }
            prop_assert_eq!(table.active_column(), start);
            prop_assert!(visible >= 1);
        }

        #[test]
        fn hiding_never_removes_the_last_column(presses in 0usize..8, moves in 0isize..5) {
            let mut table = TableState::new(vec![row(1, "a", "b")]);
            for _ in 0..presses {
                table.move_active_column(moves);
                let before = table.visible_columns().count();
                let status = table.toggle_hide_active_column();
                if before == 1 {
                    prop_assert_eq!(status, TableStatus::KeepOneColumnVisible);
                }
                prop_assert!(table.visible_columns().count() >= 1);
            }
        }

        #[test]
        fn sorted_rows_are_a_stable_permutation(
            rows in records(),
            key in prop_oneof![Just("name"), Just("cuisine"), Just("city")],
            descending in any::<bool>(),
        ) {
            let mut table = TableState::new(rows.clone());
            table.set_sort(key, descending);
            let mut seen: Vec<i64> = table.rows().map(|row| row.id).collect();
            let sorted: Vec<&Row> = table.rows().collect();
            for pair in sorted.windows(2) {
                let left = pair[0].project(key).to_lowercase();
                let right = pair[1].project(key).to_lowercase();
                if left == right {
                    prop_assert!(pair[0].id > pair[1].id);
                } else if descending {
                    prop_assert!(left > right);
                } else {
                    prop_assert!(left < right);
                }
            }
            seen.sort_unstable();
            let mut expected: Vec<i64> = rows.iter().map(|row| row.id).collect();
            expected.sort_unstable();
            prop_assert_eq!(seen, expected);
        }

        #[test]
        fn cycle_sort_three_times_is_identity(rows in records(), column in 1usize..=3) {
            let mut table = TableState::new(rows);
            table.jump_to_column(column);
            let baseline: Vec<i64> = table.rows().map(|row| row.id).collect();
            for _ in 0..3 {
                table.cycle_sort();
            }
            prop_assert_eq!(table.sort(), None);
            prop_assert_eq!(table.rows().map(|row| row.id).collect::<Vec<_>>(), baseline);
        }

        #[test]
        fn cursor_and_offset_stay_clamped(
            rows in records(),
            height in 0usize..8,
            moves in prop::collection::vec(-6isize..6, 0..16),
        ) {
            let mut table = TableState::new(rows);
            table.set_viewport_height(height);
            for delta in moves {
                table.move_cursor(delta);
                table.move_active_column(1);
                table.cycle_filter_from_cursor();
                if table.is_empty() {
                    prop_assert_eq!(table.cursor(), 0);
                } else {
                    prop_assert!(table.cursor() < table.len());
                }
                prop_assert!(table.offset() <= table.cursor());
                prop_assert!(table.cursor() < table.offset() + table.viewport_height());
            }
        }
    }
}
