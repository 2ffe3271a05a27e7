// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Debounced, sequence-guarded suggestion lookups for one form field.
//!
//! Timers and lookups are never cancelled. Each carries the sequence that
//! was current when it was scheduled, and is ignored on arrival if the
//! session has moved on.

use std::time::Duration;

use crate::model::Suggestion;

pub const MIN_QUERY_LEN: usize = 2;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Debouncing(u64),
    Pending(u64),
    Resolved,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Shown(usize),
    Empty,
    Failed(String),
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSession {
    sequence: u64,
    phase: SearchPhase,
    query: String,
    results: Vec<Suggestion>,
    cursor: usize,
    dropdown_visible: bool,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self {
            sequence: 0,
            phase: SearchPhase::Idle,
            query: String::new(),
            results: Vec::new(),
            cursor: 0,
            dropdown_visible: false,
        }
    }
}

impl SearchSession {
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    pub const fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[Suggestion] {
        &self.results
    }

    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    pub const fn dropdown_visible(&self) -> bool {
        self.dropdown_visible && !self.results.is_empty()
    }

    pub fn continue_after(&mut self, sequence: u64) {
        self.sequence = self.sequence.max(sequence);
    }

    /// Records new query text. Returns the sequence to schedule a debounce
    /// timer for, or `None` when the text is unchanged or too short.
    pub fn query_changed(&mut self, query: &str) -> Option<u64> {
        if query == self.query {
            return None;
        }
        self.query = query.to_owned();
        self.sequence += 1;
        if query.trim().chars().count() < MIN_QUERY_LEN {
            self.phase = SearchPhase::Idle;
            self.clear_results();
            return None;
        }
        self.phase = SearchPhase::Debouncing(self.sequence);
        Some(self.sequence)
    }

    /// Honors a debounce timer only if nothing changed since it was set.
    /// Returns the query to look up.
    pub fn debounce_fired(&mut self, sequence: u64) -> Option<String> {
        if self.phase != SearchPhase::Debouncing(sequence) || sequence != self.sequence {
            return None;
        }
        self.phase = SearchPhase::Pending(sequence);
        Some(self.query.trim().to_owned())
    }

    pub fn lookup_completed(
        &mut self,
        sequence: u64,
        result: Result<Vec<Suggestion>, String>,
    ) -> LookupOutcome {
        if self.phase != SearchPhase::Pending(sequence) || sequence != self.sequence {
            return LookupOutcome::Stale;
        }
        self.phase = SearchPhase::Resolved;
        match result {
            Ok(results) if results.is_empty() => {
                self.clear_results();
                LookupOutcome::Empty
            }
            Ok(results) => {
                let count = results.len();
                self.results = results;
                self.cursor = 0;
                self.dropdown_visible = true;
                LookupOutcome::Shown(count)
            }
            Err(error) => {
                self.clear_results();
                LookupOutcome::Failed(error)
            }
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if !self.dropdown_visible() {
            return;
        }
        let last = self.results.len() - 1;
        self.cursor = self
            .cursor
            .saturating_add_signed(delta)
            .min(last);
    }

    pub fn selected(&self) -> Option<&Suggestion> {
        if !self.dropdown_visible() {
            return None;
        }
        self.results.get(self.cursor)
    }

    pub fn dismiss(&mut self) {
        self.dropdown_visible = false;
    }

    /// Takes the highlighted suggestion and settles the query on its name
    /// without starting a new lookup.
    pub fn accept(&mut self) -> Option<Suggestion> {
        let chosen = self.selected()?.clone();
        self.query = chosen.name.clone();
        self.phase = SearchPhase::Resolved;
        self.clear_results();
        Some(chosen)
    }

    fn clear_results(&mut self) {
        self.results.clear();
        self.cursor = 0;
        self.dropdown_visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{LookupOutcome, SearchPhase, SearchSession};
    use crate::model::Suggestion;

    fn named(name: &str) -> Suggestion {
        Suggestion {
            name: name.to_owned(),
            ..Suggestion::default()
        }
    }

    #[test]
    fn short_queries_never_schedule() {
        let mut session = SearchSession::default();
        assert_eq!(session.query_changed("l"), None);
        assert_eq!(session.phase(), SearchPhase::Idle);
        assert_eq!(session.query_changed("lu"), Some(2));
        assert_eq!(session.query_changed("lu"), None);
    }

    #[test]
    fn superseded_timer_is_dropped() {
        let mut session = SearchSession::default();
        let first = session.query_changed("lu").unwrap_or_default();
        let second = session.query_changed("luc").unwrap_or_default();
        assert_eq!(session.debounce_fired(first), None);
        assert_eq!(session.debounce_fired(second).as_deref(), Some("luc"));
        assert_eq!(session.phase(), SearchPhase::Pending(second));
    }

    #[test]
    fn out_of_order_results_only_apply_latest() {
        let mut session = SearchSession::default();
        let mut sequences = Vec::new();
        for query in ["lu", "luc", "luci"] {
            let sequence = session.query_changed(query).unwrap_or_default();
            assert!(session.debounce_fired(sequence).is_some());
            sequences.push(sequence);
        }
        let (one, two, three) = (sequences[0], sequences[1], sequences[2]);

        assert_eq!(
            session.lookup_completed(three, Ok(vec![named("Lucia")])),
            LookupOutcome::Shown(1)
        );
        assert_eq!(
            session.lookup_completed(one, Ok(vec![named("Luke's"), named("Lulu")])),
            LookupOutcome::Stale
        );
        assert_eq!(
            session.lookup_completed(two, Err("boom".to_owned())),
            LookupOutcome::Stale
        );
        assert_eq!(session.results(), &[named("Lucia")]);
        assert!(session.dropdown_visible());
    }

    #[test]
    fn empty_and_failed_lookups_clear_the_dropdown() {
        let mut session = SearchSession::default();
        let sequence = session.query_changed("zz").unwrap_or_default();
        session.debounce_fired(sequence);
        assert_eq!(session.lookup_completed(sequence, Ok(Vec::new())), LookupOutcome::Empty);
        assert!(!session.dropdown_visible());

        let sequence = session.query_changed("zzz").unwrap_or_default();
        session.debounce_fired(sequence);
        assert_eq!(
            session.lookup_completed(sequence, Err("timeout".to_owned())),
            LookupOutcome::Failed("timeout".to_owned())
        );
        assert!(session.results().is_empty());
    }

    #[test]
    fn accept_takes_highlighted_row_without_new_sequence() {
        let mut session = SearchSession::default();
        let sequence = session.query_changed("lu").unwrap_or_default();
        session.debounce_fired(sequence);
        session.lookup_completed(sequence, Ok(vec![named("Lucia"), named("Lulu")]));
        session.move_cursor(5);
        assert_eq!(session.cursor(), 1);
        let chosen = session.accept();
        assert_eq!(chosen, Some(named("Lulu")));
        assert_eq!(session.sequence(), sequence);
        assert_eq!(session.query(), "Lulu");
        assert!(!session.dropdown_visible());
        assert_eq!(session.query_changed("Lulu"), None);
    }
}
