// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{AppMode, FormKind, ListKind, Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Idle,
    AwaitingSecondG,
}

/// Which screen is showing, in which mode, plus pending multi-key input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    screen: Screen,
    mode: AppMode,
    gesture: Gesture,
    column_jump_pending: bool,
    return_screen: Screen,
}

impl Default for NavigationState {
    fn default() -> Self {
        let home = Screen::List(ListKind::ALL[0]);
        Self {
            screen: home,
            mode: AppMode::Nav,
            gesture: Gesture::Idle,
            column_jump_pending: false,
            return_screen: home,
        }
    }
}

impl NavigationState {
    pub const fn screen(&self) -> Screen {
        self.screen
    }

    pub const fn mode(&self) -> AppMode {
        self.mode
    }

    pub const fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub const fn column_jump_pending(&self) -> bool {
        self.column_jump_pending
    }

    pub const fn return_screen(&self) -> Screen {
        self.return_screen
    }

    /// The list whose table backs the current screen.
    pub const fn current_list(&self) -> Option<ListKind> {
        match self.screen {
            Screen::List(list) | Screen::Detail(list) => Some(list),
            Screen::Form(_) => match self.return_screen {
                Screen::List(list) | Screen::Detail(list) => Some(list),
                Screen::Form(_) => None,
            },
        }
    }

    /// Feeds a `g` press. Returns true when it completes the `gg` pair.
    pub fn press_g(&mut self) -> bool {
        match self.gesture {
            Gesture::Idle => {
                self.gesture = Gesture::AwaitingSecondG;
                false
            }
            Gesture::AwaitingSecondG => {
                self.gesture = Gesture::Idle;
                true
            }
        }
    }

    pub fn reset_gesture(&mut self) {
        self.gesture = Gesture::Idle;
    }

    pub fn begin_column_jump(&mut self) {
        self.column_jump_pending = true;
    }

    pub fn end_column_jump(&mut self) {
        self.column_jump_pending = false;
    }

    pub fn show_list(&mut self, list: ListKind) {
        self.screen = Screen::List(list);
        self.mode = AppMode::Nav;
        self.clear_pending();
    }

    pub fn show_detail(&mut self, list: ListKind) {
        self.screen = Screen::Detail(list);
        self.mode = AppMode::Nav;
        self.clear_pending();
    }

    /// Opens a form in insert mode, remembering where it was opened from.
    pub fn enter_insert(&mut self, form: FormKind) {
        if !matches!(self.screen, Screen::Form(_)) {
            self.return_screen = self.screen;
        }
        self.screen = Screen::Form(form);
        self.mode = AppMode::Insert;
        self.clear_pending();
    }

    /// Leaves insert mode for the screen the form was opened from.
    pub fn leave_insert(&mut self) -> Screen {
        self.screen = self.return_screen;
        self.mode = AppMode::Nav;
        self.clear_pending();
        self.screen
    }

    /// Moves between top-level lists. Returns the new list when it changed.
    pub fn rotate_list(&mut self, delta: isize) -> Option<ListKind> {
        let Screen::List(current) = self.screen else {
            return None;
        };
        let lists = ListKind::ALL;
        let len = lists.len() as isize;
        let position = lists
            .iter()
            .position(|list| *list == current)
            .unwrap_or_default() as isize;
        let next = lists[(position + delta).rem_euclid(len) as usize];
        self.show_list(next);
        Some(next)
    }

    pub fn first_list(&mut self) -> Option<ListKind> {
        self.jump_list(ListKind::ALL[0])
    }

    pub fn last_list(&mut self) -> Option<ListKind> {
        self.jump_list(ListKind::ALL[ListKind::ALL.len() - 1])
    }

    fn jump_list(&mut self, list: ListKind) -> Option<ListKind> {
        if !matches!(self.screen, Screen::List(_)) {
            return None;
        }
        self.show_list(list);
        Some(list)
    }

    fn clear_pending(&mut self) {
        self.gesture = Gesture::Idle;
        self.column_jump_pending = false;
    }
}
