// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod forms;
pub mod ids;
#[cfg(test)]
mod memory;
pub mod model;
pub mod nav;
pub mod prefs;
pub mod repository;
pub mod search;
pub mod state;
pub mod table;
pub mod undo;
pub mod validation;

pub use ids::*;
pub use model::*;
pub use state::*;
