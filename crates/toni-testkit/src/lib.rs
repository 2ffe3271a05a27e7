// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use time::macros::date;
use time::{Date, Duration};
use toni_app::repository::{RecordRepository, RestaurantDraft, VisitDraft, WantToVisitDraft};
use toni_app::{PriceRange, RestaurantId, Suggestion};

const NAME_FIRST: [&str; 16] = [
    "Golden", "Little", "Blue", "Red", "Old", "Lucky", "Silver", "Green", "Corner", "Harbor",
    "Smoke", "Salt", "Copper", "Wild", "Velvet", "Paper",
];
const NAME_SECOND: [&str; 14] = [
    "Lantern", "Spoon", "Fig", "Olive", "Dragon", "Pepper", "Table", "Oven", "Fork", "Garden",
    "Noodle", "Anchor", "Crane", "Basil",
];
const NAME_SUFFIXES: [&str; 6] = ["Kitchen", "Bistro", "Cafe", "House", "Bar", "Trattoria"];

const CUISINES: [&str; 12] = [
    "Italian",
    "Mexican",
    "Japanese",
    "Thai",
    "Indian",
    "French",
    "Korean",
    "Ethiopian",
    "Vietnamese",
    "Greek",
    "Barbecue",
    "Pizza",
];

const CITIES: [(&str, &[&str]); 4] = [
    ("New York", &["Williamsburg", "West Village", "Astoria", "Harlem"]),
    ("Dallas", &["Deep Ellum", "Bishop Arts", "Uptown"]),
    ("Chicago", &["Pilsen", "Logan Square", "Wicker Park"]),
    ("Portland", &["Alberta", "Hawthorne", "Pearl District"]),
];

const STREETS: [&str; 10] = [
    "Main St", "Elm St", "Grand Ave", "Bedford Ave", "Division St", "Mission St", "Alberta St",
    "Commerce St", "Broadway", "Halsted St",
];

const NOTE_WORDS: [&str; 20] = [
    "crispy", "tender", "spicy", "slow", "friendly", "cozy", "loud", "patio", "tasting", "menu",
    "dessert", "bread", "noodles", "wine", "cocktails", "brunch", "late", "counter", "seating",
    "special",
];

/// Reference day for generated visit dates.
const REFERENCE_DAY: Date = date!(2026 - 01 - 01);

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemoCounts {
    pub restaurants: usize,
    pub visits: usize,
    pub wishlist: usize,
}

#[derive(Debug, Clone)]
pub struct RestaurantFaker {
    rng: DeterministicRng,
}

impl RestaurantFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn name(&mut self) -> String {
        format!(
            "{} {} {}",
            self.pick(&NAME_FIRST),
            self.pick(&NAME_SECOND),
            self.pick(&NAME_SUFFIXES)
        )
    }

    pub fn restaurant(&mut self) -> RestaurantDraft {
        let (city, areas) = CITIES[self.rng.int_n(CITIES.len())];
        RestaurantDraft {
            name: self.name(),
            address: format!("{} {}", 10 + self.rng.int_n(990), self.pick(&STREETS)),
            city: city.to_owned(),
            neighborhood: self.pick(areas).to_owned(),
            cuisine: self.pick(&CUISINES).to_owned(),
            price_range: if self.rng.chance(85) {
                Some(PriceRange::ALL[self.rng.int_n(PriceRange::ALL.len())])
            } else {
                None
            },
            latitude: None,
            longitude: None,
            place_id: String::new(),
        }
    }

    /// A provider-style suggestion with coordinates and a place id.
    pub fn suggestion(&mut self) -> Suggestion {
        let draft = self.restaurant();
        Suggestion {
            name: draft.name,
            address: draft.address,
            city: draft.city,
            neighborhood: draft.neighborhood,
            cuisine: draft.cuisine,
            price_range: draft.price_range,
            latitude: Some(40.0 + self.rng.int_n(1000) as f64 / 1000.0),
            longitude: Some(-74.0 + self.rng.int_n(1000) as f64 / 1000.0),
            place_id: format!("place-{:08x}", self.rng.next_u64() as u32),
        }
    }

    pub fn visit(&mut self, restaurant_id: RestaurantId) -> VisitDraft {
        let rating = if self.rng.chance(90) {
            Some((10 + self.rng.int_n(91)) as f64 / 10.0)
        } else {
            None
        };
        VisitDraft {
            restaurant_id,
            visited_on: self.date_before(REFERENCE_DAY, 365),
            rating,
            notes: self.sentence(0, 6),
            would_return: rating.map(|value| value >= 6.0),
        }
    }

    pub fn wish(&mut self, restaurant_id: RestaurantId) -> WantToVisitDraft {
        WantToVisitDraft {
            restaurant_id,
            notes: self.sentence(0, 4),
            priority: self
                .rng
                .chance(70)
                .then(|| 1 + self.rng.int_n(5) as u8),
        }
    }

    pub fn date_before(&mut self, end: Date, span_days: usize) -> Date {
        let back = self.rng.int_n(span_days.max(1)) as i64;
        end - Duration::days(back)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn sentence(&mut self, min_words: usize, max_words: usize) -> String {
        let span = max_words.saturating_sub(min_words) + 1;
        let count = min_words + self.rng.int_n(span);
        let words: Vec<&str> = (0..count).map(|_| self.pick(&NOTE_WORDS)).collect();
        words.join(" ")
    }
}

/// Fills `repo` with a reproducible set of restaurants, visits and
/// wishlist entries. Restaurants on the wishlist are never visited.
pub fn seed_demo<R: RecordRepository>(repo: &R, seed: u64) -> Result<DemoCounts> {
    let mut faker = RestaurantFaker::new(seed);
    let mut counts = DemoCounts::default();
    let mut used = std::collections::BTreeSet::new();

    while counts.restaurants < 18 {
        let draft = faker.restaurant();
        if !used.insert(draft.name.to_lowercase()) {
            continue;
        }
        let restaurant = repo
            .create_restaurant(&draft)
            .with_context(|| format!("seed restaurant {}", draft.name))?;
        counts.restaurants += 1;

        if counts.restaurants % 4 == 0 {
            repo.create_want_to_visit(&faker.wish(restaurant.id))
                .with_context(|| format!("seed wishlist entry for {}", restaurant.name))?;
            counts.wishlist += 1;
            continue;
        }

        for _ in 0..1 + faker.int_n(4) {
            repo.create_visit(&faker.visit(restaurant.id))
                .with_context(|| format!("seed visit to {}", restaurant.name))?;
            counts.visits += 1;
        }
    }
    Ok(counts)
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("toni.db");
    Ok((dir, db_path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

pub fn cuisines() -> &'static [&'static str] {
    &CUISINES
}

#[cfg(test)]
mod tests {
    use super::{REFERENCE_DAY, RestaurantFaker, cuisines};
    use toni_app::RestaurantId;

    #[test]
    fn same_seed_same_restaurants() {
        let mut left = RestaurantFaker::new(42);
        let mut right = RestaurantFaker::new(42);
        for _ in 0..5 {
            assert_eq!(left.restaurant(), right.restaurant());
        }
    }

    #[test]
    fn zero_seed_is_normalized() {
        let mut zero = RestaurantFaker::new(0);
        let mut one = RestaurantFaker::new(1);
        assert_eq!(zero.name(), one.name());
    }

    #[test]
    fn restaurants_have_required_fields() {
        let mut faker = RestaurantFaker::new(7);
        for _ in 0..50 {
            let draft = faker.restaurant();
            assert!(!draft.name.trim().is_empty());
            assert!(cuisines().contains(&draft.cuisine.as_str()));
            assert!(!draft.neighborhood.is_empty());
        }
    }

    #[test]
    fn visits_stay_in_range() {
        let mut faker = RestaurantFaker::new(9);
        for _ in 0..200 {
            let visit = faker.visit(RestaurantId::new(1));
            assert!(visit.visited_on <= REFERENCE_DAY);
            if let Some(rating) = visit.rating {
                assert!((1.0..=10.0).contains(&rating), "rating {rating}");
            }
            assert_eq!(visit.would_return.is_some(), visit.rating.is_some());
        }
    }

    #[test]
    fn wishlist_priority_is_one_to_five() {
        let mut faker = RestaurantFaker::new(11);
        for _ in 0..200 {
            if let Some(priority) = faker.wish(RestaurantId::new(1)).priority {
                assert!((1..=5).contains(&priority));
            }
        }
    }

    #[test]
    fn suggestions_carry_place_metadata() {
        let mut faker = RestaurantFaker::new(5);
        let suggestion = faker.suggestion();
        assert!(suggestion.place_id.starts_with("place-"));
        assert!(suggestion.latitude.is_some());
    }
}
