// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use toni_app::repository::{RecordRepository, RestaurantDraft, VisitDraft, WantToVisitDraft};
use toni_app::{
    PriceRange, Restaurant, RestaurantDetail, RestaurantId, RestaurantRow, Visit, VisitId,
    VisitRow, WantToVisit, WantToVisitId, WantToVisitRow,
};
use tracing::{debug, info, warn};

pub const APP_NAME: &str = "toni";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "restaurants",
        &[
            "id",
            "name",
            "address",
            "city",
            "neighborhood",
            "cuisine",
            "price_range",
            "latitude",
            "longitude",
            "place_id",
            "created_at",
        ],
    ),
    (
        "visits",
        &[
            "id",
            "restaurant_id",
            "visited_on",
            "rating",
            "notes",
            "would_return",
            "created_at",
        ],
    ),
    (
        "want_to_visit",
        &["id", "restaurant_id", "notes", "priority", "created_at"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_restaurants_name",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_restaurants_name ON restaurants (name COLLATE NOCASE);",
    },
    RequiredIndex {
        name: "idx_visits_restaurant_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_visits_restaurant_id ON visits (restaurant_id);",
    },
    RequiredIndex {
        name: "idx_visits_visited_on",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_visits_visited_on ON visits (visited_on);",
    },
    RequiredIndex {
        name: "idx_want_to_visit_restaurant_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_want_to_visit_restaurant_id ON want_to_visit (restaurant_id);",
    },
];

const RESTAURANT_SELECT: &str = "
    SELECT
      id, name, address, city, neighborhood, cuisine,
      price_range, latitude, longitude, place_id, created_at
    FROM restaurants
";

const VISIT_SELECT: &str = "
    SELECT id, restaurant_id, visited_on, rating, notes, would_return, created_at
    FROM visits
";

const WANT_TO_VISIT_SELECT: &str = "
    SELECT id, restaurant_id, notes, priority, created_at
    FROM want_to_visit
";

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            info!("created database schema");
        }

        ensure_required_indexes(&self.conn)
    }

    fn query_rows<T, P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
        what: &str,
    ) -> Result<Vec<T>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .with_context(|| format!("prepare {what} query"))?;
        let rows = stmt
            .query_map(params, map)
            .with_context(|| format!("query {what}"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("collect {what}"))
    }

    fn count_dependents(&self, table: &str, id: RestaurantId) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE restaurant_id = ?");
        self.conn
            .query_row(&sql, params![id.get()], |row| row.get(0))
            .with_context(|| format!("count {table} for restaurant {id}"))
    }

    fn require_restaurant(&self, id: RestaurantId) -> Result<()> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM restaurants WHERE id = ?",
                params![id.get()],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("check restaurant {id}"))?;
        if exists.is_none() {
            bail!("restaurant {id} no longer exists -- pick another restaurant and retry");
        }
        Ok(())
    }
}

impl RecordRepository for Store {
    fn get_restaurant(&self, id: RestaurantId) -> Result<Restaurant> {
        self.conn
            .query_row(
                &format!("{RESTAURANT_SELECT} WHERE id = ?"),
                params![id.get()],
                restaurant_from_row,
            )
            .optional()
            .with_context(|| format!("load restaurant {id}"))?
            .ok_or_else(|| anyhow!("restaurant {id} not found -- reload the list and retry"))
    }

    fn find_restaurant_by_name(&self, name: &str) -> Result<Option<Restaurant>> {
        self.conn
            .query_row(
                &format!("{RESTAURANT_SELECT} WHERE lower(name) = lower(?) ORDER BY id LIMIT 1"),
                params![name.trim()],
                restaurant_from_row,
            )
            .optional()
            .with_context(|| format!("find restaurant named {:?}", name.trim()))
    }

    fn search_restaurants(&self, query: &str, limit: usize) -> Result<Vec<Restaurant>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.query_rows(
            &format!(
                "{RESTAURANT_SELECT}
                WHERE instr(lower(name), lower(?)) > 0
                ORDER BY name COLLATE NOCASE ASC, id ASC
                LIMIT ?"
            ),
            params![query.trim(), limit],
            restaurant_from_row,
            "restaurant search",
        )
    }

    fn create_restaurant(&self, draft: &RestaurantDraft) -> Result<Restaurant> {
        let name = draft.name.trim();
        if name.is_empty() {
            bail!("restaurant name is required -- fill it in and save again");
        }
        self.conn
            .execute(
                "
                INSERT INTO restaurants (
                  name, address, city, neighborhood, cuisine,
                  price_range, latitude, longitude, place_id, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    name,
                    draft.address.trim(),
                    draft.city.trim(),
                    draft.neighborhood.trim(),
                    draft.cuisine.trim(),
                    draft.price_range.map(PriceRange::as_str),
                    draft.latitude,
                    draft.longitude,
                    draft.place_id,
                    now_rfc3339()?,
                ],
            )
            .with_context(|| format!("insert restaurant {name}"))?;
        self.get_restaurant(RestaurantId::new(self.conn.last_insert_rowid()))
    }

    fn insert_restaurant(&self, restaurant: &Restaurant) -> Result<()> {
        self.conn
            .execute(
                "
                INSERT INTO restaurants (
                  id, name, address, city, neighborhood, cuisine,
                  price_range, latitude, longitude, place_id, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    restaurant.id.get(),
                    restaurant.name,
                    restaurant.address,
                    restaurant.city,
                    restaurant.neighborhood,
                    restaurant.cuisine,
                    restaurant.price_range.map(PriceRange::as_str),
                    restaurant.latitude,
                    restaurant.longitude,
                    restaurant.place_id,
                    format_datetime(restaurant.created_at)?,
                ],
            )
            .with_context(|| format!("restore restaurant {}", restaurant.id))?;
        Ok(())
    }

    fn update_restaurant(&self, restaurant: &Restaurant) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE restaurants
                SET
                  name = ?,
                  address = ?,
                  city = ?,
                  neighborhood = ?,
                  cuisine = ?,
                  price_range = ?,
                  latitude = ?,
                  longitude = ?,
                  place_id = ?
                WHERE id = ?
                ",
                params![
                    restaurant.name,
                    restaurant.address,
                    restaurant.city,
                    restaurant.neighborhood,
                    restaurant.cuisine,
                    restaurant.price_range.map(PriceRange::as_str),
                    restaurant.latitude,
                    restaurant.longitude,
                    restaurant.place_id,
                    restaurant.id.get(),
                ],
            )
            .with_context(|| format!("update restaurant {}", restaurant.id))?;
        if rows_affected == 0 {
            bail!(
                "restaurant {} not found -- reload the list and retry",
                restaurant.id
            );
        }
        Ok(())
    }

    fn delete_restaurant(&self, id: RestaurantId) -> Result<()> {
        let visit_count = self.count_dependents("visits", id)?;
        if visit_count > 0 {
            bail!("restaurant {id} has {visit_count} visit(s) -- delete visits first");
        }
        let wish_count = self.count_dependents("want_to_visit", id)?;
        if wish_count > 0 {
            bail!("restaurant {id} has {wish_count} wishlist entries -- delete those first");
        }
        let rows_affected = self
            .conn
            .execute("DELETE FROM restaurants WHERE id = ?", params![id.get()])
            .with_context(|| format!("delete restaurant {id}"))?;
        if rows_affected == 0 {
            bail!("restaurant {id} not found -- reload the list and retry");
        }
        Ok(())
    }

    fn delete_restaurant_cascade(&self, id: RestaurantId) -> Result<()> {
        self.atomically(|store| {
            let visits = store
                .conn
                .execute("DELETE FROM visits WHERE restaurant_id = ?", params![id.get()])
                .with_context(|| format!("delete visits for restaurant {id}"))?;
            let entries = store
                .conn
                .execute(
                    "DELETE FROM want_to_visit WHERE restaurant_id = ?",
                    params![id.get()],
                )
                .with_context(|| format!("delete wishlist entries for restaurant {id}"))?;
            let rows_affected = store
                .conn
                .execute("DELETE FROM restaurants WHERE id = ?", params![id.get()])
                .with_context(|| format!("delete restaurant {id}"))?;
            if rows_affected == 0 {
                bail!("restaurant {id} not found -- reload the list and retry");
            }
            debug!(restaurant = id.get(), visits, entries, "cascade delete");
            Ok(())
        })
    }

    fn list_restaurants(&self, filter: Option<&str>) -> Result<Vec<RestaurantRow>> {
        self.query_rows(
            "
            SELECT
              r.id, r.name, r.address, r.city, r.neighborhood, r.cuisine, r.price_range,
              AVG(v.rating), COUNT(v.id), MAX(v.visited_on)
            FROM restaurants r
            LEFT JOIN visits v ON v.restaurant_id = r.id
            WHERE ?1 IS NULL
               OR instr(lower(r.name), ?1) > 0
               OR instr(lower(r.city), ?1) > 0
            GROUP BY r.id
            ORDER BY r.name COLLATE NOCASE ASC, r.id ASC
            ",
            params![needle(filter)],
            |row| {
                let price_raw: Option<String> = row.get(6)?;
                let last_raw: Option<String> = row.get(9)?;
                Ok(RestaurantRow {
                    id: RestaurantId::new(row.get(0)?),
                    name: row.get(1)?,
                    address: row.get(2)?,
                    city: row.get(3)?,
                    neighborhood: row.get(4)?,
                    cuisine: row.get(5)?,
                    price_range: parse_price(price_raw).map_err(to_sql_error)?,
                    avg_rating: row.get(7)?,
                    visit_count: row.get(8)?,
                    last_visit: parse_opt_date(last_raw).map_err(to_sql_error)?,
                })
            },
            "restaurants",
        )
    }

    fn restaurant_detail(&self, id: RestaurantId) -> Result<RestaurantDetail> {
        let restaurant = self.get_restaurant(id)?;
        let visits = self.query_rows(
            &format!("{VISIT_SELECT} WHERE restaurant_id = ? ORDER BY visited_on DESC, id DESC"),
            params![id.get()],
            visit_from_row,
            "restaurant visits",
        )?;
        Ok(RestaurantDetail { restaurant, visits })
    }

    fn get_visit(&self, id: VisitId) -> Result<Visit> {
        self.conn
            .query_row(
                &format!("{VISIT_SELECT} WHERE id = ?"),
                params![id.get()],
                visit_from_row,
            )
            .optional()
            .with_context(|| format!("load visit {id}"))?
            .ok_or_else(|| anyhow!("visit {id} not found -- reload the list and retry"))
    }

    fn create_visit(&self, draft: &VisitDraft) -> Result<Visit> {
        self.require_restaurant(draft.restaurant_id)?;
        self.conn
            .execute(
                "
                INSERT INTO visits (
                  restaurant_id, visited_on, rating, notes, would_return, created_at
                ) VALUES (?, ?, ?, ?, ?, ?)
                ",
                params![
                    draft.restaurant_id.get(),
                    format_date(draft.visited_on),
                    draft.rating,
                    draft.notes,
                    draft.would_return,
                    now_rfc3339()?,
                ],
            )
            .context("insert visit")?;
        self.get_visit(VisitId::new(self.conn.last_insert_rowid()))
    }

    fn insert_visit(&self, visit: &Visit) -> Result<()> {
        self.require_restaurant(visit.restaurant_id)?;
        self.conn
            .execute(
                "
                INSERT INTO visits (
                  id, restaurant_id, visited_on, rating, notes, would_return, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    visit.id.get(),
                    visit.restaurant_id.get(),
                    format_date(visit.visited_on),
                    visit.rating,
                    visit.notes,
                    visit.would_return,
                    format_datetime(visit.created_at)?,
                ],
            )
            .with_context(|| format!("restore visit {}", visit.id))?;
        Ok(())
    }

    fn update_visit(&self, visit: &Visit) -> Result<()> {
        self.require_restaurant(visit.restaurant_id)?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE visits
                SET restaurant_id = ?, visited_on = ?, rating = ?, notes = ?, would_return = ?
                WHERE id = ?
                ",
                params![
                    visit.restaurant_id.get(),
                    format_date(visit.visited_on),
                    visit.rating,
                    visit.notes,
                    visit.would_return,
                    visit.id.get(),
                ],
            )
            .with_context(|| format!("update visit {}", visit.id))?;
        if rows_affected == 0 {
            bail!("visit {} not found -- reload the list and retry", visit.id);
        }
        Ok(())
    }

    fn delete_visit(&self, id: VisitId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM visits WHERE id = ?", params![id.get()])
            .with_context(|| format!("delete visit {id}"))?;
        if rows_affected == 0 {
            bail!("visit {id} not found -- reload the list and retry");
        }
        Ok(())
    }

    fn list_visits(&self, filter: Option<&str>) -> Result<Vec<VisitRow>> {
        self.query_rows(
            "
            SELECT
              v.id, v.restaurant_id, v.visited_on, r.name, r.address, r.city,
              r.price_range, v.rating, v.would_return, v.notes
            FROM visits v
            JOIN restaurants r ON r.id = v.restaurant_id
            WHERE ?1 IS NULL
               OR instr(lower(r.name), ?1) > 0
               OR instr(lower(v.notes), ?1) > 0
            ORDER BY v.visited_on DESC, v.id DESC
            ",
            params![needle(filter)],
            |row| {
                let visited_raw: String = row.get(2)?;
                let price_raw: Option<String> = row.get(6)?;
                Ok(VisitRow {
                    id: VisitId::new(row.get(0)?),
                    restaurant_id: RestaurantId::new(row.get(1)?),
                    visited_on: parse_date(&visited_raw).map_err(to_sql_error)?,
                    restaurant_name: row.get(3)?,
                    address: row.get(4)?,
                    city: row.get(5)?,
                    price_range: parse_price(price_raw).map_err(to_sql_error)?,
                    rating: row.get(7)?,
                    would_return: row.get(8)?,
                    notes: row.get(9)?,
                })
            },
            "visits",
        )
    }

    fn visits_for_restaurant(&self, id: RestaurantId) -> Result<Vec<Visit>> {
        self.query_rows(
            &format!("{VISIT_SELECT} WHERE restaurant_id = ? ORDER BY id ASC"),
            params![id.get()],
            visit_from_row,
            "visits for restaurant",
        )
    }

    fn get_want_to_visit(&self, id: WantToVisitId) -> Result<WantToVisit> {
        self.conn
            .query_row(
                &format!("{WANT_TO_VISIT_SELECT} WHERE id = ?"),
                params![id.get()],
                want_to_visit_from_row,
            )
            .optional()
            .with_context(|| format!("load wishlist entry {id}"))?
            .ok_or_else(|| anyhow!("wishlist entry {id} not found -- reload the list and retry"))
    }

    fn create_want_to_visit(&self, draft: &WantToVisitDraft) -> Result<WantToVisit> {
        self.require_restaurant(draft.restaurant_id)?;
        self.conn
            .execute(
                "
                INSERT INTO want_to_visit (restaurant_id, notes, priority, created_at)
                VALUES (?, ?, ?, ?)
                ",
                params![
                    draft.restaurant_id.get(),
                    draft.notes,
                    draft.priority,
                    now_rfc3339()?,
                ],
            )
            .context("insert wishlist entry")?;
        self.get_want_to_visit(WantToVisitId::new(self.conn.last_insert_rowid()))
    }

    fn insert_want_to_visit(&self, entry: &WantToVisit) -> Result<()> {
        self.require_restaurant(entry.restaurant_id)?;
        self.conn
            .execute(
                "
                INSERT INTO want_to_visit (id, restaurant_id, notes, priority, created_at)
                VALUES (?, ?, ?, ?, ?)
                ",
                params![
                    entry.id.get(),
                    entry.restaurant_id.get(),
                    entry.notes,
                    entry.priority,
                    format_datetime(entry.created_at)?,
                ],
            )
            .with_context(|| format!("restore wishlist entry {}", entry.id))?;
        Ok(())
    }

    fn update_want_to_visit(&self, entry: &WantToVisit) -> Result<()> {
        self.require_restaurant(entry.restaurant_id)?;
        let rows_affected = self
            .conn
            .execute(
                "UPDATE want_to_visit SET restaurant_id = ?, notes = ?, priority = ? WHERE id = ?",
                params![
                    entry.restaurant_id.get(),
                    entry.notes,
                    entry.priority,
                    entry.id.get(),
                ],
            )
            .with_context(|| format!("update wishlist entry {}", entry.id))?;
        if rows_affected == 0 {
            bail!(
                "wishlist entry {} not found -- reload the list and retry",
                entry.id
            );
        }
        Ok(())
    }

    fn delete_want_to_visit(&self, id: WantToVisitId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM want_to_visit WHERE id = ?", params![id.get()])
            .with_context(|| format!("delete wishlist entry {id}"))?;
        if rows_affected == 0 {
            bail!("wishlist entry {id} not found -- reload the list and retry");
        }
        Ok(())
    }

    fn list_want_to_visit(&self, filter: Option<&str>) -> Result<Vec<WantToVisitRow>> {
        self.query_rows(
            "
            SELECT
              w.id, w.restaurant_id, r.name, r.address, r.city, r.neighborhood,
              r.cuisine, r.price_range, w.priority, w.notes
            FROM want_to_visit w
            JOIN restaurants r ON r.id = w.restaurant_id
            WHERE ?1 IS NULL
               OR instr(lower(r.name), ?1) > 0
               OR instr(lower(w.notes), ?1) > 0
            ORDER BY w.priority IS NULL, w.priority DESC, w.created_at DESC, w.id DESC
            ",
            params![needle(filter)],
            |row| {
                let price_raw: Option<String> = row.get(7)?;
                Ok(WantToVisitRow {
                    id: WantToVisitId::new(row.get(0)?),
                    restaurant_id: RestaurantId::new(row.get(1)?),
                    restaurant_name: row.get(2)?,
                    address: row.get(3)?,
                    city: row.get(4)?,
                    neighborhood: row.get(5)?,
                    cuisine: row.get(6)?,
                    price_range: parse_price(price_raw).map_err(to_sql_error)?,
                    priority: row.get(8)?,
                    notes: row.get(9)?,
                })
            },
            "wishlist",
        )
    }

    fn want_to_visit_for_restaurant(&self, id: RestaurantId) -> Result<Vec<WantToVisit>> {
        self.query_rows(
            &format!("{WANT_TO_VISIT_SELECT} WHERE restaurant_id = ? ORDER BY id ASC"),
            params![id.get()],
            want_to_visit_from_row,
            "wishlist entries for restaurant",
        )
    }

    fn convert_want_to_visit(&self, id: WantToVisitId, draft: &VisitDraft) -> Result<Visit> {
        self.atomically(|store| {
            store.get_want_to_visit(id)?;
            let visit = store.create_visit(draft)?;
            store.delete_want_to_visit(id)?;
            Ok(visit)
        })
    }

    /// Wraps `work` in a savepoint. Savepoints nest, so units may contain
    /// other units.
    fn atomically<T>(&self, work: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        self.conn
            .execute_batch("SAVEPOINT toni_unit")
            .context("begin savepoint")?;
        match work(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("RELEASE toni_unit")
                    .context("release savepoint")?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback) = self
                    .conn
                    .execute_batch("ROLLBACK TO toni_unit; RELEASE toni_unit")
                {
                    warn!(error = %rollback, "savepoint rollback failed");
                }
                Err(error)
            }
        }
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("TONI_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set TONI_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("toni.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn restaurant_from_row(row: &Row<'_>) -> rusqlite::Result<Restaurant> {
    let price_raw: Option<String> = row.get(6)?;
    let created_at_raw: String = row.get(10)?;
    Ok(Restaurant {
        id: RestaurantId::new(row.get(0)?),
        name: row.get(1)?,
        address: row.get(2)?,
        city: row.get(3)?,
        neighborhood: row.get(4)?,
        cuisine: row.get(5)?,
        price_range: parse_price(price_raw).map_err(to_sql_error)?,
        latitude: row.get(7)?,
        longitude: row.get(8)?,
        place_id: row.get(9)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
    })
}

fn visit_from_row(row: &Row<'_>) -> rusqlite::Result<Visit> {
    let visited_raw: String = row.get(2)?;
    let created_at_raw: String = row.get(6)?;
    Ok(Visit {
        id: VisitId::new(row.get(0)?),
        restaurant_id: RestaurantId::new(row.get(1)?),
        visited_on: parse_date(&visited_raw).map_err(to_sql_error)?,
        rating: row.get(3)?,
        notes: row.get(4)?,
        would_return: row.get(5)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
    })
}

fn want_to_visit_from_row(row: &Row<'_>) -> rusqlite::Result<WantToVisit> {
    let created_at_raw: String = row.get(4)?;
    Ok(WantToVisit {
        id: WantToVisitId::new(row.get(0)?),
        restaurant_id: RestaurantId::new(row.get(1)?),
        notes: row.get(2)?,
        priority: row.get(3)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
    })
}

/// Lowercased, trimmed filter text; blank filters match everything.
fn needle(filter: Option<&str>) -> Option<String> {
    filter
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        let columns = table_columns(conn, table)?;
        if columns.is_empty() {
            bail!(
                "database is missing required table `{table}`; use a toni database or point TONI_DB_PATH elsewhere"
            );
        }

        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();
        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    format_datetime(OffsetDateTime::now_utc())
}

fn format_datetime(value: OffsetDateTime) -> Result<String> {
    value.format(&Rfc3339).context("format timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).with_context(|| format!("unsupported datetime {raw:?}"))
}

fn parse_date(raw: &str) -> Result<Date> {
    Date::parse(raw, &format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("unsupported date {raw:?}"))
}

fn parse_opt_date(raw: Option<String>) -> Result<Option<Date>> {
    raw.as_deref().map(parse_date).transpose()
}

fn parse_price(raw: Option<String>) -> Result<Option<PriceRange>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => PriceRange::parse(value)
            .map(Some)
            .ok_or_else(|| anyhow!("unknown price range {value:?}")),
    }
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}

fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_owned())
}

#[cfg(test)]
mod tests {
    use super::{Store, parse_price, validate_schema};
    use anyhow::Result;
    use toni_app::PriceRange;

    #[test]
    fn price_text_round_trips_and_rejects_garbage() -> Result<()> {
        assert_eq!(parse_price(None)?, None);
        assert_eq!(parse_price(Some(" ".to_owned()))?, None);
        assert_eq!(parse_price(Some("$$$".to_owned()))?, Some(PriceRange::Three));
        parse_price(Some("cheap".to_owned())).expect_err("unknown price should fail");
        Ok(())
    }

    #[test]
    fn fresh_schema_passes_validation() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        validate_schema(store.raw_connection())?;
        Ok(())
    }
}
