// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Restaurant suggestions from a Yelp-compatible business search API.

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use toni_app::{PriceRange, Suggestion};
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.yelp.com/v3";
pub const DEFAULT_LOCATION: &str = "New York, NY";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const RESULT_LIMIT: &str = "8";

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    api_key: String,
    location: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, api_key: &str, location: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("places.base_url must not be empty");
        }
        Url::parse(&base_url)
            .with_context(|| format!("places.base_url {base_url:?} is not a valid URL"))?;
        if api_key.trim().is_empty() {
            bail!("places.api_key must not be empty -- set TONI_PLACES_API_KEY or disable places");
        }
        let location = match location.trim() {
            "" => DEFAULT_LOCATION.to_owned(),
            value => value.to_owned(),
        };

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            api_key: api_key.trim().to_owned(),
            location,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ranked restaurant matches for `query`. Blank queries return nothing
    /// without touching the network.
    pub fn lookup(&self, query: &str) -> Result<Vec<Suggestion>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut url = Url::parse(&format!("{}/businesses/search", self.base_url))
            .context("build search URL")?;
        url.query_pairs_mut()
            .append_pair("term", query)
            .append_pair("categories", "restaurants,food")
            .append_pair("limit", RESULT_LIMIT)
            .append_pair("sort_by", "best_match")
            .append_pair("location", &self.location);

        debug!(query, "business search");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: SearchResponse = response.json().context("decode business search")?;
        Ok(parsed.businesses.into_iter().map(Business::into_suggestion).collect())
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check your network or places.base_url ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
    {
        let message = if error.description.is_empty() {
            error.code
        } else {
            error.description
        };
        if !message.is_empty() {
            return anyhow!("server error ({}): {}", status.as_u16(), message);
        }
    }

    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    businesses: Vec<Business>,
}

#[derive(Debug, Deserialize)]
struct Business {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    coordinates: Option<Coordinates>,
    #[serde(default)]
    location: Option<Location>,
}

impl Business {
    fn into_suggestion(self) -> Suggestion {
        let location = self.location.unwrap_or_default();
        let coordinates = self.coordinates.unwrap_or_default();
        Suggestion {
            name: self.name,
            address: location.address1.unwrap_or_default(),
            city: location.city.unwrap_or_default(),
            // the search API has no neighborhood; state is the closest field
            neighborhood: location.state.unwrap_or_default(),
            cuisine: self
                .categories
                .into_iter()
                .next()
                .map(|category| category.title)
                .unwrap_or_default(),
            price_range: self.price.as_deref().and_then(PriceRange::parse),
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            place_id: self.id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct Coordinates {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Location {
    address1: Option<String>,
    city: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}
