// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;

use crate::ids::{RestaurantId, VisitId, WantToVisitId};
use crate::model::{
    FormKind, PriceRange, Restaurant, Suggestion, VisitDetail, WantToVisitDetail, format_date,
    format_rating,
};
use crate::repository::{
    Mutation, RestaurantDraft, RestaurantRef, VisitFields, WantToVisitFields,
};
use crate::search::SearchSession;
use crate::validation::{
    ValidationError, ValidationResult, format_would_return, parse_date, parse_optional_price,
    parse_optional_priority, parse_optional_rating, parse_required_text, parse_would_return,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    Restaurant,
    Date,
    Rating,
    WouldReturn,
    Notes,
    Name,
    Address,
    City,
    Neighborhood,
    Cuisine,
    Price,
    Priority,
}

impl FieldKey {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Date => "date",
            Self::Rating => "rating (1-10)",
            Self::WouldReturn => "would return (y/n)",
            Self::Notes => "notes",
            Self::Name => "name",
            Self::Address => "address",
            Self::City => "city",
            Self::Neighborhood => "neighborhood",
            Self::Cuisine => "cuisine",
            Self::Price => "price ($-$$$$)",
            Self::Priority => "priority (1-5)",
        }
    }

    pub const fn required(self) -> bool {
        matches!(self, Self::Restaurant | Self::Name | Self::Date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub key: FieldKey,
    pub value: String,
    pub read_only: bool,
}

impl FormField {
    fn new(key: FieldKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
            read_only: false,
        }
    }
}

/// The restaurant a form is currently bound to, if any.
#[derive(Debug, Clone, PartialEq)]
enum Binding {
    Existing { id: RestaurantId, name: String },
    Suggested(Suggestion),
}

impl Binding {
    fn name(&self) -> &str {
        match self {
            Self::Existing { name, .. } => name,
            Self::Suggested(suggestion) => &suggestion.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    kind: FormKind,
    fields: Vec<FormField>,
    focus: usize,
    editing: Option<i64>,
    converting: Option<WantToVisitId>,
    binding: Option<Binding>,
    hint: String,
    search: Option<SearchSession>,
}

impl FormState {
    fn build(kind: FormKind, fields: Vec<FormField>, searchable: bool) -> Self {
        let has_search_field = fields
            .iter()
            .any(|field| field.key == FieldKey::Restaurant && !field.read_only);
        Self {
            kind,
            fields,
            focus: 0,
            editing: None,
            converting: None,
            binding: None,
            hint: String::new(),
            search: (searchable && has_search_field).then(SearchSession::default),
        }
    }

    pub fn new_visit(today: Date, searchable: bool) -> Self {
        Self::build(FormKind::Visit, visit_fields("", today, None, None, ""), searchable)
    }

    /// A visit form already bound to an existing restaurant.
    pub fn visit_for(id: RestaurantId, name: &str, hint: String, today: Date, searchable: bool) -> Self {
        let mut form = Self::build(
            FormKind::Visit,
            visit_fields(name, today, None, None, ""),
            searchable,
        );
        form.bind(id, name, hint);
        form.focus = 1;
        form
    }

    pub fn edit_visit(detail: &VisitDetail, searchable: bool) -> Self {
        let visit = &detail.visit;
        let mut form = Self::build(
            FormKind::Visit,
            visit_fields(
                &detail.restaurant.name,
                visit.visited_on,
                visit.rating,
                visit.would_return,
                &visit.notes,
            ),
            searchable,
        );
        form.editing = Some(visit.id.get());
        form.bind_existing(&detail.restaurant);
        form
    }

    /// A visit form that, once saved, replaces the wishlist entry.
    pub fn convert(detail: &WantToVisitDetail, today: Date) -> Self {
        let mut fields = visit_fields(&detail.restaurant.name, today, None, None, &detail.entry.notes);
        fields[0].read_only = true;
        let mut form = Self::build(FormKind::Visit, fields, false);
        form.converting = Some(detail.entry.id);
        form.bind_existing(&detail.restaurant);
        form.focus = 1;
        form
    }

    pub fn new_restaurant() -> Self {
        Self::build(FormKind::Restaurant, restaurant_fields(None), false)
    }

    pub fn edit_restaurant(restaurant: &Restaurant) -> Self {
        let mut form = Self::build(FormKind::Restaurant, restaurant_fields(Some(restaurant)), false);
        form.editing = Some(restaurant.id.get());
        form
    }

    pub fn new_want_to_visit(searchable: bool) -> Self {
        Self::build(
            FormKind::WantToVisit,
            want_to_visit_fields("", None, ""),
            searchable,
        )
    }

    pub fn edit_want_to_visit(detail: &WantToVisitDetail, searchable: bool) -> Self {
        let entry = &detail.entry;
        let mut form = Self::build(
            FormKind::WantToVisit,
            want_to_visit_fields(&detail.restaurant.name, entry.priority, &entry.notes),
            searchable,
        );
        form.editing = Some(entry.id.get());
        form.bind_existing(&detail.restaurant);
        form
    }

    pub const fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub const fn focus(&self) -> usize {
        self.focus
    }

    pub const fn editing(&self) -> Option<i64> {
        self.editing
    }

    pub const fn converting(&self) -> Option<WantToVisitId> {
        self.converting
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub fn search(&self) -> Option<&SearchSession> {
        self.search.as_ref()
    }

    pub fn search_mut(&mut self) -> Option<&mut SearchSession> {
        self.search.as_mut()
    }

    pub fn title(&self) -> String {
        let verb = match (self.editing, self.converting) {
            (Some(_), _) => "edit",
            (None, Some(_)) => "log visit from",
            (None, None) => "new",
        };
        if self.converting.is_some() {
            return format!("{verb} wishlist");
        }
        format!("{verb} {}", self.kind.label())
    }

    pub fn value(&self, key: FieldKey) -> &str {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .map(|field| field.value.as_str())
            .unwrap_or_default()
    }

    pub fn focused_key(&self) -> Option<FieldKey> {
        self.fields.get(self.focus).map(|field| field.key)
    }

    pub fn focus_next(&mut self) {
        self.move_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.move_focus(-1);
    }

    fn move_focus(&mut self, delta: isize) {
        if let Some(search) = self.search.as_mut() {
            search.dismiss();
        }
        let len = self.fields.len() as isize;
        if len == 0 {
            return;
        }
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
    }

    /// Appends a character to the focused field. Returns a debounce sequence
    /// when the edit changed the restaurant search query.
    pub fn type_char(&mut self, ch: char) -> Option<u64> {
        self.edit_focused(|value| value.push(ch))
    }

    pub fn backspace(&mut self) -> Option<u64> {
        self.edit_focused(|value| {
            value.pop();
        })
    }

    fn edit_focused(&mut self, edit: impl FnOnce(&mut String)) -> Option<u64> {
        let field = self.fields.get_mut(self.focus)?;
        if field.read_only {
            return None;
        }
        edit(&mut field.value);
        if field.key != FieldKey::Restaurant {
            return None;
        }
        let value = field.value.clone();
        if let Some(binding) = &self.binding
            && !binding.name().eq_ignore_ascii_case(value.trim())
        {
            self.binding = None;
            self.hint.clear();
        }
        self.search.as_mut()?.query_changed(&value)
    }

    /// Binds the highlighted suggestion and fills the restaurant field.
    /// Matching it to a stored restaurant, or creating one, waits for save.
    pub fn accept_suggestion(&mut self) -> Option<String> {
        let chosen = self.search.as_mut()?.accept()?;
        let name = chosen.name.clone();
        if let Some(field) = self
            .fields
            .iter_mut()
            .find(|field| field.key == FieldKey::Restaurant)
        {
            field.value = name.clone();
        }
        self.hint = chosen.summary();
        self.binding = Some(Binding::Suggested(chosen));
        Some(name)
    }

    /// Keeps search sequences increasing across form sessions, so a lookup
    /// from a closed form can never match this one.
    pub fn continue_search_after(&mut self, sequence: u64) {
        if let Some(search) = self.search.as_mut() {
            search.continue_after(sequence);
        }
    }

    fn bind(&mut self, id: RestaurantId, name: &str, hint: String) {
        self.binding = Some(Binding::Existing {
            id,
            name: name.to_owned(),
        });
        self.hint = hint;
    }

    fn bind_existing(&mut self, restaurant: &Restaurant) {
        self.bind(restaurant.id, &restaurant.name, restaurant_hint(restaurant));
    }

    fn restaurant_ref(&self) -> ValidationResult<RestaurantRef> {
        let typed = parse_required_text(
            self.value(FieldKey::Restaurant),
            ValidationError::MissingRestaurant,
        )?;
        Ok(match &self.binding {
            Some(Binding::Existing { id, .. }) => RestaurantRef::Existing(*id),
            Some(Binding::Suggested(suggestion)) => RestaurantRef::Suggested(suggestion.clone()),
            None => RestaurantRef::Named(typed),
        })
    }

    /// Checks every field and builds the mutation that saving would apply.
    pub fn validate(&self) -> ValidationResult<Mutation> {
        match self.kind {
            FormKind::Visit => Ok(Mutation::SaveVisit {
                id: self.editing.map(VisitId::new),
                restaurant: self.restaurant_ref()?,
                fields: VisitFields {
                    visited_on: parse_date(self.value(FieldKey::Date))?,
                    rating: parse_optional_rating(self.value(FieldKey::Rating))?,
                    would_return: parse_would_return(self.value(FieldKey::WouldReturn))?,
                    notes: self.value(FieldKey::Notes).trim().to_owned(),
                },
                converting: self.converting,
            }),
            FormKind::Restaurant => Ok(Mutation::SaveRestaurant {
                id: self.editing.map(RestaurantId::new),
                draft: RestaurantDraft {
                    name: parse_required_text(
                        self.value(FieldKey::Name),
                        ValidationError::MissingName,
                    )?,
                    address: self.value(FieldKey::Address).trim().to_owned(),
                    city: self.value(FieldKey::City).trim().to_owned(),
                    neighborhood: self.value(FieldKey::Neighborhood).trim().to_owned(),
                    cuisine: self.value(FieldKey::Cuisine).trim().to_owned(),
                    price_range: parse_optional_price(self.value(FieldKey::Price))?,
                    ..RestaurantDraft::default()
                },
            }),
            FormKind::WantToVisit => Ok(Mutation::SaveWantToVisit {
                id: self.editing.map(WantToVisitId::new),
                restaurant: self.restaurant_ref()?,
                fields: WantToVisitFields {
                    priority: parse_optional_priority(self.value(FieldKey::Priority))?,
                    notes: self.value(FieldKey::Notes).trim().to_owned(),
                },
            }),
        }
    }
}

pub fn restaurant_hint(restaurant: &Restaurant) -> String {
    [
        restaurant.address.as_str(),
        restaurant.city.as_str(),
        restaurant.cuisine.as_str(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" · ")
}

fn visit_fields(
    restaurant: &str,
    date: Date,
    rating: Option<f64>,
    would_return: Option<bool>,
    notes: &str,
) -> Vec<FormField> {
    vec![
        FormField::new(FieldKey::Restaurant, restaurant),
        FormField::new(FieldKey::Date, format_date(date)),
        FormField::new(FieldKey::Rating, format_rating(rating)),
        FormField::new(FieldKey::WouldReturn, format_would_return(would_return)),
        FormField::new(FieldKey::Notes, notes),
    ]
}

fn restaurant_fields(restaurant: Option<&Restaurant>) -> Vec<FormField> {
    let Some(restaurant) = restaurant else {
        return [
            FieldKey::Name,
            FieldKey::Address,
            FieldKey::City,
            FieldKey::Neighborhood,
            FieldKey::Cuisine,
            FieldKey::Price,
        ]
        .into_iter()
        .map(|key| FormField::new(key, ""))
        .collect();
    };
    vec![
        FormField::new(FieldKey::Name, restaurant.name.as_str()),
        FormField::new(FieldKey::Address, restaurant.address.as_str()),
        FormField::new(FieldKey::City, restaurant.city.as_str()),
        FormField::new(FieldKey::Neighborhood, restaurant.neighborhood.as_str()),
        FormField::new(FieldKey::Cuisine, restaurant.cuisine.as_str()),
        FormField::new(
            FieldKey::Price,
            restaurant
                .price_range
                .map(PriceRange::as_str)
                .unwrap_or_default(),
        ),
    ]
}

fn want_to_visit_fields(restaurant: &str, priority: Option<u8>, notes: &str) -> Vec<FormField> {
    vec![
        FormField::new(FieldKey::Restaurant, restaurant),
        FormField::new(
            FieldKey::Priority,
            priority.map(|value| value.to_string()).unwrap_or_default(),
        ),
        FormField::new(FieldKey::Notes, notes),
    ]
}
