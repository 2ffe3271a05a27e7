// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;
use time::macros::format_description;

use crate::model::PriceRange;

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";
pub const RATING_RANGE: (f64, f64) = (1.0, 10.0);
pub const PRIORITY_RANGE: (u8, u8) = (1, 5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingName,
    MissingRestaurant,
    InvalidDate,
    InvalidRating,
    InvalidPriority,
    InvalidReturn,
    InvalidPrice,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => f.write_str("name is required"),
            Self::MissingRestaurant => f.write_str("restaurant is required"),
            Self::InvalidDate => write!(f, "date must be {DATE_LAYOUT}"),
            Self::InvalidRating => f.write_str("rating must be a number from 1 to 10"),
            Self::InvalidPriority => f.write_str("priority must be a whole number from 1 to 5"),
            Self::InvalidReturn => f.write_str("would return must be y or n"),
            Self::InvalidPrice => f.write_str("price must be $, $$, $$$ or $$$$"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

pub fn parse_required_text(input: &str, missing: ValidationError) -> ValidationResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(missing);
    }
    Ok(trimmed.to_owned())
}

pub fn parse_date(input: &str) -> ValidationResult<Date> {
    Date::parse(input.trim(), &format_description!("[year]-[month]-[day]"))
        .map_err(|_| ValidationError::InvalidDate)
}

pub fn parse_optional_rating(input: &str) -> ValidationResult<Option<f64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidRating)?;
    if !value.is_finite() || value < RATING_RANGE.0 || value > RATING_RANGE.1 {
        return Err(ValidationError::InvalidRating);
    }
    Ok(Some(value))
}

pub fn parse_optional_priority(input: &str) -> ValidationResult<Option<u8>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = trimmed
        .parse::<u8>()
        .map_err(|_| ValidationError::InvalidPriority)?;
    if !(PRIORITY_RANGE.0..=PRIORITY_RANGE.1).contains(&value) {
        return Err(ValidationError::InvalidPriority);
    }
    Ok(Some(value))
}

pub fn parse_would_return(input: &str) -> ValidationResult<Option<bool>> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "y" | "yes" | "1" => Ok(Some(true)),
        "n" | "no" | "0" => Ok(Some(false)),
        _ => Err(ValidationError::InvalidReturn),
    }
}

pub fn parse_optional_price(input: &str) -> ValidationResult<Option<PriceRange>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    PriceRange::parse(trimmed)
        .map(Some)
        .ok_or(ValidationError::InvalidPrice)
}

pub fn format_would_return(value: Option<bool>) -> String {
    match value {
        Some(true) => "y".to_owned(),
        Some(false) => "n".to_owned(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ValidationError, parse_date, parse_optional_price, parse_optional_priority,
        parse_optional_rating, parse_required_text, parse_would_return,
    };
    use crate::model::PriceRange;
    use time::{Date, Month};

    #[test]
    fn rating_accepts_decimals_inside_range() {
        assert_eq!(parse_optional_rating(""), Ok(None));
        assert_eq!(parse_optional_rating(" 8.5 "), Ok(Some(8.5)));
        assert_eq!(parse_optional_rating("10"), Ok(Some(10.0)));
        for input in ["0", "10.1", "-3", "great", "NaN"] {
            assert_eq!(
                parse_optional_rating(input),
                Err(ValidationError::InvalidRating),
                "input {input}"
            );
        }
    }

    #[test]
    fn priority_is_one_through_five() {
        assert_eq!(parse_optional_priority("3"), Ok(Some(3)));
        assert_eq!(parse_optional_priority(""), Ok(None));
        for input in ["0", "6", "2.5", "-1"] {
            assert!(parse_optional_priority(input).is_err(), "input {input}");
        }
    }

    #[test]
    fn would_return_words() {
        assert_eq!(parse_would_return("Yes"), Ok(Some(true)));
        assert_eq!(parse_would_return("0"), Ok(Some(false)));
        assert_eq!(parse_would_return(" "), Ok(None));
        assert_eq!(parse_would_return("maybe"), Err(ValidationError::InvalidReturn));
    }

    #[test]
    fn dates_and_text() -> anyhow::Result<()> {
        assert_eq!(
            parse_date("2026-02-14")?,
            Date::from_calendar_date(2026, Month::February, 14)?
        );
        assert_eq!(parse_date("02/14/2026"), Err(ValidationError::InvalidDate));
        assert_eq!(
            parse_required_text("  ", ValidationError::MissingName),
            Err(ValidationError::MissingName)
        );
        assert_eq!(parse_optional_price("$$$"), Ok(Some(PriceRange::Three)));
        assert_eq!(parse_optional_price("$5"), Err(ValidationError::InvalidPrice));
        Ok(())
    }
}
