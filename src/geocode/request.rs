//! Reverse geocode request validation
//!
//! Turns the raw `lon`, `lat` and `fields` query parameters into a
//! [`ReverseRequest`], or the first [`ValidationError`] encountered.

use super::columns::ColumnWhitelist;
use crate::error::ValidationError;

/// Output columns of a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Every column except the geometry (the default)
    AllExceptGeometry,
    /// Every column including the geometry (`fields=*`)
    All,
    /// Whitelisted columns in caller order, duplicates kept
    Columns(Vec<String>),
}

/// Raw, undecoded-by-type query parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseParams<'a> {
    pub lon: Option<&'a str>,
    pub lat: Option<&'a str>,
    pub fields: Option<&'a str>,
}

/// A validated point lookup
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseRequest {
    pub lon: f64,
    pub lat: f64,
    pub projection: Projection,
}

impl ReverseRequest {
    /// Validate raw parameters against the coordinate ranges and the column whitelist.
    ///
    /// Checks run in a fixed order: presence of `lon` then `lat`, number
    /// parsing of both, range of both, then field names.
    pub fn parse(
        params: &ReverseParams<'_>,
        columns: &ColumnWhitelist,
    ) -> Result<Self, ValidationError> {
        let lon = require(params.lon, "lon")?;
        let lat = require(params.lat, "lat")?;

        let lon = parse_number(lon, "lon")?;
        let lat = parse_number(lat, "lat")?;

        check_range(lon, "lon", 180)?;
        check_range(lat, "lat", 90)?;

        let projection = match params.fields {
            Some(fields) => parse_fields(fields, columns)?,
            None => Projection::AllExceptGeometry,
        };

        Ok(Self {
            lon,
            lat,
            projection,
        })
    }
}

fn require<'a>(value: Option<&'a str>, param: &'static str) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingParameter { param }),
    }
}

fn parse_number(value: &str, param: &'static str) -> Result<f64, ValidationError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(ValidationError::InvalidParameter { param })
}

fn check_range(value: f64, param: &'static str, limit: i16) -> Result<(), ValidationError> {
    let bound = f64::from(limit);
    if (-bound..=bound).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCoordinate {
            param,
            min: -limit,
            max: limit,
        })
    }
}

/// Resolve the `fields` parameter into a projection.
///
/// Blank input, or input made only of separators, selects the default.
pub fn parse_fields(
    fields: &str,
    columns: &ColumnWhitelist,
) -> Result<Projection, ValidationError> {
    let tokens: Vec<&str> = fields
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();

    match tokens.as_slice() {
        [] => Ok(Projection::AllExceptGeometry),
        ["*"] => Ok(Projection::All),
        _ => {
            if let Some(bad) = tokens.iter().find(|f| !columns.contains(f)) {
                return Err(ValidationError::InvalidField {
                    field: (*bad).to_string(),
                });
            }
            Ok(Projection::Columns(
                tokens.into_iter().map(ToString::to_string).collect(),
            ))
        }
    }
}
