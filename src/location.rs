//! Location reference data
//!
//! Locations are keyed by their geoname id. Blocks refer to them by id,
//! and the facade joins the two at lookup time through a [`LocationTable`].

use crate::blocks::{parse_flag, parse_opt};
use crate::csv_source::Row;
use crate::error::{GeoError, Result};
use crate::interner::{StringPool, Symbol};
use crate::schema::{locations_col as col, Resolution};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;

/// A place a subnet block can be located in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    /// Geoname id
    pub id: Symbol,
    /// Locale of the names in this record
    pub locale_code: Symbol,
    /// Two-letter continent code
    pub continent_code: Option<Symbol>,
    /// Continent name
    pub continent_name: Option<Symbol>,
    /// ISO 3166-1 country code
    pub country_iso_code: Option<Symbol>,
    /// Country name
    pub country_name: Option<Symbol>,
    /// First-level subdivision ISO code (City resolution only)
    pub subdivision_1_iso_code: Option<Symbol>,
    /// First-level subdivision name (City resolution only)
    pub subdivision_1_name: Option<Symbol>,
    /// Second-level subdivision ISO code (City resolution only)
    pub subdivision_2_iso_code: Option<Symbol>,
    /// Second-level subdivision name (City resolution only)
    pub subdivision_2_name: Option<Symbol>,
    /// City name (City resolution only)
    pub city_name: Option<Symbol>,
    /// US metro code (City resolution only)
    pub metro_code: Option<u16>,
    /// IANA time zone (City resolution only)
    pub time_zone: Option<Symbol>,
    /// Country is member of the European Union
    pub is_in_european_union: bool,
}

impl Location {
    /// Parse a locations row
    pub fn from_row(row: &Row<'_>, resolution: Resolution, pool: &mut StringPool) -> Result<Self> {
        let line = row.line();
        let id = pool
            .intern_opt(row.get(col::GEONAME_ID))
            .ok_or_else(|| GeoError::parse(line, "location row has an empty geoname_id"))?;

        let mut location = Self {
            id,
            locale_code: pool.intern(row.get(col::LOCALE_CODE)),
            continent_code: pool.intern_opt(row.get(col::CONTINENT_CODE)),
            continent_name: pool.intern_opt(row.get(col::CONTINENT_NAME)),
            country_iso_code: pool.intern_opt(row.get(col::COUNTRY_ISO_CODE)),
            country_name: pool.intern_opt(row.get(col::COUNTRY_NAME)),
            subdivision_1_iso_code: None,
            subdivision_1_name: None,
            subdivision_2_iso_code: None,
            subdivision_2_name: None,
            city_name: None,
            metro_code: None,
            time_zone: None,
            is_in_european_union: false,
        };

        let eu_col = match resolution {
            Resolution::Country => col::COUNTRY_IS_IN_EUROPEAN_UNION,
            Resolution::City => {
                location.subdivision_1_iso_code =
                    pool.intern_opt(row.get(col::SUBDIVISION_1_ISO_CODE));
                location.subdivision_1_name = pool.intern_opt(row.get(col::SUBDIVISION_1_NAME));
                location.subdivision_2_iso_code =
                    pool.intern_opt(row.get(col::SUBDIVISION_2_ISO_CODE));
                location.subdivision_2_name = pool.intern_opt(row.get(col::SUBDIVISION_2_NAME));
                location.city_name = pool.intern_opt(row.get(col::CITY_NAME));
                location.metro_code = parse_opt(row.get(col::METRO_CODE), "metro_code")
                    .map_err(|m| GeoError::parse(line, m))?;
                location.time_zone = pool.intern_opt(row.get(col::TIME_ZONE));
                col::CITY_IS_IN_EUROPEAN_UNION
            }
        };
        location.is_in_european_union =
            parse_flag(row.get(eu_col)).map_err(|m| GeoError::parse(line, m))?;

        Ok(location)
    }
}

/// Locations keyed by geoname id
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    by_id: FxHashMap<Symbol, Arc<Location>>,
}

impl LocationTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a location, replacing any earlier one with the same id
    pub fn insert(&mut self, location: Location) {
        self.by_id.insert(location.id.clone(), Arc::new(location));
    }

    /// Location with geoname id `id`
    pub fn get(&self, id: &str) -> Option<&Arc<Location>> {
        self.by_id.get(id)
    }

    /// Number of locations
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True if the table is empty
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
