//! Data resolution and the CSV layouts that go with it
//!
//! The City and Country editions ship the same three files with
//! different column sets:
//!
//! | File            | City columns | Country columns |
//! |-----------------|--------------|-----------------|
//! | Blocks-IPv6/4   | 10           | 6               |
//! | Locations-{loc} | 14           | 7               |

use crate::dual_stack::AddressFamily;
use crate::error::GeoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Granularity of the loaded data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// Country-level blocks and locations
    Country,
    /// City-level blocks and locations
    #[default]
    City,
}

impl Resolution {
    /// Edition name used in file names
    pub fn edition(&self) -> &'static str {
        match self {
            Resolution::Country => "Country",
            Resolution::City => "City",
        }
    }

    /// Fields per blocks row
    pub fn blocks_columns(&self) -> usize {
        match self {
            Resolution::Country => 6,
            Resolution::City => 10,
        }
    }

    /// Fields per locations row
    pub fn locations_columns(&self) -> usize {
        match self {
            Resolution::Country => 7,
            Resolution::City => 14,
        }
    }

    /// Blocks file name for an address family
    pub fn blocks_file(&self, family: AddressFamily) -> String {
        let suffix = match family {
            AddressFamily::V4 => "IPv4",
            AddressFamily::V6 => "IPv6",
        };
        format!("GeoLite2-{}-Blocks-{}.csv", self.edition(), suffix)
    }

    /// Locations file name for a locale
    pub fn locations_file(&self, locale: &str) -> String {
        format!("GeoLite2-{}-Locations-{}.csv", self.edition(), locale)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Country => f.write_str("country"),
            Resolution::City => f.write_str("city"),
        }
    }
}

impl FromStr for Resolution {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, GeoError> {
        match s.to_ascii_lowercase().as_str() {
            "country" => Ok(Resolution::Country),
            "city" => Ok(Resolution::City),
            other => Err(GeoError::Config(format!(
                "Unsupported resolution '{}': expected 'country' or 'city'",
                other
            ))),
        }
    }
}

/// Column positions in a blocks row
pub(crate) mod blocks_col {
    pub const NETWORK: usize = 0;
    pub const GEONAME_ID: usize = 1;
    pub const REGISTERED_COUNTRY_GEONAME_ID: usize = 2;
    pub const REPRESENTED_COUNTRY_GEONAME_ID: usize = 3;
    pub const IS_ANONYMOUS_PROXY: usize = 4;
    pub const IS_SATELLITE_PROVIDER: usize = 5;
    // City only
    pub const POSTAL_CODE: usize = 6;
    pub const LATITUDE: usize = 7;
    pub const LONGITUDE: usize = 8;
    pub const ACCURACY_RADIUS: usize = 9;
}

/// Column positions in a locations row
pub(crate) mod locations_col {
    pub const GEONAME_ID: usize = 0;
    pub const LOCALE_CODE: usize = 1;
    pub const CONTINENT_CODE: usize = 2;
    pub const CONTINENT_NAME: usize = 3;
    pub const COUNTRY_ISO_CODE: usize = 4;
    pub const COUNTRY_NAME: usize = 5;
    // Country edition: is_in_european_union follows directly
    pub const COUNTRY_IS_IN_EUROPEAN_UNION: usize = 6;
    // City only
    pub const SUBDIVISION_1_ISO_CODE: usize = 6;
    pub const SUBDIVISION_1_NAME: usize = 7;
    pub const SUBDIVISION_2_ISO_CODE: usize = 8;
    pub const SUBDIVISION_2_NAME: usize = 9;
    pub const CITY_NAME: usize = 10;
    pub const METRO_CODE: usize = 11;
    pub const TIME_ZONE: usize = 12;
    pub const CITY_IS_IN_EUROPEAN_UNION: usize = 13;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        assert_eq!("city".parse::<Resolution>().unwrap(), Resolution::City);
        assert_eq!("Country".parse::<Resolution>().unwrap(), Resolution::Country);
        assert!(matches!(
            "street".parse::<Resolution>(),
            Err(GeoError::Config(_))
        ));
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            Resolution::City.blocks_file(AddressFamily::V6),
            "GeoLite2-City-Blocks-IPv6.csv"
        );
        assert_eq!(
            Resolution::Country.blocks_file(AddressFamily::V4),
            "GeoLite2-Country-Blocks-IPv4.csv"
        );
        assert_eq!(
            Resolution::Country.locations_file("de"),
            "GeoLite2-Country-Locations-de.csv"
        );
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Resolution::City).unwrap(), "\"city\"");
        let r: Resolution = serde_json::from_str("\"country\"").unwrap();
        assert_eq!(r, Resolution::Country);
        assert!(serde_json::from_str::<Resolution>("\"planet\"").is_err());
    }
}
