//! Shared fixtures: GeoLite2-style City data written into a temp directory
#![allow(dead_code)]

use geoprefix::{AddressFamily, GeoConfig, Resolution};
use std::fs;
use tempfile::TempDir;

pub const CITY_BLOCKS_HEADER: &str = "network,geoname_id,registered_country_geoname_id,represented_country_geoname_id,is_anonymous_proxy,is_satellite_provider,postal_code,latitude,longitude,accuracy_radius\n";
pub const CITY_LOCATIONS_HEADER: &str = "geoname_id,locale_code,continent_code,continent_name,country_iso_code,country_name,subdivision_1_iso_code,subdivision_1_name,subdivision_2_iso_code,subdivision_2_name,city_name,metro_code,time_zone,is_in_european_union\n";

pub const CITY_V6_BLOCKS: &str = "\
2001:db8::/32,2643743,2635167,,0,0,,51.5142,-0.0931,200
2001:db8:1::/48,5375480,6252001,,0,0,94043,37.4192,-122.0574,10
";

pub const CITY_V4_BLOCKS: &str = "\
10.0.0.0/8,2643743,2635167,,0,0,EC1A,51.5142,-0.0931,100
10.1.0.0/16,2950159,2921044,,0,0,10115,52.5244,13.4105,20
10.1.2.0/24,,2921044,,1,0,,,,
81.2.69.0/24,2643743,2635167,,0,0,,51.5142,-0.0931,5
";

pub const CITY_LOCATIONS: &str = "\
2643743,en,EU,Europe,GB,\"United Kingdom\",ENG,England,,,London,,Europe/London,0
2950159,en,EU,Europe,DE,Germany,BE,\"Land Berlin\",,,Berlin,,Europe/Berlin,1
5375480,en,NA,\"North America\",US,\"United States\",CA,California,,,\"Mountain View\",807,America/Los_Angeles,0
2635167,en,EU,Europe,GB,\"United Kingdom\",,,,,,,Europe/London,0
2921044,en,EU,Europe,DE,Germany,,,,,,,Europe/Berlin,1
";

/// A temp data directory that lives as long as the value
pub struct DataDir {
    pub dir: TempDir,
    pub resolution: Resolution,
}

impl DataDir {
    pub fn city(v6: &str, v4: &str, locations: &str) -> Self {
        let data = DataDir {
            dir: TempDir::new().unwrap(),
            resolution: Resolution::City,
        };
        data.write_blocks(AddressFamily::V6, v6);
        data.write_blocks(AddressFamily::V4, v4);
        data.write_locations(locations);
        data
    }

    /// The standard City dataset
    pub fn standard() -> Self {
        Self::city(CITY_V6_BLOCKS, CITY_V4_BLOCKS, CITY_LOCATIONS)
    }

    pub fn write_blocks(&self, family: AddressFamily, rows: &str) {
        fs::write(
            self.dir.path().join(self.resolution.blocks_file(family)),
            format!("{}{}", CITY_BLOCKS_HEADER, rows),
        )
        .unwrap();
    }

    pub fn write_locations(&self, rows: &str) {
        fs::write(
            self.dir.path().join(self.resolution.locations_file("en")),
            format!("{}{}", CITY_LOCATIONS_HEADER, rows),
        )
        .unwrap();
    }

    pub fn config(&self) -> GeoConfig {
        GeoConfig::new(self.dir.path(), self.resolution)
    }
}
