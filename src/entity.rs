//! Lookup result

use crate::blocks::SubnetBlock;
use crate::location::Location;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;

/// Geolocation of one queried address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoEntity {
    /// The address that was looked up
    pub address: IpAddr,
    /// Most specific block containing the address, `None` if nothing matched
    pub block: Option<Arc<SubnetBlock>>,
    /// Location the block refers to, `None` if the block names no known location
    pub location: Option<Arc<Location>>,
}

impl GeoEntity {
    /// True if some block contains the address
    pub fn is_match(&self) -> bool {
        self.block.is_some()
    }

    /// ISO country code of the resolved location
    pub fn country_iso_code(&self) -> Option<&str> {
        self.location
            .as_ref()
            .and_then(|l| l.country_iso_code.as_deref())
    }

    /// City name of the resolved location
    pub fn city_name(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.city_name.as_deref())
    }

    /// Network of the matched block in CIDR notation
    pub fn network(&self) -> Option<&str> {
        self.block.as_ref().map(|b| b.network.as_str())
    }
}
