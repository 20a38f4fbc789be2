//! Subnet blocks
//!
//! One [`SubnetBlock`] per row of a blocks file. The block is the value
//! stored in the index for its network prefix.

use crate::csv_source::Row;
use crate::dual_stack::AddressFamily;
use crate::error::{GeoError, Result};
use crate::interner::{StringPool, Symbol};
use crate::schema::{blocks_col, Resolution};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A network prefix and the geolocation attributes attached to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubnetBlock {
    /// Network in CIDR notation, as it appeared in the file
    pub network: Symbol,
    /// First address of the network
    pub start: IpAddr,
    /// Prefix length of the network
    pub prefix_len: u8,
    /// Location of the block itself
    pub location_id: Option<Symbol>,
    /// Location of the country the network is registered in
    pub registered_location_id: Option<Symbol>,
    /// Location of the country represented by users of the network (e.g. military bases)
    pub represented_location_id: Option<Symbol>,
    /// Network is an anonymous proxy
    pub is_anonymous_proxy: bool,
    /// Network is served by a satellite provider
    pub is_satellite_provider: bool,
    /// Postal code (City resolution only)
    pub postal_code: Option<Symbol>,
    /// Approximate latitude (City resolution only)
    pub latitude: Option<f64>,
    /// Approximate longitude (City resolution only)
    pub longitude: Option<f64>,
    /// Accuracy radius in kilometers (City resolution only)
    pub accuracy_radius: Option<u16>,
}

impl SubnetBlock {
    /// Parse a blocks row
    ///
    /// The network must belong to `family`; the file a row comes from
    /// decides which family it is allowed to hold.
    pub fn from_row(
        row: &Row<'_>,
        resolution: Resolution,
        family: AddressFamily,
        pool: &mut StringPool,
    ) -> Result<Self> {
        let line = row.line();
        let network_text = row.get(blocks_col::NETWORK);
        let (start, prefix_len) =
            parse_network(network_text).map_err(|m| GeoError::parse(line, m))?;

        if AddressFamily::of(&start) != family {
            return Err(GeoError::parse(
                line,
                format!("network {} does not belong to this file's address family", network_text),
            ));
        }

        let mut block = Self {
            network: pool.intern(network_text),
            start,
            prefix_len,
            location_id: pool.intern_opt(row.get(blocks_col::GEONAME_ID)),
            registered_location_id: pool
                .intern_opt(row.get(blocks_col::REGISTERED_COUNTRY_GEONAME_ID)),
            represented_location_id: pool
                .intern_opt(row.get(blocks_col::REPRESENTED_COUNTRY_GEONAME_ID)),
            is_anonymous_proxy: parse_flag(row.get(blocks_col::IS_ANONYMOUS_PROXY))
                .map_err(|m| GeoError::parse(line, m))?,
            is_satellite_provider: parse_flag(row.get(blocks_col::IS_SATELLITE_PROVIDER))
                .map_err(|m| GeoError::parse(line, m))?,
            postal_code: None,
            latitude: None,
            longitude: None,
            accuracy_radius: None,
        };

        if resolution == Resolution::City {
            block.postal_code = pool.intern_opt(row.get(blocks_col::POSTAL_CODE));
            block.latitude = parse_opt(row.get(blocks_col::LATITUDE), "latitude")
                .map_err(|m| GeoError::parse(line, m))?;
            block.longitude = parse_opt(row.get(blocks_col::LONGITUDE), "longitude")
                .map_err(|m| GeoError::parse(line, m))?;
            block.accuracy_radius =
                parse_opt(row.get(blocks_col::ACCURACY_RADIUS), "accuracy_radius")
                    .map_err(|m| GeoError::parse(line, m))?;
        }

        Ok(block)
    }

    /// Location id used to resolve this block, falling back to the registered country
    pub fn location_key(&self) -> Option<&Symbol> {
        self.location_id
            .as_ref()
            .or(self.registered_location_id.as_ref())
    }

    /// Last address covered by the network
    pub fn end(&self) -> IpAddr {
        match self.start {
            IpAddr::V4(v4) => {
                let host_bits = 32 - self.prefix_len as u32;
                let mask = if host_bits == 0 {
                    0
                } else {
                    u32::MAX >> (32 - host_bits)
                };
                IpAddr::V4(Ipv4Addr::from(u32::from(v4) | mask))
            }
            IpAddr::V6(v6) => {
                let host_bits = 128 - self.prefix_len as u32;
                let mask = if host_bits == 0 {
                    0
                } else {
                    u128::MAX >> (128 - host_bits)
                };
                IpAddr::V6(Ipv6Addr::from(u128::from(v6) | mask))
            }
        }
    }
}

/// Split `a.b.c.d/len` or `x::/len` into address and prefix length
fn parse_network(text: &str) -> std::result::Result<(IpAddr, u8), String> {
    let (addr_part, prefix_part) = match text.split_once('/') {
        Some(parts) => parts,
        None => return Err(format!("network '{}' is missing a prefix length", text)),
    };

    let addr: IpAddr = addr_part
        .parse()
        .map_err(|_| format!("invalid network address '{}'", addr_part))?;
    let prefix_len: u8 = prefix_part
        .parse()
        .map_err(|_| format!("invalid prefix length '{}'", prefix_part))?;

    let max = match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    if prefix_len > max {
        return Err(format!(
            "prefix length {} exceeds {} in '{}'",
            prefix_len, max, text
        ));
    }

    Ok((addr, prefix_len))
}

pub(crate) fn parse_flag(text: &str) -> std::result::Result<bool, String> {
    match text {
        "" | "0" => Ok(false),
        "1" => Ok(true),
        t if t.eq_ignore_ascii_case("false") => Ok(false),
        t if t.eq_ignore_ascii_case("true") => Ok(true),
        other => Err(format!("invalid flag '{}'", other)),
    }
}

pub(crate) fn parse_opt<T: std::str::FromStr>(
    text: &str,
    field: &str,
) -> std::result::Result<Option<T>, String> {
    if text.is_empty() {
        return Ok(None);
    }
    text.parse()
        .map(Some)
        .map_err(|_| format!("invalid {} '{}'", field, text))
}
