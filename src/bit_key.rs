//! Bit keys for IP prefixes
//!
//! A [`BitKey`] turns an address plus prefix length into the ordered
//! sequence of bits, most significant first, that the tries walk. IPv4
//! keys can be re-based into the 128-bit space under `::ffff:0:0/96`
//! so IPv4 and IPv6 data share one index.

use crate::error::{GeoError, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Bit pattern of the IPv4-mapped IPv6 prefix `::ffff:0:0/96`
const IPV4_MAPPED_BITS: u128 = 0xffff_u128 << 32;

/// Number of bits the IPv4-mapped prefix adds in front of an IPv4 key
pub const IPV4_MAPPED_PREFIX_LEN: u8 = 96;

/// An address and prefix length, viewed as a finite bit sequence
///
/// Bits are stored left-aligned in a `u128` so that bit `i` of the
/// sequence is always bit `127 - i` of the integer, whatever the family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitKey {
    bits: u128,
    len: u8,
    width: u8,
}

impl BitKey {
    /// Key for an IPv4 prefix
    ///
    /// With `embed` set the key lives in the 128-bit space and carries
    /// the 96-bit mapped prefix in front of the address bits.
    pub fn from_v4(addr: Ipv4Addr, prefix_len: Option<u8>, embed: bool) -> Result<Self> {
        let prefix_len = prefix_len.unwrap_or(32);
        if prefix_len > 32 {
            return Err(GeoError::InvalidPrefix(format!(
                "IPv4 prefix length {} exceeds 32",
                prefix_len
            )));
        }

        let addr_bits = u32::from(addr) as u128;
        if embed {
            Ok(Self {
                bits: IPV4_MAPPED_BITS | addr_bits,
                len: IPV4_MAPPED_PREFIX_LEN + prefix_len,
                width: 128,
            })
        } else {
            Ok(Self {
                bits: addr_bits << 96,
                len: prefix_len,
                width: 32,
            })
        }
    }

    /// Key for an IPv6 prefix
    pub fn from_v6(addr: Ipv6Addr, prefix_len: Option<u8>) -> Result<Self> {
        let prefix_len = prefix_len.unwrap_or(128);
        if prefix_len > 128 {
            return Err(GeoError::InvalidPrefix(format!(
                "IPv6 prefix length {} exceeds 128",
                prefix_len
            )));
        }
        Ok(Self {
            bits: u128::from(addr),
            len: prefix_len,
            width: 128,
        })
    }

    /// Key for any address; `embed` only affects IPv4 addresses
    pub fn new(addr: IpAddr, prefix_len: Option<u8>, embed: bool) -> Result<Self> {
        match addr {
            IpAddr::V4(v4) => Self::from_v4(v4, prefix_len, embed),
            IpAddr::V6(v6) => Self::from_v6(v6, prefix_len),
        }
    }

    /// Full-width key for a single address, never embedded
    pub fn host(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => Self {
                bits: (u32::from(v4) as u128) << 96,
                len: 32,
                width: 32,
            },
            IpAddr::V6(v6) => Self {
                bits: u128::from(v6),
                len: 128,
                width: 128,
            },
        }
    }

    /// The fixed `::ffff:0:0/96` prefix under which IPv4 space is embedded
    pub fn ipv4_mapped_prefix() -> Self {
        Self {
            bits: IPV4_MAPPED_BITS,
            len: IPV4_MAPPED_PREFIX_LEN,
            width: 128,
        }
    }

    /// Number of bits the key yields
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// True for the zero-length key (matches everything)
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit width of the address space the key lives in (32 or 128)
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Iterate the key's bits, most significant first
    pub fn bits(&self) -> Bits {
        Bits {
            bits: self.bits,
            pos: 0,
            len: self.len,
        }
    }
}

impl IntoIterator for BitKey {
    type Item = bool;
    type IntoIter = Bits;

    fn into_iter(self) -> Bits {
        self.bits()
    }
}

/// Iterator over the bits of a [`BitKey`]
#[derive(Debug, Clone)]
pub struct Bits {
    bits: u128,
    pos: u8,
    len: u8,
}

impl Iterator for Bits {
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<bool> {
        if self.pos >= self.len {
            return None;
        }
        let bit = (self.bits >> (127 - self.pos as u32)) & 1 == 1;
        self.pos += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.pos) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Bits {}
