//! One index for both address families
//!
//! IPv4 prefixes are inserted under `::ffff:0:0/96`, so the trie holds a
//! single 128-bit address space. After compaction the node that ends the
//! 96-bit mapped prefix is located once; IPv4 lookups then start there and
//! walk only the 32 address bits.

use crate::bit_key::BitKey;
use crate::compact_index::CompactIndex;
use crate::error::Result;
use crate::ip_trie::IpTrie;
use std::net::IpAddr;

/// Address family a query is tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// 32-bit addresses, looked up below the mapped prefix
    V4,
    /// 128-bit addresses, looked up from the root
    V6,
}

impl AddressFamily {
    /// Family of an address
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }
}

/// Compacted index holding IPv4 and IPv6 prefixes
#[derive(Debug, Clone)]
pub struct DualStackIndex<V> {
    index: CompactIndex<V>,
    /// Offset of the node reached by `::ffff:0:0/96` (0 if the path does not exist)
    v4_offset: u32,
    /// Whether the mapped prefix path exists in the index
    v4_resolved: bool,
    /// Deepest value slot on the mapped prefix path, boundary node included
    v4_inherited: Option<usize>,
}

impl<V> DualStackIndex<V> {
    /// Key under which a prefix of either family is inserted
    pub fn insert_key(addr: IpAddr, prefix_len: u8) -> Result<BitKey> {
        BitKey::new(addr, Some(prefix_len), true)
    }

    /// Insert a prefix of either family into a build-time trie
    pub fn insert(trie: &mut IpTrie<V>, addr: IpAddr, prefix_len: u8, value: V) -> Result<()> {
        let key = Self::insert_key(addr, prefix_len)?;
        trie.insert(key, value);
        Ok(())
    }

    /// Compact a trie filled through [`DualStackIndex::insert`]
    pub fn build(trie: IpTrie<V>) -> Self {
        Self::from_index(trie.build_index())
    }

    /// Wrap a compacted index and resolve the IPv4 boundary
    pub fn from_index(index: CompactIndex<V>) -> Self {
        let prefix = BitKey::ipv4_mapped_prefix();
        let mut v4_offset = 0u32;
        let v4_resolved = index.find_offset(prefix, &mut v4_offset);
        let v4_inherited = index.find_value_index(prefix, 0);

        Self {
            index,
            v4_offset,
            v4_resolved,
            v4_inherited,
        }
    }

    /// Offset at which IPv4 lookups start
    pub fn v4_boundary_offset(&self) -> u32 {
        self.v4_offset
    }

    /// The underlying compacted index
    pub fn index(&self) -> &CompactIndex<V> {
        &self.index
    }

    /// Look up a full-width key tagged with its family
    ///
    /// V4 keys must be 32-bit (not embedded); V6 keys are walked from the root.
    pub fn find(&self, key: BitKey, family: AddressFamily) -> Option<&V> {
        let slot = match family {
            AddressFamily::V6 => self.index.find_value_index(key, 0),
            AddressFamily::V4 if self.v4_resolved => self
                .index
                .find_value_index(key, self.v4_offset)
                .or(self.v4_inherited),
            // No IPv4 subtree: only a covering prefix above it can match
            AddressFamily::V4 => self.v4_inherited,
        };
        slot.and_then(|s| self.index.value(s))
    }

    /// Longest-prefix match for an address
    #[inline]
    pub fn lookup(&self, addr: IpAddr) -> Option<&V> {
        self.find(BitKey::host(addr), AddressFamily::of(&addr))
    }
}
