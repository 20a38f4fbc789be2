// Longest-prefix-match semantics of the trie and its compacted form

use geoprefix::{AddressFamily, BitKey, CompactIndex, DualStackIndex, IpTrie};
use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[test]
fn test_specific_before_subnet() {
    // Insertion order must not matter: /32 first, then its /24
    let mut trie = IpTrie::new();
    DualStackIndex::insert(&mut trie, ip("192.0.2.1"), 32, "single").unwrap();
    DualStackIndex::insert(&mut trie, ip("192.0.2.0"), 24, "subnet").unwrap();
    let index = DualStackIndex::build(trie);

    assert_eq!(index.lookup(ip("192.0.2.1")), Some(&"single"));
    assert_eq!(index.lookup(ip("192.0.2.2")), Some(&"subnet"));
}

#[test]
fn test_subnet_before_specific() {
    let mut trie = IpTrie::new();
    DualStackIndex::insert(&mut trie, ip("192.0.2.0"), 24, "subnet").unwrap();
    DualStackIndex::insert(&mut trie, ip("192.0.2.1"), 32, "single").unwrap();
    let index = DualStackIndex::build(trie);

    assert_eq!(index.lookup(ip("192.0.2.1")), Some(&"single"));
    assert_eq!(index.lookup(ip("192.0.2.254")), Some(&"subnet"));
}

#[test]
fn test_nested_v6_networks() {
    let mut trie = IpTrie::new();
    DualStackIndex::insert(&mut trie, ip("2001:db8::"), 32, 32).unwrap();
    DualStackIndex::insert(&mut trie, ip("2001:db8:1::"), 48, 48).unwrap();
    DualStackIndex::insert(&mut trie, ip("2001:db8:1:2::"), 64, 64).unwrap();
    let index = DualStackIndex::build(trie);

    assert_eq!(index.lookup(ip("2001:db8:1:2::9")), Some(&64));
    assert_eq!(index.lookup(ip("2001:db8:1:3::9")), Some(&48));
    assert_eq!(index.lookup(ip("2001:db8:2::9")), Some(&32));
    assert_eq!(index.lookup(ip("2001:db9::1")), None);
}

#[test]
fn test_v4_queries_inherit_mapped_cover() {
    // A v6 network that covers the whole mapped range answers v4 queries
    // even when no v4 network was loaded.
    let mut trie = IpTrie::new();
    DualStackIndex::insert(&mut trie, ip("::"), 64, "low").unwrap();
    DualStackIndex::insert(&mut trie, ip("2001::"), 16, "other").unwrap();
    let index = DualStackIndex::build(trie);

    assert_eq!(index.lookup(ip("1.2.3.4")), Some(&"low"));
    assert_eq!(index.lookup(ip("32.1.0.1")), Some(&"low"));
}

#[test]
fn test_find_with_explicit_family() {
    let mut trie = IpTrie::new();
    DualStackIndex::insert(&mut trie, ip("10.0.0.0"), 8, 'a').unwrap();
    let index = DualStackIndex::build(trie);

    let key = BitKey::host(ip("10.9.9.9"));
    assert_eq!(index.find(key, AddressFamily::V4), Some(&'a'));
    let key = BitKey::host(ip("::ffff:10.9.9.9"));
    assert_eq!(index.find(key, AddressFamily::V6), Some(&'a'));
}

fn reference_lookup<V>(entries: &[(u128, u8, V)], addr: u128) -> Option<&V> {
    // Last insertion wins for duplicate keys, longest prefix wins overall
    let mut best: Option<(u8, &V)> = None;
    for (network, len, value) in entries {
        let mask = if *len == 0 { 0 } else { u128::MAX << (128 - *len as u32) };
        if addr & mask == network & mask && best.is_none_or(|(l, _)| *len >= l) {
            best = Some((*len, value));
        }
    }
    best.map(|(_, v)| v)
}

fn v6_entries() -> impl Strategy<Value = Vec<(u128, u8)>> {
    // Cluster networks in a narrow range so they nest and collide
    prop::collection::vec((0u128..=0xffff, 0u8..=20), 0..40).prop_map(|raw| {
        raw.into_iter()
            .map(|(high, len)| (high << 112, len))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_compact_index_matches_trie(
        entries in v6_entries(),
        queries in prop::collection::vec(0u128..=0xffff, 1..20),
    ) {
        let mut trie = IpTrie::new();
        for (i, (network, len)) in entries.iter().enumerate() {
            let key = BitKey::from_v6(Ipv6Addr::from(*network), Some(*len)).unwrap();
            trie.insert(key, i);
        }

        let mut expected = Vec::new();
        for query in &queries {
            let addr = Ipv6Addr::from(*query << 112 | 0x1234);
            expected.push(trie.lookup_prefix(BitKey::host(IpAddr::V6(addr))).copied());
        }

        let index: CompactIndex<usize> = trie.build_index();
        for (query, want) in queries.iter().zip(expected) {
            let addr = Ipv6Addr::from(*query << 112 | 0x1234);
            let got = index
                .find_value_index(BitKey::host(IpAddr::V6(addr)), 0)
                .map(|slot| index.values()[slot]);
            prop_assert_eq!(got, want);
        }
    }

    #[test]
    fn prop_dual_stack_matches_reference(entries in v6_entries(), query in 0u128..=0xffff) {
        let mut trie = IpTrie::new();
        let mut reference = Vec::new();
        for (i, (network, len)) in entries.iter().enumerate() {
            let addr = IpAddr::V6(Ipv6Addr::from(*network));
            DualStackIndex::insert(&mut trie, addr, *len, i).unwrap();
            reference.push((*network, *len, i));
        }
        let index = DualStackIndex::build(trie);

        let addr = query << 112 | 0xabcd;
        prop_assert_eq!(
            index.lookup(IpAddr::V6(Ipv6Addr::from(addr))),
            reference_lookup(&reference, addr)
        );
    }

    #[test]
    fn prop_v4_and_mapped_agree(
        networks in prop::collection::vec((any::<u32>(), 8u8..=32), 0..30),
        query in any::<u32>(),
    ) {
        let mut trie = IpTrie::new();
        for (i, (network, len)) in networks.iter().enumerate() {
            let addr = IpAddr::V4(Ipv4Addr::from(*network));
            DualStackIndex::insert(&mut trie, addr, *len, i).unwrap();
        }
        let index = DualStackIndex::build(trie);

        let v4 = Ipv4Addr::from(query);
        prop_assert_eq!(
            index.lookup(IpAddr::V4(v4)),
            index.lookup(IpAddr::V6(v4.to_ipv6_mapped()))
        );
    }
}
