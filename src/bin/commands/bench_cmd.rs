use anyhow::Result;
use geoprefix::GeoConfig;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Instant;

use crate::cli_utils::{format_number, format_qps, load_service};

/// Spread query `i` of thread `t` across the IPv4 space
fn query_address(t: usize, i: usize) -> IpAddr {
    let seed = (t as u32).wrapping_mul(0x9E37_79B9) ^ (i as u32);
    IpAddr::V4(Ipv4Addr::from(seed.wrapping_mul(2_654_435_761)))
}

pub fn cmd_bench(config: GeoConfig, queries: usize, threads: usize) -> Result<()> {
    let threads = threads.max(1);

    println!("--- Phase 1: Load ---");
    let load_start = Instant::now();
    let (service, report) = load_service(config)?;
    println!("  Load time:   {:.2}s", load_start.elapsed().as_secs_f64());
    let blocks = report.ipv4_blocks.loaded + report.ipv6_blocks.loaded;
    println!("  Blocks:      {}", format_number(blocks as usize));
    println!();

    println!("--- Phase 2: Lookups ({} threads) ---", threads);
    let query_start = Instant::now();
    let matched: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let service = service.clone();
                scope.spawn(move || {
                    (0..queries)
                        .filter(|&i| {
                            service
                                .lookup(query_address(t, i))
                                .is_some_and(|e| e.is_match())
                        })
                        .count()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap_or(0)).sum()
    });
    let elapsed = query_start.elapsed();

    let total = queries * threads;
    println!("  Queries:     {}", format_number(total));
    println!("  Matched:     {}", format_number(matched));
    println!("  Time:        {:.2}s", elapsed.as_secs_f64());
    println!("  Throughput:  {} queries/sec", format_qps(total as f64 / elapsed.as_secs_f64()));

    Ok(())
}
