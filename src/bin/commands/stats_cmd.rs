use anyhow::Result;
use geoprefix::{FileReport, GeoConfig};

use crate::cli_utils::{format_number, load_service};

fn print_file(label: &str, report: &FileReport) {
    println!("{}", label);
    println!("  File:    {}", report.path.display());
    println!("  Rows:    {}", format_number(report.rows as usize));
    println!("  Loaded:  {}", format_number(report.loaded as usize));
    println!("  Errors:  {}", format_number(report.errors as usize));
    if report.aborted {
        println!("  Status:  ABORTED (remaining rows skipped)");
    }
}

pub fn cmd_stats(config: GeoConfig) -> Result<()> {
    let resolution = config.resolution;
    let (_service, report) = load_service(config)?;

    println!("Resolution: {}", resolution);
    print_file("IPv6 blocks", &report.ipv6_blocks);
    print_file("IPv4 blocks", &report.ipv4_blocks);
    print_file("Locations", &report.locations);
    println!("Index");
    println!("  Nodes:             {}", format_number(report.node_count));
    println!("  IPv4 start offset: {}", report.v4_boundary_offset);
    println!("  Interned strings:  {}", format_number(report.interned_strings));
    println!("  Load time:         {:.2}s", report.elapsed_ms as f64 / 1000.0);

    Ok(())
}
