use anyhow::{Context, Result};
use geoprefix::GeoConfig;
use serde_json::json;

use crate::cli_utils::load_service;

pub fn cmd_lookup(config: GeoConfig, addresses: Vec<String>, compact: bool) -> Result<()> {
    let (service, _report) = load_service(config)?;

    let mut results = Vec::with_capacity(addresses.len());
    let mut found = false;
    for address in &addresses {
        let entity = service
            .lookup_str(address)
            .with_context(|| format!("Lookup failed for: {}", address))?
            .context("Service is not available")?;
        found |= entity.is_match();
        results.push(json!(entity));
    }

    let output = if compact {
        serde_json::to_string(&results)?
    } else {
        serde_json::to_string_pretty(&results)?
    };
    println!("{}", output);

    // Exit with appropriate code
    std::process::exit(if found { 0 } else { 1 });
}
