use anyhow::{Context, Result};
use geoprefix::{GeoConfig, GeoService, LoadReport};
use tracing_subscriber::EnvFilter;

use crate::GlobalArgs;

/// Install the stderr log subscriber; `RUST_LOG` wins over `-v`
pub fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the configuration from `--config` plus command-line overrides
pub fn resolve_config(args: &GlobalArgs) -> Result<GeoConfig> {
    let mut config = match (&args.config, &args.data_dir) {
        (Some(path), _) => GeoConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        (None, Some(dir)) => GeoConfig::new(dir, Default::default()),
        (None, None) => anyhow::bail!("Either --data-dir or --config is required"),
    };

    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(resolution) = &args.resolution {
        config.resolution = resolution.parse()?;
    }
    if let Some(locale) = &args.locale {
        config.locale = locale.clone();
    }
    Ok(config)
}

/// Configure the service and load it, canceling on Ctrl+C
pub fn load_service(config: GeoConfig) -> Result<(GeoService, LoadReport)> {
    let service = GeoService::configure(config).context("Invalid configuration")?;

    let canceler = service.clone();
    ctrlc::set_handler(move || {
        tracing::info!("Ctrl+C received, canceling load");
        canceler.cancel_start();
    })
    .context("Failed to set Ctrl+C handler")?;

    let report = service
        .start_background()?
        .wait()
        .context("Failed to load geolocation data")?;
    Ok((service, report))
}

pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub fn format_qps(qps: f64) -> String {
    if qps >= 1_000_000.0 {
        format!("{:.2}M", qps / 1_000_000.0)
    } else if qps >= 1_000.0 {
        format!("{:.2}K", qps / 1_000.0)
    } else {
        format!("{:.2}", qps)
    }
}
