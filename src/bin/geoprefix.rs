mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::{cmd_bench, cmd_lookup, cmd_stats};

#[derive(Parser)]
#[command(name = "geoprefix")]
#[command(
    about = "Longest-prefix-match IP geolocation over GeoLite2-style CSV data",
    long_about = "geoprefix - Longest-prefix-match IP geolocation over GeoLite2-style CSV data\n\n\
    Loads the Blocks-IPv6, Blocks-IPv4 and Locations CSV files (plain or .gz) from a data \n\
    directory into one in-memory index and resolves addresses to their most specific network.\n\n\
    Examples:\n\
      geoprefix --data-dir ./geoip lookup 81.2.69.160 2001:db8::1\n\
      geoprefix --data-dir ./geoip --resolution country stats\n\
      geoprefix --config geoprefix.json bench --queries 1000000 --threads 4"
)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// JSON configuration file (data_dir, resolution, locale, max_row_errors)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the GeoLite2 CSV files (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Data resolution: city or country (overrides the config file)
    #[arg(long, global = true)]
    resolution: Option<String>,

    /// Locale of the locations file (overrides the config file)
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up one or more IP addresses
    Lookup {
        /// Addresses to geolocate
        #[arg(value_name = "ADDRESS", required = true)]
        addresses: Vec<String>,

        /// Print single-line JSON instead of pretty JSON
        #[arg(long)]
        compact: bool,
    },

    /// Load the data and print the load report
    Stats,

    /// Measure lookup throughput against the loaded data
    Bench {
        /// Number of lookups per thread
        #[arg(short = 'n', long, default_value = "1000000")]
        queries: usize,

        /// Number of concurrent lookup threads
        #[arg(short = 'j', long, default_value = "1")]
        threads: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli_utils::init_logging(cli.global.verbose);

    let config = cli_utils::resolve_config(&cli.global)?;

    match cli.command {
        Commands::Lookup { addresses, compact } => cmd_lookup(config, addresses, compact),
        Commands::Stats => cmd_stats(config),
        Commands::Bench { queries, threads } => cmd_bench(config, queries, threads),
    }
}
