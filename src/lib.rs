//! geoprefix - Longest-Prefix-Match IP Geolocation
//!
//! geoprefix bulk-loads GeoLite2-style CSV data (two blocks files and a
//! locations file) into an immutable binary trie and answers "where is
//! this address" with the most specific network that contains it.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use geoprefix::{GeoConfig, GeoService, Resolution};
//!
//! let service = GeoService::configure(GeoConfig::new("/var/lib/geoip", Resolution::City))?;
//! service.start()?;
//!
//! if let Some(entity) = service.lookup_str("81.2.69.160")? {
//!     println!("{:?} {:?}", entity.country_iso_code(), entity.city_name());
//! }
//! # Ok::<(), geoprefix::GeoError>(())
//! ```
//!
//! # Building an index directly
//!
//! ```rust
//! use geoprefix::{DualStackIndex, IpTrie};
//!
//! let mut trie = IpTrie::new();
//! DualStackIndex::insert(&mut trie, "10.0.0.0".parse()?, 8, "locA")?;
//! DualStackIndex::insert(&mut trie, "10.1.0.0".parse()?, 16, "locB")?;
//! let index = DualStackIndex::build(trie);
//!
//! assert_eq!(index.lookup("10.1.2.3".parse()?), Some(&"locB"));
//! assert_eq!(index.lookup("10.2.2.3".parse()?), Some(&"locA"));
//! assert_eq!(index.lookup("192.168.1.1".parse()?), None);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  Load (background worker)            │
//! ├──────────────────────────────────────┤
//! │  1. Blocks-IPv6 ─┐                   │
//! │  2. Blocks-IPv4 ─┴▶ IpTrie (arena)   │
//! │  3. compact ▶ DualStackIndex         │
//! │  4. Locations ▶ LocationTable        │
//! └──────────────────────────────────────┘
//!          ↓ one atomic pointer swap
//! ┌──────────────────────────────────────┐
//! │  GeoSnapshot (read-only, shared)     │
//! │  Lock-free lookups from any thread   │
//! └──────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Address/prefix to bit sequence conversion
pub mod bit_key;
/// Subnet block records
pub mod blocks;
/// Compacted, pointer-free trie
pub mod compact_index;
/// Service configuration
pub mod config;
/// Fixed-width CSV row reader
pub mod csv_source;
/// Shared IPv4/IPv6 index
pub mod dual_stack;
/// Lookup results
pub mod entity;
/// Error types
pub mod error;
/// Input files with transparent gzip
pub mod file_reader;
/// Load-scoped string interning
pub mod interner;
/// Build-time binary trie
pub mod ip_trie;
/// Bulk ingestion
pub mod loader;
/// Location records and table
pub mod location;
/// Resolutions and CSV layouts
pub mod schema;
/// Lifecycle and lookup facade
pub mod service;

// Re-exports for Rust consumers

pub use crate::bit_key::BitKey;
pub use crate::blocks::SubnetBlock;
pub use crate::compact_index::{CompactIndex, CompactNode};
pub use crate::config::{GeoConfig, InputFiles};
pub use crate::dual_stack::{AddressFamily, DualStackIndex};
pub use crate::entity::GeoEntity;
pub use crate::error::{GeoError, Result};
pub use crate::ip_trie::IpTrie;
pub use crate::loader::{FileReport, GeoSnapshot, LoadReport};
pub use crate::location::{Location, LocationTable};
pub use crate::schema::Resolution;
pub use crate::service::{GeoService, LoadHandle, ServiceState, TaskSpawner, ThreadSpawner};

/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
