//! Bulk ingestion
//!
//! A load streams the IPv6 blocks file, then the IPv4 blocks file, into
//! one [`IpTrie`], compacts it into a [`DualStackIndex`], and then reads
//! the locations file into a [`LocationTable`]. The result is a
//! [`GeoSnapshot`] that is never modified afterwards.
//!
//! Error policy differs per file kind:
//! - blocks files skip malformed rows until more than `max_row_errors`
//!   have been seen, then abandon the rest of that file only;
//! - the locations file stops at its first malformed row.
//!
//! Either way the load itself goes on. Only I/O failures and
//! cancellation make it fail.

use crate::blocks::SubnetBlock;
use crate::config::{GeoConfig, InputFiles};
use crate::csv_source::RowReader;
use crate::dual_stack::{AddressFamily, DualStackIndex};
use crate::error::{GeoError, Result};
use crate::interner::StringPool;
use crate::ip_trie::IpTrie;
use crate::location::{Location, LocationTable};
use crate::schema::Resolution;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything a lookup needs, built by one load
#[derive(Debug)]
pub struct GeoSnapshot {
    /// Blocks of both families
    pub index: DualStackIndex<Arc<SubnetBlock>>,
    /// Locations referenced by the blocks
    pub locations: LocationTable,
    /// Resolution the data was read with
    pub resolution: Resolution,
}

/// Outcome of reading one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// File that was read
    pub path: PathBuf,
    /// Data rows seen (header excluded)
    pub rows: u64,
    /// Rows that made it into the index or table
    pub loaded: u64,
    /// Rows rejected as malformed
    pub errors: u64,
    /// Reading stopped before the end of the file
    pub aborted: bool,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            rows: 0,
            loaded: 0,
            errors: 0,
            aborted: false,
        }
    }
}

/// Outcome of a whole load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    /// IPv6 blocks file
    pub ipv6_blocks: FileReport,
    /// IPv4 blocks file
    pub ipv4_blocks: FileReport,
    /// Locations file
    pub locations: FileReport,
    /// Node records in the compacted index
    pub node_count: usize,
    /// Offset IPv4 lookups start from
    pub v4_boundary_offset: u32,
    /// Distinct strings interned during the load
    pub interned_strings: usize,
    /// Wall time of the load in milliseconds
    pub elapsed_ms: u64,
}

/// Builds a [`GeoSnapshot`] from the input files
pub struct Loader<'a> {
    files: &'a InputFiles,
    resolution: Resolution,
    max_row_errors: usize,
    cancel: &'a AtomicBool,
    pool: StringPool,
}

impl<'a> Loader<'a> {
    /// Create a loader; `cancel` is polled before every row and file
    pub fn new(config: &GeoConfig, files: &'a InputFiles, cancel: &'a AtomicBool) -> Self {
        Self {
            files,
            resolution: config.resolution,
            max_row_errors: config.max_row_errors,
            cancel,
            pool: StringPool::new(),
        }
    }

    fn check_canceled(&self) -> Result<()> {
        if self.cancel.load(Ordering::Acquire) {
            Err(GeoError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Run the load
    pub fn load(mut self) -> Result<(GeoSnapshot, LoadReport)> {
        let started = Instant::now();
        info!(resolution = %self.resolution, "Loading geolocation data");

        let mut trie = IpTrie::new();
        let ipv6_blocks = self.load_blocks(&mut trie, AddressFamily::V6)?;
        let ipv4_blocks = self.load_blocks(&mut trie, AddressFamily::V4)?;

        self.check_canceled()?;
        let index = DualStackIndex::build(trie);
        debug!(
            nodes = index.index().node_count(),
            blocks = index.index().values().len(),
            v4_boundary_offset = index.v4_boundary_offset(),
            "Index compacted"
        );

        let (locations, locations_report) = self.load_locations()?;

        let report = LoadReport {
            ipv6_blocks,
            ipv4_blocks,
            locations: locations_report,
            node_count: index.index().node_count(),
            v4_boundary_offset: index.v4_boundary_offset(),
            interned_strings: self.pool.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            blocks = index.index().values().len(),
            locations = locations.len(),
            elapsed_ms = report.elapsed_ms,
            "Geolocation data loaded"
        );

        let snapshot = GeoSnapshot {
            index,
            locations,
            resolution: self.resolution,
        };
        Ok((snapshot, report))
    }

    fn load_blocks(
        &mut self,
        trie: &mut IpTrie<Arc<SubnetBlock>>,
        family: AddressFamily,
    ) -> Result<FileReport> {
        self.check_canceled()?;

        let files = self.files;
        let path = match family {
            AddressFamily::V6 => &files.ipv6_blocks,
            AddressFamily::V4 => &files.ipv4_blocks,
        };
        let rows = RowReader::open(path, self.resolution.blocks_columns())?;
        self.read_blocks(trie, family, path, rows)
    }

    fn read_blocks(
        &mut self,
        trie: &mut IpTrie<Arc<SubnetBlock>>,
        family: AddressFamily,
        path: &Path,
        mut rows: RowReader,
    ) -> Result<FileReport> {
        let mut report = FileReport::new(path);

        loop {
            self.check_canceled()?;

            let parsed = match rows.next_row() {
                None => break,
                Some(Err(GeoError::Io(msg))) => return Err(GeoError::Io(msg)),
                Some(Err(e)) => Err(e),
                Some(Ok(row)) => {
                    SubnetBlock::from_row(&row, self.resolution, family, &mut self.pool)
                }
            };
            report.rows += 1;

            match parsed.and_then(|block| {
                DualStackIndex::insert(trie, block.start, block.prefix_len, Arc::new(block))
            }) {
                Ok(()) => report.loaded += 1,
                Err(e) => {
                    report.errors += 1;
                    warn!(file = %path.display(), error = %e, "Skipping malformed blocks row");

                    if report.errors > self.max_row_errors as u64 {
                        report.aborted = true;
                        error!(
                            catastrophic = true,
                            file = %path.display(),
                            errors = report.errors,
                            "Too many malformed rows, abandoning rest of blocks file"
                        );
                        break;
                    }
                }
            }
        }

        info!(
            file = %path.display(),
            rows = report.rows,
            loaded = report.loaded,
            errors = report.errors,
            "Blocks file read"
        );
        Ok(report)
    }

    fn load_locations(&mut self) -> Result<(LocationTable, FileReport)> {
        self.check_canceled()?;

        let files = self.files;
        let path = &files.locations;
        let mut report = FileReport::new(path);
        let mut table = LocationTable::new();
        let mut rows = RowReader::open(path, self.resolution.locations_columns())?;

        loop {
            self.check_canceled()?;

            let parsed = match rows.next_row() {
                None => break,
                Some(Err(GeoError::Io(msg))) => return Err(GeoError::Io(msg)),
                Some(Err(e)) => Err(e),
                Some(Ok(row)) => Location::from_row(&row, self.resolution, &mut self.pool),
            };
            report.rows += 1;

            match parsed {
                Ok(location) => {
                    table.insert(location);
                    report.loaded += 1;
                }
                Err(e) => {
                    report.errors += 1;
                    report.aborted = true;
                    error!(
                        catastrophic = true,
                        file = %path.display(),
                        error = %e,
                        "Malformed locations row, abandoning rest of locations file"
                    );
                    break;
                }
            }
        }

        info!(
            file = %path.display(),
            rows = report.rows,
            loaded = report.loaded,
            "Locations file read"
        );
        Ok((table, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;
    use tempfile::TempDir;

    const BLOCKS_HEADER: &str = "network,geoname_id,registered_country_geoname_id,represented_country_geoname_id,is_anonymous_proxy,is_satellite_provider\n";
    const LOCATIONS_HEADER: &str = "geoname_id,locale_code,continent_code,continent_name,country_iso_code,country_name,is_in_european_union\n";

    fn write_dir(v6: &str, v4: &str, locations: &str) -> (TempDir, GeoConfig) {
        let dir = TempDir::new().unwrap();
        let res = Resolution::Country;
        std::fs::write(
            dir.path().join(res.blocks_file(AddressFamily::V6)),
            format!("{}{}", BLOCKS_HEADER, v6),
        )
        .unwrap();
        std::fs::write(
            dir.path().join(res.blocks_file(AddressFamily::V4)),
            format!("{}{}", BLOCKS_HEADER, v4),
        )
        .unwrap();
        std::fs::write(
            dir.path().join(res.locations_file("en")),
            format!("{}{}", LOCATIONS_HEADER, locations),
        )
        .unwrap();
        let config = GeoConfig::new(dir.path(), res);
        (dir, config)
    }

    fn run(config: &GeoConfig) -> Result<(GeoSnapshot, LoadReport)> {
        let files = config.validate()?;
        let cancel = AtomicBool::new(false);
        Loader::new(config, &files, &cancel).load()
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_load_small_dataset() {
        let (_dir, config) = write_dir(
            "2001:db8::/32,2,2,,0,0\n",
            "10.0.0.0/8,1,1,,0,0\n10.1.0.0/16,2,1,,0,1\n",
            "1,en,EU,Europe,DE,Germany,1\n2,en,NA,\"North America\",US,\"United States\",0\n",
        );
        let (snapshot, report) = run(&config).unwrap();

        assert_eq!(report.ipv6_blocks.loaded, 1);
        assert_eq!(report.ipv4_blocks.loaded, 2);
        assert_eq!(report.locations.loaded, 2);
        assert_eq!(snapshot.locations.len(), 2);

        let block = snapshot.index.lookup(ip("10.1.2.3")).unwrap();
        assert_eq!(block.network.as_str(), "10.1.0.0/16");
        assert!(block.is_satellite_provider);
        let block = snapshot.index.lookup(ip("10.2.2.3")).unwrap();
        assert_eq!(block.network.as_str(), "10.0.0.0/8");
        assert!(snapshot.index.lookup(ip("192.168.1.1")).is_none());
        assert!(snapshot.index.lookup(ip("2001:db8::1")).is_some());
    }

    #[test]
    fn test_ids_are_interned_across_files() {
        let (_dir, config) = write_dir(
            "2001:db8::/32,7,,,0,0\n",
            "10.0.0.0/8,7,,,0,0\n",
            "7,en,EU,Europe,DE,Germany,1\n",
        );
        let (snapshot, _) = run(&config).unwrap();

        let v6 = snapshot.index.lookup(ip("2001:db8::1")).unwrap();
        let v4 = snapshot.index.lookup(ip("10.0.0.1")).unwrap();
        let loc = snapshot.locations.get("7").unwrap();
        assert!(v6.location_id.as_ref().unwrap().ptr_eq(v4.location_id.as_ref().unwrap()));
        assert!(loc.id.ptr_eq(v4.location_id.as_ref().unwrap()));
    }

    #[test]
    fn test_blocks_threshold_not_exceeded() {
        let mut v4 = String::new();
        for i in 0..8 {
            v4.push_str(&format!("bogus-{},1,,,0,0\n", i));
        }
        v4.push_str("10.0.0.0/8,1,,,0,0\n");

        let (_dir, config) = write_dir("", &v4, "1,en,EU,Europe,DE,Germany,1\n");
        let (snapshot, report) = run(&config).unwrap();

        assert_eq!(report.ipv4_blocks.errors, 8);
        assert!(!report.ipv4_blocks.aborted);
        assert_eq!(report.ipv4_blocks.loaded, 1);
        assert!(snapshot.index.lookup(ip("10.1.1.1")).is_some());
    }

    #[test]
    fn test_blocks_threshold_exceeded() {
        let mut v6 = String::new();
        for i in 0..9 {
            v6.push_str(&format!("bogus-{},1,,,0,0\n", i));
        }
        v6.push_str("2001:db8::/32,1,,,0,0\n");

        let (_dir, config) = write_dir(
            &v6,
            "10.0.0.0/8,1,,,0,0\n",
            "1,en,EU,Europe,DE,Germany,1\n",
        );
        let (snapshot, report) = run(&config).unwrap();

        assert_eq!(report.ipv6_blocks.errors, 9);
        assert!(report.ipv6_blocks.aborted);
        assert_eq!(report.ipv6_blocks.rows, 9);
        assert!(snapshot.index.lookup(ip("2001:db8::1")).is_none());
        // The next file is still read
        assert_eq!(report.ipv4_blocks.loaded, 1);
        assert!(snapshot.index.lookup(ip("10.1.1.1")).is_some());
    }

    #[test]
    fn test_locations_abort_on_first_error() {
        let (_dir, config) = write_dir(
            "",
            "10.0.0.0/8,1,,,0,0\n",
            "1,en,EU,Europe,DE,Germany,1\n2,en,EU\n3,en,EU,Europe,FR,France,1\n",
        );
        let (snapshot, report) = run(&config).unwrap();

        assert!(report.locations.aborted);
        assert_eq!(report.locations.loaded, 1);
        assert!(snapshot.locations.get("1").is_some());
        assert!(snapshot.locations.get("3").is_none());
    }

    #[test]
    fn test_cancel_before_load() {
        let (_dir, config) = write_dir("", "10.0.0.0/8,1,,,0,0\n", "1,en,EU,Europe,DE,Germany,1\n");
        let files = config.validate().unwrap();
        let cancel = AtomicBool::new(true);

        let err = Loader::new(&config, &files, &cancel).load().unwrap_err();
        assert_eq!(err, GeoError::Canceled);
    }

    #[test]
    fn test_gzip_inputs() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let (dir, config) = write_dir("", "", "1,en,EU,Europe,DE,Germany,1\n");
        let name = Resolution::Country.blocks_file(AddressFamily::V4);
        std::fs::remove_file(dir.path().join(&name)).unwrap();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        writeln!(encoder, "{}10.0.0.0/8,1,,,0,0", BLOCKS_HEADER).unwrap();
        std::fs::write(
            dir.path().join(format!("{}.gz", name)),
            encoder.finish().unwrap(),
        )
        .unwrap();

        let (snapshot, report) = run(&config).unwrap();
        assert_eq!(report.ipv4_blocks.loaded, 1);
        assert!(snapshot.index.lookup(ip("10.9.9.9")).is_some());
    }

    /// Raises `cancel` once more than `after` bytes have been handed out
    struct CancelAfter<R> {
        inner: R,
        read: usize,
        after: usize,
        cancel: Arc<AtomicBool>,
    }

    impl<R: std::io::Read> std::io::Read for CancelAfter<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.inner.read(buf)?;
            self.read += n;
            if self.read > self.after {
                self.cancel.store(true, Ordering::Release);
            }
            Ok(n)
        }
    }

    #[test]
    fn test_cancel_mid_file() {
        const ROWS: usize = 50_000;
        let mut v4 = String::from(BLOCKS_HEADER);
        for i in 0..ROWS {
            v4.push_str(&format!("10.{}.{}.0/24,1,,,0,0\n", i / 256, i % 256));
        }

        let (_dir, config) = write_dir("", "", "1,en,EU,Europe,DE,Germany,1\n");
        let files = config.validate().unwrap();
        let cancel = Arc::new(AtomicBool::new(false));
        let reader = CancelAfter {
            inner: std::io::Cursor::new(v4.into_bytes()),
            read: 0,
            after: 64 * 1024,
            cancel: Arc::clone(&cancel),
        };
        let rows = RowReader::from_reader(reader, Resolution::Country.blocks_columns());

        let mut loader = Loader::new(&config, &files, &cancel);
        let mut trie = IpTrie::new();
        let err = loader
            .read_blocks(&mut trie, AddressFamily::V4, &files.ipv4_blocks, rows)
            .unwrap_err();

        assert_eq!(err, GeoError::Canceled);
        // Rows already buffered were ingested, the rest never were
        assert!(!trie.is_empty());
        assert!(trie.len() < ROWS);
    }
}
