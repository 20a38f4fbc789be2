//! Streaming input files with automatic gzip decompression
//!
//! Data files may be shipped either plain (`GeoLite2-City-Locations-en.csv`)
//! or gzip-compressed (`GeoLite2-City-Locations-en.csv.gz`). [`find_input`]
//! picks whichever exists and [`open`] decodes `.gz` transparently.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Buffer size for file reading (128KB)
const BUFFER_SIZE: usize = 128 * 1024;

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Open a file with automatic gzip detection based on file extension
///
/// Files ending in `.gz` (case-insensitive) are decompressed on the fly.
pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn Read + Send>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    if is_gzip(path) {
        let decoder = GzDecoder::new(BufReader::with_capacity(BUFFER_SIZE, file));
        Ok(Box::new(decoder))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

/// Locate `name` in `dir`, falling back to `name.gz`
pub fn find_input(dir: &Path, name: &str) -> Option<PathBuf> {
    let plain = dir.join(name);
    if plain.is_file() {
        return Some(plain);
    }
    let gz = dir.join(format!("{}.gz", name));
    if gz.is_file() {
        return Some(gz);
    }
    None
}
