//! Thumbnail existence cache.
//!
//! Thumbnail names are `<timestamp><source name><suffix>`, e.g.
//! `2016_11_06_11_29_18_IMG_0001.jpg.json`. The timestamp is only known after
//! decoding the source, which is the expensive part of a run, so the check
//! works the other way round: list the output directory once, strip the fixed
//! prefix and suffix widths from every name, and look the bare source name up
//! in that set.
//!
//! The source enumerator yields each directory's files together, so keeping
//! only the most recent listing is enough for one listing per output
//! directory per run.

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Listings, hits and misses over a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub listings: u32,
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} have thumbnails, {} missing ({} total, {} directories listed)",
                self.hits,
                self.misses,
                self.total(),
                self.listings
            )
        } else {
            write!(
                f,
                "{} missing ({} directories listed)",
                self.misses, self.listings
            )
        }
    }
}

/// Listing of the last thumbnail directory queried.
#[derive(Debug)]
pub struct ThumbnailDirCache {
    prefix_len: usize,
    suffix_len: usize,
    dir: Option<PathBuf>,
    /// Source names with the timestamp prefix and suffix cut off.
    names: HashSet<String>,
    stats: CacheStats,
}

impl ThumbnailDirCache {
    /// `prefix_len` is the width of a formatted timestamp, `suffix_len` the
    /// width of the thumbnail suffix.
    pub fn new(prefix_len: usize, suffix_len: usize) -> Self {
        Self {
            prefix_len,
            suffix_len,
            dir: None,
            names: HashSet::new(),
            stats: CacheStats::default(),
        }
    }

    /// True iff `dir` holds a thumbnail for the source file `name`.
    ///
    /// Lists `dir` first unless it was also the previous directory asked about.
    pub fn has_file(&mut self, dir: &Path, name: &str) -> bool {
        if self.dir.as_deref() != Some(dir) {
            self.list(dir);
        }
        let found = self.names.contains(name);
        if found {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        found
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn list(&mut self, dir: &Path) {
        self.names.clear();
        self.dir = Some(dir.to_path_buf());
        self.stats.listings += 1;
        match self.read_names(dir) {
            Ok(()) => debug!("listed {}: {} thumbnails", dir.display(), self.names.len()),
            // No thumbnails were ever made for this directory.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("thumbnail directory {} does not exist", dir.display())
            }
            Err(e) => warn!("cannot list thumbnail directory {}: {e}", dir.display()),
        }
    }

    fn read_names(&mut self, dir: &Path) -> io::Result<()> {
        let trim = self.prefix_len + self.suffix_len;
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.len() <= trim {
                continue;
            }
            if let Some(key) = file_name.get(self.prefix_len..file_name.len() - self.suffix_len) {
                self.names.insert(key.to_string());
            }
        }
        Ok(())
    }
}
