//! One complete scan.
//!
//! ```text
//! config ─→ scan ─→ ThumbnailDict::populate
//!                       │
//!                       ▼
//!           create_missing(max) ─→ ScriptWriter   (repeat while required,
//!                                                  next script per batch)
//!                       │
//!                       ▼
//!                finish + chmod
//! ```

use crate::cache::CacheStats;
use crate::config::ThumbnailConfig;
use crate::dict::{DictEvent, ThumbnailDict};
use crate::scan::scan;
use crate::script::{ScriptError, ScriptWriter};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("cannot write commands to {}: {source}", path.display())]
    Emit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What a run found and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub files_found: usize,
    pub missing: usize,
    pub scheduled: usize,
    /// Photos skipped because no time stamp could be derived.
    pub failures: usize,
    pub scan_failures: usize,
    pub scripts: Vec<PathBuf>,
    pub cache: CacheStats,
    pub populate_time: Duration,
    pub create_time: Duration,
}

/// Scan every configured user path and write the generation scripts.
///
/// `args` goes into each script header. Per-file problems are logged and
/// counted; only script file errors end the run early.
pub fn run(
    config: &ThumbnailConfig,
    args: &str,
    events: Option<&Sender<DictEvent>>,
) -> Result<RunSummary, RunError> {
    let mut script = ScriptWriter::create(&config.exec_file, args)?;
    let mut dict = ThumbnailDict::new(config);

    let started = Instant::now();
    dict.populate(scan(config), events);
    let populate_time = started.elapsed();
    info!(
        "found {} files, {} without thumbnails in {}ms",
        dict.file_count(),
        dict.missing_count(),
        populate_time.as_millis()
    );
    for group in dict.groups() {
        debug!("group {group}");
    }

    let started = Instant::now();
    let batch = config.batch_size();
    let mut scheduled = 0;
    let mut in_current = 0;
    let mut todo = dict.count_required();
    while todo > 0 {
        let n = dict
            .create_missing(batch, &mut script, events)
            .map_err(|source| RunError::Emit {
                path: script.path().to_path_buf(),
                source,
            })?;
        scheduled += n;
        in_current = n;
        todo = dict.count_required();
        if todo > 0 {
            script.rotate(n)?;
            in_current = 0;
        }
    }
    let scripts = script.finish(in_current)?;
    let create_time = started.elapsed();

    let failures = dict.failures().count();
    info!(
        "scheduled {scheduled} thumbnails in {} script(s), {failures} skipped, in {}ms",
        scripts.len(),
        create_time.as_millis()
    );

    Ok(RunSummary {
        files_found: dict.file_count(),
        missing: dict.missing_count(),
        scheduled,
        failures,
        scan_failures: dict.scan_failures(),
        scripts,
        cache: dict.cache_stats().clone(),
        populate_time,
        create_time,
    })
}
