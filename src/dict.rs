//! Missing-thumbnail bookkeeping.
//!
//! [`ThumbnailDict`] takes the photos found by [`crate::scan`], keeps the ones
//! without a thumbnail, and turns them into generation commands in batches.
//!
//! A thumbnail lives at
//!
//! ```text
//! <ThumbNailsRoot>/<user>/<source>/<timestamp><name><suffix>
//! ```
//!
//! where the timestamp is the capture moment of the photo formatted with
//! `ThumbNailTimeStamp`. The capture moment is resolved in this order, first
//! hit wins:
//!
//! 1. EXIF `DateTimeOriginal`
//! 2. EXIF `DateTime`
//! 3. EXIF `DateTimeDigitized`
//! 4. digits in the file name (`IMG_20161106_112918.jpg`)
//! 5. the file's modification time
//!
//! The three tags are collected in one decode of the file. Each candidate has
//! to pass the same plausibility check as the file name digits.

use crate::cache::{CacheStats, ThumbnailDirCache};
use crate::config::ThumbnailConfig;
use crate::exif::ExifImage;
use crate::scan::{ScanError, SourceFile};
use crate::timestamp::{FileDateTime, TimestampSource};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum TimestampError {
    #[error("time stamp of {} could not be derived: {reason}", path.display())]
    Unresolvable { path: PathBuf, reason: String },
}

/// Destination of generation commands, one line each.
pub trait CommandSink {
    fn emit(&mut self, line: &str) -> io::Result<()>;
}

impl CommandSink for Vec<String> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Progress reported while populating and scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictEvent {
    /// A photo was found. `number` counts every file found so far.
    Found {
        number: usize,
        path: PathBuf,
        has_thumbnail: bool,
    },
    ScanFailed { message: String },
    /// Commands for one thumbnail were emitted.
    Scheduled { number: usize, output: PathBuf },
    /// A photo was given up on for this run.
    Skipped { path: PathBuf, reason: String },
}

fn send(events: Option<&Sender<DictEvent>>, event: DictEvent) {
    if let Some(tx) = events {
        // The receiver may already be gone; progress is best effort.
        let _ = tx.send(event);
    }
}

/// A user's source directory. Shared by all its photos.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Group {
    pub user: String,
    pub root: PathBuf,
    pub source: PathBuf,
}

impl Group {
    /// `source|user`.
    pub fn key(&self) -> String {
        format!("{}|{}", self.source.display(), self.user)
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root.join(&self.user).join(&self.source)
    }

    pub fn output_dir(&self, thumbnails_root: &Path) -> PathBuf {
        thumbnails_root.join(&self.user).join(&self.source)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[user={}, root={}, source={}]",
            self.user,
            self.root.display(),
            self.source.display()
        )
    }
}

/// A photo whose thumbnail is missing.
#[derive(Debug, Clone)]
pub struct Data {
    /// Position among all files found, starting at 1.
    pub number: usize,
    pub group: Rc<Group>,
    pub file_name: String,
    pub thumbnail_exists: bool,
    pub thumbnail_created: bool,
    /// Set when the photo cannot be handled this run.
    pub error: Option<String>,
}

impl Data {
    pub fn required(&self) -> bool {
        self.error.is_none() && !self.thumbnail_exists && !self.thumbnail_created
    }

    pub fn input_path(&self) -> PathBuf {
        self.group.input_dir().join(&self.file_name)
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(e) => write!(f, "KEY[{}] {e}", self.group.key()),
            None => write!(
                f,
                "group:{} fn:{} tn:{}",
                self.group, self.file_name, self.thumbnail_exists
            ),
        }
    }
}

/// Substitute `%in`, `%out` and `%count` in a command template.
pub fn render_command(template: &str, input: &Path, output: &Path, number: usize) -> String {
    template
        .replace("%in", &input.to_string_lossy())
        .replace("%out", &output.to_string_lossy())
        .replace("%count", &format!("{number:>7}"))
}

/// Capture moment of the photo at `path`.
///
/// Fails only when the file cannot be stat'ed, since the modification time
/// is always there otherwise.
pub fn derive_timestamp(path: &Path) -> Result<FileDateTime, TimestampError> {
    let unresolvable = |reason: String| TimestampError::Unresolvable {
        path: path.to_path_buf(),
        reason,
    };
    let meta = fs::metadata(path).map_err(|e| unresolvable(e.to_string()))?;

    if let Some(dt) = exif_timestamp(path) {
        return Ok(dt);
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match FileDateTime::from_spec(&name, TimestampSource::FileName) {
        Ok(dt) => return Ok(dt),
        Err(e) => debug!("no time stamp in file name {name}: {e}"),
    }
    let modified = meta.modified().map_err(|e| unresolvable(e.to_string()))?;
    Ok(FileDateTime::from_system_time(modified))
}

/// Best of the three EXIF date tags.
///
/// Values read before a decode error still count.
fn exif_timestamp(path: &Path) -> Option<FileDateTime> {
    const ORDER: [TimestampSource; 3] = [
        TimestampSource::DateTimeOriginal,
        TimestampSource::DateTime,
        TimestampSource::DateTimeDigitized,
    ];
    let mut found: [Option<FileDateTime>; 3] = [None; 3];
    // The walk never stops early; all three tags are seen before picking one.
    let result = ExifImage::open_with(path, |entry, _| {
        let Some(slot) = ORDER
            .iter()
            .position(|s| s.tag_name() == Some(entry.name()))
        else {
            return false;
        };
        if found[slot].is_none() {
            match FileDateTime::from_spec(&entry.value, ORDER[slot]) {
                Ok(dt) => found[slot] = Some(dt),
                Err(e) => debug!("{}: {} ignored: {e}", path.display(), entry.name()),
            }
        }
        true
    });
    if let Err(e) = result {
        info!("{e}");
    }
    found.into_iter().flatten().next()
}

/// Photos without thumbnails, grouped by source directory.
pub struct ThumbnailDict {
    thumbnails_root: PathBuf,
    pattern: String,
    suffix: String,
    exec: Vec<String>,
    records: Vec<Data>,
    groups: HashMap<String, Rc<Group>>,
    cache: ThumbnailDirCache,
    created_dirs: HashSet<PathBuf>,
    file_count: usize,
    missing_count: usize,
    scan_failures: usize,
}

impl ThumbnailDict {
    pub fn new(config: &ThumbnailConfig) -> Self {
        let prefix_len = config.example_timestamp().len();
        Self {
            thumbnails_root: PathBuf::from(&config.thumbnails_root),
            pattern: config.timestamp_pattern.clone(),
            suffix: config.suffix.clone(),
            exec: config.exec.clone(),
            records: Vec::new(),
            groups: HashMap::new(),
            cache: ThumbnailDirCache::new(prefix_len, config.suffix.len()),
            created_dirs: HashSet::new(),
            file_count: 0,
            missing_count: 0,
            scan_failures: 0,
        }
    }

    /// Record every found photo without a thumbnail.
    ///
    /// Scan errors are logged and counted; they never stop the walk.
    pub fn populate<I>(&mut self, files: I, events: Option<&Sender<DictEvent>>)
    where
        I: IntoIterator<Item = Result<SourceFile, ScanError>>,
    {
        for file in files {
            match file {
                Ok(file) => self.add_file(file, events),
                Err(e) => {
                    warn!("{e}");
                    self.scan_failures += 1;
                    send(events, DictEvent::ScanFailed { message: e.to_string() });
                }
            }
        }
    }

    fn add_file(&mut self, file: SourceFile, events: Option<&Sender<DictEvent>>) {
        self.file_count += 1;
        let group = Group {
            user: file.user,
            root: file.root,
            source: file.source,
        };
        let out_dir = group.output_dir(&self.thumbnails_root);
        let exists = self.cache.has_file(&out_dir, &file.name);

        let data = Data {
            number: self.file_count,
            group: self.intern(group),
            file_name: file.name,
            thumbnail_exists: exists,
            thumbnail_created: false,
            error: None,
        };
        debug!("{:04}:{data}", self.file_count);
        send(
            events,
            DictEvent::Found {
                number: self.file_count,
                path: data.input_path(),
                has_thumbnail: exists,
            },
        );
        if !exists {
            self.missing_count += 1;
            self.records.push(data);
        }
    }

    fn intern(&mut self, group: Group) -> Rc<Group> {
        Rc::clone(
            self.groups
                .entry(group.key())
                .or_insert_with(|| Rc::new(group)),
        )
    }

    /// Records still waiting for a thumbnail.
    pub fn count_required(&self) -> usize {
        self.records.iter().filter(|d| d.required()).count()
    }

    /// Emit commands for up to `max` required records.
    ///
    /// Returns how many thumbnails were scheduled. Photos whose time stamp
    /// cannot be derived are marked failed and not counted. Only a sink error
    /// stops the batch early.
    pub fn create_missing(
        &mut self,
        max: usize,
        sink: &mut dyn CommandSink,
        events: Option<&Sender<DictEvent>>,
    ) -> io::Result<usize> {
        let mut scheduled = 0;
        for index in 0..self.records.len() {
            if scheduled >= max {
                break;
            }
            if !self.records[index].required() {
                continue;
            }
            let input = self.records[index].input_path();
            let stamp = match derive_timestamp(&input) {
                Ok(stamp) => stamp,
                Err(e) => {
                    warn!("{e}");
                    self.records[index].error = Some(e.to_string());
                    send(
                        events,
                        DictEvent::Skipped {
                            path: input,
                            reason: e.to_string(),
                        },
                    );
                    continue;
                }
            };

            let record = &self.records[index];
            let out_dir = record.group.output_dir(&self.thumbnails_root);
            if !self.created_dirs.contains(&out_dir) {
                if !out_dir.is_dir() {
                    sink.emit(&format!("mkdir -p \"{}\"", out_dir.display()))?;
                }
                self.created_dirs.insert(out_dir.clone());
            }
            let output = out_dir.join(format!(
                "{}{}{}",
                stamp.format(&self.pattern),
                record.file_name,
                self.suffix
            ));
            debug!("{} from {}", output.display(), stamp.source);
            for template in &self.exec {
                sink.emit(&render_command(template, &input, &output, record.number))?;
            }
            let number = record.number;

            self.records[index].thumbnail_created = true;
            scheduled += 1;
            send(events, DictEvent::Scheduled { number, output });
        }
        Ok(scheduled)
    }

    /// Distinct groups, ordered by user then source.
    pub fn groups(&self) -> Vec<Rc<Group>> {
        let mut groups: Vec<Rc<Group>> = self.groups.values().cloned().collect();
        groups.sort_by(|a, b| (&a.user, &a.source).cmp(&(&b.user, &b.source)));
        groups
    }

    /// Missing-thumbnail records in discovery order.
    pub fn records(&self) -> &[Data] {
        &self.records
    }

    /// Records given up on this run.
    pub fn failures(&self) -> impl Iterator<Item = &Data> {
        self.records.iter().filter(|d| d.error.is_some())
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn missing_count(&self) -> usize {
        self.missing_count
    }

    pub fn scan_failures(&self) -> usize {
        self.scan_failures
    }

    pub fn cache_stats(&self) -> &CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        photos: PathBuf,
        thumbs: PathBuf,
        config: ThumbnailConfig,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let photos = tmp.path().join("photos");
        let thumbs = tmp.path().join("thumbs");
        fs::create_dir_all(&photos).unwrap();
        fs::create_dir_all(&thumbs).unwrap();
        let config = ThumbnailConfig {
            exec: vec!["gen %in %out".into(), "echo %count".into()],
            thumbnails_root: thumbs.to_string_lossy().into_owned(),
            ..ThumbnailConfig::default()
        };
        Fixture {
            _tmp: tmp,
            photos,
            thumbs,
            config,
        }
    }

    fn source(fx: &Fixture, user: &str, dir: &str, name: &str, bytes: &[u8]) -> SourceFile {
        write_file(&fx.photos.join(user).join(dir), name, bytes);
        SourceFile {
            user: user.into(),
            root: fx.photos.clone(),
            source: PathBuf::from(dir),
            name: name.into(),
        }
    }

    // =========================================================================
    // Group and Data
    // =========================================================================

    #[test]
    fn group_key_and_paths() {
        let g = Group {
            user: "alice".into(),
            root: PathBuf::from("/srv/photos"),
            source: PathBuf::from("2016/trip"),
        };
        assert_eq!(g.key(), "2016/trip|alice");
        assert_eq!(g.input_dir(), PathBuf::from("/srv/photos/alice/2016/trip"));
        assert_eq!(
            g.output_dir(Path::new("/thumbs")),
            PathBuf::from("/thumbs/alice/2016/trip")
        );
        assert_eq!(
            g.to_string(),
            "[user=alice, root=/srv/photos, source=2016/trip]"
        );
    }

    #[test]
    fn required_flags() {
        let mut d = Data {
            number: 1,
            group: Rc::new(Group {
                user: "u".into(),
                root: PathBuf::new(),
                source: PathBuf::new(),
            }),
            file_name: "a.jpg".into(),
            thumbnail_exists: false,
            thumbnail_created: false,
            error: None,
        };
        assert!(d.required());
        d.thumbnail_created = true;
        assert!(!d.required());
        d.thumbnail_created = false;
        d.error = Some("bad".into());
        assert!(!d.required());
        assert_eq!(d.to_string(), "KEY[|u] bad");
    }

    #[test]
    fn render_command_substitutes_tokens() {
        let line = render_command(
            "convert \"%in\" \"%out\" # %count",
            Path::new("/p/a.jpg"),
            Path::new("/t/x_a.jpg.json"),
            42,
        );
        assert_eq!(line, "convert \"/p/a.jpg\" \"/t/x_a.jpg.json\" #      42");
    }

    // =========================================================================
    // Timestamp derivation
    // =========================================================================

    #[test]
    fn original_beats_datetime() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(
            tmp.path(),
            "a.jpg",
            &jpeg_with_dates(Some(SHOT_AT), Some("2020:01:01 00:00:00"), None),
        );
        let dt = derive_timestamp(&path).unwrap();
        assert_eq!(dt.source, TimestampSource::DateTimeOriginal);
        assert_eq!(dt.format("%y%m%d%H%M%S"), "20161106112918");
    }

    #[test]
    fn datetime_beats_digitized() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(
            tmp.path(),
            "a.jpg",
            &jpeg_with_dates(None, Some("2020:01:02 03:04:05"), Some(SHOT_AT)),
        );
        let dt = derive_timestamp(&path).unwrap();
        assert_eq!(dt.source, TimestampSource::DateTime);
        assert_eq!(dt.format("%y%m%d"), "20200102");
    }

    #[test]
    fn digitized_used_alone() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "a.jpg", &jpeg_with_dates(None, None, Some(SHOT_AT)));
        assert_eq!(
            derive_timestamp(&path).unwrap().source,
            TimestampSource::DateTimeDigitized
        );
    }

    #[test]
    fn implausible_tag_falls_through() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(
            tmp.path(),
            "a.jpg",
            &jpeg_with_dates(Some("0000:00:00 00:00:00"), Some(SHOT_AT), None),
        );
        assert_eq!(
            derive_timestamp(&path).unwrap().source,
            TimestampSource::DateTime
        );
    }

    #[test]
    fn file_name_used_without_exif() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "IMG_20161106_112918.jpg", b"not a jpeg");
        let dt = derive_timestamp(&path).unwrap();
        assert_eq!(dt.source, TimestampSource::FileName);
        assert_eq!(dt.format("%H%M%S"), "112918");
    }

    #[test]
    fn modified_time_is_last_resort() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "photo.jpg", b"not a jpeg");
        assert_eq!(
            derive_timestamp(&path).unwrap().source,
            TimestampSource::Modified
        );
    }

    #[test]
    fn missing_file_is_unresolvable() {
        let tmp = TempDir::new().unwrap();
        let result = derive_timestamp(&tmp.path().join("gone.jpg"));
        assert!(matches!(result, Err(TimestampError::Unresolvable { .. })));
    }

    // =========================================================================
    // Populate
    // =========================================================================

    #[test]
    fn populate_keeps_only_missing() {
        let fx = fixture();
        let prefix = fx.config.example_timestamp();
        let have = fx.thumbs.join("alice/2016");
        write_file(&have, &format!("{prefix}a.jpg.json"), b"{}");

        let files = vec![
            Ok(source(&fx, "alice", "2016", "a.jpg", b"x")),
            Ok(source(&fx, "alice", "2016", "b.jpg", b"x")),
            Ok(source(&fx, "alice", "2017", "c.jpg", b"x")),
        ];
        let mut dict = ThumbnailDict::new(&fx.config);
        dict.populate(files, None);

        assert_eq!(dict.file_count(), 3);
        assert_eq!(dict.missing_count(), 2);
        assert_eq!(dict.count_required(), 2);
        let names: Vec<(&str, usize)> = dict
            .records()
            .iter()
            .map(|d| (d.file_name.as_str(), d.number))
            .collect();
        assert_eq!(names, vec![("b.jpg", 2), ("c.jpg", 3)]);
        assert_eq!(dict.cache_stats().listings, 2);
    }

    #[test]
    fn groups_are_shared() {
        let fx = fixture();
        let files = vec![
            Ok(source(&fx, "bob", "p", "1.jpg", b"x")),
            Ok(source(&fx, "bob", "p", "2.jpg", b"x")),
            Ok(source(&fx, "amy", "p", "3.jpg", b"x")),
        ];
        let mut dict = ThumbnailDict::new(&fx.config);
        dict.populate(files, None);

        let records = dict.records();
        assert!(Rc::ptr_eq(&records[0].group, &records[1].group));
        assert!(!Rc::ptr_eq(&records[0].group, &records[2].group));
        let users: Vec<String> = dict.groups().iter().map(|g| g.user.clone()).collect();
        assert_eq!(users, vec!["amy", "bob"]);
    }

    #[test]
    fn scan_errors_are_counted() {
        let fx = fixture();
        let walk_error = walkdir::WalkDir::new(fx.photos.join("missing"))
            .into_iter()
            .next()
            .unwrap()
            .unwrap_err();
        let files = vec![
            Err(ScanError::Walk {
                user: "ghost".into(),
                path: fx.photos.join("missing"),
                source: walk_error,
            }),
            Ok(source(&fx, "bob", "p", "1.jpg", b"x")),
        ];
        let (tx, rx) = mpsc::channel();
        let mut dict = ThumbnailDict::new(&fx.config);
        dict.populate(files, Some(&tx));
        drop(tx);

        assert_eq!(dict.scan_failures(), 1);
        assert_eq!(dict.file_count(), 1);
        let events: Vec<DictEvent> = rx.iter().collect();
        assert!(matches!(events[0], DictEvent::ScanFailed { .. }));
        assert!(matches!(
            events[1],
            DictEvent::Found {
                number: 1,
                has_thumbnail: false,
                ..
            }
        ));
    }

    // =========================================================================
    // Create missing
    // =========================================================================

    #[test]
    fn create_missing_emits_commands() {
        let fx = fixture();
        let files = vec![Ok(source(
            &fx,
            "alice",
            "2016",
            "a.jpg",
            &jpeg_with_dates(Some(SHOT_AT), None, None),
        ))];
        let mut dict = ThumbnailDict::new(&fx.config);
        dict.populate(files, None);

        let mut lines: Vec<String> = Vec::new();
        let n = dict.create_missing(usize::MAX, &mut lines, None).unwrap();
        assert_eq!(n, 1);

        let out_dir = fx.thumbs.join("alice/2016");
        let input = fx.photos.join("alice/2016/a.jpg");
        let output = out_dir.join("2016_11_06_11_29_18_a.jpg.json");
        assert_eq!(
            lines,
            vec![
                format!("mkdir -p \"{}\"", out_dir.display()),
                format!("gen {} {}", input.display(), output.display()),
                "echo       1".to_string(),
            ]
        );
        assert_eq!(dict.count_required(), 0);
    }

    #[test]
    fn mkdir_once_per_directory() {
        let fx = fixture();
        let files = vec![
            Ok(source(&fx, "u", "d", "IMG_20200101_000000.jpg", b"x")),
            Ok(source(&fx, "u", "d", "IMG_20200101_000001.jpg", b"x")),
        ];
        let mut dict = ThumbnailDict::new(&fx.config);
        dict.populate(files, None);
        let mut lines: Vec<String> = Vec::new();
        dict.create_missing(usize::MAX, &mut lines, None).unwrap();
        assert_eq!(lines.iter().filter(|l| l.starts_with("mkdir")).count(), 1);
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn no_mkdir_for_existing_directory() {
        let fx = fixture();
        fs::create_dir_all(fx.thumbs.join("u/d")).unwrap();
        let files = vec![Ok(source(&fx, "u", "d", "IMG_20200101_000000.jpg", b"x"))];
        let mut dict = ThumbnailDict::new(&fx.config);
        dict.populate(files, None);
        let mut lines: Vec<String> = Vec::new();
        dict.create_missing(usize::MAX, &mut lines, None).unwrap();
        assert!(lines.iter().all(|l| !l.starts_with("mkdir")));
    }

    #[test]
    fn batches_respect_max() {
        let fx = fixture();
        let files: Vec<_> = (0..5)
            .map(|i| Ok(source(&fx, "u", "d", &format!("IMG_2020010{}_000000.jpg", i + 1), b"x")))
            .collect();
        let mut dict = ThumbnailDict::new(&fx.config);
        dict.populate(files, None);

        let mut sink: Vec<String> = Vec::new();
        assert_eq!(dict.create_missing(2, &mut sink, None).unwrap(), 2);
        assert_eq!(dict.count_required(), 3);
        assert_eq!(dict.create_missing(2, &mut sink, None).unwrap(), 2);
        assert_eq!(dict.create_missing(2, &mut sink, None).unwrap(), 1);
        assert_eq!(dict.count_required(), 0);
        assert_eq!(dict.create_missing(2, &mut sink, None).unwrap(), 0);
    }

    #[test]
    fn vanished_file_is_skipped() {
        let fx = fixture();
        let gone = source(&fx, "u", "d", "gone.jpg", b"x");
        let files = vec![Ok(gone.clone()), Ok(source(&fx, "u", "d", "IMG_20200101_000000.jpg", b"x"))];
        let mut dict = ThumbnailDict::new(&fx.config);
        dict.populate(files, None);
        fs::remove_file(gone.path()).unwrap();

        let (tx, rx) = mpsc::channel();
        let mut sink: Vec<String> = Vec::new();
        assert_eq!(dict.create_missing(usize::MAX, &mut sink, Some(&tx)).unwrap(), 1);
        drop(tx);

        assert_eq!(dict.count_required(), 0);
        let failed: Vec<&str> = dict.failures().map(|d| d.file_name.as_str()).collect();
        assert_eq!(failed, vec!["gone.jpg"]);
        let events: Vec<DictEvent> = rx.iter().collect();
        assert!(matches!(events[0], DictEvent::Skipped { .. }));
        assert!(matches!(events[1], DictEvent::Scheduled { number: 2, .. }));
    }

    #[test]
    fn created_thumbnail_is_found_next_run() {
        let fx = fixture();
        let files = || vec![Ok(source(&fx, "u", "d", "IMG_20200101_000000.jpg", b"x"))];
        let mut dict = ThumbnailDict::new(&fx.config);
        dict.populate(files(), None);
        let mut sink: Vec<String> = Vec::new();
        dict.create_missing(usize::MAX, &mut sink, None).unwrap();

        // Play the script's part.
        write_file(&fx.thumbs.join("u/d"), "2020_01_01_00_00_00_IMG_20200101_000000.jpg.json", b"{}");

        let mut again = ThumbnailDict::new(&fx.config);
        again.populate(files(), None);
        assert_eq!(again.missing_count(), 0);
        assert_eq!(again.count_required(), 0);
    }
}
