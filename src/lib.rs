//! # thumbscan
//!
//! Finds the photos in a set of per-user directory trees that have no
//! thumbnail yet and writes shell scripts that generate them. The scan never
//! touches the photos or the thumbnails itself; the scripts do the work, so
//! they can be reviewed, split across machines, or run at night.
//!
//! # Architecture
//!
//! ```text
//! config.json ─→ scan ─→ dict ─→ script(s)
//!                          │
//!                          ├─ cache       one listing per thumbnail directory
//!                          └─ exif        capture time of each missing photo
//! ```
//!
//! A thumbnail is named after the capture moment of its photo
//! (`2016_11_06_11_29_18_IMG_0001.jpg.json`). Re-running only schedules the
//! photos whose name is not yet present in the matching thumbnail directory.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | JSON/TOML config loading, `%{VAR}` substitution, validation |
//! | [`scan`] | Walks `<ImageRoot>/<user>/<path>` and yields source files |
//! | [`cache`] | Thumbnail directory listings, one per directory |
//! | [`exif`] | Lazy JPEG/EXIF decoder: header checks, IFD walk, tag catalog |
//! | [`timestamp`] | Capture moments, digit-spec parsing, `%` pattern formatting |
//! | [`dict`] | Missing-thumbnail records, timestamp policy, command batches |
//! | [`script`] | Numbered bash scripts with head/tail checks |
//! | [`run`] | Ties a complete scan together |
//! | [`logging`] | `tracing` subscriber with the dated log file |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Reading only what is needed
//!
//! The EXIF decoder pulls bytes from the file in small chunks as the walk
//! reaches them. A capture time usually sits in the first few kilobytes, so a
//! scan over many thousands of photos reads a small fraction of the data.
//! Cursors into the buffer are cheap clones sharing one store, so following a
//! sub-directory never copies bytes.
//!
//! ## One bad photo never stops a run
//!
//! Every structural problem in a file is a typed [`exif::DecodeError`]
//! returned from the one decode entry point. The run logs it, falls back to
//! the next time stamp source, and moves on. Only config and script file
//! errors end a run.
//!
//! ## Single-threaded
//!
//! Work per photo is a few small reads. The shared buffer is `Rc<RefCell<_>>`,
//! which keeps the decoder on one thread at compile time.

pub mod cache;
pub mod config;
pub mod dict;
pub mod exif;
pub mod logging;
pub mod output;
pub mod run;
pub mod scan;
pub mod script;
pub mod timestamp;

#[cfg(test)]
pub(crate) mod test_helpers;
