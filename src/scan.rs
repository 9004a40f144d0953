//! Source enumeration.
//!
//! Walks every configured `<ImageRoot>/<user>/<path>` and yields one
//! [`SourceFile`] per photo:
//!
//! ```text
//! /srv/photos/                 # ImageRoot
//! └── alice/                   # user
//!     └── 2016/                # ImagePaths entry
//!         ├── IMG_0001.jpg     # → source "2016", name "IMG_0001.jpg"
//!         └── trip/
//!             └── IMG_0100.JPG # → source "2016/trip"
//! ```
//!
//! Within a directory, files come before sub-directories and both are sorted
//! by name. All files of one directory are therefore yielded back to back,
//! which keeps the thumbnail existence check at one listing per directory.

use crate::config::{ThumbnailConfig, UserPath};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read {} for user {user}: {source}", path.display())]
    Walk {
        user: String,
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// One photo below a user's resource root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub user: String,
    /// The user's `ImageRoot`.
    pub root: PathBuf,
    /// Directory of the file below `<root>/<user>`.
    pub source: PathBuf,
    pub name: String,
}

impl SourceFile {
    pub fn path(&self) -> PathBuf {
        self.root.join(&self.user).join(&self.source).join(&self.name)
    }
}

/// Case-insensitive file name suffix match. No suffixes matches everything.
#[derive(Debug, Clone, Default)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let name = name.to_lowercase();
        self.extensions.iter().any(|e| name.ends_with(e.as_str()))
    }
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Walk of one user path.
pub struct SourceWalk {
    user: String,
    root: PathBuf,
    user_dir: PathBuf,
    filter: ExtensionFilter,
    inner: walkdir::IntoIter,
}

impl SourceWalk {
    pub fn new(path: &UserPath, filter: ExtensionFilter) -> Self {
        Self {
            user: path.user.clone(),
            root: path.root.clone(),
            user_dir: path.root.join(&path.user),
            filter,
            inner: WalkDir::new(path.full_path())
                .sort_by(files_first)
                .into_iter(),
        }
    }

    fn source_of(&self, file: &Path) -> PathBuf {
        file.parent()
            .and_then(|dir| dir.strip_prefix(&self.user_dir).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

impl Iterator for SourceWalk {
    type Item = Result<SourceFile, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.user_dir.clone());
                    return Some(Err(ScanError::Walk {
                        user: self.user.clone(),
                        path,
                        source,
                    }));
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !self.filter.matches(&name) {
                continue;
            }
            return Some(Ok(SourceFile {
                user: self.user.clone(),
                root: self.root.clone(),
                source: self.source_of(entry.path()),
                name,
            }));
        }
    }
}

/// Every photo of every configured user path, users in name order.
pub fn scan(config: &ThumbnailConfig) -> impl Iterator<Item = Result<SourceFile, ScanError>> {
    let filter = ExtensionFilter::new(&config.image_extensions);
    config
        .user_paths()
        .into_iter()
        .flat_map(move |path| SourceWalk::new(&path, filter.clone()))
}
