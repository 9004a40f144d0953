//! Run configuration.
//!
//! One file describes where the photos are, where thumbnails go, how to
//! generate them, and where to log. JSON is the native format; a file whose
//! name ends in `.toml` is read as TOML with the same keys.
//!
//! ```json
//! {
//!   "ThumbNailsExec": ["convert \"%in\" -thumbnail 200x200 \"%out\"", "echo %count"],
//!   "ThumbNailsExecFile": "%{HOME}/thumbs/gen-%n.sh",
//!   "ThumbNailTimeStamp": "%y_%m_%d_%H_%M_%S_",
//!   "ThumbNailFileSuffix": ".json",
//!   "ThumbNailsRoot": "%{HOME}/thumbs",
//!   "ImageExtensions": [".jpg", ".jpeg"],
//!   "ThumbNailsMaxPerFile": 500,
//!   "Resources": {
//!     "alice": { "ImageRoot": "/srv/photos", "ImagePaths": ["2016", "2017"] }
//!   },
//!   "LogPath": "/var/log/thumbscan",
//!   "LogName": "scan-%y%m%d.log",
//!   "LogConsole": false
//! }
//! ```
//!
//! `%{NAME}` anywhere in the file is replaced with the value of environment
//! variable `NAME` before parsing. Keys also accept their camelCase spelling
//! (`thumbNailsExecFile`). Unknown keys are rejected to catch typos early.
//!
//! Command templates take `%in` (source path), `%out` (thumbnail path) and
//! `%count` (sequence number, right-aligned to 7). The script file name takes
//! `%n`, the 4-digit script number, when output is split with
//! `ThumbNailsMaxPerFile`.

use crate::timestamp::FileDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Syntax of a config file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Photo location of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserResources {
    /// Directory holding one sub-directory per user.
    #[serde(rename = "ImageRoot", alias = "imageRoot")]
    pub image_root: String,
    /// Paths below `<ImageRoot>/<user>` to scan.
    #[serde(rename = "ImagePaths", alias = "imagePaths", default)]
    pub image_paths: Vec<String>,
}

/// One directory tree to scan: `<root>/<user>/<path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPath {
    pub user: String,
    pub root: PathBuf,
    pub path: String,
}

impl UserPath {
    pub fn full_path(&self) -> PathBuf {
        self.root.join(&self.user).join(&self.path)
    }
}

/// Everything a run needs, loaded from one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailConfig {
    /// Command templates, one output line each per thumbnail.
    #[serde(rename = "ThumbNailsExec", alias = "thumbNailsExec")]
    pub exec: Vec<String>,
    /// Script path, optionally with `%n`.
    #[serde(rename = "ThumbNailsExecFile", alias = "thumbNailsExecFile")]
    pub exec_file: String,
    /// Timestamp pattern prefixed to thumbnail names.
    #[serde(rename = "ThumbNailTimeStamp", alias = "thumbNailTimeStamp")]
    pub timestamp_pattern: String,
    #[serde(rename = "ThumbNailFileSuffix", alias = "thumbNailFileSuffix")]
    pub suffix: String,
    #[serde(rename = "ThumbNailsRoot", alias = "thumbNailsRoot")]
    pub thumbnails_root: String,
    /// Case-insensitive name endings to include. Empty means every file.
    #[serde(rename = "ImageExtensions", alias = "imageExtensions")]
    pub image_extensions: Vec<String>,
    /// Thumbnails per script file. Absent means one script.
    #[serde(
        rename = "ThumbNailsMaxPerFile",
        alias = "thumbNailsMaxPerFile",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_per_file: Option<usize>,
    #[serde(rename = "Verbose", alias = "verbose")]
    pub verbose: bool,
    #[serde(rename = "LogPath", alias = "logPath")]
    pub log_path: String,
    /// Log file name pattern, same tokens as the timestamp. Empty disables
    /// the log file.
    #[serde(rename = "LogName", alias = "logName")]
    pub log_name: String,
    /// Also log to the console when a log file is set.
    #[serde(rename = "LogConsole", alias = "logConsole")]
    pub log_console: bool,
    #[serde(rename = "Resources", alias = "resources")]
    pub resources: BTreeMap<String, UserResources>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            exec: Vec::new(),
            exec_file: String::new(),
            timestamp_pattern: "%y_%m_%d_%H_%M_%S_".to_string(),
            suffix: ".json".to_string(),
            thumbnails_root: String::new(),
            image_extensions: Vec::new(),
            max_per_file: None,
            verbose: false,
            log_path: String::new(),
            log_name: String::new(),
            log_console: false,
            resources: BTreeMap::new(),
        }
    }
}

impl ThumbnailConfig {
    /// Check the values a run cannot work without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exec.is_empty() {
            return Err(ConfigError::Validation(
                "ThumbNailsExec must list at least one command".into(),
            ));
        }
        if let Some(i) = self.exec.iter().position(|e| e.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "ThumbNailsExec entry {} is blank",
                i + 1
            )));
        }
        if self.exec_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "ThumbNailsExecFile is not defined".into(),
            ));
        }
        require_dir(&self.thumbnails_root, "ThumbNailsRoot")?;
        if !self.log_name.is_empty() {
            require_dir(&self.log_path, "LogPath")?;
        }
        if self.max_per_file == Some(0) {
            return Err(ConfigError::Validation(
                "ThumbNailsMaxPerFile must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Make every configured path absolute against the working directory.
    pub fn resolve_paths(&mut self) -> Result<(), ConfigError> {
        absolutize(&mut self.thumbnails_root)?;
        absolutize(&mut self.exec_file)?;
        absolutize(&mut self.log_path)?;
        for resources in self.resources.values_mut() {
            absolutize(&mut resources.image_root)?;
        }
        Ok(())
    }

    /// Trees to scan, by user name then configured order.
    pub fn user_paths(&self) -> Vec<UserPath> {
        self.resources
            .iter()
            .flat_map(|(user, res)| {
                res.image_paths.iter().map(move |p| UserPath {
                    user: user.clone(),
                    root: PathBuf::from(&res.image_root),
                    path: p.clone(),
                })
            })
            .collect()
    }

    /// The timestamp pattern applied to the current time. Its length is the
    /// prefix width of every thumbnail name.
    pub fn example_timestamp(&self) -> String {
        FileDateTime::now().format(&self.timestamp_pattern)
    }

    /// Batch size for one script file.
    pub fn batch_size(&self) -> usize {
        self.max_per_file.unwrap_or(usize::MAX)
    }

    /// Log file path for `now`, when a log name is configured.
    pub fn log_file(&self, now: &FileDateTime) -> Option<PathBuf> {
        if self.log_name.is_empty() {
            return None;
        }
        Some(Path::new(&self.log_path).join(now.format(&self.log_name)))
    }
}

fn require_dir(path: &str, key: &str) -> Result<(), ConfigError> {
    if path.is_empty() {
        return Err(ConfigError::Validation(format!("{key} is not defined")));
    }
    if !Path::new(path).is_dir() {
        return Err(ConfigError::Validation(format!(
            "{key} '{path}' is not an existing directory"
        )));
    }
    Ok(())
}

fn absolutize(path: &mut String) -> Result<(), ConfigError> {
    if path.is_empty() {
        return Ok(());
    }
    let abs = std::path::absolute(Path::new(path.as_str()))?;
    *path = abs.to_string_lossy().into_owned();
    Ok(())
}

/// Replace every `%{NAME}` with the value of `NAME`.
pub fn substitute_env<I, K, V>(content: &str, vars: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = content.to_string();
    for (name, value) in vars {
        let token = format!("%{{{}}}", name.as_ref());
        if out.contains(&token) {
            out = out.replace(&token, value.as_ref());
        }
    }
    out
}

/// Parse config text. No environment substitution, no validation.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<ThumbnailConfig, ConfigError> {
    Ok(match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    })
}

/// Load, substitute, resolve and validate the config at `path`.
///
/// `verbose` forces `Verbose` on; it can never switch it off.
pub fn load_config(path: &Path, verbose: bool) -> Result<ThumbnailConfig, ConfigError> {
    let raw = fs::read_to_string(path)?;
    let content = substitute_env(&raw, std::env::vars());
    let mut config = parse_config(&content, ConfigFormat::from_path(path))?;
    config.verbose |= verbose;
    config.resolve_paths()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock config in TOML with all keys.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# thumbscan configuration
# =======================
# Save as <name>.toml (or write the same keys as JSON) and run:
#   thumbscan run <name>.toml
#
# %{NAME} anywhere in this file is replaced by the environment variable NAME.
# Unknown keys will cause an error.

# Commands written to the script for every missing thumbnail.
#   %in    source image path
#   %out   thumbnail path
#   %count sequence number, right-aligned to 7 characters
ThumbNailsExec = [
    "convert \"%in\" -auto-orient -thumbnail 300x300 \"%out\" && createdCount=$((createdCount+1))",
]

# Script to write. %n becomes the script number (0000, 0001, ...) when the
# work is split with ThumbNailsMaxPerFile. Old scripts matching this name
# are deleted at the start of each run.
ThumbNailsExecFile = "%{HOME}/thumbnails/generate-%n.sh"

# Prefix of every thumbnail name, from the capture time of the source.
#   %y year, %m month, %d day, %H hour, %M minute, %S second
#   %? where the time came from: 01 DateTimeOriginal, 02 DateTime,
#      03 DateTimeDigitized, 04 file name, 00 file modification time
ThumbNailTimeStamp = "%y_%m_%d_%H_%M_%S_"

# Appended to every thumbnail name.
ThumbNailFileSuffix = ".json"

# Thumbnails are written to <ThumbNailsRoot>/<user>/<path below the user>.
ThumbNailsRoot = "%{HOME}/thumbnails"

# Only files ending in one of these (any case). Empty means every file.
ImageExtensions = [".jpg", ".jpeg"]

# Thumbnails per script. Omit for a single script.
# ThumbNailsMaxPerFile = 500

# Log every file found, not just the summary.
Verbose = false

# Log file directory and name. The name takes the timestamp tokens above,
# so "scan-%y%m%d.log" starts a new file each day. An empty LogName logs to
# the console only.
LogPath = "%{HOME}/thumbnails"
LogName = ""

# Also log to the console when LogName is set.
LogConsole = false

# ---------------------------------------------------------------------------
# Users: photos are scanned under <ImageRoot>/<user>/<each ImagePaths entry>
# ---------------------------------------------------------------------------
[Resources.alice]
ImageRoot = "/srv/photos"
ImagePaths = ["2016", "2017"]
"##
}
