//! Generation script files.
//!
//! Commands are written to bash scripts named after `ThumbNailsExecFile`.
//! A `%n` in the name becomes the 4-digit script number, so a run split by
//! `ThumbNailsMaxPerFile` produces `gen-0000.sh`, `gen-0001.sh`, ...
//!
//! Every script opens with a header and resets `createdCount`. It closes with
//! a check of `createdCount` against the number of thumbnails scheduled in
//! it; the command templates are expected to increment it. The script exits
//! non-zero when the two disagree.
//!
//! Scripts left over from a previous run (anything matching the name around
//! `%n`) are deleted when the writer is created, and every script is made
//! executable when it finishes.

use crate::dict::CommandSink;
use chrono::Local;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("cannot write script {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Script name for file number `id`.
pub fn script_name(template: &str, id: usize) -> String {
    template.replace("%n", &format!("{id:04}"))
}

/// Lines opening script `id`.
pub fn script_head(id: usize, args: &str, generated_at: &str) -> String {
    format!(
        "#!/bin/bash\n\n\
         # Generated At: {generated_at}\n\
         # Args: {args}\n\
         # ID: {id}\n\
         # HEAD ------------------------------------\n\n\
         createdCount=0\n"
    )
}

/// Lines closing a script that scheduled `required` thumbnails.
pub fn script_tail(required: usize) -> String {
    format!(
        "# TAIL ------------------------------------\n\n\
         echo \"Required: {required} Created $createdCount\"\n\
         if [ \"{required}\" -ne \"$createdCount\" ]; then\n\
         \x20 echo \"Not all files were created\"\n\
         \x20 exit 1\n\
         else\n\
         \x20 echo \"All files were created OK\"\n\
         fi\n"
    )
}

/// Files in the template's directory that look like one of its scripts.
pub fn matching_scripts(template: &str) -> io::Result<Vec<PathBuf>> {
    let template = Path::new(template);
    let dir = match template.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let base = template
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (prefix, suffix) = match base.find("%n") {
        Some(at) => (&base[..at], Some(&base[at + 2..])),
        None => (base.as_str(), None),
    };

    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let matches = match suffix {
            None => name == prefix,
            Some(suffix) => {
                name.len() >= prefix.len() + suffix.len()
                    && name.starts_with(prefix)
                    && name.ends_with(suffix)
            }
        };
        if matches {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

struct OpenScript {
    path: PathBuf,
    out: BufWriter<File>,
    scheduled: usize,
}

impl OpenScript {
    fn create(path: PathBuf, head: &str) -> Result<Self, ScriptError> {
        let file = File::create(&path).map_err(|source| ScriptError::Io {
            path: path.clone(),
            source,
        })?;
        let mut script = Self {
            path,
            out: BufWriter::new(file),
            scheduled: 0,
        };
        script.write_line(head)?;
        info!("script created: {}", script.path.display());
        Ok(script)
    }

    fn write_line(&mut self, line: &str) -> Result<(), ScriptError> {
        writeln!(self.out, "{line}")
            .map_err(|source| ScriptError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn close(mut self) -> Result<PathBuf, ScriptError> {
        self.write_line(&script_tail(self.scheduled))?;
        self.out.flush().map_err(|source| ScriptError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("script closed: {} ({} scheduled)", self.path.display(), self.scheduled);
        Ok(self.path)
    }
}

/// Writes commands into one or more numbered scripts.
pub struct ScriptWriter {
    template: String,
    args: String,
    id: usize,
    current: OpenScript,
    written: Vec<PathBuf>,
}

impl ScriptWriter {
    /// Remove old scripts and open script 0.
    ///
    /// `args` is recorded in every header.
    pub fn create(template: &str, args: &str) -> Result<Self, ScriptError> {
        match matching_scripts(template) {
            Ok(old) => {
                for path in old {
                    match fs::remove_file(&path) {
                        Ok(()) => debug!("removed previous script {}", path.display()),
                        Err(e) => warn!("cannot remove previous script {}: {e}", path.display()),
                    }
                }
            }
            Err(e) => warn!("cannot list previous scripts of {template}: {e}"),
        }
        let current = Self::open(template, args, 0)?;
        Ok(Self {
            template: template.to_string(),
            args: args.to_string(),
            id: 0,
            current,
            written: Vec::new(),
        })
    }

    fn open(template: &str, args: &str, id: usize) -> Result<OpenScript, ScriptError> {
        let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        OpenScript::create(
            PathBuf::from(script_name(template, id)),
            &script_head(id, args, &generated_at),
        )
    }

    pub fn path(&self) -> &Path {
        &self.current.path
    }

    /// Credit `scheduled` thumbnails to the current script and move on to the
    /// next one.
    ///
    /// Without `%n` in the template the next script has the same name, so
    /// output keeps going to the current file.
    pub fn rotate(&mut self, scheduled: usize) -> Result<(), ScriptError> {
        self.current.scheduled += scheduled;
        let next_name = PathBuf::from(script_name(&self.template, self.id + 1));
        if next_name == self.current.path {
            return Ok(());
        }
        self.id += 1;
        let next = Self::open(&self.template, &self.args, self.id)?;
        let done = std::mem::replace(&mut self.current, next);
        self.written.push(done.close()?);
        Ok(())
    }

    /// Close the last script and make every script executable.
    ///
    /// Returns the scripts written by this writer.
    pub fn finish(mut self, scheduled: usize) -> Result<Vec<PathBuf>, ScriptError> {
        self.current.scheduled += scheduled;
        self.written.push(self.current.close()?);
        for path in &self.written {
            make_executable(path)?;
        }
        Ok(self.written)
    }
}

impl CommandSink for ScriptWriter {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        debug!("exec: {line}");
        writeln!(self.current.out, "{line}")
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), ScriptError> {
    use std::os::unix::fs::PermissionsExt;
    debug!("chmod 775 {}", path.display());
    fs::set_permissions(path, fs::Permissions::from_mode(0o775)).map_err(|source| {
        ScriptError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), ScriptError> {
    Ok(())
}
