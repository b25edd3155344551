//! Transport trace log files.
//!
//! When a session has a trace directory, every request runs in verbose mode
//! and the protocol traffic is appended to `TraceLog_<YYYYMMDD_HH>.txt` in
//! that directory (a new file each hour).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::transport::TraceKind;

const SEPARATOR: &str = "###########################################";

/// Trace file for the duration of one request.
#[derive(Debug)]
pub struct TraceLog {
    path: PathBuf,
    file: File,
}

impl TraceLog {
    /// File name for the current local hour.
    #[must_use]
    pub fn file_name() -> String {
        format!("TraceLog_{}.txt", Local::now().format("%Y%m%d_%H"))
    }

    /// Opens (appending) the current trace file in `directory`.
    ///
    /// Returns `None` and logs a warning if the file cannot be opened; a
    /// missing trace never fails the request itself.
    pub fn open(directory: &Path) -> Option<Self> {
        let path = directory.join(Self::file_name());
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some(Self { path, file }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unable to open trace log");
                None
            }
        }
    }

    /// Path of the trace file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record.
    pub fn record(&mut self, kind: TraceKind, data: &[u8]) {
        let written = self
            .file
            .write_all(kind.label().as_bytes())
            .and_then(|()| self.file.write_all(data));
        if let Err(e) = written {
            tracing::warn!(path = %self.path.display(), error = %e, "Unable to write trace log");
        }
    }

    /// Closes the request's section of the log.
    pub fn finish(mut self) {
        if let Err(e) = writeln!(self.file, "{SEPARATOR}") {
            tracing::warn!(path = %self.path.display(), error = %e, "Unable to write trace log");
        }
    }
}
