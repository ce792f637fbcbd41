//! Append-only per-cycle data log.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::types::LogRecord;

pub trait RecordSink {
    fn emit(&mut self, record: &LogRecord) -> io::Result<()>;
}

/// Appends one line per record, flushed and synced before `emit` returns so
/// a crash never loses a written cycle.
pub struct FileLogger {
    path: PathBuf,
    file: File,
    echo: bool,
}

impl FileLogger {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file,
            echo: false,
        })
    }

    /// Also print each line to stdout.
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for FileLogger {
    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        if self.echo {
            println!("{record}");
        }
        writeln!(self.file, "{record}")?;
        self.file.flush()?;
        self.file.sync_all()
    }
}
