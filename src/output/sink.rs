//! Append-only text file sink
//!
//! Each record becomes one line `<url>\t<field>\n`, written and flushed under
//! the sink's own lock.

use crate::extract::ExtractedRecord;
use crate::output::{Sink, SinkError};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Formats a record as a single output line, newline included
///
/// Tabs and line breaks inside the field are replaced with spaces so that a
/// record always occupies exactly one line with exactly one tab.
pub fn format_record(record: &ExtractedRecord) -> String {
    let field: String = record
        .field
        .chars()
        .map(|c| match c {
            '\t' | '\r' | '\n' => ' ',
            c => c,
        })
        .collect();

    format!("{}\t{}\n", record.url, field)
}

/// Sink appending to a UTF-8 text file
#[derive(Debug)]
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// Opens `path` for appending, creating it if needed
    ///
    /// Existing content is preserved.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl Sink for FileSink {
    fn append(&self, record: &ExtractedRecord) -> Result<(), SinkError> {
        let line = format_record(record);
        let mut file = self.file.lock().map_err(|_| SinkError::Poisoned)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}
