//! Record feed for index construction.
//!
//! The index consumes [`Record`]s: one per capability-database section,
//! carrying the section name and its raw key/value pairs. [`IniRecords`]
//! produces them from a browscap-style INI file:
//!
//! ```text
//! ; comment
//! [Mozilla/5.0 (*Linux*) Gecko* Firefox/*]
//! Parent="Firefox Generic"
//! Platform=Linux
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};

/// One parsed section of the capability database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Section name, i.e. the raw pattern.
    pub name: String,
    /// Key/value pairs in declaration order, trimmed and unquoted.
    pub pairs: Vec<(String, String)>,
}

impl Record {
    /// Builds a record from borrowed pairs.
    #[must_use]
    pub fn new(name: impl Into<String>, pairs: &[(&str, &str)]) -> Self {
        Self {
            name: name.into(),
            pairs: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }
}

/// Streaming INI reader yielding one [`Record`] per section.
///
/// Sections without any `key=value` line yield nothing. Key lines that
/// appear before the first section header belong to the unnamed section.
pub struct IniRecords<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
    section: String,
    pairs: Vec<(String, String)>,
    has_keys: bool,
}

impl IniRecords<BufReader<File>> {
    /// Opens an INI file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> IniRecords<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
            section: String::new(),
            pairs: Vec::new(),
            has_keys: false,
        }
    }

    fn take_section(&mut self) -> Option<Record> {
        if !self.has_keys {
            return None;
        }
        self.has_keys = false;
        Some(Record {
            name: self.section.clone(),
            pairs: std::mem::take(&mut self.pairs),
        })
    }
}

impl<R: BufRead> Iterator for IniRecords<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return self.take_section().map(Ok),
                Ok(_) => {}
                Err(e) => return Some(Err(Error::Io(e))),
            }
            self.line_no += 1;

            // Legacy exports carry Latin-1 bytes; decode lossily
            let decoded = String::from_utf8_lossy(&self.buf).into_owned();
            let line = decoded.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.len() >= 2 && line.starts_with('[') && line.ends_with(']') {
                let finished = self.take_section();
                self.section = line[1..line.len() - 1].to_string();
                match finished {
                    Some(record) => return Some(Ok(record)),
                    None => continue,
                }
            }

            let Some((key, value)) = line.split_once('=') else {
                return Some(Err(Error::Load(format!(
                    "line {}: expected '[section]' or 'key=value', got '{}'",
                    self.line_no, line
                ))));
            };

            self.pairs
                .push((key.trim().to_string(), unquote(value.trim()).to_string()));
            self.has_keys = true;
        }
    }
}

/// Strips surrounding double quotes, then surrounding single quotes.
fn unquote(value: &str) -> &str {
    let value = if value.starts_with('"') {
        value.trim_matches('"')
    } else {
        value
    };
    if value.starts_with('\'') {
        value.trim_matches('\'')
    } else {
        value
    }
}
