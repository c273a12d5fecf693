//! Records produced by sources
//!
//! A [`Record`] pairs a source-defined path with an exclusively owned,
//! seekable body. Closing a record is dropping it: whoever owns the record
//! owns the underlying handle, so a body can never be closed twice or leaked
//! past its owner.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

/// Byte stream carried by a [`Record`]
pub trait RecordBody: Read + Seek + Send {}

impl<T: Read + Seek + Send> RecordBody for T {}

/// One document discovered by a source
pub struct Record {
    path: String,
    body: Box<dyn RecordBody>,
}

impl Record {
    pub fn new(path: impl Into<String>, body: impl RecordBody + 'static) -> Self {
        Self {
            path: path.into(),
            body: Box::new(body),
        }
    }

    /// Source-defined identifier: a filesystem path, a list entry or `uri#index`
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&mut self) -> &mut dyn RecordBody {
        self.body.as_mut()
    }

    /// Seek the body back to its first byte
    pub fn rewind(&mut self) -> io::Result<()> {
        self.body.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// Read the remainder of the body into memory
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.body.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for Record {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.body.read(buf)
    }
}

impl Seek for Record {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.body.seek(pos)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record").field("path", &self.path).finish_non_exhaustive()
    }
}
