//! Output framing for `iterate emit`

use std::io::{self, Read, Write};

/// How emitted records are framed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Bodies back to back
    #[default]
    Raw,
    /// `[body,body,...]`
    Json,
    /// `{"type":"FeatureCollection","features":[body,body,...]}`
    GeoJson,
}

impl OutputFormat {
    fn header(self) -> &'static [u8] {
        match self {
            OutputFormat::Raw => b"",
            OutputFormat::Json => b"[",
            OutputFormat::GeoJson => br#"{"type":"FeatureCollection","features":["#,
        }
    }

    fn separator(self) -> &'static [u8] {
        match self {
            OutputFormat::Raw => b"",
            OutputFormat::Json | OutputFormat::GeoJson => b",",
        }
    }

    fn footer(self) -> &'static [u8] {
        match self {
            OutputFormat::Raw => b"",
            OutputFormat::Json => b"]",
            OutputFormat::GeoJson => b"]}",
        }
    }
}

/// Writes record bodies to `W`, counting records and bytes
pub struct RecordWriter<W: Write> {
    out: W,
    format: OutputFormat,
    records: u64,
    bytes: u64,
}

impl<W: Write> RecordWriter<W> {
    /// Create a writer and emit the opening frame
    pub fn new(mut out: W, format: OutputFormat) -> io::Result<Self> {
        let header = format.header();
        out.write_all(header)?;

        Ok(Self {
            out,
            format,
            records: 0,
            bytes: header.len() as u64,
        })
    }

    /// Copy one body
    pub fn write_record(&mut self, body: &mut impl Read) -> io::Result<()> {
        if self.records > 0 {
            let separator = self.format.separator();
            self.out.write_all(separator)?;
            self.bytes += separator.len() as u64;
        }

        self.bytes += io::copy(body, &mut self.out)?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    /// Emit the closing frame and flush, returning the bytes written
    pub fn finish(mut self) -> io::Result<u64> {
        let footer = self.format.footer();
        self.out.write_all(footer)?;
        self.out.flush()?;
        Ok(self.bytes + footer.len() as u64)
    }
}
