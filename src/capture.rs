//! JSON-lines capture files: one `{"t", "tag", "data"}` object per raw report.
//! A `.gz` suffix selects gzip on both the read and write side.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{MonitorError, Result};
use crate::types::RawReport;

fn is_gz(path: &Path) -> bool {
    path.extension().map(|e| e == "gz").unwrap_or(false)
}

// ─── Writer ──────────────────────────────────────────────────────────────────

enum Sink {
    Plain(BufWriter<File>),
    Gz(GzEncoder<BufWriter<File>>),
}

pub struct CaptureWriter {
    sink: Sink,
    written: u64,
}

impl CaptureWriter {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(File::create(path)?);
        let sink = if is_gz(path) {
            Sink::Gz(GzEncoder::new(file, Compression::default()))
        } else {
            Sink::Plain(file)
        };
        Ok(Self { sink, written: 0 })
    }

    pub fn write(&mut self, report: &RawReport) -> Result<()> {
        let out: &mut dyn Write = match &mut self.sink {
            Sink::Plain(w) => w,
            Sink::Gz(w) => w,
        };
        serde_json::to_writer(&mut *out, report)?;
        out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Flush and close, finishing the gzip trailer if any. Returns the report count.
    pub fn finish(self) -> Result<u64> {
        match self.sink {
            Sink::Plain(mut w) => w.flush()?,
            Sink::Gz(gz) => gz.finish()?.flush()?,
        }
        Ok(self.written)
    }
}

// ─── Reader ──────────────────────────────────────────────────────────────────

/// Streaming reader yielding one report per non-blank line.
pub struct CaptureReader {
    lines: Lines<Box<dyn BufRead + Send>>,
    line_no: usize,
}

impl CaptureReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead + Send> = if is_gz(path) {
            Box::new(BufReader::new(GzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(Self { lines: reader.lines(), line_no: 0 })
    }

    /// Line number of the report last returned
    pub fn line(&self) -> usize {
        self.line_no
    }
}

impl Iterator for CaptureReader {
    type Item = Result<RawReport>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(|e| MonitorError::CaptureFormat {
                line: self.line_no,
                reason: e.to_string(),
            }));
        }
    }
}

/// Load a whole capture into memory.
pub fn read_all(path: &Path) -> Result<Vec<RawReport>> {
    CaptureReader::open(path)?.collect()
}
