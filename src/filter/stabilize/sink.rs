//! Transform stream output
//!
//! The text layout is a comment block recording the settings followed by
//! one `index x y alpha zoom extra` line per frame.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::config::StabilizeParams;
use super::transform::Transform;
use crate::error::{Error, Result};

/// Settings recorded ahead of the transforms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamHeader {
    pub accuracy: u32,
    pub shakiness: u32,
    pub stepsize: usize,
    pub algo: u8,
    pub mincontrast: f64,
    pub result: String,
}

impl StreamHeader {
    pub fn new(params: &StabilizeParams, result: impl Into<String>) -> Self {
        StreamHeader {
            accuracy: params.accuracy,
            shakiness: params.shakiness,
            stepsize: params.step_size,
            algo: params.algo.id(),
            mincontrast: params.min_contrast,
            result: result.into(),
        }
    }
}

/// Consumer of the per-frame transform stream
///
/// The header is written once, then one record per frame in frame order,
/// then `finish`.
pub trait TransformSink {
    fn write_header(&mut self, header: &StreamHeader) -> Result<()>;

    fn write_record(&mut self, index: u64, transform: &Transform) -> Result<()>;

    /// Flush and close the destination
    fn finish(&mut self) -> Result<()>;
}

/// Human-readable text stream
pub struct TextSink<W: Write> {
    writer: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W) -> Self {
        TextSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TransformSink for TextSink<W> {
    fn write_header(&mut self, header: &StreamHeader) -> Result<()> {
        writeln!(self.writer, "#      accuracy = {}", header.accuracy)?;
        writeln!(self.writer, "#     shakiness = {}", header.shakiness)?;
        writeln!(self.writer, "#      stepsize = {}", header.stepsize)?;
        writeln!(self.writer, "#          algo = {}", header.algo)?;
        writeln!(self.writer, "#   mincontrast = {:.6}", header.mincontrast)?;
        writeln!(self.writer, "#        result = {}", header.result)?;
        writeln!(self.writer, "# Transforms")?;
        writeln!(self.writer, "#C FrameNr x y alpha zoom extra")?;
        Ok(())
    }

    fn write_record(&mut self, index: u64, transform: &Transform) -> Result<()> {
        writeln!(self.writer, "{} {}", index, transform)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    pub frame: u64,
    #[serde(flatten)]
    pub transform: Transform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformDocument {
    pub header: Option<StreamHeader>,
    pub transforms: Vec<TransformRecord>,
}

/// Single JSON document written on `finish`
pub struct JsonSink<W: Write> {
    writer: W,
    document: TransformDocument,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        JsonSink {
            writer,
            document: TransformDocument {
                header: None,
                transforms: Vec::new(),
            },
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TransformSink for JsonSink<W> {
    fn write_header(&mut self, header: &StreamHeader) -> Result<()> {
        self.document.header = Some(header.clone());
        Ok(())
    }

    fn write_record(&mut self, index: u64, transform: &Transform) -> Result<()> {
        self.document.transforms.push(TransformRecord {
            frame: index,
            transform: *transform,
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, &self.document)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryRecords {
    header: Option<StreamHeader>,
    records: Vec<(u64, Transform)>,
    finished: bool,
}

/// In-memory sink; clones share the collected stream
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<MemoryRecords>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> Option<StreamHeader> {
        self.lock().header.clone()
    }

    pub fn records(&self) -> Vec<(u64, Transform)> {
        self.lock().records.clone()
    }

    pub fn transforms(&self) -> Vec<Transform> {
        self.lock().records.iter().map(|(_, t)| *t).collect()
    }

    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryRecords> {
        // a poisoned lock still holds consistent records
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TransformSink for MemorySink {
    fn write_header(&mut self, header: &StreamHeader) -> Result<()> {
        self.lock().header = Some(header.clone());
        Ok(())
    }

    fn write_record(&mut self, index: u64, transform: &Transform) -> Result<()> {
        self.lock().records.push((index, *transform));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.lock().finished = true;
        Ok(())
    }
}

/// Create the sink for `path`: JSON for a `.json` extension, text otherwise
pub fn open_sink(path: &Path) -> Result<Box<dyn TransformSink + Send>> {
    let file = File::create(path).map_err(|e| {
        Error::config(
            "result",
            format!("cannot open result file {}: {}", path.display(), e),
        )
    })?;
    let writer = BufWriter::new(file);

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        Ok(Box::new(JsonSink::new(writer)))
    } else {
        Ok(Box::new(TextSink::new(writer)))
    }
}

/// Parse a text transform stream, skipping comments and blank lines
pub fn read_transforms<R: BufRead>(reader: R) -> Result<Vec<(u64, Transform)>> {
    let mut records = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record = parse_record(line)
            .ok_or_else(|| Error::format(format!("line {}: malformed transform '{}'", number + 1, line)))?;
        records.push(record);
    }
    Ok(records)
}

fn parse_record(line: &str) -> Option<(u64, Transform)> {
    let mut parts = line.split_whitespace();
    let index = parts.next()?.parse().ok()?;
    let transform = Transform {
        x: parts.next()?.parse().ok()?,
        y: parts.next()?.parse().ok()?,
        alpha: parts.next()?.parse().ok()?,
        zoom: parts.next()?.parse().ok()?,
        extra: parts.next()?.parse().ok()?,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((index, transform))
}
