//! Attachable trace destinations.
//!
//! A [`TraceSink`] owns one open destination file and the recorder writing
//! to it. It exists only between attach and detach; the session stores it as
//! an `Option`, so "not tracing" is a real state rather than a null check.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::waveform::{
    JsonLinesRecorder, TraceEntry, TraceLayout, TraceOutput, TraceRecorder, VcdRecorder,
};

/// On-disk trace format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormat {
    /// Value Change Dump (IEEE 1364).
    Vcd,
    /// One JSON object per line.
    #[serde(rename = "jsonl")]
    JsonLines,
}

impl TraceFormat {
    /// Picks a format from the destination's extension, ignoring a trailing
    /// `.gz`. Anything not recognized as JSON is traced as VCD.
    pub fn from_path(path: &Path) -> Self {
        let stem_path = if is_gzip(path) {
            Path::new(path.file_stem().unwrap_or_default())
        } else {
            path
        };
        match stem_path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("json") => TraceFormat::JsonLines,
            _ => TraceFormat::Vcd,
        }
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "gz")
}

/// Buffered trace file, optionally gzip-compressed.
pub enum TraceWriter {
    /// Uncompressed output.
    Plain(BufWriter<File>),
    /// Gzip output; the trailer is written by [`TraceOutput::finish`].
    Gzip(GzEncoder<BufWriter<File>>),
}

impl TraceWriter {
    /// Creates (truncating) `path`, compressing when it ends in `.gz`.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(if is_gzip(path) {
            TraceWriter::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            TraceWriter::Plain(file)
        })
    }
}

impl Write for TraceWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            TraceWriter::Plain(w) => w.write(buf),
            TraceWriter::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            TraceWriter::Plain(w) => w.flush(),
            TraceWriter::Gzip(w) => w.flush(),
        }
    }
}

impl TraceOutput for TraceWriter {
    fn finish(&mut self) -> io::Result<()> {
        match self {
            TraceWriter::Plain(w) => w.flush(),
            TraceWriter::Gzip(w) => {
                w.try_finish()?;
                w.get_mut().flush()
            }
        }
    }
}

/// An open trace destination.
pub struct TraceSink {
    path: PathBuf,
    depth: u32,
    recorder: Box<dyn TraceRecorder>,
}

impl TraceSink {
    /// Opens `path` and writes the format header.
    ///
    /// `bank_len` is the number of bank registers recorded at depth 2 and
    /// above. `format` of `None` infers the format from the extension.
    pub fn attach(
        path: impl AsRef<Path>,
        depth: u32,
        format: Option<TraceFormat>,
        bank_len: usize,
    ) -> Result<Self, SimError> {
        let path = path.as_ref().to_path_buf();
        let format = format.unwrap_or_else(|| TraceFormat::from_path(&path));
        let writer = TraceWriter::create(&path)?;
        let layout = TraceLayout { depth, bank_len };
        let mut recorder: Box<dyn TraceRecorder> = match format {
            TraceFormat::Vcd => Box::new(VcdRecorder::new(writer, layout)),
            TraceFormat::JsonLines => Box::new(JsonLinesRecorder::new(writer, layout)),
        };
        recorder.begin()?;
        debug!(
            "tracing to {} ({format:?}, depth {depth})",
            path.display()
        );
        Ok(Self {
            path,
            depth,
            recorder,
        })
    }

    /// Appends one step.
    pub fn record(&mut self, entry: &TraceEntry<'_>) -> Result<(), SimError> {
        self.recorder.record(entry)
    }

    /// Flushes and finalizes the destination, closing the file.
    pub fn detach(mut self) -> Result<(), SimError> {
        let result = self.recorder.finalize();
        debug!(
            "closed trace {} after {} entries",
            self.path.display(),
            self.recorder.entries()
        );
        result
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hierarchy depth being recorded.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Entries recorded so far.
    pub fn entries(&self) -> u64 {
        self.recorder.entries()
    }
}
