//! Delimited text output, one `part-NNNNN` file per reduce partition.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::HistogramError;
use crate::histogram::OutputRecord;

/// Marker file written once every partition has been written.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Accepts the records produced by the reduce stage.
pub trait OutputSink {
    fn write(&mut self, record: OutputRecord) -> Result<()>;
}

impl OutputSink for Vec<OutputRecord> {
    fn write(&mut self, record: OutputRecord) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

/// Writes `count<separator>frequency` lines.
pub struct TextSink<W: Write> {
    writer: W,
    separator: String,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W, separator: impl Into<String>) -> Self {
        Self {
            writer,
            separator: separator.into(),
        }
    }

    /// Flushes and hands back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush().context("Failed to flush output")?;
        Ok(self.writer)
    }
}

impl<W: Write> OutputSink for TextSink<W> {
    fn write(&mut self, record: OutputRecord) -> Result<()> {
        writeln!(
            self.writer,
            "{}{}{}",
            record.citation_count, self.separator, record.frequency
        )
        .context("Failed to write output record")
    }
}

/// Name of the file holding reduce partition `partition`.
pub fn part_file_name(partition: u32) -> String {
    format!("part-{:05}", partition)
}

/// Fails if the output directory is already there.
pub fn check_output_absent(dir: &Path) -> Result<(), HistogramError> {
    if dir.exists() {
        return Err(HistogramError::OutputExists(dir.to_path_buf()));
    }
    Ok(())
}

/// Creates the job's output directory, refusing to reuse an existing one.
pub fn create_output_dir(dir: &Path) -> Result<()> {
    check_output_absent(dir)?;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

/// Opens one text sink per partition inside `dir`.
pub fn create_part_sinks(
    dir: &Path,
    partitions: u32,
    separator: &str,
) -> Result<Vec<(PathBuf, TextSink<BufWriter<File>>)>> {
    (0..partitions)
        .map(|partition| {
            let path = dir.join(part_file_name(partition));
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok((path, TextSink::new(BufWriter::new(file), separator)))
        })
        .collect()
}

/// Writes the empty success marker into `dir`.
pub fn mark_success(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(SUCCESS_MARKER);
    File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_sink_renders_delimited_lines() {
        let mut sink = TextSink::new(Vec::new(), "\t");
        sink.write(OutputRecord::new(1, 3)).unwrap();
        sink.write(OutputRecord::new(2, 1)).unwrap();
        let out = sink.finish().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1\t3\n2\t1\n");
    }

    #[test]
    fn text_sink_uses_custom_separator() {
        let mut sink = TextSink::new(Vec::new(), ", ");
        sink.write(OutputRecord::new(5, 1)).unwrap();
        assert_eq!(sink.finish().unwrap(), b"5, 1\n");
    }

    #[test]
    fn part_files_are_zero_padded() {
        assert_eq!(part_file_name(0), "part-00000");
        assert_eq!(part_file_name(12), "part-00012");
    }

    #[test]
    fn missing_output_dir_passes_the_check() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_output_absent(&dir.path().join("out")).is_ok());
        assert!(matches!(
            check_output_absent(dir.path()),
            Err(HistogramError::OutputExists(_))
        ));
    }

    #[test]
    fn existing_output_dir_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_output_dir(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HistogramError>(),
            Some(HistogramError::OutputExists(_))
        ));
    }
}
