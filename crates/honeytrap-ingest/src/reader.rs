// [crates/honeytrap-ingest/src/reader.rs]
/*!
 * APARATO: LECTOR DE FUENTES DE EVENTOS
 * RESPONSABILIDAD: DECODIFICACIÓN TRANSPARENTE Y REANUDACIÓN POR OFFSET
 *
 * Plain, gzip (`.gz`) and bzip2 (`.bz2`) sources are all read through the
 * same line iterator. `source_offset` is always a byte offset into the
 * *uncompressed* stream, which is what makes a cursor portable across a log
 * rotation that swaps a plain file for a compressed one. Resuming a
 * compressed source means re-decoding from the start and discarding bytes
 * up to the checkpoint — there's no seek table, so a very large `last_offset`
 * on a multi-gigabyte compressed file costs a full re-decode.
 */

use crate::errors::IngestError;
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::os::unix::fs::MetadataExt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compression {
    Plain,
    Gzip,
    Bzip2,
}

impl Compression {
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Self::Gzip,
            Some("bz2") => Self::Bzip2,
            _ => Self::Plain,
        }
    }
}

pub struct RawLine {
    pub offset: u64,
    pub text: String,
}

pub struct SourceReader {
    reader: Box<dyn BufRead>,
    cursor: u64,
    pub inode: String,
}

impl SourceReader {
    /// Opens `path`, transparently decoding it, and fast-forwards past the
    /// first `resume_from_offset` uncompressed bytes.
    pub fn open(path: &Path, resume_from_offset: u64) -> Result<Self, IngestError> {
        let file = File::open(path).map_err(|e| IngestError::SourceReadFailed(e.to_string()))?;
        let inode = file
            .metadata()
            .map_err(|e| IngestError::SourceReadFailed(e.to_string()))?
            .ino()
            .to_string();

        let boxed: Box<dyn Read> = match Compression::detect(path) {
            Compression::Plain => Box::new(file),
            Compression::Gzip => Box::new(GzDecoder::new(file)),
            Compression::Bzip2 => Box::new(BzDecoder::new(file)),
        };
        let mut reader = BufReader::new(boxed);

        let mut cursor = 0u64;
        if resume_from_offset > 0 {
            skip_bytes(&mut reader, resume_from_offset).map_err(|e| IngestError::SourceReadFailed(e.to_string()))?;
            cursor = resume_from_offset;
        }

        Ok(Self { reader: Box::new(reader), cursor, inode })
    }

    /// Returns the next line (without its terminator) and the offset it
    /// started at, or `None` at end of stream.
    pub fn next_line(&mut self) -> Result<Option<RawLine>, IngestError> {
        let mut buf = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| IngestError::SourceReadFailed(e.to_string()))?;
        if read == 0 {
            return Ok(None);
        }
        let offset = self.cursor;
        self.cursor += read as u64;

        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        let text = String::from_utf8_lossy(&buf).into_owned();
        Ok(Some(RawLine { offset, text }))
    }

    /// Byte offset the next read will start at, for quarantining a line that
    /// failed before a `RawLine` could be produced.
    pub fn current_offset(&self) -> u64 {
        self.cursor
    }
}

fn skip_bytes(reader: &mut impl Read, mut count: u64) -> std::io::Result<()> {
    let mut sink = [0u8; 8192];
    while count > 0 {
        let take = count.min(sink.len() as u64) as usize;
        let read = reader.read(&mut sink[..take])?;
        if read == 0 {
            break;
        }
        count -= read as u64;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_plain_lines_with_byte_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let mut file = File::create(&path).unwrap();
        write!(file, "first\nsecond\n").unwrap();
        drop(file);

        let mut reader = SourceReader::open(&path, 0).unwrap();
        let first = reader.next_line().unwrap().unwrap();
        assert_eq!(first.offset, 0);
        assert_eq!(first.text, "first");

        let second = reader.next_line().unwrap().unwrap();
        assert_eq!(second.offset, 6);
        assert_eq!(second.text, "second");

        assert!(reader.next_line().unwrap().is_none());
    }

    #[test]
    fn resumes_from_a_checkpoint_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let mut file = File::create(&path).unwrap();
        write!(file, "first\nsecond\n").unwrap();
        drop(file);

        let mut reader = SourceReader::open(&path, 6).unwrap();
        let line = reader.next_line().unwrap().unwrap();
        assert_eq!(line.text, "second");
    }

    proptest::proptest! {
        /// Resuming from the byte offset of line `k` must yield exactly the
        /// lines from `k` onward, never re-emitting an already-committed
        /// prefix and never skipping past the next uncommitted line.
        #[test]
        fn resuming_mid_file_never_replays_or_skips_lines(
            lines in proptest::collection::vec("[a-zA-Z0-9 ]{0,24}", 1..12),
            split_seed in 0usize..12,
        ) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("events.log");
            let mut file = File::create(&path).unwrap();
            for line in &lines {
                writeln!(file, "{line}").unwrap();
            }
            drop(file);

            let split_at = split_seed.min(lines.len());
            let resume_offset: u64 = lines[..split_at].iter().map(|l| l.len() as u64 + 1).sum();

            let mut reader = SourceReader::open(&path, resume_offset).unwrap();
            let mut remaining = Vec::new();
            while let Some(line) = reader.next_line().unwrap() {
                remaining.push(line.text);
            }

            proptest::prop_assert_eq!(remaining, lines[split_at..].to_vec());
        }
    }
}
