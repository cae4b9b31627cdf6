//! Write-ahead log: one JSON record per line, each tagged with a
//! monotonic sequence number. Grounded on `crates/storage/src/wal_tests.rs`
//! (that file's observed API is the only surviving artifact of the
//! original WAL implementation, which was filtered from the retrieval
//! pack by size).

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const FLUSH_THRESHOLD: usize = 100;
const MAX_BACKUPS: u32 = 3;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WalEntry<E> {
    pub seq: u64,
    pub event: E,
}

/// An append-only log of events of type `E`, backed by a single file.
///
/// Each line is `{"seq": N, "event": <json>}`. `Wal::open` replays existing
/// lines to recover `write_seq`, stopping at (and rotating away) the first
/// malformed or non-UTF-8 line it finds — a WAL is append-only, so
/// corruption can only ever be a crashed write at the tail.
pub struct Wal<E> {
    path: PathBuf,
    file: File,
    write_seq: u64,
    processed_seq: u64,
    /// Byte offset of the next line [`Wal::next_unprocessed`] will read.
    /// Distinct from `processed_seq`: this advances on every read, even
    /// past a corrupt line, while `processed_seq` only moves when the
    /// caller explicitly commits via [`Wal::mark_processed`].
    read_pos: u64,
    unflushed: usize,
    _marker: std::marker::PhantomData<E>,
}

impl<E> Wal<E>
where
    E: Serialize + DeserializeOwned + Clone,
{
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let write_seq = Self::recover(&path)?;
        let read_pos = Self::byte_offset_after_seq(&path, processed_seq)?;

        let file = OpenOptions::new().create(true).append(true).read(true).open(&path)?;

        Ok(Self { path, file, write_seq, processed_seq, read_pos, unflushed: 0, _marker: std::marker::PhantomData })
    }

    /// Byte offset of the first entry with `seq > floor`, on an
    /// already-recovered (corruption-free) file. Used to seed the read
    /// cursor so that reopening past a processed-seq marker (or a
    /// snapshot that already subsumed everything up to `floor`) skips
    /// straight to the first unconsumed entry, even if entries at or
    /// below `floor` are no longer physically present (compacted away).
    fn byte_offset_after_seq(path: &Path, floor: u64) -> Result<u64, WalError> {
        if floor == 0 || !path.exists() {
            return Ok(0);
        }
        let raw = std::fs::read(path)?;
        let mut offset = 0u64;
        for raw_line in raw.split_inclusive(|&b| b == b'\n') {
            if raw_line.is_empty() {
                continue;
            }
            let content = raw_line.strip_suffix(b"\n").unwrap_or(raw_line);
            if content.is_empty() {
                offset += raw_line.len() as u64;
                continue;
            }
            let Ok(line) = std::str::from_utf8(content) else { break };
            match serde_json::from_str::<WalEntry<E>>(line) {
                Ok(entry) if entry.seq > floor => return Ok(offset),
                Ok(_) => offset += raw_line.len() as u64,
                Err(_) => break,
            }
        }
        Ok(offset)
    }

    /// Scan the file for the highest valid seq, rotating out any trailing
    /// corruption into a `.bak` file (keeping at most [`MAX_BACKUPS`]
    /// generations) and rewriting the file with only the valid prefix.
    fn recover(path: &Path) -> Result<u64, WalError> {
        if !path.exists() {
            return Ok(0);
        }

        let raw = std::fs::read(path)?;

        let mut valid_lines = Vec::new();
        let mut write_seq = 0u64;
        let mut corrupt = false;

        for raw_line in raw.split(|&b| b == b'\n') {
            if raw_line.is_empty() {
                continue;
            }
            let Ok(line) = std::str::from_utf8(raw_line) else {
                corrupt = true;
                break;
            };
            match serde_json::from_str::<WalEntry<E>>(line) {
                Ok(entry) => {
                    write_seq = entry.seq;
                    valid_lines.push(line.to_string());
                }
                Err(_) => {
                    corrupt = true;
                    break;
                }
            }
        }

        if corrupt {
            rotate_backups(path)?;
            std::fs::rename(path, path.with_extension("bak"))?;
            let mut rewritten = BufWriter::new(File::create(path)?);
            for line in &valid_lines {
                writeln!(rewritten, "{line}")?;
            }
            rewritten.flush()?;
        }

        Ok(write_seq)
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn needs_flush(&self) -> bool {
        self.unflushed >= FLUSH_THRESHOLD
    }

    pub fn append(&mut self, event: &E) -> Result<u64, WalError> {
        self.write_seq += 1;
        let entry = WalEntry { seq: self.write_seq, event: event.clone() };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.file, "{line}")?;
        self.unflushed += 1;
        Ok(self.write_seq)
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.unflushed = 0;
        Ok(())
    }

    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = self.processed_seq.max(seq);
    }

    /// Return the next entry at the read cursor, or `None` if caught up to
    /// the end of the file. A corrupt line at the cursor is skipped (the
    /// cursor advances past it) and this call returns `None`, so the
    /// consumer loop simply tries again rather than getting stuck forever.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry<E>>, WalError> {
        let mut file = self.file.try_clone()?;
        file.seek(SeekFrom::Start(self.read_pos))?;
        let mut reader = BufReader::new(file);
        let mut raw_line = Vec::new();
        let read = reader.read_until(b'\n', &mut raw_line)?;
        if read == 0 {
            return Ok(None);
        }
        self.read_pos += read as u64;

        let content = raw_line.strip_suffix(b"\n").unwrap_or(&raw_line);
        if content.is_empty() {
            return Ok(None);
        }
        let Ok(line) = std::str::from_utf8(content) else { return Ok(None) };
        match serde_json::from_str::<WalEntry<E>>(line) {
            Ok(entry) => Ok(Some(entry)),
            Err(_) => Ok(None),
        }
    }

    pub fn entries_after(&self, seq: u64) -> Result<Vec<WalEntry<E>>, WalError> {
        Ok(self.read_all()?.into_iter().filter(|e| e.seq > seq).collect())
    }

    /// Compact the file to only entries with `seq >= floor`, archiving the
    /// discarded prefix as a zstd-compressed sibling file rather than
    /// discarding it outright.
    pub fn truncate_before(&mut self, floor: u64) -> Result<(), WalError> {
        let all = self.read_all()?;
        let (discarded, kept): (Vec<_>, Vec<_>) = all.into_iter().partition(|e| e.seq < floor);

        if !discarded.is_empty() {
            let archive_path = self.path.with_extension(format!("archive.{floor}.zst"));
            let mut archive = Vec::new();
            for entry in &discarded {
                let line = serde_json::to_string(entry)?;
                archive.extend_from_slice(line.as_bytes());
                archive.push(b'\n');
            }
            let compressed = zstd::encode_all(archive.as_slice(), 0)?;
            std::fs::write(archive_path, compressed)?;
        }

        let mut rewritten = BufWriter::new(File::create(&self.path)?);
        for entry in &kept {
            writeln!(rewritten, "{}", serde_json::to_string(entry)?)?;
        }
        rewritten.flush()?;

        self.file = OpenOptions::new().create(true).append(true).read(true).open(&self.path)?;
        self.unflushed = 0;
        self.read_pos = Self::byte_offset_after_seq(&self.path, self.processed_seq.max(floor.saturating_sub(1)))?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<WalEntry<E>>, WalError> {
        let mut file = self.file.try_clone()?;
        file.seek(SeekFrom::Start(0))?;
        let mut reader = BufReader::new(file);
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;

        let mut entries = Vec::new();
        for raw_line in raw.split(|&b| b == b'\n') {
            if raw_line.is_empty() {
                continue;
            }
            let Ok(line) = std::str::from_utf8(raw_line) else { break };
            match serde_json::from_str::<WalEntry<E>>(line) {
                Ok(entry) => entries.push(entry),
                Err(_) => break,
            }
        }
        Ok(entries)
    }
}

fn rotate_backups(path: &Path) -> Result<(), WalError> {
    for gen in (2..=MAX_BACKUPS).rev() {
        let from = if gen == 2 { path.with_extension("bak") } else { path.with_extension(format!("bak.{}", gen - 1)) };
        let to = path.with_extension(format!("bak.{gen}"));
        if from.exists() {
            std::fs::rename(from, to)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
