//! Sectioned storage context: one physical file carrying several
//! independently sized binary sections.
//!
//! Layout: byte 0 holds the footer offset (u64). Each section starts with
//! an 8-byte length header that is backpatched when the next section
//! begins, or at finish for the last one. The footer is a section count
//! (u32) followed by each section's header offset (u64), appended at the
//! end of the file.

use crate::storage::encoding::{read_u32_le, read_u64_le, write_u32_le, write_u64_le};
use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Width of the section length header and of the footer offset slot.
const LENGTH_HEADER: u64 = 8;

/// Writes a sequence of sections into one storage file.
pub struct StorageWriter {
    file: BufWriter<File>,
    open_section: Option<u64>,
    section_offsets: Vec<u64>,
}

impl StorageWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create storage file {}", path.display()))?;
        let mut file = BufWriter::new(file);

        // Reserve the footer offset slot at the start of the file.
        write_u64_le(&mut file, 0)?;

        Ok(Self {
            file,
            open_section: None,
            section_offsets: Vec::new(),
        })
    }

    /// Close the current section (if any) and start a new one. Returns the
    /// writer positioned just past the new section's length header.
    pub fn begin_section(&mut self) -> Result<&mut BufWriter<File>> {
        self.close_open_section()?;

        let header_pos = self.file.stream_position()?;
        write_u64_le(&mut self.file, 0)?;
        self.open_section = Some(header_pos);

        Ok(&mut self.file)
    }

    /// Backpatch the open section's length header with its payload size.
    fn close_open_section(&mut self) -> Result<()> {
        if let Some(header_pos) = self.open_section.take() {
            let end = self.file.stream_position()?;

            self.file.seek(SeekFrom::Start(header_pos))?;
            write_u64_le(&mut self.file, end - header_pos - LENGTH_HEADER)?;
            self.file.seek(SeekFrom::Start(end))?;

            self.section_offsets.push(header_pos);
        }
        Ok(())
    }

    /// Close the final section, append the footer, and backpatch the
    /// footer offset at byte 0. Must be called for the file to be readable.
    pub fn finish(mut self) -> Result<()> {
        self.close_open_section()?;

        let footer_pos = self.file.stream_position()?;
        write_u32_le(&mut self.file, self.section_offsets.len() as u32)?;
        for &offset in &self.section_offsets {
            write_u64_le(&mut self.file, offset)?;
        }

        self.file.seek(SeekFrom::Start(0))?;
        write_u64_le(&mut self.file, footer_pos)?;

        self.file.flush()?;
        Ok(())
    }
}

/// The underlying file of a loaded index, shared by every list reading
/// from it. Access is serialized: readers seek and read under one lock.
pub(crate) struct SharedFile {
    file: Mutex<File>,
}

/// A bounded view of one section. Reads cannot cross the section boundary.
pub struct Section {
    shared: Arc<SharedFile>,
    start: u64,
    len: u64,
}

impl Section {
    /// Payload offset inside the storage file; unique per section, used as
    /// the owning-list identity for page cache keys.
    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read exactly `buf.len()` bytes at `offset` within the section.
    pub fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        if offset.saturating_add(buf.len() as u64) > self.len {
            bail!(
                "read of {} bytes at offset {} crosses the section boundary ({} bytes)",
                buf.len(),
                offset,
                self.len
            );
        }

        let mut file = self.shared.file.lock().unwrap();
        file.seek(SeekFrom::Start(self.start + offset))?;
        file.read_exact(buf)?;
        Ok(())
    }
}

/// Reads the sections of a storage file in the order they were written.
pub struct StorageReader {
    shared: Arc<SharedFile>,
    section_offsets: Vec<u64>,
    file_len: u64,
    next_section: usize,
}

impl StorageReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)
            .with_context(|| format!("failed to open storage file {}", path.display()))?;
        let file_len = file.metadata()?.len();

        if file_len < LENGTH_HEADER {
            bail!("storage file is truncated ({} bytes)", file_len);
        }

        let footer_pos = read_u64_le(&mut file)?;
        if footer_pos < LENGTH_HEADER || footer_pos.saturating_add(4) > file_len {
            bail!("storage file has an invalid footer offset {}", footer_pos);
        }

        file.seek(SeekFrom::Start(footer_pos))?;
        let count = read_u32_le(&mut file)? as u64;
        if footer_pos.saturating_add(4 + count * 8) > file_len {
            bail!("storage file footer is truncated");
        }

        let mut section_offsets = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let offset = read_u64_le(&mut file)?;
            if offset < LENGTH_HEADER || offset.saturating_add(LENGTH_HEADER) > footer_pos {
                bail!("storage file has an invalid section offset {}", offset);
            }
            section_offsets.push(offset);
        }

        Ok(Self {
            shared: Arc::new(SharedFile {
                file: Mutex::new(file),
            }),
            section_offsets,
            file_len,
            next_section: 0,
        })
    }

    pub fn section_count(&self) -> usize {
        self.section_offsets.len()
    }

    /// Open the next section in write order.
    pub fn next_section(&mut self) -> Result<Section> {
        let Some(&header_pos) = self.section_offsets.get(self.next_section) else {
            bail!(
                "no section {} in a storage file of {} sections",
                self.next_section,
                self.section_offsets.len()
            );
        };
        self.next_section += 1;

        let len = {
            let mut file = self.shared.file.lock().unwrap();
            file.seek(SeekFrom::Start(header_pos))?;
            read_u64_le(&mut *file)?
        };

        let start = header_pos + LENGTH_HEADER;
        if len.saturating_add(start) > self.file_len {
            bail!("section at offset {} extends past the end of the file", header_pos);
        }

        Ok(Section {
            shared: self.shared.clone(),
            start,
            len,
        })
    }
}
