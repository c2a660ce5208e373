use crate::storage::encoding::{read_u32_le, write_u32_le};
use anyhow::{Result, bail};
use std::io::{Read, Write};

/// A fixed-width binary record stored inside one section of the index file.
///
/// `row_size` is the cell width declared by the owning list. Padded types
/// fill the cell up to that width; strict fixed-size types reject any
/// other width on both read and write.
pub trait Record: Sized {
    fn encode<W: Write>(&self, writer: &mut W, row_size: usize) -> Result<()>;

    fn decode<R: Read>(reader: &mut R, row_size: usize) -> Result<Self>;
}

/// A string stored at one byte per character, NUL-padded to the row size.
/// Decoding stops at the first NUL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedStr {
    value: String,
}

impl FixedStr {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl Record for FixedStr {
    fn encode<W: Write>(&self, writer: &mut W, row_size: usize) -> Result<()> {
        let bytes = self.value.as_bytes();
        if bytes.len() > row_size {
            bail!(
                "string of {} bytes does not fit a {} byte row",
                bytes.len(),
                row_size
            );
        }

        writer.write_all(bytes)?;
        for _ in bytes.len()..row_size {
            writer.write_all(&[0])?;
        }
        Ok(())
    }

    fn decode<R: Read>(reader: &mut R, row_size: usize) -> Result<Self> {
        let mut buf = vec![0u8; row_size];
        reader.read_exact(&mut buf)?;

        let end = buf.iter().position(|&b| b == 0).unwrap_or(row_size);
        buf.truncate(end);

        let value = String::from_utf8(buf)?;
        Ok(Self { value })
    }
}

/// A 32-bit integer record. The row size must be exactly 4 bytes; anything
/// else signals an incompatible or corrupted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Int32(pub u32);

impl Record for Int32 {
    fn encode<W: Write>(&self, writer: &mut W, row_size: usize) -> Result<()> {
        if row_size != 4 {
            bail!("integer records require a 4 byte row, got {}", row_size);
        }
        write_u32_le(writer, self.0)?;
        Ok(())
    }

    fn decode<R: Read>(reader: &mut R, row_size: usize) -> Result<Self> {
        if row_size != 4 {
            bail!("integer records require a 4 byte row, got {}", row_size);
        }
        Ok(Self(read_u32_le(reader)?))
    }
}

/// A (start, length) range record addressing a slice of a flat list.
/// The row size must be exactly 8 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: u32,
    pub len: u32,
}

impl RowRange {
    /// On-disk width of a range record.
    pub const ROW_SIZE: usize = 8;

    pub fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }
}

impl Record for RowRange {
    fn encode<W: Write>(&self, writer: &mut W, row_size: usize) -> Result<()> {
        if row_size != Self::ROW_SIZE {
            bail!("range records require an 8 byte row, got {}", row_size);
        }
        write_u32_le(writer, self.start)?;
        write_u32_le(writer, self.len)?;
        Ok(())
    }

    fn decode<R: Read>(reader: &mut R, row_size: usize) -> Result<Self> {
        if row_size != Self::ROW_SIZE {
            bail!("range records require an 8 byte row, got {}", row_size);
        }
        let start = read_u32_le(reader)?;
        let len = read_u32_le(reader)?;
        Ok(Self { start, len })
    }
}
