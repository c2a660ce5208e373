use crate::storage::context::{Section, StorageReader, StorageWriter};
use crate::storage::encoding::write_u32_le;
use crate::storage::page_cache::PageCache;
use crate::storage::record::{Record, RowRange};
use anyhow::{Context, Result, bail};
use std::io::Write;
use std::marker::PhantomData;
use std::sync::Arc;

/// Bytes of section payload before the first record: the u32 row size.
const SECTION_HEADER: u64 = 4;

/// Tracks how many bytes a record actually wrote, so that a serialization
/// not matching the declared row size can be rejected.
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Read-only, random-access sequence of fixed-width records stored in one
/// section of the index file, materialized page-by-page through a shared
/// cache.
pub struct PagedList<T> {
    section: Section,
    cache: Arc<PageCache>,
    list_id: u64,
    row_size: usize,
    count: usize,
    _records: PhantomData<fn() -> T>,
}

impl<T: Record + Clone + Send + Sync + 'static> PagedList<T> {
    /// Serialize `items` as a new section of `row_size`-wide records.
    pub fn write<I>(writer: &mut StorageWriter, row_size: usize, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        if row_size == 0 {
            bail!("cannot write a list with a zero row size");
        }

        let mut out = CountingWriter::new(writer.begin_section()?);
        write_u32_le(&mut out, row_size as u32)?;

        for item in items {
            let before = out.written;
            item.encode(&mut out, row_size)?;

            let written = before + row_size as u64;
            if out.written != written {
                bail!(
                    "record wrote {} bytes into a {} byte cell",
                    out.written - before,
                    row_size
                );
            }
        }

        Ok(())
    }

    /// Reopen the next section of `reader` as a record list.
    pub fn open(reader: &mut StorageReader, cache: Arc<PageCache>) -> Result<Self> {
        let section = reader.next_section()?;

        if section.len() < SECTION_HEADER {
            bail!("record list section is truncated");
        }

        let mut header = [0u8; 4];
        section.read_exact_at(0, &mut header)?;
        let row_size = u32::from_le_bytes(header) as usize;
        if row_size == 0 {
            bail!("record list section declares a zero row size");
        }

        let count = ((section.len() - SECTION_HEADER) / row_size as u64) as usize;
        let list_id = section.start();

        Ok(Self {
            section,
            cache,
            list_id,
            row_size,
            count,
            _records: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Fetch the record at `index`, reading its page on a cache miss.
    pub fn get(&self, index: usize) -> Result<T> {
        if index >= self.count {
            bail!("index {} out of range for a list of {}", index, self.count);
        }

        let records_per_page = self.cache.records_per_page();
        let page_no = index / records_per_page;
        let in_page = index % records_per_page;
        let key = (self.list_id, page_no);

        if let Some(page) = self.cache.lookup::<T>(key) {
            return Ok(page[in_page].clone());
        }

        let page = self.read_page(page_no)?;
        let record = page[in_page].clone();
        self.cache.insert(key, page);
        Ok(record)
    }

    /// Materialize one page, stopping early at the end of the section.
    fn read_page(&self, page_no: usize) -> Result<Vec<T>> {
        let records_per_page = self.cache.records_per_page();
        let first = page_no * records_per_page;
        let records = (self.count - first).min(records_per_page);

        let mut bytes = vec![0u8; records * self.row_size];
        let offset = SECTION_HEADER + (first * self.row_size) as u64;
        self.section.read_exact_at(offset, &mut bytes)?;

        let mut page = Vec::with_capacity(records);
        for mut chunk in bytes.chunks_exact(self.row_size) {
            page.push(T::decode(&mut chunk, self.row_size)?);
        }
        Ok(page)
    }
}

/// A paged list of variable-length row-groups: a list of (start, length)
/// ranges addressing a second, flat list. Occupies two consecutive
/// sections on disk.
pub struct PagedList2D<T> {
    ranges: PagedList<RowRange>,
    values: PagedList<T>,
}

impl<T: Record + Clone + Send + Sync + 'static> PagedList2D<T> {
    /// Flatten `rows` in input order and record each row's range.
    pub fn write(writer: &mut StorageWriter, row_size: usize, rows: &[Vec<T>]) -> Result<()> {
        let mut ranges = Vec::with_capacity(rows.len());
        let mut next = 0u64;
        for row in rows {
            let start = u32::try_from(next).context("2D list exceeds u32 addressing")?;
            let len = u32::try_from(row.len()).context("2D list row exceeds u32 addressing")?;
            ranges.push(RowRange::new(start, len));
            next += row.len() as u64;
        }

        PagedList::write(writer, RowRange::ROW_SIZE, ranges)?;
        PagedList::write(writer, row_size, rows.iter().flatten().cloned())?;
        Ok(())
    }

    /// Reopen the next two sections of `reader` as a 2D list.
    pub fn open(reader: &mut StorageReader, cache: Arc<PageCache>) -> Result<Self> {
        let ranges = PagedList::open(reader, cache.clone())?;
        let values = PagedList::open(reader, cache)?;
        Ok(Self { ranges, values })
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Bounded view of row `index` into the flat value list.
    pub fn row(&self, index: usize) -> Result<RowView<'_, T>> {
        let range = self.ranges.get(index)?;
        RowView::new(&self.values, range)
    }
}

/// A validated window over a flat paged list.
pub struct RowView<'a, T> {
    values: &'a PagedList<T>,
    range: RowRange,
}

impl<'a, T: Record + Clone + Send + Sync + 'static> RowView<'a, T> {
    fn new(values: &'a PagedList<T>, range: RowRange) -> Result<Self> {
        let end = range.start as u64 + range.len as u64;
        if end > values.len() as u64 {
            bail!(
                "row range {}..{} exceeds a value list of {}",
                range.start,
                end,
                values.len()
            );
        }
        Ok(Self { values, range })
    }

    pub fn len(&self) -> usize {
        self.range.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.range.len == 0
    }

    pub fn get(&self, index: usize) -> Result<T> {
        if index >= self.len() {
            bail!("index {} out of range for a row of {}", index, self.len());
        }
        self.values.get(self.range.start as usize + index)
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<T>> + '_ {
        (0..self.len()).map(|index| self.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::record::{FixedStr, Int32};
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("trix_paged_{}_{}", std::process::id(), name))
    }

    fn small_cache() -> Arc<PageCache> {
        Arc::new(PageCache::new(8, 3))
    }

    #[test]
    fn test_int_list_random_access() {
        let path = temp_path("ints.dat");

        let mut writer = StorageWriter::create(&path).unwrap();
        PagedList::write(&mut writer, 4, (0..10u32).map(Int32)).unwrap();
        writer.finish().unwrap();

        let mut reader = StorageReader::open(&path).unwrap();
        let list: PagedList<Int32> = PagedList::open(&mut reader, small_cache()).unwrap();

        assert_eq!(list.len(), 10);
        // Out-of-order access exercises page loads in both directions.
        assert_eq!(list.get(7).unwrap(), Int32(7));
        assert_eq!(list.get(0).unwrap(), Int32(0));
        assert_eq!(list.get(9).unwrap(), Int32(9));
        assert!(list.get(10).is_err());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_string_list_roundtrip() {
        let path = temp_path("strings.dat");
        let words = ["ABC", "DE", "F", "GHIJ"];

        let mut writer = StorageWriter::create(&path).unwrap();
        PagedList::write(&mut writer, 4, words.iter().map(|w| FixedStr::new(*w))).unwrap();
        writer.finish().unwrap();

        let mut reader = StorageReader::open(&path).unwrap();
        let list: PagedList<FixedStr> = PagedList::open(&mut reader, small_cache()).unwrap();

        assert_eq!(list.len(), words.len());
        for (i, word) in words.iter().enumerate() {
            assert_eq!(list.get(i).unwrap().as_str(), *word);
        }

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_cache_serves_repeated_reads() {
        let path = temp_path("cached.dat");

        let mut writer = StorageWriter::create(&path).unwrap();
        PagedList::write(&mut writer, 4, (0..6u32).map(Int32)).unwrap();
        writer.finish().unwrap();

        let cache = small_cache();
        let mut reader = StorageReader::open(&path).unwrap();
        let list: PagedList<Int32> = PagedList::open(&mut reader, cache.clone()).unwrap();

        list.get(0).unwrap();
        list.get(1).unwrap();
        list.get(2).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_wrong_byte_count_aborts_write() {
        // A record that lies about its width.
        #[derive(Clone)]
        struct Short;

        impl Record for Short {
            fn encode<W: Write>(&self, writer: &mut W, _row_size: usize) -> Result<()> {
                writer.write_all(&[0, 1])?;
                Ok(())
            }

            fn decode<R: std::io::Read>(_reader: &mut R, _row_size: usize) -> Result<Self> {
                Ok(Self)
            }
        }

        let path = temp_path("violation.dat");
        let mut writer = StorageWriter::create(&path).unwrap();
        assert!(PagedList::write(&mut writer, 4, vec![Short]).is_err());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_2d_rows_roundtrip() {
        let path = temp_path("rows.dat");
        let rows = vec![
            vec![Int32(5), Int32(6)],
            vec![],
            vec![Int32(7), Int32(8), Int32(9)],
        ];

        let mut writer = StorageWriter::create(&path).unwrap();
        PagedList2D::write(&mut writer, 4, &rows).unwrap();
        writer.finish().unwrap();

        let mut reader = StorageReader::open(&path).unwrap();
        let list: PagedList2D<Int32> = PagedList2D::open(&mut reader, small_cache()).unwrap();

        assert_eq!(list.len(), 3);
        for (i, expected) in rows.iter().enumerate() {
            let row = list.row(i).unwrap();
            assert_eq!(row.len(), expected.len());
            let values: Vec<Int32> = row.iter().collect::<Result<_>>().unwrap();
            assert_eq!(&values, expected);
        }
        assert!(list.row(3).is_err());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_row_view_rejects_invalid_range() {
        let path = temp_path("badrange.dat");

        let mut writer = StorageWriter::create(&path).unwrap();
        // Range claims more values than the flat list holds.
        PagedList::write(&mut writer, RowRange::ROW_SIZE, vec![RowRange::new(0, 5)]).unwrap();
        PagedList::write(&mut writer, 4, vec![Int32(1), Int32(2)]).unwrap();
        writer.finish().unwrap();

        let mut reader = StorageReader::open(&path).unwrap();
        let list: PagedList2D<Int32> = PagedList2D::open(&mut reader, small_cache()).unwrap();
        assert!(list.row(0).is_err());

        std::fs::remove_file(&path).unwrap();
    }
}
