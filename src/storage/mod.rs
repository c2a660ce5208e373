//! Paged binary storage engine.
//!
//! The index is a single file multiplexing several independent sections:
//! a footer table records where each section starts, each section carries
//! its own length header, and fixed-width record lists inside the
//! sections are read page-by-page through a shared, bounded cache.
//!
//! - [`context`] - sectioned file writer/reader (footer table, bounded sections)
//! - [`record`] - fixed-width serializable record types
//! - [`paged_list`] - random-access record lists and 2D range lists
//! - [`page_cache`] - shared in-memory page cache with FIFO-style eviction

pub mod context;
pub mod encoding;
pub mod page_cache;
pub mod paged_list;
pub mod record;

pub use context::{StorageReader, StorageWriter};
pub use page_cache::{CacheStats, PageCache};
pub use paged_list::{PagedList, PagedList2D, RowView};
pub use record::{FixedStr, Int32, Record, RowRange};
