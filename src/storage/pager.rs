use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::error::{DbError, DbResult};
use crate::storage::page::PAGE_SIZE;

/// A single 4 KiB page of data.
pub struct Page {
    pub data: [u8; PAGE_SIZE],
}

impl Page {
    pub fn new() -> Self {
        Page { data: [0; PAGE_SIZE] }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new()
    }
}

/// Pager: maps page numbers onto 4 KiB blocks of the database file and keeps
/// every page it has touched in memory until `close`.
pub struct Pager {
    file: File,

    /// Length of the file in bytes when it was opened.
    file_length: u64,

    /// The total number of pages the pager knows about, on disk or only in memory.
    num_pages: u32,

    /// Hard cap on `num_pages`.
    max_pages: u32,

    /// `cache[page_num] = Some(page)` once that page has been touched.
    cache: Vec<Option<Box<Page>>>,
}

impl Pager {
    /// Open (or create) the database file at `path`.
    ///
    /// Fails if the file is not a whole number of pages, or holds more pages than `max_pages`.
    pub fn open<P: AsRef<Path>>(path: P, max_pages: u32) -> DbResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let file_length = file.metadata()?.len();

        if file_length % PAGE_SIZE as u64 != 0 {
            return Err(DbError::Corrupt(format!(
                "db file is not a whole number of pages ({} bytes)",
                file_length
            )));
        }
        let file_pages = file_length / PAGE_SIZE as u64;
        if file_pages > max_pages as u64 {
            return Err(DbError::Corrupt(format!(
                "db file holds {} pages, more than the limit of {}",
                file_pages, max_pages
            )));
        }

        debug!("Opened {} with {} pages on disk.", path.display(), file_pages);

        Ok(Pager {
            file,
            file_length,
            num_pages: file_pages as u32,
            max_pages,
            cache: Vec::new(),
        })
    }

    /// Return a mutable reference to the requested page, loading it from disk on first use.
    ///
    /// Pages beyond the file's extent start zeroed. Asking for a page past the
    /// current count extends the count.
    pub fn get_page(&mut self, page_num: u32) -> DbResult<&mut Page> {
        if page_num >= self.max_pages {
            return Err(DbError::PageOutOfBounds {
                page_num,
                max_pages: self.max_pages,
            });
        }

        let index = page_num as usize;
        if self.cache.len() <= index {
            self.cache.resize_with(index + 1, || None);
        }

        if self.cache[index].is_none() {
            let mut page = Box::new(Page::new());
            let offset = page_num as u64 * PAGE_SIZE as u64;
            if offset < self.file_length {
                debug!("Loading page {} from disk.", page_num);
                self.file.seek(SeekFrom::Start(offset))?;
                read_up_to(&mut self.file, &mut page.data)?;
            }
            self.cache[index] = Some(page);
        }

        if page_num >= self.num_pages {
            self.num_pages = page_num + 1;
        }

        let page = self.cache[index].get_or_insert_with(|| Box::new(Page::new()));
        Ok(&mut **page)
    }

    /// The next page number that has never been handed out.
    pub fn unused_page_num(&self) -> u32 {
        self.num_pages
    }

    /// Claim the next unused page, zeroed. Fails once `max_pages` pages exist.
    pub fn allocate_page(&mut self) -> DbResult<u32> {
        let page_num = self.unused_page_num();
        if page_num >= self.max_pages {
            return Err(DbError::CapacityExhausted {
                max_pages: self.max_pages,
            });
        }
        self.get_page(page_num)?;
        debug!("Allocated page {}.", page_num);
        Ok(page_num)
    }

    /// Write the first `size` bytes of cached page `page_num` to its slot in the file.
    pub fn flush(&mut self, page_num: u32, size: usize) -> DbResult<()> {
        if size > PAGE_SIZE {
            return Err(DbError::InvalidValue(format!(
                "flush of {} bytes exceeds the page size of {}",
                size, PAGE_SIZE
            )));
        }
        let page = self
            .cache
            .get(page_num as usize)
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| DbError::Corrupt(format!("tried to flush uncached page {}", page_num)))?;

        let offset = page_num as u64 * PAGE_SIZE as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&page.data[..size])?;

        let end = offset + size as u64;
        if end > self.file_length {
            self.file_length = end;
        }
        Ok(())
    }

    pub fn flush_page(&mut self, page_num: u32) -> DbResult<()> {
        self.flush(page_num, PAGE_SIZE)
    }

    /// Flush every cached page and release the file.
    pub fn close(mut self) -> DbResult<()> {
        for page_num in 0..self.num_pages {
            if matches!(self.cache.get(page_num as usize), Some(Some(_))) {
                self.flush_page(page_num)?;
            }
        }
        self.file.flush()?;
        self.file.sync_all()?;
        debug!("Closed pager after flushing {} pages.", self.num_pages);
        Ok(())
    }

    /// How many pages does the pager know about right now (on-disk + newly allocated)?
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }
}

/// Fill `buf` from `reader`, stopping early at end of file.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_read_stops_at_end_of_input() {
        let data = [7u8; 10];
        let mut buf = [0u8; 16];
        let n = read_up_to(&mut &data[..], &mut buf).unwrap();
        assert_eq!(n, 10);
        assert_eq!(&buf[..10], &data);
        assert_eq!(&buf[10..], &[0u8; 6]);
    }
}
