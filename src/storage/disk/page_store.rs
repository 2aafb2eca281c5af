use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use parking_lot::Mutex;
use thiserror::Error;

use crate::common::types::{page_size, Page, PageId};

#[derive(Error, Debug)]
pub enum PageStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("page {0} is beyond the end of the backing file")]
    PageOutOfRange(PageId),
}

/// PageStore handles the actual disk I/O for one table's backing file. The
/// file is a dense array of pages; its length stays a whole multiple of the
/// page size after every write.
pub struct PageStore {
    file: Mutex<File>,
}

impl PageStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PageStoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Number of pages currently persisted.
    pub fn num_pages(&self) -> Result<u32, PageStoreError> {
        let file = self.file.lock();
        let len = file.metadata()?.len();
        Ok((len / page_size() as u64) as u32)
    }

    /// Read one page from disk. The page must already exist in the file;
    /// callers append through `write_page` before reading a new page back.
    pub fn read_page(&self, pid: PageId) -> Result<Page, PageStoreError> {
        let offset = pid.page_no as u64 * page_size() as u64;
        let mut data = vec![0u8; page_size()];

        {
            let mut file = self.file.lock();
            let file_size = file.metadata()?.len();
            if offset + page_size() as u64 > file_size {
                return Err(PageStoreError::PageOutOfRange(pid));
            }

            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut data)?;
        }

        Ok(Page {
            id: pid,
            data: data.into_boxed_slice(),
            dirty_by: None,
        })
    }

    /// Write one page at its offset, extending the file when the page is the
    /// next one past the current end.
    pub fn write_page(&self, page: &Page) -> Result<(), PageStoreError> {
        let offset = page.id.page_no as u64 * page_size() as u64;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&page.data)?;
        file.flush()?;

        Ok(())
    }
}
