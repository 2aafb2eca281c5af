use std::sync::Arc;

use anyhow::Result;
use tempfile::NamedTempFile;

use koradb::common::types::{Page, PageId};
use koradb::storage::buffer::BufferPool;
use koradb::storage::heap::HeapFile;
use koradb::storage::page::PageManager;
use koradb::tuple::{Field, FieldType, Schema, Tuple};

// Schema used by most storage tests: two integer fields.
#[allow(dead_code)]
pub fn int_schema() -> Schema {
    Schema::new(vec![FieldType::Int, FieldType::Int])
}

#[allow(dead_code)]
pub fn int_tuple(a: i32, b: i32) -> Tuple {
    Tuple::new(vec![Field::Int(a), Field::Int(b)])
}

// Create a heap file on a fresh temp file and register it with the pool.
// The NamedTempFile must stay alive for as long as the table is used.
#[allow(dead_code)]
pub fn create_table(
    pool: &BufferPool,
    schema: Schema,
) -> Result<(NamedTempFile, Arc<HeapFile>)> {
    let file = NamedTempFile::new()?;
    let heap = Arc::new(HeapFile::open(file.path(), schema)?);
    pool.register_file(heap.clone());
    Ok((file, heap))
}

// Persist pages directly through the store, bypassing the pool, so tests can
// start from a known on-disk layout. `pages[i]` becomes page i.
#[allow(dead_code)]
pub fn seed_pages(heap: &HeapFile, pages: &[Vec<Tuple>]) -> Result<()> {
    let manager = PageManager::new();
    for (page_no, tuples) in pages.iter().enumerate() {
        let mut page = Page::new(PageId::new(heap.table_id(), page_no as u32));
        manager.init_page(&mut page);
        for tuple in tuples {
            manager.insert_tuple(&mut page, heap.schema(), tuple)?;
        }
        heap.store().write_page(&page)?;
    }
    Ok(())
}

// Fill one page to capacity with distinct tuples.
#[allow(dead_code)]
pub fn full_page_of_tuples(schema: &Schema) -> Vec<Tuple> {
    let manager = PageManager::new();
    let slots = manager.slot_count(schema);
    (0..slots).map(|i| int_tuple(i as i32, -(i as i32))).collect()
}
