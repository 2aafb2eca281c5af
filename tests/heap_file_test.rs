use anyhow::Result;

mod common;
use common::{create_table, full_page_of_tuples, int_schema, int_tuple, seed_pages};

use koradb::common::types::TransactionId;
use koradb::storage::buffer::{BufferPool, BufferPoolError};
use koradb::storage::page::{PageError, PageManager};
use koradb::tuple::Field;

#[test]
fn test_insert_then_scan_returns_tuples_in_order() -> Result<()> {
    let pool = BufferPool::new(10);
    let (_file, heap) = create_table(&pool, int_schema())?;

    let tid = TransactionId::new();
    for i in 0..3 {
        let mut tuple = int_tuple(i, i * 10);
        let rid = pool.insert_tuple(tid, heap.table_id(), &mut tuple)?;
        assert_eq!(tuple.record_id(), Some(rid));
        assert_eq!(rid.page_id.table_id, heap.table_id());
    }

    let mut iter = heap.iterator(tid, &pool);
    iter.open();
    for i in 0..3 {
        assert!(iter.has_next()?);
        let tuple = iter.next()?;
        assert_eq!(tuple.field(0), &Field::Int(i));
        assert!(tuple.record_id().is_some());
    }
    assert!(!iter.has_next()?);
    Ok(())
}

#[test]
fn test_insert_prefers_existing_free_slots_over_append() -> Result<()> {
    let pool = BufferPool::new(10);
    let (_file, heap) = create_table(&pool, int_schema())?;
    seed_pages(&heap, &[vec![int_tuple(1, 1)]])?;
    assert_eq!(heap.num_pages()?, 1);

    let tid = TransactionId::new();
    let rid = pool.insert_tuple(tid, heap.table_id(), &mut int_tuple(2, 2))?;
    assert_eq!(rid.page_id.page_no, 0);
    assert_eq!(heap.num_pages()?, 1);
    Ok(())
}

#[test]
fn test_insert_appends_a_page_when_the_table_is_full() -> Result<()> {
    let pool = BufferPool::new(10);
    let (_file, heap) = create_table(&pool, int_schema())?;
    seed_pages(&heap, &[full_page_of_tuples(heap.schema())])?;
    assert_eq!(heap.num_pages()?, 1);

    let tid = TransactionId::new();
    let rid = pool.insert_tuple(tid, heap.table_id(), &mut int_tuple(-1, -1))?;
    assert_eq!(rid.page_id.page_no, 1);
    assert_eq!(rid.slot, 0);
    assert_eq!(heap.num_pages()?, 2);

    // the appended page on disk is well-formed and empty until commit
    let on_disk = heap.store().read_page(rid.page_id)?;
    assert_eq!(PageManager::new().tuples(&on_disk, heap.schema()).len(), 0);

    pool.transaction_complete(tid, true)?;
    let on_disk = heap.store().read_page(rid.page_id)?;
    assert_eq!(PageManager::new().tuples(&on_disk, heap.schema()).len(), 1);
    Ok(())
}

#[test]
fn test_delete_frees_the_slot_for_reuse() -> Result<()> {
    let pool = BufferPool::new(10);
    let (_file, heap) = create_table(&pool, int_schema())?;
    seed_pages(&heap, &[vec![]])?;

    let tid = TransactionId::new();
    let mut tuple = int_tuple(11, 12);
    let rid = pool.insert_tuple(tid, heap.table_id(), &mut tuple)?;

    pool.delete_tuple(tid, &tuple)?;

    // the freed slot is the first candidate for the next insert
    let rid2 = pool.insert_tuple(tid, heap.table_id(), &mut int_tuple(13, 14))?;
    assert_eq!(rid2, rid);

    // deleting through the stale record id is a precondition violation
    let result = pool.delete_tuple(tid, &tuple);
    match result {
        Err(BufferPoolError::Page(PageError::EmptySlot(_))) => {}
        other => panic!("expected EmptySlot, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_delete_without_a_record_id_is_rejected() -> Result<()> {
    let pool = BufferPool::new(10);
    let (_file, heap) = create_table(&pool, int_schema())?;
    seed_pages(&heap, &[vec![]])?;

    let tid = TransactionId::new();
    let detached = int_tuple(1, 1);
    assert!(matches!(
        pool.delete_tuple(tid, &detached),
        Err(BufferPoolError::InvalidOperation(_))
    ));
    Ok(())
}

#[test]
fn test_iterator_rewind_restarts_the_scan() -> Result<()> {
    let pool = BufferPool::new(10);
    let (_file, heap) = create_table(&pool, int_schema())?;
    seed_pages(&heap, &[vec![int_tuple(1, 1), int_tuple(2, 2)]])?;

    let tid = TransactionId::new();
    let mut iter = heap.iterator(tid, &pool);
    iter.open();

    let mut first_pass = Vec::new();
    while iter.has_next()? {
        first_pass.push(iter.next()?);
    }
    assert_eq!(first_pass.len(), 2);

    iter.rewind();
    let mut second_pass = Vec::new();
    while iter.has_next()? {
        second_pass.push(iter.next()?);
    }
    assert_eq!(first_pass, second_pass);
    Ok(())
}

#[test]
fn test_iterator_yields_nothing_before_open_and_after_close() -> Result<()> {
    let pool = BufferPool::new(10);
    let (_file, heap) = create_table(&pool, int_schema())?;
    seed_pages(&heap, &[vec![int_tuple(1, 1)]])?;

    let tid = TransactionId::new();
    let mut iter = heap.iterator(tid, &pool);
    assert!(!iter.has_next()?);

    iter.open();
    assert!(iter.has_next()?);
    iter.close();
    assert!(!iter.has_next()?);
    Ok(())
}

#[test]
fn test_deleted_tuples_disappear_from_scans() -> Result<()> {
    let pool = BufferPool::new(10);
    let (_file, heap) = create_table(&pool, int_schema())?;
    seed_pages(&heap, &[vec![]])?;

    let tid = TransactionId::new();
    let mut keep = int_tuple(1, 1);
    let mut gone = int_tuple(2, 2);
    pool.insert_tuple(tid, heap.table_id(), &mut keep)?;
    pool.insert_tuple(tid, heap.table_id(), &mut gone)?;
    pool.delete_tuple(tid, &gone)?;

    let mut iter = heap.iterator(tid, &pool);
    iter.open();
    let mut remaining = Vec::new();
    while iter.has_next()? {
        remaining.push(iter.next()?);
    }
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].values(), keep.values());
    Ok(())
}
