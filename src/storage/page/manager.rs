use crate::common::types::Page;
use crate::storage::page::error::PageError;
use crate::storage::page::layout::{slot_offset, slots_per_page};
use crate::tuple::{RecordId, Schema, Tuple};

/// Stateless operations over heap pages. The layout is a used-slot bitmap
/// followed by fixed-size tuple slots; see [`crate::storage::page::layout`].
pub struct PageManager;

impl Default for PageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PageManager {
    pub fn new() -> Self {
        Self
    }

    /// Reset a page to the empty state: every slot free.
    pub fn init_page(&self, page: &mut Page) {
        page.data.fill(0);
    }

    /// Total number of slots a page holds under this schema.
    pub fn slot_count(&self, schema: &Schema) -> usize {
        slots_per_page(schema.tuple_size())
    }

    /// Number of slots currently free.
    pub fn free_slot_count(&self, page: &Page, schema: &Schema) -> usize {
        let slots = self.slot_count(schema);
        (0..slots).filter(|&s| !self.is_slot_used(page, s)).count()
    }

    pub fn is_slot_used(&self, page: &Page, slot: usize) -> bool {
        page.data[slot / 8] & (1 << (slot % 8)) != 0
    }

    fn set_slot_used(&self, page: &mut Page, slot: usize, used: bool) {
        if used {
            page.data[slot / 8] |= 1 << (slot % 8);
        } else {
            page.data[slot / 8] &= !(1 << (slot % 8));
        }
    }

    /// Insert a tuple into the first free slot and return that slot.
    pub fn insert_tuple(
        &self,
        page: &mut Page,
        schema: &Schema,
        tuple: &Tuple,
    ) -> Result<usize, PageError> {
        if !schema.matches(tuple) {
            return Err(PageError::SchemaMismatch);
        }

        let slots = self.slot_count(schema);
        let slot = (0..slots)
            .find(|&s| !self.is_slot_used(page, s))
            .ok_or(PageError::PageFull)?;

        let tuple_size = schema.tuple_size();
        let offset = slot_offset(tuple_size, slots, slot);
        page.data[offset..offset + tuple_size].copy_from_slice(&tuple.to_bytes(schema));
        self.set_slot_used(page, slot, true);

        Ok(slot)
    }

    /// Free the given slot. Deleting an empty or out-of-range slot is a
    /// precondition violation surfaced to the caller.
    pub fn delete_slot(
        &self,
        page: &mut Page,
        schema: &Schema,
        slot: usize,
    ) -> Result<(), PageError> {
        if slot >= self.slot_count(schema) {
            return Err(PageError::InvalidSlot(slot));
        }
        if !self.is_slot_used(page, slot) {
            return Err(PageError::EmptySlot(slot));
        }
        self.set_slot_used(page, slot, false);
        Ok(())
    }

    /// Decode the tuple stored at `slot`, with its record id set.
    pub fn tuple_at(&self, page: &Page, schema: &Schema, slot: usize) -> Result<Tuple, PageError> {
        if slot >= self.slot_count(schema) {
            return Err(PageError::InvalidSlot(slot));
        }
        if !self.is_slot_used(page, slot) {
            return Err(PageError::EmptySlot(slot));
        }

        let tuple_size = schema.tuple_size();
        let offset = slot_offset(tuple_size, self.slot_count(schema), slot);
        let mut tuple = Tuple::from_bytes(schema, &page.data[offset..offset + tuple_size]);
        tuple.set_record_id(Some(RecordId {
            page_id: page.id,
            slot,
        }));
        Ok(tuple)
    }

    /// All live tuples of the page in slot order, record ids set.
    pub fn tuples(&self, page: &Page, schema: &Schema) -> Vec<Tuple> {
        let slots = self.slot_count(schema);
        (0..slots)
            .filter(|&s| self.is_slot_used(page, s))
            .filter_map(|s| self.tuple_at(page, schema, s).ok())
            .collect()
    }
}
