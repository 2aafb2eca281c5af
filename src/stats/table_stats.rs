use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::common::types::TransactionId;
use crate::storage::buffer::{BufferPool, BufferPoolError};
use crate::storage::disk::PageStoreError;
use crate::storage::heap::HeapFile;
use crate::stats::int_histogram::IntHistogram;
use crate::stats::string_histogram::StringHistogram;
use crate::tuple::{CompareOp, Field, FieldType};

/// Number of bins used for every per-field histogram.
pub const NUM_HIST_BINS: usize = 100;

/// Conventional default cost of reading one page.
pub const IO_COST_PER_PAGE: usize = 1000;

// Process-wide table-name → stats registry, populated on first compute.
static STATS_REGISTRY: Lazy<RwLock<HashMap<String, Arc<TableStats>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

pub fn table_stats(table_name: &str) -> Option<Arc<TableStats>> {
    STATS_REGISTRY.read().get(table_name).cloned()
}

pub fn set_table_stats(table_name: impl Into<String>, stats: Arc<TableStats>) {
    STATS_REGISTRY.write().insert(table_name.into(), stats);
}

#[derive(Debug)]
enum FieldHistogram {
    Int(IntHistogram),
    Text(StringHistogram),
}

/// Per-table statistics: one equi-width histogram per field, built from two
/// sequential scans of the heap file (field extrema first, then counts).
pub struct TableStats {
    file: Arc<HeapFile>,
    io_cost_per_page: usize,
    tuple_count: u64,
    histograms: Vec<FieldHistogram>,
}

impl TableStats {
    /// Scan `file` twice and build its statistics. The scan runs under a
    /// fresh transaction that commits on completion, releasing the shared
    /// locks it accumulated.
    pub fn build(
        pool: &BufferPool,
        file: Arc<HeapFile>,
        io_cost_per_page: usize,
    ) -> Result<Self, BufferPoolError> {
        let tid = TransactionId::new();
        let schema = file.schema().clone();
        let field_count = schema.field_count();

        // Pass 1: tuple count and per-integer-field extrema.
        let mut min = vec![i32::MAX; field_count];
        let mut max = vec![i32::MIN; field_count];
        let mut tuple_count: u64 = 0;

        let mut iter = file.iterator(tid, pool);
        iter.open();
        while iter.has_next()? {
            let tuple = iter.next()?;
            tuple_count += 1;
            for i in 0..field_count {
                if let Field::Int(v) = tuple.field(i) {
                    min[i] = min[i].min(*v);
                    max[i] = max[i].max(*v);
                }
            }
        }

        let mut histograms = Vec::with_capacity(field_count);
        for i in 0..field_count {
            histograms.push(match schema.field_type(i) {
                FieldType::Int => {
                    // An empty table never saw a value; give the histogram a
                    // degenerate but valid domain.
                    let (lo, hi) = if tuple_count == 0 { (0, 0) } else { (min[i], max[i]) };
                    FieldHistogram::Int(IntHistogram::new(NUM_HIST_BINS, lo, hi))
                }
                FieldType::Text => FieldHistogram::Text(StringHistogram::new(NUM_HIST_BINS)),
            });
        }

        // Pass 2: populate the histograms.
        iter.rewind();
        while iter.has_next()? {
            let tuple = iter.next()?;
            for (i, histogram) in histograms.iter_mut().enumerate() {
                match (histogram, tuple.field(i)) {
                    (FieldHistogram::Int(h), Field::Int(v)) => h.add_value(*v),
                    (FieldHistogram::Text(h), Field::Text(s)) => h.add_value(s),
                    _ => {}
                }
            }
        }
        iter.close();

        pool.transaction_complete(tid, true)?;

        Ok(Self {
            file,
            io_cost_per_page,
            tuple_count,
            histograms,
        })
    }

    /// Cost of sequentially scanning the whole file, one I/O unit per page
    /// regardless of how full the last page is.
    pub fn estimate_scan_cost(&self) -> Result<f64, PageStoreError> {
        Ok(self.file.num_pages()? as f64 * self.io_cost_per_page as f64)
    }

    /// Number of tuples a scan returns after a predicate with the given
    /// selectivity.
    pub fn estimate_table_cardinality(&self, selectivity: f64) -> u64 {
        (self.tuple_count as f64 * selectivity) as u64
    }

    pub fn total_tuples(&self) -> u64 {
        self.tuple_count
    }

    /// Estimated selectivity of `field op constant` over this table. A
    /// constant of the wrong type estimates 1.0 (no information).
    pub fn estimate_selectivity(&self, field: usize, op: CompareOp, constant: &Field) -> f64 {
        match (&self.histograms[field], constant) {
            (FieldHistogram::Int(h), Field::Int(v)) => h.estimate_selectivity(op, *v),
            (FieldHistogram::Text(h), Field::Text(s)) => h.estimate_selectivity(op, s),
            _ => 1.0,
        }
    }
}
