use crate::tuple::CompareOp;
use super::int_histogram::IntHistogram;

/// Largest hash value: the packing of `"zzzz"`.
const MAX_HASH: i32 = 0x7a7a_7a7a;

/// Histogram over string fields. Each string hashes to a bounded integer
/// (its first four bytes packed big-endian, clamped into `[0, MAX_HASH]`)
/// and every estimate delegates to an integer histogram over that fixed
/// domain. Hash order agrees with byte-wise string order on the leading
/// four bytes, which is what makes range estimates meaningful.
#[derive(Debug, Clone)]
pub struct StringHistogram {
    inner: IntHistogram,
}

fn string_to_int(s: &str) -> i32 {
    let bytes = s.as_bytes();
    let mut v: i64 = 0;
    for (i, &b) in bytes.iter().take(4).enumerate() {
        v += (b as i64) << ((3 - i) * 8);
    }
    // The sentinels keep their exact values; everything else is clamped into
    // the nominal domain.
    if !s.is_empty() && s != "zzzz" {
        v = v.clamp(0, MAX_HASH as i64);
    }
    v as i32
}

impl StringHistogram {
    pub fn new(buckets: usize) -> Self {
        Self {
            inner: IntHistogram::new(buckets, 0, MAX_HASH),
        }
    }

    pub fn add_value(&mut self, s: &str) {
        self.inner.add_value(string_to_int(s));
    }

    pub fn total(&self) -> u64 {
        self.inner.total()
    }

    pub fn estimate_selectivity(&self, op: CompareOp, s: &str) -> f64 {
        self.inner.estimate_selectivity(op, string_to_int(s))
    }
}
