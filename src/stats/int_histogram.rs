use crate::tuple::CompareOp;

/// Equi-width histogram over a single integer field. Space and time are
/// constant in the number of recorded values.
#[derive(Debug, Clone)]
pub struct IntHistogram {
    min: i64,
    max: i64,
    lower: Vec<i64>,
    width: Vec<i64>,
    count: Vec<u64>,
    total: u64,
}

impl IntHistogram {
    /// Partition `[min, max]` into `buckets` contiguous ranges whose widths
    /// differ by at most one; the first `(max-min+1) % buckets` ranges get
    /// the extra unit.
    pub fn new(buckets: usize, min: i32, max: i32) -> Self {
        assert!(buckets >= 1, "histogram needs at least one bucket");
        assert!(min <= max, "histogram domain is empty");
        let (min, max) = (min as i64, max as i64);

        let span = max - min + 1;
        let cap = span / buckets as i64;
        let remainder = span % buckets as i64;

        let mut lower = Vec::with_capacity(buckets);
        let mut width = Vec::with_capacity(buckets);
        let mut next = min;
        for i in 0..buckets {
            let w = if (i as i64) < remainder { cap + 1 } else { cap };
            lower.push(next);
            width.push(w);
            next += w;
        }

        Self {
            min,
            max,
            lower,
            width,
            count: vec![0; buckets],
            total: 0,
        }
    }

    /// Index of the bucket containing `v`, or `None` when out of range.
    /// Zero-width buckets (possible when the domain is narrower than the
    /// bucket count) start past `max` and are never selected.
    fn bucket_of(&self, v: i64) -> Option<usize> {
        if v < self.min || v > self.max {
            return None;
        }
        // last bucket whose lower bound is <= v
        let (mut result, mut lo, mut hi) = (0, 1, self.lower.len() - 1);
        while lo <= hi {
            let mid = (lo + hi) / 2;
            if self.lower[mid] <= v {
                result = mid;
                lo = mid + 1;
            } else {
                hi = mid - 1;
            }
        }
        Some(result)
    }

    /// Record one value. Out-of-range values are ignored.
    pub fn add_value(&mut self, v: i32) {
        if let Some(b) = self.bucket_of(v as i64) {
            self.count[b] += 1;
            self.total += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Estimated fraction of recorded values satisfying `value op v`, in
    /// [0, 1].
    pub fn estimate_selectivity(&self, op: CompareOp, v: i32) -> f64 {
        let v = v as i64;
        let n = self.total as f64;

        let raw = match op {
            CompareOp::Eq => match self.bucket_of(v) {
                None => 0.0,
                Some(_) if self.total == 0 => 0.0,
                Some(b) => self.count[b] as f64 / self.width[b] as f64 / n,
            },
            CompareOp::Ne => match self.bucket_of(v) {
                None => 1.0,
                Some(_) if self.total == 0 => 1.0,
                Some(b) => 1.0 - self.count[b] as f64 / self.width[b] as f64 / n,
            },
            CompareOp::Gt | CompareOp::Ge => {
                if v < self.min {
                    1.0
                } else if v > self.max {
                    0.0
                } else if self.total == 0 {
                    0.0
                } else {
                    // within-bucket share above v, plus everything in the
                    // buckets to the right
                    let b = match self.bucket_of(v) {
                        Some(b) => b,
                        None => return 0.0,
                    };
                    let hi = self.lower[b] + self.width[b] - 1;
                    let mut matching: f64 = self.count[b + 1..].iter().map(|&c| c as f64).sum();
                    matching +=
                        self.count[b] as f64 * (hi - v) as f64 / self.width[b] as f64;
                    if op == CompareOp::Ge {
                        matching += self.count[b] as f64 / self.width[b] as f64;
                    }
                    matching / n
                }
            }
            CompareOp::Lt | CompareOp::Le => {
                if v > self.max {
                    1.0
                } else if v < self.min {
                    0.0
                } else if self.total == 0 {
                    0.0
                } else {
                    let b = match self.bucket_of(v) {
                        Some(b) => b,
                        None => return 0.0,
                    };
                    let mut matching: f64 = self.count[..b].iter().map(|&c| c as f64).sum();
                    matching +=
                        self.count[b] as f64 * (v - self.lower[b]) as f64 / self.width[b] as f64;
                    if op == CompareOp::Le {
                        matching += self.count[b] as f64 / self.width[b] as f64;
                    }
                    matching / n
                }
            }
        };

        raw.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One value at each point of [1, 100], ten buckets of width ten.
    fn uniform_histogram() -> IntHistogram {
        let mut h = IntHistogram::new(10, 1, 100);
        for v in 1..=100 {
            h.add_value(v);
        }
        h
    }

    #[test]
    fn test_bucket_widths_differ_by_at_most_one() {
        let h = IntHistogram::new(7, 0, 9); // span 10 over 7 buckets
        assert_eq!(h.width, vec![2, 2, 2, 1, 1, 1, 1]);
        assert_eq!(h.lower, vec![0, 2, 4, 6, 7, 8, 9]);
    }

    #[test]
    fn test_out_of_range_values_are_ignored() {
        let mut h = IntHistogram::new(4, 10, 20);
        h.add_value(9);
        h.add_value(21);
        assert_eq!(h.total(), 0);
        h.add_value(10);
        assert_eq!(h.total(), 1);
    }

    #[test]
    fn test_equality_selectivity_on_uniform_data() {
        let h = uniform_histogram();
        let sel = h.estimate_selectivity(CompareOp::Eq, 42);
        assert!((sel - 0.001).abs() < 1e-9);
        assert_eq!(h.estimate_selectivity(CompareOp::Eq, 0), 0.0);
        assert_eq!(h.estimate_selectivity(CompareOp::Eq, 101), 0.0);
    }

    #[test]
    fn test_range_selectivity_on_uniform_data() {
        let h = uniform_histogram();
        let gt = h.estimate_selectivity(CompareOp::Gt, 50);
        assert!((gt - 0.5).abs() <= 0.01);

        let ge = h.estimate_selectivity(CompareOp::Ge, 50);
        assert!((ge - 0.51).abs() <= 0.01);

        let lt = h.estimate_selectivity(CompareOp::Lt, 50);
        assert!((lt - 0.49).abs() <= 0.01);

        assert_eq!(h.estimate_selectivity(CompareOp::Gt, 0), 1.0);
        assert_eq!(h.estimate_selectivity(CompareOp::Gt, 101), 0.0);
        assert_eq!(h.estimate_selectivity(CompareOp::Lt, 101), 1.0);
        assert_eq!(h.estimate_selectivity(CompareOp::Lt, 0), 0.0);
    }

    #[test]
    fn test_not_equals_complements_equals() {
        let h = uniform_histogram();
        let eq = h.estimate_selectivity(CompareOp::Eq, 42);
        let ne = h.estimate_selectivity(CompareOp::Ne, 42);
        assert!((eq + ne - 1.0).abs() < 1e-9);
        assert_eq!(h.estimate_selectivity(CompareOp::Ne, -5), 1.0);
    }

    #[test]
    fn test_point_selectivities_sum_to_one() {
        let h = uniform_histogram();
        let total: f64 = (1..=100)
            .map(|v| h.estimate_selectivity(CompareOp::Eq, v))
            .sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_narrow_domain_with_more_buckets_than_values() {
        let mut h = IntHistogram::new(10, 5, 7);
        for v in [5, 6, 7, 6] {
            h.add_value(v);
        }
        assert_eq!(h.total(), 4);
        let sel = h.estimate_selectivity(CompareOp::Eq, 6);
        assert!((sel - 0.5).abs() < 1e-9);
        assert_eq!(h.estimate_selectivity(CompareOp::Ge, 5), 1.0);
    }

    #[test]
    fn test_empty_histogram_estimates() {
        let h = IntHistogram::new(10, 1, 100);
        assert_eq!(h.estimate_selectivity(CompareOp::Eq, 50), 0.0);
        assert_eq!(h.estimate_selectivity(CompareOp::Gt, 50), 0.0);
        assert_eq!(h.estimate_selectivity(CompareOp::Ne, 200), 1.0);
        // boundary rules apply before any counting
        assert_eq!(h.estimate_selectivity(CompareOp::Gt, 0), 1.0);
    }
}
