use std::ops::Range;

use crate::error::{invalid, KernelResult};

/// `[0, total)` をワーカー間で連続・昇順・隙間なしに分割したもの
///
/// 各範囲の大きさは `total / k` か `total / k + 1`。
/// 大きい方は先頭の `total % k` 個のワーカーに割り当てる
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionPlan {
    total: usize,
    ranges: Vec<Range<usize>>,
}

impl PartitionPlan {
    pub fn total(&self) -> usize {
        self.total
    }

    /// 実際のワーカー数 `min(要求数, total)`
    pub fn workers(&self) -> usize {
        self.ranges.len()
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// `total` 個の要素を最大 `workers` 個のワーカーに分割する
pub fn partition(total: usize, workers: usize) -> KernelResult<PartitionPlan> {
    if workers == 0 {
        return invalid("worker count must be at least 1");
    }

    // 空の範囲を持つワーカーは作らない
    let effective = workers.min(total);
    let mut ranges = Vec::with_capacity(effective);

    if effective > 0 {
        let base = total / effective;
        let remainder = total % effective;
        let mut start = 0;
        for worker in 0..effective {
            let end = start + base + usize::from(worker < remainder);
            ranges.push(start..end);
            start = end;
        }
    }

    Ok(PartitionPlan { total, ranges })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_goes_to_leading_workers() {
        let plan = partition(10, 4).unwrap();
        assert_eq!(plan.ranges(), &[0..3, 3..6, 6..8, 8..10]);
    }

    #[test]
    fn clamps_to_problem_size() {
        let plan = partition(3, 8).unwrap();
        assert_eq!(plan.workers(), 3);
        assert_eq!(plan.ranges(), &[0..1, 1..2, 2..3]);
    }

    #[test]
    fn empty_problem_has_no_workers() {
        let plan = partition(0, 4).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.total(), 0);
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(partition(10, 0).is_err());
    }
}
