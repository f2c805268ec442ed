//! ワーカー範囲をまたいで共有される可変状態
//!
//! 最小頂点の選択は、ロックなしの局所最小 + 逐次リダクションで行う。
//! 暫定距離とキーは頂点ごとのセルを比較して更新する。
//! 配列全体を覆うロックは存在しない。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 最小の暫定値を持つ頂点が複数あるときにどれを選ぶか
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// `<` で走査: 最小値を持つ最初の頂点
    #[default]
    LowestIndex,
    /// `<=` で走査: 最小値を持つ最後の頂点
    HighestIndex,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinCandidate<V> {
    pub index: usize,
    pub value: V,
}

impl TieBreak {
    fn prefers<V: PartialOrd>(self, candidate: &V, best: &V) -> bool {
        match self {
            TieBreak::LowestIndex => candidate < best,
            TieBreak::HighestIndex => candidate <= best,
        }
    }
}

/// 添字の昇順に並んだ `(index, value)` の最小値
pub fn local_min<V, I>(items: I, tie_break: TieBreak) -> Option<MinCandidate<V>>
where
    V: PartialOrd,
    I: IntoIterator<Item = (usize, V)>,
{
    let mut best: Option<MinCandidate<V>> = None;
    for (index, value) in items {
        let replace = match &best {
            Some(b) => tie_break.prefers(&value, &b.value),
            None => true,
        };
        if replace {
            best = Some(MinCandidate { index, value });
        }
    }
    best
}

/// ワーカー（= 添字）順に並んだ局所最小値を逐次にまとめる
pub fn reduce_min<V, I>(locals: I, tie_break: TieBreak) -> Option<MinCandidate<V>>
where
    V: PartialOrd,
    I: IntoIterator<Item = Option<MinCandidate<V>>>,
{
    local_min(
        locals.into_iter().flatten().map(|c| (c.index, c.value)),
        tie_break,
    )
}

/// アトミックに比較・更新できる整数の暫定距離
pub struct AtomicDistances {
    cells: Vec<AtomicU64>,
}

impl AtomicDistances {
    pub fn new(len: usize, initial: u64) -> Self {
        AtomicDistances {
            cells: (0..len).map(|_| AtomicU64::new(initial)).collect(),
        }
    }

    // ラウンド間の可視性は join が保証するので Relaxed で足りる
    pub fn get(&self, v: usize) -> u64 {
        self.cells[v].load(Ordering::Relaxed)
    }

    pub fn set(&self, v: usize, value: u64) {
        self.cells[v].store(value, Ordering::Relaxed);
    }

    /// `candidate` の方が小さければ更新し、更新したかを返す
    pub fn relax(&self, v: usize, candidate: u64) -> bool {
        self.cells[v].fetch_min(candidate, Ordering::Relaxed) > candidate
    }

    pub fn into_vec(self) -> Vec<u64> {
        self.cells.into_iter().map(AtomicU64::into_inner).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeySlot<K> {
    pub key: K,
    pub parent: Option<usize>,
}

/// キーと親の組。頂点ごとに1つのロック
pub struct KeySlots<K> {
    slots: Vec<Mutex<KeySlot<K>>>,
}

impl<K: Copy + PartialOrd> KeySlots<K> {
    pub fn new(len: usize, initial: K) -> Self {
        KeySlots {
            slots: (0..len)
                .map(|_| {
                    Mutex::new(KeySlot {
                        key: initial,
                        parent: None,
                    })
                })
                .collect(),
        }
    }

    pub fn key(&self, v: usize) -> K {
        lock(&self.slots[v]).key
    }

    pub fn set_key(&self, v: usize, key: K) {
        lock(&self.slots[v]).key = key;
    }

    /// 頂点のロックを取ったまま読み・比較・書き込みを行う
    pub fn lower(&self, v: usize, key: K, parent: usize) -> bool {
        let mut slot = lock(&self.slots[v]);
        if key < slot.key {
            slot.key = key;
            slot.parent = Some(parent);
            true
        } else {
            false
        }
    }

    pub fn into_parts(self) -> (Vec<K>, Vec<Option<usize>>) {
        self.slots
            .into_iter()
            .map(|m| {
                let slot = m.into_inner().unwrap_or_else(PoisonError::into_inner);
                (slot.key, slot.parent)
            })
            .unzip()
    }
}

/// ビット列で保持する f64 セル。順序付けは外側のバリアが保証する
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        AtomicF64 {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

// 他のワーカーが panic してロックが poison されても値自体は有効
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn tie_break_picks_first_or_last() {
        let values = [(0, 5u64), (1, 3), (2, 7), (3, 3)];
        let first = local_min(values, TieBreak::LowestIndex).unwrap();
        let last = local_min(values, TieBreak::HighestIndex).unwrap();
        assert_eq!(first.index, 1);
        assert_eq!(last.index, 3);
    }

    #[test]
    fn reduction_matches_flat_scan() {
        let locals = vec![
            Some(MinCandidate { index: 1, value: 4.0 }),
            None,
            Some(MinCandidate { index: 6, value: 4.0 }),
            Some(MinCandidate { index: 9, value: 8.0 }),
        ];
        assert_eq!(reduce_min(locals.clone(), TieBreak::LowestIndex).unwrap().index, 1);
        assert_eq!(reduce_min(locals, TieBreak::HighestIndex).unwrap().index, 6);
        assert!(reduce_min(Vec::<Option<MinCandidate<f64>>>::new(), TieBreak::LowestIndex).is_none());
    }

    #[test]
    fn concurrent_relax_keeps_minimum() {
        let dist = AtomicDistances::new(1, u64::MAX);
        thread::scope(|s| {
            for t in 0..8u64 {
                let dist = &dist;
                s.spawn(move || {
                    for k in 0..100 {
                        dist.relax(0, 1000 - t * 100 - k);
                    }
                });
            }
        });
        assert_eq!(dist.get(0), 1000 - 700 - 99);
    }

    #[test]
    fn lower_records_parent() {
        let slots = KeySlots::new(2, f64::INFINITY);
        assert!(slots.lower(1, 3.0, 0));
        assert!(!slots.lower(1, 4.0, 0));
        let (keys, parents) = slots.into_parts();
        assert_eq!(keys[1], 3.0);
        assert_eq!(parents, vec![None, Some(0)]);
    }
}
