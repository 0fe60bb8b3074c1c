//! 非支配存档
//!
//! 按归一化得分维护 Pareto 前沿（两个目标都最小化），容量为种群大小

use crate::services::ParetoEntry;

/// `a` 是否 Pareto 支配 `b`
pub fn dominates(a: &[f64; 2], b: &[f64; 2]) -> bool {
    a[0] <= b[0] && a[1] <= b[1] && (a[0] < b[0] || a[1] < b[1])
}

#[derive(Debug, Clone)]
pub struct ParetoArchive {
    capacity: usize,
    entries: Vec<ParetoEntry>,
}

impl ParetoArchive {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::with_capacity(capacity),
        }
    }

    /// 尝试加入存档，返回新条目是否留在存档中
    ///
    /// 被已有条目支配或得分完全相同的条目不加入。
    pub fn insert(&mut self, entry: ParetoEntry) -> bool {
        let score = entry.normalized;
        if self
            .entries
            .iter()
            .any(|e| dominates(&e.normalized, &score) || e.normalized == score)
        {
            return false;
        }

        self.entries.retain(|e| !dominates(&score, &e.normalized));
        let sample_index = entry.sample_index;
        self.entries.push(entry);
        self.entries
            .sort_by(|a, b| a.normalized[0].total_cmp(&b.normalized[0]));

        // 超出容量时丢弃归一化得分之和最大的条目
        while self.entries.len() > self.capacity {
            let worst = self
                .entries
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| {
                    (a.normalized[0] + a.normalized[1])
                        .total_cmp(&(b.normalized[0] + b.normalized[1]))
                })
                .map(|(i, _)| i);
            match worst {
                Some(i) => {
                    self.entries.remove(i);
                }
                None => break,
            }
        }

        self.entries.iter().any(|e| e.sample_index == sample_index)
    }

    /// 沿前沿轮转选取 `n` 个父代
    ///
    /// `offset` 通常取代数，使不同代使用前沿上不同位置的父代。
    pub fn select(&self, n: usize, offset: usize) -> Vec<&ParetoEntry> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let len = self.entries.len();
        (0..n.min(len))
            .map(|i| &self.entries[(offset + i) % len])
            .collect()
    }

    pub fn entries(&self) -> &[ParetoEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
