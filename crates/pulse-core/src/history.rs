//! 고정 용량 이력 버퍼.
//!
//! 삽입 순서 기준 FIFO. 용량을 넘으면 가장 오래된 항목부터 버린다.

use std::collections::vec_deque::{Iter, VecDeque};

/// 최대 크기 제한 이력 (FIFO)
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    entries: VecDeque<T>,
    max_size: usize,
}

impl<T> BoundedHistory<T> {
    /// 새 이력 버퍼 생성 (용량 0은 1로 취급)
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// 항목 추가, 용량 초과 시 밀려난 항목 반환
    pub fn push(&mut self, entry: T) -> Option<T> {
        let evicted = if self.entries.len() >= self.max_size {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// 오래된 순 순회
    pub fn iter(&self) -> Iter<'_, T> {
        self.entries.iter()
    }

    /// 최근 항목부터 `limit`개
    pub fn recent(&self, limit: usize) -> Vec<&T> {
        self.entries.iter().rev().take(limit).collect()
    }

    /// 가장 최근 항목
    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    /// 조건을 만족하는 항목만 유지, 제거된 개수 반환
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(keep);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// 오래된 순 복사본
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}
