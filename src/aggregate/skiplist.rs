//! Ordered skip list backing the aggregation state.
//!
//! Nodes live in an arena: slot 0 is the head sentinel, slot 1 the tail
//! sentinel, freed slots are recycled. Elements are ordered by a
//! comparator that reports overlapping elements as equal, so a lookup
//! lands on whichever stored element overlaps the key.

use crate::config::SkipListConfig;
use crate::error::{ChronotopeError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::{SmallVec, smallvec};
use std::cmp::Ordering;

const HEAD: usize = 0;
const TAIL: usize = 1;

/// Element order; `Equal` means the elements overlap.
pub type Comparator<T> = fn(&T, &T) -> Ordering;

#[derive(Debug, Clone)]
struct Node<T> {
    value: Option<T>,
    next: SmallVec<[usize; 4]>,
}

/// Skip list of mutually non-overlapping elements.
#[derive(Debug, Clone)]
pub struct SkipList<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    len: usize,
    level: usize,
    max_level: usize,
    cmp: Comparator<T>,
    rng: StdRng,
}

impl<T> SkipList<T> {
    pub fn new(cmp: Comparator<T>) -> Self {
        Self::with_config(cmp, &SkipListConfig::default())
    }

    pub fn with_config(cmp: Comparator<T>, config: &SkipListConfig) -> Self {
        let max_level = config.max_level.max(1);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut nodes = Vec::with_capacity(config.initial_capacity.max(2));
        nodes.push(Node {
            value: None,
            next: smallvec![TAIL; max_level],
        });
        nodes.push(Node {
            value: None,
            next: SmallVec::new(),
        });
        Self {
            nodes,
            free: Vec::new(),
            len: 0,
            level: 1,
            max_level,
            cmp,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Elements in order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cur: self.nodes[HEAD].next[0],
        }
    }

    pub fn values(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Consume the list, returning its elements in order.
    pub fn into_values(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        let mut cur = self.nodes[HEAD].next[0];
        while cur != TAIL {
            let next = self.nodes[cur].next[0];
            if let Some(v) = self.nodes[cur].value.take() {
                out.push(v);
            }
            cur = next;
        }
        out
    }

    fn value(&self, idx: usize) -> Option<&T> {
        self.nodes[idx].value.as_ref()
    }

    fn precedes(&self, idx: usize, key: &T) -> bool {
        idx != TAIL
            && self
                .value(idx)
                .is_some_and(|v| (self.cmp)(v, key) == Ordering::Less)
    }

    /// Per level, the last node ordered strictly before `key`.
    fn predecessors(&self, key: &T) -> SmallVec<[usize; 16]> {
        let mut update: SmallVec<[usize; 16]> = smallvec![HEAD; self.max_level];
        let mut cur = HEAD;
        for lvl in (0..self.level).rev() {
            while self.precedes(self.nodes[cur].next[lvl], key) {
                cur = self.nodes[cur].next[lvl];
            }
            update[lvl] = cur;
        }
        update
    }

    /// First element not ordered before `key`, if it compares equal.
    pub fn search(&self, key: &T) -> Option<&T> {
        let update = self.predecessors(key);
        let idx = self.nodes[update[0]].next[0];
        self.value(idx)
            .filter(|v| (self.cmp)(v, key) == Ordering::Equal)
    }

    fn random_height(&mut self) -> usize {
        let mut height = 1;
        while height < self.max_level && self.rng.random_bool(0.5) {
            height += 1;
        }
        height
    }

    /// Make room for `extra` more nodes without reallocating later.
    fn reserve(&mut self, extra: usize) -> Result<()> {
        let needed = extra.saturating_sub(self.free.len());
        if self.nodes.capacity() - self.nodes.len() >= needed {
            return Ok(());
        }
        let grow = needed.max(self.nodes.capacity());
        self.nodes.try_reserve(grow).map_err(|e| {
            ChronotopeError::MemoryAlloc(format!("skip list growth by {} slots: {}", grow, e))
        })?;
        log::trace!("skip list grew to {} slots", self.nodes.capacity());
        Ok(())
    }

    fn alloc(&mut self, value: T, height: usize) -> usize {
        let node = Node {
            value: Some(value),
            next: smallvec![TAIL; height],
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Link `value` after the predecessors found for it. Capacity must
    /// have been reserved.
    fn link(&mut self, value: T, update: &mut SmallVec<[usize; 16]>) {
        let height = self.random_height();
        if height > self.level {
            for slot in update.iter_mut().take(height).skip(self.level) {
                *slot = HEAD;
            }
            self.level = height;
        }
        let idx = self.alloc(value, height);
        for (lvl, &pred) in update.iter().enumerate().take(height) {
            self.nodes[idx].next[lvl] = self.nodes[pred].next[lvl];
            self.nodes[pred].next[lvl] = idx;
        }
        self.len += 1;
    }

    fn unlink(&mut self, idx: usize, update: &SmallVec<[usize; 16]>) -> Option<T> {
        for (lvl, &pred) in update.iter().enumerate().take(self.level) {
            if self.nodes[pred].next[lvl] == idx {
                self.nodes[pred].next[lvl] = self.nodes[idx].next[lvl];
            }
        }
        while self.level > 1 && self.nodes[HEAD].next[self.level - 1] == TAIL {
            self.level -= 1;
        }
        self.len -= 1;
        self.free.push(idx);
        self.nodes[idx].next.clear();
        self.nodes[idx].value.take()
    }

    /// Insert `value`, replacing and returning an element equal to it.
    pub fn insert(&mut self, value: T) -> Result<Option<T>> {
        self.reserve(1)?;
        let mut update = self.predecessors(&value);
        let found = self.nodes[update[0]].next[0];
        let old = if self
            .value(found)
            .is_some_and(|v| (self.cmp)(v, &value) == Ordering::Equal)
        {
            self.unlink(found, &update)
        } else {
            None
        };
        self.link(value, &mut update);
        Ok(old)
    }

    /// Insert `value`, combining it with an equal element through `merge`.
    /// On error the list is left unchanged.
    pub fn insert_with<F>(&mut self, value: T, merge: F) -> Result<()>
    where
        F: FnOnce(&T, T) -> Result<T>,
    {
        self.reserve(1)?;
        let mut update = self.predecessors(&value);
        let found = self.nodes[update[0]].next[0];
        let value = match self.value(found) {
            Some(old) if (self.cmp)(old, &value) == Ordering::Equal => {
                let merged = merge(old, value)?;
                self.unlink(found, &update);
                merged
            }
            _ => value,
        };
        self.link(value, &mut update);
        Ok(())
    }

    /// Remove and return the element equal to `key`.
    pub fn remove(&mut self, key: &T) -> Option<T> {
        let update = self.predecessors(key);
        let found = self.nodes[update[0]].next[0];
        if self
            .value(found)
            .is_some_and(|v| (self.cmp)(v, key) == Ordering::Equal)
        {
            self.unlink(found, &update)
        } else {
            None
        }
    }

    /// Splice ordered, mutually non-overlapping `values` into the list.
    ///
    /// The stored elements between the first and the last new value are
    /// handed to `merge` together with the new values, and replaced by its
    /// output, which must also be ordered and non-overlapping. `merge` runs
    /// before the list is touched, so an error leaves it unchanged. When no
    /// stored element falls in that range the values are inserted as is.
    pub fn splice<F>(&mut self, values: Vec<T>, merge: F) -> Result<()>
    where
        F: FnOnce(Vec<&T>, Vec<T>) -> Result<Vec<T>>,
    {
        let (Some(first), Some(last)) = (values.first(), values.last()) else {
            return Ok(());
        };
        let mut run = Vec::new();
        let mut cur = self.nodes[self.predecessors(first)[0]].next[0];
        while cur != TAIL {
            match self.value(cur) {
                Some(v) if (self.cmp)(v, last) != Ordering::Greater => run.push(cur),
                _ => break,
            }
            cur = self.nodes[cur].next[0];
        }

        let merged = if run.is_empty() {
            values
        } else {
            let old: Vec<&T> = run.iter().filter_map(|&idx| self.value(idx)).collect();
            merge(old, values)?
        };
        self.reserve(merged.len().saturating_sub(run.len()))?;
        log::trace!(
            "skip list splice: {} stored, {} merged, {} total",
            run.len(),
            merged.len(),
            self.len
        );

        // The run is contiguous, so unlinking from its common predecessors
        // removes it front to back.
        if let Some(&head) = run.first() {
            let Some(key) = self.value(head) else {
                return Err(ChronotopeError::Internal("empty skip list node".to_string()));
            };
            let update = self.predecessors(key);
            for idx in run {
                self.unlink(idx, &update);
            }
        }
        for value in merged {
            let mut update = self.predecessors(&value);
            self.link(value, &mut update);
        }
        Ok(())
    }
}

/// Iterator over the elements of a [`SkipList`].
pub struct Iter<'a, T> {
    list: &'a SkipList<T>,
    cur: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.cur == TAIL {
            return None;
        }
        let node = &self.list.nodes[self.cur];
        self.cur = node.next[0];
        node.value.as_ref()
    }
}
