// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Buckets and the bottom-k sample engine.
//!
//! A bucket is one cell of a column matrix: a running counter plus the
//! bookkeeping for a bottom-k reservoir of record IDs kept in a parallel
//! slice of the sketch's flat ID array. Selection is by the priority hash
//! of the ID; ties are broken by the ID itself, so the `(hash, item)`
//! order is total and merging is deterministic.

use std::cmp::Ordering;

use crate::hash::sample_hash;

/// One cell of a column matrix. The IDs themselves live in the sketch's
/// flat sample array; every operation takes the cell's slice explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Bucket {
    /// Total records hashed into this cell, sampled or not.
    pub total_count: u32,
    /// Number of IDs currently stored in the sample.
    pub sample_count: u16,
    /// Position of the stored ID with the largest priority hash.
    pub max_index: u16,
    /// That largest priority hash.
    pub max_hash: u32,
    /// Whether the sample is in canonical `(hash, item)` order.
    pub is_sorted: bool,
}

/// An ID paired with its priority hash, so sorting and merging never
/// recompute hashes. Field order gives the derived comparison the
/// `(hash, item)` lexicographic meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ItemHash {
    pub hash: u32,
    pub item: i32,
}

impl ItemHash {
    fn of(item: i32) -> Self {
        Self {
            hash: sample_hash(item),
            item,
        }
    }
}

impl Bucket {
    /// Insert an ID into the cell, maintaining the bottom-k property.
    ///
    /// If the sample is not full, the ID is appended and the cached max
    /// updated. If it is full, the ID only displaces the current max when
    /// its hash is strictly smaller; the new max is found by rescanning
    /// the sample. Either mutation leaves the sample unsorted. The total
    /// counter is incremented in every case, including discard.
    pub fn insert(&mut self, sample: &mut [i32], item: i32) {
        let h = sample_hash(item);

        self.total_count += 1;

        if (self.sample_count as usize) < sample.len() {
            if self.sample_count == 0 {
                self.max_index = 0;
                self.max_hash = h;
            } else if h > self.max_hash {
                self.max_index = self.sample_count;
                self.max_hash = h;
            }

            sample[self.sample_count as usize] = item;
            self.sample_count += 1;
            self.is_sorted = false;
        } else if h < self.max_hash {
            // Replace the current max (that is the one to evict) and
            // rescan for the new max; the evicted slot could have been
            // anywhere, so the whole sample must be walked.
            sample[self.max_index as usize] = item;

            self.max_hash = 0;
            for (k, &stored) in sample[..self.sample_count as usize].iter().enumerate() {
                let h = sample_hash(stored);
                if h >= self.max_hash {
                    self.max_hash = h;
                    self.max_index = k as u16;
                }
            }
            self.is_sorted = false;
        }
    }

    /// Returns the cell's IDs with their hashes in `(hash, item)` order,
    /// skipping the sort when the cell is already canonical.
    pub fn sorted_items(&self, sample: &[i32]) -> Vec<ItemHash> {
        let mut items: Vec<ItemHash> = sample[..self.sample_count as usize]
            .iter()
            .map(|&item| ItemHash::of(item))
            .collect();

        if !self.is_sorted {
            items.sort_unstable();
        }

        items
    }

    /// Bring the sample into canonical sorted order. Idempotent; cells
    /// with fewer than two IDs are left as they are.
    pub fn sort(&mut self, sample: &mut [i32]) {
        if self.is_sorted || self.sample_count < 2 {
            return;
        }

        let items = self.sorted_items(sample);
        for (slot, item) in sample.iter_mut().zip(&items) {
            *slot = item.item;
        }

        self.max_index = self.sample_count - 1;
        self.is_sorted = true;
    }

    /// Merge another cell into this one: a two-pointer walk over both
    /// samples in `(hash, item)` order, emitting the smallest elements
    /// until the sample slice is full or both inputs are exhausted.
    ///
    /// The result is always canonically sorted, whatever order the inputs
    /// were in, so merging the same cells in any association produces the
    /// same bytes. An ID present in both inputs is emitted once; two
    /// records sharing an ID is a seed collision the sketch cannot
    /// detect, and double emission would silently break the bottom-k
    /// property.
    pub fn merge_from(&mut self, sample: &mut [i32], src: &Bucket, src_sample: &[i32]) {
        let dst_items = self.sorted_items(sample);
        let src_items = src.sorted_items(src_sample);

        self.total_count += src.total_count;

        let mut i = 0;
        let mut j = 0;
        let mut k = 0;
        while k < sample.len() && (i < dst_items.len() || j < src_items.len()) {
            let next = if i == dst_items.len() {
                j += 1;
                src_items[j - 1]
            } else if j == src_items.len() {
                i += 1;
                dst_items[i - 1]
            } else {
                match dst_items[i].cmp(&src_items[j]) {
                    Ordering::Less => {
                        i += 1;
                        dst_items[i - 1]
                    }
                    Ordering::Greater => {
                        j += 1;
                        src_items[j - 1]
                    }
                    Ordering::Equal => {
                        i += 1;
                        j += 1;
                        dst_items[i - 1]
                    }
                }
            };

            sample[k] = next.item;
            self.max_hash = next.hash;
            k += 1;
        }

        if k == 0 {
            return;
        }

        self.sample_count = k as u16;
        self.max_index = (k - 1) as u16;
        self.is_sorted = true;
    }

    /// Full consistency check of the cell against its sample slice.
    /// Debug builds only; release builds compile this away.
    pub fn check(&self, sample: &[i32], total_records: u32) {
        if !cfg!(debug_assertions) {
            return;
        }

        assert!(self.total_count >= self.sample_count as u32);
        assert!(self.total_count <= total_records);
        assert!(self.sample_count as usize <= sample.len());

        // Any record counted into the cell must have left at least one
        // sampled ID behind.
        assert!(!(self.sample_count == 0 && self.total_count > 0));

        if self.sample_count == 0 {
            return;
        }

        assert!(self.max_index < self.sample_count);
        assert_eq!(
            self.max_hash,
            sample_hash(sample[self.max_index as usize]),
            "cached max hash does not match the stored ID"
        );
        assert!(!self.is_sorted || self.max_index == self.sample_count - 1);

        let mut prev: Option<ItemHash> = None;
        for &item in &sample[..self.sample_count as usize] {
            let current = ItemHash::of(item);
            assert!(current.hash <= self.max_hash);

            // Equal neighbors are allowed: IDs are 32-bit hashes of the
            // record number, so two records in the same cell can collide
            // at scale.
            if let Some(prev) = prev {
                if self.is_sorted {
                    assert!(prev <= current, "sample not in (hash, item) order");
                }
            }
            prev = Some(current);
        }
    }
}

/// Shrink `items` to its intersection with another sorted sample. Both
/// inputs are in `(hash, item)` order; matching is by ID equality, the
/// hash order only drives the two-pointer advance.
pub(crate) fn intersect_sorted(items: &mut Vec<i32>, other: &[i32]) {
    let mut i = 0;
    let mut j = 0;
    let mut k = 0;

    while i < items.len() && j < other.len() {
        if items[i] == other[j] {
            items[k] = items[i];
            i += 1;
            j += 1;
            k += 1;
            continue;
        }

        if ItemHash::of(items[i]) < ItemHash::of(other[j]) {
            i += 1;
        } else {
            j += 1;
        }
    }

    items.truncate(k);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SIZE: usize = 8;

    fn insert_all(items: &[i32]) -> (Bucket, [i32; SAMPLE_SIZE]) {
        let mut bucket = Bucket::default();
        let mut sample = [0i32; SAMPLE_SIZE];
        for &item in items {
            bucket.insert(&mut sample, item);
            bucket.check(&sample, items.len() as u32);
        }
        (bucket, sample)
    }

    fn bottom_k(items: &[i32], k: usize) -> Vec<i32> {
        let mut all: Vec<ItemHash> = items.iter().map(|&item| ItemHash::of(item)).collect();
        all.sort_unstable();
        all.truncate(k);
        all.into_iter().map(|ih| ih.item).collect()
    }

    #[test]
    fn test_insert_keeps_smallest_hashes() {
        let items: Vec<i32> = (0..100).collect();
        let (mut bucket, mut sample) = insert_all(&items);

        assert_eq!(bucket.total_count, 100);
        assert_eq!(bucket.sample_count as usize, SAMPLE_SIZE);

        bucket.sort(&mut sample);
        assert_eq!(sample.to_vec(), bottom_k(&items, SAMPLE_SIZE));
    }

    #[test]
    fn test_insert_below_capacity_keeps_everything() {
        let items = [5, -3, 17];
        let (bucket, sample) = insert_all(&items);

        assert_eq!(bucket.sample_count, 3);
        assert_eq!(bucket.total_count, 3);
        let mut stored = sample[..3].to_vec();
        stored.sort_unstable();
        assert_eq!(stored, vec![-3, 5, 17]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let items: Vec<i32> = (0..50).collect();
        let (mut bucket, mut sample) = insert_all(&items);

        bucket.sort(&mut sample);
        let once = (bucket, sample);
        bucket.sort(&mut sample);
        assert_eq!((bucket, sample), once);
        bucket.check(&sample, 50);
    }

    #[test]
    fn test_insert_after_sort_clears_order() {
        let items: Vec<i32> = (0..50).collect();
        let (mut bucket, mut sample) = insert_all(&items);
        bucket.sort(&mut sample);
        assert!(bucket.is_sorted);

        // Find an item that actually displaces the max.
        let max_before = bucket.max_hash;
        let winner = (1000..).find(|&i| sample_hash(i) < max_before).unwrap();
        bucket.insert(&mut sample, winner);
        assert!(!bucket.is_sorted);
        bucket.check(&sample, 51);
    }

    #[test]
    fn test_merge_equals_single_stream() {
        let left: Vec<i32> = (0..60).collect();
        let right: Vec<i32> = (60..120).collect();

        let (mut merged, mut merged_sample) = insert_all(&left);
        let (src, src_sample) = insert_all(&right);
        merged.merge_from(&mut merged_sample, &src, &src_sample);
        merged.check(&merged_sample, 120);

        let combined: Vec<i32> = (0..120).collect();
        assert_eq!(merged.total_count, 120);
        assert!(merged.is_sorted);
        assert_eq!(
            merged_sample[..merged.sample_count as usize].to_vec(),
            bottom_k(&combined, SAMPLE_SIZE)
        );
    }

    #[test]
    fn test_merge_with_empty_source_canonicalizes() {
        let (mut bucket, mut sample) = insert_all(&(0..30).collect::<Vec<_>>());
        assert!(!bucket.is_sorted);

        let empty = Bucket::default();
        bucket.merge_from(&mut sample, &empty, &[]);

        assert!(bucket.is_sorted);
        assert_eq!(bucket.total_count, 30);
        bucket.check(&sample, 30);
    }

    #[test]
    fn test_merge_emits_duplicate_id_once() {
        let shared = [1, 2, 3];
        let (mut left, mut left_sample) = insert_all(&shared);
        let (right, right_sample) = insert_all(&shared);

        left.merge_from(&mut left_sample, &right, &right_sample);

        assert_eq!(left.sample_count, 3);
        let mut stored = left_sample[..3].to_vec();
        stored.sort_unstable();
        assert_eq!(stored, vec![1, 2, 3]);
    }

    #[test]
    fn test_intersect_by_id() {
        let (mut left, mut left_sample) = insert_all(&[1, 2, 3, 4]);
        let (mut right, mut right_sample) = insert_all(&[3, 4, 5, 6]);
        left.sort(&mut left_sample);
        right.sort(&mut right_sample);

        let mut items = left_sample[..left.sample_count as usize].to_vec();
        intersect_sorted(&mut items, &right_sample[..right.sample_count as usize]);

        items.sort_unstable();
        assert_eq!(items, vec![3, 4]);
    }

    #[test]
    fn test_intersect_disjoint_is_empty() {
        let (mut left, mut left_sample) = insert_all(&[1, 2, 3]);
        let (mut right, mut right_sample) = insert_all(&[7, 8, 9]);
        left.sort(&mut left_sample);
        right.sort(&mut right_sample);

        let mut items = left_sample[..3].to_vec();
        intersect_sorted(&mut items, &right_sample[..3]);
        assert!(items.is_empty());
    }
}
