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

use std::ops::Range;

use crate::common::XorShift64;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::hash::sketch_hash;
use crate::sketch::bucket::Bucket;
use crate::sketch::bucket::intersect_sorted;
use crate::sketch::serialization::serialized_size;

/// Cap on the per-cell sample size B.
pub const MAX_SAMPLE_SIZE: u16 = 1024;

/// Cap on the recorded ID precision b; IDs are 32-bit regardless.
pub const MAX_ITEM_BITS: u16 = 32;

/// Hosts must not allocate sketches beyond this size.
pub const MAX_SKETCH_BYTES: u64 = 1 << 30;

/// Multi-dimensional streaming sketch for approximate counting under
/// conjunctive equality predicates.
///
/// One sketch holds `num_columns` Count-Min-style matrices of `height`
/// rows by `width` cells, and every cell carries a bottom-k sample of
/// record IDs next to its counter. All cells live in two flat arrays
/// addressed by index arithmetic, so a sketch has no internal pointers
/// and clones as a flat copy.
#[derive(Debug, Clone)]
pub struct OmniSketch {
    pub(super) num_columns: u16,
    pub(super) width: u16,
    pub(super) height: u16,
    pub(super) sample_size: u16,
    pub(super) item_size: u16,
    pub(super) count: u32,
    pub(super) seed: u32,
    pub(super) buckets: Vec<Bucket>,
    pub(super) samples: Vec<i32>,
}

impl OmniSketch {
    /// Create an empty sketch sized from the accuracy parameters.
    ///
    /// `epsilon` bounds the relative error and `delta` the failure
    /// probability; both must be in (0, 1]. `num_columns` is the number
    /// of record attributes the sketch covers.
    ///
    /// # Examples
    ///
    /// ```
    /// # use omnisketch::sketch::OmniSketch;
    /// let mut sketch = OmniSketch::new(0.1, 0.1, 2).unwrap();
    /// sketch.add(&[7, 42]).unwrap();
    /// assert_eq!(sketch.count(), 1);
    /// ```
    pub fn new(epsilon: f64, delta: f64, num_columns: u16) -> Result<Self, Error> {
        Self::builder()
            .epsilon(epsilon)
            .delta(delta)
            .num_columns(num_columns)
            .build()
    }

    /// Create a new builder for OmniSketch.
    ///
    /// # Examples
    ///
    /// ```
    /// # use omnisketch::sketch::OmniSketch;
    /// let sketch = OmniSketch::builder()
    ///     .epsilon(0.1)
    ///     .delta(0.1)
    ///     .num_columns(2)
    ///     .seed(42)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(sketch.num_columns(), 2);
    /// ```
    pub fn builder() -> OmniSketchBuilder {
        OmniSketchBuilder::default()
    }

    /// Ingest one record given as pre-hashed column values, one 32-bit
    /// hash per column. A NULL column enters as the sentinel hash 0 by
    /// host convention.
    ///
    /// The record's ID is derived from the running count and the sketch
    /// seed, then inserted into one cell per row of every column matrix.
    pub fn add(&mut self, column_hashes: &[u32]) -> Result<(), Error> {
        if column_hashes.len() != self.num_columns as usize {
            return Err(Error::column_count_mismatch(
                self.num_columns,
                column_hashes.len(),
            ));
        }

        self.count += 1;
        let item = sketch_hash(self.count, self.seed) as i32;

        for (column, &column_hash) in column_hashes.iter().enumerate() {
            self.add_hash(column, column_hash, item);
        }

        Ok(())
    }

    /// Insert an ID into the cell selected by the column hash, in every
    /// row of one column matrix.
    fn add_hash(&mut self, column: usize, column_hash: u32, item: i32) {
        for row in 0..self.height as usize {
            let slot = (sketch_hash(column_hash, row as u32) % self.width as u32) as usize;
            let index = self.bucket_index(column, row, slot);
            let range = self.sample_range(index);

            self.buckets[index].insert(&mut self.samples[range], item);
        }
    }

    /// Bring every cell's sample into canonical `(hash, item)` order, so
    /// the estimator can intersect samples with linear walks. Idempotent.
    pub fn finalize(&mut self) {
        for index in 0..self.buckets.len() {
            let range = self.sample_range(index);
            self.buckets[index].sort(&mut self.samples[range]);
        }

        self.check();
    }

    /// Estimate the number of ingested records whose columns all equal
    /// the queried values, given as one 32-bit hash per column.
    ///
    /// Walks every row of every column matrix, intersecting the bottom-k
    /// samples along the query's path and tracking the largest cell
    /// count seen anywhere on it; the surviving sample fraction scaled
    /// by that count is the estimate. Samples must be in canonical order
    /// (see [`finalize`](Self::finalize)).
    pub fn estimate(&self, column_hashes: &[u32]) -> Result<i64, Error> {
        if column_hashes.len() != self.num_columns as usize {
            return Err(Error::column_count_mismatch(
                self.num_columns,
                column_hashes.len(),
            ));
        }

        self.check();

        let mut max_count: i64 = 0;
        let mut items: Option<Vec<i32>> = None;

        for (column, &column_hash) in column_hashes.iter().enumerate() {
            for row in 0..self.height as usize {
                let slot = (sketch_hash(column_hash, row as u32) % self.width as u32) as usize;
                let index = self.bucket_index(column, row, slot);

                let bucket = &self.buckets[index];
                let range = self.sample_range(index);
                let sample = &self.samples[range][..bucket.sample_count as usize];

                debug_assert!(
                    bucket.is_sorted || bucket.sample_count < 2,
                    "estimate on an unfinalized sketch"
                );

                max_count = max_count.max(bucket.total_count as i64);

                match items {
                    None => items = Some(sample.to_vec()),
                    Some(ref mut items) => intersect_sorted(items, sample),
                }
            }
        }

        let matched = items.map_or(0, |items| items.len()) as i64;

        Ok(max_count * matched / self.sample_size as i64)
    }

    /// Merge another sketch into this one, cell by cell. Both sketches
    /// must have been sized identically; the merged sample of every cell
    /// is the bottom-k of the union, canonically sorted.
    ///
    /// The resulting count is the sum of both counts and the resulting
    /// seed is the XOR of both seeds, so the outcome does not depend on
    /// the order in which sketches are folded together.
    pub fn merge(&mut self, other: &OmniSketch) -> Result<(), Error> {
        if !self.same_shape(other) {
            return Err(Error::new(
                ErrorKind::ShapeMismatch,
                "sketches do not match",
            )
            .with_context("left", self.shape_string())
            .with_context("right", other.shape_string()));
        }

        for index in 0..self.buckets.len() {
            let range = self.sample_range(index);
            let src_range = range.clone();

            self.buckets[index].merge_from(
                &mut self.samples[range],
                &other.buckets[index],
                &other.samples[src_range],
            );
        }

        self.count += other.count;
        self.seed ^= other.seed;

        self.check();
        Ok(())
    }

    /// Total records ingested.
    pub fn count(&self) -> i64 {
        self.count as i64
    }

    /// Whether anything has been ingested.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of per-attribute matrices C.
    pub fn num_columns(&self) -> u16 {
        self.num_columns
    }

    /// Cells per row W.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Rows per matrix D.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Maximum IDs retained per cell B.
    pub fn sample_size(&self) -> u16 {
        self.sample_size
    }

    /// Recorded ID precision b in bits; informative, IDs are 32-bit.
    pub fn item_size(&self) -> u16 {
        self.item_size
    }

    /// The per-sketch random seed that record IDs are derived from.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub(super) fn same_shape(&self, other: &OmniSketch) -> bool {
        self.num_columns == other.num_columns
            && self.height == other.height
            && self.width == other.width
            && self.sample_size == other.sample_size
            && self.item_size == other.item_size
    }

    fn shape_string(&self) -> String {
        format!(
            "columns={} width={} height={} sample={} item={}",
            self.num_columns, self.width, self.height, self.sample_size, self.item_size
        )
    }

    #[inline]
    fn matrix_size(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Linear index of cell `(column, row, slot)` in the flat arrays.
    #[inline]
    pub(super) fn bucket_index(&self, column: usize, row: usize, slot: usize) -> usize {
        column * self.matrix_size() + row * self.width as usize + slot
    }

    /// Range of the cell's ID slots within the flat sample array.
    #[inline]
    pub(super) fn sample_range(&self, index: usize) -> Range<usize> {
        let sample_size = self.sample_size as usize;
        index * sample_size..(index + 1) * sample_size
    }

    /// Whole-sketch consistency check: per-row counter conservation plus
    /// the full per-cell check. Debug builds only.
    pub(super) fn check(&self) {
        if !cfg!(debug_assertions) {
            return;
        }

        for column in 0..self.num_columns as usize {
            for row in 0..self.height as usize {
                let mut row_count: u64 = 0;

                for slot in 0..self.width as usize {
                    let index = self.bucket_index(column, row, slot);
                    let bucket = &self.buckets[index];

                    bucket.check(&self.samples[self.sample_range(index)], self.count);
                    row_count += bucket.total_count as u64;
                }

                assert_eq!(
                    row_count, self.count as u64,
                    "row counters do not add up to the record count"
                );
            }
        }
    }
}

/// Builder for OmniSketch.
#[derive(Debug)]
pub struct OmniSketchBuilder {
    epsilon: f64,
    delta: f64,
    num_columns: u16,
    seed: Option<u32>,
}

impl Default for OmniSketchBuilder {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            delta: 0.01,
            num_columns: 1,
            seed: None,
        }
    }
}

impl OmniSketchBuilder {
    /// Set the relative error bound, in (0, 1].
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the failure probability, in (0, 1].
    pub fn delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Set the number of record attributes covered by the sketch.
    pub fn num_columns(mut self, num_columns: u16) -> Self {
        self.num_columns = num_columns;
        self
    }

    /// Pin the per-sketch seed instead of drawing a random one.
    ///
    /// Deterministic seeds make runs reproducible, but two sketches
    /// built with the same seed share a record ID space and must not be
    /// merged.
    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the sketch, deriving its dimensions from the accuracy
    /// parameters.
    pub fn build(self) -> Result<OmniSketch, Error> {
        if !(self.epsilon > 0.0 && self.epsilon <= 1.0) {
            return Err(Error::invalid_parameter("epsilon must be in (0, 1]")
                .with_context("epsilon", self.epsilon));
        }
        if !(self.delta > 0.0 && self.delta <= 1.0) {
            return Err(Error::invalid_parameter("delta must be in (0, 1]")
                .with_context("delta", self.delta));
        }
        if self.num_columns == 0 {
            return Err(Error::invalid_parameter("at least one column is required"));
        }

        let (width, height) = matrix_dimensions(self.epsilon, self.delta)?;
        let (sample_size, item_size) = sample_dimensions(self.delta);

        let total = serialized_size(self.num_columns, width, height, sample_size);
        if total > MAX_SKETCH_BYTES {
            return Err(Error::new(
                ErrorKind::ResourceLimit,
                "sketch would exceed the allocation cap",
            )
            .with_context("bytes", total)
            .with_context("cap", MAX_SKETCH_BYTES));
        }

        let cells = self.num_columns as usize * width as usize * height as usize;
        let seed = self
            .seed
            .unwrap_or_else(|| XorShift64::default().next_u32());

        Ok(OmniSketch {
            num_columns: self.num_columns,
            width,
            height,
            sample_size,
            item_size,
            count: 0,
            seed,
            buckets: vec![Bucket::default(); cells],
            samples: vec![0i32; cells * sample_size as usize],
        })
    }
}

/// Matrix dimensions from the accuracy parameters: D = ⌈ln(2/δ)⌉ rows of
/// W = 1 + ⌈e·((ε+1)/ε)^(1/D)⌉ cells.
fn matrix_dimensions(epsilon: f64, delta: f64) -> Result<(u16, u16), Error> {
    let height = (2.0 / delta).ln().ceil();
    let width = 1.0 + (std::f64::consts::E * ((epsilon + 1.0) / epsilon).powf(1.0 / height)).ceil();

    if !(height >= 1.0 && height <= u16::MAX as f64) || !(width >= 1.0 && width <= u16::MAX as f64)
    {
        return Err(Error::invalid_parameter("derived matrix dimensions out of range")
            .with_context("width", width)
            .with_context("height", height));
    }

    Ok((width as u16, height as u16))
}

/// Grow the sample size B until the required ID precision
/// b = ⌈ln(4·B^2.5/δ)⌉ reaches 32 bits or B reaches its cap.
fn sample_dimensions(delta: f64) -> (u16, u16) {
    let mut sample_size: u16 = 0;
    let mut item_size: u16 = 0;

    while item_size < MAX_ITEM_BITS && sample_size < MAX_SAMPLE_SIZE {
        sample_size += 1;
        item_size = (4.0 * (sample_size as f64).powf(2.5) / delta).ln().ceil() as u16;
    }

    (sample_size, item_size)
}
