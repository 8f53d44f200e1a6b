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

//! Flat binary layout of a sketch.
//!
//! `[header][bucket array][id array]`, all little-endian, with offsets
//! computed purely from the header fields. The layout carries no
//! pointers, so serialized bytes are position-independent and a
//! round-trip is byte-exact.
//!
//! ```text
//! offset  size  field
//! 0       4     total length in bytes
//! 4       4     flags (format version, currently 0)
//! 8       2     num_columns
//! 10      2     width
//! 12      2     height
//! 14      2     sample_size
//! 16      2     item_size
//! 18      2     padding
//! 20      4     count
//! 24      4     seed
//! 28      4     padding to 8-byte alignment
//! 32      ...   buckets[C*D*W], 16 bytes each
//! ...     ...   samples[C*D*W*B], 4 bytes each
//! ```

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::error::Error;
use crate::sketch::OmniSketch;
use crate::sketch::bucket::Bucket;

/// Format version carried in the flags field; nonzero values are
/// reserved.
pub(super) const FLAGS_VERSION_0: u32 = 0;

/// Header bytes including the tail padding to 8-byte alignment.
pub(super) const HEADER_BYTES: usize = 32;

/// Bytes per serialized bucket: u32 total, u16 sample count, u16 max
/// index, u32 max hash, one flag byte, 3 bytes padding.
pub(super) const BUCKET_BYTES: usize = 16;

/// Bytes per ID slot.
pub(super) const ITEM_BYTES: usize = 4;

/// Total size in bytes of a sketch with the given dimensions; the
/// in-memory and serialized footprints are the same.
pub(crate) fn serialized_size(num_columns: u16, width: u16, height: u16, sample_size: u16) -> u64 {
    let cells = num_columns as u64 * width as u64 * height as u64;

    HEADER_BYTES as u64
        + cells * BUCKET_BYTES as u64
        + cells * sample_size as u64 * ITEM_BYTES as u64
}

impl OmniSketch {
    /// Serialize the sketch into its flat binary form.
    ///
    /// # Examples
    ///
    /// ```
    /// # use omnisketch::sketch::OmniSketch;
    /// let mut sketch = OmniSketch::new(0.1, 0.1, 2).unwrap();
    /// sketch.add(&[1, 2]).unwrap();
    /// let bytes = sketch.serialize();
    /// let restored = OmniSketch::deserialize(&bytes).unwrap();
    /// assert_eq!(restored.count(), 1);
    /// assert_eq!(restored.serialize(), bytes);
    /// ```
    pub fn serialize(&self) -> Vec<u8> {
        let total =
            serialized_size(self.num_columns, self.width, self.height, self.sample_size) as usize;

        let mut bytes = SketchBytes::with_capacity(total);

        bytes.write_u32_le(total as u32);
        bytes.write_u32_le(FLAGS_VERSION_0);
        bytes.write_u16_le(self.num_columns);
        bytes.write_u16_le(self.width);
        bytes.write_u16_le(self.height);
        bytes.write_u16_le(self.sample_size);
        bytes.write_u16_le(self.item_size);
        bytes.write_padding(2);
        bytes.write_u32_le(self.count);
        bytes.write_u32_le(self.seed);
        bytes.write_padding(4);

        for bucket in &self.buckets {
            bytes.write_u32_le(bucket.total_count);
            bytes.write_u16_le(bucket.sample_count);
            bytes.write_u16_le(bucket.max_index);
            bytes.write_u32_le(bucket.max_hash);
            bytes.write_u8(bucket.is_sorted as u8);
            bytes.write_padding(3);
        }

        for &item in &self.samples {
            bytes.write_i32_le(item);
        }

        debug_assert_eq!(bytes.len(), total);

        bytes.into_bytes()
    }

    /// Deserialize a sketch from bytes produced by
    /// [`serialize`](Self::serialize).
    ///
    /// # Errors
    ///
    /// Returns a MalformedDeserializeData error if the buffer is
    /// truncated, carries unknown flags, its dimensions are inconsistent
    /// with its length, or its counters do not add up.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        fn make_error(field: &'static str) -> impl FnOnce(std::io::Error) -> Error {
            move |_| Error::insufficient_data(field)
        }

        if bytes.len() < HEADER_BYTES {
            return Err(Error::insufficient_data("header"));
        }

        let mut cursor = SketchSlice::new(bytes);

        let total_len = cursor.read_u32_le().map_err(make_error("length"))? as usize;
        let flags = cursor.read_u32_le().map_err(make_error("flags"))?;
        let num_columns = cursor.read_u16_le().map_err(make_error("num_columns"))?;
        let width = cursor.read_u16_le().map_err(make_error("width"))?;
        let height = cursor.read_u16_le().map_err(make_error("height"))?;
        let sample_size = cursor.read_u16_le().map_err(make_error("sample_size"))?;
        let item_size = cursor.read_u16_le().map_err(make_error("item_size"))?;
        cursor.skip(2).map_err(make_error("padding"))?;
        let count = cursor.read_u32_le().map_err(make_error("count"))?;
        let seed = cursor.read_u32_le().map_err(make_error("seed"))?;
        cursor.skip(4).map_err(make_error("padding"))?;

        if flags != FLAGS_VERSION_0 {
            return Err(
                Error::malformed_data("unsupported format flags").with_context("flags", flags)
            );
        }
        if num_columns == 0 || width == 0 || height == 0 || sample_size == 0 {
            return Err(Error::malformed_data("sketch dimensions must be nonzero")
                .with_context("num_columns", num_columns)
                .with_context("width", width)
                .with_context("height", height)
                .with_context("sample_size", sample_size));
        }

        let expected = serialized_size(num_columns, width, height, sample_size);
        if total_len as u64 != expected || bytes.len() as u64 != expected {
            return Err(Error::malformed_data("length does not match dimensions")
                .with_context("length", total_len)
                .with_context("buffer", bytes.len())
                .with_context("expected", expected));
        }

        let cells = num_columns as usize * width as usize * height as usize;

        let mut buckets = Vec::with_capacity(cells);
        for _ in 0..cells {
            let total_count = cursor.read_u32_le().map_err(make_error("total_count"))?;
            let sample_count = cursor.read_u16_le().map_err(make_error("sample_count"))?;
            let max_index = cursor.read_u16_le().map_err(make_error("max_index"))?;
            let max_hash = cursor.read_u32_le().map_err(make_error("max_hash"))?;
            let sorted_byte = cursor.read_u8().map_err(make_error("is_sorted"))?;
            cursor.skip(3).map_err(make_error("padding"))?;

            if sample_count > sample_size {
                return Err(Error::malformed_data("bucket sample count exceeds sample size")
                    .with_context("sample_count", sample_count)
                    .with_context("sample_size", sample_size));
            }
            if sample_count > 0 && max_index >= sample_count {
                return Err(Error::malformed_data("bucket max index out of bounds")
                    .with_context("max_index", max_index)
                    .with_context("sample_count", sample_count));
            }
            if total_count < sample_count as u32 || total_count > count {
                return Err(Error::malformed_data("bucket counter out of range")
                    .with_context("total_count", total_count));
            }
            if sorted_byte > 1 {
                return Err(Error::malformed_data("invalid is_sorted flag")
                    .with_context("value", sorted_byte));
            }

            buckets.push(Bucket {
                total_count,
                sample_count,
                max_index,
                max_hash,
                is_sorted: sorted_byte != 0,
            });
        }

        let mut samples = Vec::with_capacity(cells * sample_size as usize);
        for _ in 0..cells * sample_size as usize {
            samples.push(cursor.read_i32_le().map_err(make_error("sample"))?);
        }

        let sketch = OmniSketch {
            num_columns,
            width,
            height,
            sample_size,
            item_size,
            count,
            seed,
            buckets,
            samples,
        };

        // Counter conservation ties every row to the record count; a
        // buffer that fails it was not produced by serialize.
        for column in 0..num_columns as usize {
            for row in 0..height as usize {
                let row_count: u64 = (0..width as usize)
                    .map(|slot| {
                        sketch.buckets[sketch.bucket_index(column, row, slot)].total_count as u64
                    })
                    .sum();

                if row_count != count as u64 {
                    return Err(Error::malformed_data("row counters do not add up")
                        .with_context("row_count", row_count)
                        .with_context("count", count));
                }
            }
        }

        Ok(sketch)
    }
}
