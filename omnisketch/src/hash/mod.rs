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

//! Hash functions and the sketch's hashing discipline.
//!
//! Two hash roles exist: row hashes map a column-value hash to a column
//! index within a row (seeded by the row number), and the sample hash
//! assigns every record ID its bottom-k priority (seeded by
//! [`SAMPLE_HASH_SEED`]). The sample seed must stay distinct from any
//! row seed, otherwise priorities would correlate with placement.

mod xxhash;

pub(crate) use xxhash::XxHash32;

/// Seed of the priority hash used for bottom-k sample selection. Row
/// hashes use small row indexes as seeds, so the sample seed sits at the
/// opposite end of the seed space.
pub(crate) const SAMPLE_HASH_SEED: u32 = 0xFFFF_FFFF;

/// Hash a single 32-bit value with the given seed, over its little-endian
/// byte representation.
#[inline]
pub(crate) fn sketch_hash(value: u32, seed: u32) -> u32 {
    XxHash32::hash_u32(value, seed)
}

/// Priority hash of a record ID.
#[inline]
pub(crate) fn sample_hash(item: i32) -> u32 {
    sketch_hash(item as u32, SAMPLE_HASH_SEED)
}

#[inline]
pub(crate) fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
