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

use std::hash::Hasher;

// Unsigned 32-bit primes from xxhash32.
const P1: u32 = 0x9E3779B1;
const P2: u32 = 0x85EBCA77;
const P3: u32 = 0xC2B2AE3D;
const P4: u32 = 0x27D4EB2F;
const P5: u32 = 0x165667B1;

/// The XxHash32 is a fast, non-cryptographic, 32-bit hash function. The
/// sketch wire behavior depends on reproducing it exactly, so it is
/// implemented here rather than pulled from a hashing crate.
#[derive(Debug)]
pub struct XxHash32 {
    seed: u32,
    total_len: u64,
    v1: u32,
    v2: u32,
    v3: u32,
    v4: u32,
    buffer: [u8; 16],
    buffer_len: usize,
}

impl XxHash32 {
    pub fn with_seed(seed: u32) -> Self {
        XxHash32 {
            seed,
            total_len: 0,
            v1: seed.wrapping_add(P1).wrapping_add(P2),
            v2: seed.wrapping_add(P2),
            v3: seed,
            v4: seed.wrapping_sub(P1),
            buffer: [0; 16],
            buffer_len: 0,
        }
    }

    pub fn finish32(&self) -> u32 {
        let mut hash = if self.total_len >= 16 {
            self.v1
                .rotate_left(1)
                .wrapping_add(self.v2.rotate_left(7))
                .wrapping_add(self.v3.rotate_left(12))
                .wrapping_add(self.v4.rotate_left(18))
        } else {
            self.seed.wrapping_add(P5)
        };

        hash = hash.wrapping_add(self.total_len as u32);

        let mut idx = 0;
        let buf = &self.buffer[..self.buffer_len];
        while idx + 4 <= buf.len() {
            let k1 = super::read_u32_le(&buf[idx..idx + 4]);
            hash = hash.wrapping_add(k1.wrapping_mul(P3));
            hash = hash.rotate_left(17).wrapping_mul(P4);
            idx += 4;
        }

        while idx < buf.len() {
            let k1 = buf[idx] as u32;
            hash = hash.wrapping_add(k1.wrapping_mul(P5));
            hash = hash.rotate_left(11).wrapping_mul(P1);
            idx += 1;
        }

        finalize(hash)
    }

    /// One-shot hash of a single 32-bit value, the only input shape the
    /// sketch ever hashes. Equivalent to streaming the value's four
    /// little-endian bytes.
    pub fn hash_u32(input: u32, seed: u32) -> u32 {
        let mut hash = seed.wrapping_add(P5).wrapping_add(4);
        hash = hash.wrapping_add(input.wrapping_mul(P3));
        hash = hash.rotate_left(17).wrapping_mul(P4);
        finalize(hash)
    }

    #[inline]
    fn update(&mut self, chunk: &[u8]) {
        self.v1 = round(self.v1, super::read_u32_le(&chunk[0..4]));
        self.v2 = round(self.v2, super::read_u32_le(&chunk[4..8]));
        self.v3 = round(self.v3, super::read_u32_le(&chunk[8..12]));
        self.v4 = round(self.v4, super::read_u32_le(&chunk[12..16]));
    }
}

impl Default for XxHash32 {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl Hasher for XxHash32 {
    fn finish(&self) -> u64 {
        self.finish32() as u64
    }

    fn write(&mut self, bytes: &[u8]) {
        self.total_len = self.total_len.wrapping_add(bytes.len() as u64);

        if self.buffer_len + bytes.len() < 16 {
            self.buffer[self.buffer_len..self.buffer_len + bytes.len()].copy_from_slice(bytes);
            self.buffer_len += bytes.len();
            return;
        }

        let mut bytes = bytes;

        if self.buffer_len != 0 {
            let needed = 16 - self.buffer_len;
            self.buffer[self.buffer_len..].copy_from_slice(&bytes[..needed]);
            let chunk = self.buffer;
            self.update(&chunk);
            self.buffer_len = 0;
            bytes = &bytes[needed..];
        }

        let mut chunks = bytes.chunks_exact(16);
        for chunk in &mut chunks {
            self.update(chunk);
        }

        let remainder = chunks.remainder();
        if !remainder.is_empty() {
            self.buffer[..remainder.len()].copy_from_slice(remainder);
            self.buffer_len = remainder.len();
        }
    }
}

#[inline]
fn round(mut acc: u32, input: u32) -> u32 {
    acc = acc.wrapping_add(input.wrapping_mul(P2));
    acc = acc.rotate_left(13);
    acc.wrapping_mul(P1)
}

#[inline]
fn finalize(mut hash: u32) -> u32 {
    hash ^= hash >> 15;
    hash = hash.wrapping_mul(P2);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(P3);
    hash ^ (hash >> 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xxhash32(data: &[u8], seed: u32) -> u32 {
        let mut hasher = XxHash32::with_seed(seed);
        hasher.write(data);
        hasher.finish32()
    }

    #[test]
    fn test_vectors_seed_zero() {
        assert_eq!(xxhash32(b"", 0), 0x02CC5D05);
        assert_eq!(xxhash32(b"abc", 0), 0x32D153FF);
        assert_eq!(xxhash32(b"abcd", 0), 0xA3643705);
        // Longer than one 16-byte stripe, exercises the lane accumulators.
        assert_eq!(
            xxhash32(b"Nobody inspects the spammish repetition", 0),
            0xE2293B2F
        );
    }

    #[test]
    fn test_shortcut_matches_streaming() {
        for (input, seed) in [(0u32, 0u32), (123, 0), (u32::MAX, 0xFFFFFFFF), (42, 7)] {
            let hash1 = XxHash32::hash_u32(input, seed);
            let mut hasher = XxHash32::with_seed(seed);
            hasher.write(&input.to_le_bytes());
            let hash2 = hasher.finish32();
            assert_eq!(hash2, hash1);
        }
    }

    #[test]
    fn test_seed_changes_hash() {
        assert_ne!(XxHash32::hash_u32(1, 0), XxHash32::hash_u32(1, 1));
        assert_ne!(XxHash32::hash_u32(1, 0), XxHash32::hash_u32(1, 0xFFFFFFFF));
    }

    #[test]
    fn test_split_writes_match_single_write() {
        let data = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let whole = xxhash32(data, 99);
        let mut hasher = XxHash32::with_seed(99);
        hasher.write(&data[..5]);
        hasher.write(&data[5..20]);
        hasher.write(&data[20..]);
        assert_eq!(hasher.finish32(), whole);
    }
}
