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

#![allow(dead_code)]

//! Shared helpers for omnisketch integration tests.

use omnisketch::sketch::OmniSketch;

pub const EPSILON: f64 = 0.01;
pub const DELTA: f64 = 0.01;

/// Build a two-column sketch at the default test accuracy over the given
/// records, with a fixed seed so runs are reproducible. Column values
/// are passed straight through as their own hashes; the row hashing
/// inside the sketch redistributes them.
pub fn two_column_sketch(seed: u32, records: impl IntoIterator<Item = (u32, u32)>) -> OmniSketch {
    let mut sketch = OmniSketch::builder()
        .epsilon(EPSILON)
        .delta(DELTA)
        .num_columns(2)
        .seed(seed)
        .build()
        .unwrap();

    for (a, b) in records {
        sketch.add(&[a, b]).unwrap();
    }

    sketch
}

/// The correlated workload of the estimation scenarios: record i has
/// both columns equal to i mod 100, so every residue has frequency
/// n / 100 and the two predicates always agree.
pub fn correlated_records(n: u32) -> impl Iterator<Item = (u32, u32)> {
    (0..n).map(|i| (i % 100, i % 100))
}

/// A small sketch shape for tests that exercise structure rather than
/// accuracy.
pub fn coarse_builder() -> omnisketch::sketch::OmniSketchBuilder {
    OmniSketch::builder().epsilon(0.1).delta(0.1)
}
