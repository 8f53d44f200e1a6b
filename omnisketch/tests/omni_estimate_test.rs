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

mod common;

use common::correlated_records;
use common::two_column_sketch;
use omnisketch::error::ErrorKind;
use omnisketch::sketch::OmniSketch;

// 100k records with both columns equal to i mod 100: every residue
// matches exactly 1000 records, and mismatched residue pairs match none.
#[test]
fn test_perfectly_correlated_columns() {
    let mut sketch = two_column_sketch(42, correlated_records(100_000));
    sketch.finalize();

    for q in 1..=10u32 {
        let matching = sketch.estimate(&[q, q]).unwrap();
        assert!(
            (500..=1500).contains(&matching),
            "estimate for ({q}, {q}) out of bounds: {matching}"
        );

        let disjoint = sketch.estimate(&[q, q + 1]).unwrap();
        assert!(
            disjoint < 500,
            "estimate for ({q}, {}) too high: {disjoint}",
            q + 1
        );
    }
}

#[test]
fn test_estimate_with_wrong_column_count() {
    let mut sketch = two_column_sketch(42, correlated_records(100));
    sketch.finalize();

    let err = sketch.estimate(&[1, 2, 3]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
}

#[test]
fn test_estimate_on_empty_sketch_is_zero() {
    let sketch = OmniSketch::new(0.01, 0.01, 2).unwrap();
    assert_eq!(sketch.estimate(&[1, 1]).unwrap(), 0);
}

#[test]
fn test_estimate_for_unseen_value_is_small() {
    let mut sketch = two_column_sketch(42, correlated_records(10_000));
    sketch.finalize();

    // Residues 100..  were never ingested; anything the estimator
    // returns for them is hash-collision noise.
    let unseen = sketch.estimate(&[500, 500]).unwrap();
    assert!(unseen < 100, "estimate for unseen value too high: {unseen}");
}

#[test]
fn test_estimate_never_exceeds_count() {
    let mut sketch = two_column_sketch(42, correlated_records(10_000));
    sketch.finalize();

    for q in 0..100u32 {
        let estimate = sketch.estimate(&[q, q]).unwrap();
        assert!(estimate <= sketch.count());
    }
}

// Ten times the records, ten times the estimate.
#[test]
fn test_scale_up() {
    let mut sketch = two_column_sketch(42, correlated_records(1_000_000));
    sketch.finalize();

    for q in 1..=5u32 {
        let matching = sketch.estimate(&[q, q]).unwrap();
        assert!(
            (5000..=15000).contains(&matching),
            "estimate for ({q}, {q}) out of bounds: {matching}"
        );
    }
}
