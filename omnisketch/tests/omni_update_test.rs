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

use common::coarse_builder;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use omnisketch::error::ErrorKind;
use omnisketch::sketch::OmniSketch;

#[test]
fn test_new_sketch_is_empty() {
    let sketch = OmniSketch::new(0.1, 0.1, 3).unwrap();
    assert!(sketch.is_empty());
    assert_eq!(sketch.count(), 0);
    assert_eq!(sketch.num_columns(), 3);
}

#[test]
fn test_count_accumulates() {
    let mut sketch = coarse_builder().num_columns(2).seed(9).build().unwrap();
    for i in 0..1000u32 {
        sketch.add(&[i % 10, i % 3]).unwrap();
    }
    assert_eq!(sketch.count(), 1000);
    assert!(!sketch.is_empty());
}

#[test]
fn test_add_with_wrong_column_count() {
    let mut sketch = coarse_builder().num_columns(2).seed(9).build().unwrap();

    let err = sketch.add(&[1, 2, 3]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
    assert_that!(
        err.message(),
        contains_substring("number of record attributes")
    );

    // The failed call must leave the sketch untouched.
    assert_eq!(sketch.count(), 0);
}

#[test]
fn test_null_sentinel_hash_is_accepted() {
    let mut sketch = coarse_builder().num_columns(2).seed(9).build().unwrap();
    // Hosts hash NULL column values to 0.
    for _ in 0..10 {
        sketch.add(&[0, 0]).unwrap();
    }
    sketch.finalize();
    assert_eq!(sketch.count(), 10);
    assert!(sketch.estimate(&[0, 0]).unwrap() >= 0);
}

#[test]
fn test_add_after_finalize_keeps_working() {
    let mut sketch = coarse_builder().num_columns(1).seed(3).build().unwrap();
    for i in 0..100u32 {
        sketch.add(&[i % 4]).unwrap();
    }
    sketch.finalize();

    for i in 0..100u32 {
        sketch.add(&[i % 4]).unwrap();
    }
    sketch.finalize();

    assert_eq!(sketch.count(), 200);
}

#[test]
fn test_fixed_seed_makes_builds_reproducible() {
    let build = || {
        let mut sketch = coarse_builder().num_columns(2).seed(77).build().unwrap();
        for i in 0..2000u32 {
            sketch.add(&[i % 20, i % 10]).unwrap();
        }
        sketch.finalize();
        sketch
    };

    let a = build();
    let b = build();
    assert_eq!(a.serialize(), b.serialize());
}
