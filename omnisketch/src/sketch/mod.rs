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

//! OmniSketch implementation for multi-dimensional predicate counting.
//!
//! OmniSketch approximates the number of records matching conjunctive
//! equality predicates across several attributes. Per attribute it keeps
//! a Count-Min-style matrix whose cells carry a bottom-k sample of
//! record IDs next to the counter; an estimate intersects those samples
//! across attributes and scales by the largest counted cell.
//!
//! The caller supplies already-hashed column values, one 32-bit hash per
//! column; type-specific hashing is a host concern.
//!
//! # Usage
//!
//! ```rust
//! use omnisketch::sketch::OmniSketch;
//!
//! let mut sketch = OmniSketch::new(0.1, 0.1, 2).unwrap();
//!
//! for i in 0..1000u32 {
//!     sketch.add(&[i % 10, i % 5]).unwrap();
//! }
//!
//! sketch.finalize();
//!
//! let estimate = sketch.estimate(&[3, 3]).unwrap();
//! assert!(estimate >= 0);
//! assert_eq!(sketch.count(), 1000);
//! ```
//!
//! # Parallel building
//!
//! Independently built sketches over disjoint input partitions can be
//! folded into one with [`combine`]; each sketch's random seed keeps the
//! record ID spaces disjoint with high probability.
//!
//! ```rust
//! use omnisketch::sketch::{combine, OmniSketch};
//!
//! let mut merged = None;
//! for shard in 0..4u32 {
//!     let mut sketch = OmniSketch::new(0.1, 0.1, 2).unwrap();
//!     for i in (shard..1000).step_by(4) {
//!         sketch.add(&[i % 10, i % 5]).unwrap();
//!     }
//!     merged = combine(merged, Some(sketch)).unwrap();
//! }
//!
//! let mut merged = merged.unwrap();
//! merged.finalize();
//! assert_eq!(merged.count(), 1000);
//! ```

mod bucket;
mod combine;
mod serialization;
#[allow(clippy::module_inception)]
mod sketch;

pub use self::combine::combine;
pub use self::sketch::MAX_ITEM_BITS;
pub use self::sketch::MAX_SAMPLE_SIZE;
pub use self::sketch::MAX_SKETCH_BYTES;
pub use self::sketch::OmniSketch;
pub use self::sketch::OmniSketchBuilder;
