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

//! OmniSketch: a multi-dimensional streaming sketch that approximates
//! the count of records matching conjunctive equality predicates.
//!
//! Based on "OmniSketch: Efficient Multi-Dimensional High-Velocity
//! Stream Analytics with Arbitrary Predicates" by Punter, Papapetrou,
//! and Garofalakis (VLDB 2023).
//!
//! The sketch is a pure in-memory data structure: no threads, locks, or
//! I/O. Mutation (`add`, `merge`, `finalize`) requires exclusive access
//! and reads (`estimate`, `serialize`) shared access; hosts running
//! producers in parallel build one sketch per input partition and fold
//! them with [`sketch::combine`].
//!
//! # Usage
//!
//! ```rust
//! use omnisketch::sketch::OmniSketch;
//!
//! let mut sketch = OmniSketch::new(0.1, 0.1, 2).unwrap();
//! sketch.add(&[7, 42]).unwrap();
//! sketch.finalize();
//!
//! assert_eq!(sketch.count(), 1);
//! ```

mod codec;
pub mod common;
pub mod error;
mod hash;
pub mod sketch;
