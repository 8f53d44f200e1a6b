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

use crate::error::Error;
use crate::sketch::OmniSketch;

/// Combine two partial aggregation states into one.
///
/// Either side may be absent, which is how host aggregates represent
/// "no input seen yet": the other side passes through unchanged, and two
/// absent sides stay absent. When both are present they must have been
/// sized identically; see [`OmniSketch::merge`].
///
/// # Examples
///
/// ```
/// # use omnisketch::sketch::{combine, OmniSketch};
/// let mut a = OmniSketch::builder()
///     .epsilon(0.1)
///     .delta(0.1)
///     .num_columns(1)
///     .seed(1)
///     .build()
///     .unwrap();
/// let mut b = OmniSketch::builder()
///     .epsilon(0.1)
///     .delta(0.1)
///     .num_columns(1)
///     .seed(2)
///     .build()
///     .unwrap();
/// a.add(&[10]).unwrap();
/// b.add(&[10]).unwrap();
///
/// let merged = combine(Some(a), Some(b)).unwrap().unwrap();
/// assert_eq!(merged.count(), 2);
///
/// assert!(combine(None, None).unwrap().is_none());
/// ```
pub fn combine(
    a: Option<OmniSketch>,
    b: Option<OmniSketch>,
) -> Result<Option<OmniSketch>, Error> {
    match (a, b) {
        (None, None) => Ok(None),
        (Some(a), None) => Ok(Some(a)),
        (None, Some(b)) => Ok(Some(b)),
        (Some(mut a), Some(b)) => {
            a.merge(&b)?;
            Ok(Some(a))
        }
    }
}
