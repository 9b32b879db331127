// Copyright 2026 The oboeta Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Leitner scheduling: lines hop up a chain of buckets on success and fall
//! back to the first bucket on failure.

use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::replay::Scheduler;
use crate::types::timestamp::Timestamp;

/// Index of a bucket in a [`BucketChain`]. Bucket 0 is the first bucket.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize)]
#[serde(transparent)]
pub struct BucketId(usize);

impl BucketId {
    pub const FIRST: BucketId = BucketId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for BucketId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The bucket configuration: bucket 0 has no delay, bucket `i` (for
/// `1 <= i <= N`) has the `i`-th configured delay in days.
#[derive(Clone, Debug, PartialEq)]
pub struct BucketChain {
    delays: Vec<i64>,
}

impl BucketChain {
    /// Build a chain from the delays of buckets 1..=N. At least one delay
    /// is required and every delay must be positive.
    pub fn new(delays: &[i64]) -> Fallible<Self> {
        if delays.is_empty() {
            return Err(ErrorReport::config("at least one bucket delay is required"));
        }
        if delays.iter().any(|&d| d <= 0) {
            return Err(ErrorReport::config(
                "zero and negative bucket delays are not allowed",
            ));
        }
        let mut all = Vec::with_capacity(delays.len() + 1);
        all.push(0);
        all.extend_from_slice(delays);
        Ok(Self { delays: all })
    }

    /// The highest bucket.
    pub fn top(&self) -> BucketId {
        BucketId(self.delays.len() - 1)
    }

    /// The successor of a bucket. The top bucket is its own successor.
    pub fn next(&self, id: BucketId) -> BucketId {
        BucketId(usize::min(id.0 + 1, self.top().0))
    }

    /// The delay of a bucket, in days.
    pub fn delay(&self, id: BucketId) -> i64 {
        self.delays[id.0]
    }
}

/// The outcome of a single review.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum PassFail {
    Pass,
    Fail,
}

impl PassFail {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassFail::Pass => "+",
            PassFail::Fail => "-",
        }
    }
}

impl FromStr for PassFail {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(PassFail::Pass),
            "-" => Ok(PassFail::Fail),
            _ => Err("invalid mutation in third field: must be + or -".to_string()),
        }
    }
}

/// Where a line sits in the chain and when it is next due.
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct LeitnerState {
    pub bucket: BucketId,
    pub due_date: Timestamp,
}

impl LeitnerState {
    /// Move to the next bucket and reschedule by that bucket's delay.
    pub fn promote(&mut self, chain: &BucketChain, at: Timestamp) {
        self.bucket = chain.next(self.bucket);
        self.due_date = at.plus_days(chain.delay(self.bucket));
    }

    /// Fall back to the first bucket, due immediately.
    pub fn demote(&mut self, chain: &BucketChain, at: Timestamp) {
        self.bucket = BucketId::FIRST;
        self.due_date = at.plus_days(chain.delay(self.bucket));
    }
}

#[derive(Clone, Debug)]
pub struct Leitner {
    chain: BucketChain,
}

impl Leitner {
    pub fn new(chain: BucketChain) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &BucketChain {
        &self.chain
    }
}

impl Scheduler for Leitner {
    type Outcome = PassFail;
    type State = LeitnerState;

    fn initial(&self, at: Timestamp) -> LeitnerState {
        LeitnerState {
            bucket: BucketId::FIRST,
            due_date: at,
        }
    }

    fn apply(&self, state: &mut LeitnerState, outcome: PassFail, at: Timestamp) {
        match outcome {
            PassFail::Pass => state.promote(&self.chain, at),
            PassFail::Fail => state.demote(&self.chain, at),
        }
    }

    fn due_date(&self, state: &LeitnerState) -> Timestamp {
        state.due_date
    }
}
