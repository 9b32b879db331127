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

//! The SuperMemo 2 algorithm.

use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::Serialize;

use crate::replay::Scheduler;
use crate::types::timestamp::Timestamp;

/// The easiness factor of a line that has never been reviewed.
pub const INITIAL_EASINESS: f64 = 2.5;

/// The easiness factor never drops below this.
pub const MIN_EASINESS: f64 = 1.3;

/// The interval after the first successful review, in days.
const SECOND_INTERVAL: i64 = 6;

/// Quality of review response, in the range [0, 5].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize)]
#[serde(transparent)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    pub fn new(q: u8) -> Option<Self> {
        if q <= Self::MAX { Some(Self(q)) } else { None }
    }

    /// Responses below 3 reset the line.
    pub fn is_pass(self) -> bool {
        self.0 >= 3
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .ok()
            .and_then(|q| u8::try_from(q).ok())
            .and_then(Quality::new)
            .ok_or_else(|| format!("invalid quality response: {s}"))
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct Sm2State {
    /// Reviews since creation or since the last response below 3.
    pub interval_number: u32,
    /// Days added to the due date on the next passing response.
    pub interval: i64,
    pub easiness_factor: f64,
    pub due_date: Timestamp,
}

impl Sm2State {
    pub fn new(due_date: Timestamp) -> Self {
        Self {
            interval_number: 1,
            interval: 1,
            easiness_factor: INITIAL_EASINESS,
            due_date,
        }
    }

    /// The initial state of a line with no log history.
    pub fn never_reviewed() -> Self {
        Self::new(Timestamp::never_reviewed())
    }

    /// Apply a response given at `now`.
    ///
    /// On a pass the due date uses the interval that was just satisfied,
    /// and the following interval is computed afterwards from the easiness
    /// factor as it stood before this response.
    pub fn respond(&mut self, q: Quality, now: Timestamp) {
        if q.is_pass() {
            self.interval_number += 1;
            self.due_date = now.plus_days(self.interval);
            self.interval = if self.interval_number == 2 {
                SECOND_INTERVAL
            } else {
                (self.interval as f64 + self.easiness_factor).ceil() as i64
            };
        } else {
            self.interval_number = 1;
            self.interval = 1;
            self.due_date = now.plus_days(self.interval);
        }
        let d = (Quality::MAX - q.0) as f64;
        self.easiness_factor =
            f64::max(self.easiness_factor + 0.1 - d * (0.08 + 0.02 * d), MIN_EASINESS);
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sm2;

impl Scheduler for Sm2 {
    type Outcome = Quality;
    type State = Sm2State;

    fn initial(&self, at: Timestamp) -> Sm2State {
        Sm2State::new(at)
    }

    fn apply(&self, state: &mut Sm2State, outcome: Quality, at: Timestamp) {
        state.respond(outcome, at);
    }

    fn due_date(&self, state: &Sm2State) -> Timestamp {
        state.due_date
    }
}
