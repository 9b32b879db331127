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

use std::collections::BTreeMap;

use crate::types::timestamp::Timestamp;

/// A per-line state transition policy.
pub trait Scheduler {
    /// What a log row records about a review.
    type Outcome: Copy;
    /// What the scheduler remembers about a line.
    type State: Clone;

    /// The state of a line first seen in the log at `at`, before its first
    /// event is applied.
    fn initial(&self, at: Timestamp) -> Self::State;

    /// Apply one review outcome recorded at `at`.
    fn apply(&self, state: &mut Self::State, outcome: Self::Outcome, at: Timestamp);

    fn due_date(&self, state: &Self::State) -> Timestamp;
}

/// One row of the review log.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEvent<O> {
    pub id: String,
    pub timestamp: Timestamp,
    pub outcome: O,
}

/// Fold the log, in the order given, into per-line states. Every ID that
/// appears in the log gets a state, whether or not it is in the deck.
pub fn replay<S: Scheduler>(
    scheduler: &S,
    events: impl IntoIterator<Item = LogEvent<S::Outcome>>,
) -> BTreeMap<String, S::State> {
    let mut states: BTreeMap<String, S::State> = BTreeMap::new();
    let mut count: usize = 0;
    for LogEvent {
        id,
        timestamp,
        outcome,
    } in events
    {
        let state = states
            .entry(id)
            .or_insert_with(|| scheduler.initial(timestamp));
        scheduler.apply(state, outcome, timestamp);
        count += 1;
    }
    log::debug!("Replayed {count} log events over {} lines", states.len());
    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;
    use crate::leitner::BucketChain;
    use crate::leitner::BucketId;
    use crate::leitner::Leitner;
    use crate::leitner::PassFail;
    use crate::sm2::Quality;
    use crate::sm2::Sm2;

    fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    fn event<O>(id: &str, at: &str, outcome: O) -> LogEvent<O> {
        LogEvent {
            id: id.to_string(),
            timestamp: ts(at),
            outcome,
        }
    }

    #[test]
    fn test_leitner_replay() -> Fallible<()> {
        let leitner = Leitner::new(BucketChain::new(&[1, 3])?);
        let states = replay(
            &leitner,
            vec![
                event("a", "2024-01-01T10:00:00", PassFail::Pass),
                event("b", "2024-01-01T10:00:00", PassFail::Fail),
                event("a", "2024-01-02T10:00:00", PassFail::Pass),
            ],
        );
        assert_eq!(states.len(), 2);
        assert_eq!(states["a"].bucket, leitner.chain().top());
        assert_eq!(states["a"].due_date, ts("2024-01-05T10:00:00"));
        assert_eq!(states["b"].bucket, BucketId::FIRST);
        assert_eq!(states["b"].due_date, ts("2024-01-01T10:00:00"));
        Ok(())
    }

    /// Replay follows file order even when timestamps run backwards.
    #[test]
    fn test_file_order_not_time_order() -> Fallible<()> {
        let leitner = Leitner::new(BucketChain::new(&[1, 3])?);
        let states = replay(
            &leitner,
            vec![
                event("a", "2024-01-05T10:00:00", PassFail::Fail),
                event("a", "2024-01-01T10:00:00", PassFail::Pass),
            ],
        );
        assert_eq!(states["a"].bucket.index(), 1);
        assert_eq!(states["a"].due_date, ts("2024-01-02T10:00:00"));
        Ok(())
    }

    #[test]
    fn test_sm2_replay() {
        let q = |v| Quality::new(v).unwrap();
        let states = replay(
            &Sm2,
            vec![
                event("x", "2024-03-01T00:00:00", q(5)),
                event("x", "2024-03-02T00:00:00", q(4)),
            ],
        );
        let x = &states["x"];
        assert_eq!(x.interval_number, 3);
        assert_eq!(x.interval, 9);
        assert!((x.easiness_factor - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_empty_log() {
        let states = replay(&Sm2, Vec::new());
        assert!(states.is_empty());
    }
}
