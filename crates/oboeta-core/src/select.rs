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

use serde::Serialize;

use crate::parser::Deck;
use crate::parser::DeckRow;
use crate::replay::Scheduler;
use crate::rng::TinyRng;
use crate::sampler::SamplerKind;
use crate::types::performance::Performance;
use crate::types::record::Record;
use crate::types::timestamp::Timestamp;

/// A deck line joined with its schedule.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scheduled<S> {
    pub record: Record,
    /// Row number of the line in the deck.
    pub line_num: u64,
    pub performance: Performance<S>,
}

impl<S> Scheduled<S> {
    pub fn into_row(self) -> DeckRow {
        DeckRow {
            line_num: self.line_num,
            record: self.record,
        }
    }
}

/// Join the deck with the replayed states. Lines with no state are new;
/// states whose ID is not in the deck are dropped, since there is nothing
/// to show for them.
pub fn schedule<S: Clone>(deck: &Deck, states: &BTreeMap<String, S>) -> Vec<Scheduled<S>> {
    deck.iter()
        .map(|(id, row)| Scheduled {
            record: row.record.clone(),
            line_num: row.line_num,
            performance: match states.get(id) {
                Some(state) => Performance::Reviewed(state.clone()),
                None => Performance::New,
            },
        })
        .collect()
}

/// Whether a line is due at `now`. New lines are always due.
pub fn is_due<S: Scheduler>(
    scheduler: &S,
    performance: &Performance<S::State>,
    now: Timestamp,
) -> bool {
    match performance {
        Performance::New => true,
        Performance::Reviewed(state) => scheduler.due_date(state) <= now,
    }
}

/// Picks a bounded random subset of the due lines, drawing reviewed and new
/// lines from separate pools.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DueSelector {
    /// Most lines with log history to pick.
    pub num_old: usize,
    /// Most new lines to pick.
    pub num_new: usize,
    pub sampler: SamplerKind,
}

impl DueSelector {
    /// The output holds the reviewed sample followed by the new sample;
    /// order within each is arbitrary.
    pub fn select<S: Scheduler>(
        &self,
        scheduler: &S,
        lines: Vec<Scheduled<S::State>>,
        now: Timestamp,
        rng: &mut TinyRng,
    ) -> Vec<Scheduled<S::State>> {
        let mut old = self.sampler.build::<usize>(self.num_old);
        let mut new = self.sampler.build::<usize>(self.num_new);
        for (idx, line) in lines.iter().enumerate() {
            if !is_due(scheduler, &line.performance, now) {
                continue;
            }
            if line.performance.is_new() {
                new.add(idx, rng);
            } else {
                old.add(idx, rng);
            }
        }
        log::debug!(
            "Selected {} reviewed and {} new lines out of {}",
            old.len(),
            new.len(),
            lines.len()
        );
        let picked: Vec<usize> = old.into_sample().into_iter().chain(new.into_sample()).collect();
        let mut lines: Vec<Option<Scheduled<S::State>>> = lines.into_iter().map(Some).collect();
        picked
            .into_iter()
            .filter_map(|idx| lines[idx].take())
            .collect()
    }
}
