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

//! Bounded uniform sampling over a stream of unknown length.

use std::cmp::Ordering;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::rng::TinyRng;

/// A single-pass sampler holding at most a fixed number of items. Every
/// subset of size `min(capacity, n)` of an `n`-item stream is equally
/// likely to be the final sample.
pub trait Sampler<T> {
    fn add(&mut self, item: T, rng: &mut TinyRng);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the sampler, returning the sample in no particular order.
    fn into_sample(self: Box<Self>) -> Vec<T>;
}

/// Which sampling algorithm to use.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplerKind {
    /// Algorithm R: fill the slots, then overwrite a random slot.
    Reservoir,
    /// Keep the items with the largest random tags in a min-heap.
    Tagged,
}

impl SamplerKind {
    pub fn build<T: 'static>(self, capacity: usize) -> Box<dyn Sampler<T>> {
        match self {
            SamplerKind::Reservoir => Box::new(ReservoirSampler::new(capacity)),
            SamplerKind::Tagged => Box::new(TaggedSampler::new(capacity)),
        }
    }
}

impl Display for SamplerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplerKind::Reservoir => write!(f, "reservoir"),
            SamplerKind::Tagged => write!(f, "tagged"),
        }
    }
}

impl FromStr for SamplerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reservoir" => Ok(SamplerKind::Reservoir),
            "tagged" => Ok(SamplerKind::Tagged),
            _ => Err(format!("unknown sampler: {s}")),
        }
    }
}

/// Algorithm R.
pub enum ReservoirSampler<T> {
    /// Capacity 0: samples nothing.
    Disabled,
    Bounded {
        capacity: usize,
        /// Items offered so far.
        seen: u64,
        slots: Vec<T>,
    },
}

impl<T> ReservoirSampler<T> {
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            ReservoirSampler::Disabled
        } else {
            ReservoirSampler::Bounded {
                capacity,
                seen: 0,
                slots: Vec::with_capacity(capacity),
            }
        }
    }
}

impl<T> Sampler<T> for ReservoirSampler<T> {
    fn add(&mut self, item: T, rng: &mut TinyRng) {
        let ReservoirSampler::Bounded {
            capacity,
            seen,
            slots,
        } = self
        else {
            return;
        };
        *seen += 1;
        if slots.len() < *capacity {
            slots.push(item);
        } else {
            let slot = rng.generate(*seen) as usize;
            if slot < *capacity {
                slots[slot] = item;
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            ReservoirSampler::Disabled => 0,
            ReservoirSampler::Bounded { slots, .. } => slots.len(),
        }
    }

    fn into_sample(self: Box<Self>) -> Vec<T> {
        match *self {
            ReservoirSampler::Disabled => Vec::new(),
            ReservoirSampler::Bounded { slots, .. } => slots,
        }
    }
}

/// A sampled item with its random tag. Ties on the tag are broken by
/// arrival order, so the ordering is total.
struct Tagged<T> {
    tag: f64,
    seq: u64,
    item: T,
}

impl<T> Tagged<T> {
    fn key_cmp(&self, tag: f64, seq: u64) -> Ordering {
        self.tag.total_cmp(&tag).then(self.seq.cmp(&seq))
    }
}

impl<T> PartialEq for Tagged<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Tagged<T> {}

impl<T> PartialOrd for Tagged<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Tagged<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key_cmp(other.tag, other.seq)
    }
}

/// Keeps the `capacity` items with the largest uniform tags.
pub enum TaggedSampler<T> {
    Disabled,
    Bounded {
        capacity: usize,
        seq: u64,
        heap: BinaryHeap<Reverse<Tagged<T>>>,
    },
}

impl<T> TaggedSampler<T> {
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            TaggedSampler::Disabled
        } else {
            TaggedSampler::Bounded {
                capacity,
                seq: 0,
                heap: BinaryHeap::with_capacity(capacity),
            }
        }
    }
}

impl<T> Sampler<T> for TaggedSampler<T> {
    fn add(&mut self, item: T, rng: &mut TinyRng) {
        let TaggedSampler::Bounded {
            capacity,
            seq,
            heap,
        } = self
        else {
            return;
        };
        let tag = rng.next_f64();
        *seq += 1;
        let entry = Tagged {
            tag,
            seq: *seq,
            item,
        };
        if heap.len() < *capacity {
            heap.push(Reverse(entry));
        } else if let Some(mut min) = heap.peek_mut() {
            if min.0.key_cmp(tag, *seq) == Ordering::Less {
                *min = Reverse(entry);
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            TaggedSampler::Disabled => 0,
            TaggedSampler::Bounded { heap, .. } => heap.len(),
        }
    }

    fn into_sample(self: Box<Self>) -> Vec<T> {
        match *self {
            TaggedSampler::Disabled => Vec::new(),
            TaggedSampler::Bounded { heap, .. } => {
                heap.into_iter().map(|Reverse(t)| t.item).collect()
            }
        }
    }
}
