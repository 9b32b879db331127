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

//! oboeta-core: scheduling core for oboeta.
//!
//! This library rebuilds each line's schedule from a review log on every
//! run, then picks a bounded random subset of the due lines:
//! - Leitner bucket scheduling and SuperMemo 2 (SM-2)
//! - Log replay in file order
//! - Reservoir sampling of due lines
//! - Deck and log parsing

pub mod error;
pub mod leitner;
pub mod parser;
pub mod replay;
pub mod rng;
pub mod sampler;
pub mod select;
pub mod sm2;
pub mod types;

// Re-exports for convenience
pub use error::{ErrorKind, ErrorReport, Fallible, RowError, fail};
pub use leitner::{BucketChain, BucketId, Leitner, LeitnerState, PassFail};
pub use parser::{Deck, DeckRow, parse_deck, parse_deck_rows, parse_log};
pub use replay::{LogEvent, Scheduler, replay};
pub use rng::TinyRng;
pub use sampler::{ReservoirSampler, Sampler, SamplerKind, TaggedSampler};
pub use select::{DueSelector, Scheduled, schedule};
pub use sm2::{Quality, Sm2, Sm2State};
pub use types::performance::Performance;
pub use types::record::Record;
pub use types::timestamp::{DateFormat, Timestamp};
