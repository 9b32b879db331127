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

use std::io::Write;

use oboeta_core::Fallible;
use oboeta_core::parser::check_field_indices;

use crate::cmd::drill::DrillConfig;
use crate::cmd::drill::drill_files;
use crate::cmd::leitner::LeitnerConfig;
use crate::cmd::leitner::select_leitner;

/// Select due lines with the Leitner scheduler, then drill them.
pub fn run_review<O: Write>(leitner: &LeitnerConfig, drill: &DrillConfig, out: O) -> Fallible<()> {
    let picked = select_leitner(leitner)?;
    if let Some((front, back)) = drill.sides {
        let deck_path = leitner.deck.display().to_string();
        check_field_indices(&deck_path, &picked, &[front, back])?;
    }
    if picked.is_empty() {
        log::debug!("No lines due");
        return Ok(());
    }
    let cards = picked.into_iter().map(|row| row.record).collect();
    drill_files(drill, cards, out)
}
