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

use std::fs::read_to_string;
use std::io::Write;
use std::path::PathBuf;

use oboeta_core::BucketChain;
use oboeta_core::DateFormat;
use oboeta_core::DeckRow;
use oboeta_core::DueSelector;
use oboeta_core::Fallible;
use oboeta_core::Leitner;
use oboeta_core::LeitnerState;
use oboeta_core::PassFail;
use oboeta_core::Performance;
use oboeta_core::Scheduled;
use oboeta_core::Timestamp;
use oboeta_core::TinyRng;
use oboeta_core::parse_deck;
use oboeta_core::parse_log;
use oboeta_core::replay;
use oboeta_core::schedule;

use crate::output::DumpFormat;
use crate::output::row_writer;
use crate::output::write_json_line;
use crate::output::write_row;

pub struct LeitnerConfig {
    pub deck: PathBuf,
    pub log: PathBuf,
    pub field_sep: u8,
    pub date_format: DateFormat,
    pub chain: BucketChain,
    pub selector: DueSelector,
    /// "Now": new lines are due at this moment, and lines due at or before
    /// it are eligible.
    pub session_started_at: Timestamp,
    pub seed: u64,
    /// Dump every line with its bucket instead of selecting.
    pub show_buckets: bool,
    pub format: DumpFormat,
}

/// Replay the log and join it with the deck.
fn load_schedule(config: &LeitnerConfig) -> Fallible<(Leitner, Vec<Scheduled<LeitnerState>>)> {
    let leitner = Leitner::new(config.chain.clone());
    let log_path = config.log.display().to_string();
    let log_text = read_to_string(&config.log)?;
    let events =
        parse_log::<PassFail>(&log_path, &log_text, config.field_sep, &config.date_format)?;
    let states = replay(&leitner, events);

    let deck_path = config.deck.display().to_string();
    let deck_text = read_to_string(&config.deck)?;
    let deck = parse_deck(&deck_path, &deck_text, config.field_sep)?;
    log::debug!("Loaded {} lines from {deck_path}", deck.len());
    Ok((leitner, schedule(&deck, &states)))
}

/// The randomly selected due lines, with their deck row numbers.
pub fn select_leitner(config: &LeitnerConfig) -> Fallible<Vec<DeckRow>> {
    let (leitner, lines) = load_schedule(config)?;
    let mut rng = TinyRng::from_seed(config.seed);
    let picked = config
        .selector
        .select(&leitner, lines, config.session_started_at, &mut rng);
    Ok(picked.into_iter().map(Scheduled::into_row).collect())
}

fn bucket_label(performance: &Performance<LeitnerState>) -> String {
    match performance {
        Performance::New => "-1".to_string(),
        Performance::Reviewed(state) => state.bucket.to_string(),
    }
}

pub fn run_leitner<W: Write>(config: &LeitnerConfig, mut out: W) -> Fallible<()> {
    if config.show_buckets {
        let (_, lines) = load_schedule(config)?;
        match config.format {
            DumpFormat::Rows => {
                let mut writer = row_writer(&mut out, config.field_sep);
                for line in &lines {
                    let label = bucket_label(&line.performance);
                    let fields = std::iter::once(label.as_str())
                        .chain(line.record.fields().iter().map(String::as_str));
                    write_row(&mut writer, fields)?;
                }
                writer.flush()?;
            }
            DumpFormat::Json => {
                for line in &lines {
                    write_json_line(&mut out, line)?;
                }
            }
        }
        return Ok(());
    }
    let picked = select_leitner(config)?;
    let mut writer = row_writer(&mut out, config.field_sep);
    for row in &picked {
        write_row(&mut writer, row.record.fields())?;
    }
    writer.flush()?;
    Ok(())
}
