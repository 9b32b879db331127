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

use oboeta_core::DateFormat;
use oboeta_core::DueSelector;
use oboeta_core::Fallible;
use oboeta_core::Performance;
use oboeta_core::Quality;
use oboeta_core::Scheduled;
use oboeta_core::Sm2;
use oboeta_core::Sm2State;
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
use crate::utils::read_deck_text;

pub struct Sm2Config {
    /// The deck; standard input when absent.
    pub deck: Option<PathBuf>,
    pub log: PathBuf,
    pub field_sep: u8,
    pub date_format: DateFormat,
    pub selector: DueSelector,
    pub session_started_at: Timestamp,
    pub seed: u64,
    /// Dump every line regardless of whether it is due.
    pub show_all: bool,
    pub format: DumpFormat,
}

/// The deck fields followed by interval number, interval, easiness factor
/// and due date.
fn output_fields(line: &Scheduled<Sm2State>, date_format: &DateFormat) -> Fallible<Vec<String>> {
    let state = match &line.performance {
        Performance::New => Sm2State::never_reviewed(),
        Performance::Reviewed(state) => *state,
    };
    let mut fields: Vec<String> = line.record.fields().to_vec();
    fields.push(state.interval_number.to_string());
    fields.push(state.interval.to_string());
    fields.push(state.easiness_factor.to_string());
    fields.push(date_format.format(state.due_date)?);
    Ok(fields)
}

pub fn run_sm2<W: Write>(config: &Sm2Config, mut out: W) -> Fallible<()> {
    let (deck_path, deck_text) = read_deck_text(config.deck.as_deref())?;
    let deck = parse_deck(&deck_path, &deck_text, config.field_sep)?;
    log::debug!("Loaded {} lines from {deck_path}", deck.len());

    let log_path = config.log.display().to_string();
    let log_text = read_to_string(&config.log)?;
    let events = parse_log::<Quality>(&log_path, &log_text, config.field_sep, &config.date_format)?;
    let states = replay(&Sm2, events);
    let lines = schedule(&deck, &states);

    let lines = if config.show_all {
        lines
    } else {
        let mut rng = TinyRng::from_seed(config.seed);
        config
            .selector
            .select(&Sm2, lines, config.session_started_at, &mut rng)
    };

    if config.show_all && config.format == DumpFormat::Json {
        for line in &lines {
            write_json_line(&mut out, line)?;
        }
        return Ok(());
    }
    // Format everything first so a bad date pattern leaves no partial output.
    let rows = lines
        .iter()
        .map(|line| output_fields(line, &config.date_format))
        .collect::<Fallible<Vec<_>>>()?;
    let mut writer = row_writer(&mut out, config.field_sep);
    for row in &rows {
        write_row(&mut writer, row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs::write;
    use std::path::Path;

    use oboeta_core::ErrorKind;
    use oboeta_core::SamplerKind;
    use tempfile::tempdir;

    use super::*;

    fn config(dir: &Path, now: &str) -> Sm2Config {
        Sm2Config {
            deck: Some(dir.join("deck.tsv")),
            log: dir.join("log.tsv"),
            field_sep: b'\t',
            date_format: DateFormat::new("%Y-%m-%d").unwrap(),
            selector: DueSelector {
                num_old: 10,
                num_new: 10,
                sampler: SamplerKind::Reservoir,
            },
            session_started_at: Timestamp::try_from(now.to_string()).unwrap(),
            seed: 7,
            show_all: false,
            format: DumpFormat::Rows,
        }
    }

    fn output_lines(out: Vec<u8>) -> BTreeSet<String> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_show_all() -> Fallible<()> {
        let dir = tempdir()?;
        write(dir.path().join("deck.tsv"), "x\tfront\tback\ny\tnew card\n")?;
        write(dir.path().join("log.tsv"), "x\t2024-03-01\t5\nx\t2024-03-02\t4\n")?;
        let mut config = config(dir.path(), "2024-03-03T00:00:00");
        config.show_all = true;
        let mut out = Vec::new();
        run_sm2(&config, &mut out)?;
        let expected: BTreeSet<String> = [
            "x\tfront\tback\t3\t9\t2.6\t2024-03-08",
            "y\tnew card\t1\t1\t2.5\t0001-01-01",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(output_lines(out), expected);
        Ok(())
    }

    #[test]
    fn test_selects_only_due_lines() -> Fallible<()> {
        let dir = tempdir()?;
        write(dir.path().join("deck.tsv"), "x\tfront\ny\tother\nz\tnew\n")?;
        write(
            dir.path().join("log.tsv"),
            "x\t2024-03-01\t5\ny\t2024-03-01\t5\ny\t2024-03-02\t5\n",
        )?;
        // x is due on 03-02, y on 03-08.
        let config = config(dir.path(), "2024-03-03T00:00:00");
        let mut out = Vec::new();
        run_sm2(&config, &mut out)?;
        let ids: BTreeSet<String> = output_lines(out)
            .iter()
            .map(|l| l.split('\t').next().unwrap().to_string())
            .collect();
        let expected: BTreeSet<String> = ["x", "z"].iter().map(|s| s.to_string()).collect();
        assert_eq!(ids, expected);
        Ok(())
    }

    #[test]
    fn test_failed_line_is_due_next_day() -> Fallible<()> {
        let dir = tempdir()?;
        write(dir.path().join("deck.tsv"), "x\tfront\n")?;
        write(dir.path().join("log.tsv"), "x\t2024-03-01\t5\nx\t2024-03-02\t1\n")?;
        let mut out = Vec::new();
        run_sm2(&config(dir.path(), "2024-03-03T00:00:00"), &mut out)?;
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("x\tfront\t1\t1\t"));
        assert!(text.trim_end().ends_with("2024-03-03"));
        Ok(())
    }

    #[test]
    fn test_out_of_range_quality() -> Fallible<()> {
        let dir = tempdir()?;
        write(dir.path().join("deck.tsv"), "x\tfront\n")?;
        write(dir.path().join("log.tsv"), "x\t2024-03-01\t9\n")?;
        let mut out = Vec::new();
        let err = run_sm2(&config(dir.path(), "2024-03-03T00:00:00"), &mut out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(err.message().ends_with("log.tsv:1: invalid quality response: 9"));
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn test_bad_rows_for_unknown_ids_still_abort() -> Fallible<()> {
        let dir = tempdir()?;
        write(dir.path().join("deck.tsv"), "x\tfront\n")?;
        write(dir.path().join("log.tsv"), "ghost\tnot a date\t3\n")?;
        let err = run_sm2(&config(dir.path(), "2024-03-03T00:00:00"), Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        Ok(())
    }
}
