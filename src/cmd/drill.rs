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

//! Review cards in random order until all pass, appending results to the
//! log.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::path::PathBuf;

use oboeta_core::DateFormat;
use oboeta_core::ErrorReport;
use oboeta_core::Fallible;
use oboeta_core::PassFail;
use oboeta_core::Record;
use oboeta_core::Timestamp;
use oboeta_core::TinyRng;
use oboeta_core::parse_deck_rows;
use oboeta_core::parser::check_field_indices;
use oboeta_core::rng::shuffle;

use crate::output::row_writer;
use crate::output::write_row;
use crate::utils::open_log_for_append;
use crate::utils::read_deck_text;

pub struct DrillConfig {
    pub log: PathBuf,
    /// Where review commands come from, usually a named pipe.
    pub command_file: PathBuf,
    pub field_sep: u8,
    pub date_format: DateFormat,
    /// Don't write anything to the log.
    pub dry_run: bool,
    /// Front and back field indices. When set, cards are shown as
    /// `id, front, back` rather than the whole row.
    pub sides: Option<(usize, usize)>,
    pub seed: u64,
}

enum Command {
    Review(PassFail),
    Quit,
}

fn read_command<C: BufRead>(commands: &mut C) -> Fallible<Command> {
    let mut line = String::new();
    if commands.read_line(&mut line)? == 0 {
        return Err(ErrorReport::data("unexpected end of commands"));
    }
    match line.trim_end_matches(['\n', '\r']) {
        "+" => Ok(Command::Review(PassFail::Pass)),
        "-" => Ok(Command::Review(PassFail::Fail)),
        "q" | "Q" => Ok(Command::Quit),
        other => Err(ErrorReport::data(format!("unrecognized command: {other}"))),
    }
}

struct Card {
    record: Record,
    /// Whether the card has been failed during this session.
    failed: bool,
}

/// Run a drill session over `cards`.
///
/// A failed card goes to the back of the session and comes round again
/// once every other card has been shown. A pass is only logged for a
/// card that has not failed in this session.
pub fn drill<C, O, L>(
    config: &DrillConfig,
    cards: Vec<Record>,
    mut commands: C,
    out: O,
    log: Option<L>,
    mut clock: impl FnMut() -> Timestamp,
) -> Fallible<()>
where
    C: BufRead,
    O: Write,
    L: Write,
{
    let mut rng = TinyRng::from_seed(config.seed);
    let cards: Vec<Card> = cards
        .into_iter()
        .map(|record| Card {
            record,
            failed: false,
        })
        .collect();
    let mut reviewing: Vec<Card> = shuffle(cards, &mut rng);
    let mut failed: Vec<Card> = Vec::new();
    let mut out = row_writer(out, config.field_sep);
    let mut log = if config.dry_run {
        None
    } else {
        log.map(|l| row_writer(l, config.field_sep))
    };

    loop {
        if reviewing.is_empty() {
            if failed.is_empty() {
                break;
            }
            reviewing = shuffle(std::mem::take(&mut failed), &mut rng);
        }
        let Some(mut card) = reviewing.pop() else {
            break;
        };

        match config.sides {
            Some((front, back)) => {
                let record = &card.record;
                let shown = [
                    record.id(),
                    record.field(front).unwrap_or_default(),
                    record.field(back).unwrap_or_default(),
                ];
                write_row(&mut out, shown)?;
            }
            None => write_row(&mut out, card.record.fields())?,
        }
        out.flush()?;

        let outcome = match read_command(&mut commands)? {
            Command::Quit => break,
            Command::Review(outcome) => outcome,
        };
        let log_it = outcome == PassFail::Fail || !card.failed;
        if let Some(log) = log.as_mut() {
            if log_it {
                let at = config.date_format.format(clock())?;
                write_row(log, [card.record.id(), at.as_str(), outcome.as_str()])?;
                log.flush()?;
            }
        }
        if outcome == PassFail::Fail {
            card.failed = true;
            failed.push(card);
        }
    }
    Ok(())
}

/// Load the deck, check the side indices, and drill it against the files
/// named in the config.
pub fn run_drill<O: Write>(config: &DrillConfig, deck: Option<PathBuf>, out: O) -> Fallible<()> {
    let (deck_path, deck_text) = read_deck_text(deck.as_deref())?;
    let rows = parse_deck_rows(&deck_path, &deck_text, config.field_sep)?;
    if let Some((front, back)) = config.sides {
        check_field_indices(&deck_path, &rows, &[front, back])?;
    }
    let cards = rows.into_iter().map(|row| row.record).collect();
    drill_files(config, cards, out)
}

/// Drill the given cards, reading commands from and logging to the files
/// named in the config.
pub fn drill_files<O: Write>(config: &DrillConfig, cards: Vec<Record>, out: O) -> Fallible<()> {
    let commands = BufReader::new(File::open(&config.command_file)?);
    let log = if config.dry_run {
        None
    } else {
        Some(open_log_for_append(&config.log)?)
    };
    log::debug!("Drilling {} cards", cards.len());
    drill(config, cards, commands, out, log, Timestamp::now)
}

#[cfg(test)]
mod tests {
    use std::fs::read_to_string;
    use std::fs::write;

    use oboeta_core::ErrorKind;
    use tempfile::tempdir;

    use super::*;

    fn config(sides: Option<(usize, usize)>, dry_run: bool) -> DrillConfig {
        DrillConfig {
            log: PathBuf::from("log.tsv"),
            command_file: PathBuf::from("commands"),
            field_sep: b'\t',
            date_format: DateFormat::new("%Y-%m-%d %H:%M:%S").unwrap(),
            dry_run,
            sides,
            seed: 1,
        }
    }

    fn cards(ids: &[&str]) -> Vec<Record> {
        ids.iter()
            .map(|id| {
                let fields = vec![id.to_string(), format!("front {id}"), format!("back {id}")];
                Record::new(fields).unwrap()
            })
            .collect()
    }

    fn clock() -> Timestamp {
        Timestamp::try_from("2024-05-01T12:00:00".to_string()).unwrap()
    }

    fn run(
        config: &DrillConfig,
        cards: Vec<Record>,
        commands: &str,
    ) -> (Fallible<()>, String, String) {
        let mut out = Vec::new();
        let mut log = Vec::new();
        let result = drill(config, cards, commands.as_bytes(), &mut out, Some(&mut log), clock);
        (
            result,
            String::from_utf8(out).unwrap(),
            String::from_utf8(log).unwrap(),
        )
    }

    #[test]
    fn test_all_pass() {
        let (result, out, log) = run(&config(None, false), cards(&["a", "b"]), "+\n+\n");
        assert!(result.is_ok());
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("a\tfront a\tback a"));
        let mut log: Vec<&str> = log.lines().collect();
        log.sort();
        assert_eq!(
            log,
            ["a\t2024-05-01 12:00:00\t+", "b\t2024-05-01 12:00:00\t+"]
        );
    }

    #[test]
    fn test_failed_card_repeats_and_pass_is_not_logged() {
        let (result, out, log) = run(&config(None, false), cards(&["a"]), "-\n-\n+\n");
        assert!(result.is_ok());
        assert_eq!(out.lines().count(), 3);
        assert_eq!(
            log.lines().collect::<Vec<_>>(),
            ["a\t2024-05-01 12:00:00\t-", "a\t2024-05-01 12:00:00\t-"]
        );
    }

    #[test]
    fn test_failed_cards_come_after_the_rest() {
        let (result, out, _) = run(&config(None, false), cards(&["a", "b", "c"]), "-\n+\n+\n+\n");
        assert!(result.is_ok());
        let shown: Vec<&str> = out.lines().map(|l| l.split('\t').next().unwrap()).collect();
        assert_eq!(shown.len(), 4);
        assert_eq!(shown[0], shown[3]);
    }

    #[test]
    fn test_quit() {
        let (result, out, log) = run(&config(None, false), cards(&["a", "b"]), "q\n");
        assert!(result.is_ok());
        assert_eq!(out.lines().count(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn test_dry_run_logs_nothing() {
        let (result, _, log) = run(&config(None, true), cards(&["a", "b"]), "-\n+\n+\n");
        assert!(result.is_ok());
        assert!(log.is_empty());
    }

    #[test]
    fn test_sides() {
        let (result, out, _) = run(&config(Some((2, 1)), false), cards(&["a"]), "+\n");
        assert!(result.is_ok());
        assert_eq!(out, "a\tback a\tfront a\n");
    }

    #[test]
    fn test_unrecognized_command() {
        let (result, _, _) = run(&config(None, false), cards(&["a"]), "y\n");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert_eq!(err.message(), "unrecognized command: y");
    }

    #[test]
    fn test_commands_run_out() {
        let (result, _, _) = run(&config(None, false), cards(&["a", "b"]), "+\n");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Data);
    }

    #[test]
    fn test_run_drill_checks_sides() -> Fallible<()> {
        let dir = tempdir()?;
        let deck = dir.path().join("deck.tsv");
        write(&deck, "a\tfront\tback\nb\tfront only\n")?;
        write(dir.path().join("commands"), "+\n+\n")?;
        write(dir.path().join("log.tsv"), "")?;
        let mut config = config(Some((1, 2)), false);
        config.log = dir.path().join("log.tsv");
        config.command_file = dir.path().join("commands");
        let err = run_drill(&config, Some(deck.clone()), Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(err.message().contains("deck.tsv:2:"));

        config.sides = None;
        run_drill(&config, Some(deck), Vec::new())?;
        assert_eq!(read_to_string(dir.path().join("log.tsv"))?.lines().count(), 2);
        Ok(())
    }
}
