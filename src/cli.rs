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

use std::io::stdout;
use std::path::Path;
use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use oboeta_core::BucketChain;
use oboeta_core::DateFormat;
use oboeta_core::DueSelector;
use oboeta_core::Fallible;
use oboeta_core::SamplerKind;
use oboeta_core::Timestamp;
use oboeta_core::TinyRng;
use oboeta_core::fail;

use crate::cmd::drill::DrillConfig;
use crate::cmd::drill::run_drill;
use crate::cmd::leitner::LeitnerConfig;
use crate::cmd::leitner::run_leitner;
use crate::cmd::review::run_review;
use crate::cmd::sm2::Sm2Config;
use crate::cmd::sm2::run_sm2;
use crate::config::DEFAULT_FIELD_SEP;
use crate::config::DEFAULT_NUM_LINES;
use crate::config::DEFAULT_NUM_NEW_LINES;
use crate::config::FileConfig;
use crate::config::LEITNER_DATE_FORMAT;
use crate::config::SM2_DATE_FORMAT;
use crate::config::Validator;
use crate::output::DumpFormat;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Select due lines from a deck according to a Leitner scheduler.
    Leitner {
        /// Field-separated file of lines. The first field is the line's ID.
        deck: PathBuf,
        /// Field-separated log of `id, timestamp, +|-` records.
        log: PathBuf,
        /// Days to add to a line's due date when it moves into each bucket
        /// after the first.
        #[arg(allow_negative_numbers = true)]
        bucket_delays: Vec<i64>,
        #[command(flatten)]
        format: FormatArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Print every line prefixed by its bucket number (-1 for new lines)
        /// instead of selecting.
        #[arg(short = 'b', long)]
        show_buckets: bool,
        /// Output format of --show-buckets.
        #[arg(long, default_value_t = DumpFormat::Rows)]
        dump_format: DumpFormat,
    },
    /// Select due lines according to the SuperMemo 2 algorithm. Prints each
    /// line with its interval number, interval, easiness factor and due date
    /// appended.
    Sm2 {
        /// Field-separated log of `id, timestamp, quality` records.
        log: PathBuf,
        /// The deck. By default, it is read from standard input.
        #[arg(long)]
        deck: Option<PathBuf>,
        #[command(flatten)]
        format: FormatArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Print every line, whether or not it is due.
        #[arg(short = 'a', long)]
        show_all: bool,
        /// Output format of --show-all.
        #[arg(long, default_value_t = DumpFormat::Rows)]
        dump_format: DumpFormat,
    },
    /// Review lines as flashcards in random order until all pass, logging
    /// the results.
    Drill {
        /// A file (usually a named pipe) providing `+`, `-` or `q` commands.
        command_file: PathBuf,
        /// The log to append results to.
        log: PathBuf,
        /// The deck. By default, it is read from standard input.
        #[arg(long)]
        deck: Option<PathBuf>,
        #[command(flatten)]
        format: FormatArgs,
        #[command(flatten)]
        drill: DrillArgs,
    },
    /// Select due lines with the Leitner scheduler, then drill them.
    Review {
        deck: PathBuf,
        log: PathBuf,
        command_file: PathBuf,
        #[arg(allow_negative_numbers = true)]
        bucket_delays: Vec<i64>,
        #[command(flatten)]
        format: FormatArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        drill: DrillArgs,
    },
}

#[derive(Args)]
struct FormatArgs {
    /// The field separator. Default is a tab.
    #[arg(short = 's', long)]
    field_sep: Option<String>,
    /// The strftime-style format of log timestamps.
    #[arg(short = 'f', long)]
    date_format: Option<String>,
    /// A TOML file with default settings.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct SelectionArgs {
    /// Maximum number of lines with log records to select. Default is 10.
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    num_lines: Option<i64>,
    /// Maximum number of lines without log records to select. Default is 4.
    #[arg(short = 'e', long, allow_negative_numbers = true)]
    num_new_lines: Option<i64>,
    /// Which sampling algorithm to use: `tagged` or `reservoir`.
    #[arg(long)]
    sampler: Option<SamplerKind>,
    /// Seed for the random selection. By default, the clock is used.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct DrillArgs {
    /// Don't log the results of the review.
    #[arg(short = 'd', long)]
    dry_run: bool,
    /// Zero-based index of the field holding the front of the card.
    #[arg(long, allow_negative_numbers = true, requires = "back")]
    front: Option<i64>,
    /// Zero-based index of the field holding the back of the card.
    #[arg(long, allow_negative_numbers = true, requires = "front")]
    back: Option<i64>,
    /// Seed for the shuffle. By default, the clock is used.
    #[arg(long = "shuffle-seed")]
    shuffle_seed: Option<u64>,
}

fn clock_seed() -> u64 {
    TinyRng::from_clock().next_u64()
}

/// Settings shared by every command.
struct Shared {
    field_sep: u8,
    date_format: Option<DateFormat>,
}

fn resolve_shared(
    v: &mut Validator,
    file: &FileConfig,
    args: &FormatArgs,
    default_date_format: &str,
) -> Shared {
    let sep = args
        .field_sep
        .as_deref()
        .or(file.field_sep.as_deref())
        .unwrap_or(DEFAULT_FIELD_SEP);
    let pattern = args
        .date_format
        .as_deref()
        .or(file.date_format.as_deref())
        .unwrap_or(default_date_format);
    Shared {
        field_sep: v.separator(sep),
        date_format: v.check(DateFormat::new(pattern)),
    }
}

fn resolve_selector(
    v: &mut Validator,
    file: &FileConfig,
    args: &SelectionArgs,
    default_sampler: SamplerKind,
) -> DueSelector {
    let num_old = args.num_lines.or(file.num_lines).unwrap_or(DEFAULT_NUM_LINES);
    let num_new = args
        .num_new_lines
        .or(file.num_new_lines)
        .unwrap_or(DEFAULT_NUM_NEW_LINES);
    DueSelector {
        num_old: v.count("number of lines", num_old),
        num_new: v.count("number of new lines", num_new),
        sampler: args.sampler.or(file.sampler).unwrap_or(default_sampler),
    }
}

fn resolve_chain(v: &mut Validator, file: &FileConfig, delays: Vec<i64>) -> Option<BucketChain> {
    let delays = if delays.is_empty() {
        file.bucket_delays.clone().unwrap_or_default()
    } else {
        delays
    };
    v.check(BucketChain::new(&delays))
}

fn resolve_sides(v: &mut Validator, args: &DrillArgs) -> Option<(usize, usize)> {
    match (args.front, args.back) {
        (Some(front), Some(back)) => Some((
            v.count("front field index", front),
            v.count("back field index", back),
        )),
        _ => None,
    }
}

/// Everything the Leitner selection needs. Fields are `None` when invalid;
/// the validator holds the reason.
struct LeitnerParts {
    shared: Shared,
    chain: Option<BucketChain>,
    selector: DueSelector,
}

fn resolve_leitner(
    v: &mut Validator,
    deck: &Path,
    log: &Path,
    bucket_delays: Vec<i64>,
    format: &FormatArgs,
    selection: &SelectionArgs,
) -> LeitnerParts {
    let file = load_file_config(v, format);
    let shared = resolve_shared(v, &file, format, LEITNER_DATE_FORMAT);
    let selector = resolve_selector(v, &file, selection, SamplerKind::Tagged);
    let chain = resolve_chain(v, &file, bucket_delays);
    v.require_file("deck", deck);
    v.require_file("log", log);
    LeitnerParts {
        shared,
        chain,
        selector,
    }
}

/// The TOML config named by `--config`. When it cannot be loaded the
/// defaults stand in, so the remaining settings are still checked.
fn load_file_config(v: &mut Validator, format: &FormatArgs) -> FileConfig {
    v.check(FileConfig::load(format.config.as_deref()))
        .unwrap_or_default()
}

fn require_files(v: &mut Validator, files: &[(&str, Option<&Path>)]) {
    for (what, path) in files {
        if let Some(path) = path {
            v.require_file(what, path);
        }
    }
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    let session_started_at = Timestamp::now();
    let out = stdout().lock();
    match cli {
        Command::Leitner {
            deck,
            log,
            bucket_delays,
            format,
            selection,
            show_buckets,
            dump_format,
        } => {
            let mut v = Validator::new();
            let parts = resolve_leitner(&mut v, &deck, &log, bucket_delays, &format, &selection);
            v.finish()?;
            let (Some(date_format), Some(chain)) = (parts.shared.date_format, parts.chain) else {
                return fail("invalid configuration");
            };
            let config = LeitnerConfig {
                deck,
                log,
                field_sep: parts.shared.field_sep,
                date_format,
                chain,
                selector: parts.selector,
                session_started_at,
                seed: selection.seed.unwrap_or_else(clock_seed),
                show_buckets,
                format: dump_format,
            };
            run_leitner(&config, out)
        }
        Command::Sm2 {
            log,
            deck,
            format,
            selection,
            show_all,
            dump_format,
        } => {
            let mut v = Validator::new();
            let file = load_file_config(&mut v, &format);
            let shared = resolve_shared(&mut v, &file, &format, SM2_DATE_FORMAT);
            let selector = resolve_selector(&mut v, &file, &selection, SamplerKind::Reservoir);
            require_files(&mut v, &[("log", Some(log.as_path())), ("deck", deck.as_deref())]);
            v.finish()?;
            let Some(date_format) = shared.date_format else {
                return fail("invalid date format");
            };
            let config = Sm2Config {
                deck,
                log,
                field_sep: shared.field_sep,
                date_format,
                selector,
                session_started_at,
                seed: selection.seed.unwrap_or_else(clock_seed),
                show_all,
                format: dump_format,
            };
            run_sm2(&config, out)
        }
        Command::Drill {
            command_file,
            log,
            deck,
            format,
            drill,
        } => {
            let mut v = Validator::new();
            let file = load_file_config(&mut v, &format);
            let shared = resolve_shared(&mut v, &file, &format, LEITNER_DATE_FORMAT);
            let sides = resolve_sides(&mut v, &drill);
            require_files(
                &mut v,
                &[
                    ("command file", Some(command_file.as_path())),
                    ("log", Some(log.as_path())),
                    ("deck", deck.as_deref()),
                ],
            );
            v.finish()?;
            let Some(date_format) = shared.date_format else {
                return fail("invalid date format");
            };
            let config = DrillConfig {
                log,
                command_file,
                field_sep: shared.field_sep,
                date_format,
                dry_run: drill.dry_run,
                sides,
                seed: drill.shuffle_seed.unwrap_or_else(clock_seed),
            };
            run_drill(&config, deck, out)
        }
        Command::Review {
            deck,
            log,
            command_file,
            bucket_delays,
            format,
            selection,
            drill,
        } => {
            let mut v = Validator::new();
            let parts = resolve_leitner(&mut v, &deck, &log, bucket_delays, &format, &selection);
            let sides = resolve_sides(&mut v, &drill);
            v.require_file("command file", &command_file);
            v.finish()?;
            let (Some(date_format), Some(chain)) = (parts.shared.date_format, parts.chain) else {
                return fail("invalid configuration");
            };
            let field_sep = parts.shared.field_sep;
            let leitner = LeitnerConfig {
                deck,
                log: log.clone(),
                field_sep,
                date_format: date_format.clone(),
                chain,
                selector: parts.selector,
                session_started_at,
                seed: selection.seed.unwrap_or_else(clock_seed),
                show_buckets: false,
                format: DumpFormat::Rows,
            };
            let drill = DrillConfig {
                log,
                command_file,
                field_sep,
                date_format,
                dry_run: drill.dry_run,
                sides,
                seed: drill.shuffle_seed.unwrap_or_else(clock_seed),
            };
            run_review(&leitner, &drill, out)
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Command::command().debug_assert();
    }

    #[test]
    fn test_parse_leitner_args() {
        let cli = Command::try_parse_from([
            "oboeta", "leitner", "deck.tsv", "log.tsv", "1", "3", "-n", "-2", "-s", ",",
        ])
        .unwrap();
        let Command::Leitner {
            bucket_delays,
            selection,
            format,
            ..
        } = cli
        else {
            panic!("expected the leitner command");
        };
        assert_eq!(bucket_delays, vec![1, 3]);
        assert_eq!(selection.num_lines, Some(-2));
        assert_eq!(format.field_sep.as_deref(), Some(","));
    }

    #[test]
    fn test_config_errors_are_reported_together() {
        let mut v = Validator::new();
        let file = FileConfig::default();
        let format = FormatArgs {
            field_sep: Some("::".to_string()),
            date_format: None,
            config: None,
        };
        let selection = SelectionArgs {
            num_lines: Some(-1),
            num_new_lines: Some(-1),
            sampler: None,
            seed: None,
        };
        resolve_shared(&mut v, &file, &format, LEITNER_DATE_FORMAT);
        resolve_selector(&mut v, &file, &selection, SamplerKind::Tagged);
        assert!(resolve_chain(&mut v, &file, vec![2, 0]).is_none());
        let err = v.finish().unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.message().lines().count(), 4);
    }

    #[test]
    fn test_file_config_supplies_defaults() {
        let mut v = Validator::new();
        let file = FileConfig {
            num_lines: Some(25),
            sampler: Some(SamplerKind::Reservoir),
            bucket_delays: Some(vec![1, 2, 4]),
            ..FileConfig::default()
        };
        let selection = SelectionArgs {
            num_lines: None,
            num_new_lines: Some(1),
            sampler: None,
            seed: None,
        };
        let selector = resolve_selector(&mut v, &file, &selection, SamplerKind::Tagged);
        assert_eq!(selector.num_old, 25);
        assert_eq!(selector.num_new, 1);
        assert_eq!(selector.sampler, SamplerKind::Reservoir);
        let chain = resolve_chain(&mut v, &file, vec![]).unwrap();
        assert_eq!(chain.top().index(), 3);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_missing_config_file_does_not_hide_other_errors() -> Fallible<()> {
        let dir = tempfile::tempdir()?;
        let mut v = Validator::new();
        let format = FormatArgs {
            field_sep: None,
            date_format: None,
            config: Some(dir.path().join("missing.toml")),
        };
        let selection = SelectionArgs {
            num_lines: Some(-3),
            num_new_lines: None,
            sampler: None,
            seed: None,
        };
        let deck = dir.path().join("deck.tsv");
        let log = dir.path().join("log.tsv");
        let parts = resolve_leitner(&mut v, &deck, &log, vec![1, 3], &format, &selection);
        assert!(parts.chain.is_some());
        let err = v.finish().unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let message = err.message();
        assert!(message.contains("missing.toml does not exist"));
        assert!(message.contains("number of lines cannot be negative"));
        assert!(message.contains("deck.tsv does not exist"));
        assert!(message.contains("log.tsv does not exist"));
        Ok(())
    }

    #[test]
    fn test_negative_side_index_is_rejected() {
        let mut v = Validator::new();
        let args = DrillArgs {
            dry_run: false,
            front: Some(-1),
            back: Some(2),
            shuffle_seed: None,
        };
        assert_eq!(resolve_sides(&mut v, &args), Some((0, 2)));
        let err = v.finish().unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.message(), "The front field index cannot be negative.");
    }
}
