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

//! Reading decks and review logs from field-separated text.

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::fmt::Display;
use std::str::FromStr;

use csv::ReaderBuilder;
use csv::StringRecord;

use crate::error::RowError;
use crate::replay::LogEvent;
use crate::types::record::Record;
use crate::types::timestamp::DateFormat;

/// Deck rows keyed by ID.
pub type Deck = BTreeMap<String, DeckRow>;

/// A deck line together with its one-based row number.
#[derive(Clone, Debug, PartialEq)]
pub struct DeckRow {
    pub line_num: u64,
    pub record: Record,
}

/// A physical row of field-separated text.
enum Row {
    /// An empty line. The csv reader skips these, so they are recovered
    /// from the gaps between records.
    Blank { line_num: u64 },
    Fields { line_num: u64, fields: StringRecord },
}

fn is_line_break(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

/// Count line breaks, treating `\r\n` as one.
fn count_line_breaks(bytes: &[u8]) -> u64 {
    let mut count = 0;
    let mut iter = bytes.iter().peekable();
    while let Some(&b) = iter.next() {
        match b {
            b'\r' => {
                iter.next_if_eq(&&b'\n');
                count += 1;
            }
            b'\n' => count += 1,
            _ => {}
        }
    }
    count
}

/// Reads the rows of a field-separated text in order, including the empty
/// lines the csv reader would otherwise drop. Rows may have any number of
/// fields.
struct Rows<'a> {
    source_path: String,
    text: &'a [u8],
    reader: csv::Reader<&'a [u8]>,
    /// Byte offset just past the content of the last record.
    consumed: usize,
    /// Line number at `consumed`.
    line_num: u64,
    /// Whether a record has been read, so the next line break ends it.
    started: bool,
    pending: VecDeque<Row>,
    done: bool,
}

impl<'a> Rows<'a> {
    fn new(source_path: &str, text: &'a str, separator: u8) -> Self {
        let reader = ReaderBuilder::new()
            .delimiter(separator)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        Self {
            source_path: source_path.to_string(),
            text: text.as_bytes(),
            reader,
            consumed: 0,
            line_num: 1,
            started: false,
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Queue a blank row for every empty line in `text[consumed..end]`.
    fn queue_blank_lines(&mut self, end: usize) {
        let breaks = count_line_breaks(&self.text[self.consumed..end]);
        for k in 0..breaks {
            if !(self.started && k == 0) {
                self.pending.push_back(Row::Blank {
                    line_num: self.line_num,
                });
            }
            self.line_num += 1;
        }
        self.consumed = end;
    }

    fn read_next(&mut self) -> Result<(), RowError> {
        let mut fields = StringRecord::new();
        let more = self.reader.read_record(&mut fields).map_err(|e| {
            RowError::new(format!("unreadable row: {e}"), &self.source_path, self.line_num)
        })?;
        if !more {
            self.queue_blank_lines(self.text.len());
            self.done = true;
            return Ok(());
        }
        let start = fields.position().map_or(self.consumed, |p| p.byte() as usize);
        let content_start = start
            + self.text[start..]
                .iter()
                .take_while(|&&b| is_line_break(b))
                .count();
        self.queue_blank_lines(content_start);
        self.pending.push_back(Row::Fields {
            line_num: self.line_num,
            fields,
        });

        let mut content_end = (self.reader.position().byte() as usize).min(self.text.len());
        while content_end > content_start && is_line_break(self.text[content_end - 1]) {
            content_end -= 1;
        }
        // Quoted fields may span lines.
        self.line_num += count_line_breaks(&self.text[content_start..content_end]);
        self.consumed = content_end;
        self.started = true;
        Ok(())
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Row, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.read_next() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.is_empty() || (record.len() == 1 && record[0].is_empty())
}

/// Parse deck rows in file order, skipping empty rows. Duplicates are kept.
pub fn parse_deck_rows(
    source_path: &str,
    text: &str,
    separator: u8,
) -> Result<Vec<DeckRow>, RowError> {
    let mut rows = Vec::new();
    for row in Rows::new(source_path, text, separator) {
        let Row::Fields { line_num, fields } = row? else {
            continue;
        };
        if is_blank(&fields) {
            continue;
        }
        let fields: Vec<String> = fields.iter().map(str::to_string).collect();
        if let Some(record) = Record::new(fields) {
            rows.push(DeckRow { line_num, record });
        }
    }
    Ok(rows)
}

/// Parse a deck into rows keyed by ID. When IDs repeat, the last row wins.
pub fn parse_deck(source_path: &str, text: &str, separator: u8) -> Result<Deck, RowError> {
    let mut deck = Deck::new();
    for row in parse_deck_rows(source_path, text, separator)? {
        deck.insert(row.record.id().to_string(), row);
    }
    Ok(deck)
}

/// Parse a whole review log. Each row must be `id, timestamp, outcome`;
/// an empty line counts as a row with no fields. The first bad row aborts
/// parsing, so a log is either fully usable or not used at all.
pub fn parse_log<O>(
    source_path: &str,
    text: &str,
    separator: u8,
    date_format: &DateFormat,
) -> Result<Vec<LogEvent<O>>, RowError>
where
    O: FromStr,
    O::Err: Display,
{
    let mut events = Vec::new();
    for row in Rows::new(source_path, text, separator) {
        let (line_num, fields) = match row? {
            Row::Blank { line_num } => (line_num, StringRecord::new()),
            Row::Fields { line_num, fields } => (line_num, fields),
        };
        if fields.len() != 3 {
            return Err(RowError::new(
                format!("invalid number of fields: {}", fields.len()),
                source_path,
                line_num,
            ));
        }
        let timestamp = date_format
            .parse(&fields[1])
            .map_err(|_| RowError::new("invalid date format", source_path, line_num))?;
        let outcome = fields[2]
            .parse::<O>()
            .map_err(|e| RowError::new(e.to_string(), source_path, line_num))?;
        events.push(LogEvent {
            id: fields[0].to_string(),
            timestamp,
            outcome,
        });
    }
    Ok(events)
}

/// Check that every row has the given field indices.
pub fn check_field_indices(
    source_path: &str,
    rows: &[DeckRow],
    indices: &[usize],
) -> Result<(), RowError> {
    for row in rows {
        for &index in indices {
            if index >= row.record.len() {
                return Err(RowError::new(
                    format!(
                        "field index {index} is out of range: the row has {} fields",
                        row.record.len()
                    ),
                    source_path,
                    row.line_num,
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leitner::PassFail;
    use crate::sm2::Quality;
    use crate::types::timestamp::Timestamp;

    fn iso() -> DateFormat {
        DateFormat::new("%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_parse_deck_skips_empty_rows_and_last_wins() -> Result<(), RowError> {
        let text = "a\tfoo\tbar\n\nb\tbaz\na\tqux\n";
        let deck = parse_deck("deck.tsv", text, b'\t')?;
        assert_eq!(deck.len(), 2);
        assert_eq!(deck["a"].record.fields(), ["a", "qux"]);
        assert_eq!(deck["a"].line_num, 4);
        assert_eq!(deck["b"].record.fields(), ["b", "baz"]);
        assert_eq!(deck["b"].line_num, 3);
        Ok(())
    }

    #[test]
    fn test_parse_deck_rows_keeps_order_and_line_numbers() -> Result<(), RowError> {
        let rows = parse_deck_rows("deck.csv", "x,1\ny,2\n", b',')?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].record.id(), "x");
        assert_eq!(rows[0].line_num, 1);
        assert_eq!(rows[1].line_num, 2);
        Ok(())
    }

    #[test]
    fn test_parse_log() -> Result<(), RowError> {
        let text = "a\t2024-01-01 10:00:00\t+\nb\t2024-01-02 11:00:00\t-\n";
        let events: Vec<LogEvent<PassFail>> = parse_log("log.tsv", text, b'\t', &iso())?;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "a");
        assert_eq!(events[0].outcome, PassFail::Pass);
        assert_eq!(
            events[1].timestamp,
            Timestamp::try_from("2024-01-02T11:00:00".to_string()).unwrap()
        );
        assert_eq!(events[1].outcome, PassFail::Fail);
        Ok(())
    }

    #[test]
    fn test_wrong_field_count() {
        let text = "a\t2024-01-01 10:00:00\t+\nb\t2024-01-01 10:00:00\n";
        let err = parse_log::<PassFail>("log.tsv", text, b'\t', &iso()).unwrap_err();
        assert_eq!(err.line_num, 2);
        assert_eq!(err.message, "invalid number of fields: 2");
        assert_eq!(err.to_string(), "log.tsv:2: invalid number of fields: 2");
    }

    #[test]
    fn test_blank_log_row_is_rejected() {
        let text = "a\t2024-01-01 10:00:00\t+\n\nb\t2024-01-01 10:00:00\t-\n";
        let err = parse_log::<PassFail>("log.tsv", text, b'\t', &iso()).unwrap_err();
        assert_eq!(err.to_string(), "log.tsv:2: invalid number of fields: 0");

        let text = "\r\na\t2024-01-01 10:00:00\t+\r\n";
        let err = parse_log::<PassFail>("log.tsv", text, b'\t', &iso()).unwrap_err();
        assert_eq!(err.line_num, 1);

        let text = "a\t2024-01-01 10:00:00\t+\n\n";
        let err = parse_log::<PassFail>("log.tsv", text, b'\t', &iso()).unwrap_err();
        assert_eq!(err.line_num, 2);
    }

    #[test]
    fn test_crlf_log_has_no_blank_rows() -> Result<(), RowError> {
        let text = "a\t2024-01-01 10:00:00\t+\r\nb\t2024-01-01 10:00:00\t-\r\n";
        let events: Vec<LogEvent<PassFail>> = parse_log("log.tsv", text, b'\t', &iso())?;
        assert_eq!(events.len(), 2);
        Ok(())
    }

    #[test]
    fn test_row_numbers_count_blank_and_quoted_lines() -> Result<(), RowError> {
        let rows = parse_deck_rows("deck.csv", "x,1\n\n\ny,\"two\nlines\"\nz,3\n", b',')?;
        let line_nums: Vec<u64> = rows.iter().map(|r| r.line_num).collect();
        assert_eq!(line_nums, [1, 4, 6]);
        assert_eq!(rows[1].record.field(1), Some("two\nlines"));
        Ok(())
    }

    #[test]
    fn test_bad_timestamp() {
        let text = "a\tyesterday\t+\n";
        let err = parse_log::<PassFail>("log.tsv", text, b'\t', &iso()).unwrap_err();
        assert_eq!(err.message, "invalid date format");
    }

    #[test]
    fn test_bad_outcome() {
        let text = "a\t2024-01-01 10:00:00\t?\n";
        let err = parse_log::<PassFail>("log.tsv", text, b'\t', &iso()).unwrap_err();
        assert!(err.message.starts_with("invalid mutation"));

        let text = "a\t2024-01-01 10:00:00\t6\n";
        let err = parse_log::<Quality>("log.tsv", text, b'\t', &iso()).unwrap_err();
        assert_eq!(err.message, "invalid quality response: 6");
    }

    #[test]
    fn test_check_field_indices() -> Result<(), RowError> {
        let rows = parse_deck_rows("deck.tsv", "a\tfront\tback\nb\tonly\n", b'\t')?;
        assert!(check_field_indices("deck.tsv", &rows, &[0, 1]).is_ok());
        let err = check_field_indices("deck.tsv", &rows, &[1, 2]).unwrap_err();
        assert_eq!(err.line_num, 2);
        Ok(())
    }
}
