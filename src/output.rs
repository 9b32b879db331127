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

use std::fmt::Display;
use std::fmt::Formatter;
use std::io::Write;

use clap::ValueEnum;
use csv::QuoteStyle;
use csv::Terminator;
use csv::Writer;
use csv::WriterBuilder;
use oboeta_core::Fallible;
use serde::Serialize;

/// How diagnostic dumps are printed.
#[derive(ValueEnum, Clone, Copy, PartialEq, Debug)]
pub enum DumpFormat {
    /// Field-separated rows, like the selection output.
    Rows,
    /// One JSON object per line.
    Json,
}

impl Display for DumpFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DumpFormat::Rows => write!(f, "rows"),
            DumpFormat::Json => write!(f, "json"),
        }
    }
}

/// A writer for field-separated rows. Fields are quoted only when needed.
pub fn row_writer<W: Write>(out: W, separator: u8) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(separator)
        .has_headers(false)
        .flexible(true)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out)
}

pub fn write_row<W, I, F>(writer: &mut Writer<W>, fields: I) -> Fallible<()>
where
    W: Write,
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    writer.write_record(fields)?;
    Ok(())
}

pub fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> Fallible<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
