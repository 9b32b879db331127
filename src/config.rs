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
use std::path::Path;

use oboeta_core::ErrorReport;
use oboeta_core::Fallible;
use oboeta_core::SamplerKind;
use serde::Deserialize;

pub const DEFAULT_FIELD_SEP: &str = "\t";
pub const DEFAULT_NUM_LINES: i64 = 10;
pub const DEFAULT_NUM_NEW_LINES: i64 = 4;
/// Leitner logs carry the time of day.
pub const LEITNER_DATE_FORMAT: &str = "%Y年%m月%d日%H時%M分%S秒";
/// SM-2 works in whole days.
pub const SM2_DATE_FORMAT: &str = "%Y年%m月%d日";

/// Defaults read from a TOML file. Command-line flags take precedence.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub field_sep: Option<String>,
    pub date_format: Option<String>,
    pub num_lines: Option<i64>,
    pub num_new_lines: Option<i64>,
    pub bucket_delays: Option<Vec<i64>>,
    pub sampler: Option<SamplerKind>,
}

impl FileConfig {
    pub fn load(path: Option<&Path>) -> Fallible<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Err(ErrorReport::config(format!(
                "The config file {} does not exist.",
                path.display()
            )));
        }
        let text = read_to_string(path)?;
        log::debug!("Loaded config from {}", path.display());
        Self::parse(&text).map_err(|e| {
            ErrorReport::config(format!("Failed to parse {}: {}", path.display(), e.message()))
        })
    }

    pub fn parse(text: &str) -> Fallible<Self> {
        toml::from_str(text).map_err(|e| ErrorReport::config(e.to_string()))
    }
}

/// Collects every configuration problem so they can be reported together.
#[derive(Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error, if any.
    pub fn check<T>(&mut self, result: Fallible<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.push(e.message().to_string());
                None
            }
        }
    }

    pub fn require_file(&mut self, what: &str, path: &Path) {
        if !path.exists() {
            self.errors
                .push(format!("The {what} {} does not exist.", path.display()));
        }
    }

    /// A non-negative count.
    pub fn count(&mut self, what: &str, value: i64) -> usize {
        match usize::try_from(value) {
            Ok(n) => n,
            Err(_) => {
                self.errors.push(format!("The {what} cannot be negative."));
                0
            }
        }
    }

    /// A single-byte field separator.
    pub fn separator(&mut self, sep: &str) -> u8 {
        match sep.as_bytes() {
            [b] if b.is_ascii() => *b,
            _ => {
                self.errors.push(format!(
                    "The field separator must be a single ASCII character, got {sep:?}."
                ));
                b'\t'
            }
        }
    }

    pub fn finish(self) -> Fallible<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ErrorReport::config(self.errors.join("\n")))
        }
    }
}
