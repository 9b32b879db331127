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

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

/// The broad category of an error. Every error is fatal to the run; the
/// category only decides the process exit status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad options, missing files. Detected before any log is read.
    Config,
    /// Malformed deck or log rows, bad drill commands.
    Data,
    /// Everything else (I/O failures and the like).
    Io,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::Data => 3,
            ErrorKind::Io => 1,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct ErrorReport {
    kind: ErrorKind,
    message: String,
}

impl ErrorReport {
    pub fn new(msg: impl Into<String>) -> Self {
        ErrorReport {
            kind: ErrorKind::Io,
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ErrorReport {
            kind: ErrorKind::Config,
            message: msg.into(),
        }
    }

    pub fn data(msg: impl Into<String>) -> Self {
        ErrorReport {
            kind: ErrorKind::Data,
            message: msg.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport::new(format!("I/O error: {value}"))
    }
}

impl From<csv::Error> for ErrorReport {
    fn from(value: csv::Error) -> Self {
        ErrorReport::new(format!("CSV error: {value}"))
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport::new(format!("JSON error: {value}"))
    }
}

impl From<RowError> for ErrorReport {
    fn from(value: RowError) -> Self {
        ErrorReport::data(value.to_string())
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        // Config errors may carry several violations, one per line.
        let mut first = true;
        for line in self.message.lines() {
            if !first {
                writeln!(f)?;
            }
            write!(f, "error: {line}")?;
            first = false;
        }
        if first {
            write!(f, "error: ")?;
        }
        Ok(())
    }
}

impl Error for ErrorReport {}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(msg))
}

/// An error tied to a specific row of a deck or log file.
#[derive(Debug, PartialEq)]
pub struct RowError {
    pub message: String,
    pub source_path: String,
    /// One-based row number.
    pub line_num: u64,
}

impl RowError {
    pub fn new(message: impl Into<String>, source_path: &str, line_num: u64) -> Self {
        RowError {
            message: message.into(),
            source_path: source_path.to_string(),
            line_num,
        }
    }
}

impl Display for RowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.source_path, self.line_num, self.message)
    }
}

impl Error for RowError {}
