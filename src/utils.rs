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

use std::fs::File;
use std::fs::OpenOptions;
use std::fs::read_to_string;
use std::io::Read;
use std::io::stdin;
use std::path::Path;

use oboeta_core::Fallible;

/// Read a deck from a file, or from standard input when no path is given.
pub fn read_deck_text(path: Option<&Path>) -> Fallible<(String, String)> {
    match path {
        Some(path) => {
            log::debug!("Reading deck from {}", path.display());
            Ok((path.display().to_string(), read_to_string(path)?))
        }
        None => {
            log::debug!("Reading deck from standard input");
            let mut text = String::new();
            stdin().read_to_string(&mut text)?;
            Ok(("<stdin>".to_string(), text))
        }
    }
}

/// Open a review log for appending.
pub fn open_log_for_append(path: &Path) -> Fallible<File> {
    Ok(OpenOptions::new().append(true).open(path)?)
}
