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

use serde::Serialize;

/// Represents the schedule of a deck line under some scheduler, where `S`
/// is that scheduler's per-line state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Performance<S> {
    /// The line has no log history.
    New,
    /// The line has been reviewed at least once.
    Reviewed(S),
}

impl<S> Performance<S> {
    pub fn is_new(&self) -> bool {
        matches!(self, Performance::New)
    }

    pub fn as_reviewed(&self) -> Option<&S> {
        match self {
            Performance::New => None,
            Performance::Reviewed(state) => Some(state),
        }
    }
}
