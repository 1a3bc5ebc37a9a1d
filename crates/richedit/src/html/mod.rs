// Copyright 2024 richedit contributors
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

//! The HTML boundary: sanitization policy shared by both directions, parsing
//! (input), and serialization (output). Parsing depends on html5ever and is
//! only built with the `sys` feature; serialization has no such dependency.

pub mod sanitize;
pub mod serialize;

#[cfg(feature = "sys")]
pub mod parse;
