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

//! Integer-position text selection.

use serde::{Deserialize, Serialize};

use crate::step::Mapping;

/// An anchor/head pair of integer positions. `anchor` is where the
/// selection started (stays fixed while extending with Shift); `head` is
/// where the caret currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    /// A selection between two positions regardless of order, cursor at `to`.
    pub fn between(anchor: usize, head: usize) -> Self {
        Self::new(anchor, head)
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn empty(&self) -> bool {
        self.anchor == self.head
    }

    /// Remap both endpoints through a mapping, biasing each towards the
    /// direction that keeps the selection's own extent stable: the head
    /// (common caret-follows-edit bias) by default.
    pub fn map(&self, mapping: &Mapping) -> Selection {
        Selection::new(
            mapping.map_pos(self.anchor, if self.anchor <= self.head { -1 } else { 1 }),
            mapping.map_pos(self.head, if self.head >= self.anchor { 1 } else { -1 }),
        )
    }

    /// Clamp both endpoints into `[0, max]`.
    pub fn clamp(&self, max: usize) -> Selection {
        Selection::new(self.anchor.min(max), self.head.min(max))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_to_order_independent_of_direction() {
        let s = Selection::new(5, 2);
        assert_eq!(s.from(), 2);
        assert_eq!(s.to(), 5);
    }

    #[test]
    fn empty_when_anchor_equals_head() {
        assert!(Selection::cursor(3).empty());
        assert!(!Selection::new(1, 2).empty());
    }

    #[test]
    fn clamp_bounds_both_endpoints() {
        let s = Selection::new(10, 20).clamp(15);
        assert_eq!(s, Selection::new(10, 15));
    }
}
