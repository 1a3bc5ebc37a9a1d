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

//! Position remapping across steps.

/// A list of disjoint `(from, oldSize, newSize)` replacement ranges, in
/// increasing `from`, all expressed in the coordinate space *before* the
/// map is applied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMap {
    ranges: Vec<(usize, usize, usize)>,
}

impl StepMap {
    pub fn new(ranges: Vec<(usize, usize, usize)>) -> Self {
        StepMap { ranges }
    }

    pub fn empty() -> Self {
        StepMap { ranges: Vec::new() }
    }

    pub fn ranges(&self) -> &[(usize, usize, usize)] {
        &self.ranges
    }

    /// Maps `pos` through this replacement set. A position strictly inside a
    /// replaced span resolves to the span's start when `bias <= 0`, or its end
    /// when `bias >= 0`.
    pub fn map_pos(&self, pos: usize, bias: i32) -> usize {
        let mut diff: isize = 0;
        for &(from, old_size, new_size) in &self.ranges {
            if from > pos {
                break;
            }
            let end = from + old_size;
            if pos <= end {
                return if old_size == 0 {
                    // Pure insertion at `from`: before it unless biased forward.
                    (from as isize + diff + if bias >= 0 { new_size as isize } else { 0 }) as usize
                } else if bias <= 0 {
                    (from as isize + diff) as usize
                } else {
                    (from as isize + diff + new_size as isize) as usize
                };
            }
            diff += new_size as isize - old_size as isize;
        }
        (pos as isize + diff) as usize
    }
}

/// An ordered sequence of [`StepMap`]s, applied left to right.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Mapping { maps: Vec::new() }
    }

    pub fn from_maps(maps: Vec<StepMap>) -> Self {
        Mapping { maps }
    }

    pub fn append(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn map_pos(&self, pos: usize, bias: i32) -> usize {
        self.maps.iter().fold(pos, |p, m| m.map_pos(p, bias))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insertion_pushes_positions_after_it() {
        let map = StepMap::new(vec![(2, 0, 3)]);
        assert_eq!(map.map_pos(0, 1), 0);
        assert_eq!(map.map_pos(5, 1), 8);
    }

    #[test]
    fn position_inside_deletion_resolves_by_bias() {
        let map = StepMap::new(vec![(2, 4, 0)]);
        assert_eq!(map.map_pos(3, -1), 2);
        assert_eq!(map.map_pos(3, 1), 2);
    }

    #[test]
    fn mapping_composes_left_to_right() {
        let mut mapping = Mapping::new();
        mapping.append(StepMap::new(vec![(0, 0, 2)]));
        mapping.append(StepMap::new(vec![(4, 0, 1)]));
        assert_eq!(mapping.map_pos(3, 1), 6);
    }
}
