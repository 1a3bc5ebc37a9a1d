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

//! Content expressions: a space-separated sequence of `match-quantifier` terms
//! validating a container's children, e.g. `"block+"` or `"listItem+"`.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantifier {
    /// No suffix: exactly one.
    One,
    /// `+`: one or more.
    OneOrMore,
    /// `*`: zero or more.
    ZeroOrMore,
    /// `?`: zero or one.
    ZeroOrOne,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentTerm {
    /// A node type name or a group name.
    pub matcher: String,
    pub quantifier: Quantifier,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentExpr {
    pub terms: Vec<ContentTerm>,
    source: String,
}

impl ContentExpr {
    pub fn parse(expr: &str) -> Self {
        let terms = expr
            .split_whitespace()
            .map(|token| {
                let (matcher, quantifier) = match token.chars().last() {
                    Some('+') => (&token[..token.len() - 1], Quantifier::OneOrMore),
                    Some('*') => (&token[..token.len() - 1], Quantifier::ZeroOrMore),
                    Some('?') => (&token[..token.len() - 1], Quantifier::ZeroOrOne),
                    _ => (token, Quantifier::One),
                };
                ContentTerm {
                    matcher: matcher.to_string(),
                    quantifier,
                }
            })
            .collect();
        ContentExpr {
            terms,
            source: expr.to_string(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Greedily matches `node_types` (already resolved to the type-or-group
    /// test via `matches_term`) against the parsed terms, requiring every child
    /// to be consumed.
    pub fn validate<F>(&self, node_types: &[&str], matches_term: F) -> bool
    where
        F: Fn(&str, &str) -> bool,
    {
        let mut ci = 0;
        for term in &self.terms {
            let mut count = 0;
            while ci < node_types.len() && matches_term(&term.matcher, node_types[ci]) {
                ci += 1;
                count += 1;
                if term.quantifier == Quantifier::ZeroOrOne && count == 1 {
                    break;
                }
            }
            let ok = match term.quantifier {
                Quantifier::One => count == 1,
                Quantifier::OneOrMore => count >= 1,
                Quantifier::ZeroOrMore => true,
                Quantifier::ZeroOrOne => count <= 1,
            };
            if !ok {
                return false;
            }
        }
        ci == node_types.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn always(_m: &str, _t: &str) -> bool {
        true
    }
    fn eq(m: &str, t: &str) -> bool {
        m == t
    }

    #[test]
    fn parses_quantifiers() {
        let e = ContentExpr::parse("block+ inline* foo? bar");
        assert_eq!(e.terms[0].quantifier, Quantifier::OneOrMore);
        assert_eq!(e.terms[1].quantifier, Quantifier::ZeroOrMore);
        assert_eq!(e.terms[2].quantifier, Quantifier::ZeroOrOne);
        assert_eq!(e.terms[3].quantifier, Quantifier::One);
    }

    #[test]
    fn one_or_more_rejects_empty() {
        let e = ContentExpr::parse("block+");
        assert!(!e.validate(&[], always));
    }

    #[test]
    fn one_or_more_accepts_many() {
        let e = ContentExpr::parse("block+");
        assert!(e.validate(&["p", "p", "p"], always));
    }

    #[test]
    fn zero_or_more_accepts_empty() {
        let e = ContentExpr::parse("inline*");
        assert!(e.validate(&[], always));
    }

    #[test]
    fn exact_one_rejects_two() {
        let e = ContentExpr::parse("paragraph");
        assert!(!e.validate(&["paragraph", "paragraph"], eq));
    }

    #[test]
    fn mismatched_type_rejected() {
        let e = ContentExpr::parse("listItem+");
        assert!(!e.validate(&["paragraph"], eq));
    }
}
