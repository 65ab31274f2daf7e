//! Grammar rules: a single variable on the left, a word on the right.

use std::fmt;

#[cfg(feature = "serialize")]
use serde_derive::{Deserialize, Serialize};

use crate::letter::{word_to_string, Letter, Word};

/// A production `input -> output`. `input` must be a variable.
///
/// Rules are immutable and compared by value, so a [`crate::grammar::Grammar`]
/// can hold its rules in a `HashSet` and rely on structural equality to
/// collapse duplicates, matching the set semantics `spec.md` §3 requires of
/// a grammar's rule collection.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Rule {
    input: Letter,
    output: Word,
}

impl Rule {
    /// Creates a rule. Panics if `input` is not a variable: every rule's
    /// left-hand side must be a variable (`spec.md` §3's grammar invariant).
    pub fn new(input: Letter, output: Word) -> Self {
        assert!(
            input.is_variable(),
            "rule input letter {:?} must be a variable",
            input
        );
        Rule { input, output }
    }

    /// The rule's left-hand side.
    pub fn input(&self) -> &Letter {
        &self.input
    }

    /// The rule's right-hand side.
    pub fn output(&self) -> &Word {
        &self.output
    }

    /// Whether this rule's right-hand side is the empty word.
    pub fn is_nulling(&self) -> bool {
        self.output.is_empty()
    }

    /// Whether this rule is a unit rule: a single variable on the right.
    pub fn is_unit(&self) -> bool {
        self.output.len() == 1 && self.output[0].is_variable()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rhs = word_to_string(&self.output, |l| l.to_string(), "e", " ");
        write!(f, "{}! -> {}", self.input.name(), rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic]
    fn rejects_terminal_lhs() {
        Rule::new(Letter::terminal("a"), vec![]);
    }

    #[test]
    fn detects_nulling_and_unit_rules() {
        let s = Letter::variable("S");
        let a = Letter::variable("A");
        assert!(Rule::new(s.clone(), vec![]).is_nulling());
        assert!(Rule::new(s.clone(), vec![a]).is_unit());
        assert!(!Rule::new(s, vec![Letter::terminal("a")]).is_unit());
    }
}
