//! Symbols that make up a grammar: [`Letter`]s and the [`Word`]s built from them.
//!
//! A `Letter` is either a variable (a nonterminal, left side of some rule) or a
//! plain symbol from the object alphabet (a terminal). Two letters are equal
//! iff both their name and their `is_variable` flag match.

use std::fmt;

#[cfg(feature = "serialize")]
use serde_derive::{Deserialize, Serialize};

/// A grammar symbol: a name plus whether it is a variable (nonterminal).
///
/// Letters are immutable and hashable, so they can be used as members of a
/// [`crate::grammar::Grammar`]'s rule set without any extra bookkeeping.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Letter {
    name: String,
    is_variable: bool,
}

impl Letter {
    /// Creates a new letter with the given name and variable flag.
    pub fn new<S: Into<String>>(name: S, is_variable: bool) -> Self {
        Letter {
            name: name.into(),
            is_variable,
        }
    }

    /// Creates a variable (nonterminal) letter.
    pub fn variable<S: Into<String>>(name: S) -> Self {
        Letter::new(name, true)
    }

    /// Creates a terminal letter.
    pub fn terminal<S: Into<String>>(name: S) -> Self {
        Letter::new(name, false)
    }

    /// This letter's textual name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this letter is a variable (nonterminal).
    pub fn is_variable(&self) -> bool {
        self.is_variable
    }
}

impl fmt::Display for Letter {
    /// Renders the letter the way the `spaced!` surface format does: a
    /// trailing `!` marks variables.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_variable {
            write!(f, "{}!", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// A finite ordered sequence of letters. The empty word is `Word::new()`.
pub type Word = Vec<Letter>;

/// Renders a word using a per-letter converter, joining with `separator` and
/// falling back to `empty` when the word has no letters.
pub fn word_to_string<F>(word: &[Letter], mut letter_to_str: F, empty: &str, separator: &str) -> String
where
    F: FnMut(&Letter) -> String,
{
    if word.is_empty() {
        empty.to_string()
    } else {
        word.iter()
            .map(|letter| letter_to_str(letter))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Returns whether a string contains at least one uppercase character.
pub fn has_upper(s: &str) -> bool {
    s.chars().any(|c| c.is_uppercase())
}

/// Returns whether a string contains no uppercase characters.
pub fn no_upper(s: &str) -> bool {
    !has_upper(s)
}

/// Strips a trailing run of decimal digits from `name`, returning the base
/// and the parsed number (or `None` if there was no trailing digit run).
fn split_trailing_digits(name: &str) -> (&str, Option<u64>) {
    let digit_start = name
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);
    match digit_start {
        Some(i) if i < name.len() => {
            let (base, digits) = name.split_at(i);
            (base, digits.parse().ok())
        }
        _ => (name, None),
    }
}

/// Increments a variable name's trailing decimal suffix: `S` -> `S0`,
/// `S3` -> `S4`. Used by fresh-name generation (see `spec.md` §4.1).
pub fn increment_name(name: &str) -> String {
    let (base, number) = split_trailing_digits(name);
    match number {
        Some(n) => format!("{}{}", base, n + 1),
        None => format!("{}0", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_marks_variables() {
        assert_eq!(Letter::variable("S").to_string(), "S!");
        assert_eq!(Letter::terminal("a").to_string(), "a");
    }

    #[test]
    fn increment_name_appends_zero_with_no_suffix() {
        assert_eq!(increment_name("S"), "S0");
    }

    #[test]
    fn increment_name_bumps_existing_suffix() {
        assert_eq!(increment_name("S3"), "S4");
        assert_eq!(increment_name("U9"), "U10");
    }

    #[test]
    fn increment_name_preserves_base_with_multiple_digits() {
        assert_eq!(increment_name("A12"), "A13");
    }

    #[test]
    fn upper_predicates() {
        assert!(has_upper("Ab"));
        assert!(no_upper("ab"));
        assert!(!has_upper("ab"));
    }
}
