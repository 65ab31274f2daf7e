//! Table-driven coverage of the minimal-format classifier and the three
//! rule-line word parsers, mirroring the teacher's own parametrized
//! `#[test_case]` tables (`examples/pczarn-cfg/cfg/tests/test_binarize.rs`).

use cfg_tools::grammar::{Grammar, MinimalFormat};
use cfg_tools::letter::Letter;
use cfg_tools::rule::Rule;
use cfg_tools::text::{word_char, word_spaced, word_spaced_exclaim};
use test_case::test_case;

#[test_case("S", "a", MinimalFormat::Char; "single char names classify as char")]
#[test_case("Start", "a", MinimalFormat::Spaced; "multi-char variable forces spaced")]
#[test_case("Start", "tok", MinimalFormat::Spaced; "multi-char terminal forces spaced")]
#[test_case("lower", "a", MinimalFormat::SpacedExclaim; "lowercase variable forces spaced-exclaim")]
fn classifies_minimal_format(variable: &str, terminal: &str, expected: MinimalFormat) {
    let mut g = Grammar::new();
    let s = Letter::variable(variable);
    g.set_start_variable(s.clone());
    g.add_rule(Rule::new(s, vec![Letter::terminal(terminal)]));
    assert_eq!(g.minimal_format(), expected);
}

#[test_case("aSb", 3; "char format splits every character")]
#[test_case("e", 0; "char format epsilon token is empty")]
fn word_char_letter_counts(text: &str, expected_len: usize) {
    assert_eq!(word_char(text).unwrap().len(), expected_len);
}

#[test_case("a Tok b", 3; "spaced format splits on whitespace")]
#[test_case("\u{3b5}", 0; "spaced format epsilon token is empty")]
fn word_spaced_letter_counts(text: &str, expected_len: usize) {
    assert_eq!(word_spaced(text).unwrap().len(), expected_len);
}

#[test_case("a! b c!", 3, 2; "spaced-exclaim format marks trailing-bang variables")]
fn word_spaced_exclaim_counts(text: &str, expected_len: usize, expected_variables: usize) {
    let word = word_spaced_exclaim(text).unwrap();
    assert_eq!(word.len(), expected_len);
    assert_eq!(word.iter().filter(|l| l.is_variable()).count(), expected_variables);
}
