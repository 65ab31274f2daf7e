//! [`Grammar`]: an unordered set of rules plus an optional start variable.

use std::collections::{HashMap, HashSet};
use std::fmt;

#[cfg(feature = "serialize")]
use serde_derive::{Deserialize, Serialize};

use crate::letter::{has_upper, increment_name, no_upper, word_to_string, Letter, Word};
use crate::rule::Rule;

/// The minimal surface syntax that can losslessly represent a grammar,
/// classified by `spec.md` §4.1:
///
/// - `Char`: every name is one character, terminals have no uppercase,
///   variables have at least one uppercase character.
/// - `Spaced`: same case discipline as `Char`, but names may be longer.
/// - `SpacedExclaim`: arbitrary names; variables are marked with a `!`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MinimalFormat {
    /// Single-character names, case marks variables.
    Char,
    /// Multi-character names, case marks variables.
    Spaced,
    /// Arbitrary names, `!` suffix marks variables.
    SpacedExclaim,
}

impl fmt::Display for MinimalFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MinimalFormat::Char => "char",
            MinimalFormat::Spaced => "spaced",
            MinimalFormat::SpacedExclaim => "spaced!",
        };
        write!(f, "{}", s)
    }
}

/// A context-free grammar: an unordered set of rules plus an optional start
/// variable. See `spec.md` §3 for the invariants this type upholds — every
/// rule's input letter is a variable (enforced by [`Rule::new`]), and no
/// reachability pruning of unused letters is ever performed.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Grammar {
    rules: HashSet<Rule>,
    start_variable: Option<Letter>,
}

impl Grammar {
    /// Creates an empty grammar with no rules and no start variable.
    pub fn new() -> Self {
        Grammar::default()
    }

    /// The grammar's start variable, if one has been set.
    pub fn start_variable(&self) -> Option<&Letter> {
        self.start_variable.as_ref()
    }

    /// Sets the start variable. Panics if `variable` is not a variable.
    pub fn set_start_variable(&mut self, variable: Letter) {
        assert!(variable.is_variable(), "start symbol must be a variable");
        self.start_variable = Some(variable);
    }

    /// Adds a rule to the grammar. A no-op if an equal rule is already
    /// present (rules are a set, per `spec.md` §3).
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.insert(rule);
    }

    /// Removes a rule from the grammar, if present.
    pub fn remove_rule(&mut self, rule: &Rule) {
        self.rules.remove(rule);
    }

    /// Iterates over the grammar's rules, in unspecified order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// The number of rules in the grammar.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Groups rules by their input letter. Equivalent to the original
    /// program's `rules_map`, used by the interactive driver and by the
    /// TERM/UNIT CNF phases to look up "all rules for this variable".
    pub fn rules_map(&self) -> HashMap<Letter, Vec<&Rule>> {
        let mut map: HashMap<Letter, Vec<&Rule>> = HashMap::new();
        for rule in &self.rules {
            map.entry(rule.input().clone()).or_default().push(rule);
        }
        map
    }

    /// Every letter mentioned anywhere in the grammar: the start variable
    /// (if set) plus every rule's input and output letters.
    pub fn all_letters(&self) -> HashSet<Letter> {
        let mut letters = HashSet::new();
        if let Some(start) = &self.start_variable {
            letters.insert(start.clone());
        }
        for rule in &self.rules {
            letters.insert(rule.input().clone());
            letters.extend(rule.output().iter().cloned());
        }
        letters
    }

    /// Every variable (nonterminal) letter mentioned in the grammar.
    pub fn all_variables(&self) -> HashSet<Letter> {
        self.all_letters()
            .into_iter()
            .filter(Letter::is_variable)
            .collect()
    }

    /// Every terminal letter mentioned in the grammar (the object alphabet).
    pub fn all_alphabet(&self) -> HashSet<Letter> {
        self.all_letters()
            .into_iter()
            .filter(|l| !l.is_variable())
            .collect()
    }

    /// Generates `count` fresh letters seeded from `seed`: they share
    /// `seed`'s variable flag and have names absent from the grammar's
    /// letter set. Each generated name is considered taken for the rest of
    /// this call, but the caller must add the rules that use these letters
    /// before the grammar's next fresh-name call, or later calls may mint
    /// colliding names (`spec.md` §4.1 and §9).
    pub fn fresh_letters(&self, seed: &Letter, count: usize) -> Vec<Letter> {
        let mut taken: HashSet<String> =
            self.all_letters().iter().map(|l| l.name().to_string()).collect();
        let mut fresh = Vec::with_capacity(count);
        let mut previous_name = seed.name().to_string();
        for _ in 0..count {
            let mut candidate = increment_name(&previous_name);
            while taken.contains(&candidate) {
                candidate = increment_name(&candidate);
            }
            taken.insert(candidate.clone());
            previous_name = candidate.clone();
            fresh.push(Letter::new(candidate, seed.is_variable()));
        }
        fresh
    }

    /// Classifies the minimal surface format this grammar can be written in
    /// without loss, per `spec.md` §4.1.
    pub fn minimal_format(&self) -> MinimalFormat {
        let alphabet: HashSet<Letter> = self.all_alphabet();
        let variables: HashSet<Letter> = self.all_variables();
        let alphabet_no_upper = alphabet.iter().all(|l| no_upper(l.name()));
        let variables_have_upper = variables.iter().all(|l| has_upper(l.name()));
        if alphabet_no_upper && variables_have_upper {
            let all_one_char = alphabet
                .iter()
                .chain(variables.iter())
                .all(|l| l.name().chars().count() == 1);
            if all_one_char {
                MinimalFormat::Char
            } else {
                MinimalFormat::Spaced
            }
        } else {
            MinimalFormat::SpacedExclaim
        }
    }

    /// Renders the grammar as text: one `input -> alt | alt | ...` line per
    /// variable (sorted by name for determinism), an optional leading
    /// `start <var>` line, using `word_to_str` to render each right-hand
    /// side and each single-letter word.
    fn to_string_with<FW>(
        &self,
        mut word_to_str: FW,
        arrow: &str,
        separator: &str,
        include_start: bool,
    ) -> String
    where
        FW: FnMut(&[Letter]) -> String,
    {
        let mut lines = Vec::new();
        if include_start {
            if let Some(start) = &self.start_variable {
                lines.push(format!("start {}", word_to_str(std::slice::from_ref(start))));
                lines.push(String::new());
            }
        }
        let map = self.rules_map();
        let mut inputs: Vec<&Letter> = map.keys().collect();
        inputs.sort();
        for input in inputs {
            let mut alts: Vec<&Rule> = map[input].clone();
            alts.sort_by_key(|r| word_to_str(r.output()));
            let rhs = alts
                .iter()
                .map(|r| word_to_str(r.output()))
                .collect::<Vec<_>>()
                .join(&format!(" {} ", separator));
            lines.push(format!(
                "{} {} {}",
                word_to_str(std::slice::from_ref(input)),
                arrow,
                rhs
            ));
        }
        lines.join("\n")
    }

    /// Emits the grammar in a specific minimal surface format.
    pub fn to_format(&self, format: MinimalFormat) -> String {
        match format {
            MinimalFormat::Char => self.to_string_with(
                |w| word_to_string(w, |l| l.name().to_string(), "e", ""),
                "->",
                "|",
                true,
            ),
            MinimalFormat::Spaced => self.to_string_with(
                |w| word_to_string(w, |l| l.name().to_string(), "e", " "),
                "->",
                "|",
                true,
            ),
            MinimalFormat::SpacedExclaim => self.to_string_with(
                |w| word_to_string(w, |l| l.to_string(), "e", " "),
                "->",
                "|",
                true,
            ),
        }
    }

    /// Emits the grammar using its own minimal format.
    pub fn to_minimal_format_string(&self) -> String {
        self.to_format(self.minimal_format())
    }

    /// Renders the grammar as a LaTeX `aligned` environment, matching the
    /// original program's `to_latex`: single-character names stay bare,
    /// two-character names get a `_` subscript, longer names get a `_{...}`
    /// subscript group.
    pub fn to_latex(&self) -> String {
        fn letter_to_latex(letter: &Letter) -> String {
            let name = letter.name();
            match name.chars().count() {
                1 => name.to_string(),
                2 => {
                    let mut chars = name.chars();
                    let first = chars.next().unwrap();
                    format!("{}_{}", first, chars.next().unwrap())
                }
                _ => {
                    let mut chars = name.chars();
                    let first = chars.next().unwrap();
                    format!("{}_{{{}}}", first, chars.as_str())
                }
            }
        }
        let body = self.to_string_with(
            |w| word_to_string(w, letter_to_latex, r"\epsilon", " "),
            r"&\rightarrow",
            r"\mid",
            false,
        );
        format!(
            "$$\\begin{{aligned}}\n{}\n\\end{{aligned}}$$",
            body.replace('\n', " \\\\\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_grammar() -> Grammar {
        let mut g = Grammar::new();
        let s = Letter::variable("S");
        g.set_start_variable(s.clone());
        g.add_rule(Rule::new(s.clone(), vec![Letter::terminal("a"), s.clone()]));
        g.add_rule(Rule::new(s, vec![Letter::terminal("b")]));
        g
    }

    #[test]
    fn classifies_char_format() {
        assert_eq!(toy_grammar().minimal_format(), MinimalFormat::Char);
    }

    #[test]
    fn classifies_spaced_exclaim_when_case_discipline_breaks() {
        let mut g = Grammar::new();
        let s = Letter::variable("Start");
        g.set_start_variable(s.clone());
        g.add_rule(Rule::new(s, vec![Letter::terminal("TOKEN")]));
        assert_eq!(g.minimal_format(), MinimalFormat::SpacedExclaim);
    }

    #[test]
    fn fresh_letters_avoid_existing_names() {
        let mut g = Grammar::new();
        let s = Letter::variable("S");
        g.set_start_variable(s.clone());
        g.add_rule(Rule::new(
            s.clone(),
            vec![Letter::variable("S0"), Letter::variable("S1")],
        ));
        let fresh = g.fresh_letters(&s, 1);
        assert_eq!(fresh, vec![Letter::variable("S2")]);
    }

    #[test]
    fn fresh_letters_within_one_call_do_not_collide() {
        let g = Grammar::new();
        let seed = Letter::variable("A");
        let fresh = g.fresh_letters(&seed, 3);
        assert_eq!(
            fresh,
            vec![
                Letter::variable("A0"),
                Letter::variable("A1"),
                Letter::variable("A2")
            ]
        );
    }

    #[test]
    fn round_trips_through_char_format() {
        let g = toy_grammar();
        let text = g.to_format(MinimalFormat::Char);
        assert!(text.contains("start S"));
        assert!(text.contains("S ->"));
        assert!(text.contains("aS"));
        assert!(text.contains('b'));
    }
}
