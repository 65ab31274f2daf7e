//! A pure state-transition driver for stepping through a leftmost
//! derivation one choice at a time, per `spec.md` §4.6. This module never
//! touches stdin/stdout; the CLI binary owns the read-eval-print loop and
//! calls into this driver for every transition.

use std::collections::HashMap;

use crate::error::CfgError;
use crate::grammar::Grammar;
use crate::letter::Letter;
use crate::rule::Rule;
use crate::tree::{NodeId, ParseTree};

/// Drives an undoable leftmost derivation over a fixed grammar.
pub struct InteractiveDriver {
    rules_by_variable: HashMap<Letter, Vec<Rule>>,
    tree: ParseTree,
}

impl InteractiveDriver {
    /// Starts a fresh derivation at `grammar`'s start variable.
    pub fn new(grammar: &Grammar) -> Result<Self, CfgError> {
        let start = grammar
            .start_variable()
            .ok_or(CfgError::MissingStartVariable)?
            .clone();
        let mut rules_by_variable: HashMap<Letter, Vec<Rule>> = HashMap::new();
        for rule in grammar.rules() {
            rules_by_variable
                .entry(rule.input().clone())
                .or_default()
                .push(rule.clone());
        }
        Ok(InteractiveDriver {
            rules_by_variable,
            tree: ParseTree::new(std::slice::from_ref(&start)),
        })
    }

    /// The derivation tree built up so far.
    pub fn tree(&self) -> &ParseTree {
        &self.tree
    }

    /// The current variable leaves, left to right — index `i` here is the
    /// index a caller passes to [`InteractiveDriver::expand`].
    pub fn variable_leaves(&self) -> Vec<NodeId> {
        self.tree.variable_leaves()
    }

    /// The rules available for the variable at a given leaf.
    pub fn rules_for(&self, node: NodeId) -> Result<&[Rule], CfgError> {
        let letter = self.tree.letter(node).ok_or(CfgError::NotALetterNode)?;
        self.rules_by_variable
            .get(letter)
            .map(Vec::as_slice)
            .ok_or_else(|| CfgError::NoRulesForVariable {
                variable: letter.name().to_string(),
            })
    }

    /// The rules available for the `variable_index`-th current variable
    /// leaf, in the same order `expand` will index into.
    pub fn choices(&self, variable_index: usize) -> Result<&[Rule], CfgError> {
        let leaves = self.variable_leaves();
        let &node = leaves
            .get(variable_index)
            .ok_or(CfgError::InvalidVariableIndex { index: variable_index })?;
        self.rules_for(node)
    }

    /// Expands the `variable_index`-th current variable leaf by its
    /// `rule_index`-th rule, logging the expansion so it can be undone.
    pub fn expand(&mut self, variable_index: usize, rule_index: usize) -> Result<(), CfgError> {
        let leaves = self.variable_leaves();
        let &node = leaves
            .get(variable_index)
            .ok_or(CfgError::InvalidVariableIndex { index: variable_index })?;
        let rule = self
            .rules_for(node)?
            .get(rule_index)
            .cloned()
            .ok_or(CfgError::InvalidRuleIndex { index: rule_index })?;
        self.tree.branch_word(node, rule.output(), true);
        Ok(())
    }

    /// Undoes the most recent expansion.
    pub fn undo(&mut self) -> Result<(), CfgError> {
        self.tree.undo().map_err(|_| CfgError::NothingToUndo)
    }

    /// Whether every leaf is a terminal — the derivation is complete.
    pub fn is_fully_terminal(&self) -> bool {
        self.tree.variable_leaves().is_empty()
    }

    /// The word derived so far (terminals only once `is_fully_terminal`).
    pub fn derived_word(&self) -> Vec<Letter> {
        self.tree
            .leaves()
            .into_iter()
            .map(|id| self.tree.letter(id).expect("leaf must carry a letter").clone())
            .collect()
    }

    /// The two-line indexed rendering used as the interactive prompt.
    pub fn prompt_state(&self) -> String {
        self.tree.indexed_state()
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
    fn expand_then_undo_restores_state() {
        let g = toy_grammar();
        let mut driver = InteractiveDriver::new(&g).unwrap();
        let before = driver.prompt_state();
        driver.expand(0, 0).unwrap();
        assert_ne!(driver.prompt_state(), before);
        driver.undo().unwrap();
        assert_eq!(driver.prompt_state(), before);
    }

    #[test]
    fn derivation_completes_to_terminal_word() {
        let g = toy_grammar();
        let mut driver = InteractiveDriver::new(&g).unwrap();
        driver.expand(0, 0).unwrap();
        driver.expand(0, 1).unwrap();
        assert!(driver.is_fully_terminal());
        assert_eq!(
            driver.derived_word(),
            vec![Letter::terminal("a"), Letter::terminal("b")]
        );
    }

    #[test]
    fn invalid_variable_index_is_reported() {
        let g = toy_grammar();
        let mut driver = InteractiveDriver::new(&g).unwrap();
        assert!(matches!(
            driver.expand(5, 0),
            Err(CfgError::InvalidVariableIndex { index: 5 })
        ));
    }

    #[test]
    fn missing_start_variable_is_reported() {
        let g = Grammar::new();
        assert!(matches!(InteractiveDriver::new(&g), Err(CfgError::MissingStartVariable)));
    }
}
